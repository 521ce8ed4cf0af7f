//! Remote side of e6filter: a single-flight, rate-limited [`RequestQueue`](queue::RequestQueue)
//! and the [`E621Client`](client::E621Client) built on top of it.

extern crate e6f_common;

pub mod client;
pub mod endpoint;
pub mod error;
pub mod models;
pub mod queue;
pub mod transport;

pub use client::{ApiConfig, E621Client};
pub use endpoint::Endpoint;
pub use error::{ApiError, TransportError};
pub use models::UserData;
pub use queue::{QueueResponse, RequestQueue};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
