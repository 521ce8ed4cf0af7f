//! Blacklist engine: the query language, compiled blacklist lines and the registry that
//! keeps their match caches current.

extern crate e6f_common;

pub mod config;
pub mod error;
pub mod expression;
pub mod favorites;
pub mod filter;
pub mod prelude;
pub mod registry;
