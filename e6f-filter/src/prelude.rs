pub use crate::config::BlacklistConfig;
pub use crate::error::BlacklistError;
pub use crate::expression::{Comparison, FilterExpression, FilterField};
pub use crate::favorites::FavoriteCache;
pub use crate::filter::{FilterBuiltins, FilterSet, MatchState};
pub use crate::registry::FilterRegistry;
