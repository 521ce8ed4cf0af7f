use e6f_common::settings::SettingsError;
use thiserror::Error;

/// Errors raised while persisting or restoring blacklist state.
///
/// Parsing and evaluating filters never fails, so this only covers storage.
#[derive(Error, Debug)]
pub enum BlacklistError {
    #[error("Failed to access the settings store: {source}")]
    SettingsFail {
        #[from]
        source: SettingsError,
    },

    #[error("Stored value under key {key} is corrupted: {source}")]
    StoredStateDecode {
        key: String,
        source: serde_json::Error,
    },

    #[error("Failed to encode value for key {key}: {source}")]
    StoredStateEncode {
        key: String,
        source: serde_json::Error,
    },
}
