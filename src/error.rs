use std::io;

use e6f_api::ApiError;
use e6f_common::settings::SettingsError;
use e6f_filter::error::BlacklistError;
use thiserror::Error;

#[allow(clippy::enum_variant_names)]
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to access file: {source}")]
    IOError {
        #[from]
        source: io::Error,
    },

    #[error("Failed to read config file: {source}")]
    ConfigDecodeError {
        #[from]
        source: toml::de::Error,
    },

    #[error("Failed to access session state: {source}")]
    SettingsFail {
        #[from]
        source: SettingsError,
    },

    #[error("Failed to persist blacklist: {source}")]
    BlacklistFail {
        #[from]
        source: BlacklistError,
    },

    #[error("API request failed: {source}")]
    ApiFail {
        #[from]
        source: ApiError,
    },

    #[error("File {path} is not a post dump: {source}")]
    InvalidDump {
        path: String,
        source: serde_json::Error,
    },

    #[error("Favorites can only be synced while logged in")]
    NotAuthenticated,

    #[error("No posts given")]
    NoPostsInInput,
}
