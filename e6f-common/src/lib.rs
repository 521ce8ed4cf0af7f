//! Data shared by every e6filter crate: the normalized [`PostData`](post::PostData) snapshot,
//! the key-value [settings store](settings) and the dependencies all of them re-export.
use std::{
    env,
    fs::create_dir_all,
    io,
    path::{Path, PathBuf},
};

// Public Exports
pub use ahash;
pub use directories;
pub use log;
pub use reqwest;
pub use serde;
pub use serde_json;

use directories::ProjectDirs;

use log::debug;

pub mod macros;
pub mod post;
pub mod settings;

/// Environment variable that overrides the default config location.
pub const CONFIG_DIR_ENV: &str = "E6F_CONFIG_DIR";

/// Returns a `PathBuf` pointing to the directory holding `config.toml` and the session state.
///
/// This is XDG-compliant and resolves to `$XDG_CONFIG_HOME/e6filter` on Linux or
/// `%APPDATA%/e6filter/e6filter` on Windows.
///
/// Set the env var `E6F_CONFIG_DIR` to point it to a custom location.
#[inline]
pub fn config_dir() -> Result<PathBuf, io::Error> {
    let cfg_path = match env::var(CONFIG_DIR_ENV) {
        Ok(path) => path,
        Err(_) => ProjectDirs::from("com", "e6filter", "e6filter")
            .map(|cdir| cdir.config_dir().to_string_lossy().to_string())
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, "no home directory available")
            })?,
    };

    let cfold = Path::new(&cfg_path);

    if !cfold.exists() {
        debug!("Creating config dir {}", cfold.display());
        create_dir_all(cfold)?;
    }

    Ok(cfold.to_path_buf())
}
