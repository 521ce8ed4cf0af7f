//! Blacklist section of the config file
//!
//! ```toml
//! [blacklist]
//! filters = ["gore", "-solo score:>50"] # One blacklist line per entry
//! enabled = true                       # Initial state of the lines above
//! exclude_favorites = true             # Never hide your own favorites
//! exclude_uploads = false              # Never hide your own uploads (needs an account)
//! whitelist = ["safe_tag"]             # Never hide posts carrying these tags
//! ```
use e6f_common::log::debug;
use serde::{Deserialize, Serialize};

use crate::filter::FilterBuiltins;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct BlacklistConfig {
    pub filters: Vec<String>,
    pub enabled: bool,
    pub exclude_favorites: bool,
    pub exclude_uploads: bool,
    pub whitelist: Vec<String>,
}

impl Default for BlacklistConfig {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            enabled: true,
            exclude_favorites: false,
            exclude_uploads: false,
            whitelist: Vec::new(),
        }
    }
}

#[derive(Deserialize)]
struct BlacklistTable {
    #[serde(default)]
    blacklist: BlacklistConfig,
}

impl BlacklistConfig {
    /// Reads the `[blacklist]` table out of a whole config file, ignoring other tables.
    ///
    /// # Errors
    /// Fails if the content isn't valid TOML or the table has the wrong shape.
    pub fn from_config(config_content: &str) -> Result<Self, toml::de::Error> {
        let table = toml::from_str::<BlacklistTable>(config_content)?;
        debug!(
            "Blacklist config decoded with {} lines",
            table.blacklist.filters.len()
        );
        Ok(table.blacklist)
    }

    /// Builtin clauses for the given account. Own uploads can only be excluded when the
    /// user id is known.
    #[must_use]
    pub fn builtins(&self, user_id: Option<u64>) -> FilterBuiltins {
        FilterBuiltins {
            exclude_favorites: self.exclude_favorites,
            exclude_uploads: if self.exclude_uploads { user_id } else { None },
            whitelist: self.whitelist.iter().map(|t| t.to_lowercase()).collect(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::BlacklistConfig;

    #[test]
    fn decodes_table_among_others() {
        let content = r#"
[api]
delay_ms = 1000

[blacklist]
filters = ["gore", "-solo score:>50"]
exclude_uploads = true
whitelist = ["Safe_Tag"]
"#;
        let config = BlacklistConfig::from_config(content).unwrap();
        assert_eq!(config.filters.len(), 2);
        assert!(config.enabled);

        let builtins = config.builtins(Some(7));
        assert_eq!(builtins.exclude_uploads, Some(7));
        assert!(!builtins.exclude_favorites);
        assert_eq!(builtins.whitelist, ["safe_tag"]);

        assert_eq!(config.builtins(None).exclude_uploads, None);
    }

    #[test]
    fn missing_table_uses_defaults() {
        let config = BlacklistConfig::from_config("").unwrap();
        assert_eq!(config, BlacklistConfig::default());
    }

    #[test]
    fn wrong_shape_is_an_error() {
        assert!(BlacklistConfig::from_config("[blacklist]\nfilters = 3").is_err());
    }
}
