//! Runtime settings.
//!
//! [`Settings::load`] layers the embedded defaults, an optional TOML file and
//! `BOOKSCAPE__SECTION__KEY` environment variables, in that order.
//! [`Settings::defaults`] returns the embedded defaults without touching the
//! filesystem or environment.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::fetcher::FetchSettings;
use crate::store::DuplicatePolicy;

const DEFAULT_CONFIG: &str = r#"
database_path = "books.db"

[fetch]
endpoint         = "https://www.googleapis.com/books/v1/volumes"
max_results      = 40
max_attempts     = 3
retry_delay_secs = 10
timeout_secs     = 30

[store]
on_duplicate = "upsert"
"#;

const DEFAULT_CONFIG_FILE: &str = "bookscape.toml";
const ENV_PREFIX: &str = "BOOKSCAPE";

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    pub database_path: PathBuf,
    pub fetch: FetchSettings,
    pub store: StoreSettings,
}

/// `[store]` section.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct StoreSettings {
    pub on_duplicate: DuplicatePolicy,
}

impl Settings {
    /// Load settings, reading `file` if given and `bookscape.toml` in the
    /// working directory otherwise. Neither file is required to exist.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let path = file
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let settings = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from(path.as_path()).required(file.is_some()))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    pub fn defaults() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::Settings;
    use crate::fetcher::FetchSettings;
    use crate::store::DuplicatePolicy;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn embedded_defaults_match_code_defaults() {
        let settings = Settings::defaults().expect("defaults");
        assert_eq!(settings.database_path, PathBuf::from("books.db"));
        assert_eq!(settings.fetch, FetchSettings::default());
        assert_eq!(settings.store.on_duplicate, DuplicatePolicy::Upsert);
    }

    #[test]
    fn file_overrides_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        writeln!(
            file,
            "database_path = \"/tmp/other.db\"\n[fetch]\nmax_attempts = 5\n[store]\non_duplicate = \"reject\""
        )
        .expect("write config");

        let settings = Settings::load(Some(file.path())).expect("load");
        assert_eq!(settings.database_path, PathBuf::from("/tmp/other.db"));
        assert_eq!(settings.fetch.max_attempts, 5);
        assert_eq!(settings.fetch.retry_delay_secs, 10);
        assert_eq!(settings.store.on_duplicate, DuplicatePolicy::Reject);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("absent.toml");
        assert!(Settings::load(Some(&missing)).is_err());
    }
}
