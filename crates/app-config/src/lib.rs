// In crates/app-config/src/lib.rs

use config::{Config, Environment, File};
use std::path::Path;

pub mod error;
pub mod types;

// Re-export the most important types for easy access.
pub use error::{Error, Result};
pub use types::{
    AppSettings, DatabaseSettings, QuoteSettings, RetrySettings, SchedulerSettings, Settings,
    SinkSettings,
};

/// Loads the application settings from `dir` and the environment.
///
/// The environment name comes from `APP_ENVIRONMENT` and defaults to
/// "development".
pub fn load_settings(dir: &Path) -> Result<Settings> {
    let environment = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".into());
    load_settings_from(dir, &environment)
}

/// Loads and validates settings from a configuration directory.
///
/// This function orchestrates the layered configuration loading:
/// 1. Reads from a default `base.toml` file.
/// 2. Merges settings from an environment-specific file (e.g., `development.toml`).
/// 3. Merges settings from environment variables (e.g., `APP__QUOTES__TOKEN=...`).
pub fn load_settings_from(dir: &Path, environment: &str) -> Result<Settings> {
    let settings = Config::builder()
        .add_source(File::from(dir.join("base")))
        .add_source(File::from(dir.join(environment)).required(false))
        // The prefix is `APP`, separator is `__`. `APP__TICKERS` takes a comma separated list.
        .add_source(
            Environment::with_prefix("APP")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("tickers"),
        )
        .build()?;

    // Deserialize the configuration into our `Settings` struct.
    let settings: Settings = settings.try_deserialize()?;
    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::fs;

    const BASE: &str = r#"
tickers = ["PETR4", "vale3", "PETR4"]

[app]
environment = "development"
log_level = "info"

[quotes]
base_url = "https://brapi.dev"
token = "secret-token"
range = "5d"
interval = "30m"

[signal]
name = "sma_crossover"
params = { window = 14 }

[scheduler]
every_minutes = 30
"#;

    fn write_config(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, contents) in files {
            fs::write(dir.path().join(name), contents).unwrap();
        }
        dir
    }

    #[test]
    fn loads_base_file_with_defaults() {
        let dir = write_config(&[("base.toml", BASE)]);
        let settings = load_settings_from(dir.path(), "test").unwrap();

        assert_eq!(settings.quotes.interval, "30m");
        assert_eq!(settings.quotes.timeout_secs, 30);
        assert_eq!(settings.quotes.retry.max_retries, 3);
        assert_eq!(
            settings.quotes.token.as_ref().map(|t| t.expose_secret().to_string()),
            Some("secret-token".to_string())
        );
        assert_eq!(settings.scheduler.max_concurrency, 4);
        assert!(!settings.scheduler.run_on_startup);
        assert!(matches!(settings.sink, SinkSettings::Log));

        let tickers: Vec<String> = settings.tickers().unwrap().iter().map(|t| t.to_string()).collect();
        assert_eq!(tickers, vec!["PETR4", "VALE3"]);
    }

    #[test]
    fn load_settings_reads_the_given_directory() {
        let dir = write_config(&[("base.toml", BASE)]);
        let settings = load_settings(dir.path()).unwrap();
        assert_eq!(settings.quotes.base_url, "https://brapi.dev");

        let empty = tempfile::tempdir().unwrap();
        assert!(matches!(load_settings(empty.path()), Err(Error::LoadError(_))));
    }

    #[test]
    fn environment_file_overrides_base() {
        let overrides = r#"
[scheduler]
every_minutes = 5
run_on_startup = true

[sink]
kind = "csv"
directory = "/tmp/alerts"
"#;
        let dir = write_config(&[("base.toml", BASE), ("production.toml", overrides)]);
        let settings = load_settings_from(dir.path(), "production").unwrap();

        assert_eq!(settings.scheduler.every_minutes, 5);
        assert!(settings.scheduler.run_on_startup);
        match settings.sink {
            SinkSettings::Csv { directory } => assert_eq!(directory, Path::new("/tmp/alerts")),
            other => panic!("unexpected sink: {other:?}"),
        }
    }

    #[test]
    fn postgres_sink_is_tagged_by_kind() {
        let overrides = r#"
[sink]
kind = "postgres"
url = "postgres://localhost/alerts"
"#;
        let dir = write_config(&[("base.toml", BASE), ("staging.toml", overrides)]);
        let settings = load_settings_from(dir.path(), "staging").unwrap();

        match settings.sink {
            SinkSettings::Postgres(db) => {
                assert_eq!(db.url, "postgres://localhost/alerts");
                assert_eq!(db.max_connections, 5);
            }
            other => panic!("unexpected sink: {other:?}"),
        }
    }

    #[test]
    fn zero_window_fails_validation() {
        let broken = BASE.replace("window = 14", "window = 0");
        let dir = write_config(&[("base.toml", &broken)]);
        assert!(matches!(
            load_settings_from(dir.path(), "test"),
            Err(Error::Invalid(_))
        ));
    }

    #[test]
    fn empty_ticker_list_fails_validation() {
        let broken = BASE.replace(r#"tickers = ["PETR4", "vale3", "PETR4"]"#, "tickers = []");
        let dir = write_config(&[("base.toml", &broken)]);
        assert!(matches!(
            load_settings_from(dir.path(), "test"),
            Err(Error::Invalid(_))
        ));
    }

    #[test]
    fn blank_ticker_is_a_configuration_error() {
        let broken = BASE.replace(r#""vale3""#, r#""  ""#);
        let dir = write_config(&[("base.toml", &broken)]);
        assert!(matches!(
            load_settings_from(dir.path(), "test"),
            Err(Error::TickerError(_))
        ));
    }

    #[test]
    fn blank_token_is_treated_as_absent() {
        let without = BASE.replace(r#"token = "secret-token""#, r#"token = "  ""#);
        let dir = write_config(&[("base.toml", &without)]);
        let settings = load_settings_from(dir.path(), "test").unwrap();
        assert!(settings.quotes.token.is_none());
    }

    #[test]
    fn missing_base_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_settings_from(dir.path(), "test"),
            Err(Error::LoadError(_))
        ));
    }
}
