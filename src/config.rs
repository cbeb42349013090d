//! Client settings.
//!
//! Resolution order, later wins: built-in defaults, environment (a `.env`
//! file is loaded first if present), command-line flags.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;

use crate::error::AppError;

pub const ENV_API_BASE_URL: &str = "ADSORFIT_API_BASE_URL";
pub const ENV_HTTP_TIMEOUT: &str = "ADSORFIT_HTTP_TIMEOUT";
pub const ENV_LOG_FILE: &str = "ADSORFIT_LOG_FILE";

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_HTTP_TIMEOUT_SECS: f64 = 120.0;
/// Shortest accepted per-call deadline, in seconds.
pub const MIN_HTTP_TIMEOUT_SECS: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub api_base_url: Url,
    pub http_timeout: Duration,
    pub log_file: Option<PathBuf>,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsOverrides {
    pub api_base_url: Option<String>,
    pub timeout_secs: Option<f64>,
    pub log_file: Option<PathBuf>,
}

impl ClientSettings {
    /// Resolve from the process environment and `.env`.
    pub fn resolve(overrides: &SettingsOverrides) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::resolve_with(|key| std::env::var(key).ok(), overrides)
    }

    /// Resolve with an explicit variable lookup.
    pub fn resolve_with(
        lookup: impl Fn(&str) -> Option<String>,
        overrides: &SettingsOverrides,
    ) -> Result<Self, AppError> {
        let env = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_base_url = match &overrides.api_base_url {
            Some(raw) => parse_base_url(raw)?,
            None => match env(ENV_API_BASE_URL) {
                Some(raw) => parse_base_url(&raw)?,
                None => parse_base_url(DEFAULT_API_BASE_URL)?,
            },
        };

        let timeout_secs = match overrides.timeout_secs {
            Some(secs) => secs,
            None => match env(ENV_HTTP_TIMEOUT) {
                Some(raw) => raw.trim().parse::<f64>().map_err(|_| {
                    AppError::usage(format!("Invalid {ENV_HTTP_TIMEOUT} '{raw}': expected seconds"))
                })?,
                None => DEFAULT_HTTP_TIMEOUT_SECS,
            },
        };

        let log_file = overrides
            .log_file
            .clone()
            .or_else(|| env(ENV_LOG_FILE).map(PathBuf::from));

        Ok(Self {
            api_base_url,
            http_timeout: timeout_from_secs(timeout_secs)?,
            log_file,
        })
    }
}

/// Parse the backend base URL. Trailing slashes are trimmed; only absolute
/// `http`/`https` URLs are accepted.
pub fn parse_base_url(raw: &str) -> Result<Url, AppError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed)
        .map_err(|e| AppError::usage(format!("Invalid API base URL '{}': {e}", raw.trim())))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::usage(format!(
            "Invalid API base URL '{}': expected http or https",
            raw.trim()
        )));
    }
    Ok(url)
}

/// Convert a timeout in seconds, raising it to the one-second minimum.
pub fn timeout_from_secs(secs: f64) -> Result<Duration, AppError> {
    Duration::try_from_secs_f64(secs.max(MIN_HTTP_TIMEOUT_SECS))
        .map_err(|_| AppError::usage(format!("Invalid HTTP timeout '{secs}': expected seconds")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_environment() {
        let s = ClientSettings::resolve_with(lookup(&[]), &SettingsOverrides::default()).unwrap();
        assert_eq!(s.api_base_url.as_str(), "http://127.0.0.1:8000/");
        assert_eq!(s.http_timeout, Duration::from_secs(120));
        assert_eq!(s.log_file, None);
    }

    #[test]
    fn environment_then_flags() {
        let env = lookup(&[
            (ENV_API_BASE_URL, "http://fits.local:9000/api///"),
            (ENV_HTTP_TIMEOUT, "30"),
            (ENV_LOG_FILE, "/tmp/adsorfit.log"),
        ]);
        let s = ClientSettings::resolve_with(&env, &SettingsOverrides::default()).unwrap();
        assert_eq!(s.api_base_url.as_str(), "http://fits.local:9000/api");
        assert_eq!(s.http_timeout, Duration::from_secs(30));
        assert_eq!(s.log_file, Some(PathBuf::from("/tmp/adsorfit.log")));

        let flags = SettingsOverrides {
            api_base_url: Some("https://other.example".into()),
            timeout_secs: Some(5.0),
            log_file: None,
        };
        let s = ClientSettings::resolve_with(&env, &flags).unwrap();
        assert_eq!(s.api_base_url.host_str(), Some("other.example"));
        assert_eq!(s.http_timeout, Duration::from_secs(5));
        assert_eq!(s.log_file, Some(PathBuf::from("/tmp/adsorfit.log")));
    }

    #[test]
    fn timeout_has_a_floor() {
        assert_eq!(timeout_from_secs(0.01).unwrap(), Duration::from_secs(1));
        assert_eq!(timeout_from_secs(2.5).unwrap(), Duration::from_millis(2500));
        assert!(timeout_from_secs(f64::INFINITY).is_err());
    }

    #[test]
    fn bad_values_are_usage_errors() {
        let env = lookup(&[(ENV_HTTP_TIMEOUT, "soon")]);
        let err = ClientSettings::resolve_with(&env, &SettingsOverrides::default()).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_USAGE);

        assert!(parse_base_url("ftp://example.com").is_err());
        assert!(parse_base_url("not a url").is_err());
    }
}
