use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use chrono_tz::Tz;
use dotenvy::EnvLoader;

pub const DEFAULT_API_URL: &str = "http://localhost:4000/api/tasks";
const DEFAULT_PORT: u16 = 3100;
const DEFAULT_API_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 4;

/// Global timezone setting for the application
static APP_TIMEZONE: OnceLock<Tz> = OnceLock::new();

/// Initialize the timezone from the given string
pub fn init_timezone(tz_str: &str) {
    let timezone = parse_timezone(tz_str);

    if APP_TIMEZONE.set(timezone).is_err() {
        tracing::warn!("timezone already initialized");
    }
}

/// Get the configured timezone
pub fn get_timezone() -> Tz {
    *APP_TIMEZONE.get().unwrap_or(&chrono_tz::UTC)
}

pub fn parse_timezone(tz_str: &str) -> Tz {
    tz_str.parse().unwrap_or_else(|_| {
        tracing::warn!(timezone = tz_str, "invalid timezone, falling back to UTC");
        chrono_tz::UTC
    })
}

/// Looks a key up in `.env` first, then in the process environment.
pub fn env_lookup() -> impl Fn(&str) -> Option<String> {
    let dotenv = EnvLoader::new().load().unwrap_or_default();
    move |key: &str| dotenv.get(key).cloned().or_else(|| std::env::var(key).ok())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub bind_address: String,
    pub port: u16,
    pub api_base_url: String,
    pub api_timeout: Duration,
    pub timezone: String,
    pub static_dir: PathBuf,
    /// Certificate pair for local HTTPS. Only set in development.
    pub tls: Option<TlsPaths>,
    pub shutdown_grace: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

/// Subscriber settings, read ahead of everything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub filter: String,
    pub json: bool,
}

impl LogSettings {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            filter: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            json: lookup("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
        }
    }
}

impl AppConfig {
    /// Install the log subscriber, then read the rest of the configuration
    /// so warnings about bad values reach it.
    pub fn load_with_logging() -> Self {
        let lookup = env_lookup();
        let log = LogSettings::from_lookup(&lookup);
        crate::logging::init(&log.filter, log.json);
        Self::from_lookup(lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let environment = lookup("APP_ENV")
            .or_else(|| lookup("NODE_ENV"))
            .map(|v| Environment::parse(&v))
            .unwrap_or(Environment::Development);

        let tls = match environment {
            Environment::Development => Some(TlsPaths {
                cert: lookup("TLS_CERT_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("resources/localhost-ssl/localhost.crt")),
                key: lookup("TLS_KEY_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("resources/localhost-ssl/localhost.key")),
            }),
            Environment::Production => None,
        };

        Self {
            environment,
            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or("PORT", lookup("PORT"), DEFAULT_PORT),
            api_base_url: lookup("TASK_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_timeout: Duration::from_secs(parse_or(
                "TASK_API_TIMEOUT_SECS",
                lookup("TASK_API_TIMEOUT_SECS"),
                DEFAULT_API_TIMEOUT_SECS,
            )),
            timezone: lookup("APP_TIMEZONE").unwrap_or_else(|| "UTC".to_string()),
            static_dir: lookup("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("static")),
            tls,
            shutdown_grace: Duration::from_secs(parse_or(
                "SHUTDOWN_GRACE_SECS",
                lookup("SHUTDOWN_GRACE_SECS"),
                DEFAULT_SHUTDOWN_GRACE_SECS,
            )),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, value: Option<String>, default: T) -> T {
    match value {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "invalid value, using default");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::capture::capture_logs;
    use std::collections::HashMap;
    use tracing::Level;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = AppConfig::default();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.port, 3100);
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert_eq!(config.api_timeout, Duration::from_secs(10));
        assert_eq!(config.shutdown_grace, Duration::from_secs(4));
        assert_eq!(config.listen_addr(), "0.0.0.0:3100");
        assert!(config.tls.is_some());
    }

    #[test]
    fn production_has_no_tls() {
        let config = AppConfig::from_lookup(lookup_from(&[("APP_ENV", "production")]));
        assert_eq!(config.environment, Environment::Production);
        assert!(config.tls.is_none());
    }

    #[test]
    fn node_env_is_honoured_when_app_env_is_absent() {
        let config = AppConfig::from_lookup(lookup_from(&[("NODE_ENV", "production")]));
        assert_eq!(config.environment, Environment::Production);

        let config = AppConfig::from_lookup(lookup_from(&[
            ("NODE_ENV", "production"),
            ("APP_ENV", "development"),
        ]));
        assert_eq!(config.environment, Environment::Development);
    }

    #[test]
    fn invalid_port_falls_back() {
        let config = AppConfig::from_lookup(lookup_from(&[("PORT", "eighty")]));
        assert_eq!(config.port, 3100);

        let config = AppConfig::from_lookup(lookup_from(&[("PORT", "8080")]));
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn invalid_values_are_reported() {
        let (logs, _guard) = capture_logs();
        let config = AppConfig::from_lookup(lookup_from(&[
            ("PORT", "eighty"),
            ("SHUTDOWN_GRACE_SECS", "soon"),
        ]));
        assert_eq!(config.port, 3100);

        assert!(logs.has_event(Level::WARN, "invalid value, using default"));
        let keys: Vec<String> = logs
            .events()
            .into_iter()
            .filter(|e| e.level == Level::WARN)
            .filter_map(|e| e.fields.into_iter().find(|(k, _)| k == "key").map(|(_, v)| v))
            .collect();
        assert_eq!(keys, vec!["PORT", "SHUTDOWN_GRACE_SECS"]);
        assert_eq!(
            logs.field("invalid value", "value").as_deref(),
            Some("eighty")
        );
    }

    #[test]
    fn log_settings_default_to_compact_info() {
        let log = LogSettings::from_lookup(|_| None);
        assert_eq!(log, LogSettings { filter: "info".into(), json: false });

        let log = LogSettings::from_lookup(lookup_from(&[("LOG_FORMAT", "JSON")]));
        assert!(log.json);
    }

    #[test]
    fn api_url_trailing_slash_is_trimmed() {
        let config =
            AppConfig::from_lookup(lookup_from(&[("TASK_API_URL", "http://api:4000/api/tasks/")]));
        assert_eq!(config.api_base_url, "http://api:4000/api/tasks");
    }

    #[test]
    fn tls_paths_are_overridable() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("TLS_CERT_PATH", "/tmp/a.crt"),
            ("TLS_KEY_PATH", "/tmp/a.key"),
        ]));
        assert_eq!(
            config.tls,
            Some(TlsPaths {
                cert: PathBuf::from("/tmp/a.crt"),
                key: PathBuf::from("/tmp/a.key"),
            })
        );
    }

    #[test]
    fn bad_timezone_is_utc() {
        assert_eq!(parse_timezone("Mars/Olympus"), chrono_tz::UTC);
        assert_eq!(parse_timezone("Europe/London"), chrono_tz::Europe::London);
    }
}
