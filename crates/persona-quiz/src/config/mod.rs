use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::quiz::loading::LoadingTimer;
use crate::quiz::locale::Locale;

/// Idle time after which a stored session may be evicted.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the quiz service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub quiz: QuizConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let public_origin = env::var("QUIZ_PUBLIC_ORIGIN").unwrap_or_default();
        let loading_override = match env::var("QUIZ_LOADING_MS") {
            Ok(raw) => {
                let millis = raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidLoadingDuration { value: raw.clone() })?;
                Some(Duration::from_millis(millis))
            }
            Err(_) => None,
        };
        let default_locale = env::var("QUIZ_DEFAULT_LOCALE")
            .map(|raw| Locale::normalize(&raw))
            .unwrap_or_default();
        let session_ttl = match env::var("QUIZ_SESSION_TTL_SECS") {
            Ok(raw) => {
                let secs = raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidSessionTtl { value: raw.clone() })?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            Err(_) => Some(DEFAULT_SESSION_TTL),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            quiz: QuizConfig {
                public_origin,
                loading_override,
                default_locale,
                session_ttl,
            },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Quiz behavior knobs: share-link origin, loading pacing, and fallback locale.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuizConfig {
    /// Scheme and host prepended to share links. Empty yields relative links.
    pub public_origin: String,
    pub loading_override: Option<Duration>,
    pub default_locale: Locale,
    /// Sessions idle for longer than this are evicted. `None` keeps them forever.
    pub session_ttl: Option<Duration>,
}

impl QuizConfig {
    pub fn loading_timer(&self) -> LoadingTimer {
        match self.loading_override {
            Some(total) => LoadingTimer::fixed(total),
            None => LoadingTimer::standard(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidLoadingDuration { value: String },
    InvalidSessionTtl { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidLoadingDuration { value } => write!(
                f,
                "QUIZ_LOADING_MS must be a whole number of milliseconds, got '{}'",
                value
            ),
            ConfigError::InvalidSessionTtl { value } => write!(
                f,
                "QUIZ_SESSION_TTL_SECS must be a whole number of seconds, got '{}'",
                value
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort
            | ConfigError::InvalidLoadingDuration { .. }
            | ConfigError::InvalidSessionTtl { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("QUIZ_PUBLIC_ORIGIN");
        env::remove_var("QUIZ_LOADING_MS");
        env::remove_var("QUIZ_DEFAULT_LOCALE");
        env::remove_var("QUIZ_SESSION_TTL_SECS");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.quiz.public_origin, "");
        assert_eq!(config.quiz.default_locale, Locale::Ko);
        assert_eq!(config.quiz.loading_timer(), LoadingTimer::standard());
        assert_eq!(config.quiz.session_ttl, Some(DEFAULT_SESSION_TTL));
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn reads_quiz_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("QUIZ_PUBLIC_ORIGIN", "https://quiz.example");
        env::set_var("QUIZ_LOADING_MS", "1200");
        env::set_var("QUIZ_DEFAULT_LOCALE", "en-US");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.quiz.public_origin, "https://quiz.example");
        assert_eq!(
            config.quiz.loading_override,
            Some(Duration::from_millis(1200))
        );
        assert_eq!(config.quiz.default_locale, Locale::En);
        assert_eq!(
            config.quiz.loading_timer().duration(),
            Duration::from_millis(1200)
        );
        reset_env();
    }

    #[test]
    fn session_ttl_can_be_tuned_or_disabled() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("QUIZ_SESSION_TTL_SECS", "90");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.quiz.session_ttl, Some(Duration::from_secs(90)));

        env::set_var("QUIZ_SESSION_TTL_SECS", "0");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.quiz.session_ttl, None);

        env::set_var("QUIZ_SESSION_TTL_SECS", "forever");
        match AppConfig::load() {
            Err(ConfigError::InvalidSessionTtl { value }) => assert_eq!(value, "forever"),
            other => panic!("expected session ttl error, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn rejects_non_numeric_loading_duration() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("QUIZ_LOADING_MS", "soon");
        match AppConfig::load() {
            Err(ConfigError::InvalidLoadingDuration { value }) => assert_eq!(value, "soon"),
            other => panic!("expected loading duration error, got {other:?}"),
        }
        reset_env();
    }
}
