use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub backends: BackendSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    pub environment: String,
}

/// Backend endpoint addresses. Both hosts are required: starting without
/// them is a configuration error, not a degraded mode.
#[derive(Debug, Deserialize, Clone)]
pub struct BackendSettings {
    pub record_host: String,
    pub replay_host: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
    pub format: String,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let mut builder = Config::builder()
            // Start with default values
            .set_default("application.host", "0.0.0.0")?
            .set_default("application.port", 8089)?
            .set_default("application.environment", environment.clone())?
            .set_default("backends.request_timeout_secs", 30)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            // Add configuration file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{environment}")).required(false))
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables with prefix
            .add_source(Environment::with_prefix("WARCGATE").separator("__"));

        // Bare RECORD_HOST/WEBAGG_HOST are honored for compatibility with
        // existing deployments.
        if let Ok(host) = env::var("RECORD_HOST") {
            builder = builder.set_override("backends.record_host", host)?;
        }
        if let Ok(host) = env::var("WEBAGG_HOST") {
            builder = builder.set_override("backends.replay_host", host)?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.backends.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_backend_hosts_is_a_fatal_config_error() {
        // No config files and no backend env vars in the test environment:
        // deserialization must fail on the required hosts.
        if env::var("RECORD_HOST").is_err() && env::var("WEBAGG_HOST").is_err() {
            let settings = Settings::new();
            assert!(settings.is_err());
        }
    }

    #[test]
    fn request_timeout_converts_seconds() {
        let settings = Settings {
            application: ApplicationSettings {
                host: "0.0.0.0".to_string(),
                port: 8089,
                environment: "test".to_string(),
            },
            backends: BackendSettings {
                record_host: "http://record:8010".to_string(),
                replay_host: "http://replay:8080".to_string(),
                request_timeout_secs: 30,
            },
            logging: LoggingSettings {
                level: "info".to_string(),
                format: "json".to_string(),
            },
        };
        assert_eq!(
            settings.request_timeout(),
            std::time::Duration::from_secs(30)
        );
    }
}
