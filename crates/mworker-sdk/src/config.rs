//! Worker configuration.

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable, colored output
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

impl LogFormat {
    fn from_str_lossy(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Logging settings held by one worker instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, e.g. `warn` or `mworker_sdk=debug,info`
    pub level: String,
    pub format: LogFormat,
    /// Emit ANSI colors in pretty output
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Pretty,
            ansi: true,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(mut self, level: impl AsRef<str>) -> Self {
        self.level = normalize_level(level.as_ref());
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}

/// Worker configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub logging: LoggingConfig,
    /// Number of independent worker instances a pool runs in parallel
    pub max_concurrent_instances: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            max_concurrent_instances: 2,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    ///
    /// - `RUST_LOG`: log level or filter directives (default `warn`)
    /// - `LOG_FORMAT`: `pretty` or `json`
    /// - `WORKER_MAX_INSTANCES`: pool size (default 2)
    pub fn from_env() -> Self {
        let level = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
        let format = std::env::var("LOG_FORMAT")
            .map(|v| LogFormat::from_str_lossy(&v))
            .unwrap_or_default();

        Self {
            logging: LoggingConfig::default()
                .with_level(level)
                .with_format(format),
            max_concurrent_instances: std::env::var("WORKER_MAX_INSTANCES")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(2),
        }
    }

    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    pub fn with_max_concurrent_instances(mut self, n: usize) -> Self {
        self.max_concurrent_instances = n.max(1);
        self
    }
}

/// Map level names that `EnvFilter` does not know to ones it does.
fn normalize_level(level: &str) -> String {
    let trimmed = level.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "" => "warn".to_string(),
        "warning" => "warn".to_string(),
        "critical" | "fatal" => "error".to_string(),
        "notset" => "trace".to_string(),
        "trace" | "debug" | "info" | "warn" | "error" | "off" => trimmed.to_ascii_lowercase(),
        _ => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_normalization() {
        assert_eq!(normalize_level("WARNING"), "warn");
        assert_eq!(normalize_level("Info"), "info");
        assert_eq!(normalize_level("critical"), "error");
        assert_eq!(normalize_level(""), "warn");
        assert_eq!(normalize_level("mworker_sdk=debug"), "mworker_sdk=debug");
    }

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.max_concurrent_instances, 2);
        assert_eq!(
            WorkerConfig::default()
                .with_max_concurrent_instances(0)
                .max_concurrent_instances,
            1
        );
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(LogFormat::from_str_lossy("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::from_str_lossy("text"), LogFormat::Pretty);
    }
}
