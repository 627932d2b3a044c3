use serde::Deserialize;
use std::fmt;

/// Per-system configuration.
///
/// Deserializes from any serde format with every field optional; keys the
/// struct does not know are ignored, so configs can carry settings for other
/// layers without breaking this one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Enable the TCP transport and bind a listener at startup.
    pub remote: bool,
    /// Host to bind the listener to. Falls back to the local hostname when
    /// unset.
    pub bind_host: Option<String>,
    /// Port to bind the listener to. 0 picks an ephemeral port.
    pub bind_port: u16,
    /// Log level hint for filter directives.
    pub log_level: LogLevel,
    /// Log every outbound frame at debug instead of trace.
    pub log_sent: bool,
    /// Log every inbound frame at debug instead of trace.
    pub log_received: bool,
}

impl SystemConfig {
    /// Config for a network-reachable system bound to `host:port`.
    pub fn remote(host: impl Into<String>, port: u16) -> Self {
        Self {
            remote: true,
            bind_host: Some(host.into()),
            bind_port: port,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

/// Renders in the form env-filter directives expect, e.g. `debug`.
impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        };
        write!(f, "{}", level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SystemConfig::default();
        assert!(!config.remote);
        assert_eq!(config.bind_host, None);
        assert_eq!(config.bind_port, 0);
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(!config.log_sent);
        assert!(!config.log_received);
    }

    #[test]
    fn test_remote_constructor() {
        let config = SystemConfig::remote("127.0.0.1", 2727);
        assert!(config.remote);
        assert_eq!(config.bind_host.as_deref(), Some("127.0.0.1"));
        assert_eq!(config.bind_port, 2727);
    }

    #[test]
    fn test_parse_ignores_unknown_keys() {
        let raw = r#"{
            "remote": true,
            "bind_host": "10.0.3.7",
            "bind_port": 5050,
            "log_level": "debug",
            "log_received": true,
            "provider": "remote",
            "netty": { "tcp": { "maximum-frame-size": 1280000 } }
        }"#;
        let config: SystemConfig = serde_json::from_str(raw).unwrap();
        assert!(config.remote);
        assert_eq!(config.bind_host.as_deref(), Some("10.0.3.7"));
        assert_eq!(config.bind_port, 5050);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert!(config.log_received);
        assert!(!config.log_sent);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: SystemConfig = serde_json::from_str(r#"{ "remote": true }"#).unwrap();
        assert!(config.remote);
        assert_eq!(config.bind_port, 0);
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_log_level_directive_rendering() {
        assert_eq!(LogLevel::Trace.to_string(), "trace");
        assert_eq!(LogLevel::default().to_string(), "info");
    }
}
