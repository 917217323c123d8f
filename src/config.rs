use std::{env, net::SocketAddr, time::Duration};

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub bind_port: u16,
    pub send_queue: usize,
    pub ping_interval: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BIND_PORT must be a valid u16")]
    InvalidPort,
    #[error("WSRPC_SEND_QUEUE must be a positive integer")]
    InvalidSendQueue,
    #[error("WSRPC_PING_INTERVAL_SECS must be a positive integer")]
    InvalidPingInterval,
    #[error("invalid bind address or port")]
    InvalidSocket,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bind_addr = read("BIND_ADDR").unwrap_or_else(|| "127.0.0.1".to_string());
        let bind_port = read("BIND_PORT")
            .map(|value| value.parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(9001);
        let send_queue = read("WSRPC_SEND_QUEUE")
            .map(|value| {
                value
                    .parse::<usize>()
                    .ok()
                    .filter(|size| *size > 0)
                    .ok_or(ConfigError::InvalidSendQueue)
            })
            .transpose()?
            .unwrap_or(256);
        let ping_interval_secs = read("WSRPC_PING_INTERVAL_SECS")
            .map(|value| {
                value
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .ok_or(ConfigError::InvalidPingInterval)
            })
            .transpose()?
            .unwrap_or(3);

        let config = Self {
            bind_addr,
            bind_port,
            send_queue,
            ping_interval: Duration::from_secs(ping_interval_secs),
        };

        let _ = config.bind_socket()?;
        Ok(config)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.bind_port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn parse_defaults() {
        let config = config_from(&[]).expect("config should parse");
        assert_eq!(config.bind_addr, "127.0.0.1");
        assert_eq!(config.bind_port, 9001);
        assert_eq!(config.send_queue, 256);
        assert_eq!(config.ping_interval, Duration::from_secs(3));
    }

    #[test]
    fn overrides_are_applied() {
        let config = config_from(&[
            ("BIND_ADDR", "0.0.0.0"),
            ("BIND_PORT", "8088"),
            ("WSRPC_SEND_QUEUE", "16"),
            ("WSRPC_PING_INTERVAL_SECS", "10"),
        ])
        .expect("config should parse");
        assert_eq!(
            config.bind_socket().expect("socket"),
            "0.0.0.0:8088".parse().expect("valid socket")
        );
        assert_eq!(config.send_queue, 16);
        assert_eq!(config.ping_interval, Duration::from_secs(10));
    }

    #[test]
    fn invalid_port_fails() {
        let err = config_from(&[("BIND_PORT", "70000")]).expect_err("port out of range");
        assert!(matches!(err, ConfigError::InvalidPort));
    }

    #[test]
    fn zero_send_queue_fails() {
        let err = config_from(&[("WSRPC_SEND_QUEUE", "0")]).expect_err("queue must be positive");
        assert!(matches!(err, ConfigError::InvalidSendQueue));
    }

    #[test]
    fn invalid_ping_interval_fails() {
        let err =
            config_from(&[("WSRPC_PING_INTERVAL_SECS", "soon")]).expect_err("not a number");
        assert!(matches!(err, ConfigError::InvalidPingInterval));
    }

    #[test]
    fn invalid_bind_addr_fails() {
        let err = config_from(&[("BIND_ADDR", "not an address")]).expect_err("bad address");
        assert!(matches!(err, ConfigError::InvalidSocket));
    }
}
