use std::{env, io, time::Duration};

use crate::constants::DEFAULT_INTERFACE;

/// Environment variable naming the interface to bind.
pub const ENV_INTERFACE: &str = "CANRAW_INTERFACE";
/// Environment variable with the read timeout in milliseconds.
pub const ENV_READ_TIMEOUT_MS: &str = "CANRAW_READ_TIMEOUT_MS";
/// Environment variable with the write timeout in milliseconds.
pub const ENV_WRITE_TIMEOUT_MS: &str = "CANRAW_WRITE_TIMEOUT_MS";

/// Settings applied when a transport opens its socket.
///
/// `None` timeouts leave the socket fully blocking. `loopback` and
/// `recv_own_msgs` default to what the kernel does for a fresh socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub interface: String,
    pub read_timeout: Option<Duration>,
    pub write_timeout: Option<Duration>,
    pub loopback: bool,
    pub recv_own_msgs: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            interface: DEFAULT_INTERFACE.to_string(),
            read_timeout: None,
            write_timeout: None,
            loopback: true,
            recv_own_msgs: false,
        }
    }
}

impl Config {
    pub fn new(interface: &str) -> Config {
        Config {
            interface: interface.to_string(),
            ..Config::default()
        }
    }

    /// Defaults overridden by `CANRAW_*` environment variables.
    pub fn from_env() -> io::Result<Config> {
        Config::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> io::Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(iface) = lookup(ENV_INTERFACE) {
            if !iface.is_empty() {
                config.interface = iface;
            }
        }

        config.read_timeout = parse_millis(ENV_READ_TIMEOUT_MS, lookup(ENV_READ_TIMEOUT_MS))?;
        config.write_timeout = parse_millis(ENV_WRITE_TIMEOUT_MS, lookup(ENV_WRITE_TIMEOUT_MS))?;

        Ok(config)
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Config {
        self.read_timeout = Some(timeout);
        self
    }

    pub fn write_timeout(mut self, timeout: Duration) -> Config {
        self.write_timeout = Some(timeout);
        self
    }

    pub fn loopback(mut self, enabled: bool) -> Config {
        self.loopback = enabled;
        self
    }

    pub fn recv_own_msgs(mut self, enabled: bool) -> Config {
        self.recv_own_msgs = enabled;
        self
    }
}

fn parse_millis(key: &str, value: Option<String>) -> io::Result<Option<Duration>> {
    match value {
        None => Ok(None),
        Some(v) => v
            .trim()
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{}={:?} is not a number of milliseconds: {}", key, v, e),
                )
            }),
    }
}
