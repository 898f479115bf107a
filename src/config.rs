use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PipeError;

/// Konfigurasi pool pipe
///
/// Semua field punya default, jadi file TOML kosong pun valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_pipe_count")]
    pub pipe_count: usize,

    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_pipe_count() -> usize {
    4
}

fn default_buffer_size() -> usize {
    4000
}

fn default_poll_interval_ms() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pipe_count: default_pipe_count(),
            buffer_size: default_buffer_size(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PipeError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, PipeError> {
        let config: Config =
            toml::from_str(content).map_err(|e| PipeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PipeError> {
        if self.pipe_count == 0 {
            return Err(PipeError::Config("pipe_count must be at least 1".into()));
        }
        if self.buffer_size < 2 {
            return Err(PipeError::Config(format!(
                "buffer_size must be at least 2, got {}",
                self.buffer_size
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(PipeError::Config("poll_interval_ms must be at least 1".into()));
        }
        Ok(())
    }

    #[inline]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.pipe_count, 4);
        assert_eq!(config.buffer_size, 4000);
    }

    #[test]
    fn test_partial_toml() {
        let config = Config::from_toml_str("buffer_size = 64\n").unwrap();
        assert_eq!(config.buffer_size, 64);
        assert_eq!(config.pipe_count, 4);
        assert_eq!(config.poll_interval(), Duration::from_millis(10));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            Config::from_toml_str("buffer_size = 1"),
            Err(PipeError::Config(_))
        ));
        assert!(matches!(
            Config::from_toml_str("pipe_count = 0"),
            Err(PipeError::Config(_))
        ));
        assert!(matches!(
            Config::from_toml_str("pipe_count = \"four\""),
            Err(PipeError::Config(_))
        ));
    }
}
