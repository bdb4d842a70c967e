use std::time::Duration;

use crate::error::{Result, TransportError};

/// Timing of a transport worker.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Fixed pause between connection attempts.
    pub retry_interval: Duration,
    /// Upper bound on one wireless write.
    pub write_timeout: Duration,
    /// How long an inbound message waits for the pump before it is dropped.
    pub handoff_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            retry_interval: Duration::from_millis(250),
            write_timeout: Duration::from_secs(1),
            handoff_timeout: Duration::from_millis(100),
        }
    }
}

/// Parse `150ms`, `2s`, or a bare number of seconds.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(TransportError::InvalidConfig(
            "duration must not be empty".to_string(),
        ));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| TransportError::InvalidConfig(format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(TransportError::InvalidConfig(
            "duration must be greater than zero".to_string(),
        ));
    }

    if millis {
        Ok(Duration::from_millis(value))
    } else {
        Ok(Duration::from_secs(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = TransportConfig::default();
        assert_eq!(config.retry_interval, Duration::from_millis(250));
        assert_eq!(config.write_timeout, Duration::from_secs(1));
        assert_eq!(config.handoff_timeout, Duration::from_millis(100));
    }

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration(" 3 ").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
        assert!(parse_duration("-5ms").is_err());
    }
}
