use std::str::FromStr;
use std::time::Duration;

use groundlink_frame::{PacketWriter, StreamReader};
use serialport::SerialPort;
use tracing::debug;

use crate::config::parse_duration;
use crate::error::{Result, TransportError};
use crate::traits::Medium;

/// Default packet size for a serial link.
pub const SERIAL_MTU: usize = 256;

/// Serial link settings.
///
/// Parses from `path=/dev/ttyACM0,baud=115200,readTimeout=100ms`. A leading
/// token without `=` is taken as the path, so `/dev/ttyUSB0,baud=57600` works
/// too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    pub path: String,
    pub baud: u32,
    /// Per-read timeout; also bounds each write.
    pub read_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            path: "/dev/ttyACM0".to_string(),
            baud: 115_200,
            read_timeout: Duration::from_millis(100),
        }
    }
}

impl FromStr for SerialConfig {
    type Err = TransportError;

    fn from_str(input: &str) -> Result<Self> {
        let mut config = SerialConfig::default();
        for (index, token) in input.split(',').map(str::trim).enumerate() {
            if token.is_empty() {
                continue;
            }
            let Some((key, value)) = token.split_once('=') else {
                if index == 0 {
                    config.path = token.to_string();
                    continue;
                }
                return Err(TransportError::InvalidConfig(format!(
                    "expected key=value, got '{token}'"
                )));
            };
            match key.trim() {
                "path" => config.path = value.trim().to_string(),
                "baud" => {
                    config.baud = value.trim().parse().map_err(|_| {
                        TransportError::InvalidConfig(format!("invalid baud rate: {value}"))
                    })?
                }
                "readTimeout" => config.read_timeout = parse_duration(value)?,
                other => {
                    return Err(TransportError::InvalidConfig(format!(
                        "unknown serial option '{other}'"
                    )))
                }
            }
        }
        if config.path.is_empty() {
            return Err(TransportError::InvalidConfig(
                "serial path must not be empty".to_string(),
            ));
        }
        Ok(config)
    }
}

/// A serial device carrying a continuous byte stream of frames.
pub struct SerialMedium {
    name: String,
    config: SerialConfig,
    mtu: usize,
}

impl SerialMedium {
    pub fn new(config: SerialConfig) -> Self {
        Self {
            name: format!("serial:{}", config.path),
            config,
            mtu: SERIAL_MTU,
        }
    }

    pub fn with_mtu(mut self, mtu: usize) -> Self {
        self.mtu = mtu;
        self
    }

    pub fn config(&self) -> &SerialConfig {
        &self.config
    }
}

impl Medium for SerialMedium {
    type Reader = StreamReader<Box<dyn SerialPort>>;
    type Writer = PacketWriter<Box<dyn SerialPort>>;

    fn name(&self) -> &str {
        &self.name
    }

    fn mtu(&self) -> usize {
        self.mtu
    }

    fn open(&mut self) -> Result<(Self::Reader, Self::Writer)> {
        let port = serialport::new(&self.config.path, self.config.baud)
            .timeout(self.config.read_timeout)
            .open()?;
        let write_half = port.try_clone()?;

        debug!(
            path = %self.config.path,
            baud = self.config.baud,
            "serial port opened"
        );

        Ok((
            StreamReader::new(port, self.config.read_timeout),
            PacketWriter::new(write_half),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_form() {
        let config: SerialConfig = "path=/dev/ttyUSB1,baud=57600,readTimeout=250ms"
            .parse()
            .unwrap();
        assert_eq!(config.path, "/dev/ttyUSB1");
        assert_eq!(config.baud, 57_600);
        assert_eq!(config.read_timeout, Duration::from_millis(250));
    }

    #[test]
    fn parse_bare_path_keeps_defaults() {
        let config: SerialConfig = "/dev/ttyACM3".parse().unwrap();
        assert_eq!(config.path, "/dev/ttyACM3");
        assert_eq!(config.baud, 115_200);
        assert_eq!(config.read_timeout, Duration::from_millis(100));
    }

    #[test]
    fn parse_bare_path_with_options() {
        let config: SerialConfig = "/dev/ttyS0, baud=9600".parse().unwrap();
        assert_eq!(config.path, "/dev/ttyS0");
        assert_eq!(config.baud, 9600);
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!("path=/dev/x,baud=fast".parse::<SerialConfig>().is_err());
        assert!("path=/dev/x,parity=odd".parse::<SerialConfig>().is_err());
        assert!("/dev/x,/dev/y".parse::<SerialConfig>().is_err());
        assert!("path=".parse::<SerialConfig>().is_err());
        assert!("path=/dev/x,readTimeout=0ms".parse::<SerialConfig>().is_err());
    }

    #[test]
    fn medium_name_includes_path() {
        let medium = SerialMedium::new("/dev/ttyACM0".parse().unwrap());
        assert_eq!(medium.name(), "serial:/dev/ttyACM0");
        assert_eq!(medium.mtu(), SERIAL_MTU);
        assert_eq!(medium.with_mtu(64).mtu(), 64);
    }

    #[test]
    fn open_missing_device_fails() {
        let mut medium = SerialMedium::new(SerialConfig {
            path: "/nonexistent/groundlink-serial".to_string(),
            ..SerialConfig::default()
        });
        assert!(medium.open().is_err());
    }
}
