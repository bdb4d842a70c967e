use std::fmt;
use std::io;

use groundlink_frame::FrameError;
use groundlink_link::LinkError;
use groundlink_registry::RegistryError;
use groundlink_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn registry_error(context: &str, err: RegistryError) -> CliError {
    match err {
        RegistryError::NotFound { .. } | RegistryError::UnknownTag(_) => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        RegistryError::LoadFailed(_) => CliError::new(FAILURE, format!("{context}: {err}")),
        RegistryError::TypeMismatch { .. }
        | RegistryError::OutOfRange { .. }
        | RegistryError::InvalidCatalog(_)
        | RegistryError::Json(_) => CliError::new(DATA_INVALID, format!("{context}: {err}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::EncodingTooLarge { .. }
        | FrameError::ExceedsMtu { .. }
        | FrameError::Framing { .. }
        | FrameError::UnknownTag(_)
        | FrameError::TypeMismatch { .. }
        | FrameError::Malformed(_)
        | FrameError::MissingTag => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        FrameError::Registry(err) => registry_error(context, err),
        other => CliError::new(FAILURE, format!("{context}: {other}")),
    }
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Io(source) => io_error(context, source),
        TransportError::InvalidConfig(_) => CliError::new(USAGE, format!("{context}: {err}")),
        TransportError::Timeout(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn link_error(context: &str, err: LinkError) -> CliError {
    match err {
        LinkError::Transport(err) => transport_error(context, err),
        LinkError::NoTransports => CliError::new(USAGE, format!("{context}: {err}")),
        LinkError::Spawn { .. } | LinkError::Shutdown => {
            CliError::new(INTERNAL, format!("{context}: {err}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lookup_failure_is_usage() {
        let err = registry_error(
            "bind",
            RegistryError::NotFound {
                group: "x".to_string(),
                name: "y".to_string(),
            },
        );
        assert_eq!(err.code, USAGE);
        assert_eq!(err.to_string(), "bind: variable 'x.y' not found");
    }

    #[test]
    fn bad_frame_is_data_invalid() {
        let err = frame_error("encode", FrameError::EncodingTooLarge { size: 300, max: 255 });
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn registry_rejection_inside_frame_keeps_its_mapping() {
        let err = frame_error(
            "decode",
            FrameError::Registry(RegistryError::OutOfRange {
                group: "desires".to_string(),
                name: "yaw".to_string(),
                value: 1e40,
            }),
        );
        assert_eq!(err.code, DATA_INVALID);
        assert!(err.message.contains("desires.yaw"));

        let err = frame_error("decode", FrameError::MissingTag);
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn bad_link_config_is_usage() {
        let err = transport_error("--serial", TransportError::InvalidConfig("x".to_string()));
        assert_eq!(err.code, USAGE);
        let err = link_error("start", LinkError::NoTransports);
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn io_errors_map_by_kind() {
        let err = io_error("read", io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(err.code, PERMISSION_DENIED);
        let err = io_error("read", io::Error::from(io::ErrorKind::TimedOut));
        assert_eq!(err.code, TIMEOUT);
    }
}
