//! Socket setup error type.

use std::io;

use thiserror::Error;

/// Error raised while building and configuring a socket.
///
/// Carries the name of the configuration step that failed together
/// with the original OS error, so callers can tell "address already in
/// use" from "permission denied" when logging or deciding whether to
/// retry. The failing descriptor is always closed before this error is
/// returned.
#[derive(Debug, Error)]
#[error("{op}: {source}")]
pub struct SetupError {
    op: &'static str,
    #[source]
    source: io::Error,
}

impl SetupError {
    pub(crate) fn os(op: &'static str, errno: rustix::io::Errno) -> Self {
        Self {
            op,
            source: errno.into(),
        }
    }

    /// The configuration step that failed (e.g. `"bind"`, `"IPV6_V6ONLY"`).
    #[must_use]
    pub const fn op(&self) -> &'static str {
        self.op
    }

    /// The raw OS error code from the failing call, when available.
    #[must_use]
    pub fn raw_os_error(&self) -> Option<i32> {
        self.source.raw_os_error()
    }
}

impl From<SetupError> for io::Error {
    fn from(err: SetupError) -> Self {
        // Keep the step name in the message and the OS error reachable
        // through source(); the kind survives for callers that match
        // on it.
        io::Error::new(err.source.kind(), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustix::io::Errno;

    #[test]
    fn preserves_os_error_code() {
        let err = SetupError::os("bind", Errno::ADDRINUSE);
        assert_eq!(err.op(), "bind");
        assert_eq!(err.raw_os_error(), Some(Errno::ADDRINUSE.raw_os_error()));
    }

    #[test]
    fn display_names_the_step() {
        let err = SetupError::os("IPV6_V6ONLY", Errno::NOPROTOOPT);
        let text = err.to_string();
        assert!(text.starts_with("IPV6_V6ONLY: "), "got: {text}");
    }

    #[test]
    fn io_error_conversion_keeps_step_kind_and_code() {
        use std::error::Error as _;

        let io_err: io::Error = SetupError::os("bind", Errno::ADDRINUSE).into();
        assert_eq!(io_err.kind(), io::ErrorKind::AddrInUse);
        assert!(io_err.to_string().contains("bind"), "got: {io_err}");

        let setup = io_err
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<SetupError>())
            .expect("inner SetupError");
        assert_eq!(setup.raw_os_error(), Some(Errno::ADDRINUSE.raw_os_error()));
        let os = setup.source().expect("OS error source");
        assert_eq!(
            os.downcast_ref::<io::Error>().and_then(io::Error::raw_os_error),
            Some(Errno::ADDRINUSE.raw_os_error())
        );
    }
}
