//! Error types surfaced by the window service and coordinator setup.
//!
//! Most overlay operations stay best-effort and only log when a collaborator
//! is missing; the errors here cover the window service status codes and the
//! few setup paths whose failure must reach the caller.

use thiserror::Error;

/// Non-OK status returned by the window service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WmError {
    #[error("window is invalid or already destroyed")]
    InvalidWindow,
    #[error("invalid parameter")]
    InvalidParam,
    #[error("permission denied")]
    NoPermission,
    #[error("operation denied by window manager")]
    Denied,
    #[error("window manager service unavailable")]
    ServiceUnavailable,
    #[error("window manager error code {0}")]
    Other(i32),
}

impl WmError {
    /// Numeric status code, as logged by the window service.
    pub fn code(&self) -> i32 {
        match self {
            WmError::InvalidWindow => 3,
            WmError::InvalidParam => 5,
            WmError::NoPermission => 7,
            WmError::Denied => 8,
            WmError::ServiceUnavailable => 9,
            WmError::Other(code) => *code,
        }
    }
}

pub type WmResult<T = ()> = Result<T, WmError>;

/// Why a subwindow (or its toast/dialog window) could not be initialized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitError {
    #[error("parent container {0} not found")]
    ParentContainerMissing(i32),
    #[error("parent container {0} has no pipeline")]
    ParentPipelineMissing(i32),
    #[error("parent container {0} has no window")]
    ParentWindowMissing(i32),
    #[error("display {0} not found")]
    DisplayMissing(u64),
    #[error("ui extension host window {0} is not ready; check window permissions")]
    HostWindowNotReady(u32),
    #[error("window creation failed: {0}")]
    WindowCreate(#[from] WmError),
    #[error("window surface is missing")]
    SurfaceMissing,
    #[error("child container for window {0} not found")]
    ChildContainerMissing(u32),
    #[error("child container {0} has no pipeline")]
    SubPipelineMissing(i32),
    #[error("toast/dialog window is not created")]
    DialogWindowMissing,
}

/// Failure loading the application configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config line {line}: {reason}")]
    Parse { line: usize, reason: String },
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wm_error_codes_are_stable() {
        assert_eq!(WmError::InvalidWindow.code(), 3);
        assert_eq!(WmError::Other(42).code(), 42);
    }

    #[test]
    fn init_error_wraps_wm_error() {
        let err: InitError = WmError::Denied.into();
        assert_eq!(err, InitError::WindowCreate(WmError::Denied));
        assert!(err.to_string().contains("denied"));
    }
}
