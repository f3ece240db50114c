//! Error types and handling for Stagehand
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//! Every fatal condition of an installation run is one of these variants; the
//! binary prints it and exits with status 1.

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for Stagehand operations
#[derive(Error, Diagnostic, Debug)]
pub enum StagehandError {
    // Host prerequisites
    #[error("This installer must be run as root")]
    #[diagnostic(
        code(stagehand::host::not_privileged),
        help("Re-run with: sudo stagehand install")
    )]
    PrivilegeRequired,

    #[error("Low disk space: {available_gb:.1}GB available, {required_gb}GB required")]
    #[diagnostic(code(stagehand::host::disk_space))]
    InsufficientDiskSpace { available_gb: f64, required_gb: u64 },

    #[error("Failed to inspect host: {reason}")]
    #[diagnostic(code(stagehand::host::probe_failed))]
    HostProbeFailed { reason: String },

    // Command execution
    #[error("{description} failed (exit code {exit_code})")]
    #[diagnostic(
        code(stagehand::exec::command_failed),
        help("The run log contains the full command output")
    )]
    CommandFailed {
        description: String,
        exit_code: String,
    },

    #[error("Command not found: {program}")]
    #[diagnostic(
        code(stagehand::exec::not_found),
        help("Install the missing tool or check PATH")
    )]
    CommandNotFound { program: String },

    #[error("Command '{command}' timed out after {seconds}s")]
    #[diagnostic(code(stagehand::exec::timed_out))]
    CommandTimedOut { command: String, seconds: u64 },

    #[error("Refusing to run an empty command")]
    #[diagnostic(code(stagehand::exec::empty_command))]
    EmptyCommand,

    // Fallback chains
    #[error("No strategy could provide {capability}")]
    #[diagnostic(
        code(stagehand::fallback::exhausted),
        help("Every installation method failed; see the run log for each attempt")
    )]
    CapabilityUnavailable { capability: String },

    // Configuration
    #[error("Invalid domain or IP address: '{value}'")]
    #[diagnostic(
        code(stagehand::config::invalid_domain),
        help("Use a hostname such as poll.example.com or a literal IP address")
    )]
    InvalidDomain { value: String },

    #[error("Invalid email address: '{value}'")]
    #[diagnostic(
        code(stagehand::config::invalid_email),
        help("A valid email is required to request TLS certificates")
    )]
    InvalidEmail { value: String },

    #[error("Invalid installation directory: '{path}': {reason}")]
    #[diagnostic(code(stagehand::config::invalid_install_dir))]
    InvalidInstallDir { path: String, reason: String },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(stagehand::config::invalid))]
    ConfigInvalid { message: String },

    #[error("Failed to read answers file: {path}")]
    #[diagnostic(code(stagehand::config::read_failed))]
    ConfigReadFailed { path: String, reason: String },

    #[error("Failed to parse answers file: {path}: {reason}")]
    #[diagnostic(code(stagehand::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    #[error("Configuration has not been collected yet")]
    #[diagnostic(code(stagehand::config::not_collected))]
    ConfigurationMissing,

    // Application assets
    #[error("Frontend build verification failed: {path} is missing")]
    #[diagnostic(
        code(stagehand::app::build_missing),
        help("Check the frontend build output in the run log")
    )]
    BuildVerificationFailed { path: String },

    // File system
    #[error("Failed to write file: {path}: {reason}")]
    #[diagnostic(code(stagehand::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(stagehand::fs::io_error))]
    IoError { message: String },

    // Interaction
    #[error("Installation cancelled by user")]
    #[diagnostic(code(stagehand::prompt::cancelled))]
    Cancelled,

    #[error("Prompt failed: {message}")]
    #[diagnostic(code(stagehand::prompt::failed))]
    PromptFailed { message: String },

    // Run outcomes
    #[error("Installation aborted: {reason}")]
    #[diagnostic(
        code(stagehand::run::aborted),
        help("Fix the problem and re-run the installer from the start")
    )]
    Aborted { reason: String },

    #[error("{failed} verification item(s) failed")]
    #[diagnostic(code(stagehand::verify::failed))]
    VerificationFailed { failed: usize },

    #[error("Host is not ready: {issues} issue(s) found")]
    #[diagnostic(code(stagehand::check::not_ready))]
    NotReady { issues: usize },
}

impl StagehandError {
    /// Whether this error came from the operator rather than from the host
    pub fn is_cancellation(&self) -> bool {
        matches!(self, StagehandError::Cancelled)
    }
}

impl From<std::io::Error> for StagehandError {
    fn from(err: std::io::Error) -> Self {
        StagehandError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for StagehandError {
    fn from(err: serde_yaml::Error) -> Self {
        StagehandError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for StagehandError {
    fn from(err: serde_json::Error) -> Self {
        StagehandError::IoError {
            message: format!("JSON serialization failed: {err}"),
        }
    }
}

impl From<inquire::InquireError> for StagehandError {
    fn from(err: inquire::InquireError) -> Self {
        match err {
            inquire::InquireError::OperationCanceled
            | inquire::InquireError::OperationInterrupted => StagehandError::Cancelled,
            other => StagehandError::PromptFailed {
                message: other.to_string(),
            },
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, StagehandError>;

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_error_contains {
        ($test_name:ident, $err:expr, $($contains:expr),+ $(,)?) => {
            #[test]
            fn $test_name() {
                let err = $err;
                let error_string = err.to_string();
                $(
                    assert!(error_string.contains($contains),
                        "Error message should contain '{}', got: {}",
                        $contains,
                        error_string
                    );
                )+
            }
        };
    }

    test_error_contains!(
        test_command_failed_display,
        StagehandError::CommandFailed {
            description: "Installing Nginx".to_string(),
            exit_code: "100".to_string(),
        },
        "Installing Nginx failed",
        "exit code 100"
    );

    test_error_contains!(
        test_disk_space_display,
        StagehandError::InsufficientDiskSpace {
            available_gb: 1.31,
            required_gb: 2,
        },
        "1.3GB available",
        "2GB required"
    );

    test_error_contains!(
        test_capability_display,
        StagehandError::CapabilityUnavailable {
            capability: "a compatible Node.js runtime".to_string(),
        },
        "Node.js runtime"
    );

    #[test]
    fn test_error_code() {
        let err = StagehandError::PrivilegeRequired;
        assert_eq!(
            err.code().map(|c| c.to_string()),
            Some("stagehand::host::not_privileged".to_string())
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: StagehandError = io_err.into();
        assert!(matches!(err, StagehandError::IoError { .. }));
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_prompt_interrupt_is_cancellation() {
        let err: StagehandError = inquire::InquireError::OperationInterrupted.into();
        assert!(err.is_cancellation());

        let err: StagehandError = inquire::InquireError::OperationCanceled.into();
        assert!(err.is_cancellation());
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_err = serde_yaml::from_str::<Vec<String>>("{not: [a list").unwrap_err();
        let err: StagehandError = yaml_err.into();
        assert!(matches!(err, StagehandError::ConfigParseFailed { .. }));
    }
}
