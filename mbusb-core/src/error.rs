//! Error type shared by every provisioning step
//!
//! Variants fall into the categories an operator actually sees:
//! - **Precondition errors**: detected locally before anything is touched
//! - **Declined**: the destructive-action prompt was not answered "yes"
//! - **Command failures**: an external tool exited non-zero or could not start

use snafu::Snafu;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum UsbError {
    // ── Precondition errors ──────────────────────────────────────────

    #[snafu(display("please run as root or with sudo"))]
    NotRoot,

    #[snafu(display("invalid device path {}: {reason}", device.display()))]
    InvalidDevice { device: PathBuf, reason: String },

    #[snafu(display("device {} not found", device.display()))]
    DeviceNotFound { device: PathBuf },

    #[snafu(display("source directory not found: {}", path.display()))]
    SourceMissing { path: PathBuf },

    #[snafu(display("required tool `{tool}` not found in PATH"))]
    MissingTool { tool: String },

    // ── Operator input ───────────────────────────────────────────────

    #[snafu(display("aborted: destructive action was not confirmed"))]
    Declined,

    #[snafu(display("failed to read confirmation from the console"))]
    Prompt { source: std::io::Error },

    // ── External commands ────────────────────────────────────────────

    #[snafu(display("failed to execute `{command}`"))]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[snafu(display("`{command}` {}", describe_status(*code)))]
    CommandFailed { command: String, code: Option<i32> },

    #[snafu(display("failed to measure {}", path.display()))]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
}

fn describe_status(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {code}"),
        None => "was terminated by a signal".to_string(),
    }
}

impl UsbError {
    /// Process exit status for this error.
    ///
    /// A failed external command passes its own status through; everything
    /// else exits with 1.
    pub fn exit_status(&self) -> u8 {
        match self {
            Self::CommandFailed {
                code: Some(code), ..
            } => u8::try_from(*code).ok().filter(|c| *c != 0).unwrap_or(1),
            _ => 1,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_status())
    }

    /// True for errors raised before any device mutation could have happened.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::NotRoot
                | Self::InvalidDevice { .. }
                | Self::DeviceNotFound { .. }
                | Self::SourceMissing { .. }
                | Self::MissingTool { .. }
                | Self::Declined
                | Self::Prompt { .. }
        )
    }
}
