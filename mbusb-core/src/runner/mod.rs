//! External command execution
//!
//! Every step talks to the system through [`CommandRunner`], so the same
//! workflow drives real tools ([`DuctRunner`]), a logging-only dry run
//! ([`DryRunRunner`]) or a recording fake for tests ([`FakeRunner`]).

pub mod fake;
pub mod system;

pub use fake::{FakeRunner, Operation};
pub use system::{DryRunRunner, DuctRunner};

use crate::error::UsbError;
use std::ffi::{OsStr, OsString};
use std::fmt;
use tracing::warn;

/// One external command: program, argv and optional stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<OsString>,
    stdin: Option<Vec<u8>>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Bytes written to the command's stdin.
    #[must_use]
    pub fn stdin(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(bytes.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }

    pub fn stdin_bytes(&self) -> Option<&[u8]> {
        self.stdin.as_deref()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Render a pipeline the way a shell would show it.
pub fn describe_pipeline(stages: &[Invocation]) -> String {
    stages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Capability to run external commands and report their exit status.
pub trait CommandRunner {
    /// Run one command to completion; non-zero exit is an error.
    fn run(&self, invocation: &Invocation) -> Result<(), UsbError>;

    /// Run the stages with each stdout connected to the next stdin and wait
    /// for all of them. Fails if any stage fails.
    fn pipeline(&self, stages: &[Invocation]) -> Result<(), UsbError>;

    /// Whether `tool` can be found in PATH.
    fn has_tool(&self, tool: &str) -> bool;

    /// Run a command whose failure is expected and harmless.
    fn run_best_effort(&self, invocation: &Invocation) {
        if let Err(err) = self.run(invocation) {
            warn!("Ignoring failure: {err}");
        }
    }
}
