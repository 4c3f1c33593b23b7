//! Recording runner for tests
//!
//! Nothing is executed. Every call is appended to an in-memory history so
//! tests can assert on the exact order of external commands.

use super::{CommandRunner, Invocation, describe_pipeline};
use crate::error::UsbError;
use std::cell::RefCell;
use std::ffi::OsString;
use std::fmt;

/// A recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Command(Invocation),
    Pipeline(Vec<Invocation>),
}

impl Operation {
    /// Program of a command, or of the first pipeline stage.
    pub fn program(&self) -> &str {
        match self {
            Self::Command(inv) => inv.program(),
            Self::Pipeline(stages) => stages.first().map_or("", Invocation::program),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command(inv) => write!(f, "{inv}"),
            Self::Pipeline(stages) => f.write_str(&describe_pipeline(stages)),
        }
    }
}

#[derive(Debug, Clone)]
struct ScriptedFailure {
    program: String,
    arg: Option<OsString>,
    code: i32,
}

impl ScriptedFailure {
    fn matches(&self, invocation: &Invocation) -> bool {
        invocation.program() == self.program
            && self
                .arg
                .as_ref()
                .is_none_or(|arg| invocation.arguments().contains(arg))
    }
}

#[derive(Debug, Default)]
pub struct FakeRunner {
    history: RefCell<Vec<Operation>>,
    missing_tools: Vec<String>,
    failures: Vec<ScriptedFailure>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `tool` as absent from PATH.
    #[must_use]
    pub fn with_missing_tool(mut self, tool: impl Into<String>) -> Self {
        self.missing_tools.push(tool.into());
        self
    }

    /// Make every invocation of `program` exit with `code`.
    #[must_use]
    pub fn fail_on(mut self, program: impl Into<String>, code: i32) -> Self {
        self.failures.push(ScriptedFailure {
            program: program.into(),
            arg: None,
            code,
        });
        self
    }

    /// Make invocations of `program` that include `arg` exit with `code`.
    #[must_use]
    pub fn fail_on_arg(
        mut self,
        program: impl Into<String>,
        arg: impl Into<OsString>,
        code: i32,
    ) -> Self {
        self.failures.push(ScriptedFailure {
            program: program.into(),
            arg: Some(arg.into()),
            code,
        });
        self
    }

    pub fn history(&self) -> Vec<Operation> {
        self.history.borrow().clone()
    }

    /// History rendered as command lines.
    pub fn command_lines(&self) -> Vec<String> {
        self.history.borrow().iter().map(ToString::to_string).collect()
    }

    fn scripted_failure(&self, invocation: &Invocation) -> Option<i32> {
        self.failures
            .iter()
            .find(|failure| failure.matches(invocation))
            .map(|failure| failure.code)
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, invocation: &Invocation) -> Result<(), UsbError> {
        self.history
            .borrow_mut()
            .push(Operation::Command(invocation.clone()));

        match self.scripted_failure(invocation) {
            Some(code) => Err(UsbError::CommandFailed {
                command: invocation.to_string(),
                code: Some(code),
            }),
            None => Ok(()),
        }
    }

    fn pipeline(&self, stages: &[Invocation]) -> Result<(), UsbError> {
        self.history
            .borrow_mut()
            .push(Operation::Pipeline(stages.to_vec()));

        // rightmost failing stage wins, as with the real pipeline
        match stages.iter().rev().find_map(|s| self.scripted_failure(s)) {
            Some(code) => Err(UsbError::CommandFailed {
                command: describe_pipeline(stages),
                code: Some(code),
            }),
            None => Ok(()),
        }
    }

    fn has_tool(&self, tool: &str) -> bool {
        !self.missing_tools.iter().any(|missing| missing == tool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_order() {
        let runner = FakeRunner::new();
        runner.run(&Invocation::new("partprobe").arg("/dev/sdb")).unwrap();
        runner
            .pipeline(&[Invocation::new("tar"), Invocation::new("pv")])
            .unwrap();

        assert_eq!(
            runner.command_lines(),
            vec!["partprobe /dev/sdb".to_string(), "tar | pv".to_string()]
        );
        assert_eq!(runner.history()[1].program(), "tar");
    }

    #[test]
    fn test_scripted_failure_matches_argument() {
        let runner = FakeRunner::new().fail_on_arg("umount", "/dev/sdb1", 32);

        let err = runner
            .run(&Invocation::new("umount").arg("/dev/sdb1"))
            .unwrap_err();
        assert_eq!(err.exit_status(), 32);
        assert!(runner.run(&Invocation::new("umount").arg("/dev/sdb2")).is_ok());
        assert_eq!(runner.history().len(), 2);
    }

    #[test]
    fn test_missing_tool() {
        let runner = FakeRunner::new().with_missing_tool("pv");
        assert!(!runner.has_tool("pv"));
        assert!(runner.has_tool("tar"));
    }
}
