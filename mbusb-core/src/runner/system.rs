//! Runners that act on the real host

use super::{CommandRunner, Invocation, describe_pipeline};
use crate::error::{CommandFailedSnafu, SpawnSnafu, UsbError};
use snafu::{ResultExt, ensure};
use std::ffi::OsStr;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use tracing::{debug, info};

/// Runs commands for real using `duct`.
///
/// stdout and stderr are inherited so the operator sees tool output,
/// including `pv`'s progress bar.
#[derive(Debug, Default, Clone, Copy)]
pub struct DuctRunner;

impl DuctRunner {
    pub fn new() -> Self {
        Self
    }
}

fn expression(invocation: &Invocation) -> duct::Expression {
    let expr = duct::cmd(invocation.program(), invocation.arguments());
    match invocation.stdin_bytes() {
        Some(bytes) => expr.stdin_bytes(bytes.to_vec()),
        None => expr,
    }
}

fn check_status(command: String, status: ExitStatus) -> Result<(), UsbError> {
    ensure!(
        status.success(),
        CommandFailedSnafu {
            command,
            code: status.code(),
        }
    );
    Ok(())
}

impl CommandRunner for DuctRunner {
    fn run(&self, invocation: &Invocation) -> Result<(), UsbError> {
        let command = invocation.to_string();
        info!("Running: {command}");

        let output = expression(invocation)
            .unchecked()
            .run()
            .context(SpawnSnafu {
                command: command.clone(),
            })?;

        check_status(command, output.status)
    }

    fn pipeline(&self, stages: &[Invocation]) -> Result<(), UsbError> {
        let command = describe_pipeline(stages);
        info!("Running: {command}");

        let mut exprs = stages.iter().map(expression);
        let Some(first) = exprs.next() else {
            return Ok(());
        };
        let piped = exprs.fold(first, |left, right| left.pipe(right));

        // duct reports the rightmost failing stage, like `set -o pipefail`
        let output = piped.unchecked().run().context(SpawnSnafu {
            command: command.clone(),
        })?;

        check_status(command, output.status)
    }

    fn has_tool(&self, tool: &str) -> bool {
        let found = std::env::var_os("PATH").and_then(|path| find_in_path(tool, &path));
        debug!(tool, found = ?found, "tool lookup");
        found.is_some()
    }
}

/// First executable named `tool` in the directories of `path_var`.
pub fn find_in_path(tool: &str, path_var: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(path_var)
        .map(|dir| dir.join(tool))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    // follows symlinks, so /usr/sbin -> /usr/bin style layouts resolve
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Logs every command instead of running it.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunRunner;

impl DryRunRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for DryRunRunner {
    fn run(&self, invocation: &Invocation) -> Result<(), UsbError> {
        info!("[dry-run] {invocation}");
        if let Some(bytes) = invocation.stdin_bytes() {
            debug!(
                "[dry-run]   stdin: {}",
                String::from_utf8_lossy(bytes).escape_debug()
            );
        }
        Ok(())
    }

    fn pipeline(&self, stages: &[Invocation]) -> Result<(), UsbError> {
        info!("[dry-run] {}", describe_pipeline(stages));
        Ok(())
    }

    fn has_tool(&self, _tool: &str) -> bool {
        true
    }
}
