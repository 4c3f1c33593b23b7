//! The provisioning sequence
//!
//! Strictly linear, no retries:
//! `Init → Validated → Partitioned → Formatted → Mounted →
//! BootloaderInstalled → PayloadCopied → Unmounted`.
//! A fatal error anywhere moves the run to `Aborted`. Once the partitions are
//! mounted, an abort still unmounts them (see [`crate::mount::MountGuard`]).

use crate::confirm::Confirm;
use crate::error::UsbError;
use crate::layout::{ProvisionPlan, ProvisionRequest};
use crate::runner::CommandRunner;
use crate::{format, grub, mount, partition, payload, preflight};
use serde::Serialize;
use std::fmt;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Init,
    Validated,
    Partitioned,
    Formatted,
    Mounted,
    BootloaderInstalled,
    PayloadCopied,
    Unmounted,
    Aborted,
}

impl Stage {
    /// Stage that follows this one on success.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Init => Some(Self::Validated),
            Self::Validated => Some(Self::Partitioned),
            Self::Partitioned => Some(Self::Formatted),
            Self::Formatted => Some(Self::Mounted),
            Self::Mounted => Some(Self::BootloaderInstalled),
            Self::BootloaderInstalled => Some(Self::PayloadCopied),
            Self::PayloadCopied => Some(Self::Unmounted),
            Self::Unmounted | Self::Aborted => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Validated => "validated",
            Self::Partitioned => "partitioned",
            Self::Formatted => "formatted",
            Self::Mounted => "mounted",
            Self::BootloaderInstalled => "bootloader-installed",
            Self::PayloadCopied => "payload-copied",
            Self::Unmounted => "unmounted",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Why a run ended in `Aborted`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    /// Stage the run was trying to reach.
    pub during: Stage,
    pub message: String,
}

/// Record of the stages a run went through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Journal {
    reached: Vec<Stage>,
    failure: Option<Failure>,
}

impl Default for Journal {
    fn default() -> Self {
        Self {
            reached: vec![Stage::Init],
            failure: None,
        }
    }
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Stage {
        if self.failure.is_some() {
            Stage::Aborted
        } else {
            self.reached.last().copied().unwrap_or(Stage::Init)
        }
    }

    pub fn reached(&self) -> &[Stage] {
        &self.reached
    }

    pub fn failure(&self) -> Option<&Failure> {
        self.failure.as_ref()
    }

    pub fn is_complete(&self) -> bool {
        self.current() == Stage::Unmounted
    }

    fn advance(&mut self, stage: Stage) {
        info!("Stage reached: {stage}");
        self.reached.push(stage);
    }

    fn abort(&mut self, err: &UsbError) {
        let during = self.current().next().unwrap_or(Stage::Aborted);
        error!("Aborted while moving to {during}: {err}");
        self.failure = Some(Failure {
            during,
            message: err.to_string(),
        });
    }
}

/// Run the whole sequence for one device.
///
/// `journal` is filled in as stages complete, including on failure.
pub fn provision(
    request: &ProvisionRequest,
    runner: &dyn CommandRunner,
    confirm: &dyn Confirm,
    journal: &mut Journal,
) -> Result<ProvisionPlan, UsbError> {
    let result = preflight::validate(request, runner).and_then(|plan| {
        journal.advance(Stage::Validated);
        run_steps(&plan, runner, confirm, journal).map(|()| plan)
    });

    if let Err(err) = &result {
        journal.abort(err);
    }
    result
}

fn run_steps(
    plan: &ProvisionPlan,
    runner: &dyn CommandRunner,
    confirm: &dyn Confirm,
    journal: &mut Journal,
) -> Result<(), UsbError> {
    partition::partition_device(plan, runner, confirm)?;
    journal.advance(Stage::Partitioned);

    format::format_partitions(plan, runner)?;
    journal.advance(Stage::Formatted);

    let mounts = mount::mount_partitions(plan, runner)?;
    journal.advance(Stage::Mounted);

    grub::install_bootloaders(plan, runner)?;
    journal.advance(Stage::BootloaderInstalled);

    payload::copy_payload(plan, runner)?;
    journal.advance(Stage::PayloadCopied);

    mounts.release();
    journal.advance(Stage::Unmounted);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order_is_linear() {
        let mut stage = Stage::Init;
        let mut seen = vec![stage];
        while let Some(next) = stage.next() {
            seen.push(next);
            stage = next;
        }
        assert_eq!(seen.len(), 8);
        assert_eq!(stage, Stage::Unmounted);
        assert_eq!(Stage::Aborted.next(), None);
    }

    #[test]
    fn test_journal_abort_records_target_stage() {
        let mut journal = Journal::new();
        journal.advance(Stage::Validated);
        journal.abort(&UsbError::Declined);

        assert_eq!(journal.current(), Stage::Aborted);
        let failure = journal.failure().unwrap();
        assert_eq!(failure.during, Stage::Partitioned);
        assert!(failure.message.contains("not confirmed"));
        assert!(!journal.is_complete());
    }

    #[test]
    fn test_stage_display_matches_serde_name() {
        assert_eq!(Stage::BootloaderInstalled.to_string(), "bootloader-installed");
    }
}
