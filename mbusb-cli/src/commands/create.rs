//! The one and only command: build a multiboot drive on the given device

use crate::cli::Cli;
use crate::report::{RunReport, write_report};
use anyhow::Result;
use chrono::Utc;
use mbusb_core::{
    AssumeYes, CommandRunner, Confirm, ConsoleConfirm, DryRunRunner, DuctRunner, Journal,
    Privilege, ProvisionRequest, provision,
};
use tracing::{info, warn};

impl Cli {
    /// Turn parsed arguments into the run configuration.
    pub fn to_request(&self, privilege: Privilege) -> ProvisionRequest {
        ProvisionRequest {
            device: self.device.clone(),
            source_root: self.source_root(),
            mount_root: self.mount_root.clone(),
            privilege,
            require_root: !self.dry_run,
        }
    }
}

pub fn handle_create(cli: &Cli) -> Result<()> {
    let request = cli.to_request(Privilege::current());

    let runner: Box<dyn CommandRunner> = if cli.dry_run {
        info!("🧪 Dry run: commands are logged, not executed");
        Box::new(DryRunRunner::new())
    } else {
        Box::new(DuctRunner::new())
    };
    let confirm: Box<dyn Confirm> = if cli.yes {
        Box::new(AssumeYes)
    } else {
        Box::new(ConsoleConfirm)
    };

    let started = Utc::now();
    let mut journal = Journal::new();
    let result = provision(&request, runner.as_ref(), confirm.as_ref(), &mut journal);

    if let Some(path) = &cli.report {
        let report = RunReport::new(&request, cli.dry_run, started, Utc::now(), &journal);
        match write_report(&report, path) {
            Ok(()) => info!("📄 Report written to: {}", path.display()),
            // the provisioning error is the one worth exiting with
            Err(err) if result.is_err() => warn!("Could not write report: {err:#}"),
            Err(err) => return Err(err),
        }
    }

    let plan = result?;
    if cli.dry_run {
        println!("✅ Dry run for {} complete, no changes made.", plan.device);
    } else {
        println!("✅ USB multiboot drive created successfully on {}.", plan.device);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_dry_run_does_not_require_root() {
        let cli = Cli::try_parse_from(["mbusb", "--dry-run", "/dev/sdb"]).unwrap();
        let request = cli.to_request(Privilege::Unprivileged);
        assert!(!request.require_root);

        let cli = Cli::try_parse_from(["mbusb", "/dev/sdb"]).unwrap();
        assert!(cli.to_request(Privilege::Root).require_root);
    }
}
