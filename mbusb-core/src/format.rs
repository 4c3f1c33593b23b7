//! Filesystem creation on both partitions

use crate::error::UsbError;
use crate::layout::{EFI_LABEL, ProvisionPlan, SYSTEM_LABEL};
use crate::runner::{CommandRunner, Invocation};
use tracing::info;

pub fn format_partitions(plan: &ProvisionPlan, runner: &dyn CommandRunner) -> Result<(), UsbError> {
    let efi = plan.device.efi_partition();
    let system = plan.device.system_partition();

    info!("Formatting partitions");
    // desktop automounters may have grabbed the fresh partitions
    runner.run_best_effort(&Invocation::new("umount").arg(&efi));
    runner.run_best_effort(&Invocation::new("umount").arg(&system));

    runner.run(
        &Invocation::new("mkfs.vfat")
            .args(["-F", "32", "-n", EFI_LABEL])
            .arg(&efi),
    )?;
    runner.run(
        &Invocation::new("mkfs.ext4")
            .args(["-F", "-L", SYSTEM_LABEL])
            .arg(&system),
    )?;
    Ok(())
}
