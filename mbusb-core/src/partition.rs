//! Partition table creation

use crate::confirm::Confirm;
use crate::error::{DeclinedSnafu, UsbError};
use crate::layout::{EFI_SIZE, ProvisionPlan};
use crate::runner::{CommandRunner, Invocation};
use snafu::ensure;
use tracing::{info, warn};

/// fdisk keystrokes for a fresh DOS table with two primary partitions:
/// partition 1 of `efi_size` typed W95 FAT32 (LBA), partition 2 taking the rest.
pub fn fdisk_script(efi_size: &str) -> String {
    [
        "o", // new empty DOS partition table
        "n", "p", "1", "", efi_size, // partition 1
        "t", "c", // type W95 FAT32 (LBA)
        "n", "p", "2", "", "", // partition 2, remaining space
        "w",
    ]
    .iter()
    .fold(String::new(), |mut script, line| {
        script.push_str(line);
        script.push('\n');
        script
    })
}

/// Confirm, replace the partition table, and have the kernel re-read it.
pub fn partition_device(
    plan: &ProvisionPlan,
    runner: &dyn CommandRunner,
    confirm: &dyn Confirm,
) -> Result<(), UsbError> {
    warn!("Partitioning {} (ALL DATA WILL BE LOST)", plan.device);
    ensure!(
        confirm.confirm("Are you sure you want to continue")?,
        DeclinedSnafu
    );

    info!("Writing partition table to {}", plan.device);
    runner.run(
        &Invocation::new("fdisk")
            .arg(plan.device.path())
            .stdin(fdisk_script(EFI_SIZE)),
    )?;

    runner.run(&Invocation::new("partprobe").arg(plan.device.path()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fdisk_script_matches_layout() {
        assert_eq!(
            fdisk_script("+300M"),
            "o\nn\np\n1\n\n+300M\nt\nc\nn\np\n2\n\n\nw\n"
        );
    }
}
