//! GRUB installation for legacy BIOS and UEFI firmware

use crate::error::UsbError;
use crate::layout::ProvisionPlan;
use crate::runner::{CommandRunner, Invocation};
use std::ffi::OsString;
use std::path::Path;
use tracing::info;

pub const BIOS_TARGET: &str = "i386-pc";
pub const UEFI_TARGET: &str = "x86_64-efi";

/// `--name=<path>` as a single argument.
fn path_flag(name: &str, path: &Path) -> OsString {
    let mut flag = OsString::from(format!("--{name}="));
    flag.push(path.as_os_str());
    flag
}

/// BIOS install, written to the raw device rather than a partition.
pub fn bios_invocation(plan: &ProvisionPlan) -> Invocation {
    Invocation::new("grub-install")
        .arg(format!("--target={BIOS_TARGET}"))
        .arg(path_flag("boot-directory", &plan.layout.boot_dir()))
        .arg(plan.device.path())
}

/// Removable UEFI install: firmware finds `EFI/BOOT/BOOTX64.EFI` on its own,
/// so the host's NVRAM boot entries are left untouched.
pub fn uefi_invocation(plan: &ProvisionPlan) -> Invocation {
    Invocation::new("grub-install")
        .arg(format!("--target={UEFI_TARGET}"))
        .arg(path_flag("efi-directory", &plan.layout.efi_dir()))
        .arg(path_flag("boot-directory", &plan.layout.boot_dir()))
        .args(["--removable", "--no-nvram"])
}

pub fn install_bootloaders(
    plan: &ProvisionPlan,
    runner: &dyn CommandRunner,
) -> Result<(), UsbError> {
    info!("Installing GRUB (BIOS mode)");
    runner.run(&bios_invocation(plan))?;

    info!("Installing GRUB (UEFI mode)");
    runner.run(&uefi_invocation(plan))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::TargetDevice;
    use crate::layout::{MountLayout, PayloadSource};

    fn plan(device: &str) -> ProvisionPlan {
        ProvisionPlan {
            device: TargetDevice::new(device).unwrap(),
            layout: MountLayout::default(),
            payload: PayloadSource::new("/src"),
        }
    }

    #[test]
    fn test_bios_targets_raw_device() {
        assert_eq!(
            bios_invocation(&plan("/dev/nvme0n1")).to_string(),
            "grub-install --target=i386-pc --boot-directory=/mnt/boot /dev/nvme0n1"
        );
    }

    #[test]
    fn test_uefi_is_removable_without_nvram() {
        assert_eq!(
            uefi_invocation(&plan("/dev/sdb")).to_string(),
            "grub-install --target=x86_64-efi --efi-directory=/mnt/boot/efi \
             --boot-directory=/mnt/boot --removable --no-nvram"
        );
    }
}
