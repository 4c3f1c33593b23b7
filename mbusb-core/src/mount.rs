//! Mounting both partitions under the working root, and tearing them down

use crate::error::UsbError;
use crate::layout::{MountLayout, ProvisionPlan};
use crate::runner::{CommandRunner, Invocation};
use tracing::{info, warn};

/// Owns the mounts made by [`mount_partitions`].
///
/// Dropping an armed guard unmounts everything best-effort, so a failure in
/// any later step does not leave the device busy. Call [`MountGuard::release`]
/// on the success path.
#[must_use = "dropping the guard unmounts the partitions"]
pub struct MountGuard<'a> {
    runner: &'a dyn CommandRunner,
    layout: &'a MountLayout,
    armed: bool,
}

impl<'a> MountGuard<'a> {
    fn new(runner: &'a dyn CommandRunner, layout: &'a MountLayout) -> Self {
        Self {
            runner,
            layout,
            armed: true,
        }
    }

    /// Unmount now.
    pub fn release(mut self) {
        self.armed = false;
        unmount_all(self.layout, self.runner);
    }
}

impl Drop for MountGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!("Step failed with partitions mounted, cleaning up");
            unmount_all(self.layout, self.runner);
        }
    }
}

/// Mount the system partition at the root and the EFI partition nested
/// inside it.
pub fn mount_partitions<'a>(
    plan: &'a ProvisionPlan,
    runner: &'a dyn CommandRunner,
) -> Result<MountGuard<'a>, UsbError> {
    let layout = &plan.layout;
    let efi_dir = layout.efi_dir();

    info!(
        "Mounting {} at {}",
        plan.device.system_partition().display(),
        layout.root().display()
    );
    runner.run(
        &Invocation::new("mount")
            .arg(plan.device.system_partition())
            .arg(layout.root()),
    )?;
    let guard = MountGuard::new(runner, layout);

    runner.run(&Invocation::new("mkdir").arg("-p").arg(&efi_dir))?;
    runner.run(
        &Invocation::new("mount")
            .arg(plan.device.efi_partition())
            .arg(&efi_dir),
    )?;

    Ok(guard)
}

/// Unmount the EFI mount point, then the root. Failures are logged and ignored.
pub fn unmount_all(layout: &MountLayout, runner: &dyn CommandRunner) {
    info!(
        "Unmounting {} and {}",
        layout.efi_dir().display(),
        layout.root().display()
    );
    runner.run_best_effort(&Invocation::new("umount").arg(layout.efi_dir()));
    runner.run_best_effort(&Invocation::new("umount").arg(layout.root()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::TargetDevice;
    use crate::layout::PayloadSource;
    use crate::runner::FakeRunner;

    fn plan() -> ProvisionPlan {
        ProvisionPlan {
            device: TargetDevice::new("/dev/sdx").unwrap(),
            layout: MountLayout::default(),
            payload: PayloadSource::new("/src"),
        }
    }

    #[test]
    fn test_release_unmounts_efi_then_root() {
        let runner = FakeRunner::new();
        let plan = plan();
        mount_partitions(&plan, &runner).unwrap().release();

        assert_eq!(
            runner.command_lines(),
            vec![
                "mount /dev/sdx2 /mnt",
                "mkdir -p /mnt/boot/efi",
                "mount /dev/sdx1 /mnt/boot/efi",
                "umount /mnt/boot/efi",
                "umount /mnt",
            ]
        );
    }

    #[test]
    fn test_failed_efi_mount_cleans_up() {
        let runner = FakeRunner::new().fail_on_arg("mount", "/dev/sdx1", 32);
        let plan = plan();
        let err = mount_partitions(&plan, &runner).err().unwrap();
        assert_eq!(err.exit_status(), 32);

        let lines = runner.command_lines();
        assert_eq!(&lines[lines.len() - 2..], ["umount /mnt/boot/efi", "umount /mnt"]);
    }

    #[test]
    fn test_failed_root_mount_leaves_nothing_to_clean() {
        let runner = FakeRunner::new().fail_on("mount", 32);
        let plan = plan();
        assert!(mount_partitions(&plan, &runner).is_err());
        assert_eq!(runner.command_lines(), vec!["mount /dev/sdx2 /mnt"]);
    }

    #[test]
    fn test_unmount_ignores_failures() {
        let runner = FakeRunner::new().fail_on("umount", 32);
        unmount_all(&MountLayout::new("/media/work"), &runner);
        assert_eq!(
            runner.command_lines(),
            vec!["umount /media/work/boot/efi", "umount /media/work"]
        );
    }
}
