//! Preflight checks run before anything destructive happens
//!
//! Validates privilege, the device argument, the payload source tree and the
//! presence of every external tool, then produces the immutable
//! [`ProvisionPlan`] the remaining steps work from.

use crate::device::TargetDevice;
use crate::error::{DeviceNotFoundSnafu, MissingToolSnafu, NotRootSnafu, UsbError};
use crate::layout::{MountLayout, PayloadSource, ProvisionPlan, ProvisionRequest};
use crate::payload;
use crate::runner::CommandRunner;
use snafu::ensure;
use tracing::{debug, info};

/// External tools the workflow invokes.
pub const REQUIRED_TOOLS: &[&str] = &[
    "fdisk",
    "partprobe",
    "umount",
    "mkfs.vfat",
    "mkfs.ext4",
    "mount",
    "mkdir",
    "grub-install",
    "tar",
    "pv",
];

/// Privilege of the running process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privilege {
    Root,
    Unprivileged,
}

impl Privilege {
    /// Read the effective uid of this process.
    pub fn current() -> Self {
        // SAFETY: geteuid has no preconditions and cannot fail
        let euid = unsafe { libc::geteuid() };
        Self::from_euid(euid)
    }

    pub fn from_euid(euid: u32) -> Self {
        if euid == 0 { Self::Root } else { Self::Unprivileged }
    }

    pub fn is_root(self) -> bool {
        self == Self::Root
    }
}

/// Check that every required tool is in PATH.
pub fn check_tools(runner: &dyn CommandRunner) -> Result<(), UsbError> {
    for tool in REQUIRED_TOOLS {
        let found = runner.has_tool(tool);
        debug!(tool, found, "checking tool");
        ensure!(found, MissingToolSnafu { tool: *tool });
    }
    Ok(())
}

/// Validate a request into a plan. Nothing is executed except tool lookups.
pub fn validate(
    request: &ProvisionRequest,
    runner: &dyn CommandRunner,
) -> Result<ProvisionPlan, UsbError> {
    if request.require_root {
        ensure!(request.privilege.is_root(), NotRootSnafu);
    }

    let device = TargetDevice::new(request.device.clone())?;
    ensure!(
        device.path().exists(),
        DeviceNotFoundSnafu {
            device: device.path().to_path_buf(),
        }
    );

    let payload = PayloadSource::new(request.source_root.clone());
    payload::verify_sources(&payload)?;

    check_tools(runner)?;

    let plan = ProvisionPlan {
        layout: MountLayout::new(request.mount_root.clone()),
        device,
        payload,
    };
    info!(
        "Target {} (EFI {}, system {}), mount root {}",
        plan.device,
        plan.device.efi_partition().display(),
        plan.device.system_partition().display(),
        plan.layout.root().display()
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::FakeRunner;
    use std::fs;
    use std::path::Path;

    fn request(device: &Path, source: &Path, privilege: Privilege) -> ProvisionRequest {
        ProvisionRequest {
            device: device.to_path_buf(),
            source_root: source.to_path_buf(),
            mount_root: "/mnt".into(),
            privilege,
            require_root: true,
        }
    }

    fn payload_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("images")).unwrap();
        fs::create_dir(dir.path().join("grub")).unwrap();
        dir
    }

    #[test]
    fn test_privilege_from_euid() {
        assert_eq!(Privilege::from_euid(0), Privilege::Root);
        assert_eq!(Privilege::from_euid(1000), Privilege::Unprivileged);
    }

    #[test]
    fn test_unprivileged_is_rejected_first() {
        let runner = FakeRunner::new();
        let req = request(
            Path::new("/dev/does-not-exist"),
            Path::new("/nope"),
            Privilege::Unprivileged,
        );
        let err = validate(&req, &runner).unwrap_err();
        assert!(matches!(err, UsbError::NotRoot));
        assert!(runner.history().is_empty());
    }

    #[test]
    fn test_unprivileged_allowed_when_not_required() {
        let device = tempfile::NamedTempFile::new().unwrap();
        let source = payload_tree();
        let mut req = request(device.path(), source.path(), Privilege::Unprivileged);
        req.require_root = false;

        let plan = validate(&req, &FakeRunner::new()).unwrap();
        assert_eq!(plan.device.path(), device.path());
    }

    #[test]
    fn test_missing_device() {
        let source = payload_tree();
        let req = request(Path::new("/dev/mbusb-missing-disk"), source.path(), Privilege::Root);
        let err = validate(&req, &FakeRunner::new()).unwrap_err();
        assert!(matches!(err, UsbError::DeviceNotFound { .. }));
    }

    #[test]
    fn test_missing_grub_source() {
        let device = tempfile::NamedTempFile::new().unwrap();
        let source = tempfile::tempdir().unwrap();
        fs::create_dir(source.path().join("images")).unwrap();

        let req = request(device.path(), source.path(), Privilege::Root);
        let err = validate(&req, &FakeRunner::new()).unwrap_err();
        match err {
            UsbError::SourceMissing { path } => assert!(path.ends_with("grub")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_tool() {
        let device = tempfile::NamedTempFile::new().unwrap();
        let source = payload_tree();
        let req = request(device.path(), source.path(), Privilege::Root);

        let runner = FakeRunner::new().with_missing_tool("grub-install");
        let err = validate(&req, &runner).unwrap_err();
        assert_eq!(err.to_string(), "required tool `grub-install` not found in PATH");
    }
}
