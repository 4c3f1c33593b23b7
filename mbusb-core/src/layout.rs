//! Run configuration: where things are mounted and where the payload lives
//!
//! A `ProvisionRequest` is assembled once from the command line, validated
//! by [`crate::preflight`] into a `ProvisionPlan`, and then passed by
//! reference into every step.

use crate::device::TargetDevice;
use crate::preflight::Privilege;
use std::path::{Path, PathBuf};

/// Size of the EFI partition in fdisk notation.
pub const EFI_SIZE: &str = "+300M";
/// FAT32 volume label of the EFI partition.
pub const EFI_LABEL: &str = "EFI";
/// ext4 volume label of the system partition.
pub const SYSTEM_LABEL: &str = "MULTIBOOT";
/// Working mount root used when none is configured.
pub const DEFAULT_MOUNT_ROOT: &str = "/mnt";

/// Mount points under the working mount root.
///
/// The EFI mount point is always nested inside the system mount point so that
/// GRUB's boot directory and EFI directory live under one root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountLayout {
    root: PathBuf,
}

impl MountLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Mount point of the system partition.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// GRUB `--boot-directory`.
    pub fn boot_dir(&self) -> PathBuf {
        self.root.join("boot")
    }

    /// Mount point of the EFI partition and GRUB `--efi-directory`.
    pub fn efi_dir(&self) -> PathBuf {
        self.boot_dir().join("efi")
    }

    /// Destination of the bootloader configuration files.
    pub fn grub_dir(&self) -> PathBuf {
        self.boot_dir().join("grub")
    }
}

impl Default for MountLayout {
    fn default() -> Self {
        Self::new(DEFAULT_MOUNT_ROOT)
    }
}

/// Source tree holding the prebuilt payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadSource {
    root: PathBuf,
}

impl PayloadSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Bootable OS images, copied to the root of the system partition.
    pub fn images(&self) -> PathBuf {
        self.root.join("images")
    }

    /// Bootloader configuration, copied into `boot/grub`.
    pub fn grub(&self) -> PathBuf {
        self.root.join("grub")
    }
}

/// Unvalidated inputs for one run.
#[derive(Debug, Clone)]
pub struct ProvisionRequest {
    pub device: PathBuf,
    pub source_root: PathBuf,
    pub mount_root: PathBuf,
    /// Privilege of the current process.
    pub privilege: Privilege,
    /// Refuse to run without root. Disabled for dry runs.
    pub require_root: bool,
}

/// Validated configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionPlan {
    pub device: TargetDevice,
    pub layout: MountLayout,
    pub payload: PayloadSource,
}
