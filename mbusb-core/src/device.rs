//! Target block device and its two child partitions

use crate::error::{InvalidDeviceSnafu, UsbError};
use snafu::ensure;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Partition number of the FAT32 EFI partition.
pub const EFI_PARTITION: u8 = 1;
/// Partition number of the ext4 system partition.
pub const SYSTEM_PARTITION: u8 = 2;

/// A raw block device such as `/dev/sdb` or `/dev/nvme0n1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDevice {
    disk: PathBuf,
}

impl TargetDevice {
    /// Validate a device path supplied by the operator.
    ///
    /// Arguments never pass through a shell, but paths with whitespace or
    /// control characters are still refused since no real device node uses them.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, UsbError> {
        let disk = path.into();
        let raw = disk.to_string_lossy().into_owned();

        ensure!(
            !raw.is_empty(),
            InvalidDeviceSnafu {
                device: disk.clone(),
                reason: "path is empty",
            }
        );
        ensure!(
            disk.is_absolute(),
            InvalidDeviceSnafu {
                device: disk.clone(),
                reason: "path must be absolute",
            }
        );
        ensure!(
            !raw.chars().any(|c| c.is_whitespace() || c.is_control()),
            InvalidDeviceSnafu {
                device: disk.clone(),
                reason: "path contains whitespace or control characters",
            }
        );
        ensure!(
            disk.file_name().is_some(),
            InvalidDeviceSnafu {
                device: disk.clone(),
                reason: "path does not name a device",
            }
        );

        Ok(Self { disk })
    }

    pub fn path(&self) -> &Path {
        &self.disk
    }

    /// Whether the kernel names partitions of this disk with a `p` separator
    /// (`nvme0n1p1`, `mmcblk0p1`) rather than a bare digit (`sdb1`).
    pub fn uses_p_separator(&self) -> bool {
        self.disk
            .file_name()
            .map(|name| {
                let name = name.to_string_lossy();
                name.contains("nvme") || name.contains("mmcblk")
            })
            .unwrap_or(false)
    }

    /// Device path of partition `number`.
    pub fn partition(&self, number: u8) -> PathBuf {
        let mut raw = OsString::from(self.disk.as_os_str());
        if self.uses_p_separator() {
            raw.push("p");
        }
        raw.push(number.to_string());
        PathBuf::from(raw)
    }

    pub fn efi_partition(&self) -> PathBuf {
        self.partition(EFI_PARTITION)
    }

    pub fn system_partition(&self) -> PathBuf {
        self.partition(SYSTEM_PARTITION)
    }
}

impl std::fmt::Display for TargetDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.disk.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nvme_partitions_use_p_separator() {
        let device = TargetDevice::new("/dev/nvme0n1").unwrap();
        assert_eq!(device.efi_partition(), PathBuf::from("/dev/nvme0n1p1"));
        assert_eq!(device.system_partition(), PathBuf::from("/dev/nvme0n1p2"));
    }

    #[test]
    fn test_sd_partitions_use_bare_digit() {
        let device = TargetDevice::new("/dev/sdb").unwrap();
        assert_eq!(device.efi_partition(), PathBuf::from("/dev/sdb1"));
        assert_eq!(device.system_partition(), PathBuf::from("/dev/sdb2"));
    }

    #[test]
    fn test_mmcblk_partitions_use_p_separator() {
        let device = TargetDevice::new("/dev/mmcblk0").unwrap();
        assert_eq!(device.efi_partition(), PathBuf::from("/dev/mmcblk0p1"));
    }

    #[test]
    fn test_rejects_relative_and_odd_paths() {
        for bad in ["", "sdb", "/dev/sd b", "/dev/sdb\n", "/"] {
            let err = TargetDevice::new(bad).unwrap_err();
            assert!(
                matches!(err, UsbError::InvalidDevice { .. }),
                "{bad:?} should be rejected, got {err}"
            );
        }
    }
}
