//! Core library for turning a block device into a multiboot USB drive.
//!
//! The drive gets a DOS partition table with a FAT32 EFI partition and an
//! ext4 system partition, GRUB for both legacy BIOS and UEFI, and a prebuilt
//! payload of boot images plus GRUB configuration.
//!
//! - [`preflight`]: privilege, device, payload and tool checks
//! - [`partition`], [`format`], [`mount`], [`grub`], [`payload`]: one module per step
//! - [`workflow`]: the linear sequence and its [`workflow::Journal`]
//! - [`runner`]: the seam to external commands (real, dry-run, fake)
//! - [`confirm`]: the seam to the operator's yes/no answer
//!
//! ```rust,no_run
//! use mbusb_core::{ConsoleConfirm, DuctRunner, Journal, Privilege, ProvisionRequest, provision};
//!
//! let request = ProvisionRequest {
//!     device: "/dev/sdb".into(),
//!     source_root: "/home/op/src/uGRUB".into(),
//!     mount_root: "/mnt".into(),
//!     privilege: Privilege::current(),
//!     require_root: true,
//! };
//! let mut journal = Journal::new();
//! provision(&request, &DuctRunner::new(), &ConsoleConfirm, &mut journal)?;
//! # Ok::<(), mbusb_core::UsbError>(())
//! ```

pub mod confirm;
pub mod device;
pub mod error;
pub mod format;
pub mod grub;
pub mod layout;
pub mod mount;
pub mod partition;
pub mod payload;
pub mod preflight;
pub mod runner;
pub mod workflow;

pub use confirm::{AssumeYes, Confirm, ConsoleConfirm};
pub use device::TargetDevice;
pub use error::UsbError;
pub use layout::{MountLayout, PayloadSource, ProvisionPlan, ProvisionRequest};
pub use preflight::Privilege;
pub use runner::{CommandRunner, DryRunRunner, DuctRunner, FakeRunner, Invocation, Operation};
pub use workflow::{Failure, Journal, Stage, provision};
