use clap::Parser;
use mbusb_core::layout::DEFAULT_MOUNT_ROOT;
use std::path::PathBuf;

/// Payload source tree used when neither flag nor environment names one.
pub const DEFAULT_SOURCE_DIR: &str = "~/src/uGRUB";

/// Partition, format and populate a multiboot USB drive (BIOS + UEFI GRUB).
///
/// Must run as root. ALL DATA ON THE TARGET DEVICE WILL BE LOST.
#[derive(Debug, Parser, Clone)]
#[command(name = "mbusb", version, about)]
pub struct Cli {
    /// Target block device, e.g. /dev/sdb or /dev/nvme0n1
    pub device: PathBuf,

    /// Payload source tree containing `images/` and `grub/`
    #[arg(long, env = "MBUSB_SOURCE_DIR", default_value = DEFAULT_SOURCE_DIR)]
    pub source_dir: String,

    /// Working mount root for the system partition
    #[arg(long, env = "MBUSB_MOUNT_ROOT", default_value = DEFAULT_MOUNT_ROOT)]
    pub mount_root: PathBuf,

    /// Answer "yes" to the destructive-action prompt
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Log the commands that would run without running them
    #[arg(long)]
    pub dry_run: bool,

    /// Write a TOML run report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Source directory with `~` expanded.
    pub fn source_root(&self) -> PathBuf {
        expand_path(&self.source_dir)
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["mbusb", "/dev/sdb"]).unwrap();
        assert_eq!(cli.device, PathBuf::from("/dev/sdb"));
        assert_eq!(cli.mount_root, PathBuf::from("/mnt"));
        assert!(!cli.yes && !cli.dry_run && !cli.verbose);
        assert!(cli.report.is_none());
        assert!(cli.source_root().ends_with("src/uGRUB"));
    }

    #[test]
    fn test_exactly_one_device_required() {
        assert!(Cli::try_parse_from(["mbusb"]).is_err());
        assert!(Cli::try_parse_from(["mbusb", "/dev/sdb", "/dev/sdc"]).is_err());
    }

    #[test]
    fn test_expand_path() {
        let path = expand_path("~/src/uGRUB");
        assert!(!path.to_string_lossy().starts_with('~'));
        assert_eq!(expand_path("/srv/payload"), PathBuf::from("/srv/payload"));
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "mbusb",
            "-y",
            "--dry-run",
            "--mount-root",
            "/media/usb",
            "--source-dir",
            "/srv/payload",
            "--report",
            "/tmp/run.toml",
            "/dev/nvme0n1",
        ])
        .unwrap();
        assert!(cli.yes && cli.dry_run);
        assert_eq!(cli.mount_root, PathBuf::from("/media/usb"));
        assert_eq!(cli.source_root(), PathBuf::from("/srv/payload"));
        assert_eq!(cli.report, Some(PathBuf::from("/tmp/run.toml")));
    }
}
