//! Copying boot images and GRUB configuration onto the system partition
//!
//! Each source tree is streamed `tar | pv | tar` so permissions and layout are
//! kept and the operator sees a progress bar sized to the tree.

use crate::error::{SourceMissingSnafu, UsbError, WalkSnafu};
use crate::layout::{PayloadSource, ProvisionPlan};
use crate::runner::{CommandRunner, Invocation};
use snafu::{ResultExt, ensure};
use std::path::Path;
use tracing::info;
use walkdir::WalkDir;

const MIB: u64 = 1024 * 1024;

/// Both payload directories must exist.
pub fn verify_sources(payload: &PayloadSource) -> Result<(), UsbError> {
    for dir in [payload.images(), payload.grub()] {
        ensure!(dir.is_dir(), SourceMissingSnafu { path: dir });
    }
    Ok(())
}

/// Total bytes of regular files under `root`. Symlinks are not followed.
pub fn tree_size(root: &Path) -> Result<u64, UsbError> {
    let mut total = 0;
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.context(WalkSnafu { path: root })?;
        if entry.file_type().is_file() {
            total += entry.metadata().context(WalkSnafu { path: entry.path() })?.len();
        }
    }
    Ok(total)
}

/// The three stages that copy `src` into `dest`.
pub fn copy_pipeline(src: &Path, dest: &Path, size_bytes: u64) -> [Invocation; 3] {
    [
        Invocation::new("tar").arg("-cf").arg("-").arg("-C").arg(src).arg("."),
        Invocation::new("pv").arg("-s").arg(size_bytes.to_string()),
        Invocation::new("tar").arg("-xf").arg("-").arg("-C").arg(dest),
    ]
}

/// Copy the contents of `src` into `dest` with progress reporting.
pub fn copy_tree(src: &Path, dest: &Path, runner: &dyn CommandRunner) -> Result<(), UsbError> {
    let size_bytes = tree_size(src)?;
    info!(
        "Copying {} → {} ({} MB)",
        src.display(),
        dest.display(),
        size_bytes / MIB
    );
    runner.pipeline(&copy_pipeline(src, dest, size_bytes))
}

/// Images go to the root of the system partition, GRUB files to `boot/grub`.
pub fn copy_payload(plan: &ProvisionPlan, runner: &dyn CommandRunner) -> Result<(), UsbError> {
    info!("Copying payload files");
    verify_sources(&plan.payload)?;

    copy_tree(&plan.payload.images(), plan.layout.root(), runner)?;

    let grub_dest = plan.layout.grub_dir();
    runner.run(&Invocation::new("mkdir").arg("-p").arg(&grub_dest))?;
    copy_tree(&plan.payload.grub(), &grub_dest, runner)
}
