//! TOML run report
//!
//! Written after every run (successful or not) when `--report` is given, so
//! an operator can see how far a failed run got before cleaning up by hand.

use crate::cli::expand_path;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use mbusb_core::{Journal, ProvisionRequest, Stage, TargetDevice};
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub meta: ReportMeta,
    pub target: TargetSection,
    pub run: RunSection,
}

#[derive(Debug, Serialize)]
pub struct ReportMeta {
    pub tool: String,
    pub version: String,
    pub format: String,
}

#[derive(Debug, Serialize)]
pub struct TargetSection {
    pub device: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub efi_partition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_partition: Option<String>,
    pub mount_root: String,
    pub source_dir: String,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Aborted,
}

#[derive(Debug, Serialize)]
pub struct RunSection {
    pub started: String,
    pub finished: String,
    pub outcome: Outcome,
    pub final_stage: Stage,
    pub stages: Vec<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_during: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunReport {
    pub fn new(
        request: &ProvisionRequest,
        dry_run: bool,
        started: DateTime<Utc>,
        finished: DateTime<Utc>,
        journal: &Journal,
    ) -> Self {
        // an invalid device path still gets reported, just without partitions
        let device = TargetDevice::new(request.device.clone()).ok();
        let failure = journal.failure();

        Self {
            meta: ReportMeta {
                tool: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                format: "toml".to_string(),
            },
            target: TargetSection {
                device: request.device.display().to_string(),
                efi_partition: device
                    .as_ref()
                    .map(|d| d.efi_partition().display().to_string()),
                system_partition: device
                    .as_ref()
                    .map(|d| d.system_partition().display().to_string()),
                mount_root: request.mount_root.display().to_string(),
                source_dir: request.source_root.display().to_string(),
                dry_run,
            },
            run: RunSection {
                started: started.to_rfc3339(),
                finished: finished.to_rfc3339(),
                outcome: if journal.is_complete() {
                    Outcome::Success
                } else {
                    Outcome::Aborted
                },
                final_stage: journal.current(),
                stages: journal.reached().to_vec(),
                failed_during: failure.map(|f| f.during),
                error: failure.map(|f| f.message.clone()),
            },
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize run report")
    }
}

/// Write the report, creating parent directories as needed.
pub fn write_report(report: &RunReport, output_path: &Path) -> Result<()> {
    let content = report.to_toml()?;
    let final_path = expand_path(&output_path.to_string_lossy());

    if let Some(parent) = final_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create parent directory: {}", parent.display()))?;
    }

    fs::write(&final_path, content)
        .with_context(|| format!("Failed to write run report to {}", final_path.display()))?;

    Ok(())
}
