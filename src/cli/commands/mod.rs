pub mod extract;
pub mod helper;
pub mod init;
pub mod reshape;

use std::path::PathBuf;

use super::exit_status::ExitStatus;
use crate::core::locale::{LocaleFileStats, Shape};
use crate::core::transform::TransformSummary;

#[derive(Debug)]
pub struct ExtractSummary {
    pub root: PathBuf,
    pub summary: TransformSummary,
}

#[derive(Debug)]
pub struct ReshapeSummary {
    pub shape: Shape,
    pub locale_count: usize,
    /// Locale files whose content changed.
    pub stats: Vec<LocaleFileStats>,
}

#[derive(Debug)]
pub struct InitSummary {
    /// False when a config file already existed.
    pub created: bool,
}

#[derive(Debug)]
pub enum CommandSummary {
    Extract(Box<ExtractSummary>),
    Reshape(ReshapeSummary),
    Init(InitSummary),
}

/// Result of running keysmith commands
#[derive(Debug)]
pub struct CommandResult {
    pub summary: CommandSummary,
    /// Print machine-readable JSON instead of the report.
    pub json: bool,
}

impl CommandResult {
    /// Skipped files fail the command, and so do pending changes of a dry run.
    pub fn exit_status(&self) -> ExitStatus {
        match &self.summary {
            CommandSummary::Extract(extract) => {
                let summary = &extract.summary;
                if !summary.skipped_files.is_empty() || summary.has_pending_work() {
                    ExitStatus::Failure
                } else {
                    ExitStatus::Success
                }
            }
            CommandSummary::Reshape(_) => ExitStatus::Success,
            CommandSummary::Init(init) if init.created => ExitStatus::Success,
            CommandSummary::Init(_) => ExitStatus::Failure,
        }
    }
}
