use crate::config::RunConfig;
use crate::pipeline::RunSummary;
use crate::publisher::PublishReport;
use crate::CrawlerError;
use std::process::ExitCode;

/// Exit code for a successful run
pub const EXIT_SUCCESS: u8 = 0;

/// Exit code for a run that failed before or while setting up publishing
pub const EXIT_FAILURE: u8 = 1;

/// Exit code for a run stopped by an interrupt
pub const EXIT_INTERRUPTED: u8 = 130;

/// How individual publish failures affect the run result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartialFailurePolicy {
    /// Failed targets are logged; the run still succeeds
    #[default]
    Tolerate,
    /// Any failed target fails the run
    Strict,
}

impl PartialFailurePolicy {
    pub fn from_config(config: &RunConfig) -> Self {
        if config.strict {
            PartialFailurePolicy::Strict
        } else {
            PartialFailurePolicy::Tolerate
        }
    }

    /// Decides whether a finished batch counts as a successful run
    pub fn evaluate(&self, report: &PublishReport) -> Result<(), CrawlerError> {
        match self {
            PartialFailurePolicy::Tolerate => Ok(()),
            PartialFailurePolicy::Strict if report.failed() == 0 => Ok(()),
            PartialFailurePolicy::Strict => Err(CrawlerError::PartialPublish {
                failed: report.failed(),
                attempted: report.attempted(),
            }),
        }
    }
}

/// Maps a run result to the numeric process exit status
pub fn exit_status(result: &Result<RunSummary, CrawlerError>) -> u8 {
    match result {
        Ok(summary) if summary.report.was_aborted() => EXIT_INTERRUPTED,
        Ok(_) => EXIT_SUCCESS,
        Err(_) => EXIT_FAILURE,
    }
}

/// Maps a run result to the process exit code
pub fn exit_code(result: &Result<RunSummary, CrawlerError>) -> ExitCode {
    ExitCode::from(exit_status(result))
}
