//! Completion polling for submitted statements.
//!
//! [`poll_until_terminal`] describes a statement at a fixed interval until it
//! reaches FINISHED, FAILED or ABORTED, the deadline passes, or the
//! cancellation token fires. Statement outcomes come back as [`PollOutcome`]
//! values; only provider failures of the describe call itself are errors.

use std::time::{Duration, Instant};

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use redshift_data_core::error::Result;
use redshift_data_core::{
    PollConfig, RedshiftDataError, StatementDescription, StatementHandle, StatementStatus,
};

use crate::api::DataApi;

/// How a polling run ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PollOutcome {
    /// FINISHED; carries the full status payload.
    Finished(StatementDescription),
    /// FAILED, with the provider's error message.
    Failed {
        statement_id: StatementHandle,
        reason: Option<String>,
    },
    /// ABORTED.
    Aborted { statement_id: StatementHandle },
    /// Deadline passed without a terminal state.
    TimedOut {
        statement_id: StatementHandle,
        elapsed: Duration,
        last_status: Option<StatementStatus>,
    },
    /// The cancellation token fired.
    Cancelled { statement_id: StatementHandle },
}

impl PollOutcome {
    pub fn is_finished(&self) -> bool {
        matches!(self, PollOutcome::Finished(_))
    }

    /// Map onto the crate's error kinds.
    pub fn into_result(self) -> Result<StatementDescription> {
        match self {
            PollOutcome::Finished(description) => Ok(description),
            PollOutcome::Failed {
                statement_id,
                reason,
            } => Err(RedshiftDataError::StatementFailed {
                statement_id: statement_id.to_string(),
                reason: reason.unwrap_or_else(|| "unknown".to_string()),
            }),
            PollOutcome::Aborted { statement_id } => Err(RedshiftDataError::Aborted {
                statement_id: statement_id.to_string(),
            }),
            PollOutcome::TimedOut {
                statement_id,
                elapsed,
                ..
            } => Err(RedshiftDataError::Timeout {
                statement_id: statement_id.to_string(),
                elapsed_ms: elapsed.as_millis() as u64,
            }),
            PollOutcome::Cancelled { statement_id } => Err(RedshiftDataError::Cancelled(
                format!("polling of statement {statement_id} was interrupted"),
            )),
        }
    }
}

/// Describe `statement_id` every `config.interval` until a terminal state,
/// `config.timeout`, or cancellation.
pub async fn poll_until_terminal(
    api: &dyn DataApi,
    statement_id: &StatementHandle,
    config: &PollConfig,
    cancel: &CancellationToken,
) -> Result<PollOutcome> {
    let start = Instant::now();
    let mut polls: u32 = 0;
    let mut last_status = None;

    while start.elapsed() < config.timeout {
        let description = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(cancelled(statement_id, polls)),
            description = api.describe_statement(statement_id) => description?,
        };
        polls += 1;

        debug!(
            statement_id = %statement_id,
            status = %description.status,
            poll = polls,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Polling statement status"
        );

        match description.status {
            StatementStatus::Finished => {
                info!(statement_id = %statement_id, polls, "Statement finished");
                return Ok(PollOutcome::Finished(description));
            }
            StatementStatus::Failed => {
                error!(
                    statement_id = %statement_id,
                    reason = description.error.as_deref().unwrap_or("unknown"),
                    "Statement failed"
                );
                return Ok(PollOutcome::Failed {
                    statement_id: statement_id.clone(),
                    reason: description.error,
                });
            }
            StatementStatus::Aborted => {
                warn!(statement_id = %statement_id, "Statement was aborted");
                return Ok(PollOutcome::Aborted {
                    statement_id: statement_id.clone(),
                });
            }
            // Submitted | Picked | Started
            status => last_status = Some(status),
        }

        // Never sleep past the deadline.
        let remaining = config.timeout.saturating_sub(start.elapsed());
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(cancelled(statement_id, polls)),
            _ = tokio::time::sleep(config.interval.min(remaining)) => {}
        }
    }

    let elapsed = start.elapsed();
    warn!(
        statement_id = %statement_id,
        timeout_ms = config.timeout.as_millis() as u64,
        polls,
        "Statement did not reach a terminal state in time"
    );

    if config.cancel_on_timeout {
        // Best-effort: the timeout is reported whatever the cancel returns.
        if let Err(e) = api.cancel_statement(statement_id).await {
            debug!(statement_id = %statement_id, error = %e, "Cancel after timeout failed");
        }
    }

    Ok(PollOutcome::TimedOut {
        statement_id: statement_id.clone(),
        elapsed,
        last_status,
    })
}

fn cancelled(statement_id: &StatementHandle, polls: u32) -> PollOutcome {
    info!(statement_id = %statement_id, polls, "Polling interrupted");
    PollOutcome::Cancelled {
        statement_id: statement_id.clone(),
    }
}
