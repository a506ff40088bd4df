//! Resending optimistic writes that failed.

use serde::Serialize;
use tracing::{info, warn};

use crate::entities::NotificationType;
use crate::pending::PendingOp;
use crate::portal::Portal;
use crate::types::PortalResult;

/// Outcome of one `retry_pending` run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RetryReport {
    pub settled: usize,
    pub failed: usize,
}

impl Portal {
    /// Operations not yet confirmed by the store, oldest first.
    pub async fn pending_operations(&self) -> Vec<PendingOp> {
        self.state.read().await.pending.all().to_vec()
    }

    /// Send every failed operation again, in registration order.
    ///
    /// Inserts are retried as upserts on `id`, so an insert whose first
    /// attempt reached the store is not duplicated.
    pub async fn retry_pending(&self) -> PortalResult<RetryReport> {
        let result = self.try_retry_pending().await;
        self.report(result, None).await
    }

    async fn try_retry_pending(&self) -> PortalResult<RetryReport> {
        self.acting_user().await?;
        let ops = self.state.write().await.pending.begin_retry();
        let mut report = RetryReport::default();
        if ops.is_empty() {
            return Ok(report);
        }

        for op in ops {
            match self.send_change(op.table, &op.entity_id, &op.change, true).await {
                Ok(_) => {
                    self.state.write().await.pending.settle(&op.id);
                    report.settled += 1;
                }
                Err(err) => {
                    warn!(table = %op.table, entity = %op.entity_id, attempts = op.attempts, error = %err, "retry failed");
                    self.state
                        .write()
                        .await
                        .pending
                        .fail(&op.id, err.to_string());
                    report.failed += 1;
                }
            }
        }

        if report.settled > 0 {
            self.after_write().await;
        }
        info!(settled = report.settled, failed = report.failed, "pending operations retried");

        let (message, notification_type) = if report.failed == 0 {
            (
                format!("{} modification(s) synchronisée(s)", report.settled),
                NotificationType::Success,
            )
        } else {
            (
                format!(
                    "{} modification(s) synchronisée(s), {} en échec",
                    report.settled, report.failed
                ),
                NotificationType::Error,
            )
        };
        self.notify(message, notification_type, None).await;
        Ok(report)
    }
}
