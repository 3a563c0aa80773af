//! Vendor SLA sweep.
//!
//! Scans every feedback item currently handed to a vendor, flips overdue
//! items to PAST_DUE and emits warning/overdue notifications. The sweep never
//! propagates errors: any failure is downgraded to a logged warning and a
//! zero-result outcome so it can never break the main request path.

use chrono::Utc;
use serde::Serialize;

use crate::db::{FeedbackRepository, VendorStatus};
use crate::error::AppResult;
use crate::services::notify::NotificationService;
use crate::services::sla::{self, SlaState};
use crate::AppState;

#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct SweepOutcome {
    pub warnings: u64,
    pub overdue: u64,
}

/// Run one sweep pass. Soft-failure wrapper around [`sweep`].
pub async fn run_vendor_sla_sweep(state: &AppState) -> SweepOutcome {
    match sweep(state).await {
        Ok(outcome) => {
            tracing::info!(
                warnings = outcome.warnings,
                overdue = outcome.overdue,
                "Vendor SLA sweep completed"
            );
            outcome
        }
        Err(e) => {
            tracing::warn!("Vendor SLA sweep failed (soft): {:?}", e);
            SweepOutcome::default()
        }
    }
}

async fn sweep(state: &AppState) -> AppResult<SweepOutcome> {
    let now = Utc::now().naive_utc();
    let items = FeedbackRepository::list_vendor_tracked(&state.db).await?;
    let notifier = NotificationService::new(state);

    let mut outcome = SweepOutcome::default();

    for item in items {
        match sla::vendor_sla(&item, now, &state.config.sla) {
            SlaState::Breached => {
                // Items already flagged on an earlier pass are skipped so a
                // breach notifies exactly once.
                if item.vendor_status == VendorStatus::PastDue {
                    continue;
                }

                match FeedbackRepository::mark_past_due(&state.db, &item.id).await {
                    Ok(true) => {
                        outcome.overdue += 1;
                        notifier.vendor_overdue(&item).await?;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        tracing::warn!("Vendor SLA update failed for {}: {:?}", item.id, e);
                    }
                }
            }
            SlaState::WarningWindow => {
                outcome.warnings += 1;
                notifier.vendor_response_pending(&item).await?;
            }
            SlaState::Normal => {}
        }
    }

    Ok(outcome)
}
