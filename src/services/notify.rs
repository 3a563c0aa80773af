//! Notification side-effect writers.
//!
//! Every lifecycle transition funnels through this service so the
//! notification rows (and the optional assignee email) are produced
//! consistently. Database failures propagate to the caller; mail failures are
//! logged inside the mailer and never surface.

use futures::future::try_join_all;

use crate::db::{
    CreateNotification, Feedback, NotificationKind, NotificationRepository, Role, User,
    UserRepository,
};
use crate::error::AppResult;
use crate::AppState;

pub struct NotificationService<'a> {
    state: &'a AppState,
}

impl<'a> NotificationService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        NotificationService { state }
    }

    /// Tell the submitter their feedback moved to a new status.
    pub async fn status_changed(&self, feedback: &Feedback) -> AppResult<()> {
        NotificationRepository::create(
            &self.state.db,
            CreateNotification::feedback(
                &feedback.submitted_by,
                NotificationKind::Feedback,
                "Feedback Status Updated",
                format!(
                    "Your feedback \"{}\" status changed to {}",
                    feedback.title,
                    feedback.status.as_str()
                ),
            )
            .entity_id(&feedback.id),
        )
        .await?;

        Ok(())
    }

    /// Tell an assignee they now own the item; also emails them when mail is
    /// configured.
    pub async fn assigned(&self, feedback: &Feedback, assignee: &User) -> AppResult<()> {
        NotificationRepository::create(
            &self.state.db,
            CreateNotification::feedback(
                &assignee.id,
                NotificationKind::Feedback,
                "Feedback Assigned",
                format!("Feedback \"{}\" assigned to you", feedback.title),
            )
            .entity_id(&feedback.id),
        )
        .await?;

        if let Some(mailer) = &self.state.mailer {
            mailer
                .send_feedback_assigned(&assignee.email, &assignee.full_name, &feedback.title)
                .await;
        }

        Ok(())
    }

    /// Fan out to all active superadmins after a vendor reply.
    pub async fn vendor_replied(&self, feedback: &Feedback) -> AppResult<()> {
        self.notify_superadmins(
            feedback,
            NotificationKind::VendorReply,
            "Vendor replied",
            format!("Vendor responded on feedback \"{}\"", feedback.title),
        )
        .await
    }

    /// Fan out to all active superadmins when HR requests a decision.
    pub async fn approval_requested(&self, feedback: &Feedback) -> AppResult<()> {
        self.notify_superadmins(
            feedback,
            NotificationKind::SuperadminReview,
            "Review vendor resolution",
            format!("Feedback \"{}\" requires superadmin approval", feedback.title),
        )
        .await
    }

    /// Sweep: the vendor blew the due date.
    pub async fn vendor_overdue(&self, feedback: &Feedback) -> AppResult<()> {
        self.notify_vendor_and_assignee(
            feedback,
            "Vendor task overdue",
            format!("Feedback \"{}\" vendor response is overdue.", feedback.title),
        )
        .await
    }

    /// Sweep: the due date is close and no vendor response has arrived.
    pub async fn vendor_response_pending(&self, feedback: &Feedback) -> AppResult<()> {
        self.notify_vendor_and_assignee(
            feedback,
            "Vendor response pending",
            format!("Feedback \"{}\" needs vendor response soon.", feedback.title),
        )
        .await
    }

    async fn notify_superadmins(
        &self,
        feedback: &Feedback,
        kind: NotificationKind,
        title: &str,
        message: String,
    ) -> AppResult<()> {
        let ids = UserRepository::active_ids_with_role(&self.state.db, Role::Superadmin).await?;

        try_join_all(ids.iter().map(|id| {
            NotificationRepository::create(
                &self.state.db,
                CreateNotification::feedback(id, kind, title, message.clone())
                    .entity_id(&feedback.id),
            )
        }))
        .await?;

        Ok(())
    }

    async fn notify_vendor_and_assignee(
        &self,
        feedback: &Feedback,
        title: &str,
        message: String,
    ) -> AppResult<()> {
        let recipients = [
            feedback.vendor_assigned_to.as_deref(),
            feedback.assigned_to.as_deref(),
        ];

        for user_id in recipients.into_iter().flatten() {
            NotificationRepository::create(
                &self.state.db,
                CreateNotification::feedback(
                    user_id,
                    NotificationKind::Feedback,
                    title,
                    message.clone(),
                )
                .entity_id(&feedback.id),
            )
            .await?;
        }

        Ok(())
    }
}
