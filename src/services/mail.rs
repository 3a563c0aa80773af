//! Transactional mail client.
//!
//! Delivery goes through an HTTP mail API configured via `MAIL_API_URL`; when
//! unset the service is not constructed and callers skip sending. Mail is
//! advisory: failures are logged and never propagated into request handling.

use crate::config::MailConfig;

#[derive(Clone)]
pub struct MailService {
    client: reqwest::Client,
    config: MailConfig,
}

impl MailService {
    pub fn new(config: MailConfig) -> Self {
        MailService {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Email an assignee about a feedback item newly assigned to them.
    pub async fn send_feedback_assigned(&self, to: &str, to_name: &str, feedback_title: &str) {
        let payload = serde_json::json!({
            "from": self.config.from_address,
            "to": to,
            "subject": format!("Feedback assigned: {}", feedback_title),
            "text": format!(
                "Hi {},\n\nThe feedback item \"{}\" has been assigned to you. \
                 Please review it in the dashboard.",
                to_name, feedback_title
            ),
        });

        let mut request = self.client.post(&self.config.api_url).json(&payload);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        match request.send().await {
            Ok(response) if !response.status().is_success() => {
                tracing::warn!(
                    "Mail API returned {} for assignment email to {}",
                    response.status(),
                    to
                );
            }
            Err(e) => {
                tracing::warn!("Failed to send assignment email to {}: {:?}", to, e);
            }
            _ => {}
        }
    }
}
