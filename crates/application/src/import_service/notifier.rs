use std::sync::Arc;

use tracing::{debug, warn};

use crate::EmailService;

use super::report::{AccountOrigin, ProvisionedIdentity};

const WELCOME_SUBJECT: &str = "Your Planivo account is ready";

/// Result of a welcome notification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum NotificationStatus {
    Sent,
    Failed,
    Skipped,
}

/// Best-effort sender of welcome emails carrying the initial credential.
#[derive(Clone, Default)]
pub struct WelcomeNotifier {
    email_service: Option<Arc<dyn EmailService>>,
    login_url: Option<String>,
}

impl WelcomeNotifier {
    /// Creates a notifier delivering through the given mail transport.
    #[must_use]
    pub fn new(email_service: Arc<dyn EmailService>, login_url: Option<String>) -> Self {
        Self {
            email_service: Some(email_service),
            login_url,
        }
    }

    /// Creates a notifier that never sends anything.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Sends the welcome email for a newly created account.
    ///
    /// Reused identities have no new credential and are skipped. Delivery
    /// failures are logged and never surface to the caller.
    pub(super) async fn notify(&self, identity: &ProvisionedIdentity) -> NotificationStatus {
        let AccountOrigin::Created(password) = &identity.account else {
            return NotificationStatus::Skipped;
        };
        let Some(email_service) = &self.email_service else {
            return NotificationStatus::Skipped;
        };

        let login_line = self
            .login_url
            .as_deref()
            .map(|url| format!("Sign in at {url}\n\n"))
            .unwrap_or_default();
        let text_body = format!(
            "Hello {},\n\nAn administrator created a Planivo account for you.\n\n\
             Email: {}\nTemporary password: {}\n\n{login_line}\
             Please change your password after your first sign-in.\n",
            identity.full_name,
            identity.email,
            password.expose(),
        );

        match email_service
            .send_email(&identity.email, WELCOME_SUBJECT, &text_body, None)
            .await
        {
            Ok(()) => {
                debug!(user_id = %identity.user_id, "welcome email sent");
                NotificationStatus::Sent
            }
            Err(error) => {
                warn!(user_id = %identity.user_id, error = %error, "welcome email delivery failed");
                NotificationStatus::Failed
            }
        }
    }
}
