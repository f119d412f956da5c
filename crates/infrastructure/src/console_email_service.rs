//! Console email service for development. Writes emails to tracing output.

use async_trait::async_trait;
use planivo_application::EmailService;
use planivo_core::AppResult;
use tracing::{debug, info};

/// Development email service that logs instead of delivering.
///
/// Bodies carry initial credentials, so they are only emitted at debug level.
#[derive(Clone, Default)]
pub struct ConsoleEmailService;

impl ConsoleEmailService {
    /// Creates a new console email service.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmailService for ConsoleEmailService {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: Option<&str>,
    ) -> AppResult<()> {
        info!(to = to, subject = subject, has_html = html_body.is_some(), "email (console)");
        debug!("--- EMAIL (console) ---\nTo: {to}\nSubject: {subject}\n\n{text_body}\n--- END EMAIL ---");

        Ok(())
    }
}
