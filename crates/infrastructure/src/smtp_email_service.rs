//! SMTP email service using the `lettre` crate.

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use planivo_application::EmailService;
use planivo_core::{AppError, AppResult};

/// SMTP email service configuration.
#[derive(Clone)]
pub struct SmtpEmailConfig {
    /// SMTP server hostname.
    pub host: String,
    /// SMTP server port.
    pub port: u16,
    /// SMTP username. Anonymous relay when absent.
    pub username: Option<String>,
    /// SMTP password.
    pub password: Option<String>,
    /// Sender mailbox, e.g. `Planivo <no-reply@planivo.app>`.
    pub from_address: String,
}

impl std::fmt::Debug for SmtpEmailConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SmtpEmailConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("from_address", &self.from_address)
            .finish()
    }
}

/// Production email service using SMTP.
#[derive(Clone)]
pub struct SmtpEmailService {
    from: Mailbox,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpEmailService {
    /// Creates a new SMTP email service, validating the sender and relay.
    pub fn new(config: SmtpEmailConfig) -> AppResult<Self> {
        let from = config
            .from_address
            .parse::<Mailbox>()
            .map_err(|error| AppError::Validation(format!("invalid from address: {error}")))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|error| {
                AppError::Internal(format!("failed to create SMTP transport: {error}"))
            })?
            .port(config.port);

        if let (Some(username), Some(password)) = (config.username, config.password) {
            builder = builder.credentials(Credentials::new(username, password));
        }

        Ok(Self {
            from,
            mailer: builder.build(),
        })
    }
}

fn build_message(
    from: Mailbox,
    to: &str,
    subject: &str,
    text_body: &str,
    html_body: Option<&str>,
) -> AppResult<Message> {
    let to_mailbox = to
        .parse::<Mailbox>()
        .map_err(|error| AppError::Validation(format!("invalid recipient address: {error}")))?;

    let builder = Message::builder().from(from).to(to_mailbox).subject(subject);
    let message = match html_body {
        Some(html_body) => builder.multipart(MultiPart::alternative_plain_html(
            text_body.to_owned(),
            html_body.to_owned(),
        )),
        None => builder.body(text_body.to_owned()),
    };

    message.map_err(|error| AppError::Internal(format!("failed to build email: {error}")))
}

#[async_trait]
impl EmailService for SmtpEmailService {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: Option<&str>,
    ) -> AppResult<()> {
        let message = build_message(self.from.clone(), to, subject, text_body, html_body)?;

        self.mailer
            .send(message)
            .await
            .map_err(|error| AppError::Internal(format!("failed to send email: {error}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use lettre::message::Mailbox;
    use planivo_core::AppError;

    use super::{SmtpEmailConfig, build_message};

    fn sender() -> Mailbox {
        "Planivo <no-reply@planivo.test>"
            .parse()
            .unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn invalid_recipient_is_a_validation_error() {
        let message = build_message(sender(), "not an address", "Welcome", "body", None);
        assert!(matches!(message, Err(AppError::Validation(_))));
    }

    #[test]
    fn html_body_becomes_an_alternative_part() {
        let message = build_message(
            sender(),
            "a@x.com",
            "Welcome",
            "plain",
            Some("<p>html</p>"),
        );
        assert!(message.is_ok());
        let formatted =
            String::from_utf8(message.unwrap_or_else(|_| unreachable!()).formatted())
                .unwrap_or_default();
        assert!(formatted.contains("multipart/alternative"));
    }

    #[test]
    fn config_debug_hides_password() {
        let config = SmtpEmailConfig {
            host: "smtp.planivo.test".to_owned(),
            port: 587,
            username: Some("mailer".to_owned()),
            password: Some("hunter2".to_owned()),
            from_address: "no-reply@planivo.test".to_owned(),
        };
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
