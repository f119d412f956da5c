use std::sync::Arc;

use planivo_application::{EmailService, WelcomeNotifier};
use planivo_core::AppError;
use planivo_infrastructure::{ConsoleEmailService, SmtpEmailConfig, SmtpEmailService};
use tracing::info;

use crate::api_config::{ApiConfig, EmailProviderConfig};

pub(super) fn build_welcome_notifier(config: &ApiConfig) -> Result<WelcomeNotifier, AppError> {
    let service: Arc<dyn EmailService> = match &config.email_provider {
        EmailProviderConfig::Disabled => {
            info!("welcome emails disabled");
            return Ok(WelcomeNotifier::disabled());
        }
        EmailProviderConfig::Console => Arc::new(ConsoleEmailService::new()),
        EmailProviderConfig::Smtp(smtp) => {
            let smtp_config = SmtpEmailConfig {
                host: smtp.host.clone(),
                port: smtp.port,
                username: smtp.username.clone(),
                password: smtp.password.clone(),
                from_address: smtp.from_address.clone(),
            };
            Arc::new(SmtpEmailService::new(smtp_config)?)
        }
    };

    Ok(WelcomeNotifier::new(service, config.app_login_url.clone()))
}
