//! SMTP notification gateway.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use sweater_common::{AppError, AppResult, config::MailConfig};

use super::notification::NotificationGateway;

/// Delivers notifications through an SMTP relay.
#[derive(Clone)]
pub struct SmtpNotificationGateway {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotificationGateway {
    /// Build a gateway from mail configuration.
    pub fn new(config: &MailConfig) -> AppResult<Self> {
        let builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        }
        .map_err(|e| AppError::Config(format!("SMTP setup failed: {e}")))?
        .port(config.port);

        let builder = match (&config.username, &config.password) {
            (Some(username), Some(password)) => {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            }
            _ => builder,
        };

        let from = format!("{} <{}>", config.from_name, config.from_address)
            .parse::<Mailbox>()
            .map_err(|e| AppError::Config(format!("Invalid from address: {e}")))?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl NotificationGateway for SmtpNotificationGateway {
    async fn send(&self, address: &str, subject: &str, body: &str) -> AppResult<()> {
        let to = address
            .parse::<Mailbox>()
            .map_err(|e| AppError::Notification(format!("Invalid recipient address: {e}")))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| AppError::Notification(format!("Failed to build email: {e}")))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| AppError::Notification(format!("Failed to send email: {e}")))?;

        tracing::info!(to = %address, subject = %subject, "Sent email");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mail_config(from_address: &str) -> MailConfig {
        MailConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: Some("mailer".to_string()),
            password: Some("secret".to_string()),
            from_address: from_address.to_string(),
            from_name: "Sweater".to_string(),
            starttls: true,
        }
    }

    #[tokio::test]
    async fn test_new_accepts_valid_config() {
        assert!(SmtpNotificationGateway::new(&mail_config("noreply@sweater.example")).is_ok());
    }

    #[tokio::test]
    async fn test_new_rejects_invalid_from_address() {
        match SmtpNotificationGateway::new(&mail_config("not an address")) {
            Err(AppError::Config(msg)) => assert!(msg.contains("from address")),
            _ => panic!("Expected Config error"),
        }
    }

    #[tokio::test]
    async fn test_send_rejects_invalid_recipient() {
        let gateway = SmtpNotificationGateway::new(&mail_config("noreply@sweater.example"))
            .unwrap_or_else(|e| panic!("{e}"));

        match gateway.send("nobody", "Subject", "Body").await {
            Err(AppError::Notification(msg)) => assert!(msg.contains("recipient")),
            _ => panic!("Expected Notification error"),
        }
    }
}
