//! Alert delivery over an SMTP relay (STARTTLS).

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use crate::domain::{Notifier, NotifyError};

/// Connection settings for the SMTP relay.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Sender mailbox, e.g. `Support Alerts <alerts@example.com>`.
    pub from: String,
}

pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    /// Build the transport. No connection is opened until the first alert.
    pub fn new(settings: SmtpSettings) -> Result<Self, NotifyError> {
        let from = parse_mailbox(&settings.from)?;
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            .map_err(|e| NotifyError::Build(e.to_string()))?
            .port(settings.port);
        if let (Some(username), Some(password)) = (settings.username, settings.password) {
            builder = builder.credentials(Credentials::new(username, password));
        }
        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address
        .parse::<Mailbox>()
        .map_err(|e| NotifyError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_alert(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), NotifyError> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(parse_mailbox(recipient)?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| NotifyError::Build(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;
        tracing::debug!(recipient, subject, "alert sent over SMTP");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(from: &str) -> SmtpSettings {
        SmtpSettings {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: Some("alerts".to_string()),
            password: Some("secret".to_string()),
            from: from.to_string(),
        }
    }

    #[test]
    fn test_smtp_notifier_builds_with_valid_sender() {
        // テスト項目: 正しい送信元アドレスならトランスポートを構築できる
        // when (操作):
        let result = SmtpNotifier::new(settings("Support Alerts <alerts@example.com>"));

        // then (期待する結果):
        assert!(result.is_ok());
    }

    #[test]
    fn test_smtp_notifier_rejects_invalid_sender() {
        // テスト項目: 不正な送信元アドレスは構築時にエラーになる
        // when (操作):
        let result = SmtpNotifier::new(settings("not an address"));

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(NotifyError::InvalidAddress { .. })
        ));
    }

    #[tokio::test]
    async fn test_send_alert_rejects_invalid_recipient() {
        // テスト項目: 不正な宛先は接続前にエラーになる
        // given (前提条件):
        let notifier = SmtpNotifier::new(settings("alerts@example.com")).unwrap();

        // when (操作):
        let result = notifier.send_alert("nobody", "subject", "body").await;

        // then (期待する結果):
        assert!(matches!(result, Err(NotifyError::InvalidAddress { .. })));
    }
}
