//! Alert delivery into the process log.

use async_trait::async_trait;

use crate::domain::{Notifier, NotifyError};

/// Records alerts as structured log events instead of sending them.
///
/// Used when no SMTP relay is configured. Always reports success.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_alert(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), NotifyError> {
        tracing::info!(recipient, subject, body, "alert (log only)");
        Ok(())
    }
}
