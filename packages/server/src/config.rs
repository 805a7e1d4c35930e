//! Command-line and environment configuration.

use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use thiserror::Error;

use crate::{
    domain::{Notifier, NotifyError, SensitiveCategory, SensitivityClassifier},
    infrastructure::{
        EchoResponder, InMemoryChatStore, InMemoryRoomRepository, LogNotifier, SmtpNotifier,
        SmtpSettings,
    },
    usecase::{Collaborators, Router, RouterSettings},
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read categories file {path}: {source}")]
    ReadCategories {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid categories file {path}: {source}")]
    ParseCategories {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("--smtp-from is required when --smtp-host is set")]
    MissingSmtpFrom,

    #[error("failed to set up alert delivery: {0}")]
    Notifier(#[from] NotifyError),
}

/// Handoff support chat router
#[derive(Parser, Debug, Clone)]
#[command(name = "handoff-server", version, about = "Support chat router with human escalation")]
pub struct Config {
    /// Bind address
    #[arg(long, env = "HANDOFF_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "HANDOFF_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Delay before an automated reply is delivered, in milliseconds
    #[arg(long, env = "HANDOFF_REPLY_DELAY_MS", default_value_t = 1000)]
    pub reply_delay_ms: u64,

    /// Recipient of escalation alerts
    #[arg(long, env = "HANDOFF_ALERT_RECIPIENT", default_value = "support@example.com")]
    pub alert_recipient: String,

    /// JSON file with the sensitive keyword table (built-in table if unset)
    #[arg(long, env = "HANDOFF_CATEGORIES_FILE")]
    pub categories_file: Option<PathBuf>,

    /// Escalate a room to a human when a user message is classified as sensitive
    #[arg(long, env = "HANDOFF_ESCALATE_ON_SENSITIVE")]
    pub escalate_on_sensitive: bool,

    /// SMTP relay host; alerts are only logged when unset
    #[arg(long, env = "HANDOFF_SMTP_HOST")]
    pub smtp_host: Option<String>,

    #[arg(long, env = "HANDOFF_SMTP_PORT", default_value_t = 587)]
    pub smtp_port: u16,

    #[arg(long, env = "HANDOFF_SMTP_USERNAME")]
    pub smtp_username: Option<String>,

    #[arg(long, env = "HANDOFF_SMTP_PASSWORD", hide_env_values = true)]
    pub smtp_password: Option<String>,

    /// Sender mailbox for alerts
    #[arg(long, env = "HANDOFF_SMTP_FROM")]
    pub smtp_from: Option<String>,

    /// Default log directive (RUST_LOG takes precedence)
    #[arg(long, env = "HANDOFF_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Config {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn router_settings(&self) -> RouterSettings {
        RouterSettings {
            reply_delay: Duration::from_millis(self.reply_delay_ms),
            alert_recipient: self.alert_recipient.clone(),
            escalate_on_sensitive: self.escalate_on_sensitive,
        }
    }

    /// Load the keyword table from `--categories-file`, or the built-in one.
    pub fn load_classifier(&self) -> Result<SensitivityClassifier, ConfigError> {
        let Some(path) = &self.categories_file else {
            return Ok(SensitivityClassifier::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadCategories {
            path: path.clone(),
            source,
        })?;
        let categories: Vec<SensitiveCategory> =
            serde_json::from_str(&raw).map_err(|source| ConfigError::ParseCategories {
                path: path.clone(),
                source,
            })?;
        tracing::info!(
            path = %path.display(),
            categories = categories.len(),
            "loaded sensitive keyword table"
        );
        Ok(SensitivityClassifier::new(categories))
    }

    pub fn build_notifier(&self) -> Result<Arc<dyn Notifier>, ConfigError> {
        let Some(host) = &self.smtp_host else {
            return Ok(Arc::new(LogNotifier::new()));
        };
        let from = self.smtp_from.clone().ok_or(ConfigError::MissingSmtpFrom)?;
        let notifier = SmtpNotifier::new(SmtpSettings {
            host: host.clone(),
            port: self.smtp_port,
            username: self.smtp_username.clone(),
            password: self.smtp_password.clone(),
            from,
        })?;
        tracing::info!(host, port = self.smtp_port, "alerts delivered over SMTP");
        Ok(Arc::new(notifier))
    }

    /// Assemble the router with in-memory storage. Requires a running Tokio runtime.
    pub fn build_router(&self) -> Result<Router, ConfigError> {
        let collaborators = Collaborators {
            rooms: Arc::new(InMemoryRoomRepository::new()),
            store: Arc::new(InMemoryChatStore::new()),
            notifier: self.build_notifier()?,
            responder: Arc::new(EchoResponder::new()),
        };
        Ok(Router::new(
            collaborators,
            self.load_classifier()?,
            self.router_settings(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["handoff-server"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        // テスト項目: 引数なしで既定値が使われる
        // when (操作):
        let config = parse(&[]);

        // then (期待する結果):
        assert_eq!(config.port, 5000);
        assert_eq!(config.reply_delay_ms, 1000);
        assert_eq!(config.alert_recipient, "support@example.com");
        assert!(!config.escalate_on_sensitive);
        assert_eq!(config.smtp_port, 587);
        assert!(config.smtp_host.is_none());
        assert!(config.categories_file.is_none());
    }

    #[test]
    fn test_router_settings_from_flags() {
        // テスト項目: フラグが RouterSettings に反映される
        // given (前提条件):
        let config = parse(&[
            "--host",
            "127.0.0.1",
            "--port",
            "8080",
            "--reply-delay-ms",
            "50",
            "--alert-recipient",
            "ops@example.com",
            "--escalate-on-sensitive",
        ]);

        // when (操作):
        let settings = config.router_settings();

        // then (期待する結果):
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(settings.reply_delay, Duration::from_millis(50));
        assert_eq!(settings.alert_recipient, "ops@example.com");
        assert!(settings.escalate_on_sensitive);
    }

    #[test]
    fn test_load_classifier_builtin_table() {
        // テスト項目: カテゴリファイル未指定時は組み込みテーブルを使う
        // given (前提条件):
        let config = parse(&[]);

        // when (操作):
        let classifier = config.load_classifier().unwrap();

        // then (期待する結果):
        assert_eq!(classifier.categories().len(), 10);
    }

    #[test]
    fn test_load_classifier_from_file() {
        // テスト項目: JSON ファイルのカテゴリ順がそのまま優先順位になる
        // given (前提条件):
        let path = std::env::temp_dir().join(format!(
            "handoff-categories-{}.json",
            uuid::Uuid::new_v4()
        ));
        std::fs::write(
            &path,
            r#"[{"category":"Billing","keywords":["Refund"]},{"category":"Other","keywords":["refund"]}]"#,
        )
        .unwrap();
        let config = parse(&["--categories-file", path.to_str().unwrap()]);

        // when (操作):
        let classifier = config.load_classifier().unwrap();
        std::fs::remove_file(&path).unwrap();

        // then (期待する結果):
        assert_eq!(classifier.categories().len(), 2);
        assert_eq!(classifier.classify("I want a REFUND"), Some("Billing"));
    }

    #[test]
    fn test_load_classifier_missing_file() {
        // テスト項目: 存在しないカテゴリファイルは ReadCategories エラーになる
        // given (前提条件):
        let config = parse(&["--categories-file", "/nonexistent/handoff/categories.json"]);

        // when (操作):
        let result = config.load_classifier();

        // then (期待する結果):
        assert!(matches!(result, Err(ConfigError::ReadCategories { .. })));
    }

    #[test]
    fn test_build_notifier_requires_sender() {
        // テスト項目: SMTP ホスト指定時に送信元がなければエラーになる
        // given (前提条件):
        let config = parse(&["--smtp-host", "smtp.example.com"]);

        // when (操作):
        let result = config.build_notifier();

        // then (期待する結果):
        assert!(matches!(result, Err(ConfigError::MissingSmtpFrom)));
    }

    #[test]
    fn test_build_notifier_smtp() {
        // テスト項目: SMTP 設定が揃っていれば SmtpNotifier を構築できる
        // given (前提条件):
        let config = parse(&[
            "--smtp-host",
            "smtp.example.com",
            "--smtp-from",
            "Support Alerts <alerts@example.com>",
        ]);

        // when (操作):
        let result = config.build_notifier();

        // then (期待する結果):
        assert!(result.is_ok());
    }
}
