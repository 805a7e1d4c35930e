//! Placeholder automated responder.

use async_trait::async_trait;

use crate::domain::{Responder, ResponderError};

/// Echoes the user's text back in a canned sentence.
///
/// Stands in for a real text-generation service behind the same trait.
#[derive(Debug, Default, Clone)]
pub struct EchoResponder;

impl EchoResponder {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Responder for EchoResponder {
    async fn reply(&self, text: &str) -> Result<String, ResponderError> {
        Ok(format!("This is a simulated response to: {text}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_responder_reply() {
        // テスト項目: 入力文を埋め込んだ応答を返す
        // when (操作):
        let reply = EchoResponder::new().reply("Hello, how are you?").await;

        // then (期待する結果):
        assert_eq!(
            reply.unwrap(),
            "This is a simulated response to: Hello, how are you?"
        );
    }
}
