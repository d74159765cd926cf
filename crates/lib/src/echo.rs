//! Echo responder for SecondaryAgent: returns the message with a running count.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide count of successful echoes. Starts at zero; not persisted.
#[derive(Debug, Default)]
pub struct EchoCounter {
    count: AtomicU64,
}

impl EchoCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment and return the new value.
    pub fn next(&self) -> u64 {
        self.count.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }
}

/// Echo result (also the `/api/echo` response body).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EchoReply {
    pub message: String,
    pub message_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EchoError {
    #[error("Message cannot be empty")]
    Empty,
}

/// Echo `message` back, counting it. Blank input is rejected and not counted.
pub fn echo(counter: &EchoCounter, message: &str) -> Result<EchoReply, EchoError> {
    if message.trim().is_empty() {
        return Err(EchoError::Empty);
    }
    let message_count = counter.next();
    log::info!("echo request #{}: {}", message_count, message);
    Ok(EchoReply {
        message: message.to_string(),
        message_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_each_successful_echo() {
        let counter = EchoCounter::new();
        assert_eq!(echo(&counter, "hi").unwrap().message_count, 1);
        let second = echo(&counter, "hi").unwrap();
        assert_eq!(second.message, "hi");
        assert_eq!(second.message_count, 2);
    }

    #[test]
    fn empty_is_rejected_without_counting() {
        let counter = EchoCounter::new();
        assert_eq!(echo(&counter, ""), Err(EchoError::Empty));
        assert_eq!(echo(&counter, "   \n"), Err(EchoError::Empty));
        assert_eq!(counter.current(), 0);
        assert_eq!(echo(&counter, "x").unwrap().message_count, 1);
    }

    #[test]
    fn wire_uses_camel_case() {
        let v = serde_json::to_value(EchoReply {
            message: "hi".into(),
            message_count: 3,
        })
        .unwrap();
        assert_eq!(v, serde_json::json!({ "message": "hi", "messageCount": 3 }));
    }
}
