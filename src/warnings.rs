//! Deduplicated import warnings

use std::collections::HashSet;

use tracing::warn;

/// Collects soft failures of an import run.
///
/// Each distinct message is logged once when first seen; repeats are dropped.
#[derive(Debug, Default)]
pub struct Warnings {
    seen: HashSet<String>,
    messages: Vec<String>,
}

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning, returning false if the same message was seen before
    pub fn push(&mut self, message: impl Into<String>) -> bool {
        let message = message.into();
        if !self.seen.insert(message.clone()) {
            return false;
        }
        warn!("{message}");
        self.messages.push(message);
        true
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(String::as_str)
    }

    pub fn contains(&self, message: &str) -> bool {
        self.seen.contains(message)
    }

    pub fn into_messages(self) -> Vec<String> {
        self.messages
    }
}
