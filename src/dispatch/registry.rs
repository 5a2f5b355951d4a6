//! Exact-match action registry.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt};
use serde_json::Value;

use super::{DispatchError, Dispatcher, Message};

type Action = Arc<dyn Fn(Message) -> BoxFuture<'static, Result<Value, DispatchError>> + Send + Sync>;

/// Actions keyed by canonical pattern.
///
/// Cloning shares the underlying table, so actions added after the adapter is
/// built are still reachable.
#[derive(Clone, Default)]
pub struct ActionRegistry {
    actions: Arc<DashMap<String, Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `action` for `pattern`, replacing any previous action.
    pub fn add<F, Fut>(&self, pattern: &str, action: F)
    where
        F: Fn(Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, DispatchError>> + Send + 'static,
    {
        let action: Action = Arc::new(move |msg| action(msg).boxed());
        if self.actions.insert(canonical_pattern(pattern), action).is_some() {
            tracing::debug!(pattern = %pattern, "Replaced existing action");
        }
    }

    pub fn contains(&self, pattern: &str) -> bool {
        self.actions.contains_key(&canonical_pattern(pattern))
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[async_trait]
impl Dispatcher for ActionRegistry {
    async fn dispatch(&self, pattern: &str, message: Message) -> Result<Value, DispatchError> {
        let action = self
            .actions
            .get(&canonical_pattern(pattern))
            .map(|entry| entry.value().clone())
            .ok_or_else(|| DispatchError::NoHandler(pattern.to_string()))?;

        action(message).await
    }
}

/// Normalize `key:value` pairs so that ordering and whitespace don't matter.
pub fn canonical_pattern(pattern: &str) -> String {
    let mut pairs: Vec<(&str, &str)> = pattern
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| match p.split_once(':') {
            Some((k, v)) => (k.trim(), v.trim()),
            None => (p, ""),
        })
        .collect();
    pairs.sort();

    pairs
        .iter()
        .map(|(k, v)| format!("{}:{}", k, v))
        .collect::<Vec<_>>()
        .join(",")
}
