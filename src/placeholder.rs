//! Subscriber placeholders
//!
//! One placeholder node per live remote stream, keyed by stream id and
//! created inside the subscriber container. The SDK renders into the node;
//! this registry only tracks which nodes exist.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::model::StreamId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub stream_id: StreamId,
    /// Element id the SDK renders the subscriber into.
    pub element_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct PlaceholderRegistry {
    container: String,
    entries: HashMap<StreamId, Placeholder>,
}

impl PlaceholderRegistry {
    pub fn new(container: impl Into<String>) -> Self {
        PlaceholderRegistry {
            container: container.into(),
            entries: HashMap::new(),
        }
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    /// Create the placeholder for `stream_id`. Returns `None` when one already
    /// exists for that stream.
    pub fn attach(&mut self, stream_id: &StreamId) -> Option<&Placeholder> {
        if self.entries.contains_key(stream_id) {
            return None;
        }

        let placeholder = Placeholder {
            stream_id: stream_id.clone(),
            element_id: format!("{}-{}", self.container, stream_id),
            created_at: Utc::now(),
        };
        debug!("Attached placeholder '{}'", placeholder.element_id);

        let entry: &Placeholder = self.entries.entry(stream_id.clone()).or_insert(placeholder);
        Some(entry)
    }

    /// Remove the placeholder for `stream_id`. Unknown ids are a no-op.
    pub fn detach(&mut self, stream_id: &StreamId) -> Option<Placeholder> {
        let removed = self.entries.remove(stream_id);
        if let Some(p) = &removed {
            debug!(
                "Detached placeholder '{}' after {}s",
                p.element_id,
                (Utc::now() - p.created_at).num_seconds()
            );
        }
        removed
    }

    /// Remove every placeholder, returning how many were dropped.
    pub fn clear(&mut self) -> usize {
        let n = self.entries.len();
        self.entries.clear();
        n
    }

    pub fn get(&self, stream_id: &StreamId) -> Option<&Placeholder> {
        self.entries.get(stream_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stream ids with a live placeholder, sorted.
    pub fn stream_ids(&self) -> Vec<StreamId> {
        let mut ids: Vec<StreamId> = self.entries.keys().cloned().collect();
        ids.sort();
        ids
    }
}
