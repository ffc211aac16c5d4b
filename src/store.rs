// src/store.rs
// Session-scoped history of completed results. Process lifetime only.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::collections::VecDeque;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Detector,
    Humanizer,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionResult {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: ResultKind,
    pub input: String,
    pub output: Value,
    pub timestamp: DateTime<Utc>,
}

/// Bounded FIFO; the oldest entry is evicted once `capacity` is exceeded.
pub struct ResultStore {
    capacity: usize,
    entries: Mutex<VecDeque<SessionResult>>,
}

impl ResultStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
        }
    }

    pub fn save(&self, kind: ResultKind, input: &str, output: Value) -> SessionResult {
        let result = SessionResult {
            id: Uuid::new_v4(),
            kind,
            input: input.to_string(),
            output,
            timestamp: Utc::now(),
        };
        if self.capacity == 0 {
            return result;
        }

        let mut entries = self.entries.lock();
        entries.push_back(result.clone());
        while entries.len() > self.capacity {
            entries.pop_front();
        }
        result
    }

    pub fn get(&self, id: &Uuid) -> Option<SessionResult> {
        self.entries.lock().iter().find(|r| &r.id == id).cloned()
    }

    /// Most recent first.
    pub fn recent(&self, limit: usize) -> Vec<SessionResult> {
        self.entries.lock().iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_save_and_get() {
        let store = ResultStore::new(10);
        let saved = store.save(ResultKind::Detector, "text", json!({"ai_probability": 3}));
        let found = store.get(&saved.id).unwrap();
        assert_eq!(found.kind, ResultKind::Detector);
        assert_eq!(found.output["ai_probability"], 3);
        assert!(store.get(&Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_oldest_evicted_at_capacity() {
        let store = ResultStore::new(3);
        let first = store.save(ResultKind::Humanizer, "0", json!(0));
        for i in 1..5 {
            store.save(ResultKind::Humanizer, &i.to_string(), json!(i));
        }
        assert_eq!(store.len(), 3);
        assert!(store.get(&first.id).is_none());

        let recent: Vec<String> = store.recent(10).into_iter().map(|r| r.input).collect();
        assert_eq!(recent, vec!["4", "3", "2"]);
        assert_eq!(store.recent(1).len(), 1);
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let store = ResultStore::new(0);
        store.save(ResultKind::Detector, "x", json!(null));
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_serialized_shape() {
        let store = ResultStore::new(1);
        let saved = store.save(ResultKind::Humanizer, "in", json!({"rewrittenText": "out"}));
        let value = serde_json::to_value(&saved).unwrap();
        assert_eq!(value["type"], "humanizer");
        assert_eq!(value["input"], "in");
        assert!(value["timestamp"].is_string());
    }
}
