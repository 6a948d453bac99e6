//! The task record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::Record;

/// A task as stored and as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    /// A fresh, uncompleted task with a random id.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            description: description.into(),
            completed_at: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Copy with new text, keeping id, creation and completion times.
    pub fn edited(&self, title: String, description: String, now: DateTime<Utc>) -> Self {
        Self {
            title,
            description,
            updated_at: Some(now),
            ..self.clone()
        }
    }

    /// Copy marked completed at `now`.
    pub fn completed(&self, now: DateTime<Utc>) -> Self {
        Self {
            completed_at: Some(now),
            updated_at: Some(now),
            ..self.clone()
        }
    }
}

impl Record for Task {
    const COLLECTION: &'static str = "tasks";

    fn id(&self) -> &str {
        &self.id
    }
}
