//! The unit of work: a subject evaluated under a cultural tradition.

use serde::{Deserialize, Serialize};

/// A pipeline task. Immutable once a run starts; `task_id` keys every
/// checkpoint and trajectory record the run produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    /// What to depict or produce (e.g. "mountain hermitage in autumn").
    pub subject: String,
    /// Key into the tradition catalog (e.g. "chinese_ink").
    pub cultural_tradition: String,
}

impl Task {
    pub fn new(
        task_id: impl Into<String>,
        subject: impl Into<String>,
        cultural_tradition: impl Into<String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            subject: subject.into(),
            cultural_tradition: cultural_tradition.into(),
        }
    }
}
