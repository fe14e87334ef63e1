//! Download task types and the task source seam.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum label length kept for logging and the error log.
const LABEL_MAX_CHARS: usize = 50;

/// Stable content fingerprint used for deduplication.
///
/// djb2 over the trimmed task text, so textually-identical tasks collapse
/// to one entry. Non-cryptographic; collisions are acceptable for this
/// non-adversarial use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(u32);

impl Fingerprint {
    /// Fingerprint a task's content.
    pub fn of(content: &str) -> Self {
        let mut hash: u32 = 5381;
        for byte in content.trim().bytes() {
            hash = hash
                .wrapping_shl(5)
                .wrapping_add(hash)
                .wrapping_add(u32::from(byte));
        }
        Self(hash)
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// One unit of work submitted to the queue.
///
/// Opaque to the queue itself: the action adapter knows how to turn the
/// task into a real dispatch. The fingerprint is computed once at
/// creation and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadTask {
    id: Uuid,
    label: String,
    fingerprint: Fingerprint,
}

impl DownloadTask {
    /// Create a task with an explicit label and content to fingerprint.
    pub fn new(label: impl Into<String>, content: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            fingerprint: Fingerprint::of(content),
        }
    }

    /// Create a task labeled by a prefix of its own content.
    pub fn from_content(content: &str) -> Self {
        let label: String = content.trim().chars().take(LABEL_MAX_CHARS).collect();
        Self::new(label, content)
    }

    /// Stable unique id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Short human-readable label for logs.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Content fingerprint for dedup.
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }
}

/// Supplies the ordered batch of tasks for a run.
///
/// Typically backed by a UI selection; supplying zero tasks makes the run
/// controller fail fast with `NoTasksSelected`.
pub trait TaskSource {
    fn tasks(&self) -> Vec<DownloadTask>;
}
