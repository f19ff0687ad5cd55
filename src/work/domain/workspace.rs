//! Workspace context handed to providers alongside a task.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Read-only view of the caller's workspace at submission time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceSnapshot {
    root: Option<String>,
    open_files: Vec<String>,
    context: Value,
}

impl WorkspaceSnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the workspace root path.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Replaces the list of open files.
    #[must_use]
    pub fn with_open_files(mut self, files: impl IntoIterator<Item = String>) -> Self {
        self.open_files = files.into_iter().collect();
        self
    }

    /// Sets free-form context such as selections or diagnostics.
    #[must_use]
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }

    /// Returns the workspace root path.
    #[must_use]
    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    /// Returns the open files.
    #[must_use]
    pub fn open_files(&self) -> &[String] {
        &self.open_files
    }

    /// Returns the free-form context.
    #[must_use]
    pub const fn context(&self) -> &Value {
        &self.context
    }
}
