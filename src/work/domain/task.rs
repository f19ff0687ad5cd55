//! Task value object.

use super::TaskId;
use crate::provider::domain::{Capability, CapabilitySet};
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Deadline applied when the caller does not set one.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// A unit of work to route to one or more providers.
///
/// The `with_*` builders consume and return the task; once submitted a task
/// is only ever read.
#[derive(Debug, Clone)]
pub struct Task {
    id: TaskId,
    task_type: Capability,
    description: Value,
    required: CapabilitySet,
    language: Option<String>,
    domain: Option<String>,
    deadline: Instant,
    cancellation: CancellationToken,
}

impl Task {
    /// Creates a task requiring only its own task type.
    #[must_use]
    pub fn new(task_type: Capability, description: Value) -> Self {
        let required = CapabilitySet::from_iter([task_type.clone()]);
        Self {
            id: TaskId::new(),
            task_type,
            description,
            required,
            language: None,
            domain: None,
            deadline: Instant::now() + DEFAULT_TIMEOUT,
            cancellation: CancellationToken::new(),
        }
    }

    /// Replaces the generated identifier.
    #[must_use]
    pub const fn with_id(mut self, id: TaskId) -> Self {
        self.id = id;
        self
    }

    /// Replaces the required capabilities.
    #[must_use]
    pub fn with_required_capabilities(mut self, required: CapabilitySet) -> Self {
        self.required = required;
        self
    }

    /// Sets a programming-language hint.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Sets a domain hint.
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Sets an absolute deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = deadline;
        self
    }

    /// Sets the deadline relative to now.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Instant::now() + timeout;
        self
    }

    /// Uses a caller-owned cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the task type.
    #[must_use]
    pub const fn task_type(&self) -> &Capability {
        &self.task_type
    }

    /// Returns the description payload.
    #[must_use]
    pub const fn description(&self) -> &Value {
        &self.description
    }

    /// Returns the capabilities a provider must have probed.
    #[must_use]
    pub const fn required_capabilities(&self) -> &CapabilitySet {
        &self.required
    }

    /// Returns the language hint.
    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Returns the domain hint.
    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// Returns the deadline.
    #[must_use]
    pub const fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Returns the time left before the deadline, zero once it has passed.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Returns the cancellation token.
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Returns whether the caller withdrew the task.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}
