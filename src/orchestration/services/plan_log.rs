//! Bounded log of recent routing plans.

use crate::routing::RoutingPlan;
use crate::work::domain::TaskId;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct PlanLogState {
    order: VecDeque<TaskId>,
    plans: HashMap<TaskId, RoutingPlan>,
}

/// Keeps the latest plan for each of the most recent tasks.
///
/// Recording a plan for a known task replaces it without changing the
/// task's age. The oldest task is evicted once `capacity` is exceeded.
#[derive(Debug)]
pub struct PlanLog {
    capacity: usize,
    state: Mutex<PlanLogState>,
}

impl PlanLog {
    /// Creates an empty log holding at most `capacity` tasks.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(PlanLogState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PlanLogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records `plan` as its task's latest plan.
    pub fn record(&self, plan: RoutingPlan) {
        let mut state = self.lock();
        let task = plan.task();
        if state.plans.insert(task, plan).is_none() {
            state.order.push_back(task);
        }
        while state.order.len() > self.capacity {
            if let Some(evicted) = state.order.pop_front() {
                state.plans.remove(&evicted);
            }
        }
    }

    /// Returns the latest plan recorded for `task`.
    #[must_use]
    pub fn latest(&self, task: TaskId) -> Option<RoutingPlan> {
        self.lock().plans.get(&task).cloned()
    }

    /// Returns the number of tasks with a recorded plan.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().plans.len()
    }

    /// Returns whether no plan is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
