//! Domain model for tasks and tool responses.

mod ids;
mod response;
mod task;
mod workspace;

pub use ids::TaskId;
pub use response::{ResponseError, ResponseErrorKind, ToolResponse};
pub use task::Task;
pub use workspace::WorkspaceSnapshot;
