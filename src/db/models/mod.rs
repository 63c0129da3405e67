pub mod session;
pub mod task;

pub use session::FocusSession;
pub use task::{TaskInput, TaskItem};
