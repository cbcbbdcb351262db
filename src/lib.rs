// todolist - Single-user task manager over an embedded SQLite file

pub mod error;
pub mod shell;
pub mod store;
pub mod task;

// Re-export main types for convenience
pub use error::{Result, StoreError};
pub use shell::{Shell, parse_date};
pub use store::{DEFAULT_DB_NAME, TaskStore};
pub use task::Task;
