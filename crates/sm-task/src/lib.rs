//! SurveyMan Tasks
//!
//! Binds units of work to the records they belong to:
//! - **Record**: shared container listing its tasks in registration order
//! - **Task**: backend-independent capabilities (`id`, `bound_record`, `bind`)
//! - **Factory**: per-backend id allocation and bound task creation
//!
//! # Example
//!
//! ```rust
//! use sm_task::{create_task, Backend, Record};
//! use sm_survey::SurveyId;
//!
//! let record = Record::new(SurveyId::new());
//! let task = create_task(&record, Backend::Local);
//! assert!(task.id().starts_with("task"));
//! assert_eq!(record.task_count(), 1);
//! ```

#![warn(missing_docs)]

pub mod factory;
pub mod record;
pub mod task;

// Re-exports
pub use factory::{create_task, IdGenerator, TaskFactory};
pub use record::{Record, RecordId};
pub use task::{Backend, LocalTask, RemoteTask, Task};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for task handling
    pub use crate::{create_task, Backend, Record, Task, TaskFactory};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
