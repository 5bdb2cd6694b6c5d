//! Task creation with per-backend id numbering

use crate::record::Record;
use crate::task::{Backend, LocalTask, RemoteTask, Task};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Hands out `{prefix}1`, `{prefix}2`, ... exactly once each
#[derive(Debug)]
pub struct IdGenerator {
    prefix: &'static str,
    next: AtomicU64,
}

impl IdGenerator {
    /// Generator starting at 1
    #[must_use]
    pub const fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            next: AtomicU64::new(1),
        }
    }

    /// Id prefix
    #[inline]
    #[must_use]
    pub fn prefix(&self) -> &'static str {
        self.prefix
    }

    /// Allocate the next id
    pub fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}{n}", self.prefix)
    }
}

/// Creates tasks bound to records
///
/// Only the process-wide instance exists outside this crate, so every
/// allocated id is unique within the process.
#[derive(Debug)]
pub struct TaskFactory {
    local: IdGenerator,
    remote: IdGenerator,
}

static GLOBAL: TaskFactory = TaskFactory::new();

impl TaskFactory {
    const fn new() -> Self {
        Self {
            local: IdGenerator::new("task"),
            remote: IdGenerator::new("remote"),
        }
    }

    /// Process-wide factory; its ids are unique within the process
    #[inline]
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Id generator for a backend
    #[must_use]
    pub fn generator(&self, backend: Backend) -> &IdGenerator {
        match backend {
            Backend::Local => &self.local,
            Backend::Remote => &self.remote,
        }
    }

    /// Create a task on `backend`, bound and registered to `record`
    pub fn create_task(&self, record: &Arc<Record>, backend: Backend) -> Arc<dyn Task> {
        let id = self.generator(backend).next_id();
        let task: Arc<dyn Task> = match backend {
            Backend::Local => LocalTask::new(id),
            Backend::Remote => RemoteTask::new(id),
        };
        debug!(task = task.id(), %backend, record = %record.id(), "task created");
        Arc::clone(&task).bind(record);
        task
    }
}

/// Create a task with the process-wide factory
pub fn create_task(record: &Arc<Record>, backend: Backend) -> Arc<dyn Task> {
    TaskFactory::global().create_task(record, backend)
}
