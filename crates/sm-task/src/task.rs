//! Units of assigned work
//!
//! [`LocalTask`] simulates work in-process; [`RemoteTask`] stands for work
//! posted to a crowdsourcing platform. Both are handled through [`Task`].

use crate::record::Record;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::sync::{Arc, Weak};
use tracing::debug;

/// Where a task runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// In-process simulation
    Local,
    /// Crowdsourcing platform
    Remote,
}

impl Backend {
    /// Prefix of locally allocated task ids
    #[must_use]
    pub fn id_prefix(self) -> &'static str {
        match self {
            Self::Local => "task",
            Self::Remote => "remote",
        }
    }
}

impl Display for Backend {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Remote => f.write_str("remote"),
        }
    }
}

/// Capabilities shared by every task backend
pub trait Task: Send + Sync + fmt::Debug {
    /// Task identifier
    fn id(&self) -> &str;

    /// Backend running the task
    fn backend(&self) -> Backend;

    /// Record the task is bound to, if it is still alive
    fn bound_record(&self) -> Option<Arc<Record>>;

    /// Point the task at `record` and register it there
    ///
    /// The previous record keeps its registration.
    fn bind(self: Arc<Self>, record: &Arc<Record>);
}

/// Identifier and record reference common to both backends
#[derive(Debug)]
struct Binding {
    id: String,
    record: RwLock<Weak<Record>>,
}

impl Binding {
    fn new(id: String) -> Self {
        Self {
            id,
            record: RwLock::new(Weak::new()),
        }
    }

    fn record(&self) -> Option<Arc<Record>> {
        self.record.read().upgrade()
    }

    fn bind(&self, task: Arc<dyn Task>, record: &Arc<Record>) {
        *self.record.write() = Arc::downgrade(record);
        let registered = record.register(task);
        debug!(task = %self.id, record = %record.id(), registered, "task bound");
    }
}

/// Task simulated in-process
#[derive(Debug)]
pub struct LocalTask {
    binding: Binding,
}

impl LocalTask {
    pub(crate) fn new(id: String) -> Arc<Self> {
        Arc::new(Self {
            binding: Binding::new(id),
        })
    }
}

impl Task for LocalTask {
    fn id(&self) -> &str {
        &self.binding.id
    }

    fn backend(&self) -> Backend {
        Backend::Local
    }

    fn bound_record(&self) -> Option<Arc<Record>> {
        self.binding.record()
    }

    fn bind(self: Arc<Self>, record: &Arc<Record>) {
        let task: Arc<dyn Task> = Arc::clone(&self) as Arc<dyn Task>;
        self.binding.bind(task, record);
    }
}

/// Task posted to a crowdsourcing platform
#[derive(Debug)]
pub struct RemoteTask {
    binding: Binding,
    platform_assigned: bool,
}

impl RemoteTask {
    pub(crate) fn new(id: String) -> Arc<Self> {
        Arc::new(Self {
            binding: Binding::new(id),
            platform_assigned: false,
        })
    }

    /// Wrap an id the platform assigned; unbound until [`Task::bind`]
    #[must_use]
    pub fn from_platform(id: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            binding: Binding::new(id.into()),
            platform_assigned: true,
        })
    }

    /// Whether the platform, not this process, chose the id
    #[inline]
    #[must_use]
    pub fn is_platform_assigned(&self) -> bool {
        self.platform_assigned
    }
}

impl Task for RemoteTask {
    fn id(&self) -> &str {
        &self.binding.id
    }

    fn backend(&self) -> Backend {
        Backend::Remote
    }

    fn bound_record(&self) -> Option<Arc<Record>> {
        self.binding.record()
    }

    fn bind(self: Arc<Self>, record: &Arc<Record>) {
        let task: Arc<dyn Task> = Arc::clone(&self) as Arc<dyn Task>;
        self.binding.bind(task, record);
    }
}
