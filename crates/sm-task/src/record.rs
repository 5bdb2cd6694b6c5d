//! Records: containers of the tasks created against them

use crate::task::Task;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sm_survey::SurveyId;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;
use ulid::Ulid;

/// Unique record identifier (ULID)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub Ulid);

impl RecordId {
    /// Generate new record ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Work assigned for one survey, shared by every task bound to it
///
/// Tasks hold only weak references back to their record.
#[derive(Debug)]
pub struct Record {
    id: RecordId,
    survey: SurveyId,
    tasks: Mutex<Vec<Arc<dyn Task>>>,
}

impl Record {
    /// Create an empty record for `survey`
    #[must_use]
    pub fn new(survey: SurveyId) -> Arc<Self> {
        Arc::new(Self {
            id: RecordId::new(),
            survey,
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Record ID
    #[inline]
    #[must_use]
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Survey the record serves
    #[inline]
    #[must_use]
    pub fn survey(&self) -> SurveyId {
        self.survey
    }

    /// Registered tasks in registration order
    #[must_use]
    pub fn tasks(&self) -> Vec<Arc<dyn Task>> {
        self.tasks.lock().clone()
    }

    /// Number of registered tasks
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Whether any registered task has the id `task_id`
    ///
    /// Ids are not required to be unique; a platform may assign one that
    /// matches a locally allocated id.
    #[must_use]
    pub fn contains(&self, task_id: &str) -> bool {
        self.tasks.lock().iter().any(|t| t.id() == task_id)
    }

    /// Register a task; false when this same task is already registered here
    pub(crate) fn register(&self, task: Arc<dyn Task>) -> bool {
        let mut tasks = self.tasks.lock();
        if tasks.iter().any(|t| same_task(t, &task)) {
            return false;
        }
        tasks.push(task);
        true
    }
}

/// Same allocation; compares data pointers only
fn same_task(a: &Arc<dyn Task>, b: &Arc<dyn Task>) -> bool {
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}
