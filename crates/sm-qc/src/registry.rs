//! Per-survey participation tracking

use sm_response::WorkerId;
use sm_survey::SurveyId;
use std::collections::HashSet;

/// Workers already assessed for one survey
///
/// Append-only. Only the owning engine registers workers.
#[derive(Debug, Clone)]
pub struct ParticipationRegistry {
    survey: SurveyId,
    workers: HashSet<WorkerId>,
}

impl ParticipationRegistry {
    pub(crate) fn new(survey: SurveyId) -> Self {
        Self {
            survey,
            workers: HashSet::new(),
        }
    }

    /// Survey this registry belongs to
    #[inline]
    #[must_use]
    pub fn survey(&self) -> SurveyId {
        self.survey
    }

    /// Whether `worker` has been assessed
    #[inline]
    #[must_use]
    pub fn contains(&self, worker: &WorkerId) -> bool {
        self.workers.contains(worker)
    }

    /// Record `worker`; false when already present
    pub(crate) fn register(&mut self, worker: WorkerId) -> bool {
        self.workers.insert(worker)
    }

    /// Number of registered workers
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// Whether no worker is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Registered workers, sorted
    #[must_use]
    pub fn workers(&self) -> Vec<WorkerId> {
        let mut workers: Vec<_> = self.workers.iter().cloned().collect();
        workers.sort();
        workers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_is_append_only() {
        let mut registry = ParticipationRegistry::new(SurveyId::new());
        let w1 = WorkerId::new("w1").unwrap();
        assert!(registry.register(w1.clone()));
        assert!(!registry.register(w1.clone()));
        assert!(registry.contains(&w1));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.workers(), vec![w1]);
    }
}
