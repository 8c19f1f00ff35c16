//! Shared dependencies of every manager.

use log::warn;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use std::sync::{Arc, Mutex};

use crate::db::{Store, UnitOfWork};
use crate::error::CoreResult;
use crate::notify::{Notifier, Outbox};
use crate::settings::CompetitionSettings;
use crate::team::Team;

/// Orders teams before elimination pairing
pub trait TeamShuffler: Send + Sync {
    fn shuffle(&self, teams: &mut [Team]);
}

/// Uniform random shuffle
pub struct RandomShuffler {
    rng: Mutex<StdRng>,
}

impl RandomShuffler {
    /// Seed from the operating system
    pub fn from_os_rng() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Reproducible shuffles for tests and replays
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl TeamShuffler for RandomShuffler {
    fn shuffle(&self, teams: &mut [Team]) {
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        teams.shuffle(&mut *rng);
    }
}

/// Leaves teams in the order they were loaded (ascending name)
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderedShuffler;

impl TeamShuffler for OrderedShuffler {
    fn shuffle(&self, _teams: &mut [Team]) {}
}

/// Store, notifier, shuffler and settings shared by the managers
pub struct EngineContext {
    pub store: Arc<dyn Store>,
    pub notifier: Arc<dyn Notifier>,
    pub shuffler: Arc<dyn TeamShuffler>,
    pub settings: CompetitionSettings,
}

impl EngineContext {
    /// Create a context with an OS-seeded shuffler
    pub fn new(
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
        settings: CompetitionSettings,
    ) -> Self {
        Self {
            store,
            notifier,
            shuffler: Arc::new(RandomShuffler::from_os_rng()),
            settings,
        }
    }

    pub fn with_shuffler(mut self, shuffler: Arc<dyn TeamShuffler>) -> Self {
        self.shuffler = shuffler;
        self
    }

    /// Close a unit of work according to `result`
    ///
    /// Commits on success. On failure the unit of work is rolled back and the
    /// original error is returned; a failing rollback is only logged.
    pub async fn finish<T>(
        &self,
        mut uow: Box<dyn UnitOfWork>,
        result: CoreResult<T>,
    ) -> CoreResult<T> {
        match result {
            Ok(value) => {
                uow.commit().await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = uow.rollback().await {
                    warn!("Rollback after '{e}' failed: {rollback_err}");
                }
                Err(e)
            }
        }
    }

    /// Deliver notifications queued by a committed unit of work
    pub async fn deliver(&self, outbox: Outbox) {
        if !outbox.is_empty() {
            outbox.dispatch(self.notifier.as_ref()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teams(names: &[&str]) -> Vec<Team> {
        names.iter().map(|n| Team::new(*n)).collect()
    }

    fn names(teams: &[Team]) -> Vec<String> {
        teams.iter().map(|t| t.name.clone()).collect()
    }

    #[test]
    fn test_seeded_shuffles_are_reproducible() {
        let mut a = teams(&["A", "B", "C", "D", "E", "F", "G", "H"]);
        let mut b = a.clone();

        RandomShuffler::seeded(7).shuffle(&mut a);
        RandomShuffler::seeded(7).shuffle(&mut b);

        assert_eq!(names(&a), names(&b));
    }

    #[test]
    fn test_shuffle_keeps_every_team() {
        let mut shuffled = teams(&["A", "B", "C", "D"]);
        RandomShuffler::from_os_rng().shuffle(&mut shuffled);

        let mut sorted = names(&shuffled);
        sorted.sort();
        assert_eq!(sorted, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_ordered_shuffler_is_identity() {
        let mut t = teams(&["A", "B", "C"]);
        OrderedShuffler.shuffle(&mut t);
        assert_eq!(names(&t), vec!["A", "B", "C"]);
    }
}
