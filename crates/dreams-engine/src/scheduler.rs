use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use dreams_types::models::{ConversationRef, MessageId, UserId};

use crate::error::{EngineError, EngineResult};

/// Identifies a pending timer. At most one task exists per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKey {
    /// A send-later message, keyed by its pre-allocated identifier
    Delivery(MessageId),
    /// The closing of a conversation's standup window
    Standup(ConversationRef),
}

struct ScheduledTask {
    generation: u64,
    owner: UserId,
    cancel: CancellationToken,
}

/// Single-shot timers on the tokio runtime. Each task fires at most once and
/// can be cancelled until it does.
#[derive(Clone, Default)]
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
}

#[derive(Default)]
struct SchedulerInner {
    tasks: Mutex<HashMap<TaskKey, ScheduledTask>>,
    generation: AtomicU64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `job` once `delay` has elapsed unless the task is cancelled first.
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, key: TaskKey, owner: UserId, delay: Duration, job: F) -> EngineResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::runtime::Handle::try_current().map_err(|e| {
            EngineError::Configuration(format!("No async runtime to schedule {:?}: {}", key, e))
        })?;

        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        {
            let mut tasks = self.lock()?;
            if tasks.contains_key(&key) {
                return Err(EngineError::Configuration(format!("{:?} is already scheduled", key)));
            }
            tasks.insert(
                key,
                ScheduledTask {
                    generation,
                    owner,
                    cancel: cancel.clone(),
                },
            );
        }

        let inner = self.inner.clone();
        handle.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Deferred task {:?} cancelled", key);
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }

            // Claim the entry; losing the race to `cancel` means we must not fire.
            let claimed = match inner.tasks.lock() {
                Ok(mut tasks) => match tasks.get(&key) {
                    Some(task) if task.generation == generation => {
                        tasks.remove(&key);
                        true
                    }
                    _ => false,
                },
                Err(e) => {
                    warn!("Scheduler lock poisoned, dropping {:?}: {}", key, e);
                    false
                }
            };
            if claimed {
                debug!("Deferred task {:?} firing", key);
                job.await;
            }
        });

        debug!("Scheduled {:?} in {:?}", key, delay);
        Ok(())
    }

    /// User who scheduled the pending task, if any.
    pub fn owner_of(&self, key: TaskKey) -> EngineResult<Option<UserId>> {
        Ok(self.lock()?.get(&key).map(|t| t.owner))
    }

    /// Cancel a pending task. Returns false if it already fired or never existed.
    pub fn cancel(&self, key: TaskKey) -> EngineResult<bool> {
        let task = self.lock()?.remove(&key);
        Ok(match task {
            Some(task) => {
                task.cancel.cancel();
                true
            }
            None => false,
        })
    }

    /// Cancel every pending task scheduled by `owner`.
    pub fn cancel_owned_by(&self, owner: UserId) -> EngineResult<usize> {
        let mut tasks = self.lock()?;
        let keys: Vec<TaskKey> = tasks
            .iter()
            .filter(|(_, task)| task.owner == owner)
            .map(|(key, _)| *key)
            .collect();
        for key in &keys {
            if let Some(task) = tasks.remove(key) {
                task.cancel.cancel();
            }
        }
        Ok(keys.len())
    }

    /// Cancel every pending task.
    pub fn cancel_all(&self) -> EngineResult<usize> {
        let drained: Vec<ScheduledTask> = self.lock()?.drain().map(|(_, t)| t).collect();
        for task in &drained {
            task.cancel.cancel();
        }
        Ok(drained.len())
    }

    pub fn pending(&self) -> EngineResult<usize> {
        Ok(self.lock()?.len())
    }

    fn lock(&self) -> EngineResult<std::sync::MutexGuard<'_, HashMap<TaskKey, ScheduledTask>>> {
        self.inner
            .tasks
            .lock()
            .map_err(|e| EngineError::Configuration(format!("Scheduler lock poisoned: {}", e)))
    }
}

/// Time left until `at` (seconds since the epoch), or `None` if `at` is not in
/// the future.
pub fn delay_until(at: i64) -> Option<Duration> {
    let now_ms = chrono::Utc::now().timestamp_millis();
    let target_ms = at.checked_mul(1000)?;
    let remaining = target_ms.checked_sub(now_ms)?;
    (remaining > 0).then(|| Duration::from_millis(remaining as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_the_delay() {
        let scheduler = Scheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        scheduler
            .schedule(TaskKey::Delivery(1), 7, Duration::from_secs(2), async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.owner_of(TaskKey::Delivery(1)).unwrap(), Some(7));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending().unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_tasks_never_fire() {
        let scheduler = Scheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        scheduler
            .schedule(TaskKey::Delivery(2), 1, Duration::from_secs(1), async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        assert!(scheduler.cancel(TaskKey::Delivery(2)).unwrap());
        assert!(!scheduler.cancel(TaskKey::Delivery(2)).unwrap());
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_keys_are_rejected() {
        let scheduler = Scheduler::new();
        let key = TaskKey::Standup(ConversationRef::Channel(1));
        scheduler.schedule(key, 1, Duration::from_secs(5), async {}).unwrap();
        assert!(scheduler.schedule(key, 1, Duration::from_secs(5), async {}).is_err());
        assert_eq!(scheduler.cancel_all().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_by_owner_leaves_other_users_alone() {
        let scheduler = Scheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));
        for (id, owner) in [(1, 5), (2, 6), (3, 5)] {
            let counter = fired.clone();
            scheduler
                .schedule(TaskKey::Delivery(id), owner, Duration::from_secs(1), async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }

        assert_eq!(scheduler.cancel_owned_by(5).unwrap(), 2);
        assert_eq!(scheduler.owner_of(TaskKey::Delivery(2)).unwrap(), Some(6));
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn past_instants_have_no_delay() {
        let now = chrono::Utc::now().timestamp();
        assert!(delay_until(now - 10).is_none());
        assert!(delay_until(now + 10).is_some());
    }

    #[test]
    fn scheduling_outside_a_runtime_fails_cleanly() {
        let scheduler = Scheduler::new();
        let err = scheduler
            .schedule(TaskKey::Delivery(9), 1, Duration::from_secs(1), async {})
            .unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
        assert_eq!(scheduler.pending().unwrap(), 0);
    }
}
