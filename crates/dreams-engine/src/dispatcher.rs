use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tracing::warn;

use dreams_types::events::DreamsEvent;

/// How many failed deferred deliveries are retained for inspection.
const DEAD_LETTER_CAPACITY: usize = 100;

/// Fans engine events out to every subscriber.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    /// Every subscriber receives every event
    broadcast_tx: broadcast::Sender<DreamsEvent>,

    /// Most recent `DeliveryFailed` events, oldest first
    dead_letters: Mutex<VecDeque<DreamsEvent>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(1024);
        Self {
            inner: Arc::new(DispatcherInner {
                broadcast_tx,
                dead_letters: Mutex::new(VecDeque::new()),
            }),
        }
    }

    /// Subscribe to engine events. Returns a broadcast receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<DreamsEvent> {
        self.inner.broadcast_tx.subscribe()
    }

    /// Broadcast an event. Having no subscribers is not an error.
    pub fn broadcast(&self, event: DreamsEvent) {
        let _ = self.inner.broadcast_tx.send(event);
    }

    /// Record a failed deferred delivery and broadcast it.
    pub fn dead_letter(&self, event: DreamsEvent) {
        match self.inner.dead_letters.lock() {
            Ok(mut letters) => {
                letters.push_back(event.clone());
                while letters.len() > DEAD_LETTER_CAPACITY {
                    letters.pop_front();
                }
            }
            Err(e) => warn!("Dead-letter queue lock poisoned: {}", e),
        }
        self.broadcast(event);
    }

    /// Snapshot of retained dead letters, oldest first.
    pub fn dead_letters(&self) -> Vec<DreamsEvent> {
        self.inner
            .dead_letters
            .lock()
            .map(|letters| letters.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn clear_dead_letters(&self) {
        if let Ok(mut letters) = self.inner.dead_letters.lock() {
            letters.clear();
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
