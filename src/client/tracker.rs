//! Observable count of in-flight API requests.
//!
//! A loading indicator subscribes to a [`RequestTracker`]; every request made
//! through [`crate::client::ApiClient`] holds a [`RequestGuard`] for its whole
//! lifetime. Trackers are plain values: independent instances never share
//! state, so tests and separate UIs can each own one.

use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex};

/// Snapshot handed to listeners.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApiStatus {
    pub pending: usize,
    pub all_completed: bool,
}

impl ApiStatus {
    fn new(pending: usize) -> Self {
        Self {
            pending,
            all_completed: pending == 0,
        }
    }
}

type Listener = Arc<dyn Fn(ApiStatus) + Send + Sync>;

#[derive(Default)]
struct TrackerState {
    pending: usize,
    next_listener_id: u64,
    listeners: Vec<(u64, Listener)>,
}

#[derive(Default)]
struct Shared {
    state: Mutex<TrackerState>,
    /// Serializes notifications. Reentrant so listeners may start requests.
    delivery: ReentrantMutex<()>,
}

#[derive(Clone, Default)]
pub struct RequestTracker {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for RequestTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestTracker")
            .field("status", &self.status())
            .finish()
    }
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> ApiStatus {
        ApiStatus::new(self.shared.state.lock().pending)
    }

    /// Marks a request as started; it ends when the guard is dropped.
    #[must_use = "the request counts as finished as soon as the guard is dropped"]
    pub fn start(&self) -> RequestGuard {
        self.update(|pending| pending + 1);
        RequestGuard {
            tracker: self.clone(),
        }
    }

    /// Forces the pending count back to zero.
    ///
    /// Recovery for a loader stuck because a request never reported back.
    pub fn reset(&self) {
        log::warn!("Resetting request tracker");
        self.update(|_| 0);
    }

    /// Calls `listener` now with the current status and again on every change.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(ApiStatus) + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(listener);
        let _delivery = self.shared.delivery.lock();
        let id = {
            let mut state = self.shared.state.lock();
            let id = state.next_listener_id;
            state.next_listener_id += 1;
            state.listeners.push((id, Arc::clone(&listener)));
            id
        };
        listener(self.status());
        Subscription {
            tracker: self.clone(),
            id: Some(id),
        }
    }

    fn end(&self) {
        self.update(|pending| pending.saturating_sub(1));
    }

    fn update(&self, change: impl FnOnce(usize) -> usize) {
        {
            let mut state = self.shared.state.lock();
            state.pending = change(state.pending);
        }

        // The count is read per call while holding the delivery lock, so the
        // last status any listener sees is the current one.
        let _delivery = self.shared.delivery.lock();
        let listeners: Vec<Listener> = self
            .shared
            .state
            .lock()
            .listeners
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(self.status());
        }
    }

    fn unsubscribe(&self, id: u64) {
        self.shared
            .state
            .lock()
            .listeners
            .retain(|(other, _)| *other != id);
    }
}

/// Keeps one request counted as pending until dropped.
#[derive(Debug)]
pub struct RequestGuard {
    tracker: RequestTracker,
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        self.tracker.end();
    }
}

/// Listener registration; dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    tracker: RequestTracker,
    id: Option<u64>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if let Some(id) = self.id.take() {
            self.tracker.unsubscribe(id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    use super::*;

    fn recorder(tracker: &RequestTracker) -> (Arc<Mutex<Vec<usize>>>, Subscription) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let subscription = tracker.subscribe(move |status| sink.lock().push(status.pending));
        (seen, subscription)
    }

    #[test]
    fn subscribe_reports_current_status_immediately() {
        let tracker = RequestTracker::new();
        let _guard = tracker.start();
        let (seen, _subscription) = recorder(&tracker);
        assert_eq!(*seen.lock(), vec![1]);
    }

    #[test]
    fn guards_count_requests() {
        let tracker = RequestTracker::new();
        let (seen, _subscription) = recorder(&tracker);

        let first = tracker.start();
        let second = tracker.start();
        assert_eq!(tracker.status(), ApiStatus { pending: 2, all_completed: false });
        drop(first);
        drop(second);

        assert!(tracker.status().all_completed);
        assert_eq!(*seen.lock(), vec![0, 1, 2, 1, 0]);
    }

    #[test]
    fn count_never_goes_negative() {
        let tracker = RequestTracker::new();
        let guard = tracker.start();
        tracker.reset();
        drop(guard);
        assert_eq!(tracker.status().pending, 0);
    }

    #[test]
    fn unsubscribed_listener_is_not_called() {
        let tracker = RequestTracker::new();
        let (seen, subscription) = recorder(&tracker);
        subscription.unsubscribe();

        let _guard = tracker.start();
        assert_eq!(*seen.lock(), vec![0]);
    }

    #[test]
    fn last_notification_matches_final_count_across_threads() {
        let tracker = RequestTracker::new();
        let armed = Arc::new(AtomicBool::new(false));
        let stalled = Arc::new(AtomicBool::new(false));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let _subscription = {
            let armed = Arc::clone(&armed);
            let stalled = Arc::clone(&stalled);
            let sink = Arc::clone(&seen);
            tracker.subscribe(move |status| {
                // Stall the first delivery of `1` to let the other drop race it.
                if armed.load(Ordering::SeqCst)
                    && status.pending == 1
                    && !stalled.swap(true, Ordering::SeqCst)
                {
                    thread::sleep(Duration::from_millis(100));
                }
                sink.lock().push(status.pending);
            })
        };

        let first = tracker.start();
        let second = tracker.start();
        armed.store(true, Ordering::SeqCst);

        let worker = thread::spawn(move || drop(first));
        thread::sleep(Duration::from_millis(20));
        drop(second);
        worker.join().unwrap();

        assert_eq!(tracker.status().pending, 0);
        assert_eq!(seen.lock().last(), Some(&0));
    }

    #[test]
    fn listener_may_start_requests() {
        let tracker = RequestTracker::new();
        let inner = tracker.clone();
        let nested = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&nested);
        let _subscription = tracker.subscribe(move |status| {
            if status.pending == 1 && sink.lock().is_empty() {
                sink.lock().push(inner.start());
            }
        });

        let guard = tracker.start();
        assert_eq!(tracker.status().pending, 2);
        drop(guard);
        nested.lock().clear();
        assert_eq!(tracker.status().pending, 0);
    }

    #[test]
    fn trackers_are_independent() {
        let a = RequestTracker::new();
        let b = RequestTracker::new();
        let _guard = a.start();
        assert_eq!(a.status().pending, 1);
        assert_eq!(b.status().pending, 0);
    }
}
