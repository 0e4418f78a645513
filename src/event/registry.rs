use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

use super::signals::{Delivery, Signal, WILDCARD};

/// Callback handle; identity is the allocation, not the closure's behavior
pub type Listener = Arc<dyn Fn(&Delivery<'_>) + Send + Sync>;

type WeakListener = Weak<dyn Fn(&Delivery<'_>) + Send + Sync>;
type ListenerMap = HashMap<String, Vec<Listener>>;

/// Wraps a closure into a [`Listener`] handle
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&Delivery<'_>) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Event name -> ordered set of listeners
///
/// Dispatch works on a snapshot, so listeners may add or remove listeners
/// (including themselves) while a dispatch is running. The lock is never
/// held while a listener runs.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    listeners: Arc<Mutex<ListenerMap>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `listener` under `event_name`; returns false if it was already there
    pub fn on(&self, event_name: &str, listener: &Listener) -> bool {
        let mut listeners = self.listeners.lock();
        let set = listeners.entry(event_name.to_string()).or_default();

        if set.iter().any(|existing| Arc::ptr_eq(existing, listener)) {
            return false;
        }
        set.push(listener.clone());
        true
    }

    /// Registers `f` so that it runs on the first dispatch only
    ///
    /// The returned handle can be passed to [`remove`](Self::remove) to cancel
    /// before it fires.
    pub fn once<F>(&self, event_name: &str, f: F) -> Listener
    where
        F: Fn(&Delivery<'_>) + Send + Sync + 'static,
    {
        let registry = Arc::downgrade(&self.listeners);
        let name = event_name.to_string();
        let fired = AtomicBool::new(false);
        let slot: Arc<OnceLock<WeakListener>> = Arc::new(OnceLock::new());
        let own_slot = slot.clone();

        let wrapper = listener(move |delivery| {
            if fired.swap(true, Ordering::SeqCst) {
                return;
            }
            if let (Some(listeners), Some(me)) =
                (registry.upgrade(), own_slot.get().and_then(Weak::upgrade))
            {
                remove_from(&listeners, &name, &me);
            }
            f(delivery);
        });

        let _ = slot.set(Arc::downgrade(&wrapper));
        self.on(event_name, &wrapper);
        wrapper
    }

    /// Registers `f` and removes it once `timeout` elapses, fired or not
    ///
    /// Must be called from within a tokio runtime.
    pub fn within<F>(&self, event_name: &str, f: F, timeout: Duration) -> TimedListener
    where
        F: Fn(&Delivery<'_>) + Send + Sync + 'static,
    {
        let handle = listener(f);
        self.on(event_name, &handle);

        let registry = Arc::downgrade(&self.listeners);
        let name = event_name.to_string();
        let expiring = handle.clone();

        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(listeners) = registry.upgrade() {
                remove_from(&listeners, &name, &expiring);
                debug!(event_name = %name, "Timed listener expired");
            }
        });

        TimedListener {
            event_name: event_name.to_string(),
            listener: handle,
            timer,
            registry: self.clone(),
        }
    }

    pub fn remove(&self, event_name: &str, listener: &Listener) -> bool {
        remove_from(&self.listeners, event_name, listener)
    }

    /// Drops every listener registered under `event_name`
    pub fn prune(&self, event_name: &str) {
        self.listeners.lock().remove(event_name);
    }

    pub fn contains(&self, event_name: &str, listener: &Listener) -> bool {
        self.listeners
            .lock()
            .get(event_name)
            .is_some_and(|set| set.iter().any(|existing| Arc::ptr_eq(existing, listener)))
    }

    pub fn count(&self, event_name: &str) -> usize {
        self.listeners.lock().get(event_name).map_or(0, Vec::len)
    }

    /// Dispatches to `event_name` listeners, then to wildcard listeners
    pub fn emit(&self, event_name: &str, signal: &Signal) {
        let delivery = Delivery { event_name, signal };

        for listener in self.snapshot(event_name) {
            listener(&delivery);
        }

        if event_name != WILDCARD {
            for listener in self.snapshot(WILDCARD) {
                listener(&delivery);
            }
        }
    }

    fn snapshot(&self, event_name: &str) -> Vec<Listener> {
        self.listeners
            .lock()
            .get(event_name)
            .cloned()
            .unwrap_or_default()
    }
}

fn remove_from(listeners: &Mutex<ListenerMap>, event_name: &str, listener: &Listener) -> bool {
    let mut listeners = listeners.lock();
    let Some(set) = listeners.get_mut(event_name) else {
        return false;
    };

    let before = set.len();
    set.retain(|existing| !Arc::ptr_eq(existing, listener));
    let removed = set.len() != before;

    if set.is_empty() {
        listeners.remove(event_name);
    }
    removed
}

/// Registration made by [`ListenerRegistry::within`]
///
/// Dropping it leaves the deadline in place; [`cancel`](Self::cancel) stops
/// the timer and removes the listener right away.
pub struct TimedListener {
    event_name: String,
    listener: Listener,
    timer: JoinHandle<()>,
    registry: ListenerRegistry,
}

impl TimedListener {
    pub fn listener(&self) -> &Listener {
        &self.listener
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    /// True once the deadline has passed and the listener was removed
    pub fn is_expired(&self) -> bool {
        self.timer.is_finished()
    }

    pub fn cancel(self) {
        self.timer.abort();
        self.registry.remove(&self.event_name, &self.listener);
    }
}
