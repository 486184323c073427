//! Hook emitter — synchronous, ordered publish/subscribe for container events.

use crate::types::{Hook, HookEvent};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

type Handler = Arc<dyn Fn(&Hook<'_>) + Send + Sync>;

struct Subscriber {
    id: u64,
    event: HookEvent,
    handler: Handler,
    /// Removed before its first invocation.
    once: bool,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscribers: Vec<Subscriber>,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Registers handlers per event and calls them in registration order.
///
/// Handlers run on the caller's thread after the registry lock is released,
/// so a handler may register, unsubscribe or emit without deadlocking.
#[derive(Clone, Default)]
pub struct HookEmitter {
    registry: Arc<Mutex<Registry>>,
}

impl HookEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler that runs on every emission of `event`.
    pub fn hook<F>(&self, event: HookEvent, handler: F) -> Unsubscribe
    where
        F: Fn(&Hook<'_>) + Send + Sync + 'static,
    {
        self.register(event, Arc::new(handler), false)
    }

    /// Register a handler that runs on the next emission of `event` only.
    pub fn hook_once<F>(&self, event: HookEvent, handler: F) -> Unsubscribe
    where
        F: Fn(&Hook<'_>) + Send + Sync + 'static,
    {
        self.register(event, Arc::new(handler), true)
    }

    fn register(&self, event: HookEvent, handler: Handler, once: bool) -> Unsubscribe {
        let mut registry = lock(&self.registry);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.subscribers.push(Subscriber {
            id,
            event,
            handler,
            once,
        });
        Unsubscribe {
            registry: Arc::downgrade(&self.registry),
            id,
        }
    }

    /// Invoke every handler currently registered for the hook's event.
    ///
    /// Emitting an event nobody listens to is a no-op.
    pub fn call_hook(&self, hook: &Hook<'_>) {
        let event = hook.event();
        let handlers: Vec<Handler> = {
            let mut registry = lock(&self.registry);
            let handlers = registry
                .subscribers
                .iter()
                .filter(|s| s.event == event)
                .map(|s| Arc::clone(&s.handler))
                .collect();
            registry
                .subscribers
                .retain(|s| !(s.once && s.event == event));
            handlers
        };

        tracing::debug!(event = %event, handlers = handlers.len(), "Calling hook");
        for handler in handlers {
            handler(hook);
        }
    }

    /// Number of handlers registered for `event`.
    pub fn handler_count(&self, event: HookEvent) -> usize {
        lock(&self.registry)
            .subscribers
            .iter()
            .filter(|s| s.event == event)
            .count()
    }
}

/// Handle returned by registration; removes exactly that handler.
///
/// Dropping the handle keeps the handler registered.
pub struct Unsubscribe {
    registry: Weak<Mutex<Registry>>,
    id: u64,
}

impl Unsubscribe {
    /// Remove the handler. Calling this more than once is a no-op.
    pub fn unsubscribe(&self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).subscribers.retain(|s| s.id != self.id);
        }
    }
}
