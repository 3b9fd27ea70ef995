//! Callback registries with per-observer failure isolation.
//!
//! Fan-out is synchronous and runs in registration order. A callback that
//! returns an error or panics is logged and skipped; the remaining observers
//! still receive the event.

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Return type of every observer callback.
pub type ObserverResult = anyhow::Result<()>;

/// Registration handle returned by [`ObserverRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(pub u64);

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observer#{}", self.0)
    }
}

struct Entry<T> {
    id: ObserverId,
    name: String,
    observer: T,
}

/// Ordered set of observers of one capability type.
pub struct ObserverRegistry<T> {
    next_id: u64,
    entries: Vec<Entry<T>>,
}

impl<T> Default for ObserverRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ObserverRegistry<T> {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            entries: Vec::new(),
        }
    }

    /// Add an observer. `name` only appears in logs.
    pub fn register(&mut self, name: impl Into<String>, observer: T) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        let name = name.into();
        tracing::debug!(%id, name = %name, "Registered observer");
        self.entries.push(Entry { id, name, observer });
        id
    }

    /// Remove an observer. Returns false if the id was unknown.
    pub fn unregister(&mut self, id: ObserverId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Deliver `event` to every observer.
    ///
    /// `deliver` returns `None` when an observer does not implement the
    /// callback for this event. Returns the number of observers that failed.
    pub fn notify<F>(&mut self, event: &'static str, mut deliver: F) -> usize
    where
        F: FnMut(&mut T) -> Option<ObserverResult>,
    {
        let mut failures = 0;
        for entry in &mut self.entries {
            let outcome = catch_unwind(AssertUnwindSafe(|| deliver(&mut entry.observer)));
            match outcome {
                Ok(None) | Ok(Some(Ok(()))) => {}
                Ok(Some(Err(err))) => {
                    failures += 1;
                    tracing::warn!(
                        observer = %entry.id,
                        name = %entry.name,
                        event,
                        error = %err,
                        "Observer callback failed"
                    );
                }
                Err(payload) => {
                    failures += 1;
                    tracing::warn!(
                        observer = %entry.id,
                        name = %entry.name,
                        event,
                        panic = %panic_message(payload.as_ref()),
                        "Observer callback panicked"
                    );
                }
            }
        }
        failures
    }
}

impl<T> fmt::Debug for ObserverRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| (e.id, &e.name)))
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Callback = Box<dyn FnMut(u32) -> ObserverResult>;

    #[test]
    fn test_failures_do_not_stop_fanout() {
        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut registry: ObserverRegistry<Callback> = ObserverRegistry::new();

        let first = std::rc::Rc::clone(&seen);
        registry.register(
            "first",
            Box::new(move |v: u32| -> ObserverResult {
                first.borrow_mut().push(("first", v));
                Ok(())
            }),
        );
        registry.register(
            "failing",
            Box::new(|_: u32| -> ObserverResult { anyhow::bail!("boom") }),
        );
        registry.register(
            "panicking",
            Box::new(|_: u32| -> ObserverResult { panic!("observer bug") }),
        );
        let last = std::rc::Rc::clone(&seen);
        registry.register(
            "last",
            Box::new(move |v: u32| -> ObserverResult {
                last.borrow_mut().push(("last", v));
                Ok(())
            }),
        );

        let failures = registry.notify("value", |cb| Some(cb(7)));
        assert_eq!(failures, 2);
        assert_eq!(*seen.borrow(), vec![("first", 7), ("last", 7)]);
    }

    #[test]
    fn test_unregister() {
        let mut registry: ObserverRegistry<u8> = ObserverRegistry::new();
        let a = registry.register("a", 1);
        let b = registry.register("b", 2);
        assert_ne!(a, b);
        assert!(registry.unregister(a));
        assert!(!registry.unregister(a));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_missing_callback_is_not_failure() {
        let mut registry: ObserverRegistry<Option<Callback>> = ObserverRegistry::new();
        registry.register("empty", None);
        let failures = registry.notify("value", |cb| cb.as_mut().map(|f| f(1)));
        assert_eq!(failures, 0);
    }
}
