//! The registry itself — kind table, acquisition tracking, singleton
//! cache, and ordered bulk release.

use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use crate::error::{BoxError, Error, Result};
use crate::handle::Handle;
use crate::kind::Kind;
use crate::scratch;

/// One recorded release obligation: the kind name (for diagnostics) and a
/// thunk binding the kind's close callback to one specific instance.
struct PendingRelease {
    kind: String,
    release: Box<dyn FnOnce() -> std::result::Result<(), BoxError>>,
}

/// Singleton cache key: kind name plus the canonical JSON encoding of the
/// options value.
type SingletonKey = (String, String);

/// Request-scoped resource lifecycle registry.
///
/// Callers register named resource kinds (open/close callback pairs),
/// acquire instances during one logical context (e.g. one HTTP request),
/// and release everything with a single [`close`](Registry::close) call in
/// strict reverse-acquisition order. Later-acquired resources may depend on
/// earlier-acquired ones (a cursor on a connection, say), so dependencies
/// are still alive when their dependents are released.
///
/// One registry per context; it is not reusable after `close` and performs
/// no internal locking. Callers confine one instance to one logical flow
/// and serialize all operations on it.
///
/// The registry exclusively owns every instance it has acquired until
/// `close`; callers must not release an instance obtained through it on
/// their own.
pub struct Registry {
    kinds: HashMap<String, Kind>,
    /// Release thunks in acquisition order; drained back-to-front by `close`.
    pending: Vec<PendingRelease>,
    singletons: HashMap<SingletonKey, Handle>,
    closed: bool,
}

impl Registry {
    /// Create an empty registry with no kinds registered.
    #[must_use]
    pub fn new() -> Self {
        Self {
            kinds: HashMap::new(),
            pending: Vec::new(),
            singletons: HashMap::new(),
            closed: false,
        }
    }

    /// Create a registry with the built-in scratch container kinds
    /// pre-registered (see [`scratch`]).
    #[must_use]
    pub fn with_scratch() -> Self {
        let mut registry = Self::new();
        scratch::install(&mut registry);
        registry
    }

    /// Register a resource kind under `name`, replacing any previous entry.
    ///
    /// Replacement only affects subsequent acquisitions: instances already
    /// acquired keep the close callback they were opened under. No
    /// acquisition or release side effects. Returns `&mut Self` for
    /// chaining.
    pub fn register<O, C>(&mut self, name: impl Into<String>, open: O, close: C) -> &mut Self
    where
        O: Fn(Option<&Value>) -> std::result::Result<Handle, BoxError> + 'static,
        C: Fn(Handle) -> std::result::Result<(), BoxError> + 'static,
    {
        let name = name.into();
        tracing::debug!(kind = %name, "Registered resource kind");
        self.kinds
            .insert(name, Kind::new(Box::new(open), Rc::new(close)));
        self
    }

    /// Register a kind whose callbacks work with a concrete instance type,
    /// hiding the type-erasure plumbing.
    ///
    /// `open` produces a `T`; `close` receives the shared `Rc<T>` back. If a
    /// release thunk ever carries an instance of the wrong type (only
    /// possible through misuse of raw [`register`](Registry::register) with
    /// hand-built handles), the close callback reports the mismatch as an
    /// ordinary release error.
    pub fn register_kind<T, O, C>(&mut self, name: impl Into<String>, open: O, close: C) -> &mut Self
    where
        T: 'static,
        O: Fn(Option<&Value>) -> std::result::Result<T, BoxError> + 'static,
        C: Fn(Rc<T>) -> std::result::Result<(), BoxError> + 'static,
    {
        self.register(
            name,
            move |options| Ok(Handle::new(open(options)?)),
            move |handle| {
                let instance = handle
                    .downcast::<T>()
                    .ok_or_else(|| BoxError::from("instance type mismatch"))?;
                close(instance)
            },
        )
    }

    /// Acquire a new instance of the kind registered under `name`.
    ///
    /// Invokes the kind's open callback with `options` and records a
    /// release obligation for the new instance. Exactly one obligation is
    /// recorded per successful call; a failed open records nothing and the
    /// failure propagates as [`Error::Open`] with the source preserved.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyClosed`] after [`close`](Registry::close),
    /// [`Error::UnknownKind`] if `name` was never registered, and
    /// [`Error::Open`] if the open callback fails.
    pub fn acquire(&mut self, name: &str, options: Option<Value>) -> Result<Handle> {
        if self.closed {
            return Err(Error::AlreadyClosed);
        }
        let kind = self
            .kinds
            .get(name)
            .ok_or_else(|| Error::unknown_kind(name))?;

        let handle = kind
            .open(options.as_ref())
            .map_err(|source| Error::open(name, source))?;

        let close = kind.close_fn();
        let instance = handle.clone();
        self.pending.push(PendingRelease {
            kind: name.to_string(),
            release: Box::new(move || close(instance)),
        });
        tracing::debug!(kind = name, pending = self.pending.len(), "Acquired resource instance");
        Ok(handle)
    }

    /// Acquire an instance deduplicated per registry by kind name plus
    /// options.
    ///
    /// The cache key is the canonical JSON encoding of `options` (objects
    /// encode with sorted keys, so structurally equal options always hit
    /// the same entry regardless of construction order; arrays stay
    /// order-sensitive). `None` encodes the same as JSON `null`.
    ///
    /// On a hit the cached handle is returned without invoking the open
    /// callback or recording a new release obligation, so each singleton is
    /// released exactly once. On a miss this delegates to
    /// [`acquire`](Registry::acquire) and inherits all of its failure modes.
    pub fn acquire_singleton(&mut self, name: &str, options: Option<Value>) -> Result<Handle> {
        let key = singleton_key(name, options.as_ref());
        if let Some(handle) = self.singletons.get(&key) {
            tracing::trace!(kind = name, "Singleton cache hit");
            return Ok(handle.clone());
        }
        let handle = self.acquire(name, options)?;
        self.singletons.insert(key, handle.clone());
        Ok(handle)
    }

    /// Release every acquired instance in reverse acquisition order and
    /// end the registry's usable lifetime.
    ///
    /// Release thunks run synchronously, most recently acquired first. A
    /// failing thunk halts the remaining releases and propagates as
    /// [`Error::Release`] (fail-fast; instances whose thunk was not reached
    /// stay unreleased). Either way the kind table, the singleton cache,
    /// and the release list are cleared and the registry is marked closed
    /// before returning, so a second call is a no-op returning `Ok(())`.
    pub fn close(&mut self) -> Result<()> {
        let result = self.release_pending();
        self.kinds.clear();
        self.singletons.clear();
        // A failed release leaves thunks behind; they are dropped unrun.
        self.pending.clear();
        self.closed = true;
        result
    }

    fn release_pending(&mut self) -> Result<()> {
        let total = self.pending.len();
        while let Some(PendingRelease { kind, release }) = self.pending.pop() {
            tracing::trace!(kind = %kind, "Releasing resource instance");
            release().map_err(|source| Error::release(kind, source))?;
        }
        if total > 0 {
            tracing::debug!(released = total, "Closed registry");
        }
        Ok(())
    }

    /// Whether [`close`](Registry::close) has already been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Whether a kind is currently registered under `name`.
    #[must_use]
    pub fn has_kind(&self, name: &str) -> bool {
        self.kinds.contains_key(name)
    }

    /// Number of release obligations currently recorded.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("kind_count", &self.kinds.len())
            .field("pending_count", &self.pending.len())
            .field("singleton_count", &self.singletons.len())
            .field("closed", &self.closed)
            .finish()
    }
}

/// Derive the singleton cache key for a (name, options) pair.
///
/// `serde_json` encodes objects with sorted keys, so the encoding is
/// canonical: structurally equal values produce identical keys within one
/// registry (and, in fact, across registries).
fn singleton_key(name: &str, options: Option<&Value>) -> SingletonKey {
    let encoded = options.unwrap_or(&Value::Null).to_string();
    (name.to_string(), encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn unit_kind(registry: &mut Registry, name: &str) {
        registry.register_kind(name, |_| Ok(()), |_: Rc<()>| Ok(()));
    }

    #[test]
    fn register_chains() {
        let mut registry = Registry::new();
        registry
            .register("a", |_| Ok(Handle::new(())), |_| Ok(()))
            .register("b", |_| Ok(Handle::new(())), |_| Ok(()));
        assert!(registry.has_kind("a"));
        assert!(registry.has_kind("b"));
    }

    #[test]
    fn register_replaces_existing_kind() {
        let mut registry = Registry::new();
        registry.register_kind("n", |_| Ok(1u8), |_: Rc<u8>| Ok(()));
        registry.register_kind("n", |_| Ok(2u8), |_: Rc<u8>| Ok(()));

        let handle = registry.acquire("n", None).unwrap();
        assert_eq!(*handle.downcast::<u8>().unwrap(), 2);
    }

    #[test]
    fn acquire_records_one_release_per_call() {
        let mut registry = Registry::new();
        unit_kind(&mut registry, "r");
        registry.acquire("r", None).unwrap();
        registry.acquire("r", None).unwrap();
        assert_eq!(registry.pending_count(), 2);
    }

    #[test]
    fn failed_open_records_nothing() {
        let mut registry = Registry::new();
        registry.register("flaky", |_| Err(BoxError::from("nope")), |_| Ok(()));

        let err = registry.acquire("flaky", None).unwrap_err();
        assert!(matches!(err, Error::Open { .. }));
        assert_eq!(registry.pending_count(), 0);
    }

    #[test]
    fn options_reach_the_open_callback() {
        let mut registry = Registry::new();
        registry.register_kind(
            "sized",
            |options| {
                let n = options.and_then(Value::as_u64).unwrap_or(1);
                Ok(vec![0u8; usize::try_from(n).unwrap_or(usize::MAX)])
            },
            |_: Rc<Vec<u8>>| Ok(()),
        );

        let handle = registry.acquire("sized", Some(Value::from(3))).unwrap();
        assert_eq!(handle.downcast::<Vec<u8>>().unwrap().len(), 3);
    }

    #[test]
    fn close_marks_closed_and_clears_kinds() {
        let mut registry = Registry::new();
        unit_kind(&mut registry, "r");
        registry.acquire("r", None).unwrap();

        registry.close().unwrap();
        assert!(registry.is_closed());
        assert!(!registry.has_kind("r"));
        assert_eq!(registry.pending_count(), 0);
    }

    #[test]
    fn release_thunk_uses_callback_from_acquisition_time() {
        let first = Rc::new(Cell::new(0u32));
        let second = Rc::new(Cell::new(0u32));

        let mut registry = Registry::new();
        let c = Rc::clone(&first);
        registry.register_kind("n", |_| Ok(()), move |_: Rc<()>| {
            c.set(c.get() + 1);
            Ok(())
        });
        registry.acquire("n", None).unwrap();

        // Replace the kind after the acquisition.
        let c = Rc::clone(&second);
        registry.register_kind("n", |_| Ok(()), move |_: Rc<()>| {
            c.set(c.get() + 1);
            Ok(())
        });
        registry.acquire("n", None).unwrap();

        registry.close().unwrap();
        assert_eq!(first.get(), 1);
        assert_eq!(second.get(), 1);
    }

    #[test]
    fn singleton_key_is_canonical() {
        let a: Value = serde_json::from_str(r#"{"host":"db","port":5432}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"port":5432,"host":"db"}"#).unwrap();
        assert_eq!(singleton_key("db", Some(&a)), singleton_key("db", Some(&b)));

        // Arrays are order-sensitive.
        let x = Value::from(vec![1, 2]);
        let y = Value::from(vec![2, 1]);
        assert_ne!(singleton_key("db", Some(&x)), singleton_key("db", Some(&y)));

        // Absent options and explicit null share a key.
        assert_eq!(
            singleton_key("db", None),
            singleton_key("db", Some(&Value::Null))
        );
    }

    #[test]
    fn debug_reports_counts() {
        let mut registry = Registry::new();
        unit_kind(&mut registry, "r");
        registry.acquire("r", None).unwrap();
        let repr = format!("{registry:?}");
        assert!(repr.contains("kind_count: 1"));
        assert!(repr.contains("pending_count: 1"));
        assert!(repr.contains("closed: false"));
    }
}
