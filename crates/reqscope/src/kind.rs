//! Resource kinds: named open/close callback pairs

use std::rc::Rc;

use serde_json::Value;

use crate::error::BoxError;
use crate::handle::Handle;

/// Callback that opens a new instance of a resource kind.
///
/// Receives the options value passed to the acquisition (if any) and
/// returns a type-erased handle to the new instance.
pub type OpenFn = Box<dyn Fn(Option<&Value>) -> Result<Handle, BoxError>>;

/// Callback that releases a previously opened instance.
///
/// Expected not to fail under correct usage; a failure during
/// [`Registry::close`](crate::Registry::close) halts the remaining releases.
pub type CloseFn = Rc<dyn Fn(Handle) -> Result<(), BoxError>>;

/// A registered resource kind: an open/close callback pair.
///
/// Immutable once registered. The close callback is shared (`Rc`) because
/// every acquisition binds its own release thunk to the callback that was
/// current at acquisition time; re-registering the name later must not
/// change how existing instances are released.
pub struct Kind {
    open: OpenFn,
    close: CloseFn,
}

impl Kind {
    /// Create a kind from its two callbacks.
    pub fn new(open: OpenFn, close: CloseFn) -> Self {
        Self { open, close }
    }

    /// Open a new instance with the given options.
    pub fn open(&self, options: Option<&Value>) -> Result<Handle, BoxError> {
        (self.open)(options)
    }

    /// Shared reference to the close callback.
    #[must_use]
    pub fn close_fn(&self) -> CloseFn {
        Rc::clone(&self.close)
    }
}

impl std::fmt::Debug for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kind").finish_non_exhaustive()
    }
}
