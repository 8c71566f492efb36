//! Type-erased shared handle over a resource instance

use std::any::Any;
use std::rc::Rc;

/// Cloneable, type-erased handle to an acquired resource instance.
///
/// The registry stores instances of arbitrary types behind one table, so
/// instances are erased to `Rc<dyn Any>` and recovered with
/// [`downcast`](Handle::downcast). All clones refer to the same underlying
/// instance; the registry keeps one clone alive inside its release list
/// until [`Registry::close`](crate::Registry::close).
///
/// `Rc` rather than `Arc`: a registry is confined to one logical flow and
/// never crosses threads.
#[derive(Clone)]
pub struct Handle(Rc<dyn Any>);

impl Handle {
    /// Erase a freshly created instance.
    pub fn new<T: 'static>(instance: T) -> Self {
        Self(Rc::new(instance))
    }

    /// Erase an instance that is already shared.
    pub fn from_rc<T: 'static>(instance: Rc<T>) -> Self {
        Self(instance)
    }

    /// Recover the shared instance, or `None` if the type does not match.
    #[must_use]
    pub fn downcast<T: 'static>(&self) -> Option<Rc<T>> {
        Rc::downcast(Rc::clone(&self.0)).ok()
    }

    /// Borrow the instance, or `None` if the type does not match.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    /// Whether two handles refer to the same underlying instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle").finish_non_exhaustive()
    }
}
