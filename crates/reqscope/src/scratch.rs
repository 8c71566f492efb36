//! Built-in scratch container kinds.
//!
//! Three trivial kinds let a registry double as a short-lived scratch
//! namespace scoped to one context: an appendable list, a string-keyed
//! map, and a set of unique strings. Open creates an empty container;
//! close empties it in place (handles kept by the caller see the cleared
//! container, and the allocation itself is dropped with the last handle).
//!
//! Containers hold [`serde_json::Value`]s — the same closed set of shapes
//! used for options — except the set, whose elements are strings because
//! JSON values have no total order. Containers are usually obtained via
//! [`Registry::acquire_singleton`] with a caller-chosen discriminator tag,
//! so every part of one request that asks for, say, `("map", "session")`
//! shares the same container.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use serde_json::Value;

use crate::error::Result;
use crate::handle::Handle;
use crate::registry::Registry;

/// Kind name of the appendable ordered sequence container.
pub const LIST: &str = "list";
/// Kind name of the key-unique associative container.
pub const MAP: &str = "map";
/// Kind name of the unique-element container.
pub const SET: &str = "set";

/// Instance type behind the [`LIST`] kind.
pub type List = RefCell<Vec<Value>>;
/// Instance type behind the [`MAP`] kind.
pub type Map = RefCell<BTreeMap<String, Value>>;
/// Instance type behind the [`SET`] kind.
pub type Set = RefCell<BTreeSet<String>>;

/// Register the three scratch kinds on `registry`.
///
/// Called by [`Registry::with_scratch`]; may also be applied to an
/// existing registry.
pub fn install(registry: &mut Registry) {
    registry
        .register_kind(LIST, |_| Ok(List::default()), |list: Rc<List>| {
            list.borrow_mut().clear();
            Ok(())
        })
        .register_kind(MAP, |_| Ok(Map::default()), |map: Rc<Map>| {
            map.borrow_mut().clear();
            Ok(())
        })
        .register_kind(SET, |_| Ok(Set::default()), |set: Rc<Set>| {
            set.borrow_mut().clear();
            Ok(())
        });
}

impl Registry {
    /// The scratch list singleton for `tag`.
    ///
    /// # Panics
    /// Panics if the [`LIST`] kind was re-registered with a different
    /// instance type.
    pub fn scratch_list(&mut self, tag: impl Into<Value>) -> Result<Rc<List>> {
        let handle = self.acquire_singleton(LIST, Some(tag.into()))?;
        Ok(expect_container(&handle, LIST))
    }

    /// The scratch map singleton for `tag`.
    ///
    /// # Panics
    /// Panics if the [`MAP`] kind was re-registered with a different
    /// instance type.
    pub fn scratch_map(&mut self, tag: impl Into<Value>) -> Result<Rc<Map>> {
        let handle = self.acquire_singleton(MAP, Some(tag.into()))?;
        Ok(expect_container(&handle, MAP))
    }

    /// The scratch set singleton for `tag`.
    ///
    /// # Panics
    /// Panics if the [`SET`] kind was re-registered with a different
    /// instance type.
    pub fn scratch_set(&mut self, tag: impl Into<Value>) -> Result<Rc<Set>> {
        let handle = self.acquire_singleton(SET, Some(tag.into()))?;
        Ok(expect_container(&handle, SET))
    }
}

fn expect_container<T: 'static>(handle: &Handle, kind: &str) -> Rc<T> {
    handle
        .downcast::<T>()
        .unwrap_or_else(|| panic!("scratch kind '{kind}' holds an unexpected instance type"))
}
