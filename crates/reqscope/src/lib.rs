//! # Reqscope
//!
//! Request-scoped resource lifecycle registry. Register named resource
//! kinds (paired open/close callbacks), acquire instances — optionally
//! deduplicated as per-context singletons keyed by kind name plus options —
//! and release everything with one [`Registry::close`] call, in strict
//! reverse-acquisition order.
//!
//! Built for short-lived execution contexts (one HTTP request, one job run)
//! where per-resource teardown is error-prone and deferred bulk teardown is
//! preferred. Create one [`Registry`] per context; the model is
//! single-threaded and synchronous by contract, so no locking is performed
//! internally and instances are shared via `Rc`.
//!
//! ```
//! use reqscope::Registry;
//!
//! let mut registry = Registry::new();
//! registry.register_kind(
//!     "buffer",
//!     |_options| Ok(std::cell::RefCell::new(Vec::<u8>::new())),
//!     |buffer| {
//!         buffer.borrow_mut().clear();
//!         Ok(())
//!     },
//! );
//!
//! let _buffer = registry.acquire("buffer", None)?;
//! // ... use the instance during the request ...
//! registry.close()?; // releases everything, newest first
//! # Ok::<(), reqscope::Error>(())
//! ```

pub mod error;
pub mod handle;
pub mod kind;
pub mod registry;
pub mod scratch;

pub use error::{BoxError, Error, Result};
pub use handle::Handle;
pub use kind::{CloseFn, Kind, OpenFn};
pub use registry::Registry;
