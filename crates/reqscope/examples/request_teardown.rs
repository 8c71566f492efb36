// Request-shaped teardown example: a fake connection and a cursor on it.
//
// Shows the pattern the registry exists for — the cursor is acquired after
// (and depends on) the connection, and close() releases the cursor first so
// the connection is still alive when the cursor goes away.

use std::cell::RefCell;
use std::rc::Rc;

use reqscope::{Registry, Result};
use serde_json::json;

// -- Fake driver --------------------------------------------------------------

#[derive(Debug)]
struct Connection {
    dsn: String,
    open: RefCell<bool>,
}

#[derive(Debug)]
struct Cursor {
    rows_read: RefCell<u32>,
}

fn main() -> Result<()> {
    let mut registry = Registry::with_scratch();

    registry
        .register_kind(
            "conn",
            |options| {
                let dsn = options
                    .and_then(|v| v.get("dsn"))
                    .and_then(|v| v.as_str())
                    .unwrap_or("postgres://localhost")
                    .to_string();
                println!("opening connection to {dsn}");
                Ok(Connection {
                    dsn,
                    open: RefCell::new(true),
                })
            },
            |conn: Rc<Connection>| {
                println!("closing connection to {}", conn.dsn);
                *conn.open.borrow_mut() = false;
                Ok(())
            },
        )
        .register_kind(
            "cursor",
            |_| {
                println!("opening cursor");
                Ok(Cursor {
                    rows_read: RefCell::new(0),
                })
            },
            |cursor: Rc<Cursor>| {
                println!("closing cursor after {} rows", cursor.rows_read.borrow());
                Ok(())
            },
        );

    // The whole request shares one connection; cursors are per-query.
    let conn = registry.acquire_singleton("conn", Some(json!({"dsn": "postgres://db/app"})))?;
    let same = registry.acquire_singleton("conn", Some(json!({"dsn": "postgres://db/app"})))?;
    assert!(conn.ptr_eq(&same));

    let cursor = registry.acquire("cursor", None)?;
    let cursor = cursor.downcast::<Cursor>().expect("cursor instance");
    *cursor.rows_read.borrow_mut() += 42;

    // Per-request scratch space, cleared on close.
    let seen = registry.scratch_set("seen-users")?;
    seen.borrow_mut().insert("alice".into());

    // Cursor closes before the connection it depends on.
    registry.close()?;

    let conn = conn.downcast::<Connection>().expect("connection instance");
    assert!(!*conn.open.borrow());
    assert!(seen.borrow().is_empty());
    Ok(())
}
