//! Identifier generation for webhooks and captured requests.
//!
//! Both entity streams use UUIDv7: unique, approximately time-ordered, and
//! safe to generate from concurrent processes with no shared counter. Within
//! one process a shared [`ContextV7`] keeps ids strictly increasing even when
//! several are minted in the same millisecond, which is what cursor-based
//! polling relies on. Across processes ordering is only as good as the clocks;
//! strict global ordering is not a guarantee here.

use std::sync::{Mutex, OnceLock};
use uuid::timestamp::context::ContextV7;
use uuid::{Timestamp, Uuid};

static CONTEXT: OnceLock<Mutex<ContextV7>> = OnceLock::new();

fn next_id() -> Uuid {
    let context = CONTEXT.get_or_init(|| Mutex::new(ContextV7::new()));
    Uuid::new_v7(Timestamp::now(context))
}

/// Generate a new webhook identifier.
pub fn new_webhook_id() -> Uuid {
    next_id()
}

/// Generate a new request identifier.
pub fn new_request_id() -> Uuid {
    next_id()
}
