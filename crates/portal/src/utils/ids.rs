//! Identifier generation

use cuid2::CuidConstructor;
use once_cell::sync::Lazy;

static CUID: Lazy<CuidConstructor> = Lazy::new(CuidConstructor::new);

/// Fresh opaque id for a locally created record.
pub fn new_id() -> String {
    CUID.create_id()
}
