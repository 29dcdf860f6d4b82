//! Process-wide default adapter.
//!
//! Readers never block writers and never see a torn value: the slot holds an
//! `Arc<Adapter>` swapped atomically.

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::adapter::Adapter;
use crate::options::{new, with_set_default};

static DEFAULT: ArcSwapOption<Adapter> = ArcSwapOption::const_empty();

/// The current default adapter.
///
/// The first call with nothing published builds one with the default logger
/// and depth and publishes it. Two threads racing here may both build one;
/// the last published wins and both callers get a usable adapter.
pub fn default() -> Adapter {
    if let Some(adapter) = DEFAULT.load_full() {
        return Adapter::clone(&adapter);
    }
    new([with_set_default()])
}

/// Replace the default adapter. Later [`default`] calls return a clone of it.
pub fn set_default(adapter: Adapter) {
    DEFAULT.store(Some(Arc::new(adapter)));
}
