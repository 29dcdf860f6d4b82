//! # calldepth-core
//!
//! The structured-logging backend model the adapter relays to: levels,
//! attribute values, records, execution contexts, the [`Handler`] capability
//! and the [`Logger`] handle that wraps one.

mod context;
mod handler;
mod level;
mod logger;
mod record;
mod value;

pub mod mock;

pub use context::{Context, BACKGROUND};
pub use handler::{DiscardHandler, Handler, HandlerError};
pub use level::{Level, ParseLevelError};
pub use logger::Logger;
pub use record::{Record, Source};
pub use value::{merge_args, Arg, Attr, Value, BAD_KEY};

/// Re-exported so callers can build contexts without a direct dependency.
pub use tokio_util::sync::CancellationToken;
