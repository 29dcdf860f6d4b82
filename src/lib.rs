//! # calldepth
//!
//! Structured-logging adapter that stamps each record with the location of
//! the code that called the logger, even when that code reaches the adapter
//! through wrapper layers.
//!
//! Each leveled call checks whether its level is enabled, captures one program
//! counter `depth` frames out from the capture point, and hands the record to
//! the backend [`Handler`]. Records that are filtered out cost one `enabled`
//! call and no stack walk.
//!
//! ```rust,no_run
//! use calldepth::prelude::*;
//!
//! # fn main() -> calldepth_telemetry::Result<()> {
//! init_telemetry(&TelemetryConfig::default())?;
//!
//! let log = calldepth::new([with_call_depth(DEFAULT_CALL_DEPTH)]);
//! log.info("listening", &args!["port", 8080_u32]);
//!
//! let req = log.with(&args!["request_id", "r-42"]).with_group("http");
//! req.warn("slow response", &args!["elapsed_ms", 950_u64]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Choosing a depth
//!
//! [`DEFAULT_CALL_DEPTH`] is right when application code calls the adapter's
//! methods directly. Each helper function between the application and the
//! adapter adds one frame; [`WRAPPED_CALL_DEPTH`] covers the common single
//! shim case. Release builds with aggressive inlining or sibling-call
//! optimization can fold frames away, so verify the resolved source in the
//! build profile you ship.

mod adapter;
mod global;
mod options;
pub mod prelude;
mod stack;

pub use adapter::{Adapter, StructuredLogger, DEBUG_ENV, DEFAULT_CALL_DEPTH, WRAPPED_CALL_DEPTH};
pub use global::{default, set_default};
pub use options::{new, with_call_depth, with_logger, with_set_default, AdapterOption};
pub use stack::callers;

pub use calldepth_core::{
    args, merge_args, Arg, Attr, CancellationToken, Context, DiscardHandler, Handler,
    HandlerError, Level, Logger, ParseLevelError, Record, Source, Value, BACKGROUND, BAD_KEY,
};
pub use calldepth_telemetry::TracingHandler;
