//! Commonly used types, for `use calldepth::prelude::*;`.

// Adapter
pub use crate::{Adapter, StructuredLogger, DEFAULT_CALL_DEPTH, WRAPPED_CALL_DEPTH};

// Construction and the process default
pub use crate::{default, set_default, with_call_depth, with_logger, with_set_default};

// Backend model
pub use crate::{args, Arg, Attr, Context, Level, Logger, Value};

// Telemetry setup
pub use calldepth_telemetry::{init_telemetry, TelemetryConfig, TracingHandler};
