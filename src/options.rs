use calldepth_core::Logger;
use calldepth_telemetry::TracingHandler;

use crate::adapter::{Adapter, DEFAULT_CALL_DEPTH};
use crate::global;

/// One construction option for [`new`].
#[derive(Clone, Debug)]
pub enum AdapterOption {
    /// Backend logger to relay to. Without it a [`TracingHandler`] is used.
    Logger(Logger),
    /// Frames to skip when capturing the call site.
    CallDepth(usize),
    /// Publish the constructed adapter as the process-wide default.
    SetDefault,
}

/// Relay to `logger` instead of the default tracing backend.
pub fn with_logger(logger: Logger) -> AdapterOption {
    AdapterOption::Logger(logger)
}

/// Skip `depth` frames when capturing the call site. See [`DEFAULT_CALL_DEPTH`].
pub fn with_call_depth(depth: usize) -> AdapterOption {
    AdapterOption::CallDepth(depth)
}

/// Publish the adapter as the process default once it is built.
pub fn with_set_default() -> AdapterOption {
    AdapterOption::SetDefault
}

/// Build an adapter, applying options in order. Later options of the same
/// kind override earlier ones.
///
/// Publishing to the default happens after every option is applied, so
/// `new([with_set_default(), with_call_depth(4)])` publishes depth 4.
pub fn new(options: impl IntoIterator<Item = AdapterOption>) -> Adapter {
    let mut logger = None;
    let mut depth = DEFAULT_CALL_DEPTH;
    let mut publish = false;

    for option in options {
        match option {
            AdapterOption::Logger(l) => logger = Some(l),
            AdapterOption::CallDepth(d) => depth = d,
            AdapterOption::SetDefault => publish = true,
        }
    }

    let adapter = Adapter {
        logger: logger.unwrap_or_else(|| Logger::new(TracingHandler::default())),
        depth,
    };
    if publish {
        global::set_default(adapter.clone());
    }
    adapter
}

impl Adapter {
    /// Same as the free [`new`].
    pub fn new(options: impl IntoIterator<Item = AdapterOption>) -> Self {
        new(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::WRAPPED_CALL_DEPTH;
    use calldepth_core::mock::RecordingHandler;
    use calldepth_core::DiscardHandler;
    use std::sync::Arc;

    #[test]
    fn no_options_gives_tracing_backend_at_default_depth() {
        let adapter = new(Vec::<AdapterOption>::new());
        assert_eq!(adapter.depth(), DEFAULT_CALL_DEPTH);
        let debug = format!("{:?}", adapter.logger().handler());
        assert!(debug.contains("TracingHandler"), "{debug}");
    }

    #[test]
    fn supplied_logger_is_used_as_is() {
        let logger = Logger::new(RecordingHandler::new());
        let adapter = new([with_logger(logger.clone())]);
        assert!(adapter.logger().same_handler(&logger));
    }

    #[test]
    fn later_options_win() {
        let first = Logger::new(DiscardHandler);
        let second = Logger::new(DiscardHandler);
        let adapter = Adapter::new([
            with_call_depth(7),
            with_logger(first),
            with_call_depth(WRAPPED_CALL_DEPTH),
            with_logger(second.clone()),
        ]);
        assert_eq!(adapter.depth(), WRAPPED_CALL_DEPTH);
        assert!(adapter.logger().same_handler(&second));
    }

    #[test]
    fn depth_zero_is_accepted() {
        let adapter = new(vec![
            with_call_depth(0),
            with_logger(Logger::from_handler(Arc::new(DiscardHandler))),
        ]);
        assert_eq!(adapter.depth(), 0);
    }
}
