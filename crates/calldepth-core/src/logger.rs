use std::sync::Arc;

use crate::context::Context;
use crate::handler::Handler;
use crate::level::Level;
use crate::value::{merge_args, Arg};

/// Backend logger handle. Cheap to clone; clones share the handler.
#[derive(Clone, Debug)]
pub struct Logger {
    handler: Arc<dyn Handler>,
}

impl Logger {
    /// Wraps `handler`.
    pub fn new(handler: impl Handler + 'static) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }

    /// Wraps an already shared handler.
    pub fn from_handler(handler: Arc<dyn Handler>) -> Self {
        Self { handler }
    }

    /// The shared handler.
    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    /// Asks the handler whether `level` is enabled.
    pub fn enabled(&self, ctx: &Context, level: Level) -> bool {
        self.handler.enabled(ctx, level)
    }

    /// Logger whose records carry `args`, paired the same way record arguments are.
    #[must_use]
    pub fn with(&self, args: &[Arg]) -> Self {
        if args.is_empty() {
            return self.clone();
        }
        let mut attrs = Vec::with_capacity(args.len());
        merge_args(args, &mut attrs);
        Self {
            handler: self.handler.with_attrs(attrs),
        }
    }

    /// Logger scoped under `name`. An empty name returns the same logger.
    #[must_use]
    pub fn with_group(&self, name: &str) -> Self {
        if name.is_empty() {
            return self.clone();
        }
        Self {
            handler: self.handler.with_group(name),
        }
    }

    /// True when both loggers dispatch to the same handler instance.
    pub fn same_handler(&self, other: &Logger) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.handler), Arc::as_ptr(&other.handler))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::context::BACKGROUND;
    use crate::handler::DiscardHandler;
    use crate::mock::RecordingHandler;

    #[test]
    fn clones_share_handler() {
        let logger = Logger::new(DiscardHandler);
        assert!(logger.same_handler(&logger.clone()));
        assert!(!logger.same_handler(&Logger::new(DiscardHandler)));
    }

    #[test]
    fn empty_with_and_group_are_noops() {
        let logger = Logger::new(RecordingHandler::new());
        assert!(logger.with(&[]).same_handler(&logger));
        assert!(logger.with_group("").same_handler(&logger));
        assert!(!logger.with_group("g").same_handler(&logger));
    }

    #[test]
    fn enabled_delegates() {
        let logger = Logger::new(RecordingHandler::new().with_min_level(Level::WARN));
        assert!(!logger.enabled(&BACKGROUND, Level::INFO));
        assert!(logger.enabled(&BACKGROUND, Level::ERROR));
    }

    #[test]
    fn with_binds_merged_args() {
        let recorder = RecordingHandler::new();
        let logger = Logger::new(recorder.clone()).with(&args!["svc", "api", 7]);
        let record = crate::Record::new(chrono::Utc::now(), Level::INFO, "m", 0);
        logger.handler().handle(&BACKGROUND, record).unwrap();

        let captured = recorder.last().unwrap();
        assert_eq!(captured.keys(), ["svc", crate::BAD_KEY]);
    }
}
