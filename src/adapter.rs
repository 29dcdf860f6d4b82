use std::sync::Arc;

use calldepth_core::{Arg, Attr, Context, Handler, HandlerError, Level, Logger, Record, BACKGROUND};
use chrono::Utc;

use crate::stack;

/// Frames between the capture point and a direct call site: the capture
/// function, the record-construction function and the leveled method.
pub const DEFAULT_CALL_DEPTH: usize = 3;

/// Depth for call sites that reach the adapter through one helper layer, such
/// as an SDK logger shim forwarding to an [`Adapter`].
pub const WRAPPED_CALL_DEPTH: usize = DEFAULT_CALL_DEPTH + 1;

/// Debug builds print swallowed handler errors to stderr when this is set.
pub const DEBUG_ENV: &str = "CALLDEPTH_DEBUG";

/// The logging surface shared by [`Adapter`] and anything that stands in for it.
///
/// Every leveled method is infallible from the caller's side. Methods taking
/// `Option<&Context>` substitute a background context for `None`.
pub trait StructuredLogger: Send + Sync {
    /// Whether a record at `level` would be handled.
    fn enabled(&self, ctx: Option<&Context>, level: Level) -> bool;

    /// The backend handler records are sent to.
    fn handler(&self) -> &Arc<dyn Handler>;

    /// Logs at an arbitrary level, pairing `args` into attributes.
    fn log(&self, ctx: Option<&Context>, level: Level, message: &str, args: &[Arg]);

    /// Logs pre-built attributes at an arbitrary level.
    fn log_attrs(&self, ctx: Option<&Context>, level: Level, message: &str, attrs: &[Attr]);

    /// Logs at [`Level::DEBUG`].
    fn debug(&self, message: &str, args: &[Arg]);

    /// Logs at [`Level::DEBUG`] with an explicit context.
    fn debug_context(&self, ctx: Option<&Context>, message: &str, args: &[Arg]);

    /// Logs at [`Level::INFO`].
    fn info(&self, message: &str, args: &[Arg]);

    /// Logs at [`Level::INFO`] with an explicit context.
    fn info_context(&self, ctx: Option<&Context>, message: &str, args: &[Arg]);

    /// Logs at [`Level::WARN`].
    fn warn(&self, message: &str, args: &[Arg]);

    /// Logs at [`Level::WARN`] with an explicit context.
    fn warn_context(&self, ctx: Option<&Context>, message: &str, args: &[Arg]);

    /// Logs at [`Level::ERROR`].
    fn error(&self, message: &str, args: &[Arg]);

    /// Logs at [`Level::ERROR`] with an explicit context.
    fn error_context(&self, ctx: Option<&Context>, message: &str, args: &[Arg]);

    /// New logger with `args` bound to every record. The receiver is unchanged.
    fn with(&self, args: &[Arg]) -> Self
    where
        Self: Sized;

    /// New logger nesting later attributes under `name`. The receiver is unchanged.
    fn with_group(&self, name: &str) -> Self
    where
        Self: Sized;
}

/// Backend logger plus the number of frames to skip when stamping records
/// with their call site.
///
/// `depth` has to match the real number of frames between the stack capture
/// and the application call site. A wrong value gives a wrong file/line, never
/// a failure.
#[derive(Clone, Debug)]
pub struct Adapter {
    pub(crate) logger: Logger,
    pub(crate) depth: usize,
}

enum Payload<'a> {
    Args(&'a [Arg]),
    Attrs(&'a [Attr]),
}

impl Adapter {
    /// Frames skipped when capturing the call site.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The wrapped backend logger.
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// The one record-construction path every leveled method calls directly.
    #[inline(never)]
    fn emit(&self, ctx: Option<&Context>, level: Level, message: &str, payload: Payload<'_>) {
        let ctx = ctx.unwrap_or(&BACKGROUND);
        if !self.logger.enabled(ctx, level) {
            return;
        }

        let pc = stack::callers(self.depth);
        let mut record = Record::new(Utc::now(), level, message, pc);
        match payload {
            Payload::Args(args) => record.add(args),
            Payload::Attrs(attrs) => record.add_attrs(attrs),
        }

        if let Err(err) = self.logger.handler().handle(ctx, record) {
            report_handler_error(&err);
        }
    }
}

fn report_handler_error(err: &HandlerError) {
    if cfg!(debug_assertions) && std::env::var_os(DEBUG_ENV).is_some() {
        eprintln!("calldepth: handler error: {err}");
    }
}

impl StructuredLogger for Adapter {
    fn enabled(&self, ctx: Option<&Context>, level: Level) -> bool {
        self.logger.enabled(ctx.unwrap_or(&BACKGROUND), level)
    }

    fn handler(&self) -> &Arc<dyn Handler> {
        self.logger.handler()
    }

    #[inline(never)]
    fn log(&self, ctx: Option<&Context>, level: Level, message: &str, args: &[Arg]) {
        self.emit(ctx, level, message, Payload::Args(args));
    }

    #[inline(never)]
    fn log_attrs(&self, ctx: Option<&Context>, level: Level, message: &str, attrs: &[Attr]) {
        self.emit(ctx, level, message, Payload::Attrs(attrs));
    }

    #[inline(never)]
    fn debug(&self, message: &str, args: &[Arg]) {
        self.emit(None, Level::DEBUG, message, Payload::Args(args));
    }

    #[inline(never)]
    fn debug_context(&self, ctx: Option<&Context>, message: &str, args: &[Arg]) {
        self.emit(ctx, Level::DEBUG, message, Payload::Args(args));
    }

    #[inline(never)]
    fn info(&self, message: &str, args: &[Arg]) {
        self.emit(None, Level::INFO, message, Payload::Args(args));
    }

    #[inline(never)]
    fn info_context(&self, ctx: Option<&Context>, message: &str, args: &[Arg]) {
        self.emit(ctx, Level::INFO, message, Payload::Args(args));
    }

    #[inline(never)]
    fn warn(&self, message: &str, args: &[Arg]) {
        self.emit(None, Level::WARN, message, Payload::Args(args));
    }

    #[inline(never)]
    fn warn_context(&self, ctx: Option<&Context>, message: &str, args: &[Arg]) {
        self.emit(ctx, Level::WARN, message, Payload::Args(args));
    }

    #[inline(never)]
    fn error(&self, message: &str, args: &[Arg]) {
        self.emit(None, Level::ERROR, message, Payload::Args(args));
    }

    #[inline(never)]
    fn error_context(&self, ctx: Option<&Context>, message: &str, args: &[Arg]) {
        self.emit(ctx, Level::ERROR, message, Payload::Args(args));
    }

    fn with(&self, args: &[Arg]) -> Self {
        Self {
            logger: self.logger.with(args),
            depth: self.depth,
        }
    }

    fn with_group(&self, name: &str) -> Self {
        Self {
            logger: self.logger.with_group(name),
            depth: self.depth,
        }
    }
}
