use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::level::Level;
use crate::record::Record;
use crate::value::Attr;

/// Failure while emitting a record.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// Writing to the sink failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Rendering attributes failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The handler refused the record, e.g. because its sink is closed.
    #[error("record rejected: {0}")]
    Rejected(String),
}

/// The backend capability: filters, formats and emits records.
///
/// Derivation (`with_attrs`, `with_group`) returns a new handler; the receiver
/// is never changed.
pub trait Handler: Send + Sync + fmt::Debug {
    /// Whether records at `level` are wanted. Called before any record is built.
    fn enabled(&self, ctx: &Context, level: Level) -> bool;

    /// Formats and emits one record.
    fn handle(&self, ctx: &Context, record: Record) -> Result<(), HandlerError>;

    /// Handler whose output includes `attrs`, qualified by any groups opened so far.
    fn with_attrs(&self, attrs: Vec<Attr>) -> Arc<dyn Handler>;

    /// Handler that nests all later attributes under `name`.
    fn with_group(&self, name: &str) -> Arc<dyn Handler>;
}

/// Drops everything and reports every level as disabled.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiscardHandler;

impl Handler for DiscardHandler {
    #[inline]
    fn enabled(&self, _ctx: &Context, _level: Level) -> bool {
        false
    }

    fn handle(&self, _ctx: &Context, _record: Record) -> Result<(), HandlerError> {
        Ok(())
    }

    fn with_attrs(&self, _attrs: Vec<Attr>) -> Arc<dyn Handler> {
        Arc::new(*self)
    }

    fn with_group(&self, _name: &str) -> Arc<dyn Handler> {
        Arc::new(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BACKGROUND;
    use chrono::Utc;

    #[test]
    fn discard_handler_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DiscardHandler>();
    }

    #[test]
    fn discard_handler_disables_everything() {
        let handler = DiscardHandler;
        assert!(!handler.enabled(&BACKGROUND, Level::ERROR));
        let record = Record::new(Utc::now(), Level::ERROR, "gone", 0);
        assert!(handler.handle(&BACKGROUND, record).is_ok());
        assert!(!handler.with_group("g").enabled(&BACKGROUND, Level::ERROR));
    }

    #[test]
    fn handler_error_display() {
        let err = HandlerError::Rejected("closed".into());
        assert_eq!(err.to_string(), "record rejected: closed");
        let err: HandlerError = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe").into();
        assert!(err.to_string().starts_with("io error"));
    }
}
