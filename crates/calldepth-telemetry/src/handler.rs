use std::sync::Arc;

use calldepth_core::{Attr, Context, Handler, HandlerError, Level, Record, Value};
use serde_json::{Map, Value as JsonValue};

/// Target every relayed event is emitted under.
pub const TARGET: &str = "calldepth";

/// Handler that relays records to the `tracing` ecosystem.
///
/// `tracing` metadata is static, so the event's own file/line always point
/// here. The caller's resolved location travels in the `source` and `function`
/// fields instead, next to `severity` (the exact level, e.g. `INFO+2`) and
/// `attrs` (bound and record attributes as a JSON object, groups nested).
#[derive(Clone, Debug)]
pub struct TracingHandler {
    min_level: Level,
    bound: Map<String, JsonValue>,
    groups: Vec<String>,
}

impl TracingHandler {
    /// Drops records below `min_level` before asking `tracing`.
    pub fn new(min_level: Level) -> Self {
        Self {
            min_level,
            bound: Map::new(),
            groups: Vec::new(),
        }
    }

    /// Lowest level this handler relays.
    pub fn min_level(&self) -> Level {
        self.min_level
    }

    fn render_attrs(&self, record: &Record) -> Result<String, HandlerError> {
        let mut attrs = self.bound.clone();
        insert_scoped(&mut attrs, &self.groups, record.attrs());
        Ok(serde_json::to_string(&attrs)?)
    }
}

impl Default for TracingHandler {
    fn default() -> Self {
        Self::new(Level::DEBUG)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Severity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<Level> for Severity {
    fn from(level: Level) -> Self {
        if level < Level::DEBUG {
            Self::Trace
        } else if level < Level::INFO {
            Self::Debug
        } else if level < Level::WARN {
            Self::Info
        } else if level < Level::ERROR {
            Self::Warn
        } else {
            Self::Error
        }
    }
}

impl Handler for TracingHandler {
    fn enabled(&self, _ctx: &Context, level: Level) -> bool {
        if level < self.min_level {
            return false;
        }
        match Severity::from(level) {
            Severity::Trace => tracing::enabled!(target: TARGET, tracing::Level::TRACE),
            Severity::Debug => tracing::enabled!(target: TARGET, tracing::Level::DEBUG),
            Severity::Info => tracing::enabled!(target: TARGET, tracing::Level::INFO),
            Severity::Warn => tracing::enabled!(target: TARGET, tracing::Level::WARN),
            Severity::Error => tracing::enabled!(target: TARGET, tracing::Level::ERROR),
        }
    }

    fn handle(&self, _ctx: &Context, record: Record) -> Result<(), HandlerError> {
        let attrs = self.render_attrs(&record)?;
        let (source, function) = match record.source() {
            Some(source) => {
                let function = source.function.clone().unwrap_or_default();
                (source.to_string(), function)
            }
            None => (String::new(), String::new()),
        };
        let severity = record.level().to_string();
        let message = record.message();

        macro_rules! relay {
            ($level:expr) => {
                tracing::event!(
                    target: TARGET,
                    $level,
                    source = %source,
                    function = %function,
                    severity = %severity,
                    attrs = %attrs,
                    "{}",
                    message
                )
            };
        }

        match Severity::from(record.level()) {
            Severity::Trace => relay!(tracing::Level::TRACE),
            Severity::Debug => relay!(tracing::Level::DEBUG),
            Severity::Info => relay!(tracing::Level::INFO),
            Severity::Warn => relay!(tracing::Level::WARN),
            Severity::Error => relay!(tracing::Level::ERROR),
        }
        Ok(())
    }

    fn with_attrs(&self, attrs: Vec<Attr>) -> Arc<dyn Handler> {
        let mut derived = self.clone();
        insert_scoped(&mut derived.bound, &self.groups, &attrs);
        Arc::new(derived)
    }

    fn with_group(&self, name: &str) -> Arc<dyn Handler> {
        let mut derived = self.clone();
        derived.groups.push(name.to_string());
        Arc::new(derived)
    }
}

/// Inserts `attrs` under the object path `groups`, creating objects as needed.
/// Nothing is created when there is nothing to insert.
fn insert_scoped(map: &mut Map<String, JsonValue>, groups: &[String], attrs: &[Attr]) {
    if attrs.iter().all(Attr::is_empty_group) {
        return;
    }
    let Some((group, rest)) = groups.split_first() else {
        insert_attrs(map, attrs);
        return;
    };
    match map
        .entry(group.clone())
        .or_insert_with(|| JsonValue::Object(Map::new()))
    {
        JsonValue::Object(inner) => insert_scoped(inner, rest, attrs),
        other => {
            let mut inner = Map::new();
            insert_scoped(&mut inner, rest, attrs);
            *other = JsonValue::Object(inner);
        }
    }
}

fn insert_attrs(map: &mut Map<String, JsonValue>, attrs: &[Attr]) {
    for attr in attrs {
        match &attr.value {
            Value::Group(members) if members.is_empty() => {}
            Value::Group(members) if attr.key.is_empty() => insert_attrs(map, members),
            Value::Group(members) => insert_scoped(map, std::slice::from_ref(&attr.key), members),
            value => {
                map.insert(attr.key.clone(), value.to_json());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calldepth_core::BACKGROUND;
    use chrono::Utc;
    use parking_lot::Mutex;
    use serde_json::json;
    use tracing::field::{Field, Visit};
    use tracing_subscriber::layer::{Context as LayerContext, SubscriberExt};
    use tracing_subscriber::Layer;

    #[derive(Clone, Debug, Default)]
    struct Captured {
        level: Option<tracing::Level>,
        target: String,
        fields: Map<String, JsonValue>,
    }

    impl Captured {
        fn field(&self, name: &str) -> &str {
            self.fields.get(name).and_then(JsonValue::as_str).unwrap_or_default()
        }

        fn attrs(&self) -> JsonValue {
            serde_json::from_str(self.field("attrs")).unwrap()
        }
    }

    struct FieldVisitor<'a>(&'a mut Map<String, JsonValue>);

    impl Visit for FieldVisitor<'_> {
        fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
            self.0
                .insert(field.name().to_string(), JsonValue::String(format!("{value:?}")));
        }

        fn record_str(&mut self, field: &Field, value: &str) {
            self.0
                .insert(field.name().to_string(), JsonValue::String(value.to_string()));
        }
    }

    #[derive(Clone, Default)]
    struct CaptureLayer {
        events: Arc<Mutex<Vec<Captured>>>,
    }

    impl<S: tracing::Subscriber> Layer<S> for CaptureLayer {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: LayerContext<'_, S>) {
            let mut captured = Captured {
                level: Some(*event.metadata().level()),
                target: event.metadata().target().to_string(),
                ..Captured::default()
            };
            event.record(&mut FieldVisitor(&mut captured.fields));
            self.events.lock().push(captured);
        }
    }

    fn capture(f: impl FnOnce()) -> Vec<Captured> {
        let layer = CaptureLayer::default();
        let events = layer.events.clone();
        let subscriber = tracing_subscriber::registry()
            .with(layer.with_filter(tracing_subscriber::filter::LevelFilter::TRACE));
        tracing::subscriber::with_default(subscriber, f);
        let events = events.lock().clone();
        events
    }

    fn record(level: Level, message: &str, attrs: &[Attr]) -> Record {
        let mut record = Record::new(Utc::now(), level, message, 0);
        record.add_attrs(attrs);
        record
    }

    #[test]
    fn severity_buckets() {
        assert_eq!(Severity::from(Level::new(-8)), Severity::Trace);
        assert_eq!(Severity::from(Level::DEBUG), Severity::Debug);
        assert_eq!(Severity::from(Level::new(-1)), Severity::Debug);
        assert_eq!(Severity::from(Level::INFO), Severity::Info);
        assert_eq!(Severity::from(Level::new(3)), Severity::Info);
        assert_eq!(Severity::from(Level::WARN), Severity::Warn);
        assert_eq!(Severity::from(Level::ERROR), Severity::Error);
        assert_eq!(Severity::from(Level::new(20)), Severity::Error);
    }

    #[test]
    fn enabled_respects_min_level() {
        let handler = TracingHandler::new(Level::INFO);
        capture(|| {
            assert!(!handler.enabled(&BACKGROUND, Level::DEBUG));
            assert!(handler.enabled(&BACKGROUND, Level::INFO));
            assert!(handler.enabled(&BACKGROUND, Level::ERROR));
        });
    }

    #[test]
    fn enabled_respects_subscriber_filter() {
        let handler = TracingHandler::default();
        let subscriber = tracing_subscriber::registry().with(
            CaptureLayer::default().with_filter(tracing_subscriber::filter::LevelFilter::WARN),
        );
        tracing::subscriber::with_default(subscriber, || {
            assert!(!handler.enabled(&BACKGROUND, Level::INFO));
            assert!(handler.enabled(&BACKGROUND, Level::WARN));
        });
    }

    #[test]
    fn handle_relays_one_event() {
        let handler = TracingHandler::default();
        let events = capture(|| {
            handler
                .handle(&BACKGROUND, record(Level::new(2), "cache warm", &[Attr::uint("entries", 12)]))
                .unwrap();
        });

        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.level, Some(tracing::Level::INFO));
        assert_eq!(event.target, TARGET);
        assert_eq!(event.field("message"), "cache warm");
        assert_eq!(event.field("severity"), "INFO+2");
        assert_eq!(event.attrs(), json!({"entries": 12}));
    }

    #[test]
    fn unresolved_source_is_blank() {
        let handler = TracingHandler::default();
        let events = capture(|| {
            handler.handle(&BACKGROUND, record(Level::ERROR, "boom", &[])).unwrap();
        });
        assert_eq!(events[0].level, Some(tracing::Level::ERROR));
        assert_eq!(events[0].field("source"), "");
        assert_eq!(events[0].field("function"), "");
    }

    #[test]
    fn bound_attrs_and_groups_nest() {
        let handler = TracingHandler::default()
            .with_attrs(vec![Attr::string("svc", "api")])
            .with_group("req")
            .with_attrs(vec![Attr::int("id", 9)]);

        let events = capture(|| {
            handler
                .handle(&BACKGROUND, record(Level::WARN, "slow", &[Attr::int("status", 200)]))
                .unwrap();
        });

        assert_eq!(events[0].level, Some(tracing::Level::WARN));
        assert_eq!(
            events[0].attrs(),
            json!({"svc": "api", "req": {"id": 9, "status": 200}})
        );
    }

    #[test]
    fn empty_groups_are_omitted() {
        let handler = TracingHandler::default().with_group("unused");
        let events = capture(|| {
            handler
                .handle(&BACKGROUND, record(Level::INFO, "m", &[Attr::group("none", vec![])]))
                .unwrap();
        });
        assert_eq!(events[0].attrs(), json!({}));
    }

    #[test]
    fn derivation_leaves_receiver_untouched() {
        let base = TracingHandler::default();
        let _derived = base.with_attrs(vec![Attr::bool("bound", true)]);
        let events = capture(|| {
            base.handle(&BACKGROUND, record(Level::INFO, "m", &[])).unwrap();
        });
        assert_eq!(events[0].attrs(), json!({}));
    }
}
