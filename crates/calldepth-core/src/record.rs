use std::ffi::c_void;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::level::Level;
use crate::value::{merge_args, Arg, Attr};

/// One log event. Built per call, moved into the handler, then dropped.
#[derive(Clone, Debug)]
pub struct Record {
    time: DateTime<Utc>,
    level: Level,
    message: String,
    pc: usize,
    attrs: Vec<Attr>,
}

impl Record {
    /// `pc` is the program counter of the call site, or 0 when unknown.
    pub fn new(time: DateTime<Utc>, level: Level, message: impl Into<String>, pc: usize) -> Self {
        Self {
            time,
            level,
            message: message.into(),
            pc,
            attrs: Vec::new(),
        }
    }

    /// When the record was built.
    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    /// Record level.
    pub fn level(&self) -> Level {
        self.level
    }

    /// Record message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Call-site program counter, 0 when unknown.
    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Attributes in the order they were added.
    pub fn attrs(&self) -> &[Attr] {
        &self.attrs
    }

    /// Number of attributes added so far.
    pub fn num_attrs(&self) -> usize {
        self.attrs.len()
    }

    /// Appends alternating key/value arguments; see [`merge_args`].
    pub fn add(&mut self, args: &[Arg]) {
        self.attrs.reserve(args.len());
        merge_args(args, &mut self.attrs);
    }

    /// Appends pre-built attributes in order. Empty groups are dropped.
    pub fn add_attrs(&mut self, attrs: &[Attr]) {
        self.attrs.extend(attrs.iter().filter(|a| !a.is_empty_group()).cloned());
    }

    /// Resolves the call site this record was stamped with.
    pub fn source(&self) -> Option<Source> {
        Source::resolve(self.pc)
    }
}

/// File/line location resolved from a program counter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Source {
    /// Demangled function name without the hash suffix.
    pub function: Option<String>,
    /// Source file path as recorded in debug info.
    pub file: String,
    /// 1-based line number.
    pub line: u32,
}

impl Source {
    /// Symbolizes `pc`. Returns `None` for the 0 sentinel or when no debug info covers it.
    ///
    /// `pc` is a return address, so the byte before it is looked up to land on
    /// the call instruction's line. When that falls in inlined code, the
    /// innermost location wins.
    pub fn resolve(pc: usize) -> Option<Self> {
        if pc == 0 {
            return None;
        }

        let mut source = None;
        backtrace::resolve((pc - 1) as *mut c_void, |symbol| {
            if source.is_some() {
                return;
            }
            if let (Some(file), Some(line)) = (symbol.filename(), symbol.lineno()) {
                source = Some(Self {
                    function: symbol.name().map(|name| format!("{name:#}")),
                    file: file.display().to_string(),
                    line,
                });
            }
        });
        source
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}
