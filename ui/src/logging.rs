use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::Subscriber;
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::layer::Context;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{reload, EnvFilter, Layer, Registry};

/// HTTP stack crates kept at `warn` whatever level the operator picks.
const QUIET_DEPENDENCIES: [&str; 3] = ["hyper=warn", "reqwest=warn", "rustls=warn"];

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: SystemTime,
    pub level: tracing::Level,
    pub target: String,
    pub message: String,
}

impl LogEntry {
    pub fn timestamp_secs(&self) -> u64 {
        self.timestamp
            .duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_secs())
            .unwrap_or(0)
    }

    pub fn format_line(&self) -> String {
        format!(
            "[{:>10}] {:<5} {:<22} {}",
            self.timestamp_secs(),
            self.level.as_str(),
            self.target,
            self.message
        )
    }
}

/// Bounded ring of the most recent log events, shared with the dashboard.
#[derive(Debug, Clone)]
pub struct LogStore {
    inner: Arc<Mutex<VecDeque<LogEntry>>>,
    capacity: usize,
}

impl LogStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&self, entry: LogEntry) {
        let mut guard = self.lock();
        if guard.len() >= self.capacity {
            guard.pop_front();
        }
        guard.push_back(entry);
    }

    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<LogEntry>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Trace,
    ];

    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Error => f.write_str("Error"),
            LogLevel::Warn => f.write_str("Warn"),
            LogLevel::Info => f.write_str("Info"),
            LogLevel::Debug => f.write_str("Debug"),
            LogLevel::Trace => f.write_str("Trace"),
        }
    }
}

pub type ReloadHandle = reload::Handle<EnvFilter, Registry>;

pub fn init_logging(store: LogStore, level: LogLevel) -> ReloadHandle {
    let (reload_layer, handle) = reload::Layer::new(level_filter(level));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_ansi(false);

    let subscriber = Registry::default()
        .with(reload_layer)
        .with(LogCaptureLayer::new(store))
        .with(fmt_layer);

    let _ = tracing::subscriber::set_global_default(subscriber);

    handle
}

pub fn apply_log_level(handle: &ReloadHandle, level: LogLevel) {
    let new_filter = level_filter(level);
    let _ = handle.modify(|filter| {
        *filter = new_filter;
    });
}

fn level_filter(level: LogLevel) -> EnvFilter {
    let mut filter = EnvFilter::default().add_directive(level.to_level_filter().into());
    for directive in QUIET_DEPENDENCIES {
        if let Ok(directive) = directive.parse::<Directive>() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

struct LogCaptureLayer {
    store: LogStore,
}

impl LogCaptureLayer {
    fn new(store: LogStore) -> Self {
        Self { store }
    }
}

impl<S> Layer<S> for LogCaptureLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        self.store.push(LogEntry {
            timestamp: SystemTime::now(),
            level: *metadata.level(),
            target: metadata.target().to_string(),
            message: visitor.into_message(),
        });
    }
}

/// Collects the event message followed by its structured fields.
#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Vec<String>,
}

impl FieldVisitor {
    fn into_message(self) -> String {
        match (self.message, self.fields.is_empty()) {
            (Some(message), true) => message,
            (Some(message), false) => format!("{message} {}", self.fields.join(" ")),
            (None, _) => self.fields.join(" "),
        }
    }
}

impl tracing::field::Visit for FieldVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        let value = format!("{value:?}");
        if field.name() == "message" {
            self.message = Some(value.trim_matches('"').to_string());
        } else {
            self.fields
                .push(format!("{}={}", field.name(), value.trim_matches('"')));
        }
    }
}
