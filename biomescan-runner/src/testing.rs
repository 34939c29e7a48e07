//! Test doubles shared by the runner and command tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};

use anyhow::Result;
use async_trait::async_trait;
use biomescan_locate::{BlockPos, Resolver, Target};

use crate::MessageSink;

#[derive(Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl MessageSink for RecordingSink {
    fn send(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

/// Keeps every record logged by this crate, for all tests in the process.
struct CapturingLogger {
    records: Mutex<Vec<(log::Level, String)>>,
}

static LOGGER: CapturingLogger = CapturingLogger { records: Mutex::new(Vec::new()) };
static INSTALL: Once = Once::new();

impl log::Log for CapturingLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.target().starts_with("biomescan_runner")
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            self.records.lock().unwrap().push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

/// Installs the capturing logger on first use. Earlier records are kept.
pub fn captured_logs() -> Vec<(log::Level, String)> {
    INSTALL.call_once(|| {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(log::LevelFilter::Trace);
        }
    });
    LOGGER.records.lock().unwrap().clone()
}

enum Answer {
    Found(BlockPos),
    Fail(String),
    Panic(String),
}

/// Answers from a fixed table; unknown names are "not found".
#[derive(Default)]
pub struct ScriptedResolver {
    answers: HashMap<String, Answer>,
    pub calls: Mutex<Vec<(String, BlockPos, u32)>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl ScriptedResolver {
    pub fn found(mut self, name: &str, pos: BlockPos) -> Self {
        self.answers.insert(name.to_string(), Answer::Found(pos));
        self
    }

    pub fn failing(mut self, name: &str, error: &str) -> Self {
        self.answers.insert(name.to_string(), Answer::Fail(error.to_string()));
        self
    }

    pub fn panicking(mut self, name: &str, message: &str) -> Self {
        self.answers.insert(name.to_string(), Answer::Panic(message.to_string()));
        self
    }
}

#[async_trait]
impl Resolver for ScriptedResolver {
    async fn resolve(&self, target: &Target, origin: BlockPos, radius: u32) -> Result<Option<BlockPos>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.calls.lock().unwrap().push((target.name.clone(), origin, radius));
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.answers.get(&target.name) {
            Some(Answer::Found(pos)) => Ok(Some(*pos)),
            Some(Answer::Fail(e)) => anyhow::bail!("{}", e),
            Some(Answer::Panic(message)) => panic!("{}", message),
            None => Ok(None),
        }
    }
}
