//! The `validatebiomes` command and the resolution run behind it.

pub mod command;
pub mod dispatch;
pub mod runner;
pub mod sink;

pub use command::{CommandError, Issuer, ValidateCommand, DEFAULT_RADIUS};
pub use dispatch::Dispatcher;
pub use runner::{run_validation, RunConfig, RunSummary};
pub use sink::{ChannelSink, ConsoleSink, MessageSink};

#[cfg(test)]
pub(crate) mod testing;
