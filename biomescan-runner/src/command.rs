//! `/validatebiomes [radius]`

use std::path::PathBuf;
use std::sync::Arc;

use biomescan_locate::{BlockPos, Registry, Resolver};
use biomescan_report::RecordMode;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::{run_validation, Dispatcher, MessageSink, RunConfig, RunSummary};

pub const DEFAULT_RADIUS: u32 = 6400;

/// Operator level required to run the command.
pub const REQUIRED_PERMISSION: u8 = 4;

pub const STARTED_MESSAGE: &str = "Validation has begun. A report will be produced.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("You do not have permission to use this command")]
    PermissionDenied,
    #[error("Invalid radius '{0}': expected a non-negative integer")]
    InvalidRadius(String),
    #[error("Too many arguments. Usage: /{} [radius]", ValidateCommand::NAME)]
    TooManyArguments,
}

/// Whoever ran the command, as seen at invocation time.
#[derive(Debug, Clone)]
pub struct Issuer {
    pub name: String,
    pub permission_level: u8,
    pub position: (f64, f64, f64),
}

impl Issuer {
    pub fn block_pos(&self) -> BlockPos {
        let (x, y, z) = self.position;
        BlockPos::from_vec3(x, y, z)
    }
}

/// Rejects issuers below [`REQUIRED_PERMISSION`].
pub fn authorize(issuer: &Issuer) -> Result<(), CommandError> {
    if issuer.permission_level < REQUIRED_PERMISSION {
        log::warn!(
            "{} tried /{} with permission level {}",
            issuer.name,
            ValidateCommand::NAME,
            issuer.permission_level
        );
        return Err(CommandError::PermissionDenied);
    }
    Ok(())
}

/// Radius from the raw argument string. Empty means [`DEFAULT_RADIUS`].
pub fn parse_radius(args: &str) -> Result<u32, CommandError> {
    let mut parts = args.split_whitespace();
    let Some(raw) = parts.next() else {
        return Ok(DEFAULT_RADIUS);
    };
    if parts.next().is_some() {
        return Err(CommandError::TooManyArguments);
    }
    raw.parse::<u32>()
        .map_err(|_| CommandError::InvalidRadius(raw.to_string()))
}

pub struct ValidateCommand {
    registry: Arc<Registry>,
    resolver: Arc<dyn Resolver>,
    dispatcher: Dispatcher,
    report_dir: PathBuf,
    record_mode: RecordMode,
}

impl ValidateCommand {
    pub const NAME: &'static str = "validatebiomes";

    pub fn new(
        registry: Arc<Registry>,
        resolver: Arc<dyn Resolver>,
        dispatcher: Dispatcher,
        report_dir: PathBuf,
        record_mode: RecordMode,
    ) -> Self {
        Self { registry, resolver, dispatcher, report_dir, record_mode }
    }

    /// Validate the invocation, acknowledge it and start the run in the background.
    ///
    /// Returns as soon as the run is queued; progress and the final report path arrive via `sink`.
    pub fn execute(
        &self,
        issuer: &Issuer,
        args: &str,
        sink: Arc<dyn MessageSink>,
    ) -> Result<JoinHandle<RunSummary>, CommandError> {
        authorize(issuer)?;
        let radius = parse_radius(args)?;

        let config = RunConfig {
            origin: issuer.block_pos(),
            radius,
            report_dir: self.report_dir.clone(),
            record_mode: self.record_mode,
        };
        log::info!(
            "{} started /{} at {} with radius {}",
            issuer.name,
            Self::NAME,
            config.origin,
            radius
        );
        sink.send(STARTED_MESSAGE);

        let registry = self.registry.clone();
        let resolver = self.resolver.clone();
        Ok(self.dispatcher.spawn(async move {
            run_validation(&registry, resolver.as_ref(), sink.as_ref(), &config).await
        }))
    }
}
