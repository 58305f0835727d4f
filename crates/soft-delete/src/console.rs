//! Console command scaffolding
//!
//! [`BasicCommand`] gives application commands a shared argument set and a
//! failure boundary: the error from [`BasicCommand::do_run`] is logged with
//! the command's arguments and options, then returned unchanged.

use async_trait::async_trait;
use clap::Args;
use serde_json::{json, Map, Value};
use tracing::error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Arguments every command accepts; flatten into a command's own args
#[derive(Debug, Clone, Default, Args)]
pub struct BasicArgs {
    /// An example argument.
    pub example: Option<String>,

    /// The Pk Value.
    #[arg(long)]
    pub id: Option<String>,
}

/// Base behavior for console commands
#[async_trait]
pub trait BasicCommand: Send + Sync {
    fn name(&self) -> &'static str;

    /// The shared argument set of this invocation
    fn basic_args(&self) -> &BasicArgs;

    /// Command-specific positional arguments, merged after the defaults
    fn extra_arguments(&self) -> Map<String, Value> {
        Map::new()
    }

    /// Command-specific options, merged after the defaults
    fn extra_options(&self) -> Map<String, Value> {
        Map::new()
    }

    fn arguments(&self) -> Map<String, Value> {
        let mut arguments = Map::new();
        arguments.insert("example".to_string(), json!(self.basic_args().example));
        arguments.extend(self.extra_arguments());
        arguments
    }

    fn options(&self) -> Map<String, Value> {
        let mut options = Map::new();
        options.insert("id".to_string(), json!(self.basic_args().id));
        options.extend(self.extra_options());
        options
    }

    /// Command body
    async fn do_run(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Run the command, logging any failure before returning it
    async fn handle(&self) -> anyhow::Result<()> {
        if let Err(err) = self.do_run().await {
            let arguments = Value::Object(self.arguments());
            let options = Value::Object(self.options());
            error!(
                command = self.name(),
                message = %err,
                %arguments,
                %options,
                "Command failed"
            );
            return Err(err);
        }
        Ok(())
    }
}

/// Install a fmt subscriber; `RUST_LOG` wins over `default_filter`.
///
/// Returns false when a global subscriber was already set.
pub fn init_logging(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init()
        .is_ok()
}
