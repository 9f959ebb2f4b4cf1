use clap::{Parser, Subcommand};

use crate::client::AdminClient;
use crate::error::CliResult;
use crate::output::OutputFormat;

#[derive(Parser)]
pub struct KillCommand {
    #[clap(subcommand)]
    pub action: KillAction,
}

#[derive(Subcommand, Clone, Copy, Debug, PartialEq, Eq)]
pub enum KillAction {
    #[clap(about = "Engage the kill switch and block all proxied traffic")]
    On,

    #[clap(about = "Release the kill switch and let traffic flow")]
    Off,

    #[clap(about = "Show whether traffic is currently allowed")]
    Status,
}

impl KillCommand {
    pub async fn execute(&self, client: &AdminClient, format: OutputFormat) -> CliResult<()> {
        let state = match self.action {
            // "on" means the switch is thrown, i.e. traffic disabled
            KillAction::On => client.set_kill(false).await?,
            KillAction::Off => client.set_kill(true).await?,
            KillAction::Status => client.kill_status().await?,
        };

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&state)?),
            OutputFormat::Table => {
                if state.enabled {
                    println!("Kill switch: off (traffic enabled)");
                } else {
                    println!("Kill switch: ON (all proxied traffic blocked)");
                }
            }
        }

        Ok(())
    }
}
