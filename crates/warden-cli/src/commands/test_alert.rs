use clap::Parser;

use crate::client::AdminClient;
use crate::error::CliResult;
use crate::output::OutputFormat;

#[derive(Parser)]
pub struct TestAlertCommand {}

impl TestAlertCommand {
    pub async fn execute(&self, client: &AdminClient, format: OutputFormat) -> CliResult<()> {
        let response = client.test_alert().await?;

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&response)?),
            OutputFormat::Table => println!("Test alert sent."),
        }

        Ok(())
    }
}
