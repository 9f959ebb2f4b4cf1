use clap::Parser;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use warden::audit::MatchRecord;

use crate::client::AdminClient;
use crate::error::CliResult;
use crate::output::{OutputFormat, format_timestamp, truncate_string};

#[derive(Parser)]
pub struct BlocksCommand {
    #[clap(long, short, default_value = "20", help = "Number of records to show (max 500)")]
    pub limit: usize,
}

impl BlocksCommand {
    pub async fn execute(&self, client: &AdminClient, format: OutputFormat) -> CliResult<()> {
        let page = client.blocks(self.limit).await?;

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&page.blocks)?),
            OutputFormat::Table => {
                if page.blocks.is_empty() {
                    println!("No blocked requests recorded.");
                    return Ok(());
                }
                println!("{}", render_table(&page.blocks));
                println!("\nShowing {} most recent blocks", page.blocks.len());
            }
        }

        Ok(())
    }
}

fn render_table(blocks: &[MatchRecord]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(["Time", "Agent", "Provider", "Reason", "Detail"]);

    for record in blocks {
        table.add_row([
            format_timestamp(&record.timestamp),
            truncate_string(&record.agent_id, 24),
            record.provider.clone(),
            record.reason.as_str().to_string(),
            truncate_string(&record.detail, 48),
        ]);
    }

    table
}
