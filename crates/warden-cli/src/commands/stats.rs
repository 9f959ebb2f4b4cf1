use clap::Parser;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use warden::admin::StatsResponse;

use crate::client::AdminClient;
use crate::error::CliResult;
use crate::output::OutputFormat;

#[derive(Parser)]
pub struct StatsCommand {}

impl StatsCommand {
    pub async fn execute(&self, client: &AdminClient, format: OutputFormat) -> CliResult<()> {
        let stats = client.stats().await?;

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
            OutputFormat::Table => {
                println!("Warden Statistics");
                println!("======================\n");
                println!("{}\n", render_table(&stats));
                println!(
                    "Traffic: {}",
                    if stats.enabled { "enabled" } else { "BLOCKED by kill switch" }
                );
            }
        }

        Ok(())
    }
}

fn render_table(stats: &StatsResponse) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(["Metric", "Count"]);

    table.add_row(["Forwarded requests", &stats.audit.requests.to_string()]);
    table.add_row(["Blocked requests", &stats.audit.blocks.to_string()]);
    for (reason, count) in &stats.audit.blocks_by_reason {
        table.add_row([format!("  {reason}"), count.to_string()]);
    }
    table.add_row(["Redacted leaks", &stats.audit.leaks.to_string()]);

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden::audit::AuditStats;

    #[test]
    fn test_render_table_lists_reasons() {
        let mut audit = AuditStats {
            requests: 12,
            blocks: 3,
            leaks: 1,
            ..Default::default()
        };
        audit.blocks_by_reason.insert("rate_limit".to_string(), 3);

        let rendered = render_table(&StatsResponse {
            enabled: true,
            audit,
        })
        .to_string();

        assert!(rendered.contains("Forwarded requests"));
        assert!(rendered.contains("12"));
        assert!(rendered.contains("rate_limit"));
    }
}
