use clap::{Parser, Subcommand};
use warden_cli::client::AdminClient;
use warden_cli::commands::{BlocksCommand, KillCommand, StatsCommand, TestAlertCommand};
use warden_cli::error::CliResult;
use warden_cli::output::OutputFormat;

#[derive(Parser)]
#[command(name = "warden-cli")]
#[command(about = "Warden CLI - Management tool for the warden daemon")]
#[command(version)]
pub struct Cli {
    #[clap(long, short, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[clap(
        long,
        short = 'u',
        global = true,
        default_value = "http://127.0.0.1:8787",
        help = "Base URL of the warden daemon"
    )]
    pub url: String,

    #[clap(
        long,
        short = 'k',
        global = true,
        env = "WARDEN_ADMIN_KEY",
        hide_env_values = true,
        help = "Admin key sent as X-Admin-Key"
    )]
    pub admin_key: Option<String>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Control the traffic kill switch")]
    Kill(KillCommand),

    #[clap(about = "Show request, block and leak counts")]
    Stats(StatsCommand),

    #[clap(about = "List recent blocked requests")]
    Blocks(BlocksCommand),

    #[clap(name = "test-alert", about = "Send a test notification")]
    TestAlert(TestAlertCommand),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Table
    };

    let client = AdminClient::new(&cli.url, cli.admin_key.clone())?;

    match &cli.command {
        Command::Kill(cmd) => cmd.execute(&client, format).await,
        Command::Stats(cmd) => cmd.execute(&client, format).await,
        Command::Blocks(cmd) => cmd.execute(&client, format).await,
        Command::TestAlert(cmd) => cmd.execute(&client, format).await,
    }
}
