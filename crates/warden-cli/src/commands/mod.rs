pub mod blocks;
pub mod kill;
pub mod stats;
pub mod test_alert;

pub use blocks::BlocksCommand;
pub use kill::KillCommand;
pub use stats::StatsCommand;
pub use test_alert::TestAlertCommand;
