mod backup;
mod report;
mod results;

pub use backup::backup_database;
pub use report::write_report;
pub use results::{show_processes, show_results};

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;
