use super::CommandResult;
use crate::database::ElectionsDatabase;
use crate::report::{self, ReportError, ReportOptions, ReportSettings};
use crate::results::{ResultsError, NOT_FINALIZED_WARNING};
use colored::Colorize;
use std::path::Path;

pub async fn write_report(
    db: &ElectionsDatabase,
    process_id: i64,
    options: ReportOptions,
    settings: &ReportSettings,
    output_dir: &Path,
) -> CommandResult {
    println!(
        "📝 Generating report for process {}{}",
        process_id.to_string().bright_cyan(),
        if options.include_roster { " with roster" } else { "" }
    );

    let report = match report::generate_report(db, process_id, options, settings).await {
        Ok(report) => report,
        Err(e @ ReportError::Results(ResultsError::NotFinalized { .. })) => {
            eprintln!("⚠️  {}", NOT_FINALIZED_WARNING.yellow());
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    tokio::fs::create_dir_all(output_dir).await?;
    let target = output_dir.join(&report.filename);
    tokio::fs::write(&target, &report.bytes).await?;

    println!(
        "✅ Report written: {} ({} bytes)",
        target.display().to_string().bright_green(),
        report.bytes.len()
    );
    Ok(())
}
