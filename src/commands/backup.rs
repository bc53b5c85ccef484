use super::CommandResult;
use crate::backup;
use crate::config::Settings;
use colored::Colorize;
use std::path::Path;

pub async fn backup_database(settings: &Settings, output_dir: &Path) -> CommandResult {
    let source = backup::locate(
        &settings.database_url,
        &settings.backup_prefix,
        chrono::Local::now().date_naive(),
    )?;

    println!(
        "💾 Backing up {}",
        source.path.display().to_string().bright_cyan()
    );
    let target = backup::copy_to(&source, output_dir).await?;

    println!(
        "✅ Backup written: {}",
        target.display().to_string().bright_green()
    );
    Ok(())
}
