/// Command-line and environment configuration
use crate::backup::DEFAULT_BACKUP_PREFIX;
use crate::report::fonts::DEFAULT_FONT_PATH;
use crate::report::{ReportSettings, DEFAULT_INSTITUTION, DEFAULT_SUBTITLE};
use clap::Args;
use std::path::PathBuf;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:elecciones.sqlite3";

#[derive(Debug, Clone, Args)]
pub struct SettingsArgs {
    /// SQLite database URL
    #[clap(long, global = true, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,
    /// TrueType font embedded in reports (falls back to Helvetica)
    #[clap(long, global = true, env = "REPORT_FONT_PATH", default_value = DEFAULT_FONT_PATH)]
    pub font_path: String,
    /// Logo image drawn above the report header
    #[clap(long, global = true, env = "REPORT_LOGO_PATH")]
    pub logo_path: Option<PathBuf>,
    /// Institution name in the report header
    #[clap(long, global = true, env = "REPORT_INSTITUTION", default_value = DEFAULT_INSTITUTION)]
    pub institution: String,
    /// Subtitle line under the institution name
    #[clap(long, global = true, env = "REPORT_SUBTITLE", default_value = DEFAULT_SUBTITLE)]
    pub subtitle: String,
    /// File name prefix of database backups
    #[clap(long, global = true, env = "BACKUP_PREFIX", default_value = DEFAULT_BACKUP_PREFIX)]
    pub backup_prefix: String,
    /// Bearer token required by the HTTP server
    #[clap(long, global = true, env = "RESULTS_API_TOKEN")]
    pub api_token: Option<String>,
}

/// Resolved, immutable settings shared by commands and the server
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub report: ReportSettings,
    pub backup_prefix: String,
    pub api_token: Option<String>,
}

impl Settings {
    #[cfg(test)]
    pub fn for_database(database_url: &str) -> Self {
        Self {
            database_url: database_url.to_string(),
            report: ReportSettings::default(),
            backup_prefix: DEFAULT_BACKUP_PREFIX.to_string(),
            api_token: None,
        }
    }
}

impl From<SettingsArgs> for Settings {
    fn from(args: SettingsArgs) -> Self {
        let font_path = Some(args.font_path)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        Self {
            database_url: args.database_url,
            report: ReportSettings {
                institution: args.institution,
                subtitle: args.subtitle,
                font_path,
                logo_path: args.logo_path,
            },
            backup_prefix: args.backup_prefix,
            api_token: args.api_token.filter(|t| !t.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestOpts {
        #[clap(flatten)]
        settings: SettingsArgs,
    }

    #[test]
    fn explicit_arguments_are_resolved() {
        let opts = TestOpts::parse_from([
            "test",
            "--database-url",
            "sqlite:/tmp/x.sqlite3",
            "--font-path",
            "",
            "--api-token",
            "secreto",
        ]);
        let settings = Settings::from(opts.settings);

        assert_eq!(settings.database_url, "sqlite:/tmp/x.sqlite3");
        assert_eq!(settings.report.font_path, None);
        assert_eq!(settings.api_token.as_deref(), Some("secreto"));
        assert!(!settings.backup_prefix.is_empty());
    }

    #[test]
    fn empty_token_disables_auth() {
        let opts = TestOpts::parse_from(["test", "--api-token", ""]);
        assert_eq!(Settings::from(opts.settings).api_token, None);
    }
}
