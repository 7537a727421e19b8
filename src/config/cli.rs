use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the settlekeep binary.
#[derive(Debug, Parser)]
#[command(
    name = "settlekeep",
    version,
    about = "Resolve and persist application settings"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "SETTLEKEEP_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Apply pending database migrations.
    Migrate(MigrateArgs),
    /// Resolve every catalog class, persisting defaults for unseen properties.
    Populate(PopulateArgs),
    /// Resolve one class and print its values as JSON.
    Show(ShowArgs),
    /// List the classes declared in the catalog.
    Classes(ClassesArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct DatabaseOverride {
    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct LoggingOverride {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ResolveOverrides {
    #[command(flatten)]
    pub database: DatabaseOverride,

    #[command(flatten)]
    pub logging: LoggingOverride,

    /// Override the catalog file declaring settings classes.
    #[arg(long = "catalog", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub catalog: Option<PathBuf>,

    /// Override the actor recorded as `last_modified_by`.
    #[arg(long = "actor", value_name = "NAME")]
    pub actor: Option<String>,

    /// Override the settings cache capacity.
    #[arg(long = "cache-max-entries", value_name = "COUNT")]
    pub cache_max_entries: Option<usize>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,

    #[command(flatten)]
    pub logging: LoggingOverride,
}

#[derive(Debug, Args, Default, Clone)]
pub struct PopulateArgs {
    #[command(flatten)]
    pub overrides: ResolveOverrides,
}

#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    #[command(flatten)]
    pub overrides: ResolveOverrides,

    /// Full identifier or short name of the class to resolve.
    #[arg(value_name = "CLASS")]
    pub class: String,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ClassesArgs {
    /// Override the catalog file declaring settings classes.
    #[arg(long = "catalog", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub catalog: Option<PathBuf>,

    #[command(flatten)]
    pub logging: LoggingOverride,
}
