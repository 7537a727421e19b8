use std::{process, sync::Arc};

use settlekeep::{
    application::{
        error::AppError, identity::FixedIdentity, registry::SettingsRegistry,
        resolver::SettingsResolver,
    },
    cache::{CacheConfig, SettingsCache},
    config,
    infra::{
        catalog::Catalog, db::PostgresRepositories, error::InfraError,
        resources::PathResourceResolver, telemetry,
    },
};
use sqlx::PgPool;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match cli_args.command {
        config::Command::Migrate(_) => run_migrate(&settings).await,
        config::Command::Populate(_) => run_populate(&settings).await,
        config::Command::Show(args) => run_show(&settings, &args.class).await,
        config::Command::Classes(_) => run_classes(&settings),
    }
}

async fn run_migrate(settings: &config::Settings) -> Result<(), AppError> {
    let pool = connect(settings).await?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    info!(target = "settlekeep::migrate", "Migrations applied");
    Ok(())
}

async fn run_populate(settings: &config::Settings) -> Result<(), AppError> {
    let resolver = build_resolver(settings).await?;
    let report = resolver.populate_all().await;

    for class in &report.resolved {
        println!("resolved\t{class}");
    }
    for failure in &report.failures {
        println!("failed\t{}\t{}", failure.class, failure.error);
    }

    if report.is_success() {
        Ok(())
    } else {
        Err(AppError::unexpected(format!(
            "{} of {} settings classes failed to populate",
            report.failures.len(),
            report.failures.len() + report.resolved.len()
        )))
    }
}

async fn run_show(settings: &config::Settings, class: &str) -> Result<(), AppError> {
    let resolver = build_resolver(settings).await?;
    let instance = resolver.resolve(class).await?;

    let rendered = instance
        .to_json()
        .and_then(|json| serde_json::to_string_pretty(&json))
        .map_err(|err| AppError::unexpected(format!("failed to render settings: {err}")))?;
    println!("{rendered}");
    Ok(())
}

fn run_classes(settings: &config::Settings) -> Result<(), AppError> {
    let catalog = load_catalog(settings)?;
    for identifier in catalog.registry.list() {
        let descriptor = catalog.registry.get(&identifier)?;
        println!(
            "{identifier}\t{}\t{} properties",
            descriptor.short_name(),
            descriptor.properties().len()
        );
    }
    Ok(())
}

fn load_catalog(settings: &config::Settings) -> Result<Catalog, AppError> {
    Catalog::load(&settings.catalog.path)
        .map_err(InfraError::from)
        .map_err(AppError::from)
}

async fn connect(settings: &config::Settings) -> Result<PgPool, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))
}

async fn build_resolver(settings: &config::Settings) -> Result<SettingsResolver, AppError> {
    let catalog = load_catalog(settings)?;
    let repositories = PostgresRepositories::new(connect(settings).await?);
    repositories
        .health_check()
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    let mut resources = PathResourceResolver::new(settings.resources.uri_prefix.clone());
    if !catalog.resources.is_empty() {
        resources = resources.with_known(catalog.resources);
    }

    Ok(SettingsResolver::new(
        Arc::new(catalog.registry),
        Arc::new(repositories),
        Arc::new(SettingsCache::new(&CacheConfig::from(&settings.cache))),
        Arc::new(resources),
        Arc::new(FixedIdentity::new(settings.identity.actor.clone())),
    ))
}
