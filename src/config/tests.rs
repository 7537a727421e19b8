use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.cache.max_entries = Some(64);
    raw.logging.level = Some("info".to_string());
    raw.identity.actor = Some("deployer".to_string());

    let overrides = ResolveOverrides {
        cache_max_entries: Some(8),
        actor: Some("operator".to_string()),
        logging: LoggingOverride {
            log_level: Some("debug".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };

    raw.apply_resolve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.cache.max_entries, 8);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.identity.actor.as_deref(), Some("operator"));
}

#[test]
fn defaults_are_valid() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert!(settings.cache.enabled);
    assert_eq!(settings.cache.max_entries, DEFAULT_CACHE_MAX_ENTRIES);
    assert_eq!(settings.database.max_connections.get(), DEFAULT_DB_MAX_CONNECTIONS);
    assert!(settings.database.url.is_none());
    assert_eq!(settings.catalog.path, PathBuf::from(DEFAULT_CATALOG_PATH));
    assert!(settings.identity.actor.is_none());
    assert_eq!(settings.resources.uri_prefix, "/api");
    assert!(matches!(settings.logging.format, LogFormat::Compact));
}

#[test]
fn blank_actor_is_anonymous() {
    let mut raw = RawSettings::default();
    raw.identity.actor = Some("   ".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.identity.actor.is_none());
}

#[test]
fn zero_cache_capacity_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.max_entries = Some(0);
    let err = Settings::from_raw(raw).expect_err("zero capacity");
    assert!(matches!(
        err,
        LoadError::Invalid { key: "cache.max_entries", .. }
    ));
}

#[test]
fn invalid_log_level_is_rejected() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("loud".to_string());
    let err = Settings::from_raw(raw).expect_err("bad level");
    assert!(matches!(err, LoadError::Invalid { key: "logging.level", .. }));
}

#[test]
fn relative_resource_prefix_is_rejected() {
    let mut raw = RawSettings::default();
    raw.resources.uri_prefix = Some("api".to_string());
    let err = Settings::from_raw(raw).expect_err("relative prefix");
    assert!(matches!(
        err,
        LoadError::Invalid { key: "resources.uri_prefix", .. }
    ));
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    raw.apply_command_overrides(&Command::Migrate(MigrateArgs {
        logging: LoggingOverride {
            log_json: Some(true),
            ..Default::default()
        },
        ..Default::default()
    }));

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn parse_show_arguments() {
    let args = CliArgs::parse_from([
        "settlekeep",
        "show",
        "--database-url",
        "postgres://example",
        "--catalog",
        "/etc/settlekeep/catalog.toml",
        "--actor",
        "ops",
        "Billing",
    ]);

    match args.command {
        Command::Show(show) => {
            assert_eq!(show.class, "Billing");
            assert_eq!(
                show.overrides.database.database_url.as_deref(),
                Some("postgres://example")
            );
            assert_eq!(
                show.overrides.catalog.as_deref(),
                Some(std::path::Path::new("/etc/settlekeep/catalog.toml"))
            );
            assert_eq!(show.overrides.actor.as_deref(), Some("ops"));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_populate_arguments() {
    let args = CliArgs::parse_from([
        "settlekeep",
        "populate",
        "--cache-max-entries",
        "16",
        "--log-json",
        "true",
    ]);

    match args.command {
        Command::Populate(populate) => {
            assert_eq!(populate.overrides.cache_max_entries, Some(16));
            assert_eq!(populate.overrides.logging.log_json, Some(true));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_migrate_arguments() {
    let args = CliArgs::parse_from([
        "settlekeep",
        "migrate",
        "--database-url",
        "postgres://example",
        "--database-max-connections",
        "2",
    ]);

    match args.command {
        Command::Migrate(migrate) => {
            assert_eq!(
                migrate.database.database_url.as_deref(),
                Some("postgres://example")
            );
            assert_eq!(migrate.database.database_max_connections, Some(2));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn config_file_layer_is_read() {
    use std::io::Write;

    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp file");
    writeln!(
        file,
        "[cache]\nenabled = false\nmax_entries = 32\n\n[identity]\nactor = \"deployer\""
    )
    .expect("write config");

    let args = CliArgs::parse_from([
        "settlekeep",
        "--config-file",
        file.path().to_str().expect("utf-8 path"),
        "classes",
    ]);
    let settings = load(&args).expect("settings load");

    assert!(!settings.cache.enabled);
    assert_eq!(settings.cache.max_entries, 32);
    assert_eq!(settings.identity.actor.as_deref(), Some("deployer"));
}
