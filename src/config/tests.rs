use super::*;

#[test]
fn defaults_are_valid() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert_eq!(settings.logging.format, LogFormat::Compact);
    assert!(settings.database.url.is_none());
    assert_eq!(settings.database.max_connections.get(), 5);
    assert_eq!(settings.pagination.per_page.get(), 10);
    assert!(settings.cache.enabled);
    assert_eq!(settings.cache.page_ttl_seconds, 20);
    assert_eq!(settings.cache.capacity, 64);
    assert_eq!(settings.media.directory, PathBuf::from("media"));
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("info".to_string());
    raw.pagination.per_page = Some(20);

    let overrides = Overrides {
        log_level: Some("debug".to_string()),
        per_page: Some(5),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.pagination.per_page.get(), 5);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    raw.apply_overrides(&Overrides {
        log_json: Some(true),
        ..Default::default()
    });

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.logging.format, LogFormat::Json);
}

#[test]
fn blank_database_url_is_treated_as_missing() {
    let mut raw = RawSettings::default();
    raw.database.url = Some("   ".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.database.url.is_none());
}

#[test]
fn zero_per_page_is_rejected() {
    let mut raw = RawSettings::default();
    raw.pagination.per_page = Some(0);

    let err = Settings::from_raw(raw).expect_err("invalid per_page");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "pagination.per_page",
            ..
        }
    ));
}

#[test]
fn zero_cache_capacity_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.capacity = Some(0);

    let err = Settings::from_raw(raw).expect_err("invalid capacity");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.capacity",
            ..
        }
    ));
}

#[test]
fn oversized_page_ttl_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.page_ttl_seconds = Some(u64::MAX);

    let err = Settings::from_raw(raw).expect_err("ttl too large");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.page_ttl_seconds",
            ..
        }
    ));

    let mut raw = RawSettings::default();
    raw.cache.page_ttl_seconds = Some(MAX_PAGE_TTL_SECONDS);
    let settings = Settings::from_raw(raw).expect("upper bound is accepted");
    assert_eq!(settings.cache.page_ttl_seconds, MAX_PAGE_TTL_SECONDS);
}

#[test]
fn invalid_log_level_is_rejected() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("chatty".to_string());

    let err = Settings::from_raw(raw).expect_err("invalid level");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "logging.level",
            ..
        }
    ));
}

#[test]
fn cli_parses_nested_commands() {
    let args = CliArgs::try_parse_from([
        "quillhub",
        "--per-page",
        "3",
        "post",
        "list",
        "--group",
        "test-slug",
        "--page",
        "2",
    ])
    .expect("parse");

    assert_eq!(args.overrides.per_page, Some(3));
    match args.command {
        Command::Post(PostCommand::List(list)) => {
            assert_eq!(list.group.as_deref(), Some("test-slug"));
            assert_eq!(list.page.as_deref(), Some("2"));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}
