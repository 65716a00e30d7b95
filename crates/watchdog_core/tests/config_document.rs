use std::path::PathBuf;
use watchdog_core::{LogConfig, StoreConfig, WatchdogConfig};

#[test]
fn empty_document_uses_defaults() {
    let config: WatchdogConfig = serde_json::from_str("{}").unwrap();

    assert_eq!(config, WatchdogConfig::default());
    assert_eq!(config.store, StoreConfig::default());
    assert!(config.log.is_none());
}

#[test]
fn partial_store_section_keeps_remaining_defaults() {
    let config: WatchdogConfig =
        serde_json::from_str(r#"{ "store": { "path": "/var/lib/watchdog/db.sqlite3" } }"#)
            .unwrap();

    assert_eq!(
        config.store.path,
        Some(PathBuf::from("/var/lib/watchdog/db.sqlite3"))
    );
    assert_eq!(
        config.store.busy_timeout_ms,
        StoreConfig::default().busy_timeout_ms
    );
}

#[test]
fn log_section_defaults_level() {
    let config: WatchdogConfig =
        serde_json::from_str(r#"{ "log": { "dir": "/var/log/watchdog" } }"#).unwrap();

    let log = config.log.unwrap();
    assert_eq!(log.dir, PathBuf::from("/var/log/watchdog"));
    assert_eq!(log.level, watchdog_core::default_log_level());
}

#[test]
fn log_section_requires_directory() {
    let result = serde_json::from_str::<LogConfig>(r#"{ "level": "debug" }"#);
    assert!(result.is_err());
}
