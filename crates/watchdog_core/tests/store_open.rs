use tempfile::TempDir;
use watchdog_core::{
    open_configured_store, open_store, Currency, StoreConfig, StoreError, TableEngine,
};

#[test]
fn rows_survive_reopening_the_store_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("watchdog.sqlite3");

    {
        let engine = TableEngine::new(open_store(&path).unwrap());
        engine.create_table::<Currency>().unwrap();
        engine.insert(&mut Currency::new("CHF", "Swiss franc")).unwrap();
        engine.insert(&mut Currency::new("EUR", "Euro")).unwrap();
    }

    let engine = TableEngine::new(open_store(&path).unwrap());
    engine.create_table::<Currency>().unwrap();
    let codes: Vec<String> = engine
        .read_all::<Currency>()
        .unwrap()
        .collect_strict()
        .unwrap()
        .into_iter()
        .map(|currency| currency.iso_code)
        .collect();
    assert_eq!(codes, vec!["CHF".to_string(), "EUR".to_string()]);
}

#[test]
fn opening_stamps_format_version() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("watchdog.sqlite3");
    let store = open_store(&path).unwrap();

    let version: u32 = store
        .connection()
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, watchdog_core::store::STORE_FORMAT_VERSION);
}

#[test]
fn newer_format_version_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("watchdog.sqlite3");
    {
        let store = open_store(&path).unwrap();
        store
            .connection()
            .execute_batch("PRAGMA user_version = 999;")
            .unwrap();
    }

    let err = open_store(&path).err().expect("newer format must be rejected");
    assert!(matches!(
        err,
        StoreError::UnsupportedFormatVersion {
            store_version: 999,
            ..
        }
    ));
}

#[test]
fn configured_store_opens_at_configured_path() {
    let dir = TempDir::new().unwrap();
    let config = StoreConfig {
        path: Some(dir.path().join("configured.sqlite3")),
        busy_timeout_ms: 250,
    };

    let engine = TableEngine::new(open_configured_store(&config).unwrap());
    engine.create_table::<Currency>().unwrap();

    assert!(config.path.as_ref().unwrap().exists());
    assert!(engine.store().connection().is_autocommit());
    assert_eq!(engine.count::<Currency>().unwrap(), 0);
}
