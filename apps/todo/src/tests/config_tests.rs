use super::*;

use std::{
    collections::HashMap,
    io::Write,
    sync::{Arc, Mutex},
};

fn no_env(_: &str) -> Option<String> {
    None
}

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| vars.get(key).cloned()
}

#[derive(Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl CapturedLog {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().expect("log lock").clone()).expect("utf8 log")
    }
}

impl Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().expect("log lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
}

#[test]
fn keeps_sqlite_urls_untouched() {
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
    assert_eq!(
        normalize_database_url(" sqlite://todos.db "),
        "sqlite://todos.db"
    );
}

#[test]
fn blank_database_url_falls_back_to_default() {
    assert_eq!(normalize_database_url("  "), Settings::default().database_url);
}

#[test]
fn missing_file_yields_defaults() {
    let dir = std::env::temp_dir().join("todo_settings_missing_dir_for_test");
    let (settings, warnings) = load_settings_from(&dir.join("todo.toml"), no_env);
    assert_eq!(settings, Settings::default());
    assert!(warnings.is_empty());
}

#[test]
fn file_values_override_defaults() {
    let mut settings = Settings::default();
    let mut warnings = Vec::new();
    apply_file(
        &mut settings,
        r##"
        database_url = "sqlite://./custom.db"
        default_route = "#/active"
        event_queue_capacity = 8
        output = "json"
        "##,
        &mut warnings,
    );

    assert_eq!(settings.database_url, "sqlite://./custom.db");
    assert_eq!(settings.default_route, "#/active");
    assert_eq!(settings.event_queue_capacity, 8);
    assert_eq!(settings.output, OutputFormat::Json);
    assert_eq!(settings.log_filter, "warn");
    assert!(warnings.is_empty());
}

#[test]
fn env_overrides_file_and_prefers_app_prefix() {
    let mut settings = Settings::default();
    let mut warnings = Vec::new();
    apply_file(&mut settings, r#"database_url = "sqlite://./file.db""#, &mut warnings);
    apply_env(
        &mut settings,
        env_from(&[
            ("DATABASE_URL", "sqlite://./plain.db"),
            ("APP__DATABASE_URL", "sqlite://./app.db"),
            ("APP__OUTPUT", "text"),
            ("RUST_LOG", "debug"),
        ]),
        &mut warnings,
    );

    assert_eq!(settings.database_url, "sqlite://./app.db");
    assert_eq!(settings.output, OutputFormat::Text);
    assert_eq!(settings.log_filter, "debug");
}

#[test]
fn invalid_values_are_ignored_and_reported() {
    let mut settings = Settings::default();
    let mut warnings = Vec::new();
    apply_env(
        &mut settings,
        env_from(&[
            ("APP__EVENT_QUEUE_CAPACITY", "zero"),
            ("APP__OUTPUT", "xml"),
        ]),
        &mut warnings,
    );
    assert_eq!(settings, Settings::default());
    assert_eq!(
        warnings,
        vec![
            SettingsWarning::InvalidCapacity("zero".into()),
            SettingsWarning::InvalidOutput("unknown output format 'xml'".into()),
        ]
    );

    apply_env(
        &mut settings,
        env_from(&[("APP__EVENT_QUEUE_CAPACITY", "0")]),
        &mut warnings,
    );
    assert_eq!(settings.event_queue_capacity, 64);

    apply_file(&mut settings, "this is not toml = = =", &mut warnings);
    assert_eq!(settings, Settings::default());
    assert_eq!(warnings.len(), 4);
    assert!(matches!(warnings[3], SettingsWarning::UnreadableFile(_)));
}

#[test]
fn warnings_from_loading_reach_the_installed_subscriber() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (settings, warnings) =
        load_settings_from(&dir.path().join("todo.toml"), env_from(&[("APP__OUTPUT", "xml")]));
    assert_eq!(settings.output, OutputFormat::Text);

    let log = CapturedLog::default();
    let writer = log.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    tracing::subscriber::with_default(subscriber, || report_warnings(&warnings));

    let output = log.contents();
    assert!(output.contains("WARN"), "missing level in {output:?}");
    assert!(
        output.contains("unknown output format 'xml'"),
        "missing warning in {output:?}"
    );
}

#[test]
fn reads_settings_file_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("todo.toml");
    std::fs::write(&path, "default_route = \"#/completed\"\n").expect("write");

    let (settings, _) = load_settings_from(&path, env_from(&[("APP__DEFAULT_ROUTE", "#/active")]));
    assert_eq!(settings.default_route, "#/active");

    let (settings, _) = load_settings_from(&path, no_env);
    assert_eq!(settings.default_route, "#/completed");
}
