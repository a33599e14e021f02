//! Integration tests for rulebot.
#![allow(
    clippy::panic,
    clippy::too_many_lines,
    clippy::float_cmp,
    clippy::unwrap_used,
    clippy::expect_used
)]

use rulebot::config::BotConfig;
use rulebot::engine::{AimlKernel, load_rules};
use rulebot::extract::{export, extract};
use rulebot::models::{Mode, SessionMemory};
use rulebot::services::{PassthroughCorrector, Session, build_corrector};
use rulebot::storage::{MemoryStore, SettingsStore};
use rulebot::{Error, ResponseEngine};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const GOOD_RULES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<aiml version="1.0.1">
  <category>
    <pattern>HELLO</pattern>
    <template>Hi there!</template>
  </category>
  <category>
    <pattern>WHAT IS YOUR PURPOSE</pattern>
    <template>To make reports and apply well.</template>
  </category>
</aiml>"#;

const BROKEN_RULES: &str = r"<aiml>
  <category>
    <pattern>GOODBYE</pattern>
    <template>Bye!</template>
  </category>
";

fn bot_dir(dir: &TempDir) -> BotConfig {
    let rules = dir.path().join("Achat");
    fs::create_dir_all(&rules).unwrap();
    fs::write(rules.join("a_good.aiml"), GOOD_RULES).unwrap();
    fs::write(rules.join("b_broken.aiml"), BROKEN_RULES).unwrap();
    fs::write(rules.join("notes.txt"), "not a rule file").unwrap();
    BotConfig::default().with_data_dir(dir.path())
}

fn open(config: &BotConfig) -> Session {
    Session::open(config, Box::new(AimlKernel::new()), Box::new(PassthroughCorrector))
}

fn read_memory(path: &Path) -> SessionMemory {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_error_types() {
    let err = Error::InvalidInput("test message".to_string());
    let display = format!("{err}");
    assert!(display.contains("invalid input"));
    assert!(display.contains("test message"));

    let err = Error::OperationFailed {
        operation: "read".to_string(),
        cause: "file not found".to_string(),
    };
    let display = format!("{err}");
    assert!(display.contains("read"));
    assert!(display.contains("file not found"));
}

#[test]
fn test_good_and_broken_rule_files() {
    let dir = TempDir::new().unwrap();
    let config = bot_dir(&dir);

    let mut kernel = AimlKernel::new();
    let report = load_rules(&mut kernel, &config.rules_dir);

    assert_eq!(report.loaded.len(), 1);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].0.ends_with("b_broken.aiml"));
    assert_eq!(report.rule_count(), 2);
    assert_eq!(kernel.category_count(), 2);

    assert_eq!(kernel.respond("hello").unwrap(), "Hi there!");
    assert_eq!(kernel.respond("goodbye").unwrap(), "");
}

#[test]
fn test_missing_rule_directory_is_not_fatal() {
    let dir = TempDir::new().unwrap();
    let config = BotConfig::default().with_data_dir(dir.path());

    let mut session = open(&config);
    assert!(session.rule_report().is_empty());
    assert_eq!(session.listen("hello world 123", None).unwrap(), "hello world");
}

#[test]
fn test_session_lifecycle_persists_exchanges_and_scores() {
    let dir = TempDir::new().unwrap();
    let config = bot_dir(&dir);

    let mut session = open(&config);
    let calls: [(&str, Option<f64>); 4] = [
        ("hello", Some(5.0)),
        ("what is your purpose", None),
        ("weather 42 today", Some(1.5)),
        ("hello!", None),
    ];
    for (text, score) in calls {
        session.listen(text, score).unwrap();
    }
    let summary = session.close().unwrap();
    assert_eq!(summary.exchanges, 4);

    let memory = read_memory(&config.memory_file);
    assert_eq!(memory.log.len(), 4);
    assert_eq!(memory.scores, vec![5.0, 1.5]);
    assert_eq!(memory.corrector, "Alice");
    assert_eq!(memory.purpose, "To make reports and apply well.");

    let inputs: Vec<&str> = memory.log.iter().map(|e| e.input.as_str()).collect();
    assert_eq!(inputs, ["hello", "what is your purpose", "weather 42 today", "hello!"]);
    assert_eq!(memory.log[2].output, "weather today");
    assert_eq!(memory.log[0].score, Some(5.0));
    assert_eq!(memory.log[1].score, None);
}

#[test]
fn test_memory_file_keys() {
    let dir = TempDir::new().unwrap();
    let config = bot_dir(&dir).with_flush_on_record(true);

    let mut session = open(&config);
    session.listen("hello", Some(2.0)).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&config.memory_file).unwrap()).unwrap();
    for key in ["id", "log", "purpose", "corrector", "scores"] {
        assert!(raw.get(key).is_some(), "missing key {key}");
    }
    let entry = &raw["log"][0];
    assert_eq!(entry["in"], "hello");
    assert_eq!(entry["out"], "Hi there!");
    assert_eq!(entry["score"], 2.0);
    let time = entry["time"].as_str().unwrap();
    assert_eq!(time.len(), "2024-01-01T10:00:00.000000".len());
    assert_eq!(&time[10..11], "T");
}

#[test]
fn test_history_accumulates_across_sessions() {
    let dir = TempDir::new().unwrap();
    let config = bot_dir(&dir);

    for _ in 0..3 {
        let mut session = open(&config);
        session.listen("hello", None).unwrap();
        session.close().unwrap();
    }

    let memory = read_memory(&config.memory_file);
    assert_eq!(memory.log.len(), 3);
}

#[test]
fn test_same_second_exchanges_get_distinct_log_files() {
    let dir = TempDir::new().unwrap();
    let config = bot_dir(&dir);

    let mut session = open(&config);
    session.listen("hello", None).unwrap();
    session.listen("what is your purpose", None).unwrap();
    session.listen("hello", Some(1.0)).unwrap();

    let mut contents: Vec<String> = fs::read_dir(&config.log_dir)
        .unwrap()
        .map(|entry| fs::read_to_string(entry.unwrap().path()).unwrap())
        .collect();
    contents.sort();

    assert_eq!(contents.len(), 3);
    assert!(contents.iter().all(|c| c.starts_with("# Mechanized AIML Log\n")));
    assert!(contents.iter().any(|c| c.contains("Input: what is your purpose\n")));
    assert_eq!(contents.iter().filter(|c| c.contains("Score: 1\n")).count(), 1);
}

#[test]
fn test_mode_persists_between_sessions() {
    let dir = TempDir::new().unwrap();
    let config = bot_dir(&dir);

    let mut session = open(&config);
    session.set_mode("arbitration").unwrap();
    session.close().unwrap();

    let mut session = open(&config);
    assert_eq!(session.mode(), Mode::Arbitration);
    assert_eq!(session.listen("hello", None).unwrap(), "[Arbitration] Hi there!");
}

#[test]
fn test_unknown_mode_in_settings_file_is_identity() {
    let dir = TempDir::new().unwrap();
    let config = bot_dir(&dir);
    fs::write(&config.settings_file, r#"{"mode": "zen", "theme": "dark"}"#).unwrap();

    let mut session = open(&config);
    assert_eq!(session.listen("hello", None).unwrap(), "Hi there!");

    session.set_mode("mediation").unwrap();
    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&config.settings_file).unwrap()).unwrap();
    assert_eq!(raw["mode"], "mediation");
    assert_eq!(raw["theme"], "dark");
}

#[test]
fn test_corrupt_memory_is_kept_aside() {
    let dir = TempDir::new().unwrap();
    let config = bot_dir(&dir);
    fs::write(&config.memory_file, "{ not json").unwrap();

    let mut session = open(&config);
    assert_eq!(session.memory().exchange_count(), 0);
    session.listen("hello", None).unwrap();
    session.close().unwrap();

    let store = MemoryStore::new(&config.memory_file);
    assert_eq!(fs::read_to_string(store.quarantine_path()).unwrap(), "{ not json");
    assert_eq!(read_memory(&config.memory_file).log.len(), 1);
}

#[test]
fn test_settings_store_defaults_on_invalid_json() {
    let dir = TempDir::new().unwrap();
    let store = SettingsStore::new(dir.path().join("settings.json"));
    fs::write(store.path(), "[1, 2").unwrap();

    let settings = store.load();
    assert_eq!(settings.mode(), Mode::Harmony);
    assert_eq!(settings.raw_mode(), Some("harmony"));
}

#[test]
fn test_extract_and_export_file() {
    let dir = TempDir::new().unwrap();
    let text = "Intro\n\
        Business: Acme\n\
        Name: Jane Doe\n\
        Address: 1 Main St\n\
        Phone: 555-1234\n\
        Industry: Retail\n\
        Amount: $1,200.50\n";

    let records = extract(text);
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].values(),
        ["Acme", "Jane Doe", "1 Main St", "555-1234", "Retail", "1,200.50"]
    );

    let output = dir.path().join("records.csv");
    export(&records, &output).unwrap();
    let written = fs::read_to_string(&output).unwrap();
    assert_eq!(written.lines().count(), 2);

    let empty = dir.path().join("empty.csv");
    export(&extract("nothing here"), &empty).unwrap();
    assert_eq!(
        fs::read_to_string(&empty).unwrap(),
        "business,name,address,phone,industry,amount\n"
    );
}

#[test]
fn test_extract_to_workbook() {
    use calamine::Reader;

    let dir = TempDir::new().unwrap();
    let text = "Business: Acme\nName: Jane Doe\nAddress: 1 Main St\n\
                Phone: 555-1234\nIndustry: Retail\nAmount: $1,200.50\n";

    let output = dir.path().join("reports").join("records.xlsx");
    export(&extract(text), &output).unwrap();
    assert!(fs::read(&output).unwrap().starts_with(b"PK"));

    let mut workbook = calamine::open_workbook_auto(&output).unwrap();
    let range = workbook.worksheet_range("Sheet1").unwrap();
    let cells: Vec<String> = range
        .rows()
        .nth(1)
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(cells, ["Acme", "Jane Doe", "1 Main St", "555-1234", "Retail", "1,200.50"]);

    let rejected = dir.path().join("records.xls");
    assert!(export(&extract(text), &rejected).is_err());
    assert!(!rejected.exists());
}

#[test]
fn test_default_config_corrects_spelling() {
    let dir = TempDir::new().unwrap();
    let config = bot_dir(&dir);

    let mut session = Session::open(
        &config,
        Box::new(AimlKernel::new()),
        build_corrector(&config.corrector),
    );
    assert_eq!(session.listen("helo", None).unwrap(), "Hi there!");
    assert_eq!(
        session.listen("waht is your purpose", None).unwrap(),
        "To make reports and apply well."
    );
    session.close().unwrap();

    let memory = read_memory(&config.memory_file);
    assert_eq!(memory.log[0].input, "helo");
}

