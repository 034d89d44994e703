//! End-to-end tests for file-based runs.
//!
//! The live test needs ANTHROPIC_API_KEY.
//! Run with: `cargo test -p npc-core --test batch -- --ignored --nocapture`

use claude::Claude;
use npc_core::{
    Backend, ChatConfig, ChatProcessor, KeywordClassifier, Mood, OutputRecord, PersistError,
    ProcessError, RemoteClassifier, RemoteReplier, TemplateReplier,
};
use std::path::Path;
use tempfile::TempDir;

const PLAYERS: &str = r#"[
    {"player_id": "p2", "text": "Hello there", "timestamp": "2024-01-01T10:00:30"},
    {"player_id": "p1", "text": "you are stupid", "timestamp": "2024-01-01T10:01:00"},
    {"player_id": "p1", "text": "please help me", "timestamp": "2024-01-01T10:00:00"},
    {"player_id": "p2", "text": "thanks!", "timestamp": "2024-01-01T10:02:00"},
    {"player_id": "p1", "text": "where is the smith", "timestamp": "2024-01-01T10:03:00"},
    {"player_id": "p1", "text": "ok", "timestamp": "2024-01-01T10:04:00"}
]"#;

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write fixture");
    path
}

fn read_records(path: &Path) -> Vec<OutputRecord> {
    let content = std::fs::read_to_string(path).expect("Failed to read output");
    serde_json::from_str(&content).expect("Output should be a JSON array of records")
}

fn rules() -> ChatProcessor {
    ChatProcessor::new(KeywordClassifier::default(), TemplateReplier)
}

#[tokio::test]
async fn test_rules_run_writes_annotated_log() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "players.json", PLAYERS);
    let output = dir.path().join("npc_logs.json");

    let summary = rules().run_files(&input, &output).await.unwrap();
    assert_eq!(summary.records, 6);
    assert_eq!(summary.players, 2);

    let records = read_records(&output);
    let order: Vec<&str> = records.iter().map(|r| r.message.as_str()).collect();
    assert_eq!(
        order,
        vec![
            "ok",
            "where is the smith",
            "thanks!",
            "you are stupid",
            "Hello there",
            "please help me",
        ]
    );

    // p1: friendly -> angry -> carried -> carried
    let newest = &records[0];
    assert_eq!(newest.player_id, "p1");
    assert_eq!(newest.npc_mood, Mood::Angry);
    assert_eq!(
        newest.last_3_messages,
        vec!["you are stupid", "where is the smith", "ok"]
    );
    assert_eq!(newest.npc_reply, "(NPC in angry mood replies to: 'ok')");
    assert_eq!(newest.timestamp, "2024-01-01T10:04:00");

    // p2: neutral -> friendly
    assert_eq!(records[4].npc_mood, Mood::Neutral);
    assert_eq!(records[2].npc_mood, Mood::Friendly);
    assert_eq!(records[2].last_3_messages, vec!["Hello there", "thanks!"]);
}

#[tokio::test]
async fn test_output_is_pretty_printed() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "players.json", PLAYERS);
    let output = dir.path().join("npc_logs.json");

    rules().run_files(&input, &output).await.unwrap();

    let content = std::fs::read_to_string(&output).unwrap();
    assert!(content.starts_with("[\n    {\n        \"player_id\""));
    assert!(content.contains("\"npc_mood\": \"angry\""));
}

#[tokio::test]
async fn test_bad_timestamp_leaves_previous_output() {
    let dir = TempDir::new().unwrap();
    let input = write(
        &dir,
        "players.json",
        r#"[
            {"player_id": "p1", "text": "hi", "timestamp": "2024-01-01T10:00:00"},
            {"player_id": "p1", "text": "hello", "timestamp": "last tuesday"}
        ]"#,
    );
    let output = write(&dir, "npc_logs.json", "[]");

    let err = rules().run_files(&input, &output).await.unwrap_err();
    assert!(matches!(err, ProcessError::Message(_)));
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "[]");
}

#[tokio::test]
async fn test_missing_field_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let input = write(
        &dir,
        "players.json",
        r#"[{"player_id": "p1", "timestamp": "2024-01-01T10:00:00"}]"#,
    );
    let output = dir.path().join("npc_logs.json");

    let err = rules().run_files(&input, &output).await.unwrap_err();
    assert!(matches!(err, ProcessError::Persist(PersistError::Message(_))));
    assert!(err.to_string().contains("text"));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_missing_input_is_fatal() {
    let dir = TempDir::new().unwrap();
    let err = rules()
        .run_files(dir.path().join("absent.json"), dir.path().join("out.json"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProcessError::Persist(PersistError::Io { .. })));
}

#[tokio::test]
async fn test_unreachable_remote_falls_back() {
    let client = Claude::new("test-key")
        .unwrap()
        .with_base_url("http://127.0.0.1:9/v1");
    let processor = ChatProcessor::new(
        RemoteClassifier::new(client.clone()),
        RemoteReplier::new(client),
    );

    let dir = TempDir::new().unwrap();
    let input = write(&dir, "players.json", PLAYERS);
    let output = dir.path().join("npc_logs.json");

    let summary = processor.run_files(&input, &output).await.unwrap();
    assert_eq!(summary.records, 6);

    for record in read_records(&output) {
        // Every classification failed, so nobody left the starting mood.
        assert_eq!(record.npc_mood, Mood::Neutral);
        assert!(record.npc_reply.starts_with("(Error generating reply: "));
    }
}

#[tokio::test]
async fn test_config_driven_rules_run() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "chat.json", PLAYERS);
    let output = dir.path().join("annotated.json");

    let config = ChatConfig::new()
        .with_input(&input)
        .with_output(&output)
        .with_backend(Backend::Rules);
    let processor = config.build_processor().unwrap();
    processor.run_files(&config.input, &config.output).await.unwrap();

    assert_eq!(read_records(&output).len(), 6);
}

#[tokio::test]
#[ignore]
async fn test_remote_run_live() {
    let _ = dotenvy::dotenv();
    if std::env::var("ANTHROPIC_API_KEY").is_err() {
        eprintln!("Skipping test: ANTHROPIC_API_KEY not set");
        return;
    }

    let dir = TempDir::new().unwrap();
    let input = write(&dir, "players.json", PLAYERS);
    let output = dir.path().join("npc_logs.json");

    let processor = ChatConfig::new()
        .with_backend(Backend::Remote)
        .build_processor()
        .expect("Failed to build remote processor");
    processor.run_files(&input, &output).await.unwrap();

    for record in read_records(&output) {
        println!("[{}] {} -> {}", record.npc_mood, record.message, record.npc_reply);
        assert!(!record.npc_reply.is_empty());
    }
}
