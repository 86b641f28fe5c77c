//! Drives the `sightline` subcommands against a temporary timeline.

use std::io;
use std::path::Path;

use clap::Parser;
use serde_json::Value;
use sightline_cli::cli::Cli;
use sightline_cli::commands::execute;

struct Sandbox {
    dir: tempfile::TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Run a command with the sandbox timeline and an absent config file.
    fn run_with_input(&self, args: &[&str], input: &str) -> anyhow::Result<String> {
        let timeline = self.path().join("timeline.json");
        let config = self.path().join("config.ron");
        let mut argv = vec![
            "sightline".to_string(),
            "--timeline".to_string(),
            timeline.display().to_string(),
            "--config".to_string(),
            config.display().to_string(),
        ];
        argv.extend(args.iter().map(|a| a.to_string()));

        let cli = Cli::try_parse_from(argv)?;
        let mut out = Vec::new();
        execute(cli, io::Cursor::new(input.to_string()), &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    fn run(&self, args: &[&str]) -> String {
        self.run_with_input(args, "").unwrap()
    }

    fn json(&self, args: &[&str]) -> Value {
        serde_json::from_str(&self.run(args)).unwrap()
    }
}

#[test]
fn edit_then_show() {
    let sandbox = Sandbox::new();
    let response = sandbox.json(&[
        "edit",
        r#"{"base_version":0,"ops":[{"type":"insert","position":0,"text":"Hello world"}]}"#,
    ]);
    assert_eq!(response["status"], "ok");
    assert_eq!(response["new_version"], 1);

    assert_eq!(sandbox.run(&["show"]), "Hello world\n");
    let snapshot = sandbox.json(&["snapshot"]);
    assert_eq!(snapshot["content"], "Hello world");
    assert_eq!(snapshot["version"], 1);
}

#[test]
fn edit_reads_stdin_and_reports_conflict() {
    let sandbox = Sandbox::new();
    let payload = r#"{"base_version":0,"ops":[{"type":"insert","position":0,"text":"a"}]}"#;

    let first = sandbox.run_with_input(&["edit", "-"], payload).unwrap();
    assert!(first.contains("\"ok\""));

    let second = sandbox.run_with_input(&["edit", "-"], payload).unwrap();
    let second: Value = serde_json::from_str(&second).unwrap();
    assert_eq!(second["status"], "conflict");
    assert_eq!(second["server_version"], 1);
}

#[test]
fn invalid_edit_is_an_error() {
    let sandbox = Sandbox::new();
    let result = sandbox.run_with_input(
        &["edit", r#"{"base_version":0,"ops":[{"type":"delete","start_position":0,"end_position":4}]}"#],
        "",
    );
    assert!(result.is_err());

    let malformed = sandbox.run_with_input(&["edit", "not json"], "");
    assert!(format!("{:#}", malformed.unwrap_err()).contains("invalid edit payload"));
}

#[test]
fn tag_commands() {
    let sandbox = Sandbox::new();
    sandbox.run(&[
        "edit",
        r#"{"base_version":0,"ops":[{"type":"insert","position":0,"text":"note"}]}"#,
    ]);

    let interned = sandbox.json(&["intern", "#project:sightline"]);
    assert_eq!(interned["name"], "#project:sightline");

    let assigned = sandbox.json(&["assign", "0", "project:sightline", "type:journal"]);
    assert_eq!(assigned.as_array().unwrap().len(), 2);

    let tags = sandbox.json(&["tags"]);
    let names: Vec<&str> = tags
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["#project", "#project:sightline", "#type", "#type:journal"]);

    assert_eq!(sandbox.json(&["search", "prefix", "project"]), serde_json::json!([0]));
    assert_eq!(sandbox.json(&["search", "infix", "journ"]), serde_json::json!([0]));
    assert_eq!(sandbox.json(&["search", "prefix", "home"]), serde_json::json!([]));

    let suggestions = sandbox.json(&["complete", "#proj"]);
    let last = suggestions.as_array().unwrap().last().unwrap().clone();
    assert_eq!(last["name"], "#proj");
    assert_eq!(last["is_new"], true);

    let blocks = sandbox.json(&["blocks"]);
    assert_eq!(blocks[0]["tags"].as_array().unwrap().len(), 2);

    assert!(sandbox.run_with_input(&["assign", "5", "x"], "").is_err());
}

#[test]
fn log_and_compact() {
    let sandbox = Sandbox::new();
    for (version, text) in ["one ", "two ", "three"].iter().enumerate() {
        let end = sandbox.json(&["snapshot"])["content"]
            .as_str()
            .unwrap()
            .chars()
            .count();
        let payload = serde_json::json!({
            "base_version": version,
            "ops": [{"type": "insert", "position": end, "text": text}],
        });
        sandbox.run(&["edit", &payload.to_string()]);
    }
    assert_eq!(sandbox.json(&["blocks"]).as_array().unwrap().len(), 3);

    let today = chrono::Local::now().date_naive().format("%Y-%m-%d").to_string();
    assert_eq!(sandbox.run(&["log", &today]), "one two three\n");
    assert_eq!(sandbox.run(&["log", "1999-12-31"]), "");
    assert!(sandbox.run_with_input(&["log", "last tuesday"], "").is_err());

    let report = sandbox.json(&["compact", "--max-block-chars", "8"]);
    assert_eq!(report["blocks_before"], 3);
    assert_eq!(report["blocks_after"], 2);
    assert_eq!(sandbox.run(&["show"]), "one two three\n");
}

#[test]
fn config_file_supplies_timeline_path() {
    let sandbox = Sandbox::new();
    let timeline = sandbox.path().join("from-config.json");
    let config = sandbox.path().join("sightline.ron");
    std::fs::write(
        &config,
        format!("(timeline_path: Some({:?}))", timeline.display().to_string()),
    )
    .unwrap();

    let cli = Cli::try_parse_from([
        "sightline",
        "--config",
        config.to_str().unwrap(),
        "intern",
        "home",
    ])
    .unwrap();
    execute(cli, io::empty(), io::sink()).unwrap();
    assert!(timeline.exists());
}

#[test]
fn import_writes_snapshot() {
    let sandbox = Sandbox::new();
    let vault = sandbox.path().join("vault");
    std::fs::create_dir_all(vault.join("journal")).unwrap();
    std::fs::create_dir_all(vault.join("projects")).unwrap();
    std::fs::write(vault.join("journal/March 1, 2024.md"), "spring\n").unwrap();

    let output = sandbox.path().join("timeline.json");
    let summary = sandbox.json(&[
        "import",
        "--source",
        vault.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
    ]);
    assert_eq!(summary["blocks"], 1);

    assert_eq!(sandbox.run(&["show"]), "spring\n");
    assert_eq!(sandbox.run(&["log", "2024-03-01"]), "spring\n");
    assert_eq!(sandbox.json(&["search", "prefix", "type:journal"]), serde_json::json!([0]));
}
