//! End-to-end runs of the `dialogact` binary against temporary files.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

const STATES: usize = 55 * 55;
const ACTIONS: usize = 13;

fn workdir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("dialogact_cli_{name}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap_or_else(|e| panic!("failed to create {dir:?}: {e}"));
    dir
}

fn dialogact() -> Command {
    Command::cargo_bin("dialogact").unwrap_or_else(|e| panic!("binary not built: {e}"))
}

fn path_arg(path: &Path) -> &str {
    path.to_str()
        .unwrap_or_else(|| panic!("temporary path is not valid UTF-8: {path:?}"))
}

#[test]
fn init_writes_a_zero_table_and_refuses_to_overwrite() {
    let dir = workdir("init");
    let table = dir.join("models").join("qlearner");

    dialogact()
        .args(["init", "--table", path_arg(&table), "--explore", "50"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3025 states x 13 actions"));

    let text = fs::read_to_string(&table).expect("table written");
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("0.1,50,50"));
    let rows: Vec<&str> = lines.collect();
    assert_eq!(rows.len(), STATES);
    assert!(rows
        .iter()
        .all(|row| row.split(',').count() == ACTIONS && row.split(',').all(|v| v == "0.0")));

    dialogact()
        .args(["init", "--table", path_arg(&table)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    dialogact()
        .args(["init", "--table", path_arg(&table), "--gamma", "0.5", "--force"])
        .assert()
        .success();
    let text = fs::read_to_string(&table).expect("table rewritten");
    assert!(text.starts_with("0.5,1000,1000\n"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn init_rejects_a_degenerate_schedule() {
    let dir = workdir("degenerate");
    let table = dir.join("qlearner");
    dialogact()
        .args(["init", "--table", path_arg(&table), "--explore", "0"])
        .assert()
        .failure();
    assert!(!table.exists());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn chat_rates_persists_and_journals() {
    let dir = workdir("chat");
    let table = dir.join("qlearner");
    let journal = dir.join("ratings.jsonl");

    dialogact()
        .args([
            "chat",
            "--table",
            path_arg(&table),
            "--seed",
            "5",
            "--journal",
            path_arg(&journal),
        ])
        .write_stdin("zz: what\nqy: do you like cats?\nseven\n4\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("agent> <CONVENTIONAL_OPENING>"))
        .stdout(predicate::str::contains("\"zz\" is not a valid dialogue act tag code"))
        .stdout(predicate::str::contains("I am in state [NULL, QUESTION_YES_NO]"))
        .stdout(predicate::str::contains("Error: Please enter an integer between 1 and 5"))
        .stdout(predicate::str::contains("after 1 rated rounds"));

    let text = fs::read_to_string(&table).expect("table saved");
    assert!(text.starts_with("0.1,999,1000\n"));

    let sidecar = dir.join("qlearner.episode.json");
    let episode: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&sidecar).expect("episode saved"))
            .expect("episode is JSON");
    assert_eq!(episode["reward"], 4);

    let journal_text = fs::read_to_string(&journal).expect("journal written");
    let lines: Vec<&str> = journal_text.lines().collect();
    assert_eq!(lines.len(), 1);
    let record: serde_json::Value = serde_json::from_str(lines[0]).expect("record is JSON");
    assert_eq!(record["reward"], 4);
    assert_eq!(record["state"], "[NULL, QUESTION_YES_NO]");
    assert_eq!(record["explored"], true);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn chat_keeps_rated_rounds_when_input_ends_at_a_rating() {
    let dir = workdir("chat_eof");
    let table = dir.join("q");

    dialogact()
        .args(["chat", "--table", path_arg(&table), "--seed", "1"])
        .write_stdin("qy: cats?\n4\ns: two\n3\nqw: why\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("after 2 rated rounds"));

    let text = fs::read_to_string(&table).expect("table saved");
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("0.1,998,1000"));
    assert!(lines.any(|row| row.split(',').any(|v| v != "0.0")));

    // The third round's update was applied before its rating went missing,
    // so nothing is left pending.
    let sidecar = dir.join("q.episode.json");
    let episode: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&sidecar).expect("episode saved"))
            .expect("episode is JSON");
    assert!(episode.is_null());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn policy_lists_learned_states() {
    let dir = workdir("policy");
    let table = dir.join("qlearner");

    // One learned cell: state 5 prefers THANKS (column 9).
    let mut text = String::from("0.1,10,1000\n");
    for state in 0..STATES {
        let row: Vec<&str> = (0..ACTIONS)
            .map(|a| if state == 5 && a == 9 { "2.5" } else { "0.0" })
            .collect();
        text.push_str(&row.join(","));
        text.push('\n');
    }
    fs::write(&table, text).expect("table written");

    dialogact()
        .args(["policy", "--table", path_arg(&table), "--learned"])
        .assert()
        .success()
        .stdout(predicate::eq("5\t[ABOUT_COMMUNICATION, ACTION_DIRECTIVE]\tTHANKS\t2.5000\n"));

    let output = dialogact()
        .args(["policy", "--table", path_arg(&table), "--json"])
        .output()
        .expect("ran");
    assert!(output.status.success());
    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).expect("JSON");
    assert_eq!(entries.as_array().map(Vec::len), Some(STATES));
    assert_eq!(entries[0]["action"], "APOLOGY");
    assert_eq!(entries[5]["visited"], true);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn policy_reports_a_truncated_table() {
    let dir = workdir("truncated");
    let table = dir.join("qlearner");
    fs::write(&table, "0.1,10,1000\n0.0,0.0\n").expect("table written");

    dialogact()
        .args(["policy", "--table", path_arg(&table)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 2"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn stats_summarizes_a_journal() {
    let dir = workdir("stats");
    let journal = dir.join("ratings.jsonl");
    fs::write(
        &journal,
        concat!(
            r#"{"ts":"2024-05-01T10:00:00Z","state_id":1807,"state":"[NULL, STATEMENT]","action":"THANKS","reward":5,"anneal":1.0,"explored":true}"#,
            "\n",
            r#"{"ts":"2024-05-01T10:01:00Z","state_id":1807,"state":"[NULL, STATEMENT]","action":"APOLOGY","reward":1,"anneal":0.9,"explored":true}"#,
            "\n",
            r#"{"ts":"2024-05-01T10:02:00Z","state_id":1811,"state":"[NULL, THANKS]","action":"THANKS","reward":3,"anneal":0.8,"explored":false}"#,
            "\n",
        ),
    )
    .expect("journal written");

    dialogact()
        .args(["stats", "--journal", path_arg(&journal)])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 ratings, mean reward 3.00"))
        .stdout(predicate::str::contains("THANKS\tn=2\tmean=4.00\tmin=3\tmax=5"))
        .stdout(predicate::str::contains("APOLOGY\tn=1"));

    let output = dialogact()
        .args(["stats", "--journal", path_arg(&journal), "--by", "state", "--json"])
        .output()
        .expect("ran");
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("JSON");
    assert_eq!(report["overall"]["count"], 3);
    assert_eq!(report["groups"]["[NULL, STATEMENT]"]["count"], 2);
    assert_eq!(report["groups"]["[NULL, THANKS]"]["max"], 3);

    let _ = fs::remove_dir_all(&dir);
}
