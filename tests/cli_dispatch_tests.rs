use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_kingmaker")
}

fn unique_temp_path(name: &str, extension: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("kingmaker-{name}-{stamp}.{extension}"))
}

#[test]
fn no_command_prints_usage() {
    let output = Command::new(bin()).output().expect("binary should run");
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("usage: kingmaker"));
}

#[test]
fn import_without_path_is_a_usage_error() {
    let output = Command::new(bin())
        .arg("import")
        .output()
        .expect("import should run");
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("usage: kingmaker import"));
}

#[test]
fn import_then_validate_round_trips() {
    let csv_path = unique_temp_path("scouting", "csv");
    let roster_path = unique_temp_path("roster", "json");
    fs::write(
        &csv_path,
        "team,team_name,qual_rank,match,auto_low,teleop_high,endgame\n\
         118,Robonauts,1,1,2,6,deep\n\
         148,Robowranglers,2,1,1,5,shallow\n",
    )
    .expect("write scouting csv");

    let output = Command::new(bin())
        .args(["import", csv_path.to_str().unwrap(), roster_path.to_str().unwrap()])
        .output()
        .expect("import should run");
    assert_eq!(output.status.code(), Some(0));
    let report: serde_json::Value =
        serde_json::from_str(&String::from_utf8_lossy(&output.stdout)).expect("report json");
    assert_eq!(report["imported_rows"], 2);
    assert_eq!(report["teams_touched"], 2);

    let output = Command::new(bin())
        .args(["validate", roster_path.to_str().unwrap()])
        .output()
        .expect("validate should run");
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2 teams checked"));

    let _ = fs::remove_file(csv_path);
    let _ = fs::remove_file(roster_path);
}

#[test]
fn simulate_runs_against_an_imported_roster() {
    let csv_path = unique_temp_path("scouting-sim", "csv");
    let roster_path = unique_temp_path("roster-sim", "json");
    let mut rows = String::from("team,qual_rank,match,teleop_high,teleop_mid,endgame\n");
    for team in 1..=6u32 {
        for m in 1..=3u32 {
            rows.push_str(&format!("{team},{team},{m},{},1,park\n", 7 - team));
        }
    }
    fs::write(&csv_path, rows).expect("write scouting csv");

    let output = Command::new(bin())
        .args(["import", csv_path.to_str().unwrap(), roster_path.to_str().unwrap()])
        .output()
        .expect("import should run");
    assert_eq!(output.status.code(), Some(0));

    let output = Command::new(bin())
        .env("KINGMAKER_ROSTER", roster_path.to_str().unwrap())
        .args(["simulate", "1", "2", "3", "4", "5", "6", "100", "7"])
        .output()
        .expect("simulate should run");
    assert_eq!(output.status.code(), Some(0));
    let summary: serde_json::Value =
        serde_json::from_str(&String::from_utf8_lossy(&output.stdout)).expect("summary json");
    assert_eq!(summary["trials"], 100);
    assert!(summary["red"]["win_rate"].is_number());
    assert!(summary["most_likely"]["winner"].is_string());

    let _ = fs::remove_file(csv_path);
    let _ = fs::remove_file(roster_path);
}
