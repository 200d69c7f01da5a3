use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, Output},
    time::{SystemTime, UNIX_EPOCH},
};

use serde_json::Value;

fn unique_state_path(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    std::env::temp_dir()
        .join(format!("bloomctl_cli_{tag}_{nanos}"))
        .join("session.json")
}

fn bloomctl(state: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bloomctl"))
        .args(args)
        .env("BLOOM_STATE_PATH", state)
        .output()
        .expect("run bloomctl")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn show_json(state: &Path) -> Value {
    let out = bloomctl(state, &["show", "--json"]);
    assert!(out.status.success());
    serde_json::from_slice(&out.stdout).expect("show --json prints JSON")
}

fn cleanup(state: &Path) {
    if let Some(dir) = state.parent() {
        let _ = fs::remove_dir_all(dir);
    }
}

/// Finds an adjacent pair whose swap forms a run, and one whose swap forms
/// nothing, from the glyph rows `show --json` prints.
fn find_pairs(rows: &[String]) -> (Option<[usize; 4]>, Option<[usize; 4]>) {
    let cells: Vec<Vec<char>> = rows.iter().map(|r| r.chars().collect()).collect();
    let n = cells.len();
    let has_run = |g: &Vec<Vec<char>>| {
        (0..n).any(|r| (0..n.saturating_sub(2)).any(|c| g[r][c] == g[r][c + 1] && g[r][c] == g[r][c + 2]))
            || (0..n.saturating_sub(2)).any(|r| (0..n).any(|c| g[r][c] == g[r + 1][c] && g[r][c] == g[r + 2][c]))
    };
    let mut good = None;
    let mut dud = None;
    for r in 0..n {
        for c in 0..n {
            for (r2, c2) in [(r, c + 1), (r + 1, c)] {
                if r2 >= n || c2 >= n {
                    continue;
                }
                let mut g = cells.clone();
                let t = g[r][c];
                g[r][c] = g[r2][c2];
                g[r2][c2] = t;
                let slot = if has_run(&g) { &mut good } else { &mut dud };
                if slot.is_none() {
                    *slot = Some([r, c, r2, c2]);
                }
            }
        }
    }
    (good, dud)
}

#[test]
fn new_show_and_swaps_report_through_exit_codes() {
    let state = unique_state_path("flow");
    let out = bloomctl(&state, &["new", "--seed", "42", "--size", "6", "--symbols", "4"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(stdout(&out).contains("seed 42"));

    let view = show_json(&state);
    assert_eq!(view["seed"], 42);
    assert_eq!(view["score"], 0);
    let rows: Vec<String> = serde_json::from_value(view["grid"].clone()).unwrap();
    assert_eq!(rows.len(), 6);

    let (good, dud) = find_pairs(&rows);
    let dud = dud.expect("some swap forms nothing");
    let args: Vec<String> = dud.iter().map(|v| v.to_string()).collect();
    let mut cmd = vec!["swap"];
    cmd.extend(args.iter().map(String::as_str));
    let out = bloomctl(&state, &cmd);
    assert!(out.status.success());
    assert!(stdout(&out).contains("rejected"));
    assert_eq!(show_json(&state)["grid"], view["grid"]);

    if let Some(good) = good {
        let args: Vec<String> = good.iter().map(|v| v.to_string()).collect();
        let mut cmd = vec!["swap"];
        cmd.extend(args.iter().map(String::as_str));
        let out = bloomctl(&state, &cmd);
        assert!(out.status.success());
        assert!(stdout(&out).contains("accepted"));
        assert!(show_json(&state)["score"].as_u64().unwrap() >= 100);
    }

    cleanup(&state);
}

#[test]
fn malformed_input_exits_with_one() {
    let state = unique_state_path("bad");
    assert_eq!(bloomctl(&state, &["show"]).status.code(), Some(1));

    let out = bloomctl(&state, &["new", "--seed", "1"]);
    assert!(out.status.success());

    assert_eq!(bloomctl(&state, &["swap", "0", "0", "0", "9"]).status.code(), Some(1));
    assert_eq!(bloomctl(&state, &["swap", "0", "0", "2", "0"]).status.code(), Some(1));
    assert_eq!(bloomctl(&state, &["swap", "0", "0"]).status.code(), Some(1));
    assert_eq!(bloomctl(&state, &["swap", "a", "0", "0", "1"]).status.code(), Some(1));
    for size in ["65", "4294967296"] {
        let out = bloomctl(&state, &["new", "--size", size]);
        assert_eq!(out.status.code(), Some(1), "--size {size}");
        assert!(String::from_utf8_lossy(&out.stderr).contains("gridSize"));
    }
    let out = bloomctl(&state, &["new", "--symbols", "2"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).starts_with("ERROR:"));

    cleanup(&state);
}

#[test]
fn finish_and_history() {
    let state = unique_state_path("finish");
    assert!(bloomctl(&state, &["new", "--seed", "3"]).status.success());
    assert!(bloomctl(&state, &["pause"]).status.success());
    assert_eq!(bloomctl(&state, &["swap", "0", "0", "0", "1"]).status.code(), Some(1));
    assert!(bloomctl(&state, &["resume"]).status.success());

    let out = bloomctl(&state, &["finish", "--json"]);
    assert!(out.status.success());
    let summary: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(summary["score"], 0);
    assert_eq!(summary["swapsAccepted"], 0);

    let out = bloomctl(&state, &["history"]);
    assert!(out.status.success());
    let text = stdout(&out);
    assert_eq!(text.lines().filter(|l| l.contains("score")).count(), 4);
    assert!(text.lines().last().unwrap().starts_with('*'));

    assert!(bloomctl(&state, &["rewind", "2"]).status.success());
    assert_eq!(show_json(&state)["frame"], 1);
    assert_eq!(show_json(&state)["playing"], false);

    cleanup(&state);
}
