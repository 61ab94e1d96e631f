use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_data: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
    events_path: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_data = base.join("xdg-data");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_data).expect("failed to create XDG_DATA_HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        let events_path = base.join("events.jsonl");
        seed_event_fixture(&events_path);

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_data,
            xdg_config,
            xdg_state,
            events_path,
        }
    }
}

/// Five food orders around noon across five days, plus one corrupt line.
fn seed_event_fixture(path: &Path) {
    let mut file = fs::File::create(path).expect("failed to create event fixture");
    let times = [
        "2025-03-01T12:00:00Z",
        "2025-03-02T12:10:00Z",
        "2025-03-03T12:05:00Z",
        "2025-03-04T11:55:00Z",
        "2025-03-05T12:15:00Z",
    ];
    for ts in times {
        writeln!(
            file,
            r#"{{"user_id":"u-1","event_type":"food_ordered","timestamp":"{ts}","metadata":{{}}}}"#
        )
        .expect("failed to write fixture line");
    }
    writeln!(file, "{{not valid json").expect("failed to write fixture line");
}

fn run_nudge(env: &CliTestEnv, args: &[&str]) -> Output {
    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("nudge"));

    Command::new(bin_path)
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_DATA_HOME", &env.xdg_data)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .output()
        .unwrap_or_else(|e| panic!("failed to execute nudge: {e}"))
}

fn assert_success(args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let rendered_args = args
        .iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "nudge {rendered_args} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        output.status, stdout, stderr
    );
}

#[test]
fn analyze_reports_patterns_and_tolerates_corrupt_lines() {
    let env = CliTestEnv::new();
    let events = env.events_path.to_string_lossy().into_owned();

    let args = ["analyze", events.as_str()];
    let output = run_nudge(&env, &args);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("pattern(s) in 5 event(s)"),
        "expected pattern summary in stdout, got:\n{stdout}"
    );
    assert!(stdout.contains("food_ordered"));

    // The corrupt sixth line lands in stderr, not a failure.
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("warning"), "expected warning, got:\n{stderr}");
}

#[test]
fn analyze_emits_machine_readable_json() {
    let env = CliTestEnv::new();
    let events = env.events_path.to_string_lossy().into_owned();

    let args = ["analyze", events.as_str(), "--format", "json"];
    let output = run_nudge(&env, &args);
    assert_success(&args, &output);

    let patterns: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON");
    let patterns = patterns.as_array().expect("expected a JSON array");
    assert!(!patterns.is_empty());
    for p in patterns {
        let confidence = p["confidence"].as_f64().expect("confidence field");
        assert!((0.0..=1.0).contains(&confidence));
    }
}

#[test]
fn suggest_surfaces_ranked_suggestions() {
    let env = CliTestEnv::new();
    let events = env.events_path.to_string_lossy().into_owned();

    let args = ["suggest", events.as_str(), "--user", "u-1", "--format", "json"];
    let output = run_nudge(&env, &args);
    assert_success(&args, &output);

    let suggestions: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON");
    let suggestions = suggestions.as_array().expect("expected a JSON array");
    assert!(!suggestions.is_empty());
    assert!(suggestions.len() <= 3);
    for s in suggestions {
        let score = s["relevance_score"].as_f64().expect("relevance_score field");
        assert!((0.0..=1.0).contains(&score));
        assert!(s["id"].as_str().is_some());
    }
}

#[test]
fn analyze_defaults_to_the_data_dir_export() {
    let env = CliTestEnv::new();
    // Seed the default export location instead of passing a path.
    let default_dir = env.xdg_data.join("nudge");
    fs::create_dir_all(&default_dir).expect("failed to create data dir");
    seed_event_fixture(&default_dir.join("events.jsonl"));

    let args = ["analyze"];
    let output = run_nudge(&env, &args);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("pattern(s) in 5 event(s)"),
        "expected pattern summary from the default export, got:\n{stdout}"
    );
}

#[test]
fn unknown_user_filter_yields_empty_results() {
    let env = CliTestEnv::new();
    let events = env.events_path.to_string_lossy().into_owned();

    let args = ["suggest", events.as_str(), "--user", "nobody"];
    let output = run_nudge(&env, &args);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("No suggestions"),
        "expected empty-result message, got:\n{stdout}"
    );
}
