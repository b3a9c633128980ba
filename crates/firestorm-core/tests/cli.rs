//! End-to-end tests for the `firestorm` binary.
//!
//! Every run gets its own config file so the host's XDG or system config
//! never leaks in.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::path::PathBuf;
use tempfile::TempDir;

fn firestorm() -> Command {
    Command::cargo_bin("firestorm").expect("firestorm binary should exist")
}

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let fixture = Fixture {
            dir: TempDir::new().expect("temp dir"),
        };
        fixture.write("engine.json", &json!({ "timezone_offset_minutes": 60 }));
        fixture
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write(&self, name: &str, value: &Value) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, value.to_string()).expect("write fixture");
        path
    }

    /// `counts[h]` German retweets in hour `h` of 2021-04-13 (UTC+1).
    fn records(&self, counts: &[usize]) -> PathBuf {
        let mut records = Vec::new();
        for (h, &count) in counts.iter().enumerate() {
            for k in 0..count {
                let minute = k * 59 / count.max(1);
                let (day, hour) = (13 + h / 24, h % 24);
                records.push(json!({
                    "id": records.len() + 1,
                    "created_at": format!("2021-04-{:02}T{:02}:{:02}:00+01:00", day, hour, minute),
                    "lang": "de",
                    "tweet_type": "retweet without comment",
                    "user_type": "laggard",
                    "is_offensive": k % 2 == 0,
                }));
            }
        }
        self.write("records.json", &Value::Array(records))
    }

    fn command(&self) -> Command {
        let mut cmd = firestorm();
        cmd.env_remove("FIRESTORM_CONFIG")
            .env_remove("FIRESTORM_CONFIG_DIR")
            .env_remove("FIRESTORM_LOG")
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(self.path("engine.json"));
        cmd
    }

    fn run_json(&self, args: &[&str]) -> Value {
        let output = self.command().args(args).output().expect("run firestorm");
        assert!(
            output.status.success(),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("stdout is JSON")
    }
}

fn burst() -> Vec<usize> {
    let mut counts = vec![5; 12];
    counts.extend([150; 6]);
    counts.extend([180; 6]);
    counts.extend([10; 24]);
    counts
}

// ============================================================================
// Successful runs
// ============================================================================

mod success {
    use super::*;

    #[test]
    fn rates_emits_dense_rows() {
        let fx = Fixture::new();
        let records = fx.records(&[2, 0, 3]);
        let out = fx.run_json(&["rates", "--records", records.to_str().unwrap()]);

        assert_eq!(out["command"], "rates");
        assert!(out["run_id"].as_str().unwrap().starts_with("run-"));
        let result = &out["result"];
        assert_eq!(result["intervals"], 24);
        let rows = result["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 24);
        assert_eq!(rows[0]["hour"], "2021-04-13T00:00:00+01:00");
        assert_eq!(rows[0]["total_tweets"], 2);
        assert_eq!(rows[1]["total_tweets"], 0);
        assert_eq!(rows[2]["retweet_pct"], 1.0);
        assert_eq!(rows[2]["total_tweets_pct"], 1.0);
        assert_eq!(result["zone"], "+01:00");
        // a single day is too short for a trend
        assert_eq!(result["count_trend"], Value::Null);
    }

    #[test]
    fn rates_default_to_berlin_time() {
        let fx = Fixture::new();
        fx.write("engine.json", &json!({}));
        let records = fx.records(&[2, 0, 3]);
        let out = fx.run_json(&["rates", "--records", records.to_str().unwrap()]);

        let result = &out["result"];
        assert_eq!(result["zone"], "Europe/Berlin");
        let rows = result["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 24);
        assert_eq!(rows[0]["hour"], "2021-04-13T00:00:00+02:00");
        assert_eq!(rows[0]["total_tweets"], 0);
        assert_eq!(rows[1]["total_tweets"], 2);
        assert_eq!(rows[3]["total_tweets"], 3);
    }

    #[test]
    fn six_hour_granularity() {
        let fx = Fixture::new();
        let records = fx.records(&[1; 30]);
        let out = fx.run_json(&[
            "rates",
            "--records",
            records.to_str().unwrap(),
            "--granularity",
            "six-hour",
        ]);
        let rows = out["result"]["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 8);
        assert_eq!(rows[0]["total_tweets"], 6);
        assert_eq!(rows[4]["total_tweets"], 6);
        assert_eq!(rows[5]["total_tweets"], 0);
        let trend = out["result"]["count_trend"].as_array().unwrap();
        assert_eq!(trend.len(), 4);
    }

    #[test]
    fn window_finds_burst() {
        let fx = Fixture::new();
        let records = fx.records(&burst());
        let out = fx.run_json(&["window", "--records", records.to_str().unwrap()]);
        let window = &out["result"];
        assert_eq!(window["threshold"], 100.0);
        assert_eq!(window["start_index"], 12);
        assert_eq!(window["end_index"], 24);
        assert_eq!(window["start"], "2021-04-13T12:00:00+01:00");
        assert_eq!(window["end"], "2021-04-14T00:00:00+01:00");
    }

    #[test]
    fn window_threshold_override() {
        let fx = Fixture::new();
        let records = fx.records(&burst());
        let out = fx.run_json(&[
            "window",
            "--records",
            records.to_str().unwrap(),
            "--min-threshold",
            "500",
        ]);
        assert!(out["result"]["start"].is_null());
        assert!(out["result"]["end"].is_null());
    }

    #[test]
    fn phases_of_uniform_mix() {
        let fx = Fixture::new();
        let records = fx.records(&[4; 24]);
        let out = fx.run_json(&["phases", "--records", records.to_str().unwrap()]);
        let result = &out["result"];
        assert_eq!(result["penalty"], 3.0);
        assert_eq!(result["breakpoints"].as_array().unwrap().len(), 0);
        let phases = result["phases"].as_array().unwrap();
        assert_eq!(phases.len(), 1);
        assert_eq!(phases[0]["count"], 96);
    }

    #[test]
    fn summary_of_catalogued_firestorm() {
        let fx = Fixture::new();
        let records = fx.records(&burst());
        let catalog = fx.write(
            "catalog.json",
            &json!({
                "storm": {
                    "query": "#storm",
                    "data_start_date": "2021-04-13",
                    "data_end_date": "2021-04-14",
                    "true_start_date": "2021-04-13",
                    "true_end_date": "2021-04-13",
                }
            }),
        );
        let out = fx.run_json(&[
            "summary",
            "--records",
            records.to_str().unwrap(),
            "--catalog",
            catalog.to_str().unwrap(),
            "--key",
            "storm",
        ]);
        let result = &out["result"];
        assert_eq!(result["key"], "storm");
        assert_eq!(result["query"], "#storm");
        let log = result["filtering_lengths_log"].as_array().unwrap();
        assert_eq!(log.first(), Some(&json!(2280)));
        // the second day falls outside the true range
        assert_eq!(log.last(), Some(&json!(2040)));
        assert_eq!(result["length"], 2040);
        assert_eq!(result["true_end"], "2021-04-14T00:00:00+01:00");
        // odd hourly counts label one extra record offensive
        assert_eq!(result["aggr_value_counts"]["true"], 1026);
        assert_eq!(result["average_aggressiveness"], 50.29);
    }

    #[test]
    fn config_snapshot_is_reported() {
        let fx = Fixture::new();
        let records = fx.records(&[1]);
        let out = fx.run_json(&["rates", "--records", records.to_str().unwrap()]);
        let snapshot = &out["config"];
        assert_eq!(snapshot["config_source"], "CLI argument");
        assert_eq!(snapshot["config_hash"].as_str().unwrap().len(), 64);
        assert_eq!(snapshot["summary"]["timezone"], "+01:00");
    }
}

// ============================================================================
// Failures and exit codes
// ============================================================================

mod failures {
    use super::*;

    #[test]
    fn unknown_command_is_args_error() {
        firestorm()
            .arg("nonexistent-command")
            .assert()
            .code(10)
            .stderr(predicate::str::contains("error"));
    }

    #[test]
    fn invalid_granularity_is_args_error() {
        let fx = Fixture::new();
        let records = fx.records(&[1]);
        fx.command()
            .args(["rates", "--records", records.to_str().unwrap()])
            .args(["--granularity", "daily"])
            .assert()
            .code(10);
    }

    #[test]
    fn help_is_clean() {
        firestorm()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("rates"));
    }

    #[test]
    fn missing_records_is_io_error() {
        let fx = Fixture::new();
        fx.command()
            .args(["rates", "--records"])
            .arg(fx.path("absent.json"))
            .assert()
            .code(12)
            .stderr(predicate::str::contains("\"status\": \"error\""));
    }

    #[test]
    fn unparseable_timestamp_is_reported_as_such() {
        let fx = Fixture::new();
        let path = fx.write(
            "records.json",
            &json!([{ "id": 1, "created_at": "yesterday", "lang": "de" }]),
        );
        fx.command()
            .args(["rates", "--records"])
            .arg(&path)
            .assert()
            .code(12)
            .stderr(predicate::str::contains("invalid timestamp"))
            .stderr(predicate::str::contains("configuration error").not());
    }

    #[test]
    fn malformed_records_is_io_error() {
        let fx = Fixture::new();
        let path = fx.path("records.json");
        std::fs::write(&path, "[{\"id\": 1}").unwrap();
        fx.command()
            .args(["rates", "--records"])
            .arg(&path)
            .assert()
            .code(12);
    }

    #[test]
    fn empty_records_is_data_error() {
        let fx = Fixture::new();
        let records = fx.records(&[]);
        fx.command()
            .args(["window", "--records"])
            .arg(&records)
            .assert()
            .code(13);
    }

    #[test]
    fn invalid_config_is_config_error() {
        let fx = Fixture::new();
        fx.write("engine.json", &json!({ "window": { "factor": 2.5 } }));
        let records = fx.records(&[1]);
        fx.command()
            .args(["rates", "--records"])
            .arg(&records)
            .assert()
            .code(11)
            .stderr(predicate::str::contains("factor"));
    }

    #[test]
    fn missing_config_file_is_io_error() {
        let fx = Fixture::new();
        let records = fx.records(&[1]);
        firestorm()
            .arg("--config")
            .arg(fx.path("nope.json"))
            .args(["rates", "--records"])
            .arg(&records)
            .assert()
            .code(12)
            .stderr(predicate::str::contains("ERR_IO"));
    }

    #[test]
    fn missing_catalog_file_is_io_error() {
        let fx = Fixture::new();
        let records = fx.records(&[1]);
        fx.command()
            .args(["summary", "--records"])
            .arg(&records)
            .arg("--catalog")
            .arg(fx.path("catalog.json"))
            .args(["--key", "storm"])
            .assert()
            .code(12);
    }

    #[test]
    fn unknown_catalog_key_is_config_error() {
        let fx = Fixture::new();
        let records = fx.records(&[1]);
        let catalog = fx.write("catalog.json", &json!({}));
        fx.command()
            .args(["summary", "--records"])
            .arg(&records)
            .arg("--catalog")
            .arg(&catalog)
            .args(["--key", "missing"])
            .assert()
            .code(11);
    }

    #[test]
    fn negative_penalty_is_config_error() {
        let fx = Fixture::new();
        let records = fx.records(&[2; 24]);
        fx.command()
            .args(["phases", "--records"])
            .arg(&records)
            .args(["--penalty=-1"])
            .assert()
            .code(11);
    }
}
