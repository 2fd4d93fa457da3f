use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use assert_fs::TempDir;
use predicates::prelude::*;

const CMS_LOG_0: &str = "benchmark starting\n\
    iteration 1 done\n\
    young generation GC time 10.500 secs, 20 GC's, avg GC time 0.525\n\
    old generation GC time 2.000 secs, 4 GC's, avg GC time 0.500\n";

const CMS_LOG_1: &str = "benchmark starting\n\
    young generation GC time 12.500 secs, 30 GC's, avg GC time 0.417\n\
    old generation GC time 3.000 secs, 6 GC's, avg GC time 0.500\n";

const PARALLEL_OLD_LOG: &str = "benchmark starting\n\
    young generation GC time 8.000 secs\n\
    old generation GC time 1.500 secs\n";

const EVENTS_LOG: &str = "# demo trace\n\
    100 BORN tag=1 type=java/lang/String size=24 gc=0 site=App.main:3\n\
    150 BORN tag=2 type=java/lang/String size=24 gc=0 site=App.main:9\n\
    200 MOVED tag=1 gc=1\n\
    300 YEETED tag=1 gc=1\n\
    400 YEETED tag=2 gc=1\n\
    500 BORN tag=3 type=App size=16 gc=1\n";

/// Build `<root>/benchA/moreLogs/` with two CMS logs and one ParallelOld log.
fn setup_bench_root(tmp: &TempDir) -> PathBuf {
    let root = tmp.path().join("root");
    let logs = root.join("benchA").join("moreLogs");
    fs::create_dir_all(&logs).unwrap();
    fs::write(logs.join("gc_ConcMarkSweep.log.0"), CMS_LOG_0).unwrap();
    fs::write(logs.join("gc_ConcMarkSweep.log.1"), CMS_LOG_1).unwrap();
    fs::write(logs.join("gc_ParallelOld.log.0"), PARALLEL_OLD_LOG).unwrap();
    root
}

fn write_events_log(tmp: &TempDir) -> PathBuf {
    let path = tmp.path().join("app.events.log");
    fs::write(&path, EVENTS_LOG).unwrap();
    path
}

/// Run `gcstats lifetimes` to produce the CSV the downstream commands read.
fn write_lifetimes_csv(tmp: &TempDir) -> PathBuf {
    let log = write_events_log(tmp);
    let csv = tmp.path().join("lifetimes.csv");
    gcstats_cmd(tmp)
        .arg("lifetimes")
        .arg(&log)
        .arg("-o")
        .arg(&csv)
        .assert()
        .success();
    csv
}

fn gcstats_cmd(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("gcstats").unwrap();
    cmd.current_dir(tmp.path());
    cmd.env("NO_COLOR", "1");
    cmd
}

// ---- list ----

#[test]
fn list_shows_runs_and_groups() {
    let tmp = TempDir::new().unwrap();
    let root = setup_bench_root(&tmp);

    gcstats_cmd(&tmp)
        .arg("list")
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("Benchmark runs:"))
        .stdout(predicate::str::contains("benchA"))
        .stdout(predicate::str::contains("3 logs in 2 groups"))
        .stdout(predicate::str::contains("gc_ConcMarkSweep, gc_ParallelOld"));
}

#[test]
fn list_json_is_valid() {
    let tmp = TempDir::new().unwrap();
    let root = setup_bench_root(&tmp);

    let output = gcstats_cmd(&tmp)
        .arg("list")
        .arg(&root)
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value =
        serde_json::from_str(&stdout).expect("list --json should print valid JSON");
    let runs = parsed.as_array().unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0]["name"], "benchA");
    assert_eq!(runs[0]["logs"], 3);
    assert_eq!(runs[0]["groups"].as_array().unwrap().len(), 2);
}

#[test]
fn list_missing_root_errors() {
    let tmp = TempDir::new().unwrap();

    gcstats_cmd(&tmp)
        .arg("list")
        .arg("/nonexistent/bench/root")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No benchmark root"));
}

#[test]
fn list_empty_root_errors() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("empty");
    fs::create_dir_all(&root).unwrap();

    gcstats_cmd(&tmp)
        .arg("list")
        .arg(&root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No benchmark runs"));
}

#[test]
fn list_custom_logs_dir() {
    let tmp = TempDir::new().unwrap();
    let logs = tmp.path().join("root").join("bench").join("logs");
    fs::create_dir_all(&logs).unwrap();
    fs::write(logs.join("gc_G1.log.0"), "x").unwrap();

    gcstats_cmd(&tmp)
        .arg("list")
        .arg(tmp.path().join("root"))
        .args(["--logs-dir", "logs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gc_G1"));
}

// ---- pauses ----

#[test]
fn pauses_writes_expected_csv() {
    let tmp = TempDir::new().unwrap();
    let root = setup_bench_root(&tmp);
    let out_dir = tmp.path().join("out");

    gcstats_cmd(&tmp)
        .arg("pauses")
        .arg(&root)
        .arg("--out-dir")
        .arg(&out_dir)
        .assert()
        .success();

    let csv = fs::read_to_string(out_dir.join("gc_stats_benchA.csv")).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "algorithm,logs,young_total_secs,young_gcs,young_avg_secs,old_total_secs,old_gcs,old_avg_secs"
    );
    // Means across the two CMS logs: (10.5+12.5)/2, (20+30)/2, ...
    assert!(lines.next().unwrap().starts_with("gc_ConcMarkSweep,2,11.5,25.0,"));
    // Short-form collector: totals only, counts empty.
    assert_eq!(lines.next().unwrap(), "gc_ParallelOld,1,8.0,,,1.5,,");
}

#[test]
fn pauses_warns_about_groups_without_summaries() {
    let tmp = TempDir::new().unwrap();
    let root = setup_bench_root(&tmp);
    fs::write(
        root.join("benchA").join("moreLogs").join("gc_Broken.log.0"),
        "crashed before the summary\n",
    )
    .unwrap();

    gcstats_cmd(&tmp)
        .arg("pauses")
        .arg(&root)
        .arg("--out-dir")
        .arg(tmp.path().join("out"))
        .assert()
        .success()
        .stderr(predicate::str::contains("gc_Broken"));
}

#[test]
fn pauses_without_any_summaries_errors() {
    let tmp = TempDir::new().unwrap();
    let logs = tmp.path().join("root").join("bench").join("moreLogs");
    fs::create_dir_all(&logs).unwrap();
    fs::write(logs.join("gc_Serial.log.0"), "no summary here\n").unwrap();

    gcstats_cmd(&tmp)
        .arg("pauses")
        .arg(tmp.path().join("root"))
        .arg("--out-dir")
        .arg(tmp.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No GC summary lines matched"));
}

// ---- lifetimes ----

#[test]
fn lifetimes_writes_csv_to_stdout() {
    let tmp = TempDir::new().unwrap();
    let log = write_events_log(&tmp);

    gcstats_cmd(&tmp)
        .arg("lifetimes")
        .arg(&log)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "tag,type,size,site,born_at,last_moved_at,died_at,born_gc,died_gc,moves,lifetime",
        ))
        .stdout(predicate::str::contains(
            "1,java/lang/String,24,App.main:3,100,200,300,0,1,1,200",
        ))
        .stdout(predicate::str::contains(
            "2,java/lang/String,24,App.main:9,150,,400,0,1,0,250",
        ))
        .stderr(predicate::str::contains(
            "7 lines, 6 events, 2 completed, 0 orphans, 1 leaked, 0 malformed",
        ));
}

#[test]
fn lifetimes_writes_csv_to_file() {
    let tmp = TempDir::new().unwrap();
    let csv = write_lifetimes_csv(&tmp);

    let text = fs::read_to_string(&csv).unwrap();
    assert_eq!(text.lines().count(), 3); // header + two completed objects
}

#[test]
fn lifetimes_missing_log_errors() {
    let tmp = TempDir::new().unwrap();

    gcstats_cmd(&tmp)
        .arg("lifetimes")
        .arg("/nonexistent/app.events.log")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

// ---- summary ----

#[test]
fn summary_prints_table() {
    let tmp = TempDir::new().unwrap();
    let csv = write_lifetimes_csv(&tmp);

    gcstats_cmd(&tmp)
        .arg("summary")
        .arg(&csv)
        .args(["--min-objects", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("java/lang/String"))
        .stdout(predicate::str::contains("225.0"))
        .stdout(predicate::str::contains("Type"))
        .stdout(predicate::str::contains("Count"));
}

#[test]
fn summary_json_is_valid() {
    let tmp = TempDir::new().unwrap();
    let csv = write_lifetimes_csv(&tmp);

    let output = gcstats_cmd(&tmp)
        .arg("summary")
        .arg(&csv)
        .args(["--min-objects", "1", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let groups = parsed.as_array().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["type"], "java/lang/String");
    assert_eq!(groups[0]["count"], 2);
    assert_eq!(groups[0]["mean_lifetime"], 225.0);
    assert_eq!(groups[0]["min_lifetime"], 200);
    assert_eq!(groups[0]["max_lifetime"], 250);
}

#[test]
fn summary_by_site_splits_groups() {
    let tmp = TempDir::new().unwrap();
    let csv = write_lifetimes_csv(&tmp);

    let output = gcstats_cmd(&tmp)
        .arg("summary")
        .arg(&csv)
        .args(["--min-objects", "1", "--by-site", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 2);
}

#[test]
fn summary_writes_csv_file() {
    let tmp = TempDir::new().unwrap();
    let csv = write_lifetimes_csv(&tmp);
    let out = tmp.path().join("summary.csv");

    gcstats_cmd(&tmp)
        .arg("summary")
        .arg(&csv)
        .args(["--min-objects", "1"])
        .arg("--csv")
        .arg(&out)
        .assert()
        .success();

    let text = fs::read_to_string(&out).unwrap();
    assert!(text.starts_with("type,site,count,mean_lifetime,min_lifetime,max_lifetime"));
    assert!(text.contains("java/lang/String,,2,225.0,200,250"));
}

#[test]
fn summary_default_threshold_filters_everything() {
    let tmp = TempDir::new().unwrap();
    let csv = write_lifetimes_csv(&tmp);

    // Two objects never reach the default threshold of 1000.
    gcstats_cmd(&tmp)
        .arg("summary")
        .arg(&csv)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No group reaches 1000"))
        .stderr(predicate::str::contains("largest has 2"));
}

#[test]
fn summary_empty_table_errors() {
    let tmp = TempDir::new().unwrap();
    let csv = tmp.path().join("empty.csv");
    fs::write(
        &csv,
        "tag,type,size,site,born_at,last_moved_at,died_at,born_gc,died_gc,moves,lifetime\n",
    )
    .unwrap();

    gcstats_cmd(&tmp)
        .arg("summary")
        .arg(&csv)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No lifetime rows"));
}

#[test]
fn summary_config_file_supplies_threshold() {
    let tmp = TempDir::new().unwrap();
    let csv = write_lifetimes_csv(&tmp);
    let config = tmp.path().join("gcstats.toml");
    fs::write(&config, "[summary]\nmin_objects = 1\n").unwrap();

    // Picked up from ./gcstats.toml without --min-objects.
    gcstats_cmd(&tmp)
        .arg("summary")
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("java/lang/String"));
}

#[test]
fn summary_bad_config_errors() {
    let tmp = TempDir::new().unwrap();
    let csv = write_lifetimes_csv(&tmp);
    let config = tmp.path().join("custom.toml");
    fs::write(&config, "[summary\nbroken").unwrap();

    gcstats_cmd(&tmp)
        .arg("--config")
        .arg(&config)
        .arg("summary")
        .arg(&csv)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config"));
}

// ---- plot ----

#[test]
#[ignore = "font rendering not available in every test environment"]
fn plot_writes_three_charts() {
    let tmp = TempDir::new().unwrap();
    let csv = write_lifetimes_csv(&tmp);
    let out_dir = tmp.path().join("charts");

    gcstats_cmd(&tmp)
        .arg("plot")
        .arg(&csv)
        .args(["--min-objects", "1"])
        .arg("--out-dir")
        .arg(&out_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved 3 charts"));

    for name in ["mean_lifetimes.png", "min_lifetimes.png", "max_lifetimes.png"] {
        assert!(out_dir.join(name).exists(), "missing {name}");
    }
}

#[test]
fn plot_threshold_failure_renders_nothing() {
    let tmp = TempDir::new().unwrap();
    let csv = write_lifetimes_csv(&tmp);
    let out_dir = tmp.path().join("charts");

    gcstats_cmd(&tmp)
        .arg("plot")
        .arg(&csv)
        .arg("--out-dir")
        .arg(&out_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No group reaches"));

    assert!(!out_dir.join("mean_lifetimes.png").exists());
}
