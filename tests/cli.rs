mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;

use common::{INFLUENCERS, POSTS, TRACKING, TestWorkspace};

fn command() -> Command {
    Command::cargo_bin("campaign-lens").expect("binary exists")
}

#[test]
fn report_renders_every_section() {
    let workspace = TestWorkspace::with_datasets();
    command()
        .args(["report", "--data-dir", workspace.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("== Overview =="))
        .stdout(contains("== ROAS & Campaign Performance =="))
        .stdout(contains("== Incremental ROAS =="))
        .stdout(contains("== Top Influencers (by ROAS) =="))
        .stdout(contains("== Average ROAS by Category =="))
        .stdout(contains("Total Revenue           1,250.00"))
        .stdout(contains("- Platforms: Instagram, Twitter, YouTube"));
}

#[test]
fn report_json_respects_filter_flags() {
    let workspace = TestWorkspace::with_datasets();
    let output = command()
        .args([
            "report",
            "--data-dir",
            workspace.path().to_str().unwrap(),
            "--platform",
            "Instagram",
            "--gender",
            "F",
            "--top",
            "1",
            "--format",
            "json",
        ])
        .output()
        .expect("run report");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(value["overview"]["influencers"], 2);
    assert_eq!(value["overview"]["platforms_selected"], 1);
    assert_eq!(value["roas"]["status"], "computed");
    let top = value["highlights"]["value"]["top"].as_array().unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0]["influencer_id"], "1");
    assert_eq!(top[0]["roas"], 2.0);
}

#[test]
fn config_file_supplies_paths_and_filters() {
    let workspace = TestWorkspace::with_datasets();
    let config = workspace.write(
        "run.yaml",
        &format!(
            "data:\n  data_dir: {}\nfilters:\n  campaigns: [Winter]\n",
            workspace.path().display()
        ),
    );
    command()
        .args(["report", "--config", config.to_str().unwrap(), "--format", "json"])
        .assert()
        .success()
        .stdout(contains("\"tracking_records\": 2"));
}

#[test]
fn missing_required_column_exits_with_error() {
    let workspace = TestWorkspace::new();
    workspace.write_datasets(
        INFLUENCERS,
        POSTS,
        "influencer_id,revenue\n1,10\n",
        "influencer_id,total_payout\n1,5\n",
    );
    command()
        .args(["report", "--data-dir", workspace.path().to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("Missing required columns: campaign in tracking"));
}

#[test]
fn missing_dataset_file_is_reported() {
    let workspace = TestWorkspace::new();
    workspace.write("influencers.csv", INFLUENCERS);
    command()
        .args(["report", "--data-dir", workspace.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("Loading posts dataset"));
}

#[test]
fn unavailable_metric_is_a_warning_not_a_failure() {
    let workspace = TestWorkspace::new();
    workspace.write_datasets(INFLUENCERS, POSTS, TRACKING, "influencer_id,basis\n1,post\n");
    command()
        .args(["report", "--data-dir", workspace.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("warning: ROAS unavailable"))
        .stdout(contains("== Filter Impact Summary =="));
}

#[test]
fn facets_lists_values_and_ranges() {
    let workspace = TestWorkspace::with_datasets();
    command()
        .args(["facets", "--data-dir", workspace.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("Instagram"))
        .stdout(contains("50.00%"))
        .stdout(contains("Follower count range: 3000 - 250000"))
        .stdout(contains("Post date range: 2025-01-05 - 2025-04-01"));
}

#[test]
fn columns_shows_alias_resolution() {
    let workspace = TestWorkspace::with_datasets();
    command()
        .args(["columns", "--data-dir", workspace.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("follower_count"))
        .stdout(contains("post_date"))
        .stdout(contains("payout_amount").not());
}

#[test]
fn semicolon_delimited_inputs_are_supported() {
    let workspace = TestWorkspace::new();
    let semi = |raw: &str| raw.replace(',', ";");
    workspace.write_datasets(
        &semi(INFLUENCERS),
        &semi(POSTS),
        &semi(TRACKING),
        "influencer_id;total_payout\n1;500\n",
    );
    command()
        .args([
            "report",
            "--data-dir",
            workspace.path().to_str().unwrap(),
            "--delimiter",
            ";",
            "--format",
            "json",
        ])
        .assert()
        .success()
        .stdout(contains("\"influencers\": 4"));
}
