use std::process::Command;

#[test]
fn dry_run_without_artifact_prints_fallback() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_docscout"))
        .args(["render", "--dry-run"])
        .current_dir(dir.path())
        .env_remove("GITHUB_TOKEN")
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No results found"));
}

#[test]
fn dry_run_renders_artifact() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("plan.json"),
        r#"{
            "confluence_actions": [{
                "action": "create_page",
                "space_key": "ENG",
                "page_title": "CSV export guide",
                "reason": "New feature without docs",
                "priority": "medium",
                "specific_changes": "Describe the format parameter"
            }],
            "summary": "One new page is needed.",
            "total_actions": 1,
            "estimated_effort": "low",
            "spaces_affected": ["ENG"]
        }"#,
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_docscout"))
        .args(["render", "--dry-run", "--input", "plan.json"])
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("One new page is needed."));
    assert!(stdout.contains("1. Create: CSV export guide"));
}

#[test]
fn render_without_pr_coordinates_fails() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_docscout"))
        .arg("render")
        .current_dir(dir.path())
        .env_remove("GITHUB_TOKEN")
        .env_remove("PR_NUMBER")
        .env_remove("REPO_NAME")
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("GITHUB_TOKEN"), "stderr: {stderr}");
}
