use std::path::Path;
use std::process::{Command, Output};

const ENV: &[(&str, &str)] = &[
    ("OPENAI_API_KEY", "sk-test"),
    ("CONFLUENCE_URL", "http://127.0.0.1:1/wiki"),
    ("CONFLUENCE_USERNAME", "bot@example.com"),
    ("CONFLUENCE_API_TOKEN", "confluence-token"),
    ("GITHUB_TOKEN", "ghp_test"),
    ("PR_NUMBER", "42"),
    ("REPO_NAME", "acme/widgets"),
    ("PR_TITLE", "Add CSV export"),
];

fn analyze(dir: &Path, env: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_docscout"));
    cmd.arg("analyze").current_dir(dir);
    for (name, _) in ENV {
        cmd.env_remove(name);
    }
    cmd.env_remove("PR_BODY");
    cmd.env("DOCSCOUT_LOG", "info");
    for (name, value) in env {
        cmd.env(name, value);
    }
    cmd.output().unwrap()
}

#[test]
fn missing_env_is_reported_all_at_once() {
    let dir = tempfile::tempdir().unwrap();
    let env: Vec<(&str, &str)> = ENV
        .iter()
        .copied()
        .filter(|(name, _)| *name != "CONFLUENCE_URL" && *name != "PR_TITLE")
        .collect();

    let output = analyze(dir.path(), &env);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("CONFLUENCE_URL"), "stderr: {stderr}");
    assert!(stderr.contains("PR_TITLE"), "stderr: {stderr}");
    assert!(!dir.path().join("confluence_actions.json").exists());
}

#[test]
fn unavailable_file_list_aborts_without_artifact() {
    let mut server = mockito::Server::new();
    let files = server
        .mock("GET", mockito::Matcher::Regex(r"^/repos/acme/widgets/pulls/42/files".into()))
        .with_status(404)
        .with_body(r#"{"message":"Not Found"}"#)
        .create();

    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("docscout.toml");
    std::fs::write(&config, format!("[github]\napi_url = \"{}\"\n", server.url())).unwrap();

    let mut env = ENV.to_vec();
    let config_arg = config.display().to_string();
    env.push(("DOCSCOUT_LOG", "error"));
    let output = Command::new(env!("CARGO_BIN_EXE_docscout"))
        .args(["analyze", "--config", &config_arg])
        .current_dir(dir.path())
        .envs(env.iter().copied())
        .env_remove("PR_BODY")
        .output()
        .unwrap();

    files.assert();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("could not retrieve the changed files"), "stderr: {stderr}");
    assert!(!dir.path().join("confluence_actions.json").exists());
}
