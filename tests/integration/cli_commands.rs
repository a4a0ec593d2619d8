//! The bookwright binary end to end, without any network access.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const PLAN: &str = r#"
name: "Stars"
target_reader: "Night owls"
back_cover_description: "Everything about stars."
parts:
  - name: "Light"
    introduction: "Where starlight comes from."
    chapters:
      - name: "Fusion"
        sections:
          - name: "Hydrogen"
            bullet_points: ["proton chain"]
          - name: "Helium"
            bullet_points: ["triple alpha"]
"#;

fn workspace() -> TempDir {
    let temp = TempDir::new().unwrap();
    for (name, ready) in [("stars", false), ("moons", true)] {
        let dir = temp.path().join("books").join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("plan.yaml"), PLAN).unwrap();
        if ready {
            fs::write(dir.join("_ready"), "").unwrap();
        }
    }
    temp
}

fn bookwright(workspace: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bookwright"))
        .env("XDG_CONFIG_HOME", workspace.join("xdg"))
        .env("HOME", workspace)
        .env_remove("BOOKWRIGHT_LOG")
        .env_remove("BOOKWRIGHT_ENV")
        .env("BOOKWRIGHT_LOG_OUTPUT", "stderr")
        .arg("--workspace")
        .arg(workspace)
        .args(args)
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_list_json() {
    let ws = workspace();
    let output = bookwright(ws.path(), &["list", "--format", "json"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["total"], 2);
    assert_eq!(value["books"][0]["name"], "moons");
    assert_eq!(value["books"][0]["ready"], true);
    assert_eq!(value["books"][1]["name"], "stars");
}

#[test]
fn test_validate_book() {
    let ws = workspace();
    let output = bookwright(ws.path(), &["validate", "stars"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Units: 3 (1 part intros, 0 chapters, 2 sections)"));
}

#[test]
fn test_validate_broken_plan_fails() {
    let ws = workspace();
    fs::write(
        ws.path().join("books/stars/plan.yaml"),
        "name: \"Stars\"\ntarget_reader: \"x\"\nparts: []\n",
    )
    .unwrap();
    let output = bookwright(ws.path(), &["validate", "stars"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Plan error"));
}

#[test]
fn test_status_reflects_files_on_disk() {
    let ws = workspace();
    let section = ws.path().join("books/stars/part_01/01_01_01_section.md");
    fs::create_dir_all(section.parent().unwrap()).unwrap();
    fs::write(&section, "## Hydrogen\n\nProtons fuse into helium.\n").unwrap();

    let output = bookwright(ws.path(), &["status", "stars", "--format", "json"]);
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["total"], 3);
    assert_eq!(value["done"], 1);
    assert_eq!(value["units"][1]["completion"], "complete");
    assert_eq!(value["units"][2]["completion"], "missing");
}

#[test]
fn test_run_on_ready_book_does_nothing() {
    let ws = workspace();
    let output = bookwright(ws.path(), &["run", "moons"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("marked ready"));
    assert!(!ws.path().join("books/moons/part_01").exists());
}

#[test]
fn test_run_without_credentials_fails_cleanly() {
    let ws = workspace();
    let output = Command::new(env!("CARGO_BIN_EXE_bookwright"))
        .env("XDG_CONFIG_HOME", ws.path().join("xdg"))
        .env("HOME", ws.path())
        .env_remove("GEMINI_API_KEY")
        .env_remove("BOOKWRIGHT_ENV")
        .arg("--workspace")
        .arg(ws.path())
        .args(["run", "stars"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Provider not configured"));
    assert!(!ws.path().join("books/stars/back_cover.md").exists());
}

#[test]
fn test_unknown_book() {
    let ws = workspace();
    let output = bookwright(ws.path(), &["status", "comets"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Book not found"));
}
