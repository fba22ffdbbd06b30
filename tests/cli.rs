use std::{path::Path, process::Command};

use serde_json::{Value, json};

/// Runs the binary against the database at `db` as `john` with JSON logs on.
fn chronos(db: &Path, args: &[&str]) -> anyhow::Result<(Value, String)> {
    let output = Command::new(env!("CARGO_BIN_EXE_chronos"))
        .args(args)
        .env("CHRONOS_USER", "john")
        .env("CHRONOS__OBSERVABILITY__JSON", "true")
        .env("DATABASE_URL", format!("sqlite:{}", db.to_string_lossy()))
        .env("CONFIG_PATH", db.with_extension("toml"))
        .env("RUST_LOG", "info")
        .output()?;

    let stderr = String::from_utf8(output.stderr)?;
    anyhow::ensure!(output.status.success(), "chronos {args:?} failed: {stderr}");

    Ok((serde_json::from_slice(&output.stdout)?, stderr))
}

#[test]
fn test_json_logs_keep_stdout_parseable() -> anyhow::Result<()> {
    let dir = temp_dir::TempDir::new()?;
    let (out, logs) = chronos(&dir.child("chronos.db"), &["streak"])?;

    assert_eq!(out, json!({ "streak": 0 }));
    assert!(logs.contains("\"level\":\"INFO\""));

    Ok(())
}

#[test]
fn test_day_text_edit_keeps_completed_big_thing() -> anyhow::Result<()> {
    let dir = temp_dir::TempDir::new()?;
    let db = dir.child("chronos.db");

    let (done, _) = chronos(&db, &["day", "--big-thing", "ship", "--done"])?;
    assert_eq!(done["plan"]["bigThing"], json!({ "text": "ship", "completed": true }));

    let (edited, _) = chronos(&db, &["day", "--big-thing", "ship v2"])?;
    assert_eq!(edited["state"], "persisted");
    assert_eq!(
        edited["plan"]["bigThing"],
        json!({ "text": "ship v2", "completed": true })
    );

    Ok(())
}
