//! Integration tests for running program files.

use std::path::PathBuf;

use stg_cli::{run_file, CliError, OutputFormat, RunOptions};
use stg_core::builder::*;
use stg_core::syntax::{AltType, PrimRep, Program};
use stg_rt::ErrorKind;

// =============================================================================
// Helpers
// =============================================================================

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("stgi-{}-{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn answer_program() -> Program {
    let ibox = data_con("I#", 0, 1);
    Program {
        bindings: vec![top(
            "main",
            thunk(
                &[],
                case(
                    op("*#", vec![int(6), int(7)], PrimRep::Int),
                    "r",
                    AltType::Prim(PrimRep::Int),
                    vec![alt_default(con_app(&ibox, vec![var("r")]))],
                ),
            ),
        )],
        entry: id("main"),
    }
}

fn write_program(dir: &std::path::Path, program: &Program) -> PathBuf {
    let path = dir.join("program.json");
    std::fs::write(&path, serde_json::to_string(program).unwrap()).unwrap();
    path
}

// =============================================================================
// Runs
// =============================================================================

#[test]
fn runs_json_program() {
    let dir = scratch_dir("run");
    let path = write_program(&dir, &answer_program());
    let out = run_file(&path, &RunOptions::default()).unwrap();
    assert_eq!(out, "(I# 42#)");
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn json_output_reports_result_and_steps() {
    let dir = scratch_dir("json");
    let path = write_program(&dir, &answer_program());
    let options = RunOptions {
        format: OutputFormat::Json,
        ..RunOptions::default()
    };
    let out = run_file(&path, &options).unwrap();
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["entry"], "main");
    assert_eq!(value["result"][0], "(I# 42#)");
    assert!(value["steps"].as_u64().unwrap() > 0);
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn nearby_config_limits_steps() {
    let dir = scratch_dir("config");
    let path = write_program(&dir, &answer_program());
    std::fs::write(dir.join("stg.toml"), "max_steps = 2\n").unwrap();

    let err = run_file(&path, &RunOptions::default()).unwrap_err();
    match err {
        CliError::Runtime(e) => assert_eq!(e.kind, ErrorKind::StepLimitExceeded(2)),
        other => panic!("unexpected error: {}", other),
    }

    // The command-line budget wins over the file.
    let options = RunOptions {
        max_steps: Some(1_000),
        ..RunOptions::default()
    };
    assert_eq!(run_file(&path, &options).unwrap(), "(I# 42#)");
    std::fs::remove_dir_all(&dir).unwrap();
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn missing_entry_is_rejected() {
    let dir = scratch_dir("entry");
    let mut program = answer_program();
    program.entry = id("start");
    let path = write_program(&dir, &program);
    let err = run_file(&path, &RunOptions::default()).unwrap_err();
    assert!(matches!(err, CliError::Program { .. }));
    assert!(err.to_string().contains("start"));
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn missing_file_is_io_error() {
    let err = run_file(
        std::path::Path::new("/nonexistent/stgi/program.json"),
        &RunOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, CliError::Io { .. }));
}
