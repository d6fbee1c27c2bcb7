
use assert_cmd::Command;
use predicates::prelude::*;
use soltrace::interpreter::Value;
use std::error::Error;
use std::fs;
use tempfile::TempDir;
use test_helpers::*;

fn soltrace() -> Result<Command, Box<dyn Error>> {
    let mut cmd = Command::cargo_bin("soltrace")?;
    cmd.env_remove("SOLTRACE_SEED")
        .env_remove("SOLTRACE_TRACE_OUTPUT")
        .env_remove("SOLTRACE_ERROR_POLICY");
    Ok(cmd)
}

#[test]
fn test_writes_trace() -> Result<(), Box<dyn Error>> {
    let temp_dir = TempDir::new()?;
    let program = temp_dir.path().join("program.json");
    let output = temp_dir.path().join("trace.json");
    fs::write(
        &program,
        program_json(
            observer_contract(),
            vec![
                call("Observer", "f", vec![Value::uint(1)]),
                call("Observer", "f", vec![Value::uint(2)]),
            ],
        ),
    )?;

    soltrace()?
        .arg("--program")
        .arg(&program)
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Trace written"))
        .stdout(predicate::str::contains("2 events"));

    let trace: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output)?)?;
    assert_eq!(
        trace,
        serde_json::json!([
            { "event": "Seen", "args": { "0": 1, "1": 1 } },
            { "event": "Seen", "args": { "0": 2, "1": 2 } }
        ])
    );
    Ok(())
}

#[test]
fn test_output_from_environment() -> Result<(), Box<dyn Error>> {
    let temp_dir = TempDir::new()?;
    let program = temp_dir.path().join("program.json");
    let output = temp_dir.path().join("env").join("trace.json");
    fs::write(
        &program,
        program_json(counter_contract(), vec![call("Counter", "f", vec![])]),
    )?;

    soltrace()?
        .env("SOLTRACE_TRACE_OUTPUT", &output)
        .arg("-p")
        .arg(&program)
        .assert()
        .success();

    assert!(output.exists());
    Ok(())
}

#[test]
fn test_failed_run_exits_with_error() -> Result<(), Box<dyn Error>> {
    let temp_dir = TempDir::new()?;
    let program = temp_dir.path().join("program.json");
    let output = temp_dir.path().join("trace.json");
    fs::write(
        &program,
        program_json(overflow_contract(), vec![call("Overflow", "f", vec![])]),
    )?;

    soltrace()?
        .arg("--program")
        .arg(&program)
        .arg("--output")
        .arg(&output)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("overflow"));

    assert!(!output.exists());
    Ok(())
}

#[test]
fn test_substitute_policy_is_deterministic() -> Result<(), Box<dyn Error>> {
    let temp_dir = TempDir::new()?;
    let program = temp_dir.path().join("program.json");
    fs::write(
        &program,
        program_json(overflow_contract(), vec![call("Overflow", "f", vec![])]),
    )?;

    let mut traces = Vec::new();
    for name in ["first.json", "second.json"] {
        let output = temp_dir.path().join(name);
        soltrace()?
            .arg("--program")
            .arg(&program)
            .arg("--output")
            .arg(&output)
            .arg("--seed")
            .arg("7")
            .arg("--error-policy")
            .arg("substitute")
            .assert()
            .success();
        traces.push(fs::read(&output)?);
    }

    assert_eq!(traces[0], traces[1]);
    Ok(())
}

#[test]
fn test_missing_program_file() -> Result<(), Box<dyn Error>> {
    let temp_dir = TempDir::new()?;

    soltrace()?
        .arg("--program")
        .arg(temp_dir.path().join("absent.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Program file not found"));
    Ok(())
}

#[test]
fn test_invalid_seed_environment() -> Result<(), Box<dyn Error>> {
    let temp_dir = TempDir::new()?;
    let program = temp_dir.path().join("program.json");
    fs::write(
        &program,
        program_json(counter_contract(), vec![call("Counter", "f", vec![])]),
    )?;

    soltrace()?
        .env("SOLTRACE_SEED", "not-a-number")
        .arg("--program")
        .arg(&program)
        .assert()
        .failure()
        .stderr(predicate::str::contains("SOLTRACE_SEED"));
    Ok(())
}
