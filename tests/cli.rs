use std::{fs, process::Command};

use pretty_assertions::assert_eq;
use tempfile::tempdir;

const SOURCE: &str = include_str!("fixtures/StaticTest.vm");
const EXPECTED: &str = include_str!("fixtures/StaticTest.expected.asm");

fn translator() -> Command {
    Command::new(env!("CARGO_BIN_EXE_hack-vm-translator"))
}

#[test]
fn writes_asm_next_to_input() {
    let dir = tempdir().expect("Failed to create temp directory");
    let input = dir.path().join("StaticTest.vm");
    fs::write(&input, SOURCE).unwrap();

    let output = translator().arg(&input).output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("Translation complete"));

    let written = fs::read_to_string(dir.path().join("StaticTest.asm")).unwrap();
    assert_eq!(written, EXPECTED);
}

#[test]
fn output_and_module_flags() {
    let dir = tempdir().expect("Failed to create temp directory");
    let input = dir.path().join("prog.vm");
    let out = dir.path().join("renamed.asm");
    fs::write(&input, "push constant 2\npop static 0\n").unwrap();

    let status = translator()
        .arg(&input)
        .args(["--module", "Main", "-o"])
        .arg(&out)
        .status()
        .unwrap();
    assert!(status.success());
    assert!(fs::read_to_string(&out).unwrap().contains("@Main.temp.0\n"));
}

#[test]
fn failure_leaves_no_output_file() {
    let dir = tempdir().expect("Failed to create temp directory");
    let input = dir.path().join("Broken.vm");
    fs::write(&input, "push constant 1\nsub\n").unwrap();

    let output = translator().arg(&input).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("line 2"), "{}", stderr);
    assert!(stderr.contains("stack underflow"), "{}", stderr);
    assert!(!dir.path().join("Broken.asm").exists());
}

#[test]
fn parse_errors_name_the_line() {
    let dir = tempdir().expect("Failed to create temp directory");
    let input = dir.path().join("Typo.vm");
    fs::write(&input, "push constant 1\npush consant 2\n").unwrap();

    let output = translator().arg(&input).output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("line 2: invalid command `push consant 2`"), "{}", stderr);
}
