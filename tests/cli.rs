//! The `qrscan` binary run against rendered fixtures: exit status, printed
//! summary and the files it leaves behind.

mod common;

use common::{write_blank, write_qr};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

const ENV_VARS: [&str; 8] = [
    "QR_SCAN_DEDUP",
    "QR_SCAN_KEEP_UNDECODED",
    "QR_SCAN_PARALLEL",
    "QR_MAX_DIM",
    "QR_SCAN_LOG_FILE",
    "QR_SCAN_LOG_MAX_BYTES",
    "QR_SCAN_DURATION",
    "RUST_LOG",
];

/// Run `qrscan` with `cwd` as the working directory and file logging off.
fn qrscan(cwd: &Path, args: &[&str]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_qrscan"));
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd.current_dir(cwd)
        .args(["--log-file", "-"])
        .args(args)
        .stdin(Stdio::null())
        .output()
        .expect("run qrscan")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Default-named result files in `dir`.
fn default_outputs(dir: &Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = fs::read_dir(dir)
        .expect("read cwd")
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .is_some_and(|name| name.to_string_lossy().starts_with("qr_results_"))
        })
        .collect();
    found.sort();
    found
}

fn read_json(path: &Path) -> serde_json::Value {
    let text = fs::read_to_string(path).expect("read export");
    serde_json::from_str(&text).expect("export is JSON")
}

#[test]
fn zero_codes_exit_cleanly_and_write_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_blank(dir.path(), "blank.png");

    let output = qrscan(dir.path(), &["--image", "blank.png"]);
    assert!(output.status.success(), "{output:?}");
    assert!(stdout(&output).contains("Detected 0 QR code(s)"));
    assert!(default_outputs(dir.path()).is_empty());
}

#[test]
fn found_codes_go_to_a_default_json_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_qr(dir.path(), "ticket.png", "cli-default");

    let output = qrscan(dir.path(), &["--image", "ticket.png"]);
    assert!(output.status.success(), "{output:?}");
    assert!(stdout(&output).contains("Data: cli-default"));

    let files = default_outputs(dir.path());
    assert_eq!(files.len(), 1, "{files:?}");
    assert_eq!(files[0].extension().and_then(|e| e.to_str()), Some("json"));
    let json = read_json(&files[0]);
    assert_eq!(json["total_codes"], 1);
    assert_eq!(json["results"][0]["data"], "cli-default");
}

#[test]
fn text_format_without_output_uses_a_txt_name() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_qr(dir.path(), "ticket.png", "cli-text");

    let output = qrscan(dir.path(), &["--image", "ticket.png", "--format", "text"]);
    assert!(output.status.success(), "{output:?}");

    let files = default_outputs(dir.path());
    assert_eq!(files.len(), 1, "{files:?}");
    assert_eq!(files[0].extension().and_then(|e| e.to_str()), Some("txt"));
    let text = fs::read_to_string(&files[0]).expect("read export");
    assert!(text.contains("cli-text"));
    assert!(serde_json::from_str::<serde_json::Value>(&text).is_err());
}

#[test]
fn output_extension_picks_the_format() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_qr(dir.path(), "codes/a.png", "alpha");
    write_qr(dir.path(), "codes/b.png", "beta");

    let output = qrscan(dir.path(), &["--directory", "codes", "--output", "out.json"]);
    assert!(output.status.success(), "{output:?}");
    let json = read_json(&dir.path().join("out.json"));
    assert_eq!(json["total_codes"], 2);
    assert_eq!(json["results"][0]["data"], "alpha");
    assert_eq!(json["results"][1]["data"], "beta");

    let output = qrscan(dir.path(), &["--directory", "codes", "--output", "out.log"]);
    assert!(output.status.success(), "{output:?}");
    let text = fs::read_to_string(dir.path().join("out.log")).expect("read text");
    assert!(text.contains("alpha") && text.contains("beta"));
    assert!(serde_json::from_str::<serde_json::Value>(&text).is_err());

    assert!(default_outputs(dir.path()).is_empty());
}

#[test]
fn explicit_output_is_written_even_with_zero_codes() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_blank(dir.path(), "blank.png");

    let output = qrscan(dir.path(), &["--image", "blank.png", "-o", "empty.json"]);
    assert!(output.status.success(), "{output:?}");
    let json = read_json(&dir.path().join("empty.json"));
    assert_eq!(json["total_codes"], 0);
}

#[test]
fn a_missing_image_fails() {
    let dir = tempfile::tempdir().expect("tempdir");

    let output = qrscan(dir.path(), &["--image", "absent.png", "-o", "out.json"]);
    assert!(!output.status.success());
    assert!(!dir.path().join("out.json").exists());
    assert!(default_outputs(dir.path()).is_empty());
}

#[test]
fn an_export_failure_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_qr(dir.path(), "ticket.png", "nowhere");

    let output = qrscan(
        dir.path(),
        &["--image", "ticket.png", "-o", "no/such/dir/out.json"],
    );
    assert!(!output.status.success());
    assert!(!dir.path().join("no").exists());
}

#[test]
fn conflicting_dedup_flags_are_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_blank(dir.path(), "blank.png");

    let output = qrscan(dir.path(), &["--image", "blank.png", "--dedup", "--no-dedup"]);
    assert!(!output.status.success());
}

#[test]
fn dedup_flag_collapses_repeated_payloads() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_qr(dir.path(), "codes/a.png", "same");
    write_qr(dir.path(), "codes/b.png", "same");

    let output = qrscan(dir.path(), &["--directory", "codes", "-o", "all.json"]);
    assert!(output.status.success(), "{output:?}");
    assert_eq!(read_json(&dir.path().join("all.json"))["total_codes"], 2);

    let output = qrscan(
        dir.path(),
        &["--directory", "codes", "--dedup", "-o", "unique.json"],
    );
    assert!(output.status.success(), "{output:?}");
    assert_eq!(read_json(&dir.path().join("unique.json"))["total_codes"], 1);
}
