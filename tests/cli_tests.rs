//! Integration tests for the CLI application
//!
//! These tests verify that the CLI commands work correctly with real data files.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::{NamedTempFile, TempDir};

const CLUSTERS: [(i64, f64, f64); 3] = [(1, 0.0, 0.0), (2, 4.0, 0.0), (3, 0.0, 4.0)];
const OFFSETS: [(f64, f64); 4] = [(0.3, 0.3), (-0.3, 0.3), (0.3, -0.3), (-0.3, -0.3)];

/// Helper to create test data files
struct TestDataFiles {
    pub libsvm_file: NamedTempFile,
    pub csv_file: NamedTempFile,
    pub test_libsvm_file: NamedTempFile,
}

impl TestDataFiles {
    fn new() -> std::io::Result<Self> {
        let mut libsvm_file = NamedTempFile::new()?;
        let mut csv_file = NamedTempFile::with_suffix(".csv")?;
        writeln!(csv_file, "feature1,feature2,label")?;

        for &(label, cx, cy) in &CLUSTERS {
            for &(dx, dy) in &OFFSETS {
                writeln!(libsvm_file, "{label} 1:{} 2:{}", cx + dx, cy + dy)?;
                writeln!(csv_file, "{},{},{label}", cx + dx, cy + dy)?;
            }
        }
        libsvm_file.flush()?;
        csv_file.flush()?;

        let mut test_libsvm_file = NamedTempFile::new()?;
        writeln!(test_libsvm_file, "1 1:0.1 2:0.1")?;
        writeln!(test_libsvm_file, "2 1:4.1 2:0.1")?;
        writeln!(test_libsvm_file, "3 1:0.1 2:4.1")?;
        test_libsvm_file.flush()?;

        Ok(TestDataFiles {
            libsvm_file,
            csv_file,
            test_libsvm_file,
        })
    }
}

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_multisvm"))
        .args(args)
        .output()
        .expect("Failed to run CLI")
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp paths are UTF-8")
}

fn assert_success(output: &Output, what: &str) {
    assert!(
        output.status.success(),
        "{what} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

fn train(data: &Path, model: &Path, extra: &[&str]) {
    let mut args = vec!["train", "--data", path_str(data), "--output", path_str(model)];
    args.extend_from_slice(extra);
    assert_success(&run_cli(&args), "train");
    assert!(model.exists(), "Model file was not created");
}

#[test]
fn test_cli_train_each_model_kind() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    for (kind, method) in [("linear", "ovo"), ("kernel", "ovr"), ("nu", "ovo")] {
        let model_path = temp_dir.path().join(format!("{kind}.json"));
        train(
            test_data.libsvm_file.path(),
            &model_path,
            &["--format", "libsvm", "--model", kind, "--method", method],
        );

        let json = std::fs::read_to_string(&model_path).unwrap();
        assert!(json.contains(&format!("\"kind\": \"{kind}\"")));
        assert!(json.contains(&format!("\"method\": \"{method}\"")));
    }
}

#[test]
fn test_cli_train_csv_auto_format() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("model.json");

    train(
        test_data.csv_file.path(),
        &model_path,
        &["--model", "kernel", "--gamma", "auto", "-C", "10", "--n-jobs", "-1"],
    );

    let output = run_cli(&["info", path_str(&model_path)]);
    assert_success(&output, "info");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Classes: 3"));
    assert!(stdout.contains("Binary classifiers: 3"));
}

#[test]
fn test_cli_predict_to_file() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("model.json");
    let predictions_path = temp_dir.path().join("predictions.txt");

    train(
        test_data.libsvm_file.path(),
        &model_path,
        &["--model", "linear", "-C", "10"],
    );

    let output = run_cli(&[
        "predict",
        "--model",
        path_str(&model_path),
        "--data",
        path_str(test_data.test_libsvm_file.path()),
        "--output",
        path_str(&predictions_path),
    ]);
    assert_success(&output, "predict");

    let content = std::fs::read_to_string(&predictions_path).unwrap();
    let rows: Vec<&str> = content.lines().filter(|l| !l.starts_with('#')).collect();
    assert_eq!(rows, vec!["0 1", "1 2", "2 3"]);
}

#[test]
fn test_cli_predict_to_stdout() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("model.json");

    train(
        test_data.libsvm_file.path(),
        &model_path,
        &["--model", "nu", "--nu", "0.4", "--method", "ovr"],
    );

    let output = run_cli(&[
        "predict",
        "-m",
        path_str(&model_path),
        "--data",
        path_str(test_data.test_libsvm_file.path()),
    ]);
    assert_success(&output, "predict");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("# Predictions for 3 samples"));
    assert_eq!(stdout.lines().filter(|l| !l.starts_with('#')).count(), 3);
}

#[test]
fn test_cli_evaluate_detailed() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("model.json");

    train(test_data.libsvm_file.path(), &model_path, &["-C", "10"]);

    let output = run_cli(&[
        "evaluate",
        "--model",
        path_str(&model_path),
        "--data",
        path_str(test_data.test_libsvm_file.path()),
        "--detailed",
    ]);
    assert_success(&output, "evaluate");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Accuracy: 100.00%"));
    assert!(stdout.contains("precision"));
    assert!(stdout.contains("macro f1"));
}

#[test]
fn test_cli_unknown_method_fails() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("model.json");

    let output = run_cli(&[
        "train",
        "--data",
        path_str(test_data.libsvm_file.path()),
        "--output",
        path_str(&model_path),
        "--method",
        "xyz",
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("xyz"));
    assert!(!model_path.exists());
}

#[test]
fn test_cli_error_handling() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    // Missing data file
    let output = run_cli(&[
        "train",
        "--data",
        "/non/existent/data.libsvm",
        "--output",
        path_str(&temp_dir.path().join("model.json")),
    ]);
    assert_eq!(output.status.code(), Some(1));

    // Missing model file
    let output = run_cli(&["info", "/non/existent/model.json"]);
    assert_eq!(output.status.code(), Some(1));

    // Invalid gamma
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let output = run_cli(&[
        "train",
        "--data",
        path_str(test_data.libsvm_file.path()),
        "--output",
        path_str(&temp_dir.path().join("model.json")),
        "--gamma",
        "-2",
    ]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_cli_help() {
    let output = run_cli(&["--help"]);
    assert_success(&output, "help");

    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["train", "predict", "evaluate", "info"] {
        assert!(stdout.contains(command), "help is missing {command}");
    }
}
