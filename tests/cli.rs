use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

fn temp_workspace() -> TempDir {
    tempfile::tempdir().expect("create tempdir")
}

fn write_fixtures(workspace: &TempDir) {
    let counts = workspace.path().join("counts.txt");
    let corpus = workspace.path().join("corpus.txt");
    fs::write(&counts, "the 10\ncat 5\ndog 1\n").expect("write counts");
    fs::write(
        &corpus,
        "the cat sat\ncat the cat\nthe the cat\ncat cat the\nthe cat\n",
    )
    .expect("write corpus");
}

#[test]
fn vocab_reports_size_and_specials() {
    let workspace = temp_workspace();
    write_fixtures(&workspace);

    let mut vocab = Command::cargo_bin("textbatch").expect("binary exists");
    let output = vocab
        .current_dir(workspace.path())
        .args(["vocab", "--counts", "counts.txt", "--min-count", "2", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: Value = serde_json::from_slice(&output).expect("vocab output is valid JSON");
    assert_eq!(report["size"], 6);
    assert_eq!(report["padding_idx"], 0);
    assert_eq!(report["unk_idx"], 1);
    let head: Vec<&str> = report["head"]
        .as_array()
        .expect("head array")
        .iter()
        .map(|v| v.as_str().expect("token string"))
        .collect();
    assert_eq!(head, vec!["<pad>", "<unk>", "<bos>", "<eos>", "the", "cat"]);
}

#[test]
fn stream_emits_requested_batches_with_consistent_shapes() {
    let workspace = temp_workspace();
    write_fixtures(&workspace);

    let mut stream = Command::cargo_bin("textbatch").expect("binary exists");
    let output = stream
        .current_dir(workspace.path())
        .args([
            "stream",
            "corpus.txt",
            "--counts",
            "counts.txt",
            "--min-count",
            "2",
            "--batch-size",
            "2",
            "--batches",
            "4",
            "--seed",
            "7",
            "--json",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let reports: Value = serde_json::from_slice(&output).expect("stream output is valid JSON");
    let reports = reports.as_array().expect("batch array");
    assert_eq!(reports.len(), 4);
    for report in reports {
        let width = report["width"].as_u64().expect("width");
        assert!(width >= 1 && width <= 2);
    }
    // Four sentences survive the dropped last line; two batches of two drain
    // the first pass, so the third batch arrives after an epoch rollover.
    assert_eq!(reports[0]["epoch"], 0);
    assert_eq!(reports[1]["epoch"], 0);
    assert_eq!(reports[2]["epoch"], 1);
}

#[test]
fn check_prints_rows_as_text() {
    let workspace = temp_workspace();
    write_fixtures(&workspace);

    let mut check = Command::cargo_bin("textbatch").expect("binary exists");
    let output = check
        .current_dir(workspace.path())
        .args([
            "check",
            "corpus.txt",
            "--counts",
            "counts.txt",
            "--min-count",
            "2",
            "--batch-size",
            "4",
            "--batches",
            "1",
            "--seed",
            "3",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let text = String::from_utf8(output).expect("check output is UTF-8");
    assert!(!text.trim().is_empty(), "some rows printed");
    for token in text.split_whitespace() {
        assert!(
            ["the", "cat", "<unk>", "<pad>"].contains(&token),
            "unexpected token {token:?}"
        );
    }
}

#[test]
fn missing_corpus_fails() {
    let workspace = temp_workspace();
    write_fixtures(&workspace);

    let mut stream = Command::cargo_bin("textbatch").expect("binary exists");
    stream
        .current_dir(workspace.path())
        .args(["stream", "missing.txt", "--counts", "counts.txt"])
        .assert()
        .failure();
}
