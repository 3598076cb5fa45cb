use assert_cmd::Command;
use assert_fs::prelude::*;
use predicates::prelude::*;

#[test]
fn prints_the_contents_of_a_file() {
    // given
    let temp = assert_fs::TempDir::new().expect("temp dir");
    let file = temp.child("example.txt");
    file.write_str("EXAMPLE_FILE_CONTENT")
        .expect("fixture file");

    // when
    let mut cmd = Command::cargo_bin("deferred_cli").expect("binary");

    // then
    cmd.arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("EXAMPLE_FILE_CONTENT"));
}

#[test]
fn fails_with_the_fault_message_when_the_file_is_missing() {
    // given
    let temp = assert_fs::TempDir::new().expect("temp dir");
    let missing = temp.child("missing.txt");

    // when
    let mut cmd = Command::cargo_bin("deferred_cli").expect("binary");

    // then
    cmd.arg(missing.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unable to read file"));
}
