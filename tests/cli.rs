#![cfg(feature = "cli")]

use assert_cmd::Command;
use predicates as pred;
use predicates::prelude::*;

fn banking() -> Command {
    Command::new(env!("CARGO_BIN_EXE_banking"))
}

#[test]
fn create_account_and_exit() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let db = dir.path().join("card.s3db");

    banking()
        .arg("--file-name")
        .arg(&db)
        .write_stdin("1\n0\n")
        .assert()
        .success()
        .stdout(pred::str::contains("Your card has been created"))
        .stdout(pred::str::contains("Your card number:\n400000"))
        .stdout(pred::str::contains("Bye!"));

    assert!(db.exists());
}

#[test]
fn unknown_card_is_rejected() {
    let dir = tempfile::tempdir().expect("create temp dir");

    banking()
        .arg("--file-name")
        .arg(dir.path().join("card.s3db"))
        .write_stdin("2\n4000008449433403\n1234\n0\n")
        .assert()
        .success()
        .stdout(pred::str::contains("Wrong card number or PIN"))
        .stdout(pred::str::contains("You have successfully logged in!").not());
}

#[test]
fn file_name_is_required() {
    banking()
        .write_stdin("0\n")
        .assert()
        .failure()
        .stderr(pred::str::contains("--file-name"));
}
