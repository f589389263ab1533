use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;

fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_circulation"))
}

fn run(library: &PathBuf, args: &[&str]) -> Output {
    Command::new(bin())
        .arg("--library")
        .arg(library)
        .args(args)
        .output()
        .expect("binary should run")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_lending_flow_end_to_end() {
    let dir = TempDir::new().expect("tempdir should succeed");
    let library = dir.path().join("library.json");

    let init = run(&library, &["init"]);
    assert!(init.status.success(), "init failed: {:?}", init);
    assert!(library.exists());

    let add = run(
        &library,
        &[
            "add-book",
            "9780134685991",
            "Effective Java",
            "--author",
            "Joshua Bloch",
        ],
    );
    assert!(add.status.success(), "add-book failed: {:?}", add);

    // Quiet register prints just the card id.
    let register = run(&library, &["--quiet", "register", "Ada Lovelace", "ada@example.com"]);
    assert!(register.status.success(), "register failed: {:?}", register);
    let card = stdout(&register).trim().to_string();
    assert!(!card.is_empty());

    let checkout = run(&library, &["checkout", &card, "9780134685991"]);
    assert!(checkout.status.success(), "checkout failed: {:?}", checkout);
    assert!(stdout(&checkout).contains("Checked out 9780134685991"));

    // The copy is out: a second checkout must be refused.
    let conflict = run(&library, &["checkout", &card, "9780134685991"]);
    assert!(!conflict.status.success());

    let search = run(&library, &["search", "effective"]);
    assert!(search.status.success());
    assert!(stdout(&search).contains("| no"));

    let checkin = run(&library, &["checkin", &card, "9780134685991"]);
    assert!(checkin.status.success(), "checkin failed: {:?}", checkin);
    assert!(stdout(&checkin).contains("Checked in 9780134685991"));

    let repeat = run(&library, &["checkin", &card, "9780134685991"]);
    assert!(!repeat.status.success());

    let loans = run(&library, &["loans", &card]);
    assert!(loans.status.success());
    assert!(stdout(&loans).contains("9780134685991"));

    let fines = run(&library, &["fines", "--card", &card]);
    assert!(fines.status.success());
    assert!(stdout(&fines).contains("Total due: $0.00"));

    let sweep = run(&library, &["update-fines"]);
    assert!(sweep.status.success());
    assert!(stdout(&sweep).contains("Updated fines on 0 loan(s)"));
}

#[test]
fn test_init_refuses_existing_library() {
    let dir = TempDir::new().expect("tempdir should succeed");
    let library = dir.path().join("library.json");

    assert!(run(&library, &["init"]).status.success());
    let second = run(&library, &["init"]);
    assert!(!second.status.success());
}

#[test]
fn test_json_output_is_parseable() {
    let dir = TempDir::new().expect("tempdir should succeed");
    let library = dir.path().join("library.json");

    assert!(run(&library, &["init"]).status.success());
    assert!(run(
        &library,
        &["add-book", "111", "A Book", "--author", "Someone"]
    )
    .status
    .success());

    let search = run(&library, &["search", "book", "--json"]);
    assert!(search.status.success());
    let parsed: serde_json::Value =
        serde_json::from_str(&stdout(&search)).expect("search output should be JSON");
    assert_eq!(parsed.as_array().map(|books| books.len()), Some(1));
}
