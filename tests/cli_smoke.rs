use assert_cmd::Command;
use predicates::str::contains;

#[test]
fn todo_help_works() {
    Command::cargo_bin("todo")
        .expect("binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("to-do list"));
}

#[test]
fn subcommand_help_works() {
    let subcommands = ["add", "edit", "list", "show", "toggle", "rm", "config"];

    for cmd in subcommands {
        Command::cargo_bin("todo")
            .expect("binary")
            .arg(cmd)
            .arg("--help")
            .assert()
            .success();
    }
}
