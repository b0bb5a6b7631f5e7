use assert_cmd::Command;
use predicates::str::contains;

fn cmd() -> Command {
    Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap()
}

#[test]
fn no_args() {
    cmd()
        .assert()
        .failure()
        .stderr(contains("required arguments were not provided"))
        .stderr(contains("--sweep"));
}

#[test]
fn file_not_found() {
    cmd()
        .args(["a * x", "not-here", "--sweep", "a", "--min", "0", "--max", "1"])
        .assert()
        .failure()
        .stderr(contains("failed to open 'not-here'"));
}

#[test]
fn column_not_found() {
    cmd()
        .args(["a * x", "tests/file1.csv", "--sweep", "a", "--min", "0", "--max", "1"])
        .args(["--ycol", "Volts"])
        .assert()
        .failure()
        .stderr(contains("could not find column 'Volts'"))
        .stderr(contains("in 'tests/file1.csv'"));
}

#[test]
fn unparseable_expression() {
    cmd()
        .args(["a = 1", "tests/file1.csv", "--sweep", "a", "--min", "0", "--max", "1"])
        .assert()
        .failure()
        .stderr(contains("parsing 'a = 1' failed"))
        .stderr(contains("unsupported syntax"));
}

#[test]
fn unknown_function() {
    cmd()
        .args(["foo(x)", "tests/file1.csv", "--sweep", "a", "--min", "0", "--max", "1"])
        .assert()
        .failure()
        .stderr(contains("unknown function 'foo'"));
}

#[test]
fn unbound_variable() {
    cmd()
        .args(["b * x", "tests/file1.csv", "--sweep", "a", "--min", "0", "--max", "1"])
        .assert()
        .failure()
        .stderr(contains("every variable in 'b * x'"))
        .stderr(contains("undefined variable 'b'"));
}

#[test]
fn inverted_range() {
    cmd()
        .args(["a * x", "tests/file1.csv", "--sweep", "a", "--min", "5", "--max", "1"])
        .assert()
        .failure()
        .stderr(contains("invalid sweep range"));
}

#[test]
fn zero_steps() {
    cmd()
        .args(["a * x", "tests/file1.csv", "--sweep", "a", "--min", "0", "--max", "1"])
        .args(["--steps", "0"])
        .assert()
        .failure()
        .stderr(contains("invalid sweep range"))
        .stderr(contains("steps must be at least 1"));
}

#[test]
fn domain_error_mid_sweep_writes_nothing() {
    cmd()
        .args(["sqrt(x - a)", "tests/file1.csv", "--sweep", "a", "--min", "0", "--max", "4"])
        .args(["--out", "plain"])
        .assert()
        .failure()
        .stderr(contains("math domain error in 'sqrt'"))
        // the whole sweep is abandoned; no partial series is emitted
        .stdout("");
}
