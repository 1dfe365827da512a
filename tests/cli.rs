use std::path::PathBuf;
use std::process::{Command, Output};

fn dic(args: &[&str]) -> Output {
    let exe = std::env::var_os("CARGO_BIN_EXE_dic")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) { "dic.exe" } else { "dic" });
            p
        });
    Command::new(exe)
        .args(args)
        .output()
        .expect("run dic")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn cli_prints_trace_and_result() {
    let out = dic(&["2+3*4"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "2 + 3 * 4 = 14\n");
}

#[test]
fn cli_joins_words() {
    let out = dic(&["(2", "+", "3)", "*", "4"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "(2 + 3) * 4 = 20\n");
}

#[test]
fn cli_lone_number_is_quiet() {
    let out = dic(&["7"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), "7\n");
}

#[test]
fn cli_quiet_repeats() {
    let out = dic(&["-q", "-r", "5", "2d6"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let lines: Vec<f64> = stdout(&out)
        .lines()
        .map(|l| l.parse().unwrap())
        .collect();
    assert_eq!(lines.len(), 5);
    assert!(lines.iter().all(|x| (2.0..=12.0).contains(x)));
}

#[test]
fn cli_really_quiet_advantage() {
    let out = dic(&["-A", "-Q", "d20"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let value: f64 = stdout(&out).trim().parse().unwrap();
    assert!((1.0..=20.0).contains(&value));
}

#[test]
fn cli_expression_error() {
    let out = dic(&["--color", "never", "2d0"]);
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(stderr(&out), "Error: can't roll 0-sided die\t2d0\n");
    assert!(stdout(&out).is_empty());
}

#[test]
fn cli_several_expression_errors() {
    let out = dic(&["--color", "never", "2d0", "+", "d"]);
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(
        stderr(&out),
        "Errors:\n\tCan't roll 0-sided die\t2d0+d\n\tMissing number of sides.\n"
    );
}

#[test]
fn cli_bad_repeats() {
    let out = dic(&["-r", "0", "d6"]);
    assert_eq!(out.status.code(), Some(3));
    assert_eq!(stderr(&out), "As requested: we're repeating 0 times.\n");

    let out = dic(&["-r", "-2", "d6"]);
    assert_eq!(out.status.code(), Some(3));

    let out = dic(&["--color", "never", "-r", "2+", "d6"]);
    assert_eq!(out.status.code(), Some(3));
    assert_eq!(stderr(&out), "Invalid repetitions: missing number\t2+\n");
}

#[test]
fn cli_flag_errors() {
    let out = dic(&["-A", "-D", "d20"]);
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn cli_missing_expression() {
    let out = dic(&[]);
    assert_eq!(out.status.code(), Some(3));
    assert_eq!(stderr(&out), "Missing arguments. See -h or --help for help.\n");

    let out = dic(&["-q", "-x"]);
    assert_eq!(out.status.code(), Some(3));
    assert_eq!(
        stderr(&out),
        "Error: missing dice-expression. See -h or --help for help.\n"
    );
    assert!(stdout(&out).is_empty());
}

#[test]
fn cli_flag_between_words() {
    let out = dic(&["2", "-q", "3"]);
    assert_eq!(out.status.code(), Some(3));
    assert_eq!(
        stderr(&out),
        "Error: multiple dice-expressions found. See -h or --help for help.\n"
    );
    assert!(stdout(&out).is_empty());

    let out = dic(&["d6", "-r", "2", "+", "1"]);
    assert_eq!(out.status.code(), Some(3));
}

#[test]
fn cli_flags_around_words() {
    let out = dic(&["-q", "2", "+", "3", "--color", "never"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "5\n");

    let out = dic(&["-q", "--", "-2", "*", "3"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "-6\n");
}
