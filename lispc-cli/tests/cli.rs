use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn cxx_available() -> bool {
    std::process::Command::new("g++")
        .arg("--version")
        .output()
        .is_ok_and(|output| output.status.success())
}

#[test]
fn emits_cpp_to_stdout() {
    let dir = tempdir().expect("tempdir");
    let input_path = dir.path().join("input.lisp");
    fs::write(&input_path, "(print (+ 1 2))").expect("write input");

    Command::cargo_bin("lispc-cli")
        .expect("binary exists")
        .arg("--input")
        .arg(&input_path)
        .arg("--emit")
        .arg("cpp")
        .assert()
        .success()
        .stdout(predicate::str::contains("FUNC(Print, FUNC(Add, INT(1),INT(2),),),"))
        .stdout(predicate::str::contains("int main()"));
}

#[test]
fn writes_cpp_to_output_file() {
    let dir = tempdir().expect("tempdir");
    let input_path = dir.path().join("input.lisp");
    fs::write(&input_path, "(defun sq (x) (* x x)) (print (sq 3))").expect("write input");
    let output_path = dir.path().join("nested").join("out.cpp");

    Command::cargo_bin("lispc-cli")
        .expect("binary exists")
        .arg("--input")
        .arg(&input_path)
        .arg("--output")
        .arg(&output_path)
        .arg("--emit")
        .arg("cpp")
        .assert()
        .success();

    let cpp = fs::read_to_string(&output_path).expect("read cpp");
    assert!(cpp.contains("DEF(L0,1,FUNC(Multiply, ARG(0),ARG(0),));"));
    assert!(cpp.contains("FUNC(L0, INT(3),)"));
}

#[test]
fn emits_ast_from_stdin() {
    Command::cargo_bin("lispc-cli")
        .expect("binary exists")
        .arg("--emit")
        .arg("ast")
        .write_stdin("(print 'x) ; done\n")
        .assert()
        .success()
        .stdout(predicate::str::starts_with(concat!(
            "Program\n",
            "    List\n",
            "        Keyword: print\n",
            "        Quoted\n",
            "            Identifier: x\n",
        )));
}

#[test]
fn uses_custom_runtime_template() {
    let dir = tempdir().expect("tempdir");
    let runtime_path = dir.path().join("runtime.hpp");
    fs::write(&runtime_path, "// header\n$1// body\n$2\n").expect("write runtime");

    Command::cargo_bin("lispc-cli")
        .expect("binary exists")
        .arg("--runtime")
        .arg(&runtime_path)
        .arg("--emit")
        .arg("cpp")
        .write_stdin("(defun one () 1) (one)")
        .assert()
        .success()
        .stdout(concat!(
            "// header\nDECLARE(L0);\nDEF(L0,0,INT(1));\n",
            "// body\nSYMBOL(\"one\"),FUNC(L0, ),\n"
        ));
}

#[test]
fn reports_missing_runtime() {
    let dir = tempdir().expect("tempdir");

    Command::cargo_bin("lispc-cli")
        .expect("binary exists")
        .arg("--runtime")
        .arg(dir.path().join("missing.hpp"))
        .arg("--emit")
        .arg("cpp")
        .write_stdin("(print 1)")
        .assert()
        .failure()
        .stderr(predicate::str::contains("runtime template was not found"));
}

#[test]
fn reports_unbound_symbol() {
    Command::cargo_bin("lispc-cli")
        .expect("binary exists")
        .arg("--emit")
        .arg("cpp")
        .write_stdin("(print x)")
        .assert()
        .failure()
        .stderr(predicate::str::contains("symbol not found: x"));
}

#[test]
fn rejects_unknown_emit_format() {
    Command::cargo_bin("lispc-cli")
        .expect("binary exists")
        .arg("--emit")
        .arg("wasm")
        .write_stdin("(print 1)")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported emit format: wasm"));
}

#[test]
fn reports_native_compiler_failure() {
    let dir = tempdir().expect("tempdir");
    let output_path = dir.path().join("program");

    Command::cargo_bin("lispc-cli")
        .expect("binary exists")
        .arg("--output")
        .arg(&output_path)
        .arg("--cxx")
        .arg("false")
        .write_stdin("(print 1)")
        .assert()
        .failure()
        .stderr(predicate::str::contains("compilation failed"));
}

#[test]
fn builds_and_runs_executable() {
    if !cxx_available() {
        eprintln!("g++ not found; skipping");
        return;
    }
    let dir = tempdir().expect("tempdir");
    let input_path = dir.path().join("fact.lisp");
    fs::write(
        &input_path,
        "(defun fact (n) (if (<= n 1) 1 (* n (fact (- n 1)))))\n(print (fact 5))\n",
    )
    .expect("write input");

    Command::cargo_bin("lispc-cli")
        .expect("binary exists")
        .arg("--input")
        .arg(&input_path)
        .arg("--keep-cpp")
        .arg("--run")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Compilation successful. Executable created at:",
        ))
        .stdout(predicate::str::contains("120\n"));

    assert!(dir.path().join("fact.lisp.out").exists());
    assert!(dir.path().join("fact.lisp.cpp").exists());
}

#[test]
fn relays_runtime_failure_status() {
    if !cxx_available() {
        eprintln!("g++ not found; skipping");
        return;
    }
    let dir = tempdir().expect("tempdir");
    let output_path = dir.path().join("divide");

    Command::cargo_bin("lispc-cli")
        .expect("binary exists")
        .arg("--output")
        .arg(&output_path)
        .arg("--cxx-flag")
        .arg("-O0")
        .arg("--run")
        .write_stdin("(print (/ 1 0))")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Runtime Error: Division by zero"));
}

#[test]
fn refuses_to_keep_cpp_over_the_executable() {
    let dir = tempdir().expect("tempdir");
    let output_path = dir.path().join("prog.cpp");

    Command::cargo_bin("lispc-cli")
        .expect("binary exists")
        .arg("--output")
        .arg(&output_path)
        .arg("--keep-cpp")
        .write_stdin("(print 1)")
        .assert()
        .failure()
        .stderr(predicate::str::contains("would overwrite the executable"));

    assert!(!output_path.exists(), "nothing should be built");
}

#[test]
fn builds_nested_functions_that_call_outward() {
    if !cxx_available() {
        eprintln!("g++ not found; skipping");
        return;
    }
    let dir = tempdir().expect("tempdir");
    let output_path = dir.path().join("nested");

    Command::cargo_bin("lispc-cli")
        .expect("binary exists")
        .arg("--output")
        .arg(&output_path)
        .arg("--run")
        .write_stdin("(defun outer (x) (progn (defun inner (y) (outer y)) 1)) (print (outer 1))")
        .assert()
        .success()
        .stdout(predicate::str::contains("1\n"));
}
