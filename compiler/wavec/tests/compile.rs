//! End-to-end tests: source text in, runnable ELF64 executable out.
//!
//! Image-level checks run everywhere; the compiled executables themselves
//! are spawned and observed only on x86-64 Linux hosts, where they can
//! actually run.

use std::path::Path;
use std::process::Command;

use pretty_assertions::assert_eq;

fn image(source: &str) -> Vec<u8> {
    match wavec::compile_bytes(source.as_bytes()) {
        Ok(image) => image,
        Err(e) => panic!("compile failed: {e}"),
    }
}

fn tempdir() -> tempfile::TempDir {
    match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(e) => panic!("tempdir: {e}"),
    }
}

fn compile_to(dir: &Path, source: &str) -> std::path::PathBuf {
    let src_path = dir.join("prog.wave");
    let exe_path = dir.join("prog");
    if let Err(e) = std::fs::write(&src_path, source) {
        panic!("write source: {e}");
    }
    if let Err(e) = wavec::compile_file(&src_path, &exe_path) {
        panic!("compile: {e}");
    }
    exe_path
}

fn u64_at(image: &[u8], at: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&image[at..at + 8]);
    u64::from_le_bytes(bytes)
}

// === Image shape ===

#[test]
fn image_is_elf64_with_entry_past_the_headers() {
    let image = image("out \"Hello\\n\"\nsyscall.exit(0)");
    assert_eq!(&image[..4], b"\x7FELF");
    // e_entry - p_vaddr == ELF header + program header.
    assert_eq!(u64_at(&image, 24) - u64_at(&image, 80), 0x78);
}

#[test]
fn p_filesz_round_trips_the_actual_file_size() {
    let dir = tempdir();
    let exe = compile_to(dir.path(), "syscall.exit(0)");
    let written = match std::fs::read(&exe) {
        Ok(bytes) => bytes,
        Err(e) => panic!("read executable: {e}"),
    };
    assert_eq!(u64_at(&written, 96), written.len() as u64); // p_filesz
    assert_eq!(u64_at(&written, 104), written.len() as u64); // p_memsz
}

#[test]
fn compile_file_writes_exactly_the_image_bytes() {
    let source = "x = 1\nbyte(48 + x)\nsyscall.exit(0)";
    let dir = tempdir();
    let exe = compile_to(dir.path(), source);
    let written = match std::fs::read(&exe) {
        Ok(bytes) => bytes,
        Err(e) => panic!("read executable: {e}"),
    };
    assert_eq!(written, image(source));
}

#[cfg(unix)]
#[test]
fn output_file_is_executable() {
    use std::os::unix::fs::PermissionsExt;
    let dir = tempdir();
    let exe = compile_to(dir.path(), "syscall.exit(0)");
    let mode = match std::fs::metadata(&exe) {
        Ok(meta) => meta.permissions().mode(),
        Err(e) => panic!("stat: {e}"),
    };
    assert_eq!(mode & 0o777, 0o755);
}

#[test]
fn compiling_twice_is_byte_identical() {
    let source = "fn add a b { -> a + b }\nr = add(7, 8)\nbyte(48 + r - 10)\nsyscall.exit(0)";
    assert_eq!(image(source), image(source));
}

#[test]
fn oversized_source_is_rejected() {
    let source = vec![b'#'; wavec::MAX_SOURCE_BYTES + 1];
    assert!(matches!(
        wavec::compile_bytes(&source),
        Err(wavec::DriverError::SourceTooLarge { .. })
    ));
}

// === The CLI binary ===

#[test]
fn usage_line_and_status_1_on_missing_args() {
    let output = match Command::new(env!("CARGO_BIN_EXE_wavec")).output() {
        Ok(output) => output,
        Err(e) => panic!("spawn wavec: {e}"),
    };
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage: wavec <input> -o <output>"));
}

#[test]
fn fixed_error_line_and_status_1_on_bad_source() {
    let dir = tempdir();
    let src_path = dir.path().join("bad.wave");
    let exe_path = dir.path().join("bad");
    if let Err(e) = std::fs::write(&src_path, "out \"unterminated") {
        panic!("write source: {e}");
    }
    let output = match Command::new(env!("CARGO_BIN_EXE_wavec"))
        .arg(&src_path)
        .arg("-o")
        .arg(&exe_path)
        .output()
    {
        Ok(output) => output,
        Err(e) => panic!("spawn wavec: {e}"),
    };
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: compilation failed"));
}

#[test]
fn cli_compiles_a_program_with_status_0() {
    let dir = tempdir();
    let src_path = dir.path().join("ok.wave");
    let exe_path = dir.path().join("ok");
    if let Err(e) = std::fs::write(&src_path, "out \"Hello\\n\"\nsyscall.exit(0)") {
        panic!("write source: {e}");
    }
    let output = match Command::new(env!("CARGO_BIN_EXE_wavec"))
        .arg(&src_path)
        .arg("-o")
        .arg(&exe_path)
        .output()
    {
        Ok(output) => output,
        Err(e) => panic!("spawn wavec: {e}"),
    };
    assert_eq!(output.status.code(), Some(0));
    assert!(exe_path.exists());
}

// === Running the compiled executables (x86-64 Linux only) ===

#[cfg(all(target_os = "linux", target_arch = "x86_64"))]
mod runtime {
    use super::{compile_to, tempdir};
    use pretty_assertions::assert_eq;
    use std::io::Write as _;
    use std::process::{Command, Stdio};

    /// Compile `source`, run it with `stdin`, return (stdout, exit code).
    fn run(source: &str, stdin: &[u8]) -> (Vec<u8>, i32) {
        let dir = tempdir();
        let exe = compile_to(dir.path(), source);
        let mut child = match Command::new(&exe)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => panic!("spawn compiled program: {e}"),
        };
        if let Some(mut pipe) = child.stdin.take() {
            if let Err(e) = pipe.write_all(stdin) {
                panic!("write stdin: {e}");
            }
        }
        let output = match child.wait_with_output() {
            Ok(output) => output,
            Err(e) => panic!("wait: {e}"),
        };
        (output.stdout, output.status.code().unwrap_or(-1))
    }

    #[test]
    fn hello_world() {
        let (stdout, status) = run("out \"Hello\\n\"\nsyscall.exit(0)", b"");
        assert_eq!(stdout, b"Hello\n");
        assert_eq!(status, 0);
    }

    #[test]
    fn flat_precedence_arithmetic() {
        // x = (2 + 3) * 4 = 20; byte(48 + 20) = 'D'.
        let (stdout, status) = run("x = 2 + 3 * 4\nbyte(48 + x)\nsyscall.exit(0)", b"");
        assert_eq!(stdout, b"D");
        assert_eq!(status, 0);
    }

    #[test]
    fn conditional_runs_its_body() {
        let (stdout, status) = run("x = 5\nwhen x > 3 { out \"big\\n\" }\nsyscall.exit(0)", b"");
        assert_eq!(stdout, b"big\n");
        assert_eq!(status, 0);
    }

    #[test]
    fn false_conditional_skips_its_body() {
        let (stdout, status) = run("x = 2\nwhen x > 3 { out \"big\\n\" }\nsyscall.exit(0)", b"");
        assert_eq!(stdout, b"");
        assert_eq!(status, 0);
    }

    #[test]
    fn loop_with_break() {
        let source = "i = 0\nloop {\n  i = i + 1\n  byte(48 + i)\n  when i >= 5 { break }\n}\nsyscall.exit(0)";
        let (stdout, status) = run(source, b"");
        assert_eq!(stdout, b"12345");
        assert_eq!(status, 0);
    }

    #[test]
    fn function_call_returns_its_value() {
        let source = "fn add a b { -> a + b }\nr = add(7, 8)\nbyte(48 + r - 10)\nsyscall.exit(0)";
        let (stdout, status) = run(source, b"");
        assert_eq!(stdout, b"5");
        assert_eq!(status, 0);
    }

    #[test]
    fn forward_call_reaches_a_later_function() {
        let source = "r = add(2, 3)\nbyte(48 + r)\nsyscall.exit(0)\nfn add a b { -> a + b }";
        let (stdout, status) = run(source, b"");
        assert_eq!(stdout, b"5");
        assert_eq!(status, 0);
    }

    #[test]
    fn escape_sequences_pass_through() {
        let (stdout, status) = run("out \"a\\tb\\n\"\nsyscall.exit(0)", b"");
        assert_eq!(stdout, b"a\tb\n");
        assert_eq!(status, 0);
    }

    #[test]
    fn exit_status_carries_the_value() {
        let (stdout, status) = run("syscall.exit(7)", b"");
        assert_eq!(stdout, b"");
        assert_eq!(status, 7);
    }

    #[test]
    fn implicit_exit_when_falling_off_the_end() {
        let (stdout, status) = run("byte(65)", b"");
        assert_eq!(stdout, b"A");
        assert_eq!(status, 0);
    }

    #[test]
    fn getchar_echoes_stdin() {
        let (stdout, status) = run("x = getchar()\nbyte(x)\nsyscall.exit(0)", b"A");
        assert_eq!(stdout, b"A");
        assert_eq!(status, 0);
    }

    #[test]
    fn getchar_at_eof_reads_zero() {
        let (stdout, status) = run("x = getchar()\nsyscall.exit(x)", b"");
        assert_eq!(stdout, b"");
        assert_eq!(status, 0);
    }

    #[test]
    fn signed_division_truncates_toward_zero() {
        // x = -9, y = x / 2 = -4, exit(0 - y) = 4.
        let source = "x = 0 - 9\ny = x / 2\nsyscall.exit(0 - y)";
        let (stdout, status) = run(source, b"");
        assert_eq!(stdout, b"");
        assert_eq!(status, 4);
    }

    #[test]
    fn recursion_counts_down() {
        // f(n): prints a digit, recurses while n > 1.
        let source = "fn f n {\n  byte(48 + n)\n  when n > 1 { f(n - 1) }\n  -> 0\n}\nf(3)\nsyscall.exit(0)";
        let (stdout, status) = run(source, b"");
        assert_eq!(stdout, b"321");
        assert_eq!(status, 0);
    }

    #[test]
    fn comparison_yields_zero_or_one() {
        let source = "a = 5 == 5\nb = 5 != 5\nbyte(48 + a)\nbyte(48 + b)\nsyscall.exit(0)";
        let (stdout, status) = run(source, b"");
        assert_eq!(stdout, b"10");
        assert_eq!(status, 0);
    }

    #[test]
    fn directives_compile_to_nothing() {
        let source = "unified { i: 1.5, e: 0.25, r: 3 }\nfate on\nbyte(88)\nsyscall.exit(0)";
        let (stdout, status) = run(source, b"");
        assert_eq!(stdout, b"X");
        assert_eq!(status, 0);
    }
}
