//! Wave Compiler CLI
//!
//! `wavec <input> -o <output>` — compiles one Wave source file into a
//! statically-linked ELF64 executable. Exit status 0 on success, 1 on any
//! compilation or I/O error.

use std::path::Path;

fn main() {
    wavec::tracing_setup::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 || args[2] != "-o" {
        eprintln!("Usage: wavec <input> -o <output>");
        std::process::exit(1);
    }

    let input = Path::new(&args[1]);
    let output = Path::new(&args[3]);

    if let Err(e) = wavec::compile_file(input, output) {
        tracing::error!(error = %e, "compilation failed");
        eprintln!("Error: compilation failed");
        std::process::exit(1);
    }
}
