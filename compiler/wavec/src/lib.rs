//! Wave compiler driver.
//!
//! Threads one compilation from input to output:
//!
//! ```text
//! input file
//!     |
//!     v
//! SourceBuffer ──> prescan + codegen (wave_codegen) ──> code bytes
//!                                                          |
//!                                                          v
//!                                          ELF64 image (wave_elf)
//!                                                          |
//!                                                          v
//!                                          output file, mode 0755
//! ```
//!
//! The driver owns the one-shot lifetime: buffers are allocated once,
//! files are scoped to [`compile_file`], and the first error aborts the
//! run. The CLI in `main.rs` maps every error onto the fixed
//! `Error: compilation failed` line and exit status 1.

pub mod tracing_setup;

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use thiserror::Error;
use tracing::debug;
use wave_lexer_core::SourceBuffer;

pub use wave_codegen::CompileError;

/// Input size ceiling (1 MiB).
pub const MAX_SOURCE_BYTES: usize = 1024 * 1024;

/// A driver failure: oversized input, compilation error, or I/O error.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The input file exceeds [`MAX_SOURCE_BYTES`].
    #[error("input is {len} bytes; sources are capped at {limit}")]
    SourceTooLarge {
        /// Actual input size.
        len: usize,
        /// The cap.
        limit: usize,
    },
    /// The source failed to compile.
    #[error(transparent)]
    Compile(#[from] CompileError),
    /// Reading the input or writing the output failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Compile Wave source bytes into a complete ELF64 image.
pub fn compile_bytes(source: &[u8]) -> Result<Vec<u8>, DriverError> {
    if source.len() > MAX_SOURCE_BYTES {
        return Err(DriverError::SourceTooLarge {
            len: source.len(),
            limit: MAX_SOURCE_BYTES,
        });
    }
    let buffer = SourceBuffer::new(source);
    let code = wave_codegen::compile(&buffer)?;
    debug!(code_bytes = code.len(), "building ELF image");
    Ok(wave_elf::build_image(&code))
}

/// Compile `input` into the executable `output` (created with mode 0755).
pub fn compile_file(input: &Path, output: &Path) -> Result<(), DriverError> {
    let source = fs::read(input)?;
    debug!(input = %input.display(), bytes = source.len(), "read source");
    let image = compile_bytes(&source)?;

    let mut options = OpenOptions::new();
    options.create(true).write(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o755);
    }
    let mut file = options.open(output)?;
    file.write_all(&image)?;
    debug!(output = %output.display(), bytes = image.len(), "wrote executable");
    Ok(())
}
