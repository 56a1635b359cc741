//! Single-pass x86-64 code generator for the Wave programming language.
//!
//! Wave compiles with no intermediate representation: the statement
//! compiler walks the source bytes once, emitting machine code as it goes.
//! Forward control flow (`when` bodies, `break`, calls to functions whose
//! bodies appear later) is handled by reserving 4-byte rel32 slots and
//! patching them when the target offset becomes known.
//!
//! # Architecture
//!
//! ```text
//! SourceBuffer
//!     |
//!     v
//! prescan()  -- fills FnTable with names + arities
//!     |
//!     v
//! Compiler::run  -- statement compiler  -> instruction emitters -> CodeBuffer
//!     |
//!     v
//! raw code bytes  (the ELF writer lives in `wave_elf`)
//! ```
//!
//! The expression discipline is a single accumulator: every expression
//! lands in `rax`, pending left operands wait on the machine stack, and
//! all operators share one precedence level, combined left to right.

mod buffer;
mod directive;
mod error;
mod expr;
mod prescan;
mod stmt;
mod symbols;
mod x86;

pub use buffer::{CodeBuffer, MAX_CODE_BYTES};
pub use directive::UnifiedField;
pub use error::CompileError;
pub use prescan::prescan;
pub use symbols::{
    FnEntry, FnTable, LoopFrame, LoopStack, ParamList, VarFrame, MAX_BREAK_FIXUPS, MAX_CALL_ARGS,
    MAX_FUNCTIONS, MAX_LOOP_DEPTH, MAX_PARAMS, MAX_VARIABLES,
};
pub use x86::{Cond, Reg, ARG_REGS};

use tracing::{debug, warn};
use wave_lexer_core::{Cursor, SourceBuffer};

/// Stack frame reserved by the top-level prologue.
pub const TOP_FRAME_BYTES: u32 = 0x2000;
/// Stack frame reserved by every function prologue.
pub const FN_FRAME_BYTES: u32 = 0x400;

/// Compile Wave source into raw x86-64 code bytes.
///
/// The returned buffer starts with the global prologue (the ELF entry
/// point) and contains every function body inline behind a skip jump, in
/// source order. Wrap it with [`wave_elf`'s] image builder to obtain a
/// runnable executable.
///
/// [`wave_elf`'s]: https://docs.rs/wave_elf
pub fn compile(source: &SourceBuffer) -> Result<Vec<u8>, CompileError> {
    let mut functions = FnTable::new();
    prescan(source, &mut functions)?;
    Compiler::new(source.cursor(), functions).run()
}

/// The single-pass statement/expression compiler.
///
/// Owns the cursor, the code buffer and all symbol state for one run.
/// Created by [`compile`]; the per-construct emitters live in `stmt.rs`
/// and `expr.rs`.
struct Compiler<'a> {
    cursor: Cursor<'a>,
    code: CodeBuffer,
    functions: FnTable,
    /// Top-level variables.
    globals: VarFrame,
    /// The active function frame, when compiling inside a `fn` body.
    locals: Option<VarFrame>,
    loops: LoopStack,
    field: UnifiedField,
    fate: bool,
}

impl<'a> Compiler<'a> {
    fn new(cursor: Cursor<'a>, functions: FnTable) -> Self {
        Self {
            cursor,
            code: CodeBuffer::new(),
            functions,
            globals: VarFrame::new(),
            locals: None,
            loops: LoopStack::new(),
            field: UnifiedField::default(),
            fate: false,
        }
    }

    /// The variable frame statements currently resolve against: the
    /// enclosing function's, or the top-level frame.
    fn frame_mut(&mut self) -> &mut VarFrame {
        self.locals.as_mut().unwrap_or(&mut self.globals)
    }

    fn run(mut self) -> Result<Vec<u8>, CompileError> {
        // The entry point: the first emitted byte is this prologue.
        self.code.emit_prologue(TOP_FRAME_BYTES);

        loop {
            self.cursor.skip_whitespace();
            if self.cursor.is_eof() {
                break;
            }
            self.compile_statement()?;
            if self.code.len() > MAX_CODE_BYTES {
                return Err(CompileError::CodeTooLarge {
                    limit: MAX_CODE_BYTES,
                });
            }
        }

        // Programs that fall off the end exit cleanly instead of running
        // into unmapped memory.
        self.code.mov_imm32(Reg::Rdi, 0);
        self.code.mov_imm32(Reg::Rax, 60);
        self.code.syscall();

        for entry in self.functions.iter() {
            if !entry.pending_calls.is_empty() {
                warn!(
                    name = %entry.name,
                    sites = entry.pending_calls.len(),
                    "calls to undefined function keep a zero displacement"
                );
            }
        }
        debug!(bytes = self.code.len(), "code generation complete");

        Ok(self.code.into_bytes())
    }
}
