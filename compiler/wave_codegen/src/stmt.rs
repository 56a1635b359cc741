//! Statement compilation: one emitter per construct.
//!
//! Statement dispatch is probe-based: each keyword is matched against the
//! raw bytes at the cursor (with a trailing-delimiter check), and anything
//! that is not a keyword falls through to "identifier followed by `=` or
//! `(`". A line that fits no statement form is skipped silently; malformed
//! bodies of recognized statements are fatal.

use tracing::debug;
use wave_lexer_core::{is_ident_start, probe};

use crate::symbols::{ParamList, MAX_PARAMS};
use crate::x86::{Reg, ARG_REGS};
use crate::{CompileError, Compiler, FN_FRAME_BYTES, VarFrame};

impl Compiler<'_> {
    /// Compile one statement. The cursor sits on its first byte.
    pub(crate) fn compile_statement(&mut self) -> Result<(), CompileError> {
        let b = self.cursor.current();
        match b {
            b'#' => {
                self.cursor.skip_line();
                Ok(())
            }
            b'-' if self.cursor.peek() == b'>' => self.compile_return(),
            _ if probe::at_keyword(&self.cursor, b"out") => self.compile_out(3),
            _ if probe::at_keyword(&self.cursor, b"emit") => self.compile_out(4),
            _ if probe::at_keyword(&self.cursor, b"byte") => self.compile_write_byte(4),
            _ if probe::at_keyword(&self.cursor, b"putchar") => self.compile_write_byte(7),
            _ if probe::at_keyword(&self.cursor, b"getchar") => self.compile_getchar_statement(),
            _ if probe::at_keyword(&self.cursor, b"syscall.exit") => self.compile_exit(),
            _ if probe::at_keyword(&self.cursor, b"when") => self.compile_when(),
            _ if probe::at_keyword(&self.cursor, b"loop") => self.compile_loop(),
            _ if probe::at_keyword(&self.cursor, b"break") => self.compile_break(),
            _ if probe::at_keyword(&self.cursor, b"fn") => self.compile_fn(),
            _ if probe::at_keyword(&self.cursor, b"unified") => self.compile_unified(),
            _ if probe::at_keyword(&self.cursor, b"fate") => self.compile_fate(),
            _ if is_ident_start(b) => self.compile_ident_statement(),
            _ => {
                // Unrecognized leading byte: skip the line.
                self.cursor.skip_line();
                Ok(())
            }
        }
    }

    /// Compile statements until the closing `}` of the current block.
    fn compile_block(&mut self) -> Result<(), CompileError> {
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.current() == b'}' {
                self.cursor.advance();
                return Ok(());
            }
            if self.cursor.is_eof() {
                return Err(CompileError::MissingBlockClose {
                    pos: self.cursor.pos(),
                });
            }
            self.compile_statement()?;
        }
    }

    /// Consume one required punctuation byte.
    pub(crate) fn expect(&mut self, byte: u8) -> Result<(), CompileError> {
        let found = self.cursor.current();
        if found == byte {
            self.cursor.advance();
            Ok(())
        } else {
            Err(CompileError::ExpectedByte {
                expected: char::from(byte),
                found,
                pos: self.cursor.pos(),
            })
        }
    }

    /// `out "STR"` / `emit "RAW"`: embed the literal in the code stream
    /// behind a skip jump, then write it to stdout.
    ///
    /// The two keywords share one emitter: both apply the same escape set
    /// and the same layout, `jmp` over the embedded bytes followed by
    /// `write(STDOUT, lit, len)` with a RIP-relative source operand.
    fn compile_out(&mut self, keyword_len: u32) -> Result<(), CompileError> {
        self.cursor.advance_n(keyword_len);
        self.cursor.skip_whitespace();
        if self.cursor.current() != b'"' {
            return Err(CompileError::ExpectedByte {
                expected: '"',
                found: self.cursor.current(),
                pos: self.cursor.pos(),
            });
        }
        let bytes = probe::read_string(&mut self.cursor)?;

        let skip = self.code.jmp_rel32_slot();
        let literal = self.code.offset();
        self.code.emit_bytes(&bytes);
        self.code.patch_rel32(skip, self.code.offset());

        self.code.mov_imm32(Reg::Rax, 1); // write(2)
        self.code.mov_imm32(Reg::Rdi, 1); // stdout
        let lea = self.code.lea_rsi_rip_slot();
        self.code.patch_rel32(lea, literal);
        // Literal payloads are bounded by the 1 MiB source cap.
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        self.code.mov_imm32(Reg::Rdx, bytes.len() as i32);
        self.code.syscall();
        Ok(())
    }

    /// `byte(expr)` / `putchar(expr)`: write the low byte of the value.
    ///
    /// The value is pushed so its low byte sits at `[rsp]`, written with
    /// `write(STDOUT, rsp, 1)`, then popped.
    fn compile_write_byte(&mut self, keyword_len: u32) -> Result<(), CompileError> {
        self.cursor.advance_n(keyword_len);
        self.cursor.skip_whitespace();
        self.expect(b'(')?;
        self.compile_expr()?;
        self.cursor.skip_whitespace();
        self.expect(b')')?;

        self.code.push_rax();
        self.code.mov_imm32(Reg::Rax, 1); // write(2)
        self.code.mov_imm32(Reg::Rdi, 1); // stdout
        self.code.mov_rsi_rsp();
        self.code.mov_imm32(Reg::Rdx, 1);
        self.code.syscall();
        self.code.pop_rax();
        Ok(())
    }

    /// `getchar()` as a statement: read one byte, discard it.
    fn compile_getchar_statement(&mut self) -> Result<(), CompileError> {
        self.cursor.advance_n(7);
        self.cursor.skip_whitespace();
        self.expect(b'(')?;
        self.cursor.skip_whitespace();
        self.expect(b')')?;
        self.emit_getchar();
        Ok(())
    }

    /// `syscall.exit(expr)`: terminate with the value as exit status.
    fn compile_exit(&mut self) -> Result<(), CompileError> {
        self.cursor.advance_n(12);
        self.cursor.skip_whitespace();
        self.expect(b'(')?;
        self.compile_expr()?;
        self.cursor.skip_whitespace();
        self.expect(b')')?;

        self.code.mov_from_rax(Reg::Rdi);
        self.code.mov_imm32(Reg::Rax, 60); // exit(2)
        self.code.syscall();
        Ok(())
    }

    /// `when EXPR { body }`: `jz` over the body on a false condition.
    /// There is no `else`.
    fn compile_when(&mut self) -> Result<(), CompileError> {
        self.cursor.advance_n(4);
        self.compile_expr()?;
        self.cursor.skip_whitespace();
        self.expect(b'{')?;

        self.code.test_rax_rax();
        let skip = self.code.jz_rel32_slot();
        self.compile_block()?;
        self.code.patch_rel32(skip, self.code.offset());
        Ok(())
    }

    /// `loop { body }`: unconditional back edge, `break` fixups patched to
    /// the instruction after it.
    fn compile_loop(&mut self) -> Result<(), CompileError> {
        self.cursor.advance_n(4);
        self.cursor.skip_whitespace();
        self.expect(b'{')?;

        let start = self.code.offset();
        self.loops.push(start)?;
        self.compile_block()?;

        let back = self.code.jmp_rel32_slot();
        self.code.patch_rel32(back, start);

        if let Some(frame) = self.loops.pop() {
            let exit = self.code.offset();
            for slot in frame.breaks {
                self.code.patch_rel32(slot, exit);
            }
        }
        Ok(())
    }

    /// `break`: reserved forward jump, registered with the innermost loop.
    fn compile_break(&mut self) -> Result<(), CompileError> {
        let pos = self.cursor.pos();
        self.cursor.advance_n(5);
        if !self.loops.in_loop() {
            return Err(CompileError::BreakOutsideLoop { pos });
        }
        let slot = self.code.jmp_rel32_slot();
        self.loops.add_break(slot)
    }

    /// `fn NAME PARAM... { body }`: emit the body inline behind a skip
    /// jump, then patch every call site that was waiting for it.
    fn compile_fn(&mut self) -> Result<(), CompileError> {
        self.cursor.advance_n(2);
        self.cursor.skip_whitespace();
        if !is_ident_start(self.cursor.current()) {
            return Err(CompileError::ExpectedIdent {
                pos: self.cursor.pos(),
            });
        }
        let name = probe::read_ident(&mut self.cursor);

        let mut params = ParamList::new();
        loop {
            self.cursor.skip_whitespace();
            let b = self.cursor.current();
            if b == b'{' {
                self.cursor.advance();
                break;
            }
            if is_ident_start(b) {
                if params.len() == MAX_PARAMS {
                    return Err(CompileError::TooManyParams {
                        name,
                        limit: MAX_PARAMS,
                    });
                }
                params.push(probe::read_ident(&mut self.cursor));
            } else {
                return Err(CompileError::ExpectedByte {
                    expected: '{',
                    found: b,
                    pos: self.cursor.pos(),
                });
            }
        }

        // Execution jumps over the body; calls jump into it.
        let skip = self.code.jmp_rel32_slot();
        let entry = self.code.offset();
        let pending = self.functions.begin_body(name, &params, entry)?;
        for slot in pending {
            self.code.patch_rel32(slot, entry);
        }
        debug!(name = %name, entry, "function body");

        self.code.emit_prologue(FN_FRAME_BYTES);

        // Fresh scope: parameters first, at offsets 8/16/24/32. Only the
        // first four parameters arrive in registers; any further names are
        // recorded in the table but never bound.
        let saved = self.locals.replace(VarFrame::new());
        for (&reg, &param) in ARG_REGS.iter().zip(params.iter()) {
            let offset = self.frame_mut().define(param)?;
            self.code.store_param(reg, offset);
        }

        self.compile_block()?;

        // Default return value is zero.
        self.code.xor_rax_rax();
        self.code.emit_epilogue(FN_FRAME_BYTES);
        self.locals = saved;

        self.code.patch_rel32(skip, self.code.offset());
        Ok(())
    }

    /// `-> EXPR`: evaluate into `rax` and tear down the function frame.
    pub(crate) fn compile_return(&mut self) -> Result<(), CompileError> {
        self.cursor.advance_n(2);
        self.compile_expr()?;
        self.code.emit_epilogue(FN_FRAME_BYTES);
        Ok(())
    }

    /// Fallthrough statement: `NAME = EXPR` assignment, `NAME(args)` call,
    /// or — failing both — skip the line.
    fn compile_ident_statement(&mut self) -> Result<(), CompileError> {
        let name = probe::read_ident(&mut self.cursor);

        if self.cursor.current() == b'(' {
            // Call as statement; the result in rax is discarded.
            return self.compile_call(name);
        }

        self.cursor.skip_whitespace();
        if self.cursor.current() == b'=' && self.cursor.peek() != b'=' {
            self.cursor.advance();
            self.compile_expr()?;
            let offset = self.frame_mut().lookup_or_define(name)?;
            self.code.store_local(offset);
            return Ok(());
        }

        // Not a statement form (`x == 1`, a stray word, ...): skip it.
        self.cursor.skip_line();
        Ok(())
    }

    /// `unified { i: F, e: F, r: F }`: compile-time fixed-point state.
    /// No code is emitted.
    fn compile_unified(&mut self) -> Result<(), CompileError> {
        self.cursor.advance_n(7);
        self.cursor.skip_whitespace();
        self.expect(b'{')?;
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.current() == b'}' {
                self.cursor.advance();
                break;
            }
            if !is_ident_start(self.cursor.current()) {
                return Err(CompileError::MalformedDirective {
                    pos: self.cursor.pos(),
                });
            }
            let key_pos = self.cursor.pos();
            let key = probe::read_ident(&mut self.cursor);
            self.cursor.skip_whitespace();
            self.expect(b':')?;
            self.cursor.skip_whitespace();
            let value = probe::read_fixed_float(&mut self.cursor)?;
            match key.as_bytes() {
                b"i" => self.field.i = value,
                b"e" => self.field.e = value,
                b"r" => self.field.r = value,
                _ => return Err(CompileError::MalformedDirective { pos: key_pos }),
            }
            self.cursor.skip_whitespace();
            if self.cursor.current() == b',' {
                self.cursor.advance();
            }
        }
        debug!(
            i = self.field.i,
            e = self.field.e,
            r = self.field.r,
            "unified field updated (compile-time only)"
        );
        Ok(())
    }

    /// `fate on|off`: compile-time boolean state. No code is emitted.
    fn compile_fate(&mut self) -> Result<(), CompileError> {
        self.cursor.advance_n(4);
        self.cursor.skip_whitespace();
        if probe::at_keyword(&self.cursor, b"on") {
            self.cursor.advance_n(2);
            self.fate = true;
        } else if probe::at_keyword(&self.cursor, b"off") {
            self.cursor.advance_n(3);
            self.fate = false;
        } else {
            return Err(CompileError::MalformedDirective {
                pos: self.cursor.pos(),
            });
        }
        debug!(fate = self.fate, "fate mode updated (compile-time only)");
        Ok(())
    }

    /// Test-only view of the directive state.
    #[cfg(test)]
    pub(crate) fn directive_state(&self) -> (crate::UnifiedField, bool) {
        (self.field, self.fate)
    }
}
