//! Expression and call compilation.
//!
//! The grammar is deliberately flat: every operator — `+ - * /` and the
//! six comparisons — shares one precedence level, combined left to right.
//! `2 + 3 * 4` is `(2 + 3) * 4`; precedence beyond that is expressed with
//! intermediate variables. Parentheses are call syntax only.
//!
//! Code shape: the left operand is pushed, the right operand is compiled
//! into `rax`, the left is popped into `rcx`, and the operator is applied.
//! The non-commutative operators swap with `xchg` first so the popped left
//! operand becomes the minuend/dividend. Comparisons materialize 0 or 1.

use wave_lexer_core::{is_ident_start, probe, Ident};

use crate::symbols::MAX_CALL_ARGS;
use crate::x86::{Cond, Reg, ARG_REGS};
use crate::{CompileError, Compiler};

/// The flat operator set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Cmp(Cond),
}

impl Compiler<'_> {
    /// Compile an expression into `rax`.
    ///
    /// Stops at the first byte that is neither an operator nor part of a
    /// term: `)`, `,`, `{`, a statement keyword, EOF...
    pub(crate) fn compile_expr(&mut self) -> Result<(), CompileError> {
        self.compile_term()?;
        loop {
            self.cursor.skip_whitespace();
            let Some(op) = self.scan_binop() else {
                return Ok(());
            };
            self.code.push_rax();
            self.compile_term()?;
            self.code.pop_rcx();
            self.apply_binop(op);
        }
    }

    /// Compile one term into `rax`: an integer literal, `getchar()`, a
    /// call, or a variable.
    ///
    /// An identifier that is neither a call nor a known variable evaluates
    /// to zero — unknown names are tolerated, not errors.
    fn compile_term(&mut self) -> Result<(), CompileError> {
        self.cursor.skip_whitespace();
        let b = self.cursor.current();

        if b.is_ascii_digit() || (b == b'-' && self.cursor.peek().is_ascii_digit()) {
            let value = probe::read_int(&mut self.cursor)?;
            self.code.mov_rax_imm(value);
            return Ok(());
        }

        if is_ident_start(b) {
            let name = probe::read_ident(&mut self.cursor);
            if self.cursor.current() == b'(' {
                if name == Ident::new(b"getchar") {
                    self.cursor.advance();
                    self.cursor.skip_whitespace();
                    self.expect(b')')?;
                    self.emit_getchar();
                } else {
                    self.compile_call(name)?;
                }
            } else {
                match self.frame_mut().lookup(name) {
                    Some(offset) => self.code.load_local(offset),
                    None => self.code.xor_rax_rax(),
                }
            }
            return Ok(());
        }

        Err(CompileError::ExpectedExpression {
            pos: self.cursor.pos(),
        })
    }

    /// Consume and return the operator at the cursor, if any.
    ///
    /// Two-byte operators are probed first so `>=` never half-matches as
    /// `>`. A lone `=` is not an operator (it would be the next
    /// statement's assignment), and `->` is not subtraction (newlines are
    /// whitespace, so a return statement may directly follow an
    /// expression).
    fn scan_binop(&mut self) -> Option<BinOp> {
        let (op, len) = match (self.cursor.current(), self.cursor.peek()) {
            (b'-', b'>') => return None,
            (b'=', b'=') => (BinOp::Cmp(Cond::E), 2),
            (b'!', b'=') => (BinOp::Cmp(Cond::Ne), 2),
            (b'>', b'=') => (BinOp::Cmp(Cond::Ge), 2),
            (b'<', b'=') => (BinOp::Cmp(Cond::Le), 2),
            (b'>', _) => (BinOp::Cmp(Cond::G), 1),
            (b'<', _) => (BinOp::Cmp(Cond::L), 1),
            (b'+', _) => (BinOp::Add, 1),
            (b'-', _) => (BinOp::Sub, 1),
            (b'*', _) => (BinOp::Mul, 1),
            (b'/', _) => (BinOp::Div, 1),
            _ => return None,
        };
        self.cursor.advance_n(len);
        Some(op)
    }

    /// Apply `op` with the left operand in `rcx` and the right in `rax`,
    /// leaving the result in `rax`.
    fn apply_binop(&mut self, op: BinOp) {
        match op {
            BinOp::Add => self.code.add_rax_rcx(),
            BinOp::Sub => {
                self.code.xchg_rax_rcx();
                self.code.sub_rax_rcx();
            }
            BinOp::Mul => self.code.imul_rax_rcx(),
            BinOp::Div => {
                self.code.xchg_rax_rcx();
                self.code.cqo();
                self.code.idiv_rcx();
            }
            BinOp::Cmp(cond) => {
                self.code.cmp_rcx_rax();
                self.code.set_cond_rax(cond);
            }
        }
    }

    /// Compile `NAME(arg, ...)` with the cursor on the `(`.
    ///
    /// Arguments are evaluated left to right, each moved into the next
    /// argument register as soon as it is ready. Calls to functions whose
    /// bodies have not been reached yet reserve their displacement slot on
    /// the callee's fixup list; calls to names the pre-scan never saw emit
    /// the tolerated zero displacement.
    pub(crate) fn compile_call(&mut self, name: Ident) -> Result<(), CompileError> {
        let call_pos = self.cursor.pos();
        self.cursor.advance(); // consume `(`

        let mut argc = 0usize;
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.current() == b')' {
                self.cursor.advance();
                break;
            }
            if argc > 0 {
                self.expect(b',')?;
                self.cursor.skip_whitespace();
            }
            if argc == MAX_CALL_ARGS {
                return Err(CompileError::TooManyArguments {
                    name,
                    pos: call_pos,
                    limit: MAX_CALL_ARGS,
                });
            }
            self.compile_expr()?;
            self.code.mov_from_rax(ARG_REGS[argc]);
            argc += 1;
        }

        match self.functions.lookup_mut(name) {
            Some(entry) => match entry.entry {
                Some(target) => {
                    let slot = self.code.call_rel32_slot();
                    self.code.patch_rel32(slot, target);
                }
                None => {
                    let slot = self.code.call_rel32_slot();
                    entry.pending_calls.push(slot);
                }
            },
            None => self.code.call_rel32(0),
        }
        Ok(())
    }

    /// Inline `getchar`: `read(STDIN, rsp, 1)` against a zero-initialized
    /// one-byte stack slot, result zero-extended into `rax`.
    ///
    /// Zeroing the slot first makes EOF deterministic: a read that writes
    /// nothing leaves 0 behind.
    pub(crate) fn emit_getchar(&mut self) {
        self.code.xor_rax_rax();
        self.code.push_rax();
        self.code.mov_imm32(Reg::Rax, 0); // read(2)
        self.code.mov_imm32(Reg::Rdi, 0); // stdin
        self.code.mov_rsi_rsp();
        self.code.mov_imm32(Reg::Rdx, 1);
        self.code.syscall();
        self.code.movzx_rax_byte_rsp();
        self.code.pop_rcx(); // drop the slot, keep rax
    }
}
