//! x86-64 instruction emitters.
//!
//! Each method appends one fixed instruction encoding to the
//! [`CodeBuffer`]. Names follow mnemonic intent. The emitted programs use
//! the System V register convention only as far as Wave needs it: `rax` is
//! the accumulator and return register, `rcx` the scratch for popped left
//! operands, and `rdi`/`rsi`/`rdx`/`rcx` carry the first four call
//! arguments (and the syscall arguments).
//!
//! Frame addressing is always `[rbp - offset]` with a signed 32-bit
//! displacement; branch and call operands are always rel32 with the
//! displacement slot as the final operand, so
//! [`CodeBuffer::patch_rel32`] applies uniformly.

use crate::buffer::CodeBuffer;

/// General-purpose registers used by the emitted code, with their ModRM
/// register numbers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Reg {
    /// Accumulator / return value / syscall number.
    Rax = 0,
    /// Scratch for popped left operands; fourth argument.
    Rcx = 1,
    /// Third argument.
    Rdx = 2,
    /// Second argument.
    Rsi = 6,
    /// First argument.
    Rdi = 7,
}

/// The four argument registers, in call order.
pub const ARG_REGS: [Reg; 4] = [Reg::Rdi, Reg::Rsi, Reg::Rdx, Reg::Rcx];

/// Condition codes for `setCC`, by opcode low nibble.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Cond {
    /// `==`
    E = 0x4,
    /// `!=`
    Ne = 0x5,
    /// `<` (signed)
    L = 0xC,
    /// `>=` (signed)
    Ge = 0xD,
    /// `<=` (signed)
    Le = 0xE,
    /// `>` (signed)
    G = 0xF,
}

impl CodeBuffer {
    // === Stack frames ===

    /// `push rbp`
    pub fn push_rbp(&mut self) {
        self.emit_u8(0x55);
    }

    /// `mov rbp, rsp`
    pub fn mov_rbp_rsp(&mut self) {
        self.emit_bytes(&[0x48, 0x89, 0xE5]);
    }

    /// `sub rsp, imm32`
    pub fn sub_rsp_imm32(&mut self, bytes: u32) {
        self.emit_bytes(&[0x48, 0x81, 0xEC]);
        self.emit_u32(bytes);
    }

    /// `add rsp, imm32`
    pub fn add_rsp_imm32(&mut self, bytes: u32) {
        self.emit_bytes(&[0x48, 0x81, 0xC4]);
        self.emit_u32(bytes);
    }

    /// `pop rbp`
    pub fn pop_rbp(&mut self) {
        self.emit_u8(0x5D);
    }

    /// `ret`
    pub fn ret(&mut self) {
        self.emit_u8(0xC3);
    }

    /// Frame entry: `push rbp; mov rbp, rsp; sub rsp, frame`.
    pub fn emit_prologue(&mut self, frame: u32) {
        self.push_rbp();
        self.mov_rbp_rsp();
        self.sub_rsp_imm32(frame);
    }

    /// Frame exit: `add rsp, frame; pop rbp; ret`.
    pub fn emit_epilogue(&mut self, frame: u32) {
        self.add_rsp_imm32(frame);
        self.pop_rbp();
        self.ret();
    }

    // === Immediates and moves ===

    /// `mov rax, imm` — sign-extended imm32 form when the value fits,
    /// `movabs` otherwise.
    pub fn mov_rax_imm(&mut self, value: i64) {
        if let Ok(small) = i32::try_from(value) {
            self.mov_imm32(Reg::Rax, small);
        } else {
            // movabs rax, imm64
            self.emit_bytes(&[0x48, 0xB8]);
            #[allow(clippy::cast_sign_loss)] // bit-for-bit immediate
            self.emit_u64(value as u64);
        }
    }

    /// `mov <reg>, imm32` (sign-extended, `48 C7 /0`).
    #[allow(clippy::cast_sign_loss)] // bit-for-bit immediate
    pub fn mov_imm32(&mut self, reg: Reg, value: i32) {
        self.emit_bytes(&[0x48, 0xC7, 0xC0 | reg as u8]);
        self.emit_u32(value as u32);
    }

    /// `mov <reg>, rax`
    pub fn mov_from_rax(&mut self, reg: Reg) {
        self.emit_bytes(&[0x48, 0x89, 0xC0 | reg as u8]);
    }

    /// `mov rsi, rsp` — the buffer operand for one-byte read/write
    /// syscalls.
    pub fn mov_rsi_rsp(&mut self) {
        self.emit_bytes(&[0x48, 0x89, 0xE6]);
    }

    // === Frame slots ===

    /// `mov [rbp - frame_offset], rax`
    pub fn store_local(&mut self, frame_offset: u32) {
        self.emit_bytes(&[0x48, 0x89, 0x85]);
        self.emit_u32(disp32(frame_offset));
    }

    /// `mov rax, [rbp - frame_offset]`
    pub fn load_local(&mut self, frame_offset: u32) {
        self.emit_bytes(&[0x48, 0x8B, 0x85]);
        self.emit_u32(disp32(frame_offset));
    }

    /// `mov [rbp - frame_offset], <arg reg>` — spills an incoming argument
    /// into its parameter slot.
    pub fn store_param(&mut self, reg: Reg, frame_offset: u32) {
        self.emit_bytes(&[0x48, 0x89, 0x85 | ((reg as u8) << 3)]);
        self.emit_u32(disp32(frame_offset));
    }

    // === Machine stack ===

    /// `push rax`
    pub fn push_rax(&mut self) {
        self.emit_u8(0x50);
    }

    /// `pop rax`
    pub fn pop_rax(&mut self) {
        self.emit_u8(0x58);
    }

    /// `pop rcx`
    pub fn pop_rcx(&mut self) {
        self.emit_u8(0x59);
    }

    // === Arithmetic (left operand in rcx, right in rax) ===

    /// `xchg rax, rcx` — swaps the popped left operand into `rax` for the
    /// non-commutative operators.
    pub fn xchg_rax_rcx(&mut self) {
        self.emit_bytes(&[0x48, 0x91]);
    }

    /// `add rax, rcx`
    pub fn add_rax_rcx(&mut self) {
        self.emit_bytes(&[0x48, 0x01, 0xC8]);
    }

    /// `sub rax, rcx`
    pub fn sub_rax_rcx(&mut self) {
        self.emit_bytes(&[0x48, 0x29, 0xC8]);
    }

    /// `imul rax, rcx`
    pub fn imul_rax_rcx(&mut self) {
        self.emit_bytes(&[0x48, 0x0F, 0xAF, 0xC1]);
    }

    /// `cqo` — sign-extend rax into rdx:rax ahead of `idiv`.
    pub fn cqo(&mut self) {
        self.emit_bytes(&[0x48, 0x99]);
    }

    /// `idiv rcx` — signed 64-bit division of rdx:rax.
    pub fn idiv_rcx(&mut self) {
        self.emit_bytes(&[0x48, 0xF7, 0xF9]);
    }

    /// `xor rax, rax`
    pub fn xor_rax_rax(&mut self) {
        self.emit_bytes(&[0x48, 0x31, 0xC0]);
    }

    // === Comparisons ===

    /// `cmp rcx, rax` — compares left (rcx) against right (rax).
    pub fn cmp_rcx_rax(&mut self) {
        self.emit_bytes(&[0x48, 0x39, 0xC1]);
    }

    /// `setCC al; movzx rax, al` — materializes a comparison as 0 or 1.
    pub fn set_cond_rax(&mut self, cond: Cond) {
        self.emit_bytes(&[0x0F, 0x90 | cond as u8, 0xC0]);
        self.emit_bytes(&[0x48, 0x0F, 0xB6, 0xC0]);
    }

    // === Branches and calls ===

    /// `test rax, rax`
    pub fn test_rax_rax(&mut self) {
        self.emit_bytes(&[0x48, 0x85, 0xC0]);
    }

    /// `jz rel32` with a reserved displacement; returns the slot offset.
    pub fn jz_rel32_slot(&mut self) -> u32 {
        self.emit_bytes(&[0x0F, 0x84]);
        self.reserve_u32()
    }

    /// `jmp rel32` with a reserved displacement; returns the slot offset.
    pub fn jmp_rel32_slot(&mut self) -> u32 {
        self.emit_u8(0xE9);
        self.reserve_u32()
    }

    /// `call rel32` with an immediate displacement.
    ///
    /// A zero displacement is the tolerated encoding for calls to
    /// functions that never get a body: control falls through to the next
    /// instruction at runtime.
    #[allow(clippy::cast_sign_loss)] // bit-for-bit displacement
    pub fn call_rel32(&mut self, disp: i32) {
        self.emit_u8(0xE8);
        self.emit_u32(disp as u32);
    }

    /// `call rel32` with a reserved displacement; returns the slot offset.
    pub fn call_rel32_slot(&mut self) -> u32 {
        self.emit_u8(0xE8);
        self.reserve_u32()
    }

    /// `lea rsi, [rip + rel32]` with a reserved displacement; returns the
    /// slot offset. Used for string literal addressing.
    pub fn lea_rsi_rip_slot(&mut self) -> u32 {
        self.emit_bytes(&[0x48, 0x8D, 0x35]);
        self.reserve_u32()
    }

    // === System calls ===

    /// `syscall`
    pub fn syscall(&mut self) {
        self.emit_bytes(&[0x0F, 0x05]);
    }

    /// `movzx rax, byte [rsp]` — fetch the one-byte I/O buffer.
    pub fn movzx_rax_byte_rsp(&mut self) {
        self.emit_bytes(&[0x48, 0x0F, 0xB6, 0x04, 0x24]);
    }
}

/// A frame offset as the signed 32-bit displacement below `rbp`.
#[allow(clippy::cast_sign_loss, clippy::cast_possible_wrap)] // bit-for-bit displacement
fn disp32(frame_offset: u32) -> u32 {
    -(frame_offset as i32) as u32
}
