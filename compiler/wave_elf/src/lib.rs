//! Minimal ELF64 image writer for Wave executables.
//!
//! The image is the smallest thing the kernel will `execve`: a 64-byte
//! ELF header, one 56-byte `PT_LOAD` program header, and the raw code
//! bytes immediately after. The whole file — headers included — is mapped
//! RWX at [`BASE_ADDR`], so file offsets and virtual addresses coincide
//! up to that base, and the entry point is simply the first code byte at
//! offset [`CODE_OFFSET`].
//!
//! No section headers, no symbol table, no interpreter: the emitted
//! program talks to the kernel directly through `syscall`.

use std::io::{self, Write};

/// Virtual address the single `PT_LOAD` segment is mapped at.
pub const BASE_ADDR: u64 = 0x40_0000;

/// Size of the ELF64 header.
pub const EHDR_SIZE: usize = 64;

/// Size of one program header entry.
pub const PHDR_SIZE: usize = 56;

/// File offset (and virtual offset from [`BASE_ADDR`]) of the first code
/// byte: ELF header + one program header = 0x78.
pub const CODE_OFFSET: usize = EHDR_SIZE + PHDR_SIZE;

/// Build a runnable ELF64 image around raw code bytes.
///
/// Pure function: the same code always yields the same image. The entry
/// point is `BASE_ADDR + CODE_OFFSET` — the caller guarantees the first
/// code byte is its program's prologue.
pub fn build_image(code: &[u8]) -> Vec<u8> {
    let file_size = (CODE_OFFSET + code.len()) as u64;
    let mut image = Vec::with_capacity(CODE_OFFSET + code.len());

    // --- ELF header (64 bytes) ---
    image.extend_from_slice(&[
        0x7F, b'E', b'L', b'F', // EI_MAG
        0x02, // EI_CLASS = ELFCLASS64
        0x01, // EI_DATA = little-endian
        0x01, // EI_VERSION
        0x00, // EI_OSABI = System V
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // EI_PAD
    ]);
    image.extend_from_slice(&2u16.to_le_bytes()); // e_type = ET_EXEC
    image.extend_from_slice(&0x3Eu16.to_le_bytes()); // e_machine = EM_X86_64
    image.extend_from_slice(&1u32.to_le_bytes()); // e_version = EV_CURRENT
    image.extend_from_slice(&(BASE_ADDR + CODE_OFFSET as u64).to_le_bytes()); // e_entry
    image.extend_from_slice(&(EHDR_SIZE as u64).to_le_bytes()); // e_phoff
    image.extend_from_slice(&0u64.to_le_bytes()); // e_shoff: no sections
    image.extend_from_slice(&0u32.to_le_bytes()); // e_flags
    image.extend_from_slice(&(EHDR_SIZE as u16).to_le_bytes()); // e_ehsize
    image.extend_from_slice(&(PHDR_SIZE as u16).to_le_bytes()); // e_phentsize
    image.extend_from_slice(&1u16.to_le_bytes()); // e_phnum
    image.extend_from_slice(&0u16.to_le_bytes()); // e_shentsize
    image.extend_from_slice(&0u16.to_le_bytes()); // e_shnum
    image.extend_from_slice(&0u16.to_le_bytes()); // e_shstrndx

    // --- Program header (56 bytes) ---
    image.extend_from_slice(&1u32.to_le_bytes()); // p_type = PT_LOAD
    image.extend_from_slice(&7u32.to_le_bytes()); // p_flags = R|W|X
    image.extend_from_slice(&0u64.to_le_bytes()); // p_offset: whole file
    image.extend_from_slice(&BASE_ADDR.to_le_bytes()); // p_vaddr
    image.extend_from_slice(&BASE_ADDR.to_le_bytes()); // p_paddr
    image.extend_from_slice(&file_size.to_le_bytes()); // p_filesz
    image.extend_from_slice(&file_size.to_le_bytes()); // p_memsz
    image.extend_from_slice(&0x1000u64.to_le_bytes()); // p_align

    debug_assert_eq!(image.len(), CODE_OFFSET);

    // --- Code ---
    image.extend_from_slice(code);
    image
}

/// Write the image for `code` to `sink`.
pub fn write_image<W: Write>(sink: &mut W, code: &[u8]) -> io::Result<()> {
    sink.write_all(&build_image(code))
}
