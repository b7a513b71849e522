use std::fs;
use std::path::Path;

use time::OffsetDateTime;

pub mod class_file;
pub mod cursor;
pub mod descriptor;
pub mod error;
pub mod instructions;
pub mod reader;
pub mod render;

pub use error::{DisassembleError, ParseError};

use crate::reader::ClassReader;
use crate::render::FileHeader;

/// Disassembles the bytes of a single class file into javap's verbose
/// listing, without the `Classfile` header.
pub fn disassemble(bytes: &[u8]) -> Result<String, ParseError> {
    let class_file = ClassReader::new(bytes).read_class_file()?;
    Ok(render::render(&class_file))
}

/// Disassembles a class file on disk, prefixed with its path, modification
/// date, size and checksum.
pub fn disassemble_file(path: &Path) -> Result<String, DisassembleError> {
    let path = fs::canonicalize(path)?;
    let bytes = fs::read(&path)?;
    let modified = OffsetDateTime::from(fs::metadata(&path)?.modified()?);

    log::debug!("read {} bytes from {}", bytes.len(), path.display());

    let body = disassemble(&bytes)?;
    let header = FileHeader::new(&path, &bytes, modified);

    Ok(header.render() + &body)
}
