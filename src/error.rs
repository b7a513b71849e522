use std::io;

/// Everything that can go wrong while turning class-file bytes into a model.
///
/// All variants are terminal for the file being parsed. The renderer never
/// produces one.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid magic bytes: 0x{found:08x}")]
    BadMagic { found: u32 },
    #[error("unsupported class file version {major}.{minor}")]
    UnsupportedVersion { major: u16, minor: u16 },
    #[error("unexpected end of input at offset {offset}: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof {
        offset: usize,
        needed: usize,
        remaining: usize,
    },
    #[error("truncated {section} at offset {offset}")]
    TruncatedSection { section: String, offset: usize },
    #[error("unknown constant pool tag {tag} at #{index}")]
    UnknownConstantTag { tag: u8, index: u16 },
    #[error("dangling constant pool reference #{index}, expected {expected}")]
    DanglingReference { index: u16, expected: &'static str },
    #[error("malformed descriptor {descriptor:?}")]
    MalformedDescriptor { descriptor: String },
    #[error("unknown opcode 0x{opcode:02x} at {offset}")]
    UnknownOpcode {
        /// The byte that has no entry in the opcode table.
        opcode: u8,
        /// Offset of that byte within the method body.
        offset: u32,
    },
    #[error("target {target} of instruction at {offset} is outside code of length {code_length}")]
    InvalidTarget {
        offset: u32,
        target: i64,
        code_length: u32,
    },
    #[error("attribute {name} declares {declared} bytes but {consumed} were decoded")]
    AttributeLengthMismatch {
        name: String,
        declared: u32,
        consumed: u64,
    },
    #[error("invalid method handle reference kind {kind} at #{index}")]
    InvalidReferenceKind { kind: u8, index: u16 },
    #[error("invalid stack map frame type {frame_type}")]
    InvalidStackMapFrame { frame_type: u8 },
    #[error("invalid newarray type code {code} at {offset}")]
    InvalidArrayType { code: u8, offset: u32 },
}

impl ParseError {
    pub(crate) fn truncated(section: impl Into<String>, offset: usize) -> ParseError {
        ParseError::TruncatedSection {
            section: section.into(),
            offset,
        }
    }

    pub(crate) fn dangling(index: u16, expected: &'static str) -> ParseError {
        ParseError::DanglingReference { index, expected }
    }

    /// Reinterprets running out of bytes as a truncated `section`.
    pub(crate) fn in_section(self, section: &str) -> ParseError {
        match self {
            ParseError::UnexpectedEof { offset, .. } => ParseError::truncated(section, offset),
            e => e,
        }
    }
}

/// Failure to disassemble a file on disk.
#[derive(Debug, thiserror::Error)]
pub enum DisassembleError {
    #[error("failed to read class file")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
}
