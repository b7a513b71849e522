use strum::{FromRepr, IntoStaticStr};

use crate::class_file::constant_pool::{ConstantPool, Tag};
use crate::cursor::ByteCursor;
use crate::error::ParseError;

#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromRepr, IntoStaticStr)]
#[repr(u8)]
pub enum Opcode {
    // Constants
    nop = 0x00,
    aconst_null,
    iconst_m1,
    iconst_0,
    iconst_1,
    iconst_2,
    iconst_3,
    iconst_4,
    iconst_5,
    lconst_0,
    lconst_1,
    fconst_0,
    fconst_1,
    fconst_2,
    dconst_0,
    dconst_1,
    bipush,
    sipush,
    ldc,
    ldc_w,
    ldc2_w,
    // Loads
    iload = 0x15,
    lload,
    fload,
    dload,
    aload,
    iload_0,
    iload_1,
    iload_2,
    iload_3,
    lload_0,
    lload_1,
    lload_2,
    lload_3,
    fload_0,
    fload_1,
    fload_2,
    fload_3,
    dload_0,
    dload_1,
    dload_2,
    dload_3,
    aload_0 = 0x2a,
    aload_1,
    aload_2,
    aload_3,
    iaload,
    laload,
    faload,
    daload,
    aaload,
    baload,
    caload,
    saload,
    // Stores
    istore = 0x36,
    lstore,
    fstore,
    dstore,
    astore,
    istore_0,
    istore_1,
    istore_2,
    istore_3,
    lstore_0,
    lstore_1,
    lstore_2,
    lstore_3,
    fstore_0,
    fstore_1,
    fstore_2,
    fstore_3,
    dstore_0,
    dstore_1,
    dstore_2,
    dstore_3,
    astore_0,
    astore_1,
    astore_2,
    astore_3,
    iastore = 0x4f,
    lastore,
    fastore,
    dastore,
    aastore,
    bastore,
    castore,
    sastore,
    // Stack
    pop = 0x57,
    pop2,
    dup,
    dup_x1,
    dup_x2,
    dup2,
    dup2_x1,
    dup2_x2,
    swap,
    // Math
    iadd = 0x60,
    ladd,
    fadd,
    dadd,
    isub,
    lsub,
    fsub,
    dsub,
    imul,
    lmul,
    fmul,
    dmul,
    idiv,
    ldiv,
    fdiv,
    ddiv,
    irem,
    lrem,
    frem,
    drem,
    ineg,
    lneg,
    fneg,
    dneg,
    ishl,
    lshl,
    ishr,
    lshr,
    iushr,
    lushr,
    iand,
    land,
    ior,
    lor,
    ixor,
    lxor,
    iinc = 0x84,
    // Conversions
    i2l,
    i2f,
    i2d,
    l2i,
    l2f,
    l2d,
    f2i,
    f2l,
    f2d,
    d2i,
    d2l,
    d2f,
    i2b,
    i2c,
    i2s,
    // Comparisons
    lcmp = 0x94,
    fcmpl,
    fcmpg,
    dcmpl,
    dcmpg,
    ifeq = 0x99,
    ifne,
    iflt,
    ifge,
    ifgt,
    ifle,
    if_icmpeq,
    if_icmpne,
    if_icmplt,
    if_icmpge,
    if_icmpgt,
    if_icmple,
    if_acmpeq,
    if_acmpne,
    // Control
    goto = 0xa7,
    jsr,
    ret,
    tableswitch,
    lookupswitch,
    ireturn,
    lreturn,
    freturn,
    dreturn,
    areturn,
    #[strum(serialize = "return")]
    r#return,
    // References
    getstatic = 0xb2,
    putstatic,
    getfield,
    putfield,
    invokevirtual,
    invokespecial,
    invokestatic,
    invokeinterface,
    invokedynamic,
    new,
    newarray,
    anewarray,
    arraylength,
    athrow,
    checkcast,
    instanceof,
    monitorenter,
    monitorexit,
    // Extended
    wide = 0xc4,
    multianewarray,
    ifnull,
    ifnonnull,
    goto_w,
    jsr_w = 0xc9,
}

/// How the bytes following an opcode are laid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Layout {
    None,
    Local,
    Byte,
    Short,
    Constant1,
    Constant2,
    Increment,
    Branch2,
    Branch4,
    NewArray,
    InvokeInterface,
    InvokeDynamic,
    MultiANewArray,
    TableSwitch,
    LookupSwitch,
    Wide,
}

const LOADABLE: &[Tag] = &[
    Tag::Integer,
    Tag::Float,
    Tag::String,
    Tag::Class,
    Tag::MethodHandle,
    Tag::MethodType,
    Tag::Dynamic,
];

impl Opcode {
    pub fn mnemonic(self) -> &'static str {
        self.into()
    }

    fn layout(self) -> Layout {
        use Opcode::*;
        match self {
            iload | lload | fload | dload | aload | istore | lstore | fstore | dstore
            | astore | ret => Layout::Local,
            bipush => Layout::Byte,
            sipush => Layout::Short,
            ldc => Layout::Constant1,
            ldc_w | ldc2_w | getstatic | putstatic | getfield | putfield | invokevirtual
            | invokespecial | invokestatic | new | anewarray | checkcast | instanceof => {
                Layout::Constant2
            }
            iinc => Layout::Increment,
            ifeq | ifne | iflt | ifge | ifgt | ifle | if_icmpeq | if_icmpne | if_icmplt
            | if_icmpge | if_icmpgt | if_icmple | if_acmpeq | if_acmpne | goto | jsr | ifnull
            | ifnonnull => Layout::Branch2,
            goto_w | jsr_w => Layout::Branch4,
            newarray => Layout::NewArray,
            invokeinterface => Layout::InvokeInterface,
            invokedynamic => Layout::InvokeDynamic,
            multianewarray => Layout::MultiANewArray,
            tableswitch => Layout::TableSwitch,
            lookupswitch => Layout::LookupSwitch,
            wide => Layout::Wide,
            _ => Layout::None,
        }
    }

    /// Constant kinds the operand of this opcode may refer to.
    fn constant_kinds(self) -> (&'static [Tag], &'static str) {
        use Opcode::*;
        match self {
            ldc | ldc_w => (LOADABLE, "loadable constant"),
            ldc2_w => (&[Tag::Long, Tag::Double, Tag::Dynamic], "Long or Double"),
            getstatic | putstatic | getfield | putfield => (&[Tag::Fieldref], "Fieldref"),
            invokevirtual => (&[Tag::Methodref], "Methodref"),
            invokespecial | invokestatic => (
                &[Tag::Methodref, Tag::InterfaceMethodref],
                "Methodref or InterfaceMethodref",
            ),
            invokeinterface => (&[Tag::InterfaceMethodref], "InterfaceMethodref"),
            invokedynamic => (&[Tag::InvokeDynamic], "InvokeDynamic"),
            _ => (&[Tag::Class], "Class"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, FromRepr, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum ArrayType {
    Boolean = 4,
    Char,
    Float,
    Double,
    Byte,
    Short,
    Int,
    Long,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operands {
    None,
    Local(u16),
    LocalIncrement { index: u16, value: i16 },
    Immediate(i32),
    ArrayType(ArrayType),
    Constant(u16),
    InvokeInterface { index: u16, count: u8 },
    InvokeDynamic { index: u16 },
    MultiANewArray { index: u16, dimensions: u8 },
    /// Absolute target offset.
    Branch(u32),
    TableSwitch {
        default: u32,
        low: i32,
        high: i32,
        targets: Vec<u32>,
    },
    LookupSwitch {
        default: u32,
        pairs: Vec<(i32, u32)>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub offset: u32,
    pub opcode: Opcode,
    /// Set when the instruction carried a `wide` prefix. `offset` is then the
    /// prefix's offset and `opcode` the modified one.
    pub wide: bool,
    pub length: u32,
    pub operands: Operands,
}

impl Instruction {
    pub fn mnemonic(&self) -> String {
        if self.wide {
            format!("{}_w", self.opcode.mnemonic())
        } else {
            self.opcode.mnemonic().to_owned()
        }
    }

    /// The constant pool entry the instruction refers to, if any.
    pub fn constant_index(&self) -> Option<u16> {
        match self.operands {
            Operands::Constant(index)
            | Operands::InvokeInterface { index, .. }
            | Operands::InvokeDynamic { index }
            | Operands::MultiANewArray { index, .. } => Some(index),
            _ => None,
        }
    }

    /// Operand text for single-line instructions. Switches render their
    /// tables separately.
    pub fn operand_text(&self) -> String {
        match &self.operands {
            Operands::None | Operands::TableSwitch { .. } | Operands::LookupSwitch { .. } => {
                String::new()
            }
            Operands::Local(index) => index.to_string(),
            Operands::LocalIncrement { index, value } => format!("{index}, {value}"),
            Operands::Immediate(value) => value.to_string(),
            Operands::ArrayType(ty) => format!(" {}", <&str>::from(*ty)),
            Operands::Constant(index) => format!("#{index}"),
            Operands::InvokeInterface { index, count } => format!("#{index},  {count}"),
            Operands::InvokeDynamic { index } => format!("#{index},  0"),
            Operands::MultiANewArray { index, dimensions } => format!("#{index},  {dimensions}"),
            Operands::Branch(target) => target.to_string(),
        }
    }
}

/// Decodes a method body into instructions that tile it exactly.
///
/// Offsets are relative to the start of `code`, which is also the origin
/// for switch padding.
pub fn decode(code: &[u8], pool: &ConstantPool) -> Result<Vec<Instruction>, ParseError> {
    let mut decoder = Decoder {
        cursor: ByteCursor::new(code),
        code_length: code.len() as u32,
        pool,
    };

    let mut instructions = vec![];
    while decoder.cursor.remaining() > 0 {
        let instruction = decoder.next().map_err(|e| e.in_section("code"))?;
        log::trace!("{:>5}: {:?}", instruction.offset, instruction.opcode);
        instructions.push(instruction);
    }

    Ok(instructions)
}

struct Decoder<'a, 'p> {
    cursor: ByteCursor<'a>,
    code_length: u32,
    pool: &'p ConstantPool,
}

impl Decoder<'_, '_> {
    fn next(&mut self) -> Result<Instruction, ParseError> {
        let offset = self.cursor.position() as u32;
        let byte = self.cursor.read_u8()?;
        let opcode = Opcode::from_repr(byte).ok_or(ParseError::UnknownOpcode {
            opcode: byte,
            offset,
        })?;

        let operands = match opcode.layout() {
            Layout::None => Operands::None,
            Layout::Local => Operands::Local(self.cursor.read_u8()? as u16),
            Layout::Byte => Operands::Immediate(self.cursor.read_i8()? as i32),
            Layout::Short => Operands::Immediate(self.cursor.read_i16()? as i32),
            Layout::Constant1 => {
                let index = self.cursor.read_u8()? as u16;
                Operands::Constant(self.constant(opcode, index)?)
            }
            Layout::Constant2 => {
                let index = self.cursor.read_u16()?;
                Operands::Constant(self.constant(opcode, index)?)
            }
            Layout::Increment => Operands::LocalIncrement {
                index: self.cursor.read_u8()? as u16,
                value: self.cursor.read_i8()? as i16,
            },
            Layout::Branch2 => {
                let branch = self.cursor.read_i16()? as i64;
                Operands::Branch(self.target(offset, branch)?)
            }
            Layout::Branch4 => {
                let branch = self.cursor.read_i32()? as i64;
                Operands::Branch(self.target(offset, branch)?)
            }
            Layout::NewArray => {
                let code = self.cursor.read_u8()?;
                let ty = ArrayType::from_repr(code)
                    .ok_or(ParseError::InvalidArrayType { code, offset })?;
                Operands::ArrayType(ty)
            }
            Layout::InvokeInterface => {
                let index = self.cursor.read_u16()?;
                let index = self.constant(opcode, index)?;
                let count = self.cursor.read_u8()?;
                self.cursor.skip(1)?;
                Operands::InvokeInterface { index, count }
            }
            Layout::InvokeDynamic => {
                let index = self.cursor.read_u16()?;
                let index = self.constant(opcode, index)?;
                self.cursor.skip(2)?;
                Operands::InvokeDynamic { index }
            }
            Layout::MultiANewArray => {
                let index = self.cursor.read_u16()?;
                Operands::MultiANewArray {
                    index: self.constant(opcode, index)?,
                    dimensions: self.cursor.read_u8()?,
                }
            }
            Layout::TableSwitch => self.table_switch(offset)?,
            Layout::LookupSwitch => self.lookup_switch(offset)?,
            Layout::Wide => return self.wide(offset),
        };

        Ok(Instruction {
            offset,
            opcode,
            wide: false,
            length: self.cursor.position() as u32 - offset,
            operands,
        })
    }

    fn wide(&mut self, offset: u32) -> Result<Instruction, ParseError> {
        let byte = self.cursor.read_u8()?;
        let opcode = Opcode::from_repr(byte)
            .filter(|opcode| matches!(opcode.layout(), Layout::Local | Layout::Increment))
            .ok_or(ParseError::UnknownOpcode {
                opcode: byte,
                offset: offset + 1,
            })?;

        let index = self.cursor.read_u16()?;
        let operands = if opcode == Opcode::iinc {
            Operands::LocalIncrement {
                index,
                value: self.cursor.read_i16()?,
            }
        } else {
            Operands::Local(index)
        };

        Ok(Instruction {
            offset,
            opcode,
            wide: true,
            length: self.cursor.position() as u32 - offset,
            operands,
        })
    }

    fn table_switch(&mut self, offset: u32) -> Result<Operands, ParseError> {
        self.align()?;
        let default = self.read_target(offset)?;
        let low = self.cursor.read_i32()?;
        let high = self.cursor.read_i32()?;
        if high < low {
            return Err(ParseError::truncated("tableswitch", offset as usize));
        }

        let count = (high as i64 - low as i64 + 1) as usize;
        let mut targets = Vec::with_capacity(count.min(self.cursor.remaining() / 4));
        for _ in 0..count {
            targets.push(self.read_target(offset)?);
        }

        Ok(Operands::TableSwitch {
            default,
            low,
            high,
            targets,
        })
    }

    fn lookup_switch(&mut self, offset: u32) -> Result<Operands, ParseError> {
        self.align()?;
        let default = self.read_target(offset)?;
        let npairs = self.cursor.read_i32()?;
        if npairs < 0 {
            return Err(ParseError::truncated("lookupswitch", offset as usize));
        }

        let count = npairs as usize;
        let mut pairs = Vec::with_capacity(count.min(self.cursor.remaining() / 8));
        for _ in 0..count {
            let key = self.cursor.read_i32()?;
            pairs.push((key, self.read_target(offset)?));
        }

        Ok(Operands::LookupSwitch { default, pairs })
    }

    /// Skips the padding that puts switch operands on a 4-byte boundary.
    fn align(&mut self) -> Result<(), ParseError> {
        let padding = (4 - self.cursor.position() % 4) % 4;
        self.cursor.skip(padding)
    }

    fn read_target(&mut self, offset: u32) -> Result<u32, ParseError> {
        let branch = self.cursor.read_i32()? as i64;
        self.target(offset, branch)
    }

    fn target(&self, offset: u32, branch: i64) -> Result<u32, ParseError> {
        let target = offset as i64 + branch;
        if target < 0 || target >= self.code_length as i64 {
            return Err(ParseError::InvalidTarget {
                offset,
                target,
                code_length: self.code_length,
            });
        }
        Ok(target as u32)
    }

    fn constant(&self, opcode: Opcode, index: u16) -> Result<u16, ParseError> {
        let (allowed, expected) = opcode.constant_kinds();
        self.pool.expect(index, allowed, expected)?;
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class_file::constant_pool::{Class, ConstantInfo};

    fn pool() -> ConstantPool {
        ConstantPool(vec![
            ConstantInfo::Class(Class { name_index: 2 }),
            ConstantInfo::Utf8("java/lang/Object".to_owned()),
            ConstantInfo::Integer(100_000),
        ])
    }

    #[test]
    fn opcode_table() {
        assert_eq!(Opcode::from_repr(0x2a), Some(Opcode::aload_0));
        assert_eq!(Opcode::from_repr(0xb1), Some(Opcode::r#return));
        assert_eq!(Opcode::from_repr(0xc9), Some(Opcode::jsr_w));
        assert_eq!(Opcode::r#return.mnemonic(), "return");
        assert_eq!(Opcode::from_repr(0xca), None);
        assert_eq!(Opcode::from_repr(0xfe), None);
    }

    #[test]
    fn instructions_tile_the_code() {
        // aload_0, sipush 300, ldc #3, new #1, goto 0
        let code = [0x2a, 0x11, 0x01, 0x2c, 0x12, 0x03, 0xbb, 0x00, 0x01, 0xa7, 0xff, 0xf7];
        let instructions = decode(&code, &pool()).unwrap();

        let offsets: Vec<_> = instructions.iter().map(|i| i.offset).collect();
        assert_eq!(offsets, [0, 1, 4, 6, 9]);
        let total: u32 = instructions.iter().map(|i| i.length).sum();
        assert_eq!(total, code.len() as u32);

        assert_eq!(instructions[1].operands, Operands::Immediate(300));
        assert_eq!(instructions[2].constant_index(), Some(3));
        assert_eq!(instructions[4].operands, Operands::Branch(0));
        assert_eq!(instructions[3].operand_text(), "#1");
    }

    #[test]
    fn switch_padding_follows_body_offset() {
        // nop, tableswitch at 1, padded to 4: default 26, low 0, high 1
        let mut code = vec![0x00, 0xaa, 0x00, 0x00];
        code.extend_from_slice(&25i32.to_be_bytes());
        code.extend_from_slice(&0i32.to_be_bytes());
        code.extend_from_slice(&1i32.to_be_bytes());
        code.extend_from_slice(&23i32.to_be_bytes());
        code.extend_from_slice(&24i32.to_be_bytes());
        code.extend_from_slice(&[0x00, 0x00, 0x00]);

        let instructions = decode(&code, &pool()).unwrap();
        assert_eq!(instructions[1].length, 23);
        assert_eq!(
            instructions[1].operands,
            Operands::TableSwitch {
                default: 26,
                low: 0,
                high: 1,
                targets: vec![24, 25],
            }
        );
    }

    #[test]
    fn inverted_table_is_truncated() {
        let mut code = vec![0xaa, 0x00, 0x00, 0x00];
        code.extend_from_slice(&0i32.to_be_bytes());
        code.extend_from_slice(&5i32.to_be_bytes());
        code.extend_from_slice(&4i32.to_be_bytes());

        assert_eq!(
            decode(&code, &pool()),
            Err(ParseError::truncated("tableswitch", 0))
        );
    }

    #[test]
    fn lookup_pairs_keep_stored_order() {
        let mut code = vec![0xab, 0x00, 0x00, 0x00];
        for value in [20, 2, 9, 12, 5, 16] {
            code.extend_from_slice(&(value as i32).to_be_bytes());
        }
        code.extend_from_slice(&[0x00; 4]);

        let instructions = decode(&code, &pool()).unwrap();
        assert_eq!(
            instructions[0].operands,
            Operands::LookupSwitch {
                default: 20,
                pairs: vec![(9, 12), (5, 16)],
            }
        );
    }

    #[test]
    fn wide_forms() {
        // wide iinc 300 -2, wide aload 256
        let code = [0xc4, 0x84, 0x01, 0x2c, 0xff, 0xfe, 0xc4, 0x19, 0x01, 0x00];
        let instructions = decode(&code, &pool()).unwrap();

        assert_eq!(instructions[0].mnemonic(), "iinc_w");
        assert_eq!(instructions[0].length, 6);
        assert_eq!(instructions[0].operand_text(), "300, -2");
        assert_eq!(instructions[1].offset, 6);
        assert_eq!(instructions[1].mnemonic(), "aload_w");
        assert_eq!(instructions[1].length, 4);
    }

    #[test]
    fn wide_rejects_other_opcodes() {
        assert_eq!(
            decode(&[0x00, 0xc4, 0x60], &pool()),
            Err(ParseError::UnknownOpcode {
                opcode: 0x60,
                offset: 2,
            })
        );
    }

    #[test]
    fn failures() {
        assert_eq!(
            decode(&[0x00, 0xca], &pool()),
            Err(ParseError::UnknownOpcode {
                opcode: 0xca,
                offset: 1,
            })
        );
        assert_eq!(
            decode(&[0xa7, 0x00, 0x05], &pool()),
            Err(ParseError::InvalidTarget {
                offset: 0,
                target: 5,
                code_length: 3,
            })
        );
        assert_eq!(
            decode(&[0x11, 0x00], &pool()),
            Err(ParseError::truncated("code", 1))
        );
        assert_eq!(
            decode(&[0xbc, 0x03], &pool()),
            Err(ParseError::InvalidArrayType { code: 3, offset: 0 })
        );
    }

    #[test]
    fn constant_operands_are_kind_checked() {
        // getstatic #1 names a Class
        assert_eq!(
            decode(&[0xb2, 0x00, 0x01], &pool()),
            Err(ParseError::DanglingReference {
                index: 1,
                expected: "Fieldref",
            })
        );
        // ldc #2 names a Utf8
        assert!(decode(&[0x12, 0x02], &pool()).is_err());
        assert!(decode(&[0x12, 0x01, 0xc0, 0x00, 0x01], &pool()).is_ok());
    }

    #[test]
    fn multianewarray_reads_index_then_dimensions() {
        let instructions = decode(&[0xc5, 0x00, 0x01, 0x02, 0x00], &pool()).unwrap();

        assert_eq!(
            instructions[0].operands,
            Operands::MultiANewArray {
                index: 1,
                dimensions: 2,
            }
        );
        assert_eq!(instructions[0].length, 4);
        assert_eq!(instructions[0].operand_text(), "#1,  2");
        assert_eq!(instructions[1].offset, 4);
    }

    #[test]
    fn newarray_operand_text() {
        let instructions = decode(&[0xbc, 0x0a], &pool()).unwrap();
        assert_eq!(instructions[0].operand_text(), " int");
    }
}
