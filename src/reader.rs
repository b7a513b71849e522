use crate::class_file::constant_pool::{self, ConstantInfo, ConstantPool, ReferenceKind, Tag};
use crate::class_file::*;
use crate::cursor::ByteCursor;
use crate::descriptor::{parse_field_descriptor, parse_method_descriptor};
use crate::error::ParseError;
use crate::instructions;

const MAGIC: u32 = 0xcafebabe;
const SUPPORTED_MAJOR_VERSIONS: std::ops::RangeInclusive<u16> = 45..=69;

const CONSTANT_VALUE_KINDS: &[Tag] = &[
    Tag::Integer,
    Tag::Float,
    Tag::Long,
    Tag::Double,
    Tag::String,
];
const BOOTSTRAP_ARGUMENT_KINDS: &[Tag] = &[
    Tag::Integer,
    Tag::Float,
    Tag::Long,
    Tag::Double,
    Tag::String,
    Tag::Class,
    Tag::MethodHandle,
    Tag::MethodType,
    Tag::Dynamic,
];

pub struct ClassReader<'a>(ByteCursor<'a>);

impl<'a> ClassReader<'a> {
    pub fn new(bytes: &'a [u8]) -> ClassReader<'a> {
        ClassReader(ByteCursor::new(bytes))
    }

    pub fn read_class_file(&mut self) -> Result<ClassFile, ParseError> {
        let magic = self.read_u32().map_err(|e| e.in_section("header"))?;
        if magic != MAGIC {
            return Err(ParseError::BadMagic { found: magic });
        }

        let minor_version = self.read_u16().map_err(|e| e.in_section("header"))?;
        let major_version = self.read_u16().map_err(|e| e.in_section("header"))?;
        if !SUPPORTED_MAJOR_VERSIONS.contains(&major_version) {
            return Err(ParseError::UnsupportedVersion {
                major: major_version,
                minor: minor_version,
            });
        }

        let constant_pool = self.read_constant_pool()?;
        constant_pool.validate()?;

        let access_flags = self.read_u16().map_err(|e| e.in_section("header"))?;
        let this_class = self.read_u16().map_err(|e| e.in_section("header"))?;
        constant_pool.class(this_class)?;
        let super_class = self.read_u16().map_err(|e| e.in_section("header"))?;
        if super_class != 0 {
            constant_pool.class(super_class)?;
        }

        let interfaces = self
            .read_interfaces(&constant_pool)
            .map_err(|e| e.in_section("interfaces"))?;
        let fields = self
            .read_fields(&constant_pool)
            .map_err(|e| e.in_section("fields"))?;
        let methods = self
            .read_methods(&constant_pool)
            .map_err(|e| e.in_section("methods"))?;
        let attributes = self
            .read_attributes(&constant_pool)
            .map_err(|e| e.in_section("attributes"))?;

        if self.0.remaining() > 0 {
            log::debug!("ignoring {} trailing bytes", self.0.remaining());
        }
        log::debug!(
            "parsed class file {major_version}.{minor_version} with {} constants, {} fields, {} methods",
            constant_pool.count() - 1,
            fields.len(),
            methods.len()
        );

        Ok(ClassFile {
            minor_version,
            major_version,
            constant_pool,
            access_flags: ClassAccessFlags::from_bits_retain(access_flags),
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    fn read_constant_pool(&mut self) -> Result<ConstantPool, ParseError> {
        let constant_pool_count = self.read_u16().map_err(|e| e.in_section("constant pool"))?;
        let mut constant_pool = vec![];
        let mut index = 1;
        while index < constant_pool_count {
            let constant = self
                .read_constant(index)
                .map_err(|e| e.in_section("constant pool"))?;
            let wide = constant.is_wide();
            constant_pool.push(constant);
            index += 1;
            // a wide entry in the last slot gets no phantom past the count
            if wide && index < constant_pool_count {
                constant_pool.push(ConstantInfo::Unused);
                index += 1;
            }
        }
        Ok(ConstantPool(constant_pool))
    }

    fn read_constant(&mut self, index: u16) -> Result<ConstantInfo, ParseError> {
        let tag = self.read_u8()?;
        let constant = match Tag::from_repr(tag) {
            Some(Tag::Utf8) => ConstantInfo::Utf8(self.read_utf8()?),
            Some(Tag::Integer) => ConstantInfo::Integer(self.0.read_i32()?),
            Some(Tag::Float) => ConstantInfo::Float(f32::from_bits(self.read_u32()?)),
            Some(Tag::Long) => ConstantInfo::Long(self.0.read_u64()? as i64),
            Some(Tag::Double) => ConstantInfo::Double(f64::from_bits(self.0.read_u64()?)),
            Some(Tag::Class) => ConstantInfo::Class(constant_pool::Class {
                name_index: self.read_u16()?,
            }),
            Some(Tag::String) => ConstantInfo::String(constant_pool::StringRef {
                string_index: self.read_u16()?,
            }),
            Some(Tag::Fieldref) => ConstantInfo::FieldRef(self.read_member_ref()?),
            Some(Tag::Methodref) => ConstantInfo::MethodRef(self.read_member_ref()?),
            Some(Tag::InterfaceMethodref) => {
                ConstantInfo::InterfaceMethodRef(self.read_member_ref()?)
            }
            Some(Tag::NameAndType) => ConstantInfo::NameAndType(constant_pool::NameAndType {
                name_index: self.read_u16()?,
                descriptor_index: self.read_u16()?,
            }),
            Some(Tag::MethodHandle) => {
                let kind = self.read_u8()?;
                let reference_kind = ReferenceKind::from_repr(kind)
                    .ok_or(ParseError::InvalidReferenceKind { kind, index })?;
                ConstantInfo::MethodHandle(constant_pool::MethodHandle {
                    reference_kind,
                    reference_index: self.read_u16()?,
                })
            }
            Some(Tag::MethodType) => ConstantInfo::MethodType(constant_pool::MethodType {
                descriptor_index: self.read_u16()?,
            }),
            Some(Tag::Dynamic) => ConstantInfo::Dynamic(self.read_dynamic()?),
            Some(Tag::InvokeDynamic) => ConstantInfo::InvokeDynamic(self.read_dynamic()?),
            Some(Tag::Module) => ConstantInfo::Module(constant_pool::Named {
                name_index: self.read_u16()?,
            }),
            Some(Tag::Package) => ConstantInfo::Package(constant_pool::Named {
                name_index: self.read_u16()?,
            }),
            Some(Tag::Unused) | None => return Err(ParseError::UnknownConstantTag { tag, index }),
        };
        Ok(constant)
    }

    fn read_utf8(&mut self) -> Result<String, ParseError> {
        let length = self.read_u16()? as usize;
        let bytes = self.0.read_bytes(length)?;
        Ok(constant_pool::decode_modified_utf8(bytes))
    }

    fn read_member_ref(&mut self) -> Result<constant_pool::MemberRef, ParseError> {
        Ok(constant_pool::MemberRef {
            class_index: self.read_u16()?,
            name_and_type_index: self.read_u16()?,
        })
    }

    fn read_dynamic(&mut self) -> Result<constant_pool::Dynamic, ParseError> {
        Ok(constant_pool::Dynamic {
            bootstrap_method_attr_index: self.read_u16()?,
            name_and_type_index: self.read_u16()?,
        })
    }

    fn read_interfaces(&mut self, constant_pool: &ConstantPool) -> Result<Vec<u16>, ParseError> {
        let interfaces_count = self.read_u16()?;
        (0..interfaces_count)
            .map(|_| self.read_class_index(constant_pool))
            .collect()
    }

    fn read_fields(&mut self, constant_pool: &ConstantPool) -> Result<Vec<FieldInfo>, ParseError> {
        let fields_count = self.read_u16()?;
        (0..fields_count)
            .map(|_| self.read_field_info(constant_pool))
            .collect()
    }

    fn read_field_info(&mut self, constant_pool: &ConstantPool) -> Result<FieldInfo, ParseError> {
        let access_flags = FieldAccessFlags::from_bits_retain(self.read_u16()?);
        let name_index = self.read_utf8_index(constant_pool)?;
        let descriptor_index = self.read_utf8_index(constant_pool)?;
        parse_field_descriptor(constant_pool.utf8(descriptor_index)?)?;

        Ok(FieldInfo {
            access_flags,
            name_index,
            descriptor_index,
            attributes: self.read_attributes(constant_pool)?,
        })
    }

    fn read_methods(
        &mut self,
        constant_pool: &ConstantPool,
    ) -> Result<Vec<MethodInfo>, ParseError> {
        let methods_count = self.read_u16()?;
        (0..methods_count)
            .map(|_| self.read_method_info(constant_pool))
            .collect()
    }

    fn read_method_info(&mut self, constant_pool: &ConstantPool) -> Result<MethodInfo, ParseError> {
        let access_flags = MethodAccessFlags::from_bits_retain(self.read_u16()?);
        let name_index = self.read_utf8_index(constant_pool)?;
        let descriptor_index = self.read_utf8_index(constant_pool)?;
        parse_method_descriptor(constant_pool.utf8(descriptor_index)?)?;

        Ok(MethodInfo {
            access_flags,
            name_index,
            descriptor_index,
            attributes: self.read_attributes(constant_pool)?,
        })
    }

    fn read_attributes(
        &mut self,
        constant_pool: &ConstantPool,
    ) -> Result<Vec<AttributeInfo>, ParseError> {
        let attributes_count = self.read_u16()?;
        (0..attributes_count)
            .map(|_| self.read_attribute_info(constant_pool))
            .collect()
    }

    /// Slices out one attribute and decodes it with its own reader, which
    /// must end exactly on the declared length.
    fn read_attribute_info(
        &mut self,
        constant_pool: &ConstantPool,
    ) -> Result<AttributeInfo, ParseError> {
        let attribute_name_index = self.read_u16()?;
        let name = constant_pool.utf8(attribute_name_index)?;
        let length = self.read_u32()?;
        let offset = self.0.position();
        let body = self
            .0
            .read_bytes(length as usize)
            .map_err(|_| ParseError::truncated(format!("attribute {name}"), offset))?;

        log::trace!("attribute {name} ({length} bytes) at offset {offset}");

        let mismatch = |consumed: u64| ParseError::AttributeLengthMismatch {
            name: name.to_owned(),
            declared: length,
            consumed,
        };

        let mut reader = ClassReader::new(body);
        let attribute_info = reader
            .read_attribute_body(name, attribute_name_index, constant_pool)
            .map_err(|e| match e {
                ParseError::UnexpectedEof { offset, needed, .. } => {
                    mismatch((offset + needed) as u64)
                }
                e => e,
            })?;

        if reader.0.remaining() > 0 {
            return Err(mismatch(reader.0.position() as u64));
        }

        Ok(attribute_info)
    }

    fn read_attribute_body(
        &mut self,
        name: &str,
        attribute_name_index: u16,
        constant_pool: &ConstantPool,
    ) -> Result<AttributeInfo, ParseError> {
        let attribute_info = match name {
            "Code" => AttributeInfo::Code(self.read_code_attribute(constant_pool)?),
            "LineNumberTable" => AttributeInfo::LineNumberTable(self.read_line_number_table()?),
            "LocalVariableTable" => {
                AttributeInfo::LocalVariableTable(self.read_local_variable_table(constant_pool)?)
            }
            "LocalVariableTypeTable" => AttributeInfo::LocalVariableTypeTable(
                self.read_local_variable_table(constant_pool)?,
            ),
            "StackMapTable" => {
                AttributeInfo::StackMapTable(self.read_stack_map_table(constant_pool)?)
            }
            "ConstantValue" => AttributeInfo::ConstantValue(ConstantValueAttribute {
                constantvalue_index: self.read_index(
                    constant_pool,
                    CONSTANT_VALUE_KINDS,
                    "constant value",
                )?,
            }),
            "Exceptions" => AttributeInfo::Exceptions(ExceptionsAttribute {
                exception_index_table: self.read_class_list(constant_pool)?,
            }),
            "Signature" => AttributeInfo::Signature(SignatureAttribute {
                signature_index: self.read_utf8_index(constant_pool)?,
            }),
            "Deprecated" => AttributeInfo::Deprecated,
            "Synthetic" => AttributeInfo::Synthetic,
            "SourceFile" => AttributeInfo::SourceFile(SourceFileAttribute {
                sourcefile_index: self.read_utf8_index(constant_pool)?,
            }),
            "InnerClasses" => AttributeInfo::InnerClasses(self.read_inner_classes(constant_pool)?),
            "EnclosingMethod" => AttributeInfo::EnclosingMethod(EnclosingMethodAttribute {
                class_index: self.read_class_index(constant_pool)?,
                method_index: self.read_optional_index(
                    constant_pool,
                    &[Tag::NameAndType],
                    "NameAndType",
                )?,
            }),
            "BootstrapMethods" => {
                AttributeInfo::BootstrapMethods(self.read_bootstrap_methods(constant_pool)?)
            }
            "MethodParameters" => {
                AttributeInfo::MethodParameters(self.read_method_parameters(constant_pool)?)
            }
            "NestHost" => AttributeInfo::NestHost(NestHostAttribute {
                host_class_index: self.read_class_index(constant_pool)?,
            }),
            "NestMembers" => AttributeInfo::NestMembers(ClassListAttribute {
                classes: self.read_class_list(constant_pool)?,
            }),
            "PermittedSubclasses" => AttributeInfo::PermittedSubclasses(ClassListAttribute {
                classes: self.read_class_list(constant_pool)?,
            }),
            "Record" => AttributeInfo::Record(self.read_record(constant_pool)?),
            _ => {
                log::debug!("keeping unknown attribute {name} as opaque bytes");
                let info = self.0.read_bytes(self.0.remaining())?.to_vec();
                AttributeInfo::Custom(CustomAttribute {
                    attribute_name_index,
                    info,
                })
            }
        };

        Ok(attribute_info)
    }

    fn read_code_attribute(
        &mut self,
        constant_pool: &ConstantPool,
    ) -> Result<CodeAttribute, ParseError> {
        let max_stack = self.read_u16()?;
        let max_locals = self.read_u16()?;
        let code_length = self.read_u32()?;
        let code = self.0.read_bytes(code_length as usize)?;
        let instructions = instructions::decode(code, constant_pool)?;

        let exception_table_length = self.read_u16()?;
        let exception_table = (0..exception_table_length)
            .map(|_| self.read_exception_table_entry(constant_pool, code_length))
            .collect::<Result<_, _>>()?;

        Ok(CodeAttribute {
            max_stack,
            max_locals,
            code_length,
            instructions,
            exception_table,
            attributes: self.read_attributes(constant_pool)?,
        })
    }

    fn read_exception_table_entry(
        &mut self,
        constant_pool: &ConstantPool,
        code_length: u32,
    ) -> Result<ExceptionTableEntry, ParseError> {
        let start_pc = self.read_u16()?;
        let end_pc = self.read_u16()?;
        let handler_pc = self.read_u16()?;
        let catch_type = self.read_optional_index(constant_pool, &[Tag::Class], "Class")?;

        let invalid = |target: u16| ParseError::InvalidTarget {
            offset: start_pc as u32,
            target: target as i64,
            code_length,
        };
        if start_pc as u32 >= code_length {
            return Err(invalid(start_pc));
        }
        if end_pc <= start_pc || end_pc as u32 > code_length {
            return Err(invalid(end_pc));
        }
        if handler_pc as u32 >= code_length {
            return Err(invalid(handler_pc));
        }

        Ok(ExceptionTableEntry {
            start_pc,
            end_pc,
            handler_pc,
            catch_type,
        })
    }

    fn read_line_number_table(&mut self) -> Result<LineNumberTableAttribute, ParseError> {
        let length = self.read_u16()?;
        let line_number_table = (0..length)
            .map(|_| -> Result<LineNumberTableEntry, ParseError> {
                Ok(LineNumberTableEntry {
                    start_pc: self.read_u16()?,
                    line_number: self.read_u16()?,
                })
            })
            .collect::<Result<_, _>>()?;

        Ok(LineNumberTableAttribute { line_number_table })
    }

    fn read_local_variable_table(
        &mut self,
        constant_pool: &ConstantPool,
    ) -> Result<LocalVariableTableAttribute, ParseError> {
        let length = self.read_u16()?;
        let local_variable_table = (0..length)
            .map(|_| -> Result<LocalVariableTableEntry, ParseError> {
                Ok(LocalVariableTableEntry {
                    start_pc: self.read_u16()?,
                    length: self.read_u16()?,
                    name_index: self.read_utf8_index(constant_pool)?,
                    descriptor_index: self.read_utf8_index(constant_pool)?,
                    index: self.read_u16()?,
                })
            })
            .collect::<Result<_, _>>()?;

        Ok(LocalVariableTableAttribute {
            local_variable_table,
        })
    }

    fn read_stack_map_table(
        &mut self,
        constant_pool: &ConstantPool,
    ) -> Result<StackMapTableAttribute, ParseError> {
        let number_of_entries = self.read_u16()?;
        let entries = (0..number_of_entries)
            .map(|_| self.read_stack_map_frame(constant_pool))
            .collect::<Result<_, _>>()?;

        Ok(StackMapTableAttribute { entries })
    }

    fn read_stack_map_frame(
        &mut self,
        constant_pool: &ConstantPool,
    ) -> Result<StackMapFrame, ParseError> {
        let frame_type = self.read_u8()?;
        let frame = match frame_type {
            0..=63 => StackMapFrame::Same { frame_type },
            64..=127 => StackMapFrame::SameLocals1StackItem {
                frame_type,
                stack: self.read_verification_type(constant_pool, frame_type)?,
            },
            247 => StackMapFrame::SameLocals1StackItemExtended {
                offset_delta: self.read_u16()?,
                stack: self.read_verification_type(constant_pool, frame_type)?,
            },
            248..=250 => StackMapFrame::Chop {
                frame_type,
                offset_delta: self.read_u16()?,
            },
            251 => StackMapFrame::SameExtended {
                offset_delta: self.read_u16()?,
            },
            252..=254 => {
                let offset_delta = self.read_u16()?;
                let locals = (0..frame_type - 251)
                    .map(|_| self.read_verification_type(constant_pool, frame_type))
                    .collect::<Result<_, _>>()?;
                StackMapFrame::Append {
                    frame_type,
                    offset_delta,
                    locals,
                }
            }
            255 => {
                let offset_delta = self.read_u16()?;
                let locals = self.read_verification_types(constant_pool, frame_type)?;
                let stack = self.read_verification_types(constant_pool, frame_type)?;
                StackMapFrame::Full {
                    offset_delta,
                    locals,
                    stack,
                }
            }
            _ => return Err(ParseError::InvalidStackMapFrame { frame_type }),
        };
        Ok(frame)
    }

    fn read_verification_types(
        &mut self,
        constant_pool: &ConstantPool,
        frame_type: u8,
    ) -> Result<Vec<VerificationType>, ParseError> {
        let count = self.read_u16()?;
        (0..count)
            .map(|_| self.read_verification_type(constant_pool, frame_type))
            .collect()
    }

    fn read_verification_type(
        &mut self,
        constant_pool: &ConstantPool,
        frame_type: u8,
    ) -> Result<VerificationType, ParseError> {
        let verification_type = match self.read_u8()? {
            0 => VerificationType::Top,
            1 => VerificationType::Integer,
            2 => VerificationType::Float,
            3 => VerificationType::Double,
            4 => VerificationType::Long,
            5 => VerificationType::Null,
            6 => VerificationType::UninitializedThis,
            7 => VerificationType::Object {
                class_index: self.read_class_index(constant_pool)?,
            },
            8 => VerificationType::Uninitialized {
                offset: self.read_u16()?,
            },
            _ => return Err(ParseError::InvalidStackMapFrame { frame_type }),
        };
        Ok(verification_type)
    }

    fn read_inner_classes(
        &mut self,
        constant_pool: &ConstantPool,
    ) -> Result<InnerClassesAttribute, ParseError> {
        let number_of_classes = self.read_u16()?;
        let classes = (0..number_of_classes)
            .map(|_| -> Result<InnerClass, ParseError> {
                Ok(InnerClass {
                    inner_class_info_index: self.read_class_index(constant_pool)?,
                    outer_class_info_index: self.read_optional_index(
                        constant_pool,
                        &[Tag::Class],
                        "Class",
                    )?,
                    inner_name_index: self.read_optional_index(
                        constant_pool,
                        &[Tag::Utf8],
                        "Utf8",
                    )?,
                    inner_class_access_flags: InnerClassAccessFlags::from_bits_retain(
                        self.read_u16()?,
                    ),
                })
            })
            .collect::<Result<_, _>>()?;

        Ok(InnerClassesAttribute { classes })
    }

    fn read_bootstrap_methods(
        &mut self,
        constant_pool: &ConstantPool,
    ) -> Result<BootstrapMethodsAttribute, ParseError> {
        let num_bootstrap_methods = self.read_u16()?;
        let bootstrap_methods = (0..num_bootstrap_methods)
            .map(|_| -> Result<BootstrapMethod, ParseError> {
                let bootstrap_method_ref =
                    self.read_index(constant_pool, &[Tag::MethodHandle], "MethodHandle")?;
                let num_bootstrap_arguments = self.read_u16()?;
                let bootstrap_arguments = (0..num_bootstrap_arguments)
                    .map(|_| {
                        self.read_index(
                            constant_pool,
                            BOOTSTRAP_ARGUMENT_KINDS,
                            "loadable constant",
                        )
                    })
                    .collect::<Result<_, _>>()?;
                Ok(BootstrapMethod {
                    bootstrap_method_ref,
                    bootstrap_arguments,
                })
            })
            .collect::<Result<_, _>>()?;

        Ok(BootstrapMethodsAttribute { bootstrap_methods })
    }

    fn read_method_parameters(
        &mut self,
        constant_pool: &ConstantPool,
    ) -> Result<MethodParametersAttribute, ParseError> {
        let parameters_count = self.read_u8()?;
        let parameters = (0..parameters_count)
            .map(|_| -> Result<MethodParameter, ParseError> {
                Ok(MethodParameter {
                    name_index: self.read_optional_index(constant_pool, &[Tag::Utf8], "Utf8")?,
                    access_flags: ParameterAccessFlags::from_bits_retain(self.read_u16()?),
                })
            })
            .collect::<Result<_, _>>()?;

        Ok(MethodParametersAttribute { parameters })
    }

    fn read_record(&mut self, constant_pool: &ConstantPool) -> Result<RecordAttribute, ParseError> {
        let components_count = self.read_u16()?;
        let components = (0..components_count)
            .map(|_| -> Result<RecordComponent, ParseError> {
                let name_index = self.read_utf8_index(constant_pool)?;
                let descriptor_index = self.read_utf8_index(constant_pool)?;
                parse_field_descriptor(constant_pool.utf8(descriptor_index)?)?;
                Ok(RecordComponent {
                    name_index,
                    descriptor_index,
                    attributes: self.read_attributes(constant_pool)?,
                })
            })
            .collect::<Result<_, _>>()?;

        Ok(RecordAttribute { components })
    }

    fn read_class_list(&mut self, constant_pool: &ConstantPool) -> Result<Vec<u16>, ParseError> {
        let number_of_classes = self.read_u16()?;
        (0..number_of_classes)
            .map(|_| self.read_class_index(constant_pool))
            .collect()
    }

    /// Reads an index that must name one of the `allowed` kinds.
    fn read_index(
        &mut self,
        constant_pool: &ConstantPool,
        allowed: &[Tag],
        expected: &'static str,
    ) -> Result<u16, ParseError> {
        let index = self.read_u16()?;
        constant_pool.expect(index, allowed, expected)?;
        Ok(index)
    }

    /// Like `read_index`, but zero is allowed and means "none".
    fn read_optional_index(
        &mut self,
        constant_pool: &ConstantPool,
        allowed: &[Tag],
        expected: &'static str,
    ) -> Result<u16, ParseError> {
        let index = self.read_u16()?;
        if index != 0 {
            constant_pool.expect(index, allowed, expected)?;
        }
        Ok(index)
    }

    fn read_class_index(&mut self, constant_pool: &ConstantPool) -> Result<u16, ParseError> {
        self.read_index(constant_pool, &[Tag::Class], "Class")
    }

    fn read_utf8_index(&mut self, constant_pool: &ConstantPool) -> Result<u16, ParseError> {
        self.read_index(constant_pool, &[Tag::Utf8], "Utf8")
    }

    fn read_u8(&mut self) -> Result<u8, ParseError> {
        self.0.read_u8()
    }

    fn read_u16(&mut self) -> Result<u16, ParseError> {
        self.0.read_u16()
    }

    fn read_u32(&mut self) -> Result<u32, ParseError> {
        self.0.read_u32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf8(s: &str) -> Vec<u8> {
        let mut bytes = vec![1];
        bytes.extend_from_slice(&(s.len() as u16).to_be_bytes());
        bytes.extend_from_slice(s.as_bytes());
        bytes
    }

    fn class(name_index: u16) -> Vec<u8> {
        let mut bytes = vec![7];
        bytes.extend_from_slice(&name_index.to_be_bytes());
        bytes
    }

    /// `public class A` with the given extra constants (from #5 on) and the
    /// bytes that follow `super_class`.
    fn class_file(extra: &[Vec<u8>], body: &[u8]) -> Vec<u8> {
        let mut pool = vec![class(2), utf8("A"), class(4), utf8("java/lang/Object")];
        pool.extend_from_slice(extra);

        let mut bytes = vec![0xca, 0xfe, 0xba, 0xbe, 0x00, 0x00, 0x00, 0x34];
        bytes.extend_from_slice(&(pool.len() as u16 + 1).to_be_bytes());
        bytes.extend(pool.concat());
        bytes.extend_from_slice(&[0x00, 0x21, 0x00, 0x01, 0x00, 0x03]);
        bytes.extend_from_slice(body);
        bytes
    }

    const EMPTY_BODY: [u8; 8] = [0; 8];

    fn read(bytes: &[u8]) -> Result<ClassFile, ParseError> {
        ClassReader::new(bytes).read_class_file()
    }

    #[test]
    fn minimal_class() {
        let class_file = read(&class_file(&[], &EMPTY_BODY)).unwrap();

        assert_eq!(class_file.major_version, 52);
        assert_eq!(class_file.constant_pool.count(), 5);
        assert_eq!(class_file.constant_pool.class_name(class_file.this_class).unwrap(), "A");
        assert_eq!(class_file.access_flags.bits(), 0x0021);
        assert!(class_file.methods.is_empty());
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let mut bytes = class_file(&[], &EMPTY_BODY);
        bytes.extend_from_slice(b"junk");
        assert!(read(&bytes).is_ok());
    }

    #[test]
    fn bad_magic() {
        let mut bytes = class_file(&[], &EMPTY_BODY);
        bytes[3] = 0xbf;
        assert_eq!(read(&bytes), Err(ParseError::BadMagic { found: 0xcafebabf }));
    }

    #[test]
    fn unsupported_version() {
        let mut bytes = class_file(&[], &EMPTY_BODY);
        bytes[7] = 44;
        assert_eq!(
            read(&bytes),
            Err(ParseError::UnsupportedVersion { major: 44, minor: 0 })
        );
    }

    #[test]
    fn unknown_constant_tag() {
        let bytes = [0xca, 0xfe, 0xba, 0xbe, 0x00, 0x00, 0x00, 0x34, 0x00, 0x02, 0x02];
        assert_eq!(
            read(&bytes),
            Err(ParseError::UnknownConstantTag { tag: 2, index: 1 })
        );
    }

    #[test]
    fn truncated_constant_pool() {
        let bytes = [0xca, 0xfe, 0xba, 0xbe, 0x00, 0x00, 0x00, 0x34, 0x00, 0x03, 0x07, 0x00];
        assert_eq!(read(&bytes), Err(ParseError::truncated("constant pool", 11)));
    }

    #[test]
    fn phantom_slot_is_not_a_class() {
        let mut bytes = vec![0xca, 0xfe, 0xba, 0xbe, 0x00, 0x00, 0x00, 0x34, 0x00, 0x03];
        bytes.extend_from_slice(&[5, 0, 0, 0, 0, 0, 0, 0, 1]);
        // this_class points at the slot after the Long
        bytes.extend_from_slice(&[0x00, 0x21, 0x00, 0x02, 0x00, 0x00]);
        bytes.extend_from_slice(&EMPTY_BODY);

        assert_eq!(
            read(&bytes),
            Err(ParseError::DanglingReference {
                index: 2,
                expected: "Class",
            })
        );
    }

    #[test]
    fn long_in_last_slot_keeps_declared_count() {
        let long = vec![5, 0, 0, 0, 0, 0, 0, 0, 9];
        let class_file = read(&class_file(&[long], &EMPTY_BODY)).unwrap();

        assert_eq!(class_file.constant_pool.count(), 6);
        assert!(class_file.constant_pool.get(6).is_none());
        assert_eq!(class_file.constant_pool.entries().count(), 5);
    }

    #[test]
    fn attribute_must_consume_declared_length() {
        let body = [
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // interfaces, fields, methods
            0x00, 0x01, 0x00, 0x05, 0x00, 0x00, 0x00, 0x04, 0x00, 0x06, 0x00, 0x00,
        ];
        let bytes = class_file(&[utf8("SourceFile"), utf8("A.java")], &body);

        assert_eq!(
            read(&bytes),
            Err(ParseError::AttributeLengthMismatch {
                name: "SourceFile".to_owned(),
                declared: 4,
                consumed: 2,
            })
        );
    }

    #[test]
    fn attribute_shorter_than_contents() {
        let body = [
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // interfaces, fields, methods
            0x00, 0x01, 0x00, 0x05, 0x00, 0x00, 0x00, 0x01, 0x00,
        ];
        let bytes = class_file(&[utf8("SourceFile"), utf8("A.java")], &body);

        assert_eq!(
            read(&bytes),
            Err(ParseError::AttributeLengthMismatch {
                name: "SourceFile".to_owned(),
                declared: 1,
                consumed: 2,
            })
        );
    }

    #[test]
    fn attribute_past_end_of_file() {
        let body = [
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // interfaces, fields, methods
            0x00, 0x01, 0x00, 0x05, 0x00, 0x00, 0x01, 0x00, 0x00, 0x06,
        ];
        let bytes = class_file(&[utf8("Custom"), utf8("A.java")], &body);

        assert!(matches!(
            read(&bytes),
            Err(ParseError::TruncatedSection { section, .. }) if section == "attribute Custom"
        ));
    }

    #[test]
    fn unknown_attribute_is_opaque() {
        let body = [
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // interfaces, fields, methods
            0x00, 0x01, 0x00, 0x05, 0x00, 0x00, 0x00, 0x03, 0xde, 0xad, 0x01,
        ];
        let class_file = read(&class_file(&[utf8("Custom")], &body)).unwrap();

        let custom = class_file.attributes[0].try_as_custom_ref().unwrap();
        assert_eq!(custom.attribute_name_index, 5);
        assert_eq!(custom.info, [0xde, 0xad, 0x01]);
    }

    #[test]
    fn malformed_field_descriptor() {
        let body = [
            0x00, 0x00, // interfaces
            0x00, 0x01, 0x00, 0x02, 0x00, 0x05, 0x00, 0x06, 0x00, 0x00, // one field
            0x00, 0x00, 0x00, 0x00,
        ];
        let bytes = class_file(&[utf8("x"), utf8("Lfoo")], &body);

        assert_eq!(
            read(&bytes),
            Err(ParseError::MalformedDescriptor {
                descriptor: "Lfoo".to_owned()
            })
        );
    }
}
