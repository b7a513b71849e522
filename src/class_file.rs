use bitflags::bitflags;
use strum::EnumTryAs;

use self::constant_pool::ConstantPool;
use crate::instructions::Instruction;

pub mod constant_pool;

#[derive(Debug, PartialEq)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub constant_pool: ConstantPool,
    pub access_flags: ClassAccessFlags,
    pub this_class: u16,
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub attributes: Vec<AttributeInfo>,
}

impl ClassFile {
    pub fn is_interface(&self) -> bool {
        self.access_flags.contains(ClassAccessFlags::INTERFACE)
    }

    pub fn is_enum(&self) -> bool {
        self.access_flags.contains(ClassAccessFlags::ENUM)
    }

    pub fn source_file(&self) -> Option<u16> {
        self.attributes.iter().find_map(|attr| match attr {
            AttributeInfo::SourceFile(attr) => Some(attr.sourcefile_index),
            _ => None,
        })
    }
}

/// Finds the `Signature` attribute in an attribute list, if there is one.
pub fn signature_index(attributes: &[AttributeInfo]) -> Option<u16> {
    attributes.iter().find_map(|attr| match attr {
        AttributeInfo::Signature(attr) => Some(attr.signature_index),
        _ => None,
    })
}

/// Access flags that javap can list by name and turn into source modifiers.
pub trait AccessFlags {
    fn raw(&self) -> u16;

    /// `ACC_*` names of the known bits that are set, lowest bit first.
    fn flag_names(&self) -> Vec<String>;

    /// Source-level modifiers in declaration order.
    fn modifiers(&self) -> Vec<&'static str>;
}

macro_rules! access_flags {
    ($ty:ty, [$($flag:ident => $modifier:literal),* $(,)?]) => {
        impl AccessFlags for $ty {
            fn raw(&self) -> u16 {
                self.bits()
            }

            fn flag_names(&self) -> Vec<String> {
                self.iter_names().map(|(name, _)| format!("ACC_{name}")).collect()
            }

            fn modifiers(&self) -> Vec<&'static str> {
                let mut modifiers = vec![];
                $(
                    if self.contains(<$ty>::$flag) {
                        modifiers.push($modifier);
                    }
                )*
                modifiers
            }
        }
    };
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ClassAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const FINAL = 0x0010;
        const SUPER = 0x0020;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
        const MODULE = 0x8000;
    }
}

impl AccessFlags for ClassAccessFlags {
    fn raw(&self) -> u16 {
        self.bits()
    }

    fn flag_names(&self) -> Vec<String> {
        self.iter_names()
            .map(|(name, _)| format!("ACC_{name}"))
            .collect()
    }

    fn modifiers(&self) -> Vec<&'static str> {
        let mut modifiers = vec![];
        if self.contains(ClassAccessFlags::PUBLIC) {
            modifiers.push("public");
        }
        if self.contains(ClassAccessFlags::FINAL) {
            modifiers.push("final");
        }
        // interfaces are implicitly abstract
        if self.contains(ClassAccessFlags::ABSTRACT) && !self.contains(ClassAccessFlags::INTERFACE)
        {
            modifiers.push("abstract");
        }
        modifiers
    }
}

#[derive(Debug, PartialEq)]
pub struct FieldInfo {
    pub access_flags: FieldAccessFlags,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<AttributeInfo>,
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct FieldAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const VOLATILE = 0x0040;
        const TRANSIENT = 0x0080;
        const SYNTHETIC = 0x1000;
        const ENUM = 0x4000;
    }
}

access_flags!(FieldAccessFlags, [
    PUBLIC => "public",
    PRIVATE => "private",
    PROTECTED => "protected",
    STATIC => "static",
    FINAL => "final",
    VOLATILE => "volatile",
    TRANSIENT => "transient",
]);

#[derive(Debug, PartialEq)]
pub struct MethodInfo {
    pub access_flags: MethodAccessFlags,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<AttributeInfo>,
}

impl MethodInfo {
    pub fn code(&self) -> Option<&CodeAttribute> {
        self.attributes
            .iter()
            .find_map(|attr| attr.try_as_code_ref())
    }

    pub fn exceptions(&self) -> Option<&ExceptionsAttribute> {
        self.attributes
            .iter()
            .find_map(|attr| attr.try_as_exceptions_ref())
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct MethodAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SYNCHRONIZED = 0x0020;
        const BRIDGE = 0x0040;
        const VARARGS = 0x0080;
        const NATIVE = 0x0100;
        const ABSTRACT = 0x0400;
        const STRICT = 0x0800;
        const SYNTHETIC = 0x1000;
    }
}

access_flags!(MethodAccessFlags, [
    PUBLIC => "public",
    PRIVATE => "private",
    PROTECTED => "protected",
    STATIC => "static",
    FINAL => "final",
    SYNCHRONIZED => "synchronized",
    NATIVE => "native",
    ABSTRACT => "abstract",
    STRICT => "strictfp",
]);

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct InnerClassAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
    }
}

impl AccessFlags for InnerClassAccessFlags {
    fn raw(&self) -> u16 {
        self.bits()
    }

    fn flag_names(&self) -> Vec<String> {
        self.iter_names()
            .map(|(name, _)| format!("ACC_{name}"))
            .collect()
    }

    fn modifiers(&self) -> Vec<&'static str> {
        let flags = if self.contains(InnerClassAccessFlags::INTERFACE) {
            self.difference(InnerClassAccessFlags::ABSTRACT)
        } else {
            *self
        };
        [
            (InnerClassAccessFlags::PUBLIC, "public"),
            (InnerClassAccessFlags::PRIVATE, "private"),
            (InnerClassAccessFlags::PROTECTED, "protected"),
            (InnerClassAccessFlags::STATIC, "static"),
            (InnerClassAccessFlags::FINAL, "final"),
            (InnerClassAccessFlags::ABSTRACT, "abstract"),
        ]
        .into_iter()
        .filter(|(flag, _)| flags.contains(*flag))
        .map(|(_, modifier)| modifier)
        .collect()
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ParameterAccessFlags: u16 {
        const FINAL = 0x0010;
        const SYNTHETIC = 0x1000;
        const MANDATED = 0x8000;
    }
}

#[derive(Debug, PartialEq, EnumTryAs)]
pub enum AttributeInfo {
    Code(CodeAttribute),
    LineNumberTable(LineNumberTableAttribute),
    LocalVariableTable(LocalVariableTableAttribute),
    LocalVariableTypeTable(LocalVariableTableAttribute),
    StackMapTable(StackMapTableAttribute),
    ConstantValue(ConstantValueAttribute),
    Exceptions(ExceptionsAttribute),
    Signature(SignatureAttribute),
    Deprecated,
    Synthetic,
    SourceFile(SourceFileAttribute),
    InnerClasses(InnerClassesAttribute),
    EnclosingMethod(EnclosingMethodAttribute),
    BootstrapMethods(BootstrapMethodsAttribute),
    MethodParameters(MethodParametersAttribute),
    NestHost(NestHostAttribute),
    NestMembers(ClassListAttribute),
    PermittedSubclasses(ClassListAttribute),
    Record(RecordAttribute),
    Custom(CustomAttribute),
}

#[derive(Debug, PartialEq)]
pub struct CodeAttribute {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code_length: u32,
    pub instructions: Vec<Instruction>,
    pub exception_table: Vec<ExceptionTableEntry>,
    pub attributes: Vec<AttributeInfo>,
}

#[derive(Debug, PartialEq)]
pub struct ExceptionTableEntry {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    /// Zero catches everything.
    pub catch_type: u16,
}

#[derive(Debug, PartialEq)]
pub struct LineNumberTableAttribute {
    pub line_number_table: Vec<LineNumberTableEntry>,
}

#[derive(Debug, PartialEq)]
pub struct LineNumberTableEntry {
    pub start_pc: u16,
    pub line_number: u16,
}

/// Shared by `LocalVariableTable` and `LocalVariableTypeTable`; in the latter
/// `descriptor_index` names a generic signature.
#[derive(Debug, PartialEq)]
pub struct LocalVariableTableAttribute {
    pub local_variable_table: Vec<LocalVariableTableEntry>,
}

#[derive(Debug, PartialEq)]
pub struct LocalVariableTableEntry {
    pub start_pc: u16,
    pub length: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub index: u16,
}

#[derive(Debug, PartialEq)]
pub struct StackMapTableAttribute {
    pub entries: Vec<StackMapFrame>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum StackMapFrame {
    Same {
        frame_type: u8,
    },
    SameLocals1StackItem {
        frame_type: u8,
        stack: VerificationType,
    },
    SameLocals1StackItemExtended {
        offset_delta: u16,
        stack: VerificationType,
    },
    Chop {
        frame_type: u8,
        offset_delta: u16,
    },
    SameExtended {
        offset_delta: u16,
    },
    Append {
        frame_type: u8,
        offset_delta: u16,
        locals: Vec<VerificationType>,
    },
    Full {
        offset_delta: u16,
        locals: Vec<VerificationType>,
        stack: Vec<VerificationType>,
    },
}

#[derive(Debug, PartialEq, Eq)]
pub enum VerificationType {
    Top,
    Integer,
    Float,
    Double,
    Long,
    Null,
    UninitializedThis,
    Object { class_index: u16 },
    Uninitialized { offset: u16 },
}

#[derive(Debug, PartialEq)]
pub struct ConstantValueAttribute {
    pub constantvalue_index: u16,
}

#[derive(Debug, PartialEq)]
pub struct ExceptionsAttribute {
    pub exception_index_table: Vec<u16>,
}

#[derive(Debug, PartialEq)]
pub struct SignatureAttribute {
    pub signature_index: u16,
}

#[derive(Debug, PartialEq)]
pub struct SourceFileAttribute {
    pub sourcefile_index: u16,
}

#[derive(Debug, PartialEq)]
pub struct InnerClassesAttribute {
    pub classes: Vec<InnerClass>,
}

#[derive(Debug, PartialEq)]
pub struct InnerClass {
    pub inner_class_info_index: u16,
    pub outer_class_info_index: u16,
    pub inner_name_index: u16,
    pub inner_class_access_flags: InnerClassAccessFlags,
}

#[derive(Debug, PartialEq)]
pub struct EnclosingMethodAttribute {
    pub class_index: u16,
    pub method_index: u16,
}

#[derive(Debug, PartialEq)]
pub struct BootstrapMethodsAttribute {
    pub bootstrap_methods: Vec<BootstrapMethod>,
}

#[derive(Debug, PartialEq)]
pub struct BootstrapMethod {
    pub bootstrap_method_ref: u16,
    pub bootstrap_arguments: Vec<u16>,
}

#[derive(Debug, PartialEq)]
pub struct MethodParametersAttribute {
    pub parameters: Vec<MethodParameter>,
}

#[derive(Debug, PartialEq)]
pub struct MethodParameter {
    pub name_index: u16,
    pub access_flags: ParameterAccessFlags,
}

#[derive(Debug, PartialEq)]
pub struct NestHostAttribute {
    pub host_class_index: u16,
}

#[derive(Debug, PartialEq)]
pub struct ClassListAttribute {
    pub classes: Vec<u16>,
}

#[derive(Debug, PartialEq)]
pub struct RecordAttribute {
    pub components: Vec<RecordComponent>,
}

#[derive(Debug, PartialEq)]
pub struct RecordComponent {
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<AttributeInfo>,
}

#[derive(Debug, PartialEq)]
pub struct CustomAttribute {
    pub attribute_name_index: u16,
    pub info: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_names_follow_bit_order() {
        let flags = MethodAccessFlags::from_bits_retain(0x0089);
        assert_eq!(
            flags.flag_names(),
            ["ACC_PUBLIC", "ACC_STATIC", "ACC_VARARGS"]
        );
        assert_eq!(flags.modifiers(), ["public", "static"]);
    }

    #[test]
    fn unknown_bits_keep_raw_value() {
        let flags = FieldAccessFlags::from_bits_retain(0x0102);
        assert_eq!(flags.raw(), 0x0102);
        assert_eq!(flags.flag_names(), ["ACC_PRIVATE"]);
    }

    #[test]
    fn interface_modifiers_drop_abstract() {
        let class = ClassAccessFlags::from_bits_retain(0x0601);
        assert_eq!(class.modifiers(), ["public"]);
        assert_eq!(
            class.flag_names(),
            ["ACC_PUBLIC", "ACC_INTERFACE", "ACC_ABSTRACT"]
        );

        let inner = InnerClassAccessFlags::from_bits_retain(0x060a);
        assert_eq!(inner.modifiers(), ["private", "static"]);
    }
}
