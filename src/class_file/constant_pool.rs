use strum::{EnumTryAs, FromRepr, IntoStaticStr};

use crate::error::ParseError;

/// The 1-indexed constant pool. Slot `n` lives at `self.0[n - 1]`, and the
/// slot after a `Long` or `Double` holds `ConstantInfo::Unused` unless the
/// entry is the last one.
#[derive(Debug, PartialEq)]
pub struct ConstantPool(pub(crate) Vec<ConstantInfo>);

impl ConstantPool {
    pub fn get(&self, index: u16) -> Option<&ConstantInfo> {
        self.0.get(index.checked_sub(1)? as usize)
    }

    /// The `constant_pool_count` as stored in the file, one more than the
    /// number of slots.
    pub fn count(&self) -> usize {
        self.0.len() + 1
    }

    /// Usable entries with their indices, skipping phantom slots.
    pub fn entries(&self) -> impl Iterator<Item = (u16, &ConstantInfo)> {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, info)| !matches!(info, ConstantInfo::Unused))
            .map(|(i, info)| (i as u16 + 1, info))
    }

    pub fn utf8(&self, index: u16) -> Result<&str, ParseError> {
        self.get(index)
            .and_then(ConstantInfo::try_as_utf_8_ref)
            .map(String::as_str)
            .ok_or(ParseError::dangling(index, "Utf8"))
    }

    pub fn class(&self, index: u16) -> Result<&Class, ParseError> {
        self.get(index)
            .and_then(ConstantInfo::try_as_class_ref)
            .ok_or(ParseError::dangling(index, "Class"))
    }

    /// Internal form of the class name at `index`, e.g. `java/lang/Object`.
    pub fn class_name(&self, index: u16) -> Result<&str, ParseError> {
        self.utf8(self.class(index)?.name_index)
    }

    pub fn name_and_type(&self, index: u16) -> Result<&NameAndType, ParseError> {
        self.get(index)
            .and_then(ConstantInfo::try_as_name_and_type_ref)
            .ok_or(ParseError::dangling(index, "NameAndType"))
    }

    /// The owning class and name-and-type of a field or method reference.
    pub fn member_ref(&self, index: u16) -> Result<&MemberRef, ParseError> {
        match self.get(index) {
            Some(
                ConstantInfo::FieldRef(member)
                | ConstantInfo::MethodRef(member)
                | ConstantInfo::InterfaceMethodRef(member),
            ) => Ok(member),
            _ => Err(ParseError::dangling(index, "Fieldref or Methodref")),
        }
    }

    /// Checks that `index` is usable and of one of the `allowed` kinds.
    pub fn expect(
        &self,
        index: u16,
        allowed: &[Tag],
        expected: &'static str,
    ) -> Result<&ConstantInfo, ParseError> {
        match self.get(index) {
            Some(info) if allowed.contains(&info.tag()) => Ok(info),
            _ => Err(ParseError::dangling(index, expected)),
        }
    }

    /// Resolves an entry into the three columns javap prints for it.
    pub fn resolve(&self, index: u16) -> Result<DisplayForm, ParseError> {
        let info = self
            .get(index)
            .filter(|info| !matches!(info, ConstantInfo::Unused))
            .ok_or(ParseError::dangling(index, "constant"))?;

        let reference = match info {
            ConstantInfo::Unused
            | ConstantInfo::Utf8(_)
            | ConstantInfo::Integer(_)
            | ConstantInfo::Float(_)
            | ConstantInfo::Long(_)
            | ConstantInfo::Double(_) => None,
            ConstantInfo::Class(class) => Some(format!("#{}", class.name_index)),
            ConstantInfo::String(string) => Some(format!("#{}", string.string_index)),
            ConstantInfo::FieldRef(member)
            | ConstantInfo::MethodRef(member)
            | ConstantInfo::InterfaceMethodRef(member) => Some(format!(
                "#{}.#{}",
                member.class_index, member.name_and_type_index
            )),
            ConstantInfo::NameAndType(nat) => {
                Some(format!("#{}:#{}", nat.name_index, nat.descriptor_index))
            }
            ConstantInfo::MethodHandle(handle) => Some(format!(
                "{}:#{}",
                handle.reference_kind as u8, handle.reference_index
            )),
            ConstantInfo::MethodType(method_type) => {
                Some(format!("#{}", method_type.descriptor_index))
            }
            ConstantInfo::Dynamic(dynamic) | ConstantInfo::InvokeDynamic(dynamic) => Some(format!(
                "#{}:#{}",
                dynamic.bootstrap_method_attr_index, dynamic.name_and_type_index
            )),
            ConstantInfo::Module(named) | ConstantInfo::Package(named) => {
                Some(format!("#{}", named.name_index))
            }
        };

        Ok(DisplayForm {
            tag: info.tag(),
            reference,
            value: self.string_value(index)?,
        })
    }

    /// javap's textual value of an entry: the literal for numbers and
    /// strings, the symbolic form for references.
    pub fn string_value(&self, index: u16) -> Result<String, ParseError> {
        let info = self.get(index).ok_or(ParseError::dangling(index, "constant"))?;
        Ok(match info {
            ConstantInfo::Unused => return Err(ParseError::dangling(index, "constant")),
            ConstantInfo::Utf8(s) => escape(s),
            ConstantInfo::Integer(v) => v.to_string(),
            ConstantInfo::Float(v) => format!("{}f", java_float(*v)),
            ConstantInfo::Long(v) => format!("{v}l"),
            ConstantInfo::Double(v) => format!("{}d", java_double(*v)),
            ConstantInfo::Class(class) => checked_name(self.utf8(class.name_index)?),
            ConstantInfo::String(string) => escape(self.utf8(string.string_index)?),
            ConstantInfo::FieldRef(member)
            | ConstantInfo::MethodRef(member)
            | ConstantInfo::InterfaceMethodRef(member) => format!(
                "{}.{}",
                checked_name(self.class_name(member.class_index)?),
                self.name_and_type_value(member.name_and_type_index)?
            ),
            ConstantInfo::NameAndType(_) => self.name_and_type_value(index)?,
            ConstantInfo::MethodHandle(handle) => {
                self.expect(
                    handle.reference_index,
                    handle.reference_kind.allowed_tags(),
                    handle.reference_kind.expected(),
                )?;
                format!(
                    "{} {}",
                    handle.reference_kind.name(),
                    self.string_value(handle.reference_index)?
                )
            }
            ConstantInfo::MethodType(method_type) => {
                escape(self.utf8(method_type.descriptor_index)?)
            }
            ConstantInfo::Dynamic(dynamic) | ConstantInfo::InvokeDynamic(dynamic) => format!(
                "#{}:{}",
                dynamic.bootstrap_method_attr_index,
                self.name_and_type_value(dynamic.name_and_type_index)?
            ),
            ConstantInfo::Module(named) | ConstantInfo::Package(named) => {
                checked_name(self.utf8(named.name_index)?)
            }
        })
    }

    /// The comment javap writes after an instruction operand: the entry's tag
    /// word and value, with the owner left out of members of `this_class`.
    pub fn describe(&self, index: u16, this_class: u16) -> Result<String, ParseError> {
        let info = self.get(index).ok_or(ParseError::dangling(index, "constant"))?;
        let value = match info {
            ConstantInfo::FieldRef(member)
            | ConstantInfo::MethodRef(member)
            | ConstantInfo::InterfaceMethodRef(member)
                if member.class_index == this_class =>
            {
                self.name_and_type_value(member.name_and_type_index)?
            }
            _ => self.string_value(index)?,
        };
        Ok(format!("{} {}", info.tag().comment_word(), value))
    }

    /// Checks every reference between entries, so later lookups cannot
    /// dangle.
    pub fn validate(&self) -> Result<(), ParseError> {
        for (index, _) in self.entries() {
            self.string_value(index)?;
        }
        Ok(())
    }

    fn name_and_type_value(&self, index: u16) -> Result<String, ParseError> {
        let nat = self.name_and_type(index)?;
        Ok(format!(
            "{}:{}",
            checked_name(self.utf8(nat.name_index)?),
            escape(self.utf8(nat.descriptor_index)?)
        ))
    }
}

/// The columns of one constant pool listing line.
#[derive(Debug, PartialEq)]
pub struct DisplayForm {
    pub tag: Tag,
    /// Indices the entry points at, absent for literal entries.
    pub reference: Option<String>,
    pub value: String,
}

#[derive(Debug, PartialEq, EnumTryAs)]
pub enum ConstantInfo {
    Unused,
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class(Class),
    String(StringRef),
    FieldRef(MemberRef),
    MethodRef(MemberRef),
    InterfaceMethodRef(MemberRef),
    NameAndType(NameAndType),
    MethodHandle(MethodHandle),
    MethodType(MethodType),
    Dynamic(Dynamic),
    InvokeDynamic(Dynamic),
    Module(Named),
    Package(Named),
}

impl ConstantInfo {
    pub fn tag(&self) -> Tag {
        match self {
            ConstantInfo::Unused => Tag::Unused,
            ConstantInfo::Utf8(_) => Tag::Utf8,
            ConstantInfo::Integer(_) => Tag::Integer,
            ConstantInfo::Float(_) => Tag::Float,
            ConstantInfo::Long(_) => Tag::Long,
            ConstantInfo::Double(_) => Tag::Double,
            ConstantInfo::Class(_) => Tag::Class,
            ConstantInfo::String(_) => Tag::String,
            ConstantInfo::FieldRef(_) => Tag::Fieldref,
            ConstantInfo::MethodRef(_) => Tag::Methodref,
            ConstantInfo::InterfaceMethodRef(_) => Tag::InterfaceMethodref,
            ConstantInfo::NameAndType(_) => Tag::NameAndType,
            ConstantInfo::MethodHandle(_) => Tag::MethodHandle,
            ConstantInfo::MethodType(_) => Tag::MethodType,
            ConstantInfo::Dynamic(_) => Tag::Dynamic,
            ConstantInfo::InvokeDynamic(_) => Tag::InvokeDynamic,
            ConstantInfo::Module(_) => Tag::Module,
            ConstantInfo::Package(_) => Tag::Package,
        }
    }

    /// Long and Double take two slots.
    pub fn is_wide(&self) -> bool {
        matches!(self, ConstantInfo::Long(_) | ConstantInfo::Double(_))
    }
}

/// Entry kinds, named the way the constant pool listing names them. The
/// discriminants are the tag bytes of the class file format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromRepr, IntoStaticStr)]
#[repr(u8)]
pub enum Tag {
    Unused = 0,
    Utf8 = 1,
    Integer = 3,
    Float = 4,
    Long = 5,
    Double = 6,
    Class = 7,
    String = 8,
    Fieldref = 9,
    Methodref = 10,
    InterfaceMethodref = 11,
    NameAndType = 12,
    MethodHandle = 15,
    MethodType = 16,
    Dynamic = 17,
    InvokeDynamic = 18,
    Module = 19,
    Package = 20,
}

impl Tag {
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// The word javap puts before a value in instruction comments.
    pub fn comment_word(self) -> &'static str {
        match self {
            Tag::Fieldref => "Field",
            Tag::Methodref => "Method",
            Tag::InterfaceMethodref => "InterfaceMethod",
            Tag::Class => "class",
            Tag::Integer => "int",
            Tag::Float => "float",
            Tag::Long => "long",
            Tag::Double => "double",
            tag => tag.name(),
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct Class {
    pub name_index: u16,
}

#[derive(Debug, PartialEq)]
pub struct StringRef {
    pub string_index: u16,
}

/// Payload of `Fieldref`, `Methodref` and `InterfaceMethodref`.
#[derive(Debug, PartialEq)]
pub struct MemberRef {
    pub class_index: u16,
    pub name_and_type_index: u16,
}

#[derive(Debug, PartialEq)]
pub struct NameAndType {
    pub name_index: u16,
    pub descriptor_index: u16,
}

#[derive(Debug, PartialEq)]
pub struct MethodHandle {
    pub reference_kind: ReferenceKind,
    pub reference_index: u16,
}

#[derive(Debug, PartialEq)]
pub struct MethodType {
    pub descriptor_index: u16,
}

/// Payload of `Dynamic` and `InvokeDynamic`.
#[derive(Debug, PartialEq)]
pub struct Dynamic {
    pub bootstrap_method_attr_index: u16,
    pub name_and_type_index: u16,
}

/// Payload of `Module` and `Package`.
#[derive(Debug, PartialEq)]
pub struct Named {
    pub name_index: u16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, FromRepr, IntoStaticStr)]
#[repr(u8)]
pub enum ReferenceKind {
    #[strum(serialize = "REF_getField")]
    GetField = 1,
    #[strum(serialize = "REF_getStatic")]
    GetStatic = 2,
    #[strum(serialize = "REF_putField")]
    PutField = 3,
    #[strum(serialize = "REF_putStatic")]
    PutStatic = 4,
    #[strum(serialize = "REF_invokeVirtual")]
    InvokeVirtual = 5,
    #[strum(serialize = "REF_invokeStatic")]
    InvokeStatic = 6,
    #[strum(serialize = "REF_invokeSpecial")]
    InvokeSpecial = 7,
    #[strum(serialize = "REF_newInvokeSpecial")]
    NewInvokeSpecial = 8,
    #[strum(serialize = "REF_invokeInterface")]
    InvokeInterface = 9,
}

impl ReferenceKind {
    pub fn name(self) -> &'static str {
        self.into()
    }

    fn allowed_tags(self) -> &'static [Tag] {
        match self {
            ReferenceKind::GetField
            | ReferenceKind::GetStatic
            | ReferenceKind::PutField
            | ReferenceKind::PutStatic => &[Tag::Fieldref],
            ReferenceKind::InvokeVirtual | ReferenceKind::NewInvokeSpecial => &[Tag::Methodref],
            ReferenceKind::InvokeStatic | ReferenceKind::InvokeSpecial => {
                &[Tag::Methodref, Tag::InterfaceMethodref]
            }
            ReferenceKind::InvokeInterface => &[Tag::InterfaceMethodref],
        }
    }

    fn expected(self) -> &'static str {
        match self.allowed_tags() {
            [Tag::Fieldref] => "Fieldref",
            [Tag::Methodref] => "Methodref",
            [Tag::InterfaceMethodref] => "InterfaceMethodref",
            _ => "Methodref or InterfaceMethodref",
        }
    }
}

/// Decodes the modified UTF-8 used by `CONSTANT_Utf8`: NUL is `C0 80` and
/// supplementary characters are encoded as surrogate pairs. Malformed bytes
/// become U+FFFD.
pub fn decode_modified_utf8(bytes: &[u8]) -> String {
    let continuation = |i: usize| {
        bytes
            .get(i)
            .filter(|b| *b & 0xc0 == 0x80)
            .map(|b| (b & 0x3f) as u16)
    };

    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        let (unit, width) = match (b, continuation(i + 1), continuation(i + 2)) {
            (0x00..=0x7f, _, _) => (b as u16, 1),
            (0xc0..=0xdf, Some(b1), _) => (((b & 0x1f) as u16) << 6 | b1, 2),
            (0xe0..=0xef, Some(b1), Some(b2)) => (((b & 0x0f) as u16) << 12 | b1 << 6 | b2, 3),
            _ => (0xfffd, 1),
        };
        units.push(unit);
        i += width;
    }

    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Escapes a Utf8 value the way javap prints it.
pub fn escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\t' => escaped.push_str("\\t"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\u{8}' => escaped.push_str("\\b"),
            '\u{c}' => escaped.push_str("\\f"),
            '"' => escaped.push_str("\\\""),
            '\'' => escaped.push_str("\\'"),
            '\\' => escaped.push_str("\\\\"),
            c if c.is_control() => escaped.push_str(&format!("\\u{:04x}", c as u32)),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Quotes names that are not a `/`-separated path of Java identifiers, such
/// as `<init>` or array class names.
pub fn checked_name(name: &str) -> String {
    let is_start = |c: char| c.is_alphabetic() || c == '$' || c == '_';
    let is_part = |c: char| is_start(c) || c.is_numeric();

    let mut previous = '/';
    let plain = !name.is_empty()
        && name.chars().all(|c| {
            let ok = if previous == '/' {
                is_start(c)
            } else {
                c == '/' || is_part(c)
            };
            previous = c;
            ok
        });

    if plain {
        return name.to_owned();
    }

    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('"');
    for c in name.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// `Float.toString` formatting.
pub fn java_float(v: f32) -> String {
    if v.is_nan() {
        return "NaN".to_owned();
    }
    if v.is_infinite() {
        return if v > 0.0 { "Infinity" } else { "-Infinity" }.to_owned();
    }
    let shortest = format!("{:e}", v.abs());
    // Java never prints fewer than two significant digits
    let digits = if shortest.contains('.') { shortest } else { format!("{:.1e}", v.abs()) };
    java_decimal(v.is_sign_negative(), &digits)
}

/// `Double.toString` formatting.
pub fn java_double(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_owned();
    }
    if v.is_infinite() {
        return if v > 0.0 { "Infinity" } else { "-Infinity" }.to_owned();
    }
    let shortest = format!("{:e}", v.abs());
    let digits = if shortest.contains('.') { shortest } else { format!("{:.1e}", v.abs()) };
    java_decimal(v.is_sign_negative(), &digits)
}

/// Lays out Rust's shortest scientific form (`1.5e-4`) using Java's rules:
/// plain notation for `1e-3 <= |v| < 1e7`, computerized scientific
/// notation otherwise, and always at least one fractional digit.
fn java_decimal(negative: bool, scientific: &str) -> String {
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let mut digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    while digits.len() > 1 && digits.ends_with('0') {
        digits.pop();
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }

    if digits.bytes().all(|b| b == b'0') {
        out.push_str("0.0");
        return out;
    }

    if (-3..7).contains(&exponent) {
        let point = exponent + 1;
        if point <= 0 {
            out.push_str("0.");
            out.extend(std::iter::repeat('0').take(-point as usize));
            out.push_str(&digits);
        } else if point as usize >= digits.len() {
            out.push_str(&digits);
            out.extend(std::iter::repeat('0').take(point as usize - digits.len()));
            out.push_str(".0");
        } else {
            let (int, frac) = digits.split_at(point as usize);
            out.push_str(int);
            out.push('.');
            out.push_str(frac);
        }
    } else {
        let (first, rest) = digits.split_at(1);
        out.push_str(first);
        out.push('.');
        out.push_str(if rest.is_empty() { "0" } else { rest });
        out.push('E');
        out.push_str(&exponent.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(entries: Vec<ConstantInfo>) -> ConstantPool {
        ConstantPool(entries)
    }

    fn utf8(s: &str) -> ConstantInfo {
        ConstantInfo::Utf8(s.to_owned())
    }

    #[test]
    fn float_formatting() {
        assert_eq!(java_float(1.5), "1.5");
        assert_eq!(java_float(100.0), "100.0");
        assert_eq!(java_float(0.1), "0.1");
        assert_eq!(java_float(0.001), "0.001");
        assert_eq!(java_float(0.0001), "1.0E-4");
        assert_eq!(java_float(1.0e7), "1.0E7");
        assert_eq!(java_float(9999999.0), "9999999.0");
        assert_eq!(java_float(3.4028235e38), "3.4028235E38");
        assert_eq!(java_float(1.4e-45), "1.4E-45");
        assert_eq!(java_float(-2.5), "-2.5");
        assert_eq!(java_float(0.0), "0.0");
        assert_eq!(java_float(-0.0), "-0.0");
        assert_eq!(java_float(f32::NAN), "NaN");
        assert_eq!(java_float(f32::INFINITY), "Infinity");
        assert_eq!(java_float(f32::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn double_formatting() {
        assert_eq!(java_double(3.141592653589793), "3.141592653589793");
        assert_eq!(java_double(1.0), "1.0");
        assert_eq!(java_double(123456.789), "123456.789");
        assert_eq!(java_double(1.0e-5), "1.0E-5");
        assert_eq!(java_double(1.2345e10), "1.2345E10");
        assert_eq!(java_double(f64::MAX), "1.7976931348623157E308");
        assert_eq!(java_double(f64::MIN_POSITIVE), "2.2250738585072014E-308");
        assert_eq!(java_double(4.9e-324), "4.9E-324");
        assert_eq!(java_double(-0.0), "-0.0");
        assert_eq!(java_double(f64::NAN), "NaN");
        assert_eq!(java_double(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn numeric_values_carry_suffixes() {
        let pool = pool(vec![
            ConstantInfo::Float(f32::NAN),
            ConstantInfo::Long(-7),
            ConstantInfo::Unused,
            ConstantInfo::Double(f64::INFINITY),
            ConstantInfo::Unused,
            ConstantInfo::Integer(-2147483648),
        ]);

        assert_eq!(pool.string_value(1).unwrap(), "NaNf");
        assert_eq!(pool.string_value(2).unwrap(), "-7l");
        assert_eq!(pool.string_value(4).unwrap(), "Infinityd");
        assert_eq!(pool.string_value(6).unwrap(), "-2147483648");
        assert_eq!(pool.describe(2, 0).unwrap(), "long -7l");
    }

    #[test]
    fn phantom_slot_dangles() {
        let pool = pool(vec![ConstantInfo::Long(1), ConstantInfo::Unused, utf8("x")]);

        assert_eq!(
            pool.resolve(2),
            Err(ParseError::DanglingReference {
                index: 2,
                expected: "constant",
            })
        );
        assert!(pool.resolve(1).is_ok());
        assert!(pool.resolve(3).is_ok());
        assert_eq!(pool.entries().map(|(i, _)| i).collect::<Vec<_>>(), [1, 3]);
        assert_eq!(pool.count(), 4);
    }

    #[test]
    fn self_reference_is_rejected() {
        let pool = pool(vec![ConstantInfo::Class(Class { name_index: 1 })]);
        assert_eq!(
            pool.validate(),
            Err(ParseError::DanglingReference {
                index: 1,
                expected: "Utf8",
            })
        );
    }

    #[test]
    fn out_of_range_and_zero_dangle() {
        let pool = pool(vec![ConstantInfo::String(StringRef { string_index: 9 })]);
        assert!(pool.validate().is_err());
        assert!(pool.resolve(0).is_err());
        assert!(pool.resolve(2).is_err());
    }

    #[test]
    fn member_reference_forms() {
        let pool = pool(vec![
            ConstantInfo::MethodRef(MemberRef {
                class_index: 2,
                name_and_type_index: 3,
            }),
            ConstantInfo::Class(Class { name_index: 4 }),
            ConstantInfo::NameAndType(NameAndType {
                name_index: 5,
                descriptor_index: 6,
            }),
            utf8("java/lang/Object"),
            utf8("<init>"),
            utf8("()V"),
            ConstantInfo::MethodHandle(MethodHandle {
                reference_kind: ReferenceKind::InvokeSpecial,
                reference_index: 1,
            }),
        ]);

        let form = pool.resolve(1).unwrap();
        assert_eq!(form.tag, Tag::Methodref);
        assert_eq!(form.reference.as_deref(), Some("#2.#3"));
        assert_eq!(form.value, "java/lang/Object.\"<init>\":()V");

        assert_eq!(pool.string_value(3).unwrap(), "\"<init>\":()V");
        assert_eq!(
            pool.describe(1, 0).unwrap(),
            "Method java/lang/Object.\"<init>\":()V"
        );
        assert_eq!(pool.describe(1, 2).unwrap(), "Method \"<init>\":()V");
        assert_eq!(
            pool.string_value(7).unwrap(),
            "REF_invokeSpecial java/lang/Object.\"<init>\":()V"
        );
        assert_eq!(pool.resolve(7).unwrap().reference.as_deref(), Some("7:#1"));
        assert!(pool.validate().is_ok());
    }

    #[test]
    fn method_handle_kind_must_match_target() {
        let pool = pool(vec![
            ConstantInfo::MethodHandle(MethodHandle {
                reference_kind: ReferenceKind::GetField,
                reference_index: 2,
            }),
            ConstantInfo::MethodRef(MemberRef {
                class_index: 3,
                name_and_type_index: 4,
            }),
            ConstantInfo::Class(Class { name_index: 5 }),
            ConstantInfo::NameAndType(NameAndType {
                name_index: 5,
                descriptor_index: 5,
            }),
            utf8("A"),
        ]);

        assert_eq!(
            pool.validate(),
            Err(ParseError::DanglingReference {
                index: 2,
                expected: "Fieldref",
            })
        );
    }

    #[test]
    fn utf8_escapes() {
        assert_eq!(escape("a\nb\t'\"\\"), "a\\nb\\t\\'\\\"\\\\");
        assert_eq!(escape("\u{1}x\u{1}"), "\\u0001x\\u0001");
        assert_eq!(escape("héllo"), "héllo");
    }

    #[test]
    fn names_are_quoted_when_not_identifiers() {
        assert_eq!(checked_name("java/lang/Object"), "java/lang/Object");
        assert_eq!(checked_name("Outer$Inner"), "Outer$Inner");
        assert_eq!(checked_name("lambda$main$0"), "lambda$main$0");
        assert_eq!(checked_name("<init>"), "\"<init>\"");
        assert_eq!(checked_name("[Ljava/lang/String;"), "\"[Ljava/lang/String;\"");
        assert_eq!(checked_name("[I"), "\"[I\"");
        assert_eq!(checked_name(""), "\"\"");
    }

    #[test]
    fn modified_utf8() {
        assert_eq!(decode_modified_utf8(b"abc"), "abc");
        assert_eq!(decode_modified_utf8(&[0xc0, 0x80]), "\0");
        assert_eq!(decode_modified_utf8(&[0xc3, 0xa9]), "é");
        // U+1F600 as a surrogate pair
        assert_eq!(
            decode_modified_utf8(&[0xed, 0xa0, 0xbd, 0xed, 0xb8, 0x80]),
            "\u{1f600}"
        );
        assert_eq!(decode_modified_utf8(&[0xff]), "\u{fffd}");
    }
}
