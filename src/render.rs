use std::path::Path;

use sha2::{Digest, Sha256};
use time::macros::format_description;
use time::OffsetDateTime;

use crate::class_file::constant_pool::{ConstantPool, Tag};
use crate::class_file::*;
use crate::descriptor::{
    java_name, parse_class_signature, parse_field_descriptor, parse_field_signature,
    parse_method_descriptor, parse_method_signature, type_params_to_string,
};
use crate::instructions::{Instruction, Operands};

const INDENT_WIDTH: usize = 2;
const TAB_COLUMN: usize = 40;

/// Line writer with javap's layout rules: indentation is applied when a
/// line's first visible character is written, and spaces are held back
/// until something follows them, so lines never end in whitespace.
#[derive(Default)]
struct Printer {
    output: String,
    buffer: String,
    /// Width in UTF-16 units, which is what javap's columns count.
    buffer_width: usize,
    pending_spaces: usize,
    indent: usize,
}

impl Printer {
    fn print(&mut self, text: &str) {
        for c in text.chars() {
            match c {
                ' ' => self.pending_spaces += 1,
                '\n' => self.newline(),
                c => {
                    if self.buffer.is_empty() {
                        self.pending_spaces += self.indent * INDENT_WIDTH;
                    }
                    self.buffer.extend(std::iter::repeat(' ').take(self.pending_spaces));
                    self.buffer_width += self.pending_spaces + c.len_utf16();
                    self.pending_spaces = 0;
                    self.buffer.push(c);
                }
            }
        }
    }

    fn println(&mut self, text: &str) {
        self.print(text);
        self.newline();
    }

    fn newline(&mut self) {
        self.output.push_str(&self.buffer);
        self.output.push('\n');
        self.buffer.clear();
        self.buffer_width = 0;
        self.pending_spaces = 0;
    }

    /// Moves to the comment column of the current indentation level, or
    /// one space further when the text already reaches it.
    fn tab(&mut self) {
        let column = self.indent * INDENT_WIDTH + TAB_COLUMN;
        self.pending_spaces += if column <= self.buffer_width {
            1
        } else {
            column - self.buffer_width
        };
    }

    fn commented(&mut self, text: &str, comment: &str) {
        self.print(text);
        self.tab();
        self.print("// ");
        self.println(comment);
    }

    fn indent(&mut self) {
        self.indent += 1;
    }

    fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    fn finish(mut self) -> String {
        if !self.buffer.is_empty() {
            self.newline();
        }
        self.output
    }
}

/// Renders a parsed class the way `javap -v -l -p` prints it, without the
/// per-file header.
pub fn render(class_file: &ClassFile) -> String {
    let mut renderer = Renderer {
        class_file,
        pool: &class_file.constant_pool,
        printer: Printer::default(),
    };
    renderer.write_class();
    renderer.printer.finish()
}

/// The `Classfile` lines javap prints before the class itself.
pub struct FileHeader {
    pub path: String,
    pub modified: OffsetDateTime,
    pub size: usize,
    pub sha256: String,
}

impl FileHeader {
    pub fn new(path: &Path, bytes: &[u8], modified: OffsetDateTime) -> FileHeader {
        let sha256 = Sha256::digest(bytes)
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect();

        FileHeader {
            path: path.display().to_string(),
            modified,
            size: bytes.len(),
            sha256,
        }
    }

    pub fn render(&self) -> String {
        let date = self
            .modified
            .format(format_description!(
                "[month repr:short] [day padding:none], [year]"
            ))
            .unwrap_or_default();

        format!(
            "Classfile {}\n  Last modified {date}; size {} bytes\n  SHA-256 checksum {}\n",
            self.path, self.size, self.sha256
        )
    }
}

struct Renderer<'c> {
    class_file: &'c ClassFile,
    pool: &'c ConstantPool,
    printer: Printer,
}

impl<'c> Renderer<'c> {
    fn write_class(&mut self) {
        let class_file = self.class_file;

        if let Some(index) = class_file.source_file() {
            self.printer.indent();
            self.printer
                .println(&format!("Compiled from \"{}\"", self.utf8(index)));
            self.printer.dedent();
        }

        self.write_declaration();

        self.printer.indent();
        self.printer
            .println(&format!("minor version: {}", class_file.minor_version));
        self.printer
            .println(&format!("major version: {}", class_file.major_version));
        self.printer
            .println(&flags_line(&class_file.access_flags));
        self.printer.commented(
            &format!("this_class: #{}", class_file.this_class),
            &self.value(class_file.this_class),
        );
        if class_file.super_class == 0 {
            self.printer.println("super_class: #0");
        } else {
            self.printer.commented(
                &format!("super_class: #{}", class_file.super_class),
                &self.value(class_file.super_class),
            );
        }
        self.printer.println(&format!(
            "interfaces: {}, fields: {}, methods: {}, attributes: {}",
            class_file.interfaces.len(),
            class_file.fields.len(),
            class_file.methods.len(),
            class_file.attributes.len()
        ));
        self.printer.dedent();

        self.write_constant_pool();

        self.printer.println("{");
        for field in &class_file.fields {
            self.write_field(field);
        }
        for (i, method) in class_file.methods.iter().enumerate() {
            if i > 0 {
                self.printer.newline();
            }
            self.write_method(method);
        }
        self.printer.println("}");

        self.write_attributes(&class_file.attributes, None);
    }

    fn write_declaration(&mut self) {
        let class_file = self.class_file;
        let is_interface = class_file.is_interface();

        self.printer
            .print(&modifiers_prefix(&class_file.access_flags.modifiers()));
        self.printer
            .print(if is_interface { "interface " } else { "class " });
        self.printer.print(&java_name(self.class_name(class_file.this_class)));

        let signature = signature_index(&class_file.attributes)
            .and_then(|index| self.pool.utf8(index).ok())
            .and_then(|signature| parse_class_signature(signature).ok());

        match signature {
            Some(signature) => {
                self.printer
                    .print(&type_params_to_string(&signature.type_params));
                let interfaces: Vec<_> =
                    signature.interfaces.iter().map(ToString::to_string).collect();
                if is_interface {
                    if !interfaces.is_empty() {
                        self.printer
                            .print(&format!(" extends {}", interfaces.join(", ")));
                    }
                } else {
                    self.printer
                        .print(&format!(" extends {}", signature.superclass));
                    if !interfaces.is_empty() {
                        self.printer
                            .print(&format!(" implements {}", interfaces.join(", ")));
                    }
                }
            }
            None => {
                if !is_interface && class_file.super_class != 0 {
                    let super_name = java_name(self.class_name(class_file.super_class));
                    if super_name != "java.lang.Object" {
                        self.printer.print(&format!(" extends {super_name}"));
                    }
                }
                if !class_file.interfaces.is_empty() {
                    let interfaces: Vec<_> = class_file
                        .interfaces
                        .iter()
                        .map(|&index| java_name(self.class_name(index)))
                        .collect();
                    let keyword = if is_interface { "extends" } else { "implements" };
                    self.printer
                        .print(&format!(" {keyword} {}", interfaces.join(",")));
                }
            }
        }

        self.printer.newline();
    }

    fn write_constant_pool(&mut self) {
        let width = self.pool.count().to_string().len() + 1;

        self.printer.println("Constant pool:");
        self.printer.indent();
        for (index, _) in self.pool.entries() {
            let Ok(form) = self.pool.resolve(index) else {
                continue;
            };
            let head = format!(
                "{:>width$} = {:<18} ",
                format!("#{index}"),
                form.tag.name()
            );
            match form.reference {
                None => self.printer.println(&format!("{head}{}", form.value)),
                Some(reference) => {
                    self.printer.print(&format!("{head}{reference}"));
                    self.printer.tab();
                    self.printer.print(if form.tag == Tag::MethodType {
                        "//  "
                    } else {
                        "// "
                    });
                    self.printer.println(&form.value);
                }
            }
        }
        self.printer.dedent();
    }

    fn write_field(&mut self, field: &FieldInfo) {
        let descriptor = self.utf8(field.descriptor_index);
        let field_type = self.field_type(descriptor, &field.attributes);

        self.printer.indent();
        self.printer.println(&format!(
            "{}{field_type} {};",
            modifiers_prefix(&field.access_flags.modifiers()),
            self.utf8(field.name_index)
        ));

        self.printer.indent();
        self.printer.println(&format!("descriptor: {descriptor}"));
        self.printer.println(&flags_line(&field.access_flags));
        self.write_attributes(&field.attributes, None);
        self.printer.dedent();
        self.printer.dedent();

        self.printer.newline();
    }

    fn write_method(&mut self, method: &MethodInfo) {
        self.printer.indent();
        self.write_method_declaration(method);

        self.printer.indent();
        self.printer.println(&format!(
            "descriptor: {}",
            self.utf8(method.descriptor_index)
        ));
        self.printer.println(&flags_line(&method.access_flags));
        self.write_attributes(&method.attributes, Some(method));
        self.printer.dedent();
        self.printer.dedent();
    }

    fn write_method_declaration(&mut self, method: &MethodInfo) {
        let name = self.utf8(method.name_index);
        let descriptor = self.utf8(method.descriptor_index);

        let mut modifiers = method.access_flags.modifiers();
        if self.is_default_method(method, name) {
            modifiers.push("default");
        }
        self.printer.print(&modifiers_prefix(&modifiers));

        if name == "<clinit>" {
            self.printer.println("{};");
            return;
        }

        let signature = signature_index(&method.attributes)
            .and_then(|index| self.pool.utf8(index).ok())
            .and_then(|signature| parse_method_signature(signature).ok());

        let (type_params, mut params, return_type, mut throws): (
            String,
            Vec<String>,
            String,
            Vec<String>,
        ) = match &signature {
            Some(signature) => (
                type_params_to_string(&signature.type_params),
                signature.params.iter().map(ToString::to_string).collect(),
                signature
                    .return_type
                    .as_ref()
                    .map_or_else(|| "void".to_owned(), ToString::to_string),
                signature.throws.iter().map(ToString::to_string).collect(),
            ),
            None => {
                let descriptor = parse_method_descriptor(descriptor).ok();
                let params = descriptor
                    .as_ref()
                    .map(|d| d.params.iter().map(ToString::to_string).collect())
                    .unwrap_or_default();
                let return_type = descriptor
                    .and_then(|d| d.return_type)
                    .map_or_else(|| "void".to_owned(), |ty| ty.to_string());
                (String::new(), params, return_type, vec![])
            }
        };

        if name == "<init>" && signature.is_none() && self.class_file.is_enum() {
            // name and ordinal
            params.drain(..params.len().min(2));
        }

        if throws.is_empty() {
            if let Some(exceptions) = method.exceptions() {
                throws = exceptions
                    .exception_index_table
                    .iter()
                    .map(|&index| java_name(self.class_name(index)))
                    .collect();
            }
        }

        let mut params = params.join(", ");
        if method.access_flags.contains(MethodAccessFlags::VARARGS) {
            if let Some(i) = params.rfind("[]") {
                params.replace_range(i..i + 2, "...");
            }
        }

        let head = if name == "<init>" {
            java_name(self.class_name(self.class_file.this_class))
        } else {
            format!("{return_type} {name}")
        };
        if !type_params.is_empty() {
            self.printer.print(&format!("{type_params} "));
        }
        self.printer.print(&format!("{head}({params})"));
        if method.exceptions().is_some() {
            self.printer.print(&format!(" throws {}", throws.join(", ")));
        }
        self.printer.println(";");
    }

    /// Concrete instance methods of interfaces compiled for Java 8 or later.
    fn is_default_method(&self, method: &MethodInfo, name: &str) -> bool {
        let flags = method.access_flags;
        self.class_file.is_interface()
            && self.class_file.major_version >= 52
            && name != "<clinit>"
            && !flags.intersects(
                MethodAccessFlags::ABSTRACT
                    | MethodAccessFlags::STATIC
                    | MethodAccessFlags::PRIVATE,
            )
    }

    fn write_attributes(&mut self, attributes: &[AttributeInfo], method: Option<&MethodInfo>) {
        for attribute in attributes {
            self.write_attribute(attribute, method);
        }
    }

    fn write_attribute(&mut self, attribute: &AttributeInfo, method: Option<&MethodInfo>) {
        match attribute {
            AttributeInfo::Code(code) => self.write_code(code, method),
            AttributeInfo::LineNumberTable(table) => {
                self.printer.println("LineNumberTable:");
                self.printer.indent();
                for entry in &table.line_number_table {
                    self.printer.println(&format!(
                        "line {}: {}",
                        entry.line_number, entry.start_pc
                    ));
                }
                self.printer.dedent();
            }
            AttributeInfo::LocalVariableTable(table) => {
                self.write_local_variable_table("LocalVariableTable", table)
            }
            AttributeInfo::LocalVariableTypeTable(table) => {
                self.write_local_variable_table("LocalVariableTypeTable", table)
            }
            AttributeInfo::StackMapTable(table) => self.write_stack_map_table(table),
            AttributeInfo::ConstantValue(attr) => {
                let value = self.describe(attr.constantvalue_index);
                self.printer.println(&format!("ConstantValue: {value}"));
            }
            AttributeInfo::Exceptions(attr) => {
                let names: Vec<_> = attr
                    .exception_index_table
                    .iter()
                    .map(|&index| java_name(self.class_name(index)))
                    .collect();
                self.printer.println("Exceptions:");
                self.printer.indent();
                self.printer
                    .println(&format!("throws {}", names.join(", ")));
                self.printer.dedent();
            }
            AttributeInfo::Signature(attr) => {
                let signature = self.utf8(attr.signature_index);
                self.printer.commented(
                    &format!("Signature: #{}", attr.signature_index),
                    signature,
                );
            }
            AttributeInfo::Deprecated => self.printer.println("Deprecated: true"),
            AttributeInfo::Synthetic => self.printer.println("Synthetic: true"),
            AttributeInfo::SourceFile(attr) => {
                let source_file = self.utf8(attr.sourcefile_index);
                self.printer
                    .println(&format!("SourceFile: \"{source_file}\""));
            }
            AttributeInfo::InnerClasses(attr) => self.write_inner_classes(attr),
            AttributeInfo::EnclosingMethod(attr) => {
                let mut comment = java_name(self.class_name(attr.class_index));
                if attr.method_index != 0 {
                    if let Ok(nat) = self.pool.name_and_type(attr.method_index) {
                        comment.push('.');
                        comment.push_str(self.utf8(nat.name_index));
                    }
                }
                self.printer.commented(
                    &format!(
                        "EnclosingMethod: #{}.#{}",
                        attr.class_index, attr.method_index
                    ),
                    &comment,
                );
            }
            AttributeInfo::BootstrapMethods(attr) => {
                self.printer.println("BootstrapMethods:");
                self.printer.indent();
                for (i, method) in attr.bootstrap_methods.iter().enumerate() {
                    self.printer.println(&format!(
                        "{i}: #{} {}",
                        method.bootstrap_method_ref,
                        self.value(method.bootstrap_method_ref)
                    ));
                    self.printer.indent();
                    self.printer.println("Method arguments:");
                    self.printer.indent();
                    for &argument in &method.bootstrap_arguments {
                        self.printer
                            .println(&format!("#{argument} {}", self.value(argument)));
                    }
                    self.printer.dedent();
                    self.printer.dedent();
                }
                self.printer.dedent();
            }
            AttributeInfo::MethodParameters(attr) => {
                self.printer.println("MethodParameters:");
                self.printer.indent();
                self.printer.println(&format!("{:<31}{}", "Name", "Flags"));
                for parameter in &attr.parameters {
                    let name = if parameter.name_index == 0 {
                        "<no name>"
                    } else {
                        self.utf8(parameter.name_index)
                    };
                    let flags = parameter.access_flags;
                    let mut flag_text = String::new();
                    if flags.contains(ParameterAccessFlags::FINAL) {
                        flag_text.push_str("final ");
                    }
                    if flags.contains(ParameterAccessFlags::MANDATED) {
                        flag_text.push_str("mandated ");
                    }
                    if flags.contains(ParameterAccessFlags::SYNTHETIC) {
                        flag_text.push_str("synthetic");
                    }
                    self.printer.println(&format!("{name:<31}{flag_text}"));
                }
                self.printer.dedent();
            }
            AttributeInfo::NestHost(attr) => {
                let host = self.describe(attr.host_class_index);
                self.printer.println(&format!("NestHost: {host}"));
            }
            AttributeInfo::NestMembers(attr) => self.write_class_list("NestMembers", attr),
            AttributeInfo::PermittedSubclasses(attr) => {
                self.write_class_list("PermittedSubclasses", attr)
            }
            AttributeInfo::Record(attr) => {
                self.printer.println("Record:");
                self.printer.indent();
                for component in &attr.components {
                    let descriptor = self.utf8(component.descriptor_index);
                    let component_type = self.field_type(descriptor, &component.attributes);
                    self.printer.println(&format!(
                        "{component_type} {};",
                        self.utf8(component.name_index)
                    ));
                    self.printer.indent();
                    self.printer.println(&format!("descriptor: {descriptor}"));
                    self.write_attributes(&component.attributes, None);
                    self.printer.newline();
                    self.printer.dedent();
                }
                self.printer.dedent();
            }
            AttributeInfo::Custom(attr) => {
                let name = self.utf8(attr.attribute_name_index);
                self.printer.print("  ");
                self.printer.println(&format!(
                    "{name}: length = 0x{:X} (unknown attribute)",
                    attr.info.len()
                ));
                self.printer.print("   ");
                for (i, byte) in attr.info.iter().enumerate() {
                    self.printer.print(&format!("{byte:02X}"));
                    if (i + 1) % 16 == 0 {
                        self.printer.newline();
                        self.printer.print("   ");
                    } else {
                        self.printer.print(" ");
                    }
                }
                self.printer.newline();
            }
        }
    }

    fn write_code(&mut self, code: &CodeAttribute, method: Option<&MethodInfo>) {
        let args_size = method.map_or(0, |method| {
            let params = parse_method_descriptor(self.utf8(method.descriptor_index))
                .map_or(0, |descriptor| descriptor.params.len());
            if method.access_flags.contains(MethodAccessFlags::STATIC) {
                params
            } else {
                params + 1
            }
        });

        self.printer.println("Code:");
        self.printer.indent();
        self.printer.println(&format!(
            "stack={}, locals={}, args_size={args_size}",
            code.max_stack, code.max_locals
        ));

        for instruction in &code.instructions {
            self.write_instruction(instruction);
        }

        if !code.exception_table.is_empty() {
            self.printer.println("Exception table:");
            self.printer.indent();
            self.printer.println(" from    to  target type");
            for entry in &code.exception_table {
                let catch_type = if entry.catch_type == 0 {
                    "any".to_owned()
                } else {
                    format!("Class {}", self.value(entry.catch_type))
                };
                self.printer.println(&format!(
                    " {:5} {:5} {:5}   {catch_type}",
                    entry.start_pc, entry.end_pc, entry.handler_pc
                ));
            }
            self.printer.dedent();
        }

        self.write_attributes(&code.attributes, method);
        self.printer.dedent();
    }

    fn write_instruction(&mut self, instruction: &Instruction) {
        self.printer.print(&format!(
            "{:>4}: {:<13} ",
            instruction.offset,
            instruction.mnemonic()
        ));

        match &instruction.operands {
            Operands::TableSwitch {
                default,
                low,
                high,
                targets,
            } => {
                self.printer.println(&format!("{{ // {low} to {high}"));
                for (key, target) in (*low as i64..).zip(targets) {
                    self.printer.println(&format!("{key:>18}: {target}"));
                }
                self.printer
                    .println(&format!("{:>18}: {default}", "default"));
                self.printer.println("      }");
            }
            Operands::LookupSwitch { default, pairs } => {
                self.printer.println(&format!("{{ // {}", pairs.len()));
                for (key, target) in pairs {
                    self.printer.println(&format!("{key:>18}: {target}"));
                }
                self.printer
                    .println(&format!("{:>18}: {default}", "default"));
                self.printer.println("      }");
            }
            _ => {
                self.printer.print(&instruction.operand_text());
                match instruction.constant_index() {
                    Some(index) => {
                        self.printer.tab();
                        self.printer.println(&format!(
                            "// {}",
                            self.pool
                                .describe(index, self.class_file.this_class)
                                .unwrap_or_default()
                        ));
                    }
                    None => self.printer.newline(),
                }
            }
        }
    }

    fn write_local_variable_table(&mut self, title: &str, table: &LocalVariableTableAttribute) {
        self.printer.println(&format!("{title}:"));
        self.printer.indent();
        self.printer.println("Start  Length  Slot  Name   Signature");
        for entry in &table.local_variable_table {
            self.printer.println(&format!(
                "{:5} {:7} {:5} {:>5}   {}",
                entry.start_pc,
                entry.length,
                entry.index,
                self.utf8(entry.name_index),
                self.utf8(entry.descriptor_index)
            ));
        }
        self.printer.dedent();
    }

    fn write_stack_map_table(&mut self, table: &StackMapTableAttribute) {
        self.printer.println(&format!(
            "StackMapTable: number_of_entries = {}",
            table.entries.len()
        ));
        self.printer.indent();
        for frame in &table.entries {
            match frame {
                StackMapFrame::Same { frame_type } => {
                    self.printer
                        .println(&format!("frame_type = {frame_type} /* same */"));
                }
                StackMapFrame::SameLocals1StackItem { frame_type, stack } => {
                    self.printer.println(&format!(
                        "frame_type = {frame_type} /* same_locals_1_stack_item */"
                    ));
                    self.printer.indent();
                    self.write_verification_types("stack", std::slice::from_ref(stack));
                    self.printer.dedent();
                }
                StackMapFrame::SameLocals1StackItemExtended {
                    offset_delta,
                    stack,
                } => {
                    self.printer.println(
                        "frame_type = 247 /* same_locals_1_stack_item_frame_extended */",
                    );
                    self.printer.indent();
                    self.printer
                        .println(&format!("offset_delta = {offset_delta}"));
                    self.write_verification_types("stack", std::slice::from_ref(stack));
                    self.printer.dedent();
                }
                StackMapFrame::Chop {
                    frame_type,
                    offset_delta,
                } => {
                    self.printer
                        .println(&format!("frame_type = {frame_type} /* chop */"));
                    self.printer.indent();
                    self.printer
                        .println(&format!("offset_delta = {offset_delta}"));
                    self.printer.dedent();
                }
                StackMapFrame::SameExtended { offset_delta } => {
                    self.printer
                        .println("frame_type = 251 /* same_frame_extended */");
                    self.printer.indent();
                    self.printer
                        .println(&format!("offset_delta = {offset_delta}"));
                    self.printer.dedent();
                }
                StackMapFrame::Append {
                    frame_type,
                    offset_delta,
                    locals,
                } => {
                    self.printer
                        .println(&format!("frame_type = {frame_type} /* append */"));
                    self.printer.indent();
                    self.printer
                        .println(&format!("offset_delta = {offset_delta}"));
                    self.write_verification_types("locals", locals);
                    self.printer.dedent();
                }
                StackMapFrame::Full {
                    offset_delta,
                    locals,
                    stack,
                } => {
                    self.printer.println("frame_type = 255 /* full_frame */");
                    self.printer.indent();
                    self.printer
                        .println(&format!("offset_delta = {offset_delta}"));
                    self.write_verification_types("locals", locals);
                    self.write_verification_types("stack", stack);
                    self.printer.dedent();
                }
            }
        }
        self.printer.dedent();
    }

    fn write_verification_types(&mut self, label: &str, types: &[VerificationType]) {
        let names: Vec<_> = types
            .iter()
            .map(|ty| match ty {
                VerificationType::Top => "top".to_owned(),
                VerificationType::Integer => "int".to_owned(),
                VerificationType::Float => "float".to_owned(),
                VerificationType::Double => "double".to_owned(),
                VerificationType::Long => "long".to_owned(),
                VerificationType::Null => "null".to_owned(),
                VerificationType::UninitializedThis => "this".to_owned(),
                VerificationType::Object { class_index } => self.describe(*class_index),
                VerificationType::Uninitialized { offset } => format!("uninitialized {offset}"),
            })
            .collect();

        if names.is_empty() {
            self.printer.println(&format!("{label} = []"));
        } else {
            self.printer
                .println(&format!("{label} = [ {} ]", names.join(", ")));
        }
    }

    fn write_inner_classes(&mut self, attr: &InnerClassesAttribute) {
        self.printer.println("InnerClasses:");
        self.printer.indent();
        for class in &attr.classes {
            let mut text = modifiers_prefix(&class.inner_class_access_flags.modifiers());
            let mut comment = String::new();
            if class.inner_name_index != 0 {
                text.push_str(&format!("#{}= ", class.inner_name_index));
                comment.push_str(&format!("{}=", self.utf8(class.inner_name_index)));
            }
            text.push_str(&format!("#{}", class.inner_class_info_index));
            comment.push_str(&self.describe(class.inner_class_info_index));
            if class.outer_class_info_index != 0 {
                text.push_str(&format!(" of #{}", class.outer_class_info_index));
                comment.push_str(&format!(
                    " of {}",
                    self.describe(class.outer_class_info_index)
                ));
            }
            text.push(';');
            self.printer.commented(&text, &comment);
        }
        self.printer.dedent();
    }

    fn write_class_list(&mut self, title: &str, attr: &ClassListAttribute) {
        self.printer.println(&format!("{title}:"));
        self.printer.indent();
        for &class in &attr.classes {
            self.printer.println(&self.value(class));
        }
        self.printer.dedent();
    }

    /// Java type of a field or record component, preferring its generic
    /// signature.
    fn field_type(&self, descriptor: &str, attributes: &[AttributeInfo]) -> String {
        signature_index(attributes)
            .and_then(|index| self.pool.utf8(index).ok())
            .and_then(|signature| parse_field_signature(signature).ok())
            .map(|ty| ty.to_string())
            .or_else(|| parse_field_descriptor(descriptor).ok().map(|ty| ty.to_string()))
            .unwrap_or_else(|| descriptor.to_owned())
    }

    fn utf8(&self, index: u16) -> &'c str {
        self.pool.utf8(index).unwrap_or_default()
    }

    fn class_name(&self, index: u16) -> &'c str {
        self.pool.class_name(index).unwrap_or_default()
    }

    fn value(&self, index: u16) -> String {
        self.pool
            .string_value(index)
            .unwrap_or_else(|_| format!("#{index}"))
    }

    fn describe(&self, index: u16) -> String {
        self.pool
            .describe(index, 0)
            .unwrap_or_else(|_| format!("#{index}"))
    }
}

fn modifiers_prefix(modifiers: &[&str]) -> String {
    modifiers.iter().map(|m| format!("{m} ")).collect()
}

fn flags_line(flags: &impl AccessFlags) -> String {
    format!(
        "flags: (0x{:04x}) {}",
        flags.raw(),
        flags.flag_names().join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_pads_to_indented_column() {
        let mut printer = Printer::default();
        printer.indent();
        printer.commented("#1 = Class", "A");
        printer.indent();
        printer.commented(&"x".repeat(50), "B");

        let output = printer.finish();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines[0].find("//"), Some(42));
        assert_eq!(lines[1], format!("    {} // B", "x".repeat(50)));
    }

    #[test]
    fn trailing_spaces_are_dropped() {
        let mut printer = Printer::default();
        printer.indent();
        printer.println("flags: (0x0000) ");
        printer.println("  ");
        printer.print("a  b");
        printer.newline();

        assert_eq!(printer.finish(), "  flags: (0x0000)\n\n  a  b\n");
    }

    #[test]
    fn columns_count_utf16_units() {
        let mut printer = Printer::default();
        printer.indent();
        printer.commented("#1 = Utf8               \u{1F600}", "x");

        let output = printer.finish();
        // the emoji is two UTF-16 units but a single char
        let comment = output.find("//").unwrap();
        assert_eq!(output[..comment].encode_utf16().count(), 42);
    }

    #[test]
    fn file_header() {
        let modified = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let header = FileHeader::new(Path::new("/tmp/A.class"), b"abc", modified);

        assert_eq!(
            header.render(),
            "Classfile /tmp/A.class\n  Last modified Nov 14, 2023; size 3 bytes\n  SHA-256 checksum ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad\n"
        );
    }
}
