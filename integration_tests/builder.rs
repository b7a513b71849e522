use std::collections::HashMap;

use byteorder::{BigEndian, WriteBytesExt};

const UTF8: u8 = 1;
const LONG: u8 = 5;
const CLASS: u8 = 7;
const STRING: u8 = 8;
const FIELDREF: u8 = 9;
const METHODREF: u8 = 10;
const NAME_AND_TYPE: u8 = 12;

/// Assembles class files in memory. Constant pool entries are interned, so
/// asking for the same entry twice returns the same index.
#[derive(Default)]
pub struct ClassBuilder {
    pool: Vec<u8>,
    next_index: u16,
    interned: HashMap<Vec<u8>, u16>,
    access_flags: u16,
    this_class: u16,
    super_class: u16,
    methods: Vec<Vec<u8>>,
    attributes: Vec<Vec<u8>>,
}

impl ClassBuilder {
    pub fn new(access_flags: u16, name: &str, super_name: &str) -> ClassBuilder {
        let mut builder = ClassBuilder {
            next_index: 1,
            access_flags,
            ..Default::default()
        };
        builder.this_class = builder.class(name);
        builder.super_class = builder.class(super_name);
        builder
    }

    fn entry(&mut self, bytes: Vec<u8>, slots: u16) -> u16 {
        if let Some(&index) = self.interned.get(&bytes) {
            return index;
        }
        let index = self.next_index;
        self.pool.extend_from_slice(&bytes);
        self.interned.insert(bytes, index);
        self.next_index += slots;
        index
    }

    pub fn utf8(&mut self, s: &str) -> u16 {
        let mut bytes = vec![UTF8];
        bytes.write_u16::<BigEndian>(s.len() as u16).unwrap();
        bytes.extend_from_slice(s.as_bytes());
        self.entry(bytes, 1)
    }

    pub fn class(&mut self, name: &str) -> u16 {
        let name = self.utf8(name);
        self.class_at(name)
    }

    /// A Class entry with an arbitrary, possibly invalid, name index.
    pub fn class_at(&mut self, name_index: u16) -> u16 {
        self.entry(tagged(CLASS, &[name_index]), 1)
    }

    pub fn string(&mut self, s: &str) -> u16 {
        let utf8 = self.utf8(s);
        self.entry(tagged(STRING, &[utf8]), 1)
    }

    pub fn long(&mut self, value: i64) -> u16 {
        let mut bytes = vec![LONG];
        bytes.write_i64::<BigEndian>(value).unwrap();
        self.entry(bytes, 2)
    }

    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        self.entry(tagged(NAME_AND_TYPE, &[name, descriptor]), 1)
    }

    pub fn field_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        self.member_ref(FIELDREF, owner, name, descriptor)
    }

    pub fn method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        self.member_ref(METHODREF, owner, name, descriptor)
    }

    fn member_ref(&mut self, tag: u8, owner: &str, name: &str, descriptor: &str) -> u16 {
        let class = self.class(owner);
        let name_and_type = self.name_and_type(name, descriptor);
        self.entry(tagged(tag, &[class, name_and_type]), 1)
    }

    pub fn attribute(&mut self, name: &str, body: &[u8]) -> Vec<u8> {
        let name = self.utf8(name);
        encode_attribute(name, body)
    }

    pub fn code(
        &mut self,
        max_stack: u16,
        max_locals: u16,
        code: &[u8],
        attributes: Vec<Vec<u8>>,
    ) -> Vec<u8> {
        let mut body = vec![];
        body.write_u16::<BigEndian>(max_stack).unwrap();
        body.write_u16::<BigEndian>(max_locals).unwrap();
        body.write_u32::<BigEndian>(code.len() as u32).unwrap();
        body.extend_from_slice(code);
        // empty exception table
        body.write_u16::<BigEndian>(0).unwrap();
        body.write_u16::<BigEndian>(attributes.len() as u16).unwrap();
        body.extend(attributes.concat());
        self.attribute("Code", &body)
    }

    /// `(start_pc, line_number)` pairs.
    pub fn line_numbers(&mut self, lines: &[(u16, u16)]) -> Vec<u8> {
        let mut body = vec![];
        body.write_u16::<BigEndian>(lines.len() as u16).unwrap();
        for &(start_pc, line_number) in lines {
            body.write_u16::<BigEndian>(start_pc).unwrap();
            body.write_u16::<BigEndian>(line_number).unwrap();
        }
        self.attribute("LineNumberTable", &body)
    }

    pub fn source_file(&mut self, file_name: &str) -> Vec<u8> {
        let name = self.utf8("SourceFile");
        let value = self.utf8(file_name);
        encode_attribute(name, &value.to_be_bytes())
    }

    pub fn signature(&mut self, signature: &str) -> Vec<u8> {
        let name = self.utf8("Signature");
        let value = self.utf8(signature);
        encode_attribute(name, &value.to_be_bytes())
    }

    pub fn method(
        &mut self,
        access_flags: u16,
        name: &str,
        descriptor: &str,
        attributes: Vec<Vec<u8>>,
    ) {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);

        let mut method = vec![];
        for value in [access_flags, name, descriptor, attributes.len() as u16] {
            method.write_u16::<BigEndian>(value).unwrap();
        }
        method.extend(attributes.concat());
        self.methods.push(method);
    }

    pub fn class_attribute(&mut self, attribute: Vec<u8>) {
        self.attributes.push(attribute);
    }

    /// The declared constant pool count of [`ClassBuilder::build`].
    pub fn pool_count(&self) -> u16 {
        self.next_index
    }

    pub fn build(&self) -> Vec<u8> {
        self.build_with_pool_count(self.next_index)
    }

    /// Builds the class with a constant pool count that may disagree with
    /// the entries actually written.
    pub fn build_with_pool_count(&self, pool_count: u16) -> Vec<u8> {
        let mut bytes = vec![];
        bytes.write_u32::<BigEndian>(0xcafebabe).unwrap();
        // minor, major
        bytes.write_u16::<BigEndian>(0).unwrap();
        bytes.write_u16::<BigEndian>(52).unwrap();
        bytes.write_u16::<BigEndian>(pool_count).unwrap();
        bytes.extend_from_slice(&self.pool);
        for value in [self.access_flags, self.this_class, self.super_class] {
            bytes.write_u16::<BigEndian>(value).unwrap();
        }
        // no interfaces or fields
        bytes.write_u16::<BigEndian>(0).unwrap();
        bytes.write_u16::<BigEndian>(0).unwrap();
        bytes.write_u16::<BigEndian>(self.methods.len() as u16).unwrap();
        bytes.extend(self.methods.concat());
        bytes.write_u16::<BigEndian>(self.attributes.len() as u16).unwrap();
        bytes.extend(self.attributes.concat());
        bytes
    }
}

fn tagged(tag: u8, indices: &[u16]) -> Vec<u8> {
    let mut bytes = vec![tag];
    for &index in indices {
        bytes.write_u16::<BigEndian>(index).unwrap();
    }
    bytes
}

fn encode_attribute(name_index: u16, body: &[u8]) -> Vec<u8> {
    let mut bytes = vec![];
    bytes.write_u16::<BigEndian>(name_index).unwrap();
    bytes.write_u32::<BigEndian>(body.len() as u32).unwrap();
    bytes.extend_from_slice(body);
    bytes
}
