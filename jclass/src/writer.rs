//! In-memory assembly of class images: a deduplicating constant-pool
//! builder plus a writer for whole class files. The VM uses this for its
//! built-in classes; tests use it in place of binary fixtures.

use std::collections::HashMap;

use crate::attributes::ATTR_CODE;
use crate::constants::{
    Class, ConstantPool, Fieldref, Methodref, NameAndType, Utf8,
};

const MAGIC: u32 = 0xCAFE_BABE;
const MAJOR_VERSION: u16 = 52;

/// Builds a constant pool, deduplicating entries so repeated names and
/// references share one index. Index 0 is the reserved placeholder.
#[derive(Default)]
pub struct ConstantPoolBuilder {
    entries: Vec<ConstantPool>,
    utf8: HashMap<String, u16>,
    class: HashMap<String, u16>,
    name_and_type: HashMap<(String, String), u16>,
    fieldref: HashMap<(String, String, String), u16>,
    methodref: HashMap<(String, String, String), u16>,
}

impl ConstantPoolBuilder {
    pub fn new() -> ConstantPoolBuilder {
        ConstantPoolBuilder {
            entries: vec![ConstantPool::Unknown],
            ..Default::default()
        }
    }

    fn push(&mut self, entry: ConstantPool) -> u16 {
        self.entries.push(entry);
        (self.entries.len() - 1) as u16
    }

    pub fn utf8(&mut self, value: &str) -> u16 {
        if let Some(&index) = self.utf8.get(value) {
            return index;
        }
        let index = self.push(ConstantPool::Utf8(Utf8::from(value)));
        self.utf8.insert(value.to_string(), index);
        index
    }

    pub fn class(&mut self, name: &str) -> u16 {
        if let Some(&index) = self.class.get(name) {
            return index;
        }
        let name_index = self.utf8(name);
        let index = self.push(ConstantPool::Class(Class { name_index }));
        self.class.insert(name.to_string(), index);
        index
    }

    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let key = (name.to_string(), descriptor.to_string());
        if let Some(&index) = self.name_and_type.get(&key) {
            return index;
        }
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);
        let index = self.push(ConstantPool::NameAndType(NameAndType {
            name_index,
            descriptor_index,
        }));
        self.name_and_type.insert(key, index);
        index
    }

    pub fn fieldref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        let key = (owner.to_string(), name.to_string(), descriptor.to_string());
        if let Some(&index) = self.fieldref.get(&key) {
            return index;
        }
        let class_index = self.class(owner);
        let name_and_type_index = self.name_and_type(name, descriptor);
        let index = self.push(ConstantPool::Fieldref(Fieldref {
            class_index,
            name_and_type_index,
        }));
        self.fieldref.insert(key, index);
        index
    }

    pub fn methodref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        let key = (owner.to_string(), name.to_string(), descriptor.to_string());
        if let Some(&index) = self.methodref.get(&key) {
            return index;
        }
        let class_index = self.class(owner);
        let name_and_type_index = self.name_and_type(name, descriptor);
        let index = self.push(ConstantPool::Methodref(Methodref {
            class_index,
            name_and_type_index,
        }));
        self.methodref.insert(key, index);
        index
    }

    /// The constant_pool_count wire value: number of entries plus the
    /// reserved 0 slot.
    pub fn count(&self) -> u16 {
        self.entries.len() as u16
    }

    pub fn write(&self, buf: &mut Vec<u8>) {
        for entry in &self.entries[1..] {
            entry.write(buf);
        }
    }
}

/// The body of a method that carries bytecode.
pub struct MethodBody {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
}

struct FieldDecl {
    access_flags: u16,
    name_index: u16,
    descriptor_index: u16,
}

struct MethodDecl {
    access_flags: u16,
    name_index: u16,
    descriptor_index: u16,
    body: Option<MethodBody>,
}

/// Assembles one class image. Declaration order of fields and methods is
/// preserved in the emitted tables.
pub struct ClassWriter {
    pub pool: ConstantPoolBuilder,
    access_flags: u16,
    this_class: u16,
    super_class: u16,
    fields: Vec<FieldDecl>,
    methods: Vec<MethodDecl>,
}

impl ClassWriter {
    pub fn new(name: &str) -> ClassWriter {
        let mut pool = ConstantPoolBuilder::new();
        let this_class = pool.class(name);
        // Object is the one class without a superclass.
        let super_class = if name == "java/lang/Object" {
            0
        } else {
            pool.class("java/lang/Object")
        };
        ClassWriter {
            pool,
            access_flags: 0x0021, // ACC_PUBLIC | ACC_SUPER
            this_class,
            super_class,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn field(&mut self, name: &str, descriptor: &str, access_flags: u16) -> &mut Self {
        let name_index = self.pool.utf8(name);
        let descriptor_index = self.pool.utf8(descriptor);
        self.fields.push(FieldDecl {
            access_flags,
            name_index,
            descriptor_index,
        });
        self
    }

    pub fn method(
        &mut self,
        name: &str,
        descriptor: &str,
        access_flags: u16,
        body: Option<MethodBody>,
    ) -> &mut Self {
        let name_index = self.pool.utf8(name);
        let descriptor_index = self.pool.utf8(descriptor);
        self.methods.push(MethodDecl {
            access_flags,
            name_index,
            descriptor_index,
            body,
        });
        self
    }

    pub fn finish(mut self) -> Vec<u8> {
        let code_name_index = if self.methods.iter().any(|m| m.body.is_some()) {
            Some(self.pool.utf8(ATTR_CODE))
        } else {
            None
        };

        let mut buf = Vec::new();
        buf.extend_from_slice(&MAGIC.to_be_bytes());
        buf.extend_from_slice(&0u16.to_be_bytes());
        buf.extend_from_slice(&MAJOR_VERSION.to_be_bytes());
        buf.extend_from_slice(&self.pool.count().to_be_bytes());
        self.pool.write(&mut buf);
        buf.extend_from_slice(&self.access_flags.to_be_bytes());
        buf.extend_from_slice(&self.this_class.to_be_bytes());
        buf.extend_from_slice(&self.super_class.to_be_bytes());
        buf.extend_from_slice(&0u16.to_be_bytes()); // interfaces_count

        buf.extend_from_slice(&(self.fields.len() as u16).to_be_bytes());
        for field in &self.fields {
            buf.extend_from_slice(&field.access_flags.to_be_bytes());
            buf.extend_from_slice(&field.name_index.to_be_bytes());
            buf.extend_from_slice(&field.descriptor_index.to_be_bytes());
            buf.extend_from_slice(&0u16.to_be_bytes()); // attributes_count
        }

        buf.extend_from_slice(&(self.methods.len() as u16).to_be_bytes());
        for method in &self.methods {
            buf.extend_from_slice(&method.access_flags.to_be_bytes());
            buf.extend_from_slice(&method.name_index.to_be_bytes());
            buf.extend_from_slice(&method.descriptor_index.to_be_bytes());
            match &method.body {
                Some(body) => {
                    let Some(name_index) = code_name_index else {
                        unreachable!("Code name was interned when bodies exist");
                    };
                    buf.extend_from_slice(&1u16.to_be_bytes());
                    buf.extend_from_slice(&name_index.to_be_bytes());
                    // max_stack + max_locals + code_length + code
                    // + exception_table_length + attributes_count
                    let attribute_length = 12 + body.code.len() as u32;
                    buf.extend_from_slice(&attribute_length.to_be_bytes());
                    buf.extend_from_slice(&body.max_stack.to_be_bytes());
                    buf.extend_from_slice(&body.max_locals.to_be_bytes());
                    buf.extend_from_slice(&(body.code.len() as u32).to_be_bytes());
                    buf.extend_from_slice(&body.code);
                    buf.extend_from_slice(&0u16.to_be_bytes()); // exception_table_length
                    buf.extend_from_slice(&0u16.to_be_bytes()); // attributes_count
                }
                None => buf.extend_from_slice(&0u16.to_be_bytes()),
            }
        }

        buf.extend_from_slice(&0u16.to_be_bytes()); // class attributes_count
        buf
    }
}
