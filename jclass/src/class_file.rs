use std::error::Error;
use std::io::{Cursor, ErrorKind};

use byteorder::{ReadBytesExt, BE};

use crate::access_flags::{ClassAccessFlags, FieldAccessFlags, MethodAccessFlags};
use crate::attributes::{self, AttributeInfo, CodeAttribute};
use crate::constants::{self, Class, ConstantPool, Fieldref, Methodref, NameAndType, Utf8};
use crate::errors::class_format_check::{FormatCause, FormatError};
use crate::errors::class_loading::{LoadingCause, LoadingError};
use crate::errors::constant_pool::{PoolCause, PoolError};

const MAGIC: u32 = 0xCAFE_BABE;

/// 4.5 Fields.
#[derive(Clone, Debug)]
pub struct FieldInfo {
    pub access_flags: Vec<FieldAccessFlags>,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<AttributeInfo>,
}

impl FieldInfo {
    fn read(
        cursor: &mut Cursor<&[u8]>,
        constant_pool: &[ConstantPool],
    ) -> Result<FieldInfo, Box<dyn Error>> {
        let access_flags = FieldAccessFlags::from_u16(cursor.read_u16::<BE>()?);
        let name_index = cursor.read_u16::<BE>()?;
        let descriptor_index = cursor.read_u16::<BE>()?;
        let attributes_count = cursor.read_u16::<BE>()?;
        let attributes = attributes::read_attributes(constant_pool, attributes_count, cursor)?;
        Ok(FieldInfo {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        })
    }

    pub fn is_static(&self) -> bool {
        self.access_flags.contains(&FieldAccessFlags::AccStatic)
    }
}

/// 4.6 Methods.
#[derive(Clone, Debug)]
pub struct MethodInfo {
    pub access_flags: Vec<MethodAccessFlags>,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<AttributeInfo>,
}

impl MethodInfo {
    fn read(
        cursor: &mut Cursor<&[u8]>,
        constant_pool: &[ConstantPool],
    ) -> Result<MethodInfo, Box<dyn Error>> {
        let access_flags = MethodAccessFlags::from_u16(cursor.read_u16::<BE>()?);
        let name_index = cursor.read_u16::<BE>()?;
        let descriptor_index = cursor.read_u16::<BE>()?;
        let attributes_count = cursor.read_u16::<BE>()?;
        let attributes = attributes::read_attributes(constant_pool, attributes_count, cursor)?;
        Ok(MethodInfo {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        })
    }

    pub fn is_static(&self) -> bool {
        self.access_flags.contains(&MethodAccessFlags::AccStatic)
    }

    pub fn is_native(&self) -> bool {
        self.access_flags.contains(&MethodAccessFlags::AccNative)
    }

    /// The method's `Code` attribute, if it carries one. Native and
    /// abstract methods do not.
    pub fn code(&self) -> Option<&CodeAttribute> {
        self.attributes.iter().find_map(|attr| match attr {
            AttributeInfo::Code(code) => Some(code),
            _ => None,
        })
    }
}

/// 4.1 The ClassFile Structure, decoded.
///
/// The constant pool vector holds an `Unknown` placeholder at slot 0 so
/// that the 1-based wire indices index it directly; valid indices are
/// `1..constant_pool_count`.
#[derive(Clone, Debug)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub constant_pool_count: u16,
    pub constant_pool: Vec<ConstantPool>,
    pub access_flags: Vec<ClassAccessFlags>,
    pub this_class: u16,
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub attributes: Vec<AttributeInfo>,
}

impl ClassFile {
    pub fn from_bytes(bytes: &[u8]) -> Result<ClassFile, Box<dyn Error>> {
        Self::read(bytes).map_err(|e| match e.downcast::<std::io::Error>() {
            Ok(io) if io.kind() == ErrorKind::UnexpectedEof => Box::new(LoadingError::new(
                LoadingCause::Truncated,
                "class file ends in the middle of a field",
            )) as Box<dyn Error>,
            Ok(io) => io,
            Err(other) => other,
        })
    }

    fn read(bytes: &[u8]) -> Result<ClassFile, Box<dyn Error>> {
        let mut cursor = Cursor::new(bytes);
        let magic = cursor.read_u32::<BE>()?;
        if magic != MAGIC {
            return Err(Box::new(FormatError::new(
                FormatCause::IncorrectMagic(magic),
                "class file does not start with CA FE BA BE",
            )));
        }
        let minor_version = cursor.read_u16::<BE>()?;
        let major_version = cursor.read_u16::<BE>()?;
        let constant_pool_count = cursor.read_u16::<BE>()?;
        let constant_pool = constants::read_constant_pool(constant_pool_count, &mut cursor)?;
        let access_flags = ClassAccessFlags::from_u16(cursor.read_u16::<BE>()?);
        let this_class = cursor.read_u16::<BE>()?;
        let super_class = cursor.read_u16::<BE>()?;
        let interfaces_count = cursor.read_u16::<BE>()?;
        let mut interfaces = Vec::with_capacity(interfaces_count as usize);
        for _ in 0..interfaces_count {
            interfaces.push(cursor.read_u16::<BE>()?);
        }
        let fields_count = cursor.read_u16::<BE>()?;
        let mut fields = Vec::with_capacity(fields_count as usize);
        for _ in 0..fields_count {
            fields.push(FieldInfo::read(&mut cursor, &constant_pool)?);
        }
        let methods_count = cursor.read_u16::<BE>()?;
        let mut methods = Vec::with_capacity(methods_count as usize);
        for _ in 0..methods_count {
            methods.push(MethodInfo::read(&mut cursor, &constant_pool)?);
        }
        let attributes_count = cursor.read_u16::<BE>()?;
        let attributes =
            attributes::read_attributes(&constant_pool, attributes_count, &mut cursor)?;
        let leftover = bytes.len() as u64 - cursor.position();
        if leftover != 0 {
            return Err(Box::new(FormatError::new(
                FormatCause::TrailingBytes(leftover as usize),
                "class file has bytes past its attribute table",
            )));
        }
        Ok(ClassFile {
            minor_version,
            major_version,
            constant_pool_count,
            constant_pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    fn cp_entry(&self, index: u16) -> Result<&ConstantPool, PoolError> {
        if index == 0 || index >= self.constant_pool_count {
            return Err(PoolError::new(
                PoolCause::IndexOutOfRange(index),
                &format!("valid indices are 1..{}", self.constant_pool_count),
            ));
        }
        Ok(&self.constant_pool[index as usize])
    }

    pub fn cp_utf8(&self, index: u16) -> Result<&Utf8, PoolError> {
        match self.cp_entry(index)? {
            ConstantPool::Utf8(utf8) => Ok(utf8),
            other => Err(kind_mismatch(index, "Utf8", other)),
        }
    }

    pub fn cp_class(&self, index: u16) -> Result<&Class, PoolError> {
        match self.cp_entry(index)? {
            ConstantPool::Class(class) => Ok(class),
            other => Err(kind_mismatch(index, "Class", other)),
        }
    }

    pub fn cp_fieldref(&self, index: u16) -> Result<&Fieldref, PoolError> {
        match self.cp_entry(index)? {
            ConstantPool::Fieldref(fieldref) => Ok(fieldref),
            other => Err(kind_mismatch(index, "Fieldref", other)),
        }
    }

    pub fn cp_methodref(&self, index: u16) -> Result<&Methodref, PoolError> {
        match self.cp_entry(index)? {
            ConstantPool::Methodref(methodref) => Ok(methodref),
            other => Err(kind_mismatch(index, "Methodref", other)),
        }
    }

    pub fn cp_name_and_type(&self, index: u16) -> Result<&NameAndType, PoolError> {
        match self.cp_entry(index)? {
            ConstantPool::NameAndType(nat) => Ok(nat),
            other => Err(kind_mismatch(index, "NameAndType", other)),
        }
    }

    /// The internal name of this class: this_class → Class → Utf8.
    pub fn class_name(&self) -> Result<&str, Box<dyn Error>> {
        let class = self.cp_class(self.this_class)?;
        Ok(self.cp_utf8(class.name_index)?.as_str()?)
    }

    pub fn method_name(&self, method: &MethodInfo) -> Result<&str, Box<dyn Error>> {
        Ok(self.cp_utf8(method.name_index)?.as_str()?)
    }

    pub fn field_name(&self, field: &FieldInfo) -> Result<&str, Box<dyn Error>> {
        Ok(self.cp_utf8(field.name_index)?.as_str()?)
    }

    pub fn field_descriptor(&self, field: &FieldInfo) -> Result<&str, Box<dyn Error>> {
        Ok(self.cp_utf8(field.descriptor_index)?.as_str()?)
    }

    /// First method with the given name, in table order. Signatures are not
    /// compared, so overloads resolve to whichever is declared first.
    // TODO: match on the descriptor as well.
    pub fn find_method(&self, name: &str) -> Option<&MethodInfo> {
        self.methods
            .iter()
            .find(|m| matches!(self.method_name(m), Ok(n) if n == name))
    }

    /// First field with the given name, in table order.
    pub fn find_field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields
            .iter()
            .find(|f| matches!(self.field_name(f), Ok(n) if n == name))
    }
}

fn kind_mismatch(index: u16, expected: &'static str, found: &ConstantPool) -> PoolError {
    PoolError::new(
        PoolCause::KindMismatch {
            index,
            expected,
            found: found.tag_name(),
        },
        "constant pool entry has the wrong tag",
    )
}
