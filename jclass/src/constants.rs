use std::error::Error;
use std::io::{Cursor, Read};
use std::str::from_utf8;

use byteorder::{ReadBytesExt, BE};

use crate::errors::class_loading::{LoadingCause, LoadingError};

pub const TAG_UTF8: u8 = 1;
pub const TAG_INTEGER: u8 = 3;
pub const TAG_FLOAT: u8 = 4;
pub const TAG_LONG: u8 = 5;
pub const TAG_DOUBLE: u8 = 6;
pub const TAG_CLASS: u8 = 7;
pub const TAG_STRING: u8 = 8;
pub const TAG_FIELDREF: u8 = 9;
pub const TAG_METHODREF: u8 = 10;
pub const TAG_INTERFACE_METHODREF: u8 = 11;
pub const TAG_NAME_AND_TYPE: u8 = 12;
pub const TAG_METHOD_HANDLE: u8 = 15;
pub const TAG_METHOD_TYPE: u8 = 16;
pub const TAG_INVOKE_DYNAMIC: u8 = 18;

/// One entry of the constant pool (JVMS 4.4), tagged by its first byte on
/// the wire. `Unknown` only ever occupies the reserved 0 slot.
#[derive(Clone, Debug)]
pub enum ConstantPool {
    Utf8(Utf8),
    Integer(Integer),
    Float(Float),
    Long(Long),
    Double(Double),
    Class(Class),
    String(StringRef),
    Fieldref(Fieldref),
    Methodref(Methodref),
    InterfaceMethodref(InterfaceMethodref),
    NameAndType(NameAndType),
    MethodHandle(MethodHandle),
    MethodType(MethodType),
    InvokeDynamic(InvokeDynamic),
    Unknown,
}

impl ConstantPool {
    pub fn tag_name(&self) -> &'static str {
        match self {
            ConstantPool::Utf8(_) => "Utf8",
            ConstantPool::Integer(_) => "Integer",
            ConstantPool::Float(_) => "Float",
            ConstantPool::Long(_) => "Long",
            ConstantPool::Double(_) => "Double",
            ConstantPool::Class(_) => "Class",
            ConstantPool::String(_) => "String",
            ConstantPool::Fieldref(_) => "Fieldref",
            ConstantPool::Methodref(_) => "Methodref",
            ConstantPool::InterfaceMethodref(_) => "InterfaceMethodref",
            ConstantPool::NameAndType(_) => "NameAndType",
            ConstantPool::MethodHandle(_) => "MethodHandle",
            ConstantPool::MethodType(_) => "MethodType",
            ConstantPool::InvokeDynamic(_) => "InvokeDynamic",
            ConstantPool::Unknown => "Unknown",
        }
    }

    /// Serialize the entry back to its wire form, tag byte included.
    /// The `Unknown` 0-slot placeholder has no wire form and writes nothing.
    pub fn write(&self, buf: &mut Vec<u8>) {
        match self {
            ConstantPool::Utf8(u) => {
                buf.push(TAG_UTF8);
                buf.extend_from_slice(&u.length.to_be_bytes());
                buf.extend_from_slice(&u.bytes);
            }
            ConstantPool::Integer(i) => {
                buf.push(TAG_INTEGER);
                buf.extend_from_slice(&i.bytes.to_be_bytes());
            }
            ConstantPool::Float(fl) => {
                buf.push(TAG_FLOAT);
                buf.extend_from_slice(&fl.bytes.to_be_bytes());
            }
            ConstantPool::Long(l) => {
                buf.push(TAG_LONG);
                buf.extend_from_slice(&l.high_bytes.to_be_bytes());
                buf.extend_from_slice(&l.low_bytes.to_be_bytes());
            }
            ConstantPool::Double(d) => {
                buf.push(TAG_DOUBLE);
                buf.extend_from_slice(&d.high_bytes.to_be_bytes());
                buf.extend_from_slice(&d.low_bytes.to_be_bytes());
            }
            ConstantPool::Class(c) => {
                buf.push(TAG_CLASS);
                buf.extend_from_slice(&c.name_index.to_be_bytes());
            }
            ConstantPool::String(s) => {
                buf.push(TAG_STRING);
                buf.extend_from_slice(&s.string_index.to_be_bytes());
            }
            ConstantPool::Fieldref(r) => {
                buf.push(TAG_FIELDREF);
                buf.extend_from_slice(&r.class_index.to_be_bytes());
                buf.extend_from_slice(&r.name_and_type_index.to_be_bytes());
            }
            ConstantPool::Methodref(r) => {
                buf.push(TAG_METHODREF);
                buf.extend_from_slice(&r.class_index.to_be_bytes());
                buf.extend_from_slice(&r.name_and_type_index.to_be_bytes());
            }
            ConstantPool::InterfaceMethodref(r) => {
                buf.push(TAG_INTERFACE_METHODREF);
                buf.extend_from_slice(&r.class_index.to_be_bytes());
                buf.extend_from_slice(&r.name_and_type_index.to_be_bytes());
            }
            ConstantPool::NameAndType(nt) => {
                buf.push(TAG_NAME_AND_TYPE);
                buf.extend_from_slice(&nt.name_index.to_be_bytes());
                buf.extend_from_slice(&nt.descriptor_index.to_be_bytes());
            }
            ConstantPool::MethodHandle(mh) => {
                buf.push(TAG_METHOD_HANDLE);
                buf.push(mh.reference_kind);
                buf.extend_from_slice(&mh.reference_index.to_be_bytes());
            }
            ConstantPool::MethodType(mt) => {
                buf.push(TAG_METHOD_TYPE);
                buf.extend_from_slice(&mt.descriptor_index.to_be_bytes());
            }
            ConstantPool::InvokeDynamic(id) => {
                buf.push(TAG_INVOKE_DYNAMIC);
                buf.extend_from_slice(&id.bootstrap_method_attr_index.to_be_bytes());
                buf.extend_from_slice(&id.name_and_type_index.to_be_bytes());
            }
            ConstantPool::Unknown => {}
        }
    }
}

/// CONSTANT_Utf8_info. The bytes are kept raw; conversion enforces the
/// ASCII subset this machine supports.
#[derive(Clone)]
pub struct Utf8 {
    pub length: u16,
    pub bytes: Vec<u8>,
}

impl Utf8 {
    fn read(cursor: &mut Cursor<&[u8]>) -> Result<Utf8, Box<dyn Error>> {
        let length = cursor.read_u16::<BE>()?;
        let mut bytes = vec![0; length as usize];
        cursor.read_exact(&mut bytes)?;
        Ok(Utf8 { length, bytes })
    }

    /// View the bytes as a string. Anything outside 7-bit ASCII is
    /// rejected, multibyte sequences included.
    pub fn as_str(&self) -> Result<&str, LoadingError> {
        if let Some(b) = self.bytes.iter().find(|b| !b.is_ascii()) {
            return Err(LoadingError::new(
                LoadingCause::NonAsciiUtf8(*b),
                "only the ASCII subset of modified UTF-8 is supported",
            ));
        }
        // All-ASCII bytes are valid UTF-8.
        Ok(from_utf8(&self.bytes).expect("ascii bytes are valid utf-8"))
    }
}

impl From<&str> for Utf8 {
    fn from(input: &str) -> Self {
        Utf8 {
            length: input.len() as u16,
            bytes: input.as_bytes().to_vec(),
        }
    }
}

impl std::fmt::Debug for Utf8 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.as_str() {
            Ok(s) => write!(f, "{s:?}"),
            Err(_) => write!(f, "{:02X?}", self.bytes),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Integer {
    pub bytes: u32,
}

#[derive(Clone, Debug)]
pub struct Float {
    pub bytes: u32,
}

#[derive(Clone, Debug)]
pub struct Long {
    pub high_bytes: u32,
    pub low_bytes: u32,
}

#[derive(Clone, Debug)]
pub struct Double {
    pub high_bytes: u32,
    pub low_bytes: u32,
}

/// CONSTANT_Class_info; `name_index` must point at a `Utf8` entry holding
/// the internal class name.
#[derive(Clone, Debug)]
pub struct Class {
    pub name_index: u16,
}

#[derive(Clone, Debug)]
pub struct StringRef {
    pub string_index: u16,
}

#[derive(Clone, Debug)]
pub struct Fieldref {
    pub class_index: u16,
    pub name_and_type_index: u16,
}

#[derive(Clone, Debug)]
pub struct Methodref {
    pub class_index: u16,
    pub name_and_type_index: u16,
}

#[derive(Clone, Debug)]
pub struct InterfaceMethodref {
    pub class_index: u16,
    pub name_and_type_index: u16,
}

#[derive(Clone, Debug)]
pub struct NameAndType {
    pub name_index: u16,
    pub descriptor_index: u16,
}

#[derive(Clone, Debug)]
pub struct MethodHandle {
    pub reference_kind: u8,
    pub reference_index: u16,
}

#[derive(Clone, Debug)]
pub struct MethodType {
    pub descriptor_index: u16,
}

#[derive(Clone, Debug)]
pub struct InvokeDynamic {
    pub bootstrap_method_attr_index: u16,
    pub name_and_type_index: u16,
}

/// Read `count - 1` entries (the table is indexed 1..count-1) and return a
/// vector whose 0 slot holds the `Unknown` placeholder, so wire indices can
/// be used directly.
pub fn read_constant_pool(
    count: u16,
    cursor: &mut Cursor<&[u8]>,
) -> Result<Vec<ConstantPool>, Box<dyn Error>> {
    let mut pool = Vec::with_capacity(count as usize);
    pool.push(ConstantPool::Unknown);
    for _ in 1..count {
        let tag = cursor.read_u8()?;
        pool.push(match tag {
            TAG_UTF8 => ConstantPool::Utf8(Utf8::read(cursor)?),
            TAG_INTEGER => ConstantPool::Integer(Integer {
                bytes: cursor.read_u32::<BE>()?,
            }),
            TAG_FLOAT => ConstantPool::Float(Float {
                bytes: cursor.read_u32::<BE>()?,
            }),
            TAG_LONG => ConstantPool::Long(Long {
                high_bytes: cursor.read_u32::<BE>()?,
                low_bytes: cursor.read_u32::<BE>()?,
            }),
            TAG_DOUBLE => ConstantPool::Double(Double {
                high_bytes: cursor.read_u32::<BE>()?,
                low_bytes: cursor.read_u32::<BE>()?,
            }),
            TAG_CLASS => ConstantPool::Class(Class {
                name_index: cursor.read_u16::<BE>()?,
            }),
            TAG_STRING => ConstantPool::String(StringRef {
                string_index: cursor.read_u16::<BE>()?,
            }),
            TAG_FIELDREF => ConstantPool::Fieldref(Fieldref {
                class_index: cursor.read_u16::<BE>()?,
                name_and_type_index: cursor.read_u16::<BE>()?,
            }),
            TAG_METHODREF => ConstantPool::Methodref(Methodref {
                class_index: cursor.read_u16::<BE>()?,
                name_and_type_index: cursor.read_u16::<BE>()?,
            }),
            TAG_INTERFACE_METHODREF => ConstantPool::InterfaceMethodref(InterfaceMethodref {
                class_index: cursor.read_u16::<BE>()?,
                name_and_type_index: cursor.read_u16::<BE>()?,
            }),
            TAG_NAME_AND_TYPE => ConstantPool::NameAndType(NameAndType {
                name_index: cursor.read_u16::<BE>()?,
                descriptor_index: cursor.read_u16::<BE>()?,
            }),
            TAG_METHOD_HANDLE => ConstantPool::MethodHandle(MethodHandle {
                reference_kind: cursor.read_u8()?,
                reference_index: cursor.read_u16::<BE>()?,
            }),
            TAG_METHOD_TYPE => ConstantPool::MethodType(MethodType {
                descriptor_index: cursor.read_u16::<BE>()?,
            }),
            TAG_INVOKE_DYNAMIC => ConstantPool::InvokeDynamic(InvokeDynamic {
                bootstrap_method_attr_index: cursor.read_u16::<BE>()?,
                name_and_type_index: cursor.read_u16::<BE>()?,
            }),
            _ => {
                return Err(Box::new(LoadingError::new(
                    LoadingCause::UnsupportedConstantTag(tag),
                    &format!("cursor position: {:#06X}", cursor.position() - 1),
                )))
            }
        });
    }
    Ok(pool)
}
