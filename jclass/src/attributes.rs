use std::error::Error;
use std::io::{Cursor, Read};

use byteorder::{ReadBytesExt, BE};

use crate::constants::ConstantPool;
use crate::errors::class_loading::{LoadingCause, LoadingError};

pub const ATTR_CODE: &str = "Code";
pub const ATTR_SOURCE_FILE: &str = "SourceFile";
pub const ATTR_LINE_NUMBER_TABLE: &str = "LineNumberTable";

/// A decoded attribute, keyed by its name string. Names outside the three
/// recognized ones fail decoding.
// TODO: tolerate unknown attributes by skipping attribute_length bytes.
#[derive(Clone, Debug)]
pub enum AttributeInfo {
    Code(CodeAttribute),
    SourceFile(SourceFileAttribute),
    LineNumberTable(LineNumberTableAttribute),
}

/// 4.7.3 The Code Attribute. Carries the bytecode of one method along with
/// its frame dimensions. The exception table is decoded but not enforced.
#[derive(Clone, Debug)]
pub struct CodeAttribute {
    pub attribute_name_index: u16,
    pub attribute_length: u32,
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub exception_table: Vec<ExceptionTableEntry>,
    pub attributes: Vec<AttributeInfo>,
}

#[derive(Clone, Debug)]
pub struct ExceptionTableEntry {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    pub catch_type: u16,
}

/// 4.7.10 The SourceFile Attribute.
#[derive(Clone, Debug)]
pub struct SourceFileAttribute {
    pub attribute_name_index: u16,
    pub attribute_length: u32,
    pub sourcefile_index: u16,
}

/// 4.7.12 The LineNumberTable Attribute, kept for diagnostics only.
#[derive(Clone, Debug)]
pub struct LineNumberTableAttribute {
    pub attribute_name_index: u16,
    pub attribute_length: u32,
    pub line_number_table: Vec<LineNumberTableEntry>,
}

#[derive(Clone, Debug)]
pub struct LineNumberTableEntry {
    pub start_pc: u16,
    pub line_number: u16,
}

fn attribute_name<'a>(
    pool: &'a [ConstantPool],
    name_index: u16,
) -> Result<&'a str, Box<dyn Error>> {
    match pool.get(name_index as usize) {
        Some(ConstantPool::Utf8(name)) => Ok(name.as_str()?),
        _ => Err(Box::new(LoadingError::new(
            LoadingCause::BadAttributeNameIndex(name_index),
            "attribute name must be a Utf8 constant",
        ))),
    }
}

/// Read `count` attributes, dispatching each body on the name resolved
/// through the constant pool. `Code` bodies recurse for their nested
/// attribute tables.
pub fn read_attributes(
    pool: &[ConstantPool],
    count: u16,
    cursor: &mut Cursor<&[u8]>,
) -> Result<Vec<AttributeInfo>, Box<dyn Error>> {
    let mut attributes = Vec::with_capacity(count as usize);
    for _ in 0..count {
        attributes.push(read_attribute(pool, cursor)?);
    }
    Ok(attributes)
}

fn read_attribute(
    pool: &[ConstantPool],
    cursor: &mut Cursor<&[u8]>,
) -> Result<AttributeInfo, Box<dyn Error>> {
    let attribute_name_index = cursor.read_u16::<BE>()?;
    let attribute_length = cursor.read_u32::<BE>()?;

    match attribute_name(pool, attribute_name_index)? {
        ATTR_CODE => {
            let max_stack = cursor.read_u16::<BE>()?;
            let max_locals = cursor.read_u16::<BE>()?;
            let code_length = cursor.read_u32::<BE>()?;
            let mut code = vec![0; code_length as usize];
            cursor.read_exact(&mut code)?;
            let exception_table_length = cursor.read_u16::<BE>()?;
            let mut exception_table = Vec::with_capacity(exception_table_length as usize);
            for _ in 0..exception_table_length {
                exception_table.push(ExceptionTableEntry {
                    start_pc: cursor.read_u16::<BE>()?,
                    end_pc: cursor.read_u16::<BE>()?,
                    handler_pc: cursor.read_u16::<BE>()?,
                    catch_type: cursor.read_u16::<BE>()?,
                });
            }
            let attributes_count = cursor.read_u16::<BE>()?;
            let attributes = read_attributes(pool, attributes_count, cursor)?;
            Ok(AttributeInfo::Code(CodeAttribute {
                attribute_name_index,
                attribute_length,
                max_stack,
                max_locals,
                code,
                exception_table,
                attributes,
            }))
        }
        ATTR_SOURCE_FILE => Ok(AttributeInfo::SourceFile(SourceFileAttribute {
            attribute_name_index,
            attribute_length,
            sourcefile_index: cursor.read_u16::<BE>()?,
        })),
        ATTR_LINE_NUMBER_TABLE => {
            let table_length = cursor.read_u16::<BE>()?;
            let mut line_number_table = Vec::with_capacity(table_length as usize);
            for _ in 0..table_length {
                line_number_table.push(LineNumberTableEntry {
                    start_pc: cursor.read_u16::<BE>()?,
                    line_number: cursor.read_u16::<BE>()?,
                });
            }
            Ok(AttributeInfo::LineNumberTable(LineNumberTableAttribute {
                attribute_name_index,
                attribute_length,
                line_number_table,
            }))
        }
        other => Err(Box::new(LoadingError::new(
            LoadingCause::UnknownAttribute(other.to_string()),
            "attribute is not one of Code, SourceFile, LineNumberTable",
        ))),
    }
}
