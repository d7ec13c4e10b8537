use std::error::Error;

use jclass::access_flags::{FieldAccessFlags, MethodAccessFlags};
use jclass::class_file::ClassFile;
use jclass::writer::{ClassWriter, MethodBody};

const ACC_PUBLIC_STATIC: u16 =
    MethodAccessFlags::AccPublic as u16 | MethodAccessFlags::AccStatic as u16;

fn sample_image() -> Vec<u8> {
    let mut writer = ClassWriter::new("Sample");
    writer.field(
        "count",
        "I",
        FieldAccessFlags::AccPublic as u16 | FieldAccessFlags::AccStatic as u16,
    );
    writer.method(
        "main",
        "()I",
        ACC_PUBLIC_STATIC,
        Some(MethodBody {
            max_stack: 1,
            max_locals: 0,
            code: vec![0x10, 42, 0xac], // bipush 42; ireturn
        }),
    );
    writer.finish()
}

#[test]
fn decodes_every_header_field() -> Result<(), Box<dyn Error>> {
    let image = sample_image();
    let class = ClassFile::from_bytes(&image)?;

    assert_eq!(class.minor_version, 0);
    assert_eq!(class.major_version, 52);
    assert_eq!(class.constant_pool_count as usize, class.constant_pool.len());
    assert_eq!(class.class_name()?, "Sample");
    assert!(class.interfaces.is_empty());
    assert_eq!(class.fields.len(), 1);
    assert_eq!(class.methods.len(), 1);
    assert!(class.attributes.is_empty());

    let super_name = class.cp_utf8(class.cp_class(class.super_class)?.name_index)?;
    assert_eq!(super_name.as_str()?, "java/lang/Object");

    let field = &class.fields[0];
    assert_eq!(class.field_name(field)?, "count");
    assert_eq!(class.field_descriptor(field)?, "I");
    assert!(field.is_static());

    let method = &class.methods[0];
    assert_eq!(class.method_name(method)?, "main");
    assert!(method.is_static());
    assert!(!method.is_native());
    let code = method.code().expect("main carries a Code attribute");
    assert_eq!(code.max_stack, 1);
    assert_eq!(code.max_locals, 0);
    assert_eq!(code.code, vec![0x10, 42, 0xac]);
    assert!(code.exception_table.is_empty());
    assert!(code.attributes.is_empty());
    Ok(())
}

#[test]
fn constant_pool_round_trips_to_identical_bytes() -> Result<(), Box<dyn Error>> {
    let image = sample_image();
    let class = ClassFile::from_bytes(&image)?;

    let mut serialized = Vec::new();
    for entry in &class.constant_pool[1..] {
        entry.write(&mut serialized);
    }
    // The pool region starts right after magic, versions, and the count.
    let start = 10;
    assert_eq!(&image[start..start + serialized.len()], &serialized[..]);
    Ok(())
}

#[test]
fn rejects_bad_magic() {
    let mut image = sample_image();
    image[0] = 0xCB;
    let err = ClassFile::from_bytes(&image).unwrap_err();
    assert!(err.to_string().contains("IncorrectMagic"), "{err}");
}

#[test]
fn rejects_truncated_input() {
    let image = sample_image();
    let err = ClassFile::from_bytes(&image[..image.len() - 6]).unwrap_err();
    assert!(err.to_string().contains("Truncated"), "{err}");
}

#[test]
fn rejects_trailing_bytes() {
    let mut image = sample_image();
    image.push(0);
    let err = ClassFile::from_bytes(&image).unwrap_err();
    assert!(err.to_string().contains("TrailingBytes"), "{err}");
}

#[test]
fn rejects_unknown_attribute_names() {
    let mut writer = ClassWriter::new("Annotated");
    let bogus_index = writer.pool.utf8("Bogus");
    let mut image = writer.finish();
    // Rewrite the class-level attribute count from 0 to 1 and append an
    // attribute named Bogus.
    let len = image.len();
    image[len - 2..].copy_from_slice(&1u16.to_be_bytes());
    image.extend_from_slice(&bogus_index.to_be_bytes());
    image.extend_from_slice(&0u32.to_be_bytes());
    let err = ClassFile::from_bytes(&image).unwrap_err();
    assert!(err.to_string().contains("UnknownAttribute"), "{err}");
}

#[test]
fn rejects_unsupported_constant_tags() {
    let mut image = Vec::new();
    image.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
    image.extend_from_slice(&0u16.to_be_bytes());
    image.extend_from_slice(&52u16.to_be_bytes());
    image.extend_from_slice(&2u16.to_be_bytes()); // one pool entry
    image.push(2); // tag 2 is not assigned
    let err = ClassFile::from_bytes(&image).unwrap_err();
    assert!(err.to_string().contains("UnsupportedConstantTag"), "{err}");
}

#[test]
fn rejects_non_ascii_utf8_on_use() -> Result<(), Box<dyn Error>> {
    let mut writer = ClassWriter::new("Latin");
    writer.field("caf\u{e9}", "I", FieldAccessFlags::AccPublic as u16);
    let class = ClassFile::from_bytes(&writer.finish())?;
    let err = class.field_name(&class.fields[0]).unwrap_err();
    assert!(err.to_string().contains("NonAsciiUtf8"), "{err}");
    Ok(())
}

#[test]
fn accessors_enforce_range_and_kind() -> Result<(), Box<dyn Error>> {
    let class = ClassFile::from_bytes(&sample_image())?;

    let err = class.cp_utf8(0).unwrap_err();
    assert!(err.to_string().contains("IndexOutOfRange"), "{err}");
    let err = class.cp_utf8(class.constant_pool_count).unwrap_err();
    assert!(err.to_string().contains("IndexOutOfRange"), "{err}");

    // this_class points at a Class entry, not a Utf8 one.
    let err = class.cp_utf8(class.this_class).unwrap_err();
    assert!(err.to_string().contains("KindMismatch"), "{err}");
    assert!(class.cp_class(class.this_class).is_ok());
    Ok(())
}

#[test]
fn method_lookup_takes_first_name_match() -> Result<(), Box<dyn Error>> {
    let mut writer = ClassWriter::new("Twice");
    writer.method(
        "f",
        "()I",
        ACC_PUBLIC_STATIC,
        Some(MethodBody {
            max_stack: 1,
            max_locals: 0,
            code: vec![0x03, 0xac], // iconst_0; ireturn
        }),
    );
    writer.method(
        "f",
        "(I)I",
        ACC_PUBLIC_STATIC,
        Some(MethodBody {
            max_stack: 1,
            max_locals: 1,
            code: vec![0x04, 0xac], // iconst_1; ireturn
        }),
    );
    let class = ClassFile::from_bytes(&writer.finish())?;
    let found = class.find_method("f").expect("f resolves");
    assert_eq!(found.code().unwrap().code, vec![0x03, 0xac]);
    assert!(class.find_method("g").is_none());
    Ok(())
}
