//! Images for the built-in classes every run loads before user code:
//! `java/lang/Object` and `java/lang/System`. They are assembled in memory
//! instead of being shipped as binary files next to the executable.

use jclass::access_flags::MethodAccessFlags;
use jclass::writer::{ClassWriter, MethodBody};

/// `java/lang/Object` with an empty `<init>` body, so constructors that
/// chain into it through invokespecial have something to run.
pub fn object_image() -> Vec<u8> {
    let mut writer = ClassWriter::new("java/lang/Object");
    writer.method(
        "<init>",
        "()V",
        MethodAccessFlags::AccPublic as u16,
        Some(MethodBody {
            max_stack: 0,
            max_locals: 1,
            code: vec![0xb1], // return
        }),
    );
    writer.finish()
}

/// `java/lang/System`, declaring `static native void halt0(int)`. The body
/// lives in the native loader's built-in registry.
pub fn system_image() -> Vec<u8> {
    let mut writer = ClassWriter::new("java/lang/System");
    writer.method(
        "halt0",
        "(I)V",
        MethodAccessFlags::AccPublic as u16
            | MethodAccessFlags::AccStatic as u16
            | MethodAccessFlags::AccNative as u16,
        None,
    );
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jclass::class_file::ClassFile;

    #[test]
    fn object_image_decodes() {
        let class = ClassFile::from_bytes(&object_image()).unwrap();
        assert_eq!(class.class_name().unwrap(), "java/lang/Object");
        assert_eq!(class.super_class, 0);
        let init = class.find_method("<init>").unwrap();
        assert_eq!(init.code().unwrap().code, vec![0xb1]);
    }

    #[test]
    fn system_image_declares_native_halt0() {
        let class = ClassFile::from_bytes(&system_image()).unwrap();
        assert_eq!(class.class_name().unwrap(), "java/lang/System");
        let halt0 = class.find_method("halt0").unwrap();
        assert!(halt0.is_static());
        assert!(halt0.is_native());
        assert!(halt0.code().is_none());
    }
}
