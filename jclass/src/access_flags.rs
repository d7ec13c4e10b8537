//! Access and property flags for classes, fields, and methods
//! (JVMS tables 4.1-B, 4.5-A, 4.6-A).

#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassAccessFlags {
    AccPublic = 0x0001,
    AccFinal = 0x0010,
    /// Treat superclass methods specially when invoked by invokespecial.
    AccSuper = 0x0020,
    AccInterface = 0x0200,
    AccAbstract = 0x0400,
    AccSynthetic = 0x1000,
    AccAnnotation = 0x2000,
    AccEnum = 0x4000,
    AccModule = 0x8000,
}

impl ClassAccessFlags {
    pub fn from_u16(value: u16) -> Vec<Self> {
        use ClassAccessFlags::*;
        [
            AccPublic,
            AccFinal,
            AccSuper,
            AccInterface,
            AccAbstract,
            AccSynthetic,
            AccAnnotation,
            AccEnum,
            AccModule,
        ]
        .into_iter()
        .filter(|flag| value & (*flag as u16) != 0)
        .collect()
    }
}

#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldAccessFlags {
    AccPublic = 0x0001,
    AccPrivate = 0x0002,
    AccProtected = 0x0004,
    AccStatic = 0x0008,
    AccFinal = 0x0010,
    AccVolatile = 0x0040,
    AccTransient = 0x0080,
    AccSynthetic = 0x1000,
    AccEnum = 0x4000,
}

impl FieldAccessFlags {
    pub fn from_u16(value: u16) -> Vec<Self> {
        use FieldAccessFlags::*;
        [
            AccPublic,
            AccPrivate,
            AccProtected,
            AccStatic,
            AccFinal,
            AccVolatile,
            AccTransient,
            AccSynthetic,
            AccEnum,
        ]
        .into_iter()
        .filter(|flag| value & (*flag as u16) != 0)
        .collect()
    }
}

#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodAccessFlags {
    AccPublic = 0x0001,
    AccPrivate = 0x0002,
    AccProtected = 0x0004,
    AccStatic = 0x0008,
    AccFinal = 0x0010,
    AccSynchronized = 0x0020,
    AccBridge = 0x0040,
    AccVarArgs = 0x0080,
    /// Implemented in host code, resolved through the native loader.
    AccNative = 0x0100,
    AccAbstract = 0x0400,
    AccStrict = 0x0800,
    AccSynthetic = 0x1000,
}

impl MethodAccessFlags {
    pub fn from_u16(value: u16) -> Vec<Self> {
        use MethodAccessFlags::*;
        [
            AccPublic,
            AccPrivate,
            AccProtected,
            AccStatic,
            AccFinal,
            AccSynchronized,
            AccBridge,
            AccVarArgs,
            AccNative,
            AccAbstract,
            AccStrict,
            AccSynthetic,
        ]
        .into_iter()
        .filter(|flag| value & (*flag as u16) != 0)
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_flags_decompose() {
        let flags = MethodAccessFlags::from_u16(0x0109);
        assert_eq!(
            flags,
            vec![
                MethodAccessFlags::AccPublic,
                MethodAccessFlags::AccStatic,
                MethodAccessFlags::AccNative
            ]
        );
    }

    #[test]
    fn zero_decomposes_to_nothing() {
        assert!(ClassAccessFlags::from_u16(0).is_empty());
        assert!(FieldAccessFlags::from_u16(0).is_empty());
    }
}
