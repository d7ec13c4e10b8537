#![allow(clippy::enum_variant_names)]

pub mod class_format_check {
    use std::error::Error;
    use std::fmt::Display;

    #[derive(Debug)]
    pub enum FormatCause {
        IncorrectMagic(u32),
        TrailingBytes(usize),
    }

    impl Display for FormatCause {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                FormatCause::IncorrectMagic(m) => write!(f, "IncorrectMagic: {:#010X}", m),
                FormatCause::TrailingBytes(n) => write!(f, "TrailingBytes: {n}"),
            }
        }
    }

    #[derive(Debug)]
    pub struct FormatError {
        cause: FormatCause,
        msg: String,
    }

    impl FormatError {
        pub fn new(cause: FormatCause, msg: &str) -> FormatError {
            FormatError {
                cause,
                msg: msg.into(),
            }
        }
    }

    impl Error for FormatError {}

    impl Display for FormatError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "Format Error: {}, {}", self.cause, self.msg)
        }
    }
}

pub mod class_loading {
    use std::error::Error;
    use std::fmt::Display;

    #[derive(Debug)]
    pub enum LoadingCause {
        UnsupportedConstantTag(u8),
        UnknownAttribute(String),
        BadAttributeNameIndex(u16),
        NonAsciiUtf8(u8),
        Truncated,
    }

    impl Display for LoadingCause {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                LoadingCause::UnsupportedConstantTag(t) => {
                    write!(f, "UnsupportedConstantTag: {t}")
                }
                LoadingCause::UnknownAttribute(name) => write!(f, "UnknownAttribute: {name}"),
                LoadingCause::BadAttributeNameIndex(i) => {
                    write!(f, "BadAttributeNameIndex: {i}")
                }
                LoadingCause::NonAsciiUtf8(b) => write!(f, "NonAsciiUtf8: {b:#04X}"),
                LoadingCause::Truncated => write!(f, "Truncated"),
            }
        }
    }

    #[derive(Debug)]
    pub struct LoadingError {
        cause: LoadingCause,
        msg: String,
    }

    impl LoadingError {
        pub fn new(cause: LoadingCause, msg: &str) -> LoadingError {
            LoadingError {
                cause,
                msg: msg.into(),
            }
        }
    }

    impl Error for LoadingError {}

    impl Display for LoadingError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "Loading Error: {}, {}", self.cause, self.msg)
        }
    }
}

pub mod constant_pool {
    use std::error::Error;
    use std::fmt::Display;

    #[derive(Debug)]
    pub enum PoolCause {
        IndexOutOfRange(u16),
        KindMismatch {
            index: u16,
            expected: &'static str,
            found: &'static str,
        },
    }

    impl Display for PoolCause {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                PoolCause::IndexOutOfRange(i) => write!(f, "IndexOutOfRange: {i}"),
                PoolCause::KindMismatch {
                    index,
                    expected,
                    found,
                } => write!(f, "KindMismatch at {index}: expected {expected}, found {found}"),
            }
        }
    }

    #[derive(Debug)]
    pub struct PoolError {
        cause: PoolCause,
        msg: String,
    }

    impl PoolError {
        pub fn new(cause: PoolCause, msg: &str) -> PoolError {
            PoolError {
                cause,
                msg: msg.into(),
            }
        }
    }

    impl Error for PoolError {}

    impl Display for PoolError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "Constant Pool Error: {}, {}", self.cause, self.msg)
        }
    }
}

pub mod descriptor {
    use std::error::Error;
    use std::fmt::Display;

    #[derive(Debug)]
    pub enum DescriptorCause {
        Malformed,
        Unsupported(char),
    }

    impl Display for DescriptorCause {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                DescriptorCause::Malformed => write!(f, "Malformed"),
                DescriptorCause::Unsupported(c) => write!(f, "Unsupported: {c:?}"),
            }
        }
    }

    #[derive(Debug)]
    pub struct DescriptorError {
        cause: DescriptorCause,
        msg: String,
    }

    impl DescriptorError {
        pub fn new(cause: DescriptorCause, msg: &str) -> DescriptorError {
            DescriptorError {
                cause,
                msg: msg.into(),
            }
        }
    }

    impl Error for DescriptorError {}

    impl Display for DescriptorError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "Descriptor Error: {}, {}", self.cause, self.msg)
        }
    }
}
