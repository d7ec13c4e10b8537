#![allow(clippy::enum_variant_names)]

pub mod resolution {
    use std::error::Error;
    use std::fmt::Display;

    #[derive(Debug)]
    pub enum ResolutionCause {
        ClassNotFound(String),
        MethodNotFound(String),
        FieldNotFound(String),
        CodeMissing(String),
        NotStatic(String),
    }

    impl Display for ResolutionCause {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                ResolutionCause::ClassNotFound(name) => write!(f, "ClassNotFound: {name}"),
                ResolutionCause::MethodNotFound(name) => write!(f, "MethodNotFound: {name}"),
                ResolutionCause::FieldNotFound(name) => write!(f, "FieldNotFound: {name}"),
                ResolutionCause::CodeMissing(name) => write!(f, "CodeMissing: {name}"),
                ResolutionCause::NotStatic(name) => write!(f, "NotStatic: {name}"),
            }
        }
    }

    #[derive(Debug)]
    pub struct ResolutionError {
        cause: ResolutionCause,
        msg: String,
    }

    impl ResolutionError {
        pub fn new(cause: ResolutionCause, msg: &str) -> ResolutionError {
            ResolutionError {
                cause,
                msg: msg.into(),
            }
        }
    }

    impl Error for ResolutionError {}

    impl Display for ResolutionError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "Resolution Error: {}, {}", self.cause, self.msg)
        }
    }
}

pub mod execution {
    use std::error::Error;
    use std::fmt::Display;

    #[derive(Debug)]
    pub enum ExecutionCause {
        UnknownOpcode(u8),
        StackOverflow,
        StackUnderflow,
        LocalOutOfRange(usize),
        TruncatedCode,
        BadRef(i32),
        HeapFull,
    }

    impl Display for ExecutionCause {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                ExecutionCause::UnknownOpcode(op) => write!(f, "UnknownOpcode: {op:#04X}"),
                ExecutionCause::StackOverflow => write!(f, "StackOverflow"),
                ExecutionCause::StackUnderflow => write!(f, "StackUnderflow"),
                ExecutionCause::LocalOutOfRange(index) => {
                    write!(f, "LocalOutOfRange: {index}")
                }
                ExecutionCause::TruncatedCode => write!(f, "TruncatedCode"),
                ExecutionCause::BadRef(reference) => write!(f, "BadRef: {reference}"),
                ExecutionCause::HeapFull => write!(f, "HeapFull"),
            }
        }
    }

    #[derive(Debug)]
    pub struct ExecutionError {
        cause: ExecutionCause,
        msg: String,
    }

    impl ExecutionError {
        pub fn new(cause: ExecutionCause, msg: &str) -> ExecutionError {
            ExecutionError {
                cause,
                msg: msg.into(),
            }
        }
    }

    impl Error for ExecutionError {}

    impl Display for ExecutionError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "Execution Error: {}, {}", self.cause, self.msg)
        }
    }
}
