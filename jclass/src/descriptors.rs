//! Descriptor interpretation (JVMS 4.3). Both field-cell sizing and method
//! arity go through here; nothing else in the workspace walks descriptor
//! strings.

use crate::errors::descriptor::{DescriptorCause, DescriptorError};

/// The shape of a value cell. `I` holds a 32-bit signed integer, `L…;` a
/// 32-bit instance-table index with -1 for null. Every other field type is
/// unsupported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Int,
    Reference,
}

impl FieldKind {
    pub fn parse(descriptor: &str) -> Result<FieldKind, DescriptorError> {
        match descriptor.as_bytes().first() {
            Some(b'I') => Ok(FieldKind::Int),
            Some(b'L') => Ok(FieldKind::Reference),
            Some(&other) => Err(DescriptorError::new(
                DescriptorCause::Unsupported(other as char),
                "field descriptor is not I or L...;",
            )),
            None => Err(DescriptorError::new(
                DescriptorCause::Malformed,
                "field descriptor is empty",
            )),
        }
    }

    pub fn default_value(&self) -> i32 {
        match self {
            FieldKind::Int => 0,
            FieldKind::Reference => -1,
        }
    }
}

/// Count the operand-stack slots taken by the parameters of a method
/// descriptor: one per `I`, one per `L…;`, array markers consumed but not
/// counted. The return descriptor is not inspected.
pub fn method_param_slots(descriptor: &str) -> Result<usize, DescriptorError> {
    let mut chars = descriptor.chars();
    if chars.next() != Some('(') {
        return Err(DescriptorError::new(
            DescriptorCause::Malformed,
            "method descriptor must start with (",
        ));
    }
    let mut slots = 0;
    loop {
        match chars.next() {
            Some(')') => return Ok(slots),
            Some('I') => slots += 1,
            Some('L') => {
                slots += 1;
                loop {
                    match chars.next() {
                        Some(';') => break,
                        Some(_) => {}
                        None => {
                            return Err(DescriptorError::new(
                                DescriptorCause::Malformed,
                                "object parameter is missing its ;",
                            ))
                        }
                    }
                }
            }
            Some('[') => {}
            Some(other) => {
                return Err(DescriptorError::new(
                    DescriptorCause::Unsupported(other),
                    "parameter type is not supported",
                ))
            }
            None => {
                return Err(DescriptorError::new(
                    DescriptorCause::Malformed,
                    "method descriptor is missing its )",
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_parameters() {
        assert_eq!(method_param_slots("()I").unwrap(), 0);
        assert_eq!(method_param_slots("()V").unwrap(), 0);
    }

    #[test]
    fn int_and_object_parameters() {
        assert_eq!(method_param_slots("(II)I").unwrap(), 2);
        assert_eq!(method_param_slots("(ILjava/lang/Object;)V").unwrap(), 2);
    }

    #[test]
    fn array_markers_do_not_count() {
        assert_eq!(method_param_slots("([Ljava/lang/String;)V").unwrap(), 1);
    }

    #[test]
    fn unsupported_parameter_type() {
        assert!(method_param_slots("(D)V").is_err());
        assert!(method_param_slots("I").is_err());
    }

    #[test]
    fn field_kinds() {
        assert_eq!(FieldKind::parse("I").unwrap(), FieldKind::Int);
        assert_eq!(
            FieldKind::parse("Ljava/lang/Object;").unwrap(),
            FieldKind::Reference
        );
        assert!(FieldKind::parse("J").is_err());
        assert!(FieldKind::parse("").is_err());
    }

    #[test]
    fn reference_cells_default_to_null() {
        assert_eq!(FieldKind::Int.default_value(), 0);
        assert_eq!(FieldKind::Reference.default_value(), -1);
    }
}
