use std::error::Error;

use jclass::class_file::ClassFile;
use jclass::descriptors::FieldKind;

use crate::errors::execution::{ExecutionCause, ExecutionError};
use crate::errors::resolution::{ResolutionCause, ResolutionError};

/// Hard cap on live objects; there is no collector, the table only grows.
pub const MAX_INSTANCES: usize = 1024;

#[derive(Debug)]
pub struct InstanceField {
    pub name: String,
    pub kind: FieldKind,
    pub value: i32,
}

/// One object: a back-reference to its class (a loader slot) and a value
/// cell per declared field. Identity is the table index, which is also the
/// 32-bit reference value bytecode sees.
#[derive(Debug)]
pub struct Instance {
    pub class: usize,
    pub fields: Vec<InstanceField>,
}

impl Instance {
    pub fn get_field(&self, name: &str) -> Result<i32, ResolutionError> {
        match self.fields.iter().find(|f| f.name == name) {
            Some(field) => Ok(field.value),
            None => Err(field_not_found(name)),
        }
    }

    pub fn put_field(&mut self, name: &str, value: i32) -> Result<(), ResolutionError> {
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(field) => {
                field.value = value;
                Ok(())
            }
            None => Err(field_not_found(name)),
        }
    }
}

fn field_not_found(name: &str) -> ResolutionError {
    ResolutionError::new(
        ResolutionCause::FieldNotFound(name.to_string()),
        "instance has no field with that name",
    )
}

/// Bounded, append-only table of instances. References are 0-based table
/// indices; -1 is the null sentinel and never resolves.
#[derive(Debug, Default)]
pub struct InstanceHeap {
    instances: Vec<Instance>,
}

impl InstanceHeap {
    pub fn new() -> InstanceHeap {
        InstanceHeap {
            instances: Vec::new(),
        }
    }

    /// Allocate an instance of `class` (loaded at `class_slot`), with one
    /// cell per declared field: 0 for ints, -1 for references.
    pub fn create(&mut self, class_slot: usize, class: &ClassFile) -> Result<i32, Box<dyn Error>> {
        if self.instances.len() >= MAX_INSTANCES {
            return Err(Box::new(ExecutionError::new(
                ExecutionCause::HeapFull,
                "instance table is at its cap",
            )));
        }
        let mut fields = Vec::with_capacity(class.fields.len());
        for field in &class.fields {
            let name = class.field_name(field)?.to_string();
            let kind = FieldKind::parse(class.field_descriptor(field)?)?;
            fields.push(InstanceField {
                name,
                kind,
                value: kind.default_value(),
            });
        }
        let index = self.instances.len();
        self.instances.push(Instance {
            class: class_slot,
            fields,
        });
        Ok(index as i32)
    }

    pub fn get(&self, reference: i32) -> Result<&Instance, ExecutionError> {
        if reference < 0 || reference as usize >= self.instances.len() {
            return Err(bad_ref(reference));
        }
        Ok(&self.instances[reference as usize])
    }

    pub fn get_mut(&mut self, reference: i32) -> Result<&mut Instance, ExecutionError> {
        if reference < 0 || reference as usize >= self.instances.len() {
            return Err(bad_ref(reference));
        }
        Ok(&mut self.instances[reference as usize])
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

fn bad_ref(reference: i32) -> ExecutionError {
    ExecutionError::new(
        ExecutionCause::BadRef(reference),
        "reference does not name a live instance",
    )
}
