use std::error::Error;
use std::rc::Rc;

use jclass::class_file::ClassFile;
use jclass::descriptors::FieldKind;

use crate::errors::resolution::{ResolutionCause, ResolutionError};

/// A class-level value cell, allocated at load time for every declared
/// field and mutated by putstatic. Same shapes as instance cells.
#[derive(Debug)]
pub struct StaticField {
    pub name: String,
    pub kind: FieldKind,
    pub value: i32,
}

/// A registered class: its resolved internal name, the decoded file, and
/// the static cells. The file sits behind an `Rc` so the interpreter can
/// hold on to the current class across nested invocations while the
/// loader stays reachable.
#[derive(Debug)]
pub struct LoadedClass {
    pub name: String,
    pub file: Rc<ClassFile>,
    pub statics: Vec<StaticField>,
}

impl LoadedClass {
    pub fn get_static(&self, name: &str) -> Result<i32, ResolutionError> {
        match self.statics.iter().find(|f| f.name == name) {
            Some(field) => Ok(field.value),
            None => Err(static_not_found(&self.name, name)),
        }
    }

    pub fn put_static(&mut self, name: &str, value: i32) -> Result<(), ResolutionError> {
        match self.statics.iter_mut().find(|f| f.name == name) {
            Some(field) => {
                field.value = value;
                Ok(())
            }
            None => Err(static_not_found(&self.name, name)),
        }
    }
}

fn static_not_found(class: &str, field: &str) -> ResolutionError {
    ResolutionError::new(
        ResolutionCause::FieldNotFound(format!("{class}.{field}")),
        "class declares no field with that name",
    )
}

/// Ordered collection of loaded classes. Classes are registered in the
/// order given and live for the whole run; lookup walks the list and
/// returns the first class whose internal name matches.
#[derive(Debug, Default)]
pub struct ClassLoader {
    pub classes: Vec<LoadedClass>,
}

impl ClassLoader {
    pub fn new() -> ClassLoader {
        ClassLoader {
            classes: Vec::new(),
        }
    }

    /// Register a decoded class and allocate its static cells. Running
    /// `<clinit>` is the caller's job, once, right after this returns.
    pub fn register(&mut self, file: ClassFile) -> Result<usize, Box<dyn Error>> {
        let name = file.class_name()?.to_string();
        let mut statics = Vec::with_capacity(file.fields.len());
        for field in &file.fields {
            let field_name = file.field_name(field)?.to_string();
            let kind = FieldKind::parse(file.field_descriptor(field)?)?;
            statics.push(StaticField {
                name: field_name,
                kind,
                value: kind.default_value(),
            });
        }
        let slot = self.classes.len();
        self.classes.push(LoadedClass {
            name,
            file: Rc::new(file),
            statics,
        });
        Ok(slot)
    }

    pub fn slot(&self, name: &str) -> Result<usize, ResolutionError> {
        self.classes
            .iter()
            .position(|class| class.name == name)
            .ok_or_else(|| {
                ResolutionError::new(
                    ResolutionCause::ClassNotFound(name.to_string()),
                    "no loaded class has that internal name",
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jclass::access_flags::FieldAccessFlags;
    use jclass::writer::ClassWriter;

    fn counter_class() -> ClassFile {
        let mut writer = ClassWriter::new("Counter");
        writer.field(
            "count",
            "I",
            FieldAccessFlags::AccPublic as u16 | FieldAccessFlags::AccStatic as u16,
        );
        ClassFile::from_bytes(&writer.finish()).unwrap()
    }

    #[test]
    fn lookup_is_by_internal_name() {
        let mut loader = ClassLoader::new();
        let slot = loader.register(counter_class()).unwrap();
        assert_eq!(loader.slot("Counter").unwrap(), slot);
        assert!(loader.slot("Missing").is_err());
    }

    #[test]
    fn static_cells_default_and_mutate() {
        let mut loader = ClassLoader::new();
        let slot = loader.register(counter_class()).unwrap();
        assert_eq!(loader.classes[slot].get_static("count").unwrap(), 0);
        loader.classes[slot].put_static("count", 51).unwrap();
        assert_eq!(loader.classes[slot].get_static("count").unwrap(), 51);
        assert!(loader.classes[slot].get_static("total").is_err());
    }

    #[test]
    fn first_registered_class_wins_name_ties() {
        let mut loader = ClassLoader::new();
        let first = loader.register(counter_class()).unwrap();
        loader.register(counter_class()).unwrap();
        assert_eq!(loader.slot("Counter").unwrap(), first);
    }
}
