use std::cell::Cell;
use std::error::Error;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use jclass::class_file::ClassFile;
use log::debug;

use crate::bootstrap;
use crate::errors::resolution::{ResolutionCause, ResolutionError};
use crate::frame::Frame;
use crate::heap::InstanceHeap;
use crate::loader::ClassLoader;
use crate::native::NativeLoader;

/// The whole machine: loaded classes with their static cells, the
/// instance table, the native registry, and the process-wide shutdown
/// status. Single-threaded; the interpreted call stack rides on host
/// recursion.
pub struct Vm {
    pub loader: ClassLoader,
    pub heap: InstanceHeap,
    pub(crate) natives: NativeLoader,
    status: Rc<Cell<i32>>,
}

impl Vm {
    /// A machine with the built-in classes (`java/lang/Object`,
    /// `java/lang/System`) already loaded. `native_library` optionally
    /// names a shared library to resolve `Java_*` symbols from on top of
    /// the built-in registry.
    pub fn new(native_library: Option<&Path>) -> Result<Vm, Box<dyn Error>> {
        let status = Rc::new(Cell::new(0));
        let natives = NativeLoader::new(status.clone(), native_library)?;
        let mut vm = Vm {
            loader: ClassLoader::new(),
            heap: InstanceHeap::new(),
            natives,
            status,
        };
        vm.load_class(&bootstrap::object_image())?;
        vm.load_class(&bootstrap::system_image())?;
        Ok(vm)
    }

    /// Decode and register one class, then run its `<clinit>`. The loader
    /// is the only caller of `<clinit>`, so it runs at most once per
    /// class.
    pub fn load_class(&mut self, bytes: &[u8]) -> Result<usize, Box<dyn Error>> {
        let file = ClassFile::from_bytes(bytes)?;
        let slot = self.loader.register(file)?;
        debug!("loaded class {}", self.loader.classes[slot].name);
        self.run_clinit(slot)?;
        Ok(slot)
    }

    fn run_clinit(&mut self, slot: usize) -> Result<(), Box<dyn Error>> {
        let class = self.loader.classes[slot].file.clone();
        let Some(method) = class.find_method("<clinit>") else {
            return Ok(());
        };
        let code = method
            .code()
            .ok_or_else(|| code_missing("<clinit>"))?;
        debug!("running <clinit> of {}", self.loader.classes[slot].name);
        let mut caller = Frame::new(code.max_stack, code.max_locals);
        self.exec_method(method, code, &mut caller, &class)
    }

    pub fn status(&self) -> i32 {
        self.status.get()
    }

    pub(crate) fn request_shutdown(&self, status: i32) {
        self.status.set(status);
    }

    /// Locate `main` in the named class and run it on a one-slot caller
    /// frame. Reports the value `main` leaves there, unless a native
    /// requested shutdown, in which case that status wins.
    pub fn invoke_main(&mut self, class_name: &str) -> Result<i32, Box<dyn Error>> {
        let slot = self.loader.slot(class_name)?;
        let class = self.loader.classes[slot].file.clone();
        let method = class.find_method("main").ok_or_else(|| {
            ResolutionError::new(
                ResolutionCause::MethodNotFound("main".to_string()),
                "entry class has no main method",
            )
        })?;
        let code = method.code().ok_or_else(|| code_missing("main"))?;
        let mut frame = Frame::new(1, 0);
        self.exec_method(method, code, &mut frame, &class)?;
        if self.status.get() != 0 {
            Ok(self.status.get())
        } else {
            Ok(frame.pop()?)
        }
    }
}

fn code_missing(name: &str) -> ResolutionError {
    ResolutionError::new(
        ResolutionCause::CodeMissing(name.to_string()),
        "method has no Code attribute",
    )
}

/// Load the built-in classes and then the given class files in order, and
/// run `main` of the entry class. The entry class name is the first file
/// name minus its `.class` suffix, so `java/lang/Foo.class` names class
/// `java/lang/Foo` when invoked from the classpath root.
pub fn run(class_names: &[String], native_library: Option<&Path>) -> Result<i32, Box<dyn Error>> {
    let first = class_names
        .first()
        .ok_or("at least one class file is required")?;
    let entry = first
        .strip_suffix(".class")
        .ok_or_else(|| format!("entry class file {first} does not end in .class"))?;
    let mut vm = Vm::new(native_library)?;
    for name in class_names {
        let bytes = fs::read(name)?;
        vm.load_class(&bytes)?;
    }
    vm.invoke_main(entry)
}
