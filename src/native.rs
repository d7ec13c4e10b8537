use std::cell::Cell;
use std::collections::HashMap;
use std::error::Error;
use std::os::raw::c_void;
use std::path::Path;
use std::ptr;
use std::rc::Rc;

use libloading::Library;
use log::debug;

/// Mangle an internal class name and method name into the symbol the
/// native table exports: `Java_<class>_<method>` with `/` replaced by `_`.
pub fn native_symbol(class_name: &str, method_name: &str) -> String {
    format!("Java_{}_{}", class_name.replace('/', "_"), method_name)
}

type BuiltinFn = Box<dyn Fn(&[i32])>;

/// Resolves mangled native-method names to host functions. Built-in
/// functions are registered up front; anything else is looked up in the
/// optional external library with the C ABI `(env, class, jint)`.
///
/// The one built-in every run gets is `java/lang/System.halt0`, which
/// writes its argument into the shared shutdown status.
pub struct NativeLoader {
    builtins: HashMap<String, BuiltinFn>,
    library: Option<Library>,
}

impl NativeLoader {
    pub fn new(
        status: Rc<Cell<i32>>,
        library_path: Option<&Path>,
    ) -> Result<NativeLoader, Box<dyn Error>> {
        let mut builtins: HashMap<String, BuiltinFn> = HashMap::new();
        builtins.insert(
            native_symbol("java/lang/System", "halt0"),
            Box::new(move |args| {
                let code = args.first().copied().unwrap_or(0);
                debug!("halt0 requested shutdown with status {code}");
                status.set(code);
            }),
        );
        let library = match library_path {
            Some(path) => Some(unsafe { Library::new(path)? }),
            None => None,
        };
        Ok(NativeLoader { builtins, library })
    }

    /// Invoke `symbol` with the popped arguments. Returns false when the
    /// symbol resolves nowhere; the interpreter turns that into a
    /// shutdown with status 1.
    pub fn call(&self, symbol: &str, args: &[i32]) -> bool {
        if let Some(builtin) = self.builtins.get(symbol) {
            builtin(args);
            return true;
        }
        if let Some(library) = &self.library {
            type RawNative = unsafe extern "C" fn(*mut c_void, *mut c_void, i32);
            if let Ok(function) = unsafe { library.get::<RawNative>(symbol.as_bytes()) } {
                let arg = args.first().copied().unwrap_or(0);
                unsafe { function(ptr::null_mut(), ptr::null_mut(), arg) };
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_mangle_slashes() {
        assert_eq!(
            native_symbol("java/lang/System", "halt0"),
            "Java_java_lang_System_halt0"
        );
        assert_eq!(native_symbol("First", "main"), "Java_First_main");
    }

    #[test]
    fn builtin_halt0_sets_status() {
        let status = Rc::new(Cell::new(0));
        let loader = NativeLoader::new(status.clone(), None).unwrap();
        assert!(loader.call("Java_java_lang_System_halt0", &[7]));
        assert_eq!(status.get(), 7);
    }

    #[test]
    fn unresolved_symbols_report_failure() {
        let status = Rc::new(Cell::new(0));
        let loader = NativeLoader::new(status, None).unwrap();
        assert!(!loader.call("Java_First_missing", &[0]));
    }
}
