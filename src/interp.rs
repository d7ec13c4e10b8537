//! The fetch-decode-execute loop. Invocation opcodes recurse through
//! `exec_method`, one host stack frame per interpreted frame; return
//! opcodes hand their value to the caller's operand stack. The shutdown
//! status is polled at every instruction boundary, so a native halt makes
//! every active frame unwind without pushing anything.

use std::error::Error;
use std::rc::Rc;

use jclass::attributes::CodeAttribute;
use jclass::class_file::{ClassFile, MethodInfo};
use jclass::descriptors::{method_param_slots, FieldKind};
use log::{debug, error};

use crate::errors::execution::{ExecutionCause, ExecutionError};
use crate::errors::resolution::{ResolutionCause, ResolutionError};
use crate::frame::Frame;
use crate::native::native_symbol;
use crate::ops::Opcode;
use crate::vm::Vm;

fn fetch_u8(code: &[u8], pc: &mut usize) -> Result<u8, ExecutionError> {
    let byte = code.get(*pc).copied().ok_or_else(|| {
        ExecutionError::new(
            ExecutionCause::TruncatedCode,
            "operand runs past the end of the code array",
        )
    })?;
    *pc += 1;
    Ok(byte)
}

fn fetch_u16(code: &[u8], pc: &mut usize) -> Result<u16, ExecutionError> {
    let hi = fetch_u8(code, pc)?;
    let lo = fetch_u8(code, pc)?;
    Ok(u16::from_be_bytes([hi, lo]))
}

impl Vm {
    /// Run one method body. The callee frame is sized from the Code
    /// attribute; arguments come off `caller`'s operand stack per the
    /// method descriptor, and `ireturn` pushes its value back there.
    pub(crate) fn exec_method(
        &mut self,
        method: &MethodInfo,
        code: &CodeAttribute,
        caller: &mut Frame,
        class: &Rc<ClassFile>,
    ) -> Result<(), Box<dyn Error>> {
        let mut frame = Frame::new(code.max_stack, code.max_locals);

        let descriptor = class.cp_utf8(method.descriptor_index)?.as_str()?;
        let param_slots = method_param_slots(descriptor)?;
        // Local 0 is the receiver for instance methods; parameters fill
        // upward, the caller's topmost value landing in the highest slot.
        let base = if method.is_static() { 0 } else { 1 };
        for slot in (0..param_slots).rev() {
            let value = caller.pop()?;
            frame.store(base + slot, value)?;
        }
        if base == 1 {
            let receiver = caller.pop()?;
            frame.store(0, receiver)?;
        }

        let bytecode = code.code.as_slice();
        let mut pc = 0;
        while pc < bytecode.len() && self.status() == 0 {
            let opcode = Opcode::from(bytecode[pc]);
            pc += 1;
            match opcode {
                Opcode::IconstM1 => {
                    debug!("iconst_m1");
                    frame.push(-1)?;
                }
                Opcode::Iconst0 => {
                    debug!("iconst_0");
                    frame.push(0)?;
                }
                Opcode::Iconst1 => {
                    debug!("iconst_1");
                    frame.push(1)?;
                }
                Opcode::Bipush => {
                    let byte = fetch_u8(bytecode, &mut pc)? as i8;
                    debug!("bipush {byte}");
                    frame.push(byte as i32)?;
                }
                Opcode::Iload0 => {
                    debug!("iload_0");
                    let value = frame.load(0)?;
                    frame.push(value)?;
                }
                Opcode::Iload1 => {
                    debug!("iload_1");
                    let value = frame.load(1)?;
                    frame.push(value)?;
                }
                Opcode::Aload0 => {
                    debug!("aload_0");
                    let value = frame.load(0)?;
                    frame.push(value)?;
                }
                Opcode::Aload1 => {
                    debug!("aload_1");
                    let value = frame.load(1)?;
                    frame.push(value)?;
                }
                Opcode::Istore1 => {
                    debug!("istore_1");
                    let value = frame.pop()?;
                    frame.store(1, value)?;
                }
                Opcode::Astore1 => {
                    debug!("astore_1");
                    let value = frame.pop()?;
                    frame.store(1, value)?;
                }
                Opcode::Dup => {
                    debug!("dup");
                    let value = frame.pop()?;
                    frame.push(value)?;
                    frame.push(value)?;
                }
                Opcode::Iadd => {
                    let b = frame.pop()?;
                    let a = frame.pop()?;
                    debug!("iadd: {a} + {b}");
                    frame.push(a.wrapping_add(b))?;
                }
                Opcode::Isub => {
                    let b = frame.pop()?;
                    let a = frame.pop()?;
                    debug!("isub: {a} - {b}");
                    frame.push(a.wrapping_sub(b))?;
                }
                Opcode::Ireturn => {
                    let value = frame.pop()?;
                    debug!("ireturn {value}");
                    caller.push(value)?;
                    break;
                }
                Opcode::Return => {
                    debug!("return");
                    break;
                }
                Opcode::Getstatic | Opcode::Putstatic => {
                    let index = fetch_u16(bytecode, &mut pc)?;
                    self.exec_static_field(opcode, index, &mut frame, class)?;
                }
                Opcode::Getfield | Opcode::Putfield => {
                    let index = fetch_u16(bytecode, &mut pc)?;
                    self.exec_instance_field(opcode, index, &mut frame, class)?;
                }
                Opcode::Invokevirtual | Opcode::Invokespecial => {
                    let index = fetch_u16(bytecode, &mut pc)?;
                    self.invoke_instance(opcode, index, &mut frame, class)?;
                }
                Opcode::Invokestatic => {
                    let index = fetch_u16(bytecode, &mut pc)?;
                    self.invoke_static(index, &mut frame, class)?;
                }
                Opcode::New => {
                    let index = fetch_u16(bytecode, &mut pc)?;
                    self.exec_new(index, &mut frame, class)?;
                }
                Opcode::Unknown(byte) => {
                    return Err(Box::new(ExecutionError::new(
                        ExecutionCause::UnknownOpcode(byte),
                        "opcode is outside the executed subset",
                    )));
                }
            }
        }
        Ok(())
    }

    /// Follow a Class constant to the loaded class it names. Returns the
    /// loader slot plus a handle on the decoded file.
    fn resolve_class_entry(
        &self,
        class_entry: u16,
        class: &ClassFile,
    ) -> Result<(usize, Rc<ClassFile>), Box<dyn Error>> {
        let cp_class = class.cp_class(class_entry)?;
        let name = class.cp_utf8(cp_class.name_index)?.as_str()?;
        let slot = self.loader.slot(name)?;
        Ok((slot, self.loader.classes[slot].file.clone()))
    }

    fn exec_static_field(
        &mut self,
        opcode: Opcode,
        index: u16,
        frame: &mut Frame,
        class: &ClassFile,
    ) -> Result<(), Box<dyn Error>> {
        let fieldref = class.cp_fieldref(index)?;
        let (slot, _) = self.resolve_class_entry(fieldref.class_index, class)?;
        let nat = class.cp_name_and_type(fieldref.name_and_type_index)?;
        let name = class.cp_utf8(nat.name_index)?.as_str()?;
        if opcode == Opcode::Getstatic {
            let value = self.loader.classes[slot].get_static(name)?;
            debug!("getstatic {index}: {name} -> {value}");
            frame.push(value)?;
        } else {
            let value = frame.pop()?;
            debug!("putstatic {index}: {name} <- {value}");
            self.loader.classes[slot].put_static(name, value)?;
        }
        Ok(())
    }

    fn exec_instance_field(
        &mut self,
        opcode: Opcode,
        index: u16,
        frame: &mut Frame,
        class: &ClassFile,
    ) -> Result<(), Box<dyn Error>> {
        let fieldref = class.cp_fieldref(index)?;
        let nat = class.cp_name_and_type(fieldref.name_and_type_index)?;
        // Both supported kinds occupy one operand-stack slot; anything
        // else fails here before the stack is touched.
        FieldKind::parse(class.cp_utf8(nat.descriptor_index)?.as_str()?)?;
        let name = class.cp_utf8(nat.name_index)?.as_str()?;
        if opcode == Opcode::Getfield {
            let objectref = frame.pop()?;
            debug!("getfield {index}: {name} of instance {objectref}");
            let value = self.heap.get(objectref)?.get_field(name)?;
            frame.push(value)?;
        } else {
            let value = frame.pop()?;
            let objectref = frame.pop()?;
            debug!("putfield {index}: {name} of instance {objectref} <- {value}");
            self.heap.get_mut(objectref)?.put_field(name, value)?;
        }
        Ok(())
    }

    /// invokevirtual and invokespecial. Lookup runs against the class the
    /// Methodref declares, by name only; the receiver's runtime class is
    /// not consulted.
    fn invoke_instance(
        &mut self,
        opcode: Opcode,
        index: u16,
        frame: &mut Frame,
        class: &ClassFile,
    ) -> Result<(), Box<dyn Error>> {
        if opcode == Opcode::Invokevirtual {
            debug!("invokevirtual {index}");
        } else {
            debug!("invokespecial {index}");
        }
        let methodref = class.cp_methodref(index)?;
        let (_, target) = self.resolve_class_entry(methodref.class_index, class)?;
        let nat = class.cp_name_and_type(methodref.name_and_type_index)?;
        let name = class.cp_utf8(nat.name_index)?.as_str()?;
        let method = target
            .find_method(name)
            .ok_or_else(|| method_not_found(name))?;
        let code = method.code().ok_or_else(|| code_missing(name))?;
        self.exec_method(method, code, frame, &target)
    }

    fn invoke_static(
        &mut self,
        index: u16,
        frame: &mut Frame,
        class: &ClassFile,
    ) -> Result<(), Box<dyn Error>> {
        debug!("invokestatic {index}");
        let methodref = class.cp_methodref(index)?;
        let (_, target) = self.resolve_class_entry(methodref.class_index, class)?;
        let nat = class.cp_name_and_type(methodref.name_and_type_index)?;
        let name = class.cp_utf8(nat.name_index)?.as_str()?;
        let method = target
            .find_method(name)
            .ok_or_else(|| method_not_found(name))?;
        if !method.is_static() {
            return Err(Box::new(ResolutionError::new(
                ResolutionCause::NotStatic(name.to_string()),
                "invokestatic requires ACC_STATIC",
            )));
        }
        if method.is_native() {
            self.exec_native(method, frame, &target)
        } else {
            let code = method.code().ok_or_else(|| code_missing(name))?;
            self.exec_method(method, code, frame, &target)
        }
    }

    /// Pop the arguments the descriptor declares and hand them to the
    /// mangled host symbol. An unresolved symbol requests shutdown with
    /// status 1 instead of raising an error.
    fn exec_native(
        &mut self,
        method: &MethodInfo,
        frame: &mut Frame,
        class: &Rc<ClassFile>,
    ) -> Result<(), Box<dyn Error>> {
        let method_name = class.cp_utf8(method.name_index)?.as_str()?;
        let symbol = native_symbol(class.class_name()?, method_name);
        let descriptor = class.cp_utf8(method.descriptor_index)?.as_str()?;
        let param_slots = method_param_slots(descriptor)?;
        let mut args = vec![0; param_slots];
        for slot in (0..param_slots).rev() {
            args[slot] = frame.pop()?;
        }
        debug!("native call {symbol}");
        if !self.natives.call(&symbol, &args) {
            error!("native method not found: {symbol}");
            self.request_shutdown(1);
        }
        Ok(())
    }

    fn exec_new(
        &mut self,
        index: u16,
        frame: &mut Frame,
        class: &ClassFile,
    ) -> Result<(), Box<dyn Error>> {
        debug!("new {index}");
        let (slot, target) = self.resolve_class_entry(index, class)?;
        let reference = self.heap.create(slot, &target)?;
        frame.push(reference)?;
        Ok(())
    }
}

fn method_not_found(name: &str) -> ResolutionError {
    ResolutionError::new(
        ResolutionCause::MethodNotFound(name.to_string()),
        "class declares no method with that name",
    )
}

fn code_missing(name: &str) -> ResolutionError {
    ResolutionError::new(
        ResolutionCause::CodeMissing(name.to_string()),
        "method has no Code attribute",
    )
}
