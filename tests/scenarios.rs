use std::error::Error;

use cafevm::Vm;
use jclass::access_flags::{FieldAccessFlags, MethodAccessFlags};
use jclass::writer::{ClassWriter, MethodBody};

const STATIC_METHOD: u16 =
    MethodAccessFlags::AccPublic as u16 | MethodAccessFlags::AccStatic as u16;
const STATIC_FIELD: u16 = FieldAccessFlags::AccPublic as u16 | FieldAccessFlags::AccStatic as u16;

fn body(max_stack: u16, max_locals: u16, code: Vec<u8>) -> Option<MethodBody> {
    Some(MethodBody {
        max_stack,
        max_locals,
        code,
    })
}

#[test]
fn main_returns_pushed_constant() -> Result<(), Box<dyn Error>> {
    let mut writer = ClassWriter::new("First");
    writer.method("main", "()I", STATIC_METHOD, body(1, 0, vec![0x10, 42, 0xac]));

    let mut vm = Vm::new(None)?;
    vm.load_class(&writer.finish())?;
    assert_eq!(vm.invoke_main("First")?, 42);
    Ok(())
}

#[test]
fn static_call_within_one_class() -> Result<(), Box<dyn Error>> {
    let mut writer = ClassWriter::new("CallStaticMethodNoArg");
    let f = writer.pool.methodref("CallStaticMethodNoArg", "f", "()I");
    let [hi, lo] = f.to_be_bytes();
    writer.method("f", "()I", STATIC_METHOD, body(1, 0, vec![0x10, 42, 0xac]));
    writer.method("main", "()I", STATIC_METHOD, body(1, 0, vec![0xb8, hi, lo, 0xac]));

    let mut vm = Vm::new(None)?;
    vm.load_class(&writer.finish())?;
    assert_eq!(vm.invoke_main("CallStaticMethodNoArg")?, 42);
    Ok(())
}

#[test]
fn static_call_across_classes() -> Result<(), Box<dyn Error>> {
    let mut callee = ClassWriter::new("CallStaticMethodCallee");
    callee.method("g", "()I", STATIC_METHOD, body(1, 0, vec![0x10, 46, 0xac]));

    let mut caller = ClassWriter::new("CallStaticMethodCaller");
    let g = caller.pool.methodref("CallStaticMethodCallee", "g", "()I");
    let [hi, lo] = g.to_be_bytes();
    caller.method("main", "()I", STATIC_METHOD, body(1, 0, vec![0xb8, hi, lo, 0xac]));

    let mut vm = Vm::new(None)?;
    vm.load_class(&caller.finish())?;
    vm.load_class(&callee.finish())?;
    assert_eq!(vm.invoke_main("CallStaticMethodCaller")?, 46);
    Ok(())
}

#[test]
fn static_field_write_then_read() -> Result<(), Box<dyn Error>> {
    let mut writer = ClassWriter::new("StaticReferenceField");
    writer.field("value", "I", STATIC_FIELD);
    let value = writer.pool.fieldref("StaticReferenceField", "value", "I");
    let [hi, lo] = value.to_be_bytes();
    writer.method(
        "main",
        "()I",
        STATIC_METHOD,
        body(
            1,
            0,
            vec![
                0x10, 51, // bipush 51
                0xb3, hi, lo, // putstatic value
                0xb2, hi, lo, // getstatic value
                0xac, // ireturn
            ],
        ),
    );

    let mut vm = Vm::new(None)?;
    vm.load_class(&writer.finish())?;
    assert_eq!(vm.invoke_main("StaticReferenceField")?, 51);
    Ok(())
}

#[test]
fn native_halt_preempts_trailing_code() -> Result<(), Box<dyn Error>> {
    let mut writer = ClassWriter::new("Halting");
    let halt0 = writer.pool.methodref("java/lang/System", "halt0", "(I)V");
    let [hi, lo] = halt0.to_be_bytes();
    writer.method(
        "main",
        "()I",
        STATIC_METHOD,
        body(
            1,
            0,
            vec![
                0x10, 7, // bipush 7
                0xb8, hi, lo, // invokestatic halt0
                0x10, 99, // bipush 99 (never reached)
                0xac, // ireturn
            ],
        ),
    );

    let mut vm = Vm::new(None)?;
    vm.load_class(&writer.finish())?;
    assert_eq!(vm.invoke_main("Halting")?, 7);
    assert_eq!(vm.status(), 7);
    Ok(())
}

#[test]
fn addition_wraps_32_bit() -> Result<(), Box<dyn Error>> {
    let mut writer = ClassWriter::new("Add");
    writer.method(
        "main",
        "()I",
        STATIC_METHOD,
        body(2, 0, vec![0x04, 0x04, 0x60, 0xac]), // iconst_1 x2; iadd; ireturn
    );

    let mut vm = Vm::new(None)?;
    vm.load_class(&writer.finish())?;
    assert_eq!(vm.invoke_main("Add")?, 2);
    Ok(())
}

#[test]
fn subtraction_is_signed() -> Result<(), Box<dyn Error>> {
    let mut writer = ClassWriter::new("Sub");
    writer.method(
        "main",
        "()I",
        STATIC_METHOD,
        body(2, 0, vec![0x02, 0x04, 0x64, 0xac]), // iconst_m1; iconst_1; isub; ireturn
    );

    let mut vm = Vm::new(None)?;
    vm.load_class(&writer.finish())?;
    assert_eq!(vm.invoke_main("Sub")?, -2);
    Ok(())
}

#[test]
fn clinit_runs_once_at_load() -> Result<(), Box<dyn Error>> {
    let mut writer = ClassWriter::new("Init");
    writer.field("count", "I", STATIC_FIELD);
    let count = writer.pool.fieldref("Init", "count", "I");
    let [hi, lo] = count.to_be_bytes();
    writer.method(
        "<clinit>",
        "()V",
        MethodAccessFlags::AccStatic as u16,
        body(
            2,
            0,
            vec![
                0xb2, hi, lo, // getstatic count
                0x04, // iconst_1
                0x60, // iadd
                0xb3, hi, lo, // putstatic count
                0xb1, // return
            ],
        ),
    );
    writer.method(
        "main",
        "()I",
        STATIC_METHOD,
        body(1, 0, vec![0xb2, hi, lo, 0xac]),
    );

    let mut vm = Vm::new(None)?;
    let slot = vm.load_class(&writer.finish())?;
    assert_eq!(vm.loader.classes[slot].get_static("count")?, 1);
    // Invoking main again must observe the same single initialization.
    assert_eq!(vm.invoke_main("Init")?, 1);
    assert_eq!(vm.invoke_main("Init")?, 1);
    Ok(())
}

#[test]
fn arguments_fill_locals_in_declaration_order() -> Result<(), Box<dyn Error>> {
    let mut writer = ClassWriter::new("Args");
    let sub = writer.pool.methodref("Args", "sub", "(II)I");
    let [hi, lo] = sub.to_be_bytes();
    writer.method(
        "sub",
        "(II)I",
        STATIC_METHOD,
        body(2, 2, vec![0x1a, 0x1b, 0x64, 0xac]), // iload_0; iload_1; isub; ireturn
    );
    writer.method(
        "main",
        "()I",
        STATIC_METHOD,
        body(
            2,
            0,
            vec![
                0x10, 50, // bipush 50 (first parameter)
                0x10, 8, // bipush 8 (second, topmost)
                0xb8, hi, lo, // invokestatic sub
                0xac, // ireturn
            ],
        ),
    );

    let mut vm = Vm::new(None)?;
    vm.load_class(&writer.finish())?;
    assert_eq!(vm.invoke_main("Args")?, 42);
    Ok(())
}

#[test]
fn instance_fields_round_trip_through_the_heap() -> Result<(), Box<dyn Error>> {
    let mut writer = ClassWriter::new("Point");
    writer.field("x", "I", FieldAccessFlags::AccPublic as u16);
    let point = writer.pool.class("Point");
    let init = writer.pool.methodref("Point", "<init>", "()V");
    let object_init = writer.pool.methodref("java/lang/Object", "<init>", "()V");
    let x = writer.pool.fieldref("Point", "x", "I");
    let get = writer.pool.methodref("Point", "get", "()I");
    let [point_hi, point_lo] = point.to_be_bytes();
    let [init_hi, init_lo] = init.to_be_bytes();
    let [oinit_hi, oinit_lo] = object_init.to_be_bytes();
    let [x_hi, x_lo] = x.to_be_bytes();
    let [get_hi, get_lo] = get.to_be_bytes();
    writer.method(
        "<init>",
        "()V",
        MethodAccessFlags::AccPublic as u16,
        body(
            1,
            1,
            vec![0x2a, 0xb7, oinit_hi, oinit_lo, 0xb1], // aload_0; invokespecial Object.<init>; return
        ),
    );
    writer.method(
        "get",
        "()I",
        MethodAccessFlags::AccPublic as u16,
        body(1, 1, vec![0x2a, 0xb4, x_hi, x_lo, 0xac]), // aload_0; getfield x; ireturn
    );
    writer.method(
        "main",
        "()I",
        STATIC_METHOD,
        body(
            2,
            2,
            vec![
                0xbb, point_hi, point_lo, // new Point
                0x59, // dup
                0xb7, init_hi, init_lo, // invokespecial <init>
                0x4c, // astore_1
                0x2b, // aload_1
                0x10, 9, // bipush 9
                0xb5, x_hi, x_lo, // putfield x
                0x2b, // aload_1
                0xb6, get_hi, get_lo, // invokevirtual get
                0xac, // ireturn
            ],
        ),
    );

    let mut vm = Vm::new(None)?;
    vm.load_class(&writer.finish())?;
    assert_eq!(vm.invoke_main("Point")?, 9);
    assert_eq!(vm.heap.len(), 1);
    Ok(())
}

#[test]
fn missing_native_shuts_down_with_status_one() -> Result<(), Box<dyn Error>> {
    let mut writer = ClassWriter::new("Natives");
    let ext = writer.pool.methodref("Natives", "ext", "(I)V");
    let [hi, lo] = ext.to_be_bytes();
    writer.method(
        "ext",
        "(I)V",
        STATIC_METHOD | MethodAccessFlags::AccNative as u16,
        None,
    );
    writer.method(
        "main",
        "()I",
        STATIC_METHOD,
        body(1, 0, vec![0x10, 3, 0xb8, hi, lo, 0x10, 99, 0xac]),
    );

    let mut vm = Vm::new(None)?;
    vm.load_class(&writer.finish())?;
    assert_eq!(vm.invoke_main("Natives")?, 1);
    assert_eq!(vm.status(), 1);
    Ok(())
}

#[test]
fn operand_stack_bounds_are_fatal() -> Result<(), Box<dyn Error>> {
    let mut writer = ClassWriter::new("Deep");
    writer.method(
        "main",
        "()I",
        STATIC_METHOD,
        body(1, 0, vec![0x04, 0x04, 0x60, 0xac]), // second push exceeds max_stack
    );

    let mut vm = Vm::new(None)?;
    vm.load_class(&writer.finish())?;
    let err = vm.invoke_main("Deep").unwrap_err();
    assert!(err.to_string().contains("StackOverflow"), "{err}");
    Ok(())
}

#[test]
fn unknown_opcodes_are_fatal() -> Result<(), Box<dyn Error>> {
    let mut writer = ClassWriter::new("Nop");
    writer.method("main", "()I", STATIC_METHOD, body(1, 0, vec![0x00]));

    let mut vm = Vm::new(None)?;
    vm.load_class(&writer.finish())?;
    let err = vm.invoke_main("Nop").unwrap_err();
    assert!(err.to_string().contains("UnknownOpcode"), "{err}");
    Ok(())
}

#[test]
fn unresolvable_call_targets_are_fatal() -> Result<(), Box<dyn Error>> {
    let mut writer = ClassWriter::new("Dangling");
    let missing = writer.pool.methodref("Nowhere", "f", "()I");
    let [hi, lo] = missing.to_be_bytes();
    writer.method("main", "()I", STATIC_METHOD, body(1, 0, vec![0xb8, hi, lo, 0xac]));

    let mut vm = Vm::new(None)?;
    vm.load_class(&writer.finish())?;
    let err = vm.invoke_main("Dangling").unwrap_err();
    assert!(err.to_string().contains("ClassNotFound"), "{err}");
    Ok(())
}
