//! Prints the decoded structure of class files: header, constant pool,
//! field and method tables, optionally a disassembly of method bodies and
//! their line-number tables.

use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use cafevm::ops::Opcode;
use clap::Parser;
use jclass::attributes::{AttributeInfo, CodeAttribute};
use jclass::class_file::ClassFile;

#[derive(Parser, Debug)]
#[command(author, version, about = "Print the decoded structure of class files", long_about = None)]
struct Args {
    #[arg(value_name = "CLASSES", required = true)]
    class_files: Vec<PathBuf>,

    /// Disassemble method bodies
    #[arg(short = 'c', long)]
    disassemble: bool,

    /// Print line number tables
    #[arg(short, long)]
    line: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    for path in &args.class_files {
        let mut file = File::open(path)?;
        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;
        let class = ClassFile::from_bytes(&contents)?;
        print_class(&class, &args)?;
    }

    Ok(())
}

fn print_class(class: &ClassFile, args: &Args) -> Result<(), Box<dyn Error>> {
    for attribute in &class.attributes {
        if let AttributeInfo::SourceFile(sf) = attribute {
            let source = class.cp_utf8(sf.sourcefile_index)?;
            println!("Compiled from {:?}", source.as_str()?);
        }
    }
    println!("class {}", class.class_name()?);
    println!(
        "  version: {}.{}",
        class.major_version, class.minor_version
    );
    println!("  flags: {:?}", class.access_flags);
    if class.super_class != 0 {
        let super_name = class.cp_utf8(class.cp_class(class.super_class)?.name_index)?;
        println!("  super: {}", super_name.as_str()?);
    }

    println!("Constant pool ({} entries):", class.constant_pool_count - 1);
    for (index, entry) in class.constant_pool.iter().enumerate().skip(1) {
        println!("  #{index} = {entry:?}");
    }

    println!("Fields:");
    for field in &class.fields {
        println!(
            "  {} {} {:?}",
            class.field_descriptor(field)?,
            class.field_name(field)?,
            field.access_flags
        );
    }

    println!("Methods:");
    for method in &class.methods {
        let descriptor = class.cp_utf8(method.descriptor_index)?;
        println!(
            "  {}{} {:?}",
            class.method_name(method)?,
            descriptor.as_str()?,
            method.access_flags
        );
        if let Some(code) = method.code() {
            if args.disassemble {
                println!("    stack={}, locals={}", code.max_stack, code.max_locals);
                disassemble(&code.code);
            }
            if args.line {
                print_line_numbers(code);
            }
        }
    }

    Ok(())
}

fn disassemble(code: &[u8]) {
    let mut pc = 0;
    while pc < code.len() {
        let offset = pc;
        let opcode = Opcode::from(code[pc]);
        pc += 1;
        match opcode {
            Opcode::Unknown(byte) => println!("    {offset:4}: .byte {byte:#04x}"),
            Opcode::Bipush => {
                let Some(&operand) = code.get(pc) else {
                    println!("    {offset:4}: bipush <truncated>");
                    return;
                };
                pc += 1;
                println!("    {offset:4}: bipush {}", operand as i8);
            }
            Opcode::Getstatic
            | Opcode::Putstatic
            | Opcode::Getfield
            | Opcode::Putfield
            | Opcode::Invokevirtual
            | Opcode::Invokespecial
            | Opcode::Invokestatic
            | Opcode::New => {
                let (Some(&hi), Some(&lo)) = (code.get(pc), code.get(pc + 1)) else {
                    println!("    {offset:4}: {} <truncated>", opcode.mnemonic());
                    return;
                };
                pc += 2;
                let index = u16::from_be_bytes([hi, lo]);
                println!("    {offset:4}: {} #{index}", opcode.mnemonic());
            }
            other => println!("    {offset:4}: {}", other.mnemonic()),
        }
    }
}

fn print_line_numbers(code: &CodeAttribute) {
    for attribute in &code.attributes {
        if let AttributeInfo::LineNumberTable(table) = attribute {
            println!("    LineNumberTable:");
            for entry in &table.line_number_table {
                println!("      line {}: {}", entry.line_number, entry.start_pc);
            }
        }
    }
}
