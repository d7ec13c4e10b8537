use std::path::PathBuf;
use std::process;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run the main method of a compiled class", long_about = None)]
struct Args {
    /// Class files to load, in order; the first names the entry class
    #[arg(value_name = "CLASSES", required = true)]
    classes: Vec<String>,

    /// Shared library to resolve Java_* native methods from
    #[arg(long, value_name = "PATH")]
    native_lib: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    match cafevm::run(&args.classes, args.native_lib.as_deref()) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("cafevm: {e}");
            process::exit(1);
        }
    }
}
