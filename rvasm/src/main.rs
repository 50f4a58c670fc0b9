#[macro_use]
extern crate clap;

use byteorder::WriteBytesExt;
use clap::Arg;
use std::fs::File;
use std::io::prelude::*;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use util::Endian;

#[derive(Debug)]
enum IOErrorContext {
    ReadInput,
    WriteOutput,
}

#[derive(Debug)]
enum Error {
    Asm(rvasm::AssembleError),
    Io(std::io::Error, IOErrorContext, PathBuf),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err, context, path) => writeln!(
                f,
                "{} file \"{}\" failed: {}",
                match context {
                    IOErrorContext::ReadInput => "Reading input",
                    IOErrorContext::WriteOutput => "Writing output",
                },
                path.display(),
                err
            ),
            Error::Asm(err) => {
                writeln!(f, "Assembling input failed:")?;
                write!(f, "Error ({}): {}", err.code(), err)
            }
        }
    }
}

fn main() {
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("INPUT")
                .help("Sets the input file to use")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .value_name("OUTPUT")
                .help("Sets the output file to write the word image to"),
        )
        .get_matches();

    let input = matches.value_of("INPUT").unwrap();
    let output = matches.value_of("output");

    if let Err(err) = rvasm_main(input, output) {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

fn rvasm_main(input: &str, output: Option<&str>) -> Result<(), Error> {
    let input_path = Path::new(input);

    let input_file = File::open(input_path)
        .map_err(|err| Error::Io(err, IOErrorContext::ReadInput, input_path.to_owned()))?;
    let mut buf_reader = BufReader::new(input_file);
    let mut source = String::new();

    buf_reader
        .read_to_string(&mut source)
        .map_err(|err| Error::Io(err, IOErrorContext::ReadInput, input_path.to_owned()))?;

    let assembly = rvasm::assemble(&source).map_err(Error::Asm)?;

    for warning in &assembly.warnings {
        eprintln!("{}", warning);
    }

    let output_path: PathBuf = output
        .map(PathBuf::from)
        .unwrap_or_else(|| input_path.with_extension("bin"));

    write_words(&assembly.words, &output_path)
        .map_err(|err| Error::Io(err, IOErrorContext::WriteOutput, output_path.clone()))?;

    println!(
        "Assembled {} instructions, {} data bytes.",
        assembly.words.len(),
        assembly.data.len()
    );
    Ok(())
}

fn write_words(words: &[u32], path: &PathBuf) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for word in words {
        writer.write_u32::<Endian>(*word)?;
    }
    Ok(())
}
