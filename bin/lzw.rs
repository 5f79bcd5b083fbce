#![forbid(unsafe_code)]
use std::convert::TryFrom;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::{env, ffi, fs, io, process};

use lzw12::{decode::Decoder, encode::Encoder, SearchStrategy};

/// The size of the frame header holding the code word count.
const HEADER: usize = 4;

fn main() -> CodingResult {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    CodingResult::catch_panic(|| {
        let flags = Flags::from_args(env::args_os()).unwrap_or_else(|ParamError| explain());
        run_coding(flags)
    })
}

fn run_coding(flags: Flags) -> Result<(), io::Error> {
    let operation = flags.operation.unwrap_or_else(explain);

    let mut data = vec![];
    match flags.input {
        Input::File(file) => {
            fs::File::open(file)?.read_to_end(&mut data)?;
        }
        Input::Stdin => {
            io::stdin().lock().read_to_end(&mut data)?;
        }
    }

    let out = io::stdout();
    let out = io::BufWriter::new(out.lock());

    match operation {
        Operation::Encode => encode_framed(&data, flags.search, out),
        Operation::Decode => decode_framed(&data, out),
    }
}

/// Write the code word count followed by the packed code words.
fn encode_framed(data: &[u8], search: SearchStrategy, mut out: impl Write) -> io::Result<()> {
    let mut encoder = Encoder::with_search(search);
    let compressed = encoder.compress(data);
    let code_words = u32::try_from(compressed.code_words).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidInput, "too many code words for the frame header")
    })?;

    tracing::info!(
        bytes = data.len(),
        code_words,
        resets = encoder.resets(),
        "compressed"
    );

    out.write_all(&code_words.to_be_bytes())?;
    let packed = compressed
        .to_bytes()
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
    out.write_all(&packed)?;
    out.flush()
}

fn decode_framed(data: &[u8], out: impl Write) -> io::Result<()> {
    if data.len() < HEADER {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "missing code word count",
        ));
    }

    let (header, packed) = data.split_at(HEADER);
    let mut count = [0u8; HEADER];
    count.copy_from_slice(header);
    let code_words = u32::from_be_bytes(count) as usize;

    let mut decoder = Decoder::new();
    let result = decoder.into_stream(out).decode_all(packed, code_words);
    tracing::info!(
        bytes = result.bytes_written,
        code_words,
        resets = decoder.resets(),
        "decompressed"
    );
    result.status
}

struct Flags {
    input: Input,
    operation: Option<Operation>,
    search: SearchStrategy,
}

struct ParamError;

#[derive(Debug)]
enum Input {
    File(PathBuf),
    Stdin,
}

#[derive(Debug)]
enum Operation {
    Encode,
    Decode,
}

fn explain<T>() -> T {
    println!(
        "Usage: lzw12 [-e|-d] [-s linear|sorted] <file>\n\
        Arguments:\n\
        -e\t operation encode\n\
        -d\t operation decode\n\
        -s\t child search of the dictionary (default linear)\n\
        <file>\tfilepath or '-' for stdin"
    );
    process::exit(1);
}

impl Default for Flags {
    fn default() -> Flags {
        Flags {
            input: Input::Stdin,
            operation: None,
            search: SearchStrategy::Linear,
        }
    }
}

fn command() -> clap::Command<'static> {
    clap::Command::new("lzw12")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Compress and decompress 12-bit LZW framed data")
        .arg(
            clap::Arg::new("decode")
                .short('d')
                .long("decode")
                .takes_value(false),
        )
        .arg(
            clap::Arg::new("encode")
                .short('e')
                .long("encode")
                .takes_value(false),
        )
        .group(
            clap::ArgGroup::new("operation")
                .args(&["decode", "encode"])
                .multiple(false)
                .required(true),
        )
        .arg(
            clap::Arg::new("search")
                .short('s')
                .long("search")
                .takes_value(true)
                .default_value("linear")
                .value_parser(["linear", "sorted"]),
        )
        .arg(
            clap::Arg::new("file")
                .default_value("-")
                .value_parser(clap::builder::ValueParser::path_buf()),
        )
}

impl Flags {
    fn from_args(mut args: impl Iterator<Item = ffi::OsString>) -> Result<Self, ParamError> {
        let mut flags = Flags::default();
        let matches = command()
            .try_get_matches_from(args.by_ref())
            .map_err(|_| ParamError)?;

        if matches.contains_id("decode") {
            flags.operation = Some(Operation::Decode);
        } else if matches.contains_id("encode") {
            flags.operation = Some(Operation::Encode);
        }

        match matches.get_one::<String>("search").map(String::as_str) {
            Some("linear") => flags.search = SearchStrategy::Linear,
            Some("sorted") => flags.search = SearchStrategy::Sorted,
            Some(_) => unreachable!("unparsed search"),
            None => {}
        }

        match matches.get_one::<PathBuf>("file") {
            None => flags.input = Input::Stdin,
            Some(p) if *p == PathBuf::from("-") => flags.input = Input::Stdin,
            Some(p) => flags.input = Input::File(p.clone()),
        }

        Ok(flags)
    }
}

enum CodingResult {
    Ok,
    Err(io::Error),
    Panic,
}

impl CodingResult {
    fn catch_panic(op: fn() -> Result<(), io::Error>) -> Self {
        std::panic::catch_unwind(|| match op() {
            Ok(()) => CodingResult::Ok,
            Err(err) => CodingResult::Err(err),
        })
        .unwrap_or(CodingResult::Panic)
    }
}

impl std::process::Termination for CodingResult {
    fn report(self) -> std::process::ExitCode {
        match self {
            CodingResult::Ok => std::process::ExitCode::SUCCESS,
            CodingResult::Err(err) => {
                eprintln!("{}", err);
                std::process::ExitCode::FAILURE
            }
            CodingResult::Panic => {
                eprintln!(
                    "The process failed irrecoverably! This should never happen and is a bug."
                );
                std::process::ExitCode::from(128)
            }
        }
    }
}
