//! `gram`: draw phrases from a compiled model, or convert between
//! phrases and their indices.

use std::io::BufRead;
use std::path::PathBuf;

use clap::Parser;
use num_bigint::BigUint;
use rand::rngs::OsRng;

use gram_cli::{fail, read_file, EXIT_PARSE, EXIT_USAGE};
use gram_core::log2_big;
use gram_lib::flat::{self, FlatGraph};

#[derive(Parser)]
#[command(name = "gram", about = "Generate or code phrases from a compiled model")]
struct Args {
    /// Generate this many random phrases
    #[arg(short = 'g', value_name = "N")]
    generate: Option<u64>,

    /// Encode a hexadecimal index into its phrase
    #[arg(short = 'e', value_name = "HEX")]
    encode: Option<String>,

    /// Decode a phrase into its hexadecimal index (-1 if not admitted)
    #[arg(short = 'd', value_name = "STR")]
    decode: Option<String>,

    /// Encode stdin, one hexadecimal index per line
    #[arg(short = 'E')]
    encode_lines: bool,

    /// Decode stdin, one phrase per line
    #[arg(short = 'D')]
    decode_lines: bool,

    /// Show combination count, bits and node count
    #[arg(short = 'i')]
    info: bool,

    /// Enumerate every phrase in canonical order
    #[arg(short = 'a')]
    all: bool,

    /// Compiled model file
    file: PathBuf,
}

fn load(path: &std::path::Path) -> FlatGraph {
    let bytes = read_file(path, EXIT_PARSE);
    match flat::import(&bytes) {
        Ok(graph) => graph,
        Err(e) => fail(EXIT_PARSE, format_args!("unable to load model: {e}")),
    }
}

fn parse_hex(text: &str) -> Option<BigUint> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    BigUint::parse_bytes(text.as_bytes(), 16)
}

fn print_phrase(phrase: &[u8]) {
    println!("{}", String::from_utf8_lossy(phrase));
}

fn main() {
    let args = Args::parse();

    let modes = [
        args.generate.is_some(),
        args.encode.is_some(),
        args.decode.is_some(),
        args.encode_lines,
        args.decode_lines,
        args.info,
        args.all,
    ];
    if modes.iter().filter(|&&m| m).count() > 1 {
        fail(EXIT_USAGE, "choose at most one mode");
    }

    let graph = load(&args.file);
    let root = graph.root();

    if args.info {
        let count = &root.count;
        println!(
            "{} combinations ({:.6} bits), {} nodes",
            count.to_str_radix(16),
            log2_big(count),
            graph.nodes.len()
        );
        return;
    }

    if let Some(hex) = &args.encode {
        let Some(index) = parse_hex(hex) else {
            fail(EXIT_USAGE, "invalid hexadecimal index");
        };
        match flat::encode(&graph, root, &index) {
            Ok(phrase) => print_phrase(&phrase),
            Err(e) => fail(EXIT_USAGE, e),
        }
        return;
    }

    if let Some(phrase) = &args.decode {
        match flat::parse(&graph, root, phrase.as_bytes()) {
            Some(index) => println!("{}", index.to_str_radix(16)),
            None => println!("-1"),
        }
        return;
    }

    if args.encode_lines {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => fail(EXIT_PARSE, format_args!("unable to read stdin: {e}")),
            };
            let Some(index) = parse_hex(&line) else {
                fail(EXIT_PARSE, format_args!("invalid hexadecimal index: {line}"));
            };
            match flat::encode(&graph, root, &index) {
                Ok(phrase) => print_phrase(&phrase),
                Err(e) => fail(EXIT_PARSE, e),
            }
        }
        return;
    }

    if args.decode_lines {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => fail(EXIT_PARSE, format_args!("unable to read stdin: {e}")),
            };
            match flat::parse(&graph, root, line.as_bytes()) {
                Some(index) => println!("{}", index.to_str_radix(16)),
                None => println!("-1"),
            }
        }
        return;
    }

    if args.all {
        for phrase in flat::enumerate(&graph, root) {
            print_phrase(&phrase);
        }
        return;
    }

    let n = args.generate.unwrap_or(1);
    let mut rng = OsRng;
    for _ in 0..n {
        let phrase = flat::generate_random(&graph, root, &mut rng);
        print_phrase(&phrase);
    }
}
