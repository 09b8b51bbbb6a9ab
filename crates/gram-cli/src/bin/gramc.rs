//! `gramc`: compile a grammar into a phrase model file.

use std::path::PathBuf;

use clap::Parser;

use gram_cli::{fail, read_file, write_file, EXIT_EXPAND, EXIT_PARSE, EXIT_USAGE};
use gram_core::log2_big;
use gram_lib::expand::{expand_for_bits, ExpGraph, ExpandOptions};
use gram_lib::flat::export;

#[derive(Parser)]
#[command(name = "gramc", about = "Compile a grammar into a phrase model")]
struct Args {
    /// Use a length range with at least this much entropy, in bits
    #[arg(short = 'b', value_name = "BITS", default_value_t = 64.0)]
    bits: f64,

    /// Generate phrases of at least this many characters
    #[arg(short = 'l', value_name = "MIN", default_value_t = 0)]
    min_length: u32,

    /// Generate phrases of at most this many characters
    #[arg(short = 'u', value_name = "MAX", default_value_t = 1024)]
    max_length: u32,

    /// Maximum number of expanded nodes
    #[arg(short = 'N', value_name = "NODES", default_value_t = 1_000_000)]
    max_nodes: usize,

    /// Maximum number of live expansion thunks
    #[arg(short = 'T', value_name = "THUNKS", default_value_t = 250_000)]
    max_thunks: usize,

    /// Upper-to-lower count ratio slack when picking the length range
    #[arg(short = 'O', value_name = "OVERSHOOT", default_value_t = 0.2)]
    overshoot: f64,

    /// Grammar source file
    infile: PathBuf,

    /// Compiled model output file
    outfile: PathBuf,
}

fn validate(args: &Args) {
    if !(args.bits > 0.0 && args.bits <= 65536.0) {
        fail(EXIT_USAGE, "bits out of range (0.0-65536.0)");
    }
    if args.min_length > 65536 {
        fail(EXIT_USAGE, "minimum length out of range (0-65536)");
    }
    if args.max_length < args.min_length || args.max_length > 65536 {
        fail(EXIT_USAGE, "maximum length out of range (minimum length-65536)");
    }
    if !(10..=1_000_000_000).contains(&args.max_nodes) {
        fail(EXIT_USAGE, "maximum nodes out of range (10-1000000000)");
    }
    if !(10..=1_000_000_000).contains(&args.max_thunks) {
        fail(EXIT_USAGE, "maximum thunks out of range (10-1000000000)");
    }
    if !(0.0..=1.0).contains(&args.overshoot) {
        fail(EXIT_USAGE, "overshoot out of range (0.0-1.0)");
    }
    if args.infile == args.outfile {
        fail(EXIT_USAGE, "refusing to overwrite the input file");
    }
}

fn main() {
    let args = Args::parse();
    validate(&args);

    let source_bytes = read_file(&args.infile, EXIT_PARSE);
    let source = match String::from_utf8(source_bytes) {
        Ok(s) => s,
        Err(_) => fail(EXIT_PARSE, "grammar file is not valid UTF-8"),
    };

    let parsed = match gram_lib::parser::parse(&source) {
        Ok(parsed) => parsed,
        Err(e) => fail(EXIT_PARSE, format_args!("parse error: {e}")),
    };

    let expgraph = ExpGraph::new();
    let opts = ExpandOptions {
        bits: args.bits,
        overshoot: args.overshoot,
        min_len: args.min_length,
        max_len: args.max_length,
        max_nodes: args.max_nodes,
        max_thunks: args.max_thunks,
    };
    let range = match expand_for_bits(&parsed.main, &expgraph, &opts) {
        Ok(range) => range,
        Err(e) => fail(EXIT_EXPAND, format_args!("expansion failure: {e}")),
    };

    if let Err(e) = expgraph.optimize() {
        fail(EXIT_EXPAND, format_args!("expansion failure: {e}"));
    }

    let count = range.root.count();
    println!(
        "Using length range {}..{}",
        range.min_len, range.max_len
    );
    println!(
        "Result: {} combinations ({:.6} bits), {} nodes",
        count.to_str_radix(16),
        log2_big(&count),
        expgraph.live()
    );

    let bytes = export(&expgraph, &range.root);
    write_file(&args.outfile, &bytes, EXIT_PARSE);
}
