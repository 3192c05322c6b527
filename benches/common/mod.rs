#![allow(dead_code)]
use std::fs;

use pyjs::ast::Module;
use pyjs::parser;

pub const WORKLOADS: [(&str, &str); 3] = [
    ("loops", "tests/programs/functions_and_loops/program.py"),
    ("operators", "tests/programs/operators/program.py"),
    ("collections", "tests/programs/fstrings_and_collections/program.py"),
];

pub fn load_source(path: &str) -> String {
    fs::read_to_string(path).unwrap_or_else(|err| panic!("read {path}: {err}"))
}

pub fn load_module(path: &str) -> Module {
    let source = load_source(path);
    parser::parse(&source).unwrap_or_else(|err| panic!("parse {path}: {err}"))
}

/// Every workload concatenated `copies` times, for a larger input.
pub fn scaled_source(copies: usize) -> String {
    let mut source = String::new();
    for _ in 0..copies {
        for (_, path) in WORKLOADS {
            source.push_str(&load_source(path));
            source.push('\n');
        }
    }
    source
}
