// searchtab: Parsing, writing, and indexing tabular sequence search results.
//
// Copyright 2025 Tommi Mäklin [tommi@maklin.fi].
//
// Copyrights in this project are retained by contributors. No copyright assignment
// is required to contribute to this project.
//
// Except as otherwise noted (below and/or in individual files), this
// project is licensed under the Apache License, Version 2.0
// <LICENSE-APACHE> or <http://www.apache.org/licenses/LICENSE-2.0> or
// the MIT license, <LICENSE-MIT> or <http://opensource.org/licenses/MIT>,
// at your option.
//
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use searchtab::Format;

#[derive(Parser)]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    // Convert between supported formats or column layouts
    Convert {
        // Input file, may be gzipped
        #[arg(group = "input", required = true, help = "Input file")]
        input_file: PathBuf,

        // Output file path, defaults to stdout
        #[arg(short = 'o', long = "output", required = false)]
        out_file: Option<PathBuf>,

        // Input format
        #[arg(long = "in-format", default_value = "blast-tab")]
        in_format: Format,

        // Output format
        #[arg(long = "out-format", default_value = "blast-tab")]
        out_format: Format,

        // Columns in the input, space-separated
        #[arg(long = "fields", required = false)]
        fields: Option<String>,

        // Columns to write, space-separated
        #[arg(long = "out-fields", required = false)]
        out_fields: Option<String>,

        // Verbosity
        #[arg(long = "verbose", default_value_t = false)]
        verbose: bool,
    },

    // Build a byte-offset index of the queries in a file
    Index {
        // Input file
        #[arg(group = "input", required = true, help = "Input file")]
        input_file: PathBuf,

        // Output file path, defaults to input file + .idx
        #[arg(short = 'o', long = "output", required = false)]
        out_file: Option<PathBuf>,

        // Input format
        #[arg(long = "format", default_value = "blast-tab")]
        format: Format,

        // Columns in the input, space-separated
        #[arg(long = "fields", required = false)]
        fields: Option<String>,

        // Verbosity
        #[arg(long = "verbose", default_value_t = false)]
        verbose: bool,
    },

    // Print the records of some queries using an index
    Fetch {
        // Indexed file
        #[arg(group = "input", required = true, help = "Indexed file")]
        input_file: PathBuf,

        // Index file, defaults to input file + .idx
        #[arg(long = "index", required = false)]
        index_file: Option<PathBuf>,

        // Query names
        #[arg(required = true, help = "Query name(s)")]
        keys: Vec<String>,

        // Verbosity
        #[arg(long = "verbose", default_value_t = false)]
        verbose: bool,
    },
}

/// Returns the default index path for `input_file`.
pub fn index_path(
    input_file: &std::path::Path,
) -> PathBuf {
    PathBuf::from(input_file.to_string_lossy().to_string() + ".idx")
}
