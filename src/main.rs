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
use std::fs::File;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Read;
use std::io::Write;
use std::path::Path;

use clap::Parser;
use flate2::read::MultiGzDecoder;

use searchtab::index::SearchIndex;

mod cli;

type E = Box<dyn std::error::Error>;

/// Initializes the logger with verbosity given in `log_max_level`.
fn init_log(log_max_level: usize) -> Result<(), E> {
    stderrlog::new()
    .module(module_path!())
    .quiet(false)
    .verbosity(log_max_level)
    .timestamp(stderrlog::Timestamp::Off)
    .init()?;
    Ok(())
}

/// Opens `path` for reading, decompressing it if the name ends in .gz.
fn open_input(
    path: &Path,
) -> Result<Box<dyn Read>, E> {
    let f = File::open(path)?;
    if path.extension().and_then(|x| x.to_str()) == Some("gz") {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(f))))
    } else {
        Ok(Box::new(BufReader::new(f)))
    }
}

fn run(
    command: &cli::Commands,
) -> Result<(), E> {
    match command {
        cli::Commands::Convert {
            input_file,
            out_file,
            in_format,
            out_format,
            fields,
            out_fields,
            ..
        } => {
            let mut conn_in = open_input(input_file)?;
            let mut conn_out: Box<dyn Write> = match out_file {
                Some(file) => Box::new(BufWriter::new(File::create(file)?)),
                None => Box::new(BufWriter::new(std::io::stdout().lock())),
            };

            let (n_queries, n_hits, n_hsps) = searchtab::convert_from_read_to_write(
                *in_format, fields.as_deref(),
                *out_format, out_fields.as_deref(),
                &mut conn_in, &mut conn_out,
            )?;
            conn_out.flush()?;
            log::info!("Wrote {} queries with {} hits and {} HSPs", n_queries, n_hits, n_hsps);
        },

        cli::Commands::Index {
            input_file,
            out_file,
            format,
            fields,
            ..
        } => {
            let mut conn_in = BufReader::new(File::open(input_file)?);
            let index = searchtab::index::build_index(&mut conn_in, *format, fields.as_deref())?;

            let out_path = out_file.clone().unwrap_or_else(|| cli::index_path(input_file));
            let mut conn_out = BufWriter::new(File::create(&out_path)?);
            index.write_to(&mut conn_out)?;
            log::info!("Wrote index of {} queries to {}", index.keys().count(), out_path.display());
        },

        cli::Commands::Fetch {
            input_file,
            index_file,
            keys,
            ..
        } => {
            let index_path = index_file.clone().unwrap_or_else(|| cli::index_path(input_file));
            let index = SearchIndex::read_from(&mut BufReader::new(File::open(&index_path)?))?;

            let mut conn_in = BufReader::new(File::open(input_file)?);
            let mut conn_out = BufWriter::new(std::io::stdout().lock());
            for key in keys.iter() {
                let blocks = index.fetch(&mut conn_in, key)?;
                if blocks.is_empty() {
                    log::warn!("Query {} is not in the index", key);
                }
                for raw in blocks.iter() {
                    conn_out.write_all(raw)?;
                }
            }
            conn_out.flush()?;
        },
    }
    Ok(())
}

fn main() {
    let cli = cli::Cli::parse();

    // Subcommands:
    let (command, verbose) = match &cli.command {
        Some(command @ cli::Commands::Convert { verbose, .. }) => (command, *verbose),
        Some(command @ cli::Commands::Index { verbose, .. }) => (command, *verbose),
        Some(command @ cli::Commands::Fetch { verbose, .. }) => (command, *verbose),
        None => {
            eprintln!("No subcommand given, see searchtab --help");
            std::process::exit(2);
        },
    };

    if let Err(e) = init_log(if verbose { 2 } else { 1 }) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    if let Err(e) = run(command) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
