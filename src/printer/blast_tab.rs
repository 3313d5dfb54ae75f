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

use std::io::Write;

use crate::columns::Column;
use crate::columns::Field;
use crate::columns::Value;
use crate::printer::WriteError;
use crate::Hit;
use crate::Hsp;
use crate::QueryResult;
use crate::Strand;

type E = Box<dyn std::error::Error>;

/// Format the lines of a query in BLAST+ tabular format
///
/// Writes one line per HSP with the columns in `fields` to `conn`. If
/// `comments` is true, the lines are preceded by a comment block.
///
pub fn format_query<W: Write>(
    query: &QueryResult,
    fields: &[Field],
    comments: bool,
    conn: &mut W,
) -> Result<(), E> {
    if comments {
        format_comments(query, fields, conn)?;
    }
    for hit in query.hits.iter() {
        for hsp in hit.hsps.iter() {
            format_row(query, hit, hsp, fields, conn)?;
        }
    }
    Ok(())
}

/// Format the comment block of a query
///
/// The `# Fields:` line is only written if the query has hits. Database and
/// RID lines are written if the query has these attributes.
///
pub fn format_comments<W: Write>(
    query: &QueryResult,
    fields: &[Field],
    conn: &mut W,
) -> Result<(), E> {
    let program = query.program.as_ref().ok_or_else(|| missing("program", query))?;

    let mut formatted: String = String::new();
    formatted += &match &query.version {
        Some(version) => format!("# {} {}\n", program.to_uppercase(), version),
        None => format!("# {}\n", program.to_uppercase()),
    };
    formatted += &match &query.description {
        Some(description) => format!("# Query: {} {}\n", query.id, description),
        None => format!("# Query: {}\n", query.id),
    };
    if let Some(rid) = &query.rid {
        formatted += &format!("# RID: {}\n", rid);
    }
    if let Some(target) = &query.target {
        formatted += &format!("# Database: {}\n", target);
    }
    if !query.hits.is_empty() {
        let long_names: Vec<&str> = fields.iter().map(|field| field.long_name()).collect();
        formatted += &format!("# Fields: {}\n", long_names.join(", "));
    }
    formatted += &format!("# {} hits found\n", query.hits.len());

    conn.write_all(formatted.as_bytes())?;
    Ok(())
}

/// Format a single HSP as a line
pub fn format_row<W: Write>(
    query: &QueryResult,
    hit: &Hit,
    hsp: &Hsp,
    fields: &[Field],
    conn: &mut W,
) -> Result<(), E> {
    let separator: char = '\t';
    let mut formatted: String = String::new();

    for (idx, field) in fields.iter().enumerate() {
        if idx > 0 {
            formatted += &separator.to_string();
        }
        let column = match field.column {
            Some(column) => column,
            None => {
                formatted += "N/A";
                continue
            },
        };

        let value: String = match column {
            Column::Frames => {
                match (hsp.fragment.query_frame, hsp.fragment.hit_frame) {
                    (Some(query_frame), Some(hit_frame)) => format!("{}/{}", query_frame, hit_frame),
                    _ => return Err(Box::new(missing(&field.name, query))),
                }
            },
            Column::Qstart | Column::Qend | Column::Sstart | Column::Send => {
                raw_coordinate(column, hsp)?.ok_or_else(|| missing(&field.name, query))?.to_string()
            },
            _ => {
                let value = column.value(query, hit, hsp).ok_or_else(|| missing(&field.name, query))?;
                match (column, value) {
                    (Column::Evalue, Value::Float(x)) => format_evalue(x),
                    (Column::Bitscore, Value::Float(x)) => format_bitscore(x),
                    (Column::Pident | Column::Ppos, Value::Float(x)) => format!("{:.2}", x),
                    (_, value) => value.to_string(),
                }
            },
        };
        formatted += &value;
    }
    formatted += "\n";

    conn.write_all(formatted.as_bytes())?;
    Ok(())
}

/// Recover a 1-based coordinate in the input order
///
/// Reverse strand coordinates are written from high to low. Returns None
/// if the coordinate is not stored and an error if the strand is missing.
///
pub fn raw_coordinate(
    column: Column,
    hsp: &Hsp,
) -> Result<Option<u64>, WriteError> {
    let frag = &hsp.fragment;
    let (start, end, strand, strand_name) = match column {
        Column::Qstart | Column::Qend => (frag.query_start, frag.query_end, frag.query_strand, "query_strand"),
        _ => (frag.hit_start, frag.hit_end, frag.hit_strand, "hit_strand"),
    };
    let strand = strand.ok_or_else(|| {
        WriteError::MissingAttribute { column: strand_name.to_string(), query: frag.query_id.clone() }
    })?;

    let is_start = matches!(column, Column::Qstart | Column::Sstart);
    let value = match (strand, is_start) {
        (Strand::Reverse, true) => end,
        (Strand::Reverse, false) => start.map(|x| x + 1),
        (Strand::Forward, true) => start.map(|x| x + 1),
        (Strand::Forward, false) => end,
    };
    Ok(value)
}

/// Format an E-value the way BLAST+ writes it in tables
pub fn format_evalue(
    evalue: f64,
) -> String {
    if evalue < 1.0e-180 {
        "0.0".to_string()
    } else if evalue < 0.0009 {
        // %2.0e and %3.0e only differ in the minimum width
        format_exp(evalue, 0)
    } else if evalue < 0.1 {
        format!("{:.3}", evalue)
    } else if evalue < 1.0 {
        format!("{:.2}", evalue)
    } else if evalue < 10.0 {
        format!("{:.1}", evalue)
    } else {
        format!("{:5.0}", evalue)
    }
}

/// Format a bit score the way BLAST+ writes it in tables
pub fn format_bitscore(
    bitscore: f64,
) -> String {
    if bitscore > 9999.0 {
        format!("{:>4}", format_exp(bitscore, 3))
    } else if bitscore > 99.9 {
        format!("{:4}", bitscore.trunc() as i64)
    } else {
        format!("{:4.1}", bitscore)
    }
}

/// Exponential notation with at least two exponent digits and a sign
pub fn format_exp(
    value: f64,
    precision: usize,
) -> String {
    let formatted = format!("{:.*e}", precision, value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        },
        None => formatted,
    }
}

fn missing(
    column: &str,
    query: &QueryResult,
) -> WriteError {
    WriteError::MissingAttribute { column: column.to_string(), query: query.id.clone() }
}
