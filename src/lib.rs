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

//! searchtab is a library and a command-line client for:
//!
//!   - Parsing tabular sequence search results into a query → hit → HSP hierarchy.
//!   - Writing the hierarchy back out in the native text layout of the search tool.
//!   - Building byte-offset indexes to fetch the records of a single query by name.
//!
//! The following plain text formats are supported:
//!   - [BLAST+](https://blast.ncbi.nlm.nih.gov/) tabular output without comments (`-outfmt 6`).
//!   - BLAST+ tabular output with comment blocks (`-outfmt 7`).
//!   - [HMMER3](http://hmmer.org/) per-domain tables (`--domtblout`), with the
//!     profile HMM either as the hit (hmmscan) or as the query (hmmsearch).
//!
//! Every line of these formats describes one alignment (an [Hsp] with a
//! single [HspFragment]). Consecutive lines with the same query name belong
//! to the same [QueryResult] and consecutive lines with the same subject name
//! within a query belong to the same [Hit].
//!
//! ## Usage
//!
//! ### Command line
//!
//! The searchtab CLI supports the following subcommands:
//!   - `searchtab convert` convert between supported formats or column layouts.
//!   - `searchtab index` build a byte-offset index of the queries in a file.
//!   - `searchtab fetch` print the raw records of some queries using an index.
//!
//! ### Rust API
//!
//! The API provides several functions for operating on structs that implement
//! [Read] and/or [Write]. These are meant for use cases where an entire stream
//! should be processed.
//!
//! For use cases requiring access to a single record at a time, the following
//! structs are provided:
//!
//!   - [Parser](parser::Parser): takes a [Read] containing search results and yields one [QueryResult] at a time.
//!   - [Printer](printer::Printer): takes an iterator over [QueryResult] records and formats them into plain text data.
//!   - [Indexer](index::Indexer): scans a [Read] + [Seek](std::io::Seek) for the byte ranges of each query.
//!
//! ```rust
//! use searchtab::{parse_from_read, write_to_write, Format};
//! use std::io::Cursor;
//!
//! let mut input: Vec<u8> = Vec::new();
//! input.append(&mut b"q1\ts1\t100.00\t50\t0\t0\t1\t50\t101\t150\t2e-20\t95.1\n".to_vec());
//! input.append(&mut b"q1\ts1\t98.00\t50\t1\t0\t61\t110\t250\t201\t5e-18\t87.4\n".to_vec());
//! input.append(&mut b"q1\ts2\t90.00\t40\t4\t0\t1\t40\t1\t40\t1e-10\t61.2\n".to_vec());
//! input.append(&mut b"q2\ts1\t85.00\t20\t3\t0\t5\t24\t30\t49\t0.003\t30.0\n".to_vec());
//!
//! let queries = parse_from_read(Format::BlastTab, None, &mut Cursor::new(input.clone())).unwrap();
//!
//! assert_eq!(queries.len(), 2);
//! assert_eq!(queries[0].hits.len(), 2);
//! assert_eq!(queries[0].hits[0].hsps.len(), 2);
//!
//! // The second HSP of the first hit is on the reverse strand of the subject
//! let frag = &queries[0].hits[0].hsps[1].fragment;
//! assert_eq!(frag.hit_start, Some(200));
//! assert_eq!(frag.hit_end, Some(250));
//! assert_eq!(frag.hit_strand, Some(searchtab::Strand::Reverse));
//!
//! // Writing the records gives back the input
//! let mut output: Vec<u8> = Vec::new();
//! let counts = write_to_write(Format::BlastTab, None, &queries, &mut output).unwrap();
//!
//! assert_eq!(counts, (2, 3, 4));
//! assert_eq!(output, input);
//! ```
//!

use std::io::Read;
use std::io::Write;

pub mod columns;
pub mod index;
pub mod parser;
pub mod printer;

type E = Box<dyn std::error::Error>;

/// Supported plain text formats.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    /// BLAST+ tabular, `-outfmt 6`.
    #[default]
    BlastTab,
    /// BLAST+ tabular with comment blocks, `-outfmt 7`.
    BlastTabComments,
    /// HMMER3 domain table with the profile HMM as the hit (hmmscan).
    HmmerDomtabHmmhit,
    /// HMMER3 domain table with the profile HMM as the query (hmmsearch).
    HmmerDomtabHmmquery,
}

impl Format {
    /// Returns true if the format carries `#` comment blocks with metadata.
    pub fn has_comments(&self) -> bool {
        *self == Format::BlastTabComments
    }

    /// Returns true if the format is a HMMER domain table.
    pub fn is_domtab(&self) -> bool {
        matches!(self, Format::HmmerDomtabHmmhit | Format::HmmerDomtabHmmquery)
    }
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blast-tab" => Ok(Format::BlastTab),
            "blast-tabc" => Ok(Format::BlastTabComments),
            "hmmer3-domtab" | "hmmer3-domtab-hmmhit" => Ok(Format::HmmerDomtabHmmhit),
            "hmmer3-domtab-hmmquery" => Ok(Format::HmmerDomtabHmmquery),
            _ => Err(format!("'{}' is not a valid Format", s)),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            Format::BlastTab => "blast-tab",
            Format::BlastTabComments => "blast-tabc",
            Format::HmmerDomtabHmmhit => "hmmer3-domtab-hmmhit",
            Format::HmmerDomtabHmmquery => "hmmer3-domtab-hmmquery",
        };
        write!(f, "{}", name)
    }
}

/// Direction of an alignment relative to the original sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    /// Infers the strand from 1-based coordinates as they appear in the file.
    ///
    /// Coordinates listed from high to low are on the reverse strand.
    pub fn from_raw_coordinates(
        start: u64,
        end: u64,
    ) -> Self {
        if start <= end { Strand::Forward } else { Strand::Reverse }
    }

    pub fn as_i8(&self) -> i8 {
        match self {
            Strand::Forward => 1,
            Strand::Reverse => -1,
        }
    }
}

/// Search results for one query sequence.
///
/// `id` always holds the key used to group rows: the query identifier, or
/// its accession or accession.version if the identifier column is absent.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryResult {
    pub id: String,
    pub acc: Option<String>,
    pub acc_ver: Option<String>,
    pub gi: Option<String>,
    pub seq_len: Option<u64>,
    pub description: Option<String>,
    /// Name of the search program, lowercase (eg. `blastn`).
    pub program: Option<String>,
    pub version: Option<String>,
    /// Name of the searched database.
    pub target: Option<String>,
    /// Request id of a remote search.
    pub rid: Option<String>,
    /// Hits in the order they first appear in the input.
    pub hits: Vec<Hit>,
}

/// A target sequence matched by the query.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Hit {
    pub id: String,
    pub query_id: String,
    pub id_all: Option<String>,
    pub acc: Option<String>,
    pub acc_ver: Option<String>,
    pub gi: Option<String>,
    pub gi_all: Option<String>,
    pub seq_len: Option<u64>,
    pub description: Option<String>,
    /// Full sequence E-value (domain tables only).
    pub evalue: Option<f64>,
    /// Full sequence bit score (domain tables only).
    pub bitscore: Option<f64>,
    /// Full sequence composition bias (domain tables only).
    pub bias: Option<f64>,
    pub hsps: Vec<Hsp>,
}

/// A scored alignment between the query and a hit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Hsp {
    pub bitscore: Option<f64>,
    pub bitscore_raw: Option<i64>,
    pub evalue: Option<f64>,
    pub ident_num: Option<u64>,
    pub ident_pct: Option<f64>,
    pub pos_num: Option<u64>,
    pub pos_pct: Option<f64>,
    pub mismatch_num: Option<u64>,
    pub gap_num: Option<u64>,
    pub gapopen_num: Option<u64>,
    pub btop: Option<String>,
    /// Index of the domain within the hit (domain tables only).
    pub domain_index: Option<u64>,
    /// Conditional E-value (domain tables only).
    pub evalue_cond: Option<f64>,
    pub bias: Option<f64>,
    /// Envelope start, 0-based.
    pub env_start: Option<u64>,
    pub env_end: Option<u64>,
    /// Mean posterior probability of the aligned residues.
    pub acc_avg: Option<f64>,
    pub fragment: HspFragment,
}

/// Coordinates and aligned sequences of one [Hsp].
///
/// Coordinates are 0-based and half-open with `start <= end`. The order in
/// which they appeared in the input is recorded in the strand.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HspFragment {
    pub query_id: String,
    pub hit_id: String,
    pub aln_span: Option<u64>,
    pub query_start: Option<u64>,
    pub query_end: Option<u64>,
    pub hit_start: Option<u64>,
    pub hit_end: Option<u64>,
    pub query_frame: Option<i8>,
    pub hit_frame: Option<i8>,
    pub query_strand: Option<Strand>,
    pub hit_strand: Option<Strand>,
    /// Aligned query sequence.
    pub query: Option<String>,
    /// Aligned hit sequence.
    pub hit: Option<String>,
}

/// Parse all records from [Read] into memory.
///
/// `fields` is a space-separated list of BLAST+ column names describing the
/// input (defaults to the 12 standard columns). It is ignored for formats
/// that declare their own columns.
///
/// ## Usage
///
/// ```rust
/// use searchtab::{parse_from_read, Format};
/// use std::io::Cursor;
///
/// let data = b"q1\ts1\t1e-10\t21\t30\t4\t13\nq1\ts2\t5e-04\t1\t10\t1\t10\n".to_vec();
/// let queries = parse_from_read(Format::BlastTab, Some("qseqid sseqid evalue qstart qend sstart send"), &mut Cursor::new(data)).unwrap();
///
/// assert_eq!(queries.len(), 1);
/// assert_eq!(queries[0].hits[0].hsps[0].evalue, Some(1e-10));
/// assert_eq!(queries[0].hits[1].hsps[0].fragment.query_start, Some(0));
/// ```
///
pub fn parse_from_read<R: Read>(
    format: Format,
    fields: Option<&str>,
    conn_in: &mut R,
) -> Result<Vec<QueryResult>, E> {
    let parser = crate::parser::Parser::new(conn_in, format, fields)?;
    parser.collect::<Result<Vec<QueryResult>, E>>()
}

/// Write records from memory to [Write].
///
/// Returns the number of queries, hits, and HSPs written.
///
pub fn write_to_write<W: Write>(
    format: Format,
    fields: Option<&str>,
    records: &[QueryResult],
    conn_out: &mut W,
) -> Result<(usize, usize, usize), E> {
    let mut records_iter = records.iter().cloned();
    let mut printer = crate::printer::Printer::new(&mut records_iter, format, fields)?;
    print_all(&mut printer, conn_out)?;
    if let Some(footer) = printer.print_footer() {
        conn_out.write_all(&footer)?;
    }
    Ok(printer.counts())
}

/// Convert search results from [Read] to another format or column layout in [Write].
///
/// Records are streamed one query at a time. Returns the number of queries,
/// hits, and HSPs written.
///
/// ## Usage
///
/// ```rust
/// use searchtab::{convert_from_read_to_write, Format};
/// use std::io::Cursor;
///
/// let data = b"q1\ts1\t100.00\t50\t0\t0\t1\t50\t101\t150\t2e-20\t95.1\n".to_vec();
///
/// let mut output: Vec<u8> = Vec::new();
/// convert_from_read_to_write(Format::BlastTab, None, Format::BlastTab, Some("sseqid qseqid sstart send"), &mut Cursor::new(data), &mut output).unwrap();
///
/// assert_eq!(output, b"s1\tq1\t101\t150\n".to_vec());
/// ```
///
pub fn convert_from_read_to_write<R: Read, W: Write>(
    in_format: Format,
    in_fields: Option<&str>,
    out_format: Format,
    out_fields: Option<&str>,
    conn_in: &mut R,
    conn_out: &mut W,
) -> Result<(usize, usize, usize), E> {
    let mut parser = crate::parser::Parser::new(conn_in, in_format, in_fields)?;

    let mut parse_error: Option<E> = None;
    let (counts, footer) = {
        let mut records = parser.by_ref().map_while(|record| match record {
            Ok(record) => Some(record),
            Err(e) => {
                parse_error = Some(e);
                None
            },
        });
        let mut printer = crate::printer::Printer::new(&mut records, out_format, out_fields)?;
        print_all(&mut printer, conn_out)?;
        (printer.counts(), printer.print_footer())
    };

    // No summary line after a parse error
    if let Some(e) = parse_error {
        return Err(e)
    }
    if let Some(footer) = footer {
        conn_out.write_all(&footer)?;
    }
    conn_out.flush()?;
    Ok(counts)
}

fn print_all<I: Iterator<Item = QueryResult>, W: Write>(
    printer: &mut crate::printer::Printer<'_, I>,
    conn_out: &mut W,
) -> Result<(), E> {
    let mut n_records = 0;
    for bytes in printer.by_ref() {
        conn_out.write_all(&bytes?)?;
        n_records += 1;
    }
    if n_records == 0 {
        if let Some(header) = printer.print_header(None) {
            conn_out.write_all(&header)?;
        }
    }
    Ok(())
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn format_from_str() {
        use crate::Format;
        use std::str::FromStr;

        assert_eq!(Format::from_str("blast-tab").unwrap(), Format::BlastTab);
        assert_eq!(Format::from_str("blast-tabc").unwrap(), Format::BlastTabComments);
        assert_eq!(Format::from_str("hmmer3-domtab").unwrap(), Format::HmmerDomtabHmmhit);
        assert_eq!(Format::from_str("hmmer3-domtab-hmmquery").unwrap(), Format::HmmerDomtabHmmquery);
        assert!(Format::from_str("blast-xml").is_err());
    }

    #[test]
    fn format_display_roundtrips() {
        use crate::Format;
        use std::str::FromStr;

        for format in [Format::BlastTab, Format::BlastTabComments, Format::HmmerDomtabHmmhit, Format::HmmerDomtabHmmquery] {
            assert_eq!(Format::from_str(&format.to_string()).unwrap(), format);
        }
    }

    #[test]
    fn strand_from_raw_coordinates() {
        use crate::Strand;

        assert_eq!(Strand::from_raw_coordinates(1, 50), Strand::Forward);
        assert_eq!(Strand::from_raw_coordinates(7, 7), Strand::Forward);
        assert_eq!(Strand::from_raw_coordinates(250, 201), Strand::Reverse);
        assert_eq!(Strand::Reverse.as_i8(), -1);
    }

    #[test]
    fn parse_write_parse_blast_tab_comments() {
        use super::parse_from_read;
        use super::write_to_write;
        use crate::Format;
        use std::io::Cursor;

        let mut data: Vec<u8> = b"# TBLASTN 2.2.26+\n".to_vec();
        data.append(&mut b"# Query: gi|16080617|ref|NP_391444.1| membrane bound lipoprotein [Bacillus subtilis]\n".to_vec());
        data.append(&mut b"# Database: db/minirefseq_mrna\n".to_vec());
        data.append(&mut b"# Fields: query id, subject id, query/sbjct frames, q. start, q. end, s. start, s. end, evalue, bit score\n".to_vec());
        data.append(&mut b"# 2 hits found\n".to_vec());
        data.append(&mut b"gi|16080617|ref|NP_391444.1|\tgi|145479850|ref|XM_001425911.1|\t0/1\t31\t73\t1744\t1872\t1e-05\t34.7\n".to_vec());
        data.append(&mut b"gi|16080617|ref|NP_391444.1|\tgi|72012412|ref|XM_777959.1|\t0/-3\t29\t70\t1163\t1038\t1e-04\t31.6\n".to_vec());
        data.append(&mut b"# TBLASTN 2.2.26+\n".to_vec());
        data.append(&mut b"# Query: gi|11464971:4-101 pleckstrin [Mus musculus]\n".to_vec());
        data.append(&mut b"# Database: db/minirefseq_mrna\n".to_vec());
        data.append(&mut b"# 0 hits found\n".to_vec());
        data.append(&mut b"# BLAST processed 2 queries\n".to_vec());

        let first = parse_from_read(Format::BlastTabComments, None, &mut Cursor::new(data.clone())).unwrap();

        let mut written: Vec<u8> = Vec::new();
        let counts = write_to_write(Format::BlastTabComments, Some("qseqid sseqid frames qstart qend sstart send evalue bitscore"), &first, &mut written).unwrap();
        let second = parse_from_read(Format::BlastTabComments, None, &mut Cursor::new(written.clone())).unwrap();

        assert_eq!(counts, (2, 2, 2));
        assert_eq!(first, second);
        assert_eq!(written, data);
    }

    #[test]
    fn parse_write_parse_domtab() {
        use super::parse_from_read;
        use super::write_to_write;
        use crate::Format;
        use std::io::Cursor;

        let mut data: Vec<u8> = b"# comment lines are skipped\n".to_vec();
        data.append(&mut b"Pkinase              PF00069.17   260 gi|22748937|ref|NP_065801.1| -           1107  4.1e-79  263.6   0.0   1   1   7.1e-82  5.3e-79  263.2   0.0     1   260   492   744   492   744 0.96 Protein kinase domain\n".to_vec());
        data.append(&mut b"Pkinase_Tyr          PF07714.12   259 gi|22748937|ref|NP_065801.1| -           1107  3.3e-40  136.4   0.0   1   1   6.6e-43  4.9e-40  135.8   0.0     3   255   496   739   494   741 0.88 Protein tyrosine kinase\n".to_vec());
        data.append(&mut b"Ion_trans            PF00520.26   201 gi|4885477|ref|NP_005359.1| -            1015    2e-08   33.3  14.2   1   2   4.3e-05     0.16   11.2   0.2   123   199   134   214   121   216 0.77 Ion transport protein\n".to_vec());
        data.append(&mut b"Ion_trans            PF00520.26   201 gi|4885477|ref|NP_005359.1| -            1015    2e-08   33.3  14.2   2   2   2.6e-09  1.9e-05   24.9   1.9     1   198   338   528   338   531 0.83 Ion transport protein\n".to_vec());

        for format in [Format::HmmerDomtabHmmhit, Format::HmmerDomtabHmmquery] {
            let first = parse_from_read(format, None, &mut Cursor::new(data.clone())).unwrap();
            let mut written: Vec<u8> = Vec::new();
            let counts = write_to_write(format, None, &first, &mut written).unwrap();
            let second = parse_from_read(format, None, &mut Cursor::new(written)).unwrap();

            assert_eq!(counts, (2, 3, 4));
            assert_eq!(first, second);
        }
    }

    #[test]
    fn convert_blast_tab_to_domtab_fails_on_missing_attributes() {
        use super::convert_from_read_to_write;
        use crate::Format;
        use std::io::Cursor;

        let data = b"q1\ts1\t100.00\t50\t0\t0\t1\t50\t101\t150\t2e-20\t95.1\n".to_vec();
        let mut output: Vec<u8> = Vec::new();
        let got = convert_from_read_to_write(Format::BlastTab, None, Format::HmmerDomtabHmmhit, None, &mut Cursor::new(data), &mut output);

        assert!(got.is_err());
    }

    #[test]
    fn convert_propagates_parse_errors() {
        use super::convert_from_read_to_write;
        use crate::Format;
        use crate::parser::RowError;
        use std::io::Cursor;

        let mut data = b"q1\ts1\t100.00\t50\t0\t0\t1\t50\t101\t150\t2e-20\t95.1\n".to_vec();
        data.append(&mut b"q2\ts1\t100.00\t50\n".to_vec());

        let mut output: Vec<u8> = Vec::new();
        let got = convert_from_read_to_write(Format::BlastTab, None, Format::BlastTab, None, &mut Cursor::new(data), &mut output);

        let err = got.unwrap_err();
        assert!(matches!(err.downcast_ref::<RowError>(), Some(RowError::ColumnCount { line: 2, expected: 12, found: 4 })));
    }

    #[test]
    fn convert_with_parse_error_writes_no_summary_line() {
        use super::convert_from_read_to_write;
        use crate::Format;
        use std::io::Cursor;

        let mut data = b"q1\ts1\t100.00\t50\t0\t0\t1\t50\t101\t150\t2e-20\t95.1\n".to_vec();
        data.append(&mut b"q2\ts1\t100.00\t50\n".to_vec());

        let mut output: Vec<u8> = Vec::new();
        let got = convert_from_read_to_write(Format::BlastTab, None, Format::BlastTabComments, None, &mut Cursor::new(data), &mut output);

        assert!(got.is_err());
        assert!(!String::from_utf8_lossy(&output).contains("# BLAST processed"));
    }
}
