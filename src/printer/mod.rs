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

//! Printer for outputting [QueryResult] records as plain text in any supported [Format].
//!
//! Can be used to convert any iterator over [QueryResult] data to their
//! plain text representation.
//!
//! Returns the lines of 1 query at a time using next().
//!
//! If the desired output format has header or footer lines, these can be
//! formatted by Printer using [print_header](Printer::print_header) and
//! [print_footer](Printer::print_footer). The header is also included in
//! the output of the first call to next().
//!
//! ## Usage
//!
//! ```rust
//! use searchtab::{Format, Hit, Hsp, HspFragment, QueryResult, Strand};
//! use searchtab::printer::Printer;
//! use std::io::Write;
//!
//! let fragment = HspFragment {
//!     query_start: Some(0), query_end: Some(50), query_strand: Some(Strand::Forward),
//!     hit_start: Some(200), hit_end: Some(250), hit_strand: Some(Strand::Reverse),
//!     ..Default::default()
//! };
//! let hsp = Hsp { evalue: Some(5e-18), bitscore: Some(87.4), fragment, ..Default::default() };
//! let hit = Hit { id: "s1".to_string(), query_id: "q1".to_string(), hsps: vec![hsp], ..Default::default() };
//! let data = vec![QueryResult { id: "q1".to_string(), hits: vec![hit], ..Default::default() }];
//!
//! let mut iter = data.into_iter();
//! let mut printer = Printer::new(&mut iter, Format::BlastTab, Some("qseqid sseqid qstart qend sstart send evalue bitscore")).unwrap();
//!
//! let mut output: Vec<u8> = Vec::new();
//! for bytes in printer.by_ref() {
//!     output.write_all(&bytes.unwrap()).unwrap();
//! }
//!
//! // Reverse strand coordinates are written from high to low
//! assert_eq!(output, b"q1\ts1\t1\t50\t250\t201\t5e-18\t87.4\n".to_vec());
//! assert_eq!(printer.counts(), (1, 1, 1));
//! ```
//!

// Format specific implementations
pub mod blast_tab;
pub mod hmmer_domtab;

use crate::columns::Field;
use crate::Format;
use crate::QueryResult;

type E = Box<dyn std::error::Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteError {
    /// A column needs an attribute that the record does not have.
    MissingAttribute { column: String, query: String },
}

impl std::fmt::Display for WriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            WriteError::MissingAttribute { column, query } => write!(f, "query {}: no value for column '{}'", query, column),
        }
    }
}

impl std::error::Error for WriteError {}

pub struct Printer<'a, I: Iterator> where I: Iterator<Item=QueryResult> {
    // Inputs
    records: &'a mut I,
    fields: Vec<Field>,

    index: usize,
    n_queries: usize,
    n_hits: usize,
    n_hsps: usize,

    pub format: Format,
}

impl<'a, I: Iterator> Printer<'a, I> where I: Iterator<Item=QueryResult> {
    /// Create a printer over `records`.
    ///
    /// `fields` is a space-separated list of BLAST+ columns to write. If
    /// None, the 12 default columns are written. Ignored for domain tables.
    pub fn new(
        records: &'a mut I,
        format: Format,
        fields: Option<&str>,
    ) -> Result<Self, E> {
        let fields = match fields {
            Some(fields) => crate::columns::prepare_fields(fields)?,
            None => crate::columns::default_fields(),
        };

        Ok(Printer{
            records,
            fields,
            index: 0,
            n_queries: 0, n_hits: 0, n_hsps: 0,
            format,
        })
    }

    /// Format the header lines of the output.
    ///
    /// Only domain tables have a header. Column widths are taken from
    /// `first` if it is given.
    pub fn print_header(
        &self,
        first: Option<&QueryResult>,
    ) -> Option<Vec<u8>> {
        match self.format {
            Format::BlastTab => None,
            Format::BlastTabComments => None,
            Format::HmmerDomtabHmmhit | Format::HmmerDomtabHmmquery => {
                Some(hmmer_domtab::format_header(first).into_bytes())
            },
        }
    }

    /// Format the lines that end the output.
    ///
    /// Only commented BLAST+ tables have a footer, which reports the number
    /// of queries written so far.
    pub fn print_footer(
        &self,
    ) -> Option<Vec<u8>> {
        if self.format.has_comments() {
            Some(format!("# BLAST processed {} queries\n", self.n_queries).into_bytes())
        } else {
            None
        }
    }

    /// Returns the number of queries, hits, and HSPs written so far.
    ///
    /// Queries without hits are only counted in commented BLAST+ tables
    /// since the other formats have no lines for them.
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.n_queries, self.n_hits, self.n_hsps)
    }
}

impl<I: Iterator> Iterator for Printer<'_, I> where I: Iterator<Item=QueryResult> {
    type Item = Result<Vec<u8>, E>;

    fn next(
        &mut self,
    ) -> Option<Result<Vec<u8>, E>> {
        let record = self.records.next()?;

        let mut out: Vec<u8> = Vec::new();
        if self.index == 0 {
            if let Some(mut header) = self.print_header(Some(&record)) {
                out.append(&mut header);
            }
        }

        let res = match self.format {
            Format::BlastTab => blast_tab::format_query(&record, &self.fields, false, &mut out),
            Format::BlastTabComments => blast_tab::format_query(&record, &self.fields, true, &mut out),
            Format::HmmerDomtabHmmhit => hmmer_domtab::format_query(&record, true, &mut out),
            Format::HmmerDomtabHmmquery => hmmer_domtab::format_query(&record, false, &mut out),
        };
        if let Err(e) = res {
            return Some(Err(e))
        }

        self.index += 1;
        if self.format.has_comments() || !record.hits.is_empty() {
            self.n_queries += 1;
        }
        self.n_hits += record.hits.len();
        self.n_hsps += record.hits.iter().map(|hit| hit.hsps.len()).sum::<usize>();

        Some(Ok(out))
    }
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn print_header_only_for_domtab() {
        use super::Printer;
        use crate::Format;
        use crate::QueryResult;

        let mut iter = Vec::<QueryResult>::new().into_iter();
        let printer = Printer::new(&mut iter, Format::BlastTab, None).unwrap();
        assert!(printer.print_header(None).is_none());
        assert!(printer.print_footer().is_none());

        let mut iter = Vec::<QueryResult>::new().into_iter();
        let printer = Printer::new(&mut iter, Format::HmmerDomtabHmmquery, None).unwrap();
        let header = printer.print_header(None).unwrap();
        assert_eq!(header.iter().filter(|x| **x == b'\n').count(), 3);
    }

    #[test]
    fn print_zero_hit_queries() {
        use super::Printer;
        use crate::Format;
        use crate::QueryResult;

        let data = vec![
            QueryResult { id: "q1".to_string(), program: Some("blastn".to_string()), version: Some("2.2.26+".to_string()), target: Some("nt".to_string()), ..Default::default() },
            QueryResult { id: "q2".to_string(), program: Some("blastn".to_string()), version: Some("2.2.26+".to_string()), ..Default::default() },
        ];

        let mut iter = data.clone().into_iter();
        let mut printer = Printer::new(&mut iter, Format::BlastTab, None).unwrap();
        let got: Vec<Vec<u8>> = printer.by_ref().map(|x| x.unwrap()).collect();
        assert!(got.iter().all(|x| x.is_empty()));
        assert_eq!(printer.counts(), (0, 0, 0));

        let mut iter = data.into_iter();
        let mut printer = Printer::new(&mut iter, Format::BlastTabComments, None).unwrap();
        let mut got: Vec<u8> = printer.by_ref().flat_map(|x| x.unwrap()).collect();
        got.append(&mut printer.print_footer().unwrap());

        let mut expected: Vec<u8> = b"# BLASTN 2.2.26+\n".to_vec();
        expected.append(&mut b"# Query: q1\n".to_vec());
        expected.append(&mut b"# Database: nt\n".to_vec());
        expected.append(&mut b"# 0 hits found\n".to_vec());
        expected.append(&mut b"# BLASTN 2.2.26+\n".to_vec());
        expected.append(&mut b"# Query: q2\n".to_vec());
        expected.append(&mut b"# 0 hits found\n".to_vec());
        expected.append(&mut b"# BLAST processed 2 queries\n".to_vec());

        assert_eq!(got, expected);
        assert_eq!(printer.counts(), (2, 0, 0));
    }

    #[test]
    fn print_reports_missing_attributes() {
        use super::Printer;
        use super::WriteError;
        use crate::Format;
        use crate::Hit;
        use crate::Hsp;
        use crate::QueryResult;

        let hit = Hit { id: "s1".to_string(), hsps: vec![Hsp::default()], ..Default::default() };
        let data = vec![QueryResult { id: "q1".to_string(), hits: vec![hit], ..Default::default() }];

        let mut iter = data.into_iter();
        let mut printer = Printer::new(&mut iter, Format::BlastTab, Some("qseqid sseqid evalue")).unwrap();
        let err = printer.next().unwrap().unwrap_err();

        let expected = WriteError::MissingAttribute { column: "evalue".to_string(), query: "q1".to_string() };
        assert_eq!(err.downcast_ref::<WriteError>(), Some(&expected));
    }
}
