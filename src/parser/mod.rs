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

//! Parser for reading search results from plain text into [QueryResult] records.
//!
//! The input is read one line at a time. Each line is decoded into a
//! [DecodedRow] by the format specific decoder and passed to a
//! [Grouper](grouper::Grouper), which emits a [QueryResult] once the next
//! query starts or the input ends.
//!
//! ## Usage
//!
//! ```rust
//! use searchtab::Format;
//! use searchtab::parser::Parser;
//! use std::io::Cursor;
//!
//! let mut data: Vec<u8> = b"# BLASTN 2.2.26+\n".to_vec();
//! data.append(&mut b"# Query: q1 first query\n".to_vec());
//! data.append(&mut b"# Database: db/nt\n".to_vec());
//! data.append(&mut b"# Fields: query id, subject id, evalue\n".to_vec());
//! data.append(&mut b"# 2 hits found\n".to_vec());
//! data.append(&mut b"q1\ts1\t1e-10\n".to_vec());
//! data.append(&mut b"q1\ts2\t2e-05\n".to_vec());
//! data.append(&mut b"# BLASTN 2.2.26+\n".to_vec());
//! data.append(&mut b"# Query: q2\n".to_vec());
//! data.append(&mut b"# Database: db/nt\n".to_vec());
//! data.append(&mut b"# 0 hits found\n".to_vec());
//! data.append(&mut b"# BLAST processed 2 queries\n".to_vec());
//!
//! let mut cursor = Cursor::new(data);
//! let mut parser = Parser::new(&mut cursor, Format::BlastTabComments, None).unwrap();
//!
//! let first = parser.next().unwrap().unwrap();
//! assert_eq!(first.id, "q1");
//! assert_eq!(first.description, Some("first query".to_string()));
//! assert_eq!(first.program, Some("blastn".to_string()));
//! assert_eq!(first.hits.len(), 2);
//!
//! // Queries without hits are still returned
//! let second = parser.next().unwrap().unwrap();
//! assert_eq!(second.id, "q2");
//! assert!(second.hits.is_empty());
//!
//! assert!(parser.next().is_none());
//! ```
//!

// Format specific implementations
pub mod blast_tab;
pub mod grouper;
pub mod hmmer_domtab;

use crate::columns::Field;
use crate::Format;
use crate::Hit;
use crate::Hsp;
use crate::QueryResult;

use crate::parser::blast_tab::CommentBlock;
use crate::parser::blast_tab::CommentLine;
use crate::parser::grouper::Grouper;

use std::borrow::Cow;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;

use bstr::ByteSlice;

type E = Box<dyn std::error::Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    /// Number of values on a line does not match the columns.
    ColumnCount { line: usize, expected: usize, found: usize },
    /// Only one of the start and end coordinates is present.
    PartialCoordinates { line: usize, seq_type: &'static str },
    /// Value could not be cast into the column type.
    Value { line: usize, column: String, value: String },
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            RowError::ColumnCount { line, expected, found } => write!(f, "line {}: expected {} columns, found {}", line, expected, found),
            RowError::PartialCoordinates { line, seq_type } => write!(f, "line {}: both start and end coordinates are required for the {}", line, seq_type),
            RowError::Value { line, column, value } => write!(f, "line {}: invalid value '{}' in column '{}'", line, value, column),
        }
    }
}

impl std::error::Error for RowError {}

/// Fragment attributes as they appear on a line.
///
/// Coordinates are 1-based and in the input order; `frames` holds the
/// combined `query/hit` frame column.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawFragment {
    pub aln_span: Option<u64>,
    pub query_start: Option<u64>,
    pub query_end: Option<u64>,
    pub hit_start: Option<u64>,
    pub hit_end: Option<u64>,
    pub query_frame: Option<i8>,
    pub hit_frame: Option<i8>,
    pub frames: Option<String>,
    pub query: Option<String>,
    pub hit: Option<String>,
}

/// One line decoded into the four record levels.
///
/// `query.hits` and `hit.hsps` are always empty, and `hsp.fragment` is
/// filled from `frag` when the row is grouped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecodedRow {
    pub line: usize,
    pub query: QueryResult,
    pub hit: Hit,
    pub hsp: Hsp,
    pub frag: RawFragment,
}

impl DecodedRow {
    /// Fill the query and hit ids from the accession columns if the id
    /// columns were not present.
    pub fn resolve_keys(&mut self) {
        if self.query.id.is_empty() {
            self.query.id = first_present(&self.query.acc, &self.query.acc_ver);
        }
        if self.hit.id.is_empty() {
            self.hit.id = first_present(&self.hit.acc, &self.hit.acc_ver);
        }
        self.hit.query_id = self.query.id.clone();
    }

    /// Returns the query and hit keys.
    pub fn keys(&self) -> (&str, &str) {
        (&self.query.id, &self.hit.id)
    }
}

fn first_present(
    acc: &Option<String>,
    acc_ver: &Option<String>,
) -> String {
    acc.iter().chain(acc_ver.iter())
        .find(|x| !x.is_empty())
        .cloned()
        .unwrap_or_default()
}

// Line reader with one line of lookahead
struct Lines<'a, R: Read> {
    reader: BufReader<&'a mut R>,
    buf: Vec<u8>,
    line_no: usize,
}

impl<R: Read> Lines<'_, R> {
    // Returns false at the end of input
    fn fill_buf(
        &mut self,
    ) -> Result<bool, E> {
        if self.buf.is_empty() {
            if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
                return Ok(false)
            }
            self.line_no += 1;
        }
        Ok(true)
    }

    // Invalid UTF-8 is replaced with U+FFFD
    fn current(&self) -> Cow<'_, str> {
        self.buf.trim_end_with(|c| c == '\n' || c == '\r').to_str_lossy()
    }

    fn consume(&mut self) {
        self.buf.clear();
    }

    /// Decode the next data line.
    ///
    /// Returns None at the end of input. Blank lines are skipped. For BLAST
    /// tables a comment line also ends the rows and is left unconsumed,
    /// while domain tables skip it.
    fn next_row(
        &mut self,
        format: Format,
        fields: &[Field],
    ) -> Result<Option<DecodedRow>, E> {
        loop {
            if !self.fill_buf()? {
                return Ok(None)
            }
            let line = self.current();
            if line.trim().is_empty() {
                self.consume();
                continue
            }
            if line.starts_with('#') {
                if format.is_domtab() {
                    self.consume();
                    continue
                }
                return Ok(None)
            }

            let row = match format {
                Format::HmmerDomtabHmmhit => hmmer_domtab::decode_row(&line, self.line_no, true)?,
                Format::HmmerDomtabHmmquery => hmmer_domtab::decode_row(&line, self.line_no, false)?,
                _ => blast_tab::decode_row(&line, self.line_no, fields)?,
            };
            self.consume();
            return Ok(Some(row))
        }
    }

    /// Read the comment block preceding the rows of one query.
    ///
    /// Returns None if the input ends or the block is the final `# BLAST
    /// processed` line.
    fn read_comment_block(
        &mut self,
    ) -> Result<Option<CommentBlock>, E> {
        let mut block = CommentBlock::default();
        let mut has_content = false;
        loop {
            if !self.fill_buf()? {
                return Ok(if has_content { Some(block) } else { None })
            }
            let line = self.current();
            if line.trim().is_empty() {
                self.consume();
                continue
            }
            if !line.starts_with('#') {
                // Rows without a closing `# N hits found`
                return Ok(Some(block))
            }

            let parsed = blast_tab::parse_comment_line(&line)?;
            self.consume();
            match parsed {
                CommentLine::End => {
                    return Ok(if has_content { Some(block) } else { None })
                },
                CommentLine::Other => (),
                _ => {
                    block.update(parsed);
                    has_content = true;
                },
            }
        }
    }
}

/// Iterator over the [QueryResult] records in a [Read].
pub struct Parser<'a, R: Read> {
    lines: Lines<'a, R>,
    pub format: Format,

    fields: Vec<Field>,
    block: Option<CommentBlock>,
    block_rows: usize,

    grouper: Grouper,
    finished: bool,
}

impl<'a, R: Read> Parser<'a, R> {
    /// Create a parser over `conn`.
    ///
    /// `fields` is a space-separated list of BLAST+ column names describing
    /// the rows of a BLAST table. If None, the 12 default columns are used.
    /// Commented BLAST tables replace the columns with the ones in their
    /// `# Fields:` lines and domain tables have a fixed layout.
    ///
    /// Fails if `fields` contains unknown columns or no query or hit key
    /// column.
    pub fn new(
        conn: &'a mut R,
        format: Format,
        fields: Option<&str>,
    ) -> Result<Self, E> {
        let fields = match fields {
            Some(fields) => crate::columns::prepare_fields(fields)?,
            None => crate::columns::default_fields(),
        };

        Ok(Self {
            lines: Lines { reader: BufReader::new(conn), buf: Vec::new(), line_no: 0 },
            format,
            fields,
            block: None,
            block_rows: 0,
            grouper: Grouper::default(),
            finished: false,
        })
    }

    /// Number of lines consumed so far.
    pub fn line_number(&self) -> usize {
        self.lines.line_no
    }

    fn next_query(
        &mut self,
    ) -> Result<Option<QueryResult>, E> {
        loop {
            if self.format.has_comments() && self.block.is_none() {
                match self.lines.read_comment_block()? {
                    Some(block) => {
                        log::debug!("Read comment block for query {:?}", block.query_id);
                        self.block = Some(block);
                        self.block_rows = 0;
                    },
                    None => return Ok(None),
                }
            }

            let fields: &[Field] = match &self.block {
                Some(CommentBlock { fields: Some(fields), .. }) => fields,
                _ => &self.fields,
            };
            let row = self.lines.next_row(self.format, fields)?;
            let at_end = row.is_none();
            if !at_end {
                self.block_rows += 1;
            }

            if let Some(mut query) = self.grouper.push(row)? {
                if let Some(block) = &self.block {
                    block.apply(&mut query);
                }
                log::debug!("Parsed query {} with {} hits", query.id, query.hits.len());
                return Ok(Some(query))
            }

            if at_end {
                match self.block.take() {
                    Some(block) => {
                        if self.block_rows == 0 {
                            let mut query = QueryResult::default();
                            block.apply(&mut query);
                            log::debug!("Parsed query {} with 0 hits", query.id);
                            return Ok(Some(query))
                        }
                    },
                    None => return Ok(None),
                }
            }
        }
    }
}

impl<R: Read> Iterator for Parser<'_, R> {
    type Item = Result<QueryResult, E>;

    fn next(
        &mut self,
    ) -> Option<Result<QueryResult, E>> {
        if self.finished {
            return None
        }
        match self.next_query() {
            Ok(Some(query)) => Some(Ok(query)),
            Ok(None) => {
                self.finished = true;
                None
            },
            Err(e) => {
                // The grouping state is no longer in sync with the input
                self.finished = true;
                Some(Err(e))
            },
        }
    }
}
