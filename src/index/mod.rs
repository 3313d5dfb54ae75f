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

//! Byte-offset index over the queries in a file.
//!
//! The [Indexer] scans a file once without decoding any rows and records
//! the key, start offset, and length in bytes of each block of lines that
//! belongs to one query. A [SearchIndex] collects these entries for lookup
//! by key and can be written to disk with bincode.
//!
//! The raw lines of a block can be read back with [get_raw] using only the
//! start offset.
//!
//! ## Usage
//!
//! ```rust
//! use searchtab::{parse_from_read, Format};
//! use searchtab::index::{build_index, get_raw};
//! use std::io::Cursor;
//!
//! let mut data: Vec<u8> = Vec::new();
//! data.append(&mut b"q1\ts1\t100.00\t50\t0\t0\t1\t50\t101\t150\t2e-20\t95.1\n".to_vec());
//! data.append(&mut b"q2\ts1\t85.00\t20\t3\t0\t5\t24\t30\t49\t0.003\t30.0\n".to_vec());
//! data.append(&mut b"q2\ts3\t81.00\t21\t4\t0\t5\t25\t30\t50\t0.008\t28.3\n".to_vec());
//!
//! let mut conn = Cursor::new(data);
//! let index = build_index(&mut conn, Format::BlastTab, None).unwrap();
//!
//! assert_eq!(index.get("q2"), vec![(44, 82)]);
//!
//! let raw = get_raw(&mut conn, &index, 44).unwrap();
//! let queries = parse_from_read(Format::BlastTab, None, &mut raw.as_slice()).unwrap();
//!
//! assert_eq!(queries.len(), 1);
//! assert_eq!(queries[0].id, "q2");
//! assert_eq!(queries[0].hits.len(), 2);
//! ```
//!

pub mod file;

use std::io::BufRead;
use std::io::Seek;
use std::io::SeekFrom;

use bincode::{Encode, Decode};
use bstr::ByteSlice;
use indexmap::map::IndexMap;

use crate::columns::DOMTAB_QUERY_KEY_INDEX;
use crate::Format;

type E = Box<dyn std::error::Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// The columns have no query identifier to index on.
    MissingKeyColumn,
    /// The file does not start with the index magic bytes.
    InvalidMagic,
    /// The format stored in an index file is not known.
    UnknownFormat(String),
}

impl std::fmt::Display for IndexError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            IndexError::MissingKeyColumn => write!(f, "no query key column (qseqid, qacc, or qaccver) to index on"),
            IndexError::InvalidMagic => write!(f, "not a searchtab index file"),
            IndexError::UnknownFormat(format) => write!(f, "index was built for an unknown format '{}'", format),
        }
    }
}

impl std::error::Error for IndexError {}

/// Location of one block of lines in the indexed file.
#[derive(Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub key: String,
    pub offset: u64,
    pub length: u64,
}

/// Finds the blocks of lines belonging to each query.
///
/// Tables without comments are split wherever the query key column
/// changes. Commented BLAST+ tables are split on the first line of each
/// comment block and on the final `# BLAST processed` line.
///
pub struct Indexer {
    pub format: Format,
    key_idx: usize,
}

impl Indexer {
    /// Create an indexer for `format`.
    ///
    /// `fields` is a space-separated list of BLAST+ columns in the file.
    /// Only used to locate the query key column of plain BLAST+ tables.
    pub fn new(
        format: Format,
        fields: Option<&str>,
    ) -> Result<Self, E> {
        let key_idx = match format {
            Format::BlastTab => {
                let fields = match fields {
                    Some(fields) => crate::columns::prepare_fields(fields)?,
                    None => crate::columns::default_fields(),
                };
                crate::columns::query_key_index(&fields).ok_or(IndexError::MissingKeyColumn)?
            },
            Format::BlastTabComments => 0,
            Format::HmmerDomtabHmmhit | Format::HmmerDomtabHmmquery => DOMTAB_QUERY_KEY_INDEX,
        };
        Ok(Indexer{ format, key_idx })
    }

    /// Returns the query key of a line in a table without comments.
    ///
    /// Comment lines, blank lines, and lines without a key column have the
    /// empty key and never belong to a block.
    pub fn key_of<'b>(
        &self,
        line: &'b [u8],
    ) -> &'b [u8] {
        let line = trim_newline(line);
        if line.is_empty() || line.starts_with(b"#") {
            return b""
        }
        let key = if self.format.is_domtab() {
            line.fields().nth(self.key_idx)
        } else {
            line.split_str("\t").nth(self.key_idx)
        };
        key.unwrap_or(b"")
    }

    /// Scan `conn` from its current position and return the blocks in file order.
    pub fn index<R: BufRead + Seek>(
        &self,
        conn: &mut R,
    ) -> Result<Vec<IndexEntry>, E> {
        if self.format.has_comments() {
            self.index_commented(conn)
        } else {
            self.index_plain(conn)
        }
    }

    fn index_plain<R: BufRead + Seek>(
        &self,
        conn: &mut R,
    ) -> Result<Vec<IndexEntry>, E> {
        let mut entries: Vec<IndexEntry> = Vec::new();
        let mut current: Option<(Vec<u8>, u64)> = None;

        let mut offset = conn.stream_position()?;
        let mut buf: Vec<u8> = Vec::new();
        loop {
            buf.clear();
            let n = conn.read_until(b'\n', &mut buf)?;
            // EOF has the empty key
            let key = if n == 0 { b"".as_slice() } else { self.key_of(&buf) };

            if matches!(&current, Some((cur_key, _)) if cur_key.as_slice() != key) {
                if let Some((cur_key, start)) = current.take() {
                    entries.push(IndexEntry{ key: cur_key.to_str_lossy().into_owned(), offset: start, length: offset - start });
                }
            }
            if current.is_none() && !key.is_empty() {
                current = Some((key.to_vec(), offset));
            }

            if n == 0 {
                break
            }
            offset += n as u64;
        }

        Ok(entries)
    }

    fn index_commented<R: BufRead + Seek>(
        &self,
        conn: &mut R,
    ) -> Result<Vec<IndexEntry>, E> {
        let mut entries: Vec<IndexEntry> = Vec::new();
        let mut marker: Option<Vec<u8>> = None;
        let mut key: Option<Vec<u8>> = None;

        let mut start = conn.stream_position()?;
        let mut offset = start;
        let mut buf: Vec<u8> = Vec::new();
        loop {
            buf.clear();
            let n = conn.read_until(b'\n', &mut buf)?;
            if n == 0 {
                break
            }
            let line = trim_newline(&buf);

            let is_boundary = match &marker {
                Some(mark) => mark.as_slice() == line || line.contains_str("BLAST processed"),
                None => false,
            };

            if marker.is_none() {
                marker = Some(line.to_vec());
                start = offset;
            } else if is_boundary {
                if let Some(key) = key.take() {
                    entries.push(IndexEntry{ key: key.to_str_lossy().into_owned(), offset: start, length: offset - start });
                }
                start = offset;
            } else if let Some(rest) = line.strip_prefix(b"# Query: ") {
                key = rest.fields().next().map(|x| x.to_vec());
            }
            offset += n as u64;
        }

        // Last block of a file without the summary line
        if let Some(key) = key.take() {
            entries.push(IndexEntry{ key: key.to_str_lossy().into_owned(), offset: start, length: offset - start });
        }

        Ok(entries)
    }

    /// Read the block of lines starting at `offset`.
    ///
    /// Uses the same boundaries as [index](Indexer::index) so the returned
    /// bytes equal the indexed span.
    pub fn get_raw<R: BufRead + Seek>(
        &self,
        conn: &mut R,
        offset: u64,
    ) -> Result<Vec<u8>, E> {
        conn.seek(SeekFrom::Start(offset))?;

        let mut raw: Vec<u8> = Vec::new();
        let mut buf: Vec<u8> = Vec::new();
        if conn.read_until(b'\n', &mut buf)? == 0 {
            return Ok(raw)
        }

        if self.format.has_comments() {
            let marker = trim_newline(&buf).to_vec();
            raw.append(&mut buf);
            loop {
                buf.clear();
                if conn.read_until(b'\n', &mut buf)? == 0 {
                    break
                }
                let line = trim_newline(&buf);
                if line == marker.as_slice() || line.contains_str("BLAST processed") {
                    break
                }
                raw.extend_from_slice(&buf);
            }
        } else {
            let key = self.key_of(&buf).to_vec();
            if key.is_empty() {
                return Ok(raw)
            }
            raw.append(&mut buf);
            loop {
                buf.clear();
                if conn.read_until(b'\n', &mut buf)? == 0 || self.key_of(&buf) != key.as_slice() {
                    break
                }
                raw.extend_from_slice(&buf);
            }
        }

        Ok(raw)
    }
}

/// Index of a file, searchable by query key.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchIndex {
    pub format: Format,
    /// Columns of the indexed file if they were given.
    pub fields: Option<String>,
    entries: Vec<IndexEntry>,
    lookup: IndexMap<String, Vec<usize>>,
}

impl SearchIndex {
    pub fn new(
        format: Format,
        fields: Option<String>,
        entries: Vec<IndexEntry>,
    ) -> Self {
        let mut lookup: IndexMap<String, Vec<usize>> = IndexMap::new();
        entries.iter().enumerate().for_each(|(idx, entry)| {
            lookup.entry(entry.key.clone()).or_default().push(idx);
        });
        SearchIndex{ format, fields, entries, lookup }
    }

    /// Returns the `(offset, length)` of every block with `key` in file order.
    pub fn get(
        &self,
        key: &str,
    ) -> Vec<(u64, u64)> {
        match self.lookup.get(key) {
            Some(positions) => positions.iter().map(|idx| (self.entries[*idx].offset, self.entries[*idx].length)).collect(),
            None => Vec::new(),
        }
    }

    /// Read the raw bytes of every block with `key`.
    pub fn fetch<R: BufRead + Seek>(
        &self,
        conn: &mut R,
        key: &str,
    ) -> Result<Vec<Vec<u8>>, E> {
        let indexer = Indexer::new(self.format, self.fields.as_deref())?;
        self.get(key).iter().map(|(offset, _)| indexer.get_raw(conn, *offset)).collect()
    }

    /// Keys in the order they first appear in the file.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.lookup.keys().map(|x| x.as_str())
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Index the queries in `conn`.
///
/// `fields` is a space-separated list of BLAST+ columns in the file, if it
/// does not use the 12 default columns.
///
pub fn build_index<R: BufRead + Seek>(
    conn: &mut R,
    format: Format,
    fields: Option<&str>,
) -> Result<SearchIndex, E> {
    let indexer = Indexer::new(format, fields)?;
    let entries = indexer.index(conn)?;
    let index = SearchIndex::new(format, fields.map(|x| x.to_string()), entries);
    log::info!("Indexed {} blocks from {} queries", index.len(), index.lookup.len());
    Ok(index)
}

/// Read the raw bytes of the block starting at `offset`.
pub fn get_raw<R: BufRead + Seek>(
    conn: &mut R,
    index: &SearchIndex,
    offset: u64,
) -> Result<Vec<u8>, E> {
    let indexer = Indexer::new(index.format, index.fields.as_deref())?;
    indexer.get_raw(conn, offset)
}

fn trim_newline(
    line: &[u8],
) -> &[u8] {
    line.trim_end_with(|c| c == '\n' || c == '\r')
}
