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
use std::io::Read;
use std::io::Write;
use std::str::FromStr;

use bincode::Encode;
use bincode::encode_into_std_write;
use bincode::decode_from_std_read;

use crate::index::IndexEntry;
use crate::index::IndexError;
use crate::index::SearchIndex;
use crate::Format;

type E = Box<dyn std::error::Error>;

pub const MAGIC: [u8; 8] = *b"SRCHTIDX";

/// Header preceding the entries of an index file.
#[derive(Encode)]
pub struct IndexHeader {
    pub magic: [u8; 8],
    pub format: String,
    pub fields: Option<String>,
    pub n_entries: u64,
}

pub fn encode_index_header(
    index: &SearchIndex,
) -> Result<Vec<u8>, E> {
    let mut bytes: Vec<u8> = Vec::new();
    let header = IndexHeader{
        magic: MAGIC,
        format: index.format.to_string(),
        fields: index.fields.clone(),
        n_entries: index.len() as u64,
    };
    encode_into_std_write(
        &header,
        &mut bytes,
        bincode::config::standard().with_fixed_int_encoding(),
    )?;
    Ok(bytes)
}

pub fn read_index_header<R: Read>(
    conn: &mut R,
) -> Result<IndexHeader, E> {
    let mut magic: [u8; 8] = [0_u8; 8];
    conn.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(Box::new(IndexError::InvalidMagic))
    }

    let (format, fields, n_entries): (String, Option<String>, u64) = decode_from_std_read(
        conn,
        bincode::config::standard().with_fixed_int_encoding(),
    )?;
    Ok(IndexHeader{ magic, format, fields, n_entries })
}

impl SearchIndex {
    /// Write the index to `conn`.
    ///
    /// The entries are preceded by a header with the format and columns of
    /// the indexed file so the index can be reopened with
    /// [read_from](SearchIndex::read_from).
    ///
    pub fn write_to<W: Write>(
        &self,
        conn: &mut W,
    ) -> Result<(), E> {
        conn.write_all(&encode_index_header(self)?)?;
        for entry in self.entries.iter() {
            encode_into_std_write(
                entry,
                conn,
                bincode::config::standard().with_fixed_int_encoding(),
            )?;
        }
        conn.flush()?;
        Ok(())
    }

    /// Read an index written by [write_to](SearchIndex::write_to).
    pub fn read_from<R: Read>(
        conn: &mut R,
    ) -> Result<Self, E> {
        let header = read_index_header(conn)?;
        let format = Format::from_str(&header.format).map_err(|_| IndexError::UnknownFormat(header.format.clone()))?;

        let mut entries: Vec<IndexEntry> = Vec::with_capacity(header.n_entries as usize);
        for _ in 0..header.n_entries {
            let entry: IndexEntry = decode_from_std_read(conn, bincode::config::standard().with_fixed_int_encoding())?;
            entries.push(entry);
        }

        Ok(SearchIndex::new(format, header.fields, entries))
    }
}
