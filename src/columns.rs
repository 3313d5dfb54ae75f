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

//! Catalog of the columns that can appear in tabular search results.
//!
//! Each BLAST+ column has a short name (used on the command line, eg.
//! `qseqid`), a long name (used in the `# Fields:` comment line, eg. `query
//! id`), and a destination attribute in one of the four record levels
//! ([Entity]). A [Column] knows how to cast a value from the input and
//! assign it into a [DecodedRow], and how to read the same value back from a
//! parsed hierarchy.
//!
//! HMMER domain tables have a fixed layout that is listed in
//! [DOMTAB_COLUMNS].
//!
//! ## Usage
//!
//! ```rust
//! use searchtab::columns::{prepare_fields, Column};
//!
//! // `std` expands to the 12 default columns at its position
//! let fields = prepare_fields("std qlen slen").unwrap();
//! assert_eq!(fields.len(), 14);
//! assert_eq!(fields[0].column, Some(Column::Qseqid));
//! assert_eq!(fields[13].column, Some(Column::Slen));
//!
//! // Both a query and a subject key column are required
//! assert!(prepare_fields("qseqid evalue").is_err());
//! ```
//!

use std::str::FromStr;

use crate::parser::DecodedRow;
use crate::Hit;
use crate::Hsp;
use crate::QueryResult;

type E = Box<dyn std::error::Error>;

/// Column order used by BLAST+ for `-outfmt 6` and `-outfmt 7` without a
/// custom column list. Also the expansion of `std`.
pub const DEFAULT_FIELDS: [&str; 12] = [
    "qseqid", "sseqid", "pident", "length", "mismatch", "gapopen",
    "qstart", "qend", "sstart", "send", "evalue", "bitscore",
];

/// One of these must be present to identify queries.
pub const MIN_QUERY_FIELDS: [&str; 3] = ["qseqid", "qacc", "qaccver"];
/// One of these must be present to identify hits.
pub const MIN_HIT_FIELDS: [&str; 3] = ["sseqid", "sacc", "saccver"];

// BLAST+ columns that may appear in the input but are not read.
const IGNORED_COLUMNS: [(&str, &str); 16] = [
    ("sstrand", "subject strand"),
    ("qcovs", "% query coverage per subject"),
    ("qcovhsp", "% query coverage per hsp"),
    ("qcovus", "% query coverage per uniq subject"),
    ("staxid", "subject tax id"),
    ("staxids", "subject tax ids"),
    ("ssciname", "subject sci name"),
    ("sscinames", "subject sci names"),
    ("scomname", "subject com name"),
    ("scomnames", "subject com names"),
    ("sblastname", "subject blast name"),
    ("sblastnames", "subject blast names"),
    ("sskingdom", "subject super kingdom"),
    ("sskingdoms", "subject super kingdoms"),
    ("stitle", "subject title"),
    ("salltitles", "subject titles"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Column name is not a BLAST+ column.
    UnknownColumn(String),
    /// Long column name in a `# Fields:` line is not known.
    UnknownLongName(String),
    /// None of [MIN_QUERY_FIELDS] or [MIN_HIT_FIELDS] is present.
    MissingKeyColumn(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ConfigError::UnknownColumn(name) => write!(f, "unknown column '{}'", name),
            ConfigError::UnknownLongName(name) => write!(f, "unknown column description '{}'", name),
            ConfigError::MissingKeyColumn(level) => write!(f, "required {} id column not found", level),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Record level that a column is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Query,
    Hit,
    Hsp,
    Fragment,
}

/// Type the raw text of a column is cast into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Int,
    Float,
    Text,
}

/// A value read back from a parsed hierarchy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Int(i64),
    Float(f64),
    Text(&'a str),
}

impl std::fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Value::Int(x) => write!(f, "{}", x),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(x) => write!(f, "{}", x),
        }
    }
}

/// BLAST+ tabular output columns.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    // query
    Qseqid,
    Qacc,
    Qaccver,
    Qlen,
    Qgi,
    // hit
    Sseqid,
    Sallseqid,
    Sacc,
    Saccver,
    Sgi,
    Sallgi,
    Slen,
    // hsp
    Bitscore,
    Score,
    Evalue,
    Nident,
    Pident,
    Positive,
    Ppos,
    Mismatch,
    Gaps,
    Gapopen,
    Btop,
    // fragment
    Length,
    Qstart,
    Qend,
    Sstart,
    Send,
    Qframe,
    Sframe,
    Frames,
    Qseq,
    Sseq,
}

/// Every mapped BLAST+ column.
pub const BLAST_COLUMNS: [Column; 33] = [
    Column::Qseqid, Column::Qacc, Column::Qaccver, Column::Qlen, Column::Qgi,
    Column::Sseqid, Column::Sallseqid, Column::Sacc, Column::Saccver, Column::Sgi, Column::Sallgi, Column::Slen,
    Column::Bitscore, Column::Score, Column::Evalue, Column::Nident, Column::Pident, Column::Positive,
    Column::Ppos, Column::Mismatch, Column::Gaps, Column::Gapopen, Column::Btop,
    Column::Length, Column::Qstart, Column::Qend, Column::Sstart, Column::Send,
    Column::Qframe, Column::Sframe, Column::Frames, Column::Qseq, Column::Sseq,
];

impl Column {
    /// Name used on the command line.
    pub fn short_name(&self) -> &'static str {
        self.properties().0
    }

    /// Name used in the `# Fields:` comment line.
    pub fn long_name(&self) -> &'static str {
        self.properties().1
    }

    pub fn entity(&self) -> Entity {
        self.properties().2
    }

    /// Name of the attribute the column is stored in.
    pub fn attribute(&self) -> &'static str {
        self.properties().3
    }

    pub fn value_type(&self) -> ValueType {
        self.properties().4
    }

    fn properties(&self) -> (&'static str, &'static str, Entity, &'static str, ValueType) {
        use Entity::*;
        use ValueType::*;
        match self {
            Column::Qseqid => ("qseqid", "query id", Query, "id", Text),
            Column::Qacc => ("qacc", "query acc.", Query, "acc", Text),
            Column::Qaccver => ("qaccver", "query acc.ver", Query, "acc_ver", Text),
            Column::Qlen => ("qlen", "query length", Query, "seq_len", Int),
            Column::Qgi => ("qgi", "query gi", Query, "gi", Text),
            Column::Sseqid => ("sseqid", "subject id", Hit, "id", Text),
            Column::Sallseqid => ("sallseqid", "subject ids", Hit, "id_all", Text),
            Column::Sacc => ("sacc", "subject acc.", Hit, "acc", Text),
            Column::Saccver => ("saccver", "subject acc.ver", Hit, "acc_ver", Text),
            Column::Sgi => ("sgi", "subject gi", Hit, "gi", Text),
            Column::Sallgi => ("sallgi", "subject gis", Hit, "gi_all", Text),
            Column::Slen => ("slen", "subject length", Hit, "seq_len", Int),
            Column::Bitscore => ("bitscore", "bit score", Hsp, "bitscore", Float),
            Column::Score => ("score", "score", Hsp, "bitscore_raw", Int),
            Column::Evalue => ("evalue", "evalue", Hsp, "evalue", Float),
            Column::Nident => ("nident", "identical", Hsp, "ident_num", Int),
            Column::Pident => ("pident", "% identity", Hsp, "ident_pct", Float),
            Column::Positive => ("positive", "positives", Hsp, "pos_num", Int),
            Column::Ppos => ("ppos", "% positives", Hsp, "pos_pct", Float),
            Column::Mismatch => ("mismatch", "mismatches", Hsp, "mismatch_num", Int),
            Column::Gaps => ("gaps", "gaps", Hsp, "gap_num", Int),
            Column::Gapopen => ("gapopen", "gap opens", Hsp, "gapopen_num", Int),
            Column::Btop => ("btop", "BTOP", Hsp, "btop", Text),
            Column::Length => ("length", "alignment length", Fragment, "aln_span", Int),
            Column::Qstart => ("qstart", "q. start", Fragment, "query_start", Int),
            Column::Qend => ("qend", "q. end", Fragment, "query_end", Int),
            Column::Sstart => ("sstart", "s. start", Fragment, "hit_start", Int),
            Column::Send => ("send", "s. end", Fragment, "hit_end", Int),
            Column::Qframe => ("qframe", "query frame", Fragment, "query_frame", Int),
            Column::Sframe => ("sframe", "sbjct frame", Fragment, "hit_frame", Int),
            Column::Frames => ("frames", "query/sbjct frames", Fragment, "frames", Text),
            Column::Qseq => ("qseq", "query seq", Fragment, "query", Text),
            Column::Sseq => ("sseq", "subject seq", Fragment, "hit", Text),
        }
    }

    /// Cast `value` and store it in `row`.
    ///
    /// Coordinates are stored as they appear in the input; they are
    /// normalised when the [HspFragment](crate::HspFragment) is built.
    pub fn assign(
        &self,
        value: &str,
        row: &mut DecodedRow,
    ) -> Result<(), E> {
        match self {
            Column::Qseqid => row.query.id = value.to_string(),
            Column::Qacc => row.query.acc = Some(value.to_string()),
            Column::Qaccver => row.query.acc_ver = Some(value.to_string()),
            Column::Qlen => row.query.seq_len = Some(cast(value)?),
            Column::Qgi => row.query.gi = Some(value.to_string()),
            Column::Sseqid => row.hit.id = value.to_string(),
            Column::Sallseqid => row.hit.id_all = Some(value.to_string()),
            Column::Sacc => row.hit.acc = Some(value.to_string()),
            Column::Saccver => row.hit.acc_ver = Some(value.to_string()),
            Column::Sgi => row.hit.gi = Some(value.to_string()),
            Column::Sallgi => row.hit.gi_all = Some(value.to_string()),
            Column::Slen => row.hit.seq_len = Some(cast(value)?),
            Column::Bitscore => row.hsp.bitscore = Some(cast(value)?),
            Column::Score => row.hsp.bitscore_raw = Some(cast(value)?),
            Column::Evalue => row.hsp.evalue = Some(cast(value)?),
            Column::Nident => row.hsp.ident_num = Some(cast(value)?),
            Column::Pident => row.hsp.ident_pct = Some(cast(value)?),
            Column::Positive => row.hsp.pos_num = Some(cast(value)?),
            Column::Ppos => row.hsp.pos_pct = Some(cast(value)?),
            Column::Mismatch => row.hsp.mismatch_num = Some(cast(value)?),
            Column::Gaps => row.hsp.gap_num = Some(cast(value)?),
            Column::Gapopen => row.hsp.gapopen_num = Some(cast(value)?),
            Column::Btop => row.hsp.btop = Some(value.to_string()),
            Column::Length => row.frag.aln_span = Some(cast(value)?),
            Column::Qstart => row.frag.query_start = Some(cast(value)?),
            Column::Qend => row.frag.query_end = Some(cast(value)?),
            Column::Sstart => row.frag.hit_start = Some(cast(value)?),
            Column::Send => row.frag.hit_end = Some(cast(value)?),
            Column::Qframe => row.frag.query_frame = Some(cast(value)?),
            Column::Sframe => row.frag.hit_frame = Some(cast(value)?),
            Column::Frames => row.frag.frames = Some(value.to_string()),
            Column::Qseq => row.frag.query = Some(value.to_string()),
            Column::Sseq => row.frag.hit = Some(value.to_string()),
        }
        Ok(())
    }

    /// Read the value of the column back from a parsed hierarchy.
    ///
    /// Coordinates are returned as stored (0-based, `start <= end`) and
    /// `frames` is not stored at all; the printer reconstructs both.
    pub fn value<'a>(
        &self,
        query: &'a QueryResult,
        hit: &'a Hit,
        hsp: &'a Hsp,
    ) -> Option<Value<'a>> {
        let frag = &hsp.fragment;
        match self {
            Column::Qseqid => Some(Value::Text(&query.id)),
            Column::Qacc => query.acc.as_deref().map(Value::Text),
            Column::Qaccver => query.acc_ver.as_deref().map(Value::Text),
            Column::Qlen => query.seq_len.map(|x| Value::Int(x as i64)),
            Column::Qgi => query.gi.as_deref().map(Value::Text),
            Column::Sseqid => Some(Value::Text(&hit.id)),
            Column::Sallseqid => hit.id_all.as_deref().map(Value::Text),
            Column::Sacc => hit.acc.as_deref().map(Value::Text),
            Column::Saccver => hit.acc_ver.as_deref().map(Value::Text),
            Column::Sgi => hit.gi.as_deref().map(Value::Text),
            Column::Sallgi => hit.gi_all.as_deref().map(Value::Text),
            Column::Slen => hit.seq_len.map(|x| Value::Int(x as i64)),
            Column::Bitscore => hsp.bitscore.map(Value::Float),
            Column::Score => hsp.bitscore_raw.map(Value::Int),
            Column::Evalue => hsp.evalue.map(Value::Float),
            Column::Nident => hsp.ident_num.map(|x| Value::Int(x as i64)),
            Column::Pident => hsp.ident_pct.map(Value::Float),
            Column::Positive => hsp.pos_num.map(|x| Value::Int(x as i64)),
            Column::Ppos => hsp.pos_pct.map(Value::Float),
            Column::Mismatch => hsp.mismatch_num.map(|x| Value::Int(x as i64)),
            Column::Gaps => hsp.gap_num.map(|x| Value::Int(x as i64)),
            Column::Gapopen => hsp.gapopen_num.map(|x| Value::Int(x as i64)),
            Column::Btop => hsp.btop.as_deref().map(Value::Text),
            Column::Length => frag.aln_span.map(|x| Value::Int(x as i64)),
            Column::Qstart => frag.query_start.map(|x| Value::Int(x as i64)),
            Column::Qend => frag.query_end.map(|x| Value::Int(x as i64)),
            Column::Sstart => frag.hit_start.map(|x| Value::Int(x as i64)),
            Column::Send => frag.hit_end.map(|x| Value::Int(x as i64)),
            Column::Qframe => frag.query_frame.map(|x| Value::Int(x as i64)),
            Column::Sframe => frag.hit_frame.map(|x| Value::Int(x as i64)),
            Column::Frames => None,
            Column::Qseq => frag.query.as_deref().map(Value::Text),
            Column::Sseq => frag.hit.as_deref().map(Value::Text),
        }
    }
}

impl FromStr for Column {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BLAST_COLUMNS.iter()
            .find(|column| column.short_name() == s)
            .copied()
            .ok_or_else(|| ConfigError::UnknownColumn(s.to_string()))
    }
}

/// A column in the active column order.
///
/// `column` is None for BLAST+ columns that are recognised but not read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub column: Option<Column>,
}

impl Field {
    pub fn long_name(&self) -> &str {
        match self.column {
            Some(column) => column.long_name(),
            None => IGNORED_COLUMNS.iter()
                .find(|(short, _)| *short == self.name)
                .map(|(_, long)| *long)
                .unwrap_or(&self.name),
        }
    }
}

/// Resolve a short column name.
///
/// Returns Ok(None) for BLAST+ columns that are known but not mapped to any
/// attribute, and an error for names that are not BLAST+ columns.
pub fn resolve(
    short_name: &str,
) -> Result<Option<Column>, ConfigError> {
    match Column::from_str(short_name) {
        Ok(column) => Ok(Some(column)),
        Err(e) => {
            if IGNORED_COLUMNS.iter().any(|(short, _)| *short == short_name) {
                Ok(None)
            } else {
                Err(e)
            }
        },
    }
}

/// Map a long column name from a `# Fields:` line to its short name.
pub fn long_to_short(
    long_name: &str,
) -> Result<&'static str, ConfigError> {
    BLAST_COLUMNS.iter()
        .map(|column| (column.short_name(), column.long_name()))
        .chain(IGNORED_COLUMNS.iter().copied())
        .find(|(_, long)| *long == long_name)
        .map(|(short, _)| short)
        .ok_or_else(|| ConfigError::UnknownLongName(long_name.to_string()))
}

/// Expand and validate a list of short column names.
///
/// `std` is replaced by [DEFAULT_FIELDS] at its position. Fails if the
/// list has no query or no hit key column, or contains unknown columns.
pub fn prepare_field_list<S: AsRef<str>>(
    names: &[S],
) -> Result<Vec<Field>, ConfigError> {
    let mut expanded: Vec<&str> = Vec::with_capacity(names.len() + DEFAULT_FIELDS.len());
    names.iter().for_each(|name| {
        if name.as_ref() == "std" {
            expanded.extend(DEFAULT_FIELDS.iter());
        } else {
            expanded.push(name.as_ref());
        }
    });

    if !expanded.iter().any(|name| MIN_QUERY_FIELDS.contains(name)) {
        return Err(ConfigError::MissingKeyColumn("query"))
    }
    if !expanded.iter().any(|name| MIN_HIT_FIELDS.contains(name)) {
        return Err(ConfigError::MissingKeyColumn("hit"))
    }

    expanded.iter().map(|name| {
        let column = resolve(name)?;
        if column.is_none() {
            log::warn!("Column '{}' is not supported and will not be read", name);
        }
        Ok(Field { name: name.to_string(), column })
    }).collect()
}

/// Expand and validate a space-separated list of short column names.
pub fn prepare_fields(
    names: &str,
) -> Result<Vec<Field>, ConfigError> {
    let names: Vec<&str> = names.split_whitespace().collect();
    prepare_field_list(&names)
}

/// [DEFAULT_FIELDS] as a prepared field list.
pub fn default_fields() -> Vec<Field> {
    DEFAULT_FIELDS.iter().map(|name| {
        Field { name: name.to_string(), column: Column::from_str(name).ok() }
    }).collect()
}

/// Returns the position of the column used as the query key in `fields`.
pub fn query_key_index(
    fields: &[Field],
) -> Option<usize> {
    MIN_QUERY_FIELDS.iter().find_map(|key| fields.iter().position(|field| field.name == *key))
}

/// HMMER3 domain table columns, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomtabColumn {
    TargetName,
    TargetAccession,
    TargetLength,
    QueryName,
    QueryAccession,
    QueryLength,
    FullEvalue,
    FullScore,
    FullBias,
    DomainIndex,
    DomainCount,
    DomainCEvalue,
    DomainIEvalue,
    DomainScore,
    DomainBias,
    HmmFrom,
    HmmTo,
    AliFrom,
    AliTo,
    EnvFrom,
    EnvTo,
    Acc,
    Description,
}

pub const DOMTAB_COLUMNS: [DomtabColumn; 23] = [
    DomtabColumn::TargetName, DomtabColumn::TargetAccession, DomtabColumn::TargetLength,
    DomtabColumn::QueryName, DomtabColumn::QueryAccession, DomtabColumn::QueryLength,
    DomtabColumn::FullEvalue, DomtabColumn::FullScore, DomtabColumn::FullBias,
    DomtabColumn::DomainIndex, DomtabColumn::DomainCount,
    DomtabColumn::DomainCEvalue, DomtabColumn::DomainIEvalue, DomtabColumn::DomainScore, DomtabColumn::DomainBias,
    DomtabColumn::HmmFrom, DomtabColumn::HmmTo, DomtabColumn::AliFrom, DomtabColumn::AliTo,
    DomtabColumn::EnvFrom, DomtabColumn::EnvTo, DomtabColumn::Acc, DomtabColumn::Description,
];

/// Position of the query name in a domain table row.
pub const DOMTAB_QUERY_KEY_INDEX: usize = 3;

impl DomtabColumn {
    /// Record level the column is stored in, or None if it is not read.
    ///
    /// The domain count is not stored since it equals the number of HSPs in
    /// the hit.
    pub fn entity(&self) -> Option<Entity> {
        use DomtabColumn::*;
        match self {
            TargetName | TargetAccession | TargetLength | FullEvalue | FullScore | FullBias | Description => Some(Entity::Hit),
            QueryName | QueryAccession | QueryLength => Some(Entity::Query),
            DomainIndex | DomainCEvalue | DomainIEvalue | DomainScore | DomainBias | EnvFrom | EnvTo | Acc => Some(Entity::Hsp),
            HmmFrom | HmmTo | AliFrom | AliTo => Some(Entity::Fragment),
            DomainCount => None,
        }
    }

    /// Cast `value` and store it in `row`.
    ///
    /// HMM coordinates are stored as hit coordinates and alignment
    /// coordinates as query coordinates.
    pub fn assign(
        &self,
        value: &str,
        row: &mut DecodedRow,
    ) -> Result<(), E> {
        use DomtabColumn::*;
        match self {
            TargetName => row.hit.id = value.to_string(),
            TargetAccession => row.hit.acc = accession(value),
            TargetLength => row.hit.seq_len = Some(cast(value)?),
            QueryName => row.query.id = value.to_string(),
            QueryAccession => row.query.acc = accession(value),
            QueryLength => row.query.seq_len = Some(cast(value)?),
            FullEvalue => row.hit.evalue = Some(cast(value)?),
            FullScore => row.hit.bitscore = Some(cast(value)?),
            FullBias => row.hit.bias = Some(cast(value)?),
            DomainIndex => row.hsp.domain_index = Some(cast(value)?),
            DomainCount => (),
            DomainCEvalue => row.hsp.evalue_cond = Some(cast(value)?),
            DomainIEvalue => row.hsp.evalue = Some(cast(value)?),
            DomainScore => row.hsp.bitscore = Some(cast(value)?),
            DomainBias => row.hsp.bias = Some(cast(value)?),
            HmmFrom => row.frag.hit_start = Some(cast(value)?),
            HmmTo => row.frag.hit_end = Some(cast(value)?),
            AliFrom => row.frag.query_start = Some(cast(value)?),
            AliTo => row.frag.query_end = Some(cast(value)?),
            EnvFrom => row.hsp.env_start = Some(zero_based(cast(value)?)?),
            EnvTo => row.hsp.env_end = Some(cast(value)?),
            Acc => row.hsp.acc_avg = Some(cast(value)?),
            Description => row.hit.description = Some(value.to_string()),
        }
        Ok(())
    }
}

fn accession(
    value: &str,
) -> Option<String> {
    if value == "-" { None } else { Some(value.to_string()) }
}

#[derive(Debug, Clone)]
pub struct CoordinateError;

impl std::fmt::Display for CoordinateError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "coordinates must be 1-based")
    }
}

impl std::error::Error for CoordinateError {}

/// Convert a 1-based coordinate to 0-based.
pub fn zero_based(
    value: u64,
) -> Result<u64, CoordinateError> {
    value.checked_sub(1).ok_or(CoordinateError)
}

fn cast<T: FromStr>(
    value: &str,
) -> Result<T, E> where T::Err: std::error::Error + 'static {
    Ok(value.trim().parse::<T>()?)
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn resolve_known_column() {
        use super::resolve;
        use super::Column;
        use super::Entity;
        use super::ValueType;

        let got = resolve("sstart").unwrap().unwrap();

        assert_eq!(got, Column::Sstart);
        assert_eq!(got.entity(), Entity::Fragment);
        assert_eq!(got.attribute(), "hit_start");
        assert_eq!(got.value_type(), ValueType::Int);
    }

    #[test]
    fn resolve_ignored_and_unknown_columns() {
        use super::resolve;
        use super::ConfigError;

        assert_eq!(resolve("staxids").unwrap(), None);
        assert_eq!(resolve("not_a_column").unwrap_err(), ConfigError::UnknownColumn("not_a_column".to_string()));
    }

    #[test]
    fn short_and_long_names_are_unique() {
        use super::BLAST_COLUMNS;
        use std::collections::HashSet;

        let short: HashSet<&str> = BLAST_COLUMNS.iter().map(|x| x.short_name()).collect();
        let long: HashSet<&str> = BLAST_COLUMNS.iter().map(|x| x.long_name()).collect();

        assert_eq!(short.len(), BLAST_COLUMNS.len());
        assert_eq!(long.len(), BLAST_COLUMNS.len());
    }

    #[test]
    fn long_to_short_names() {
        use super::long_to_short;

        assert_eq!(long_to_short("query acc.ver").unwrap(), "qaccver");
        assert_eq!(long_to_short("query/sbjct frames").unwrap(), "frames");
        assert_eq!(long_to_short("subject tax ids").unwrap(), "staxids");
        assert!(long_to_short("query colour").is_err());
    }

    #[test]
    fn std_is_spliced_in_place() {
        use super::prepare_fields;
        use super::DEFAULT_FIELDS;

        let got: Vec<String> = prepare_fields("qlen std slen").unwrap().into_iter().map(|x| x.name).collect();

        let mut expected: Vec<String> = vec!["qlen".to_string()];
        expected.extend(DEFAULT_FIELDS.iter().map(|x| x.to_string()));
        expected.push("slen".to_string());

        assert_eq!(got, expected);
    }

    #[test]
    fn prepare_fields_requires_key_columns() {
        use super::prepare_fields;
        use super::ConfigError;

        assert_eq!(prepare_fields("sseqid evalue").unwrap_err(), ConfigError::MissingKeyColumn("query"));
        assert_eq!(prepare_fields("qacc evalue").unwrap_err(), ConfigError::MissingKeyColumn("hit"));
        assert!(prepare_fields("qaccver saccver").is_ok());
    }

    #[test]
    fn query_key_index_prefers_id() {
        use super::prepare_fields;
        use super::query_key_index;

        let fields = prepare_fields("sseqid qacc evalue qseqid").unwrap();
        assert_eq!(query_key_index(&fields), Some(3));

        let fields = prepare_fields("sseqid qaccver evalue qacc").unwrap();
        assert_eq!(query_key_index(&fields), Some(3));
    }

    #[test]
    fn assign_then_value_agree_for_every_column() {
        use super::BLAST_COLUMNS;
        use super::Column;
        use super::Value;
        use super::ValueType;
        use crate::parser::DecodedRow;
        use crate::Hsp;

        for column in BLAST_COLUMNS {
            let raw = match column.value_type() {
                ValueType::Int => "7",
                ValueType::Float => "7.5",
                ValueType::Text => "abc",
            };
            let mut row = DecodedRow::default();
            column.assign(raw, &mut row).unwrap();

            // Coordinates and frames go through the fragment builder
            if matches!(column, Column::Qstart | Column::Qend | Column::Sstart | Column::Send | Column::Frames) {
                continue
            }

            let frag = crate::HspFragment {
                aln_span: row.frag.aln_span,
                query_frame: row.frag.query_frame,
                hit_frame: row.frag.hit_frame,
                query: row.frag.query.clone(),
                hit: row.frag.hit.clone(),
                ..Default::default()
            };
            let hsp = Hsp { fragment: frag, ..row.hsp.clone() };
            let got = column.value(&row.query, &row.hit, &hsp).unwrap();

            let expected = match column.value_type() {
                ValueType::Int => Value::Int(7),
                ValueType::Float => Value::Float(7.5),
                ValueType::Text => Value::Text("abc"),
            };
            assert_eq!(got, expected, "column {}", column.short_name());
        }
    }

    #[test]
    fn assign_rejects_malformed_numbers() {
        use super::Column;
        use crate::parser::DecodedRow;

        let mut row = DecodedRow::default();
        assert!(Column::Evalue.assign("1e-5x", &mut row).is_err());
        assert!(Column::Qlen.assign("-3", &mut row).is_err());
        assert!(Column::Bitscore.assign(" 100", &mut row).is_ok());
        assert_eq!(row.hsp.bitscore, Some(100.0));
    }

    #[test]
    fn domtab_accession_dash_is_absent() {
        use super::DomtabColumn;
        use crate::parser::DecodedRow;

        let mut row = DecodedRow::default();
        DomtabColumn::QueryAccession.assign("-", &mut row).unwrap();
        DomtabColumn::TargetAccession.assign("PF00069.17", &mut row).unwrap();
        DomtabColumn::EnvFrom.assign("492", &mut row).unwrap();

        assert_eq!(row.query.acc, None);
        assert_eq!(row.hit.acc, Some("PF00069.17".to_string()));
        assert_eq!(row.hsp.env_start, Some(491));
        assert!(DomtabColumn::EnvFrom.assign("0", &mut row).is_err());
    }
}
