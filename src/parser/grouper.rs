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

//! Grouping of decoded rows into the query → hit → HSP hierarchy.
//!
//! Rows of the same query are consecutive in the input and rows of the same
//! hit are consecutive within a query. A query is complete once a row with
//! a different query key, or the end of the rows, is seen.
//!
//! ## Usage
//!
//! ```rust
//! use searchtab::parser::DecodedRow;
//! use searchtab::parser::grouper::Grouper;
//!
//! fn row(query: &str, hit: &str) -> DecodedRow {
//!     let mut row = DecodedRow::default();
//!     row.query.id = query.to_string();
//!     row.hit.id = hit.to_string();
//!     row
//! }
//!
//! let mut grouper = Grouper::default();
//! assert!(grouper.push(Some(row("q1", "s1"))).unwrap().is_none());
//! assert!(grouper.push(Some(row("q1", "s2"))).unwrap().is_none());
//!
//! // The next query completes the first one
//! let q1 = grouper.push(Some(row("q2", "s1"))).unwrap().unwrap();
//! assert_eq!(q1.hits.len(), 2);
//!
//! // End of input completes the last one
//! let q2 = grouper.push(None).unwrap().unwrap();
//! assert_eq!(q2.id, "q2");
//! assert!(grouper.push(None).unwrap().is_none());
//! ```
//!

use crate::parser::DecodedRow;
use crate::parser::RawFragment;
use crate::parser::RowError;
use crate::HspFragment;
use crate::QueryResult;
use crate::Strand;

type E = Box<dyn std::error::Error>;

/// Relation of a row to the query and hit that are being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Another HSP of the current hit.
    SameHit,
    /// First HSP of a new hit within the current query.
    NewHit,
    /// First HSP of a new query.
    NewQuery,
    /// No more rows.
    End,
}

/// Decide the transition from the keys of the previous and current row.
///
/// Keys are `(query key, hit key)`; None is the start or end of the rows.
pub fn transition(
    prev: Option<(&str, &str)>,
    cur: Option<(&str, &str)>,
) -> Transition {
    match (prev, cur) {
        (_, None) => Transition::End,
        (None, Some(_)) => Transition::NewQuery,
        (Some((prev_query, prev_hit)), Some((cur_query, cur_hit))) => {
            if prev_query != cur_query {
                Transition::NewQuery
            } else if prev_hit != cur_hit {
                Transition::NewHit
            } else {
                Transition::SameHit
            }
        },
    }
}

/// Builds [QueryResult] records from consecutive rows.
///
/// Holds at most one incomplete query.
#[derive(Debug, Default)]
pub struct Grouper {
    query: Option<QueryResult>,
}

impl Grouper {
    /// Add the next row, or None at the end of the rows.
    ///
    /// Returns the previous query if `row` completes it.
    pub fn push(
        &mut self,
        row: Option<DecodedRow>,
    ) -> Result<Option<QueryResult>, E> {
        let prev = self.query.as_ref().map(|query| {
            (query.id.as_str(), query.hits.last().map_or("", |hit| hit.id.as_str()))
        });
        let step = transition(prev, row.as_ref().map(|row| row.keys()));

        let row = match row {
            Some(row) => row,
            None => return Ok(self.query.take()),
        };

        let DecodedRow { line, mut query, mut hit, mut hsp, frag } = row;
        hsp.fragment = build_fragment(&frag, &query.id, &hit.id, line)?;

        // NewHit and SameHit are only returned when a query with at least one hit is in flight
        debug_assert!(matches!(step, Transition::NewQuery) || self.query.as_ref().is_some_and(|query| !query.hits.is_empty()));
        match step {
            Transition::NewQuery => {
                hit.hsps.push(hsp);
                query.hits.push(hit);
                Ok(self.query.replace(query))
            },
            Transition::NewHit => {
                if let Some(current) = self.query.as_mut() {
                    hit.hsps.push(hsp);
                    current.hits.push(hit);
                }
                Ok(None)
            },
            Transition::SameHit => {
                if let Some(current) = self.query.as_mut().and_then(|query| query.hits.last_mut()) {
                    current.hsps.push(hsp);
                }
                Ok(None)
            },
            Transition::End => Ok(self.query.take()),
        }
    }
}

/// Build the [HspFragment] of a row.
///
/// Coordinates are converted to 0-based half-open intervals with
/// `start <= end` and their input order is stored as the strand. Frames
/// are taken from the `frames` column if the per-sequence frame columns are
/// absent.
pub fn build_fragment(
    raw: &RawFragment,
    query_id: &str,
    hit_id: &str,
    line: usize,
) -> Result<HspFragment, RowError> {
    let (query_start, query_end, query_strand) = normalize(raw.query_start, raw.query_end, "query", line)?;
    let (hit_start, hit_end, hit_strand) = normalize(raw.hit_start, raw.hit_end, "hit", line)?;

    let (mut query_frame, mut hit_frame) = (raw.query_frame, raw.hit_frame);
    if let Some(frames) = &raw.frames {
        let (query, hit) = split_frames(frames).ok_or_else(|| {
            RowError::Value { line, column: "frames".to_string(), value: frames.clone() }
        })?;
        query_frame = query_frame.or(Some(query));
        hit_frame = hit_frame.or(Some(hit));
    }

    Ok(HspFragment {
        query_id: query_id.to_string(),
        hit_id: hit_id.to_string(),
        aln_span: raw.aln_span,
        query_start, query_end,
        hit_start, hit_end,
        query_frame, hit_frame,
        query_strand, hit_strand,
        query: raw.query.clone(),
        hit: raw.hit.clone(),
    })
}

fn normalize(
    start: Option<u64>,
    end: Option<u64>,
    seq_type: &'static str,
    line: usize,
) -> Result<(Option<u64>, Option<u64>, Option<Strand>), RowError> {
    match (start, end) {
        (None, None) => Ok((None, None, None)),
        (Some(start), Some(end)) => {
            if start == 0 || end == 0 {
                return Err(RowError::Value { line, column: format!("{} coordinates", seq_type), value: "0".to_string() })
            }
            Ok((Some(start.min(end) - 1), Some(start.max(end)), Some(Strand::from_raw_coordinates(start, end))))
        },
        _ => Err(RowError::PartialCoordinates { line, seq_type }),
    }
}

// Split `q/h` into the query and hit frames
fn split_frames(
    frames: &str,
) -> Option<(i8, i8)> {
    let (query, hit) = frames.trim().split_once('/')?;
    Some((query.parse::<i8>().ok()?, hit.parse::<i8>().ok()?))
}
