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

use crate::columns::DOMTAB_COLUMNS;
use crate::parser::DecodedRow;
use crate::parser::RowError;

type E = Box<dyn std::error::Error>;

/// Decode a line from a HMMER3 domain table
///
/// Values are separated by runs of spaces. The last column, the target
/// description, may itself contain spaces or be missing entirely.
///
/// If `hmm_as_hit` is false the profile HMM is the query (hmmsearch) and
/// the HMM coordinates are stored as query coordinates.
///
pub fn decode_row(
    line: &str,
    line_no: usize,
    hmm_as_hit: bool,
) -> Result<DecodedRow, E> {
    let n_columns = DOMTAB_COLUMNS.len();
    let tokens: Vec<&str> = line.split_whitespace().collect();

    let description = if tokens.len() >= n_columns {
        tokens[(n_columns - 1)..].join(" ")
    } else if tokens.len() == n_columns - 1 {
        String::new()
    } else {
        return Err(Box::new(RowError::ColumnCount { line: line_no, expected: n_columns, found: tokens.len() }))
    };

    let mut row = DecodedRow { line: line_no, ..Default::default() };
    for (column, value) in DOMTAB_COLUMNS.iter().zip(tokens.iter().take(n_columns - 1)) {
        column.assign(value, &mut row).map_err(|_| {
            RowError::Value { line: line_no, column: format!("{:?}", column), value: value.to_string() }
        })?;
    }
    if !description.is_empty() {
        row.hit.description = Some(description);
    }

    if !hmm_as_hit {
        std::mem::swap(&mut row.frag.query_start, &mut row.frag.hit_start);
        std::mem::swap(&mut row.frag.query_end, &mut row.frag.hit_end);
    }
    row.resolve_keys();

    Ok(row)
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn decode_hmmscan_row() {
        use super::decode_row;

        let line = "Pkinase              PF00069.17   260 gi|22748937|ref|NP_065801.1| -           1107  4.1e-79  263.6   0.0   1   1   7.1e-82  5.3e-79  263.2   0.0     1   260   492   744   492   744 0.96 Protein kinase domain";
        let got = decode_row(line, 5, true).unwrap();

        assert_eq!(got.keys(), ("gi|22748937|ref|NP_065801.1|", "Pkinase"));
        assert_eq!(got.query.acc, None);
        assert_eq!(got.query.seq_len, Some(1107));
        assert_eq!(got.hit.acc, Some("PF00069.17".to_string()));
        assert_eq!(got.hit.seq_len, Some(260));
        assert_eq!(got.hit.evalue, Some(4.1e-79));
        assert_eq!(got.hit.bitscore, Some(263.6));
        assert_eq!(got.hit.bias, Some(0.0));
        assert_eq!(got.hit.description, Some("Protein kinase domain".to_string()));
        assert_eq!(got.hsp.domain_index, Some(1));
        assert_eq!(got.hsp.evalue_cond, Some(7.1e-82));
        assert_eq!(got.hsp.evalue, Some(5.3e-79));
        assert_eq!(got.hsp.bitscore, Some(263.2));
        assert_eq!((got.hsp.env_start, got.hsp.env_end), (Some(491), Some(744)));
        assert_eq!(got.hsp.acc_avg, Some(0.96));
        assert_eq!((got.frag.hit_start, got.frag.hit_end), (Some(1), Some(260)));
        assert_eq!((got.frag.query_start, got.frag.query_end), (Some(492), Some(744)));
    }

    #[test]
    fn decode_hmmsearch_row_swaps_coordinates() {
        use super::decode_row;

        let line = "sp|Q9Y2K2|SIK3_HUMAN  -           1263 Pkinase              PF00069.17   260   1.2e-72  244.2   0.0   1   1   3.5e-75  2.4e-72  243.2   0.0     1   260    69   319    69   319 0.97 Serine/threonine-protein kinase SIK3";
        let got = decode_row(line, 1, false).unwrap();

        assert_eq!(got.keys(), ("Pkinase", "sp|Q9Y2K2|SIK3_HUMAN"));
        assert_eq!((got.frag.query_start, got.frag.query_end), (Some(1), Some(260)));
        assert_eq!((got.frag.hit_start, got.frag.hit_end), (Some(69), Some(319)));
    }

    #[test]
    fn decode_row_without_description() {
        use super::decode_row;

        let line = "Pkinase PF00069.17 260 q1 - 1107 4.1e-79 263.6 0.0 1 1 7.1e-82 5.3e-79 263.2 0.0 1 260 492 744 492 744 0.96";
        let got = decode_row(line, 1, true).unwrap();

        assert_eq!(got.hit.description, None);
    }

    #[test]
    fn decode_row_too_few_columns() {
        use super::decode_row;
        use crate::parser::RowError;

        let got = decode_row("Pkinase PF00069.17 260 q1 -", 2, true).unwrap_err();

        assert_eq!(got.downcast_ref::<RowError>(), Some(&RowError::ColumnCount { line: 2, expected: 23, found: 5 }));
    }

    #[test]
    fn decode_row_bad_value() {
        use super::decode_row;

        let line = "Pkinase PF00069.17 two_hundred q1 - 1107 4.1e-79 263.6 0.0 1 1 7.1e-82 5.3e-79 263.2 0.0 1 260 492 744 492 744 0.96";
        assert!(decode_row(line, 1, true).is_err());
    }
}
