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

use crate::printer::WriteError;
use crate::QueryResult;

type E = Box<dyn std::error::Error>;

/// Format the 3 header lines of a HMMER3 domain table
///
/// Column widths are adjusted to the ids and accessions of `first` and its
/// first hit.
///
pub fn format_header(
    first: Option<&QueryResult>,
) -> String {
    let qnamew: usize = 20;
    let (tnamew, qaccw, taccw) = match first.and_then(|query| query.hits.first().map(|hit| (query, hit))) {
        Some((query, hit)) => (
            hit.id.len().max(20),
            query.acc.as_deref().unwrap_or("-").len().max(10),
            hit.acc.as_deref().unwrap_or("-").len().max(10),
        ),
        None => (20, 10, 10),
    };

    let mut formatted: String = String::new();
    formatted += &format!(
        "#{:>w$} {:>22} {:>40} {:>11} {:>11} {:>11}\n",
        "", "--- full sequence ---", "-------------- this domain -------------",
        "hmm coord", "ali coord", "env coord",
        w = tnamew + qnamew - 1 + 15 + taccw + qaccw,
    );
    formatted += &format!(
        "#{:<tw$} {:<taw$} {:>5} {:<qw$} {:<qaw$} {:>5} {:>9} {:>6} {:>5} {:>3} {:>3} {:>9} {:>9} {:>6} {:>5} {:>5} {:>5} {:>5} {:>5} {:>5} {:>5} {:>4} {}\n",
        " target name", "accession", "tlen", "query name", "accession", "qlen",
        "E-value", "score", "bias", "#", "of", "c-Evalue", "i-Evalue", "score", "bias",
        "from", "to", "from", "to", "from", "to", "acc", "description of target",
        tw = tnamew - 1, taw = taccw, qw = qnamew, qaw = qaccw,
    );
    formatted += &format!(
        "#{:>tw$} {:>taw$} {:>5} {:>qw$} {:>qaw$} {:>5} {:>9} {:>6} {:>5} {:>3} {:>3} {:>9} {:>9} {:>6} {:>5} {:>5} {:>5} {:>5} {:>5} {:>5} {:>5} {:>4} {}\n",
        "-------------------", "----------", "-----", "--------------------", "----------", "-----",
        "---------", "------", "-----", "---", "---", "---------", "---------", "------", "-----",
        "-----", "-----", "-----", "-----", "-----", "-----", "----", "---------------------",
        tw = tnamew - 1, taw = taccw, qw = qnamew, qaw = qaccw,
    );
    formatted
}

/// Format the lines of a query in HMMER3 domain table format
///
/// Writes one line per HSP to `conn`. If `hmm_as_hit` is true the hit
/// coordinates are written as HMM coordinates (hmmscan), otherwise the query
/// coordinates are (hmmsearch).
///
pub fn format_query<W: Write>(
    query: &QueryResult,
    hmm_as_hit: bool,
    conn: &mut W,
) -> Result<(), E> {
    let first_hit = match query.hits.first() {
        Some(hit) => hit,
        None => return Ok(()),
    };

    let qnamew = query.id.len().max(20);
    let tnamew = first_hit.id.len().max(20);
    let query_acc = query.acc.as_deref().unwrap_or("-");
    let qaccw = query_acc.len().max(10);
    let taccw = first_hit.acc.as_deref().unwrap_or("-").len().max(10);

    let missing = |column: &str| WriteError::MissingAttribute { column: column.to_string(), query: query.id.clone() };
    let query_len = query.seq_len.ok_or_else(|| missing("qlen"))?;

    let mut formatted: String = String::new();
    for hit in query.hits.iter() {
        let hit_len = hit.seq_len.ok_or_else(|| missing("tlen"))?;
        let hit_evalue = hit.evalue.ok_or_else(|| missing("E-value"))?;
        let hit_bitscore = hit.bitscore.ok_or_else(|| missing("score"))?;
        let hit_bias = hit.bias.ok_or_else(|| missing("bias"))?;

        for hsp in hit.hsps.iter() {
            let frag = &hsp.fragment;
            let (hmm, ali) = if hmm_as_hit {
                ((frag.hit_start, frag.hit_end), (frag.query_start, frag.query_end))
            } else {
                ((frag.query_start, frag.query_end), (frag.hit_start, frag.hit_end))
            };
            let hmm_from = hmm.0.ok_or_else(|| missing("hmm from"))? + 1;
            let hmm_to = hmm.1.ok_or_else(|| missing("hmm to"))?;
            let ali_from = ali.0.ok_or_else(|| missing("ali from"))? + 1;
            let ali_to = ali.1.ok_or_else(|| missing("ali to"))?;

            formatted += &format!(
                "{:<tw$} {:<taw$} {:>5} {:<qw$} {:<qaw$} {:>5} {:>9} {:>6.1} {:>5.1} {:>3} {:>3} {:>9} {:>9} {:>6.1} {:>5.1} {:>5} {:>5} {:>5} {:>5} {:>5} {:>5} {:>4.2} {}\n",
                hit.id, hit.acc.as_deref().unwrap_or("-"), hit_len,
                query.id, query_acc, query_len,
                format_g(hit_evalue, 2), hit_bitscore, hit_bias,
                hsp.domain_index.ok_or_else(|| missing("#"))?, hit.hsps.len(),
                format_g(hsp.evalue_cond.ok_or_else(|| missing("c-Evalue"))?, 2),
                format_g(hsp.evalue.ok_or_else(|| missing("i-Evalue"))?, 2),
                hsp.bitscore.ok_or_else(|| missing("score"))?,
                hsp.bias.ok_or_else(|| missing("bias"))?,
                hmm_from, hmm_to, ali_from, ali_to,
                hsp.env_start.ok_or_else(|| missing("env from"))? + 1,
                hsp.env_end.ok_or_else(|| missing("env to"))?,
                hsp.acc_avg.ok_or_else(|| missing("acc"))?,
                hit.description.as_deref().unwrap_or(""),
                tw = tnamew, taw = taccw, qw = qnamew, qaw = qaccw,
            );
        }
    }

    conn.write_all(formatted.as_bytes())?;
    Ok(())
}

/// Format `value` like the C `%.{precision}g` conversion
///
/// Uses exponential notation if the exponent is below -4 or at least
/// `precision`, and removes trailing zeros.
///
pub fn format_g(
    value: f64,
    precision: usize,
) -> String {
    let precision = precision.max(1);
    if value == 0.0 {
        return "0".to_string()
    }
    if !value.is_finite() {
        return value.to_string()
    }

    let scientific = format!("{:.*e}", precision - 1, value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some(parts) => parts,
        None => return scientific,
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= precision as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", strip_zeros(mantissa), sign, exponent.abs())
    } else {
        let decimals = (precision as i32 - 1 - exponent) as usize;
        strip_zeros(&format!("{:.*}", decimals, value))
    }
}

fn strip_zeros(
    number: &str,
) -> String {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        number.to_string()
    }
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn format_g_like_printf() {
        use super::format_g;

        assert_eq!(format_g(4.1e-79, 2), "4.1e-79");
        assert_eq!(format_g(2e-08, 2), "2e-08");
        assert_eq!(format_g(0.16, 2), "0.16");
        assert_eq!(format_g(0.0001, 2), "0.0001");
        assert_eq!(format_g(12.0, 2), "12");
        assert_eq!(format_g(120.0, 2), "1.2e+02");
        assert_eq!(format_g(3.0, 2), "3");
        assert_eq!(format_g(0.0, 2), "0");
    }

    #[test]
    fn format_domtab_row() {
        use super::format_query;
        use crate::Hit;
        use crate::Hsp;
        use crate::HspFragment;
        use crate::QueryResult;
        use crate::Strand;

        let fragment = HspFragment {
            hit_start: Some(0), hit_end: Some(260), hit_strand: Some(Strand::Forward),
            query_start: Some(491), query_end: Some(744), query_strand: Some(Strand::Forward),
            ..Default::default()
        };
        let hsp = Hsp {
            domain_index: Some(1), evalue_cond: Some(7.1e-82), evalue: Some(5.3e-79),
            bitscore: Some(263.2), bias: Some(0.0), env_start: Some(491), env_end: Some(744),
            acc_avg: Some(0.96), fragment,
            ..Default::default()
        };
        let hit = Hit {
            id: "Pkinase".to_string(), acc: Some("PF00069.17".to_string()), seq_len: Some(260),
            evalue: Some(4.1e-79), bitscore: Some(263.6), bias: Some(0.0),
            description: Some("Protein kinase domain".to_string()), hsps: vec![hsp],
            ..Default::default()
        };
        let query = QueryResult { id: "q1".to_string(), seq_len: Some(1107), hits: vec![hit], ..Default::default() };

        let mut got: Vec<u8> = Vec::new();
        format_query(&query, true, &mut got).unwrap();

        let expected = b"Pkinase              PF00069.17   260 q1                   -           1107   4.1e-79  263.6   0.0   1   1   7.1e-82   5.3e-79  263.2   0.0     1   260   492   744   492   744 0.96 Protein kinase domain\n".to_vec();
        assert_eq!(String::from_utf8(got).unwrap(), String::from_utf8(expected).unwrap());
    }

    #[test]
    fn format_domtab_missing_values() {
        use super::format_query;
        use crate::Hit;
        use crate::Hsp;
        use crate::QueryResult;

        let hit = Hit { id: "s1".to_string(), hsps: vec![Hsp::default()], ..Default::default() };
        let query = QueryResult { id: "q1".to_string(), seq_len: Some(100), hits: vec![hit], ..Default::default() };

        let mut got: Vec<u8> = Vec::new();
        assert!(format_query(&query, true, &mut got).is_err());
        assert!(got.is_empty());
    }

    #[test]
    fn format_header_widths() {
        use super::format_header;

        let header = format_header(None);
        let lines: Vec<&str> = header.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("#"));
        assert!(lines[1].starts_with("# target name        accession  "));
        assert!(lines[2].starts_with("#------------------- ---------- -----"));
    }
}
