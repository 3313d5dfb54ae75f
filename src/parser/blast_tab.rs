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

use crate::columns::Field;
use crate::parser::DecodedRow;
use crate::parser::RowError;
use crate::QueryResult;

type E = Box<dyn std::error::Error>;

/// Decode a line from a BLAST+ table
///
/// Splits `line` on tabs and assigns the values to the record levels
/// according to `fields`. Columns that are known but not read are skipped.
///
/// Returns an error if the number of values differs from the number of
/// columns or if a value can't be cast into the column type.
///
pub fn decode_row(
    line: &str,
    line_no: usize,
    fields: &[Field],
) -> Result<DecodedRow, E> {
    let values: Vec<&str> = line.split('\t').collect();
    if values.len() != fields.len() {
        return Err(Box::new(RowError::ColumnCount { line: line_no, expected: fields.len(), found: values.len() }))
    }

    let mut row = DecodedRow { line: line_no, ..Default::default() };
    for (field, value) in fields.iter().zip(values) {
        match field.column {
            Some(column) => {
                column.assign(value, &mut row).map_err(|_| {
                    RowError::Value { line: line_no, column: field.name.clone(), value: value.to_string() }
                })?
            },
            None => debug_assert!(matches!(crate::columns::resolve(&field.name), Ok(None))),
        }
    }
    row.resolve_keys();

    Ok(row)
}

/// Contents of one `#` line in a commented BLAST+ table.
#[derive(Clone, Debug, PartialEq)]
pub enum CommentLine {
    /// `# BLASTN 2.2.26+`
    Program { program: String, version: Option<String> },
    /// `# Query: id description`
    Query { id: String, description: Option<String> },
    /// `# RID: id`
    Rid(String),
    /// `# Database: name`
    Database(String),
    /// `# Fields: long name, long name, ...`
    Fields(Vec<Field>),
    /// `# N hits found` or `# BLAST processed N queries`
    End,
    Other,
}

/// Parse a `#` line from a commented BLAST+ table
///
/// Fails if a `# Fields:` line contains unknown column descriptions or is
/// missing the query or hit key column.
///
pub fn parse_comment_line(
    line: &str,
) -> Result<CommentLine, E> {
    let line = line.trim_end();
    let parsed = if let Some(rest) = line.strip_prefix("# Query:") {
        let rest = rest.trim_start();
        match rest.split_once(' ') {
            Some((id, description)) => CommentLine::Query { id: id.to_string(), description: Some(description.to_string()) },
            None => CommentLine::Query { id: rest.to_string(), description: None },
        }
    } else if let Some(rest) = line.strip_prefix("# RID:") {
        CommentLine::Rid(rest.trim_start().to_string())
    } else if let Some(rest) = line.strip_prefix("# Database:") {
        CommentLine::Database(rest.trim_start().to_string())
    } else if let Some(rest) = line.strip_prefix("# Fields:") {
        let short_names = rest.trim_start().split(", ")
            .map(crate::columns::long_to_short)
            .collect::<Result<Vec<&str>, _>>()?;
        CommentLine::Fields(crate::columns::prepare_field_list(&short_names)?)
    } else if line.contains(" hits found") || line.contains("processed") {
        CommentLine::End
    } else if line.contains("BLAST") {
        let rest = line.trim_start_matches('#').trim_start();
        match rest.split_once(' ') {
            Some((program, version)) => CommentLine::Program { program: program.to_lowercase(), version: Some(version.to_string()) },
            None => CommentLine::Program { program: rest.to_lowercase(), version: None },
        }
    } else {
        CommentLine::Other
    };

    Ok(parsed)
}

/// Metadata from the comment block preceding the rows of a query.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommentBlock {
    pub program: Option<String>,
    pub version: Option<String>,
    pub query_id: Option<String>,
    pub description: Option<String>,
    pub rid: Option<String>,
    pub target: Option<String>,
    /// Columns of the rows in this block.
    pub fields: Option<Vec<Field>>,
}

impl CommentBlock {
    pub fn update(
        &mut self,
        line: CommentLine,
    ) {
        match line {
            CommentLine::Program { program, version } => {
                self.program = Some(program);
                self.version = version;
            },
            CommentLine::Query { id, description } => {
                self.query_id = Some(id);
                self.description = description;
            },
            CommentLine::Rid(rid) => self.rid = Some(rid),
            CommentLine::Database(target) => self.target = Some(target),
            CommentLine::Fields(fields) => self.fields = Some(fields),
            CommentLine::End | CommentLine::Other => (),
        }
    }

    /// Copy the metadata into a query parsed from this block.
    pub fn apply(
        &self,
        query: &mut QueryResult,
    ) {
        if let Some(id) = &self.query_id {
            if query.id != *id {
                query.id = id.clone();
                query.hits.iter_mut().for_each(|hit| {
                    hit.query_id = id.clone();
                    hit.hsps.iter_mut().for_each(|hsp| hsp.fragment.query_id = id.clone());
                });
            }
        }
        if self.description.is_some() {
            query.description = self.description.clone();
        }
        if self.program.is_some() {
            query.program = self.program.clone();
        }
        if self.version.is_some() {
            query.version = self.version.clone();
        }
        if self.target.is_some() {
            query.target = self.target.clone();
        }
        if self.rid.is_some() {
            query.rid = self.rid.clone();
        }
    }
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn decode_default_row() {
        use super::decode_row;
        use crate::columns::default_fields;

        let line = "gi|16080617|ref|NP_391444.1|\tgi|386733873|ref|YP_006207584.1|\t100.00\t102\t0\t0\t1\t102\t1\t102\t3e-68\t 204";
        let got = decode_row(line, 3, &default_fields()).unwrap();

        assert_eq!(got.line, 3);
        assert_eq!(got.query.id, "gi|16080617|ref|NP_391444.1|");
        assert_eq!(got.hit.id, "gi|386733873|ref|YP_006207584.1|");
        assert_eq!(got.hit.query_id, "gi|16080617|ref|NP_391444.1|");
        assert_eq!(got.hsp.ident_pct, Some(100.0));
        assert_eq!(got.hsp.evalue, Some(3e-68));
        assert_eq!(got.hsp.bitscore, Some(204.0));
        assert_eq!(got.frag.aln_span, Some(102));
        assert_eq!((got.frag.hit_start, got.frag.hit_end), (Some(1), Some(102)));
    }

    #[test]
    fn decode_row_column_count() {
        use super::decode_row;
        use crate::columns::default_fields;
        use crate::parser::RowError;

        let got = decode_row("q1\ts1\t100.00", 9, &default_fields()).unwrap_err();

        assert_eq!(got.downcast_ref::<RowError>(), Some(&RowError::ColumnCount { line: 9, expected: 12, found: 3 }));
    }

    #[test]
    fn decode_row_skips_ignored_columns() {
        use super::decode_row;
        use crate::columns::prepare_fields;

        let fields = prepare_fields("qaccver saccver staxids sstrand evalue").unwrap();
        let got = decode_row("Q1.1\tS1.2\t9606;10090\tplus\t1e-5", 1, &fields).unwrap();

        assert_eq!(got.keys(), ("Q1.1", "S1.2"));
        assert_eq!(got.hsp.evalue, Some(1e-5));
    }

    #[test]
    fn parse_comment_lines() {
        use super::parse_comment_line;
        use super::CommentLine;

        assert_eq!(parse_comment_line("# BLASTX 2.2.26+").unwrap(), CommentLine::Program { program: "blastx".to_string(), version: Some("2.2.26+".to_string()) });
        assert_eq!(parse_comment_line("# Query: gi|356995852 Mus musculus POU domain").unwrap(), CommentLine::Query { id: "gi|356995852".to_string(), description: Some("Mus musculus POU domain".to_string()) });
        assert_eq!(parse_comment_line("# Query: q1").unwrap(), CommentLine::Query { id: "q1".to_string(), description: None });
        assert_eq!(parse_comment_line("# RID: 5P6XDKSF01R").unwrap(), CommentLine::Rid("5P6XDKSF01R".to_string()));
        assert_eq!(parse_comment_line("# Database: db/minirefseq_protein").unwrap(), CommentLine::Database("db/minirefseq_protein".to_string()));
        assert_eq!(parse_comment_line("# 0 hits found").unwrap(), CommentLine::End);
        assert_eq!(parse_comment_line("# BLAST processed 3 queries").unwrap(), CommentLine::End);
        assert_eq!(parse_comment_line("# something else").unwrap(), CommentLine::Other);
    }

    #[test]
    fn parse_fields_comment_line() {
        use super::parse_comment_line;
        use super::CommentLine;

        let got = parse_comment_line("# Fields: query id, subject id, q. start, evalue, bit score").unwrap();
        let names: Vec<String> = match got {
            CommentLine::Fields(fields) => fields.into_iter().map(|x| x.name).collect(),
            _ => panic!("expected fields"),
        };

        assert_eq!(names, vec!["qseqid", "sseqid", "qstart", "evalue", "bitscore"]);
        assert!(parse_comment_line("# Fields: query id, favourite colour").is_err());
        assert!(parse_comment_line("# Fields: subject id, evalue").is_err());
    }

    #[test]
    fn apply_comment_block() {
        use super::CommentBlock;
        use crate::Hit;
        use crate::QueryResult;

        let block = CommentBlock {
            program: Some("blastn".to_string()),
            query_id: Some("q1".to_string()),
            description: Some("first query".to_string()),
            target: Some("nt".to_string()),
            ..Default::default()
        };
        let mut query = QueryResult { id: "Q1.1".to_string(), hits: vec![Hit { id: "s1".to_string(), query_id: "Q1.1".to_string(), ..Default::default() }], ..Default::default() };
        block.apply(&mut query);

        assert_eq!(query.id, "q1");
        assert_eq!(query.hits[0].query_id, "q1");
        assert_eq!(query.description, Some("first query".to_string()));
        assert_eq!(query.target, Some("nt".to_string()));
        assert_eq!(query.rid, None);
    }
}
