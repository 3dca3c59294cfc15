//! `graphops` — graph allocation/parsing helpers.
//!
//! A faithful but trivial port of the original `graphops.c`: it recognizes
//! the four record kinds of the graph text format and can round-trip a
//! file. Per SPEC_FULL.md §1 and §4.2, the coordinator loop never calls
//! this parser directly — it only needs vertex/edge *counts*, which
//! [`crate::graph::GraphReader`] computes with a cheaper single pass. This
//! module exists for completeness and is exercised only by its own tests.

use std::fmt;

/// One parsed line of a graph text file.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphRecord {
    Vertex { id: u64, label: String },
    UndirectedEdge { a: u64, b: u64, label: String },
    DirectedEdge { a: u64, b: u64, label: String },
    Comment(String),
}

impl fmt::Display for GraphRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphRecord::Vertex { id, label } => write!(f, "v {id} {}", quote_if_needed(label)),
            GraphRecord::UndirectedEdge { a, b, label } => {
                write!(f, "u {a} {b} {}", quote_if_needed(label))
            }
            GraphRecord::DirectedEdge { a, b, label } => {
                write!(f, "d {a} {b} {}", quote_if_needed(label))
            }
            GraphRecord::Comment(text) => write!(f, "% {text}"),
        }
    }
}

fn quote_if_needed(label: &str) -> String {
    if label.contains(char::is_whitespace) {
        format!("\"{label}\"")
    } else {
        label.to_string()
    }
}

/// Split a line into whitespace-separated tokens, honoring double quotes
/// around a label that may embed whitespace (§6).
fn tokenize_line(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();
    let mut current = String::new();
    let mut in_quotes = false;

    while let Some(c) = chars.next() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Parse a full graph text stream into records. Blank lines are skipped.
/// `%` comments run to end-of-line and are preserved as [`GraphRecord::Comment`].
pub fn parse_graph(text: &str) -> Vec<GraphRecord> {
    let mut records = Vec::new();
    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix('%') {
            records.push(GraphRecord::Comment(rest.trim().to_string()));
            continue;
        }

        let tokens = tokenize_line(line);
        if tokens.is_empty() {
            continue;
        }

        match tokens[0].as_str() {
            "v" if tokens.len() >= 2 => {
                if let Ok(id) = tokens[1].parse::<u64>() {
                    let label = tokens.get(2).cloned().unwrap_or_default();
                    records.push(GraphRecord::Vertex { id, label });
                }
            }
            "u" | "e" if tokens.len() >= 3 => {
                if let (Ok(a), Ok(b)) = (tokens[1].parse::<u64>(), tokens[2].parse::<u64>()) {
                    let label = tokens.get(3).cloned().unwrap_or_default();
                    records.push(GraphRecord::UndirectedEdge { a, b, label });
                }
            }
            "d" if tokens.len() >= 3 => {
                if let (Ok(a), Ok(b)) = (tokens[1].parse::<u64>(), tokens[2].parse::<u64>()) {
                    let label = tokens.get(3).cloned().unwrap_or_default();
                    records.push(GraphRecord::DirectedEdge { a, b, label });
                }
            }
            _ => {
                // Unrecognized record kind: skip rather than fail, matching
                // the reader's tolerance for malformed lines (§4.2).
            }
        }
    }
    records
}

/// Re-serialize records back into graph text format, one record per line.
pub fn write_graph(records: &[GraphRecord]) -> String {
    let mut out = String::new();
    for record in records {
        out.push_str(&record.to_string());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_record_kinds() {
        let text = "% a comment\nv 1 foo\nv 2 bar\nu 1 2 edgeLabel\nd 2 1 other\n";
        let records = parse_graph(text);
        assert_eq!(
            records,
            vec![
                GraphRecord::Comment("a comment".to_string()),
                GraphRecord::Vertex { id: 1, label: "foo".to_string() },
                GraphRecord::Vertex { id: 2, label: "bar".to_string() },
                GraphRecord::UndirectedEdge { a: 1, b: 2, label: "edgeLabel".to_string() },
                GraphRecord::DirectedEdge { a: 2, b: 1, label: "other".to_string() },
            ]
        );
    }

    #[test]
    fn tolerates_blank_and_whitespace_only_lines() {
        let text = "v 1 x\n\n   \nv 2 y\n";
        let records = parse_graph(text);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn quoted_labels_round_trip() {
        let text = "v 1 \"two words\"\n";
        let records = parse_graph(text);
        assert_eq!(
            records[0],
            GraphRecord::Vertex { id: 1, label: "two words".to_string() }
        );
        let back = write_graph(&records);
        let reparsed = parse_graph(&back);
        assert_eq!(records, reparsed);
    }

    #[test]
    fn e_is_accepted_as_an_alias_for_u() {
        let records = parse_graph("v 1 a\nv 2 b\ne 1 2 rel\n");
        assert_eq!(
            records[2],
            GraphRecord::UndirectedEdge { a: 1, b: 2, label: "rel".to_string() }
        );
    }
}
