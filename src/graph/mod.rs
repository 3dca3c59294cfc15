//! Graph text format parsing and the property reader (C2).
//!
//! See SPEC_FULL.md §6 for the wire format and §4.2 for the reader's
//! contract with external metric scripts.

mod graphops;
mod reader;

pub use graphops::{parse_graph, write_graph, GraphRecord};
pub use reader::{GraphCounts, GraphReader};
