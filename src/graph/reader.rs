//! Graph-property reader (C2): a single streaming pass that counts
//! vertices/edges and emits the side files external metric scripts need.

use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Vertex and edge counts from a single pass over a graph file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphCounts {
    pub vertices: u64,
    pub edges: u64,
}

impl GraphCounts {
    /// `density = E / V²`, computed directly from the counts (§4.2).
    /// Returns `0.0` for an empty graph rather than dividing by zero.
    pub fn density(&self) -> f64 {
        if self.vertices == 0 {
            return 0.0;
        }
        self.edges as f64 / (self.vertices as f64 * self.vertices as f64)
    }
}

/// Strips a `%` comment from a line, returning the part before it.
fn strip_comment(line: &str) -> &str {
    match line.find('%') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Streams a graph file once, counting vertices/edges and writing the
/// `vertices_<id>.txt` / `edges_<id>.txt` side files that external metric
/// scripts consume. `id` is a unique key (the partition ordinal) so
/// concurrent invocations never collide on temp-file names (§4.2).
pub struct GraphReader;

impl GraphReader {
    /// Read `graph_path`, writing vertex ids (one per line) to
    /// `vertices_<id>.txt` and `a b` edge pairs to `edges_<id>.txt` inside
    /// `work_dir`. Returns the counts and the two side-file paths.
    pub fn read(
        graph_path: &Path,
        work_dir: &Path,
        id: u64,
    ) -> Result<(GraphCounts, PathBuf, PathBuf)> {
        let file = std::fs::File::open(graph_path)?;
        let reader = BufReader::new(file);

        let vertices_path = work_dir.join(format!("vertices_{id}.txt"));
        let edges_path = work_dir.join(format!("edges_{id}.txt"));
        let mut vertices_out = BufWriter::new(std::fs::File::create(&vertices_path)?);
        let mut edges_out = BufWriter::new(std::fs::File::create(&edges_path)?);

        let mut counts = GraphCounts { vertices: 0, edges: 0 };

        for line in reader.lines() {
            let line = line?;
            let body = strip_comment(&line);
            let body = body.trim();
            if body.is_empty() {
                continue;
            }
            let mut tokens = body.split_whitespace();
            match tokens.next() {
                Some("v") => {
                    if let Some(id_tok) = tokens.next() {
                        writeln!(vertices_out, "{id_tok}")?;
                        counts.vertices += 1;
                    }
                }
                Some("u") | Some("e") | Some("d") => {
                    let (Some(a), Some(b)) = (tokens.next(), tokens.next()) else {
                        continue;
                    };
                    writeln!(edges_out, "{a} {b}")?;
                    counts.edges += 1;
                }
                _ => {}
            }
        }

        vertices_out.flush()?;
        edges_out.flush()?;

        Ok((counts, vertices_path, edges_path))
    }

    /// Same as [`GraphReader::read`] but additionally writes a CSV edge
    /// file (`entropy_<id>_edges.csv`) for the entropy calculator, which
    /// expects comma-separated pairs rather than space-separated (§4.2).
    pub fn read_with_csv_edges(
        graph_path: &Path,
        work_dir: &Path,
        id: u64,
    ) -> Result<(GraphCounts, PathBuf, PathBuf, PathBuf)> {
        let (counts, vertices_path, edges_path) = Self::read(graph_path, work_dir, id)?;

        let csv_path = work_dir.join(format!("entropy_{id}_edges.csv"));
        let edges_text = std::fs::read_to_string(&edges_path)?;
        let mut csv_out = BufWriter::new(std::fs::File::create(&csv_path)?);
        for line in edges_text.lines() {
            let mut parts = line.split_whitespace();
            if let (Some(a), Some(b)) = (parts.next(), parts.next()) {
                writeln!(csv_out, "{a},{b}")?;
            }
        }
        csv_out.flush()?;

        Ok((counts, vertices_path, edges_path, csv_path))
    }

    /// Remove the temp files produced by [`GraphReader::read`] plus the
    /// named metric output file, per the driver's cleanup contract (§4.2).
    pub fn cleanup(work_dir: &Path, id: u64, metric: &str) -> Result<()> {
        for name in [
            format!("vertices_{id}.txt"),
            format!("edges_{id}.txt"),
            format!("{metric}_{id}.txt"),
        ] {
            let path = work_dir.join(name);
            if path.exists() {
                std::fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_graph(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn counts_vertices_and_edges() {
        let dir = tempdir().unwrap();
        let graph = write_graph(
            dir.path(),
            "g1.txt",
            "v 1 a\nv 2 b\nv 3 c\nv 4 d\nu 1 2 rel\nu 2 3 rel\nd 3 4 rel\n",
        );
        let (counts, _, _) = GraphReader::read(&graph, dir.path(), 1).unwrap();
        assert_eq!(counts.vertices, 4);
        assert_eq!(counts.edges, 3);
    }

    #[test]
    fn density_is_edges_over_vertices_squared() {
        let counts = GraphCounts { vertices: 4, edges: 3 };
        assert!((counts.density() - (3.0 / 16.0)).abs() < 1e-12);
    }

    #[test]
    fn empty_graph_has_zero_density() {
        let counts = GraphCounts { vertices: 0, edges: 0 };
        assert_eq!(counts.density(), 0.0);
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let dir = tempdir().unwrap();
        let graph = write_graph(
            dir.path(),
            "g2.txt",
            "% header comment\n\n   \nv 1 a\n% inline before edge\nv 2 b\nu 1 2 rel % trailing\n",
        );
        let (counts, _, edges_path) = GraphReader::read(&graph, dir.path(), 2).unwrap();
        assert_eq!(counts.vertices, 2);
        assert_eq!(counts.edges, 1);
        let edges = std::fs::read_to_string(edges_path).unwrap();
        assert_eq!(edges.trim(), "1 2");
    }

    #[test]
    fn side_files_use_the_given_id_to_avoid_collisions() {
        let dir = tempdir().unwrap();
        let graph = write_graph(dir.path(), "g3.txt", "v 1 a\nu 1 1 self\n");
        let (_, vpath, epath) = GraphReader::read(&graph, dir.path(), 7).unwrap();
        assert!(vpath.ends_with("vertices_7.txt"));
        assert!(epath.ends_with("edges_7.txt"));
    }

    #[test]
    fn cleanup_removes_temp_files() {
        let dir = tempdir().unwrap();
        let graph = write_graph(dir.path(), "g4.txt", "v 1 a\n");
        GraphReader::read(&graph, dir.path(), 9).unwrap();
        std::fs::write(dir.path().join("density_9.txt"), "0.5\n").unwrap();
        GraphReader::cleanup(dir.path(), 9, "density").unwrap();
        assert!(!dir.path().join("vertices_9.txt").exists());
        assert!(!dir.path().join("edges_9.txt").exists());
        assert!(!dir.path().join("density_9.txt").exists());
    }

    #[test]
    fn csv_edges_are_comma_separated() {
        let dir = tempdir().unwrap();
        let graph = write_graph(dir.path(), "g5.txt", "v 1 a\nv 2 b\nu 1 2 rel\n");
        let (_, _, _, csv_path) = GraphReader::read_with_csv_edges(&graph, dir.path(), 3).unwrap();
        let csv = std::fs::read_to_string(csv_path).unwrap();
        assert_eq!(csv.trim(), "1,2");
    }
}
