//! Status-file domain types
//!
//! The workflow tool appends one line per job to `status.csv` and rewrites
//! the state column as jobs progress. A snapshot is one read of that file.

/// Counts taken from a single read of a status file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusSnapshot {
    /// Lines in the file after skipping header lines
    pub lines: usize,
    pub finished: usize,
    pub failed: usize,
}

impl StatusSnapshot {
    /// Counts lines the way `wc -l` and `grep -c` would
    ///
    /// `header_lines` leading lines are dropped before counting.
    /// A line counts as finished or failed when it contains the marker.
    pub fn from_contents(
        contents: &str,
        header_lines: usize,
        finished_marker: &str,
        failed_marker: &str,
    ) -> Self {
        Self::count(contents, header_lines, |line| {
            (line.contains(finished_marker), line.contains(failed_marker))
        })
    }

    /// Same as [`StatusSnapshot::from_contents`] with a caller-supplied
    /// classifier returning `(finished, failed)` for each line
    pub fn count<F>(contents: &str, header_lines: usize, mut classify: F) -> Self
    where
        F: FnMut(&str) -> (bool, bool),
    {
        let mut snapshot = StatusSnapshot::default();

        for line in contents.lines().skip(header_lines) {
            snapshot.lines += 1;
            let (finished, failed) = classify(line);
            if finished {
                snapshot.finished += 1;
            }
            if failed {
                snapshot.failed += 1;
            }
        }

        snapshot
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}
