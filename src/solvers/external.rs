//! External-process refinement backend.
//!
//! Serializes the whole problem to a text file, launches a separate optimizer
//! executable on it, and reads the refined transforms back from the same
//! file. The text format is the fixed contract between the two processes:
//!
//! ```text
//! <image count>
//! <index> <h0> .. <h8>        (one line per image, ascending index)
//! <pair count>
//! <i> <j> <count> <x1> <y1> <x2> <y2> ..   (one line per pairwise record)
//! ```
//!
//! The executable is expected to overwrite the file with its result: a count
//! line followed by one `<index> <h0> .. <h8>` line per image. The child is
//! waited on without a timeout, so a hanging optimizer hangs the caller too.

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use std::process::Command;

use crate::error::{AlignError, Result};
use crate::images::ImageSet;
use crate::types::{matrix_from_row_major, matrix_to_row_major, AbsoluteHomographies};

use super::{RefineProblem, SolverBackend};

/// Backend that delegates refinement to a separate optimizer binary.
#[derive(Debug, Clone)]
pub struct ExternalSolver {
    executable: PathBuf,
    problem_path: PathBuf,
}

impl ExternalSolver {
    /// `executable` is launched with `problem_path` as its only argument.
    pub fn new(executable: impl Into<PathBuf>, problem_path: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            problem_path: problem_path.into(),
        }
    }
}

impl SolverBackend for ExternalSolver {
    fn name(&self) -> &'static str {
        "external-process"
    }

    fn refine(&self, problem: &RefineProblem<'_>) -> Result<AbsoluteHomographies> {
        fs::write(&self.problem_path, problem_to_string(problem)?)?;

        let status = Command::new(&self.executable)
            .arg(&self.problem_path)
            .status();
        let status = match status {
            Ok(status) => status,
            Err(e) => {
                let _ = fs::remove_file(&self.problem_path);
                return Err(AlignError::ExternalSolver {
                    reason: format!("failed to launch {}: {e}", self.executable.display()),
                });
            }
        };
        if !status.success() {
            let _ = fs::remove_file(&self.problem_path);
            return Err(AlignError::ExternalSolver {
                reason: format!("{} exited with {status}", self.executable.display()),
            });
        }

        let text = fs::read_to_string(&self.problem_path)?;
        let _ = fs::remove_file(&self.problem_path);
        parse_result(&text, problem.images)
    }
}

/// Serialize a refinement problem into the exchange format.
///
/// Pairwise records appear in insertion order and every correspondence is
/// written up to the inlier cap; the external optimizer applies its own
/// robust loss instead of consuming the inlier mask.
pub fn problem_to_string(problem: &RefineProblem<'_>) -> Result<String> {
    let mut out = String::new();
    let _ = writeln!(out, "{}", problem.images.len());

    for (i, name) in problem.images.names().iter().enumerate() {
        let h = problem
            .initial
            .get(name)
            .ok_or_else(|| AlignError::MissingAbsolute {
                image: name.clone(),
            })?;
        let _ = write!(out, "{i}");
        for value in matrix_to_row_major(h) {
            let _ = write!(out, " {value}");
        }
        out.push('\n');
    }

    let _ = writeln!(out, "{}", problem.pairwise.len());
    for record in problem.pairwise.iter() {
        let count = record.correspondences.len().min(problem.inlier_cap);
        let _ = write!(out, "{} {} {count}", record.from, record.to);
        for (p, q) in record.correspondences.iter().take(count) {
            let _ = write!(out, " {} {} {} {}", p.x, p.y, q.x, q.y);
        }
        out.push('\n');
    }
    Ok(out)
}

/// Parse an optimizer result back into absolute transforms.
///
/// Blank lines are skipped and parsing stops once the announced number of
/// transforms has been read, so trailing content is ignored.
pub fn parse_result(text: &str, images: &ImageSet) -> Result<AbsoluteHomographies> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let count: usize = lines
        .next()
        .ok_or_else(|| malformed("empty result file"))?
        .trim()
        .parse()
        .map_err(|_| malformed("result count is not an integer"))?;

    let mut refined = AbsoluteHomographies::new();
    for _ in 0..count {
        let line = lines
            .next()
            .ok_or_else(|| malformed("result ended before the announced count"))?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 10 {
            return Err(malformed("expected an index and nine matrix entries"));
        }
        let index: usize = fields[0]
            .parse()
            .map_err(|_| malformed("image index is not an integer"))?;
        let name = images
            .name_of(index)
            .ok_or_else(|| malformed("image index out of range"))?;
        let mut row_major = [0.0; 9];
        for (slot, field) in row_major.iter_mut().zip(&fields[1..]) {
            *slot = field
                .parse()
                .map_err(|_| malformed("matrix entry is not a number"))?;
        }
        refined.insert(name.to_string(), matrix_from_row_major(&row_major));
    }
    Ok(refined)
}

fn malformed(detail: &str) -> AlignError {
    AlignError::ExternalSolver {
        reason: format!("malformed result: {detail}"),
    }
}
