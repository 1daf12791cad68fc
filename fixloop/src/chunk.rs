//! Output truncation strategies for captured command output.
//!
//! Both strategies are pure functions over text and a line budget so they can
//! be tested without running any commands.

use anyhow::{Result, bail};

/// How to cut captured command output down to the configured line budget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChunkStrategy {
    /// Keep the first `max_lines` lines verbatim.
    #[default]
    None,
    /// Keep whole blank-line-separated chunks while they fit the budget.
    SeparatedByEmptyLines,
}

impl ChunkStrategy {
    /// Parse the configuration spelling of a strategy.
    pub fn from_config(value: &str) -> Result<Self> {
        match value {
            "None" => Ok(Self::None),
            "SeparatedByEmptyLines" => Ok(Self::SeparatedByEmptyLines),
            other => bail!(
                "unknown chunk_output_strategy '{other}' (expected 'None' or 'SeparatedByEmptyLines')"
            ),
        }
    }
}

/// Truncate `output` to at most `max_lines` lines using `strategy`.
///
/// Budgets are line-indexed, not byte-indexed. With
/// [`ChunkStrategy::SeparatedByEmptyLines`], a chunk is a maximal run of
/// non-blank lines; each kept chunk costs its line count plus one for the
/// separating blank line, and no partial chunk is ever emitted.
pub fn truncate_output(output: &str, max_lines: usize, strategy: ChunkStrategy) -> String {
    match strategy {
        ChunkStrategy::None => output
            .split('\n')
            .take(max_lines)
            .collect::<Vec<_>>()
            .join("\n"),
        ChunkStrategy::SeparatedByEmptyLines => keep_whole_chunks(output, max_lines),
    }
}

fn keep_whole_chunks(output: &str, max_lines: usize) -> String {
    let mut kept: Vec<&str> = Vec::new();
    let mut used = 0usize;

    for chunk in split_chunks(output) {
        let cost = chunk.len() + 1;
        if used + cost > max_lines {
            break;
        }
        used += cost;
        kept.extend(chunk);
        kept.push("");
    }

    while kept.last().is_some_and(|line| line.is_empty()) {
        kept.pop();
    }
    kept.join("\n")
}

/// Split output into maximal runs of non-blank lines.
///
/// A line counts as blank when it is empty or whitespace-only.
fn split_chunks(output: &str) -> Vec<Vec<&str>> {
    let mut chunks = Vec::new();
    let mut current = Vec::new();
    for line in output.split('\n') {
        if line.trim().is_empty() {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
