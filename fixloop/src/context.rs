//! Store of files currently visible to the collaborator.
//!
//! Each tracked file is keyed by absolute path and optionally carries a list
//! of inclusive 1-based line ranges; a file without ranges is visible in
//! full. The fix loop mutates the store in place between iterations, so all
//! operations are idempotent and iteration order is deterministic.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

/// Marker emitted between rendered line ranges.
const RANGE_ELLIPSIS: &str = "...";

/// Tracked files and their optional visible line ranges.
#[derive(Debug, Clone, Default)]
pub struct ContextFileStore {
    files: BTreeMap<PathBuf, Option<Vec<(usize, usize)>>>,
    root: PathBuf,
}

impl ContextFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Root directory used for relative-path computation.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Set the root explicitly, e.g. from a version-control toplevel the
    /// collaborator already knows.
    pub fn set_root(&mut self, root: impl Into<PathBuf>) {
        self.root = root.into();
    }

    /// Infer the root from the tracked files: the parent directory when one
    /// file is tracked, the deepest common ancestor when several are, and the
    /// current directory when the store is empty.
    pub fn infer_root(&mut self) -> Result<()> {
        let paths: Vec<&PathBuf> = self.files.keys().collect();
        self.root = match paths.as_slice() {
            [] => std::env::current_dir().context("resolve current directory")?,
            [only] => only
                .parent()
                .unwrap_or_else(|| Path::new("/"))
                .to_path_buf(),
            many => common_ancestor(many),
        };
        debug!(root = %self.root.display(), "inferred context root");
        Ok(())
    }

    /// Track a file in full. Adding an already-tracked file keeps its ranges.
    pub fn add(&mut self, path: impl Into<PathBuf>) {
        self.files.entry(path.into()).or_insert(None);
    }

    /// Track a file restricted to `ranges` (inclusive, 1-based). Ranges are
    /// sorted and merged on insert; existing ranges for the file are replaced.
    pub fn add_with_ranges(&mut self, path: impl Into<PathBuf>, ranges: Vec<(usize, usize)>) {
        self.files.insert(path.into(), Some(normalize_ranges(ranges)));
    }

    /// Stop tracking a file and discard any attached ranges.
    pub fn remove(&mut self, path: &Path) {
        self.files.remove(path);
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    pub fn has_files(&self) -> bool {
        !self.files.is_empty()
    }

    /// Tracked absolute paths in sorted order.
    pub fn files(&self) -> Vec<PathBuf> {
        self.files.keys().cloned().collect()
    }

    /// Ranges attached to `path`, if the file is tracked with ranges.
    pub fn ranges(&self, path: &Path) -> Option<&[(usize, usize)]> {
        self.files.get(path).and_then(|r| r.as_deref())
    }

    /// Path of `absolute` relative to the store root, used for display and
    /// for substring matching against command output.
    pub fn rel_path(&self, absolute: &Path) -> String {
        absolute
            .strip_prefix(&self.root)
            .unwrap_or(absolute)
            .to_string_lossy()
            .into_owned()
    }

    /// Recompute the retained set from `output`: a file survives only when
    /// its relative path occurs as a literal substring of the output.
    ///
    /// Returns the dropped relative paths in sorted order.
    pub fn retain_mentioned(&mut self, output: &str) -> Vec<String> {
        let dropped: Vec<PathBuf> = self
            .files
            .keys()
            .filter(|path| !output.contains(self.rel_path(path).as_str()))
            .cloned()
            .collect();

        let mut dropped_rel = Vec::with_capacity(dropped.len());
        for path in dropped {
            dropped_rel.push(self.rel_path(&path));
            self.files.remove(&path);
        }
        dropped_rel
    }

    /// Read every tracked file, dropping entries whose content can no longer
    /// be read. The check is lazy: unreadable files stay tracked until the
    /// next enumeration.
    pub fn collect_contents(&mut self) -> Vec<(PathBuf, String)> {
        let mut contents = Vec::new();
        for path in self.files() {
            match fs::read_to_string(&path) {
                Ok(content) => contents.push((path, content)),
                Err(err) => {
                    warn!(
                        file = %self.rel_path(&path),
                        err = %err,
                        "dropping unreadable file from context"
                    );
                    self.files.remove(&path);
                }
            }
        }
        contents
    }

    /// Render `content` for presentation.
    ///
    /// When `path` carries ranges and numbering is enabled, only in-range
    /// lines are emitted, each prefixed with its 1-based line number, with an
    /// ellipsis marker between ranges. Otherwise the full content is emitted,
    /// numbered from 1 when requested. Range-limited rendering without line
    /// numbers would be ambiguous, so ranges only apply when numbering is on.
    pub fn render(&self, path: &Path, content: &str, with_line_numbers: bool) -> String {
        let lines: Vec<&str> = content.lines().collect();
        match (self.ranges(path), with_line_numbers) {
            (Some(ranges), true) => {
                let mut sections = Vec::with_capacity(ranges.len());
                for &(start, end) in ranges {
                    let mut section = String::new();
                    for number in start..=end.min(lines.len()) {
                        section.push_str(&numbered_line(number, lines[number - 1]));
                    }
                    sections.push(section);
                }
                sections.join(&format!("{RANGE_ELLIPSIS}\n"))
            }
            (_, true) => {
                let mut out = String::new();
                for (index, line) in lines.iter().enumerate() {
                    out.push_str(&numbered_line(index + 1, line));
                }
                out
            }
            (_, false) => content.to_string(),
        }
    }

    /// Display label for `path`: the relative path, suffixed with the visible
    /// ranges when the file is range-limited.
    pub fn label(&self, path: &Path) -> String {
        let rel = self.rel_path(path);
        match self.ranges(path) {
            Some(ranges) => {
                let spans: Vec<String> = ranges
                    .iter()
                    .map(|(start, end)| format!("{start}-{end}"))
                    .collect();
                format!("{rel}:{}", spans.join(","))
            }
            None => rel,
        }
    }
}

fn numbered_line(number: usize, line: &str) -> String {
    format!("{number}|\t{line}\n")
}

/// Sort ranges and merge overlapping or adjacent ones.
fn normalize_ranges(mut ranges: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
    ranges.sort_unstable();
    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(ranges.len());
    for (start, end) in ranges {
        match merged.last_mut() {
            Some(last) if start <= last.1 + 1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

/// Deepest common ancestor of a non-empty set of absolute paths.
fn common_ancestor(paths: &[&PathBuf]) -> PathBuf {
    let mut ancestor = paths[0]
        .parent()
        .unwrap_or_else(|| Path::new("/"))
        .to_path_buf();
    for path in &paths[1..] {
        while !path.starts_with(&ancestor) {
            let Some(parent) = ancestor.parent() else {
                return PathBuf::from("/");
            };
            ancestor = parent.to_path_buf();
        }
    }
    ancestor
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn store_with_root(root: &str) -> ContextFileStore {
        let mut store = ContextFileStore::new();
        store.set_root(root);
        store
    }

    #[test]
    fn add_and_remove_are_idempotent() {
        let mut store = store_with_root("/work");
        store.add("/work/src/a.py");
        store.add("/work/src/a.py");
        assert_eq!(store.files().len(), 1);

        store.remove(Path::new("/work/src/a.py"));
        store.remove(Path::new("/work/src/a.py"));
        assert!(!store.has_files());
    }

    #[test]
    fn re_adding_a_ranged_file_keeps_its_ranges() {
        let mut store = store_with_root("/work");
        store.add_with_ranges("/work/src/a.py", vec![(2, 3)]);
        store.add("/work/src/a.py");
        assert_eq!(store.ranges(Path::new("/work/src/a.py")), Some(&[(2, 3)][..]));
    }

    #[test]
    fn remove_clears_attached_ranges() {
        let mut store = store_with_root("/work");
        store.add_with_ranges("/work/src/a.py", vec![(2, 3)]);
        store.remove(Path::new("/work/src/a.py"));
        store.add("/work/src/a.py");
        assert_eq!(store.ranges(Path::new("/work/src/a.py")), None);
    }

    #[test]
    fn ranges_are_sorted_and_merged_on_insert() {
        let mut store = store_with_root("/work");
        store.add_with_ranges("/work/src/a.py", vec![(7, 9), (1, 3), (2, 5)]);
        assert_eq!(
            store.ranges(Path::new("/work/src/a.py")),
            Some(&[(1, 5), (7, 9)][..])
        );
    }

    /// Retention is recomputed from the current output only: a file whose
    /// relative path is absent from the output is dropped with its ranges.
    #[test]
    fn retain_mentioned_drops_unmentioned_files() {
        let mut store = store_with_root("/work");
        store.add("/work/src/a.py");
        store.add_with_ranges("/work/src/b.py", vec![(1, 2)]);

        let dropped = store.retain_mentioned("src/a.py:10: undefined name");

        assert_eq!(dropped, vec!["src/b.py".to_string()]);
        assert_eq!(store.files(), vec![PathBuf::from("/work/src/a.py")]);
    }

    #[test]
    fn retain_mentioned_keeps_everything_when_all_are_mentioned() {
        let mut store = store_with_root("/work");
        store.add("/work/src/a.py");
        store.add("/work/src/b.py");

        let dropped = store.retain_mentioned("src/a.py and src/b.py both failed");

        assert!(dropped.is_empty());
        assert_eq!(store.files().len(), 2);
    }

    /// Ranges `[(2,3),(7,7)]` with numbering render lines 2-3, an ellipsis
    /// marker, then line 7, and nothing else.
    #[test]
    fn render_ranged_file_with_line_numbers() {
        let mut store = store_with_root("/work");
        let path = PathBuf::from("/work/src/a.py");
        store.add_with_ranges(&path, vec![(2, 3), (7, 7)]);

        let content = "l1\nl2\nl3\nl4\nl5\nl6\nl7\nl8";
        let rendered = store.render(&path, content, true);

        assert_eq!(rendered, "2|\tl2\n3|\tl3\n...\n7|\tl7\n");
    }

    #[test]
    fn render_full_file_with_line_numbers() {
        let mut store = store_with_root("/work");
        let path = PathBuf::from("/work/src/a.py");
        store.add(&path);

        let rendered = store.render(&path, "x\ny", true);
        assert_eq!(rendered, "1|\tx\n2|\ty\n");
    }

    #[test]
    fn render_without_numbers_ignores_ranges() {
        let mut store = store_with_root("/work");
        let path = PathBuf::from("/work/src/a.py");
        store.add_with_ranges(&path, vec![(2, 2)]);

        let rendered = store.render(&path, "x\ny", false);
        assert_eq!(rendered, "x\ny");
    }

    #[test]
    fn render_clamps_ranges_past_end_of_file() {
        let mut store = store_with_root("/work");
        let path = PathBuf::from("/work/src/a.py");
        store.add_with_ranges(&path, vec![(2, 10)]);

        let rendered = store.render(&path, "x\ny", true);
        assert_eq!(rendered, "2|\ty\n");
    }

    #[test]
    fn label_includes_range_spans() {
        let mut store = store_with_root("/work");
        store.add_with_ranges("/work/src/a.py", vec![(2, 3), (7, 7)]);
        store.add("/work/src/b.py");

        assert_eq!(store.label(Path::new("/work/src/a.py")), "src/a.py:2-3,7-7");
        assert_eq!(store.label(Path::new("/work/src/b.py")), "src/b.py");
    }

    #[test]
    fn collect_contents_drops_unreadable_files() {
        let temp = tempfile::tempdir().expect("tempdir");
        let readable = temp.path().join("ok.txt");
        let mut file = fs::File::create(&readable).expect("create");
        writeln!(file, "content").expect("write");

        let mut store = ContextFileStore::new();
        store.set_root(temp.path());
        store.add(&readable);
        store.add(temp.path().join("missing.txt"));

        let contents = store.collect_contents();

        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0].0, readable);
        assert_eq!(store.files(), vec![readable]);
    }

    #[test]
    fn infer_root_from_single_file_uses_parent() {
        let mut store = ContextFileStore::new();
        store.add("/work/src/a.py");
        store.infer_root().expect("infer");
        assert_eq!(store.root(), Path::new("/work/src"));
    }

    #[test]
    fn infer_root_from_many_files_uses_common_ancestor() {
        let mut store = ContextFileStore::new();
        store.add("/work/src/a.py");
        store.add("/work/tests/b.py");
        store.infer_root().expect("infer");
        assert_eq!(store.root(), Path::new("/work"));
    }
}
