//! Terminal-backed collaborator for manual runs.
//!
//! Composed messages go to stdout along with the current context files;
//! follow-ups are read one line at a time from stdin. This keeps the binary
//! usable end to end without any LLM wiring: a human (or a driving process)
//! plays the collaborator.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::{Context as _, Result};
use regex::Regex;

use crate::coder::{Coder, Reply};
use crate::context::ContextFileStore;

/// Path-looking tokens in command output: at least one separator or dot, so
/// bare words are not treated as file mentions.
static MENTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9_][A-Za-z0-9_.\-/]*\.[A-Za-z0-9_]+").expect("mention pattern is valid")
});

/// Collaborator that converses over stdin/stdout.
pub struct StdioCoder {
    store: ContextFileStore,
}

impl StdioCoder {
    /// Create a coder rooted at `root`; mention scanning resolves candidate
    /// paths against this directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let mut store = ContextFileStore::new();
        store.set_root(root);
        Self { store }
    }

    fn print_context_files(&mut self) {
        let contents = self.store.collect_contents();
        if contents.is_empty() {
            return;
        }
        println!("Files in context:");
        for (path, content) in contents {
            println!("{}", self.store.label(&path));
            print!("{}", self.store.render(&path, &content, true));
            println!();
        }
    }
}

impl Coder for StdioCoder {
    fn context(&mut self) -> &mut ContextFileStore {
        &mut self.store
    }

    fn send_message(&mut self, message: &str) -> Result<Reply> {
        self.print_context_files();
        println!("{message}");
        print!("> ");
        std::io::stdout().flush().context("flush stdout")?;

        let mut line = String::new();
        let read = std::io::stdin()
            .lock()
            .read_line(&mut line)
            .context("read follow-up from stdin")?;
        if read == 0 {
            return Ok(Reply::Eof);
        }
        let line = line.trim();
        if line.is_empty() {
            Ok(Reply::Empty)
        } else {
            Ok(Reply::FollowUp(line.to_string()))
        }
    }

    fn scan_for_file_mentions(&mut self, output: &str) -> Option<String> {
        let mut added = Vec::new();
        for token in MENTION_RE.find_iter(output) {
            let candidate = self.store.root().join(token.as_str());
            if candidate.is_file() && !self.store.contains(&candidate) {
                self.store.add(&candidate);
                added.push(token.as_str().to_string());
            }
        }
        if added.is_empty() {
            None
        } else {
            Some(format!(
                "I added these *read-write* files: {}",
                added.join(", ")
            ))
        }
    }

    fn report_error(&mut self, text: &str) {
        eprintln!("{text}");
    }

    fn report_info(&mut self, text: &str) {
        println!("{text}");
    }
}
