//! Test-only collaborator doubles for driving the fix loop.

use std::collections::VecDeque;
use std::path::PathBuf;

use anyhow::Result;

use crate::cancel::CancelFlag;
use crate::coder::{Coder, Reply};
use crate::context::ContextFileStore;

/// One scripted mention-scan result: files to add plus the summary returned.
pub struct ScriptedMentions {
    pub add: Vec<PathBuf>,
    pub summary: String,
}

/// Coder that replays queued replies and mention-scan results while
/// recording everything the loop does to it.
#[derive(Default)]
pub struct ScriptedCoder {
    pub store: ContextFileStore,
    replies: VecDeque<Reply>,
    mentions: VecDeque<ScriptedMentions>,
    /// Cancelled during the next `send_message`, modelling an interrupt that
    /// arrives while the loop is blocked on the collaborator.
    cancel_on_send: Option<CancelFlag>,
    pub sent: Vec<String>,
    pub scanned: Vec<String>,
    pub infos: Vec<String>,
    pub errors: Vec<String>,
}

impl ScriptedCoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the reply for the next `send_message`. Once the queue is empty
    /// every send yields [`Reply::Empty`].
    pub fn push_reply(&mut self, reply: Reply) {
        self.replies.push_back(reply);
    }

    /// Queue the result of the next mention scan. Once the queue is empty
    /// every scan yields `None`.
    pub fn push_mentions(&mut self, add: Vec<PathBuf>, summary: &str) {
        self.mentions.push_back(ScriptedMentions {
            add,
            summary: summary.to_string(),
        });
    }

    /// Arrange for `cancel` to fire during the next `send_message`.
    pub fn cancel_on_next_send(&mut self, cancel: CancelFlag) {
        self.cancel_on_send = Some(cancel);
    }
}

impl Coder for ScriptedCoder {
    fn context(&mut self) -> &mut ContextFileStore {
        &mut self.store
    }

    fn send_message(&mut self, message: &str) -> Result<Reply> {
        self.sent.push(message.to_string());
        if let Some(cancel) = self.cancel_on_send.take() {
            cancel.cancel();
        }
        Ok(self.replies.pop_front().unwrap_or(Reply::Empty))
    }

    fn scan_for_file_mentions(&mut self, output: &str) -> Option<String> {
        self.scanned.push(output.to_string());
        let scripted = self.mentions.pop_front()?;
        for path in scripted.add {
            self.store.add(path);
        }
        Some(scripted.summary)
    }

    fn report_error(&mut self, text: &str) {
        self.errors.push(text.to_string());
    }

    fn report_info(&mut self, text: &str) {
        self.infos.push(text.to_string());
    }
}
