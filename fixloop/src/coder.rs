//! Collaborator boundary consumed by the fix loop.
//!
//! The [`Coder`] trait decouples the loop from the actual collaborator
//! backend (an LLM-backed editor in production, [`StdioCoder`] for manual
//! runs). Tests use scripted coders that return predetermined replies.
//!
//! [`StdioCoder`]: crate::io::stdio::StdioCoder

use anyhow::Result;

use crate::context::ContextFileStore;

/// Collaborator response to a delivered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Follow-up text that must be delivered back before the next iteration.
    FollowUp(String),
    /// Exchange complete for this iteration.
    Empty,
    /// Input closed; the loop must stop silently.
    Eof,
}

/// External collaborator that edits files and converses with the fix loop.
///
/// The collaborator owns the [`ContextFileStore`]; the loop mutates it in
/// place through [`Coder::context`] under a single-writer discipline enforced
/// by the synchronous call structure.
pub trait Coder {
    /// The context-file store shared with the loop.
    fn context(&mut self) -> &mut ContextFileStore;

    /// Deliver a composed message and block until the collaborator replies.
    fn send_message(&mut self, message: &str) -> Result<Reply>;

    /// Scan `output` for file references not yet in context, adding any
    /// discovered files to the store. Returns a summary of what was added,
    /// or `None` when nothing new was found.
    fn scan_for_file_mentions(&mut self, output: &str) -> Option<String>;

    /// Surface a diagnostic to the operator.
    fn report_error(&mut self, text: &str);

    /// Surface an informational notice to the operator.
    fn report_info(&mut self, text: &str);
}
