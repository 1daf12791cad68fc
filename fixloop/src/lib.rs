//! Iterative fix loop driving an LLM coding collaborator.
//!
//! A configured agent runs a shell command repeatedly: a zero exit status
//! means the job is done, anything else becomes a bounded excerpt of the
//! command output, a pruned set of context files, and a composed message
//! delivered to an external collaborator that edits files and reports back.
//!
//! The crate separates:
//!
//! - **Pure logic** ([`chunk`], the retention and rendering parts of
//!   [`context`]): deterministic text transforms, testable without I/O.
//! - **Side effects** ([`io`]): shell execution, templates, the stdio
//!   collaborator.
//! - **Orchestration** ([`registry`], [`agents`]): configuration loading and
//!   the fix-loop state machine, wired to the collaborator through the
//!   [`coder::Coder`] seam.

pub mod agents;
pub mod cancel;
pub mod chunk;
pub mod coder;
pub mod context;
pub mod io;
pub mod logging;
pub mod registry;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
