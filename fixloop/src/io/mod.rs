//! Side-effecting operations: process execution, message templates, and the
//! stdio collaborator.

pub mod process;
pub mod prompt;
pub mod stdio;
