//! Cooperative cancellation for the fix loop.
//!
//! An interrupt sets an atomic flag; the loop checks it after every blocking
//! call and aborts the whole run rather than the current iteration. There is
//! no resume-from-checkpoint.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};

/// Shared cancellation flag, cheap to clone across the loop and its caller.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    flag: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a SIGINT handler that sets this flag.
    ///
    /// The process keeps running after Ctrl-C; blocking points observe the
    /// flag and abort cooperatively.
    pub fn register_sigint(&self) -> Result<()> {
        signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&self.flag))
            .context("register SIGINT handler")?;
        Ok(())
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
