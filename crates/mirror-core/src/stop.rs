//! Cooperative stop requests

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use signal_hook::consts::TERM_SIGNALS;
use signal_hook::flag;

use crate::{Error, Result};

/// Shared stop flag, checked between ticks and between entry operations.
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    flag: Arc<AtomicBool>,
}

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop.
    pub fn stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Set the flag on termination signals (SIGINT, SIGTERM, ...).
    ///
    /// A second signal received after the flag is set terminates the process
    /// immediately with exit code 1.
    pub fn register_signals(&self) -> Result<()> {
        for &signal in TERM_SIGNALS {
            // Registered first so it sees the flag before this signal sets it
            flag::register_conditional_shutdown(signal, 1, Arc::clone(&self.flag))
                .map_err(Error::Signal)?;
            flag::register(signal, Arc::clone(&self.flag)).map_err(Error::Signal)?;
        }
        Ok(())
    }
}
