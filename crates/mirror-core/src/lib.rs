//! Core of the directory mirror
//!
//! This crate implements one-way, periodic mirroring of a source tree onto a
//! replica tree:
//!
//! - **Config**: validated process configuration
//! - **TreeReconciler**: recursive diff-and-apply of one directory pair
//! - **SyncLogger**: append-only sync log mirrored to the console
//! - **Scheduler**: fixed-delay loop that re-triggers a pass
//! - **Synchronizer**: runs passes against the configured roots
//!
//! # Architecture
//!
//! ```text
//!             mirror-cli
//!                 |
//!            mirror-core
//!   Synchronizer -> Scheduler
//!        |
//!   TreeReconciler -> EventSink (SyncLogger)
//!        |
//!            mirror-fs
//!   Comparator, copy/remove, listing
//! ```
//!
//! # Example
//!
//! ```no_run
//! use mirror_core::{Config, StopToken, Synchronizer};
//!
//! fn example() -> mirror_core::Result<()> {
//!     let config = Config::from_args("/data/source", "/data/replica", "10", "/var/log/mirror.log")?;
//!     let synchronizer = Synchronizer::new(config);
//!     let report = synchronizer.run_pass(&StopToken::new())?;
//!     println!("{} actions", report.action_count());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod logger;
pub mod reconcile;
pub mod report;
pub mod scheduler;
pub mod stop;
pub mod synchronizer;

pub use config::Config;
pub use error::{ConfigError, Error, Result};
pub use event::{EventKind, SyncEvent, Tier};
pub use logger::{EventSink, MemorySink, PassLog, SyncLogger};
pub use reconcile::{DirectoryPair, ReconcileOptions, ReplicaInventory, TreeReconciler};
pub use report::PassReport;
pub use scheduler::Scheduler;
pub use stop::StopToken;
pub use synchronizer::Synchronizer;
