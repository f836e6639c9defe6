//! Transaction state machine.
//!
//! Every sub-command runs under one interpreter state; the state decides
//! how far a mutation propagates into the data plane and what happens to
//! the `current`/`modified` attribute pair:
//!
//! ```text
//!               ┌─────────────┐
//!               │ AUTO_COMMIT │  one command = one transaction
//!               └─────────────┘
//!
//!   ATOMIC ──commit──▶ COMMITTING ──▶ COMMITTED
//!     │                    │
//!     │                    └─failure─▶ ROLLBACKING ──▶ ROLLBACKED
//!     │
//!     ├──rollback────────▶ ROLLBACKING ──▶ ROLLBACKED
//!     └──abort───────────▶ ABORTING ────▶ ABORTED
//!
//!   DRYRUN: attribute motion only, the data plane is never touched.
//! ```
//!
//! The driver in [`driver`] is shared by all object kinds: per-kind
//! behaviour (native create/destroy, child attach/detach) is reached
//! through the dispatch tables in [`crate::objects`].

pub mod driver;

pub use driver::{
    cmd_destroy, cmd_disable, cmd_enable, disable_propagation, enable_propagation, update_conf,
    update_propagation,
};

/// Interpreter states driving per-Conf behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpState {
    AutoCommit,
    Atomic,
    Committing,
    Committed,
    Rollbacking,
    Rollbacked,
    Aborting,
    Aborted,
    DryRun,
}

/// Retry bound for in-place recovery under `AutoCommit`.
pub const UPDATE_RETRY_MAX: usize = 3;
