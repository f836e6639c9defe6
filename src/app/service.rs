//! Datastore service — the hexagonal core.
//!
//! [`Datastore`] owns the eight per-kind object stores, the namespace
//! registry, and the interpreter state.  It exposes a clean,
//! data-plane-agnostic API.  All realisation flows through the
//! [`DataPlanePort`] injected at call sites, making the entire service
//! testable with a recording mock.
//!
//! ```text
//!  command argv ──▶ ┌──────────────────────────┐ ──▶ result record
//!                   │        Datastore          │
//!  DataPlanePort ◀──│  stores · interp · names  │
//!                   └──────────────────────────┘
//! ```
//!
//! Scheduling is single-threaded cooperative: one command at a time, run
//! to completion; the service holds exclusive access to the stores for
//! the duration of a sub-command.

use log::{info, warn};

use crate::cmd::escape_name;
use crate::error::{DatastoreError, Result};
use crate::interp::{self, InterpState};
use crate::names::split_fullname;
use crate::objects::{self, Kind};
use crate::store::{Conf, Stores};

use super::ports::DataPlanePort;

// ───────────────────────────────────────────────────────────────
// Datastore
// ───────────────────────────────────────────────────────────────

/// The configuration datastore: every managed object, plus the
/// transaction and namespace state the command surface operates under.
#[derive(Debug)]
pub struct Datastore {
    pub(crate) stores: Stores,
    pub(crate) namespaces: Vec<String>,
    pub(crate) current_ns: String,
    pub(crate) state: InterpState,
    pub(crate) started: bool,
}

impl Datastore {
    pub fn new() -> Self {
        Self {
            stores: Stores::new(),
            namespaces: Vec::new(),
            current_ns: String::new(),
            state: InterpState::AutoCommit,
            started: true,
        }
    }

    /// Drop every Conf and refuse further commands until re-created.
    pub fn teardown(&mut self) {
        self.stores = Stores::new();
        self.namespaces.clear();
        self.current_ns.clear();
        self.state = InterpState::AutoCommit;
        self.started = false;
        info!("datastore finalized");
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> InterpState {
        self.state
    }

    pub fn current_namespace(&self) -> &str {
        &self.current_ns
    }

    pub fn find(&self, kind: Kind, fullname: &str) -> Option<&Conf> {
        self.stores.store(kind).find(fullname)
    }

    /// Every fullname of one kind, in insertion order.
    pub fn list(&self, kind: Kind) -> Vec<String> {
        self.stores.store(kind).list(None)
    }

    pub fn is_empty(&self) -> bool {
        self.stores.all_empty()
    }

    pub(crate) fn namespace_exists(&self, ns: &str) -> bool {
        ns.is_empty() || self.namespaces.iter().any(|n| n == ns)
    }

    // ── Transactions ──────────────────────────────────────────

    /// Enter an atomic session: edits accumulate, the data plane waits.
    pub fn begin_atomic(&mut self) -> Result<()> {
        if self.state != InterpState::AutoCommit {
            return Err(DatastoreError::not_operational("Already in a session."));
        }
        info!("atomic session begin");
        self.state = InterpState::Atomic;
        Ok(())
    }

    /// Realise the accumulated edits.  A propagation failure drives every
    /// touched Conf back through its rollback path.
    pub fn commit(&mut self, dp: &mut dyn DataPlanePort) -> Result<()> {
        if self.state != InterpState::Atomic {
            return Err(DatastoreError::not_operational("Not in atomic mode."));
        }
        info!("atomic session commit");
        if let Err(e) = self.walk(dp, InterpState::Committing, true, true) {
            warn!("commit failed ({e}): rollbacking....");
            let _ = self.walk(dp, InterpState::Rollbacking, true, false);
            let _ = self.walk(dp, InterpState::Rollbacked, false, false);
            self.state = InterpState::AutoCommit;
            return Err(e);
        }
        let _ = self.walk(dp, InterpState::Committed, false, false);
        self.state = InterpState::AutoCommit;
        Ok(())
    }

    /// Undo the accumulated edits, restoring the previous configuration.
    pub fn rollback(&mut self, dp: &mut dyn DataPlanePort) -> Result<()> {
        if self.state != InterpState::Atomic {
            return Err(DatastoreError::not_operational("Not in atomic mode."));
        }
        info!("atomic session rollback");
        let _ = self.walk(dp, InterpState::Rollbacking, true, false);
        let _ = self.walk(dp, InterpState::Rollbacked, false, false);
        self.state = InterpState::AutoCommit;
        Ok(())
    }

    /// Abandon the session without touching the data plane; every flag and
    /// reference returns to its pre-session value.
    pub fn abort(&mut self, dp: &mut dyn DataPlanePort) -> Result<()> {
        if self.state != InterpState::Atomic {
            return Err(DatastoreError::not_operational("Not in atomic mode."));
        }
        info!("atomic session abort");
        let _ = self.walk(dp, InterpState::Aborting, false, false);
        let _ = self.walk(dp, InterpState::Aborted, false, false);
        self.state = InterpState::AutoCommit;
        Ok(())
    }

    /// Enter dry-run: commands validate and move attributes, the data
    /// plane is never called.
    pub fn begin_dryrun(&mut self) -> Result<()> {
        if self.state != InterpState::AutoCommit {
            return Err(DatastoreError::not_operational("Already in a session."));
        }
        self.state = InterpState::DryRun;
        Ok(())
    }

    pub fn end_dryrun(&mut self) -> Result<()> {
        if self.state != InterpState::DryRun {
            return Err(DatastoreError::not_operational("Not in dry run."));
        }
        self.state = InterpState::AutoCommit;
        Ok(())
    }

    /// Drive every Conf through one interpreter state, kind by kind.
    fn walk(
        &mut self,
        dp: &mut dyn DataPlanePort,
        state: InterpState,
        leaves_first: bool,
        stop_on_err: bool,
    ) -> Result<()> {
        let mut kinds = Kind::ALL.to_vec();
        if !leaves_first {
            kinds.reverse();
        }
        for kind in kinds {
            let names = self.stores.store(kind).list(None);
            for name in names {
                if !self.stores.exists(kind, &name) {
                    continue;
                }
                match interp::update_conf(&mut self.stores, dp, state, kind, &name, false, false)
                {
                    Ok(()) => {}
                    Err(e) if stop_on_err => return Err(e),
                    Err(e) => warn!("ret = {e}"),
                }
            }
        }
        Ok(())
    }

    // ── Persistence ───────────────────────────────────────────

    /// Canonical textual form of the committed configuration, children
    /// first, sufficient to regenerate the datastore by replay.
    pub fn serialize_all(&self) -> String {
        let mut out = String::new();
        for ns in &self.namespaces {
            out.push_str("namespace create ");
            out.push_str(&escape_name(ns));
            out.push('\n');
        }
        for kind in Kind::ALL {
            for conf in self.stores.store(kind).iter() {
                if let Some(current) = &conf.current_attr {
                    out.push_str(&objects::serialize_line(&conf.name, current));
                    out.push('\n');
                }
            }
        }
        out
    }

    /// Replay a serialised configuration.  Stops at the first failing
    /// line.
    pub fn load_str(&mut self, dp: &mut dyn DataPlanePort, text: &str) -> Result<()> {
        for (lineno, line) in text.lines().enumerate() {
            if let Some(result) = self.handle_line(dp, line) {
                if !result.is_ok() {
                    return Err(DatastoreError::new(
                        result.code,
                        format!(
                            "line {}: {}",
                            lineno + 1,
                            result.message.unwrap_or_default()
                        ),
                    ));
                }
            }
        }
        Ok(())
    }

    // ── Duplication ───────────────────────────────────────────

    /// Deep-clone one Conf into another namespace, rewriting its own name
    /// and every reference it holds.
    pub fn duplicate(&mut self, kind: Kind, fullname: &str, ns: &str) -> Result<()> {
        let Some(conf) = self.stores.store(kind).find(fullname) else {
            return Err(DatastoreError::not_found(format!("name = {fullname}")));
        };
        let (_, local) = split_fullname(&conf.name);
        let mut dup = conf.clone();
        dup.name = crate::names::fullname(ns, local)?;
        dup.is_used = false;
        dup.is_enabled = false;
        dup.is_enabling = false;
        dup.is_disabling = false;
        dup.is_destroying = false;
        if let Some(attr) = &mut dup.current_attr {
            attr.substitute_namespace(ns)?;
        }
        if let Some(attr) = &mut dup.modified_attr {
            attr.substitute_namespace(ns)?;
        }
        self.stores.store_mut(kind).add(dup)
    }
}

impl Default for Datastore {
    fn default() -> Self {
        Self::new()
    }
}
