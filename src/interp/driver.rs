//! The shared per-Conf update driver.
//!
//! `do_update` is the central routine: it diffs the pending attribute
//! record against the committed one, decides whether the native object
//! must be re-created or only its child references adjusted, walks the
//! reference graph, and finally swaps or discards attributes according to
//! the interpreter state.  `update_conf` wraps it with the per-state
//! ladder; the `cmd_*` functions are the sub-command bodies shared by all
//! kinds.
//!
//! A Conf is taken out of its store for the duration of its own update so
//! the other stores stay freely borrowable for child work; parent/child
//! pairs are always distinct kinds, so the recursion never needs the taken
//! Conf back.

use log::{info, warn};

use super::{InterpState, UPDATE_RETRY_MAX};
use crate::app::ports::DataPlanePort;
use crate::error::{DatastoreError, Result};
use crate::objects::{self, Attr, ChildRef, Kind};
use crate::store::{Conf, Stores};

// ---------------------------------------------------------------------------
// Name-set diffing
// ---------------------------------------------------------------------------

/// Child-reference diff between `current_attr` and `modified_attr`.
#[derive(Debug, Default)]
pub struct NamesInfo {
    pub not_changed: Vec<ChildRef>,
    pub added: Vec<ChildRef>,
    pub removed: Vec<ChildRef>,
}

impl NamesInfo {
    fn get(conf: &Conf) -> Self {
        let mut info = Self::default();
        let Some(modified) = &conf.modified_attr else {
            return info;
        };
        let modified_refs = modified.refs();
        match &conf.current_attr {
            None => info.added = modified_refs,
            Some(current) => {
                for r in current.refs() {
                    if modified_refs.contains(&r) {
                        info.not_changed.push(r);
                    } else {
                        info.removed.push(r);
                    }
                }
                for r in modified_refs {
                    if !info.not_changed.contains(&r) {
                        info.added.push(r);
                    }
                }
            }
        }
        info
    }
}

// ---------------------------------------------------------------------------
// Attribute motion helpers
// ---------------------------------------------------------------------------

fn update_current_attr(conf: &mut Conf, state: InterpState) {
    if state == InterpState::Rollbacked
        && conf.current_attr.is_none()
        && conf.modified_attr.is_some()
    {
        // rollbacked fresh create: left for do_destroy
        return;
    }
    if conf.modified_attr.is_some() {
        conf.current_attr = conf.modified_attr.take();
    }
}

fn switch_attr(conf: &mut Conf) {
    if conf.modified_attr.is_some() {
        std::mem::swap(&mut conf.current_attr, &mut conf.modified_attr);
    }
}

/// Collapse the atomic-mode transient intents into `is_enabled`.
fn collapse_enabled(conf: &mut Conf) {
    if conf.is_enabled {
        if conf.is_disabling {
            conf.is_enabled = false;
        }
    } else if conf.is_enabling {
        conf.is_enabled = true;
    }
}

fn attrs_equal(a: Option<&Attr>, b: Option<&Attr>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// is_used bookkeeping
// ---------------------------------------------------------------------------

fn set_used_on_refs(stores: &mut Stores, attr: &Attr, used: bool) {
    for child in attr.refs() {
        // missing children are tolerated during teardown
        let _ = stores.set_used(child.kind, &child.name, used);
    }
}

// ---------------------------------------------------------------------------
// Data-plane composites
// ---------------------------------------------------------------------------

/// Native create plus attach of every referenced child.
fn dp_create_full(dp: &mut dyn DataPlanePort, name: &str, attr: &Attr) -> Result<()> {
    let kind = attr.kind();
    attr.dp_create(dp, name)
        .map_err(|e| e.with_context(format!("Can't create {}.", kind.cmd_name())))?;
    for child in attr.refs() {
        objects::dp_child_add(dp, kind, name, &child)
            .map_err(|e| e.with_context(format!("Can't add {}.", child.role)))?;
    }
    Ok(())
}

/// Detach every referenced child, then destroy the native object.
/// `NotFound` from a child detach is ignored: the child may already be gone.
fn dp_destroy_full(dp: &mut dyn DataPlanePort, name: &str, attr: &Attr) -> Result<()> {
    let kind = attr.kind();
    for child in attr.refs() {
        match objects::dp_child_delete(dp, kind, name, &child) {
            Ok(()) => {}
            Err(e) if e.code == crate::error::ResultCode::NotFound => {}
            Err(e) => {
                return Err(e.with_context(format!("Can't delete {}.", child.role)));
            }
        }
    }
    objects::dp_destroy(dp, kind, name)
        .map_err(|e| e.with_context(format!("Can't destroy {}.", kind.cmd_name())))
}

fn dp_children_add(
    dp: &mut dyn DataPlanePort,
    kind: Kind,
    name: &str,
    children: &[ChildRef],
) -> Result<()> {
    for child in children {
        objects::dp_child_add(dp, kind, name, child)
            .map_err(|e| e.with_context(format!("Can't add {}.", child.role)))?;
    }
    Ok(())
}

fn dp_children_delete(
    dp: &mut dyn DataPlanePort,
    kind: Kind,
    name: &str,
    children: &[ChildRef],
) -> Result<()> {
    for child in children {
        match objects::dp_child_delete(dp, kind, name, child) {
            Ok(()) => {}
            Err(e) if e.code == crate::error::ResultCode::NotFound => {}
            Err(e) => {
                return Err(e.with_context(format!("Can't delete {}.", child.role)));
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Child propagation
// ---------------------------------------------------------------------------

/// Recursive update of a referenced child by fullname.
pub fn update_propagation(
    stores: &mut Stores,
    dp: &mut dyn DataPlanePort,
    state: InterpState,
    child: &ChildRef,
) -> Result<()> {
    if !stores.exists(child.kind, &child.name) {
        return Err(DatastoreError::invalid_object(format!(
            "name = {}",
            child.name
        )));
    }
    update_conf(stores, dp, state, child.kind, &child.name, false, false)
}

/// Enable a referenced child by fullname (refuses destroying children).
pub fn enable_propagation(
    stores: &mut Stores,
    dp: &mut dyn DataPlanePort,
    state: InterpState,
    child: &ChildRef,
) -> Result<()> {
    let destroying = match stores.store(child.kind).find(&child.name) {
        Some(conf) => conf.is_destroying,
        None => {
            return Err(DatastoreError::invalid_object(format!(
                "name = {}",
                child.name
            )));
        }
    };
    if destroying {
        return Err(DatastoreError::invalid_object(format!(
            "name = {}",
            child.name
        )));
    }
    enable_internal(stores, dp, state, child.kind, &child.name, true)
}

/// Disable a referenced child by fullname.
pub fn disable_propagation(
    stores: &mut Stores,
    dp: &mut dyn DataPlanePort,
    state: InterpState,
    child: &ChildRef,
) -> Result<()> {
    if !stores.exists(child.kind, &child.name) {
        return Err(DatastoreError::invalid_object(format!(
            "name = {}",
            child.name
        )));
    }
    disable_internal(stores, dp, state, child.kind, &child.name, true)
}

/// Disable and/or release a set of children.
///
/// With `is_propagation` (or while committing/rollbacking) each child is
/// driven through its own disable; with `is_unset_used` its `is_used` flag
/// is released afterwards.
fn children_disable(
    stores: &mut Stores,
    dp: &mut dyn DataPlanePort,
    state: InterpState,
    children: &[ChildRef],
    is_propagation: bool,
    is_unset_used: bool,
) -> Result<()> {
    for child in children {
        if is_propagation
            || state == InterpState::Committing
            || state == InterpState::Rollbacking
        {
            disable_propagation(stores, dp, state, child).map_err(|e| child.name_error(&e))?;
        }
        if is_unset_used {
            stores
                .set_used(child.kind, &child.name, false)
                .map_err(|e| child.name_error(&e))?;
        }
    }
    Ok(())
}

/// Start a Conf's native object, enabling children first when propagating.
/// `added` narrows the children considered; when empty, all referenced
/// children are walked.
fn start_conf(
    stores: &mut Stores,
    dp: &mut dyn DataPlanePort,
    state: InterpState,
    conf: &Conf,
    attr: &Attr,
    added: &[ChildRef],
    is_propagation: bool,
) -> Result<()> {
    let children = if added.is_empty() {
        attr.refs()
    } else {
        added.to_vec()
    };
    if is_propagation {
        for child in &children {
            enable_propagation(stores, dp, state, child).map_err(|e| child.name_error(&e))?;
        }
    }
    objects::dp_start(dp, conf.kind, &conf.name)
        .map_err(|e| e.with_context(format!("Can't start {}.", conf.kind.cmd_name())))
}

/// Stop a Conf's native object after disabling its children.
fn stop_conf(
    stores: &mut Stores,
    dp: &mut dyn DataPlanePort,
    state: InterpState,
    conf: &Conf,
) -> Result<()> {
    if let Some(current) = &conf.current_attr {
        children_disable(stores, dp, state, &current.refs(), true, false)
            .map_err(|e| e.with_context(format!("Can't stop {}.", conf.kind.cmd_name())))?;
    }
    objects::dp_stop(dp, conf.kind, &conf.name)
        .map_err(|e| e.with_context(format!("Can't stop {}.", conf.kind.cmd_name())))
}

// ---------------------------------------------------------------------------
// do_update / do_destroy
// ---------------------------------------------------------------------------

/// The central routine: realise the pending state of one Conf.
fn do_update(
    stores: &mut Stores,
    dp: &mut dyn DataPlanePort,
    state: InterpState,
    conf: &mut Conf,
    is_propagation: bool,
    is_enable_disable_cmd: bool,
) -> Result<()> {
    let info = NamesInfo::get(conf);

    let is_modified =
        conf.modified_attr.is_some() && !attrs_equal(conf.current_attr.as_ref(), conf.modified_attr.as_ref());
    let is_modified_without_names = is_modified
        && match (&conf.current_attr, &conf.modified_attr) {
            (None, Some(_)) => true,
            (Some(current), Some(modified)) => !current.equals_without_names(modified),
            _ => false,
        };

    // update referenced children first
    if is_propagation {
        for child in info
            .not_changed
            .iter()
            .chain(info.added.iter())
            .chain(info.removed.iter())
        {
            match update_propagation(stores, dp, state, child) {
                Ok(()) => {}
                Err(e) if e.is_final() => {}
                Err(e) => {
                    return Err(e.with_context(format!("Can't update {}.", child.role)));
                }
            }
        }
    }

    if is_modified {
        if conf.current_attr.is_some() {
            children_disable(stores, dp, state, &info.removed, is_propagation, true)?;
            if is_modified_without_names {
                let current = conf.current_attr.as_ref().expect("checked above");
                dp_destroy_full(dp, &conf.name, current).inspect_err(|_| {
                    warn!("Can't delete {}.", conf.kind.cmd_name());
                })?;
            } else {
                dp_children_delete(dp, conf.kind, &conf.name, &info.removed).inspect_err(
                    |_| {
                        warn!("Can't delete {} names.", conf.kind.cmd_name());
                    },
                )?;
            }
        }

        let modified = conf.modified_attr.clone().expect("is_modified");
        if is_modified_without_names {
            dp_create_full(dp, &conf.name, &modified)?;
        } else {
            dp_children_add(dp, conf.kind, &conf.name, &info.added)?;
        }

        set_used_on_refs(stores, &modified, true);

        if conf.is_enabled {
            start_conf(stores, dp, state, conf, &modified, &info.added, is_propagation)?;
        }

        if state != InterpState::Committing && state != InterpState::Rollbacking {
            update_current_attr(conf, state);
        }
    } else if is_enable_disable_cmd || conf.is_enabling || conf.is_disabling {
        let r = if conf.is_enabled {
            match &conf.current_attr {
                Some(current) => {
                    let current = current.clone();
                    start_conf(stores, dp, state, conf, &current, &info.added, is_propagation)
                }
                None => Err(DatastoreError::invalid_args(format!(
                    "Can't start {}.",
                    conf.kind.cmd_name()
                ))),
            }
        } else {
            stop_conf(stores, dp, state, conf)
        };
        conf.is_enabling = false;
        conf.is_disabling = false;
        r?;
    }

    Ok(())
}

/// Tear one Conf out of the world: release its references, destroy the
/// native object when one was realised, and drop it from the store.
/// Data-plane failures are logged, never fatal.  Returns `true` when the
/// Conf was consumed (the caller must not re-insert it).
fn do_destroy(
    stores: &mut Stores,
    dp: &mut dyn DataPlanePort,
    state: InterpState,
    conf: &mut Conf,
) -> bool {
    if state == InterpState::Rollbacked
        && conf.current_attr.is_none()
        && conf.modified_attr.is_some()
    {
        // rollbacked fresh create: references were already released
        return true;
    }

    if state == InterpState::DryRun {
        if let Some(current) = &conf.current_attr {
            set_used_on_refs(stores, &current.clone(), false);
        }
        if let Some(modified) = &conf.modified_attr {
            set_used_on_refs(stores, &modified.clone(), false);
        }
        return true;
    }

    if conf.is_destroying || state == InterpState::AutoCommit {
        if let Some(current) = &conf.current_attr {
            set_used_on_refs(stores, &current.clone(), false);
        }
        if let Some(modified) = &conf.modified_attr {
            set_used_on_refs(stores, &modified.clone(), false);
        }
        if let Some(current) = conf.current_attr.clone() {
            if let Err(e) = dp_destroy_full(dp, &conf.name, &current) {
                warn!("ret = {e}");
            }
        }
        return true;
    }

    false
}

// ---------------------------------------------------------------------------
// Per-state ladder
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq)]
enum Disposition {
    Keep,
    Deleted,
}

fn update_taken(
    stores: &mut Stores,
    dp: &mut dyn DataPlanePort,
    state: InterpState,
    conf: &mut Conf,
    is_propagation: bool,
    is_enable_disable_cmd: bool,
) -> (Disposition, Result<()>) {
    match state {
        InterpState::AutoCommit => {
            let mut last = Ok(());
            for _ in 0..UPDATE_RETRY_MAX {
                last = do_update(stores, dp, state, conf, is_propagation, is_enable_disable_cmd);
                if last.is_ok() || is_enable_disable_cmd {
                    break;
                }
                if conf.current_attr.is_none() && conf.modified_attr.is_some() {
                    // initial create that cannot be realised: undo it
                    do_destroy(stores, dp, state, conf);
                    return (Disposition::Deleted, last);
                }
                switch_attr(conf);
                warn!(
                    "FAILED auto_commit ({}): rollbacking....",
                    conf.name
                );
            }
            (Disposition::Keep, last)
        }
        InterpState::Committing => {
            collapse_enabled(conf);
            let r = do_update(stores, dp, state, conf, is_propagation, is_enable_disable_cmd);
            (Disposition::Keep, r)
        }
        InterpState::Atomic => {
            // only accumulate intent: mark the new references used
            if let Some(modified) = conf.modified_attr.clone() {
                set_used_on_refs(stores, &modified, true);
            }
            (Disposition::Keep, Ok(()))
        }
        InterpState::Committed | InterpState::Rollbacked => {
            // transient intents collapsed while committing; drop any residue
            conf.is_enabling = false;
            conf.is_disabling = false;
            update_current_attr(conf, state);
            if do_destroy(stores, dp, state, conf) {
                (Disposition::Deleted, Ok(()))
            } else {
                (Disposition::Keep, Ok(()))
            }
        }
        InterpState::Rollbacking => {
            if conf.current_attr.is_none() && conf.modified_attr.is_some() {
                // fresh create: releasing the pending references suffices
                let modified = conf.modified_attr.clone().expect("checked above");
                set_used_on_refs(stores, &modified, false);
                (Disposition::Keep, Ok(()))
            } else {
                switch_attr(conf);
                collapse_enabled(conf);
                let r =
                    do_update(stores, dp, state, conf, is_propagation, is_enable_disable_cmd);
                (Disposition::Keep, r)
            }
        }
        InterpState::Aborting => {
            conf.is_destroying = false;
            conf.is_enabling = false;
            conf.is_disabling = false;
            if let Some(modified) = conf.modified_attr.clone() {
                set_used_on_refs(stores, &modified, false);
            }
            if let Some(current) = conf.current_attr.clone() {
                set_used_on_refs(stores, &current, true);
            }
            (Disposition::Keep, Ok(()))
        }
        InterpState::Aborted => {
            if conf.modified_attr.is_some() {
                if conf.current_attr.is_none() {
                    (Disposition::Deleted, Ok(()))
                } else {
                    conf.modified_attr = None;
                    (Disposition::Keep, Ok(()))
                }
            } else {
                (Disposition::Keep, Ok(()))
            }
        }
        InterpState::DryRun => {
            if conf.modified_attr.is_some() {
                conf.current_attr = conf.modified_attr.take();
            }
            (Disposition::Keep, Ok(()))
        }
    }
}

/// Drive one named Conf through the state ladder.
pub fn update_conf(
    stores: &mut Stores,
    dp: &mut dyn DataPlanePort,
    state: InterpState,
    kind: Kind,
    name: &str,
    is_propagation: bool,
    is_enable_disable_cmd: bool,
) -> Result<()> {
    let Some(mut conf) = stores.take(kind, name) else {
        return Err(DatastoreError::invalid_args(format!("name = {name}")));
    };
    let (disposition, result) = update_taken(
        stores,
        dp,
        state,
        &mut conf,
        is_propagation,
        is_enable_disable_cmd,
    );
    if disposition == Disposition::Keep {
        stores.put_back(conf);
    } else {
        stores.store_mut(kind).discard_taken();
    }
    result
}

// ---------------------------------------------------------------------------
// Sub-command bodies (shared by every kind)
// ---------------------------------------------------------------------------

fn enable_internal(
    stores: &mut Stores,
    dp: &mut dyn DataPlanePort,
    state: InterpState,
    kind: Kind,
    name: &str,
    is_propagation: bool,
) -> Result<()> {
    let (is_used, is_enabled) = match stores.store(kind).find(name) {
        Some(conf) => (conf.is_used, conf.is_enabled),
        None => return Err(DatastoreError::invalid_args(format!("name = {name}"))),
    };

    if !is_used {
        return Err(DatastoreError::not_operational(format!(
            "name = {name}. is not used."
        )));
    }
    if is_enabled {
        return Ok(());
    }

    if state == InterpState::Atomic {
        let conf = stores.store_mut(kind).find_mut(name).expect("found above");
        conf.is_enabling = true;
        conf.is_disabling = false;
        return Ok(());
    }

    stores
        .store_mut(kind)
        .find_mut(name)
        .expect("found above")
        .is_enabled = true;
    match update_conf(stores, dp, state, kind, name, is_propagation, true) {
        Ok(()) => Ok(()),
        Err(e) => {
            if let Some(conf) = stores.store_mut(kind).find_mut(name) {
                conf.is_enabled = false;
            }
            Err(e)
        }
    }
}

fn disable_internal(
    stores: &mut Stores,
    dp: &mut dyn DataPlanePort,
    state: InterpState,
    kind: Kind,
    name: &str,
    is_propagation: bool,
) -> Result<()> {
    if state == InterpState::Atomic {
        let Some(conf) = stores.store_mut(kind).find_mut(name) else {
            return Err(DatastoreError::invalid_args(format!("name = {name}")));
        };
        conf.is_enabling = false;
        conf.is_disabling = true;
        return Ok(());
    }

    let Some(conf) = stores.store_mut(kind).find_mut(name) else {
        return Err(DatastoreError::invalid_args(format!("name = {name}")));
    };
    conf.is_enabled = false;

    match update_conf(stores, dp, state, kind, name, false, true) {
        Ok(()) => {
            if is_propagation {
                // stop the children too, but leave their is_used flags:
                // this Conf still references them
                let refs = stores
                    .store(kind)
                    .find(name)
                    .and_then(|c| c.current_attr.as_ref())
                    .map(Attr::refs)
                    .unwrap_or_default();
                children_disable(stores, dp, state, &refs, true, false)?;
            }
            Ok(())
        }
        Err(e) => {
            if let Some(conf) = stores.store_mut(kind).find_mut(name) {
                conf.is_enabled = true;
            }
            Err(e)
        }
    }
}

/// The `enable` sub-command body.
pub fn cmd_enable(
    stores: &mut Stores,
    dp: &mut dyn DataPlanePort,
    state: InterpState,
    kind: Kind,
    name: &str,
) -> Result<()> {
    match stores.store(kind).find(name) {
        Some(conf) if !conf.is_destroying => {
            enable_internal(stores, dp, state, kind, name, true)
        }
        _ => Err(DatastoreError::invalid_object(format!("name = {name}"))),
    }
}

/// The `disable` sub-command body.
pub fn cmd_disable(
    stores: &mut Stores,
    dp: &mut dyn DataPlanePort,
    state: InterpState,
    kind: Kind,
    name: &str,
) -> Result<()> {
    match stores.store(kind).find(name) {
        Some(conf) if !conf.is_destroying => {
            disable_internal(stores, dp, state, kind, name, false)
        }
        _ => Err(DatastoreError::invalid_object(format!("name = {name}"))),
    }
}

/// The `destroy` sub-command body.
pub fn cmd_destroy(
    stores: &mut Stores,
    dp: &mut dyn DataPlanePort,
    state: InterpState,
    kind: Kind,
    name: &str,
) -> Result<()> {
    let (is_used, is_enabled) = match stores.store(kind).find(name) {
        Some(conf) if !conf.is_destroying => (conf.is_used, conf.is_enabled),
        _ => return Err(DatastoreError::invalid_object(format!("name = {name}"))),
    };

    if is_used {
        return Err(DatastoreError::not_operational(format!(
            "name = {name}: is used."
        )));
    }

    if state == InterpState::Atomic {
        let conf = stores.store_mut(kind).find_mut(name).expect("found above");
        conf.is_destroying = true;
        conf.is_enabling = false;
        conf.is_disabling = true;
        return Ok(());
    }

    // release children first; failures here only log
    let refs = stores
        .store(kind)
        .find(name)
        .and_then(|c| c.current_attr.as_ref())
        .map(Attr::refs)
        .unwrap_or_default();
    if let Err(e) = children_disable(stores, dp, state, &refs, true, true) {
        warn!("ret = {e}");
    }

    if is_enabled {
        stores
            .store_mut(kind)
            .find_mut(name)
            .expect("found above")
            .is_enabled = false;
        if let Err(e) = update_conf(stores, dp, state, kind, name, false, true) {
            if let Some(conf) = stores.store_mut(kind).find_mut(name) {
                conf.is_enabled = true;
            }
            return Err(e);
        }
    }

    let Some(mut conf) = stores.take(kind, name) else {
        return Ok(());
    };
    info!("destroying {}. name = {}.", kind.cmd_name(), name);
    if do_destroy(stores, dp, state, &mut conf) {
        stores.store_mut(kind).discard_taken();
    } else {
        stores.put_back(conf);
    }
    Ok(())
}
