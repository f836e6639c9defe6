//! Per-kind object stores.
//!
//! A [`Conf`] is one managed configuration object: its immutable fullname,
//! the last committed attribute record, the pending edit, and the lifecycle
//! flags the transaction driver steers.  Each kind owns a [`ConfStore`];
//! [`Stores`] bundles all eight and answers the cross-kind questions the
//! reference graph needs (exists / is-used / set-used by fullname).
//!
//! Stores keep insertion order: commit ordering within a kind and the
//! serialised form both follow the order objects were created in.

use crate::error::{DatastoreError, Result};
use crate::names::split_fullname;
use crate::objects::{Attr, Kind};

// ---------------------------------------------------------------------------
// Conf
// ---------------------------------------------------------------------------

/// One managed configuration object.
#[derive(Debug, Clone)]
pub struct Conf {
    pub kind: Kind,
    pub name: String,
    /// Last committed attributes; `None` until the first successful commit.
    pub current_attr: Option<Attr>,
    /// Pending attributes; `None` when no edit is in flight.
    pub modified_attr: Option<Attr>,
    /// Some other Conf references this one right now.
    pub is_used: bool,
    /// User intent for the live object in the data plane.
    pub is_enabled: bool,
    /// Deferred enable intent, atomic mode only.
    pub is_enabling: bool,
    /// Deferred disable intent, atomic mode only.
    pub is_disabling: bool,
    /// Destruction requested, not yet realised.
    pub is_destroying: bool,
}

impl Conf {
    /// A fresh Conf with an empty-default pending attribute.
    pub fn new(kind: Kind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            current_attr: None,
            modified_attr: Some(Attr::default_for(kind)),
            is_used: false,
            is_enabled: false,
            is_enabling: false,
            is_disabling: false,
            is_destroying: false,
        }
    }
}

// ---------------------------------------------------------------------------
// ConfStore
// ---------------------------------------------------------------------------

/// All Confs of one kind, in insertion order, unique by fullname.
#[derive(Debug, Default)]
pub struct ConfStore {
    confs: Vec<Conf>,
    /// Slot of the Conf currently taken out for update, so it returns to
    /// its place and serialisation order stays stable.  At most one Conf
    /// per store is ever out: parent and child are always distinct kinds.
    taken_at: Option<usize>,
}

impl ConfStore {
    pub fn new() -> Self {
        Self {
            confs: Vec::new(),
            taken_at: None,
        }
    }

    pub fn add(&mut self, conf: Conf) -> Result<()> {
        if self.find(&conf.name).is_some() {
            return Err(DatastoreError::already_exists(format!(
                "name = {}",
                conf.name
            )));
        }
        self.confs.push(conf);
        Ok(())
    }

    pub fn delete(&mut self, name: &str) -> Result<Conf> {
        match self.confs.iter().position(|c| c.name == name) {
            Some(pos) => Ok(self.confs.remove(pos)),
            None => Err(DatastoreError::not_found(format!("name = {name}"))),
        }
    }

    pub fn find(&self, name: &str) -> Option<&Conf> {
        self.confs.iter().find(|c| c.name == name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Conf> {
        self.confs.iter_mut().find(|c| c.name == name)
    }

    /// Remove and return a Conf so the caller can mutate it while the other
    /// stores stay borrowable.  Pair with [`ConfStore::put_back`], or with
    /// [`ConfStore::discard_taken`] when the Conf is being consumed.
    pub fn take(&mut self, name: &str) -> Option<Conf> {
        debug_assert!(self.taken_at.is_none(), "one Conf out per store");
        self.confs.iter().position(|c| c.name == name).map(|pos| {
            self.taken_at = Some(pos);
            self.confs.remove(pos)
        })
    }

    /// Forget the slot of a taken Conf that will not come back.
    pub fn discard_taken(&mut self) {
        self.taken_at = None;
    }

    /// Re-insert a Conf taken with [`ConfStore::take`] into its original
    /// slot.
    pub fn put_back(&mut self, conf: Conf) {
        match self.taken_at.take() {
            Some(pos) if pos <= self.confs.len() => self.confs.insert(pos, conf),
            _ => self.confs.push(conf),
        }
    }

    /// Fullnames, filtered by namespace when `ns` is given (`Some("")`
    /// selects the default namespace only).
    pub fn list(&self, ns: Option<&str>) -> Vec<String> {
        self.confs
            .iter()
            .filter(|c| match ns {
                None => true,
                Some(ns) => split_fullname(&c.name).0 == ns,
            })
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Conf> {
        self.confs.iter()
    }

    pub fn len(&self) -> usize {
        self.confs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.confs.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// All eight per-kind stores.
#[derive(Debug, Default)]
pub struct Stores {
    channel: ConfStore,
    policer_action: ConfStore,
    queue: ConfStore,
    interface: ConfStore,
    policer: ConfStore,
    controller: ConfStore,
    port: ConfStore,
    bridge: ConfStore,
}

impl Stores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self, kind: Kind) -> &ConfStore {
        match kind {
            Kind::Channel => &self.channel,
            Kind::PolicerAction => &self.policer_action,
            Kind::Queue => &self.queue,
            Kind::Interface => &self.interface,
            Kind::Policer => &self.policer,
            Kind::Controller => &self.controller,
            Kind::Port => &self.port,
            Kind::Bridge => &self.bridge,
        }
    }

    pub fn store_mut(&mut self, kind: Kind) -> &mut ConfStore {
        match kind {
            Kind::Channel => &mut self.channel,
            Kind::PolicerAction => &mut self.policer_action,
            Kind::Queue => &mut self.queue,
            Kind::Interface => &mut self.interface,
            Kind::Policer => &mut self.policer,
            Kind::Controller => &mut self.controller,
            Kind::Port => &mut self.port,
            Kind::Bridge => &mut self.bridge,
        }
    }

    pub fn exists(&self, kind: Kind, name: &str) -> bool {
        self.store(kind).find(name).is_some()
    }

    /// The `is_used` flag of a named object.  `NotFound` when it is absent.
    pub fn is_used_of(&self, kind: Kind, name: &str) -> Result<bool> {
        self.store(kind)
            .find(name)
            .map(|c| c.is_used)
            .ok_or_else(|| DatastoreError::not_found(format!("name = {name}")))
    }

    /// Flip the `is_used` flag of a named object.  A missing object is not
    /// an error here: reference teardown runs after children may already be
    /// gone, so `NotFound` is promoted to `Ok`.
    pub fn set_used(&mut self, kind: Kind, name: &str, used: bool) -> Result<()> {
        if let Some(conf) = self.store_mut(kind).find_mut(name) {
            conf.is_used = used;
        }
        Ok(())
    }

    pub fn take(&mut self, kind: Kind, name: &str) -> Option<Conf> {
        self.store_mut(kind).take(name)
    }

    pub fn put_back(&mut self, conf: Conf) {
        let kind = conf.kind;
        self.store_mut(kind).put_back(conf);
    }

    /// True when no store holds any Conf.
    pub fn all_empty(&self) -> bool {
        Kind::ALL.iter().all(|k| self.store(*k).is_empty())
    }
}
