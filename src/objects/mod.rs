//! The catalogue of configurable object kinds.
//!
//! One sub-module per kind.  Each holds the kind's typed attribute record
//! with range-enforcing setters, its option table, its show fields, and its
//! canonical serialisation.  Everything the transaction driver needs to
//! treat kinds uniformly is dispatched through [`Kind`] and [`Attr`] here.
//!
//! The reference graph between kinds is a fixed DAG:
//!
//! ```text
//!   bridge ──▶ controller ──▶ channel
//!     │
//!     └──────▶ port ──▶ interface
//!                │ └──▶ policer ──▶ policer-action
//!                └────▶ queue
//! ```

pub mod bridge;
pub mod channel;
pub mod controller;
pub mod interface;
pub mod policer;
pub mod policer_action;
pub mod port;
pub mod queue;

use serde_json::Value;

use crate::app::ports::DataPlanePort;
use crate::cmd::OutConfigs;
use crate::error::{DatastoreError, Result};
use crate::store::{Conf, Stores};

pub use bridge::BridgeAttr;
pub use channel::ChannelAttr;
pub use controller::ControllerAttr;
pub use interface::InterfaceAttr;
pub use policer::PolicerAttr;
pub use policer_action::PolicerActionAttr;
pub use port::PortAttr;
pub use queue::QueueAttr;

// ---------------------------------------------------------------------------
// Kind
// ---------------------------------------------------------------------------

/// Identity of an object kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Channel,
    PolicerAction,
    Queue,
    Interface,
    Policer,
    Controller,
    Port,
    Bridge,
}

impl Kind {
    /// Every kind in dependency order, leaves first.  Walking this order
    /// guarantees a child is visited before any parent that references it;
    /// walking it reversed guarantees the opposite.
    pub const ALL: [Kind; 8] = [
        Kind::Channel,
        Kind::PolicerAction,
        Kind::Queue,
        Kind::Interface,
        Kind::Policer,
        Kind::Controller,
        Kind::Port,
        Kind::Bridge,
    ];

    /// The command spelling of this kind.
    pub const fn cmd_name(self) -> &'static str {
        match self {
            Self::Channel => "channel",
            Self::PolicerAction => "policer-action",
            Self::Queue => "queue",
            Self::Interface => "interface",
            Self::Policer => "policer",
            Self::Controller => "controller",
            Self::Port => "port",
            Self::Bridge => "bridge",
        }
    }

    pub fn from_cmd_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.cmd_name() == name)
    }
}

// ---------------------------------------------------------------------------
// Child references
// ---------------------------------------------------------------------------

/// A reference from a parent attribute to a child object, tagged with the
/// option word the parent uses for it (`action`, `queue`, ...) so failure
/// messages can name the relationship the way the user spelled it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildRef {
    pub kind: Kind,
    pub role: &'static str,
    pub name: String,
}

impl ChildRef {
    pub fn new(kind: Kind, role: &'static str, name: impl Into<String>) -> Self {
        Self {
            kind,
            role,
            name: name.into(),
        }
    }

    /// Attach this child's identity to an error message and seal it, so
    /// outer layers report the failing referenced object by name.
    pub fn name_error(&self, e: &DatastoreError) -> DatastoreError {
        if e.is_final() {
            e.clone()
        } else {
            DatastoreError::new(e.code, format!("{} name = {}.", self.role, self.name))
                .finalize()
        }
    }
}

// ---------------------------------------------------------------------------
// Attr — one committed or pending version of an object's configuration
// ---------------------------------------------------------------------------

/// A typed attribute record for any kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Attr {
    Channel(ChannelAttr),
    PolicerAction(PolicerActionAttr),
    Queue(QueueAttr),
    Interface(InterfaceAttr),
    Policer(PolicerAttr),
    Controller(ControllerAttr),
    Port(PortAttr),
    Bridge(BridgeAttr),
}

impl Attr {
    /// An empty-default attribute for the kind.
    pub fn default_for(kind: Kind) -> Self {
        match kind {
            Kind::Channel => Self::Channel(ChannelAttr::default()),
            Kind::PolicerAction => Self::PolicerAction(PolicerActionAttr::default()),
            Kind::Queue => Self::Queue(QueueAttr::default()),
            Kind::Interface => Self::Interface(InterfaceAttr::default()),
            Kind::Policer => Self::Policer(PolicerAttr::default()),
            Kind::Controller => Self::Controller(ControllerAttr::default()),
            Kind::Port => Self::Port(PortAttr::default()),
            Kind::Bridge => Self::Bridge(BridgeAttr::default()),
        }
    }

    pub const fn kind(&self) -> Kind {
        match self {
            Self::Channel(_) => Kind::Channel,
            Self::PolicerAction(_) => Kind::PolicerAction,
            Self::Queue(_) => Kind::Queue,
            Self::Interface(_) => Kind::Interface,
            Self::Policer(_) => Kind::Policer,
            Self::Controller(_) => Kind::Controller,
            Self::Port(_) => Kind::Port,
            Self::Bridge(_) => Kind::Bridge,
        }
    }

    /// Equality that ignores every reference field (single refs and
    /// name-lists).  The transaction driver uses this to distinguish a
    /// structural modification (native object must be re-created) from a
    /// reference-only modification (children added/removed).
    pub fn equals_without_names(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Channel(a), Self::Channel(b)) => a == b,
            (Self::PolicerAction(a), Self::PolicerAction(b)) => a == b,
            (Self::Queue(a), Self::Queue(b)) => a == b,
            (Self::Interface(a), Self::Interface(b)) => a == b,
            (Self::Policer(a), Self::Policer(b)) => a.equals_without_names(b),
            (Self::Controller(a), Self::Controller(b)) => a.equals_without_names(b),
            (Self::Port(a), Self::Port(b)) => a.equals_without_names(b),
            (Self::Bridge(a), Self::Bridge(b)) => a.equals_without_names(b),
            _ => false,
        }
    }

    /// Every child reference held by this attribute, in the kind's fixed
    /// propagation order.
    pub fn refs(&self) -> Vec<ChildRef> {
        match self {
            Self::Channel(_) | Self::PolicerAction(_) | Self::Queue(_) | Self::Interface(_) => {
                Vec::new()
            }
            Self::Policer(a) => a.refs(),
            Self::Controller(a) => a.refs(),
            Self::Port(a) => a.refs(),
            Self::Bridge(a) => a.refs(),
        }
    }

    /// Rewrite every contained fullname (references only; the owning name
    /// lives on the Conf) under a new namespace.
    pub fn substitute_namespace(&mut self, ns: &str) -> Result<()> {
        match self {
            Self::Channel(_) | Self::PolicerAction(_) | Self::Queue(_) | Self::Interface(_) => {
                Ok(())
            }
            Self::Policer(a) => a.substitute_namespace(ns),
            Self::Controller(a) => a.substitute_namespace(ns),
            Self::Port(a) => a.substitute_namespace(ns),
            Self::Bridge(a) => a.substitute_namespace(ns),
        }
    }

    /// Create the native object in the data plane (children not included).
    pub fn dp_create(&self, dp: &mut dyn DataPlanePort, name: &str) -> Result<()> {
        log::info!("create {}. name = {}.", self.kind().cmd_name(), name);
        match self {
            Self::Channel(a) => dp.channel_create(name, a),
            Self::PolicerAction(a) => dp.policer_action_create(name, a),
            Self::Queue(a) => dp.queue_create(name, a),
            Self::Interface(a) => dp.interface_create(name, a),
            Self::Policer(a) => dp.policer_create(name, a),
            Self::Controller(a) => dp.controller_create(name, a),
            Self::Port(a) => dp.port_create(name, a),
            Self::Bridge(a) => dp.bridge_create(name, a),
        }
    }
}

// ---------------------------------------------------------------------------
// Kind-level data-plane shims
// ---------------------------------------------------------------------------

pub fn dp_destroy(dp: &mut dyn DataPlanePort, kind: Kind, name: &str) -> Result<()> {
    log::info!("destroy {}. name = {}.", kind.cmd_name(), name);
    match kind {
        Kind::Channel => dp.channel_destroy(name),
        Kind::PolicerAction => dp.policer_action_destroy(name),
        Kind::Queue => dp.queue_destroy(name),
        Kind::Interface => dp.interface_destroy(name),
        Kind::Policer => dp.policer_destroy(name),
        Kind::Controller => dp.controller_destroy(name),
        Kind::Port => dp.port_destroy(name),
        Kind::Bridge => dp.bridge_destroy(name),
    }
}

pub fn dp_start(dp: &mut dyn DataPlanePort, kind: Kind, name: &str) -> Result<()> {
    log::info!("start {}. name = {}.", kind.cmd_name(), name);
    match kind {
        Kind::Channel => dp.channel_start(name),
        Kind::PolicerAction => dp.policer_action_start(name),
        Kind::Queue => dp.queue_start(name),
        Kind::Interface => dp.interface_start(name),
        Kind::Policer => dp.policer_start(name),
        Kind::Controller => dp.controller_start(name),
        Kind::Port => dp.port_start(name),
        Kind::Bridge => dp.bridge_start(name),
    }
}

pub fn dp_stop(dp: &mut dyn DataPlanePort, kind: Kind, name: &str) -> Result<()> {
    log::info!("stop {}. name = {}.", kind.cmd_name(), name);
    match kind {
        Kind::Channel => dp.channel_stop(name),
        Kind::PolicerAction => dp.policer_action_stop(name),
        Kind::Queue => dp.queue_stop(name),
        Kind::Interface => dp.interface_stop(name),
        Kind::Policer => dp.policer_stop(name),
        Kind::Controller => dp.controller_stop(name),
        Kind::Port => dp.port_stop(name),
        Kind::Bridge => dp.bridge_stop(name),
    }
}

/// Attach one child to its parent's native object.
pub fn dp_child_add(
    dp: &mut dyn DataPlanePort,
    parent_kind: Kind,
    parent_name: &str,
    child: &ChildRef,
) -> Result<()> {
    log::info!(
        "add {} {}({}). {} name = {}.",
        parent_kind.cmd_name(),
        child.role,
        parent_name,
        child.role,
        child.name
    );
    match (parent_kind, child.kind) {
        (Kind::Policer, Kind::PolicerAction) => dp.policer_action_add(parent_name, &child.name),
        (Kind::Controller, Kind::Channel) => dp.controller_channel_set(parent_name, &child.name),
        (Kind::Port, Kind::Interface) => dp.port_interface_set(parent_name, &child.name),
        (Kind::Port, Kind::Policer) => dp.port_policer_set(parent_name, &child.name),
        (Kind::Port, Kind::Queue) => dp.port_queue_add(parent_name, &child.name),
        (Kind::Bridge, Kind::Controller) => dp.bridge_controller_add(parent_name, &child.name),
        (Kind::Bridge, Kind::Port) => dp.bridge_port_add(parent_name, &child.name),
        _ => Err(DatastoreError::invalid_args(format!(
            "Bad relation: {} -> {}.",
            parent_kind.cmd_name(),
            child.kind.cmd_name()
        ))),
    }
}

/// Detach one child from its parent's native object.
pub fn dp_child_delete(
    dp: &mut dyn DataPlanePort,
    parent_kind: Kind,
    parent_name: &str,
    child: &ChildRef,
) -> Result<()> {
    log::info!(
        "delete {} {}({}). {} name = {}.",
        parent_kind.cmd_name(),
        child.role,
        parent_name,
        child.role,
        child.name
    );
    match (parent_kind, child.kind) {
        (Kind::Policer, Kind::PolicerAction) => dp.policer_action_delete(parent_name, &child.name),
        (Kind::Controller, Kind::Channel) => dp.controller_channel_unset(parent_name, &child.name),
        (Kind::Port, Kind::Interface) => dp.port_interface_unset(parent_name, &child.name),
        (Kind::Port, Kind::Policer) => dp.port_policer_unset(parent_name, &child.name),
        (Kind::Port, Kind::Queue) => dp.port_queue_delete(parent_name, &child.name),
        (Kind::Bridge, Kind::Controller) => dp.bridge_controller_delete(parent_name, &child.name),
        (Kind::Bridge, Kind::Port) => dp.bridge_port_delete(parent_name, &child.name),
        _ => Err(DatastoreError::invalid_args(format!(
            "Bad relation: {} -> {}.",
            parent_kind.cmd_name(),
            child.kind.cmd_name()
        ))),
    }
}

// ---------------------------------------------------------------------------
// Per-kind table dispatch (options, show, serialisation)
// ---------------------------------------------------------------------------

/// Parse one option for the kind.  `conf.modified_attr` must be populated.
/// Consumes the option's value token(s) from `args`.
pub fn parse_opt(
    kind: Kind,
    opt: &str,
    args: &mut std::slice::Iter<'_, String>,
    conf: &mut Conf,
    configs: &mut OutConfigs,
    stores: &mut Stores,
    current_ns: &str,
) -> Result<()> {
    match kind {
        Kind::Channel => channel::parse_opt(opt, args, conf, configs),
        Kind::PolicerAction => policer_action::parse_opt(opt, args, conf, configs),
        Kind::Queue => queue::parse_opt(opt, args, conf, configs),
        Kind::Interface => interface::parse_opt(opt, args, conf, configs),
        Kind::Policer => policer::parse_opt(opt, args, conf, configs, stores, current_ns),
        Kind::Controller => controller::parse_opt(opt, args, conf, configs, stores, current_ns),
        Kind::Port => port::parse_opt(opt, args, conf, configs, stores, current_ns),
        Kind::Bridge => bridge::parse_opt(opt, args, conf, configs, stores, current_ns),
    }
}

/// Build the show record for one Conf, selecting fields by `flags`.
pub fn json_item(conf: &Conf, attr: &Attr, flags: u64) -> Value {
    match attr {
        Attr::Channel(a) => channel::json_item(conf, a, flags),
        Attr::PolicerAction(a) => policer_action::json_item(conf, a, flags),
        Attr::Queue(a) => queue::json_item(conf, a, flags),
        Attr::Interface(a) => interface::json_item(conf, a, flags),
        Attr::Policer(a) => policer::json_item(conf, a, flags),
        Attr::Controller(a) => controller::json_item(conf, a, flags),
        Attr::Port(a) => port::json_item(conf, a, flags),
        Attr::Bridge(a) => bridge::json_item(conf, a, flags),
    }
}

/// Emit the canonical `create` line that regenerates this attribute.
pub fn serialize_line(name: &str, attr: &Attr) -> String {
    match attr {
        Attr::Channel(a) => channel::serialize_line(name, a),
        Attr::PolicerAction(a) => policer_action::serialize_line(name, a),
        Attr::Queue(a) => queue::serialize_line(name, a),
        Attr::Interface(a) => interface::serialize_line(name, a),
        Attr::Policer(a) => policer::serialize_line(name, a),
        Attr::Controller(a) => controller::serialize_line(name, a),
        Attr::Port(a) => port::serialize_line(name, a),
        Attr::Bridge(a) => bridge::serialize_line(name, a),
    }
}

/// True when the kind supports the `stats` sub-command.
pub const fn has_stats(kind: Kind) -> bool {
    matches!(kind, Kind::Queue | Kind::Port)
}
