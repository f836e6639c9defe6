//! Port traits — the hexagonal boundary between the datastore core and the
//! data plane.
//!
//! ```text
//!   Command dispatch ──▶ Datastore (domain) ──▶ DataPlanePort ──▶ adapter
//! ```
//!
//! The transaction driver consumes the data plane exclusively through
//! [`DataPlanePort`], so the entire core is testable against a recording
//! mock.  Calls are synchronous: the driver treats completion as observable
//! on return.
//!
//! All port errors are typed — callers must handle every variant explicitly.

use serde::Serialize;

use crate::error::Result;
use crate::objects::{
    BridgeAttr, ChannelAttr, ControllerAttr, InterfaceAttr, PolicerActionAttr, PolicerAttr,
    PortAttr, QueueAttr,
};

// ───────────────────────────────────────────────────────────────
// Statistics records (read-only data-plane state)
// ───────────────────────────────────────────────────────────────

/// Counters for one queue, as reported by the data plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct QueueStats {
    pub port_no: u32,
    pub queue_id: u32,
    pub tx_bytes: u64,
    pub tx_packets: u64,
    pub tx_errors: u64,
    pub duration_sec: u32,
    pub duration_nsec: u32,
}

/// Counters for one port, as reported by the data plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PortStats {
    pub config: u32,
    pub curr_features: u32,
    pub rx_packets: u64,
    pub tx_packets: u64,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub rx_dropped: u64,
    pub tx_dropped: u64,
    pub rx_errors: u64,
    pub tx_errors: u64,
}

// ───────────────────────────────────────────────────────────────
// Data-plane port (driven adapter: domain → forwarding engine)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the datastore calls this to realise configuration in
/// the data plane.  One method group per object kind; single-reference
/// relations use `set`/`unset`, multi-reference relations `add`/`delete`.
pub trait DataPlanePort {
    // ── channel ───────────────────────────────────────────────
    fn channel_create(&mut self, name: &str, attr: &ChannelAttr) -> Result<()>;
    fn channel_destroy(&mut self, name: &str) -> Result<()>;
    fn channel_start(&mut self, name: &str) -> Result<()>;
    fn channel_stop(&mut self, name: &str) -> Result<()>;

    // ── policer-action ────────────────────────────────────────
    fn policer_action_create(&mut self, name: &str, attr: &PolicerActionAttr) -> Result<()>;
    fn policer_action_destroy(&mut self, name: &str) -> Result<()>;
    fn policer_action_start(&mut self, name: &str) -> Result<()>;
    fn policer_action_stop(&mut self, name: &str) -> Result<()>;

    // ── queue ─────────────────────────────────────────────────
    fn queue_create(&mut self, name: &str, attr: &QueueAttr) -> Result<()>;
    fn queue_destroy(&mut self, name: &str) -> Result<()>;
    fn queue_start(&mut self, name: &str) -> Result<()>;
    fn queue_stop(&mut self, name: &str) -> Result<()>;
    fn queue_stats_get(&mut self, name: &str) -> Result<QueueStats>;

    // ── interface ─────────────────────────────────────────────
    fn interface_create(&mut self, name: &str, attr: &InterfaceAttr) -> Result<()>;
    fn interface_destroy(&mut self, name: &str) -> Result<()>;
    fn interface_start(&mut self, name: &str) -> Result<()>;
    fn interface_stop(&mut self, name: &str) -> Result<()>;

    // ── policer ───────────────────────────────────────────────
    fn policer_create(&mut self, name: &str, attr: &PolicerAttr) -> Result<()>;
    fn policer_destroy(&mut self, name: &str) -> Result<()>;
    fn policer_start(&mut self, name: &str) -> Result<()>;
    fn policer_stop(&mut self, name: &str) -> Result<()>;
    fn policer_action_add(&mut self, name: &str, action_name: &str) -> Result<()>;
    fn policer_action_delete(&mut self, name: &str, action_name: &str) -> Result<()>;

    // ── controller ────────────────────────────────────────────
    fn controller_create(&mut self, name: &str, attr: &ControllerAttr) -> Result<()>;
    fn controller_destroy(&mut self, name: &str) -> Result<()>;
    fn controller_start(&mut self, name: &str) -> Result<()>;
    fn controller_stop(&mut self, name: &str) -> Result<()>;
    fn controller_channel_set(&mut self, name: &str, channel_name: &str) -> Result<()>;
    fn controller_channel_unset(&mut self, name: &str, channel_name: &str) -> Result<()>;

    // ── port ──────────────────────────────────────────────────
    fn port_create(&mut self, name: &str, attr: &PortAttr) -> Result<()>;
    fn port_destroy(&mut self, name: &str) -> Result<()>;
    fn port_start(&mut self, name: &str) -> Result<()>;
    fn port_stop(&mut self, name: &str) -> Result<()>;
    fn port_interface_set(&mut self, name: &str, interface_name: &str) -> Result<()>;
    fn port_interface_unset(&mut self, name: &str, interface_name: &str) -> Result<()>;
    fn port_policer_set(&mut self, name: &str, policer_name: &str) -> Result<()>;
    fn port_policer_unset(&mut self, name: &str, policer_name: &str) -> Result<()>;
    fn port_queue_add(&mut self, name: &str, queue_name: &str) -> Result<()>;
    fn port_queue_delete(&mut self, name: &str, queue_name: &str) -> Result<()>;
    fn port_stats_get(&mut self, name: &str) -> Result<PortStats>;

    // ── bridge ────────────────────────────────────────────────
    fn bridge_create(&mut self, name: &str, attr: &BridgeAttr) -> Result<()>;
    fn bridge_destroy(&mut self, name: &str) -> Result<()>;
    fn bridge_start(&mut self, name: &str) -> Result<()>;
    fn bridge_stop(&mut self, name: &str) -> Result<()>;
    fn bridge_controller_add(&mut self, name: &str, controller_name: &str) -> Result<()>;
    fn bridge_controller_delete(&mut self, name: &str, controller_name: &str) -> Result<()>;
    fn bridge_port_add(&mut self, name: &str, port_name: &str) -> Result<()>;
    fn bridge_port_delete(&mut self, name: &str, port_name: &str) -> Result<()>;
}
