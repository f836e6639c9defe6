//! Mock data plane for integration tests.
//!
//! Records every `dp_*` call so tests can assert on the full call history
//! without a forwarding engine.  Two failure knobs simulate a data plane
//! that rejects a specific native create or start.

use ofp_datastore::app::ports::{DataPlanePort, PortStats, QueueStats};
use ofp_datastore::objects::{
    BridgeAttr, ChannelAttr, ControllerAttr, InterfaceAttr, PolicerActionAttr, PolicerAttr,
    PortAttr, QueueAttr,
};
use ofp_datastore::{DatastoreError, Result};

// ── Call record ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DpCall {
    Create { kind: &'static str, name: String },
    Destroy { kind: &'static str, name: String },
    Start { kind: &'static str, name: String },
    Stop { kind: &'static str, name: String },
    ChildAdd { relation: &'static str, parent: String, child: String },
    ChildDelete { relation: &'static str, parent: String, child: String },
    StatsGet { kind: &'static str, name: String },
}

// ── MockDataPlane ─────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockDataPlane {
    pub calls: Vec<DpCall>,
    /// Fail the native create of this fullname.
    pub fail_create_of: Option<String>,
    /// Fail the start of this fullname.
    pub fail_start_of: Option<String>,
}

#[allow(dead_code)]
impl MockDataPlane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count_creates(&self, kind: &str) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, DpCall::Create { kind: k, .. } if *k == kind))
            .count()
    }

    pub fn count_destroys(&self, kind: &str) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, DpCall::Destroy { kind: k, .. } if *k == kind))
            .count()
    }

    pub fn count_child_adds(&self, relation: &str) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, DpCall::ChildAdd { relation: r, .. } if *r == relation))
            .count()
    }

    pub fn count_child_deletes(&self, relation: &str) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, DpCall::ChildDelete { relation: r, .. } if *r == relation))
            .count()
    }

    pub fn started(&self, kind: &'static str, name: &str) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                DpCall::Start { kind: k, name: n } if *k == kind && n == name => Some(true),
                DpCall::Stop { kind: k, name: n } if *k == kind && n == name => Some(false),
                DpCall::Destroy { kind: k, name: n } if *k == kind && n == name => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }

    fn create(&mut self, kind: &'static str, name: &str) -> Result<()> {
        if self.fail_create_of.as_deref() == Some(name) {
            return Err(DatastoreError::invalid_args(format!(
                "dp refused create of {name}"
            )));
        }
        self.calls.push(DpCall::Create {
            kind,
            name: name.to_string(),
        });
        Ok(())
    }

    fn destroy(&mut self, kind: &'static str, name: &str) -> Result<()> {
        self.calls.push(DpCall::Destroy {
            kind,
            name: name.to_string(),
        });
        Ok(())
    }

    fn start(&mut self, kind: &'static str, name: &str) -> Result<()> {
        if self.fail_start_of.as_deref() == Some(name) {
            return Err(DatastoreError::invalid_args(format!(
                "dp refused start of {name}"
            )));
        }
        self.calls.push(DpCall::Start {
            kind,
            name: name.to_string(),
        });
        Ok(())
    }

    fn stop(&mut self, kind: &'static str, name: &str) -> Result<()> {
        self.calls.push(DpCall::Stop {
            kind,
            name: name.to_string(),
        });
        Ok(())
    }

    fn child_add(&mut self, relation: &'static str, parent: &str, child: &str) -> Result<()> {
        self.calls.push(DpCall::ChildAdd {
            relation,
            parent: parent.to_string(),
            child: child.to_string(),
        });
        Ok(())
    }

    fn child_delete(&mut self, relation: &'static str, parent: &str, child: &str) -> Result<()> {
        self.calls.push(DpCall::ChildDelete {
            relation,
            parent: parent.to_string(),
            child: child.to_string(),
        });
        Ok(())
    }
}

impl DataPlanePort for MockDataPlane {
    fn channel_create(&mut self, name: &str, _attr: &ChannelAttr) -> Result<()> {
        self.create("channel", name)
    }
    fn channel_destroy(&mut self, name: &str) -> Result<()> {
        self.destroy("channel", name)
    }
    fn channel_start(&mut self, name: &str) -> Result<()> {
        self.start("channel", name)
    }
    fn channel_stop(&mut self, name: &str) -> Result<()> {
        self.stop("channel", name)
    }

    fn policer_action_create(&mut self, name: &str, _attr: &PolicerActionAttr) -> Result<()> {
        self.create("policer-action", name)
    }
    fn policer_action_destroy(&mut self, name: &str) -> Result<()> {
        self.destroy("policer-action", name)
    }
    fn policer_action_start(&mut self, name: &str) -> Result<()> {
        self.start("policer-action", name)
    }
    fn policer_action_stop(&mut self, name: &str) -> Result<()> {
        self.stop("policer-action", name)
    }

    fn queue_create(&mut self, name: &str, _attr: &QueueAttr) -> Result<()> {
        self.create("queue", name)
    }
    fn queue_destroy(&mut self, name: &str) -> Result<()> {
        self.destroy("queue", name)
    }
    fn queue_start(&mut self, name: &str) -> Result<()> {
        self.start("queue", name)
    }
    fn queue_stop(&mut self, name: &str) -> Result<()> {
        self.stop("queue", name)
    }
    fn queue_stats_get(&mut self, name: &str) -> Result<QueueStats> {
        self.calls.push(DpCall::StatsGet {
            kind: "queue",
            name: name.to_string(),
        });
        Ok(QueueStats {
            port_no: 1,
            queue_id: 1,
            tx_bytes: 1024,
            tx_packets: 8,
            tx_errors: 0,
            duration_sec: 60,
            duration_nsec: 0,
        })
    }

    fn interface_create(&mut self, name: &str, _attr: &InterfaceAttr) -> Result<()> {
        self.create("interface", name)
    }
    fn interface_destroy(&mut self, name: &str) -> Result<()> {
        self.destroy("interface", name)
    }
    fn interface_start(&mut self, name: &str) -> Result<()> {
        self.start("interface", name)
    }
    fn interface_stop(&mut self, name: &str) -> Result<()> {
        self.stop("interface", name)
    }

    fn policer_create(&mut self, name: &str, _attr: &PolicerAttr) -> Result<()> {
        self.create("policer", name)
    }
    fn policer_destroy(&mut self, name: &str) -> Result<()> {
        self.destroy("policer", name)
    }
    fn policer_start(&mut self, name: &str) -> Result<()> {
        self.start("policer", name)
    }
    fn policer_stop(&mut self, name: &str) -> Result<()> {
        self.stop("policer", name)
    }
    fn policer_action_add(&mut self, name: &str, action_name: &str) -> Result<()> {
        self.child_add("policer-action", name, action_name)
    }
    fn policer_action_delete(&mut self, name: &str, action_name: &str) -> Result<()> {
        self.child_delete("policer-action", name, action_name)
    }

    fn controller_create(&mut self, name: &str, _attr: &ControllerAttr) -> Result<()> {
        self.create("controller", name)
    }
    fn controller_destroy(&mut self, name: &str) -> Result<()> {
        self.destroy("controller", name)
    }
    fn controller_start(&mut self, name: &str) -> Result<()> {
        self.start("controller", name)
    }
    fn controller_stop(&mut self, name: &str) -> Result<()> {
        self.stop("controller", name)
    }
    fn controller_channel_set(&mut self, name: &str, channel_name: &str) -> Result<()> {
        self.child_add("controller-channel", name, channel_name)
    }
    fn controller_channel_unset(&mut self, name: &str, channel_name: &str) -> Result<()> {
        self.child_delete("controller-channel", name, channel_name)
    }

    fn port_create(&mut self, name: &str, _attr: &PortAttr) -> Result<()> {
        self.create("port", name)
    }
    fn port_destroy(&mut self, name: &str) -> Result<()> {
        self.destroy("port", name)
    }
    fn port_start(&mut self, name: &str) -> Result<()> {
        self.start("port", name)
    }
    fn port_stop(&mut self, name: &str) -> Result<()> {
        self.stop("port", name)
    }
    fn port_interface_set(&mut self, name: &str, interface_name: &str) -> Result<()> {
        self.child_add("port-interface", name, interface_name)
    }
    fn port_interface_unset(&mut self, name: &str, interface_name: &str) -> Result<()> {
        self.child_delete("port-interface", name, interface_name)
    }
    fn port_policer_set(&mut self, name: &str, policer_name: &str) -> Result<()> {
        self.child_add("port-policer", name, policer_name)
    }
    fn port_policer_unset(&mut self, name: &str, policer_name: &str) -> Result<()> {
        self.child_delete("port-policer", name, policer_name)
    }
    fn port_queue_add(&mut self, name: &str, queue_name: &str) -> Result<()> {
        self.child_add("port-queue", name, queue_name)
    }
    fn port_queue_delete(&mut self, name: &str, queue_name: &str) -> Result<()> {
        self.child_delete("port-queue", name, queue_name)
    }
    fn port_stats_get(&mut self, name: &str) -> Result<PortStats> {
        self.calls.push(DpCall::StatsGet {
            kind: "port",
            name: name.to_string(),
        });
        Ok(PortStats {
            rx_packets: 16,
            tx_packets: 8,
            rx_bytes: 2048,
            tx_bytes: 1024,
            ..PortStats::default()
        })
    }

    fn bridge_create(&mut self, name: &str, _attr: &BridgeAttr) -> Result<()> {
        self.create("bridge", name)
    }
    fn bridge_destroy(&mut self, name: &str) -> Result<()> {
        self.destroy("bridge", name)
    }
    fn bridge_start(&mut self, name: &str) -> Result<()> {
        self.start("bridge", name)
    }
    fn bridge_stop(&mut self, name: &str) -> Result<()> {
        self.stop("bridge", name)
    }
    fn bridge_controller_add(&mut self, name: &str, controller_name: &str) -> Result<()> {
        self.child_add("bridge-controller", name, controller_name)
    }
    fn bridge_controller_delete(&mut self, name: &str, controller_name: &str) -> Result<()> {
        self.child_delete("bridge-controller", name, controller_name)
    }
    fn bridge_port_add(&mut self, name: &str, port_name: &str) -> Result<()> {
        self.child_add("bridge-port", name, port_name)
    }
    fn bridge_port_delete(&mut self, name: &str, port_name: &str) -> Result<()> {
        self.child_delete("bridge-port", name, port_name)
    }
}
