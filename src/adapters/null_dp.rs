//! A data plane that accepts everything.
//!
//! Every call logs at debug level and succeeds; stats read back as
//! zeroes.  Used by the interactive configurator and by examples that
//! only exercise the datastore semantics.

use log::debug;

use crate::app::ports::{DataPlanePort, PortStats, QueueStats};
use crate::error::Result;
use crate::objects::{
    BridgeAttr, ChannelAttr, ControllerAttr, InterfaceAttr, PolicerActionAttr, PolicerAttr,
    PortAttr, QueueAttr,
};

/// The accept-all data plane.
#[derive(Debug, Default)]
pub struct NullDataPlane;

impl NullDataPlane {
    pub fn new() -> Self {
        Self
    }
}

macro_rules! accept {
    ($($method:ident),+ $(,)?) => {
        $(
            fn $method(&mut self, name: &str) -> Result<()> {
                debug!(concat!("dp ", stringify!($method), ": {}"), name);
                Ok(())
            }
        )+
    };
}

macro_rules! accept_pair {
    ($($method:ident),+ $(,)?) => {
        $(
            fn $method(&mut self, name: &str, child: &str) -> Result<()> {
                debug!(concat!("dp ", stringify!($method), ": {} {}"), name, child);
                Ok(())
            }
        )+
    };
}

impl DataPlanePort for NullDataPlane {
    fn channel_create(&mut self, name: &str, _attr: &ChannelAttr) -> Result<()> {
        debug!("dp channel_create: {name}");
        Ok(())
    }

    fn policer_action_create(&mut self, name: &str, _attr: &PolicerActionAttr) -> Result<()> {
        debug!("dp policer_action_create: {name}");
        Ok(())
    }

    fn queue_create(&mut self, name: &str, _attr: &QueueAttr) -> Result<()> {
        debug!("dp queue_create: {name}");
        Ok(())
    }

    fn interface_create(&mut self, name: &str, _attr: &InterfaceAttr) -> Result<()> {
        debug!("dp interface_create: {name}");
        Ok(())
    }

    fn policer_create(&mut self, name: &str, _attr: &PolicerAttr) -> Result<()> {
        debug!("dp policer_create: {name}");
        Ok(())
    }

    fn controller_create(&mut self, name: &str, _attr: &ControllerAttr) -> Result<()> {
        debug!("dp controller_create: {name}");
        Ok(())
    }

    fn port_create(&mut self, name: &str, _attr: &PortAttr) -> Result<()> {
        debug!("dp port_create: {name}");
        Ok(())
    }

    fn bridge_create(&mut self, name: &str, _attr: &BridgeAttr) -> Result<()> {
        debug!("dp bridge_create: {name}");
        Ok(())
    }

    accept!(
        channel_destroy,
        channel_start,
        channel_stop,
        policer_action_destroy,
        policer_action_start,
        policer_action_stop,
        queue_destroy,
        queue_start,
        queue_stop,
        interface_destroy,
        interface_start,
        interface_stop,
        policer_destroy,
        policer_start,
        policer_stop,
        controller_destroy,
        controller_start,
        controller_stop,
        port_destroy,
        port_start,
        port_stop,
        bridge_destroy,
        bridge_start,
        bridge_stop,
    );

    accept_pair!(
        policer_action_add,
        policer_action_delete,
        controller_channel_set,
        controller_channel_unset,
        port_interface_set,
        port_interface_unset,
        port_policer_set,
        port_policer_unset,
        port_queue_add,
        port_queue_delete,
        bridge_controller_add,
        bridge_controller_delete,
        bridge_port_add,
        bridge_port_delete,
    );

    fn queue_stats_get(&mut self, name: &str) -> Result<QueueStats> {
        debug!("dp queue_stats_get: {name}");
        Ok(QueueStats::default())
    }

    fn port_stats_get(&mut self, name: &str) -> Result<PortStats> {
        debug!("dp port_stats_get: {name}");
        Ok(PortStats::default())
    }
}
