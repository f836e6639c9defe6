//! Interface: the device binding a port forwards through.

use serde_json::{Value, json};

use crate::cmd::{OutConfigs, escape_name, parse_u16, parse_u32, take_opt_value};
use crate::error::{DatastoreError, Result};
use crate::store::Conf;

use super::Attr;

/* option names */
pub const OPT_TYPE: &str = "-type";
pub const OPT_PORT_NUMBER: &str = "-port-number";
pub const OPT_DEVICE: &str = "-device";
pub const OPT_MTU: &str = "-mtu";
pub const OPT_IP_ADDR: &str = "-ip-addr";

/* show-field bits */
pub const FLAG_TYPE: u64 = 1 << 1;
pub const FLAG_PORT_NUMBER: u64 = 1 << 2;
pub const FLAG_DEVICE: u64 = 1 << 3;
pub const FLAG_MTU: u64 = 1 << 4;
pub const FLAG_IP_ADDR: u64 = 1 << 5;
pub const FLAG_IS_USED: u64 = 1 << 6;
pub const FLAG_IS_ENABLED: u64 = 1 << 7;

pub const MAXIMUM_PORT_NUMBER: u32 = 0xffff_ff00;
pub const MINIMUM_MTU: u16 = 64;
pub const MAXIMUM_DEVICE_LEN: usize = 255;

/// Physical flavour of the interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterfaceType {
    /// Not set yet; rejected at enable time.
    #[default]
    Unknown,
    EthernetDpdkPhy,
    EthernetRawsock,
    Gre,
    Vxlan,
}

impl InterfaceType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::EthernetDpdkPhy => "ethernet-dpdk-phy",
            Self::EthernetRawsock => "ethernet-rawsock",
            Self::Gre => "gre",
            Self::Vxlan => "vxlan",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ethernet-dpdk-phy" => Some(Self::EthernetDpdkPhy),
            "ethernet-rawsock" => Some(Self::EthernetRawsock),
            "gre" => Some(Self::Gre),
            "vxlan" => Some(Self::Vxlan),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceAttr {
    interface_type: InterfaceType,
    port_number: u32,
    device: String,
    mtu: u16,
    ip_addr: String,
}

impl Default for InterfaceAttr {
    fn default() -> Self {
        Self {
            interface_type: InterfaceType::Unknown,
            port_number: 0,
            device: String::new(),
            mtu: 1500,
            ip_addr: "127.0.0.1".to_string(),
        }
    }
}

impl InterfaceAttr {
    pub fn interface_type(&self) -> InterfaceType {
        self.interface_type
    }

    pub fn set_interface_type(&mut self, t: InterfaceType) {
        self.interface_type = t;
    }

    pub fn port_number(&self) -> u32 {
        self.port_number
    }

    pub fn set_port_number(&mut self, n: u32) -> Result<()> {
        if n > MAXIMUM_PORT_NUMBER {
            return Err(DatastoreError::too_long(format!("port number = {n}.")));
        }
        self.port_number = n;
        Ok(())
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn set_device(&mut self, device: &str) -> Result<()> {
        if device.len() > MAXIMUM_DEVICE_LEN {
            return Err(DatastoreError::too_long(format!("device = {device}.")));
        }
        self.device = device.to_string();
        Ok(())
    }

    pub fn mtu(&self) -> u16 {
        self.mtu
    }

    pub fn set_mtu(&mut self, mtu: u16) -> Result<()> {
        if mtu < MINIMUM_MTU {
            return Err(DatastoreError::too_short(format!("mtu = {mtu}.")));
        }
        self.mtu = mtu;
        Ok(())
    }

    pub fn ip_addr(&self) -> &str {
        &self.ip_addr
    }

    pub fn set_ip_addr(&mut self, addr: &str) -> Result<()> {
        addr.parse::<std::net::IpAddr>()
            .map_err(|_| DatastoreError::invalid_args(format!("Bad ip address = {addr}.")))?;
        self.ip_addr = addr.to_string();
        Ok(())
    }
}

fn modified_attr<'a>(conf: &'a mut Conf) -> Result<&'a mut InterfaceAttr> {
    match conf.modified_attr.as_mut() {
        Some(Attr::Interface(a)) => Ok(a),
        _ => Err(DatastoreError::invalid_args("Not found attr.")),
    }
}

pub fn parse_opt(
    opt: &str,
    args: &mut std::slice::Iter<'_, String>,
    conf: &mut Conf,
    configs: &mut OutConfigs,
) -> Result<()> {
    match opt {
        OPT_TYPE => {
            let Some(v) = take_opt_value(args, configs, FLAG_TYPE)? else {
                return Ok(());
            };
            match InterfaceType::from_str(&v) {
                Some(t) => {
                    modified_attr(conf)?.set_interface_type(t);
                    Ok(())
                }
                None => Err(DatastoreError::invalid_args(format!(
                    "Bad opt value = {v}."
                ))),
            }
        }
        OPT_PORT_NUMBER => {
            let Some(v) = take_opt_value(args, configs, FLAG_PORT_NUMBER)? else {
                return Ok(());
            };
            let n = parse_u32(&v)?;
            modified_attr(conf)?
                .set_port_number(n)
                .map_err(|e| e.with_context(format!("Can't add {OPT_PORT_NUMBER}.")))
        }
        OPT_DEVICE => {
            let Some(v) = take_opt_value(args, configs, FLAG_DEVICE)? else {
                return Ok(());
            };
            modified_attr(conf)?
                .set_device(&v)
                .map_err(|e| e.with_context(format!("Can't add {OPT_DEVICE}.")))
        }
        OPT_MTU => {
            let Some(v) = take_opt_value(args, configs, FLAG_MTU)? else {
                return Ok(());
            };
            let mtu = parse_u16(&v)?;
            modified_attr(conf)?
                .set_mtu(mtu)
                .map_err(|e| e.with_context(format!("Can't add {OPT_MTU}.")))
        }
        OPT_IP_ADDR => {
            let Some(v) = take_opt_value(args, configs, FLAG_IP_ADDR)? else {
                return Ok(());
            };
            modified_attr(conf)?.set_ip_addr(&v)
        }
        _ => Err(DatastoreError::invalid_args(format!("opt = {opt}."))),
    }
}

pub fn json_item(conf: &Conf, attr: &InterfaceAttr, flags: u64) -> Value {
    let mut item = serde_json::Map::new();
    item.insert("name".into(), json!(conf.name));
    if flags & FLAG_TYPE != 0 {
        item.insert("type".into(), json!(attr.interface_type.as_str()));
    }
    if flags & FLAG_PORT_NUMBER != 0 {
        item.insert("port-number".into(), json!(attr.port_number));
    }
    if flags & FLAG_DEVICE != 0 {
        item.insert("device".into(), json!(attr.device));
    }
    if flags & FLAG_MTU != 0 {
        item.insert("mtu".into(), json!(attr.mtu));
    }
    if flags & FLAG_IP_ADDR != 0 {
        item.insert("ip-addr".into(), json!(attr.ip_addr));
    }
    if flags & FLAG_IS_USED != 0 {
        item.insert("is-used".into(), json!(conf.is_used));
    }
    if flags & FLAG_IS_ENABLED != 0 {
        item.insert("is-enabled".into(), json!(conf.is_enabled));
    }
    Value::Object(item)
}

pub fn serialize_line(name: &str, attr: &InterfaceAttr) -> String {
    let mut line = format!("interface {} create", escape_name(name));
    if attr.interface_type != InterfaceType::Unknown {
        line.push_str(&format!(" {} {}", OPT_TYPE, attr.interface_type.as_str()));
    }
    line.push_str(&format!(" {} {}", OPT_PORT_NUMBER, attr.port_number));
    if !attr.device.is_empty() {
        line.push_str(&format!(" {} {}", OPT_DEVICE, escape_name(&attr.device)));
    }
    line.push_str(&format!(" {} {}", OPT_MTU, attr.mtu));
    line.push_str(&format!(" {} {}", OPT_IP_ADDR, attr.ip_addr));
    line
}
