//! OpenFlow channel: the transport endpoint a controller speaks through.

use serde_json::{Value, json};

use crate::cmd::{OutConfigs, escape_name, parse_u16, take_opt_value};
use crate::error::{DatastoreError, Result};
use crate::store::Conf;

use super::Attr;

/* option names */
pub const OPT_DST_ADDR: &str = "-dst-addr";
pub const OPT_DST_PORT: &str = "-dst-port";
pub const OPT_LOCAL_ADDR: &str = "-local-addr";
pub const OPT_LOCAL_PORT: &str = "-local-port";
pub const OPT_PROTOCOL: &str = "-protocol";

/* show-field bits */
pub const FLAG_DST_ADDR: u64 = 1 << 1;
pub const FLAG_DST_PORT: u64 = 1 << 2;
pub const FLAG_LOCAL_ADDR: u64 = 1 << 3;
pub const FLAG_LOCAL_PORT: u64 = 1 << 4;
pub const FLAG_PROTOCOL: u64 = 1 << 5;
pub const FLAG_IS_USED: u64 = 1 << 6;
pub const FLAG_IS_ENABLED: u64 = 1 << 7;

pub const MINIMUM_DST_PORT: u16 = 1;
pub const MAXIMUM_DST_PORT: u16 = u16::MAX;

/// Transport protocol of the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    #[default]
    Tcp,
    Tls,
}

impl Protocol {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Tls => "tls",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "tcp" => Some(Self::Tcp),
            "tls" => Some(Self::Tls),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelAttr {
    dst_addr: String,
    dst_port: u16,
    local_addr: String,
    local_port: u16,
    protocol: Protocol,
}

impl Default for ChannelAttr {
    fn default() -> Self {
        Self {
            dst_addr: "127.0.0.1".to_string(),
            dst_port: 6633,
            local_addr: "0.0.0.0".to_string(),
            local_port: 0,
            protocol: Protocol::Tcp,
        }
    }
}

impl ChannelAttr {
    pub fn dst_addr(&self) -> &str {
        &self.dst_addr
    }

    pub fn set_dst_addr(&mut self, addr: &str) -> Result<()> {
        validate_addr(addr)?;
        self.dst_addr = addr.to_string();
        Ok(())
    }

    pub fn dst_port(&self) -> u16 {
        self.dst_port
    }

    pub fn set_dst_port(&mut self, port: u16) -> Result<()> {
        if port < MINIMUM_DST_PORT {
            return Err(DatastoreError::too_short(format!("dst port = {port}.")));
        }
        self.dst_port = port;
        Ok(())
    }

    pub fn local_addr(&self) -> &str {
        &self.local_addr
    }

    pub fn set_local_addr(&mut self, addr: &str) -> Result<()> {
        validate_addr(addr)?;
        self.local_addr = addr.to_string();
        Ok(())
    }

    pub fn local_port(&self) -> u16 {
        self.local_port
    }

    pub fn set_local_port(&mut self, port: u16) {
        self.local_port = port;
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn set_protocol(&mut self, protocol: Protocol) {
        self.protocol = protocol;
    }
}

fn validate_addr(addr: &str) -> Result<()> {
    addr.parse::<std::net::IpAddr>()
        .map(|_| ())
        .map_err(|_| DatastoreError::invalid_args(format!("Bad ip address = {addr}.")))
}

fn modified_attr<'a>(conf: &'a mut Conf) -> Result<&'a mut ChannelAttr> {
    match conf.modified_attr.as_mut() {
        Some(Attr::Channel(a)) => Ok(a),
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
        OPT_DST_ADDR => {
            let Some(v) = take_opt_value(args, configs, FLAG_DST_ADDR)? else {
                return Ok(());
            };
            modified_attr(conf)?.set_dst_addr(&v)
        }
        OPT_DST_PORT => {
            let Some(v) = take_opt_value(args, configs, FLAG_DST_PORT)? else {
                return Ok(());
            };
            let port = parse_u16(&v)?;
            modified_attr(conf)?
                .set_dst_port(port)
                .map_err(|e| e.with_context(format!("Can't add {OPT_DST_PORT}.")))
        }
        OPT_LOCAL_ADDR => {
            let Some(v) = take_opt_value(args, configs, FLAG_LOCAL_ADDR)? else {
                return Ok(());
            };
            modified_attr(conf)?.set_local_addr(&v)
        }
        OPT_LOCAL_PORT => {
            let Some(v) = take_opt_value(args, configs, FLAG_LOCAL_PORT)? else {
                return Ok(());
            };
            let port = parse_u16(&v)?;
            modified_attr(conf)?.set_local_port(port);
            Ok(())
        }
        OPT_PROTOCOL => {
            let Some(v) = take_opt_value(args, configs, FLAG_PROTOCOL)? else {
                return Ok(());
            };
            match Protocol::from_str(&v) {
                Some(p) => {
                    modified_attr(conf)?.set_protocol(p);
                    Ok(())
                }
                None => Err(DatastoreError::invalid_args(format!(
                    "Bad opt value = {v}."
                ))),
            }
        }
        _ => Err(DatastoreError::invalid_args(format!("opt = {opt}."))),
    }
}

pub fn json_item(conf: &Conf, attr: &ChannelAttr, flags: u64) -> Value {
    let mut item = serde_json::Map::new();
    item.insert("name".into(), json!(conf.name));
    if flags & FLAG_DST_ADDR != 0 {
        item.insert("dst-addr".into(), json!(attr.dst_addr));
    }
    if flags & FLAG_DST_PORT != 0 {
        item.insert("dst-port".into(), json!(attr.dst_port));
    }
    if flags & FLAG_LOCAL_ADDR != 0 {
        item.insert("local-addr".into(), json!(attr.local_addr));
    }
    if flags & FLAG_LOCAL_PORT != 0 {
        item.insert("local-port".into(), json!(attr.local_port));
    }
    if flags & FLAG_PROTOCOL != 0 {
        item.insert("protocol".into(), json!(attr.protocol.as_str()));
    }
    if flags & FLAG_IS_USED != 0 {
        item.insert("is-used".into(), json!(conf.is_used));
    }
    if flags & FLAG_IS_ENABLED != 0 {
        item.insert("is-enabled".into(), json!(conf.is_enabled));
    }
    Value::Object(item)
}

pub fn serialize_line(name: &str, attr: &ChannelAttr) -> String {
    format!(
        "channel {} create {} {} {} {} {} {} {} {} {} {}",
        escape_name(name),
        OPT_DST_ADDR,
        attr.dst_addr,
        OPT_DST_PORT,
        attr.dst_port,
        OPT_LOCAL_ADDR,
        attr.local_addr,
        OPT_LOCAL_PORT,
        attr.local_port,
        OPT_PROTOCOL,
        attr.protocol.as_str()
    )
}
