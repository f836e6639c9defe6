//! Controller: an OpenFlow controller endpoint reached over one channel.

use serde_json::{Value, json};

use crate::cmd::{NameOp, OutConfigs, escape_name, opt_name_get, take_opt_value};
use crate::error::{DatastoreError, Result};
use crate::names;
use crate::store::{Conf, Stores};

use super::{Attr, ChildRef, Kind};

/* option names */
pub const OPT_CHANNEL: &str = "-channel";
pub const OPT_ROLE: &str = "-role";
pub const OPT_CONNECTION_TYPE: &str = "-connection-type";

/* show-field bits */
pub const FLAG_CHANNEL: u64 = 1 << 1;
pub const FLAG_ROLE: u64 = 1 << 2;
pub const FLAG_CONNECTION_TYPE: u64 = 1 << 3;
pub const FLAG_IS_USED: u64 = 1 << 4;
pub const FLAG_IS_ENABLED: u64 = 1 << 5;

/// OpenFlow 1.3 controller role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    Equal,
    Master,
    Slave,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::Master => "master",
            Self::Slave => "slave",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "equal" => Some(Self::Equal),
            "master" => Some(Self::Master),
            "slave" => Some(Self::Slave),
            _ => None,
        }
    }
}

/// Main or auxiliary connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionType {
    #[default]
    Main,
    Auxiliary,
}

impl ConnectionType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Auxiliary => "auxiliary",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "main" => Some(Self::Main),
            "auxiliary" => Some(Self::Auxiliary),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ControllerAttr {
    channel_name: Option<String>,
    role: Role,
    connection_type: ConnectionType,
}

impl ControllerAttr {
    pub fn channel_name(&self) -> Option<&str> {
        self.channel_name.as_deref()
    }

    pub fn set_channel_name(&mut self, name: &str) {
        self.channel_name = Some(name.to_string());
    }

    pub fn clear_channel_name(&mut self) {
        self.channel_name = None;
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn set_role(&mut self, role: Role) {
        self.role = role;
    }

    pub fn connection_type(&self) -> ConnectionType {
        self.connection_type
    }

    pub fn set_connection_type(&mut self, t: ConnectionType) {
        self.connection_type = t;
    }

    /// Equality ignoring the channel reference.
    pub fn equals_without_names(&self, other: &Self) -> bool {
        self.role == other.role && self.connection_type == other.connection_type
    }

    pub fn refs(&self) -> Vec<ChildRef> {
        self.channel_name
            .iter()
            .map(|n| ChildRef::new(Kind::Channel, "channel", n.clone()))
            .collect()
    }

    pub fn substitute_namespace(&mut self, ns: &str) -> Result<()> {
        if let Some(name) = &self.channel_name {
            self.channel_name = Some(names::replace_namespace(name, ns)?);
        }
        Ok(())
    }
}

fn modified_attr<'a>(conf: &'a mut Conf) -> Result<&'a mut ControllerAttr> {
    match conf.modified_attr.as_mut() {
        Some(Attr::Controller(a)) => Ok(a),
        _ => Err(DatastoreError::invalid_args("Not found attr.")),
    }
}

pub fn parse_opt(
    opt: &str,
    args: &mut std::slice::Iter<'_, String>,
    conf: &mut Conf,
    configs: &mut OutConfigs,
    stores: &mut Stores,
    current_ns: &str,
) -> Result<()> {
    match opt {
        OPT_CHANNEL => {
            let Some(v) = take_opt_value(args, configs, FLAG_CHANNEL)? else {
                return Ok(());
            };
            let (op, bare) = opt_name_get(&v);
            let full = names::resolve(current_ns, bare)
                .map_err(|e| e.with_context(format!("Can't get fullname {bare}.")))?;
            let old = modified_attr(conf)?.channel_name.clone();
            match op {
                NameOp::Add => {
                    if let Some(old) = &old {
                        stores.set_used(Kind::Channel, old, false)?;
                    }
                    if !stores.exists(Kind::Channel, &full) {
                        return Err(DatastoreError::not_found(format!(
                            "channel name = {full}."
                        )));
                    }
                    if stores.is_used_of(Kind::Channel, &full)? {
                        return Err(DatastoreError::not_operational(format!(
                            "channel name = {full}."
                        )));
                    }
                    modified_attr(conf)?.set_channel_name(&full);
                    Ok(())
                }
                NameOp::Delete => {
                    let Some(old) = old else {
                        return Err(DatastoreError::not_found(format!(
                            "channel name = {full}."
                        )));
                    };
                    stores.set_used(Kind::Channel, &old, false)?;
                    modified_attr(conf)?.clear_channel_name();
                    Ok(())
                }
            }
        }
        OPT_ROLE => {
            let Some(v) = take_opt_value(args, configs, FLAG_ROLE)? else {
                return Ok(());
            };
            match Role::from_str(&v) {
                Some(r) => {
                    modified_attr(conf)?.set_role(r);
                    Ok(())
                }
                None => Err(DatastoreError::invalid_args(format!(
                    "Bad opt value = {v}."
                ))),
            }
        }
        OPT_CONNECTION_TYPE => {
            let Some(v) = take_opt_value(args, configs, FLAG_CONNECTION_TYPE)? else {
                return Ok(());
            };
            match ConnectionType::from_str(&v) {
                Some(t) => {
                    modified_attr(conf)?.set_connection_type(t);
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

pub fn json_item(conf: &Conf, attr: &ControllerAttr, flags: u64) -> Value {
    let mut item = serde_json::Map::new();
    item.insert("name".into(), json!(conf.name));
    if flags & FLAG_CHANNEL != 0 {
        item.insert(
            "channel".into(),
            json!(attr.channel_name.as_deref().unwrap_or("")),
        );
    }
    if flags & FLAG_ROLE != 0 {
        item.insert("role".into(), json!(attr.role.as_str()));
    }
    if flags & FLAG_CONNECTION_TYPE != 0 {
        item.insert(
            "connection-type".into(),
            json!(attr.connection_type.as_str()),
        );
    }
    if flags & FLAG_IS_USED != 0 {
        item.insert("is-used".into(), json!(conf.is_used));
    }
    if flags & FLAG_IS_ENABLED != 0 {
        item.insert("is-enabled".into(), json!(conf.is_enabled));
    }
    Value::Object(item)
}

pub fn serialize_line(name: &str, attr: &ControllerAttr) -> String {
    let mut line = format!("controller {} create", escape_name(name));
    if let Some(channel) = &attr.channel_name {
        line.push_str(&format!(" {} {}", OPT_CHANNEL, escape_name(channel)));
    }
    line.push_str(&format!(
        " {} {} {} {}",
        OPT_ROLE,
        attr.role.as_str(),
        OPT_CONNECTION_TYPE,
        attr.connection_type.as_str()
    ));
    line
}
