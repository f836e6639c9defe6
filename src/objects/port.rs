//! Port: an OpenFlow switch port binding an interface, an optional
//! policer, and a set of queues.

use serde_json::{Value, json};

use crate::app::ports::PortStats;
use crate::cmd::{
    NameOp, OutConfigs, escape_name, opt_name_get, parse_u32, take_opt_value,
};
use crate::error::{DatastoreError, Result};
use crate::names::{self, NameList};
use crate::store::{Conf, Stores};

use super::{Attr, ChildRef, Kind};

/* option names */
pub const OPT_PORT_NUMBER: &str = "-port-number";
pub const OPT_INTERFACE: &str = "-interface";
pub const OPT_POLICER: &str = "-policer";
pub const OPT_QUEUE: &str = "-queue";

/* show-field bits */
pub const FLAG_PORT_NUMBER: u64 = 1 << 1;
pub const FLAG_INTERFACE: u64 = 1 << 2;
pub const FLAG_POLICER: u64 = 1 << 3;
pub const FLAG_QUEUES: u64 = 1 << 4;
pub const FLAG_IS_USED: u64 = 1 << 5;
pub const FLAG_IS_ENABLED: u64 = 1 << 6;

pub const MINIMUM_PORT_NUMBER: u32 = 1;
pub const MAXIMUM_PORT_NUMBER: u32 = 0xffff_ff00;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PortAttr {
    /// 0 until assigned.
    port_number: u32,
    interface_name: Option<String>,
    policer_name: Option<String>,
    queue_names: NameList,
}

impl PortAttr {
    pub fn port_number(&self) -> u32 {
        self.port_number
    }

    pub fn set_port_number(&mut self, n: u32) -> Result<()> {
        if n < MINIMUM_PORT_NUMBER {
            return Err(DatastoreError::too_short(format!("port number = {n}.")));
        }
        if n > MAXIMUM_PORT_NUMBER {
            return Err(DatastoreError::too_long(format!("port number = {n}.")));
        }
        self.port_number = n;
        Ok(())
    }

    pub fn interface_name(&self) -> Option<&str> {
        self.interface_name.as_deref()
    }

    pub fn set_interface_name(&mut self, name: &str) {
        self.interface_name = Some(name.to_string());
    }

    pub fn clear_interface_name(&mut self) {
        self.interface_name = None;
    }

    pub fn policer_name(&self) -> Option<&str> {
        self.policer_name.as_deref()
    }

    pub fn set_policer_name(&mut self, name: &str) {
        self.policer_name = Some(name.to_string());
    }

    pub fn clear_policer_name(&mut self) {
        self.policer_name = None;
    }

    pub fn queue_names(&self) -> &NameList {
        &self.queue_names
    }

    pub fn add_queue_name(&mut self, name: &str) -> Result<()> {
        self.queue_names.add(name)
    }

    pub fn remove_queue_name(&mut self, name: &str) -> Result<()> {
        self.queue_names.remove(name)
    }

    /// Equality ignoring every reference field.
    pub fn equals_without_names(&self, other: &Self) -> bool {
        self.port_number == other.port_number
    }

    pub fn refs(&self) -> Vec<ChildRef> {
        let mut refs = Vec::new();
        if let Some(name) = &self.interface_name {
            refs.push(ChildRef::new(Kind::Interface, "interface", name.clone()));
        }
        if let Some(name) = &self.policer_name {
            refs.push(ChildRef::new(Kind::Policer, "policer", name.clone()));
        }
        for name in self.queue_names.iter() {
            refs.push(ChildRef::new(Kind::Queue, "queue", name));
        }
        refs
    }

    pub fn substitute_namespace(&mut self, ns: &str) -> Result<()> {
        if let Some(name) = &self.interface_name {
            self.interface_name = Some(names::replace_namespace(name, ns)?);
        }
        if let Some(name) = &self.policer_name {
            self.policer_name = Some(names::replace_namespace(name, ns)?);
        }
        self.queue_names = self.queue_names.duplicate(Some(ns))?;
        Ok(())
    }
}

fn modified_attr<'a>(conf: &'a mut Conf) -> Result<&'a mut PortAttr> {
    match conf.modified_attr.as_mut() {
        Some(Attr::Port(a)) => Ok(a),
        _ => Err(DatastoreError::invalid_args("Not found attr.")),
    }
}

/// The id of a queue Conf, reading the pending attr when present.
fn queue_id_of(stores: &Stores, queue_name: &str) -> Option<u32> {
    let conf = stores.store(Kind::Queue).find(queue_name)?;
    let attr = conf.modified_attr.as_ref().or(conf.current_attr.as_ref())?;
    match attr {
        Attr::Queue(q) => Some(q.id()),
        _ => None,
    }
}

/// A port may not hold two queues with the same queue id.
fn queue_id_exists(stores: &Stores, conf: &Conf, queue_id: u32) -> bool {
    let lists = [
        conf.current_attr.as_ref(),
        conf.modified_attr.as_ref(),
    ];
    for attr in lists.into_iter().flatten() {
        if let Attr::Port(p) = attr {
            for name in p.queue_names.iter() {
                if queue_id_of(stores, name) == Some(queue_id) {
                    return true;
                }
            }
        }
    }
    false
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
        OPT_PORT_NUMBER => {
            let Some(v) = take_opt_value(args, configs, FLAG_PORT_NUMBER)? else {
                return Ok(());
            };
            let n = parse_u32(&v)?;
            modified_attr(conf)?
                .set_port_number(n)
                .map_err(|e| e.with_context(format!("Can't add {OPT_PORT_NUMBER}.")))
        }
        OPT_INTERFACE => {
            let Some(v) = take_opt_value(args, configs, FLAG_INTERFACE)? else {
                return Ok(());
            };
            let (op, bare) = opt_name_get(&v);
            let full = names::resolve(current_ns, bare)
                .map_err(|e| e.with_context(format!("Can't get fullname {bare}.")))?;
            let old = modified_attr(conf)?.interface_name.clone();
            match op {
                NameOp::Add => {
                    if let Some(old) = &old {
                        stores.set_used(Kind::Interface, old, false)?;
                    }
                    if !stores.exists(Kind::Interface, &full) {
                        return Err(DatastoreError::not_found(format!(
                            "interface name = {full}."
                        )));
                    }
                    if stores.is_used_of(Kind::Interface, &full)? {
                        return Err(DatastoreError::not_operational(format!(
                            "interface name = {full}."
                        )));
                    }
                    modified_attr(conf)?.set_interface_name(&full);
                    Ok(())
                }
                NameOp::Delete => {
                    let Some(old) = old else {
                        return Err(DatastoreError::not_found(format!(
                            "interface name = {full}."
                        )));
                    };
                    stores.set_used(Kind::Interface, &old, false)?;
                    modified_attr(conf)?.clear_interface_name();
                    Ok(())
                }
            }
        }
        OPT_POLICER => {
            let Some(v) = take_opt_value(args, configs, FLAG_POLICER)? else {
                return Ok(());
            };
            let (op, bare) = opt_name_get(&v);
            let full = names::resolve(current_ns, bare)
                .map_err(|e| e.with_context(format!("Can't get fullname {bare}.")))?;
            let old = modified_attr(conf)?.policer_name.clone();
            match op {
                NameOp::Add => {
                    if let Some(old) = &old {
                        stores.set_used(Kind::Policer, old, false)?;
                    }
                    if !stores.exists(Kind::Policer, &full) {
                        return Err(DatastoreError::not_found(format!(
                            "policer name = {full}."
                        )));
                    }
                    if stores.is_used_of(Kind::Policer, &full)? {
                        return Err(DatastoreError::not_operational(format!(
                            "policer name = {full}."
                        )));
                    }
                    modified_attr(conf)?.set_policer_name(&full);
                    Ok(())
                }
                NameOp::Delete => {
                    let Some(old) = old else {
                        return Err(DatastoreError::not_found(format!(
                            "policer name = {full}."
                        )));
                    };
                    stores.set_used(Kind::Policer, &old, false)?;
                    modified_attr(conf)?.clear_policer_name();
                    Ok(())
                }
            }
        }
        OPT_QUEUE => {
            let Some(v) = take_opt_value(args, configs, FLAG_QUEUES)? else {
                return Ok(());
            };
            let (op, bare) = opt_name_get(&v);
            let full = names::resolve(current_ns, bare)
                .map_err(|e| e.with_context(format!("Can't get fullname {bare}.")))?;
            match op {
                NameOp::Add => {
                    if modified_attr(conf)?.queue_names.contains(&full) {
                        return Err(DatastoreError::already_exists(format!(
                            "queue name = {full}."
                        )));
                    }
                    if !stores.exists(Kind::Queue, &full) {
                        return Err(DatastoreError::not_found(format!(
                            "queue name = {full}."
                        )));
                    }
                    if stores.is_used_of(Kind::Queue, &full)? {
                        return Err(DatastoreError::not_operational(format!(
                            "queue name = {full}."
                        )));
                    }
                    if let Some(id) = queue_id_of(stores, &full) {
                        if queue_id_exists(stores, conf, id) {
                            return Err(DatastoreError::already_exists(format!(
                                "queue id = {id}."
                            )));
                        }
                    }
                    modified_attr(conf)?.add_queue_name(&full)
                }
                NameOp::Delete => {
                    if !modified_attr(conf)?.queue_names.contains(&full) {
                        return Err(DatastoreError::not_found(format!(
                            "queue name = {full}."
                        )));
                    }
                    modified_attr(conf)?.remove_queue_name(&full)?;
                    stores.set_used(Kind::Queue, &full, false)
                }
            }
        }
        _ => Err(DatastoreError::invalid_args(format!("opt = {opt}."))),
    }
}

pub fn json_item(conf: &Conf, attr: &PortAttr, flags: u64) -> Value {
    let mut item = serde_json::Map::new();
    item.insert("name".into(), json!(conf.name));
    if flags & FLAG_PORT_NUMBER != 0 {
        item.insert("port-number".into(), json!(attr.port_number));
    }
    if flags & FLAG_INTERFACE != 0 {
        item.insert(
            "interface".into(),
            json!(attr.interface_name.as_deref().unwrap_or("")),
        );
    }
    if flags & FLAG_POLICER != 0 {
        item.insert(
            "policer".into(),
            json!(attr.policer_name.as_deref().unwrap_or("")),
        );
    }
    if flags & FLAG_QUEUES != 0 {
        let queues: Vec<&str> = attr.queue_names.iter().collect();
        item.insert("queues".into(), json!(queues));
    }
    if flags & FLAG_IS_USED != 0 {
        item.insert("is-used".into(), json!(conf.is_used));
    }
    if flags & FLAG_IS_ENABLED != 0 {
        item.insert("is-enabled".into(), json!(conf.is_enabled));
    }
    Value::Object(item)
}

pub fn stats_json(name: &str, stats: &PortStats) -> Value {
    let mut item = match serde_json::to_value(stats) {
        Ok(Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    };
    item.insert("name".into(), json!(name));
    Value::Array(vec![Value::Object(item)])
}

pub fn serialize_line(name: &str, attr: &PortAttr) -> String {
    let mut line = format!("port {} create", escape_name(name));
    if let Some(interface) = &attr.interface_name {
        line.push_str(&format!(" {} {}", OPT_INTERFACE, escape_name(interface)));
    }
    if let Some(policer) = &attr.policer_name {
        line.push_str(&format!(" {} {}", OPT_POLICER, escape_name(policer)));
    }
    for queue in attr.queue_names.iter() {
        line.push_str(&format!(" {} {}", OPT_QUEUE, escape_name(queue)));
    }
    if attr.port_number != 0 {
        line.push_str(&format!(" {} {}", OPT_PORT_NUMBER, attr.port_number));
    }
    line
}
