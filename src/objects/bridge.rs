//! Bridge: an OpenFlow logical switch binding controllers and ports.

use serde_json::{Value, json};

use crate::cmd::{
    NameOp, OutConfigs, escape_name, opt_name_get, parse_u64, take_opt_value,
};
use crate::error::{DatastoreError, Result};
use crate::names::{self, NameList};
use crate::store::{Conf, Stores};

use super::{Attr, ChildRef, Kind};

/* option names */
pub const OPT_DPID: &str = "-dpid";
pub const OPT_CONTROLLER: &str = "-controller";
pub const OPT_PORT: &str = "-port";
pub const OPT_FAIL_MODE: &str = "-fail-mode";

/* show-field bits */
pub const FLAG_DPID: u64 = 1 << 1;
pub const FLAG_CONTROLLERS: u64 = 1 << 2;
pub const FLAG_PORTS: u64 = 1 << 3;
pub const FLAG_FAIL_MODE: u64 = 1 << 4;
pub const FLAG_IS_USED: u64 = 1 << 5;
pub const FLAG_IS_ENABLED: u64 = 1 << 6;

pub const MINIMUM_DPID: u64 = 1;

/// Behaviour when every controller connection is lost.
/// Defaulted to `secure` at create time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailMode {
    #[default]
    Secure,
    Standalone,
}

impl FailMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Secure => "secure",
            Self::Standalone => "standalone",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "secure" => Some(Self::Secure),
            "standalone" => Some(Self::Standalone),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BridgeAttr {
    dpid: u64,
    fail_mode: FailMode,
    controller_names: NameList,
    port_names: NameList,
}

impl Default for BridgeAttr {
    fn default() -> Self {
        Self {
            dpid: 1,
            fail_mode: FailMode::Secure,
            controller_names: NameList::new(),
            port_names: NameList::new(),
        }
    }
}

impl BridgeAttr {
    pub fn dpid(&self) -> u64 {
        self.dpid
    }

    pub fn set_dpid(&mut self, dpid: u64) -> Result<()> {
        if dpid < MINIMUM_DPID {
            return Err(DatastoreError::too_short(format!("dpid = {dpid}.")));
        }
        self.dpid = dpid;
        Ok(())
    }

    pub fn fail_mode(&self) -> FailMode {
        self.fail_mode
    }

    pub fn set_fail_mode(&mut self, mode: FailMode) {
        self.fail_mode = mode;
    }

    pub fn controller_names(&self) -> &NameList {
        &self.controller_names
    }

    pub fn add_controller_name(&mut self, name: &str) -> Result<()> {
        self.controller_names.add(name)
    }

    pub fn remove_controller_name(&mut self, name: &str) -> Result<()> {
        self.controller_names.remove(name)
    }

    pub fn port_names(&self) -> &NameList {
        &self.port_names
    }

    pub fn add_port_name(&mut self, name: &str) -> Result<()> {
        self.port_names.add(name)
    }

    pub fn remove_port_name(&mut self, name: &str) -> Result<()> {
        self.port_names.remove(name)
    }

    /// Equality ignoring the controller and port lists.
    pub fn equals_without_names(&self, other: &Self) -> bool {
        self.dpid == other.dpid && self.fail_mode == other.fail_mode
    }

    pub fn refs(&self) -> Vec<ChildRef> {
        let mut refs: Vec<ChildRef> = self
            .controller_names
            .iter()
            .map(|n| ChildRef::new(Kind::Controller, "controller", n))
            .collect();
        refs.extend(
            self.port_names
                .iter()
                .map(|n| ChildRef::new(Kind::Port, "port", n)),
        );
        refs
    }

    pub fn substitute_namespace(&mut self, ns: &str) -> Result<()> {
        self.controller_names = self.controller_names.duplicate(Some(ns))?;
        self.port_names = self.port_names.duplicate(Some(ns))?;
        Ok(())
    }
}

fn modified_attr<'a>(conf: &'a mut Conf) -> Result<&'a mut BridgeAttr> {
    match conf.modified_attr.as_mut() {
        Some(Attr::Bridge(a)) => Ok(a),
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
        OPT_DPID => {
            let Some(v) = take_opt_value(args, configs, FLAG_DPID)? else {
                return Ok(());
            };
            let n = parse_u64(&v)?;
            modified_attr(conf)?
                .set_dpid(n)
                .map_err(|e| e.with_context(format!("Can't add {OPT_DPID}.")))
        }
        OPT_FAIL_MODE => {
            let Some(v) = take_opt_value(args, configs, FLAG_FAIL_MODE)? else {
                return Ok(());
            };
            match FailMode::from_str(&v) {
                Some(m) => {
                    modified_attr(conf)?.set_fail_mode(m);
                    Ok(())
                }
                None => Err(DatastoreError::invalid_args(format!(
                    "Bad opt value = {v}."
                ))),
            }
        }
        OPT_CONTROLLER => {
            let Some(v) = take_opt_value(args, configs, FLAG_CONTROLLERS)? else {
                return Ok(());
            };
            let (op, bare) = opt_name_get(&v);
            let full = names::resolve(current_ns, bare)
                .map_err(|e| e.with_context(format!("Can't get fullname {bare}.")))?;
            match op {
                NameOp::Add => {
                    if modified_attr(conf)?.controller_names.contains(&full) {
                        return Err(DatastoreError::already_exists(format!(
                            "controller name = {full}."
                        )));
                    }
                    if !stores.exists(Kind::Controller, &full) {
                        return Err(DatastoreError::not_found(format!(
                            "controller name = {full}."
                        )));
                    }
                    if stores.is_used_of(Kind::Controller, &full)? {
                        return Err(DatastoreError::not_operational(format!(
                            "controller name = {full}."
                        )));
                    }
                    modified_attr(conf)?.add_controller_name(&full)
                }
                NameOp::Delete => {
                    if !modified_attr(conf)?.controller_names.contains(&full) {
                        return Err(DatastoreError::not_found(format!(
                            "controller name = {full}."
                        )));
                    }
                    modified_attr(conf)?.remove_controller_name(&full)?;
                    stores.set_used(Kind::Controller, &full, false)
                }
            }
        }
        OPT_PORT => {
            let Some(v) = take_opt_value(args, configs, FLAG_PORTS)? else {
                return Ok(());
            };
            let (op, bare) = opt_name_get(&v);
            let full = names::resolve(current_ns, bare)
                .map_err(|e| e.with_context(format!("Can't get fullname {bare}.")))?;
            match op {
                NameOp::Add => {
                    if modified_attr(conf)?.port_names.contains(&full) {
                        return Err(DatastoreError::already_exists(format!(
                            "port name = {full}."
                        )));
                    }
                    if !stores.exists(Kind::Port, &full) {
                        return Err(DatastoreError::not_found(format!(
                            "port name = {full}."
                        )));
                    }
                    if stores.is_used_of(Kind::Port, &full)? {
                        return Err(DatastoreError::not_operational(format!(
                            "port name = {full}."
                        )));
                    }
                    modified_attr(conf)?.add_port_name(&full)
                }
                NameOp::Delete => {
                    if !modified_attr(conf)?.port_names.contains(&full) {
                        return Err(DatastoreError::not_found(format!(
                            "port name = {full}."
                        )));
                    }
                    modified_attr(conf)?.remove_port_name(&full)?;
                    stores.set_used(Kind::Port, &full, false)
                }
            }
        }
        _ => Err(DatastoreError::invalid_args(format!("opt = {opt}."))),
    }
}

pub fn json_item(conf: &Conf, attr: &BridgeAttr, flags: u64) -> Value {
    let mut item = serde_json::Map::new();
    item.insert("name".into(), json!(conf.name));
    if flags & FLAG_DPID != 0 {
        item.insert("dpid".into(), json!(attr.dpid));
    }
    if flags & FLAG_CONTROLLERS != 0 {
        let controllers: Vec<&str> = attr.controller_names.iter().collect();
        item.insert("controllers".into(), json!(controllers));
    }
    if flags & FLAG_PORTS != 0 {
        let ports: Vec<&str> = attr.port_names.iter().collect();
        item.insert("ports".into(), json!(ports));
    }
    if flags & FLAG_FAIL_MODE != 0 {
        item.insert("fail-mode".into(), json!(attr.fail_mode.as_str()));
    }
    if flags & FLAG_IS_USED != 0 {
        item.insert("is-used".into(), json!(conf.is_used));
    }
    if flags & FLAG_IS_ENABLED != 0 {
        item.insert("is-enabled".into(), json!(conf.is_enabled));
    }
    Value::Object(item)
}

pub fn serialize_line(name: &str, attr: &BridgeAttr) -> String {
    let mut line = format!("bridge {} create", escape_name(name));
    for controller in attr.controller_names.iter() {
        line.push_str(&format!(" {} {}", OPT_CONTROLLER, escape_name(controller)));
    }
    for port in attr.port_names.iter() {
        line.push_str(&format!(" {} {}", OPT_PORT, escape_name(port)));
    }
    line.push_str(&format!(
        " {} {} {} {}",
        OPT_DPID,
        attr.dpid,
        OPT_FAIL_MODE,
        attr.fail_mode.as_str()
    ));
    line
}
