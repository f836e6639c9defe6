//! Policer: rate limiting applied to a port, delegating the out-of-profile
//! verdict to referenced policer-actions.

use serde_json::{Value, json};

use crate::cmd::{
    NameOp, OutConfigs, escape_name, opt_name_get, parse_u8, parse_u64, take_opt_value,
};
use crate::error::{DatastoreError, Result};
use crate::names::{self, NameList};
use crate::store::{Conf, Stores};

use super::{Attr, ChildRef, Kind};

/* option names */
pub const OPT_ACTION: &str = "-action";
pub const OPT_BANDWIDTH_LIMIT: &str = "-bandwidth-limit";
pub const OPT_BURST_SIZE_LIMIT: &str = "-burst-size-limit";
pub const OPT_BANDWIDTH_PERCENT: &str = "-bandwidth-percent";

/* show-field bits */
pub const FLAG_ACTIONS: u64 = 1 << 1;
pub const FLAG_BANDWIDTH_LIMIT: u64 = 1 << 2;
pub const FLAG_BURST_SIZE_LIMIT: u64 = 1 << 3;
pub const FLAG_BANDWIDTH_PERCENT: u64 = 1 << 4;
pub const FLAG_IS_USED: u64 = 1 << 5;
pub const FLAG_IS_ENABLED: u64 = 1 << 6;

pub const MINIMUM_BANDWIDTH_LIMIT: u64 = 1500;
pub const MINIMUM_BURST_SIZE_LIMIT: u64 = 1500;
pub const MAXIMUM_BANDWIDTH_PERCENT: u8 = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct PolicerAttr {
    action_names: NameList,
    bandwidth_limit: u64,
    burst_size_limit: u64,
    bandwidth_percent: u8,
}

impl Default for PolicerAttr {
    fn default() -> Self {
        Self {
            action_names: NameList::new(),
            bandwidth_limit: 1500,
            burst_size_limit: 1500,
            bandwidth_percent: 0,
        }
    }
}

impl PolicerAttr {
    pub fn action_names(&self) -> &NameList {
        &self.action_names
    }

    pub fn add_action_name(&mut self, name: &str) -> Result<()> {
        self.action_names.add(name)
    }

    pub fn remove_action_name(&mut self, name: &str) -> Result<()> {
        self.action_names.remove(name)
    }

    pub fn bandwidth_limit(&self) -> u64 {
        self.bandwidth_limit
    }

    pub fn set_bandwidth_limit(&mut self, v: u64) -> Result<()> {
        if v < MINIMUM_BANDWIDTH_LIMIT {
            return Err(DatastoreError::too_short(format!(
                "bandwidth limit = {v}."
            )));
        }
        self.bandwidth_limit = v;
        Ok(())
    }

    pub fn burst_size_limit(&self) -> u64 {
        self.burst_size_limit
    }

    pub fn set_burst_size_limit(&mut self, v: u64) -> Result<()> {
        if v < MINIMUM_BURST_SIZE_LIMIT {
            return Err(DatastoreError::too_short(format!(
                "burst size limit = {v}."
            )));
        }
        self.burst_size_limit = v;
        Ok(())
    }

    pub fn bandwidth_percent(&self) -> u8 {
        self.bandwidth_percent
    }

    pub fn set_bandwidth_percent(&mut self, v: u8) -> Result<()> {
        if v > MAXIMUM_BANDWIDTH_PERCENT {
            return Err(DatastoreError::too_long(format!(
                "bandwidth percent = {v}."
            )));
        }
        self.bandwidth_percent = v;
        Ok(())
    }

    /// Equality ignoring the action-name list.
    pub fn equals_without_names(&self, other: &Self) -> bool {
        self.bandwidth_limit == other.bandwidth_limit
            && self.burst_size_limit == other.burst_size_limit
            && self.bandwidth_percent == other.bandwidth_percent
    }

    pub fn refs(&self) -> Vec<ChildRef> {
        self.action_names
            .iter()
            .map(|n| ChildRef::new(Kind::PolicerAction, "action", n))
            .collect()
    }

    pub fn substitute_namespace(&mut self, ns: &str) -> Result<()> {
        self.action_names = self.action_names.duplicate(Some(ns))?;
        Ok(())
    }
}

fn modified_attr<'a>(conf: &'a mut Conf) -> Result<&'a mut PolicerAttr> {
    match conf.modified_attr.as_mut() {
        Some(Attr::Policer(a)) => Ok(a),
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
        OPT_ACTION => {
            let Some(v) = take_opt_value(args, configs, FLAG_ACTIONS)? else {
                return Ok(());
            };
            let (op, bare) = opt_name_get(&v);
            let full = names::resolve(current_ns, bare)
                .map_err(|e| e.with_context(format!("Can't get fullname {bare}.")))?;
            match op {
                NameOp::Add => {
                    if modified_attr(conf)?.action_names.contains(&full) {
                        return Err(DatastoreError::already_exists(format!(
                            "action name = {full}."
                        )));
                    }
                    if !stores.exists(Kind::PolicerAction, &full) {
                        return Err(DatastoreError::not_found(format!(
                            "action name = {full}."
                        )));
                    }
                    if stores.is_used_of(Kind::PolicerAction, &full)? {
                        return Err(DatastoreError::not_operational(format!(
                            "action name = {full}."
                        )));
                    }
                    modified_attr(conf)?.add_action_name(&full)
                }
                NameOp::Delete => {
                    if !modified_attr(conf)?.action_names.contains(&full) {
                        return Err(DatastoreError::not_found(format!(
                            "action name = {full}."
                        )));
                    }
                    modified_attr(conf)?.remove_action_name(&full)?;
                    stores.set_used(Kind::PolicerAction, &full, false)
                }
            }
        }
        OPT_BANDWIDTH_LIMIT => {
            let Some(v) = take_opt_value(args, configs, FLAG_BANDWIDTH_LIMIT)? else {
                return Ok(());
            };
            let n = parse_u64(&v)?;
            modified_attr(conf)?
                .set_bandwidth_limit(n)
                .map_err(|e| e.with_context(format!("Can't add {OPT_BANDWIDTH_LIMIT}.")))
        }
        OPT_BURST_SIZE_LIMIT => {
            let Some(v) = take_opt_value(args, configs, FLAG_BURST_SIZE_LIMIT)? else {
                return Ok(());
            };
            let n = parse_u64(&v)?;
            modified_attr(conf)?
                .set_burst_size_limit(n)
                .map_err(|e| e.with_context(format!("Can't add {OPT_BURST_SIZE_LIMIT}.")))
        }
        OPT_BANDWIDTH_PERCENT => {
            let Some(v) = take_opt_value(args, configs, FLAG_BANDWIDTH_PERCENT)? else {
                return Ok(());
            };
            let n = parse_u8(&v)?;
            modified_attr(conf)?
                .set_bandwidth_percent(n)
                .map_err(|e| e.with_context(format!("Can't add {OPT_BANDWIDTH_PERCENT}.")))
        }
        _ => Err(DatastoreError::invalid_args(format!("opt = {opt}."))),
    }
}

pub fn json_item(conf: &Conf, attr: &PolicerAttr, flags: u64) -> Value {
    let mut item = serde_json::Map::new();
    item.insert("name".into(), json!(conf.name));
    if flags & FLAG_ACTIONS != 0 {
        let actions: Vec<&str> = attr.action_names.iter().collect();
        item.insert("actions".into(), json!(actions));
    }
    if flags & FLAG_BANDWIDTH_LIMIT != 0 {
        item.insert("bandwidth-limit".into(), json!(attr.bandwidth_limit));
    }
    if flags & FLAG_BURST_SIZE_LIMIT != 0 {
        item.insert("burst-size-limit".into(), json!(attr.burst_size_limit));
    }
    if flags & FLAG_BANDWIDTH_PERCENT != 0 {
        item.insert("bandwidth-percent".into(), json!(attr.bandwidth_percent));
    }
    if flags & FLAG_IS_USED != 0 {
        item.insert("is-used".into(), json!(conf.is_used));
    }
    if flags & FLAG_IS_ENABLED != 0 {
        item.insert("is-enabled".into(), json!(conf.is_enabled));
    }
    Value::Object(item)
}

pub fn serialize_line(name: &str, attr: &PolicerAttr) -> String {
    let mut line = format!("policer {} create", escape_name(name));
    for action in attr.action_names.iter() {
        line.push_str(&format!(" {} {}", OPT_ACTION, escape_name(action)));
    }
    line.push_str(&format!(
        " {} {} {} {} {} {}",
        OPT_BANDWIDTH_LIMIT,
        attr.bandwidth_limit,
        OPT_BURST_SIZE_LIMIT,
        attr.burst_size_limit,
        OPT_BANDWIDTH_PERCENT,
        attr.bandwidth_percent
    ));
    line
}
