//! Policer action: what the policer does to out-of-profile traffic.

use serde_json::{Value, json};

use crate::cmd::{OutConfigs, escape_name, take_opt_value};
use crate::error::{DatastoreError, Result};
use crate::store::Conf;

use super::Attr;

pub const OPT_TYPE: &str = "-type";

pub const FLAG_TYPE: u64 = 1 << 1;
pub const FLAG_IS_USED: u64 = 1 << 2;
pub const FLAG_IS_ENABLED: u64 = 1 << 3;

/// Action applied to packets exceeding the policer profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicerActionType {
    /// Not set yet; rejected at enable time.
    #[default]
    Unknown,
    Discard,
}

impl PolicerActionType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Discard => "discard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "discard" => Some(Self::Discard),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PolicerActionAttr {
    action_type: PolicerActionType,
}

impl PolicerActionAttr {
    pub fn action_type(&self) -> PolicerActionType {
        self.action_type
    }

    pub fn set_action_type(&mut self, action_type: PolicerActionType) {
        self.action_type = action_type;
    }
}

fn modified_attr<'a>(conf: &'a mut Conf) -> Result<&'a mut PolicerActionAttr> {
    match conf.modified_attr.as_mut() {
        Some(Attr::PolicerAction(a)) => Ok(a),
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
            match PolicerActionType::from_str(&v) {
                Some(t) => {
                    modified_attr(conf)?.set_action_type(t);
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

pub fn json_item(conf: &Conf, attr: &PolicerActionAttr, flags: u64) -> Value {
    let mut item = serde_json::Map::new();
    item.insert("name".into(), json!(conf.name));
    if flags & FLAG_TYPE != 0 {
        item.insert("type".into(), json!(attr.action_type.as_str()));
    }
    if flags & FLAG_IS_USED != 0 {
        item.insert("is-used".into(), json!(conf.is_used));
    }
    if flags & FLAG_IS_ENABLED != 0 {
        item.insert("is-enabled".into(), json!(conf.is_enabled));
    }
    Value::Object(item)
}

pub fn serialize_line(name: &str, attr: &PolicerActionAttr) -> String {
    let mut line = format!("policer-action {} create", escape_name(name));
    if attr.action_type != PolicerActionType::Unknown {
        line.push_str(&format!(" {} {}", OPT_TYPE, attr.action_type.as_str()));
    }
    line
}
