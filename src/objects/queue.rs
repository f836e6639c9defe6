//! Queue: egress scheduling with single-rate or two-rate metering.
//!
//! The rate family decides which options exist: `-excess-burst-size` only
//! on single-rate queues, `-peak-burst-size` / `-peak-information-rate`
//! only on two-rate queues.

use serde_json::{Value, json};

use crate::app::ports::QueueStats;
use crate::cmd::{OutConfigs, escape_name, parse_u16, parse_u32, parse_u64, take_opt_value};
use crate::error::{DatastoreError, Result};
use crate::store::Conf;

use super::Attr;

/* option names */
pub const OPT_TYPE: &str = "-type";
pub const OPT_ID: &str = "-id";
pub const OPT_PRIORITY: &str = "-priority";
pub const OPT_COLOR: &str = "-color";
pub const OPT_COMMITTED_BURST_SIZE: &str = "-committed-burst-size";
pub const OPT_COMMITTED_INFORMATION_RATE: &str = "-committed-information-rate";
pub const OPT_EXCESS_BURST_SIZE: &str = "-excess-burst-size";
pub const OPT_PEAK_BURST_SIZE: &str = "-peak-burst-size";
pub const OPT_PEAK_INFORMATION_RATE: &str = "-peak-information-rate";

/* show-field bits */
pub const FLAG_TYPE: u64 = 1 << 1;
pub const FLAG_ID: u64 = 1 << 2;
pub const FLAG_PRIORITY: u64 = 1 << 3;
pub const FLAG_COLOR: u64 = 1 << 4;
pub const FLAG_COMMITTED_BURST_SIZE: u64 = 1 << 5;
pub const FLAG_COMMITTED_INFORMATION_RATE: u64 = 1 << 6;
pub const FLAG_EXCESS_BURST_SIZE: u64 = 1 << 7;
pub const FLAG_PEAK_BURST_SIZE: u64 = 1 << 8;
pub const FLAG_PEAK_INFORMATION_RATE: u64 = 1 << 9;
pub const FLAG_IS_USED: u64 = 1 << 10;
pub const FLAG_IS_ENABLED: u64 = 1 << 11;

pub const MINIMUM_ID: u32 = 1;
pub const MAXIMUM_ID: u32 = 0xffff_ff00;
pub const MINIMUM_BURST_SIZE: u64 = 1500;
pub const MINIMUM_RATE: u64 = 1500;

/// Metering family of the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueueType {
    #[default]
    SingleRate,
    TwoRate,
}

impl QueueType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SingleRate => "single-rate",
            Self::TwoRate => "two-rate",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "single-rate" => Some(Self::SingleRate),
            "two-rate" => Some(Self::TwoRate),
            _ => None,
        }
    }
}

/// Colour-marking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueueColor {
    #[default]
    Green,
    Yellow,
    Red,
}

impl QueueColor {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "green" => Some(Self::Green),
            "yellow" => Some(Self::Yellow),
            "red" => Some(Self::Red),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueueAttr {
    queue_type: QueueType,
    id: u32,
    priority: u16,
    color: QueueColor,
    committed_burst_size: u64,
    committed_information_rate: u64,
    excess_burst_size: u64,
    peak_burst_size: u64,
    peak_information_rate: u64,
}

impl Default for QueueAttr {
    fn default() -> Self {
        Self {
            queue_type: QueueType::SingleRate,
            id: 1,
            priority: 0,
            color: QueueColor::Green,
            committed_burst_size: 1500,
            committed_information_rate: 1500,
            excess_burst_size: 1500,
            peak_burst_size: 1500,
            peak_information_rate: 1500,
        }
    }
}

impl QueueAttr {
    pub fn queue_type(&self) -> QueueType {
        self.queue_type
    }

    pub fn set_queue_type(&mut self, queue_type: QueueType) {
        self.queue_type = queue_type;
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn set_id(&mut self, id: u32) -> Result<()> {
        if id < MINIMUM_ID {
            return Err(DatastoreError::too_short(format!("queue id = {id}.")));
        }
        if id > MAXIMUM_ID {
            return Err(DatastoreError::too_long(format!("queue id = {id}.")));
        }
        self.id = id;
        Ok(())
    }

    pub fn priority(&self) -> u16 {
        self.priority
    }

    pub fn set_priority(&mut self, priority: u16) {
        self.priority = priority;
    }

    pub fn color(&self) -> QueueColor {
        self.color
    }

    pub fn set_color(&mut self, color: QueueColor) {
        self.color = color;
    }

    pub fn committed_burst_size(&self) -> u64 {
        self.committed_burst_size
    }

    pub fn set_committed_burst_size(&mut self, v: u64) -> Result<()> {
        check_burst(v)?;
        self.committed_burst_size = v;
        Ok(())
    }

    pub fn committed_information_rate(&self) -> u64 {
        self.committed_information_rate
    }

    pub fn set_committed_information_rate(&mut self, v: u64) -> Result<()> {
        check_rate(v)?;
        self.committed_information_rate = v;
        Ok(())
    }

    pub fn excess_burst_size(&self) -> u64 {
        self.excess_burst_size
    }

    pub fn set_excess_burst_size(&mut self, v: u64) -> Result<()> {
        check_burst(v)?;
        self.excess_burst_size = v;
        Ok(())
    }

    pub fn peak_burst_size(&self) -> u64 {
        self.peak_burst_size
    }

    pub fn set_peak_burst_size(&mut self, v: u64) -> Result<()> {
        check_burst(v)?;
        self.peak_burst_size = v;
        Ok(())
    }

    pub fn peak_information_rate(&self) -> u64 {
        self.peak_information_rate
    }

    pub fn set_peak_information_rate(&mut self, v: u64) -> Result<()> {
        check_rate(v)?;
        self.peak_information_rate = v;
        Ok(())
    }
}

fn check_burst(v: u64) -> Result<()> {
    if v < MINIMUM_BURST_SIZE {
        return Err(DatastoreError::too_short(format!("burst size = {v}.")));
    }
    Ok(())
}

fn check_rate(v: u64) -> Result<()> {
    if v < MINIMUM_RATE {
        return Err(DatastoreError::too_short(format!("rate = {v}.")));
    }
    Ok(())
}

fn modified_attr<'a>(conf: &'a mut Conf) -> Result<&'a mut QueueAttr> {
    match conf.modified_attr.as_mut() {
        Some(Attr::Queue(a)) => Ok(a),
        _ => Err(DatastoreError::invalid_args("Not found attr.")),
    }
}

/// An option valid only for one rate family was used on the other.
fn wrong_family(opt: &str) -> DatastoreError {
    DatastoreError::invalid_args(format!("opt = {opt}."))
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
            match QueueType::from_str(&v) {
                Some(t) => {
                    modified_attr(conf)?.set_queue_type(t);
                    Ok(())
                }
                None => Err(DatastoreError::invalid_args(format!(
                    "Bad opt value = {v}."
                ))),
            }
        }
        OPT_ID => {
            let Some(v) = take_opt_value(args, configs, FLAG_ID)? else {
                return Ok(());
            };
            let id = parse_u32(&v)?;
            modified_attr(conf)?
                .set_id(id)
                .map_err(|e| e.with_context(format!("Can't add {OPT_ID}.")))
        }
        OPT_PRIORITY => {
            let Some(v) = take_opt_value(args, configs, FLAG_PRIORITY)? else {
                return Ok(());
            };
            let priority = parse_u16(&v)?;
            modified_attr(conf)?.set_priority(priority);
            Ok(())
        }
        OPT_COLOR => {
            let Some(v) = take_opt_value(args, configs, FLAG_COLOR)? else {
                return Ok(());
            };
            match QueueColor::from_str(&v) {
                Some(c) => {
                    modified_attr(conf)?.set_color(c);
                    Ok(())
                }
                None => Err(DatastoreError::invalid_args(format!(
                    "Bad opt value = {v}."
                ))),
            }
        }
        OPT_COMMITTED_BURST_SIZE => {
            let Some(v) = take_opt_value(args, configs, FLAG_COMMITTED_BURST_SIZE)? else {
                return Ok(());
            };
            let n = parse_u64(&v)?;
            modified_attr(conf)?
                .set_committed_burst_size(n)
                .map_err(|e| e.with_context(format!("Can't add {OPT_COMMITTED_BURST_SIZE}.")))
        }
        OPT_COMMITTED_INFORMATION_RATE => {
            let Some(v) = take_opt_value(args, configs, FLAG_COMMITTED_INFORMATION_RATE)? else {
                return Ok(());
            };
            let n = parse_u64(&v)?;
            modified_attr(conf)?
                .set_committed_information_rate(n)
                .map_err(|e| {
                    e.with_context(format!("Can't add {OPT_COMMITTED_INFORMATION_RATE}."))
                })
        }
        OPT_EXCESS_BURST_SIZE => {
            let Some(v) = take_opt_value(args, configs, FLAG_EXCESS_BURST_SIZE)? else {
                return Ok(());
            };
            let attr = modified_attr(conf)?;
            if attr.queue_type != QueueType::SingleRate {
                return Err(wrong_family(opt));
            }
            let n = parse_u64(&v)?;
            attr.set_excess_burst_size(n)
                .map_err(|e| e.with_context(format!("Can't add {OPT_EXCESS_BURST_SIZE}.")))
        }
        OPT_PEAK_BURST_SIZE => {
            let Some(v) = take_opt_value(args, configs, FLAG_PEAK_BURST_SIZE)? else {
                return Ok(());
            };
            let attr = modified_attr(conf)?;
            if attr.queue_type != QueueType::TwoRate {
                return Err(wrong_family(opt));
            }
            let n = parse_u64(&v)?;
            attr.set_peak_burst_size(n)
                .map_err(|e| e.with_context(format!("Can't add {OPT_PEAK_BURST_SIZE}.")))
        }
        OPT_PEAK_INFORMATION_RATE => {
            let Some(v) = take_opt_value(args, configs, FLAG_PEAK_INFORMATION_RATE)? else {
                return Ok(());
            };
            let attr = modified_attr(conf)?;
            if attr.queue_type != QueueType::TwoRate {
                return Err(wrong_family(opt));
            }
            let n = parse_u64(&v)?;
            attr.set_peak_information_rate(n)
                .map_err(|e| e.with_context(format!("Can't add {OPT_PEAK_INFORMATION_RATE}.")))
        }
        _ => Err(DatastoreError::invalid_args(format!("opt = {opt}."))),
    }
}

pub fn json_item(conf: &Conf, attr: &QueueAttr, flags: u64) -> Value {
    let mut item = serde_json::Map::new();
    item.insert("name".into(), json!(conf.name));
    if flags & FLAG_TYPE != 0 {
        item.insert("type".into(), json!(attr.queue_type.as_str()));
    }
    if flags & FLAG_ID != 0 {
        item.insert("id".into(), json!(attr.id));
    }
    if flags & FLAG_PRIORITY != 0 {
        item.insert("priority".into(), json!(attr.priority));
    }
    if flags & FLAG_COLOR != 0 {
        item.insert("color".into(), json!(attr.color.as_str()));
    }
    if flags & FLAG_COMMITTED_BURST_SIZE != 0 {
        item.insert(
            "committed-burst-size".into(),
            json!(attr.committed_burst_size),
        );
    }
    if flags & FLAG_COMMITTED_INFORMATION_RATE != 0 {
        item.insert(
            "committed-information-rate".into(),
            json!(attr.committed_information_rate),
        );
    }
    match attr.queue_type {
        QueueType::SingleRate => {
            if flags & FLAG_EXCESS_BURST_SIZE != 0 {
                item.insert("excess-burst-size".into(), json!(attr.excess_burst_size));
            }
        }
        QueueType::TwoRate => {
            if flags & FLAG_PEAK_BURST_SIZE != 0 {
                item.insert("peak-burst-size".into(), json!(attr.peak_burst_size));
            }
            if flags & FLAG_PEAK_INFORMATION_RATE != 0 {
                item.insert(
                    "peak-information-rate".into(),
                    json!(attr.peak_information_rate),
                );
            }
        }
    }
    if flags & FLAG_IS_USED != 0 {
        item.insert("is-used".into(), json!(conf.is_used));
    }
    if flags & FLAG_IS_ENABLED != 0 {
        item.insert("is-enabled".into(), json!(conf.is_enabled));
    }
    Value::Object(item)
}

pub fn stats_json(name: &str, stats: &QueueStats) -> Value {
    let mut item = match serde_json::to_value(stats) {
        Ok(Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    };
    item.insert("name".into(), json!(name));
    Value::Array(vec![Value::Object(item)])
}

pub fn serialize_line(name: &str, attr: &QueueAttr) -> String {
    let mut line = format!(
        "queue {} create {} {} {} {} {} {} {} {} {} {} {} {}",
        escape_name(name),
        OPT_TYPE,
        attr.queue_type.as_str(),
        OPT_ID,
        attr.id,
        OPT_PRIORITY,
        attr.priority,
        OPT_COLOR,
        attr.color.as_str(),
        OPT_COMMITTED_BURST_SIZE,
        attr.committed_burst_size,
        OPT_COMMITTED_INFORMATION_RATE,
        attr.committed_information_rate,
    );
    match attr.queue_type {
        QueueType::SingleRate => {
            line.push_str(&format!(
                " {} {}",
                OPT_EXCESS_BURST_SIZE, attr.excess_burst_size
            ));
        }
        QueueType::TwoRate => {
            line.push_str(&format!(
                " {} {} {} {}",
                OPT_PEAK_BURST_SIZE,
                attr.peak_burst_size,
                OPT_PEAK_INFORMATION_RATE,
                attr.peak_information_rate
            ));
        }
    }
    line
}
