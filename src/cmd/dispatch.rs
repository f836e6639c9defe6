//! Command dispatch — argv in, result record out.
//!
//! The per-kind entry point mirrors one shape for every kind:
//!
//! 1. canonicalise `argv[1]` into a fullname under the current namespace,
//! 2. route `argv[2]` through the sub-command table
//!    (`create` / `config` / `enable` / `disable` / `destroy` / `stats`),
//! 3. fall back to a show when `argv[2]` is a view selector
//!    (`current` / `modified`) or absent entirely.
//!
//! All mutation paths funnel into the transaction driver; all read paths
//! funnel into the JSON renderer at the bottom of this file.

use serde_json::{Value, json};

use crate::app::ports::DataPlanePort;
use crate::app::service::Datastore;
use crate::error::{DatastoreError, Result};
use crate::interp::{self, InterpState};
use crate::names::{self, NS_DELIMITER, split_fullname};
use crate::objects::{self, Kind};
use crate::store::Conf;

use super::{
    CONFIG_SUB_CMD, CREATE_SUB_CMD, CmdResult, DESTROY_SUB_CMD, DISABLE_SUB_CMD, ENABLE_SUB_CMD,
    FLAG_ALL, OutConfigs, SHOW_OPT_CURRENT, SHOW_OPT_MODIFIED, STATS_SUB_CMD, tokenize,
};

impl Datastore {
    // ── Entry points ──────────────────────────────────────────

    /// Tokenise and dispatch one command line.  `None` for blank lines
    /// and comments.
    pub fn handle_line(
        &mut self,
        dp: &mut dyn DataPlanePort,
        line: &str,
    ) -> Option<CmdResult> {
        let argv = match tokenize(line) {
            Ok(argv) => argv,
            Err(e) => return Some(e.into()),
        };
        if argv.is_empty() {
            return None;
        }
        Some(self.dispatch_tokens(dp, &argv))
    }

    /// Dispatch an already-tokenised argv.
    pub fn dispatch(&mut self, dp: &mut dyn DataPlanePort, argv: &[&str]) -> CmdResult {
        let owned: Vec<String> = argv.iter().map(ToString::to_string).collect();
        self.dispatch_tokens(dp, &owned)
    }

    fn dispatch_tokens(&mut self, dp: &mut dyn DataPlanePort, argv: &[String]) -> CmdResult {
        if !self.started {
            return CmdResult::from(DatastoreError::not_started("Datastore is finalized."));
        }
        if argv.is_empty() {
            return CmdResult::from(DatastoreError::invalid_args("Bad opt value."));
        }
        log::debug!("argv: {argv:?}");
        if argv[0] == "namespace" {
            return match self.namespace_cmd(&argv[1..]) {
                Ok(data) => match data {
                    Some(v) => CmdResult::ok_with(v),
                    None => CmdResult::ok(),
                },
                Err(e) => e.into(),
            };
        }
        let Some(kind) = Kind::from_cmd_name(&argv[0]) else {
            return CmdResult::from(DatastoreError::invalid_args(format!(
                "unknown command = {}.",
                argv[0]
            )));
        };
        self.kind_cmd(dp, kind, &argv[1..])
    }

    // ── Per-kind command ──────────────────────────────────────

    fn kind_cmd(&mut self, dp: &mut dyn DataPlanePort, kind: Kind, rest: &[String]) -> CmdResult {
        let mut configs = OutConfigs::default();
        match self.kind_cmd_inner(dp, kind, rest, &mut configs) {
            Ok(()) => match self.json_create(kind, &configs) {
                Ok(Some(data)) => CmdResult::ok_with(data),
                Ok(None) => CmdResult::ok(),
                Err(e) => e.into(),
            },
            Err(e) => e.into(),
        }
    }

    fn kind_cmd_inner(
        &mut self,
        dp: &mut dyn DataPlanePort,
        kind: Kind,
        rest: &[String],
        configs: &mut OutConfigs,
    ) -> Result<()> {
        // bare kind: show everything in the current namespace
        let Some(name_token) = rest.first() else {
            return self.show_parse(kind, None, configs, false);
        };

        // kind + name: show that one object (or a namespace listing)
        let Some(sub_cmd) = rest.get(1) else {
            return self.show_parse(kind, Some(name_token.as_str()), configs, false);
        };

        if sub_cmd.as_str() == SHOW_OPT_CURRENT || sub_cmd.as_str() == SHOW_OPT_MODIFIED {
            if let Some(extra) = rest.get(2) {
                return Err(DatastoreError::invalid_args(format!(
                    "Bad opt value = {extra}."
                )));
            }
            return self.show_parse(
                kind,
                Some(name_token.as_str()),
                configs,
                sub_cmd.as_str() == SHOW_OPT_MODIFIED,
            );
        }

        let fullname = names::resolve(&self.current_ns, name_token)
            .map_err(|e| e.with_context(format!("Can't get fullname {name_token}.")))?;
        let opts = &rest[2..];

        match sub_cmd.as_str() {
            CREATE_SUB_CMD => self.create_cmd(dp, kind, &fullname, opts, configs),
            CONFIG_SUB_CMD => self.config_cmd(dp, kind, &fullname, opts, configs),
            ENABLE_SUB_CMD => {
                interp::cmd_enable(&mut self.stores, dp, self.state, kind, &fullname)
            }
            DISABLE_SUB_CMD => {
                interp::cmd_disable(&mut self.stores, dp, self.state, kind, &fullname)
            }
            DESTROY_SUB_CMD => {
                interp::cmd_destroy(&mut self.stores, dp, self.state, kind, &fullname)
            }
            STATS_SUB_CMD if objects::has_stats(kind) => {
                self.stats_cmd(dp, kind, &fullname, configs)
            }
            other => Err(DatastoreError::invalid_args(format!("sub_cmd = {other}."))),
        }
    }

    // ── create / config ───────────────────────────────────────

    fn create_cmd(
        &mut self,
        dp: &mut dyn DataPlanePort,
        kind: Kind,
        fullname: &str,
        opts: &[String],
        configs: &mut OutConfigs,
    ) -> Result<()> {
        match self.stores.store(kind).find(fullname) {
            None => {
                let (ns, _) = split_fullname(fullname);
                if !self.namespace_exists(ns) && self.state != InterpState::DryRun {
                    return Err(DatastoreError::not_found(format!("namespace = {ns}")));
                }
                self.create_internal(dp, kind, fullname, opts, configs)
            }
            Some(conf) if conf.is_destroying => {
                self.config_internal(dp, kind, fullname, opts, configs)
            }
            Some(_) => Err(DatastoreError::already_exists(format!(
                "name = {fullname}"
            ))),
        }
    }

    fn create_internal(
        &mut self,
        dp: &mut dyn DataPlanePort,
        kind: Kind,
        fullname: &str,
        opts: &[String],
        configs: &mut OutConfigs,
    ) -> Result<()> {
        let mut conf = Conf::new(kind, fullname);
        self.parse_opts(kind, &mut conf, opts, configs)?;
        self.stores.store_mut(kind).add(conf)?;

        match interp::update_conf(&mut self.stores, dp, self.state, kind, fullname, true, false) {
            Ok(()) => Ok(()),
            Err(e) => {
                // the driver may already have dropped the Conf
                let _ = self.stores.store_mut(kind).delete(fullname);
                Err(e)
            }
        }
    }

    fn config_cmd(
        &mut self,
        dp: &mut dyn DataPlanePort,
        kind: Kind,
        fullname: &str,
        opts: &[String],
        configs: &mut OutConfigs,
    ) -> Result<()> {
        if self.stores.exists(kind, fullname) {
            self.config_internal(dp, kind, fullname, opts, configs)
        } else {
            self.create_internal(dp, kind, fullname, opts, configs)
        }
    }

    fn config_internal(
        &mut self,
        dp: &mut dyn DataPlanePort,
        kind: Kind,
        fullname: &str,
        opts: &[String],
        configs: &mut OutConfigs,
    ) -> Result<()> {
        configs.is_config = true;

        let Some(conf) = self.stores.store_mut(kind).find_mut(fullname) else {
            return Err(DatastoreError::not_found(format!("name = {fullname}")));
        };
        let was_fresh = conf.modified_attr.is_none();
        if was_fresh {
            match &conf.current_attr {
                Some(current) => conf.modified_attr = Some(current.clone()),
                None => {
                    return Err(DatastoreError::not_found(format!(
                        "Not found attr. : name = {fullname}"
                    )));
                }
            }
        }
        conf.is_destroying = false;

        let mut conf = self.stores.take(kind, fullname).expect("found above");
        let parsed = self.parse_opts(kind, &mut conf, opts, configs);
        if parsed.is_err() && was_fresh {
            // the duplicated edit buffer is discarded on option failure
            conf.modified_attr = None;
        }
        self.stores.put_back(conf);
        parsed?;

        if configs.flags == 0 {
            interp::update_conf(&mut self.stores, dp, self.state, kind, fullname, true, false)
        } else {
            configs.list = vec![fullname.to_string()];
            Ok(())
        }
    }

    fn parse_opts(
        &mut self,
        kind: Kind,
        conf: &mut Conf,
        opts: &[String],
        configs: &mut OutConfigs,
    ) -> Result<()> {
        if opts.is_empty() {
            if configs.is_config {
                configs.flags = FLAG_ALL;
            }
            return Ok(());
        }
        let current_ns = self.current_ns.clone();
        let mut it = opts.iter();
        while let Some(opt) = it.next() {
            objects::parse_opt(
                kind,
                opt,
                &mut it,
                conf,
                configs,
                &mut self.stores,
                &current_ns,
            )?;
        }
        Ok(())
    }

    // ── stats ─────────────────────────────────────────────────

    fn stats_cmd(
        &mut self,
        dp: &mut dyn DataPlanePort,
        kind: Kind,
        fullname: &str,
        configs: &mut OutConfigs,
    ) -> Result<()> {
        let Some(conf) = self.stores.store(kind).find(fullname) else {
            return Err(DatastoreError::invalid_object(format!(
                "name = {fullname}"
            )));
        };
        if conf.current_attr.is_none() {
            return Err(DatastoreError::not_started(format!("name = {fullname}")));
        }
        if self.state == InterpState::DryRun {
            return Err(DatastoreError::not_operational(format!(
                "name = {fullname}. dry run."
            )));
        }
        let stats = match kind {
            Kind::Queue => {
                let stats = dp.queue_stats_get(fullname)?;
                objects::queue::stats_json(fullname, &stats)
            }
            Kind::Port => {
                let stats = dp.port_stats_get(fullname)?;
                objects::port::stats_json(fullname, &stats)
            }
            _ => {
                return Err(DatastoreError::invalid_args(format!(
                    "sub_cmd = {STATS_SUB_CMD}."
                )));
            }
        };
        configs.stats = Some(stats);
        Ok(())
    }

    // ── show ──────────────────────────────────────────────────

    fn show_parse(
        &mut self,
        kind: Kind,
        target: Option<&str>,
        configs: &mut OutConfigs,
        is_show_modified: bool,
    ) -> Result<()> {
        let list = match target {
            None => self.stores.store(kind).list(Some(self.current_ns.as_str())),
            Some(token) => {
                if let Some(ns) = token.strip_suffix(NS_DELIMITER) {
                    // "ns:" lists a namespace; a bare ":" the default one
                    self.stores.store(kind).list(Some(ns))
                } else {
                    let fullname = names::resolve(&self.current_ns, token)
                        .map_err(|e| e.with_context(format!("Can't get fullname {token}.")))?;
                    match self.stores.store(kind).find(&fullname) {
                        Some(conf) if !conf.is_destroying => vec![fullname],
                        _ => {
                            return Err(DatastoreError::not_found(format!(
                                "name = {fullname}"
                            )));
                        }
                    }
                }
            }
        };
        configs.list = list;
        configs.flags = FLAG_ALL;
        configs.is_show_modified = is_show_modified;
        Ok(())
    }

    fn json_create(&self, kind: Kind, configs: &OutConfigs) -> Result<Option<Value>> {
        if let Some(stats) = &configs.stats {
            return Ok(Some(stats.clone()));
        }
        if configs.list.is_empty() {
            return Ok(None);
        }
        let single = configs.list.len() == 1;
        let mut items = Vec::new();
        for name in &configs.list {
            let Some(conf) = self.stores.store(kind).find(name) else {
                continue;
            };
            let attr = if configs.is_config {
                conf.modified_attr.as_ref().or(conf.current_attr.as_ref())
            } else if configs.is_show_modified {
                match conf.modified_attr.as_ref() {
                    Some(attr) => Some(attr),
                    None if single => {
                        return Err(DatastoreError::not_operational("Not set modified."));
                    }
                    None => continue,
                }
            } else {
                match conf.current_attr.as_ref() {
                    Some(attr) => Some(attr),
                    None if single => {
                        return Err(DatastoreError::not_operational("Not set current."));
                    }
                    None => continue,
                }
            };
            match attr {
                Some(attr) => items.push(objects::json_item(conf, attr, configs.flags)),
                None => items.push(json!({"name": conf.name})),
            }
        }
        Ok(Some(Value::Array(items)))
    }

    // ── namespace ─────────────────────────────────────────────

    fn namespace_cmd(&mut self, rest: &[String]) -> Result<Option<Value>> {
        let Some(sub_cmd) = rest.first() else {
            return Ok(Some(json!({
                "current": self.current_ns,
                "namespaces": self.namespaces,
            })));
        };
        match sub_cmd.as_str() {
            "create" => {
                let ns = namespace_arg(rest)?;
                if self.namespace_exists(&ns) {
                    return Err(DatastoreError::already_exists(format!(
                        "namespace = {ns}"
                    )));
                }
                self.namespaces.push(ns);
                Ok(None)
            }
            "delete" => {
                let ns = namespace_arg(rest)?;
                if !self.namespaces.iter().any(|n| *n == ns) {
                    return Err(DatastoreError::not_found(format!("namespace = {ns}")));
                }
                let occupied = Kind::ALL
                    .iter()
                    .any(|k| !self.stores.store(*k).list(Some(ns.as_str())).is_empty());
                if occupied {
                    return Err(DatastoreError::not_operational(format!(
                        "namespace = {ns}: is used."
                    )));
                }
                self.namespaces.retain(|n| *n != ns);
                if self.current_ns == ns {
                    self.current_ns.clear();
                }
                Ok(None)
            }
            "set" => {
                let ns = namespace_arg(rest)?;
                if !self.namespace_exists(&ns) {
                    return Err(DatastoreError::not_found(format!("namespace = {ns}")));
                }
                self.current_ns = ns;
                Ok(None)
            }
            "unset" => {
                self.current_ns.clear();
                Ok(None)
            }
            other => Err(DatastoreError::invalid_args(format!("sub_cmd = {other}."))),
        }
    }
}

fn namespace_arg(rest: &[String]) -> Result<String> {
    let Some(ns) = rest.get(1) else {
        return Err(DatastoreError::invalid_args("Bad opt value."));
    };
    if ns.is_empty() || ns.contains(NS_DELIMITER) {
        return Err(DatastoreError::invalid_args(format!(
            "namespace = {ns}"
        )));
    }
    Ok(ns.clone())
}
