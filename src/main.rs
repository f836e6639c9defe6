//! Interactive configurator shell.
//!
//! Reads datastore commands line by line — from a file given on the
//! command line, then from stdin — and prints one JSON result record per
//! command.  Runs against the accept-all data plane; the real forwarding
//! engine attaches through the same port trait in the switch daemon.
//!
//! Session control words (handled here, not by the datastore):
//!
//! ```text
//!   atomic | commit | rollback | abort   transaction boundaries
//!   dryrun | run                         enter / leave dry-run
//!   save <path>                          write the committed config
//!   quit                                 leave the shell
//! ```

use std::io::{BufRead, Write as _};

use anyhow::Context;

use ofp_datastore::Datastore;
use ofp_datastore::adapters::null_dp::NullDataPlane;
use ofp_datastore::app::ports::DataPlanePort;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut ds = Datastore::new();
    let mut dp = NullDataPlane::new();

    if let Some(path) = std::env::args().nth(1) {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config file {path}"))?;
        ds.load_str(&mut dp, &text)
            .map_err(|e| anyhow::anyhow!("{path}: {e}"))?;
        log::info!("loaded configuration from {path}");
    }

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let mut line = String::new();

    loop {
        print!("> ");
        stdout.flush()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        if let Some(output) = eval(&mut ds, &mut dp, line.trim()) {
            println!("{output}");
        } else {
            break;
        }
    }

    Ok(())
}

/// Evaluate one input line.  `None` means quit.
fn eval(ds: &mut Datastore, dp: &mut dyn DataPlanePort, line: &str) -> Option<String> {
    match line {
        "quit" | "exit" => return None,
        "" => return Some(String::new()),
        "atomic" => return Some(session(ds.begin_atomic())),
        "commit" => return Some(session(ds.commit(dp))),
        "rollback" => return Some(session(ds.rollback(dp))),
        "abort" => return Some(session(ds.abort(dp))),
        "dryrun" => return Some(session(ds.begin_dryrun())),
        "run" => return Some(session(ds.end_dryrun())),
        _ => {}
    }

    if let Some(path) = line.strip_prefix("save ") {
        let path = path.trim();
        return Some(match std::fs::write(path, ds.serialize_all()) {
            Ok(()) => format!(r#"{{"ret":"OK","data":"saved to {path}"}}"#),
            Err(e) => format!(r#"{{"ret":"INVALID_ARGS","data":"{e}"}}"#),
        });
    }

    match ds.handle_line(dp, line) {
        Some(result) => Some(result.to_json_string()),
        None => Some(String::new()),
    }
}

fn session(r: ofp_datastore::Result<()>) -> String {
    match r {
        Ok(()) => r#"{"ret":"OK"}"#.to_string(),
        Err(e) => format!(r#"{{"ret":"{}","data":"{}"}}"#, e.code.as_str(), e.message),
    }
}
