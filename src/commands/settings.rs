// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, bail};
use rusqlite::Connection;

use crate::config::Config;
use crate::db;
use crate::session;
use crate::utils::{currency_symbol, pretty_table, set_setting};

pub fn handle(conn: &Connection, cfg: &Config, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set-currency", sub)) => {
            let user = session::require_user(conn)?;
            session::require_admin(&user, "change settings")?;
            let sym = sub.get_one::<String>("symbol").unwrap().trim();
            if sym.is_empty() {
                bail!("Currency symbol cannot be empty");
            }
            set_setting(conn, "currency_symbol", sym)?;
            if cfg.currency_symbol.is_some() {
                println!("Saved, but DINEDASH_CURRENCY is set and takes precedence.");
            } else {
                println!("Currency symbol set to {}", sym);
            }
        }
        Some(("show", _)) => {
            let path = db::db_path(cfg)?;
            let gemini = match &cfg.gemini {
                Some(g) => format!("{} ({}s timeout)", g.model, g.timeout_secs),
                None => "not configured (rule-based)".to_string(),
            };
            let rows = vec![
                vec!["database".to_string(), path.display().to_string()],
                vec!["currency".to_string(), currency_symbol(conn, cfg)?],
                vec!["recommendations".to_string(), gemini],
            ];
            println!("{}", pretty_table(&["Setting", "Value"], rows));
        }
        _ => {}
    }
    Ok(())
}
