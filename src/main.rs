// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use dinedash::config::Config;
use dinedash::error::toast_for;
use dinedash::{cli, commands, db};

fn init_tracing() {
    let filter = std::env::var("DINEDASH_LOG")
        .ok()
        .and_then(|v| EnvFilter::try_new(v).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(matches: &clap::ArgMatches) -> Result<()> {
    let cfg = Config::from_env();
    let mut conn = db::open_or_init(&cfg)?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path(&cfg)?.display());
        }
        Some(("login", sub)) => commands::auth::login(&conn, sub)?,
        Some(("logout", _)) => commands::auth::logout(&conn)?,
        Some(("whoami", sub)) => commands::auth::whoami(&conn, sub)?,
        Some(("view", sub)) => commands::auth::view(&conn, &cfg, sub)?,
        Some(("user", sub)) => commands::users::handle(&conn, sub)?,
        Some(("sale", sub)) => commands::sales::handle(&conn, sub)?,
        Some(("product", sub)) => commands::products::handle(&conn, sub)?,
        Some(("expense", sub)) => commands::expenses::handle(&conn, sub)?,
        Some(("dashboard", sub)) => commands::dashboard::handle(&conn, &cfg, sub)?,
        Some(("report", sub)) => commands::reports::handle(&conn, &cfg, sub)?,
        Some(("import", sub)) => commands::importer::handle(&mut conn, sub)?,
        Some(("notifications", sub)) => commands::notifications::handle(&conn, sub)?,
        Some(("analytics", sub)) => commands::analytics::handle(&mut conn, sub)?,
        Some(("recommend", sub)) => commands::recommend::handle(&conn, &cfg, sub)?,
        Some(("forecast", sub)) => commands::forecast::handle(&conn, sub)?,
        Some(("sample", sub)) => commands::sample::handle(&mut conn, sub)?,
        Some(("reset", sub)) => commands::reset::handle(&mut conn, sub)?,
        Some(("config", sub)) => commands::settings::handle(&conn, &cfg, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}

fn main() {
    init_tracing();
    let matches = cli::build_cli().get_matches();
    if let Err(err) = run(&matches) {
        tracing::debug!(error = ?err, "command failed");
        eprintln!("{}", toast_for(&err));
        std::process::exit(1);
    }
}
