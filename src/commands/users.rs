// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::models::{Role, UserListing, UserProfile};
use crate::session;
use crate::utils::{maybe_print_json, pretty_table};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => {
            let actor = session::require_user(conn)?;
            render_list(conn, &actor, sub.get_flag("json"), sub.get_flag("jsonl"))?;
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let email = sub.get_one::<String>("email").unwrap();
    let password = sub.get_one::<String>("password").unwrap();
    let role = Role::from_stored(sub.get_one::<String>("role").map(|s| s.as_str()));
    let actor = session::current_user(conn)?;
    let created = session::create_user(conn, actor.as_ref(), email, password, &role)?;
    println!("User created: {} (role: {})", created.email, created.role);
    Ok(())
}

pub fn render_list(
    conn: &Connection,
    actor: &UserProfile,
    json_flag: bool,
    jsonl_flag: bool,
) -> Result<()> {
    let users = session::list_users(conn, actor).context("Failed to load users")?;
    if !maybe_print_json(json_flag, jsonl_flag, &users)? {
        println!("{}", pretty_table(&["Email", "Role", "Created"], user_rows(&users)));
    }
    Ok(())
}

/// Table cells for the user list; missing values show as "—".
pub fn user_rows(users: &[UserListing]) -> Vec<Vec<String>> {
    users
        .iter()
        .map(|u| {
            vec![
                if u.email.is_empty() { "—".into() } else { u.email.clone() },
                u.role.clone().unwrap_or_else(|| "—".to_string()),
                created_day(u.created_at.as_deref()),
            ]
        })
        .collect()
}

fn created_day(stamp: Option<&str>) -> String {
    stamp
        .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&chrono::Local).format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "—".to_string())
}
