// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

use crate::config::Config;
use crate::models::{Role, Route};
use crate::session::{self, resolve_route, visible_routes};
use crate::utils::maybe_print_json;

pub fn login(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let email = sub.get_one::<String>("email").unwrap();
    let password = sub.get_one::<String>("password").unwrap();
    let user = session::sign_in(conn, email, password)?;
    println!("Signed in as {} (role: {})", user.email, user.role);
    Ok(())
}

pub fn logout(conn: &Connection) -> Result<()> {
    session::sign_out(conn)?;
    println!("Signed out.");
    Ok(())
}

#[derive(Serialize)]
pub struct WhoAmI {
    pub email: String,
    pub role: Role,
    pub views: Vec<Route>,
    pub dashboard_toolbar: bool,
}

pub fn whoami(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = session::require_user(conn)?;
    let info = WhoAmI {
        email: user.email.clone(),
        views: visible_routes(&user.role),
        dashboard_toolbar: !user.role.is_owner(),
        role: user.role,
    };
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &info)? {
        println!("Welcome, {}", info.email);
        println!("role: {}", info.role);
        let views: Vec<&str> = info.views.iter().map(|r| r.title()).collect();
        println!("Views: {}", views.join(", "));
    }
    Ok(())
}

/// Resolve a route for the signed-in role and render that view.
pub fn view(conn: &Connection, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let user = session::require_user(conn)?;
    let requested = Route::parse(sub.get_one::<String>("route").map(|s| s.as_str()).unwrap_or(""));
    let route = resolve_route(requested, &user.role);
    if route != requested {
        tracing::info!(requested = requested.slug(), role = %user.role, "route redirected");
    }
    println!("== {} ==", route.title());
    match route {
        Route::Dashboard => super::dashboard::render(conn, cfg, false, false)?,
        Route::Reports => super::reports::render(conn, cfg, 30, false, false)?,
        Route::Notifications => super::notifications::render(conn, false, false)?,
        Route::Users => super::users::render_list(conn, &user, false, false)?,
        Route::DataEntry => {
            println!("Forms: sale add | product add | expense add | import preview/save");
        }
    }
    Ok(())
}
