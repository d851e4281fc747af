// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Email/password sign-in, the persisted session, and role gates.

use anyhow::{Context, Result};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::{new_id, now_stamp};
use crate::error::DashError;
use crate::models::{Role, Route, UserListing, UserProfile};
use crate::utils::{delete_setting, get_setting, set_setting};

const SESSION_KEY: &str = "session_uid";

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))
}

fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

pub fn sign_in(conn: &Connection, email: &str, password: &str) -> Result<UserProfile> {
    let email = email.trim();
    let row: Option<(String, String)> = conn
        .query_row(
            "SELECT id, password_hash FROM users WHERE email=?1 COLLATE NOCASE",
            params![email],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()
        .context("Sign-in failed")?;
    let (uid, hash) = match row {
        Some(r) => r,
        None => return Err(DashError::InvalidCredentials.into()),
    };
    if !verify_password(password, &hash) {
        tracing::info!("rejected sign-in");
        return Err(DashError::InvalidCredentials.into());
    }
    set_setting(conn, SESSION_KEY, &uid)?;
    tracing::debug!(%email, "signed in");
    load_profile(conn, &uid)
}

pub fn sign_out(conn: &Connection) -> Result<()> {
    delete_setting(conn, SESSION_KEY)
}

/// The signed-in user, if any. A stale session pointing at a deleted user
/// counts as signed out.
pub fn current_user(conn: &Connection) -> Result<Option<UserProfile>> {
    let Some(uid) = get_setting(conn, SESSION_KEY)? else {
        return Ok(None);
    };
    let email: Option<String> = conn
        .query_row("SELECT email FROM users WHERE id=?1", params![uid], |r| {
            r.get(0)
        })
        .optional()?;
    if email.is_none() {
        tracing::warn!(%uid, "session refers to a missing user");
        return Ok(None);
    }
    load_profile(conn, &uid).map(Some)
}

pub fn require_user(conn: &Connection) -> Result<UserProfile> {
    current_user(conn)?.ok_or_else(|| DashError::NotSignedIn.into())
}

fn load_profile(conn: &Connection, uid: &str) -> Result<UserProfile> {
    let (email, created_at): (String, Option<String>) = conn.query_row(
        "SELECT email, created_at FROM users WHERE id=?1",
        params![uid],
        |r| Ok((r.get(0)?, r.get(1)?)),
    )?;
    Ok(UserProfile {
        id: uid.to_string(),
        email,
        role: load_role(conn, uid),
        created_at,
    })
}

/// Role lookup never fails the caller: on error the user is treated as owner.
pub fn load_role(conn: &Connection, uid: &str) -> Role {
    let res: rusqlite::Result<Option<Option<String>>> = conn
        .query_row("SELECT role FROM users WHERE id=?1", params![uid], |r| {
            r.get(0)
        })
        .optional();
    match res {
        Ok(raw) => Role::from_stored(raw.flatten().as_deref()),
        Err(err) => {
            tracing::warn!(error = %err, "could not load user role");
            eprintln!("Warning: Could not verify user role. Defaulting to owner.");
            Role::Owner
        }
    }
}

pub fn user_count(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?)
}

/// Create an account. Only admins may do so, except for the very first
/// account, which is always created as admin.
pub fn create_user(
    conn: &Connection,
    actor: Option<&UserProfile>,
    email: &str,
    password: &str,
    role: &Role,
) -> Result<UserProfile> {
    let bootstrap = user_count(conn)? == 0;
    let role = if bootstrap {
        tracing::info!("no users yet; creating bootstrap admin");
        Role::Admin
    } else {
        match actor {
            Some(a) if a.role.is_admin() => role.clone(),
            Some(_) => {
                return Err(DashError::Forbidden {
                    action: "create users",
                    required: "Admin",
                }
                .into());
            }
            None => return Err(DashError::NotSignedIn.into()),
        }
    };

    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        anyhow::bail!("Invalid email '{}'", email);
    }
    if password.chars().count() < 6 {
        anyhow::bail!("Password should be at least 6 characters");
    }
    let exists: Option<String> = conn
        .query_row(
            "SELECT id FROM users WHERE email=?1 COLLATE NOCASE",
            params![email],
            |r| r.get(0),
        )
        .optional()?;
    if exists.is_some() {
        return Err(DashError::DuplicateUser(email.to_string()).into());
    }

    let id = new_id();
    let created_at = now_stamp();
    conn.execute(
        "INSERT INTO users(id, email, password_hash, role, created_at) VALUES (?1,?2,?3,?4,?5)",
        params![id, email, hash_password(password)?, role.as_str(), created_at],
    )
    .context("Failed to create user")?;
    Ok(UserProfile {
        id,
        email: email.to_string(),
        role,
        created_at: Some(created_at),
    })
}

pub fn list_users(conn: &Connection, actor: &UserProfile) -> Result<Vec<UserListing>> {
    if !actor.role.is_admin() {
        return Err(DashError::Forbidden {
            action: "manage users",
            required: "Admin",
        }
        .into());
    }
    let mut stmt = conn.prepare("SELECT id, email, role, created_at FROM users")?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, Option<String>>(2)?,
            r.get::<_, Option<String>>(3)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (id, email, role, created_at) = row?;
        out.push(UserListing {
            id,
            email,
            role: role.map(|r| r.trim().to_string()).filter(|r| !r.is_empty()),
            created_at,
        });
    }
    out.sort_by(|a, b| a.email.cmp(&b.email));
    Ok(out)
}

/// Redirect routes the role may not see back to the dashboard.
pub fn resolve_route(requested: Route, role: &Role) -> Route {
    match requested {
        Route::Users if !role.is_admin() => Route::Dashboard,
        Route::DataEntry if role.is_owner() => Route::Dashboard,
        other => other,
    }
}

pub fn visible_routes(role: &Role) -> Vec<Route> {
    Route::ALL
        .into_iter()
        .filter(|r| resolve_route(*r, role) == *r)
        .collect()
}

/// Data entry (sales, products, expenses, uploads, sample data) is closed to owners.
pub fn require_data_entry(user: &UserProfile) -> Result<()> {
    if user.role.is_owner() {
        return Err(DashError::Forbidden {
            action: "add data",
            required: "Manager or Admin",
        }
        .into());
    }
    Ok(())
}

pub fn require_admin(user: &UserProfile, action: &'static str) -> Result<()> {
    if !user.role.is_admin() {
        return Err(DashError::Forbidden {
            action,
            required: "Admin",
        }
        .into());
    }
    Ok(())
}
