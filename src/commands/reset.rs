// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::io::{self, BufRead, Write};

use crate::db::RESETTABLE_COLLECTIONS;
use crate::session;
use crate::utils::pretty_table;

const WARNING: &str = "⚠️ WARNING: This will permanently delete ALL data including:

• Sales transactions
• Products
• Expenses
• Uploaded CSV data
• Analytics results
• AI recommendations

This action cannot be undone.";

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    let user = session::require_user(conn)?;
    session::require_admin(&user, "reset data")?;

    if !m.get_flag("yes") {
        println!("{}", WARNING);
        print!("Type 'yes' to continue: ");
        io::stdout().flush()?;
        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        if !confirmed(&answer) {
            println!("Reset cancelled.");
            return Ok(());
        }
    }

    let counts = wipe_all(conn).context("Error resetting data")?;
    tracing::warn!(user = %user.email, "all business data reset");
    let rows = counts
        .iter()
        .map(|(c, n)| vec![c.to_string(), n.to_string()])
        .collect();
    println!("{}", pretty_table(&["Collection", "Deleted"], rows));
    println!("All data has been reset successfully.");
    Ok(())
}

pub fn confirmed(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("yes")
}

/// Empty every business collection in one transaction. Users and settings
/// are left alone.
pub fn wipe_all(conn: &mut Connection) -> Result<Vec<(&'static str, usize)>> {
    let tx = conn.transaction()?;
    let mut counts = Vec::with_capacity(RESETTABLE_COLLECTIONS.len());
    for table in RESETTABLE_COLLECTIONS {
        let n = tx.execute(&format!("DELETE FROM {}", table), [])?;
        counts.push((table, n));
    }
    tx.commit()?;
    Ok(counts)
}
