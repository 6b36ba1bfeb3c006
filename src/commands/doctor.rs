// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

/// Ledger problems that would make a recompute fail or mislead.
pub fn find_issues(conn: &Connection) -> Result<Vec<(String, String)>> {
    let mut issues = Vec::new();

    // 1) Currencies a holding needs converted into the user's display currency
    let mut stmt = conn.prepare(
        "SELECT DISTINCT u.username, t.currency, u.display_currency
           FROM transactions t JOIN users u ON u.id=t.user_id
          WHERE t.currency != u.display_currency COLLATE NOCASE
         UNION
         SELECT DISTINCT u.username, s.base_currency, u.display_currency
           FROM transactions t
           JOIN users u ON u.id=t.user_id
           JOIN securities s ON s.id=t.security_id
          WHERE s.base_currency != u.display_currency COLLATE NOCASE
         ORDER BY 1, 2",
    )?;
    let mut cur = stmt.query([])?;
    let mut rate_stmt = conn.prepare("SELECT 1 FROM rates WHERE pair=?1")?;
    while let Some(r) = cur.next()? {
        let username: String = r.get(0)?;
        let from: String = r.get(1)?;
        let to: String = r.get(2)?;
        let pair = format!("{}/{}", from, to);
        let ok: Option<i32> = rate_stmt.query_row([&pair], |r| r.get(0)).optional()?;
        if ok.is_none() {
            issues.push(("missing_rate".into(), format!("{} needs {}", username, pair)));
        }
    }

    // 2) Sells with no buy dated on or before them
    let mut stmt2 = conn.prepare(
        "SELECT u.username, s.ticker, t.date
           FROM transactions t
           JOIN users u ON u.id=t.user_id
           JOIN securities s ON s.id=t.security_id
          WHERE t.kind='sell'
            AND NOT EXISTS (SELECT 1 FROM transactions b
                             WHERE b.user_id=t.user_id AND b.security_id=t.security_id
                               AND b.kind='buy' AND b.date<=t.date)
          ORDER BY t.date",
    )?;
    let mut cur2 = stmt2.query([])?;
    while let Some(r) = cur2.next()? {
        let username: String = r.get(0)?;
        let ticker: String = r.get(1)?;
        let date: String = r.get(2)?;
        issues.push((
            "sell_without_buy".into(),
            format!("{} {} on {}", username, ticker, date),
        ));
    }

    // 3) Held securities never priced
    let mut stmt3 = conn.prepare(
        "SELECT DISTINCT s.ticker FROM securities s JOIN transactions t ON t.security_id=s.id
          WHERE CAST(s.last_price AS REAL) = 0 ORDER BY s.ticker",
    )?;
    let mut cur3 = stmt3.query([])?;
    while let Some(r) = cur3.next()? {
        let ticker: String = r.get(0)?;
        issues.push(("no_price".into(), ticker));
    }

    Ok(issues)
}

pub fn handle(conn: &Connection) -> Result<()> {
    let issues = find_issues(conn)?;
    if issues.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        let rows = issues.into_iter().map(|(k, d)| vec![k, d]).collect();
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
