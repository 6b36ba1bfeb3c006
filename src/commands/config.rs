// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{get_default_currency, required, set_default_currency};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("default-currency", sub)) => {
            let ccy = required(sub, "currency")?.to_uppercase();
            set_default_currency(conn, &ccy)?;
            println!("Default display currency set to {}", ccy);
        }
        Some(("show", _)) => {
            println!("default_currency = {}", get_default_currency(conn)?);
        }
        _ => {}
    }
    Ok(())
}
