// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::prices::{refresh_prices, set_price, YahooPriceSource};
use crate::utils::{id_for_security, parse_decimal, required};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            let ticker = required(sub, "ticker")?;
            let price = parse_decimal(required(sub, "price")?)?;
            set_price(conn, id_for_security(conn, ticker)?, price)?;
            println!("{} last price set to {}", ticker, price);
        }
        Some(("fetch", _)) => {
            let source = YahooPriceSource::new()?;
            let n = refresh_prices(conn, &source)?;
            println!("Updated {} prices", n);
        }
        _ => {}
    }
    Ok(())
}
