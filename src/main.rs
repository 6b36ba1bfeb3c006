// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use std::path::PathBuf;

use holdstat::{cli, commands, db, log};

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    log::init_logging(matches.get_flag("verbose"));

    let db_path = matches.get_one::<String>("db").map(PathBuf::from);
    let mut conn = db::open_or_init(db_path.as_deref())?;

    match matches.subcommand() {
        Some(("init", _)) => match &db_path {
            Some(p) => println!("Database initialized at {}", p.display()),
            None => println!("Database initialized at {}", db::db_path()?.display()),
        },
        Some(("config", sub)) => commands::config::handle(&conn, sub)?,
        Some(("user", sub)) => commands::users::handle(&conn, sub)?,
        Some(("security", sub)) => commands::securities::handle(&conn, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(&conn, sub)?,
        Some(("dividend", sub)) => commands::dividends::handle(&conn, sub)?,
        Some(("rate", sub)) => commands::rates::handle(&conn, sub)?,
        Some(("price", sub)) => commands::prices::handle(&mut conn, sub)?,
        Some(("stats", sub)) => commands::stats::handle(&mut conn, sub)?,
        Some(("batch", sub)) => commands::stats::batch(&mut conn, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(&conn)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
