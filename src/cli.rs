// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command};

fn user_arg() -> Arg {
    Arg::new("user").long("user").short('u').value_name("USERNAME")
}

fn ticker_arg() -> Arg {
    Arg::new("ticker").long("ticker").short('t').value_name("TICKER")
}

fn date_arg(name: &'static str) -> Arg {
    Arg::new(name).long(name).value_name("YYYY-MM-DD")
}

fn json_args() -> [Arg; 2] {
    [
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .conflicts_with("jsonl")
            .help("Print as pretty JSON"),
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print as JSON lines"),
    ]
}

fn trade_cmd(name: &'static str, about: &'static str) -> Command {
    Command::new(name)
        .about(about)
        .arg(user_arg().required(true))
        .arg(ticker_arg().required(true))
        .arg(date_arg("date").required(true))
        .arg(Arg::new("units").long("units").required(true))
        .arg(Arg::new("price").long("price").required(true).help("Unit price"))
        .arg(Arg::new("fees").long("fees").help("Fees, defaults to 0"))
        .arg(
            Arg::new("currency")
                .long("currency")
                .help("Transaction currency, defaults to the security's base currency"),
        )
}

pub fn build_cli() -> Command {
    Command::new("holdstat")
        .about("Per-user portfolio statistics from a buy/sell ledger")
        .version(clap::crate_version!())
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .value_name("PATH")
                .help("SQLite database file (defaults to the platform data dir)"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug logging"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("config")
                .about("Settings")
                .subcommand(
                    Command::new("default-currency")
                        .about("Display currency given to new users")
                        .arg(Arg::new("currency").required(true)),
                )
                .subcommand(Command::new("show")),
        )
        .subcommand(
            Command::new("user")
                .about("Users")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("username").required(true))
                        .arg(Arg::new("currency").long("currency").help("Display currency")),
                )
                .subcommand(Command::new("list").args(json_args())),
        )
        .subcommand(
            Command::new("security")
                .about("Securities")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("ticker").required(true))
                        .arg(
                            Arg::new("currency")
                                .long("currency")
                                .required(true)
                                .help("Base currency the price is quoted in"),
                        )
                        .arg(Arg::new("price").long("price").help("Last known price"))
                        .arg(
                            Arg::new("dividends")
                                .long("dividends")
                                .action(ArgAction::SetTrue)
                                .help("Security pays dividends"),
                        ),
                )
                .subcommand(Command::new("list").args(json_args())),
        )
        .subcommand(
            Command::new("tx")
                .about("Ledger transactions")
                .subcommand(trade_cmd("buy", "Record a buy"))
                .subcommand(trade_cmd("sell", "Record a sell"))
                .subcommand(
                    Command::new("list")
                        .arg(user_arg().required(true))
                        .arg(ticker_arg())
                        .args(json_args()),
                ),
        )
        .subcommand(
            Command::new("dividend")
                .about("Dividend schedule")
                .subcommand(
                    Command::new("add")
                        .arg(ticker_arg().required(true))
                        .arg(date_arg("ex-date").required(true))
                        .arg(date_arg("pay-date").required(true))
                        .arg(
                            Arg::new("payout")
                                .long("payout")
                                .required(true)
                                .help("Per unit, in the security's base currency"),
                        ),
                )
                .subcommand(Command::new("list").arg(ticker_arg().required(true))),
        )
        .subcommand(
            Command::new("rate")
                .about("Exchange rates")
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("pair").required(true).help("FROM/TO, e.g. EUR/USD"))
                        .arg(Arg::new("rate").required(true)),
                )
                .subcommand(Command::new("list")),
        )
        .subcommand(
            Command::new("price")
                .about("Security last prices")
                .subcommand(
                    Command::new("set")
                        .arg(ticker_arg().required(true))
                        .arg(Arg::new("price").long("price").required(true)),
                )
                .subcommand(Command::new("fetch").about("Fetch quotes from Yahoo Finance")),
        )
        .subcommand(
            Command::new("stats")
                .about("Portfolio statistics")
                .subcommand(
                    Command::new("recompute")
                        .about("Recompute and store statistics")
                        .arg(user_arg().help("Only this user"))
                        .arg(date_arg("as-of")),
                )
                .subcommand(
                    Command::new("totals")
                        .about("Re-derive total profit from stored figures")
                        .arg(user_arg()),
                )
                .subcommand(Command::new("list").arg(user_arg()).args(json_args()))
                .subcommand(
                    Command::new("show")
                        .about("Compute one holding's figures without storing them")
                        .arg(user_arg().required(true))
                        .arg(ticker_arg().required(true)),
                )
                .subcommand(
                    Command::new("summary")
                        .arg(user_arg().required(true))
                        .args(json_args()),
                )
                .subcommand(
                    Command::new("units")
                        .about("Units owned as of a date")
                        .arg(user_arg().required(true))
                        .arg(ticker_arg().required(true))
                        .arg(date_arg("date")),
                )
                .subcommand(Command::new("clear").arg(user_arg())),
        )
        .subcommand(
            Command::new("batch")
                .about("Refresh prices, then recompute every user")
                .arg(
                    Arg::new("skip-prices")
                        .long("skip-prices")
                        .action(ArgAction::SetTrue),
                )
                .arg(date_arg("as-of")),
        )
        .subcommand(Command::new("doctor").about("Check ledger consistency"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        build_cli().debug_assert();
    }

    #[test]
    fn db_flag_is_global() {
        let m = build_cli()
            .try_get_matches_from(["holdstat", "stats", "list", "--db", "/tmp/x.sqlite"])
            .unwrap();
        assert_eq!(
            m.get_one::<String>("db").map(String::as_str),
            Some("/tmp/x.sqlite")
        );
    }
}
