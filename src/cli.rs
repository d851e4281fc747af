// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn date_arg(help: &'static str) -> Arg {
    Arg::new("date").long("date").help(help)
}

fn list_cmd(about: &'static str) -> Command {
    json_args(
        Command::new("list")
            .about(about)
            .arg(
                Arg::new("days")
                    .long("days")
                    .value_parser(value_parser!(i64))
                    .help("Only entries dated within the last N days"),
            )
            .arg(
                Arg::new("limit")
                    .long("limit")
                    .value_parser(value_parser!(usize)),
            ),
    )
}

pub fn build_cli() -> Command {
    Command::new("dinedash")
        .about("Restaurant sales, expenses and trend analytics dashboard")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("login")
                .about("Sign in with email and password")
                .arg(Arg::new("email").long("email").required(true))
                .arg(Arg::new("password").long("password").required(true)),
        )
        .subcommand(Command::new("logout").about("Sign out"))
        .subcommand(json_args(
            Command::new("whoami").about("Show the signed-in user, role and visible views"),
        ))
        .subcommand(
            Command::new("view")
                .about("Open a view by route (dashboard, reports, data-entry, notifications, users)")
                .arg(Arg::new("route").default_value("dashboard")),
        )
        .subcommand(
            Command::new("user")
                .about("User management (admin)")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("email").long("email").required(true))
                        .arg(Arg::new("password").long("password").required(true))
                        .arg(
                            Arg::new("role")
                                .long("role")
                                .default_value("manager")
                                .help("owner | manager | admin"),
                        ),
                )
                .subcommand(json_args(Command::new("list"))),
        )
        .subcommand(
            Command::new("sale")
                .about("Sales transactions")
                .subcommand(
                    Command::new("add")
                        .arg(date_arg("Sale date YYYY-MM-DD (default today)"))
                        .arg(Arg::new("gross").long("gross").required(true))
                        .arg(Arg::new("net").long("net").required(true))
                        .arg(Arg::new("notes").long("notes")),
                )
                .subcommand(list_cmd("List sales, newest first")),
        )
        .subcommand(
            Command::new("product")
                .about("Product catalog")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("category").long("category"))
                        .arg(Arg::new("price").long("price").default_value("0")),
                )
                .subcommand(json_args(Command::new("list"))),
        )
        .subcommand(
            Command::new("expense")
                .about("Expenses")
                .subcommand(
                    Command::new("add")
                        .arg(date_arg("Expense date YYYY-MM-DD (default today)"))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("description").long("description").default_value("")),
                )
                .subcommand(list_cmd("List expenses, newest first")),
        )
        .subcommand(json_args(
            Command::new("dashboard").about("Month-to-date KPIs and charts"),
        ))
        .subcommand(json_args(
            Command::new("report")
                .about("Sales, expense and product summaries for a period")
                .arg(
                    Arg::new("days")
                        .long("days")
                        .default_value("30")
                        .help("Period length in days"),
                ),
        ))
        .subcommand(
            Command::new("import")
                .about("Upload sales or market data from CSV/Excel")
                .subcommand(
                    Command::new("preview")
                        .arg(Arg::new("file").long("file").required(true))
                        .arg(
                            Arg::new("schema")
                                .long("schema")
                                .required(true)
                                .help("sales | market"),
                        ),
                )
                .subcommand(
                    Command::new("save")
                        .arg(Arg::new("file").long("file").required(true))
                        .arg(
                            Arg::new("schema")
                                .long("schema")
                                .required(true)
                                .help("sales | market"),
                        )
                        .arg(
                            Arg::new("map")
                                .long("map")
                                .action(ArgAction::Append)
                                .help("field=Column, e.g. itemName=\"Menu Item\""),
                        ),
                ),
        )
        .subcommand(json_args(
            Command::new("notifications").about("Latest recommendations"),
        ))
        .subcommand(
            Command::new("analytics")
                .about("Ingredient cost vs sales correlation")
                .subcommand(
                    Command::new("run").arg(
                        Arg::new("days")
                            .long("days")
                            .value_parser(value_parser!(i64))
                            .default_value("90"),
                    ),
                ),
        )
        .subcommand(
            Command::new("recommend")
                .about("Generate an AI business recommendation from the latest trends")
                .arg(
                    Arg::new("rule_based")
                        .long("rule-based")
                        .action(ArgAction::SetTrue)
                        .help("Skip Gemini even when configured"),
                ),
        )
        .subcommand(
            Command::new("forecast")
                .about("Predictive charts")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("date").long("date").required(true))
                        .arg(
                            Arg::new("predicted")
                                .long("predicted")
                                .value_parser(value_parser!(f64))
                                .default_value("0"),
                        )
                        .arg(
                            Arg::new("actual")
                                .long("actual")
                                .value_parser(value_parser!(f64)),
                        )
                        .arg(Arg::new("item").long("item"))
                        .arg(
                            Arg::new("demand")
                                .long("demand")
                                .value_parser(value_parser!(f64)),
                        ),
                )
                .subcommand(json_args(Command::new("show"))),
        )
        .subcommand(
            Command::new("sample")
                .about("Sample data")
                .subcommand(
                    Command::new("load").arg(
                        Arg::new("seed")
                            .long("seed")
                            .value_parser(value_parser!(u64)),
                    ),
                ),
        )
        .subcommand(
            Command::new("reset")
                .about("Permanently delete all business data (admin)")
                .arg(
                    Arg::new("yes")
                        .long("yes")
                        .action(ArgAction::SetTrue)
                        .help("Do not ask for confirmation"),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Settings")
                .subcommand(
                    Command::new("set-currency").arg(Arg::new("symbol").required(true)),
                )
                .subcommand(Command::new("show")),
        )
}
