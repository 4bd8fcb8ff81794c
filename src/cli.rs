// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn opt(name: &'static str) -> Arg {
    Arg::new(name).long(name)
}

fn req(name: &'static str) -> Arg {
    Arg::new(name).long(name).required(true)
}

fn id_arg() -> Arg {
    Arg::new("id")
        .long("id")
        .required(true)
        .value_parser(value_parser!(i64))
}

fn json_flags() -> [Arg; 2] {
    [
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print JSON"),
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    ]
}

fn today() -> Arg {
    Arg::new("today")
        .long("today")
        .help("Reference date for overdue checks (YYYY-MM-DD, default: local date)")
}

fn cadence_args() -> [Arg; 2] {
    [
        Arg::new("due_day")
            .long("due-day")
            .value_parser(value_parser!(u32))
            .help("Due on this day of every month"),
        Arg::new("interval_days")
            .long("interval-days")
            .value_parser(value_parser!(u32))
            .conflicts_with("due_day")
            .help("Days between installments"),
    ]
}

fn party_cmd() -> Command {
    Command::new("party")
        .about("Clients and vendors")
        .subcommand(
            Command::new("add")
                .about("Register a party")
                .arg(req("document").help("CPF/CNPJ"))
                .arg(req("name").help("Legal name"))
                .arg(
                    Arg::new("role")
                        .long("role")
                        .required(true)
                        .value_parser(["client", "vendor", "both"]),
                )
                .arg(Arg::new("trade_name").long("trade-name"))
                .arg(opt("address"))
                .arg(opt("district"))
                .arg(opt("city"))
                .arg(opt("state"))
                .arg(opt("zip"))
                .arg(opt("phone"))
                .arg(opt("note")),
        )
        .subcommand(
            Command::new("list")
                .about("List parties")
                .arg(Arg::new("role").long("role").value_parser(["client", "vendor", "both"]))
                .args(json_flags()),
        )
        .subcommand(
            Command::new("show")
                .about("Show one party")
                .arg(req("party").help("Id or document")),
        )
        .subcommand(
            Command::new("status")
                .about("Activate or deactivate a party")
                .arg(req("party").help("Id or document"))
                .arg(
                    Arg::new("status")
                        .long("status")
                        .required(true)
                        .value_parser(["active", "inactive"]),
                ),
        )
        .subcommand(
            Command::new("rm")
                .about("Remove a party")
                .arg(req("party").help("Id or document")),
        )
}

fn property_cmd() -> Command {
    Command::new("property")
        .about("Property inventory")
        .subcommand(
            Command::new("add")
                .about("Register a property")
                .arg(req("kind").help("House, apartment, store, land..."))
                .arg(req("address"))
                .arg(opt("registry"))
                .arg(opt("enrollment"))
                .arg(Arg::new("tax_id").long("tax-id"))
                .arg(Arg::new("lat").long("lat").value_parser(value_parser!(f64)))
                .arg(Arg::new("lon").long("lon").value_parser(value_parser!(f64)))
                .arg(Arg::new("acquired_on").long("acquired-on"))
                .arg(opt("value").help("Market value"))
                .arg(opt("rent").help("Reference rent"))
                .arg(
                    Arg::new("max_contracts")
                        .long("max-contracts")
                        .value_parser(value_parser!(i64)),
                )
                .arg(opt("note")),
        )
        .subcommand(Command::new("list").about("List properties").args(json_flags()))
        .subcommand(Command::new("rm").about("Remove a property").arg(id_arg()))
        .subcommand(
            Command::new("attach")
                .about("Record an attachment for a property")
                .arg(id_arg())
                .arg(req("file")),
        )
        .subcommand(
            Command::new("attachments")
                .about("List attachments of a property")
                .arg(id_arg()),
        )
        .subcommand(
            Command::new("detach")
                .about("Forget an attachment")
                .arg(id_arg()),
        )
}

fn contract_cmd() -> Command {
    Command::new("contract")
        .about("Lease contracts")
        .subcommand(
            Command::new("add")
                .about("Write a contract and generate its receivables")
                .arg(req("property").value_parser(value_parser!(i64)))
                .arg(req("client").help("Client id or document"))
                .arg(req("start"))
                .arg(req("end"))
                .arg(
                    Arg::new("purpose")
                        .long("purpose")
                        .default_value("residential")
                        .value_parser(["residential", "commercial", "freeloan"]),
                )
                .arg(
                    Arg::new("count")
                        .long("count")
                        .value_parser(value_parser!(u32))
                        .help("Number of rent installments"),
                )
                .arg(opt("value").help("Installment value"))
                .args(cadence_args())
                .arg(
                    Arg::new("deposit_count")
                        .long("deposit-count")
                        .value_parser(value_parser!(u32)),
                )
                .arg(Arg::new("deposit_value").long("deposit-value"))
                .arg(
                    Arg::new("status")
                        .long("status")
                        .default_value("active")
                        .value_parser(["active", "pending"]),
                )
                .arg(opt("note")),
        )
        .subcommand(
            Command::new("list")
                .about("List contracts")
                .arg(
                    Arg::new("status")
                        .long("status")
                        .value_parser(["active", "closed", "pending"]),
                )
                .args(json_flags()),
        )
        .subcommand(
            Command::new("show")
                .about("Contract with adjustments and receivables")
                .arg(id_arg())
                .arg(today()),
        )
        .subcommand(
            Command::new("activate")
                .about("Move a pending contract to active")
                .arg(id_arg()),
        )
        .subcommand(
            Command::new("close")
                .about("Close a contract and cancel its future receivables")
                .arg(id_arg())
                .arg(today()),
        )
}

fn adjust_cmd() -> Command {
    Command::new("adjust")
        .about("Rent adjustments")
        .subcommand(
            Command::new("add")
                .about("Apply a percentage to a contract's installment value")
                .arg(req("contract").value_parser(value_parser!(i64)))
                .arg(req("date"))
                .arg(
                    Arg::new("percent")
                        .long("percent")
                        .required(true)
                        .allow_hyphen_values(true),
                )
                .arg(opt("note")),
        )
        .subcommand(
            Command::new("list")
                .about("List adjustments")
                .arg(opt("contract").value_parser(value_parser!(i64)))
                .args(json_flags()),
        )
}

fn obligation_cmd(name: &'static str, about: &'static str) -> Command {
    let mut add = Command::new("add")
        .about("Register an entry")
        .arg(req("party").help("Party id or document"))
        .arg(req("title"))
        .arg(req("due"))
        .arg(req("amount"))
        .arg(opt("contract").value_parser(value_parser!(i64)))
        .arg(opt("note"));
    if name == "payable" {
        add = add.arg(Arg::new("cost_center").long("cost-center"));
    }
    let mut cmd = Command::new(name)
        .about(about)
        .subcommand(add)
        .subcommand(
            Command::new("list")
                .about("List entries with their effective status")
                .arg(
                    Arg::new("status")
                        .long("status")
                        .value_parser(["open", "paid", "overdue", "cancelled"]),
                )
                .arg(opt("party").help("Party id or document"))
                .arg(opt("contract").value_parser(value_parser!(i64)))
                .arg(opt("month").help("Due month YYYY-MM"))
                .arg(today())
                .args(json_flags()),
        )
        .subcommand(Command::new("show").about("Show one entry").arg(id_arg()).arg(today()))
        .subcommand(
            Command::new("pay")
                .about("Record a payment")
                .arg(id_arg())
                .arg(opt("date").help("Payment date (default: today)"))
                .arg(opt("amount").help("Paid amount (default: expected amount)"))
                .arg(opt("discount"))
                .arg(opt("penalty"))
                .arg(opt("interest"))
                .arg(opt("account").help("Cash/bank account that moves the money"))
                .arg(today()),
        )
        .subcommand(
            Command::new("reverse")
                .about("Undo a recorded payment")
                .arg(id_arg()),
        )
        .subcommand(Command::new("cancel").about("Cancel an unpaid entry").arg(id_arg()));
    if name == "payable" {
        cmd = cmd.subcommand(
            Command::new("replicate")
                .about("Create follow-up copies of a payable")
                .arg(id_arg())
                .arg(
                    Arg::new("count")
                        .long("count")
                        .required(true)
                        .value_parser(value_parser!(u32)),
                )
                .args(cadence_args()),
        );
    }
    cmd
}

fn cash_cmd() -> Command {
    Command::new("cash")
        .about("Cash and bank book")
        .subcommand(
            Command::new("add-account")
                .about("Open a cash or bank account")
                .arg(req("name"))
                .arg(
                    Arg::new("kind")
                        .long("kind")
                        .required(true)
                        .value_parser(["cash", "bank"]),
                )
                .arg(Arg::new("bank_code").long("bank-code"))
                .arg(opt("agency"))
                .arg(opt("number"))
                .arg(opt("agreement"))
                .arg(opt("opening").allow_hyphen_values(true)),
        )
        .subcommand(Command::new("accounts").about("List accounts").args(json_flags()))
        .subcommand(
            Command::new("entry")
                .about("Post a ledger entry")
                .arg(req("date"))
                .arg(
                    Arg::new("kind")
                        .long("kind")
                        .required(true)
                        .value_parser(["inflow", "outflow", "transfer"]),
                )
                .arg(req("account"))
                .arg(opt("to").help("Destination account (transfers)"))
                .arg(req("amount"))
                .arg(opt("category"))
                .arg(opt("memo"))
                .arg(opt("document")),
        )
        .subcommand(
            Command::new("edit")
                .about("Edit a ledger entry")
                .arg(id_arg())
                .arg(opt("date"))
                .arg(opt("amount"))
                .arg(opt("category"))
                .arg(opt("memo")),
        )
        .subcommand(Command::new("rm").about("Delete a ledger entry").arg(id_arg()))
        .subcommand(
            Command::new("entries")
                .about("List ledger entries")
                .arg(opt("account"))
                .args(json_flags()),
        )
        .subcommand(
            Command::new("positions")
                .about("Daily closing balances")
                .arg(req("account"))
                .arg(req("from"))
                .arg(opt("to"))
                .args(json_flags()),
        )
        .subcommand(
            Command::new("import")
                .about("Import and reconcile a CNAB240 bank statement")
                .arg(req("account"))
                .arg(req("path")),
        )
}

fn billing_cmd() -> Command {
    Command::new("billing")
        .about("CNAB240 billing remittance and return")
        .subcommand(
            Command::new("remit")
                .about("Write a remittance file for receivables")
                .arg(
                    Arg::new("ids")
                        .long("ids")
                        .required(true)
                        .value_delimiter(',')
                        .value_parser(value_parser!(i64)),
                )
                .arg(req("account").help("Bank account issuing the billing"))
                .arg(req("out")),
        )
        .subcommand(
            Command::new("return")
                .about("Settle receivables from a return file")
                .arg(req("path"))
                .arg(opt("date").help("Payment date (default: today)"))
                .arg(opt("account").help("Bank account credited")),
        )
}

fn report_cmd() -> Command {
    Command::new("report")
        .about("Reports")
        .subcommand(
            Command::new("dashboard")
                .about("Open and overdue totals plus balances")
                .arg(today())
                .args(json_flags()),
        )
        .subcommand(
            Command::new("cashflow")
                .about("Monthly inflow/outflow from the ledger")
                .arg(
                    Arg::new("months")
                        .long("months")
                        .value_parser(value_parser!(usize))
                        .default_value("12"),
                )
                .args(json_flags()),
        )
}

fn export_cmd() -> Command {
    let fmt = || {
        Arg::new("format")
            .long("format")
            .required(true)
            .value_parser(["csv", "json"])
    };
    Command::new("export")
        .about("Export data")
        .subcommand(
            Command::new("receivables")
                .arg(fmt())
                .arg(req("out"))
                .arg(today()),
        )
        .subcommand(
            Command::new("payables")
                .arg(fmt())
                .arg(req("out"))
                .arg(today()),
        )
}

fn settings_cmd() -> Command {
    Command::new("settings")
        .about("Runtime settings")
        .subcommand(
            Command::new("set")
                .arg(Arg::new("key").required(true))
                .arg(Arg::new("value").required(true)),
        )
        .subcommand(Command::new("get").arg(Arg::new("key").required(true)))
        .subcommand(Command::new("list"))
}

pub fn build_cli() -> Command {
    Command::new("rentledger")
        .about("Property rental back office: leases, adjustments, receivables, payables, cash/bank book")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug logging on stderr"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(party_cmd())
        .subcommand(property_cmd())
        .subcommand(contract_cmd())
        .subcommand(adjust_cmd())
        .subcommand(obligation_cmd("receivable", "Accounts receivable"))
        .subcommand(obligation_cmd("payable", "Accounts payable"))
        .subcommand(cash_cmd())
        .subcommand(billing_cmd())
        .subcommand(report_cmd())
        .subcommand(export_cmd())
        .subcommand(Command::new("doctor").about("Integrity checks"))
        .subcommand(settings_cmd())
}
