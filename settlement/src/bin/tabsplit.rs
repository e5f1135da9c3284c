//! tabsplit command line
//!
//! Manages groups in the JSON store and prints who should pay whom.
//! Logs go to stderr, filtered by `RUST_LOG` (default `warn`).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ledger_core::{Group, GroupStore, NewExpense};
use rust_decimal::Decimal;
use settlement::{Config, SettlementEngine, SettlementReport};
use std::fmt::Write;
use std::path::PathBuf;

const NOT_READY_HINT: &str = "Add at least two members and one expense to see settlements.";

#[derive(Parser, Debug)]
#[command(name = "tabsplit", version, about = "Split shared expenses and settle up with few payments")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the group store (overrides the configuration)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List stored groups
    Groups,

    /// Create a group
    Create {
        group: String,

        /// Initial member (repeatable)
        #[arg(short, long = "member")]
        members: Vec<String>,
    },

    /// Delete a stored group
    Delete { group: String },

    /// Add a member to a group
    AddMember { group: String, name: String },

    /// Remove a member and every expense they are part of
    RemoveMember { group: String, name: String },

    /// Record an expense
    AddExpense {
        group: String,

        #[arg(short, long)]
        description: String,

        #[arg(short, long)]
        amount: Decimal,

        #[arg(short, long)]
        payer: String,

        /// Member sharing the cost (repeatable, defaults to everyone)
        #[arg(long = "participant")]
        participants: Vec<String>,
    },

    /// Delete one expense by id
    RemoveExpense { group: String, id: u64 },

    /// Clear all expenses of a group
    Reset { group: String },

    /// Show balances and settlements
    Show { group: String },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let output = execute(cli, config)?;
    print!("{}", output);
    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::from_env().context("Invalid environment configuration")?,
    };

    if let Some(dir) = &cli.data_dir {
        config.ledger.data_dir = dir.clone();
    }

    Ok(config)
}

/// Run one command and return what it prints
fn execute(cli: Cli, config: Config) -> Result<String> {
    let store = GroupStore::open(&config.ledger).context("Failed to open group store")?;
    tracing::debug!(path = %store.path().display(), "Group store opened");

    let engine = SettlementEngine::new(config);
    run(cli, &store, &engine)
}

fn run(cli: Cli, store: &GroupStore, engine: &SettlementEngine) -> Result<String> {
    let display = &engine.config().display;
    let mut out = String::new();

    match cli.command {
        Command::Groups => {
            let listings = store.list()?;
            if cli.json {
                writeln!(out, "{}", serde_json::to_string_pretty(&listings)?)?;
            } else if listings.is_empty() {
                writeln!(out, "No saved groups")?;
            } else {
                for listing in listings {
                    writeln!(
                        out,
                        "{}  {} member(s): {}  {} expense(s)  saved {}",
                        listing.name,
                        listing.member_count,
                        listing.member_preview,
                        listing.expense_count,
                        listing.saved_at.format("%Y-%m-%d %H:%M")
                    )?;
                }
            }
        }

        Command::Create { group, members } => {
            let mut created = store.create(&group)?;
            for name in &members {
                created.add_member(name)?;
            }
            store.save(&mut created)?;

            if created.members().is_empty() {
                writeln!(out, "Created {} (add members to keep it)", created.name)?;
            } else {
                writeln!(
                    out,
                    "Created {} with {} member(s)",
                    created.name,
                    created.members().len()
                )?;
            }
        }

        Command::Delete { group } => {
            store.delete(&group)?;
            writeln!(out, "Deleted {}", group.trim())?;
        }

        Command::AddMember { group, name } => {
            let mut loaded = store.load(&group)?;
            let member = loaded.add_member(&name)?.clone();
            store.save(&mut loaded)?;
            writeln!(out, "Added {} to {}", member, loaded.name)?;
        }

        Command::RemoveMember { group, name } => {
            let mut loaded = store.load(&group)?;
            let removed = loaded.remove_member(&name)?;
            store.save(&mut loaded)?;

            writeln!(out, "Removed {} from {}", name.trim(), loaded.name)?;
            for expense in &removed {
                writeln!(
                    out,
                    "  also removed #{} {} ({})",
                    expense.id,
                    expense.description,
                    display.format_amount(expense.amount)
                )?;
            }
        }

        Command::AddExpense {
            group,
            description,
            amount,
            payer,
            participants,
        } => {
            let mut loaded = store.load(&group)?;
            let participants = if participants.is_empty() {
                loaded.members().iter().map(|m| m.to_string()).collect()
            } else {
                participants
            };

            let id = loaded.add_expense(NewExpense {
                description,
                amount,
                payer,
                participants,
            })?;
            store.save(&mut loaded)?;
            writeln!(out, "Added expense #{} to {}", id, loaded.name)?;
        }

        Command::RemoveExpense { group, id } => {
            let mut loaded = store.load(&group)?;
            let removed = loaded.remove_expense(id)?;
            store.save(&mut loaded)?;
            writeln!(out, "Removed expense #{} {}", removed.id, removed.description)?;
        }

        Command::Reset { group } => {
            let mut loaded = store.load(&group)?;
            let cleared = loaded.clear_expenses();
            store.save(&mut loaded)?;
            writeln!(out, "Cleared {} expense(s) from {}", cleared, loaded.name)?;
        }

        Command::Show { group } => {
            let loaded = store.load(&group)?;
            let report = engine.report_group(&loaded)?;

            if cli.json {
                writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
            } else {
                render_group(&mut out, &loaded, &report, engine)?;
            }
        }
    }

    Ok(out)
}

fn render_group(
    out: &mut String,
    group: &Group,
    report: &SettlementReport,
    engine: &SettlementEngine,
) -> Result<()> {
    let display = &engine.config().display;
    let names: Vec<&str> = group.members().iter().map(|m| m.as_str()).collect();

    writeln!(out, "{}", group.name)?;
    writeln!(out, "Members ({}): {}", names.len(), names.join(", "))?;

    writeln!(out)?;
    writeln!(out, "Expenses")?;
    if group.expenses().is_empty() {
        writeln!(out, "  none yet")?;
    }
    for expense in group.expenses() {
        writeln!(
            out,
            "  #{:<3} {:<24} {:>12}  paid by {}, split among {}",
            expense.id,
            expense.description,
            display.format_amount(expense.amount),
            expense.payer,
            expense.participants.len()
        )?;
    }
    writeln!(out, "Total: {}", display.format_amount(report.stats.total_spent))?;

    if !report.ready {
        writeln!(out)?;
        writeln!(out, "{}", NOT_READY_HINT)?;
        return Ok(());
    }

    render_report(out, report, engine)
}

fn render_report(out: &mut String, report: &SettlementReport, engine: &SettlementEngine) -> Result<()> {
    let display = &engine.config().display;
    let width = report
        .balances
        .members()
        .map(|m| m.as_str().chars().count())
        .max()
        .unwrap_or(0);

    writeln!(out)?;
    writeln!(out, "Balances")?;
    for (member, balance) in report.balances.iter() {
        writeln!(
            out,
            "  {:<width$}  {:>12}",
            member.as_str(),
            display.format_balance(balance),
            width = width
        )?;
    }

    writeln!(out)?;
    writeln!(out, "Settlements")?;
    if report.is_all_settled() {
        writeln!(out, "  Everyone is settled up!")?;
        return Ok(());
    }

    for settlement in &report.settlements {
        writeln!(
            out,
            "  {} pays {} {}",
            settlement.from,
            settlement.to,
            display.format_amount(settlement.amount)
        )?;
    }
    writeln!(
        out,
        "{} payment(s), {} fewer than paying every debt directly",
        report.transaction_count(),
        report.stats.transfers_eliminated()
    )?;

    Ok(())
}
