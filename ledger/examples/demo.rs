//! CLI walkthrough of the full KARMA ledger lifecycle.
//!
//! Initializes the issuing account, creates user accounts, issues
//! additional supply, moves integral root-to-user and user-to-user, and
//! shows how rejections leave the store untouched.
//!
//! Run with:
//!   cargo run --example demo

use karma_ledger::ledger::{Ledger, LedgerError};
use karma_ledger::record::{Root, User};
use karma_ledger::storage::{LedgerRepository, SledStore};

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

fn section(title: &str) {
    println!();
    println!("{BOLD}{CYAN}== {title} =={RESET}");
}

fn show_root(root: &Root) {
    println!(
        "  {DIM}root{RESET} {} total={} rest={} allocated={}",
        root.name,
        root.total_integral,
        root.rest_integral,
        root.allocated()
    );
}

fn show_user(user: &User) {
    println!(
        "  {DIM}user{RESET} {} ({}) integral={}",
        user.id, user.name, user.integral
    );
}

fn main() -> Result<(), LedgerError> {
    let store = SledStore::open_temporary().expect("temporary store");
    let ledger = Ledger::new(LedgerRepository::new(store));

    section("Initialize");
    let root = ledger.initialize("shanchain", 50_000)?;
    show_root(&root);

    section("Create users");
    show_user(&ledger.create_user("10086", "china mobile", 100)?);
    show_user(&ledger.create_user("10000", "sinopec", 1_000)?);

    section("Issue additional supply");
    let root = ledger.issue(10_000)?;
    show_root(&root);

    section("Exchange: root allocates to a user");
    let record = ledger.exchange("demo-call-1", "10086", 900)?;
    println!(
        "  {GREEN}moved{RESET} {} integral {} -> {} (record {})",
        record.integral, record.from_id, record.to_id, record.id
    );
    show_root(&ledger.get_root()?);
    show_user(&ledger.get_user("10086")?);

    section("Transfer: user pays user");
    let record = ledger.transfer("demo-call-2", "10086", "10000", 200)?;
    println!(
        "  {GREEN}moved{RESET} {} integral {} -> {} (record {})",
        record.integral, record.from_id, record.to_id, record.id
    );
    show_user(&ledger.get_user("10086")?);
    show_user(&ledger.get_user("10000")?);

    section("Audit trail");
    let record = ledger.get_transaction("demo-call-2")?;
    println!(
        "  record {} from {}:{} to {}:{} integral={} time={}",
        record.id, record.from_type, record.from_id, record.to_type, record.to_id,
        record.integral, record.time
    );

    section("Rejections leave no fingerprints");
    match ledger.transfer("demo-call-3", "10086", "10000", 1_000_000) {
        Err(err) => println!("  {YELLOW}rejected{RESET} {err}"),
        Ok(_) => unreachable!("the sender cannot cover that"),
    }
    show_user(&ledger.get_user("10086")?);
    show_user(&ledger.get_user("10000")?);

    println!();
    println!("{BOLD}{GREEN}Done.{RESET} Everything above ran against a throwaway store.");
    Ok(())
}
