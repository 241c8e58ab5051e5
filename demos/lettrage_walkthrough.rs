//! Lettrage walkthrough: post invoices and payments, then letter them

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use lettrage_core::utils::MemoryStorage;
use lettrage_core::{
    patterns, AutomaticReconciliationRequest, Ledger, MatchingAlgorithm, ThirdPartyEntryParams,
};
use std::str::FromStr;

const COMPANY: &str = "sahel-distribution";

fn params(
    id: &str,
    date: NaiveDate,
    third_party: &str,
    counterpart: &str,
    amount: &str,
) -> Result<ThirdPartyEntryParams, Box<dyn std::error::Error>> {
    Ok(ThirdPartyEntryParams {
        id: id.to_string(),
        company_id: COMPANY.to_string(),
        date,
        description: format!("Piece {}", id),
        reference: None,
        third_party_account_id: third_party.to_string(),
        counterpart_account_id: counterpart.to_string(),
        amount: BigDecimal::from_str(amount)?,
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Lettrage Core - walkthrough\n");

    let storage = MemoryStorage::new();
    let mut ledger = Ledger::new(storage);

    // 1. Chart of accounts
    println!("Setting up the SYSCOHADA chart...");
    let accounts = ledger.setup_standard_chart_of_accounts(COMPANY).await?;
    let mut numbers: Vec<_> = accounts.values().collect();
    numbers.sort_by(|a, b| a.number.cmp(&b.number));
    for account in numbers {
        println!(
            "  {} {:<35} lettrable: {}",
            account.number, account.name, account.is_reconcilable
        );
    }
    println!();

    let customers = accounts["customers"].id.clone();
    let sales = accounts["sales"].id.clone();
    let bank = accounts["bank"].id.clone();
    let day = |d: u32| NaiveDate::from_ymd_opt(2024, 3, d).ok_or("invalid date");

    // 2. Invoices and receipts
    println!("Posting invoices and receipts...");
    let invoices = [("FA01", 2, "150000"), ("FA02", 4, "89500"), ("FA03", 6, "240000")];
    for (id, d, amount) in invoices {
        let entry = patterns::customer_invoice(params(id, day(d)?, &customers, &sales, amount)?)?;
        ledger.post_entry(entry).await?;
        println!("  invoice {} for {} XOF", id, amount);
    }

    // The last customer pays in two instalments
    let receipts = [
        ("RC01", 15, "150000"),
        ("RC02", 18, "89499.50"),
        ("RC03", 22, "100000"),
        ("RC04", 28, "140000"),
    ];
    for (id, d, amount) in receipts {
        let entry = patterns::customer_receipt(params(id, day(d)?, &customers, &bank, amount)?)?;
        ledger.post_entry(entry).await?;
        println!("  receipt {} for {} XOF", id, amount);
    }
    println!();

    // 3. Automatic lettrage
    println!("Running automatic lettrage...");
    let report = ledger
        .process_automatic_reconciliation(
            &AutomaticReconciliationRequest::for_company(COMPANY)
                .algorithm(MatchingAlgorithm::Cascade),
        )
        .await?;
    for group in &report.groups {
        println!(
            "  {} -> {:?} (residual {})",
            group.code, group.line_ids, group.net_amount
        );
    }
    println!(
        "  {} pairs, {} XOF lettered, automation rate {:.1}% in {:?}",
        report.statistics.automatic_matches,
        report.statistics.amount_reconciled,
        report.automation_rate,
        report.processing_time
    );
    println!();

    // 4. Manual lettrage of the split payment
    println!("Lettering the split payment by hand...");
    let open: Vec<String> = ledger
        .get_open_items(&customers)
        .await?
        .into_iter()
        .map(|line| line.id)
        .collect();
    let manual = ledger.manual_reconcile(&open, "comptable").await?;
    println!(
        "  {} lines under {} (balance {})",
        manual.lines_count, manual.reconciliation_code, manual.balance
    );

    let summary = ledger.reconciliation_summary(&customers).await?;
    println!(
        "\nCustomers: {} lines lettered, {} open",
        summary.reconciled_lines, summary.unreconciled_lines
    );

    println!("\nReport as JSON:");
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
