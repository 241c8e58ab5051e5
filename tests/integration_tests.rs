//! Integration tests for lettrage-core

use lettrage_core::{
    patterns,
    utils::{EnhancedAccountValidator, EnhancedEntryValidator, MemoryStorage},
    AutomaticReconciliationRequest, FixedClock, JournalEntryBuilder, Ledger, LedgerError,
    LedgerStorage, MatchingAlgorithm, ReconciliationConfig, ThirdPartyEntryParams,
};
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::str::FromStr;

const COMPANY: &str = "acme";

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, d).unwrap()
}

fn amount(raw: &str) -> BigDecimal {
    BigDecimal::from_str(raw).unwrap()
}

fn params(
    id: &str,
    day: NaiveDate,
    third_party: &str,
    counterpart: &str,
    value: &str,
) -> ThirdPartyEntryParams {
    ThirdPartyEntryParams {
        id: id.to_string(),
        company_id: COMPANY.to_string(),
        date: day,
        description: format!("Piece {}", id),
        reference: None,
        third_party_account_id: third_party.to_string(),
        counterpart_account_id: counterpart.to_string(),
        amount: amount(value),
    }
}

fn fixed_ledger(storage: MemoryStorage) -> Ledger<MemoryStorage, FixedClock> {
    let clock = FixedClock::new(date(12, 31).and_hms_opt(23, 0, 0).unwrap());
    Ledger::with_reconciliation(storage, clock, ReconciliationConfig::default()).unwrap()
}

#[tokio::test]
async fn test_complete_lettrage_workflow() {
    let storage = MemoryStorage::new();
    let mut ledger = fixed_ledger(storage.clone());
    let chart = ledger.setup_standard_chart_of_accounts(COMPANY).await.unwrap();
    let customers = chart["customers"].id.clone();
    let suppliers = chart["suppliers"].id.clone();
    let sales = chart["sales"].id.clone();
    let purchases = chart["purchases"].id.clone();
    let bank = chart["bank"].id.clone();

    // Customer side: two invoices settled, one settled with a rounding gap,
    // one still open
    for (id, day, value) in [
        ("vt1", date(1, 5), "1180"),
        ("vt2", date(1, 9), "590"),
        ("vt3", date(1, 12), "2360.40"),
        ("vt4", date(2, 1), "75"),
    ] {
        ledger
            .post_entry(
                patterns::customer_invoice(params(id, day, &customers, &sales, value)).unwrap(),
            )
            .await
            .unwrap();
    }
    for (id, day, value) in [
        ("bq1", date(1, 20), "1180"),
        ("bq2", date(1, 25), "590"),
        ("bq3", date(1, 30), "2360"),
    ] {
        ledger
            .post_entry(
                patterns::customer_receipt(params(id, day, &customers, &bank, value)).unwrap(),
            )
            .await
            .unwrap();
    }

    // Supplier side: one invoice paid
    ledger
        .post_entry(
            patterns::supplier_invoice(params("ach1", date(1, 7), &suppliers, &purchases, "800")).unwrap(),
        )
        .await
        .unwrap();
    ledger
        .post_entry(
            patterns::supplier_payment(params("bq4", date(2, 7), &suppliers, &bank, "800")).unwrap(),
        )
        .await
        .unwrap();

    let report = ledger
        .process_automatic_reconciliation(&AutomaticReconciliationRequest::for_company(COMPANY))
        .await
        .unwrap();

    let stats = &report.statistics;
    assert_eq!(report.algorithm, MatchingAlgorithm::FirstMatch);
    assert_eq!(stats.lines_processed, 9);
    assert_eq!(stats.automatic_matches, 4);
    assert_eq!(stats.lines_reconciled, 8);
    assert_eq!(stats.amount_reconciled, amount("4930.40"));
    assert!(stats.failed_matches.is_empty());
    assert!((report.automation_rate - 800.0 / 9.0).abs() < 1e-9);

    // Every pair cancels within tolerance and shares one code
    let tolerance = ledger.reconciliation_config().tolerance.clone();
    let mut codes = HashSet::new();
    for group in &report.groups {
        assert!(group.net_amount.abs() <= tolerance);
        let lines = storage.get_lines(&group.line_ids).await.unwrap();
        assert_eq!(lines.len(), 2);
        let net: BigDecimal = lines.iter().map(|l| l.signed_amount()).sum();
        assert!(net.abs() <= tolerance);
        for line in &lines {
            assert!(line.is_reconciled);
            assert_eq!(line.reconciliation_code.as_deref(), Some(group.code.as_str()));
            assert_eq!(line.reconciliation_date, Some(date(12, 31)));
        }
        assert!(codes.insert(group.code.clone()));
    }

    // Only the last invoice is left open
    let open = ledger.get_open_items(&customers).await.unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].entry_id, "vt4");

    // A second run is a no-op
    let again = ledger
        .process_automatic_reconciliation(&AutomaticReconciliationRequest::for_company(COMPANY))
        .await
        .unwrap();
    assert_eq!(again.statistics.automatic_matches, 0);
    assert_eq!(again.statistics.lines_processed, 1);
}

#[tokio::test]
async fn test_pair_scenario_reaches_full_automation() {
    let mut ledger = fixed_ledger(MemoryStorage::new());
    let chart = ledger.setup_standard_chart_of_accounts(COMPANY).await.unwrap();
    let customers = chart["customers"].id.clone();

    ledger
        .post_entry(
            patterns::customer_invoice(params("vt1", date(3, 1), &customers, &chart["sales"].id, "100")).unwrap(),
        )
        .await
        .unwrap();
    ledger
        .post_entry(
            patterns::customer_receipt(params("bq1", date(3, 2), &customers, &chart["bank"].id, "100")).unwrap(),
        )
        .await
        .unwrap();

    let report = ledger
        .process_automatic_reconciliation(
            &AutomaticReconciliationRequest::for_company(COMPANY).account(customers.clone()),
        )
        .await
        .unwrap();

    assert_eq!(report.statistics.automatic_matches, 1);
    assert_eq!(report.automation_rate, 100.0);
}

#[tokio::test]
async fn test_split_payment_needs_manual_lettrage() {
    let mut ledger = fixed_ledger(MemoryStorage::new());
    let chart = ledger.setup_standard_chart_of_accounts(COMPANY).await.unwrap();
    let customers = chart["customers"].id.clone();
    let bank = chart["bank"].id.clone();

    ledger
        .post_entry(
            patterns::customer_invoice(params("vt1", date(3, 1), &customers, &chart["sales"].id, "100")).unwrap(),
        )
        .await
        .unwrap();
    ledger
        .post_entry(
            patterns::customer_receipt(params("bq1", date(3, 5), &customers, &bank, "40")).unwrap(),
        )
        .await
        .unwrap();
    ledger
        .post_entry(
            patterns::customer_receipt(params("bq2", date(3, 9), &customers, &bank, "60")).unwrap(),
        )
        .await
        .unwrap();

    let report = ledger
        .process_automatic_reconciliation(&AutomaticReconciliationRequest::for_company(COMPANY))
        .await
        .unwrap();
    assert_eq!(report.statistics.automatic_matches, 0);

    let open: Vec<String> = ledger
        .get_open_items(&customers)
        .await
        .unwrap()
        .into_iter()
        .map(|line| line.id)
        .collect();
    assert_eq!(open.len(), 3);

    let result = ledger.manual_reconcile(&open, "aminata").await.unwrap();
    assert_eq!(result.lines_count, 3);
    assert_eq!(result.balance, BigDecimal::from(0));
    assert!(!result.reconciliation_code.is_empty());

    let summary = ledger.reconciliation_summary(&customers).await.unwrap();
    assert_eq!(summary.unreconciled_lines, 0);

    // Any already lettered line blocks a new manual lettrage
    let err = ledger.manual_reconcile(&open[..2], "aminata").await;
    assert!(matches!(err, Err(LedgerError::AlreadyReconciled(ids)) if ids.len() == 2));

    // Délettrage reopens everything
    ledger.unreconcile(&result.reconciliation_code).await.unwrap();
    assert_eq!(ledger.get_open_items(&customers).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_manual_pair_returns_literal_balance() {
    let mut ledger = fixed_ledger(MemoryStorage::new());
    let chart = ledger.setup_standard_chart_of_accounts(COMPANY).await.unwrap();
    let customers = chart["customers"].id.clone();

    ledger
        .post_entry(
            patterns::customer_invoice(params("vt1", date(4, 1), &customers, &chart["sales"].id, "250")).unwrap(),
        )
        .await
        .unwrap();
    ledger
        .post_entry(
            patterns::customer_receipt(params("bq1", date(4, 3), &customers, &chart["bank"].id, "245.50")).unwrap(),
        )
        .await
        .unwrap();

    let ids = vec!["vt1-L1".to_string(), "bq1-L2".to_string()];
    let result = ledger.manual_reconcile(&ids, "comptable").await.unwrap();
    assert_eq!(result.lines_count, 2);
    assert_eq!(result.balance, amount("4.50"));

    let group = ledger.get_reconciliation(&result.reconciliation_code).await.unwrap();
    assert_eq!(group.line_ids, ids);
    assert_eq!(group.reconciled_by.as_deref(), Some("comptable"));
}

#[tokio::test]
async fn test_fiscal_year_scope() {
    let mut ledger = fixed_ledger(MemoryStorage::new());
    let chart = ledger.setup_standard_chart_of_accounts(COMPANY).await.unwrap();
    let customers = chart["customers"].id.clone();
    let sales = chart["sales"].id.clone();
    let bank = chart["bank"].id.clone();

    ledger
        .create_fiscal_year(
            "fy2023".to_string(),
            COMPANY.to_string(),
            "Exercice 2023".to_string(),
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
        )
        .await
        .unwrap();
    ledger
        .create_fiscal_year(
            "fy2024".to_string(),
            COMPANY.to_string(),
            "Exercice 2024".to_string(),
            date(1, 1),
            date(12, 31),
        )
        .await
        .unwrap();

    let last_year = NaiveDate::from_ymd_opt(2023, 11, 15).unwrap();
    ledger
        .post_entry(
            patterns::customer_invoice(params("vt0", last_year, &customers, &sales, "300")).unwrap(),
        )
        .await
        .unwrap();
    ledger
        .post_entry(
            patterns::customer_invoice(params("vt1", date(2, 1), &customers, &sales, "120")).unwrap(),
        )
        .await
        .unwrap();
    ledger
        .post_entry(
            patterns::customer_receipt(params("bq0", date(1, 10), &customers, &bank, "300")).unwrap(),
        )
        .await
        .unwrap();
    ledger
        .post_entry(
            patterns::customer_receipt(params("bq1", date(2, 15), &customers, &bank, "120")).unwrap(),
        )
        .await
        .unwrap();

    // Within 2024 only the 120 pair is visible; the 300 receipt has no
    // counterpart inside the year
    let report = ledger
        .process_automatic_reconciliation(
            &AutomaticReconciliationRequest::for_company(COMPANY).fiscal_year("fy2024"),
        )
        .await
        .unwrap();
    assert_eq!(report.statistics.lines_processed, 3);
    assert_eq!(report.statistics.automatic_matches, 1);
    assert_eq!(report.statistics.amount_reconciled, BigDecimal::from(120));

    // Without the filter the cross-year pair is found
    let report = ledger
        .process_automatic_reconciliation(&AutomaticReconciliationRequest::for_company(COMPANY))
        .await
        .unwrap();
    assert_eq!(report.statistics.automatic_matches, 1);
    assert_eq!(report.statistics.amount_reconciled, BigDecimal::from(300));

    // Unknown or foreign fiscal years are rejected
    let err = ledger
        .process_automatic_reconciliation(
            &AutomaticReconciliationRequest::for_company("globex").fiscal_year("fy2024"),
        )
        .await;
    assert!(matches!(err, Err(LedgerError::FiscalYearNotFound(_))));
}

#[tokio::test]
async fn test_closing_year_blocks_posting() {
    let mut ledger = fixed_ledger(MemoryStorage::new());
    let chart = ledger.setup_standard_chart_of_accounts(COMPANY).await.unwrap();
    ledger
        .create_fiscal_year(
            "fy2024".to_string(),
            COMPANY.to_string(),
            "Exercice 2024".to_string(),
            date(1, 1),
            date(12, 31),
        )
        .await
        .unwrap();
    ledger.close_fiscal_year("fy2024").await.unwrap();

    let entry = patterns::customer_invoice(params(
        "vt1",
        date(6, 1),
        &chart["customers"].id,
        &chart["sales"].id,
        "10",
    ))
    .unwrap();
    assert!(ledger.post_entry(entry).await.is_err());

    // The draft stays and can be removed
    assert!(ledger.get_entry("vt1").await.unwrap().is_some());
    ledger.delete_entry("vt1").await.unwrap();
}

#[tokio::test]
async fn test_entry_validation_with_enhanced_validators() {
    let storage = MemoryStorage::new();
    let mut ledger = Ledger::with_validators(
        storage,
        Box::new(EnhancedAccountValidator),
        Box::new(EnhancedEntryValidator),
    );

    let bad_account = ledger
        .create_account(
            "x".to_string(),
            COMPANY.to_string(),
            "4A1".to_string(),
            "Clients".to_string(),
        )
        .await;
    assert!(bad_account.is_err());

    let customers = ledger
        .create_account(
            "c".to_string(),
            COMPANY.to_string(),
            "411000".to_string(),
            "Clients".to_string(),
        )
        .await
        .unwrap();
    let sales = ledger
        .create_account(
            "s".to_string(),
            COMPANY.to_string(),
            "701000".to_string(),
            "Ventes".to_string(),
        )
        .await
        .unwrap();

    let bad_journal = JournalEntryBuilder::new(
        "e1".to_string(),
        COMPANY.to_string(),
        "V T".to_string(),
        date(5, 5),
        "Vente".to_string(),
    )
    .debit(customers.id.clone(), "Client".to_string(), BigDecimal::from(10))
    .credit(sales.id.clone(), "Vente".to_string(), BigDecimal::from(10))
    .build()
    .unwrap();
    assert!(ledger.record_entry(bad_journal).await.is_err());

    let unbalanced = JournalEntryBuilder::new(
        "e2".to_string(),
        COMPANY.to_string(),
        "VT".to_string(),
        date(5, 5),
        "Vente".to_string(),
    )
    .debit(customers.id.clone(), "Client".to_string(), BigDecimal::from(10))
    .credit(sales.id.clone(), "Vente".to_string(), BigDecimal::from(9))
    .build();
    assert!(unbalanced.is_err());
}

#[tokio::test]
async fn test_report_serializes_to_json() {
    let mut ledger = fixed_ledger(MemoryStorage::new());
    let chart = ledger.setup_standard_chart_of_accounts(COMPANY).await.unwrap();
    let customers = chart["customers"].id.clone();
    ledger
        .post_entry(
            patterns::customer_invoice(params("vt1", date(3, 1), &customers, &chart["sales"].id, "100")).unwrap(),
        )
        .await
        .unwrap();
    ledger
        .post_entry(
            patterns::customer_receipt(params("bq1", date(3, 2), &customers, &chart["bank"].id, "100")).unwrap(),
        )
        .await
        .unwrap();

    let report = ledger
        .process_automatic_reconciliation(
            &AutomaticReconciliationRequest::for_company(COMPANY)
                .algorithm(MatchingAlgorithm::ClosestMatch),
        )
        .await
        .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["algorithm"], "ClosestMatch");
    assert_eq!(json["statistics"]["automatic_matches"], 1);
    assert!(json["statistics"]["per_algorithm"]["ClosestMatch"].is_object());
}
