//! E2E tests for the gifts, summary, estate, validate and schema commands

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::process::{Command, Output};
use std::str::FromStr;

fn ihtc(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ihtc"))
        .args(args)
        .output()
        .expect("Failed to execute command")
}

fn json(output: &Output) -> serde_json::Value {
    assert!(output.status.success(), "Command failed: {:?}", output);
    serde_json::from_slice(&output.stdout).expect("Invalid JSON output")
}

/// Decimals are serialized as strings
fn decimal(value: &serde_json::Value) -> Decimal {
    match value {
        serde_json::Value::String(s) => Decimal::from_str(s).expect("Invalid decimal"),
        serde_json::Value::Number(n) => Decimal::from_str(&n.to_string()).expect("Invalid decimal"),
        other => panic!("Expected a decimal, got {other}"),
    }
}

#[test]
fn gifts_table_shows_allocations_and_relief() {
    let output = ihtc(&["gifts", "-g", "tests/data/gifts.csv", "--as-of", "2024-07-01"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout.contains("Alice"));
    assert!(stdout.contains("Annual exemption £3,000.00"));
    assert!(stdout.contains("60% relief"));
    assert!(stdout.contains("£320.00"));
    assert!(stdout.contains("Spouse exemption"));
    assert!(stdout.contains("Small gifts exemption"));
    assert!(stdout.contains("Wedding exemption £2,500.00"));
}

#[test]
fn gifts_json_allocates_each_gift() {
    let output = ihtc(&[
        "gifts",
        "-g",
        "tests/data/gifts.csv",
        "--as-of",
        "2024-07-01",
        "--json",
    ]);
    let gifts = json(&output);
    let gifts = gifts.as_array().expect("Expected an array");

    assert_eq!(gifts.len(), 4);
    assert_eq!(gifts[0]["gift"]["id"], "g1");
    assert_eq!(decimal(&gifts[0]["allocation"]["taxable_amount"]), dec!(2000));
    assert_eq!(gifts[0]["taper"]["band"], "Relief60");
    for exempt in &gifts[1..] {
        assert_eq!(decimal(&exempt["allocation"]["taxable_amount"]), dec!(0));
    }
}

#[test]
fn gifts_csv_output_filtered_by_year() {
    let output = ihtc(&[
        "gifts",
        "-g",
        "tests/data/gifts.csv",
        "--as-of",
        "2024-07-01",
        "--year",
        "2024",
        "--csv",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout.starts_with("date,tax_year,recipient"));
    assert!(stdout.contains("Bob"));
    assert!(stdout.contains("Carol"));
    assert!(!stdout.contains("Alice"));
    assert!(!stdout.contains("Dan"));
}

#[test]
fn json_gift_book_uses_prior_year_carry_forward() {
    let output = ihtc(&[
        "gifts",
        "-g",
        "tests/data/gifts.json",
        "--as-of",
        "2024-07-01",
        "--json",
    ]);
    let gifts = json(&output);

    // 3,000 current year plus 2,000 brought forward
    assert_eq!(decimal(&gifts[0]["allocation"]["taxable_amount"]), dec!(3000));
    let warnings = gifts[1]["allocation"]["warnings"]
        .as_array()
        .expect("Expected warnings");
    assert!(warnings.iter().any(|w| w["type"] == "EvidenceRequired"));
}

#[test]
fn prior_year_flag_overrides_file() {
    let output = ihtc(&[
        "gifts",
        "-g",
        "tests/data/gifts.json",
        "--as-of",
        "2024-07-01",
        "--prior-year-used",
        "3000",
        "--json",
    ]);
    let gifts = json(&output);

    assert_eq!(decimal(&gifts[0]["allocation"]["taxable_amount"]), dec!(5000));
}

#[test]
fn summary_json_reports_exposure() {
    let output = ihtc(&[
        "summary",
        "-g",
        "tests/data/gifts.csv",
        "--as-of",
        "2024-07-01",
        "--json",
    ]);
    let summary = json(&output);

    for key in [
        "as_of",
        "gift_count",
        "total_gifts_last_7_years",
        "active_pet_count",
        "chargeable_pets_last_7_years",
        "potential_iht_if_death_today",
        "total_exempt",
        "years",
    ] {
        assert!(summary.get(key).is_some(), "missing key {key}");
    }
    assert_eq!(summary["gift_count"], 4);
    assert_eq!(summary["active_pet_count"], 1);
    assert_eq!(decimal(&summary["chargeable_pets_last_7_years"]), dec!(2000));
    assert_eq!(decimal(&summary["potential_iht_if_death_today"]), dec!(320));
    assert!(summary.get("estate").is_none());
}

#[test]
fn summary_with_estate_keeps_pets_separate_by_default() {
    let output = ihtc(&[
        "summary",
        "-g",
        "tests/data/gifts.csv",
        "-e",
        "tests/data/estate.json",
        "--as-of",
        "2024-07-01",
        "--json",
    ]);
    let summary = json(&output);

    assert_eq!(decimal(&summary["estate"]["net_tax_liability"]), dec!(70000));
    assert_eq!(decimal(&summary["estate"]["gift_tax_after_nrb"]), dec!(320));
    assert_eq!(decimal(&summary["total_iht"]), dec!(70320));
}

#[test]
fn summary_pets_can_consume_nil_rate_band() {
    let output = ihtc(&[
        "summary",
        "-g",
        "tests/data/gifts.csv",
        "-e",
        "tests/data/estate.json",
        "--pets",
        "consume-nil-rate-band",
        "--as-of",
        "2024-07-01",
        "--json",
    ]);
    let summary = json(&output);

    assert_eq!(decimal(&summary["estate"]["nrb_used_by_gifts"]), dec!(2000));
    assert_eq!(decimal(&summary["estate"]["chargeable_estate"]), dec!(177000));
    assert_eq!(decimal(&summary["estate"]["net_tax_liability"]), dec!(70800));
    // the 2,000 PET sits inside the nil-rate band and is not taxed again
    assert_eq!(decimal(&summary["estate"]["gift_tax_after_nrb"]), dec!(0));
    assert_eq!(decimal(&summary["total_iht"]), dec!(70800));
}

#[test]
fn estate_with_gifts_consuming_nil_rate_band() {
    let output = ihtc(&[
        "estate",
        "--net-estate",
        "500000",
        "-g",
        "tests/data/gifts.csv",
        "--pets",
        "consume-nil-rate-band",
        "--as-of",
        "2024-07-01",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout.contains("£2,000.00 used by gifts"));
    assert!(stdout.contains("IHT on gifts (after taper): £0.00"));
    // (500,000 - 323,000) at 40%
    assert!(stdout.contains("TOTAL IHT: £70,800.00"));
}

#[test]
fn summary_text_output() {
    let output = ihtc(&[
        "summary",
        "-g",
        "tests/data/gifts.csv",
        "-e",
        "tests/data/estate.json",
        "--as-of",
        "2024-07-01",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout.contains("IHT SUMMARY"));
    assert!(stdout.contains("2018/19"));
    assert!(stdout.contains("06/04/2018 - 05/04/2019"));
    assert!(stdout.contains("ESTATE LIABILITY"));
    assert!(stdout.contains("TOTAL IHT: £70,320.00"));
}

#[test]
fn estate_from_flags() {
    let output = ihtc(&[
        "estate",
        "--net-estate",
        "1000000",
        "--transferable-nrb",
        "325000",
        "--rnrb",
        "--as-of",
        "2025-01-01",
        "--json",
    ]);
    let estate = json(&output);

    assert_eq!(decimal(&estate["estate"]["chargeable_estate"]), dec!(175000));
    assert_eq!(decimal(&estate["estate"]["rate"]), dec!(0.40));
    assert_eq!(decimal(&estate["estate"]["net_tax_liability"]), dec!(70000));
}

#[test]
fn estate_charity_rate() {
    let output = ihtc(&[
        "estate",
        "--net-estate",
        "1000000",
        "--transferable-nrb",
        "325000",
        "--rnrb",
        "--charity-pct",
        "12",
        "--as-of",
        "2025-01-01",
        "--json",
    ]);
    let estate = json(&output);

    assert_eq!(decimal(&estate["estate"]["rate"]), dec!(0.36));
    assert_eq!(decimal(&estate["estate"]["net_tax_liability"]), dec!(63000));
}

#[test]
fn estate_from_file_text() {
    let output = ihtc(&["estate", "-e", "tests/data/estate.json", "--as-of", "2025-01-01"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout.contains("Net estate: £1,000,000.00"));
    assert!(stdout.contains("Nil-rate band: £650,000.00"));
    assert!(stdout.contains("Estate IHT: £70,000.00"));
}

#[test]
fn estate_rejects_out_of_range_percentage() {
    let output = ihtc(&[
        "estate",
        "--net-estate",
        "500000",
        "--transferable-nrb-pct",
        "150",
    ]);
    assert!(!output.status.success());
}

#[test]
fn validate_clean_book() {
    let output = ihtc(&["validate", "-g", "tests/data/gifts.csv", "--as-of", "2024-07-01"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout.contains("No issues found"));
}

#[test]
fn validate_reports_future_gift() {
    let output = ihtc(&[
        "validate",
        "-g",
        "tests/data/future_gift.csv",
        "--as-of",
        "2025-01-01",
        "--json",
    ]);

    assert_eq!(output.status.code(), Some(1));
    let result: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("Invalid JSON output");
    assert_eq!(result["issue_count"], 1);
    assert_eq!(result["issues"][0]["type"], "InvalidGift");
    assert_eq!(result["issues"][0]["id"], "f2");
}

#[test]
fn future_gift_fails_calculation() {
    let output = ihtc(&[
        "gifts",
        "-g",
        "tests/data/future_gift.csv",
        "--as-of",
        "2025-01-01",
    ]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("future"));
}

#[test]
fn schema_csv_header_matches_fixture() {
    let output = ihtc(&["schema", "csv-header"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let fixture = std::fs::read_to_string("tests/data/gifts.csv").expect("Missing fixture");

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert_eq!(stdout.trim(), fixture.lines().next().unwrap_or_default());
}

#[test]
fn schema_csv_fields_marks_required_columns() {
    let output = ihtc(&["schema", "csv-fields"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Command failed: {:?}", output);
    let line = |name: &str| {
        stdout
            .lines()
            .find(|l| l.starts_with(&format!("{name} ")))
            .unwrap_or_default()
            .to_string()
    };
    assert!(line("date").contains("(required)"));
    assert!(line("value").contains("(required)"));
    assert!(line("wedding_amount").contains("(optional)"));
    assert!(line("annual_exemption").contains("(optional)"));
}

#[test]
fn schema_json() {
    for format in ["json-schema", "estate-schema"] {
        let schema = json(&ihtc(&["schema", format]));
        assert!(schema.get("properties").is_some());
    }
}
