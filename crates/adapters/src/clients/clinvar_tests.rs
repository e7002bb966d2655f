// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const SUMMARY: &str = "#AlleleID\tGeneSymbol\tClinicalSignificance\tReviewStatus\n\
15041\tBRCA1\tPathogenic\tcriteria provided, multiple submitters\n\
15042\tBRCA2\tBenign\tno assertion criteria provided\n\
15043\t-\t-\t-\n";

#[test]
fn parses_rows_keyed_by_allele_id() {
    let records = parse_variant_summary(SUMMARY.as_bytes()).unwrap();
    assert_eq!(records.len(), 3);

    let brca1 = &records["15041"];
    assert_eq!(brca1.gene_symbol.as_deref(), Some("BRCA1"));
    assert_eq!(brca1.clinical_significance.as_deref(), Some("Pathogenic"));
    assert_eq!(
        brca1.review_status.as_deref(),
        Some("criteria provided, multiple submitters")
    );
}

#[test]
fn dash_fields_become_none() {
    let records = parse_variant_summary(SUMMARY.as_bytes()).unwrap();
    let sparse = &records["15043"];
    assert!(sparse.gene_symbol.is_none());
    assert!(sparse.clinical_significance.is_none());
    assert!(sparse.review_status.is_none());
}

#[test]
fn empty_summary_is_invalid() {
    assert!(parse_variant_summary(b"").is_err());
}

#[test]
fn missing_allele_id_column_is_invalid() {
    let err = parse_variant_summary(b"#GeneSymbol\tReviewStatus\nBRCA1\tx\n").unwrap_err();
    assert!(matches!(err, ClientError::InvalidResponse(_)));
}

#[yare::parameterized(
    valid        = { 8, 2024, true },
    month_low    = { 0, 2024, false },
    month_high   = { 13, 2024, false },
    year_too_old = { 6, 2014, false },
    first_year   = { 1, 2015, true },
)]
fn date_validation(month: u32, year: i32, ok: bool) {
    assert_eq!(validate_variant_summary_date(month, year).is_ok(), ok);
}
