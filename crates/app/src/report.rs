//! Report
//!
//! Terminal tables for ingestion runs.

use std::io;

use nimbus::{canonical::TYPE_ATTRIBUTE, catalog::StoredProduct, pipeline::RunReport};
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style,
        object::{Columns, Rows},
    },
};

const SHORT_HASH_LEN: usize = 12;

/// Write one row per stored product with its latest price.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_products(mut out: impl io::Write, products: &[StoredProduct]) -> io::Result<()> {
    let mut builder = Builder::default();

    builder.push_record(["Region", "Service", "SKU", "Type", "Price", "Hash"]);

    for stored in products {
        let identity = &stored.identity;

        builder.push_record([
            identity.region.clone(),
            identity.service.clone(),
            identity.sku.clone(),
            identity
                .attributes
                .get(TYPE_ATTRIBUTE)
                .cloned()
                .unwrap_or_default(),
            latest_price(stored),
            short_hash(stored.product_hash.as_str()).to_string(),
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(4..5), Alignment::right());

    writeln!(out, "{table}")
}

/// Write the run summary and any rejected entries.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_summary(mut out: impl io::Write, report: &RunReport) -> io::Result<()> {
    let summary = &report.summary;
    let mut builder = Builder::default();

    for (label, value) in [
        ("Vendor", report.vendor.clone()),
        ("Effective from", report.effective_date_start.to_string()),
        ("Regions", report.regions.to_string()),
        ("Products", report.products.to_string()),
        ("Rejected", report.rejected.len().to_string()),
        ("Products inserted", summary.products_inserted.to_string()),
        ("Products matched", summary.products_matched.to_string()),
        ("Prices inserted", summary.prices_inserted.to_string()),
        ("Prices unchanged", summary.prices_unchanged.to_string()),
    ] {
        builder.push_record([label.to_string(), value]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Columns::first(), Color::BOLD);
    table.modify(Columns::new(1..2), Alignment::right());

    writeln!(out, "{table}")?;

    if report.rejected.is_empty() {
        return Ok(());
    }

    let mut builder = Builder::default();

    builder.push_record(["Region", "Category", "Name", "Reason"]);

    for rejected in &report.rejected {
        builder.push_record([
            rejected.region.clone(),
            rejected.category.to_string(),
            rejected.name.clone().unwrap_or_default(),
            rejected.error.to_string(),
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);

    writeln!(out, "{table}")
}

fn latest_price(stored: &StoredProduct) -> String {
    stored
        .prices
        .last()
        .map(|price| {
            let mut amounts: Vec<String> = price
                .quote()
                .amounts
                .iter()
                .map(|(code, amount)| format!("{amount} {code}/{}", price.unit()))
                .collect();

            amounts.sort_unstable();
            amounts.join(", ")
        })
        .unwrap_or_default()
}

fn short_hash(hash: &str) -> &str {
    hash.get(..SHORT_HASH_LEN).unwrap_or(hash)
}
