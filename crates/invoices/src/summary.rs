//! Per-currency spend aggregation
//!
//! Pure functions over the cached working set. Recomputed on every cache
//! change rather than maintained incrementally, so the numbers can never
//! drift from the records they describe.

use serde::Serialize;
use std::collections::HashMap;

use crate::models::Invoice;

/// Spend in one currency
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrencyTotal {
    pub currency: String,
    /// Sum of `total_amount`, missing amounts counted as zero
    pub total: f64,
    /// Number of invoices in this currency
    pub count: usize,
}

/// Aggregated view of the working set
#[derive(Debug, Clone, Default, Serialize)]
pub struct SpendingSummary {
    /// Per-currency totals, largest spend first
    pub totals: Vec<CurrencyTotal>,
    pub total_invoices: usize,
    pub distinct_currencies: usize,
    /// Invoices with a known vendor name
    pub vendors_known: usize,
}

/// Group invoices by currency and sum their amounts.
///
/// Invoices without a currency count under "USD"; totals are sorted
/// descending, ties keeping first-encountered currency order.
pub fn summarize(invoices: &[Invoice]) -> SpendingSummary {
    let mut totals: Vec<CurrencyTotal> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for invoice in invoices {
        let currency = if invoice.currency.is_empty() {
            "USD"
        } else {
            invoice.currency.as_str()
        };
        let amount = invoice.total_amount.unwrap_or(0.0);

        match index.get(currency) {
            Some(&i) => {
                totals[i].total += amount;
                totals[i].count += 1;
            }
            None => {
                index.insert(currency, totals.len());
                totals.push(CurrencyTotal {
                    currency: currency.to_string(),
                    total: amount,
                    count: 1,
                });
            }
        }
    }

    totals.sort_by(|a, b| b.total.total_cmp(&a.total));

    SpendingSummary {
        distinct_currencies: totals.len(),
        total_invoices: invoices.len(),
        vendors_known: invoices
            .iter()
            .filter(|i| i.vendor_name.as_deref().is_some_and(|v| !v.is_empty()))
            .count(),
        totals,
    }
}

/// Format an amount with its currency symbol, two decimals
pub fn format_amount(amount: f64, currency: &str) -> String {
    let symbol = match currency {
        "USD" => "$".to_string(),
        "EUR" => "\u{20ac}".to_string(),
        "GBP" => "\u{a3}".to_string(),
        "INR" => "\u{20b9}".to_string(),
        "JPY" => "\u{a5}".to_string(),
        other => format!("{} ", other),
    };
    format!("{}{:.2}", symbol, amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_invoice(id: i64, currency: &str, amount: Option<f64>) -> Invoice {
        let mut builder = Invoice::builder(id).currency(currency);
        if let Some(amount) = amount {
            builder = builder.total_amount(amount);
        }
        builder.build()
    }

    #[test]
    fn test_groups_and_sorts_by_total() {
        let invoices = vec![
            make_invoice(1, "USD", Some(10.0)),
            make_invoice(2, "USD", None),
            make_invoice(3, "EUR", Some(5.0)),
        ];

        let summary = summarize(&invoices);
        assert_eq!(
            summary.totals,
            vec![
                CurrencyTotal {
                    currency: "USD".to_string(),
                    total: 10.0,
                    count: 2
                },
                CurrencyTotal {
                    currency: "EUR".to_string(),
                    total: 5.0,
                    count: 1
                },
            ]
        );
        assert_eq!(summary.total_invoices, 3);
        assert_eq!(summary.distinct_currencies, 2);
    }

    #[test]
    fn test_counts_law() {
        let invoices = vec![
            make_invoice(1, "USD", Some(1.0)),
            make_invoice(2, "EUR", Some(2.0)),
            make_invoice(3, "GBP", Some(3.0)),
            make_invoice(4, "EUR", Some(4.0)),
        ];

        let summary = summarize(&invoices);
        let counted: usize = summary.totals.iter().map(|t| t.count).sum();
        assert_eq!(counted, summary.total_invoices);

        let summed: f64 = summary.totals.iter().map(|t| t.total).sum();
        assert_eq!(summed, 10.0);
    }

    #[test]
    fn test_empty_currency_counts_as_usd() {
        let invoices = vec![
            make_invoice(1, "", Some(7.0)),
            make_invoice(2, "USD", Some(3.0)),
        ];

        let summary = summarize(&invoices);
        assert_eq!(summary.totals.len(), 1);
        assert_eq!(summary.totals[0].currency, "USD");
        assert_eq!(summary.totals[0].total, 10.0);
    }

    #[test]
    fn test_tie_keeps_first_encountered_order() {
        let invoices = vec![
            make_invoice(1, "JPY", Some(5.0)),
            make_invoice(2, "EUR", Some(5.0)),
        ];

        let summary = summarize(&invoices);
        assert_eq!(summary.totals[0].currency, "JPY");
        assert_eq!(summary.totals[1].currency, "EUR");
    }

    #[test]
    fn test_vendors_known() {
        let with_vendor = Invoice::builder(1).vendor_name("Acme").build();
        let empty_vendor = Invoice::builder(2).vendor_name("").build();
        let without_vendor = Invoice::builder(3).build();

        let summary = summarize(&[with_vendor, empty_vendor, without_vendor]);
        assert_eq!(summary.vendors_known, 1);
    }

    #[test]
    fn test_empty_set() {
        let summary = summarize(&[]);
        assert!(summary.totals.is_empty());
        assert_eq!(summary.total_invoices, 0);
        assert_eq!(summary.vendors_known, 0);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(10.0, "USD"), "$10.00");
        assert_eq!(format_amount(5.5, "EUR"), "\u{20ac}5.50");
        assert_eq!(format_amount(2.0, "CHF"), "CHF 2.00");
    }
}
