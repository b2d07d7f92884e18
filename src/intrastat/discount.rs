//! Spreading invoice discount lines over the goods lines they discount.

use std::collections::BTreeMap;

use log::{debug, warn};
use rust_decimal::Decimal;

use crate::core::*;

use super::config::IntrastatConfig;

/// Which amount of an invoice line is declared.
///
/// Chosen once when the engine is built: [`LineAmount`] reads the line amount
/// in the invoice currency, [`CompanyAmount`] the amount already converted to
/// the company currency.
pub trait AmountProvider: Send + Sync {
    /// Signed amount of `line` of `invoice`, in [`currency`](Self::currency).
    fn amount(
        &self,
        store: &Store,
        invoice: &Invoice,
        line: &InvoiceLine,
    ) -> Result<Decimal, IntrastatError>;

    /// Currency the amounts are expressed in.
    fn currency<'a>(&self, invoice: &'a Invoice, company: &'a Company) -> &'a str;
}

/// Line amount in the invoice currency.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineAmount;

impl AmountProvider for LineAmount {
    fn amount(
        &self,
        _store: &Store,
        _invoice: &Invoice,
        line: &InvoiceLine,
    ) -> Result<Decimal, IntrastatError> {
        Ok(line.amount)
    }

    fn currency<'a>(&self, invoice: &'a Invoice, _company: &'a Company) -> &'a str {
        &invoice.currency
    }
}

/// Line amount in the company currency.
///
/// Lines without a company amount are converted from the invoice currency at
/// the invoice reporting date; a missing rate counts as zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompanyAmount;

impl AmountProvider for CompanyAmount {
    fn amount(
        &self,
        store: &Store,
        invoice: &Invoice,
        line: &InvoiceLine,
    ) -> Result<Decimal, IntrastatError> {
        if let Some(amount) = line.company_amount {
            return Ok(amount);
        }
        let company = store.company(invoice.company)?;
        if invoice.currency.is_empty() || invoice.currency == company.currency {
            return Ok(line.amount);
        }
        let converted = invoice.reporting_date().and_then(|date| {
            store
                .currencies
                .compute(&invoice.currency, line.amount, &company.currency, date, false)
        });
        Ok(converted.unwrap_or_else(|| {
            warn!(
                "invoice line {}: no rate from {} to {}, amount ignored",
                line.id, invoice.currency, company.currency
            );
            Decimal::ZERO
        }))
    }

    fn currency<'a>(&self, _invoice: &'a Invoice, company: &'a Company) -> &'a str {
        &company.currency
    }
}

/// Amount of every goods line of `invoices`, with each invoice's discount
/// lines spread over its goods lines in proportion to their quantity.
///
/// Discount lines are the lines of the configured discount product; they do
/// not appear in the result. Without a discount product every line maps to
/// its plain amount. Invoices are processed oldest first, lines by
/// decreasing quantity.
pub fn get_invoice_intrastat_discount_per_line(
    store: &Store,
    config: &IntrastatConfig,
    amounts: &dyn AmountProvider,
    invoices: &[InvoiceId],
) -> Result<BTreeMap<InvoiceLineId, Decimal>, IntrastatError> {
    let mut sorted = invoices
        .iter()
        .map(|id| store.invoice(*id))
        .collect::<Result<Vec<_>, _>>()?;
    sorted.sort_by_key(|invoice| (invoice.invoice_date, invoice.id));
    sorted.dedup_by_key(|invoice| invoice.id);

    let mut result = BTreeMap::new();
    for invoice in sorted {
        let mut lines = invoice
            .lines
            .iter()
            .map(|id| store.invoice_line(*id))
            .collect::<Result<Vec<_>, _>>()?;
        lines.sort_by(|a, b| b.quantity.cmp(&a.quantity));

        let Some(discount_product) = config.discount_product else {
            for line in lines {
                result.insert(line.id, amounts.amount(store, invoice, line)?);
            }
            continue;
        };

        let mut discount = Decimal::ZERO;
        let mut total_quantity = Decimal::ZERO;
        let mut goods = Vec::new();
        for line in lines {
            if line.product == Some(discount_product) {
                discount += amounts.amount(store, invoice, line)?;
            } else {
                total_quantity += line.quantity;
                let amount = amounts.amount(store, invoice, line)?;
                goods.push((line.id, line.quantity, amount));
            }
        }
        let spread = !discount.is_zero() && !total_quantity.is_zero();
        if spread {
            debug!(
                "invoice {}: spreading discount {discount} over quantity {total_quantity}",
                invoice.id
            );
        }
        for (id, quantity, amount) in goods {
            let share = if spread {
                quantity * discount / total_quantity
            } else {
                Decimal::ZERO
            };
            result.insert(id, amount + share);
        }
    }
    Ok(result)
}
