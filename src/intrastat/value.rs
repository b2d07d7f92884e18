//! Statistical value of a move.
//!
//! Sources, by priority:
//!
//! 1. the price list of a consignment transfer (exclusive);
//! 2. posted invoices billing exactly the moved quantity in the move month;
//! 3. the move unit price, net of landed costs when the shipment carries some;
//! 4. the product cost price.
//!
//! Every amount is converted into the company's declaration currency and
//! rounded half-to-even at the conversion boundary.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;

use crate::core::*;

use super::config::IntrastatConfig;
use super::discount::{AmountProvider, get_invoice_intrastat_discount_per_line};
use super::eligibility::consignment_of;

/// Reports whether landed costs were allocated to a shipment.
pub trait LandedCostProvider: Send + Sync {
    fn has_landed_cost(&self, shipment: ShipmentId) -> bool;
}

/// Landed cost lookup backed by a set of shipments.
#[derive(Debug, Clone, Default)]
pub struct LandedCostRegistry {
    shipments: BTreeSet<ShipmentId>,
}

impl LandedCostRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that landed costs were posted on `shipment`.
    pub fn register(&mut self, shipment: ShipmentId) {
        self.shipments.insert(shipment);
    }
}

impl LandedCostProvider for LandedCostRegistry {
    fn has_landed_cost(&self, shipment: ShipmentId) -> bool {
        self.shipments.contains(&shipment)
    }
}

/// Everything the value computation depends on besides the store.
#[derive(Clone, Copy)]
pub struct Valuation<'a> {
    pub config: &'a IntrastatConfig,
    pub amounts: &'a dyn AmountProvider,
    pub landed_cost: Option<&'a dyn LandedCostProvider>,
}

impl Valuation<'_> {
    /// Round to the value digits and pad to them, so `1900` reads `1900.00`.
    fn round_value(&self, value: Decimal) -> Decimal {
        let mut value = round_amount(value, self.config.value_digits);
        value.rescale(self.config.value_digits);
        value
    }

    fn convert(
        &self,
        store: &Store,
        from: &str,
        amount: Decimal,
        to: &str,
        date: Option<NaiveDate>,
    ) -> Option<Decimal> {
        let converted = if from == to {
            Some(amount)
        } else {
            date.and_then(|date| store.currencies.compute(from, amount, to, date, false))
        };
        converted.map(|value| self.round_value(value))
    }

    /// Value from the price list of a consignment transfer.
    fn price_list_value(
        &self,
        store: &Store,
        move_: &StockMove,
        price_list: PriceListId,
    ) -> Result<Option<Decimal>, IntrastatError> {
        let product = store.product(move_.product)?;
        let list = store.price_list(price_list)?;
        let Some(unit_price) = list.compute(product, move_.quantity, &move_.unit, move_.date())
        else {
            debug!("move {}: price list {price_list} has no price", move_.id);
            return Ok(None);
        };
        let unit_price = round_amount(unit_price, self.config.price_digits);
        Ok(Some(self.round_value(unit_price * move_.quantity)))
    }

    /// Value from the move unit price, net of landed costs.
    fn price_value(&self, store: &Store, move_: &StockMove, target: &str) -> Decimal {
        let Some(currency) = move_.currency.as_deref() else {
            return Decimal::ZERO;
        };
        let Some(mut unit_price) = move_.unit_price else {
            debug!("move {}: no unit price", move_.id);
            return Decimal::ZERO;
        };
        let landed = match (self.landed_cost, move_.shipment) {
            (Some(provider), Some(shipment)) => provider.has_landed_cost(shipment),
            _ => false,
        };
        if landed {
            unit_price -= move_.unit_landed_cost.unwrap_or_default();
        }
        self.convert(
            store,
            currency,
            unit_price * move_.quantity,
            target,
            move_.date(),
        )
        .unwrap_or_else(|| {
            warn!("move {}: no rate from {currency} to {target}, value set to zero", move_.id);
            Decimal::ZERO
        })
    }

    /// Value from the posted invoices billing the move.
    fn invoice_value(
        &self,
        store: &Store,
        move_: &StockMove,
        company: &Company,
        target: &str,
    ) -> Result<Decimal, IntrastatError> {
        let mut invoices = Vec::new();
        let mut quantity = Decimal::ZERO;
        for id in &move_.invoice_lines {
            let line = store.invoice_line(*id)?;
            if line.quantity > Decimal::ZERO {
                quantity += line.quantity;
            }
            if let Some(invoice) = line.invoice {
                if store.invoice(invoice)?.state.is_posted() && !invoices.contains(&invoice) {
                    invoices.push(invoice);
                }
            }
        }
        if invoices.is_empty() || quantity != move_.quantity {
            return Ok(Decimal::ZERO);
        }
        let Some(move_month) = move_.date().map(month_start) else {
            return Ok(Decimal::ZERO);
        };

        let per_line =
            get_invoice_intrastat_discount_per_line(store, self.config, self.amounts, &invoices)?;
        let mut total = Decimal::ZERO;
        let mut source = None;
        for (line_id, amount) in per_line {
            if !move_.invoice_lines.contains(&line_id) {
                continue;
            }
            let Some(invoice) = store.invoice_line(line_id)?.invoice else {
                continue;
            };
            let invoice = store.invoice(invoice)?;
            if invoice.reporting_date().map(month_start) != Some(move_month) {
                continue;
            }
            source.get_or_insert_with(|| self.amounts.currency(invoice, company).to_string());
            total += amount;
        }
        let source = source
            .or_else(|| move_.currency.clone())
            .unwrap_or_else(|| company.currency.clone());
        Ok(self
            .convert(store, &source, total, target, move_.date())
            .unwrap_or_else(|| {
                warn!(
                    "move {}: no rate from {source} to {target}, invoice value ignored",
                    move_.id
                );
                Decimal::ZERO
            }))
    }

    /// Statistical value of `move_` in the declaration currency.
    ///
    /// `None` only when a consignment price list yields no price.
    pub fn intrastat_value(
        &self,
        store: &Store,
        move_: &StockMove,
    ) -> Result<Option<Decimal>, IntrastatError> {
        if let Some(consignment) = consignment_of(store, move_)? {
            if let Some(price_list) = consignment.internal_price_list() {
                return self.price_list_value(store, move_, price_list);
            }
        }

        let company = store.company(move_.company)?;
        let target = company.declaration_currency();
        let product = store.product(move_.product)?;
        let fallback = self.round_value(product.cost_price);

        let from_invoices = self.invoice_value(store, move_, company, target)?;
        if !from_invoices.is_zero() {
            return Ok(Some(from_invoices));
        }
        let from_price = self.price_value(store, move_, target);
        if !from_price.is_zero() {
            return Ok(Some(from_price));
        }
        Ok(Some(fallback))
    }
}
