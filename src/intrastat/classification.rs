//! Default classification steps.

use log::{debug, warn};
use rust_decimal::Decimal;

use crate::core::*;

use super::eligibility::{
    consignment_of, intrastat_counterparty, intrastat_from_country, intrastat_to_country,
    shipment_of,
};
use super::pipeline::{IntrastatStep, RecomputeMode, StepContext};

/// Criteria used to look up the product tariff code.
pub fn tariff_code_pattern(move_: &StockMove, with_country: bool) -> TariffCodePattern {
    TariffCodePattern {
        date: move_.effective_date.or(move_.planned_date),
        country: if with_country {
            move_.intrastat.country.clone()
        } else {
            None
        },
    }
}

/// Quantity of `move_` expressed in `unit`.
///
/// Length moves of a product with a width are declared in surface: width
/// times length, in metres.
pub fn intrastat_quantity(
    store: &Store,
    move_: &StockMove,
    unit: &Uom,
) -> Result<Option<Decimal>, IntrastatError> {
    let converted = move_.unit.compute_qty(move_.quantity, unit, false);
    if converted.is_some_and(|quantity| !quantity.is_zero()) {
        return Ok(converted);
    }
    let product = store.product(move_.product)?;
    let meter = Uom::meter();
    if let (Some(width), Some(width_uom)) = (product.width, &product.width_uom) {
        if width_uom.category == move_.unit.category && move_.unit.category == meter.category {
            let width = width_uom.compute_qty(width, &meter, false);
            let length = move_.unit.compute_qty(move_.quantity, &meter, false);
            if let (Some(width), Some(length)) = (width, length) {
                return Ok(Some(width * length));
            }
        }
    }
    Ok(converted)
}

/// Nature of transaction code.
///
/// `31` consignment transfer, `21` return, `11` sale or purchase with a
/// VAT-registered counterparty, `12` without.
pub fn transaction_code(store: &Store, move_: &StockMove) -> Result<&'static str, IntrastatError> {
    if consignment_of(store, move_)?.is_some() {
        return Ok("31");
    }
    let returned = shipment_of(store, move_)?
        .is_some_and(|s| matches!(s.kind, ShipmentKind::InReturn | ShipmentKind::OutReturn));
    Ok(if returned {
        "21"
    } else if move_.intrastat.vat.is_some() {
        "11"
    } else {
        "12"
    })
}

/// Countries of both ends and the counterparty VAT identifier.
pub struct CounterpartyStep;

impl IntrastatStep for CounterpartyStep {
    fn name(&self) -> &'static str {
        "counterparty"
    }

    fn apply(&self, ctx: &StepContext<'_>, move_: &mut StockMove) -> Result<(), IntrastatError> {
        let from = intrastat_from_country(ctx.store, move_)?;
        let to = intrastat_to_country(ctx.store, move_)?;
        let (own, other) = match move_.intrastat.intrastat_type {
            Some(IntrastatType::Arrival) => (to, from),
            _ => (from, to),
        };
        let vat = match intrastat_counterparty(ctx.store, move_)? {
            Some(party) => ctx.store.party(party)?.eu_vat.clone(),
            None => None,
        };
        let fields = &mut move_.intrastat;
        ctx.assign(&mut fields.country, other);
        ctx.assign(&mut fields.warehouse_country, own);
        ctx.assign(&mut fields.vat, vat);
        Ok(())
    }
}

pub struct TransactionStep;

impl IntrastatStep for TransactionStep {
    fn name(&self) -> &'static str {
        "transaction"
    }

    fn apply(&self, ctx: &StepContext<'_>, move_: &mut StockMove) -> Result<(), IntrastatError> {
        let code = transaction_code(ctx.store, move_)?;
        ctx.assign(&mut move_.intrastat.transaction, Some(code.to_string()));
        Ok(())
    }
}

/// Product tariff code at the move date.
///
/// Assignments restricted to the counterparty country are preferred over
/// the others. On update a change of the product assignments after the move
/// was done is picked up.
pub struct TariffCodeStep;

impl IntrastatStep for TariffCodeStep {
    fn name(&self) -> &'static str {
        "tariff_code"
    }

    fn apply(&self, ctx: &StepContext<'_>, move_: &mut StockMove) -> Result<(), IntrastatError> {
        if ctx.mode == RecomputeMode::FillMissing && move_.intrastat.tariff_code.is_some() {
            return Ok(());
        }
        let product = ctx.store.product(move_.product)?;
        let found = product
            .get_tariff_code(&tariff_code_pattern(move_, true))
            .or_else(|| product.get_tariff_code(&tariff_code_pattern(move_, false)));
        match ctx.mode {
            RecomputeMode::Update => {
                if found != move_.intrastat.tariff_code {
                    debug!(
                        "move {}: tariff code {:?} -> {:?}",
                        move_.id, move_.intrastat.tariff_code, found
                    );
                    move_.intrastat.tariff_code = found;
                }
            }
            RecomputeMode::FillMissing => move_.intrastat.tariff_code = found,
        }
        Ok(())
    }
}

/// Supplementary quantity in the tariff code unit.
pub struct AdditionalUnitStep;

impl IntrastatStep for AdditionalUnitStep {
    fn name(&self) -> &'static str {
        "additional_unit"
    }

    fn apply(&self, ctx: &StepContext<'_>, move_: &mut StockMove) -> Result<(), IntrastatError> {
        if move_.intrastat.additional_unit.is_some() {
            return Ok(());
        }
        let Some(tariff_code) = move_.intrastat.tariff_code else {
            return Ok(());
        };
        let Some(unit) = &ctx.store.tariff_code(tariff_code)?.intrastat_uom else {
            return Ok(());
        };
        move_.intrastat.additional_unit = intrastat_quantity(ctx.store, move_, unit)?
            .map(|quantity| round_amount(quantity, ctx.config.additional_unit_digits));
        Ok(())
    }
}

/// Country the goods were made in: the product's, the company's for goods
/// produced in house, else the main supplier's.
pub struct OriginStep;

impl IntrastatStep for OriginStep {
    fn name(&self) -> &'static str {
        "country_of_origin"
    }

    fn apply(&self, ctx: &StepContext<'_>, move_: &mut StockMove) -> Result<(), IntrastatError> {
        let product = ctx.store.product(move_.product)?;
        let origin = if let Some(country) = &product.country_of_origin {
            Some(country.clone())
        } else if product.producible {
            ctx.store.company_country(move_.company)?
        } else if let Some(supplier) = product.suppliers.first() {
            ctx.store
                .party(*supplier)?
                .country_code()
                .map(str::to_string)
        } else {
            None
        };
        ctx.assign(&mut move_.intrastat.country_of_origin, origin);
        Ok(())
    }
}

/// Intrastat region of the company-side warehouse.
pub struct SubdivisionStep;

impl IntrastatStep for SubdivisionStep {
    fn name(&self) -> &'static str {
        "subdivision"
    }

    fn apply(&self, ctx: &StepContext<'_>, move_: &mut StockMove) -> Result<(), IntrastatError> {
        let dispatch = move_.intrastat.intrastat_type == Some(IntrastatType::Dispatch);
        let consignment_source = if dispatch {
            consignment_of(ctx.store, move_)?.and_then(|s| s.from_location)
        } else {
            None
        };
        let location = consignment_source.unwrap_or(if dispatch {
            move_.from_location
        } else {
            move_.to_location
        });
        let code = ctx
            .store
            .location_address(location)?
            .and_then(|address| address.subdivision.clone());
        let subdivision = code.and_then(|code| match ctx.store.intrastat_subdivision(&code) {
            Some(subdivision) => Some(subdivision.code.clone()),
            None => {
                warn!("move {}: subdivision {code} has no Intrastat code", move_.id);
                None
            }
        });
        ctx.assign(&mut move_.intrastat.subdivision, subdivision);
        Ok(())
    }
}

/// Shipment transport, else the configured default.
pub struct TransportStep;

impl IntrastatStep for TransportStep {
    fn name(&self) -> &'static str {
        "transport"
    }

    fn apply(&self, ctx: &StepContext<'_>, move_: &mut StockMove) -> Result<(), IntrastatError> {
        if move_.intrastat.transport.is_some() {
            return Ok(());
        }
        move_.intrastat.transport = shipment_of(ctx.store, move_)?
            .and_then(|s| s.intrastat_transport.clone())
            .or_else(|| ctx.config.default_transport.clone());
        Ok(())
    }
}

/// Incoterm of the order, else the counterparty's only default, else the
/// consignment incoterm.
pub struct IncotermStep;

impl IncotermStep {
    fn from_origin(store: &Store, move_: &StockMove) -> Result<Option<Incoterm>, IntrastatError> {
        Ok(match move_.origin {
            Some(MoveOrigin::SaleLine(line)) => {
                store.sale(store.sale_line(line)?.sale)?.incoterm.clone()
            }
            Some(MoveOrigin::PurchaseLine(line)) => store
                .purchase(store.purchase_line(line)?.purchase)?
                .incoterm
                .clone(),
            None => None,
        })
    }

    fn from_party(store: &Store, move_: &StockMove) -> Result<Option<Incoterm>, IntrastatError> {
        let Some(shipment) = shipment_of(store, move_)? else {
            return Ok(None);
        };
        let Some(party) = shipment.party else {
            return Ok(None);
        };
        let party = store.party(party)?;
        let defaults = if shipment.kind.with_supplier() {
            &party.purchase_incoterms
        } else if shipment.kind.with_customer() {
            &party.sale_incoterms
        } else {
            return Ok(None);
        };
        Ok(match defaults.as_slice() {
            [only] => Some(only.incoterm.clone()),
            _ => None,
        })
    }
}

impl IntrastatStep for IncotermStep {
    fn name(&self) -> &'static str {
        "incoterm"
    }

    fn apply(&self, ctx: &StepContext<'_>, move_: &mut StockMove) -> Result<(), IntrastatError> {
        if move_.intrastat.incoterm.is_some() {
            return Ok(());
        }
        let mut incoterm = Self::from_origin(ctx.store, move_)?;
        if incoterm.is_none() {
            incoterm = Self::from_party(ctx.store, move_)?;
        }
        if incoterm.is_none() && consignment_of(ctx.store, move_)?.is_some() {
            incoterm = ctx.config.internal_incoterm.clone();
        }
        move_.intrastat.incoterm = incoterm;
        Ok(())
    }
}

/// Statistical value, computed for every move.
pub struct ValueStep;

impl IntrastatStep for ValueStep {
    fn name(&self) -> &'static str {
        "value"
    }

    fn runs_undeclared(&self) -> bool {
        true
    }

    fn apply(&self, ctx: &StepContext<'_>, move_: &mut StockMove) -> Result<(), IntrastatError> {
        if ctx.mode == RecomputeMode::FillMissing && move_.intrastat.value.is_some() {
            return Ok(());
        }
        let value = ctx.valuation.intrastat_value(ctx.store, move_)?;
        ctx.assign(&mut move_.intrastat.value, value);
        Ok(())
    }
}
