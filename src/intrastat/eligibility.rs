//! Whether a move is declared, and in which direction.
//!
//! Everything here is a pure read of the store: callers decide what to
//! persist.

use log::debug;

use crate::core::*;

use super::config::IntrastatConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum End {
    From,
    To,
}

/// Shipment the move belongs to.
pub(crate) fn shipment_of<'a>(
    store: &'a Store,
    move_: &StockMove,
) -> Result<Option<&'a Shipment>, IntrastatError> {
    move_.shipment.map(|id| store.shipment(id)).transpose()
}

/// Internal shipment carrying a price list: a consignment transfer declared
/// like a sale between two company warehouses.
pub(crate) fn consignment_of<'a>(
    store: &'a Store,
    move_: &StockMove,
) -> Result<Option<&'a Shipment>, IntrastatError> {
    Ok(shipment_of(store, move_)?.filter(|s| s.internal_price_list().is_some()))
}

/// Party of the sale or purchase the move was created from.
pub(crate) fn origin_party(
    store: &Store,
    move_: &StockMove,
) -> Result<Option<PartyId>, IntrastatError> {
    match move_.origin {
        Some(MoveOrigin::SaleLine(line)) => {
            let sale = store.sale(store.sale_line(line)?.sale)?;
            Ok(sale.party)
        }
        Some(MoveOrigin::PurchaseLine(line)) => {
            let purchase = store.purchase(store.purchase_line(line)?.purchase)?;
            Ok(purchase.party)
        }
        None => Ok(None),
    }
}

/// Country of the party invoice address.
pub(crate) fn party_country(
    store: &Store,
    party: Option<PartyId>,
) -> Result<Option<String>, IntrastatError> {
    match party {
        Some(party) => Ok(store.party(party)?.country_code().map(str::to_string)),
        None => Ok(None),
    }
}

fn shipment_country(shipment: &Shipment, end: End) -> Option<String> {
    match end {
        End::From => shipment.intrastat_from_country.clone(),
        End::To => shipment.intrastat_to_country.clone(),
    }
}

fn end_country(
    store: &Store,
    move_: &StockMove,
    location: LocationId,
    end: End,
) -> Result<Option<String>, IntrastatError> {
    let shipment = shipment_of(store, move_)?;
    if let Some(consignment) = shipment.filter(|s| s.internal_price_list().is_some()) {
        if let Some(country) = shipment_country(consignment, end) {
            return Ok(Some(country));
        }
    }
    if let Some(address) = store.location_address(location)? {
        return Ok(address.country_code.clone());
    }
    if !matches!(
        store.location(location)?.kind,
        LocationKind::Customer | LocationKind::Supplier
    ) {
        return Ok(None);
    }
    match shipment {
        Some(shipment) => {
            if let Some(country) = shipment_country(shipment, end) {
                return Ok(Some(country));
            }
            if let Some(country) = shipment
                .address
                .as_ref()
                .and_then(|a| a.country_code.clone())
            {
                return Ok(Some(country));
            }
            party_country(store, shipment.party)
        }
        None => {
            if let Some(MoveOrigin::SaleLine(line)) = move_.origin {
                let sale = store.sale(store.sale_line(line)?.sale)?;
                if let Some(country) = sale
                    .shipment_address
                    .as_ref()
                    .and_then(|a| a.country_code.clone())
                {
                    return Ok(Some(country));
                }
            }
            party_country(store, origin_party(store, move_)?)
        }
    }
}

/// Country the goods leave from.
pub fn intrastat_from_country(
    store: &Store,
    move_: &StockMove,
) -> Result<Option<String>, IntrastatError> {
    end_country(store, move_, move_.from_location, End::From)
}

/// Country the goods arrive in.
pub fn intrastat_to_country(
    store: &Store,
    move_: &StockMove,
) -> Result<Option<String>, IntrastatError> {
    end_country(store, move_, move_.to_location, End::To)
}

/// Whether a tax on a linked invoice line, or on the sale line the move
/// comes from, is configured as Intrastat exempt.
pub fn move_tax_intrastat_exempt(
    store: &Store,
    config: &IntrastatConfig,
    move_: &StockMove,
) -> Result<bool, IntrastatError> {
    if config.exempt_taxes.is_empty() {
        return Ok(false);
    }
    for line in &move_.invoice_lines {
        if store
            .invoice_line(*line)?
            .taxes
            .iter()
            .any(|tax| config.is_exempt(*tax))
        {
            return Ok(true);
        }
    }
    if let Some(MoveOrigin::SaleLine(line)) = move_.origin {
        if store
            .sale_line(line)?
            .taxes
            .iter()
            .any(|tax| config.is_exempt(*tax))
        {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Declaration direction of `move_`, `None` when the move is not declared.
pub fn intrastat_type(
    store: &Store,
    config: &IntrastatConfig,
    move_: &StockMove,
) -> Result<Option<IntrastatType>, IntrastatError> {
    let company = store.company(move_.company)?;
    if !company.intrastat {
        return Ok(None);
    }
    if let Some(shipment) = shipment_of(store, move_)? {
        if shipment.kind.is_internal()
            && (shipment.price_list.is_none() || !shipment.is_outgoing(move_))
        {
            debug!("move {}: internal transfer, not declared", move_.id);
            return Ok(None);
        }
    }

    let from_country = intrastat_from_country(store, move_)?;
    let to_country = intrastat_to_country(store, move_)?;
    let company_country = store.company_country(move_.company)?;
    if let (Some(from), Some(to), Some(own)) = (&from_country, &to_country, &company_country) {
        if from != own && to != own {
            debug!("move {}: {from} -> {to} does not touch {own}", move_.id);
            return Ok(None);
        }
    }

    if move_tax_intrastat_exempt(store, config, move_)? {
        debug!("move {}: exempt tax", move_.id);
        return Ok(None);
    }

    let (Some(from), Some(to), Some(date)) = (from_country, to_country, move_.date()) else {
        return Ok(None);
    };
    if from == to || !in_intrastat(&from, date) || !in_intrastat(&to, date) {
        return Ok(None);
    }
    if store.location(move_.from_location)?.warehouse.is_some() {
        Ok(Some(IntrastatType::Dispatch))
    } else if store.location(move_.to_location)?.warehouse.is_some() {
        Ok(Some(IntrastatType::Arrival))
    } else {
        Ok(None)
    }
}

/// Party on the other side of the border.
///
/// For consignment transfers this is the party owning the destination
/// warehouse address.
pub fn intrastat_counterparty(
    store: &Store,
    move_: &StockMove,
) -> Result<Option<PartyId>, IntrastatError> {
    if let Some(consignment) = consignment_of(store, move_)? {
        let party = match consignment.to_location {
            Some(location) => store.location_address(location)?.and_then(|a| a.party),
            None => None,
        };
        return Ok(party);
    }
    if let Some(party) = shipment_of(store, move_)?.and_then(|s| s.party) {
        return Ok(Some(party));
    }
    origin_party(store, move_)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    struct Fixture {
        store: Store,
        company: CompanyId,
        storage: LocationId,
        customer_location: LocationId,
        supplier_location: LocationId,
        customer: PartyId,
    }

    fn fixture() -> Fixture {
        let mut store = Store::new();
        let own = store.add_party(
            PartyBuilder::new("Own")
                .address(AddressBuilder::new("BE").build())
                .build(),
        );
        let company = store.add_company(Company {
            party: own,
            ..Default::default()
        });
        let warehouse = store.add_warehouse(Warehouse {
            address: Some(AddressBuilder::new("BE").build()),
            ..Default::default()
        });
        let storage = store.add_location(Location {
            warehouse: Some(warehouse),
            ..Default::default()
        });
        let customer_location = store.add_location(Location {
            kind: LocationKind::Customer,
            ..Default::default()
        });
        let supplier_location = store.add_location(Location {
            kind: LocationKind::Supplier,
            ..Default::default()
        });
        let customer = store.add_party(
            PartyBuilder::new("Client")
                .address(AddressBuilder::new("FR").build())
                .build(),
        );
        Fixture {
            store,
            company,
            storage,
            customer_location,
            supplier_location,
            customer,
        }
    }

    fn out_move(f: &mut Fixture) -> StockMove {
        let shipment = f.store.add_shipment(
            ShipmentBuilder::new(ShipmentKind::Out, f.company)
                .party(f.customer)
                .build(),
        );
        StockMoveBuilder::new(ProductId(0), dec!(1), f.storage, f.customer_location)
            .company(f.company)
            .shipment(shipment)
            .effective_date(date(2024, 3, 1))
            .build()
    }

    #[test]
    fn dispatch_to_member_state() {
        let mut f = fixture();
        let move_ = out_move(&mut f);
        let config = IntrastatConfig::default();
        assert_eq!(
            intrastat_type(&f.store, &config, &move_).unwrap(),
            Some(IntrastatType::Dispatch)
        );
        assert_eq!(intrastat_to_country(&f.store, &move_).unwrap().as_deref(), Some("FR"));
    }

    #[test]
    fn arrival_from_supplier() {
        let mut f = fixture();
        let supplier = f.store.add_party(
            PartyBuilder::new("Lieferant")
                .address(AddressBuilder::new("DE").build())
                .build(),
        );
        let shipment = f.store.add_shipment(
            ShipmentBuilder::new(ShipmentKind::In, f.company)
                .party(supplier)
                .build(),
        );
        let move_ = StockMoveBuilder::new(ProductId(0), dec!(1), f.supplier_location, f.storage)
            .company(f.company)
            .shipment(shipment)
            .effective_date(date(2024, 3, 1))
            .build();
        assert_eq!(
            intrastat_type(&f.store, &IntrastatConfig::default(), &move_).unwrap(),
            Some(IntrastatType::Arrival)
        );
    }

    #[test]
    fn domestic_move_not_declared() {
        let mut f = fixture();
        let mut move_ = out_move(&mut f);
        let shipment = move_.shipment.unwrap();
        f.store.shipment_mut(shipment).unwrap().intrastat_to_country = Some("BE".into());
        move_.effective_date = Some(date(2024, 3, 1));
        assert_eq!(
            intrastat_type(&f.store, &IntrastatConfig::default(), &move_).unwrap(),
            None
        );
    }

    #[test]
    fn non_member_not_declared() {
        let mut f = fixture();
        let move_ = out_move(&mut f);
        let shipment = move_.shipment.unwrap();
        f.store.shipment_mut(shipment).unwrap().intrastat_to_country = Some("US".into());
        assert_eq!(
            intrastat_type(&f.store, &IntrastatConfig::default(), &move_).unwrap(),
            None
        );
    }

    #[test]
    fn company_switch_disables() {
        let mut f = fixture();
        let move_ = out_move(&mut f);
        f.store.company_mut(f.company).unwrap().intrastat = false;
        assert_eq!(
            intrastat_type(&f.store, &IntrastatConfig::default(), &move_).unwrap(),
            None
        );
    }

    #[test]
    fn exempt_invoice_line_tax() {
        let mut f = fixture();
        let move_ = out_move(&mut f);
        let move_id = f.store.add_move(move_).unwrap();
        f.store
            .add_invoice_line(InvoiceLine {
                quantity: dec!(1),
                taxes: vec![TaxId(21)],
                stock_moves: vec![move_id],
                ..Default::default()
            })
            .unwrap();
        let config = IntrastatConfig {
            exempt_taxes: [TaxId(21)].into(),
            ..Default::default()
        };
        let move_ = f.store.move_(move_id).unwrap();
        assert!(move_tax_intrastat_exempt(&f.store, &config, move_).unwrap());
        assert_eq!(intrastat_type(&f.store, &config, move_).unwrap(), None);
        assert!(!move_tax_intrastat_exempt(&f.store, &IntrastatConfig::default(), move_).unwrap());
    }

    #[test]
    fn exempt_sale_line_tax() {
        let mut f = fixture();
        let sale = f.store.add_sale(Sale::default());
        let line = f.store.add_sale_line(SaleLine {
            sale,
            taxes: vec![TaxId(4), TaxId(21)],
            ..Default::default()
        });
        let mut move_ = out_move(&mut f);
        move_.origin = Some(MoveOrigin::SaleLine(line));
        let config = IntrastatConfig {
            exempt_taxes: [TaxId(21)].into(),
            ..Default::default()
        };
        assert!(move_tax_intrastat_exempt(&f.store, &config, &move_).unwrap());
    }

    #[test]
    fn counterparty_is_shipment_party() {
        let mut f = fixture();
        let move_ = out_move(&mut f);
        assert_eq!(intrastat_counterparty(&f.store, &move_).unwrap(), Some(f.customer));
    }
}
