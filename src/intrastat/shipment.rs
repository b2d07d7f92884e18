//! Shipment and order defaults feeding the move classification.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::core::*;

use super::eligibility::party_country;

/// Sum of the declared values of the shipment moves.
pub fn total_intrastat_value(
    store: &Store,
    shipment: ShipmentId,
) -> Result<Decimal, IntrastatError> {
    let mut total = Decimal::ZERO;
    for id in &store.shipment(shipment)?.moves {
        let fields = &store.move_(*id)?.intrastat;
        if fields.intrastat_type.is_none() {
            continue;
        }
        total += fields.value.unwrap_or_default();
    }
    Ok(total)
}

/// Record the counterparty country on the end of `shipment` facing the party.
fn set_party_country(shipment: &mut Shipment, country: Option<String>) {
    if shipment.kind.receives_from_party() {
        shipment.intrastat_from_country = country;
    } else if shipment.kind.sends_to_party() {
        shipment.intrastat_to_country = country;
    }
}

/// Supplier shipments: the goods come from the contact address country.
pub fn on_change_contact_address(
    store: &mut Store,
    shipment: ShipmentId,
) -> Result<(), IntrastatError> {
    let shipment = store.shipment_mut(shipment)?;
    if shipment.kind != ShipmentKind::In {
        return Ok(());
    }
    if let Some(country) = shipment.address.as_ref().and_then(|a| a.country_code.clone()) {
        shipment.intrastat_from_country = Some(country);
    }
    Ok(())
}

/// Customer shipments: the carrier's usual transport mode.
pub fn on_change_carrier(store: &mut Store, shipment: ShipmentId) -> Result<(), IntrastatError> {
    let Some(carrier) = store.shipment(shipment)?.carrier else {
        return Ok(());
    };
    let transport = store.carrier(carrier)?.intrastat_transport.clone();
    let shipment = store.shipment_mut(shipment)?;
    if shipment.kind == ShipmentKind::Out {
        shipment.intrastat_transport = transport;
    }
    Ok(())
}

/// Country defaults of shipments with a supplier.
///
/// Goods from a supplier come from its contact address, else its invoice
/// address; goods returned to it go there.
pub fn on_change_supplier(store: &mut Store, shipment: ShipmentId) -> Result<(), IntrastatError> {
    let record = store.shipment(shipment)?;
    if !record.kind.with_supplier() {
        return Ok(());
    }
    let country = match record.address.as_ref().and_then(|a| a.country_code.clone()) {
        Some(country) => Some(country),
        None => party_country(store, record.party)?,
    };
    set_party_country(store.shipment_mut(shipment)?, country);
    Ok(())
}

/// Country defaults of shipments with a customer.
///
/// Goods go to the delivery address, else the customer's invoice address;
/// returns come from there.
pub fn on_change_customer(store: &mut Store, shipment: ShipmentId) -> Result<(), IntrastatError> {
    let record = store.shipment(shipment)?;
    if !record.kind.with_customer() {
        return Ok(());
    }
    let country = match record.address.as_ref().and_then(|a| a.country_code.clone()) {
        Some(country) => Some(country),
        None => party_country(store, record.party)?,
    };
    set_party_country(store.shipment_mut(shipment)?, country);
    Ok(())
}

/// Warehouse an internal shipment sends its goods to.
pub fn to_warehouse(
    store: &Store,
    shipment: ShipmentId,
) -> Result<Option<WarehouseId>, IntrastatError> {
    match store.shipment(shipment)?.to_location {
        Some(location) => Ok(store.location(location)?.warehouse),
        None => Ok(None),
    }
}

/// Currency of an internal shipment: the first valued move's, else the
/// company currency.
pub fn internal_currency(store: &Store, shipment: ShipmentId) -> Result<String, IntrastatError> {
    let record = store.shipment(shipment)?;
    for id in &record.moves {
        if let Some(currency) = &store.move_(*id)?.currency {
            return Ok(currency.clone());
        }
    }
    Ok(store.company(record.company)?.currency.clone())
}

/// Internal shipments: countries of the source and destination warehouses.
pub fn on_change_internal_locations(
    store: &mut Store,
    shipment: ShipmentId,
) -> Result<(), IntrastatError> {
    let record = store.shipment(shipment)?;
    if !record.kind.is_internal() {
        return Ok(());
    }
    let country = |location: Option<LocationId>| -> Result<Option<String>, IntrastatError> {
        match location {
            Some(location) => Ok(store
                .location_address(location)?
                .and_then(|a| a.country_code.clone())),
            None => Ok(None),
        }
    };
    let from = country(record.from_location)?;
    let to = country(record.to_location)?;
    let shipment = store.shipment_mut(shipment)?;
    shipment.intrastat_from_country = from;
    shipment.intrastat_to_country = to;
    Ok(())
}

/// Whether a sale must carry an incoterm: the company works with incoterms
/// and the goods cross a border between two Intrastat members.
pub fn incoterm_required(
    store: &Store,
    sale: SaleId,
    today: NaiveDate,
) -> Result<bool, IntrastatError> {
    let sale = store.sale(sale)?;
    if store.company(sale.company)?.incoterms.is_empty() {
        return Ok(false);
    }
    let date = sale.sale_date.unwrap_or(today);
    let warehouse_country = match sale.warehouse {
        Some(warehouse) => store
            .warehouse(warehouse)?
            .address
            .as_ref()
            .and_then(|a| a.country_code.clone()),
        None => None,
    };
    let shipment_country = sale
        .shipment_address
        .as_ref()
        .and_then(|a| a.country_code.clone());
    Ok(match (warehouse_country, shipment_country) {
        (Some(from), Some(to)) if in_intrastat(&from, date) && in_intrastat(&to, date) => {
            from != to
        }
        _ => false,
    })
}

/// New move for an order line, carrying the order incoterm.
pub fn move_for_origin(
    store: &Store,
    origin: MoveOrigin,
    move_: StockMove,
) -> Result<StockMove, IntrastatError> {
    let incoterm = match origin {
        MoveOrigin::SaleLine(line) => store.sale(store.sale_line(line)?.sale)?.incoterm.clone(),
        MoveOrigin::PurchaseLine(line) => store
            .purchase(store.purchase_line(line)?.purchase)?
            .incoterm
            .clone(),
    };
    let mut move_ = StockMove {
        origin: Some(origin),
        ..move_
    };
    move_.intrastat.incoterm = incoterm;
    Ok(move_)
}
