//! In-memory record store.
//!
//! The store stands in for the ERP persistence layer: it owns every record the
//! engine reads and receives batched move writes. Identifiers are allocated
//! from a single counter, so ids are unique across record kinds.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::currencies::CurrencyTable;
use super::error::IntrastatError;
use super::types::*;

/// Every record the engine works with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Store {
    next_id: u32,
    pub currencies: CurrencyTable,
    pub companies: BTreeMap<CompanyId, Company>,
    pub parties: BTreeMap<PartyId, Party>,
    pub products: BTreeMap<ProductId, Product>,
    pub tariff_codes: BTreeMap<TariffCodeId, TariffCode>,
    pub warehouses: BTreeMap<WarehouseId, Warehouse>,
    pub locations: BTreeMap<LocationId, Location>,
    pub carriers: BTreeMap<CarrierId, Carrier>,
    pub price_lists: BTreeMap<PriceListId, PriceList>,
    pub shipments: BTreeMap<ShipmentId, Shipment>,
    pub moves: BTreeMap<MoveId, StockMove>,
    pub invoices: BTreeMap<InvoiceId, Invoice>,
    pub invoice_lines: BTreeMap<InvoiceLineId, InvoiceLine>,
    pub sales: BTreeMap<SaleId, Sale>,
    pub sale_lines: BTreeMap<SaleLineId, SaleLine>,
    pub purchases: BTreeMap<PurchaseId, Purchase>,
    pub purchase_lines: BTreeMap<PurchaseLineId, PurchaseLine>,
    pub declarations: BTreeMap<DeclarationId, Declaration>,
    /// Subdivisions keyed by ISO 3166-2 code.
    pub subdivisions: BTreeMap<String, Subdivision>,
}

macro_rules! records {
    ($($get:ident, $get_mut:ident, $add:ident, $field:ident, $id:ident, $ty:ty, $kind:literal;)*) =>
    {
        $(
            pub fn $get(&self, id: $id) -> Result<&$ty, IntrastatError> {
                self.$field
                    .get(&id)
                    .ok_or_else(|| IntrastatError::missing($kind, id))
            }

            pub fn $get_mut(&mut self, id: $id) -> Result<&mut $ty, IntrastatError> {
                self.$field
                    .get_mut(&id)
                    .ok_or_else(|| IntrastatError::missing($kind, id))
            }

            /// Insert the record under a freshly allocated id.
            pub fn $add(&mut self, mut record: $ty) -> $id {
                let id = $id(self.allocate());
                record.id = id;
                self.$field.insert(id, record);
                id
            }
        )*
    };
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    records!(
        company, company_mut, add_company, companies, CompanyId, Company, "company";
        party, party_mut, add_party, parties, PartyId, Party, "party";
        product, product_mut, add_product, products, ProductId, Product, "product";
        tariff_code, tariff_code_mut, add_tariff_code, tariff_codes, TariffCodeId, TariffCode, "tariff code";
        warehouse, warehouse_mut, add_warehouse, warehouses, WarehouseId, Warehouse, "warehouse";
        location, location_mut, add_location, locations, LocationId, Location, "location";
        carrier, carrier_mut, add_carrier, carriers, CarrierId, Carrier, "carrier";
        price_list, price_list_mut, add_price_list, price_lists, PriceListId, PriceList, "price list";
        shipment, shipment_mut, add_shipment, shipments, ShipmentId, Shipment, "shipment";
        move_, move_mut, insert_move, moves, MoveId, StockMove, "move";
        invoice, invoice_mut, add_invoice, invoices, InvoiceId, Invoice, "invoice";
        invoice_line, invoice_line_mut, insert_invoice_line, invoice_lines, InvoiceLineId, InvoiceLine, "invoice line";
        sale, sale_mut, add_sale, sales, SaleId, Sale, "sale";
        sale_line, sale_line_mut, add_sale_line, sale_lines, SaleLineId, SaleLine, "sale line";
        purchase, purchase_mut, add_purchase, purchases, PurchaseId, Purchase, "purchase";
        purchase_line, purchase_line_mut, add_purchase_line, purchase_lines, PurchaseLineId, PurchaseLine, "purchase line";
    );

    /// Insert a move and register it on its shipment.
    pub fn add_move(&mut self, record: StockMove) -> Result<MoveId, IntrastatError> {
        if let Some(shipment) = record.shipment {
            self.shipment(shipment)?;
        }
        let shipment = record.shipment;
        let id = self.insert_move(record);
        if let Some(shipment) = shipment {
            self.shipment_mut(shipment)?.moves.push(id);
        }
        Ok(id)
    }

    /// Insert an invoice line, attach it to its invoice and link both sides
    /// of its stock moves.
    pub fn add_invoice_line(
        &mut self,
        record: InvoiceLine,
    ) -> Result<InvoiceLineId, IntrastatError> {
        if let Some(invoice) = record.invoice {
            self.invoice(invoice)?;
        }
        for move_id in &record.stock_moves {
            self.move_(*move_id)?;
        }
        let invoice = record.invoice;
        let moves = record.stock_moves.clone();
        let id = self.insert_invoice_line(record);
        if let Some(invoice) = invoice {
            self.invoice_mut(invoice)?.lines.push(id);
        }
        for move_id in moves {
            let move_ = self.move_mut(move_id)?;
            if !move_.invoice_lines.contains(&id) {
                move_.invoice_lines.push(id);
            }
        }
        Ok(id)
    }

    pub fn add_subdivision(&mut self, subdivision: Subdivision) {
        self.subdivisions
            .insert(subdivision.code.clone(), subdivision);
    }

    /// The declaring subdivision for `code`: the subdivision itself when it
    /// has an Intrastat code, otherwise its nearest ancestor that has one.
    pub fn intrastat_subdivision(&self, code: &str) -> Option<&Subdivision> {
        let mut current = self.subdivisions.get(code);
        // parent chains are shallow, the bound only guards against cycles
        for _ in 0..16 {
            let subdivision = current?;
            if subdivision.intrastat_code.is_some() {
                return Some(subdivision);
            }
            current = self.subdivisions.get(subdivision.parent.as_deref()?);
        }
        None
    }

    /// Country of the company's invoice address.
    pub fn company_country(&self, company: CompanyId) -> Result<Option<String>, IntrastatError> {
        let company = self.company(company)?;
        Ok(self
            .party(company.party)?
            .country_code()
            .map(str::to_string))
    }

    /// Address of the warehouse `location` belongs to.
    pub fn location_address(
        &self,
        location: LocationId,
    ) -> Result<Option<&Address>, IntrastatError> {
        match self.location(location)?.warehouse {
            Some(warehouse) => Ok(self.warehouse(warehouse)?.address.as_ref()),
            None => Ok(None),
        }
    }

    /// Write a batch of moves, replacing the stored versions.
    pub fn write_moves(&mut self, moves: Vec<StockMove>) {
        for move_ in moves {
            self.moves.insert(move_.id, move_);
        }
    }

    /// Declaration for (company, country, month), created opened when absent.
    pub fn declaration_for(
        &mut self,
        company: CompanyId,
        country: &str,
        month: NaiveDate,
    ) -> DeclarationId {
        let month = month_start(month);
        if let Some(existing) = self
            .declarations
            .values()
            .find(|d| d.company == company && d.country == country && d.month == month)
        {
            return existing.id;
        }
        let id = DeclarationId(self.allocate());
        self.declarations.insert(
            id,
            Declaration {
                id,
                company,
                country: country.to_string(),
                month,
                state: DeclarationState::Opened,
            },
        );
        id
    }

    pub fn declaration(&self, id: DeclarationId) -> Result<&Declaration, IntrastatError> {
        self.declarations
            .get(&id)
            .ok_or_else(|| IntrastatError::missing("declaration", id))
    }

    pub fn declaration_mut(
        &mut self,
        id: DeclarationId,
    ) -> Result<&mut Declaration, IntrastatError> {
        self.declarations
            .get_mut(&id)
            .ok_or_else(|| IntrastatError::missing("declaration", id))
    }
}
