use std::fmt;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::units::Uom;

macro_rules! record_ids {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(
                Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
                Deserialize,
            )]
            pub struct $name(pub u32);

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )*
    };
}

record_ids!(
    /// Company identifier.
    CompanyId,
    /// Party (customer, supplier, company party) identifier.
    PartyId,
    /// Product identifier.
    ProductId,
    /// Customs tariff code identifier.
    TariffCodeId,
    /// Warehouse identifier.
    WarehouseId,
    /// Stock location identifier.
    LocationId,
    /// Carrier identifier.
    CarrierId,
    /// Shipment identifier.
    ShipmentId,
    /// Stock move identifier.
    MoveId,
    /// Invoice identifier.
    InvoiceId,
    /// Invoice line identifier.
    InvoiceLineId,
    /// Tax identifier.
    TaxId,
    /// Sale identifier.
    SaleId,
    /// Sale line identifier.
    SaleLineId,
    /// Purchase identifier.
    PurchaseId,
    /// Purchase line identifier.
    PurchaseLineId,
    /// Price list identifier.
    PriceListId,
    /// Intrastat declaration identifier.
    DeclarationId,
);

/// First day of the month `date` falls in.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Postal address, reduced to what Intrastat needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Party the address belongs to.
    pub party: Option<PartyId>,
    pub street: Option<String>,
    pub city: Option<String>,
    /// ISO 3166-1 alpha-2 country code.
    pub country_code: Option<String>,
    /// ISO 3166-2 subdivision code (e.g. "BE-WLG").
    pub subdivision: Option<String>,
}

/// Country subdivision (region, province).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subdivision {
    /// ISO 3166-2 code.
    pub code: String,
    pub name: String,
    pub country_code: String,
    /// "region", "province", ...
    pub kind: String,
    /// Code of the parent subdivision.
    pub parent: Option<String>,
    /// Intrastat region code, if this subdivision is a declaring region.
    pub intrastat_code: Option<String>,
}

/// Incoterm rule (e.g. EXW 2020).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Incoterm {
    pub code: String,
    pub version: String,
}

impl Incoterm {
    pub fn new(code: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            version: version.into(),
        }
    }
}

/// Default incoterm configured on a party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyIncoterm {
    pub incoterm: Incoterm,
    pub location: Option<String>,
}

/// Intrastat mode of transport (code 3 is road).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transport {
    pub code: String,
    pub name: String,
}

impl Transport {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }

    /// Code 3, road transport.
    pub fn road() -> Self {
        Self::new("3", "Road")
    }
}

/// Customer, supplier or company party.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Party {
    pub id: PartyId,
    pub name: String,
    pub addresses: Vec<Address>,
    /// EU VAT identifier (e.g. "FR40303265045").
    pub eu_vat: Option<String>,
    pub sale_incoterms: Vec<PartyIncoterm>,
    pub purchase_incoterms: Vec<PartyIncoterm>,
}

impl Party {
    /// The address used for invoicing, which is the first one.
    pub fn invoice_address(&self) -> Option<&Address> {
        self.addresses.first()
    }

    /// Country of the invoice address.
    pub fn country_code(&self) -> Option<&str> {
        self.invoice_address()?.country_code.as_deref()
    }
}

/// Company running the stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub party: PartyId,
    /// Company currency.
    pub currency: String,
    /// Whether the company reports Intrastat.
    pub intrastat: bool,
    /// Currency declarations are made in; the company currency when unset.
    pub intrastat_currency: Option<String>,
    /// Incoterms the company works with.
    pub incoterms: Vec<Incoterm>,
}

impl Default for Company {
    fn default() -> Self {
        Self {
            id: CompanyId::default(),
            party: PartyId::default(),
            currency: "EUR".into(),
            intrastat: true,
            intrastat_currency: None,
            incoterms: Vec::new(),
        }
    }
}

impl Company {
    pub fn declaration_currency(&self) -> &str {
        self.intrastat_currency.as_deref().unwrap_or(&self.currency)
    }
}

/// Customs classification code.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TariffCode {
    pub id: TariffCodeId,
    /// Commodity code (e.g. "9403 10 51").
    pub code: String,
    pub description: Option<String>,
    /// Supplementary unit declared for this commodity.
    pub intrastat_uom: Option<Uom>,
}

/// Assignment of a tariff code to a product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductTariffCode {
    pub tariff_code: TariffCodeId,
    /// Restrict the assignment to moves with this counterparty country.
    pub country: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Criteria a tariff code assignment must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TariffCodePattern {
    pub date: Option<NaiveDate>,
    pub country: Option<String>,
}

impl ProductTariffCode {
    /// Whether this assignment applies to `pattern`.
    pub fn matches(&self, pattern: &TariffCodePattern) -> bool {
        if let (Some(own), Some(wanted)) = (&self.country, &pattern.country) {
            if own != wanted {
                return false;
            }
        }
        if let Some(date) = pattern.date {
            if self.start_date.is_some_and(|start| date < start)
                || self.end_date.is_some_and(|end| date > end)
            {
                return false;
            }
        }
        true
    }
}

/// Product master data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub default_uom: Uom,
    /// Unit cost in the company currency.
    pub cost_price: Decimal,
    /// Tariff code assignments, in priority order.
    pub tariff_codes: Vec<ProductTariffCode>,
    pub weight: Option<Decimal>,
    pub weight_uom: Option<Uom>,
    pub width: Option<Decimal>,
    pub width_uom: Option<Uom>,
    pub country_of_origin: Option<String>,
    /// Manufactured by the company itself.
    pub producible: bool,
    /// Registered suppliers, in priority order.
    pub suppliers: Vec<PartyId>,
}

impl Product {
    /// First tariff code assignment matching `pattern`.
    pub fn get_tariff_code(&self, pattern: &TariffCodePattern) -> Option<TariffCodeId> {
        self.tariff_codes
            .iter()
            .find(|assignment| assignment.matches(pattern))
            .map(|assignment| assignment.tariff_code)
    }
}

/// Warehouse with its postal address.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: WarehouseId,
    pub name: String,
    pub address: Option<Address>,
}

/// Kind of stock location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationKind {
    #[default]
    Storage,
    Input,
    Output,
    Transit,
    Customer,
    Supplier,
    Lost,
}

/// Stock location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub kind: LocationKind,
    /// Warehouse the location belongs to.
    pub warehouse: Option<WarehouseId>,
}

/// Carrier with its usual transport mode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Carrier {
    pub id: CarrierId,
    pub name: String,
    pub intrastat_transport: Option<Transport>,
}

/// How a price list line computes the unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceFormula {
    /// A fixed unit price.
    Fixed(Decimal),
    /// The product cost price.
    CostPrice,
    /// The product cost price times a factor.
    CostPriceFactor(Decimal),
}

/// Price list line, the first matching line wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceListLine {
    /// Restrict the line to a product.
    pub product: Option<ProductId>,
    /// Minimal quantity, in the product default unit.
    pub quantity: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub formula: PriceFormula,
}

impl PriceListLine {
    pub fn new(formula: PriceFormula) -> Self {
        Self {
            product: None,
            quantity: None,
            start_date: None,
            end_date: None,
            formula,
        }
    }
}

/// Price list used to value intra-company transfers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceList {
    pub id: PriceListId,
    pub name: String,
    pub company: Option<CompanyId>,
    pub lines: Vec<PriceListLine>,
}

impl PriceList {
    /// Unit price of `product` for `quantity` expressed in `unit` on `date`,
    /// in price per `unit`.
    pub fn compute(
        &self,
        product: &Product,
        quantity: Decimal,
        unit: &Uom,
        date: Option<NaiveDate>,
    ) -> Option<Decimal> {
        let default_quantity = unit
            .compute_qty(quantity.abs(), &product.default_uom, false)
            .unwrap_or(quantity.abs());
        let line = self.lines.iter().find(|line| {
            line.product.is_none_or(|p| p == product.id)
                && line.quantity.is_none_or(|min| default_quantity >= min)
                && date.is_none_or(|d| {
                    line.start_date.is_none_or(|start| d >= start)
                        && line.end_date.is_none_or(|end| d <= end)
                })
        })?;
        let default_price = match &line.formula {
            PriceFormula::Fixed(price) => *price,
            PriceFormula::CostPrice => product.cost_price,
            PriceFormula::CostPriceFactor(factor) => product.cost_price * factor,
        };
        // price per default unit → price per move unit
        let default_uom = &product.default_uom;
        if unit.category == default_uom.category && unit.factor != default_uom.factor {
            Some(default_price * unit.factor / default_uom.factor)
        } else {
            Some(default_price)
        }
    }
}

/// Kind of shipment a move belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShipmentKind {
    /// Supplier shipment.
    #[default]
    In,
    /// Return to a supplier.
    InReturn,
    /// Customer shipment.
    Out,
    /// Return from a customer.
    OutReturn,
    /// Transfer between company locations.
    Internal,
}

impl ShipmentKind {
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal)
    }

    /// Goods come from the counterparty (arrivals side).
    pub fn receives_from_party(&self) -> bool {
        matches!(self, Self::In | Self::OutReturn)
    }

    /// Goods go to the counterparty (dispatch side).
    pub fn sends_to_party(&self) -> bool {
        matches!(self, Self::Out | Self::InReturn)
    }

    /// The counterparty is a supplier.
    pub fn with_supplier(&self) -> bool {
        matches!(self, Self::In | Self::InReturn)
    }

    /// The counterparty is a customer.
    pub fn with_customer(&self) -> bool {
        matches!(self, Self::Out | Self::OutReturn)
    }
}

/// Shipment grouping stock moves.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Shipment {
    pub id: ShipmentId,
    pub kind: ShipmentKind,
    pub company: CompanyId,
    /// Supplier or customer.
    pub party: Option<PartyId>,
    /// Delivery address (out) or contact address (in).
    pub address: Option<Address>,
    pub warehouse: Option<WarehouseId>,
    pub from_location: Option<LocationId>,
    pub to_location: Option<LocationId>,
    pub carrier: Option<CarrierId>,
    pub intrastat_transport: Option<Transport>,
    pub intrastat_from_country: Option<String>,
    pub intrastat_to_country: Option<String>,
    /// Internal shipments only: values the transfer as a sale.
    pub price_list: Option<PriceListId>,
    pub moves: Vec<MoveId>,
}

impl Shipment {
    /// Price list of an internal shipment.
    pub fn internal_price_list(&self) -> Option<PriceListId> {
        if self.kind.is_internal() {
            self.price_list
        } else {
            None
        }
    }

    /// Whether `move_` leaves the shipment's source location.
    pub fn is_outgoing(&self, move_: &StockMove) -> bool {
        self.from_location == Some(move_.from_location)
    }
}

/// Stock move state, only `Done` moves are declared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveState {
    #[default]
    Draft,
    Assigned,
    Done,
    Cancelled,
}

/// Order line a move was created from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveOrigin {
    SaleLine(SaleLineId),
    PurchaseLine(PurchaseLineId),
}

/// Intrastat flow direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntrastatType {
    /// Goods leaving the reporting country.
    Dispatch,
    /// Goods entering the reporting country.
    Arrival,
}

impl IntrastatType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dispatch => "dispatch",
            Self::Arrival => "arrival",
        }
    }
}

impl fmt::Display for IntrastatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything Intrastat records on a move.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntrastatFields {
    pub intrastat_type: Option<IntrastatType>,
    pub value: Option<Decimal>,
    pub tariff_code: Option<TariffCodeId>,
    pub additional_unit: Option<Decimal>,
    pub country_of_origin: Option<String>,
    /// Counterparty country.
    pub country: Option<String>,
    /// Country of the company side.
    pub warehouse_country: Option<String>,
    /// Intrastat subdivision code (ISO 3166-2).
    pub subdivision: Option<String>,
    pub transport: Option<Transport>,
    pub incoterm: Option<Incoterm>,
    /// Counterparty EU VAT identifier.
    pub vat: Option<String>,
    /// Nature of transaction code.
    pub transaction: Option<String>,
    pub declaration: Option<DeclarationId>,
}

impl IntrastatFields {
    /// Clear everything but the statistical value.
    pub fn clear_classification(&mut self) {
        *self = Self {
            value: self.value,
            ..Self::default()
        };
    }

    /// Clear every field, value included.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether only the value (if anything) is recorded.
    pub fn is_unclassified(&self) -> bool {
        let mut rest = self.clone();
        rest.value = None;
        rest == Self::default()
    }
}

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

/// One-line summary, e.g. `dispatch BE -> FR, value 1800.00, transaction 11,
/// origin CN, incoterm DAP`.
impl fmt::Display for IntrastatFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.value.map(|v| v.to_string());
        let Some(intrastat_type) = self.intrastat_type else {
            return match value {
                Some(value) => write!(f, "not declared, value {value}"),
                None => f.write_str("not declared"),
            };
        };
        let own = or_dash(self.warehouse_country.as_deref());
        let other = or_dash(self.country.as_deref());
        let (from, to) = match intrastat_type {
            IntrastatType::Dispatch => (own, other),
            IntrastatType::Arrival => (other, own),
        };
        write!(
            f,
            "{intrastat_type} {from} -> {to}, value {}, transaction {}, origin {}, incoterm {}",
            or_dash(value.as_deref()),
            or_dash(self.transaction.as_deref()),
            or_dash(self.country_of_origin.as_deref()),
            or_dash(self.incoterm.as_ref().map(|i| i.code.as_str())),
        )
    }
}

/// Stock move.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockMove {
    pub id: MoveId,
    pub company: CompanyId,
    pub product: ProductId,
    pub quantity: Decimal,
    pub unit: Uom,
    pub unit_price: Option<Decimal>,
    pub currency: Option<String>,
    /// Landed cost share included in `unit_price`.
    pub unit_landed_cost: Option<Decimal>,
    pub from_location: LocationId,
    pub to_location: LocationId,
    pub planned_date: Option<NaiveDate>,
    pub effective_date: Option<NaiveDate>,
    pub state: MoveState,
    pub shipment: Option<ShipmentId>,
    pub origin: Option<MoveOrigin>,
    pub invoice_lines: Vec<InvoiceLineId>,
    /// Weight in kilograms.
    pub internal_weight: Option<Decimal>,
    pub intrastat: IntrastatFields,
    pub intrastat_cancelled: bool,
}

impl StockMove {
    /// Effective date, or the planned one for moves not done yet.
    pub fn date(&self) -> Option<NaiveDate> {
        self.effective_date.or(self.planned_date)
    }
}

/// Invoice workflow state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvoiceState {
    #[default]
    Draft,
    Validated,
    Posted,
    Paid,
    Cancelled,
}

impl InvoiceState {
    /// Posted or paid.
    pub fn is_posted(&self) -> bool {
        matches!(self, Self::Posted | Self::Paid)
    }
}

/// Customer or supplier invoice.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub company: CompanyId,
    pub party: Option<PartyId>,
    pub state: InvoiceState,
    pub invoice_date: Option<NaiveDate>,
    pub accounting_date: Option<NaiveDate>,
    pub currency: String,
    pub lines: Vec<InvoiceLineId>,
}

impl Invoice {
    /// Date the invoice counts for: accounting date, else invoice date.
    pub fn reporting_date(&self) -> Option<NaiveDate> {
        self.accounting_date.or(self.invoice_date)
    }
}

/// Invoice line, linked to the stock moves it bills.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub id: InvoiceLineId,
    pub invoice: Option<InvoiceId>,
    pub product: Option<ProductId>,
    pub quantity: Decimal,
    /// Amount in the invoice currency, signed.
    pub amount: Decimal,
    /// Amount in the company currency, when known.
    pub company_amount: Option<Decimal>,
    pub taxes: Vec<TaxId>,
    pub stock_moves: Vec<MoveId>,
}

/// Sale order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    pub company: CompanyId,
    pub party: Option<PartyId>,
    pub warehouse: Option<WarehouseId>,
    pub shipment_address: Option<Address>,
    pub sale_date: Option<NaiveDate>,
    pub incoterm: Option<Incoterm>,
}

/// Sale order line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaleLine {
    pub id: SaleLineId,
    pub sale: SaleId,
    pub product: Option<ProductId>,
    pub taxes: Vec<TaxId>,
}

/// Purchase order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Purchase {
    pub id: PurchaseId,
    pub company: CompanyId,
    pub party: Option<PartyId>,
    pub incoterm: Option<Incoterm>,
}

/// Purchase order line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PurchaseLine {
    pub id: PurchaseLineId,
    pub purchase: PurchaseId,
    pub product: Option<ProductId>,
    pub taxes: Vec<TaxId>,
}

/// Declaration lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclarationState {
    #[default]
    Opened,
    Closed,
}

/// Monthly Intrastat declaration of a company for one country.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Declaration {
    pub id: DeclarationId,
    pub company: CompanyId,
    /// Reporting country.
    pub country: String,
    /// First day of the declared month.
    pub month: NaiveDate,
    pub state: DeclarationState,
}
