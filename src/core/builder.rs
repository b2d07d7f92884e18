use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::types::*;
use super::units::Uom;

/// Builder for stock moves.
///
/// ```
/// use intrastat::core::*;
/// use rust_decimal_macros::dec;
///
/// let move_ = StockMoveBuilder::new(ProductId(1), dec!(20), LocationId(2), LocationId(3))
///     .unit_price(dec!(90.0000), "EUR")
///     .build();
/// assert_eq!(move_.quantity, dec!(20));
/// ```
pub struct StockMoveBuilder {
    move_: StockMove,
}

impl StockMoveBuilder {
    pub fn new(
        product: ProductId,
        quantity: Decimal,
        from_location: LocationId,
        to_location: LocationId,
    ) -> Self {
        Self {
            move_: StockMove {
                product,
                quantity,
                from_location,
                to_location,
                ..Default::default()
            },
        }
    }

    pub fn company(mut self, company: CompanyId) -> Self {
        self.move_.company = company;
        self
    }

    pub fn unit(mut self, unit: Uom) -> Self {
        self.move_.unit = unit;
        self
    }

    pub fn unit_price(mut self, price: Decimal, currency: impl Into<String>) -> Self {
        self.move_.unit_price = Some(price);
        self.move_.currency = Some(currency.into());
        self
    }

    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.move_.currency = Some(currency.into());
        self
    }

    pub fn unit_landed_cost(mut self, cost: Decimal) -> Self {
        self.move_.unit_landed_cost = Some(cost);
        self
    }

    pub fn planned_date(mut self, date: NaiveDate) -> Self {
        self.move_.planned_date = Some(date);
        self
    }

    pub fn effective_date(mut self, date: NaiveDate) -> Self {
        self.move_.effective_date = Some(date);
        self
    }

    pub fn shipment(mut self, shipment: ShipmentId) -> Self {
        self.move_.shipment = Some(shipment);
        self
    }

    pub fn origin(mut self, origin: MoveOrigin) -> Self {
        self.move_.origin = Some(origin);
        self
    }

    pub fn build(self) -> StockMove {
        self.move_
    }
}

/// Builder for products.
pub struct ProductBuilder {
    product: Product,
}

impl ProductBuilder {
    pub fn new(name: impl Into<String>, default_uom: Uom, cost_price: Decimal) -> Self {
        Self {
            product: Product {
                name: name.into(),
                default_uom,
                cost_price,
                ..Default::default()
            },
        }
    }

    /// Assign a tariff code valid at all dates and for all countries.
    pub fn tariff_code(mut self, tariff_code: TariffCodeId) -> Self {
        self.product.tariff_codes.push(ProductTariffCode {
            tariff_code,
            ..Default::default()
        });
        self
    }

    pub fn tariff_assignment(mut self, assignment: ProductTariffCode) -> Self {
        self.product.tariff_codes.push(assignment);
        self
    }

    pub fn weight(mut self, weight: Decimal, uom: Uom) -> Self {
        self.product.weight = Some(weight);
        self.product.weight_uom = Some(uom);
        self
    }

    pub fn width(mut self, width: Decimal, uom: Uom) -> Self {
        self.product.width = Some(width);
        self.product.width_uom = Some(uom);
        self
    }

    pub fn country_of_origin(mut self, code: impl Into<String>) -> Self {
        self.product.country_of_origin = Some(code.into());
        self
    }

    pub fn producible(mut self) -> Self {
        self.product.producible = true;
        self
    }

    pub fn supplier(mut self, party: PartyId) -> Self {
        self.product.suppliers.push(party);
        self
    }

    pub fn build(self) -> Product {
        self.product
    }
}

/// Builder for parties.
pub struct PartyBuilder {
    party: Party,
}

impl PartyBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            party: Party {
                name: name.into(),
                ..Default::default()
            },
        }
    }

    pub fn address(mut self, address: Address) -> Self {
        self.party.addresses.push(address);
        self
    }

    pub fn eu_vat(mut self, code: impl Into<String>) -> Self {
        self.party.eu_vat = Some(code.into());
        self
    }

    pub fn sale_incoterm(mut self, incoterm: Incoterm) -> Self {
        self.party.sale_incoterms.push(PartyIncoterm {
            incoterm,
            location: None,
        });
        self
    }

    pub fn purchase_incoterm(mut self, incoterm: Incoterm) -> Self {
        self.party.purchase_incoterms.push(PartyIncoterm {
            incoterm,
            location: None,
        });
        self
    }

    pub fn build(self) -> Party {
        self.party
    }
}

/// Builder for addresses.
pub struct AddressBuilder {
    address: Address,
}

impl AddressBuilder {
    pub fn new(country_code: impl Into<String>) -> Self {
        Self {
            address: Address {
                country_code: Some(country_code.into()),
                ..Default::default()
            },
        }
    }

    pub fn party(mut self, party: PartyId) -> Self {
        self.address.party = Some(party);
        self
    }

    pub fn city(mut self, city: impl Into<String>) -> Self {
        self.address.city = Some(city.into());
        self
    }

    pub fn street(mut self, street: impl Into<String>) -> Self {
        self.address.street = Some(street.into());
        self
    }

    pub fn subdivision(mut self, code: impl Into<String>) -> Self {
        self.address.subdivision = Some(code.into());
        self
    }

    pub fn build(self) -> Address {
        self.address
    }
}

/// Builder for shipments.
pub struct ShipmentBuilder {
    shipment: Shipment,
}

impl ShipmentBuilder {
    pub fn new(kind: ShipmentKind, company: CompanyId) -> Self {
        Self {
            shipment: Shipment {
                kind,
                company,
                ..Default::default()
            },
        }
    }

    pub fn party(mut self, party: PartyId) -> Self {
        self.shipment.party = Some(party);
        self
    }

    pub fn address(mut self, address: Address) -> Self {
        self.shipment.address = Some(address);
        self
    }

    pub fn warehouse(mut self, warehouse: WarehouseId) -> Self {
        self.shipment.warehouse = Some(warehouse);
        self
    }

    pub fn locations(mut self, from: LocationId, to: LocationId) -> Self {
        self.shipment.from_location = Some(from);
        self.shipment.to_location = Some(to);
        self
    }

    pub fn carrier(mut self, carrier: CarrierId) -> Self {
        self.shipment.carrier = Some(carrier);
        self
    }

    pub fn transport(mut self, transport: Transport) -> Self {
        self.shipment.intrastat_transport = Some(transport);
        self
    }

    pub fn price_list(mut self, price_list: PriceListId) -> Self {
        self.shipment.price_list = Some(price_list);
        self
    }

    pub fn build(self) -> Shipment {
        self.shipment
    }
}
