//! Belgian company shipping furniture to France, shared by the integration
//! tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use intrastat::core::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub struct World {
    pub store: Store,
    pub company: CompanyId,
    pub warehouse: WarehouseId,
    pub storage: LocationId,
    pub input: LocationId,
    pub output: LocationId,
    pub customer_location: LocationId,
    pub supplier_location: LocationId,
    pub customer: PartyId,
    pub supplier: PartyId,
    pub tariff: TariffCodeId,
    pub desk: ProductId,
}

impl World {
    pub fn new() -> Self {
        let mut store = Store::new();
        store.add_subdivision(Subdivision {
            code: "BE-WAL".into(),
            name: "Wallonia".into(),
            country_code: "BE".into(),
            kind: "region".into(),
            parent: None,
            intrastat_code: Some("2".into()),
        });
        store.add_subdivision(Subdivision {
            code: "BE-WLG".into(),
            name: "Liège".into(),
            country_code: "BE".into(),
            kind: "province".into(),
            parent: Some("BE-WAL".into()),
            intrastat_code: None,
        });

        let company_party = store.add_party(
            PartyBuilder::new("Meubles Liégeois SA")
                .address(AddressBuilder::new("BE").city("Liège").build())
                .eu_vat("BE0477472701")
                .build(),
        );
        let company = store.add_company(Company {
            party: company_party,
            incoterms: vec![Incoterm::new("DAP", "2020"), Incoterm::new("EXW", "2020")],
            ..Default::default()
        });
        let warehouse = store.add_warehouse(Warehouse {
            name: "Liège".into(),
            address: Some(
                AddressBuilder::new("BE")
                    .party(company_party)
                    .subdivision("BE-WLG")
                    .build(),
            ),
            ..Default::default()
        });
        let location = |kind: LocationKind, warehouse: Option<WarehouseId>| Location {
            kind,
            warehouse,
            ..Default::default()
        };
        let storage = store.add_location(location(LocationKind::Storage, Some(warehouse)));
        let input = store.add_location(location(LocationKind::Input, Some(warehouse)));
        let output = store.add_location(location(LocationKind::Output, Some(warehouse)));
        let customer_location = store.add_location(location(LocationKind::Customer, None));
        let supplier_location = store.add_location(location(LocationKind::Supplier, None));

        let customer = store.add_party(
            PartyBuilder::new("Bureaux de Paris SARL")
                .address(AddressBuilder::new("FR").city("Paris").build())
                .eu_vat("FR32123456789")
                .sale_incoterm(Incoterm::new("DAP", "2020"))
                .build(),
        );
        let supplier = store.add_party(
            PartyBuilder::new("Bois du Nord SAS")
                .address(AddressBuilder::new("FR").city("Lille").build())
                .eu_vat("FR40303265045")
                .purchase_incoterm(Incoterm::new("FCA", "2020"))
                .build(),
        );
        let tariff = store.add_tariff_code(TariffCode {
            code: "9403 10 51".into(),
            description: Some("Metal office desks".into()),
            intrastat_uom: Some(Uom::unit()),
            ..Default::default()
        });
        let desk = store.add_product(
            ProductBuilder::new("Desk", Uom::unit(), dec!(80))
                .tariff_code(tariff)
                .weight(dec!(3), Uom::kilogram())
                .country_of_origin("CN")
                .build(),
        );

        Self {
            store,
            company,
            warehouse,
            storage,
            input,
            output,
            customer_location,
            supplier_location,
            customer,
            supplier,
            tariff,
            desk,
        }
    }

    pub fn shipment(&mut self, kind: ShipmentKind, party: Option<PartyId>) -> ShipmentId {
        let mut builder = ShipmentBuilder::new(kind, self.company).warehouse(self.warehouse);
        if let Some(party) = party {
            builder = builder.party(party);
        }
        self.store.add_shipment(builder.build())
    }

    /// Move of `quantity` desks at `price` EUR, done on 2024-06-15.
    pub fn add_move(
        &mut self,
        shipment: ShipmentId,
        from: LocationId,
        to: LocationId,
        quantity: Decimal,
        price: Decimal,
    ) -> MoveId {
        self.store
            .add_move(
                StockMoveBuilder::new(self.desk, quantity, from, to)
                    .company(self.company)
                    .shipment(shipment)
                    .unit_price(price, "EUR")
                    .effective_date(date(2024, 6, 15))
                    .build(),
            )
            .unwrap()
    }

    /// Customer shipment of `quantity` desks at `price`.
    pub fn sale_move(&mut self, quantity: Decimal, price: Decimal) -> MoveId {
        let shipment = self.shipment(ShipmentKind::Out, Some(self.customer));
        self.add_move(shipment, self.output, self.customer_location, quantity, price)
    }

    /// Posted-later invoice billing `move_id`, dated 2024-06-20.
    pub fn invoice(&mut self, move_id: MoveId, quantity: Decimal, amount: Decimal) -> InvoiceId {
        let invoice = self.store.add_invoice(Invoice {
            company: self.company,
            party: Some(self.customer),
            invoice_date: Some(date(2024, 6, 20)),
            currency: "EUR".into(),
            ..Default::default()
        });
        self.store
            .add_invoice_line(InvoiceLine {
                invoice: Some(invoice),
                product: Some(self.desk),
                quantity,
                amount,
                stock_moves: vec![move_id],
                ..Default::default()
            })
            .unwrap();
        invoice
    }

    pub fn fields(&self, move_id: MoveId) -> &IntrastatFields {
        &self.store.move_(move_id).unwrap().intrastat
    }
}
