#![cfg(feature = "intrastat")]

mod common;

use common::{World, date};
use intrastat::core::*;
use intrastat::intrastat::*;
use rust_decimal_macros::dec;

fn done_sale(world: &mut World, engine: &IntrastatEngine) -> MoveId {
    let id = world.sale_move(dec!(20), dec!(90.0000));
    engine
        .do_moves(&mut world.store, &[id], date(2024, 6, 15))
        .unwrap();
    id
}

// --- Posting ---

#[test]
fn posted_invoice_sets_value() {
    let mut world = World::new();
    let engine = IntrastatEngine::new(IntrastatConfig::default());
    let id = done_sale(&mut world, &engine);
    let invoice = world.invoice(id, dec!(20), dec!(1750));

    let report = engine.post_invoices(&mut world.store, &[invoice]).unwrap();
    assert_eq!(report.updated, 1);
    assert_eq!(world.store.invoice(invoice).unwrap().state, InvoiceState::Posted);
    assert_eq!(world.fields(id).value, Some(dec!(1750.00)));
    assert_eq!(world.fields(id).intrastat_type, Some(IntrastatType::Dispatch));
}

#[test]
fn invoice_of_another_month_keeps_price_value() {
    let mut world = World::new();
    let engine = IntrastatEngine::new(IntrastatConfig::default());
    let id = done_sale(&mut world, &engine);
    let invoice = world.invoice(id, dec!(20), dec!(1750));
    world.store.invoice_mut(invoice).unwrap().invoice_date = Some(date(2024, 7, 2));

    engine.post_invoices(&mut world.store, &[invoice]).unwrap();
    assert_eq!(world.fields(id).value, Some(dec!(1800.00)));
}

#[test]
fn discount_line_lowers_value() {
    let mut world = World::new();
    let discount = world
        .store
        .add_product(ProductBuilder::new("Discount", Uom::unit(), dec!(0)).build());
    let engine = IntrastatEngine::new(
        IntrastatConfigBuilder::new()
            .discount_product(discount)
            .build(),
    );
    let id = done_sale(&mut world, &engine);
    let invoice = world.invoice(id, dec!(20), dec!(2000));
    world
        .store
        .add_invoice_line(InvoiceLine {
            invoice: Some(invoice),
            product: Some(discount),
            quantity: dec!(1),
            amount: dec!(-200),
            ..Default::default()
        })
        .unwrap();

    engine.post_invoices(&mut world.store, &[invoice]).unwrap();
    assert_eq!(world.fields(id).value, Some(dec!(1800.00)));
}

#[test]
fn company_amount_in_foreign_currency() {
    let mut world = World::new();
    let engine = IntrastatEngine::builder(IntrastatConfig::default())
        .amount_provider(CompanyAmount)
        .build();
    let id = done_sale(&mut world, &engine);
    let invoice = world.invoice(id, dec!(20), dec!(1900));
    world.store.invoice_mut(invoice).unwrap().currency = "USD".into();
    let line = world.store.invoice(invoice).unwrap().lines[0];
    world.store.invoice_line_mut(line).unwrap().company_amount = Some(dec!(1745.50));

    engine.post_invoices(&mut world.store, &[invoice]).unwrap();
    assert_eq!(world.fields(id).value, Some(dec!(1745.50)));
}

#[test]
fn company_amount_converts_invoice_currency() {
    let mut world = World::new();
    world.store.currencies.add_rate("EUR", date(2024, 1, 1), dec!(1));
    world.store.currencies.add_rate("USD", date(2024, 1, 1), dec!(1.25));
    let engine = IntrastatEngine::builder(IntrastatConfig::default())
        .amount_provider(CompanyAmount)
        .build();
    let id = done_sale(&mut world, &engine);
    let invoice = world.invoice(id, dec!(20), dec!(1900));
    world.store.invoice_mut(invoice).unwrap().currency = "USD".into();

    engine.post_invoices(&mut world.store, &[invoice]).unwrap();
    let value = world.fields(id).value;
    assert_eq!(value, Some(dec!(1520.00)));
    assert_eq!(value.unwrap().to_string(), "1520.00");
}

// --- Cancel and reset to draft ---

#[test]
fn cancelled_invoice_resets_move() {
    let mut world = World::new();
    let engine = IntrastatEngine::new(IntrastatConfig::default());
    let id = done_sale(&mut world, &engine);
    let invoice = world.invoice(id, dec!(20), dec!(1750));
    engine.post_invoices(&mut world.store, &[invoice]).unwrap();

    let report = engine.cancel_invoices(&mut world.store, &[invoice]).unwrap();
    assert_eq!(report.to_string(), "0 updated, 1 reset, 0 skipped");

    let move_ = world.store.move_(id).unwrap();
    assert!(move_.intrastat_cancelled);
    assert_eq!(move_.intrastat, IntrastatFields::default());
    assert_eq!(move_.internal_weight, None);
    assert_eq!(world.store.invoice(invoice).unwrap().state, InvoiceState::Cancelled);
}

#[test]
fn draft_restores_cancelled_move() {
    let mut world = World::new();
    let engine = IntrastatEngine::new(IntrastatConfig::default());
    let id = done_sale(&mut world, &engine);
    let invoice = world.invoice(id, dec!(20), dec!(1750));
    engine.post_invoices(&mut world.store, &[invoice]).unwrap();
    engine.cancel_invoices(&mut world.store, &[invoice]).unwrap();

    let report = engine.draft_invoices(&mut world.store, &[invoice]).unwrap();
    assert_eq!(report.updated, 1);

    let move_ = world.store.move_(id).unwrap();
    assert!(!move_.intrastat_cancelled);
    assert_eq!(move_.intrastat.intrastat_type, Some(IntrastatType::Dispatch));
    // the draft invoice no longer counts
    assert_eq!(move_.intrastat.value, Some(dec!(1800.00)));
    assert_eq!(move_.internal_weight, Some(dec!(60)));
    assert!(move_.intrastat.declaration.is_some());
}

#[test]
fn draft_leaves_other_moves_alone() {
    let mut world = World::new();
    let engine = IntrastatEngine::new(IntrastatConfig::default());
    let id = done_sale(&mut world, &engine);
    let invoice = world.invoice(id, dec!(20), dec!(1750));
    let before = world.fields(id).clone();

    let report = engine.draft_invoices(&mut world.store, &[invoice]).unwrap();
    assert_eq!(report, UpdateReport::default());
    assert_eq!(world.fields(id), &before);
}

// --- Updates ---

#[test]
fn update_follows_master_data() {
    let mut world = World::new();
    let engine = IntrastatEngine::new(IntrastatConfig::default());
    let id = done_sale(&mut world, &engine);
    let chairs = world.store.add_tariff_code(TariffCode {
        code: "9401 71 00".into(),
        ..Default::default()
    });
    let desk = world.store.product_mut(world.desk).unwrap();
    desk.tariff_codes.insert(
        0,
        ProductTariffCode {
            tariff_code: chairs,
            country: Some("FR".into()),
            ..Default::default()
        },
    );
    desk.country_of_origin = Some("VN".into());
    world.store.move_mut(id).unwrap().intrastat.transport = Some(Transport::new("1", "Sea"));

    let report = engine
        .update_intrastat_declaration(&mut world.store, &[id])
        .unwrap();
    assert_eq!(report.updated, 1);

    let fields = world.fields(id);
    assert_eq!(fields.tariff_code, Some(chairs));
    assert_eq!(fields.country_of_origin.as_deref(), Some("VN"));
    // kept: only filled when empty
    assert_eq!(fields.transport, Some(Transport::new("1", "Sea")));
    assert_eq!(fields.additional_unit, Some(dec!(20)));
}

#[test]
fn update_is_idempotent() {
    let mut world = World::new();
    let engine = IntrastatEngine::new(IntrastatConfig::default());
    let id = done_sale(&mut world, &engine);
    let invoice = world.invoice(id, dec!(20), dec!(1750));
    engine.post_invoices(&mut world.store, &[invoice]).unwrap();

    engine.update_intrastat_values(&mut world.store, &[id]).unwrap();
    let once = world.store.move_(id).unwrap().clone();
    engine.update_intrastat_values(&mut world.store, &[id]).unwrap();
    let twice = world.store.move_(id).unwrap();
    assert_eq!(once.intrastat, twice.intrastat);
    assert_eq!(once.internal_weight, twice.internal_weight);
}

#[test]
fn closed_declaration_is_skipped() {
    let mut world = World::new();
    let engine = IntrastatEngine::new(IntrastatConfig::default());
    let id = done_sale(&mut world, &engine);
    let declaration = world.fields(id).declaration.unwrap();
    world.store.declaration_mut(declaration).unwrap().state = DeclarationState::Closed;
    world.store.product_mut(world.desk).unwrap().country_of_origin = Some("VN".into());

    let report = engine
        .update_period(&mut world.store, world.company, date(2024, 6, 1), date(2024, 6, 30))
        .unwrap();
    assert_eq!(report.skipped, 1);
    assert_eq!(world.fields(id).country_of_origin.as_deref(), Some("CN"));
}

#[test]
fn late_move_reopens_closed_declaration() {
    let mut world = World::new();
    let engine = IntrastatEngine::new(IntrastatConfig::default());
    let id = done_sale(&mut world, &engine);
    let declaration = world.fields(id).declaration.unwrap();
    world.store.declaration_mut(declaration).unwrap().state = DeclarationState::Closed;

    let late = world.sale_move(dec!(1), dec!(90));
    engine
        .do_moves(&mut world.store, &[late], date(2024, 7, 3))
        .unwrap();
    assert_eq!(world.fields(late).declaration, Some(declaration));
    assert_eq!(
        world.store.declaration(declaration).unwrap().state,
        DeclarationState::Opened
    );
}

#[test]
fn update_period_picks_supplier_country() {
    let mut world = World::new();
    let engine = IntrastatEngine::new(IntrastatConfig::default());
    let shipment = world.shipment(ShipmentKind::In, Some(world.supplier));
    let id = world.add_move(shipment, world.supplier_location, world.input, dec!(5), dec!(150));
    engine
        .do_moves(&mut world.store, &[id], date(2024, 6, 15))
        .unwrap();
    world.store.shipment_mut(shipment).unwrap().address =
        Some(AddressBuilder::new("DE").build());

    engine
        .update_period(&mut world.store, world.company, date(2024, 6, 1), date(2024, 6, 30))
        .unwrap();
    assert_eq!(
        world.store.shipment(shipment).unwrap().intrastat_from_country.as_deref(),
        Some("DE")
    );
    assert_eq!(world.fields(id).country.as_deref(), Some("DE"));
}

#[test]
fn failed_batch_leaves_store_untouched() {
    let mut world = World::new();
    let engine = IntrastatEngine::new(IntrastatConfig::default());
    let id = world.sale_move(dec!(20), dec!(90));
    let err = engine
        .do_moves(&mut world.store, &[id, MoveId(9999)], date(2024, 6, 15))
        .unwrap_err();
    assert!(matches!(err, IntrastatError::MissingRecord { kind: "move", .. }));
    let move_ = world.store.move_(id).unwrap();
    assert_eq!(move_.state, MoveState::Draft);
    assert_eq!(move_.intrastat, IntrastatFields::default());
}

#[test]
fn copied_move_starts_blank() {
    let mut world = World::new();
    let engine = IntrastatEngine::new(IntrastatConfig::default());
    let id = done_sale(&mut world, &engine);
    let copy = engine.copy_move(&mut world.store, id).unwrap();
    let copied = world.store.move_(copy).unwrap();
    assert_eq!(copied.state, MoveState::Draft);
    assert_eq!(copied.intrastat, IntrastatFields::default());
    assert_eq!(copied.quantity, dec!(20));
    assert_eq!(copied.shipment, world.store.move_(id).unwrap().shipment);
}
