//! # intrastat
//!
//! Intrastat (EU trade-in-goods statistics) engine for stock moves: decides
//! whether a move is declared, values it, classifies it, and keeps those
//! figures consistent as invoices are posted, cancelled or reset to draft.
//!
//! All monetary values and quantities use [`rust_decimal::Decimal`], never
//! floating point, and are rounded half-to-even at each conversion boundary.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use intrastat::core::*;
//! use intrastat::intrastat::{IntrastatConfig, IntrastatEngine};
//! use rust_decimal_macros::dec;
//!
//! let mut store = Store::new();
//! let company_party = store.add_party(
//!     PartyBuilder::new("ACME BV").address(AddressBuilder::new("BE").build()).build(),
//! );
//! let company = store.add_company(Company { party: company_party, ..Default::default() });
//! let warehouse = store.add_warehouse(Warehouse {
//!     address: Some(AddressBuilder::new("BE").build()),
//!     ..Default::default()
//! });
//! let output = store.add_location(Location {
//!     kind: LocationKind::Output,
//!     warehouse: Some(warehouse),
//!     ..Default::default()
//! });
//! let customers = store.add_location(Location {
//!     kind: LocationKind::Customer,
//!     ..Default::default()
//! });
//! let customer = store.add_party(
//!     PartyBuilder::new("Client SARL")
//!         .address(AddressBuilder::new("FR").build())
//!         .eu_vat("FR40303265045")
//!         .build(),
//! );
//! let product = store.add_product(
//!     ProductBuilder::new("Desk", Uom::unit(), dec!(100)).country_of_origin("CN").build(),
//! );
//! let shipment = store.add_shipment(
//!     ShipmentBuilder::new(ShipmentKind::Out, company)
//!         .party(customer)
//!         .warehouse(warehouse)
//!         .build(),
//! );
//! let move_id = store
//!     .add_move(
//!         StockMoveBuilder::new(product, dec!(20), output, customers)
//!             .company(company)
//!             .shipment(shipment)
//!             .unit_price(dec!(90.0000), "EUR")
//!             .build(),
//!     )
//!     .unwrap();
//!
//! let engine = IntrastatEngine::new(IntrastatConfig::default());
//! let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
//! engine.do_moves(&mut store, &[move_id], today).unwrap();
//!
//! let done = store.move_(move_id).unwrap();
//! assert_eq!(done.intrastat.intrastat_type, Some(IntrastatType::Dispatch));
//! assert_eq!(done.intrastat.value, Some(dec!(1800.00)));
//! assert_eq!(done.intrastat.transaction.as_deref(), Some("11"));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Records, store, units, currencies, countries |
//! | `intrastat` (default) | Eligibility, valuation, classification, declaration updates |
//! | `subdivisions` | Intrastat subdivision code import (Spain) |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "intrastat")]
pub mod intrastat;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
