//! Core records, store, units, currencies and errors.
//!
//! This module provides the ERP records the Intrastat engine reads (companies,
//! parties, products, shipments, stock moves, invoices, orders) and the
//! in-memory store that holds them.

mod builder;
pub mod countries;
pub mod currencies;
mod error;
mod store;
mod types;
pub mod units;

pub use builder::*;
pub use countries::in_intrastat;
pub use currencies::{CurrencyTable, currency_digits, round_amount};
pub use error::*;
pub use store::*;
pub use types::*;
pub use units::{Uom, UomCategory};
