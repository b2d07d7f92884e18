//! Intrastat eligibility, valuation and classification of stock moves.
//!
//! [`IntrastatEngine`] ties the pieces together: it decides whether a move is
//! declared ([`intrastat_type`]), values it ([`Valuation`]), classifies it
//! through a [`Pipeline`] of steps, and keeps those figures in line with the
//! invoices billing the move.
//!
//! Missing master data never fails a computation: the field stays empty and
//! [`IntrastatEngine::check_moves`] reports it.

mod classification;
mod config;
mod discount;
mod eligibility;
mod invoice;
mod pipeline;
mod shipment;
#[cfg(feature = "subdivisions")]
pub mod subdivision;
mod update;
mod value;

pub use classification::{
    AdditionalUnitStep, CounterpartyStep, IncotermStep, OriginStep, SubdivisionStep,
    TariffCodeStep, TransactionStep, TransportStep, ValueStep, intrastat_quantity,
    tariff_code_pattern, transaction_code,
};
pub use config::{IntrastatConfig, IntrastatConfigBuilder};
pub use discount::{
    AmountProvider, CompanyAmount, LineAmount, get_invoice_intrastat_discount_per_line,
};
pub use eligibility::{
    intrastat_counterparty, intrastat_from_country, intrastat_to_country, intrastat_type,
    move_tax_intrastat_exempt,
};
pub use pipeline::{IntrastatStep, Pipeline, PipelineBuilder, RecomputeMode, StepContext};
pub use shipment::{
    incoterm_required, internal_currency, move_for_origin, on_change_carrier,
    on_change_contact_address, on_change_customer, on_change_internal_locations,
    on_change_supplier, to_warehouse, total_intrastat_value,
};
pub use update::{IntrastatEngine, IntrastatEngineBuilder, UpdateReport, internal_weight};
pub use value::{LandedCostProvider, LandedCostRegistry, Valuation};
