//! The engine: move lifecycle hooks and batch recomputation.
//!
//! Every mutating operation stages its writes on a copy of the store and
//! swaps it in once all moves went through, so an error leaves the caller's
//! store untouched.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use log::{debug, info};
use rust_decimal::Decimal;

use crate::core::*;

use super::config::IntrastatConfig;
use super::discount::{AmountProvider, LineAmount, get_invoice_intrastat_discount_per_line};
use super::eligibility::{self, intrastat_from_country, intrastat_to_country, shipment_of};
use super::pipeline::{Pipeline, RecomputeMode, StepContext};
use super::shipment::{on_change_customer, on_change_supplier};
use super::value::{LandedCostProvider, Valuation};

/// Outcome of a batch recomputation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Moves recomputed.
    pub updated: usize,
    /// Moves reset because an invoice billing them was cancelled.
    pub reset: usize,
    /// Moves left alone because their declaration is closed.
    pub skipped: usize,
}

impl fmt::Display for UpdateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} updated, {} reset, {} skipped",
            self.updated, self.reset, self.skipped
        )
    }
}

/// Weight of `quantity` of `product` in kilograms.
pub fn internal_weight(quantity: Decimal, unit: &Uom, product: &Product) -> Option<Decimal> {
    let kilogram = Uom::kilogram();
    if unit.category == UomCategory::Weight {
        return unit.compute_qty(quantity, &kilogram, false);
    }
    let (weight, weight_uom) = (product.weight?, product.weight_uom.as_ref()?);
    let quantity = unit.compute_qty(quantity, &product.default_uom, false)?;
    weight_uom.compute_qty(weight * quantity, &kilogram, false)
}

/// Intrastat engine: configuration, classification pipeline and the
/// collaborators chosen at construction.
///
/// ```
/// use intrastat::intrastat::{CompanyAmount, IntrastatConfig, IntrastatEngine, LandedCostRegistry};
///
/// let engine = IntrastatEngine::builder(IntrastatConfig::default())
///     .amount_provider(CompanyAmount)
///     .landed_cost(LandedCostRegistry::new())
///     .build();
/// assert_eq!(engine.config().value_digits, 2);
/// ```
pub struct IntrastatEngine {
    config: IntrastatConfig,
    pipeline: Pipeline,
    amounts: Box<dyn AmountProvider>,
    landed_cost: Option<Box<dyn LandedCostProvider>>,
}

/// Builder for [`IntrastatEngine`].
pub struct IntrastatEngineBuilder {
    config: IntrastatConfig,
    pipeline: Pipeline,
    amounts: Box<dyn AmountProvider>,
    landed_cost: Option<Box<dyn LandedCostProvider>>,
}

impl IntrastatEngineBuilder {
    pub fn new(config: IntrastatConfig) -> Self {
        Self {
            config,
            pipeline: Pipeline::default(),
            amounts: Box::new(LineAmount),
            landed_cost: None,
        }
    }

    /// Replace the classification pipeline.
    pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Choose which invoice line amount is declared.
    pub fn amount_provider(mut self, amounts: impl AmountProvider + 'static) -> Self {
        self.amounts = Box::new(amounts);
        self
    }

    /// Deduct landed costs reported by `provider` from move prices.
    pub fn landed_cost(mut self, provider: impl LandedCostProvider + 'static) -> Self {
        self.landed_cost = Some(Box::new(provider));
        self
    }

    pub fn build(self) -> IntrastatEngine {
        IntrastatEngine {
            config: self.config,
            pipeline: self.pipeline,
            amounts: self.amounts,
            landed_cost: self.landed_cost,
        }
    }
}

impl IntrastatEngine {
    /// Engine with the default pipeline, line amounts and no landed costs.
    pub fn new(config: IntrastatConfig) -> Self {
        IntrastatEngineBuilder::new(config).build()
    }

    pub fn builder(config: IntrastatConfig) -> IntrastatEngineBuilder {
        IntrastatEngineBuilder::new(config)
    }

    pub fn config(&self) -> &IntrastatConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn valuation(&self) -> Valuation<'_> {
        Valuation {
            config: &self.config,
            amounts: self.amounts.as_ref(),
            landed_cost: self.landed_cost.as_deref(),
        }
    }

    fn context<'a>(&'a self, store: &'a Store, mode: RecomputeMode) -> StepContext<'a> {
        StepContext {
            store,
            config: &self.config,
            valuation: self.valuation(),
            mode,
        }
    }

    /// Declaration direction of a stored move.
    pub fn intrastat_type(
        &self,
        store: &Store,
        move_id: MoveId,
    ) -> Result<Option<IntrastatType>, IntrastatError> {
        eligibility::intrastat_type(store, &self.config, store.move_(move_id)?)
    }

    /// Statistical value of a stored move.
    pub fn intrastat_value(
        &self,
        store: &Store,
        move_id: MoveId,
    ) -> Result<Option<Decimal>, IntrastatError> {
        self.valuation().intrastat_value(store, store.move_(move_id)?)
    }

    pub fn move_tax_intrastat_exempt(
        &self,
        store: &Store,
        move_id: MoveId,
    ) -> Result<bool, IntrastatError> {
        eligibility::move_tax_intrastat_exempt(store, &self.config, store.move_(move_id)?)
    }

    pub fn get_invoice_intrastat_discount_per_line(
        &self,
        store: &Store,
        invoices: &[InvoiceId],
    ) -> Result<BTreeMap<InvoiceLineId, Decimal>, IntrastatError> {
        let amounts = self.amounts.as_ref();
        get_invoice_intrastat_discount_per_line(store, &self.config, amounts, invoices)
    }

    /// Resolve the declaration direction of `move_`, then run the
    /// classification pipeline over it.
    ///
    /// Undeclared moves lose every classification field and keep only their
    /// statistical value.
    pub fn set_intrastat(
        &self,
        store: &Store,
        move_: &mut StockMove,
        mode: RecomputeMode,
    ) -> Result<(), IntrastatError> {
        let intrastat_type = eligibility::intrastat_type(store, &self.config, move_)?;
        move_.intrastat.intrastat_type = intrastat_type;
        if intrastat_type.is_none() {
            move_.intrastat.clear_classification();
        }
        self.pipeline.run(&self.context(store, mode), move_)
    }

    /// Mark moves done and compute their Intrastat fields.
    ///
    /// Moves without an effective date get `today`. Returns the data
    /// warnings of the moves of companies reporting Intrastat.
    pub fn do_moves(
        &self,
        store: &mut Store,
        moves: &[MoveId],
        today: NaiveDate,
    ) -> Result<Vec<IntrastatWarning>, IntrastatError> {
        let mut staged = store.clone();
        let mut done = Vec::with_capacity(moves.len());
        for id in moves {
            let mut move_ = staged.move_(*id)?.clone();
            move_.state = MoveState::Done;
            move_.effective_date.get_or_insert(today);
            self.set_intrastat(&staged, &mut move_, RecomputeMode::FillMissing)?;
            if move_.internal_weight.is_none() {
                let product = staged.product(move_.product)?;
                move_.internal_weight = internal_weight(move_.quantity, &move_.unit, product);
            }
            done.push(move_);
        }
        assign_declarations(&mut staged, &mut done)?;
        staged.write_moves(done);
        let warnings = self.check_moves(&staged, moves)?;
        *store = staged;
        info!("{} moves done, {} warnings", moves.len(), warnings.len());
        Ok(warnings)
    }

    /// Recompute the Intrastat fields of `moves` from current master data.
    ///
    /// Moves billed by a cancelled invoice are reset, moves of a closed
    /// declaration are left alone.
    pub fn update_intrastat_declaration(
        &self,
        store: &mut Store,
        moves: &[MoveId],
    ) -> Result<UpdateReport, IntrastatError> {
        let mut staged = store.clone();
        let report = self.update_staged(&mut staged, moves)?;
        *store = staged;
        Ok(report)
    }

    /// Same as [`update_intrastat_declaration`](Self::update_intrastat_declaration).
    pub fn update_intrastat_values(
        &self,
        store: &mut Store,
        moves: &[MoveId],
    ) -> Result<UpdateReport, IntrastatError> {
        self.update_intrastat_declaration(store, moves)
    }

    pub(crate) fn update_staged(
        &self,
        staged: &mut Store,
        moves: &[MoveId],
    ) -> Result<UpdateReport, IntrastatError> {
        let mut report = UpdateReport::default();
        let mut to_reset = Vec::new();
        let mut updated = Vec::new();
        for id in moves {
            let move_ = staged.move_(*id)?;
            if let Some(declaration) = move_.intrastat.declaration {
                if staged.declaration(declaration)?.state == DeclarationState::Closed {
                    debug!("move {id}: declaration {declaration} is closed");
                    report.skipped += 1;
                    continue;
                }
            }
            if billed_by_cancelled_invoice(staged, move_)? {
                to_reset.push(*id);
                continue;
            }
            if let Some(shipment) = move_.shipment {
                let kind = staged.shipment(shipment)?.kind;
                match kind {
                    ShipmentKind::In => on_change_supplier(staged, shipment)?,
                    ShipmentKind::OutReturn => on_change_customer(staged, shipment)?,
                    _ => {}
                }
            }

            let mut move_ = staged.move_(*id)?.clone();
            self.set_intrastat(staged, &mut move_, RecomputeMode::Update)?;
            if move_.internal_weight.is_none() {
                let product = staged.product(move_.product)?;
                move_.internal_weight = Some(
                    internal_weight(move_.quantity, &move_.unit, product).unwrap_or_default(),
                );
            }
            updated.push(move_);
        }
        report.updated = updated.len();
        assign_declarations(staged, &mut updated)?;
        staged.write_moves(updated);

        report.reset = to_reset.len();
        reset_moves(staged, &to_reset)?;
        info!("intrastat update: {report}");
        Ok(report)
    }

    /// Clear every Intrastat field of `moves`, weight included, and flag them
    /// as cancelled.
    pub fn reset_intrastat(
        &self,
        store: &mut Store,
        moves: &[MoveId],
    ) -> Result<(), IntrastatError> {
        let mut staged = store.clone();
        reset_moves(&mut staged, moves)?;
        *store = staged;
        Ok(())
    }

    /// Recompute the done supplier and customer moves of `company` whose
    /// effective date falls within `start..=end`.
    pub fn update_period(
        &self,
        store: &mut Store,
        company: CompanyId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<UpdateReport, IntrastatError> {
        if !store.company(company)?.intrastat {
            return Ok(UpdateReport::default());
        }
        let mut moves = Vec::new();
        for move_ in store.moves.values() {
            if move_.company != company
                || move_.state != MoveState::Done
                || !move_.effective_date.is_some_and(|d| start <= d && d <= end)
            {
                continue;
            }
            if shipment_of(store, move_)?.is_some_and(|s| !s.kind.is_internal()) {
                moves.push(move_.id);
            }
        }
        info!("intrastat update {start}..{end}: {} moves", moves.len());
        self.update_intrastat_declaration(store, &moves)
    }

    /// Data warnings for declared moves of companies reporting Intrastat.
    pub fn check_moves(
        &self,
        store: &Store,
        moves: &[MoveId],
    ) -> Result<Vec<IntrastatWarning>, IntrastatError> {
        let mut warnings = Vec::new();
        for id in moves {
            let move_ = store.move_(*id)?;
            if !store.company(move_.company)?.intrastat || move_.intrastat_cancelled {
                continue;
            }
            let fields = &move_.intrastat;
            let Some(intrastat_type) = fields.intrastat_type else {
                if crosses_border_unknown(store, move_)? {
                    warnings.push(IntrastatWarning::new(
                        *id,
                        "intrastat_country",
                        "counterparty country unknown",
                    ));
                }
                continue;
            };
            let mut missing = |present: bool, field: &str, message: &str| {
                if !present {
                    warnings.push(IntrastatWarning::new(*id, field, message));
                }
            };
            missing(fields.tariff_code.is_some(), "intrastat_tariff_code", "no tariff code");
            missing(fields.incoterm.is_some(), "intrastat_incoterm", "no incoterm");
            missing(fields.subdivision.is_some(), "intrastat_subdivision", "no subdivision");
            if intrastat_type == IntrastatType::Dispatch {
                missing(fields.vat.is_some(), "intrastat_vat", "no counterparty VAT");
                missing(
                    fields.country_of_origin.is_some(),
                    "intrastat_country_of_origin",
                    "no country of origin",
                );
            }
        }
        Ok(warnings)
    }

    /// Duplicate a move as a new draft, without its Intrastat data.
    pub fn copy_move(&self, store: &mut Store, move_id: MoveId) -> Result<MoveId, IntrastatError> {
        let original = store.move_(move_id)?;
        let copy = StockMove {
            state: MoveState::Draft,
            effective_date: None,
            invoice_lines: Vec::new(),
            intrastat: IntrastatFields::default(),
            intrastat_cancelled: false,
            ..original.clone()
        };
        store.add_move(copy)
    }
}

fn billed_by_cancelled_invoice(store: &Store, move_: &StockMove) -> Result<bool, IntrastatError> {
    for line in &move_.invoice_lines {
        if let Some(invoice) = store.invoice_line(*line)?.invoice {
            if store.invoice(invoice)?.state == InvoiceState::Cancelled {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

fn crosses_border_unknown(store: &Store, move_: &StockMove) -> Result<bool, IntrastatError> {
    let external = |location: LocationId| -> Result<bool, IntrastatError> {
        Ok(matches!(
            store.location(location)?.kind,
            LocationKind::Customer | LocationKind::Supplier
        ))
    };
    if external(move_.from_location)? {
        return Ok(intrastat_from_country(store, move_)?.is_none());
    }
    if external(move_.to_location)? {
        return Ok(intrastat_to_country(store, move_)?.is_none());
    }
    Ok(false)
}

fn reset_moves(store: &mut Store, moves: &[MoveId]) -> Result<(), IntrastatError> {
    for id in moves {
        let move_ = store.move_mut(*id)?;
        move_.intrastat.clear();
        move_.internal_weight = None;
        move_.intrastat_cancelled = true;
        debug!("move {id}: intrastat reset");
    }
    Ok(())
}

/// Attach declared moves to the declaration of their company, warehouse
/// country and month. Assigning a move to a closed declaration reopens it.
fn assign_declarations(store: &mut Store, moves: &mut [StockMove]) -> Result<(), IntrastatError> {
    for move_ in moves {
        let key = match (
            move_.intrastat.intrastat_type,
            &move_.intrastat.warehouse_country,
            move_.effective_date,
        ) {
            (Some(_), Some(country), Some(date)) => Some((country.clone(), date)),
            _ => None,
        };
        let Some((country, date)) = key else {
            move_.intrastat.declaration = None;
            continue;
        };
        let id = store.declaration_for(move_.company, &country, date);
        if move_.intrastat.declaration != Some(id) {
            let declaration = store.declaration_mut(id)?;
            if declaration.state == DeclarationState::Closed {
                info!("reopening declaration {id} for move {}", move_.id);
                declaration.state = DeclarationState::Opened;
            }
            move_.intrastat.declaration = Some(id);
        }
    }
    Ok(())
}
