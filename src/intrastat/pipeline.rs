//! Ordered classification steps run over a move.
//!
//! The default order is:
//!
//! | Step | Fields |
//! |------|--------|
//! | `counterparty` | `country`, `warehouse_country`, `vat` |
//! | `transaction` | `transaction` |
//! | `tariff_code` | `tariff_code` |
//! | `additional_unit` | `additional_unit` |
//! | `country_of_origin` | `country_of_origin` |
//! | `subdivision` | `subdivision` |
//! | `transport` | `transport` |
//! | `incoterm` | `incoterm` |
//! | `value` | `value` |
//!
//! Later steps may read what earlier ones wrote: the transaction code needs
//! the VAT identifier, the additional unit needs the tariff code.

use log::debug;

use crate::core::{IntrastatError, StockMove, Store};

use super::classification::*;
use super::config::IntrastatConfig;
use super::value::Valuation;

/// How existing values on a move are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RecomputeMode {
    /// First computation: only empty fields are filled.
    #[default]
    FillMissing,
    /// Forced recomputation: fields derived from master data are overwritten,
    /// user-facing defaults (transport, incoterm, additional unit) are kept.
    Update,
}

/// What a step can read.
pub struct StepContext<'a> {
    pub store: &'a Store,
    pub config: &'a IntrastatConfig,
    pub valuation: Valuation<'a>,
    pub mode: RecomputeMode,
}

impl StepContext<'_> {
    /// Store `value` into `slot` according to the recompute mode.
    pub fn assign<T>(&self, slot: &mut Option<T>, value: Option<T>) {
        match self.mode {
            RecomputeMode::Update => *slot = value,
            RecomputeMode::FillMissing => {
                if slot.is_none() {
                    *slot = value;
                }
            }
        }
    }
}

/// One derivation rule of the classification.
pub trait IntrastatStep: Send + Sync {
    /// Stable name, used to position custom steps.
    fn name(&self) -> &'static str;

    /// Whether the step also runs on moves that are not declared.
    fn runs_undeclared(&self) -> bool {
        false
    }

    fn apply(&self, ctx: &StepContext<'_>, move_: &mut StockMove) -> Result<(), IntrastatError>;
}

/// Classification steps in execution order.
pub struct Pipeline {
    steps: Vec<Box<dyn IntrastatStep>>,
}

impl Default for Pipeline {
    fn default() -> Self {
        PipelineBuilder::new().build()
    }
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|step| step.name()).collect()
    }

    /// Run every step on `move_`. Steps of undeclared moves are skipped
    /// unless they opt in.
    pub fn run(&self, ctx: &StepContext<'_>, move_: &mut StockMove) -> Result<(), IntrastatError> {
        for step in &self.steps {
            if move_.intrastat.intrastat_type.is_none() && !step.runs_undeclared() {
                continue;
            }
            debug!("move {}: step {}", move_.id, step.name());
            step.apply(ctx, move_)?;
        }
        Ok(())
    }
}

/// Assembles a [`Pipeline`], starting from the default steps.
///
/// ```
/// use intrastat::intrastat::Pipeline;
///
/// let pipeline = Pipeline::builder().without("incoterm").build();
/// assert!(!pipeline.step_names().contains(&"incoterm"));
/// assert_eq!(pipeline.step_names().last(), Some(&"value"));
/// ```
pub struct PipelineBuilder {
    steps: Vec<Box<dyn IntrastatStep>>,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineBuilder {
    /// Builder holding the default steps.
    pub fn new() -> Self {
        Self {
            steps: vec![
                Box::new(CounterpartyStep),
                Box::new(TransactionStep),
                Box::new(TariffCodeStep),
                Box::new(AdditionalUnitStep),
                Box::new(OriginStep),
                Box::new(SubdivisionStep),
                Box::new(TransportStep),
                Box::new(IncotermStep),
                Box::new(ValueStep),
            ],
        }
    }

    /// Builder without any step.
    pub fn empty() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append a step.
    pub fn step(mut self, step: impl IntrastatStep + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Insert a step right after the step named `after`, or at the end when
    /// no step has that name.
    pub fn insert_after(mut self, after: &str, step: impl IntrastatStep + 'static) -> Self {
        let index = self
            .steps
            .iter()
            .position(|s| s.name() == after)
            .map_or(self.steps.len(), |i| i + 1);
        self.steps.insert(index, Box::new(step));
        self
    }

    /// Remove the step named `name`.
    pub fn without(mut self, name: &str) -> Self {
        self.steps.retain(|s| s.name() != name);
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline { steps: self.steps }
    }
}
