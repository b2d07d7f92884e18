//! Invoice transitions and their effect on the moves they bill.

use log::info;

use crate::core::*;

use super::update::{IntrastatEngine, UpdateReport};

fn billed_moves(store: &Store, invoices: &[InvoiceId]) -> Result<Vec<MoveId>, IntrastatError> {
    let mut moves = Vec::new();
    for invoice in invoices {
        for line in &store.invoice(*invoice)?.lines {
            for move_id in &store.invoice_line(*line)?.stock_moves {
                if !moves.contains(move_id) {
                    moves.push(*move_id);
                }
            }
        }
    }
    Ok(moves)
}

fn set_state(
    store: &mut Store,
    invoices: &[InvoiceId],
    state: InvoiceState,
) -> Result<(), IntrastatError> {
    for invoice in invoices {
        store.invoice_mut(*invoice)?.state = state;
    }
    Ok(())
}

impl IntrastatEngine {
    /// Post `invoices` and revalue the moves they bill.
    pub fn post_invoices(
        &self,
        store: &mut Store,
        invoices: &[InvoiceId],
    ) -> Result<UpdateReport, IntrastatError> {
        let mut staged = store.clone();
        set_state(&mut staged, invoices, InvoiceState::Posted)?;
        let moves = billed_moves(&staged, invoices)?;
        let report = self.update_staged(&mut staged, &moves)?;
        *store = staged;
        info!("{} invoices posted: {report}", invoices.len());
        Ok(report)
    }

    /// Cancel `invoices` and take the moves they bill out of the
    /// declarations.
    pub fn cancel_invoices(
        &self,
        store: &mut Store,
        invoices: &[InvoiceId],
    ) -> Result<UpdateReport, IntrastatError> {
        let mut staged = store.clone();
        set_state(&mut staged, invoices, InvoiceState::Cancelled)?;
        let moves = billed_moves(&staged, invoices)?;
        for id in &moves {
            let move_ = staged.move_mut(*id)?;
            if move_.intrastat.intrastat_type.is_some() {
                move_.intrastat_cancelled = true;
                move_.intrastat.intrastat_type = None;
                move_.intrastat.declaration = None;
            }
        }
        let report = self.update_staged(&mut staged, &moves)?;
        *store = staged;
        info!("{} invoices cancelled: {report}", invoices.len());
        Ok(report)
    }

    /// Reset `invoices` to draft and bring back the moves a cancellation
    /// took out.
    pub fn draft_invoices(
        &self,
        store: &mut Store,
        invoices: &[InvoiceId],
    ) -> Result<UpdateReport, IntrastatError> {
        let mut staged = store.clone();
        set_state(&mut staged, invoices, InvoiceState::Draft)?;
        let mut restored = Vec::new();
        for id in billed_moves(&staged, invoices)? {
            let move_ = staged.move_mut(id)?;
            if move_.intrastat_cancelled {
                move_.intrastat_cancelled = false;
                restored.push(id);
            }
        }
        let report = self.update_staged(&mut staged, &restored)?;
        *store = staged;
        info!("{} invoices reset to draft: {report}", invoices.len());
        Ok(report)
    }
}
