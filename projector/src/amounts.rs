//! Checked amount arithmetic and holder bookkeeping shared by the handlers.

use stakescan_store::{AccountRecord, ProtocolTotals};
use stakescan_types::Amount;

use crate::ProjectionError;

pub(crate) fn add(current: Amount, delta: Amount, field: &'static str) -> Result<Amount, ProjectionError> {
    current
        .checked_add(delta)
        .ok_or(ProjectionError::Overflow { field })
}

/// `current - delta`, clamped at zero. Going negative means an event was
/// missed or misordered upstream, so it is logged loudly.
pub(crate) fn sub_clamped(current: Amount, delta: Amount, field: &'static str) -> Amount {
    match current.checked_sub(delta) {
        Some(value) => value,
        None => {
            tracing::error!(
                field,
                current = %current,
                delta = %delta,
                "amount would go negative, clamping to zero"
            );
            Amount::ZERO
        }
    }
}

/// Set an account balance and keep the holder counts in step with
/// zero/non-zero transitions.
pub(crate) fn set_balance(account: &mut AccountRecord, balance: Amount, totals: &mut ProtocolTotals) {
    let was_holder = account.is_holder();
    account.balance = balance;
    let is_holder = account.is_holder();

    if !was_holder && is_holder {
        totals.current_holders = totals.current_holders.saturating_add(1);
        if !account.ever_held {
            account.ever_held = true;
            totals.historical_holders = totals.historical_holders.saturating_add(1);
        }
    } else if was_holder && !is_holder {
        totals.current_holders = totals.current_holders.saturating_sub(1);
    }
}
