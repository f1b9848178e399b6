//! Token-contract handlers: balances, mint-side counters, credits.

use stakescan_store::{AccountRecord, UnitOfWork};
use stakescan_types::{Address, Amount};

use crate::amounts::{add, set_balance, sub_clamped};
use crate::projector::{Applied, EventContext};
use crate::ProjectionError;

pub(crate) fn load_account<U: UnitOfWork>(
    unit: &U,
    address: Address,
) -> Result<AccountRecord, ProjectionError> {
    Ok(unit
        .account(&address)?
        .unwrap_or_else(|| AccountRecord::new(address)))
}

pub(crate) fn transfer<U: UnitOfWork>(
    unit: &mut U,
    ctx: &EventContext<'_>,
    from: Address,
    to: Address,
    value: Amount,
) -> Result<Applied, ProjectionError> {
    if from.is_zero() && to.is_zero() {
        return Ok(Applied::NoChange);
    }
    if from == to {
        let mut account = load_account(unit, from)?;
        account.touch(ctx.at);
        unit.put_account(&account)?;
        return Ok(Applied::Projected);
    }

    let mut totals = unit.totals()?;
    let mut sender = if from.is_zero() {
        None
    } else {
        Some(load_account(unit, from)?)
    };
    let mut receiver = if to.is_zero() {
        None
    } else {
        Some(load_account(unit, to)?)
    };
    let credited = match &receiver {
        Some(r) => Some(add(r.balance, value, "balance")?),
        None => None,
    };

    if let Some(sender) = sender.as_mut() {
        let debited = sub_clamped(sender.balance, value, "balance");
        set_balance(sender, debited, &mut totals);
        sender.touch(ctx.at);
    }
    if let (Some(receiver), Some(credited)) = (receiver.as_mut(), credited) {
        set_balance(receiver, credited, &mut totals);
        receiver.touch(ctx.at);
    }

    if let Some(sender) = &sender {
        unit.put_account(sender)?;
    }
    if let Some(receiver) = &receiver {
        unit.put_account(receiver)?;
    }
    unit.put_totals(&totals)?;
    Ok(Applied::Projected)
}

/// Mint-class: lifetime counters only. The balance moves with the paired
/// Transfer from the zero address.
pub(crate) fn deposited<U: UnitOfWork>(
    unit: &mut U,
    ctx: &EventContext<'_>,
    address: Address,
    assets: Amount,
    shares: Amount,
    fee: Amount,
) -> Result<Applied, ProjectionError> {
    let mut account = load_account(unit, address)?;
    let mut totals = unit.totals()?;

    account.deposited = add(account.deposited, assets, "deposited")?;
    account.minted = add(account.minted, shares, "minted")?;
    account.fees_paid = add(account.fees_paid, fee, "fees_paid")?;
    totals.total_minted = add(totals.total_minted, shares, "total_minted")?;
    totals.asset_backing = add(totals.asset_backing, assets, "asset_backing")?;
    account.touch(ctx.at);

    unit.put_account(&account)?;
    unit.put_totals(&totals)?;
    Ok(Applied::Projected)
}

pub(crate) fn referral_rewarded<U: UnitOfWork>(
    unit: &mut U,
    ctx: &EventContext<'_>,
    referrer: Address,
    reward: Amount,
) -> Result<Applied, ProjectionError> {
    let mut account = load_account(unit, referrer)?;
    let mut totals = unit.totals()?;

    account.fees_earned = add(account.fees_earned, reward, "fees_earned")?;
    totals.total_referral_rewards =
        add(totals.total_referral_rewards, reward, "total_referral_rewards")?;
    account.touch(ctx.at);

    unit.put_account(&account)?;
    unit.put_totals(&totals)?;
    Ok(Applied::Projected)
}

pub(crate) fn rewards_distributed<U: UnitOfWork>(
    unit: &mut U,
    amount: Amount,
) -> Result<Applied, ProjectionError> {
    let mut totals = unit.totals()?;
    totals.asset_backing = add(totals.asset_backing, amount, "asset_backing")?;
    unit.put_totals(&totals)?;
    Ok(Applied::Projected)
}

pub(crate) fn credit_claimed<U: UnitOfWork>(
    unit: &mut U,
    ctx: &EventContext<'_>,
    address: Address,
    assets: Amount,
) -> Result<Applied, ProjectionError> {
    let mut account = load_account(unit, address)?;
    account.withdrawn = add(account.withdrawn, assets, "withdrawn")?;
    account.claimable_credits = sub_clamped(account.claimable_credits, assets, "claimable_credits");
    account.touch(ctx.at);
    unit.put_account(&account)?;
    Ok(Applied::Projected)
}
