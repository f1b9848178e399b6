//! Redemption queue handlers.

use stakescan_store::{RedemptionRequest, RedemptionStatus, UnitOfWork};
use stakescan_types::{Address, Amount};

use crate::accounts::load_account;
use crate::amounts::{add, sub_clamped};
use crate::projector::{Applied, EventContext};
use crate::ProjectionError;

pub(crate) struct BurnRequest {
    pub account: Address,
    pub queue_index: u64,
    pub shares: Amount,
    pub expected_assets: Amount,
    pub tip: Amount,
}

pub(crate) fn burn_queued<U: UnitOfWork>(
    unit: &mut U,
    ctx: &EventContext<'_>,
    burn: BurnRequest,
) -> Result<Applied, ProjectionError> {
    if unit.redemption(&burn.account, burn.queue_index)?.is_some() {
        return Err(ProjectionError::DuplicateRedemption {
            account: burn.account,
            queue_index: burn.queue_index,
        });
    }
    let mut account = load_account(unit, burn.account)?;
    let mut totals = unit.totals()?;

    account.burned = add(account.burned, burn.shares, "burned")?;
    account.fees_paid = add(account.fees_paid, burn.tip, "fees_paid")?;
    totals.total_burned = add(totals.total_burned, burn.shares, "total_burned")?;
    account.touch(ctx.at);

    let request = RedemptionRequest {
        account: burn.account,
        queue_index: burn.queue_index,
        shares: burn.shares,
        expected_assets: burn.expected_assets,
        tip: burn.tip,
        requested: ctx.at,
        unlock_block: ctx.params.unlock_height(ctx.height),
        status: RedemptionStatus::Pending,
        credited: None,
        credited_assets: None,
        keeper: None,
    };

    unit.put_redemption(&request)?;
    unit.put_account(&account)?;
    unit.put_totals(&totals)?;
    Ok(Applied::Projected)
}

pub(crate) fn credit_assigned<U: UnitOfWork>(
    unit: &mut U,
    ctx: &EventContext<'_>,
    account: Address,
    queue_index: u64,
    keeper: Address,
    assets: Amount,
) -> Result<Applied, ProjectionError> {
    let mut request = unit
        .redemption(&account, queue_index)?
        .ok_or(ProjectionError::MissingRedemption {
            account,
            queue_index,
        })?;

    if !request.is_pending() {
        tracing::debug!(%account, queue_index, "redemption already credited");
        return Ok(Applied::NoChange);
    }
    if !request.is_unlocked_at(ctx.height) {
        tracing::info!(
            %account,
            queue_index,
            height = ctx.height,
            unlock_block = request.unlock_block,
            "credit before unlock height, request stays pending"
        );
        return Ok(Applied::NoChange);
    }

    let mut totals = unit.totals()?;
    let mut holder = load_account(unit, account)?;
    holder.claimable_credits = add(holder.claimable_credits, assets, "claimable_credits")?;
    holder.touch(ctx.at);

    // The keeper may be the account itself.
    let mut keeper_record = if keeper == account || keeper.is_zero() {
        None
    } else {
        Some(load_account(unit, keeper)?)
    };
    if !keeper.is_zero() {
        let target = keeper_record.as_mut().unwrap_or(&mut holder);
        target.fees_earned = add(target.fees_earned, request.tip, "fees_earned")?;
        target.touch(ctx.at);
    }

    totals.total_keeper_tips = add(totals.total_keeper_tips, request.tip, "total_keeper_tips")?;
    totals.asset_backing = sub_clamped(totals.asset_backing, assets, "asset_backing");

    request.status = RedemptionStatus::Credited;
    request.credited = Some(ctx.at);
    request.credited_assets = Some(assets);
    request.keeper = Some(keeper);

    unit.put_redemption(&request)?;
    unit.put_account(&holder)?;
    if let Some(keeper_record) = &keeper_record {
        unit.put_account(keeper_record)?;
    }
    unit.put_totals(&totals)?;
    Ok(Applied::Projected)
}
