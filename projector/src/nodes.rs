//! Staking-contract handlers: node lifecycle and stake counters.

use stakescan_store::{NodeRecord, UnitOfWork};
use stakescan_types::{Address, Amount};

use crate::amounts::add;
use crate::projector::{Applied, EventContext};
use crate::ProjectionError;

fn known_node<U: UnitOfWork>(
    unit: &U,
    node: Address,
    event: &'static str,
) -> Result<NodeRecord, ProjectionError> {
    unit.node(&node)?
        .ok_or(ProjectionError::UnknownNode { event, node })
}

pub(crate) fn registered<U: UnitOfWork>(
    unit: &mut U,
    ctx: &EventContext<'_>,
    node: Address,
    node_type: u8,
) -> Result<Applied, ProjectionError> {
    let mut record = unit.node(&node)?.unwrap_or_else(|| NodeRecord::new(node));
    let mut totals = unit.totals()?;

    if !record.active {
        totals.active_nodes = totals
            .active_nodes
            .checked_add(1)
            .ok_or(ProjectionError::Overflow {
                field: "active_nodes",
            })?;
    }
    record.node_type = node_type;
    record.active = true;
    record.faulty = false;
    record.registered = Some(ctx.at);
    record.deactivated = None;
    record.faulted = None;
    record.recovered = None;

    unit.put_node(&record)?;
    unit.put_totals(&totals)?;
    Ok(Applied::Projected)
}

pub(crate) fn deactivated<U: UnitOfWork>(
    unit: &mut U,
    ctx: &EventContext<'_>,
    node: Address,
) -> Result<Applied, ProjectionError> {
    let mut record = known_node(unit, node, "Deactivated")?;
    let mut totals = unit.totals()?;

    if record.active {
        totals.active_nodes = totals.active_nodes.saturating_sub(1);
    }
    record.active = false;
    record.deactivated = Some(ctx.at);

    unit.put_node(&record)?;
    unit.put_totals(&totals)?;
    Ok(Applied::Projected)
}

pub(crate) fn faulted<U: UnitOfWork>(
    unit: &mut U,
    ctx: &EventContext<'_>,
    node: Address,
) -> Result<Applied, ProjectionError> {
    let mut record = known_node(unit, node, "Faulted")?;
    record.faulty = true;
    record.faulted = Some(ctx.at);
    unit.put_node(&record)?;
    Ok(Applied::Projected)
}

pub(crate) fn recovered<U: UnitOfWork>(
    unit: &mut U,
    ctx: &EventContext<'_>,
    node: Address,
) -> Result<Applied, ProjectionError> {
    let mut record = known_node(unit, node, "Recovered")?;
    record.faulty = false;
    record.recovered = Some(ctx.at);
    unit.put_node(&record)?;
    Ok(Applied::Projected)
}

pub(crate) fn staked<U: UnitOfWork>(
    unit: &mut U,
    node: Address,
    amount: Amount,
) -> Result<Applied, ProjectionError> {
    let mut record = unit.node(&node)?.unwrap_or_else(|| NodeRecord::new(node));
    let mut totals = unit.totals()?;

    record.total_staked = add(record.total_staked, amount, "node.total_staked")?;
    totals.total_staked = add(totals.total_staked, amount, "total_staked")?;

    unit.put_node(&record)?;
    unit.put_totals(&totals)?;
    Ok(Applied::Projected)
}

pub(crate) fn unstaked<U: UnitOfWork>(
    unit: &mut U,
    ctx: &EventContext<'_>,
    node: Address,
    amount: Amount,
) -> Result<Applied, ProjectionError> {
    let mut record = unit.node(&node)?.unwrap_or_else(|| NodeRecord::new(node));
    let mut totals = unit.totals()?;

    record.total_unstaked = add(record.total_unstaked, amount, "node.total_unstaked")?;
    record.unstake_maturity_block = Some(ctx.params.unlock_height(ctx.height));
    totals.total_unstaked = add(totals.total_unstaked, amount, "total_unstaked")?;

    unit.put_node(&record)?;
    unit.put_totals(&totals)?;
    Ok(Applied::Projected)
}
