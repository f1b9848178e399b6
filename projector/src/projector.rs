//! Dispatch from decoded events to their handlers.

use stakescan_store::{Activity, RawEvent, UnitOfWork};
use stakescan_types::{ContractEvent, ProjectionParams};

use crate::{accounts, nodes, redemptions, ProjectionError};

/// What applying one event did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Applied {
    /// Derived state changed.
    Projected,
    /// Valid event with nothing to do (already credited, not yet unlocked,
    /// zero-address transfer).
    NoChange,
    /// The raw event carries no decoded payload.
    Undecoded,
}

/// Where and when the event being applied happened.
pub(crate) struct EventContext<'a> {
    pub height: u64,
    pub at: Activity,
    pub params: &'a ProjectionParams,
}

#[derive(Clone, Debug, Default)]
pub struct Projector {
    params: ProjectionParams,
}

impl Projector {
    pub fn new(params: ProjectionParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ProjectionParams {
        &self.params
    }

    /// Fold one event into derived state through `unit`.
    ///
    /// A non-fatal error (see [`ProjectionError::is_fatal`]) means nothing
    /// was written for this event.
    pub fn apply<U: UnitOfWork>(
        &self,
        unit: &mut U,
        event: &RawEvent,
    ) -> Result<Applied, ProjectionError> {
        let Some(decoded) = &event.decoded else {
            return Ok(Applied::Undecoded);
        };
        let ctx = EventContext {
            height: event.block_height,
            at: Activity::new(event.block_height, event.block_timestamp),
            params: &self.params,
        };

        match decoded {
            ContractEvent::Registered { node, node_type } => {
                nodes::registered(unit, &ctx, *node, *node_type)
            }
            ContractEvent::Deactivated { node } => nodes::deactivated(unit, &ctx, *node),
            ContractEvent::Faulted { node } => nodes::faulted(unit, &ctx, *node),
            ContractEvent::Recovered { node } => nodes::recovered(unit, &ctx, *node),
            ContractEvent::Staked { node, amount } => nodes::staked(unit, *node, *amount),
            ContractEvent::Unstaked { node, amount } => {
                nodes::unstaked(unit, &ctx, *node, *amount)
            }
            ContractEvent::RewardsDistributed { amount } => {
                accounts::rewards_distributed(unit, *amount)
            }
            ContractEvent::Transfer { from, to, value } => {
                accounts::transfer(unit, &ctx, *from, *to, *value)
            }
            ContractEvent::Deposited {
                account,
                assets,
                shares,
                fee,
            } => accounts::deposited(unit, &ctx, *account, *assets, *shares, *fee),
            ContractEvent::ReferralRewarded {
                referrer, reward, ..
            } => accounts::referral_rewarded(unit, &ctx, *referrer, *reward),
            ContractEvent::BurnQueued {
                account,
                queue_index,
                shares,
                expected_assets,
                tip,
            } => redemptions::burn_queued(
                unit,
                &ctx,
                redemptions::BurnRequest {
                    account: *account,
                    queue_index: *queue_index,
                    shares: *shares,
                    expected_assets: *expected_assets,
                    tip: *tip,
                },
            ),
            ContractEvent::CreditAssigned {
                account,
                queue_index,
                keeper,
                assets,
            } => redemptions::credit_assigned(unit, &ctx, *account, *queue_index, *keeper, *assets),
            ContractEvent::CreditClaimed { account, assets } => {
                accounts::credit_claimed(unit, &ctx, *account, *assets)
            }
        }
    }
}
