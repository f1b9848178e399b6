//! ABI declarations of the events the two indexed contracts emit.

use alloy_sol_types::sol;

sol! {
    interface IStaking {
        event Registered(address indexed node, uint8 node_type);
        event Deactivated(address indexed node);
        event Faulted(address indexed node);
        event Recovered(address indexed node);
        event Staked(address indexed node, uint256 amount);
        event Unstaked(address indexed node, uint256 amount);
        event RewardsDistributed(uint256 amount);
    }

    interface IToken {
        event Transfer(address indexed from, address indexed to, uint256 value);
        event Deposited(address indexed account, uint256 assets, uint256 shares, uint256 fee);
        event ReferralRewarded(address indexed referrer, address indexed depositor, uint256 reward);
        event BurnQueued(
            address indexed account,
            uint256 indexed queue_index,
            uint256 shares,
            uint256 expected_assets,
            uint256 tip
        );
        event CreditAssigned(
            address indexed account,
            uint256 indexed queue_index,
            address indexed keeper,
            uint256 assets
        );
        event CreditClaimed(address indexed account, uint256 assets);
    }
}
