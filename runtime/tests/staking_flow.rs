//! End-to-end flows through the staking hub: delegation, reward
//! distribution, and the withdrawal queue, with the atomic call semantics
//! the execution environment guarantees.

use palisade_delegation::{DelegationError, WithdrawOutcome};
use palisade_registry::RegistryError;
use palisade_runtime::{HubError, StakingHub, Transfer};
use palisade_types::{AccountId, Epoch, StakingParams};

fn addr(name: &str) -> AccountId {
    AccountId::new(format!("pal_{name}"))
}

fn params() -> StakingParams {
    StakingParams {
        validator_min_stake: 1000,
        ..StakingParams::network_defaults()
    }
}

fn hub() -> StakingHub {
    StakingHub::new(addr("protocol"), params())
}

#[test]
fn matured_delegation_receives_the_full_reward() {
    // Scenario A: delegate at epoch 1, distribute at epoch 6.
    let mut hub = hub();
    let ledger = hub
        .register_delegated_validator(addr("sign"), false, 1000)
        .unwrap();
    hub.delegate_stake(&addr("dora"), &ledger, 100).unwrap();

    hub.debug_set_epoch(Epoch::new(6)).unwrap();
    hub.add_rewards(Epoch::new(5), vec![(addr("sign"), 1000)], 1000)
        .unwrap();

    assert_eq!(hub.ledger(&ledger).unwrap().accrued_rewards(&addr("dora")), 1000);
    // Distribution for epoch 5 lands the counter at 7.
    assert_eq!(hub.current_epoch(), Epoch::new(7));
}

#[test]
fn young_delegation_is_skipped_at_distribution() {
    // Scenario B: equal stakes, one from epoch 1 and one from epoch 7.
    let mut hub = hub();
    let ledger = hub
        .register_delegated_validator(addr("sign"), false, 1000)
        .unwrap();
    hub.delegate_stake(&addr("old"), &ledger, 100).unwrap();

    hub.debug_set_epoch(Epoch::new(7)).unwrap();
    hub.delegate_stake(&addr("young"), &ledger, 100).unwrap();

    hub.add_rewards(Epoch::new(6), vec![(addr("sign"), 1000)], 1000)
        .unwrap();

    let ledger_ref = hub.ledger(&ledger).unwrap();
    assert_eq!(ledger_ref.accrued_rewards(&addr("old")), 1000);
    assert_eq!(ledger_ref.accrued_rewards(&addr("young")), 0);
}

#[test]
fn queued_withdrawal_waits_four_epochs() {
    // Scenario C: the validator's balance is fully locked, so the reward
    // payout must queue until epoch current + 4.
    let mut hub = hub();
    let ledger = hub
        .register_delegated_validator(addr("sign"), true, 1000)
        .unwrap();
    hub.delegate_stake(&addr("dora"), &ledger, 100).unwrap();

    hub.debug_set_epoch(Epoch::new(6)).unwrap();
    hub.add_rewards(Epoch::new(5), vec![(addr("sign"), 1000)], 1000)
        .unwrap();
    assert_eq!(hub.current_epoch(), Epoch::new(7));

    // Snapshot the full (restaked) balance: nothing is withdrawable now.
    hub.lock_stake(&addr("protocol"), Epoch::new(7)).unwrap();
    let proxy = hub.ledger(&ledger).unwrap().proxy().clone();
    assert_eq!(hub.available_balance(&proxy).unwrap(), 0);

    let outcome = hub
        .request_withdraw_rewards(&addr("dora"), &ledger)
        .unwrap();
    assert_eq!(
        outcome,
        WithdrawOutcome::Queued {
            amount: 1000,
            unlock_epoch: Epoch::new(11),
        }
    );
    assert_eq!(outcome.to_string(), "wait until epoch 11");
    assert!(hub.transfers().is_empty());

    // Before the unlock epoch the withdrawal must fail without effect.
    let err = hub.withdraw_matured(&addr("dora"), &ledger).unwrap_err();
    assert!(matches!(
        err,
        HubError::Delegation(DelegationError::NoMaturedWithdrawals)
    ));
    assert_eq!(
        hub.ledger(&ledger).unwrap().total_queued_withdrawals(),
        1000
    );

    // An empty distribution for epoch 9 releases the snapshot and lands
    // the counter on the unlock epoch.
    hub.add_rewards(Epoch::new(9), vec![], 0).unwrap();
    assert_eq!(hub.current_epoch(), Epoch::new(11));

    let paid = hub.withdraw_matured(&addr("dora"), &ledger).unwrap();
    assert_eq!(paid, 1000);
    assert_eq!(
        hub.transfers().last(),
        Some(&Transfer {
            to: addr("dora"),
            amount: 1000
        })
    );
    assert_eq!(hub.ledger(&ledger).unwrap().total_queued_withdrawals(), 0);

    // Nothing left to collect.
    assert!(hub.withdraw_matured(&addr("dora"), &ledger).is_err());
}

#[test]
fn delegation_below_minimum_leaves_no_trace() {
    // Scenario D: the ledger minimum is 1% of the validator minimum.
    let mut hub = hub();
    let ledger = hub
        .register_delegated_validator(addr("sign"), false, 1000)
        .unwrap();
    assert_eq!(hub.minimum_stake_amount(&ledger).unwrap(), 10);

    let err = hub.delegate_stake(&addr("dora"), &ledger, 5).unwrap_err();
    assert!(matches!(
        err,
        HubError::Delegation(DelegationError::BelowMinimumDelegation { .. })
    ));
    assert!(hub.ledger(&ledger).unwrap().delegations().is_empty());
    assert_eq!(hub.staking_power(&ledger).unwrap(), 1000);
    assert!(hub.transfers().is_empty());
}

#[test]
fn failed_unstake_rolls_the_ledger_back() {
    // A queue-full failure aborts the whole unstake: the delegation
    // entries removed mid-operation must be restored.
    let mut hub = StakingHub::new(
        addr("protocol"),
        StakingParams {
            validator_min_stake: 1000,
            max_withdrawal_queue_len: 1,
            ..StakingParams::network_defaults()
        },
    );
    let ledger = hub
        .register_delegated_validator(addr("sign"), true, 1000)
        .unwrap();
    hub.delegate_stake(&addr("dora"), &ledger, 100).unwrap();
    hub.debug_set_epoch(Epoch::new(6)).unwrap();
    hub.add_rewards(Epoch::new(5), vec![(addr("sign"), 1000)], 1000)
        .unwrap();
    hub.lock_stake(&addr("protocol"), Epoch::new(7)).unwrap();

    // Fills the single queue slot.
    let outcome = hub
        .request_withdraw_rewards(&addr("dora"), &ledger)
        .unwrap();
    assert!(!outcome.is_paid());

    let before_power = hub.staking_power(&ledger).unwrap();
    let err = hub
        .request_unstake_delegated_stakes(&addr("dora"), &ledger)
        .unwrap_err();
    assert!(matches!(
        err,
        HubError::Delegation(DelegationError::WithdrawalQueueFull { .. })
    ));

    // Full rollback: the delegation entry and the stake both survive.
    let ledger_ref = hub.ledger(&ledger).unwrap();
    assert_eq!(ledger_ref.delegations_by(&addr("dora")).len(), 1);
    assert_eq!(ledger_ref.total_delegated_stake(), 100);
    assert_eq!(hub.staking_power(&ledger).unwrap(), before_power);
}

#[test]
fn rewards_without_callback_are_dropped_not_failed() {
    let mut hub = hub();
    let proxy = hub
        .register_validator(addr("owner"), addr("sign"), false, 1000)
        .unwrap();

    hub.add_rewards(Epoch::new(1), vec![(addr("sign"), 500)], 500)
        .unwrap();
    // The credit landed even though nothing consumed the notification.
    assert_eq!(hub.total_balance(&proxy).unwrap(), 1500);
}

#[test]
fn reward_total_mismatch_aborts_the_distribution() {
    let mut hub = hub();
    let proxy = hub
        .register_validator(addr("owner"), addr("sign"), false, 1000)
        .unwrap();

    let err = hub
        .add_rewards(Epoch::new(1), vec![(addr("sign"), 500)], 400)
        .unwrap_err();
    assert!(matches!(
        err,
        HubError::Registry(RegistryError::RewardTotalMismatch { .. })
    ));
    assert_eq!(hub.total_balance(&proxy).unwrap(), 1000);
    assert_eq!(hub.current_epoch(), Epoch::new(1));
}

#[test]
fn owner_gating_holds_across_the_proxy_surface() {
    let mut hub = hub();
    let proxy = hub
        .register_validator(addr("owner"), addr("sign"), false, 1000)
        .unwrap();

    assert!(hub.deposit(&addr("mallory"), &proxy, 10).is_err());
    assert!(hub.withdraw(&addr("mallory"), &proxy, 10).is_err());
    assert!(hub.set_restake(&addr("mallory"), &proxy, true).is_err());
    assert_eq!(hub.total_balance(&proxy).unwrap(), 1000);

    hub.deposit(&addr("owner"), &proxy, 10).unwrap();
    hub.withdraw(&addr("owner"), &proxy, 10).unwrap();
    assert_eq!(
        hub.transfers().last(),
        Some(&Transfer {
            to: addr("owner"),
            amount: 10
        })
    );
}

#[test]
fn lock_stake_is_protocol_gated_and_sorted() {
    let mut hub = hub();
    hub.register_validator(addr("o1"), addr("sign_bb"), false, 2000)
        .unwrap();
    hub.register_validator(addr("o2"), addr("sign_aa"), false, 3000)
        .unwrap();
    hub.register_validator(addr("o3"), addr("sign_cc"), false, 2000)
        .unwrap();

    assert!(matches!(
        hub.lock_stake(&addr("mallory"), Epoch::new(1)),
        Err(HubError::NotProtocolCaller(_))
    ));

    let set = hub.lock_stake(&addr("protocol"), Epoch::new(1)).unwrap();
    assert_eq!(
        set,
        vec![
            (addr("sign_aa"), 3000),
            (addr("sign_bb"), 2000),
            (addr("sign_cc"), 2000),
        ]
    );
}

#[test]
fn epoch_counter_never_moves_backwards() {
    let mut hub = hub();
    hub.debug_set_epoch(Epoch::new(10)).unwrap();
    assert!(hub.debug_set_epoch(Epoch::new(9)).is_err());
    assert!(hub
        .add_rewards(Epoch::new(5), vec![], 0)
        .is_err());
    assert_eq!(hub.current_epoch(), Epoch::new(10));
}

#[test]
fn state_snapshot_round_trips() {
    let mut hub = hub();
    let ledger = hub
        .register_delegated_validator(addr("sign"), false, 1000)
        .unwrap();
    hub.delegate_stake(&addr("dora"), &ledger, 100).unwrap();
    hub.debug_set_epoch(Epoch::new(6)).unwrap();
    hub.add_rewards(Epoch::new(5), vec![(addr("sign"), 1000)], 1000)
        .unwrap();

    let bytes = hub.save_state().unwrap();
    let restored = StakingHub::load_state(&bytes).unwrap();

    assert_eq!(restored.current_epoch(), hub.current_epoch());
    assert_eq!(restored.sorted_validators(), hub.sorted_validators());
    assert_eq!(
        restored.ledger(&ledger).unwrap().accrued_rewards(&addr("dora")),
        1000
    );
    assert_eq!(restored.transfers(), hub.transfers());
}
