//! Ledger properties under randomized, seeded workloads.

use hypercore_core::ActionId;
use hypercore_node::{HyperCore, HyperCoreConfig};
use hypercore_test_helpers::{self as fixtures, user, vault, HYPE, USDC};
use hypercore_types::{scale, Address, DexId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::time::Duration;

const USERS: u64 = 6;

fn funded_core() -> HyperCore {
    let mut core = HyperCore::with_registry(HyperCoreConfig::default(), fixtures::token_registry());
    for n in 0..USERS {
        core.force_account_creation(user(n));
        core.force_spot_balance(user(n), USDC, scale(1_000, 8));
        core.force_spot_balance(user(n), HYPE, scale(100, 8));
        core.force_perp_withdrawable(user(n), scale(500, 6));
        core.force_staking(user(n), scale(10, 8));
    }
    core
}

/// A random action, sometimes invalid, sometimes malformed.
fn random_action(rng: &mut ChaCha8Rng) -> Vec<u8> {
    let destination = user(rng.gen_range(0..USERS + 2));
    match rng.gen_range(0..8) {
        0 => fixtures::spot_send(destination, USDC, rng.gen_range(0..scale(400, 8))),
        1 => fixtures::spot_send(Address::NATIVE_SYSTEM, HYPE, rng.gen_range(0..scale(5, 8))),
        2 => fixtures::usd_class_transfer(rng.gen_range(0..scale(300, 6)), rng.gen_bool(0.5)),
        3 => fixtures::vault_transfer(vault(), rng.gen_bool(0.6), rng.gen_range(0..scale(200, 6))),
        4 => fixtures::staking_deposit(rng.gen_range(0..scale(20, 8))),
        5 => fixtures::staking_withdraw(rng.gen_range(0..scale(8, 8))),
        6 => fixtures::cross_dex_send(
            destination,
            Address::ZERO,
            (DexId::SPOT, DexId::DEFAULT_PERP),
            USDC,
            rng.gen_range(0..scale(50, 8)),
        ),
        _ => {
            let mut raw = fixtures::staking_deposit(1);
            raw.truncate(rng.gen_range(0..raw.len()));
            raw
        }
    }
}

#[test]
fn usd_and_staking_supply_are_conserved() {
    for seed in 0..8 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut core = funded_core();
        let usd = core.usd_supply();
        let mut staking = core.staking_supply();
        let mut now = Duration::from_secs(1_000);

        for _ in 0..40 {
            for _ in 0..rng.gen_range(1..10) {
                let sender = user(rng.gen_range(0..USERS));
                core.enqueue(sender, &random_action(&mut rng), now);
            }
            let notifications = core.flush(now);

            // Withdrawals to the EVM side leave the staking supply.
            for notification in &notifications {
                if let hypercore_core::Notification::MirrorTransfer(transfer) = notification {
                    assert_eq!(transfer.token, HYPE);
                    staking -= transfer.evm_amount / 10u128.pow(10);
                }
            }

            assert_eq!(core.usd_supply(), usd, "seed {seed}");
            assert_eq!(core.staking_supply(), staking, "seed {seed}");
            now += Duration::from_secs(rng.gen_range(1..120));
        }
    }
}

#[test]
fn every_action_settles_exactly_once() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut core = funded_core();
    let mut submitted = Vec::new();
    let mut settled: HashMap<ActionId, usize> = HashMap::new();
    let mut now = Duration::ZERO;

    for _ in 0..20 {
        for _ in 0..5 {
            let sender = user(rng.gen_range(0..USERS));
            submitted.push(core.enqueue(sender, &random_action(&mut rng), now));
        }
        for (id, _) in core.flush_action_queue(now) {
            *settled.entry(id).or_default() += 1;
        }
        now += Duration::from_secs(30);
    }
    now += core.config().settlement.vault_deposit_delay;
    for (id, _) in core.flush_action_queue(now) {
        *settled.entry(id).or_default() += 1;
    }

    assert_eq!(core.queued(), 0);
    assert_eq!(settled.len(), submitted.len());
    assert!(settled.values().all(|count| *count == 1));
}

#[test]
fn dropped_actions_leave_ledger_unchanged() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut core = funded_core();
    let mut now = Duration::from_secs(10);

    for _ in 0..200 {
        let sender = user(rng.gen_range(0..USERS));
        let raw = random_action(&mut rng);

        // Settle leftovers first so the next flush only sees the new action.
        core.flush_action_queue(now);
        let before = core.ledger().clone();
        let pending_before = core.pending_usd();

        core.enqueue(sender, &raw, now);
        let outcomes = core.flush_action_queue(now);

        if let Some((_, outcome)) = outcomes.first().filter(|(_, o)| !o.is_applied()) {
            let after = core.ledger();
            for n in 0..USERS + 2 {
                let account = user(n);
                for token in [USDC, HYPE] {
                    assert_eq!(
                        before.spot_balance(&account, token),
                        after.spot_balance(&account, token),
                        "{outcome:?}"
                    );
                }
                assert_eq!(before.perp_state(&account), after.perp_state(&account));
                assert_eq!(before.vault_equity(&account, &vault()), after.vault_equity(&account, &vault()));
                assert_eq!(before.delegator_summary(&account), after.delegator_summary(&account));
            }
            assert_eq!(pending_before, core.pending_usd());
        }
        now += core.config().settlement.vault_deposit_delay;
    }
}

#[test]
fn staking_nonce_increases_only_on_success() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let mut core = funded_core();
    let account = user(0);

    for _ in 0..100 {
        let raw = if rng.gen_bool(0.5) {
            fixtures::staking_deposit(rng.gen_range(0..scale(30, 8)))
        } else {
            fixtures::staking_withdraw(rng.gen_range(0..scale(30, 8)))
        };
        let before = core.read_delegator_summary(&account).nonce;
        core.enqueue(account, &raw, Duration::ZERO);
        let outcomes = core.flush_action_queue(Duration::ZERO);
        let after = core.read_delegator_summary(&account).nonce;

        if outcomes[0].1.is_applied() {
            assert_eq!(after, before + 1);
        } else {
            assert_eq!(after, before);
        }
    }
}

#[test]
fn locked_equity_never_leaves_the_vault() {
    let mut core = funded_core();
    let locked_until = Duration::from_secs(86_400);
    core.force_vault_equity(user(0), vault(), scale(10, 6), locked_until);

    let mut now = Duration::ZERO;
    while now < locked_until {
        core.enqueue(user(0), &fixtures::vault_transfer(vault(), false, 1), now);
        let outcomes = core.flush_action_queue(now);
        assert!(!outcomes[0].1.is_applied());
        assert_eq!(core.read_user_vault_equity(&user(0), &vault()).equity, scale(10, 6));
        now += Duration::from_secs(3_600);
    }

    core.enqueue(user(0), &fixtures::vault_transfer(vault(), false, 1), locked_until);
    assert!(core.flush_action_queue(locked_until)[0].1.is_applied());
}

#[test]
fn vault_deposit_invisible_until_maturity() {
    let mut core = funded_core();
    let t0 = Duration::from_secs(500);
    let delay = core.config().settlement.vault_deposit_delay;
    core.enqueue(user(0), &fixtures::vault_transfer(vault(), true, scale(6, 6)), t0);

    for secs in [0, 1, 60, 120, 239] {
        core.flush_action_queue(t0 + Duration::from_secs(secs));
        assert_eq!(core.read_withdrawable(&user(0)).withdrawable, scale(500, 6));
        assert_eq!(core.read_user_vault_equity(&user(0), &vault()).equity, 0);
    }

    core.flush_action_queue(t0 + delay);
    assert_eq!(core.read_withdrawable(&user(0)).withdrawable, scale(494, 6));
    assert_eq!(core.read_user_vault_equity(&user(0), &vault()).equity, scale(6, 6));
}

#[test]
fn conflicting_sends_apply_in_submission_order() {
    let mut core = funded_core();
    core.force_spot_balance(user(0), USDC, 100);

    // Only one of the two fits; the first submitted wins.
    let first = core.enqueue(user(0), &fixtures::spot_send(user(1), USDC, 80), Duration::ZERO);
    let second = core.enqueue(user(0), &fixtures::spot_send(user(2), USDC, 80), Duration::ZERO);
    let outcomes = core.flush_action_queue(Duration::ZERO);

    assert_eq!(outcomes[0].0, first);
    assert!(outcomes[0].1.is_applied());
    assert_eq!(outcomes[1].0, second);
    assert!(!outcomes[1].1.is_applied());
    assert_eq!(core.read_spot_balance(&user(0), USDC).total, 20);
}
