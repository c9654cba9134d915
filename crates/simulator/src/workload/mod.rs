//! Workload generation for simulations.
//!
//! A [`MixedWorkload`] draws action types from the configured weights and
//! fills in senders, destinations and amounts from the account pool. Some
//! of what it produces is meant to be dropped: transfers to uncreated
//! accounts, withdrawals from locked vaults, amounts larger than the
//! sender holds, and truncated payloads.

use crate::accounts::AccountPool;
use crate::config::{WorkloadConfig, WorkloadMix};
use hypercore_actions::{
    encode, Action, CrossDexSend, SpotSend, StakingDeposit, StakingWithdraw, UsdClassTransfer,
    VaultTransfer,
};
use hypercore_core::Event;
use hypercore_types::{scale, Address, DexId, TokenId, PERP_USD_DECIMALS};
use rand::distributions::{Distribution, WeightedIndex};
use serde::Serialize;
use std::fmt;

/// The kinds of submission a workload can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum WorkloadKind {
    SpotSend,
    EvmWithdrawal,
    BridgeDeposit,
    UsdClassTransfer,
    VaultDeposit,
    VaultWithdrawal,
    StakingDeposit,
    StakingWithdraw,
    CrossDexSend,
    Malformed,
}

impl WorkloadKind {
    const ALL: [WorkloadKind; 10] = [
        WorkloadKind::SpotSend,
        WorkloadKind::EvmWithdrawal,
        WorkloadKind::BridgeDeposit,
        WorkloadKind::UsdClassTransfer,
        WorkloadKind::VaultDeposit,
        WorkloadKind::VaultWithdrawal,
        WorkloadKind::StakingDeposit,
        WorkloadKind::StakingWithdraw,
        WorkloadKind::CrossDexSend,
        WorkloadKind::Malformed,
    ];

    fn weight(self, mix: &WorkloadMix) -> u32 {
        match self {
            WorkloadKind::SpotSend => mix.spot_send,
            WorkloadKind::EvmWithdrawal => mix.evm_withdrawal,
            WorkloadKind::BridgeDeposit => mix.bridge_deposit,
            WorkloadKind::UsdClassTransfer => mix.usd_class_transfer,
            WorkloadKind::VaultDeposit => mix.vault_deposit,
            WorkloadKind::VaultWithdrawal => mix.vault_withdrawal,
            WorkloadKind::StakingDeposit => mix.staking_deposit,
            WorkloadKind::StakingWithdraw => mix.staking_withdraw,
            WorkloadKind::CrossDexSend => mix.cross_dex_send,
            WorkloadKind::Malformed => mix.malformed,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            WorkloadKind::SpotSend => "spot_send",
            WorkloadKind::EvmWithdrawal => "evm_withdrawal",
            WorkloadKind::BridgeDeposit => "bridge_deposit",
            WorkloadKind::UsdClassTransfer => "usd_class_transfer",
            WorkloadKind::VaultDeposit => "vault_deposit",
            WorkloadKind::VaultWithdrawal => "vault_withdrawal",
            WorkloadKind::StakingDeposit => "staking_deposit",
            WorkloadKind::StakingWithdraw => "staking_withdraw",
            WorkloadKind::CrossDexSend => "cross_dex_send",
            WorkloadKind::Malformed => "malformed",
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One submission for the ledger, tagged with what produced it.
#[derive(Debug, Clone)]
pub struct Submission {
    pub kind: WorkloadKind,
    pub event: Event,
}

/// Trait for generating action workloads.
pub trait WorkloadGenerator {
    /// Generate a batch of submissions.
    fn generate_batch(
        &mut self,
        accounts: &mut AccountPool,
        rng: &mut impl rand::Rng,
    ) -> Vec<Submission>;

    /// Generate a single submission.
    fn generate_one(
        &mut self,
        accounts: &mut AccountPool,
        rng: &mut impl rand::Rng,
    ) -> Option<Submission>;
}

/// Tokens the workload moves.
#[derive(Debug, Clone, Copy)]
pub struct WorkloadTokens {
    pub usd: TokenId,
    pub usd_wei_decimals: u8,
    pub staking: TokenId,
    pub staking_wei_decimals: u8,
    pub staking_evm_extra_decimals: i8,
}

/// Mixed workload combining every action type.
pub struct MixedWorkload {
    config: WorkloadConfig,
    tokens: WorkloadTokens,
    kinds: Vec<WorkloadKind>,
    weights: Option<WeightedIndex<u32>>,
}

impl MixedWorkload {
    /// Create a new mixed workload. A mix with no positive weight
    /// generates nothing.
    pub fn new(config: WorkloadConfig, tokens: WorkloadTokens) -> Self {
        let kinds: Vec<_> = WorkloadKind::ALL
            .into_iter()
            .filter(|kind| kind.weight(&config.mix) > 0)
            .collect();
        let weights = WeightedIndex::new(kinds.iter().map(|kind| kind.weight(&config.mix))).ok();
        Self {
            config,
            tokens,
            kinds,
            weights,
        }
    }

    fn uncreated_ratio(&self) -> f64 {
        // gen_bool panics outside [0, 1]; TOML input is not range-checked.
        self.config.uncreated_destination_ratio.clamp(0.0, 1.0)
    }

    fn destination(
        &self,
        accounts: &mut AccountPool,
        rng: &mut impl rand::Rng,
    ) -> (Address, Address) {
        let (sender, destination) = accounts.pair(rng, self.config.account_distribution);
        if rng.gen_bool(self.uncreated_ratio()) {
            (sender, accounts.uncreated(rng))
        } else {
            (sender, destination)
        }
    }

    fn usdc(&self, rng: &mut impl rand::Rng, max_whole: u64) -> u64 {
        rng.gen_range(1..=scale(max_whole, self.tokens.usd_wei_decimals))
    }

    fn hype(&self, rng: &mut impl rand::Rng, max_whole: u64) -> u64 {
        rng.gen_range(1..=scale(max_whole, self.tokens.staking_wei_decimals))
    }

    fn perp_usd(&self, rng: &mut impl rand::Rng, max_whole: u64) -> u64 {
        rng.gen_range(1..=max_whole) * scale(1, PERP_USD_DECIMALS)
    }

    fn build(
        &self,
        kind: WorkloadKind,
        accounts: &mut AccountPool,
        rng: &mut impl rand::Rng,
    ) -> Event {
        let distribution = self.config.account_distribution;
        let action = match kind {
            WorkloadKind::SpotSend => {
                let (sender, destination) = self.destination(accounts, rng);
                let (token, wei) = if rng.gen_bool(0.5) {
                    (self.tokens.usd, self.usdc(rng, 500))
                } else {
                    (self.tokens.staking, self.hype(rng, 50))
                };
                let action = Action::SpotSend(SpotSend {
                    destination,
                    token,
                    wei,
                });
                return submitted(sender, &action);
            }
            WorkloadKind::EvmWithdrawal => {
                let sender = accounts.sender(rng, distribution);
                let destination = if rng.gen_bool(0.5) {
                    Address::NATIVE_SYSTEM
                } else {
                    Address::system_for_token(self.tokens.staking)
                };
                let action = Action::SpotSend(SpotSend {
                    destination,
                    token: self.tokens.staking,
                    wei: self.hype(rng, 5),
                });
                return submitted(sender, &action);
            }
            WorkloadKind::BridgeDeposit => {
                let sender = if rng.gen_bool(self.uncreated_ratio()) {
                    accounts.uncreated(rng)
                } else {
                    accounts.sender(rng, distribution)
                };
                let wei = self.hype(rng, 10);
                let evm_amount = wei as u128
                    * 10u128.pow(self.tokens.staking_evm_extra_decimals.max(0) as u32);
                return Event::BridgeDeposit {
                    sender,
                    token: self.tokens.staking,
                    evm_amount,
                };
            }
            WorkloadKind::UsdClassTransfer => Action::UsdClassTransfer(UsdClassTransfer {
                ntl: self.perp_usd(rng, 1_000),
                to_perp: rng.gen_bool(0.5),
            }),
            WorkloadKind::VaultDeposit => Action::VaultTransfer(VaultTransfer {
                vault: accounts.vault(),
                is_deposit: true,
                usd: self.perp_usd(rng, 200),
            }),
            WorkloadKind::VaultWithdrawal => Action::VaultTransfer(VaultTransfer {
                vault: accounts.vault(),
                is_deposit: false,
                usd: self.perp_usd(rng, 200),
            }),
            WorkloadKind::StakingDeposit => Action::StakingDeposit(StakingDeposit {
                wei: self.hype(rng, 20),
            }),
            WorkloadKind::StakingWithdraw => Action::StakingWithdraw(StakingWithdraw {
                wei: self.hype(rng, 20),
            }),
            WorkloadKind::CrossDexSend => {
                let (sender, destination) = self.destination(accounts, rng);
                let dexes = if rng.gen_bool(0.5) {
                    (DexId::SPOT, DexId::DEFAULT_PERP)
                } else {
                    (DexId::DEFAULT_PERP, DexId::SPOT)
                };
                let action = Action::CrossDexSend(CrossDexSend {
                    destination,
                    sub_account: Address::ZERO,
                    source_dex: dexes.0,
                    destination_dex: dexes.1,
                    token: self.tokens.usd,
                    wei: self.usdc(rng, 100),
                });
                return submitted(sender, &action);
            }
            WorkloadKind::Malformed => {
                let sender = accounts.sender(rng, distribution);
                let mut raw = encode(&Action::StakingDeposit(StakingDeposit { wei: 1 }));
                raw.truncate(rng.gen_range(0..raw.len()));
                return Event::ActionSubmitted { sender, raw };
            }
        };
        submitted(accounts.sender(rng, distribution), &action)
    }
}

fn submitted(sender: Address, action: &Action) -> Event {
    Event::ActionSubmitted {
        sender,
        raw: encode(action),
    }
}

impl WorkloadGenerator for MixedWorkload {
    fn generate_batch(
        &mut self,
        accounts: &mut AccountPool,
        rng: &mut impl rand::Rng,
    ) -> Vec<Submission> {
        let mut submissions = Vec::with_capacity(self.config.batch_size);

        for _ in 0..self.config.batch_size {
            if let Some(submission) = self.generate_one(accounts, rng) {
                submissions.push(submission);
            }
        }

        submissions
    }

    fn generate_one(
        &mut self,
        accounts: &mut AccountPool,
        rng: &mut impl rand::Rng,
    ) -> Option<Submission> {
        let kind = self.kinds[self.weights.as_ref()?.sample(rng)];
        let event = self.build(kind, accounts, rng);
        Some(Submission { kind, event })
    }
}
