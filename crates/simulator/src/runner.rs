//! Simulation runner.
//!
//! Drives a [`HyperCore`] through the [`StateMachine`] interface the same
//! way a block producer would: submissions arrive during a block, then one
//! flush at the end of it. Every flush is followed by a conservation check
//! against the supply the runner expects from deposits and withdrawals.

use crate::accounts::{AccountPool, AccountPoolError};
use crate::config::SimulatorConfig;
use crate::metrics::{MetricsCollector, SimulationReport, SupplySnapshot};
use crate::workload::{MixedWorkload, WorkloadGenerator, WorkloadTokens};
use hypercore_core::{ActionId, Event, MirrorTransfer, Notification, StateMachine};
use hypercore_node::{forward_mirror_transfers, HyperCore, RecordingMirror};
use hypercore_types::{evm_to_wei, RegistryError, TokenId, PERP_USD_DECIMALS};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors setting up a simulation.
#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error(transparent)]
    Accounts(#[from] AccountPoolError),

    #[error("Token setup failed: {0}")]
    Registry(#[from] RegistryError),

    #[error("Initial balance of {0} overflows")]
    BalanceOverflow(&'static str),
}

/// A deterministic workload simulation over one ledger.
pub struct Simulator {
    config: SimulatorConfig,
    core: HyperCore,
    accounts: AccountPool,
    workload: MixedWorkload,
    rng: ChaCha8Rng,
    metrics: MetricsCollector,
    mirror: RecordingMirror,
    now: Duration,
    /// Bridge deposits waiting to settle, by queue id.
    pending_deposits: HashMap<ActionId, (TokenId, u128)>,
    usd_expected: u128,
    staking_expected: u128,
}

impl Simulator {
    /// Register tokens, then create and fund every account.
    pub fn new(config: SimulatorConfig) -> Result<Self, SimulatorError> {
        let mut core = HyperCore::new(config.core);
        for (token, info) in config.tokens() {
            core.register_token_info(token, info)?;
        }

        let usd = core.read_token_info(config.core.usd_token)?.clone();
        let staking = core.read_token_info(config.core.staking_token)?.clone();

        let accounts = AccountPool::generate(config.accounts, config.seed)?;
        let usdc = checked_scale(config.initial_usdc, usd.wei_decimals, "USDC")?;
        let hype = checked_scale(config.initial_hype, staking.wei_decimals, "HYPE")?;
        let withdrawable =
            checked_scale(config.initial_withdrawable, PERP_USD_DECIMALS, "withdrawable")?;
        for &account in accounts.accounts() {
            core.force_account_creation(account);
            core.force_spot_balance(account, config.core.usd_token, usdc);
            core.force_spot_balance(account, config.core.staking_token, hype);
            core.force_perp_withdrawable(account, withdrawable);
        }

        let workload = MixedWorkload::new(
            config.workload.clone(),
            WorkloadTokens {
                usd: config.core.usd_token,
                usd_wei_decimals: usd.wei_decimals,
                staking: config.core.staking_token,
                staking_wei_decimals: staking.wei_decimals,
                staking_evm_extra_decimals: staking.evm_extra_wei_decimals,
            },
        );

        info!(
            accounts = accounts.total_accounts(),
            seed = config.seed,
            batch_size = config.workload.batch_size,
            "Simulator ready"
        );

        Ok(Self {
            usd_expected: core.usd_supply(),
            staking_expected: core.staking_supply(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            core,
            accounts,
            workload,
            metrics: MetricsCollector::new(),
            mirror: RecordingMirror::new(),
            now: Duration::ZERO,
            pending_deposits: HashMap::new(),
        })
    }

    /// The simulated ledger.
    pub fn core(&self) -> &HyperCore {
        &self.core
    }

    pub fn accounts(&self) -> &AccountPool {
        &self.accounts
    }

    /// Everything delivered to the token mirror so far.
    pub fn mirror(&self) -> &RecordingMirror {
        &self.mirror
    }

    /// Current simulated time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Run one block: submit a batch, then flush.
    pub fn tick(&mut self) {
        self.now += self.config.tick_interval;
        self.core.set_time(self.now);

        let batch = self
            .workload
            .generate_batch(&mut self.accounts, &mut self.rng);
        for submission in batch {
            let deposit = match &submission.event {
                Event::BridgeDeposit {
                    token, evm_amount, ..
                } => Some((*token, *evm_amount)),
                _ => None,
            };
            let notifications = self.core.handle(submission.event);
            for notification in notifications {
                if let Notification::ActionQueued { id, .. } = notification {
                    self.metrics.record_queued(id, submission.kind, self.now);
                    if let Some(deposit) = deposit {
                        self.pending_deposits.insert(id, deposit);
                    }
                }
            }
        }

        let notifications = self.core.handle(Event::FlushRequested);
        forward_mirror_transfers(&notifications, &mut self.mirror);
        for notification in &notifications {
            self.observe(notification);
        }
        self.check_conservation();

        debug!(
            now = ?self.now,
            notifications = notifications.len(),
            queued = self.core.queued(),
            "Tick complete"
        );
    }

    /// Run ticks until `duration` of simulated time has passed.
    pub fn run_for(&mut self, duration: Duration) -> SimulationReport {
        let end = self.now + duration;
        info!(?duration, tick = ?self.config.tick_interval, "Starting simulation");

        while self.now < end {
            self.tick();
        }

        let report = self.report();
        info!(
            submitted = report.total_submitted,
            applied = report.total_applied,
            dropped = report.total_dropped,
            "Simulation complete"
        );
        report
    }

    /// Report on everything observed so far.
    pub fn report(&self) -> SimulationReport {
        self.metrics.report(self.now, self.supply())
    }

    fn supply(&self) -> SupplySnapshot {
        SupplySnapshot {
            usd_supply: self.core.usd_supply(),
            usd_expected: self.usd_expected,
            staking_supply: self.core.staking_supply(),
            staking_expected: self.staking_expected,
        }
    }

    fn observe(&mut self, notification: &Notification) {
        match notification {
            Notification::ActionSettled { id, outcome } => {
                self.metrics.record_settled(*id, outcome, self.now);
                if let Some((token, evm_amount)) = self.pending_deposits.remove(id) {
                    if outcome.is_applied() {
                        let wei = self.to_wei(token, evm_amount);
                        if let Some(expected) = self.expected_supply(token) {
                            *expected += wei;
                        }
                    }
                }
            }
            Notification::CreditReleased { .. } => self.metrics.record_credit_released(),
            Notification::MirrorTransfer(MirrorTransfer {
                token, evm_amount, ..
            }) => {
                self.metrics.record_mirror_transfer();
                let wei = self.to_wei(*token, *evm_amount);
                if let Some(expected) = self.expected_supply(*token) {
                    *expected -= wei;
                }
            }
            Notification::ActionQueued { .. } => {}
        }
    }

    fn to_wei(&self, token: TokenId, evm_amount: u128) -> u128 {
        self.core
            .read_token_info(token)
            .ok()
            .and_then(|info| evm_to_wei(evm_amount, info.evm_extra_wei_decimals))
            .map_or(0, u128::from)
    }

    fn expected_supply(&mut self, token: TokenId) -> Option<&mut u128> {
        if token == self.config.core.usd_token {
            Some(&mut self.usd_expected)
        } else if token == self.config.core.staking_token {
            Some(&mut self.staking_expected)
        } else {
            None
        }
    }

    fn check_conservation(&mut self) {
        let supply = self.supply();
        if !supply.is_conserved() {
            warn!(now = ?self.now, ?supply, "Supply not conserved after flush");
            self.metrics.record_conservation_violation();
        }
    }

    /// Submissions still waiting in the queue.
    pub fn in_flight(&self) -> usize {
        self.metrics.in_flight()
    }
}

fn checked_scale(whole: u64, decimals: u8, what: &'static str) -> Result<u64, SimulatorError> {
    10u64
        .checked_pow(decimals as u32)
        .and_then(|factor| whole.checked_mul(factor))
        .ok_or(SimulatorError::BalanceOverflow(what))
}
