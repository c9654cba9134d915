//! The HyperCore facade.

use crate::HyperCoreConfig;
use hypercore_core::{ActionId, ActionOutcome, Event, Notification, StateMachine};
use hypercore_execution::ActionProcessor;
use hypercore_ledger::{DelegatorSummary, LedgerStore, PerpAccountState, SpotBalance, UserVaultEquity};
use hypercore_mempool::ActionQueue;
use hypercore_timelock::TimeLock;
use hypercore_types::{
    Address, DexId, RegistryError, TokenId, TokenInfo, TokenRegistry, VaultAddress,
    PERP_USD_DECIMALS,
};
use std::time::Duration;
use tracing::{debug, info};

/// The Core ledger and its action queue.
///
/// All mutation goes through the queue and [`flush_action_queue`]; the
/// `force_*` methods bypass it for fixture setup only. Reads always see the
/// last fully flushed state.
///
/// [`flush_action_queue`]: HyperCore::flush_action_queue
#[derive(Debug)]
pub struct HyperCore {
    config: HyperCoreConfig,
    registry: TokenRegistry,
    ledger: LedgerStore,
    queue: ActionQueue,
    timelock: TimeLock,
    processor: ActionProcessor,

    /// Latest simulated time seen.
    now: Duration,
}

impl HyperCore {
    /// Create a simulator with an empty token registry.
    pub fn new(config: HyperCoreConfig) -> Self {
        Self::with_registry(config, TokenRegistry::new())
    }

    /// Create a simulator with pre-registered tokens.
    pub fn with_registry(config: HyperCoreConfig, registry: TokenRegistry) -> Self {
        Self {
            config,
            registry,
            ledger: LedgerStore::new(),
            queue: ActionQueue::new(),
            timelock: TimeLock::new(config.settlement),
            processor: ActionProcessor::new(config.usd_token, config.staking_token),
            now: Duration::ZERO,
        }
    }

    pub fn config(&self) -> &HyperCoreConfig {
        &self.config
    }

    /// The committed ledger.
    pub fn ledger(&self) -> &LedgerStore {
        &self.ledger
    }

    /// Number of entries waiting in the queue.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    fn observe(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Ingestion
    // ═══════════════════════════════════════════════════════════════════════════

    /// Queue raw action bytes sent by `sender`.
    ///
    /// Never fails: malformed bytes and unknown senders are reported as
    /// dropped by the flush that processes them.
    pub fn enqueue(&mut self, sender: Address, raw: &[u8], now: Duration) -> ActionId {
        self.observe(now);
        self.queue.enqueue(sender, raw, now, &mut self.timelock)
    }

    /// Queue a credit from the deposit bridge.
    pub fn bridge_deposit(
        &mut self,
        sender: Address,
        token: TokenId,
        evm_amount: u128,
        now: Duration,
    ) -> ActionId {
        self.observe(now);
        self.queue
            .enqueue_bridge_deposit(sender, token, evm_amount, now, &mut self.timelock)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Flush
    // ═══════════════════════════════════════════════════════════════════════════

    /// Apply every entry matured at `now`, in enqueue order, and release
    /// due deferred credits.
    ///
    /// Returns the outcome of each processed entry. Entries that have not
    /// matured stay queued for a later flush.
    pub fn flush_action_queue(&mut self, now: Duration) -> Vec<(ActionId, ActionOutcome)> {
        self.flush(now)
            .into_iter()
            .filter_map(|notification| match notification {
                Notification::ActionSettled { id, outcome } => Some((id, outcome)),
                _ => None,
            })
            .collect()
    }

    /// Flush, returning every notification produced.
    ///
    /// The matured set is taken once on entry. Before each entry runs, the
    /// deferred credits that matured no later than it did are released, so
    /// settlement follows maturity order. Processing runs against a
    /// snapshot of the ledger that replaces the committed ledger only when
    /// the whole batch is done.
    pub fn flush(&mut self, now: Duration) -> Vec<Notification> {
        self.observe(now);

        let matured = self.queue.take_matured(now, &self.timelock);
        let mut staged = self.ledger.clone();
        let mut notifications = Vec::new();
        let (mut applied, mut dropped, mut released) = (0usize, 0usize, 0usize);

        for mut pending in matured {
            // Credits that settled before this action matured are visible to it.
            released += self.release_due(&mut staged, pending.matures_at, &mut notifications);
            let processed =
                self.processor
                    .process(&mut staged, &mut self.timelock, &self.registry, &pending, now);
            pending.settle(&processed.outcome);
            if processed.outcome.is_applied() {
                applied += 1;
            } else {
                dropped += 1;
            }
            notifications.extend(processed.notifications);
        }

        released += self.release_due(&mut staged, now, &mut notifications);

        self.ledger = staged;

        if applied + dropped + released > 0 {
            info!(
                applied,
                dropped,
                released,
                remaining = self.queue.len(),
                ?now,
                "Flushed action queue"
            );
        }
        notifications
    }

    /// Apply every deferred effect matured at or before `until`, returning
    /// how many were credited. Failed effects stay with the timelock.
    fn release_due(
        &mut self,
        staged: &mut LedgerStore,
        until: Duration,
        notifications: &mut Vec<Notification>,
    ) -> usize {
        let before = notifications.len();
        for deferred in self.timelock.take_due(until) {
            if let Some(notification) =
                self.processor
                    .release(staged, &mut self.timelock, deferred)
            {
                notifications.push(notification);
            }
        }
        notifications.len() - before
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Reads
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn read_spot_balance(&self, account: &Address, token: TokenId) -> SpotBalance {
        self.ledger.spot_balance(account, token)
    }

    pub fn read_dex_balance(&self, account: &Address, dex: DexId, token: TokenId) -> u64 {
        self.ledger.dex_balance(account, dex, token)
    }

    pub fn read_withdrawable(&self, account: &Address) -> PerpAccountState {
        self.ledger.perp_state(account)
    }

    pub fn read_user_vault_equity(
        &self,
        account: &Address,
        vault: &VaultAddress,
    ) -> UserVaultEquity {
        self.ledger.vault_equity(account, vault)
    }

    pub fn read_delegator_summary(&self, account: &Address) -> DelegatorSummary {
        self.ledger.delegator_summary(account)
    }

    pub fn read_token_info(&self, token: TokenId) -> Result<&TokenInfo, RegistryError> {
        self.registry.require(token)
    }

    pub fn is_account_created(&self, account: &Address) -> bool {
        self.ledger.is_created(account)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Token registry
    // ═══════════════════════════════════════════════════════════════════════════

    /// Register token metadata. Each id can be registered once.
    pub fn register_token_info(
        &mut self,
        token: TokenId,
        info: TokenInfo,
    ) -> Result<(), RegistryError> {
        info!(%token, name = %info.name, "Registering token");
        self.registry.register(token, info)
    }

    /// Assign the EVM mirror contract of a token. Only once per token.
    pub fn deploy_spot_mirror(
        &mut self,
        token: TokenId,
        contract: Address,
    ) -> Result<(), RegistryError> {
        info!(%token, %contract, "Deploying spot mirror");
        self.registry.deploy_mirror(token, contract)
    }

    pub fn registry(&self) -> &TokenRegistry {
        &self.registry
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Fixture overrides
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn force_account_creation(&mut self, account: Address) {
        if self.ledger.create_account(account) {
            debug!(%account, "Forced account creation");
        }
    }

    pub fn force_sub_account(&mut self, master: Address, sub: Address) {
        self.ledger.register_sub_account(master, sub);
    }

    pub fn force_spot_balance(&mut self, account: Address, token: TokenId, wei: u64) {
        self.ledger.force_spot(account, token, wei);
    }

    pub fn force_dex_balance(&mut self, account: Address, dex: DexId, token: TokenId, wei: u64) {
        self.ledger.force_dex_balance(account, dex, token, wei);
    }

    pub fn force_perp_withdrawable(&mut self, account: Address, usd: u64) {
        self.ledger.force_perp(account, usd);
    }

    pub fn force_vault_equity(
        &mut self,
        account: Address,
        vault: VaultAddress,
        equity: u64,
        locked_until: Duration,
    ) {
        self.ledger
            .force_vault_equity(account, vault, equity, locked_until);
    }

    /// Set the staking balance not delegated to any validator.
    pub fn force_staking(&mut self, account: Address, wei: u64) {
        self.ledger.force_staking(account, wei);
    }

    pub fn force_delegation(&mut self, account: Address, delegated: u64) {
        self.ledger.force_delegation(account, delegated);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Invariant helpers
    // ═══════════════════════════════════════════════════════════════════════════

    /// USD (6 decimals) owed to withdrawable by vault withdrawals that have
    /// not settled yet.
    pub fn pending_usd(&self) -> u128 {
        self.timelock.pending_withdrawable_credits()
    }

    /// All USD in the system, in the USD token's wei.
    ///
    /// Spot balances of the USD token, perp withdrawable, vault equity and
    /// pending withdrawal credits. Constant across flushes that only move
    /// value between those places.
    pub fn usd_supply(&self) -> u128 {
        let spot = self.ledger.token_supply(self.config.usd_token);
        let usd = self.ledger.total_withdrawable()
            + self.ledger.total_vault_equity()
            + self.pending_usd();

        let wei_decimals = self
            .registry
            .get(self.config.usd_token)
            .map_or(PERP_USD_DECIMALS, |info| info.wei_decimals);
        let shift = wei_decimals as i32 - PERP_USD_DECIMALS as i32;
        let factor = 10u128.pow(shift.unsigned_abs());
        if shift >= 0 {
            spot + usd * factor
        } else {
            spot + usd / factor
        }
    }

    /// All staking-token wei in Core: spot balances plus every staking
    /// position, including stake still in the unstaking cooldown.
    pub fn staking_supply(&self) -> u128 {
        self.ledger.token_supply(self.config.staking_token) + self.ledger.total_staked()
    }
}

impl StateMachine for HyperCore {
    fn handle(&mut self, event: Event) -> Vec<Notification> {
        let now = self.now;
        match event {
            Event::ActionSubmitted { sender, raw } => {
                let id = self.enqueue(sender, &raw, now);
                self.queued_notification(id, sender)
            }
            Event::BridgeDeposit {
                sender,
                token,
                evm_amount,
            } => {
                let id = self.bridge_deposit(sender, token, evm_amount, now);
                self.queued_notification(id, sender)
            }
            Event::FlushRequested => self.flush(now),
        }
    }

    fn set_time(&mut self, now: Duration) {
        self.now = now;
    }

    fn now(&self) -> Duration {
        self.now
    }
}

impl HyperCore {
    fn queued_notification(&self, id: ActionId, sender: Address) -> Vec<Notification> {
        let matures_at = self
            .queue
            .get(id)
            .map_or(self.now, |pending| pending.matures_at);
        vec![Notification::ActionQueued {
            id,
            sender,
            matures_at,
        }]
    }
}
