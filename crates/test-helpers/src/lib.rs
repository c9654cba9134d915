//! Test fixtures for the HyperCore ledger.
//!
//! Mirrors the deployment every scenario starts from: USDC as token 0,
//! HYPE as the staking token 150, and a couple of funded test users.
//! The encoder helpers return wire bytes ready to be enqueued.

use hypercore_actions::{
    encode, Action, CrossDexSend, SpotSend, StakingDeposit, StakingWithdraw, UsdClassTransfer,
    VaultTransfer,
};
use hypercore_ledger::LedgerStore;
use hypercore_types::{Address, DexId, TokenId, TokenInfo, TokenRegistry, VaultAddress};

/// The USD-pegged spot token.
pub const USDC: TokenId = TokenId(0);

/// The native staking token.
pub const HYPE: TokenId = TokenId(150);

/// USDC spot decimals.
pub const USDC_WEI_DECIMALS: u8 = 8;

/// HYPE spot decimals. The EVM side carries 10 more.
pub const HYPE_WEI_DECIMALS: u8 = 8;

/// The n-th test user.
pub fn user(n: u64) -> Address {
    Address::from_low_u64(0x1000 + n)
}

/// A test vault.
pub fn vault() -> VaultAddress {
    Address::from_low_u64(0x7a017)
}

/// Registry with USDC and HYPE deployed.
pub fn token_registry() -> TokenRegistry {
    let mut registry = TokenRegistry::new();
    for (token, info) in deployed_tokens() {
        registry
            .register(token, info)
            .expect("fixture tokens are distinct");
    }
    registry
}

/// The fixture tokens, in registration order.
pub fn deployed_tokens() -> Vec<(TokenId, TokenInfo)> {
    vec![
        (USDC, TokenInfo::new("USDC", 8, USDC_WEI_DECIMALS, 0)),
        (HYPE, TokenInfo::new("HYPE", 2, HYPE_WEI_DECIMALS, 10)),
    ]
}

/// Ledger with users 0 and 1 created and nothing funded.
pub fn ledger_with_users() -> LedgerStore {
    let mut ledger = LedgerStore::new();
    ledger.create_account(user(0));
    ledger.create_account(user(1));
    ledger
}

// ═══════════════════════════════════════════════════════════════════════════
// Action encoders
// ═══════════════════════════════════════════════════════════════════════════

pub fn spot_send(destination: Address, token: TokenId, wei: u64) -> Vec<u8> {
    encode(&Action::SpotSend(SpotSend {
        destination,
        token,
        wei,
    }))
}

pub fn usd_class_transfer(ntl: u64, to_perp: bool) -> Vec<u8> {
    encode(&Action::UsdClassTransfer(UsdClassTransfer { ntl, to_perp }))
}

pub fn vault_transfer(vault: VaultAddress, is_deposit: bool, usd: u64) -> Vec<u8> {
    encode(&Action::VaultTransfer(VaultTransfer {
        vault,
        is_deposit,
        usd,
    }))
}

pub fn staking_deposit(wei: u64) -> Vec<u8> {
    encode(&Action::StakingDeposit(StakingDeposit { wei }))
}

pub fn staking_withdraw(wei: u64) -> Vec<u8> {
    encode(&Action::StakingWithdraw(StakingWithdraw { wei }))
}

pub fn cross_dex_send(
    destination: Address,
    sub_account: Address,
    dexes: (DexId, DexId),
    token: TokenId,
    wei: u64,
) -> Vec<u8> {
    encode(&Action::CrossDexSend(CrossDexSend {
        destination,
        sub_account,
        source_dex: dexes.0,
        destination_dex: dexes.1,
        token,
        wei,
    }))
}
