//! Typed Core actions.

use hypercore_types::{Address, DexId, TokenId, VaultAddress};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Action discriminant as carried in the fourth header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum ActionKind {
    VaultTransfer = 2,
    StakingDeposit = 4,
    StakingWithdraw = 5,
    SpotSend = 6,
    UsdClassTransfer = 7,
    CrossDexSend = 13,
}

impl ActionKind {
    /// Every recognized kind, in wire-id order.
    pub const ALL: [ActionKind; 6] = [
        ActionKind::VaultTransfer,
        ActionKind::StakingDeposit,
        ActionKind::StakingWithdraw,
        ActionKind::SpotSend,
        ActionKind::UsdClassTransfer,
        ActionKind::CrossDexSend,
    ];

    /// Map a wire id to a kind. The set is closed.
    pub fn from_u8(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_u8() == id)
    }

    /// Wire id of this kind.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Get a human-readable name for this kind.
    pub fn name(self) -> &'static str {
        match self {
            ActionKind::VaultTransfer => "VaultTransfer",
            ActionKind::StakingDeposit => "StakingDeposit",
            ActionKind::StakingWithdraw => "StakingWithdraw",
            ActionKind::SpotSend => "SpotSend",
            ActionKind::UsdClassTransfer => "UsdClassTransfer",
            ActionKind::CrossDexSend => "CrossDexSend",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Move USD between perp withdrawable and a vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultTransfer {
    pub vault: VaultAddress,
    pub is_deposit: bool,
    /// USD amount, 6 decimals.
    pub usd: u64,
}

/// Move staking-token spot balance into the staking account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingDeposit {
    pub wei: u64,
}

/// Start unstaking from the staking account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingWithdraw {
    pub wei: u64,
}

/// Transfer spot balance to another account (or to a system address).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotSend {
    pub destination: Address,
    pub token: TokenId,
    pub wei: u64,
}

/// Move USD between the spot USD token and perp withdrawable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsdClassTransfer {
    /// Notional, 6 decimals.
    pub ntl: u64,
    pub to_perp: bool,
}

/// Transfer a token balance across dex partitions and accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossDexSend {
    pub destination: Address,
    /// Source sub-account; the zero address means the sender itself.
    pub sub_account: Address,
    pub source_dex: DexId,
    pub destination_dex: DexId,
    pub token: TokenId,
    pub wei: u64,
}

/// A decoded Core action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    VaultTransfer(VaultTransfer),
    StakingDeposit(StakingDeposit),
    StakingWithdraw(StakingWithdraw),
    SpotSend(SpotSend),
    UsdClassTransfer(UsdClassTransfer),
    CrossDexSend(CrossDexSend),
}

impl Action {
    /// Get the kind of this action.
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::VaultTransfer(_) => ActionKind::VaultTransfer,
            Action::StakingDeposit(_) => ActionKind::StakingDeposit,
            Action::StakingWithdraw(_) => ActionKind::StakingWithdraw,
            Action::SpotSend(_) => ActionKind::SpotSend,
            Action::UsdClassTransfer(_) => ActionKind::UsdClassTransfer,
            Action::CrossDexSend(_) => ActionKind::CrossDexSend,
        }
    }

    /// Check if this is a vault deposit.
    pub fn is_vault_deposit(&self) -> bool {
        matches!(self, Action::VaultTransfer(t) if t.is_deposit)
    }
}

impl From<VaultTransfer> for Action {
    fn from(action: VaultTransfer) -> Self {
        Action::VaultTransfer(action)
    }
}

impl From<StakingDeposit> for Action {
    fn from(action: StakingDeposit) -> Self {
        Action::StakingDeposit(action)
    }
}

impl From<StakingWithdraw> for Action {
    fn from(action: StakingWithdraw) -> Self {
        Action::StakingWithdraw(action)
    }
}

impl From<SpotSend> for Action {
    fn from(action: SpotSend) -> Self {
        Action::SpotSend(action)
    }
}

impl From<UsdClassTransfer> for Action {
    fn from(action: UsdClassTransfer) -> Self {
        Action::UsdClassTransfer(action)
    }
}

impl From<CrossDexSend> for Action {
    fn from(action: CrossDexSend) -> Self {
        Action::CrossDexSend(action)
    }
}
