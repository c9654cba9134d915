//! Core action types and their wire codec.
//!
//! Actions are submitted into Core as raw bytes: a four byte header followed
//! by a static ABI tuple whose layout depends on the action kind. See
//! [`codec`] for the exact format.

pub mod abi;
mod action;
pub mod codec;

pub use action::{
    Action, ActionKind, CrossDexSend, SpotSend, StakingDeposit, StakingWithdraw,
    UsdClassTransfer, VaultTransfer,
};
pub use codec::{decode, encode, DecodeError, ACTION_VERSION, HEADER_LEN};
