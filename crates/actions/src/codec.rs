//! Action encoding and decoding.
//!
//! # Wire Format
//!
//! ```text
//! [version=1][reserved][reserved][kind][ABI tuple: 32-byte words ...]
//! ```
//!
//! The kind byte selects the tuple layout:
//!
//! | kind | tuple |
//! |------|-------|
//! | 2    | `(address vault, bool isDeposit, uint64 usd)` |
//! | 4    | `(uint64 wei)` |
//! | 5    | `(uint64 wei)` |
//! | 6    | `(address destination, uint64 token, uint64 wei)` |
//! | 7    | `(uint64 ntl, bool toPerp)` |
//! | 13   | `(address destination, address subAccount, uint32 sourceDex, uint32 destinationDex, uint64 token, uint64 wei)` |

use crate::abi::{AbiReader, AbiWriter};
use crate::{
    Action, ActionKind, CrossDexSend, SpotSend, StakingDeposit, StakingWithdraw,
    UsdClassTransfer, VaultTransfer,
};
use hypercore_types::{DexId, TokenId};
use thiserror::Error;

/// The only supported encoding version.
pub const ACTION_VERSION: u8 = 1;

/// Length of the fixed header.
pub const HEADER_LEN: usize = 4;

/// Errors that can occur while decoding a raw action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Action too short: {len} bytes")]
    TooShort { len: usize },

    #[error("Unsupported action version {0}")]
    UnsupportedVersion(u8),

    #[error("Unknown action kind {0}")]
    UnknownKind(u8),

    #[error("Payload length mismatch: expected {expected} bytes, got {actual}")]
    PayloadLength { expected: usize, actual: usize },

    #[error("Field {field} is not a canonical bool")]
    InvalidBool { field: usize },

    #[error("Field {field} is not a canonical address")]
    InvalidAddress { field: usize },

    #[error("Field {field} overflows uint{bits}")]
    IntegerOverflow { field: usize, bits: u32 },
}

fn header(kind: ActionKind, payload: Vec<u8>) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(&[ACTION_VERSION, 0, 0, kind.as_u8()]);
    bytes.extend(payload);
    bytes
}

/// Encode an action to wire format.
pub fn encode(action: &Action) -> Vec<u8> {
    let payload = match action {
        Action::VaultTransfer(a) => AbiWriter::with_words(3)
            .address(&a.vault)
            .bool(a.is_deposit)
            .uint64(a.usd)
            .finish(),
        Action::StakingDeposit(a) => AbiWriter::with_words(1).uint64(a.wei).finish(),
        Action::StakingWithdraw(a) => AbiWriter::with_words(1).uint64(a.wei).finish(),
        Action::SpotSend(a) => AbiWriter::with_words(3)
            .address(&a.destination)
            .uint64(a.token.0)
            .uint64(a.wei)
            .finish(),
        Action::UsdClassTransfer(a) => AbiWriter::with_words(2)
            .uint64(a.ntl)
            .bool(a.to_perp)
            .finish(),
        Action::CrossDexSend(a) => AbiWriter::with_words(6)
            .address(&a.destination)
            .address(&a.sub_account)
            .uint32(a.source_dex.0)
            .uint32(a.destination_dex.0)
            .uint64(a.token.0)
            .uint64(a.wei)
            .finish(),
    };

    header(action.kind(), payload)
}

/// Decode an action from wire format.
///
/// Reserved header bytes are ignored. The payload must hold exactly the
/// words of the kind's tuple.
pub fn decode(raw: &[u8]) -> Result<Action, DecodeError> {
    if raw.len() < HEADER_LEN {
        return Err(DecodeError::TooShort { len: raw.len() });
    }

    if raw[0] != ACTION_VERSION {
        return Err(DecodeError::UnsupportedVersion(raw[0]));
    }

    let kind = ActionKind::from_u8(raw[3]).ok_or(DecodeError::UnknownKind(raw[3]))?;
    let payload = &raw[HEADER_LEN..];

    let action = match kind {
        ActionKind::VaultTransfer => {
            let mut r = AbiReader::new(payload, 3)?;
            Action::VaultTransfer(VaultTransfer {
                vault: r.address()?,
                is_deposit: r.bool()?,
                usd: r.uint64()?,
            })
        }
        ActionKind::StakingDeposit => {
            let mut r = AbiReader::new(payload, 1)?;
            Action::StakingDeposit(StakingDeposit { wei: r.uint64()? })
        }
        ActionKind::StakingWithdraw => {
            let mut r = AbiReader::new(payload, 1)?;
            Action::StakingWithdraw(StakingWithdraw { wei: r.uint64()? })
        }
        ActionKind::SpotSend => {
            let mut r = AbiReader::new(payload, 3)?;
            Action::SpotSend(SpotSend {
                destination: r.address()?,
                token: TokenId(r.uint64()?),
                wei: r.uint64()?,
            })
        }
        ActionKind::UsdClassTransfer => {
            let mut r = AbiReader::new(payload, 2)?;
            Action::UsdClassTransfer(UsdClassTransfer {
                ntl: r.uint64()?,
                to_perp: r.bool()?,
            })
        }
        ActionKind::CrossDexSend => {
            let mut r = AbiReader::new(payload, 6)?;
            Action::CrossDexSend(CrossDexSend {
                destination: r.address()?,
                sub_account: r.address()?,
                source_dex: DexId(r.uint32()?),
                destination_dex: DexId(r.uint32()?),
                token: TokenId(r.uint64()?),
                wei: r.uint64()?,
            })
        }
    };

    Ok(action)
}
