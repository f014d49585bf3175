// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Error taxonomy for the gate-driver link.
//!
//! Only [`Error::RetryLimitExceeded`] is ever escalated past the state machines; everything else is
//! handled by restarting the owning sub-protocol and kept for diagnostics.

use crate::hw::ChannelId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// One command/acknowledge exchange returned an unexpected byte.
    #[error("reply byte {index} was 0x{got:02X}, expected 0x{expected:02X}")]
    TransientMismatch { index: u8, expected: u8, got: u8 },

    /// A reply byte was expected but the receive buffer was empty.
    #[error("receive buffer empty")]
    NoData,

    /// Consecutive transient failures reached the retry ceiling.
    #[error("retry limit exceeded")]
    RetryLimitExceeded,

    /// Measured auto-baud divisor fell outside the accepted window.
    #[error("auto-baud divisor {0} outside accepted window")]
    AutoBaudOutOfRange(u16),

    /// The channel handed to the driver is not the one it is configured for.
    #[error("channel {found:?} bound where {expected:?} was expected")]
    UnboundChannel { expected: ChannelId, found: ChannelId },

    /// The chip-enable line could not be driven.
    #[error("chip-enable line fault")]
    ChipEnable,
}

impl Error {
    /// Handled inside the sub-protocol that hit it (retry or divisor fallback). The driver logs
    /// these at `warn` and everything else at `error`.
    #[inline]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::TransientMismatch { .. } | Error::NoData | Error::AutoBaudOutOfRange(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_display_names_the_bytes() {
        let err = Error::TransientMismatch {
            index: 2,
            expected: 0x41,
            got: 0x01,
        };
        assert_eq!(err.to_string(), "reply byte 2 was 0x01, expected 0x41");
    }

    #[test]
    fn locally_handled_errors_are_transient() {
        assert!(Error::NoData.is_transient());
        assert!(Error::TransientMismatch {
            index: 0,
            expected: 0,
            got: 1
        }
        .is_transient());
        assert!(!Error::RetryLimitExceeded.is_transient());
        assert!(Error::AutoBaudOutOfRange(700).is_transient());
        assert!(!Error::ChipEnable.is_transient());
        assert!(!Error::UnboundChannel {
            expected: ChannelId(2),
            found: ChannelId(1)
        }
        .is_transient());
    }
}
