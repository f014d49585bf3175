// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Reply frame validation.
//!
//! Config writes are acknowledged with four bytes (`cmd, value, ack, value`), status reads with
//! three (`cmd, ack, value`). The check stops at the first byte that is missing or wrong.

use super::registers::{ConfigRegister, StatusRegister};
use crate::error::Error;

/// Validate a config-write acknowledge for `value` written to `reg`.
pub fn check_set_ack(reg: ConfigRegister, value: u8, reply: &[Option<u8>; 4]) -> Result<(), Error> {
    expect(&[reg.command(), value, reg.ack(), value], reply)
}

/// Validate a status-read reply and return the register value.
pub fn check_status_ack(reg: StatusRegister, reply: &[Option<u8>; 3]) -> Result<u8, Error> {
    expect(&[reg.command(), reg.ack()], &reply[..2])?;
    reply[2].ok_or(Error::NoData)
}

fn expect(expected: &[u8], reply: &[Option<u8>]) -> Result<(), Error> {
    for (index, (&want, &got)) in expected.iter().zip(reply).enumerate() {
        match got {
            None => return Err(Error::NoData),
            Some(got) if got != want => {
                return Err(Error::TransientMismatch {
                    index: index as u8,
                    expected: want,
                    got,
                })
            }
            Some(_) => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_set_ack() {
        let reply = [Some(0x87), Some(0x1C), Some(0x47), Some(0x1C)];
        assert_eq!(check_set_ack(ConfigRegister::Cfg2, 0x1C, &reply), Ok(()));
    }

    #[test]
    fn nack_is_a_mismatch_on_the_ack_byte() {
        let reply = [Some(0x81), Some(0x03), Some(0x01), Some(0x03)];
        assert_eq!(
            check_set_ack(ConfigRegister::Cfg0, 0x03, &reply),
            Err(Error::TransientMismatch {
                index: 2,
                expected: 0x41,
                got: 0x01
            })
        );
    }

    #[test]
    fn second_value_copy_is_checked() {
        let reply = [Some(0x81), Some(0x03), Some(0x41), Some(0x02)];
        assert!(matches!(
            check_set_ack(ConfigRegister::Cfg0, 0x03, &reply),
            Err(Error::TransientMismatch { index: 3, .. })
        ));
    }

    #[test]
    fn short_reply_is_no_data() {
        let reply = [Some(0x81), Some(0x03), None, None];
        assert_eq!(check_set_ack(ConfigRegister::Cfg0, 0x03, &reply), Err(Error::NoData));
    }

    #[test]
    fn status_value_is_returned() {
        let reply = [Some(0x85), Some(0x45), Some(0x20)];
        assert_eq!(check_status_ack(StatusRegister::Status0, &reply), Ok(0x20));
    }

    #[test]
    fn status_missing_value_is_no_data() {
        let reply = [Some(0x86), Some(0x46), None];
        assert_eq!(check_status_ack(StatusRegister::Status1, &reply), Err(Error::NoData));
    }

    #[test]
    fn status_wrong_echo() {
        let reply = [Some(0x99), Some(0x46), Some(0x00)];
        assert_eq!(
            check_status_ack(StatusRegister::Status1, &reply),
            Err(Error::TransientMismatch {
                index: 0,
                expected: 0x86,
                got: 0x99
            })
        );
    }
}
