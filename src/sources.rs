//! Serial number and clock sources used while building certificates.
//!
//! Builders default to [`RandomSerial`] and [`SystemClock`]. Tests pin both with
//! [`FixedSerial`] and [`FixedClock`] to get reproducible certificates.

use std::time::{SystemTime, UNIX_EPOCH};

use openssl::asn1::{Asn1Integer, Asn1Time};
use openssl::bn::{BigNum, MsbOption};

use crate::error::Result;

const SERIAL_NUMBER_BITS: i32 = 128;
const SECONDS_PER_DAY: i64 = 86_400;

/// Supplies the serial number for each new certificate.
pub trait SerialSource {
    fn next_serial(&self) -> Result<Asn1Integer>;
}

/// Random 128-bit serial numbers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSerial;

impl SerialSource for RandomSerial {
    fn next_serial(&self) -> Result<Asn1Integer> {
        let mut serial = BigNum::new()?;
        serial.rand(SERIAL_NUMBER_BITS, MsbOption::MAYBE_ZERO, false)?;
        Ok(serial.to_asn1_integer()?)
    }
}

/// Always returns the same serial number.
#[derive(Debug, Clone, Copy)]
pub struct FixedSerial(pub u32);

impl SerialSource for FixedSerial {
    fn next_serial(&self) -> Result<Asn1Integer> {
        let serial = BigNum::from_u32(self.0)?;
        Ok(serial.to_asn1_integer()?)
    }
}

/// Supplies "now" as seconds since the Unix epoch.
pub trait Clock {
    fn now_unix(&self) -> i64;
}

/// Reads the system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => elapsed.as_secs() as i64,
            Err(before_epoch) => -(before_epoch.duration().as_secs() as i64),
        }
    }
}

/// A clock frozen at a given Unix timestamp.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_unix(&self) -> i64 {
        self.0
    }
}

/// Validity window starting at the clock's "now" and lasting `days` days.
pub(crate) fn validity_window(clock: &dyn Clock, days: u32) -> Result<(Asn1Time, Asn1Time)> {
    let now = clock.now_unix();
    let not_before = Asn1Time::from_unix(now)?;
    let not_after = Asn1Time::from_unix(now + i64::from(days) * SECONDS_PER_DAY)?;
    Ok((not_before, not_after))
}
