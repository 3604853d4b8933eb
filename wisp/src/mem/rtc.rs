use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::error;

use crate::check_bit_const;

/// The clock hardware of an MBC3 cartridge. While a clock register is mapped, the CPU reads and
/// writes the external RAM window through this instead of RAM.
pub trait Clock {
    /// Reads the given clock register. Selectors are the values that were written to the MBC3's
    /// RAM/RTC select register, 0x08 through 0x0C.
    fn read(&self, selector: u8) -> u8;

    fn write(&mut self, selector: u8, value: u8);

    /// Copies the running clock into the readable registers.
    fn latch(&mut self);
}

/// The five clock registers.
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockRegisters {
    /// Selector 0x08
    pub seconds: u8,
    /// Selector 0x09
    pub minutes: u8,
    /// Selector 0x0A
    pub hours: u8,
    /// Selector 0x0B. The lower 8 bits of the day counter.
    pub days_low: u8,
    /// Selector 0x0C.
    ///  - Bit 0 is the 9th bit of the day counter
    ///  - Bit 6 halts the clock
    ///  - Bit 7 is set when the day counter overflows
    pub days_high: u8,
}

impl ClockRegisters {
    fn read(&self, selector: u8) -> Option<u8> {
        match selector {
            0x08 => Some(self.seconds),
            0x09 => Some(self.minutes),
            0x0A => Some(self.hours),
            0x0B => Some(self.days_low),
            0x0C => Some(self.days_high),
            _ => None,
        }
    }

    fn register_mut(&mut self, selector: u8) -> Option<&mut u8> {
        match selector {
            0x08 => Some(&mut self.seconds),
            0x09 => Some(&mut self.minutes),
            0x0A => Some(&mut self.hours),
            0x0B => Some(&mut self.days_low),
            0x0C => Some(&mut self.days_high),
            _ => None,
        }
    }

    fn days(&self) -> u16 {
        u16::from_be_bytes([self.days_high & 0x01, self.days_low])
    }

    fn set_days(&mut self, days: u16) {
        let [high, low] = days.to_be_bytes();
        self.days_low = low;
        self.days_high = (self.days_high & 0b1111_1110) | (high & 0x01);
    }
}

/// A register-level model of the MBC3 clock. Time only moves when the owner of the clock calls
/// [`RealTimeClock::advance`], which keeps the clock deterministic.
#[derive(Debug, Default, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealTimeClock {
    live: ClockRegisters,
    latched: ClockRegisters,
}

impl RealTimeClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_halted(&self) -> bool {
        check_bit_const::<6>(self.live.days_high)
    }

    /// The running (unlatched) registers.
    pub fn live(&self) -> &ClockRegisters {
        &self.live
    }

    /// The day counter wraps after this many seconds.
    pub const PERIOD: u64 = 0x200 * 86400;

    /// Moves the running clock forward. Does nothing while the clock is halted.
    pub fn advance(&mut self, seconds: u64) {
        if self.is_halted() {
            return;
        }
        if seconds >= Self::PERIOD {
            self.live.days_high |= 0b1000_0000;
        }
        let total = u64::from(self.live.seconds)
            + 60 * u64::from(self.live.minutes)
            + 3600 * u64::from(self.live.hours)
            + 86400 * u64::from(self.live.days())
            + seconds % Self::PERIOD;
        self.live.seconds = (total % 60) as u8;
        self.live.minutes = (total / 60 % 60) as u8;
        self.live.hours = (total / 3600 % 24) as u8;
        let days = total / 86400;
        if days > 0x1FF {
            self.live.days_high |= 0b1000_0000;
        }
        self.live.set_days((days & 0x1FF) as u16);
    }
}

impl Clock for RealTimeClock {
    fn read(&self, selector: u8) -> u8 {
        self.latched.read(selector).unwrap_or_else(|| {
            error!("There was an attemped read from an unknown RTC register 0x{selector:0>2X}");
            0xFF
        })
    }

    fn write(&mut self, selector: u8, value: u8) {
        let value = match selector {
            0x08 | 0x09 => value & 0x3F,
            0x0A => value & 0x1F,
            // NOTE: Bits 1-5 are not used
            0x0C => value & 0b1100_0001,
            _ => value,
        };
        match (self.live.register_mut(selector), self.latched.register_mut(selector)) {
            (Some(live), Some(latched)) => {
                *live = value;
                *latched = value;
            }
            _ => error!("There was an attemped write to an unknown RTC register 0x{selector:0>2X}"),
        }
    }

    fn latch(&mut self) {
        debug!("Latching RTC: {:?}", self.live);
        self.latched = self.live;
    }
}
