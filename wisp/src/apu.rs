//! The sound registers. Synthesis happens elsewhere; the memory core only forwards the register
//! block (0xFF10-0xFF26) and the waveform RAM (0xFF30-0xFF3F) through the [`Sound`] trait.

use serde::Deserialize;
use serde::Serialize;
use tracing::error;

use crate::check_bit_const;

/// The capabilities that the memory core needs from the APU.
pub trait Sound {
    /// Reads from either the register block or the waveform RAM.
    fn read(&self, addr: u16) -> u8;

    /// Writes to the register block (0xFF10-0xFF26).
    fn write(&mut self, addr: u16, value: u8);

    /// Writes to the waveform RAM (0xFF30-0xFF3F).
    fn write_waveform(&mut self, addr: u16, value: u8);
}

const REGISTERS_START: u16 = 0xFF10;
const WAVEFORM_START: u16 = 0xFF30;

/// ADDR FF26
const MASTER_CONTROL: u16 = 0xFF26;

/// A plain store for everything the CPU can see of the APU. Nothing is masked; a synthesizer
/// layered on top decides what the bits mean.
#[derive(Debug, Default, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioRegisters {
    /// FF10 through FF26. Includes the unused holes at FF15 and FF1F.
    registers: [u8; 0x17],
    /// FF30 through FF3F. Two 4-bit samples per byte, upper nibble first.
    waveform: [u8; 0x10],
}

impl AudioRegisters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the APU has been switched on through FF26.
    pub fn is_enabled(&self) -> bool {
        check_bit_const::<7>(self.registers[(MASTER_CONTROL - REGISTERS_START) as usize])
    }

    pub fn registers(&self) -> &[u8; 0x17] {
        &self.registers
    }

    pub fn waveform(&self) -> &[u8; 0x10] {
        &self.waveform
    }
}

impl Sound for AudioRegisters {
    fn read(&self, addr: u16) -> u8 {
        match addr {
            0xFF10..0xFF27 => self.registers[(addr - REGISTERS_START) as usize],
            0xFF30..0xFF40 => self.waveform[(addr - WAVEFORM_START) as usize],
            _ => {
                error!("Sound read from 0x{addr:0>4X}, which is not an APU address");
                0xFF
            }
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        match addr {
            0xFF10..0xFF27 => self.registers[(addr - REGISTERS_START) as usize] = value,
            _ => error!("Sound register write to 0x{addr:0>4X}, which is not an APU register"),
        }
    }

    fn write_waveform(&mut self, addr: u16, value: u8) {
        match addr {
            0xFF30..0xFF40 => self.waveform[(addr - WAVEFORM_START) as usize] = value,
            _ => error!("Waveform write to 0x{addr:0>4X}, which is outside of wave RAM"),
        }
    }
}
