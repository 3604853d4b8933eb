use std::fmt::Display;

mod mbc1;
mod mbc3;

pub use mbc1::*;
pub use mbc3::*;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::trace;

use crate::cart::CartridgeProfile;
use crate::cart::ControllerKind;
use crate::cart::RomBanking;

/// A side effect of a controller command that the controller can not carry out itself because it
/// belongs to another component.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum ControllerEffect {
    /// The MBC3 was asked to latch the current time into the readable clock registers.
    LatchClock,
}

/// The bank pointers that the cartridge controller manages.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankPointers {
    /// The bank that is visible in 0x4000-0x7FFF.
    rom: u8,
    /// The bank that is visible in 0xA000-0xBFFF (unless the RTC is mapped).
    ram: u8,
    /// Calculated on construction from the cartridge's ROM size class. Bounds the ROM pointer.
    rom_banking: RomBanking,
}

impl BankPointers {
    fn new(rom_banking: RomBanking) -> Self {
        Self {
            rom: 1,
            ram: 0,
            rom_banking,
        }
    }

    pub fn rom(&self) -> u8 {
        self.rom
    }

    pub fn ram(&self) -> u8 {
        self.ram
    }

    /// Moves the ROM pointer. If the new pointer is outside of what the cartridge's size class
    /// allows, the switch is ignored and the old pointer is kept.
    pub(super) fn switch_rom(&mut self, bank: u8) {
        if self.rom_banking.permits(bank) {
            debug!("Switching ROM bank from 0x{:0>2X} to 0x{bank:0>2X}", self.rom);
            self.rom = bank;
        } else {
            trace!(
                "Ignoring switch to ROM bank 0x{bank:0>2X} (cartridge banking is {:?})",
                self.rom_banking
            );
        }
    }

    pub(super) fn switch_ram(&mut self, bank: u8) {
        debug!("Switching RAM bank from 0x{:0>2X} to 0x{bank:0>2X}", self.ram);
        self.ram = bank;
    }
}

/// The per-controller state. Only the state that a given chip actually has is carried by its
/// variant.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum Chip {
    /// There is no external MBC. The game ROM is mapped into the 32 KiB that starts at 0x0000 and
    /// extends to 0x7FFF.
    ///
    /// See the [Pan Docs](https://gbdev.io/pandocs/nombc.html).
    None,
    /// See the [Pan Docs](https://gbdev.io/pandocs/MBC1.html).
    MBC1(MBC1),
    /// See the [Pan Docs](https://gbdev.io/pandocs/MBC3.html).
    MBC3(MBC3),
    /// A controller whose commands are not modelled.
    Other,
}

/// Interprets writes into the ROM region (0x0000-0x7FFF) as commands and tracks which banks they
/// select.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryBankController {
    chip: Chip,
    pointers: BankPointers,
}

impl MemoryBankController {
    /// # Panics
    /// Panics if the profile's ROM size class is unknown (see [`CartridgeProfile::rom_banking`]).
    pub fn new(profile: &CartridgeProfile) -> Self {
        let chip = match profile.controller {
            ControllerKind::None => Chip::None,
            ControllerKind::Mbc1 => Chip::MBC1(MBC1::new()),
            ControllerKind::Mbc3 => Chip::MBC3(MBC3::new()),
            ControllerKind::Other => Chip::Other,
        };
        Self {
            chip,
            pointers: BankPointers::new(profile.rom_banking()),
        }
    }

    pub fn chip(&self) -> &Chip {
        &self.chip
    }

    #[inline]
    pub fn rom_bank(&self) -> u8 {
        self.pointers.rom
    }

    #[inline]
    pub fn ram_bank(&self) -> u8 {
        self.pointers.ram
    }

    /// The clock register that is currently mapped over the external RAM, if any.
    #[inline]
    pub fn rtc_mapped(&self) -> Option<u8> {
        match &self.chip {
            Chip::MBC3(controller) => controller.rtc_select(),
            _ => None,
        }
    }

    /// Interprets a write into the ROM region. ROM is never written to.
    pub fn write_register(&mut self, addr: u16, value: u8) -> Option<ControllerEffect> {
        trace!("Controller command 0x{value:0>2X} @ 0x{addr:0>4X}");
        match &mut self.chip {
            Chip::MBC1(controller) => {
                controller.write_register(&mut self.pointers, addr, value);
                None
            }
            Chip::MBC3(controller) => controller.write_register(&mut self.pointers, addr, value),
            Chip::None | Chip::Other => None,
        }
    }
}

impl Display for MemoryBankController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "MemoryBankController {{")?;
        match &self.chip {
            Chip::None => writeln!(f, "  chip: None")?,
            Chip::MBC1(controller) => {
                writeln!(f, "  chip: MBC1, mode: {}", controller.banking_mode())?
            }
            Chip::MBC3(controller) => {
                writeln!(f, "  chip: MBC3, rtc: {:?}", controller.rtc_select())?
            }
            Chip::Other => writeln!(f, "  chip: Other")?,
        }
        writeln!(f, "  rom_bank: 0x{:0>2X}", self.pointers.rom)?;
        writeln!(f, "  ram_bank: 0x{:0>2X}", self.pointers.ram)?;
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use crate::cart::CartridgeProfile;
    use crate::cart::ControllerKind;

    use super::Chip;
    use super::MemoryBankController;

    #[test]
    fn no_controller_ignores_commands() {
        for kind in [ControllerKind::None, ControllerKind::Other] {
            let mut mbc = MemoryBankController::new(&CartridgeProfile::new(kind, 6, 3, false));
            for addr in [0x0000, 0x2000, 0x4000, 0x6000, 0x7FFF] {
                assert_eq!(mbc.write_register(addr, 0x05), None);
            }
            assert_eq!(mbc.rom_bank(), 1);
            assert_eq!(mbc.ram_bank(), 0);
            assert_eq!(mbc.rtc_mapped(), None);
        }
    }

    #[test]
    fn fixed_carts_never_switch() {
        let profile = CartridgeProfile::new(ControllerKind::Mbc1, 0, 0, false);
        let mut mbc = MemoryBankController::new(&profile);
        assert!(matches!(mbc.chip(), Chip::MBC1(_)));
        for value in 0..=u8::MAX {
            mbc.write_register(0x2000, value);
            assert_eq!(mbc.rom_bank(), 1);
        }
    }

    #[test]
    #[should_panic(expected = "ROM size class is invalid")]
    fn construction_checks_rom_class() {
        MemoryBankController::new(&CartridgeProfile::new(ControllerKind::Mbc1, 0x52, 0, false));
    }
}
