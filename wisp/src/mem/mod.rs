use std::fmt::Debug;

mod banks;
mod dma;
pub mod io;
mod mbc;
pub mod rtc;

pub use banks::FLAT_RAM_SIZE;
pub use banks::WRAM_BANK_SIZE;
pub use dma::HdmaMode;
pub use dma::OamDmaRequest;
pub use dma::VramDmaRequest;
pub use mbc::BankingMode;
pub use mbc::Chip;
pub use mbc::ControllerEffect;
pub use mbc::MemoryBankController;
pub use mbc::MBC1;
pub use mbc::MBC3;

use banks::BankStore;
use serde::Deserialize;
use serde::Serialize;
use tracing::info;
use tracing::trace;

use crate::apu::AudioRegisters;
use crate::apu::Sound;
use crate::cart::CartridgeProfile;
use crate::ppu::Graphics;
use crate::ppu::PaletteKind;
use crate::ppu::VideoRegisters;
use rtc::Clock;
use rtc::RealTimeClock;

/// This trait is used to abstract over the memory map. The CPU is written against this rather
/// than against [`AddressSpace`] directly.
pub trait MemoryLike {
    fn read_byte(&self, addr: u16) -> u8;

    fn write_byte(&mut self, addr: u16, val: u8);
}

/// The `impl FnOnce` in `update_byte` would make `MemoryLike` non-object safe, so the helpers live
/// in their own trait. Every helper goes through `read_byte`/`write_byte`, so writes trigger the
/// same side effects that a plain write would.
pub trait MemoryLikeExt: MemoryLike {
    fn update_byte(&mut self, addr: u16, op: impl FnOnce(&mut u8)) -> u8 {
        let mut val = self.read_byte(addr);
        op(&mut val);
        self.write_byte(addr, val);
        val
    }

    /// Reads a little-endian word. The high byte is read from the next address, wrapping at the
    /// top of the address space.
    fn read_word(&self, addr: u16) -> u16 {
        u16::from_le_bytes([self.read_byte(addr), self.read_byte(addr.wrapping_add(1))])
    }

    fn write_word(&mut self, addr: u16, val: u16) {
        let [lo, hi] = val.to_le_bytes();
        self.write_byte(addr, lo);
        self.write_byte(addr.wrapping_add(1), hi);
    }
}

/// The CPU's view of memory. Every 16-bit address resolves to exactly one storage cell, either in
/// the banks owned here or in one of the collaborators.
#[derive(Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressSpace<G = VideoRegisters, S = AudioRegisters, C = RealTimeClock> {
    profile: CartridgeProfile,
    banks: BankStore,
    mbc: MemoryBankController,
    graphics: G,
    sound: S,
    clock: C,
    /// Cycles that the bus has been stalled for (by the OAM DMA) since the CPU last checked.
    stall_cycles: u32,
}

impl AddressSpace {
    /// Constructs the address space with the plain register collaborators.
    ///
    /// # Panics
    /// Panics if the profile's ROM size class is unknown.
    pub fn new(profile: CartridgeProfile, cart: &[u8]) -> Self {
        Self::with_collaborators(
            profile,
            cart,
            VideoRegisters::new(),
            AudioRegisters::new(),
            RealTimeClock::new(),
        )
    }
}

impl<G: Graphics, S: Sound, C: Clock> AddressSpace<G, S, C> {
    /// # Panics
    /// Panics if the profile's ROM size class is unknown.
    pub fn with_collaborators(
        profile: CartridgeProfile,
        cart: &[u8],
        graphics: G,
        sound: S,
        clock: C,
    ) -> Self {
        // NOTE: This panics on a malformed header, before any storage exists.
        let mbc = MemoryBankController::new(&profile);
        let banks = BankStore::new(&profile, cart);
        info!(
            "Constructed address space for a {} cartridge (color: {})",
            profile.controller, profile.color
        );
        Self {
            profile,
            banks,
            mbc,
            graphics,
            sound,
            clock,
            stall_cycles: 0,
        }
    }

    pub fn read(&self, addr: u16) -> u8 {
        trace!("Read from 0x{addr:0>4X}");
        match addr {
            0x4000..0x8000 => self.banks.rom(self.mbc.rom_bank(), addr - 0x4000),
            0x8000..0xA000 => self
                .graphics
                .read_vram(self.graphics.vram_bank(), addr - 0x8000),
            0xA000..0xC000 => match self.mbc.rtc_mapped() {
                Some(selector) => self.clock.read(selector),
                None => self
                    .banks
                    .external_ram(self.mbc.ram_bank(), addr - 0xA000),
            },
            0xD000..0xE000 if self.banks.wram_bank() > 1 => self.banks.wram(addr - 0xD000),
            0xFF10..0xFF27 | 0xFF30..0xFF40 => self.sound.read(addr),
            io::LCDC => self.graphics.lcd_control(),
            io::STAT => self.graphics.lcd_status(),
            io::BCPD => self.read_palette_data(PaletteKind::Background),
            io::OCPD => self.read_palette_data(PaletteKind::Object),
            _ => self.banks.flat(addr),
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        trace!("Write 0x{value:0>2X} to 0x{addr:0>4X}");
        if addr <= 0x7FFF {
            if let Some(ControllerEffect::LatchClock) = self.mbc.write_register(addr, value) {
                self.clock.latch();
            }
            return;
        }
        self.store(addr, value);
        self.dispatch(addr, value);
    }

    /// Puts a byte into whichever storage backs the address. No register side effects happen
    /// here.
    fn store(&mut self, addr: u16, value: u8) {
        match addr {
            0x8000..0xA000 => {
                let bank = self.graphics.vram_bank();
                self.graphics.write_vram(bank, addr - 0x8000, value)
            }
            0xA000..0xC000 => match self.mbc.rtc_mapped() {
                Some(selector) => self.clock.write(selector, value),
                None => self
                    .banks
                    .set_external_ram(self.mbc.ram_bank(), addr - 0xA000, value),
            },
            0xD000..0xE000 if self.banks.wram_bank() > 1 => {
                self.banks.set_wram(addr - 0xD000, value)
            }
            _ => self.banks.set_flat(addr, value),
        }
    }

    fn read_palette_data(&self, kind: PaletteKind) -> u8 {
        let index = self.graphics.palette_index(kind) & 0x3F;
        self.graphics.read_palette(kind, index)
    }

    /// Returns the number of cycles the bus was stalled for since the last call and resets the
    /// counter.
    pub fn take_stall_cycles(&mut self) -> u32 {
        std::mem::take(&mut self.stall_cycles)
    }

    pub fn profile(&self) -> &CartridgeProfile {
        &self.profile
    }

    pub fn controller(&self) -> &MemoryBankController {
        &self.mbc
    }

    #[inline]
    pub fn rom_bank(&self) -> u8 {
        self.mbc.rom_bank()
    }

    #[inline]
    pub fn ram_bank(&self) -> u8 {
        self.mbc.ram_bank()
    }

    #[inline]
    pub fn wram_bank(&self) -> u8 {
        self.banks.wram_bank()
    }

    /// The external (battery-backed) RAM, every bank in order. This is what a front-end should
    /// persist as the save file.
    pub fn external_ram(&self) -> Vec<u8> {
        self.banks.dump_external_ram()
    }

    /// Restores the external RAM from the output of [`AddressSpace::external_ram`].
    pub fn load_external_ram(&mut self, data: &[u8]) {
        self.banks.load_external_ram(data)
    }

    pub fn graphics(&self) -> &G {
        &self.graphics
    }

    pub fn graphics_mut(&mut self) -> &mut G {
        &mut self.graphics
    }

    pub fn sound(&self) -> &S {
        &self.sound
    }

    pub fn sound_mut(&mut self) -> &mut S {
        &mut self.sound
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }
}

impl<G: Graphics, S: Sound, C: Clock> MemoryLike for AddressSpace<G, S, C> {
    fn read_byte(&self, addr: u16) -> u8 {
        self.read(addr)
    }

    fn write_byte(&mut self, addr: u16, val: u8) {
        self.write(addr, val)
    }
}

impl<G: Graphics, S: Sound, C: Clock> MemoryLikeExt for AddressSpace<G, S, C> {}

impl<G, S, C> Debug for AddressSpace<G, S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "AddressSpace {{")?;
        writeln!(f, "  profile: {:?}", self.profile)?;
        writeln!(f, "  banks: {:?}", self.banks)?;
        writeln!(f, "  mbc: {}", self.mbc)?;
        writeln!(f, "  stall_cycles: {}", self.stall_cycles)?;
        write!(f, "}}")
    }
}

#[cfg(test)]
impl MemoryLike for Vec<u8> {
    fn read_byte(&self, addr: u16) -> u8 {
        self[addr as usize]
    }

    fn write_byte(&mut self, addr: u16, val: u8) {
        self[addr as usize] = val;
    }
}

#[cfg(test)]
impl MemoryLikeExt for Vec<u8> {}
