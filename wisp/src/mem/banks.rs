use std::fmt::Debug;

use serde::Deserialize;
use serde::Serialize;
use serde_with::serde_as;
use tracing::info;
use tracing::warn;

use crate::cart::CartridgeProfile;
use crate::cart::RAM_BANK_SIZE;
use crate::cart::ROM_BANK_SIZE;

/// The size of a working RAM bank, 4 KiB.
pub const WRAM_BANK_SIZE: usize = 4 * 1024;

/// The number of working RAM banks in color mode. Bank 0 is fixed at 0xC000 and bank 1 lives in
/// the flat RAM at 0xD000, so only banks 2 through 7 are ever indexed here.
pub const WRAM_BANK_COUNT: usize = 8;

/// The flat address space. Every region that is not banked is backed by this array.
pub const FLAT_RAM_SIZE: usize = 0x10000;

/// A single fixed-size bank of memory.
#[serde_as]
#[derive(Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank<const N: usize>(#[serde_as(as = "serde_with::Bytes")] pub Box<[u8; N]>);

pub type RomBank = Bank<ROM_BANK_SIZE>;
pub type RamBank = Bank<RAM_BANK_SIZE>;
pub type WramBank = Bank<WRAM_BANK_SIZE>;

impl<const N: usize> Bank<N> {
    pub fn new() -> Self {
        Self(Box::new([0; N]))
    }

    /// Constructs a bank from the start of the given data. Missing bytes are zeroed.
    pub fn from_slice(data: &[u8]) -> Self {
        let mut digest = Self::new();
        let len = data.len().min(N);
        digest.0[..len].copy_from_slice(&data[..len]);
        digest
    }
}

impl<const N: usize> Default for Bank<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Debug for Bank<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bank {{ size: {N} }}")
    }
}

/// Holds all of the storage that the CPU can address, save for the video RAM (which the PPU
/// owns). The ROM and external RAM pointers live in the controller; the working RAM pointer lives
/// here because it is selected through an IO register rather than the cartridge.
#[serde_as]
#[derive(Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankStore {
    /// The flat RAM. ROM bank 0 is copied into 0x0000-0x3FFF on construction.
    #[serde_as(as = "serde_with::Bytes")]
    ram: Box<[u8; FLAT_RAM_SIZE]>,
    rom: Box<[RomBank]>,
    external_ram: Box<[RamBank]>,
    wram: Box<[WramBank]>,
    /// ADDR FF70
    wram_bank: u8,
}

impl BankStore {
    pub fn new(profile: &CartridgeProfile, cart: &[u8]) -> Self {
        let rom_count = profile.rom_bank_count();
        let ram_count = profile.ram_bank_count();
        info!(
            "Expecting {rom_count} many ROM banks, requiring {} many bytes from {} many bytes",
            rom_count * ROM_BANK_SIZE,
            cart.len()
        );
        info!(
            "Expecting {ram_count} many RAM banks, requiring {} many bytes",
            ram_count * RAM_BANK_SIZE
        );
        if cart.len() > rom_count * ROM_BANK_SIZE {
            warn!(
                "Cartridge is larger than its declared size. Mapping only {rom_count} banks"
            );
        }

        let rom: Box<[RomBank]> = (0..rom_count)
            .map(|i| cart.get(i * ROM_BANK_SIZE..).unwrap_or_default())
            .map(RomBank::from_slice)
            .collect();
        let mut ram = Box::new([0; FLAT_RAM_SIZE]);
        ram[..ROM_BANK_SIZE].copy_from_slice(&rom[0].0[..]);
        Self {
            ram,
            rom,
            external_ram: (0..ram_count).map(|_| RamBank::new()).collect(),
            wram: (0..WRAM_BANK_COUNT).map(|_| WramBank::new()).collect(),
            wram_bank: 1,
        }
    }

    pub fn rom_bank_count(&self) -> usize {
        self.rom.len()
    }

    pub fn external_ram_bank_count(&self) -> usize {
        self.external_ram.len()
    }

    #[inline]
    pub fn flat(&self, addr: u16) -> u8 {
        self.ram[addr as usize]
    }

    #[inline]
    pub fn set_flat(&mut self, addr: u16, value: u8) {
        self.ram[addr as usize] = value;
    }

    /// Reads from a ROM bank. Banks beyond the end of the cartridge read as open bus.
    #[inline]
    pub fn rom(&self, bank: u8, offset: u16) -> u8 {
        self.rom
            .get(bank as usize)
            .map(|bank| bank.0[offset as usize])
            .unwrap_or(0xFF)
    }

    /// Reads from an external RAM bank. The MBC1 does not validate its RAM pointer, so a pointer
    /// past the last bank reads as open bus.
    #[inline]
    pub fn external_ram(&self, bank: u8, offset: u16) -> u8 {
        self.external_ram
            .get(bank as usize)
            .map(|bank| bank.0[offset as usize])
            .unwrap_or(0xFF)
    }

    /// Writes to an external RAM bank. Writes to a bank that doesn't exist are dropped.
    #[inline]
    pub fn set_external_ram(&mut self, bank: u8, offset: u16, value: u8) {
        if let Some(bank) = self.external_ram.get_mut(bank as usize) {
            bank.0[offset as usize] = value;
        }
    }

    #[inline]
    pub fn wram_bank(&self) -> u8 {
        self.wram_bank
    }

    /// Selects the working RAM bank. Only the bottom three bits are used, and bank 0 can not be
    /// selected (selecting it selects bank 1 instead).
    pub fn select_wram_bank(&mut self, value: u8) {
        self.wram_bank = std::cmp::max(value & 0x07, 1);
    }

    #[inline]
    pub fn wram(&self, offset: u16) -> u8 {
        self.wram[self.wram_bank as usize].0[offset as usize]
    }

    #[inline]
    pub fn set_wram(&mut self, offset: u16, value: u8) {
        self.wram[self.wram_bank as usize].0[offset as usize] = value;
    }

    /// Collects the external RAM banks (in bank order) into a single buffer.
    pub fn dump_external_ram(&self) -> Vec<u8> {
        self.external_ram
            .iter()
            .flat_map(|bank| bank.0.iter().copied())
            .collect()
    }

    /// Overwrites the external RAM banks with the given buffer, which is expected to be laid out
    /// like the output of `dump_external_ram`.
    pub fn load_external_ram(&mut self, data: &[u8]) {
        let capacity = self.external_ram.len() * RAM_BANK_SIZE;
        if data.len() > capacity {
            warn!(
                "Ignoring {} bytes of save data past the cartridge's {capacity} bytes of RAM",
                data.len()
            );
        }
        self.external_ram
            .iter_mut()
            .zip(data.chunks(RAM_BANK_SIZE))
            .for_each(|(bank, chunk)| bank.0[..chunk.len()].copy_from_slice(chunk));
    }
}

impl Debug for BankStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BankStore {{ rom_banks: {}, ram_banks: {}, wram_bank: {} }}",
            self.rom.len(),
            self.external_ram.len(),
            self.wram_bank
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::cart::CartridgeProfile;
    use crate::cart::ControllerKind;
    use crate::cart::RAM_BANK_SIZE;
    use crate::cart::ROM_BANK_SIZE;

    use super::BankStore;

    fn cart(banks: usize) -> Vec<u8> {
        (0..banks)
            .flat_map(|i| std::iter::repeat_n(i as u8, ROM_BANK_SIZE))
            .collect()
    }

    #[test]
    fn construction() {
        let profile = CartridgeProfile::new(ControllerKind::Mbc1, 2, 3, false);
        // Short carts are padded out to the declared size
        let store = BankStore::new(&profile, &cart(5));
        assert_eq!(store.rom_bank_count(), 8);
        assert_eq!(store.external_ram_bank_count(), 4);
        assert_eq!(store.rom(4, 0x3FFF), 4);
        assert_eq!(store.rom(7, 0), 0);
        // ROM bank 0 is copied into the flat RAM
        assert!((0..0x4000).all(|addr| store.flat(addr) == 0));
        assert_eq!(store.wram_bank(), 1);
    }

    #[test]
    fn wram_bank_selection() {
        let profile = CartridgeProfile::new(ControllerKind::None, 0, 0, true);
        let mut store = BankStore::new(&profile, &cart(2));
        store.select_wram_bank(0);
        assert_eq!(store.wram_bank(), 1);
        store.select_wram_bank(0xFA);
        assert_eq!(store.wram_bank(), 2);
        store.set_wram(0x10, 0xAB);
        store.select_wram_bank(3);
        assert_eq!(store.wram(0x10), 0);
        store.select_wram_bank(2);
        assert_eq!(store.wram(0x10), 0xAB);
    }

    #[test]
    fn missing_external_ram() {
        let profile = CartridgeProfile::new(ControllerKind::Mbc1, 1, 2, false);
        let mut store = BankStore::new(&profile, &cart(4));
        store.set_external_ram(0, 0x100, 0x42);
        store.set_external_ram(3, 0x100, 0x42);
        assert_eq!(store.external_ram(0, 0x100), 0x42);
        assert_eq!(store.external_ram(3, 0x100), 0xFF);
    }

    #[test]
    fn external_ram_dump_and_load() {
        let profile = CartridgeProfile::new(ControllerKind::Mbc3, 1, 3, false);
        let mut store = BankStore::new(&profile, &cart(4));
        store.set_external_ram(2, 0x1FFF, 0x99);
        let dump = store.dump_external_ram();
        assert_eq!(dump.len(), 4 * RAM_BANK_SIZE);
        assert_eq!(dump[3 * RAM_BANK_SIZE - 1], 0x99);

        let mut other = BankStore::new(&profile, &cart(4));
        other.load_external_ram(&dump);
        assert_eq!(other.external_ram(2, 0x1FFF), 0x99);

        // Partial loads leave the tail alone
        other.load_external_ram(&vec![0x11; RAM_BANK_SIZE + 1]);
        assert_eq!(other.external_ram(0, 0), 0x11);
        assert_eq!(other.external_ram(1, 0), 0x11);
        assert_eq!(other.external_ram(1, 1), 0);
        assert_eq!(other.external_ram(2, 0x1FFF), 0x99);
    }
}
