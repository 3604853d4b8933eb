use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::apu::Sound;
use crate::check_bit_const;
use crate::ppu::Graphics;

use super::io::HDMA1;
use super::io::HDMA5;
use super::rtc::Clock;
use super::AddressSpace;

/// A copy into the object attribute memory, started by a write to FF46.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct OamDmaRequest {
    pub source: u16,
}

impl OamDmaRequest {
    pub const DESTINATION: u16 = 0xFE00;
    pub const LENGTH: u16 = 0xA0;
    /// The number of cycles the CPU is locked out of the bus for.
    pub const STALL_CYCLES: u32 = 150;

    /// The written value is the high byte of the source address.
    pub fn new(value: u8) -> Self {
        Self {
            source: u16::from(value) << 8,
        }
    }
}

/// When, relative to the PPU, a VRAM DMA is meant to run. Both modes are carried out in full the
/// moment they are requested.
#[derive(
    Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize, derive_more::IsVariant,
)]
pub enum HdmaMode {
    /// General purpose DMA. Bit 7 of FF55 is clear.
    General,
    /// 16 bytes per HBlank. Bit 7 of FF55 is set.
    HBlank,
}

/// A copy into VRAM, started by a write to FF55 in color mode.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct VramDmaRequest {
    pub source: u16,
    pub destination: u16,
    pub length: u16,
    pub mode: HdmaMode,
}

impl VramDmaRequest {
    /// Decodes a request from the four address registers (FF51-FF54) and the control byte
    /// written to FF55.
    ///  - The bottom 4 bits of the source and destination are ignored
    ///  - The destination is always inside of VRAM (0x8000-0x9FF0)
    ///  - The bottom 7 bits of the control byte are the length, in 16 byte blocks, minus one
    pub fn decode([src_hi, src_lo, dest_hi, dest_lo]: [u8; 4], control: u8) -> Self {
        let source = u16::from_be_bytes([src_hi, src_lo & 0xF0]);
        let destination = u16::from_be_bytes([(dest_hi | 0x80) & 0x9F, dest_lo & 0xF0]);
        let length = (u16::from(control & 0x7F) + 1) * 16;
        let mode = if check_bit_const::<7>(control) {
            HdmaMode::HBlank
        } else {
            HdmaMode::General
        };
        Self {
            source,
            destination,
            length,
            mode,
        }
    }
}

impl<G: Graphics, S: Sound, C: Clock> AddressSpace<G, S, C> {
    pub(super) fn oam_dma(&mut self, value: u8) {
        let req = OamDmaRequest::new(value);
        debug!(
            "OAM DMA from 0x{:0>4X} to 0x{:0>4X}",
            req.source,
            OamDmaRequest::DESTINATION
        );
        self.copy(req.source, OamDmaRequest::DESTINATION, OamDmaRequest::LENGTH);
        self.stall_cycles = self.stall_cycles.saturating_add(OamDmaRequest::STALL_CYCLES);
    }

    pub(super) fn vram_dma(&mut self, control: u8) {
        let mut regs = [0; 4];
        regs.iter_mut()
            .zip(HDMA1..)
            .for_each(|(reg, addr)| *reg = self.banks.flat(addr));
        let req = VramDmaRequest::decode(regs, control);
        debug!(
            "{:?} VRAM DMA of {} bytes from 0x{:0>4X} to 0x{:0>4X}",
            req.mode, req.length, req.source, req.destination
        );
        self.copy(req.source, req.destination, req.length);
        // Stored directly so that the completion marker doesn't start another transfer.
        self.banks.set_flat(HDMA5, 0xFF);
    }

    fn copy(&mut self, src: u16, dest: u16, len: u16) {
        for i in 0..len {
            let byte = self.read(src.wrapping_add(i));
            self.write(dest.wrapping_add(i), byte);
        }
    }
}
