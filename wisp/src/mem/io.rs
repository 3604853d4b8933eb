//! The IO registers that do more than hold a byte. Every write outside of the ROM region is first
//! stored and then checked against this table.

use tracing::debug;
use tracing::trace;

use crate::apu::Sound;
use crate::check_bit_const;
use crate::ppu::Graphics;
use crate::ppu::MonochromePalette;
use crate::ppu::PaletteKind;

use super::rtc::Clock;
use super::AddressSpace;

/// LCD control
pub const LCDC: u16 = 0xFF40;
/// LCD status
pub const STAT: u16 = 0xFF41;
/// OAM DMA source and start
pub const DMA: u16 = 0xFF46;
/// Background palette (monochrome)
pub const BGP: u16 = 0xFF47;
/// Object palette 0 (monochrome)
pub const OBP0: u16 = 0xFF48;
/// Object palette 1 (monochrome)
pub const OBP1: u16 = 0xFF49;
/// VRAM bank select
pub const VBK: u16 = 0xFF4F;
/// VRAM DMA source, high byte
pub const HDMA1: u16 = 0xFF51;
/// VRAM DMA length, mode, and start
pub const HDMA5: u16 = 0xFF55;
/// Background palette index
pub const BCPS: u16 = 0xFF68;
/// Background palette data
pub const BCPD: u16 = 0xFF69;
/// Object palette index
pub const OCPS: u16 = 0xFF6A;
/// Object palette data
pub const OCPD: u16 = 0xFF6B;
/// WRAM bank select
pub const SVBK: u16 = 0xFF70;

impl<G: Graphics, S: Sound, C: Clock> AddressSpace<G, S, C> {
    /// Applies the side effects of a write. The raw value has already been stored by the time this
    /// is called.
    pub(super) fn dispatch(&mut self, addr: u16, value: u8) {
        match addr {
            LCDC => self.graphics.set_lcd_control(value),
            STAT => self.graphics.set_lcd_status(value),
            BGP => self
                .graphics
                .set_monochrome_palette(MonochromePalette::Background, value),
            OBP0 => self
                .graphics
                .set_monochrome_palette(MonochromePalette::Object0, value),
            OBP1 => self
                .graphics
                .set_monochrome_palette(MonochromePalette::Object1, value),
            0xFF10..=0xFF26 => self.sound.write(addr, value),
            0xFF30..=0xFF3F => self.sound.write_waveform(addr, value),
            DMA => self.oam_dma(value),
            /* Color-only registers */
            VBK | HDMA5 | BCPS | BCPD | OCPS | OCPD | SVBK if !self.profile.color => {
                trace!("Ignoring color register write to 0x{addr:0>4X} in monochrome mode")
            }
            VBK => self.graphics.set_vram_bank(value & 0x01),
            HDMA5 => self.vram_dma(value),
            BCPS => self.graphics.set_palette_index(PaletteKind::Background, value),
            OCPS => self.graphics.set_palette_index(PaletteKind::Object, value),
            BCPD => self.write_palette_data(PaletteKind::Background, value),
            OCPD => self.write_palette_data(PaletteKind::Object, value),
            SVBK => {
                self.banks.select_wram_bank(value);
                debug!("Switched to WRAM bank {}", self.banks.wram_bank());
            }
            _ => {}
        }
    }

    /// Writes to palette memory at the current index. If bit 7 of the index register is set, the
    /// index moves to the next byte, wrapping after 63.
    fn write_palette_data(&mut self, kind: PaletteKind, value: u8) {
        let spec = self.graphics.palette_index(kind);
        let index = spec & 0x3F;
        self.graphics.write_palette(kind, index, value);
        if check_bit_const::<7>(spec) {
            self.graphics
                .set_palette_index(kind, 0x80 | ((index + 1) & 0x3F));
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::cart::CartridgeProfile;
    use crate::cart::ControllerKind;
    use crate::ppu::Graphics;
    use crate::ppu::PaletteKind;
    use crate::AddressSpace;

    use super::BCPD;
    use super::BCPS;
    use super::BGP;
    use super::OBP1;
    use super::OCPD;
    use super::OCPS;

    fn color() -> AddressSpace {
        AddressSpace::new(CartridgeProfile::new(ControllerKind::Mbc3, 1, 3, true), &[])
    }

    #[test]
    fn palette_index_wraps() {
        let mut mem = color();
        mem.write(BCPS, 0x80 | 0x3E);
        mem.write(BCPD, 0x11);
        mem.write(BCPD, 0x22);
        mem.write(BCPD, 0x33);
        assert_eq!(mem.graphics().palette_index(PaletteKind::Background), 0x81);
        assert_eq!(mem.graphics().read_palette(PaletteKind::Background, 0x3E), 0x11);
        assert_eq!(mem.graphics().read_palette(PaletteKind::Background, 0x3F), 0x22);
        assert_eq!(mem.graphics().read_palette(PaletteKind::Background, 0x00), 0x33);
    }

    #[test]
    fn palette_reads_follow_index() {
        let mut mem = color();
        mem.write(OCPS, 0x05);
        mem.write(OCPD, 0xAB);
        assert_eq!(mem.read(OCPD), 0xAB);
        mem.write(OCPS, 0x06);
        assert_eq!(mem.read(OCPD), 0x00);
        // The object palette is separate from the background palette
        mem.write(BCPS, 0x05);
        assert_eq!(mem.read(BCPD), 0x00);
    }

    #[test]
    fn monochrome_palettes_are_mirrored() {
        let mut mem = color();
        mem.write(BGP, 0xE4);
        mem.write(OBP1, 0x1B);
        assert_eq!(mem.graphics().monochrome_bg_palette, 0xE4);
        assert_eq!(mem.graphics().monochrome_obj_palettes, [0xFF, 0x1B]);
        assert_eq!(mem.read(BGP), 0xE4);
    }
}
