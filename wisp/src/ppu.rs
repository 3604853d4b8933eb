//! The parts of the Pixel Processing Unit that the memory core touches. The PPU owns the video RAM
//! and the palette memory; the memory core only indexes into them through the [`Graphics`] trait.

use serde::Deserialize;
use serde::Serialize;
use tracing::trace;

/// Which of the two color palette blocks is being accessed.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
pub enum PaletteKind {
    /// Indexed through FF68 (BCPS) and accessed through FF69 (BCPD).
    Background,
    /// Indexed through FF6A (OCPS) and accessed through FF6B (OCPD).
    Object,
}

/// The three monochrome palette registers.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
pub enum MonochromePalette {
    /// ADDR FF47
    Background,
    /// ADDR FF48
    Object0,
    /// ADDR FF49
    Object1,
}

/// The capabilities that the memory core needs from the PPU.
pub trait Graphics {
    /// ADDR FF40
    fn lcd_control(&self) -> u8;

    fn set_lcd_control(&mut self, value: u8);

    /// ADDR FF41
    fn lcd_status(&self) -> u8;

    fn set_lcd_status(&mut self, value: u8);

    fn set_monochrome_palette(&mut self, palette: MonochromePalette, value: u8);

    /// The VRAM bank that is visible to the CPU in 0x8000-0x9FFF.
    fn vram_bank(&self) -> u8;

    fn set_vram_bank(&mut self, bank: u8);

    /// Reads from VRAM. The offset is relative to 0x8000.
    fn read_vram(&self, bank: u8, offset: u16) -> u8;

    fn write_vram(&mut self, bank: u8, offset: u16, value: u8);

    /// Reads the palette index register. The bottom six bits are the index into the palette
    /// memory and the top bit is the auto-increment flag.
    fn palette_index(&self, palette: PaletteKind) -> u8;

    fn set_palette_index(&mut self, palette: PaletteKind, value: u8);

    /// Reads a byte from palette memory. The index should be between 0 and 63.
    fn read_palette(&self, palette: PaletteKind, index: u8) -> u8;

    fn write_palette(&mut self, palette: PaletteKind, index: u8, value: u8);
}

/// Holds the PPU registers and memory that are visible to the memory core. No rendering happens
/// here.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRegisters {
    /// The main video RAM. Accessible through the address range 0x8000 through 0x9FFF.
    #[serde(serialize_with = "crate::utils::serialize_slices_as_one")]
    #[serde(deserialize_with = "crate::utils::deserialize_slices_as_one")]
    pub vram: [[u8; 0x2000]; 2],
    /// ADDR FF4F
    vram_bank: u8,
    /// ADDR FF40
    pub lcd_control: u8,
    /// ADDR FF41
    pub lcd_status: u8,
    /// ADDR FF47
    pub monochrome_bg_palette: u8,
    /// ADDR FF48 & FF49
    pub monochrome_obj_palettes: [u8; 2],
    /// ADDR FF68 and FF69
    pub background_palettes: ColorPalettes,
    /// ADDR FF6A and FF6B
    pub object_palettes: ColorPalettes,
}

impl Default for VideoRegisters {
    fn default() -> Self {
        Self {
            vram: [[0; 0x2000]; 2],
            vram_bank: 0,
            lcd_control: 0,
            lcd_status: 0,
            monochrome_bg_palette: 0,
            monochrome_obj_palettes: [0xFF; 2],
            background_palettes: ColorPalettes::default(),
            object_palettes: ColorPalettes::default(),
        }
    }
}

impl VideoRegisters {
    pub fn new() -> Self {
        Self::default()
    }

    fn palettes(&self, palette: PaletteKind) -> &ColorPalettes {
        match palette {
            PaletteKind::Background => &self.background_palettes,
            PaletteKind::Object => &self.object_palettes,
        }
    }

    fn palettes_mut(&mut self, palette: PaletteKind) -> &mut ColorPalettes {
        match palette {
            PaletteKind::Background => &mut self.background_palettes,
            PaletteKind::Object => &mut self.object_palettes,
        }
    }
}

impl Graphics for VideoRegisters {
    fn lcd_control(&self) -> u8 {
        self.lcd_control
    }

    fn set_lcd_control(&mut self, value: u8) {
        trace!(
            "Changing LCD Control register from 0x{:0>2X} to 0x{value:0>2X}",
            self.lcd_control
        );
        self.lcd_control = value;
    }

    fn lcd_status(&self) -> u8 {
        self.lcd_status
    }

    fn set_lcd_status(&mut self, value: u8) {
        trace!(
            "Changing LCD Stat register from 0x{:0>2X} to 0x{value:0>2X}",
            self.lcd_status
        );
        self.lcd_status = value;
    }

    fn set_monochrome_palette(&mut self, palette: MonochromePalette, value: u8) {
        match palette {
            MonochromePalette::Background => self.monochrome_bg_palette = value,
            MonochromePalette::Object0 => self.monochrome_obj_palettes[0] = value,
            MonochromePalette::Object1 => self.monochrome_obj_palettes[1] = value,
        }
    }

    fn vram_bank(&self) -> u8 {
        self.vram_bank
    }

    fn set_vram_bank(&mut self, bank: u8) {
        self.vram_bank = bank & 0x01;
    }

    fn read_vram(&self, bank: u8, offset: u16) -> u8 {
        self.vram[(bank & 0x01) as usize][offset as usize]
    }

    fn write_vram(&mut self, bank: u8, offset: u16, value: u8) {
        self.vram[(bank & 0x01) as usize][offset as usize] = value;
    }

    fn palette_index(&self, palette: PaletteKind) -> u8 {
        self.palettes(palette).index
    }

    fn set_palette_index(&mut self, palette: PaletteKind, value: u8) {
        self.palettes_mut(palette).index = value;
    }

    fn read_palette(&self, palette: PaletteKind, index: u8) -> u8 {
        self.palettes(palette).read_byte(index)
    }

    fn write_palette(&mut self, palette: PaletteKind, index: u8, value: u8) {
        self.palettes_mut(palette).write_byte(index, value)
    }
}

/// In color mode, there are extra palettes for the colors
#[derive(Debug, Clone, Hash, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColorPalettes {
    /// The "index" (aka "address") register.
    pub index: u8,
    pub data: [Palette; 8],
}

impl ColorPalettes {
    /// Palette data is stored as an array of 4-color arrays where each color is 2 bytes. The
    /// bottom six bits of the index select the palette (top three) and the byte in it (bottom
    /// three).
    fn split(index: u8) -> (usize, u8) {
        let index = index & 0b0011_1111;
        (((index & 0b0011_1000) >> 3) as usize, index & 0b111)
    }

    pub fn read_byte(&self, index: u8) -> u8 {
        let (palette, byte) = Self::split(index);
        self.data[palette].read_byte(byte)
    }

    pub fn write_byte(&mut self, index: u8, value: u8) {
        let (palette, byte) = Self::split(index);
        self.data[palette].write_byte(byte, value)
    }
}

/// All of the date for one of the 8 palettes that can be held in memory.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Palette {
    pub colors: [PaletteColor; 4],
}

impl Palette {
    /// A palette contains an array of 4 two-byte arrays. The give index should be between 0-7 and
    /// acts as the index for both the inner and outer arrays.
    pub fn read_byte(&self, index: u8) -> u8 {
        let outer = (index >> 1) as usize;
        let inner = (index & 1) as usize;
        self.colors[outer].0[inner]
    }

    pub fn write_byte(&mut self, index: u8, value: u8) {
        let outer = (index >> 1) as usize;
        let inner = (index & 1) as usize;
        self.colors[outer].0[inner] = value;
    }
}

/// Each color takes up two bytes and represents each channel with 5 bits (in little-endian). The
/// top bit is not used.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaletteColor(pub [u8; 2]);

impl PaletteColor {
    pub fn r(&self) -> u8 {
        self.0[0] & 0b0001_1111
    }

    pub fn g(&self) -> u8 {
        ((self.0[0] & 0b1110_0000) >> 5) | ((self.0[1] & 0b0000_0011) << 3)
    }

    pub fn b(&self) -> u8 {
        (self.0[1] & 0b0111_1100) >> 2
    }
}

#[cfg(test)]
mod tests {
    use super::ColorPalettes;
    use super::Graphics;
    use super::PaletteColor;
    use super::PaletteKind;
    use super::VideoRegisters;

    /// Palette bytes are laid out palette-major, then color, then low/high byte.
    #[test]
    fn palette_byte_layout() {
        let mut palettes = ColorPalettes::default();
        (0..64u8).for_each(|i| palettes.write_byte(i, i));
        assert_eq!(palettes.data[0].colors[0], PaletteColor([0, 1]));
        assert_eq!(palettes.data[0].colors[3], PaletteColor([6, 7]));
        assert_eq!(palettes.data[7].colors[3], PaletteColor([62, 63]));
        // The top two bits of the index are ignored
        assert_eq!(palettes.read_byte(0x80 | 0x05), 5);
        assert_eq!(palettes.read_byte(0xC0 | 0x3F), 63);
    }

    #[test]
    fn color_channels() {
        // r = 0b10101, g = 0b01110, b = 0b11001
        let color = PaletteColor([0b1101_0101, 0b0110_0101]);
        assert_eq!(color.r(), 0b10101);
        assert_eq!(color.g(), 0b01110);
        assert_eq!(color.b(), 0b11001);
    }

    #[test]
    fn vram_banks() {
        let mut regs = VideoRegisters::new();
        regs.write_vram(0, 0x1FFF, 0x12);
        regs.write_vram(1, 0x1FFF, 0x34);
        assert_eq!(regs.read_vram(0, 0x1FFF), 0x12);
        assert_eq!(regs.read_vram(1, 0x1FFF), 0x34);
        regs.set_vram_bank(0xFF);
        assert_eq!(regs.vram_bank(), 1);
        regs.set_palette_index(PaletteKind::Object, 0x81);
        assert_eq!(regs.palette_index(PaletteKind::Object), 0x81);
        assert_eq!(regs.palette_index(PaletteKind::Background), 0);
    }
}
