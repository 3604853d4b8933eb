use serde::Deserialize;
use serde::Serialize;
use tracing::error;
use tracing::warn;

/// The size of a ROM banks, 16 KiB.
pub const ROM_BANK_SIZE: usize = 16 * 1024;

/// The size of a RAM banks, 8 KiB.
pub const RAM_BANK_SIZE: usize = 8 * 1024;

/// The kind of memory bank controller that is wired into the cartridge.
#[derive(
    Debug, Default, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum ControllerKind {
    /// There is no external MBC. Writes into the ROM region are dropped.
    #[default]
    #[display("None")]
    None,
    /// See the [Pan Docs](https://gbdev.io/pandocs/MBC1.html).
    #[display("MBC1")]
    Mbc1,
    /// See the [Pan Docs](https://gbdev.io/pandocs/MBC3.html).
    #[display("MBC3")]
    Mbc3,
    /// A controller that is recognized by the cartridge loader but whose commands are not
    /// modelled. Every command written to it is ignored.
    #[display("Other")]
    Other,
}

/// Describes a cartridge to the memory core. This is built once by the cartridge loader (usually
/// from the ROM header) and never changes for the rest of the session.
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartridgeProfile {
    pub controller: ControllerKind,
    /// The ROM size class, as found at `0x0148` of the header. Classes 0 through 6 are supported.
    pub rom_size: u8,
    /// The RAM size class, as found at `0x0149` of the header.
    pub ram_size: u8,
    /// Whether or not the cartridge runs in color mode. The color-only registers (VRAM and WRAM
    /// bank selects, the VRAM DMA, and the color palettes) are inert when this is unset.
    #[serde(default)]
    pub color: bool,
}

/// How far the switchable ROM bank pointer can be moved for a given ROM size class.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum RomBanking {
    /// The cartridge only has the two fixed banks. No switching is permitted.
    Fixed,
    /// Any pointer strictly below `banks` can be selected.
    Switchable { banks: u16 },
}

impl RomBanking {
    /// Returns `true` if the given bank pointer can be switched to.
    pub fn permits(self, bank: u8) -> bool {
        match self {
            RomBanking::Fixed => false,
            RomBanking::Switchable { banks } => u16::from(bank) < banks,
        }
    }
}

impl CartridgeProfile {
    pub fn new(controller: ControllerKind, rom_size: u8, ram_size: u8, color: bool) -> Self {
        Self {
            controller,
            rom_size,
            ram_size,
            color,
        }
    }

    /// Reads a profile from a TOML document, e.g.
    /// ```toml
    /// controller = "mbc3"
    /// rom_size = 5
    /// ram_size = 3
    /// color = true
    /// ```
    pub fn from_toml(src: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(src)
    }

    /// Determines the legal range of the ROM bank pointer.
    ///
    /// # Panics
    /// An unknown ROM size class means that the cartridge header is malformed. There is no way to
    /// recover from this, so this panics with a message that contains the header fields.
    pub fn rom_banking(&self) -> RomBanking {
        match self.rom_size {
            0 => RomBanking::Fixed,
            n @ 1..=6 => RomBanking::Switchable { banks: 2 << n },
            _ => {
                error!("Unsupported ROM size class in cartridge profile: {self:?}");
                panic!(
                    "ROM size class is invalid => type: {} rom: 0x{:0>2X} ram: 0x{:0>2X}",
                    self.controller, self.rom_size, self.ram_size
                )
            }
        }
    }

    /// The number of 16 KiB ROM banks the cartridge declares.
    pub fn rom_bank_count(&self) -> usize {
        match self.rom_banking() {
            RomBanking::Fixed => 2,
            RomBanking::Switchable { banks } => banks as usize,
        }
    }

    /// The number of 8 KiB external RAM banks the cartridge declares. The 2 KiB size is rounded
    /// up to a full bank.
    pub fn ram_bank_count(&self) -> usize {
        match self.ram_size {
            0x00 => 0,
            0x01 | 0x02 => 1,
            0x03 => 4,
            0x04 => 16,
            0x05 => 8,
            n => {
                warn!("Unknown RAM size class 0x{n:0>2X}, treating the cartridge as having no RAM");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CartridgeProfile;
    use super::ControllerKind;
    use super::RomBanking;

    #[test]
    fn rom_banking_per_class() {
        let banking: Vec<_> = (0..=6)
            .map(|class| CartridgeProfile::new(ControllerKind::Mbc1, class, 0, false))
            .map(|profile| profile.rom_banking())
            .collect();
        assert_eq!(banking[0], RomBanking::Fixed);
        assert_eq!(banking[1], RomBanking::Switchable { banks: 4 });
        assert_eq!(banking[2], RomBanking::Switchable { banks: 8 });
        assert_eq!(banking[6], RomBanking::Switchable { banks: 128 });

        assert!(!RomBanking::Fixed.permits(1));
        assert!(banking[1].permits(3));
        assert!(!banking[1].permits(4));
        assert!(banking[6].permits(127));
        assert!(!banking[6].permits(128));
    }

    #[test]
    #[should_panic(expected = "ROM size class is invalid => type: MBC3 rom: 0x07 ram: 0x03")]
    fn unknown_rom_class_is_fatal() {
        CartridgeProfile::new(ControllerKind::Mbc3, 7, 3, true).rom_banking();
    }

    #[test]
    fn ram_bank_counts() {
        let count = |class| {
            CartridgeProfile::new(ControllerKind::Mbc1, 0, class, false).ram_bank_count()
        };
        assert_eq!(count(0), 0);
        assert_eq!(count(1), 1);
        assert_eq!(count(2), 1);
        assert_eq!(count(3), 4);
        assert_eq!(count(4), 16);
        assert_eq!(count(5), 8);
        assert_eq!(count(0x42), 0);
    }

    #[test]
    fn profile_from_toml() {
        let profile = CartridgeProfile::from_toml(
            r#"
            controller = "mbc3"
            rom_size = 5
            ram_size = 3
            color = true
            "#,
        )
        .unwrap();
        assert_eq!(
            profile,
            CartridgeProfile::new(ControllerKind::Mbc3, 5, 3, true)
        );

        let profile =
            CartridgeProfile::from_toml("controller = \"none\"\nrom_size = 0\nram_size = 0")
                .unwrap();
        assert!(!profile.color);
        assert!(CartridgeProfile::from_toml("controller = \"mbc9\"").is_err());
    }
}
