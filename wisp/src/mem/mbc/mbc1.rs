use serde::Deserialize;
use serde::Serialize;
use tracing::trace;

use super::BankPointers;

#[derive(Debug, Default, Hash, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MBC1 {
    /// Determines what the secondary register (0x4000-0x5FFF) drives. Set by writes to
    /// 0x6000-0x7FFF.
    banking_mode: BankingMode,
}

/// The MBC1's two wirings of its 2-bit secondary register.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
pub enum BankingMode {
    /// The secondary register supplies the top two bits of the ROM bank pointer.
    #[default]
    Simple = 0,
    /// The secondary register selects the external RAM bank.
    Advanced = 1,
}

impl BankingMode {
    /// Only 0 and 1 are meaningful mode selects. Anything else is ignored.
    fn from_byte(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Simple),
            1 => Some(Self::Advanced),
            _ => None,
        }
    }
}

impl MBC1 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn banking_mode(&self) -> BankingMode {
        self.banking_mode
    }

    /// Handles a write to one of the controller's registers.
    #[inline]
    pub(super) fn write_register(&mut self, banks: &mut BankPointers, addr: u16, value: u8) {
        match addr {
            // RAM enable. External RAM is always accessible, so this is a no-op.
            0x0000..0x2000 => {}
            0x2000..0x4000 => {
                let low = std::cmp::max(value & 0x1F, 1);
                banks.switch_rom((banks.rom() & 0x60) | low);
            }
            0x4000..0x6000 => match self.banking_mode {
                BankingMode::Simple => {
                    let high = (value & 0x03) << 5;
                    banks.switch_rom(high | (banks.rom() & 0x1F));
                }
                BankingMode::Advanced => banks.switch_ram(value),
            },
            0x6000..0x8000 => match BankingMode::from_byte(value) {
                Some(mode) => self.banking_mode = mode,
                None => trace!("Ignoring MBC1 banking mode select of 0x{value:0>2X}"),
            },
            _ => unreachable!(
                "MBC1 is unable to handle a command to memory address: 0x{addr:0>4X}"
            ),
        }
    }
}
