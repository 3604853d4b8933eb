use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::trace;

use super::BankPointers;
use super::ControllerEffect;

#[derive(Debug, Default, Hash, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MBC3 {
    /// When set, the external RAM is hidden and this clock register is visible in 0xA000-0xBFFF
    /// instead. Only 0x08 through 0x0C are valid.
    rtc_select: Option<u8>,
}

impl MBC3 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rtc_select(&self) -> Option<u8> {
        self.rtc_select
    }

    #[inline]
    pub(super) fn write_register(
        &mut self,
        banks: &mut BankPointers,
        addr: u16,
        value: u8,
    ) -> Option<ControllerEffect> {
        match addr {
            // RAM and timer enable. Both are always accessible, so this is a no-op.
            0x0000..0x2000 => {}
            0x2000..0x4000 => banks.switch_rom(std::cmp::max(value & 0x7F, 1)),
            0x4000..0x6000 => match value {
                0x00..=0x07 => {
                    self.rtc_select = None;
                    banks.switch_ram(value);
                }
                0x08..=0x0C => {
                    debug!("Mapping RTC register 0x{value:0>2X}");
                    self.rtc_select = Some(value);
                }
                _ => trace!("Ignoring MBC3 RAM/RTC select of 0x{value:0>2X}"),
            },
            0x6000..0x8000 => {
                if value == 1 {
                    return Some(ControllerEffect::LatchClock);
                }
            }
            _ => unreachable!(
                "MBC3 is unable to handle a command to memory address: 0x{addr:0>4X}"
            ),
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use crate::cart::RomBanking;
    use crate::mem::mbc::BankPointers;
    use crate::mem::mbc::ControllerEffect;

    use super::MBC3;

    fn setup(banks: u16) -> (MBC3, BankPointers) {
        (MBC3::new(), BankPointers::new(RomBanking::Switchable { banks }))
    }

    #[test]
    fn rom_bank_select() {
        let (mut mbc, mut banks) = setup(128);
        mbc.write_register(&mut banks, 0x2000, 0x45);
        assert_eq!(banks.rom(), 0x45);
        mbc.write_register(&mut banks, 0x2000, 0x00);
        assert_eq!(banks.rom(), 1);
        // The top bit is ignored, so 0x80 is 0, which is then 1
        mbc.write_register(&mut banks, 0x2000, 0x83);
        assert_eq!(banks.rom(), 3);
        mbc.write_register(&mut banks, 0x2000, 0x80);
        assert_eq!(banks.rom(), 1);

        let (mut mbc, mut banks) = setup(16);
        mbc.write_register(&mut banks, 0x3000, 0x0F);
        assert_eq!(banks.rom(), 0x0F);
        mbc.write_register(&mut banks, 0x3000, 0x10);
        assert_eq!(banks.rom(), 0x0F);
    }

    #[test]
    fn ram_and_rtc_select() {
        let (mut mbc, mut banks) = setup(128);
        mbc.write_register(&mut banks, 0x4000, 0x03);
        assert_eq!(banks.ram(), 3);
        assert_eq!(mbc.rtc_select(), None);

        mbc.write_register(&mut banks, 0x4000, 0x09);
        assert_eq!(mbc.rtc_select(), Some(0x09));
        // Mapping the RTC leaves the RAM pointer alone
        assert_eq!(banks.ram(), 3);

        // Out-of-range selects do nothing
        mbc.write_register(&mut banks, 0x5000, 0x0D);
        assert_eq!(mbc.rtc_select(), Some(0x09));
        mbc.write_register(&mut banks, 0x5000, 0xFF);
        assert_eq!(mbc.rtc_select(), Some(0x09));

        mbc.write_register(&mut banks, 0x5FFF, 0x07);
        assert_eq!(mbc.rtc_select(), None);
        assert_eq!(banks.ram(), 7);
    }

    #[test]
    fn latching() {
        let (mut mbc, mut banks) = setup(128);
        assert_eq!(mbc.write_register(&mut banks, 0x6000, 0x00), None);
        assert_eq!(
            mbc.write_register(&mut banks, 0x6000, 0x01),
            Some(ControllerEffect::LatchClock)
        );
        assert_eq!(
            mbc.write_register(&mut banks, 0x7FFF, 0x01),
            Some(ControllerEffect::LatchClock)
        );
        assert_eq!(mbc.write_register(&mut banks, 0x7FFF, 0x02), None);
        assert_eq!(mbc.write_register(&mut banks, 0x1000, 0x0A), None);
    }
}
