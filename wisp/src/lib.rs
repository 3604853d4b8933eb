//! Wisp is the memory core of the specters project. Contained here is all of the logic that turns
//! a CPU-visible 16-bit address into a storage cell: bank switching for the cartridge controllers,
//! the real-time clock window, the OAM and VRAM DMA engines, and the side effects of the memory
//! mapped IO registers.
//!
//! The CPU, PPU, APU, and cartridge clock are not part of this crate. The PPU, APU, and clock are
//! reached through the small traits in [`ppu`], [`apu`], and [`mem::rtc`]. Each of those modules
//! also provides a plain register-only implementation that is used by default.
//!
//! # Notes
//! Everything here is driven synchronously by the CPU loop. A read or write (including a DMA
//! transfer that it triggers) runs to completion before control returns.

pub mod apu;
pub mod cart;
pub mod mem;
pub mod ppu;
mod utils;

pub use apu::{AudioRegisters, Sound};
pub use cart::{CartridgeProfile, ControllerKind};
pub use mem::rtc::{Clock, RealTimeClock};
pub use mem::{AddressSpace, MemoryLike, MemoryLikeExt};
pub use ppu::{Graphics, VideoRegisters};

/// Checks if the `B`th bit of the given byte is set.
pub const fn check_bit_const<const B: u8>(src: u8) -> bool {
    (src & (1 << B)) == (1 << B)
}
