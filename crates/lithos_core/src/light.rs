//! # Packed Tile Light
//!
//! Light is stored per tile as a `u16`:
//!
//! ```text
//! bits  0-3   red    (0-15)
//! bits  4-7   green  (0-15)
//! bits  8-11  blue   (0-15)
//! bit   12    source flag (tile emits this light)
//! bit   13    in-sun flag (light comes straight from the sky)
//! bits 14-15  reserved
//! ```

use bytemuck::{Pod, Zeroable};
use lithos_shared::constants::MAX_LIGHT_CHANNEL;

const CHANNEL_MASK: u16 = 0x0F;
const SOURCE_BIT: u16 = 1 << 12;
const SUN_BIT: u16 = 1 << 13;

/// Packed RGB light value with source and sun flags.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct TileLight(u16);

impl TileLight {
    /// No light at all.
    pub const DARK: Self = Self(0);

    /// Full white sunlight.
    pub const SUN: Self = Self(0x0FFF | SUN_BIT);

    /// Creates a light value; each channel is clamped to 4 bits.
    #[inline]
    #[must_use]
    pub fn new(red: u8, green: u8, blue: u8) -> Self {
        let r = u16::from(red.min(MAX_LIGHT_CHANNEL));
        let g = u16::from(green.min(MAX_LIGHT_CHANNEL));
        let b = u16::from(blue.min(MAX_LIGHT_CHANNEL));
        Self(r | (g << 4) | (b << 8))
    }

    /// Creates a grey light of the given intensity.
    #[inline]
    #[must_use]
    pub fn gray(level: u8) -> Self {
        Self::new(level, level, level)
    }

    /// Creates an emitting light source.
    #[inline]
    #[must_use]
    pub fn source(red: u8, green: u8, blue: u8) -> Self {
        Self::new(red, green, blue).with_source(true)
    }

    /// Reinterprets raw packed bits.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// Returns the raw packed bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Red channel.
    #[inline]
    #[must_use]
    pub const fn red(self) -> u8 {
        (self.0 & CHANNEL_MASK) as u8
    }

    /// Green channel.
    #[inline]
    #[must_use]
    pub const fn green(self) -> u8 {
        ((self.0 >> 4) & CHANNEL_MASK) as u8
    }

    /// Blue channel.
    #[inline]
    #[must_use]
    pub const fn blue(self) -> u8 {
        ((self.0 >> 8) & CHANNEL_MASK) as u8
    }

    /// True if the tile emits this light.
    #[inline]
    #[must_use]
    pub const fn is_source(self) -> bool {
        self.0 & SOURCE_BIT != 0
    }

    /// True if the light comes directly from the sky.
    #[inline]
    #[must_use]
    pub const fn in_sun(self) -> bool {
        self.0 & SUN_BIT != 0
    }

    /// Returns a copy with the source flag set or cleared.
    #[inline]
    #[must_use]
    pub const fn with_source(self, source: bool) -> Self {
        if source {
            Self(self.0 | SOURCE_BIT)
        } else {
            Self(self.0 & !SOURCE_BIT)
        }
    }

    /// Returns a copy with the in-sun flag set or cleared.
    #[inline]
    #[must_use]
    pub const fn with_sun(self, in_sun: bool) -> Self {
        if in_sun {
            Self(self.0 | SUN_BIT)
        } else {
            Self(self.0 & !SUN_BIT)
        }
    }

    /// Brightest channel, used as a scalar intensity.
    #[inline]
    #[must_use]
    pub fn intensity(self) -> u8 {
        self.red().max(self.green()).max(self.blue())
    }

    /// True if every channel is zero.
    #[inline]
    #[must_use]
    pub const fn is_dark(self) -> bool {
        self.0 & 0x0FFF == 0
    }

    /// Combines two lights, keeping the brightest value of each channel.
    ///
    /// Flags are merged: the result is a source or in the sun if either input is.
    #[must_use]
    pub fn combine_brightest(self, other: Self) -> Self {
        let combined = Self::new(
            self.red().max(other.red()),
            self.green().max(other.green()),
            self.blue().max(other.blue()),
        );
        Self(combined.0 | ((self.0 | other.0) & (SOURCE_BIT | SUN_BIT)))
    }

    /// Light one propagation step further away: each lit channel drops by one
    /// and both flags are cleared.
    #[must_use]
    pub fn dimmer(self) -> Self {
        Self::new(
            self.red().saturating_sub(1),
            self.green().saturating_sub(1),
            self.blue().saturating_sub(1),
        )
    }

    /// True if `self` is at least as bright as `other` on every channel.
    #[must_use]
    pub fn covers(self, other: Self) -> bool {
        self.red() >= other.red() && self.green() >= other.green() && self.blue() >= other.blue()
    }
}
