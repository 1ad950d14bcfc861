// palette.rs — Iteration count → colour.
//
// A palette is a flat table of packed 0x00RRGGBB colours built by linear
// interpolation between a list of colour stops. The same table is uploaded to
// the GPU so the compute kernel can colour pixels in place; the CPU path uses
// `Palette::color` with identical rules:
//
//   n == max_iterations  → black (inside the set)
//   otherwise            → entries[n % len]
//
// Packed 0x00RRGGBB is the pixel format minifb expects, so a coloured image
// goes to the window without conversion.

use crate::image::Image;

/// An RGB colour stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const RED: Rgb = Rgb(255, 0, 0);
    pub const GREEN: Rgb = Rgb(0, 255, 0);
    pub const BLUE: Rgb = Rgb(0, 0, 255);

    #[inline]
    pub fn pack(self) -> u32 {
        ((self.0 as u32) << 16) | ((self.1 as u32) << 8) | self.2 as u32
    }

    #[inline]
    pub fn unpack(packed: u32) -> Rgb {
        Rgb((packed >> 16) as u8, (packed >> 8) as u8, packed as u8)
    }
}

/// Colour lookup table for escape-time counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<u32>,
}

impl Palette {
    /// Interpolate `steps` entries per segment between consecutive stops.
    ///
    /// Each segment runs from its first stop to its last stop inclusive, so
    /// the table has `steps * (stops.len() - 1)` entries.
    ///
    /// # Panics
    /// Panics if fewer than two stops are given or `steps == 0`.
    pub fn gradient(steps: usize, stops: &[Rgb]) -> Self {
        assert!(stops.len() >= 2, "a gradient needs at least two stops");
        assert!(steps > 0, "a gradient needs at least one step per segment");

        let mut entries = Vec::with_capacity(steps * (stops.len() - 1));
        for pair in stops.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            for j in 0..steps {
                let t = if steps == 1 { 0.0 } else { j as f32 / (steps - 1) as f32 };
                entries.push(lerp(from, to, t).pack());
            }
        }
        Palette { entries }
    }

    /// Build a palette from already-packed colours.
    ///
    /// # Panics
    /// Panics if `entries` is empty.
    pub fn from_entries(entries: Vec<u32>) -> Self {
        assert!(!entries.is_empty(), "palette must have at least one entry");
        Palette { entries }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.entries
    }

    /// Colour for an iteration count.
    #[inline]
    pub fn color(&self, n: u32, max_iterations: u32) -> u32 {
        if n >= max_iterations {
            Rgb::BLACK.pack()
        } else {
            self.entries[n as usize % self.entries.len()]
        }
    }

    /// Colour a whole image of iteration counts.
    pub fn colorize(&self, counts: &Image<u32>, max_iterations: u32) -> Image<u32> {
        counts.map(|n| self.color(n, max_iterations))
    }
}

impl Default for Palette {
    /// 32 steps over red → green → blue.
    fn default() -> Self {
        Palette::gradient(32, &[Rgb::RED, Rgb::GREEN, Rgb::BLUE])
    }
}

#[inline]
fn lerp(a: Rgb, b: Rgb, t: f32) -> Rgb {
    let mix = |x: u8, y: u8| ((1.0 - t) * x as f32 + t * y as f32).round() as u8;
    Rgb(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}
