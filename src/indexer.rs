// indexer.rs
//
// Copyright (c) 2019-2025  Douglas Lau
//
//! Mapping frame pixels to palette indices
use crate::palette::PaletteIndex;
use crate::quant::NET_SIZE;
use pix::rgb::{Rgb, SRgb8};
use pix::Raster;

/// How a transparent color is matched to the palette
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorMatch {
    /// Only an identical palette entry
    Exact,
    /// Nearest used palette entry
    #[default]
    Closest,
}

/// Frame pixels mapped to palette indices
#[derive(Clone, Debug)]
pub struct IndexedFrame {
    /// One palette index per pixel
    indices: Vec<u8>,
    /// Palette entries present in `indices`
    used: [bool; NET_SIZE],
    /// Transparent palette index
    transparent: Option<u8>,
}

/// Get the RGB channels of a pixel
pub(crate) fn rgb_channels(clr: SRgb8) -> [u8; 3] {
    [
        u8::from(Rgb::red(clr)),
        u8::from(Rgb::green(clr)),
        u8::from(Rgb::blue(clr)),
    ]
}

/// Draw a raster onto a screen-sized canvas, as packed BGR.
///
/// The raster is placed at the top-left corner; uncovered pixels are
/// filled with the background color and overhanging pixels are cropped.
pub(crate) fn screen_bgr(
    raster: &Raster<SRgb8>,
    width: usize,
    height: usize,
    background: SRgb8,
) -> Vec<u8> {
    let [br, bg, bb] = rgb_channels(background);
    let rw = raster.width() as usize;
    let rh = raster.height() as usize;
    let pixels = raster.pixels();
    let mut bgr = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        for x in 0..width {
            if x < rw && y < rh {
                let [r, g, b] = rgb_channels(pixels[y * rw + x]);
                bgr.extend_from_slice(&[b, g, r]);
            } else {
                bgr.extend_from_slice(&[bb, bg, br]);
            }
        }
    }
    bgr
}

impl IndexedFrame {
    /// Map packed BGR pixels to a palette
    pub fn new(bgr: &[u8], palette: &PaletteIndex) -> Self {
        let mut used = [false; NET_SIZE];
        let indices = bgr
            .chunks_exact(3)
            .map(|p| {
                let idx = palette.map(p[0], p[1], p[2]);
                used[usize::from(idx)] = true;
                idx
            })
            .collect();
        IndexedFrame {
            indices,
            used,
            transparent: None,
        }
    }

    /// Get the palette indices
    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    /// Take the palette indices
    pub fn into_indices(self) -> Vec<u8> {
        self.indices
    }

    /// Get the used entry map
    pub fn used(&self) -> &[bool; NET_SIZE] {
        &self.used
    }

    /// Count used palette entries
    pub fn used_count(&self) -> usize {
        self.used.iter().filter(|u| **u).count()
    }

    /// Get the transparent palette index
    pub fn transparent(&self) -> Option<u8> {
        self.transparent
    }

    /// Resolve a transparent color (RGB) to a used palette entry
    pub fn resolve_transparent(
        &mut self,
        color: [u8; 3],
        matching: ColorMatch,
        palette: &PaletteIndex,
    ) -> Option<u8> {
        self.transparent = match matching {
            ColorMatch::Exact => find_exact(color, palette, &self.used),
            ColorMatch::Closest => find_closest(color, palette, &self.used),
        };
        self.transparent
    }
}

/// Find a used palette entry exactly matching an RGB color
pub fn find_exact(
    color: [u8; 3],
    palette: &PaletteIndex,
    used: &[bool; NET_SIZE],
) -> Option<u8> {
    (0..palette.len())
        .filter(|i| used[*i])
        .map(|i| i as u8)
        .find(|i| palette.rgb(*i) == color)
}

/// Find the used palette entry closest to an RGB color.
///
/// Distance is squared euclidean; ties go to the lowest index.
pub fn find_closest(
    color: [u8; 3],
    palette: &PaletteIndex,
    used: &[bool; NET_SIZE],
) -> Option<u8> {
    let dist = |c: [u8; 3]| -> u32 {
        c.iter()
            .zip(color.iter())
            .map(|(a, b)| {
                let d = i32::from(*a) - i32::from(*b);
                (d * d) as u32
            })
            .sum()
    };
    (0..palette.len())
        .filter(|i| used[*i])
        .map(|i| i as u8)
        .min_by_key(|i| dist(palette.rgb(*i)))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::quant::Network;

    /// Gray axis palette: entry `i` is (i, i, i)
    fn gray() -> PaletteIndex {
        PaletteIndex::new(&Network::new())
    }

    #[test]
    fn index_gray() {
        let pal = gray();
        let bgr = [0, 0, 0, 10, 10, 10, 200, 200, 200, 10, 10, 10];
        let frame = IndexedFrame::new(&bgr, &pal);
        assert_eq!(frame.indices(), [0, 10, 200, 10]);
        assert_eq!(frame.used_count(), 3);
        for (i, u) in frame.used().iter().enumerate() {
            assert_eq!(*u, i == 0 || i == 10 || i == 200);
        }
        assert!(frame.indices().iter().all(|i| frame.used()[*i as usize]));
    }

    #[test]
    fn exact() {
        let pal = gray();
        let mut used = [false; NET_SIZE];
        used[5] = true;
        used[99] = true;
        assert_eq!(find_exact([99, 99, 99], &pal, &used), Some(99));
        assert_eq!(find_exact([5, 5, 5], &pal, &used), Some(5));
        // present in palette, but not used
        assert_eq!(find_exact([6, 6, 6], &pal, &used), None);
        assert_eq!(find_exact([5, 5, 6], &pal, &used), None);
    }

    #[test]
    fn closest() {
        let pal = gray();
        let mut used = [false; NET_SIZE];
        assert_eq!(find_closest([1, 2, 3], &pal, &used), None);
        used[20] = true;
        assert_eq!(find_closest([255, 0, 0], &pal, &used), Some(20));
        used[100] = true;
        assert_eq!(find_closest([90, 90, 90], &pal, &used), Some(100));
        assert_eq!(find_closest([30, 30, 30], &pal, &used), Some(20));
        // equidistant: lowest index wins
        assert_eq!(find_closest([60, 60, 60], &pal, &used), Some(20));
    }

    #[test]
    fn transparent() {
        let pal = gray();
        let bgr = [50, 50, 50, 70, 70, 70];
        let mut frame = IndexedFrame::new(&bgr, &pal);
        assert_eq!(
            frame.resolve_transparent([71, 71, 71], ColorMatch::Exact, &pal),
            None
        );
        assert_eq!(frame.transparent(), None);
        assert_eq!(
            frame.resolve_transparent([71, 71, 71], ColorMatch::Closest, &pal),
            Some(70)
        );
        assert_eq!(frame.transparent(), Some(70));
    }

    #[test]
    fn canvas() {
        let px = vec![SRgb8::new(1, 2, 3), SRgb8::new(4, 5, 6)];
        let raster = Raster::with_pixels(2, 1, px);
        let bg = SRgb8::new(9, 8, 7);
        assert_eq!(screen_bgr(&raster, 2, 1, bg), [3, 2, 1, 6, 5, 4]);
        assert_eq!(
            screen_bgr(&raster, 3, 2, bg),
            [3, 2, 1, 6, 5, 4, 7, 8, 9, 7, 8, 9, 7, 8, 9, 7, 8, 9]
        );
        assert_eq!(screen_bgr(&raster, 1, 1, bg), [3, 2, 1]);
    }
}
