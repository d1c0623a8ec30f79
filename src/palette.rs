// palette.rs
//
// Copyright (c) 2019-2025  Douglas Lau
//
//! Nearest-color lookup for a trained network
use crate::quant::{Network, NET_SIZE};

/// Last network position
const MAX_NET_POS: usize = NET_SIZE - 1;

/// Number of possible green values
const GREEN_VALUES: usize = 256;

/// Bytes in a color table with every entry present
pub const COLOR_TABLE_SZ: usize = NET_SIZE * 3;

/// Palette entry, sorted by green
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Entry {
    b: i32,
    g: i32,
    r: i32,
    /// Position of the neuron in the network (palette index)
    index: u8,
}

/// Palette lookup table built from a trained [Network].
///
/// Entries are sorted by green channel, with a bucket index giving the scan
/// starting position for each green value.
///
/// [Network]: ../quant/struct.Network.html
#[derive(Clone, Debug)]
pub struct PaletteIndex {
    /// Entries sorted by green
    entries: Vec<Entry>,
    /// Scan start for each green value
    net_index: [usize; GREEN_VALUES],
    /// Colors (BGR) in palette index order
    colors: Vec<[u8; 3]>,
}

impl PaletteIndex {
    /// Build a lookup table from a trained network
    pub fn new(network: &Network) -> Self {
        let colors: Vec<[u8; 3]> = network.colors().collect();
        let mut entries: Vec<Entry> = colors
            .iter()
            .enumerate()
            .map(|(i, c)| Entry {
                b: i32::from(c[0]),
                g: i32::from(c[1]),
                r: i32::from(c[2]),
                index: i as u8,
            })
            .collect();
        entries.sort_by_key(|e| e.g);
        let net_index = build_net_index(&entries);
        PaletteIndex {
            entries,
            net_index,
            colors,
        }
    }

    /// Get the number of palette entries
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Check if the palette is empty
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Get an entry color as RGB
    pub fn rgb(&self, index: u8) -> [u8; 3] {
        let [b, g, r] = self.colors[usize::from(index)];
        [r, g, b]
    }

    /// Find the closest palette index for a BGR sample.
    ///
    /// Scans outward from the green bucket in both directions; a direction
    /// ends once its green difference alone reaches the best distance.
    pub fn map(&self, b: u8, g: u8, r: u8) -> u8 {
        let (b, g, r) = (i32::from(b), i32::from(g), i32::from(r));
        let mut best_d = 1000;
        let mut best = 0;
        let mut i = self.net_index[g as usize];
        let mut j = i as isize - 1;
        while i < NET_SIZE || j >= 0 {
            if i < NET_SIZE {
                let e = &self.entries[i];
                let dist = e.g - g;
                if dist >= best_d {
                    i = NET_SIZE;
                } else {
                    i += 1;
                    let dist = dist.abs() + (e.b - b).abs();
                    if dist < best_d {
                        let dist = dist + (e.r - r).abs();
                        if dist < best_d {
                            best_d = dist;
                            best = e.index;
                        }
                    }
                }
            }
            if j >= 0 {
                let e = &self.entries[j as usize];
                let dist = g - e.g;
                if dist >= best_d {
                    j = -1;
                } else {
                    j -= 1;
                    let dist = dist.abs() + (e.b - b).abs();
                    if dist < best_d {
                        let dist = dist + (e.r - r).abs();
                        if dist < best_d {
                            best_d = dist;
                            best = e.index;
                        }
                    }
                }
            }
        }
        best
    }

    /// Get the color table, as RGB.
    ///
    /// The table is always padded to 256 entries.
    pub fn color_table(&self) -> Vec<u8> {
        let mut tbl = Vec::with_capacity(COLOR_TABLE_SZ);
        for [b, g, r] in &self.colors {
            tbl.extend_from_slice(&[*r, *g, *b]);
        }
        tbl.resize(COLOR_TABLE_SZ, 0);
        tbl
    }
}

/// Build the green bucket index.
///
/// Each green value present maps to the midpoint of its run of entries;
/// absent values map to the start of the next run.
fn build_net_index(entries: &[Entry]) -> [usize; GREEN_VALUES] {
    let mut net_index = [0; GREEN_VALUES];
    let mut previous = 0;
    let mut start = 0;
    for (i, e) in entries.iter().enumerate() {
        let g = e.g as usize;
        if g != previous {
            net_index[previous] = (start + i) >> 1;
            for n in &mut net_index[previous + 1..g] {
                *n = i;
            }
            previous = g;
            start = i;
        }
    }
    net_index[previous] = (start + MAX_NET_POS) >> 1;
    for n in &mut net_index[previous + 1..] {
        *n = MAX_NET_POS;
    }
    net_index
}
