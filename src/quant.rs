// quant.rs
//
// Copyright (c) 2019-2025  Douglas Lau
//
//! Palette learning with a self-organizing color network
//!
//! Each of the 256 neurons holds a fixed-point color, which competes for
//! sampled pixels.  The winner is pulled toward the sample, along with a
//! shrinking neighbourhood of adjacent neurons.

/// Number of neurons (palette entries)
pub(crate) const NET_SIZE: usize = 256;

/// Sampling primes (step through the image avoiding periodic bias)
const PRIME_1: usize = 499;
const PRIME_2: usize = 491;
const PRIME_3: usize = 487;
const PRIME_4: usize = 503;

/// Images smaller than this (in bytes) are sampled completely
const MIN_PICTURE_BYTES: usize = 3 * PRIME_4;

/// Number of learning cycles
const N_CYCLES: usize = 100;

/// Bias for colour values
pub(crate) const NET_BIAS_SHIFT: i32 = 4;

/// Bias for fractions
const INT_BIAS_SHIFT: i32 = 16;
const INT_BIAS: i32 = 1 << INT_BIAS_SHIFT;

/// Frequency and bias adjustment (beta = 1/1024, gamma = 1024)
const GAMMA_SHIFT: i32 = 10;
const BETA_SHIFT: i32 = 10;
const BETA: i32 = INT_BIAS >> BETA_SHIFT;
const BETA_GAMMA: i32 = INT_BIAS << (GAMMA_SHIFT - BETA_SHIFT);

/// Initial neighbourhood radius (1/8 of the network)
const INIT_RAD: usize = NET_SIZE >> 3;
const RADIUS_BIAS_SHIFT: i32 = 6;
const RADIUS_BIAS: i32 = 1 << RADIUS_BIAS_SHIFT;
const INIT_RADIUS: i32 = INIT_RAD as i32 * RADIUS_BIAS;
const RADIUS_DEC: i32 = 30;

/// Learning rate
const ALPHA_BIAS_SHIFT: i32 = 10;
const INIT_ALPHA: i32 = 1 << ALPHA_BIAS_SHIFT;

/// Radial falloff
const RAD_BIAS_SHIFT: i32 = 8;
const RAD_BIAS: i32 = 1 << RAD_BIAS_SHIFT;
const ALPHA_RAD_BIAS: i32 = 1 << (ALPHA_BIAS_SHIFT + RAD_BIAS_SHIFT);

/// Lowest (slowest, best) quality value
pub const QUALITY_BEST: u8 = 1;

/// Highest (fastest, worst) quality value
pub const QUALITY_FASTEST: u8 = 30;

/// One neuron of the network (fixed-point BGR)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Neuron {
    b: i32,
    g: i32,
    r: i32,
}

impl Neuron {
    /// Move toward a sample by `alpha / divisor`
    fn alter(&mut self, alpha: i32, divisor: i32, b: i32, g: i32, r: i32) {
        self.b -= (alpha * (self.b - b)) / divisor;
        self.g -= (alpha * (self.g - g)) / divisor;
        self.r -= (alpha * (self.r - r)) / divisor;
    }

    /// Manhattan distance to a sample
    fn distance(&self, b: i32, g: i32, r: i32) -> i32 {
        (self.b - b).abs() + (self.g - g).abs() + (self.r - r).abs()
    }

    /// Color shifted out of fixed-point, as BGR
    fn unbiased(&self) -> [u8; 3] {
        let unbias = |v: i32| (v >> NET_BIAS_SHIFT).clamp(0, 255) as u8;
        [unbias(self.b), unbias(self.g), unbias(self.r)]
    }
}

/// Color network trained on one frame
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Network {
    /// Neuron colors
    neurons: Vec<Neuron>,
    /// Bias against frequent winners
    bias: Vec<i32>,
    /// Win frequency
    freq: Vec<i32>,
}

/// Learning rate and neighbourhood schedule
struct Schedule {
    alpha: i32,
    radius: i32,
    rad: usize,
    rad_power: [i32; INIT_RAD],
}

impl Schedule {
    fn new() -> Self {
        let mut schedule = Schedule {
            alpha: INIT_ALPHA,
            radius: INIT_RADIUS,
            rad: 0,
            rad_power: [0; INIT_RAD],
        };
        schedule.update_rad_power();
        schedule
    }

    /// Recompute the radial falloff from alpha and radius
    fn update_rad_power(&mut self) {
        let rad = self.radius >> RADIUS_BIAS_SHIFT;
        let rad = if rad <= 1 { 0 } else { rad };
        let rad2 = rad * rad;
        for i in 0..rad {
            self.rad_power[i as usize] =
                self.alpha * (((rad2 - i * i) * RAD_BIAS) / rad2);
        }
        self.rad = rad as usize;
    }

    /// Decay alpha and radius
    fn decay(&mut self, alpha_dec: i32) {
        self.alpha -= self.alpha / alpha_dec;
        self.radius -= self.radius / RADIUS_DEC;
        self.update_rad_power();
    }
}

/// Clamp a quality value to the valid range
pub fn clamp_quality(quality: u8) -> u8 {
    quality.clamp(QUALITY_BEST, QUALITY_FASTEST)
}

/// Get the byte step used to traverse sampled pixels
fn sample_step(len: usize) -> usize {
    if len < MIN_PICTURE_BYTES {
        3
    } else {
        let prime = [PRIME_1, PRIME_2, PRIME_3]
            .into_iter()
            .find(|p| len % p != 0)
            .unwrap_or(PRIME_4);
        3 * prime
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl Network {
    /// Create an untrained network, spread along the gray axis
    pub fn new() -> Self {
        let neurons = (0..NET_SIZE as i32)
            .map(|i| {
                let v = (i << (NET_BIAS_SHIFT + 8)) / NET_SIZE as i32;
                Neuron { b: v, g: v, r: v }
            })
            .collect();
        Network {
            neurons,
            bias: vec![0; NET_SIZE],
            freq: vec![INT_BIAS / NET_SIZE as i32; NET_SIZE],
        }
    }

    /// Train a network on packed BGR pixels.
    ///
    /// * `pixels` Three bytes per pixel, in blue / green / red order.
    /// * `quality` Sample factor, from 1 (best) to 30 (fastest).
    pub fn learn(pixels: &[u8], quality: u8) -> Self {
        let mut net = Network::new();
        net.train(pixels, quality);
        net
    }

    /// Run the learning cycles
    fn train(&mut self, pixels: &[u8], quality: u8) {
        let len = pixels.len() - pixels.len() % 3;
        let sample_fac = if len < MIN_PICTURE_BYTES {
            1
        } else {
            usize::from(clamp_quality(quality))
        };
        let alpha_dec = 30 + (sample_fac as i32 - 1) / 3;
        let sample_pixels = len / (3 * sample_fac);
        let delta = (sample_pixels / N_CYCLES).max(1);
        let step = sample_step(len);
        let mut schedule = Schedule::new();
        let mut pix = 0;
        for i in 1..=sample_pixels {
            let b = i32::from(pixels[pix]) << NET_BIAS_SHIFT;
            let g = i32::from(pixels[pix + 1]) << NET_BIAS_SHIFT;
            let r = i32::from(pixels[pix + 2]) << NET_BIAS_SHIFT;
            let j = self.contest(b, g, r);
            self.neurons[j].alter(schedule.alpha, INIT_ALPHA, b, g, r);
            if schedule.rad > 0 {
                self.alter_neighbours(&schedule, j, b, g, r);
            }
            pix += step;
            if pix >= len {
                pix -= len;
            }
            if i % delta == 0 {
                schedule.decay(alpha_dec);
            }
        }
        trace!(
            "learned {} samples, step {}, factor {}",
            sample_pixels,
            step,
            sample_fac
        );
    }

    /// Find the winning neuron for a sample.
    ///
    /// Frequencies and biases are updated for every neuron, so that a
    /// neuron which never wins is eventually favoured.
    fn contest(&mut self, b: i32, g: i32, r: i32) -> usize {
        let mut best_d = i32::MAX;
        let mut best_bias_d = i32::MAX;
        let mut best_pos = 0;
        let mut best_bias_pos = 0;
        for (i, n) in self.neurons.iter().enumerate() {
            let dist = n.distance(b, g, r);
            if dist < best_d {
                best_d = dist;
                best_pos = i;
            }
            let bias_dist =
                dist - (self.bias[i] >> (INT_BIAS_SHIFT - NET_BIAS_SHIFT));
            if bias_dist < best_bias_d {
                best_bias_d = bias_dist;
                best_bias_pos = i;
            }
            let beta_freq = self.freq[i] >> BETA_SHIFT;
            self.freq[i] -= beta_freq;
            self.bias[i] += beta_freq << GAMMA_SHIFT;
        }
        self.freq[best_pos] += BETA;
        self.bias[best_pos] -= BETA_GAMMA;
        best_bias_pos
    }

    /// Move neighbours of neuron `i` within the current radius
    fn alter_neighbours(
        &mut self,
        schedule: &Schedule,
        i: usize,
        b: i32,
        g: i32,
        r: i32,
    ) {
        let rad = schedule.rad as isize;
        let i = i as isize;
        let lo = (i - rad).max(-1);
        let hi = (i + rad).min(NET_SIZE as isize);
        let mut j = i + 1;
        let mut k = i - 1;
        let mut m = 1;
        while j < hi || k > lo {
            let a = schedule.rad_power[m];
            m += 1;
            if j < hi {
                self.neurons[j as usize].alter(a, ALPHA_RAD_BIAS, b, g, r);
                j += 1;
            }
            if k > lo {
                self.neurons[k as usize].alter(a, ALPHA_RAD_BIAS, b, g, r);
                k -= 1;
            }
        }
    }

    /// Get unbiased colors (BGR), in neuron order
    pub fn colors(&self) -> impl Iterator<Item = [u8; 3]> + '_ {
        self.neurons.iter().map(Neuron::unbiased)
    }
}
