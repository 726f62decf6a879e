//! Seeded lattice value noise and fractal Brownian motion

use noise::NoiseFn;
use serde::{Deserialize, Serialize};

/// Substituted for a zero seed, which would pin xorshift at zero forever
const ZERO_SEED_REPLACEMENT: u32 = 0x9e37_79b9;

const PERM_SIZE: usize = 2048;
const PERM_MASK: i32 = PERM_SIZE as i32 - 1;

/// Xorshift32 generator producing uniform draws in [0, 1)
#[derive(Clone, Debug)]
pub struct Xorshift32 {
    state: u32,
}

impl Xorshift32 {
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { ZERO_SEED_REPLACEMENT } else { seed },
        }
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform draw in [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        self.next_u32() as f64 / 4_294_967_296.0
    }
}

/// Mix a seed with a lattice coordinate into a well-spread 32-bit value
pub fn hash_coords(seed: u32, x: i32, z: i32) -> u32 {
    let mut h = seed as u64 ^ 0x51_7cc1_b727_220a;
    h ^= (x as u32 as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
    h = (h ^ (h >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    h ^= (z as u32 as u64).wrapping_mul(0xc2b2_ae3d_27d4_eb4f);
    h = (h ^ (h >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    h ^= h >> 31;
    (h ^ (h >> 32)) as u32
}

/// 2-D value noise over an integer lattice with smoothstep interpolation
///
/// Output range is [-1, 1].
#[derive(Clone)]
pub struct ValueNoise2D {
    perm: Vec<u32>,
}

impl ValueNoise2D {
    pub fn new(seed: u32) -> Self {
        let mut rng = Xorshift32::new(seed);
        let perm = (0..PERM_SIZE)
            .map(|_| (rng.next_f64() * u32::MAX as f64).floor() as u32)
            .collect();
        Self { perm }
    }

    /// Lattice value in [0, 1]
    fn lattice(&self, x: i32, y: i32) -> f64 {
        let mut h = self.perm[(x & PERM_MASK) as usize] ^ (self.perm[(y & PERM_MASK) as usize] << 16);
        h ^= h >> 13;
        h ^= h << 17;
        h ^= h >> 5;
        h as f64 / u32::MAX as f64
    }

    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let x0 = x.floor();
        let y0 = y.floor();
        let u = smooth(x - x0);
        let v = smooth(y - y0);
        let (ix, iy) = (x0 as i32, y0 as i32);

        let n00 = self.lattice(ix, iy);
        let n10 = self.lattice(ix.wrapping_add(1), iy);
        let n01 = self.lattice(ix, iy.wrapping_add(1));
        let n11 = self.lattice(ix.wrapping_add(1), iy.wrapping_add(1));

        let nx0 = n00 * (1.0 - u) + n10 * u;
        let nx1 = n01 * (1.0 - u) + n11 * u;
        (nx0 * (1.0 - v) + nx1 * v) * 2.0 - 1.0
    }
}

impl NoiseFn<f64, 2> for ValueNoise2D {
    fn get(&self, point: [f64; 2]) -> f64 {
        self.sample(point[0], point[1])
    }
}

fn smooth(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

/// Octave shaping for [`fbm`]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FractalParams {
    pub octaves: u32,
    /// Frequency multiplier per octave
    pub lacunarity: f64,
    /// Amplitude multiplier per octave
    pub gain: f64,
}

impl Default for FractalParams {
    fn default() -> Self {
        Self {
            octaves: 4,
            lacunarity: 2.0,
            gain: 0.5,
        }
    }
}

impl FractalParams {
    pub fn validated(&self) -> Self {
        Self {
            octaves: self.octaves.clamp(1, 12),
            lacunarity: if self.lacunarity.is_finite() { self.lacunarity.max(1.0) } else { 2.0 },
            gain: if self.gain.is_finite() { self.gain.clamp(0.0, 1.0) } else { 0.5 },
        }
    }
}

/// Fractal Brownian motion over any 2-D noise source
///
/// First octave has amplitude 0.5 at the base frequency.
pub fn fbm<N: NoiseFn<f64, 2>>(source: &N, x: f64, y: f64, params: &FractalParams) -> f64 {
    let mut amp = 0.5;
    let mut freq = 1.0;
    let mut sum = 0.0;
    for _ in 0..params.octaves {
        sum += amp * source.get([x * freq, y * freq]);
        freq *= params.lacunarity;
        amp *= params.gain;
    }
    sum
}
