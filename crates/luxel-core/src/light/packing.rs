// Copyright 2026 the luxel authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Bit-packed wire encodings for the light record.
//!
//! These are bandwidth formats, not storage formats: the packed light record
//! carries its direction as a pair of SNORM16 words and its HDR intensity as
//! an RGB19E7 shared-exponent triple. Both encodings are lossy; the precision
//! of each is documented on its encode function.

/// Packs two floats in `[-1, 1]` into one `u32` as a pair of SNORM16 values.
///
/// Follows the GLSL `packSnorm2x16` convention: each component is clamped to
/// `[-1, 1]`, scaled by 32767 and rounded to the nearest integer. `x` lands in
/// the low 16 bits, `y` in the high 16 bits.
///
/// Worst-case absolute error after a round trip is `1 / 32767` (~3.05e-5).
#[inline]
pub fn pack_snorm_2x16(x: f32, y: f32) -> u32 {
    let xs = (x.clamp(-1.0, 1.0) * 32767.0).round() as i16 as u16 as u32;
    let ys = (y.clamp(-1.0, 1.0) * 32767.0).round() as i16 as u16 as u32;
    (ys << 16) | xs
}

/// Unpacks a [`pack_snorm_2x16`] word back into two floats in `[-1, 1]`.
#[inline]
pub fn unpack_snorm_2x16(packed: u32) -> (f32, f32) {
    let xs = (packed & 0xFFFF) as u16 as i16;
    let ys = (packed >> 16) as u16 as i16;
    (
        (xs as f32 / 32767.0).clamp(-1.0, 1.0),
        (ys as f32 / 32767.0).clamp(-1.0, 1.0),
    )
}

/// Mantissa width of one RGB19E7 component.
const RGB19E7_MANTISSA_BITS: i32 = 19;
/// Exponent bias of the RGB19E7 shared exponent.
const RGB19E7_EXP_BIAS: i32 = 63;
/// Largest biased exponent value (7 bits).
const RGB19E7_MAX_BIASED_EXP: i32 = 0x7F;

const RGB19E7_MANTISSA_VALUES: u64 = 1 << RGB19E7_MANTISSA_BITS;
const RGB19E7_MANTISSA_MASK: u64 = RGB19E7_MANTISSA_VALUES - 1;

/// Largest component value an RGB19E7 word can represent:
/// `(2^19 - 1) / 2^19 * 2^(127 - 63)`.
pub const RGB19E7_MAX: f32 = 1.844_670_9e19;

/// Encodes a linear HDR RGB triple into a 64-bit RGB19E7 word.
///
/// RGB19E7 is a shared-exponent format in the mold of RGB9E5, widened for HDR
/// intensity payloads: three 19-bit unsigned mantissas and one 7-bit shared
/// exponent (bias 63), laid out LSB-first as `r | g << 19 | b << 38 |
/// exp << 57`.
///
/// Negative, NaN and infinite components clamp to `0` / [`RGB19E7_MAX`]. The
/// relative precision of the largest component after a round trip is
/// `2^-19`; smaller components lose proportionally more because they share
/// the largest component's exponent.
pub fn encode_rgb19e7(rgb: [f32; 3]) -> u64 {
    let clamp = |v: f32| -> f32 {
        if v.is_nan() {
            0.0
        } else {
            v.clamp(0.0, RGB19E7_MAX)
        }
    };
    let r = clamp(rgb[0]);
    let g = clamp(rgb[1]);
    let b = clamp(rgb[2]);

    let max_component = r.max(g).max(b);
    if max_component == 0.0 {
        return 0;
    }

    // Shared exponent picked from the largest component, then corrected if
    // rounding pushes its mantissa past the top.
    let max_exp = (max_component.log2().floor() as i32).max(-RGB19E7_EXP_BIAS - 1);
    let mut biased_exp =
        (max_exp + 1 + RGB19E7_EXP_BIAS).clamp(0, RGB19E7_MAX_BIASED_EXP);
    let mut denom = exp2(biased_exp - RGB19E7_EXP_BIAS - RGB19E7_MANTISSA_BITS);
    if ((max_component / denom).round() as u64) == RGB19E7_MANTISSA_VALUES
        && biased_exp < RGB19E7_MAX_BIASED_EXP
    {
        biased_exp += 1;
        denom *= 2.0;
    }

    let quantize = |v: f32| -> u64 { ((v / denom).round() as u64).min(RGB19E7_MANTISSA_MASK) };

    quantize(r)
        | (quantize(g) << RGB19E7_MANTISSA_BITS)
        | (quantize(b) << (2 * RGB19E7_MANTISSA_BITS))
        | ((biased_exp as u64) << (3 * RGB19E7_MANTISSA_BITS))
}

/// Decodes a 64-bit RGB19E7 word back into a linear RGB triple.
pub fn decode_rgb19e7(packed: u64) -> [f32; 3] {
    let biased_exp = (packed >> (3 * RGB19E7_MANTISSA_BITS)) as i32 & RGB19E7_MAX_BIASED_EXP;
    let scale = exp2(biased_exp - RGB19E7_EXP_BIAS - RGB19E7_MANTISSA_BITS);
    let component = |shift: i32| -> f32 {
        ((packed >> shift) & RGB19E7_MANTISSA_MASK) as f32 * scale
    };
    [
        component(0),
        component(RGB19E7_MANTISSA_BITS),
        component(2 * RGB19E7_MANTISSA_BITS),
    ]
}

#[inline]
fn exp2(e: i32) -> f32 {
    (e as f32).exp2()
}
