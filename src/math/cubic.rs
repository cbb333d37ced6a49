// Copyright @yucwang 2026

use super::constants::Float;

// w0..w3 are the four cubic B-spline basis functions of the
// fractional texel offset a in [0, 1).

pub fn cubic_w0(a: Float) -> Float {
    (1.0 / 6.0) * (a * (a * (-a + 3.0) - 3.0) + 1.0)
}

pub fn cubic_w1(a: Float) -> Float {
    (1.0 / 6.0) * (a * a * (3.0 * a - 6.0) + 4.0)
}

pub fn cubic_w2(a: Float) -> Float {
    (1.0 / 6.0) * (a * (a * (-3.0 * a + 3.0) + 3.0) + 1.0)
}

pub fn cubic_w3(a: Float) -> Float {
    (1.0 / 6.0) * (a * a * a)
}

// g0 and g1 are the two amplitude functions. g0 + g1 == 1.

pub fn cubic_g0(a: Float) -> Float {
    cubic_w0(a) + cubic_w1(a)
}

pub fn cubic_g1(a: Float) -> Float {
    cubic_w2(a) + cubic_w3(a)
}

// h0 and h1 are the two offset functions: the fractional texel
// positions at which a single bilinear fetch carries the combined
// weight of two adjacent cubic taps. g0 and g1 are strictly positive
// on [0, 1), so the divisions are well defined.

pub fn cubic_h0(a: Float) -> Float {
    (cubic_w1(a) / cubic_g0(a)) - 1.0
}

pub fn cubic_h1(a: Float) -> Float {
    (cubic_w3(a) / cubic_g1(a)) + 1.0
}
