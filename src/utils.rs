// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

use crate::errors::{InternalError, Result};
use libpaillier::unknown_order::BigNumber;
use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};
use tracing::error;

pub(crate) const CRYPTOGRAPHIC_RETRY_MAX: usize = 500usize;

/// Compute a^e (mod n).
#[cfg_attr(feature = "flame_it", flame("utils"))]
pub(crate) fn modpow(a: &BigNumber, e: &BigNumber, n: &BigNumber) -> BigNumber {
    a.modpow(e, n)
}

/// Compute a^e (mod n) for a possibly negative exponent, inverting `a` when
/// `e < 0`.
#[cfg_attr(feature = "flame_it", flame("utils"))]
pub(crate) fn modpow_signed(a: &BigNumber, e: &BigNumber, n: &BigNumber) -> Result<BigNumber> {
    if e < &BigNumber::zero() {
        // `invert` panics instead of failing on a non-unit
        if a.gcd(n) != BigNumber::one() {
            error!("Base of a negative exponentiation shares a factor with the modulus");
            return Err(InternalError::CouldNotInvertBigNumber);
        }
        let inverse = a.invert(n).ok_or_else(|| {
            error!("Base of a negative exponentiation is not invertible");
            InternalError::CouldNotInvertBigNumber
        })?;
        Ok(modpow(&inverse, &-e.clone(), n))
    } else {
        Ok(modpow(a, e, n))
    }
}

/// Reduce `n` into the range `[0, p)`, also for negative `n`.
pub(crate) fn bn_mod(n: &BigNumber, p: &BigNumber) -> BigNumber {
    n.modadd(&BigNumber::zero(), p)
}

/// Returns `true` if `value ∊ [0, bound)`.
pub(crate) fn within_range(value: &BigNumber, bound: &BigNumber) -> bool {
    value >= &BigNumber::zero() && value < bound
}

/// Returns `true` if `value ∊ [1, bound)`.
pub(crate) fn within_nonzero_range(value: &BigNumber, bound: &BigNumber) -> bool {
    value >= &BigNumber::one() && value < bound
}

/// Returns `true` if `value ∊ [1, modulus)` and `value` is invertible mod
/// `modulus`.
pub(crate) fn is_unit(value: &BigNumber, modulus: &BigNumber) -> bool {
    within_nonzero_range(value, modulus) && value.gcd(modulus) == BigNumber::one()
}

/// Computes `base^exponent` over the integers.
pub(crate) fn pow(base: &BigNumber, exponent: u64) -> BigNumber {
    (0..exponent).fold(BigNumber::one(), |acc, _| acc * base)
}

/// Number of significant bits of a non-negative integer.
pub(crate) fn bit_length(value: &BigNumber) -> u64 {
    BigUint::from_bytes_be(&value.to_bytes()).bits()
}

/// Sample a number uniformly at random from the range [0, n). This can be used
/// for sampling from a prime field `F_p` or the integers modulo `n` (for any
/// `n`).
pub(crate) fn random_positive_bn<R: RngCore + CryptoRng>(rng: &mut R, n: &BigNumber) -> BigNumber {
    BigNumber::from_rng(n, rng)
}

/// Sample a number uniformly at random from the range [1, n).
pub(crate) fn random_nonzero_bn<R: RngCore + CryptoRng>(
    rng: &mut R,
    n: &BigNumber,
) -> Result<BigNumber> {
    for _ in 0..CRYPTOGRAPHIC_RETRY_MAX {
        let bn = BigNumber::from_rng(n, rng);
        if bn != BigNumber::zero() {
            return Ok(bn);
        }
    }
    Err(InternalError::RetryFailed)
}

/// Generate a random BigNumber in the multiplicative group `Z*_n`.
pub(crate) fn random_bn_in_z_star<R: RngCore + CryptoRng>(
    rng: &mut R,
    n: &BigNumber,
) -> Result<BigNumber> {
    for _ in 0..CRYPTOGRAPHIC_RETRY_MAX {
        let bn = BigNumber::from_rng(n, rng);
        if bn != BigNumber::zero() && bn.gcd(n) == BigNumber::one() {
            return Ok(bn);
        }
    }
    Err(InternalError::RetryFailed)
}


////////////////////////////
// Test Utility Functions //
////////////////////////////
