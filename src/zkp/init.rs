// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Pairing-time proof that commitment parameters were formed correctly.
//!
//! The prover shows that both bases of its [`BcParameters`] are squares modulo
//! `N` by revealing a square root of each. Computing square roots modulo `N`
//! is as hard as factoring, so only the owner of the factorization can do
//! this. Square roots are taken modulo each prime as `x^((p+1)/4)` (valid
//! because `p ≡ 3 mod 4`) and combined with the Chinese remainder theorem.

use crate::{
    commitment::BcParameters,
    errors::{InternalError, Result},
    utils::{bn_mod, modpow, within_nonzero_range},
};
use libpaillier::unknown_order::BigNumber;
use serde::{Deserialize, Serialize};
use tracing::error;

/// Square roots of the two commitment bases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZkProofInit {
    /// A square root of `h`.
    root_of_h: BigNumber,
    /// A square root of `g`.
    root_of_g: BigNumber,
}

impl ZkProofInit {
    /// Proves that `params` is well formed. Requires the factorization of the
    /// modulus.
    #[cfg_attr(feature = "flame_it", flame("ZkProofInit"))]
    pub fn prove(params: &BcParameters) -> Result<Self> {
        let (p, q) = params.factors()?;
        Ok(Self {
            root_of_h: square_root_mod_composite(params.h(), p, q)?,
            root_of_g: square_root_mod_composite(params.g(), p, q)?,
        })
    }

    /// Verifies the proof against the public parameters.
    #[cfg_attr(feature = "flame_it", flame("ZkProofInit"))]
    pub fn verify(&self, params: &BcParameters) -> Result<()> {
        let n = params.modulus();
        let two = BigNumber::from(2u64);

        for (root, base, name) in [
            (&self.root_of_h, params.h(), "h"),
            (&self.root_of_g, params.g(), "g"),
        ] {
            if !within_nonzero_range(root, n) {
                error!("Square root of {name} is outside of [1, N)");
                return verify_err!(format!("square root of {name} is out of range"));
            }
            if &modpow(root, &two, n) != base {
                error!("Square root of {name} does not square to {name}");
                return verify_err!(format!("square root check failed for {name}"));
            }
        }
        Ok(())
    }
}

/// Returns a square root of `n` modulo the prime `p ≡ 3 (mod 4)`.
fn square_root_mod_prime(n: &BigNumber, p: &BigNumber) -> Result<BigNumber> {
    // r = n^{(p+1)/4} (mod p) is a root whenever one exists
    let exponent = (p + BigNumber::one()) / BigNumber::from(4u64);
    let r = modpow(n, &exponent, p);

    if modpow(&r, &BigNumber::from(2u64), p) == bn_mod(n, p) {
        return Ok(r);
    }
    Err(InternalError::NoSquareRoots)
}

// Finds an (x,y) such that ax + by = 1, or returns error if gcd(a,b) != 1
fn extended_euclidean(a: &BigNumber, b: &BigNumber) -> Result<(BigNumber, BigNumber)> {
    let result = a.extended_gcd(b);

    if result.gcd != BigNumber::one() {
        return Err(InternalError::NotCoprime);
    }

    Ok((result.x, result.y))
}

/// Finds an x such that x = a1 (mod p) and x = a2 (mod q)
#[allow(clippy::many_single_char_names)]
fn chinese_remainder_theorem(
    a1: &BigNumber,
    a2: &BigNumber,
    p: &BigNumber,
    q: &BigNumber,
) -> Result<BigNumber> {
    let (z, w) = extended_euclidean(p, q)?;
    let x = a1 * w * q + a2 * z * p;
    Ok(bn_mod(&x, &(p * q)))
}

fn square_root_mod_composite(n: &BigNumber, p: &BigNumber, q: &BigNumber) -> Result<BigNumber> {
    let root_mod_p = square_root_mod_prime(n, p)?;
    let root_mod_q = square_root_mod_prime(n, q)?;
    chinese_remainder_theorem(&root_mod_p, &root_mod_q, p, q)
}
