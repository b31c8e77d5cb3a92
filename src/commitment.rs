// Copyright (c) 2023 Bolt Labs, Inc.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Commitment parameters for the signing proofs.
//!
//! A [`BcParameters`] instance is a modulus `N = p·q` built from two safe
//! primes together with two generators `g`, `h` of the subgroup of quadratic
//! residues mod `N`. A commitment to `x` with randomness `ρ` is
//! `h^x · g^ρ mod N`. It hides `x` as long as the discrete logarithm of `h`
//! base `g` is unknown to the verifier, and binds as long as the prover
//! cannot factor `N`. Each device generates its own parameters and only its
//! counterparty commits under them.

use crate::{
    errors::{InternalError, Result},
    parallel::ModPowProduct,
    utils::{
        bit_length, modpow, random_bn_in_z_star, random_positive_bn, CRYPTOGRAPHIC_RETRY_MAX,
    },
};
use libpaillier::unknown_order::BigNumber;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tracing::{error, trace};
use zeroize::{Zeroize, ZeroizeOnDrop};

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct BcFactors {
    p: BigNumber,
    q: BigNumber,
}

/// Commitment parameters `(N, g, h)`, optionally with the factorization of
/// `N`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BcParameters {
    /// The modulus `N`.
    modulus: BigNumber,
    /// Randomness base `g`.
    g: BigNumber,
    /// Value base `h`.
    h: BigNumber,
    private: Option<BcFactors>,
}

impl Debug for BcParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BcParameters")
            .field("modulus", &self.modulus)
            .field("g", &self.g)
            .field("h", &self.h)
            .field("private", &self.private.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

impl BcParameters {
    /// Generates fresh parameters from two new safe primes of `prime_bits`
    /// bits each. This takes a long time for protocol-size primes.
    #[cfg_attr(feature = "flame_it", flame("BcParameters"))]
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R, prime_bits: usize) -> Result<Self> {
        let p = BigNumber::safe_prime(prime_bits);
        for _ in 0..CRYPTOGRAPHIC_RETRY_MAX {
            let q = BigNumber::safe_prime(prime_bits);
            if q != p {
                return Self::from_safe_primes(rng, &p, &q);
            }
        }
        Err(InternalError::RetryFailed)
    }

    /// Builds parameters from two distinct safe primes `p = 2p' + 1`,
    /// `q = 2q' + 1`, both congruent to 3 mod 4.
    pub fn from_safe_primes<R: RngCore + CryptoRng>(
        rng: &mut R,
        p: &BigNumber,
        q: &BigNumber,
    ) -> Result<Self> {
        if p == q {
            return arg_err!("commitment primes must be distinct");
        }
        let four = BigNumber::from(4u64);
        let three = BigNumber::from(3u64);
        if p % &four != three || q % &four != three {
            error!("Commitment primes must be congruent to 3 mod 4");
            return arg_err!("commitment primes must be congruent to 3 mod 4");
        }
        let p_prime = (p - BigNumber::one()) / BigNumber::from(2u64);
        let q_prime = (q - BigNumber::one()) / BigNumber::from(2u64);
        if !p.is_prime() || !q.is_prime() || !p_prime.is_prime() || !q_prime.is_prime() {
            error!("Commitment primes are not safe primes");
            return arg_err!("commitment primes must be safe primes");
        }

        let modulus = p * q;
        let subgroup_order = &p_prime * &q_prime;

        // A random square generates the quadratic residues unless it is 1
        // modulo p or modulo q.
        let mut g = None;
        for _ in 0..CRYPTOGRAPHIC_RETRY_MAX {
            let tau = random_bn_in_z_star(rng, &modulus)?;
            let candidate = modpow(&tau, &BigNumber::from(2u64), &modulus);
            if (&candidate - BigNumber::one()).gcd(&modulus) == BigNumber::one() {
                g = Some(candidate);
                break;
            }
            trace!("Rejected commitment generator candidate");
        }
        let g = g.ok_or(InternalError::RetryFailed)?;

        // h = g^x must generate the same subgroup, so x has to be a unit mod p'q'.
        let mut exponent = None;
        for _ in 0..CRYPTOGRAPHIC_RETRY_MAX {
            let candidate = random_positive_bn(rng, &subgroup_order);
            if candidate.gcd(&subgroup_order) == BigNumber::one() {
                exponent = Some(candidate);
                break;
            }
        }
        let mut exponent = exponent.ok_or(InternalError::RetryFailed)?;
        let h = modpow(&g, &exponent, &modulus);
        exponent.zeroize();

        Ok(Self {
            modulus,
            g,
            h,
            private: Some(BcFactors {
                p: p.clone(),
                q: q.clone(),
            }),
        })
    }

    /// The modulus `N`.
    pub fn modulus(&self) -> &BigNumber {
        &self.modulus
    }

    /// The randomness base `g`.
    pub fn g(&self) -> &BigNumber {
        &self.g
    }

    /// The value base `h`.
    pub fn h(&self) -> &BigNumber {
        &self.h
    }

    /// Returns `true` if this instance carries the factorization of `N`.
    pub fn contains_private(&self) -> bool {
        self.private.is_some()
    }

    /// A copy without the factorization, safe to send to the counterparty.
    pub fn clear_private(&self) -> Self {
        Self {
            modulus: self.modulus.clone(),
            g: self.g.clone(),
            h: self.h.clone(),
            private: None,
        }
    }

    /// The prime factors `(p, q)` of `N`.
    pub(crate) fn factors(&self) -> Result<(&BigNumber, &BigNumber)> {
        self.private
            .as_ref()
            .map(|factors| (&factors.p, &factors.q))
            .ok_or_else(|| {
                error!("Commitment parameters do not contain their factorization");
                InternalError::MissingPrivateKey
            })
    }

    /// The commitment `h^value · g^randomness mod N`.
    pub(crate) fn commitment(&self, value: &BigNumber, randomness: &BigNumber) -> ModPowProduct {
        ModPowProduct::new(&self.modulus)
            .term(&self.h, value)
            .term(&self.g, randomness)
    }

    /// Recovers the commitment to the masks from masked responses:
    /// `h^value · g^randomness · commitment^{-challenge} mod N`.
    pub(crate) fn reopen(
        &self,
        value: &BigNumber,
        randomness: &BigNumber,
        commitment: &BigNumber,
        challenge: &BigNumber,
    ) -> ModPowProduct {
        self.commitment(value, randomness)
            .term(commitment, &-challenge.clone())
    }

    /// Sanity checks on parameters received from the counterparty.
    pub(crate) fn validate(&self, minimum_bits: usize) -> Result<()> {
        if bit_length(&self.modulus) < minimum_bits as u64 {
            error!(
                "Commitment modulus has {} bits, fewer than the required {}",
                bit_length(&self.modulus),
                minimum_bits
            );
            return range_err!("commitment modulus is too small");
        }
        if &self.modulus % &BigNumber::from(2u64) == BigNumber::zero() {
            return arg_err!("commitment modulus must be odd");
        }
        for base in [&self.g, &self.h] {
            if base <= &BigNumber::one() || base >= &self.modulus {
                error!("Commitment base is outside of (1, N)");
                return range_err!("commitment bases must be in (1, N)");
            }
            if base.gcd(&self.modulus) != BigNumber::one() {
                return arg_err!("commitment bases must be units mod N");
            }
        }
        if self.g == self.h {
            return arg_err!("commitment bases must differ");
        }
        Ok(())
    }
}
