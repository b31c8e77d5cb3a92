// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! The Paillier cryptosystem, with a generic generator `g`.
//!
//! Ciphertexts are plain [`BigNumber`]s in `[0, n²)`. Encryption of `m` with
//! randomness `r` is `g^m · r^n mod n²`; decryption uses the Carmichael
//! function `λ = lcm(p-1, q-1)` and `μ = L(g^λ mod n²)⁻¹ mod n`, where
//! `L(u) = (u - 1) / n`.

use crate::{
    errors::{InternalError, Result},
    parallel::ModPowProduct,
    parameters::{CURVE_ORDER_BITS, PAILLIER_MIN_BITS, PAILLIER_SIZE_FACTOR},
    utils::{
        bit_length, modpow, random_bn_in_z_star, random_nonzero_bn, within_range,
        CRYPTOGRAPHIC_RETRY_MAX,
    },
};
use libpaillier::unknown_order::BigNumber;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tracing::{error, trace};
use zeroize::{Zeroize, ZeroizeOnDrop};

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct PaillierPrivateKey {
    lambda: BigNumber,
    mu: BigNumber,
}

/// A Paillier public key, optionally together with its private key.
///
/// The copy sent to the counterparty must come from
/// [`PaillierKeyPair::public_only`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaillierKeyPair {
    n: BigNumber,
    g: BigNumber,
    private: Option<PaillierPrivateKey>,
}

impl Debug for PaillierKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaillierKeyPair")
            .field("n", &self.n)
            .field("g", &self.g)
            .field(
                "private",
                &self.private.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

impl PaillierKeyPair {
    /// Smallest modulus size the protocol accepts: ten times the bit length
    /// of the curve order, and never less than 2048 bits.
    pub fn minimum_modulus_bits() -> usize {
        PAILLIER_MIN_BITS.max(PAILLIER_SIZE_FACTOR * CURVE_ORDER_BITS)
    }

    /// Generates a key pair for use in the signing protocol.
    pub fn generate_for_protocol<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self> {
        Self::generate(rng, Self::minimum_modulus_bits())
    }

    /// Generates a key pair whose modulus has at least `bits` bits.
    ///
    /// Each prime has `bits / 2 + 1` bits, so the product never falls short of
    /// the requested size.
    #[cfg_attr(feature = "flame_it", flame("PaillierKeyPair"))]
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R, bits: usize) -> Result<Self> {
        if bits < 16 {
            return arg_err!("Paillier modulus must have at least 16 bits");
        }
        let prime_bits = bits / 2 + 1;
        let p = BigNumber::prime(prime_bits);
        for _ in 0..CRYPTOGRAPHIC_RETRY_MAX {
            let q = BigNumber::prime(prime_bits);
            if q != p {
                return Self::from_primes(rng, &p, &q);
            }
        }
        Err(InternalError::RetryFailed)
    }

    /// Builds a key pair from two distinct primes.
    pub fn from_primes<R: RngCore + CryptoRng>(
        rng: &mut R,
        p: &BigNumber,
        q: &BigNumber,
    ) -> Result<Self> {
        if p == q {
            return arg_err!("Paillier primes must be distinct");
        }
        if !p.is_prime() || !q.is_prime() {
            return arg_err!("Paillier modulus factors must be prime");
        }

        let n = p * q;
        let nn = &n * &n;
        let p_minus_one = p - BigNumber::one();
        let q_minus_one = q - BigNumber::one();
        let lambda = (&p_minus_one * &q_minus_one) / p_minus_one.gcd(&q_minus_one);

        // Almost every g works; retry on the rare one whose L-value shares a
        // factor with n.
        for _ in 0..CRYPTOGRAPHIC_RETRY_MAX {
            let g = random_nonzero_bn(rng, &nn)?;
            let l = l_function(&modpow(&g, &lambda, &nn), &n);
            if l.gcd(&n) != BigNumber::one() {
                trace!("Rejected Paillier generator candidate");
                continue;
            }
            if let Some(mu) = l.invert(&n) {
                return Ok(Self {
                    n,
                    g,
                    private: Some(PaillierPrivateKey { lambda, mu }),
                });
            }
        }
        Err(InternalError::RetryFailed)
    }

    /// The modulus `n`.
    pub fn n(&self) -> &BigNumber {
        &self.n
    }

    /// The generator `g`.
    pub fn g(&self) -> &BigNumber {
        &self.g
    }

    /// The ciphertext modulus `n²`.
    pub fn nn(&self) -> BigNumber {
        &self.n * &self.n
    }

    /// Bit length of `n`.
    pub fn modulus_bits(&self) -> u64 {
        bit_length(&self.n)
    }

    /// Returns `true` if this instance can decrypt.
    pub fn contains_private_key(&self) -> bool {
        self.private.is_some()
    }

    /// A copy without the private key, safe to send to the counterparty.
    pub fn public_only(&self) -> Self {
        Self {
            n: self.n.clone(),
            g: self.g.clone(),
            private: None,
        }
    }

    /// The product `g^m · r^n mod n²`, for evaluation on a
    /// [`ParallelHelper`](crate::ParallelHelper).
    ///
    /// Requires `0 ≤ m < n` and `0 ≤ r < n`.
    pub fn encryption(&self, m: &BigNumber, r: &BigNumber) -> Result<ModPowProduct> {
        if !within_range(m, &self.n) {
            error!("Paillier plaintext is outside of [0, n)");
            return range_err!("Paillier plaintext must be in [0, n)");
        }
        if !within_range(r, &self.n) {
            error!("Paillier randomness is outside of [0, n)");
            return range_err!("Paillier randomness must be in [0, n)");
        }
        Ok(ModPowProduct::new(&self.nn())
            .term(&self.g, m)
            .term(r, &self.n))
    }

    /// Encrypts `m` with randomness `r`.
    pub fn encrypt(&self, m: &BigNumber, r: &BigNumber) -> Result<BigNumber> {
        self.encryption(m, r)?.evaluate()
    }

    /// Encrypts `m` with fresh randomness and returns the ciphertext together
    /// with that randomness.
    pub fn encrypt_with_rng<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        m: &BigNumber,
    ) -> Result<(BigNumber, BigNumber)> {
        let r = self.generate_randomizer(rng)?;
        let c = self.encrypt(m, &r)?;
        Ok((c, r))
    }

    /// Samples encryption randomness from `Z*_n`.
    pub fn generate_randomizer<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Result<BigNumber> {
        random_bn_in_z_star(rng, &self.n)
    }

    /// Decrypts `c ∊ [0, n²)`.
    #[cfg_attr(feature = "flame_it", flame("PaillierKeyPair"))]
    pub fn decrypt(&self, c: &BigNumber) -> Result<BigNumber> {
        let private = self.private.as_ref().ok_or_else(|| {
            error!("Tried to decrypt with a public Paillier key");
            InternalError::MissingPrivateKey
        })?;
        let nn = self.nn();
        if !within_range(c, &nn) {
            error!("Paillier ciphertext is outside of [0, n²)");
            return range_err!("Paillier ciphertext must be in [0, n^2)");
        }
        let l = l_function(&modpow(c, &private.lambda, &nn), &self.n);
        Ok(l.modmul(&private.mu, &self.n))
    }

    /// Homomorphic addition: the result decrypts to `m1 + m2 mod n`.
    pub fn add(&self, c1: &BigNumber, c2: &BigNumber) -> BigNumber {
        c1.modmul(c2, &self.nn())
    }

    /// Homomorphic scaling: the result decrypts to `k · m mod n`.
    pub fn scale(&self, c: &BigNumber, k: &BigNumber) -> Result<BigNumber> {
        if k < &BigNumber::zero() {
            return arg_err!("Paillier scaling factor must not be negative");
        }
        Ok(modpow(c, k, &self.nn()))
    }

    /// Sanity checks on a public key received from the counterparty.
    pub(crate) fn check_public_key(&self, minimum_bits: usize) -> Result<()> {
        if self.modulus_bits() < minimum_bits as u64 {
            error!(
                "Paillier modulus has {} bits, fewer than the required {}",
                self.modulus_bits(),
                minimum_bits
            );
            return range_err!("Paillier modulus is too small");
        }
        if &self.n % &BigNumber::from(2u64) == BigNumber::zero() {
            error!("Paillier modulus is even");
            return arg_err!("Paillier modulus must be odd");
        }
        if !within_range(&self.g, &self.nn()) || self.g == BigNumber::zero() {
            error!("Paillier generator is outside of [1, n²)");
            return range_err!("Paillier generator must be in [1, n^2)");
        }
        Ok(())
    }
}

fn l_function(u: &BigNumber, n: &BigNumber) -> BigNumber {
    (u - BigNumber::one()) / n
}
