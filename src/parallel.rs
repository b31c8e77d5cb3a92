// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Parallel evaluation of the products that dominate the cost of the protocol.
//!
//! Every proof and every signing round evaluates several independent
//! multi-exponentiations `∏ b_i^{e_i} mod m` (over Paillier and commitment
//! moduli) and multi-scalar sums `Σ s_i · P_i` (over secp256k1). The
//! [`ParallelHelper`] fans these out over a [`rayon`] thread pool owned by the
//! caller and combines the partial results. Since both combinations are
//! associative and commutative, the result does not depend on the order in
//! which workers finish.
//!
//! This module also defines the domain-separated hash used for all
//! Fiat-Shamir challenges, see [`domain_hash`].

use crate::{
    config::ProtocolConfig,
    curve::{k256_order, CurvePoint},
    errors::{InternalError, Result},
    parameters::PARALLEL_THRESHOLD,
    utils::{bn_mod, modpow_signed},
};
use libpaillier::unknown_order::BigNumber;
use rayon::{prelude::*, ThreadPool, ThreadPoolBuilder};
use sha2::{Digest, Sha512};
use std::sync::Arc;
use tracing::{debug, error};
use zeroize::{Zeroize, ZeroizeOnDrop};

#[derive(Clone, Zeroize)]
struct PowerTerm {
    base: BigNumber,
    exponent: BigNumber,
}

/// A product of powers `∏ base_i^{exponent_i} mod modulus`.
///
/// Exponents may be negative, in which case the base is inverted modulo
/// `modulus` before exponentiation.
#[derive(Clone, ZeroizeOnDrop)]
pub struct ModPowProduct {
    modulus: BigNumber,
    terms: Vec<PowerTerm>,
}

impl ModPowProduct {
    /// Starts an empty product modulo `modulus`.
    pub fn new(modulus: &BigNumber) -> Self {
        Self {
            modulus: modulus.clone(),
            terms: Vec::new(),
        }
    }

    /// Adds the factor `base^exponent`.
    pub fn term(mut self, base: &BigNumber, exponent: &BigNumber) -> Self {
        self.terms.push(PowerTerm {
            base: base.clone(),
            exponent: exponent.clone(),
        });
        self
    }

    /// The modulus of the product.
    pub fn modulus(&self) -> &BigNumber {
        &self.modulus
    }

    /// Evaluates the product on the calling thread.
    pub fn evaluate(&self) -> Result<BigNumber> {
        self.check_modulus()?;
        let powers = self
            .terms
            .iter()
            .map(|term| self.power(term))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.combine(powers))
    }

    fn evaluate_on_pool(&self) -> Result<BigNumber> {
        self.check_modulus()?;
        if self.terms.len() < PARALLEL_THRESHOLD {
            return self.evaluate();
        }
        let powers = self
            .terms
            .par_iter()
            .map(|term| self.power(term))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.combine(powers))
    }

    fn power(&self, term: &PowerTerm) -> Result<BigNumber> {
        modpow_signed(&term.base, &term.exponent, &self.modulus)
    }

    fn combine(&self, powers: Vec<BigNumber>) -> BigNumber {
        powers
            .iter()
            .fold(bn_mod(&BigNumber::one(), &self.modulus), |acc, power| {
                acc.modmul(power, &self.modulus)
            })
    }

    fn check_modulus(&self) -> Result<()> {
        if self.modulus <= BigNumber::one() {
            error!("Tried to evaluate a product modulo a number smaller than 2");
            return arg_err!("modulus must be at least 2");
        }
        Ok(())
    }
}

#[derive(Clone, Zeroize)]
struct ScalarTerm {
    scalar: BigNumber,
    #[zeroize(skip)]
    point: CurvePoint,
}

/// A sum of curve multiples `Σ scalar_i · point_i`.
///
/// Scalars are reduced modulo the group order; negative scalars negate the
/// point.
#[derive(Clone, Default, ZeroizeOnDrop)]
pub struct PointSum {
    terms: Vec<ScalarTerm>,
}

impl PointSum {
    /// Starts an empty sum (the identity).
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the multiple `scalar · point`.
    pub fn term(mut self, scalar: &BigNumber, point: &CurvePoint) -> Self {
        self.terms.push(ScalarTerm {
            scalar: scalar.clone(),
            point: *point,
        });
        self
    }

    /// Evaluates the sum on the calling thread.
    pub fn evaluate(&self) -> Result<CurvePoint> {
        let multiples = self
            .terms
            .iter()
            .map(|term| term.point.multiply_by_bignum(&term.scalar))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::combine(multiples))
    }

    fn evaluate_on_pool(&self) -> Result<CurvePoint> {
        if self.terms.len() < PARALLEL_THRESHOLD {
            return self.evaluate();
        }
        let multiples = self
            .terms
            .par_iter()
            .map(|term| term.point.multiply_by_bignum(&term.scalar))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::combine(multiples))
    }

    fn combine(multiples: Vec<CurvePoint>) -> CurvePoint {
        multiples
            .into_iter()
            .fold(CurvePoint::IDENTITY, |acc, point| acc + point)
    }
}

/// Handle to the worker pool that evaluates [`ModPowProduct`]s and
/// [`PointSum`]s.
///
/// Cloning the helper shares the underlying pool. All methods block until
/// every sub-computation has finished; no partial result is ever returned.
#[derive(Clone)]
pub struct ParallelHelper {
    pool: Arc<ThreadPool>,
}

impl std::fmt::Debug for ParallelHelper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParallelHelper")
            .field("threads", &self.pool.current_num_threads())
            .finish()
    }
}

impl ParallelHelper {
    /// Wraps an existing pool.
    pub fn new(pool: Arc<ThreadPool>) -> Self {
        Self { pool }
    }

    /// Builds a dedicated pool with `threads` workers. Zero picks one worker
    /// per available core.
    pub fn with_threads(threads: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("two-party-ecdsa-worker-{index}"))
            .build()
            .map_err(|e| {
                error!("Failed to build worker pool: {e}");
                InternalError::WorkerPool(e.to_string())
            })?;
        debug!(
            "Created worker pool with {} threads",
            pool.current_num_threads()
        );
        Ok(Self::new(Arc::new(pool)))
    }

    /// Builds a pool sized according to `config`.
    pub fn from_config(config: &ProtocolConfig) -> Result<Self> {
        Self::with_threads(config.worker_threads.unwrap_or(0))
    }

    /// Number of workers in the pool.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Computes `∏ base_i^{exponent_i} mod m`.
    #[cfg_attr(feature = "flame_it", flame("ParallelHelper"))]
    pub fn mod_pow_product(&self, product: &ModPowProduct) -> Result<BigNumber> {
        self.pool.install(|| product.evaluate_on_pool())
    }

    /// Computes several independent products at once. Results are returned in
    /// the order of `products`.
    #[cfg_attr(feature = "flame_it", flame("ParallelHelper"))]
    pub fn mod_pow_products(&self, products: &[ModPowProduct]) -> Result<Vec<BigNumber>> {
        self.pool.install(|| {
            products
                .par_iter()
                .map(ModPowProduct::evaluate_on_pool)
                .collect()
        })
    }

    /// Computes `Σ scalar_i · point_i`.
    #[cfg_attr(feature = "flame_it", flame("ParallelHelper"))]
    pub fn point_multiply_and_sum(&self, sum: &PointSum) -> Result<CurvePoint> {
        self.pool.install(|| sum.evaluate_on_pool())
    }

    /// Computes several independent point sums at once. Results are returned
    /// in the order of `sums`.
    #[cfg_attr(feature = "flame_it", flame("ParallelHelper"))]
    pub fn point_sums(&self, sums: &[PointSum]) -> Result<Vec<CurvePoint>> {
        self.pool
            .install(|| sums.par_iter().map(PointSum::evaluate_on_pool).collect())
    }
}

/// A typed item fed into [`domain_hash`].
#[derive(Clone, Copy, Debug)]
pub enum HashInput<'a> {
    /// An integer of arbitrary sign and size.
    Integer(&'a BigNumber),
    /// A curve point, hashed in compressed form.
    Point(&'a CurvePoint),
}

const INTEGER_TAG: u8 = 0x01;
const POINT_TAG: u8 = 0x02;

/// Hashes a domain label and a sequence of typed items into `[0, q)`, where
/// `q` is the secp256k1 group order.
///
/// Every item is written with a type tag and an explicit length, so distinct
/// item sequences never produce the same byte stream. The SHA-512 output is
/// reduced modulo `q`; the bias of this reduction is below `2^-256`.
pub fn domain_hash(label: &str, items: &[HashInput<'_>]) -> BigNumber {
    let mut hasher = Sha512::new();
    hasher.update((label.len() as u64).to_be_bytes());
    hasher.update(label.as_bytes());

    for item in items {
        match item {
            HashInput::Integer(value) => {
                let is_negative = *value < &BigNumber::zero();
                let magnitude = if is_negative {
                    -(*value).clone()
                } else {
                    (*value).clone()
                };
                let bytes = magnitude.to_bytes();
                hasher.update([INTEGER_TAG, u8::from(is_negative)]);
                hasher.update((bytes.len() as u64).to_be_bytes());
                hasher.update(&bytes);
            }
            HashInput::Point(point) => {
                hasher.update([POINT_TAG]);
                hasher.update(point.encode().as_bytes());
            }
        }
    }

    bn_mod(&BigNumber::from_slice(hasher.finalize()), &k256_order())
}
