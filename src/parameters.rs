// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Security parameter definitions.
//!
//! Ranges in the two signing proofs are expressed as powers of the secp256k1
//! group order `q`. The prover's secret values live in `[0, q)`; masks are
//! sampled from a range that is larger by a statistical slack factor, so that
//! responses do not leak the secrets.

/// Bit length of the secp256k1 group order.
pub(crate) const CURVE_ORDER_BITS: usize = 256;

/// Lower bound on the Paillier modulus size, regardless of the curve.
pub(crate) const PAILLIER_MIN_BITS: usize = 2048;

/// The Paillier modulus must be at least this many times larger (in bits) than
/// the curve order, so that the homomorphic evaluation of `sigma` never wraps
/// around `N`.
pub(crate) const PAILLIER_SIZE_FACTOR: usize = 10;

/// Bit size of the safe primes used to build commitment parameters.
///
/// The product of two 1024-bit safe primes gives a 2048-bit commitment modulus.
pub(crate) const COMMITMENT_PRIME_BITS: usize = 1024;

/// Exponent of `q` bounding the inverse-nonce responses `s1` and `t1`.
pub(crate) const RESPONSE_RANGE_EXPONENT: u64 = 3;

/// Exponent of `q` bounding the randomizer used to blind the encrypted
/// signature.
pub(crate) const RANDOMIZER_RANGE_EXPONENT: u64 = 5;

/// Exponent of `q` bounding the randomizer response `t5`.
pub(crate) const RANDOMIZER_RESPONSE_RANGE_EXPONENT: u64 = 7;

/// Number of terms from which a multi-exponentiation is spread across the
/// worker pool rather than evaluated on the calling thread.
pub(crate) const PARALLEL_THRESHOLD: usize = 2;

/// Required length of a message digest, in bytes.
pub(crate) const DIGEST_BYTES: usize = 32;
