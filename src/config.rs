// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

use crate::{
    errors::Result,
    paillier::PaillierKeyPair,
    parameters::COMMITMENT_PRIME_BITS,
};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Runtime settings for a device taking part in the protocol.
///
/// The defaults are the minimum sizes the protocol accepts; applications may
/// raise them (for example from a settings file, since the type implements
/// [`Deserialize`]) but never lower them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Bit size of freshly generated Paillier moduli, and the minimum size
    /// accepted from the counterparty.
    pub paillier_modulus_bits: usize,
    /// Bit size of each safe prime of the commitment parameters.
    pub commitment_prime_bits: usize,
    /// Size of the worker pool. `None` uses one worker per available core.
    pub worker_threads: Option<usize>,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            paillier_modulus_bits: PaillierKeyPair::minimum_modulus_bits(),
            commitment_prime_bits: COMMITMENT_PRIME_BITS,
            worker_threads: None,
        }
    }
}

impl ProtocolConfig {
    /// Checks that no size is below the security minimum.
    pub fn validate(&self) -> Result<()> {
        if self.paillier_modulus_bits < PaillierKeyPair::minimum_modulus_bits() {
            error!(
                "Configured Paillier modulus of {} bits is below the minimum of {}",
                self.paillier_modulus_bits,
                PaillierKeyPair::minimum_modulus_bits()
            );
            return arg_err!("Paillier modulus is too small");
        }
        if self.commitment_prime_bits < COMMITMENT_PRIME_BITS {
            error!(
                "Configured commitment prime of {} bits is below the minimum of {}",
                self.commitment_prime_bits, COMMITMENT_PRIME_BITS
            );
            return arg_err!("commitment primes are too small");
        }
        if self.worker_threads == Some(0) {
            return arg_err!("worker pool needs at least one thread; use None for the default");
        }
        Ok(())
    }

    /// Minimum bit length accepted for the counterparty's commitment modulus.
    ///
    /// The product of two `b`-bit primes has either `2b - 1` or `2b` bits.
    pub(crate) fn minimum_commitment_modulus_bits(&self) -> usize {
        2 * self.commitment_prime_bits - 1
    }
}
