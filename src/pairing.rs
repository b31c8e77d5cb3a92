// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! One-time pairing of a desktop and a phone.
//!
//! Each device creates a [`PairingSetup`], sends its [`PairingMessage`] to the
//! other device, and calls [`PairingSetup::complete`] on the message it
//! receives. Both sides end up with a [`KeyShare`] for the same joint public
//! key. The exchange is symmetric: neither message depends on the other.

use crate::{
    commitment::BcParameters,
    config::ProtocolConfig,
    curve::{k256_order, CurvePoint, EncodedPoint},
    errors::{InternalError, Result},
    keyshare::KeyShare,
    paillier::PaillierKeyPair,
    utils::random_nonzero_bn,
    zkp::init::ZkProofInit,
};
use libpaillier::unknown_order::BigNumber;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tracing::{error, info, instrument};
use zeroize::ZeroizeOnDrop;

/// What a device publishes during pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingMessage {
    /// `G · d` for the sender's key share `d`.
    pub public_key_share: EncodedPoint,
    /// The sender's Paillier public key.
    pub paillier_public_key: PaillierKeyPair,
    /// The sender's commitment parameters, without the factorization.
    pub commitment_parameters: BcParameters,
    /// Proof that `commitment_parameters` is well formed.
    pub init_proof: ZkProofInit,
}

/// Secret material a device generates for pairing.
#[derive(ZeroizeOnDrop)]
pub struct PairingSetup {
    private_key: BigNumber,
    #[zeroize(skip)]
    paillier: PaillierKeyPair,
    #[zeroize(skip)]
    commitment_parameters: BcParameters,
}

impl Debug for PairingSetup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PairingSetup")
            .field("private_key", &"[redacted]")
            .field("paillier", &self.paillier)
            .field("commitment_parameters", &self.commitment_parameters)
            .finish()
    }
}

impl PairingSetup {
    /// Generates a fresh key share, Paillier key pair and commitment
    /// parameters with the sizes in `config`.
    ///
    /// This generates safe primes and can take minutes at protocol sizes.
    #[instrument(skip_all, err(Debug))]
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R, config: &ProtocolConfig) -> Result<Self> {
        config.validate()?;
        info!("Generating pairing material.");
        let private_key = random_nonzero_bn(rng, &k256_order())?;
        let paillier = PaillierKeyPair::generate(rng, config.paillier_modulus_bits)?;
        let commitment_parameters = BcParameters::generate(rng, config.commitment_prime_bits)?;
        Self::from_parts(private_key, paillier, commitment_parameters)
    }

    /// Builds a setup from existing material.
    pub fn from_parts(
        private_key: BigNumber,
        paillier: PaillierKeyPair,
        commitment_parameters: BcParameters,
    ) -> Result<Self> {
        if !paillier.contains_private_key() || !commitment_parameters.contains_private() {
            error!("Pairing material is missing private parts");
            return Err(InternalError::MissingPrivateKey);
        }
        Ok(Self {
            private_key,
            paillier,
            commitment_parameters,
        })
    }

    /// The message to send to the other device.
    #[instrument(skip_all, err(Debug))]
    pub fn message(&self) -> Result<PairingMessage> {
        Ok(PairingMessage {
            public_key_share: CurvePoint::scale_generator(&self.private_key)?.encode(),
            paillier_public_key: self.paillier.public_only(),
            commitment_parameters: self.commitment_parameters.clear_private(),
            init_proof: ZkProofInit::prove(&self.commitment_parameters)?,
        })
    }

    /// Checks the other device's message and produces this device's key
    /// share.
    #[instrument(skip_all, err(Debug))]
    pub fn complete(self, other: &PairingMessage, config: &ProtocolConfig) -> Result<KeyShare> {
        info!("Completing pairing.");
        config.validate()?;

        let other_params = &other.commitment_parameters;
        other_params.validate(config.minimum_commitment_modulus_bits())?;
        other.init_proof.verify(other_params)?;
        other
            .paillier_public_key
            .check_public_key(config.paillier_modulus_bits)?;
        let other_public_key = other.public_key_share.decode()?;

        KeyShare::new(
            self.private_key.clone(),
            other_public_key,
            self.paillier.clone(),
            other.paillier_public_key.clone(),
            self.commitment_parameters.clone(),
            other_params.clone(),
        )
    }
}
