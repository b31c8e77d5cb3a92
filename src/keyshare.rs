// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

use crate::{
    commitment::BcParameters,
    curve::{k256_order, CurvePoint},
    errors::{InternalError, Result},
    paillier::PaillierKeyPair,
    utils::within_nonzero_range,
};
use libpaillier::unknown_order::BigNumber;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tracing::error;
use zeroize::ZeroizeOnDrop;

/// Everything one device keeps after pairing.
///
/// The joint signing key is `d_desktop · d_phone mod q`; each device holds its
/// own factor together with the counterparty's public share, so that
/// [`KeyShare::joint_public_key`] agrees on both sides.
///
/// # 🔒 Storage requirements
/// This type must be stored securely by the calling application.
#[derive(Serialize, Deserialize, ZeroizeOnDrop)]
pub struct KeyShare {
    /// Own EC key share, in the range `[1, q)`.
    private_key: BigNumber,
    /// The counterparty's public key share.
    #[zeroize(skip)]
    other_public_key: CurvePoint,
    #[zeroize(skip)]
    own_paillier: PaillierKeyPair,
    #[zeroize(skip)]
    other_paillier: PaillierKeyPair,
    #[zeroize(skip)]
    own_commitment_parameters: BcParameters,
    #[zeroize(skip)]
    other_commitment_parameters: BcParameters,
}

impl Debug for KeyShare {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyShare")
            .field("private_key", &"[redacted]")
            .field("other_public_key", &self.other_public_key)
            .field("own_paillier", &self.own_paillier)
            .field("other_paillier", &self.other_paillier)
            .field("own_commitment_parameters", &self.own_commitment_parameters)
            .field(
                "other_commitment_parameters",
                &self.other_commitment_parameters,
            )
            .finish()
    }
}

impl KeyShare {
    /// Assembles a key share.
    ///
    /// The counterparty's Paillier key and commitment parameters are stored
    /// without any private parts, whatever the caller passes in.
    pub fn new(
        private_key: BigNumber,
        other_public_key: CurvePoint,
        own_paillier: PaillierKeyPair,
        other_paillier: PaillierKeyPair,
        own_commitment_parameters: BcParameters,
        other_commitment_parameters: BcParameters,
    ) -> Result<Self> {
        let share = Self {
            private_key,
            other_public_key,
            own_paillier,
            other_paillier: other_paillier.public_only(),
            own_commitment_parameters,
            other_commitment_parameters: other_commitment_parameters.clear_private(),
        };
        share.validate()?;
        Ok(share)
    }

    fn validate(&self) -> Result<()> {
        if !within_nonzero_range(&self.private_key, &k256_order()) {
            error!("Key share is outside of [1, q)");
            return range_err!("key share must be in [1, q)");
        }
        if self.other_public_key == CurvePoint::IDENTITY {
            error!("Counterparty public key share is the identity");
            return Err(InternalError::InvalidPoint(String::from(
                "counterparty public key share is the identity",
            )));
        }
        if !self.own_paillier.contains_private_key() {
            error!("Own Paillier key pair lacks its private key");
            return Err(InternalError::MissingPrivateKey);
        }
        if self.other_paillier.contains_private_key()
            || self.other_commitment_parameters.contains_private()
        {
            error!("Key share holds private material of the counterparty");
            return Err(InternalError::InternalInvariantFailed);
        }
        Ok(())
    }

    /// Own EC key share.
    pub fn private_key(&self) -> &BigNumber {
        &self.private_key
    }

    /// The counterparty's public key share.
    pub fn other_public_key(&self) -> &CurvePoint {
        &self.other_public_key
    }

    /// Own Paillier key pair, including the private key.
    pub fn own_paillier(&self) -> &PaillierKeyPair {
        &self.own_paillier
    }

    /// The counterparty's Paillier public key.
    pub fn other_paillier(&self) -> &PaillierKeyPair {
        &self.other_paillier
    }

    /// Own commitment parameters.
    pub fn own_commitment_parameters(&self) -> &BcParameters {
        &self.own_commitment_parameters
    }

    /// The counterparty's commitment parameters.
    pub fn other_commitment_parameters(&self) -> &BcParameters {
        &self.other_commitment_parameters
    }

    /// Own public key share `G · d`.
    pub fn public_key_share(&self) -> Result<CurvePoint> {
        CurvePoint::scale_generator(&self.private_key)
    }

    /// The key that signatures produced with this share verify under.
    pub fn joint_public_key(&self) -> Result<CurvePoint> {
        self.other_public_key.multiply_by_bignum(&self.private_key)
    }

    /// Serializes the key share for storage.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serialize!(self)
    }

    /// Restores a key share written by [`KeyShare::to_bytes`].
    pub fn from_slice<B: Clone + AsRef<[u8]>>(buf: B) -> Result<Self> {
        let share: Self = deserialize!(buf.as_ref())?;
        share.validate()?;
        Ok(share)
    }
}
