// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

use super::{
    message_hash_to_bn, EncryptedSignatureWithProof, EphemeralPublicValueWithProof,
    EphemeralValueShare, SignatureParts, SignerState,
};
use crate::{
    curve::{bn_to_scalar, k256_order, CurvePoint},
    errors::{InternalError, Result},
    keyshare::KeyShare,
    parallel::{ModPowProduct, ParallelHelper},
    utils::{bn_mod, is_unit, random_nonzero_bn},
    zkp::{
        desktop::{ZkProofDesktop, ZkProofDesktopInput, ZkProofDesktopSecret},
        phone::ZkProofPhoneInput,
        Proof,
    },
};
use k256::{ecdsa::Signature, elliptic_curve::scalar::IsHigh};
use libpaillier::unknown_order::BigNumber;
use rand::{CryptoRng, RngCore};
use std::{fmt::Debug, sync::Arc};
use tracing::{error, info, instrument};
use zeroize::ZeroizeOnDrop;

/// Values the desktop keeps between rounds one and three.
#[derive(ZeroizeOnDrop)]
struct RoundOne {
    nonce: BigNumber,
    inverse: BigNumber,
    inverse_nonce: BigNumber,
    product_nonce: BigNumber,
    alpha: BigNumber,
    beta: BigNumber,
}

/// Values the desktop keeps between round three and decryption.
struct RoundThree {
    ephemeral_point: CurvePoint,
    phone_ephemeral_point: CurvePoint,
    alpha: BigNumber,
    beta: BigNumber,
}

enum Round {
    AwaitSignatureParts,
    AwaitEphemeralValue(RoundOne),
    AwaitDecryption(RoundThree),
    Finished,
    Aborted,
}

impl Round {
    fn state(&self) -> SignerState {
        match self {
            Round::AwaitSignatureParts => SignerState::AwaitSignatureParts,
            Round::AwaitEphemeralValue(_) => SignerState::AwaitEphemeralValue,
            Round::AwaitDecryption(_) => SignerState::AwaitDecryption,
            Round::Finished => SignerState::Finished,
            Round::Aborted => SignerState::Aborted,
        }
    }
}

/// The desktop's side of signing one message hash.
///
/// The desktop starts the protocol and ends up with the signature.
pub struct DesktopSigner {
    keyshare: Arc<KeyShare>,
    helper: ParallelHelper,
    round: Round,
}

impl Debug for DesktopSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DesktopSigner")
            .field("keyshare", &"[redacted]")
            .field("state", &self.state())
            .finish()
    }
}

impl DesktopSigner {
    /// Creates a signer for a single signature.
    pub fn new(keyshare: Arc<KeyShare>, helper: ParallelHelper) -> Self {
        Self {
            keyshare,
            helper,
            round: Round::AwaitSignatureParts,
        }
    }

    /// The current state of the signer.
    pub fn state(&self) -> SignerState {
        self.round.state()
    }

    /// Takes the current round out of the signer, leaving it aborted.
    ///
    /// Callers put the next round back once they succeed, so any early
    /// return leaves the signer in [`SignerState::Aborted`].
    fn take_round(&mut self, expected: SignerState) -> Result<Round> {
        let round = std::mem::replace(&mut self.round, Round::Aborted);
        if round.state() != expected {
            error!(
                "Desktop signer is in state {:?}, but the call requires {:?}",
                round.state(),
                expected
            );
            return Err(InternalError::WrongState(round.state()));
        }
        Ok(round)
    }

    /// Round one: samples the nonce `k` and encrypts `k⁻¹` and `d·k⁻¹` under
    /// the desktop's Paillier key.
    #[cfg_attr(feature = "flame_it", flame("DesktopSigner"))]
    #[instrument(skip_all, err(Debug))]
    pub fn compute_signature_parts<R: RngCore + CryptoRng>(
        &mut self,
        rng: &mut R,
    ) -> Result<SignatureParts> {
        info!("Computing signature parts.");
        let _ = self.take_round(SignerState::AwaitSignatureParts)?;

        let q = k256_order();
        let paillier = self.keyshare.own_paillier();
        let nonce = random_nonzero_bn(rng, &q)?;
        let inverse = nonce
            .invert(&q)
            .ok_or(InternalError::CouldNotInvertBigNumber)?;
        let product = self.keyshare.private_key().modmul(&inverse, &q);
        let inverse_nonce = paillier.generate_randomizer(rng)?;
        let product_nonce = paillier.generate_randomizer(rng)?;

        let [alpha, beta]: [BigNumber; 2] = self
            .helper
            .mod_pow_products(&[
                paillier.encryption(&inverse, &inverse_nonce)?,
                paillier.encryption(&product, &product_nonce)?,
            ])?
            .try_into()
            .map_err(|_| InternalError::InternalInvariantFailed)?;

        let parts = SignatureParts {
            alpha: alpha.clone(),
            beta: beta.clone(),
        };
        self.round = Round::AwaitEphemeralValue(RoundOne {
            nonce,
            inverse,
            inverse_nonce,
            product_nonce,
            alpha,
            beta,
        });
        Ok(parts)
    }

    /// Round three: combines the phone's nonce point into `R = k·R'` and
    /// proves that round one was honest.
    #[cfg_attr(feature = "flame_it", flame("DesktopSigner"))]
    #[instrument(skip_all, err(Debug))]
    pub fn compute_ephemeral_public_value<R: RngCore + CryptoRng>(
        &mut self,
        share: &EphemeralValueShare,
        rng: &mut R,
    ) -> Result<EphemeralPublicValueWithProof> {
        info!("Computing ephemeral public value.");
        let round_one = match self.take_round(SignerState::AwaitEphemeralValue)? {
            Round::AwaitEphemeralValue(round_one) => round_one,
            _ => return Err(InternalError::InternalInvariantFailed),
        };

        let q = k256_order();
        let phone_ephemeral_point = share.phone_ephemeral_point.decode()?;
        let ephemeral_point = phone_ephemeral_point.multiply_by_bignum(&round_one.nonce)?;
        if ephemeral_point == CurvePoint::IDENTITY {
            error!("Combined nonce point is the identity");
            return Err(InternalError::InternalInvariantFailed);
        }

        let input = ZkProofDesktopInput::new(
            &round_one.alpha,
            &round_one.beta,
            &ephemeral_point,
            &phone_ephemeral_point,
            &self.keyshare.public_key_share()?,
            self.keyshare.own_paillier(),
            self.keyshare.own_commitment_parameters(),
        );
        let secret = ZkProofDesktopSecret::new(
            &round_one.inverse,
            &self.keyshare.private_key().modmul(&round_one.inverse, &q),
            &round_one.inverse_nonce,
            &round_one.product_nonce,
        );
        let proof = ZkProofDesktop::prove(rng, &input, &secret, &self.helper)?;

        self.round = Round::AwaitDecryption(RoundThree {
            ephemeral_point,
            phone_ephemeral_point,
            alpha: round_one.alpha.clone(),
            beta: round_one.beta.clone(),
        });
        Ok(EphemeralPublicValueWithProof {
            ephemeral_point: ephemeral_point.encode(),
            proof,
        })
    }

    /// Final step: verifies the phone's proof and decrypts the signature.
    ///
    /// `message_hash` must be the same 32-byte digest the phone signed. The
    /// returned signature is normalized to low-S.
    #[cfg_attr(feature = "flame_it", flame("DesktopSigner"))]
    #[instrument(skip_all, err(Debug))]
    pub fn decrypt_encrypted_signature(
        &mut self,
        message: &EncryptedSignatureWithProof,
        message_hash: &[u8],
    ) -> Result<Signature> {
        info!("Decrypting the encrypted signature.");
        let round_three = match self.take_round(SignerState::AwaitDecryption)? {
            Round::AwaitDecryption(round_three) => round_three,
            _ => return Err(InternalError::InternalInvariantFailed),
        };

        let q = k256_order();
        let hash = message_hash_to_bn(message_hash)?;
        let desktop_paillier = self.keyshare.own_paillier();
        let phone_paillier = self.keyshare.other_paillier();
        let desktop_nn = desktop_paillier.nn();

        if !is_unit(&message.encrypted_signature, &desktop_nn) {
            error!("Encrypted signature is not a unit mod N²");
            return range_err!("encrypted signature must be a unit in [1, N^2)");
        }
        if !is_unit(&message.alpha_phone, &phone_paillier.nn()) {
            error!("Phone ciphertext is not a unit mod N²");
            return range_err!("alpha_phone must be a unit in [1, N^2)");
        }

        let r = round_three.ephemeral_point.x_projection()?;
        let [scaled_alpha, scaled_beta]: [BigNumber; 2] = self
            .helper
            .mod_pow_products(&[
                ModPowProduct::new(&desktop_nn).term(&round_three.alpha, &hash),
                ModPowProduct::new(&desktop_nn).term(&round_three.beta, &r),
            ])?
            .try_into()
            .map_err(|_| InternalError::InternalInvariantFailed)?;

        let input = ZkProofPhoneInput::new(
            &scaled_alpha,
            &scaled_beta,
            &message.encrypted_signature,
            &message.alpha_phone,
            &round_three.phone_ephemeral_point,
            self.keyshare.other_public_key(),
            desktop_paillier,
            phone_paillier,
            self.keyshare.other_commitment_parameters(),
        );
        message.proof.verify(&input, &self.helper)?;

        let s = bn_mod(&desktop_paillier.decrypt(&message.encrypted_signature)?, &q);
        if s == BigNumber::zero() {
            error!("Decrypted signature is zero");
            return Err(InternalError::SignatureInstantiationError);
        }
        let r = bn_to_scalar(&r)?;
        let mut s = bn_to_scalar(&s)?;
        if s.is_high().unwrap_u8() == 1 {
            s = -s;
        }
        let signature = Signature::from_scalars(r, s).map_err(|_| {
            error!("Could not assemble an ECDSA signature from r and s");
            InternalError::SignatureInstantiationError
        })?;

        self.round = Round::Finished;
        Ok(signature)
    }
}
