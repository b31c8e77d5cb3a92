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
    curve::{k256_order, CurvePoint},
    errors::{InternalError, Result},
    keyshare::KeyShare,
    parallel::{ModPowProduct, ParallelHelper},
    parameters::RANDOMIZER_RANGE_EXPONENT,
    utils::{is_unit, pow, random_nonzero_bn, random_positive_bn},
    zkp::{
        desktop::ZkProofDesktopInput,
        phone::{ZkProofPhone, ZkProofPhoneInput, ZkProofPhoneSecret},
        Proof,
    },
};
use libpaillier::unknown_order::BigNumber;
use rand::{CryptoRng, RngCore};
use std::{fmt::Debug, sync::Arc};
use tracing::{error, info, instrument};
use zeroize::ZeroizeOnDrop;

/// Values the phone keeps between rounds two and four.
#[derive(ZeroizeOnDrop)]
struct RoundTwo {
    nonce: BigNumber,
    #[zeroize(skip)]
    phone_ephemeral_point: CurvePoint,
    alpha: BigNumber,
    beta: BigNumber,
}

enum Round {
    AwaitSignatureParts,
    AwaitEphemeralPublicValue(RoundTwo),
    Finished,
    Aborted,
}

impl Round {
    fn state(&self) -> SignerState {
        match self {
            Round::AwaitSignatureParts => SignerState::AwaitSignatureParts,
            Round::AwaitEphemeralPublicValue(_) => SignerState::AwaitEphemeralPublicValue,
            Round::Finished => SignerState::Finished,
            Round::Aborted => SignerState::Aborted,
        }
    }
}

/// The phone's side of signing one message hash.
///
/// The phone never sees the signature; it returns it encrypted under the
/// desktop's Paillier key.
pub struct PhoneSigner {
    keyshare: Arc<KeyShare>,
    helper: ParallelHelper,
    round: Round,
}

impl Debug for PhoneSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhoneSigner")
            .field("keyshare", &"[redacted]")
            .field("state", &self.state())
            .finish()
    }
}

impl PhoneSigner {
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

    fn take_round(&mut self, expected: SignerState) -> Result<Round> {
        let round = std::mem::replace(&mut self.round, Round::Aborted);
        if round.state() != expected {
            error!(
                "Phone signer is in state {:?}, but the call requires {:?}",
                round.state(),
                expected
            );
            return Err(InternalError::WrongState(round.state()));
        }
        Ok(round)
    }

    /// Round two: stores the desktop's ciphertexts and samples the phone's
    /// nonce `k'`.
    #[cfg_attr(feature = "flame_it", flame("PhoneSigner"))]
    #[instrument(skip_all, err(Debug))]
    pub fn generate_ephemeral_value_share<R: RngCore + CryptoRng>(
        &mut self,
        parts: &SignatureParts,
        rng: &mut R,
    ) -> Result<EphemeralValueShare> {
        info!("Generating ephemeral value share.");
        let _ = self.take_round(SignerState::AwaitSignatureParts)?;

        let desktop_nn = self.keyshare.other_paillier().nn();
        for (value, name) in [(&parts.alpha, "alpha"), (&parts.beta, "beta")] {
            if !is_unit(value, &desktop_nn) {
                error!("Desktop ciphertext {name} is not a unit mod N²");
                return range_err!(format!("{name} must be a unit in [1, N^2)"));
            }
        }

        let nonce = random_nonzero_bn(rng, &k256_order())?;
        let phone_ephemeral_point = CurvePoint::scale_generator(&nonce)?;

        self.round = Round::AwaitEphemeralPublicValue(RoundTwo {
            nonce,
            phone_ephemeral_point,
            alpha: parts.alpha.clone(),
            beta: parts.beta.clone(),
        });
        Ok(EphemeralValueShare {
            phone_ephemeral_point: phone_ephemeral_point.encode(),
        })
    }

    /// Round four: checks the desktop's proof and homomorphically computes
    /// the signature on `message_hash` under the desktop's key.
    #[cfg_attr(feature = "flame_it", flame("PhoneSigner"))]
    #[instrument(skip_all, err(Debug))]
    pub fn compute_encrypted_signature<R: RngCore + CryptoRng>(
        &mut self,
        message: &EphemeralPublicValueWithProof,
        message_hash: &[u8],
        rng: &mut R,
    ) -> Result<EncryptedSignatureWithProof> {
        info!("Computing encrypted signature.");
        let round_two = match self.take_round(SignerState::AwaitEphemeralPublicValue)? {
            Round::AwaitEphemeralPublicValue(round_two) => round_two,
            _ => return Err(InternalError::InternalInvariantFailed),
        };

        let q = k256_order();
        let hash = message_hash_to_bn(message_hash)?;
        let ephemeral_point = message.ephemeral_point.decode()?;
        let desktop_paillier = self.keyshare.other_paillier();
        let phone_paillier = self.keyshare.own_paillier();

        let input = ZkProofDesktopInput::new(
            &round_two.alpha,
            &round_two.beta,
            &ephemeral_point,
            &round_two.phone_ephemeral_point,
            self.keyshare.other_public_key(),
            desktop_paillier,
            self.keyshare.other_commitment_parameters(),
        );
        message.proof.verify(&input, &self.helper)?;

        let inverse = round_two
            .nonce
            .invert(&q)
            .ok_or(InternalError::CouldNotInvertBigNumber)?;
        let product = self.keyshare.private_key().modmul(&inverse, &q);
        let r = ephemeral_point.x_projection()?;
        let randomizer = random_positive_bn(rng, &pow(&q, RANDOMIZER_RANGE_EXPONENT));
        let signature_nonce = desktop_paillier.generate_randomizer(rng)?;
        let alpha_phone_nonce = phone_paillier.generate_randomizer(rng)?;

        let desktop_nn = desktop_paillier.nn();
        let [scaled_alpha, scaled_beta]: [BigNumber; 2] = self
            .helper
            .mod_pow_products(&[
                ModPowProduct::new(&desktop_nn).term(&round_two.alpha, &hash),
                ModPowProduct::new(&desktop_nn).term(&round_two.beta, &r),
            ])?
            .try_into()
            .map_err(|_| InternalError::InternalInvariantFailed)?;

        // sigma = Enc_D(k'⁻¹·(h·k⁻¹ + r·d·k⁻¹·d') + q·randomizer)
        let [encrypted_signature, alpha_phone]: [BigNumber; 2] = self
            .helper
            .mod_pow_products(&[
                ModPowProduct::new(&desktop_nn)
                    .term(&scaled_alpha, &inverse)
                    .term(&scaled_beta, &product)
                    .term(desktop_paillier.g(), &(&q * &randomizer))
                    .term(&signature_nonce, desktop_paillier.n()),
                phone_paillier.encryption(&inverse, &alpha_phone_nonce)?,
            ])?
            .try_into()
            .map_err(|_| InternalError::InternalInvariantFailed)?;

        let input = ZkProofPhoneInput::new(
            &scaled_alpha,
            &scaled_beta,
            &encrypted_signature,
            &alpha_phone,
            &round_two.phone_ephemeral_point,
            &self.keyshare.public_key_share()?,
            desktop_paillier,
            phone_paillier,
            self.keyshare.own_commitment_parameters(),
        );
        let secret = ZkProofPhoneSecret::new(
            &inverse,
            &product,
            &randomizer,
            &signature_nonce,
            &alpha_phone_nonce,
        );
        let proof = ZkProofPhone::prove(rng, &input, &secret, &self.helper)?;

        self.round = Round::Finished;
        Ok(EncryptedSignatureWithProof {
            encrypted_signature,
            alpha_phone,
            proof,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        curve::EncodedPoint,
        fixtures::keyshares,
        sign::DesktopSigner,
        utils::testing::init_testing,
    };
    use rand::rngs::StdRng;

    fn signers(rng: &mut StdRng) -> Result<(DesktopSigner, PhoneSigner)> {
        let q = k256_order();
        let (desktop, phone) =
            keyshares(&random_nonzero_bn(rng, &q)?, &random_nonzero_bn(rng, &q)?)?;
        let helper = ParallelHelper::with_threads(2)?;
        Ok((
            DesktopSigner::new(Arc::new(desktop), helper.clone()),
            PhoneSigner::new(Arc::new(phone), helper),
        ))
    }

    #[test]
    fn signing_before_round_two_aborts() -> Result<()> {
        let mut rng = init_testing();
        let (mut desktop, mut phone) = signers(&mut rng)?;
        let parts = desktop.compute_signature_parts(&mut rng)?;
        let share = phone.generate_ephemeral_value_share(&parts, &mut rng)?;
        let public_value = desktop.compute_ephemeral_public_value(&share, &mut rng)?;

        let (_, mut fresh_phone) = signers(&mut rng)?;
        assert_eq!(
            fresh_phone
                .compute_encrypted_signature(&public_value, &[0u8; 32], &mut rng)
                .unwrap_err(),
            InternalError::WrongState(SignerState::AwaitSignatureParts)
        );
        assert_eq!(fresh_phone.state(), SignerState::Aborted);
        Ok(())
    }

    #[test]
    fn finished_signer_cannot_sign_again() -> Result<()> {
        let mut rng = init_testing();
        let (mut desktop, mut phone) = signers(&mut rng)?;
        let parts = desktop.compute_signature_parts(&mut rng)?;
        let share = phone.generate_ephemeral_value_share(&parts, &mut rng)?;
        let public_value = desktop.compute_ephemeral_public_value(&share, &mut rng)?;
        let _ = phone.compute_encrypted_signature(&public_value, &[3u8; 32], &mut rng)?;
        assert_eq!(phone.state(), SignerState::Finished);

        assert_eq!(
            phone
                .compute_encrypted_signature(&public_value, &[3u8; 32], &mut rng)
                .unwrap_err(),
            InternalError::WrongState(SignerState::Finished)
        );
        Ok(())
    }

    #[test]
    fn ciphertexts_out_of_range_are_rejected() -> Result<()> {
        let mut rng = init_testing();
        let (mut desktop, phone) = signers(&mut rng)?;
        let parts = desktop.compute_signature_parts(&mut rng)?;
        let desktop_nn = phone.keyshare.other_paillier().nn();

        for parts in [
            SignatureParts {
                alpha: BigNumber::zero(),
                beta: parts.beta.clone(),
            },
            SignatureParts {
                alpha: parts.alpha.clone(),
                beta: desktop_nn.clone(),
            },
            // In range, but not invertible mod N²
            SignatureParts {
                alpha: phone.keyshare.other_paillier().n().clone(),
                beta: parts.beta.clone(),
            },
        ] {
            let (_, mut phone) = signers(&mut rng)?;
            assert!(matches!(
                phone.generate_ephemeral_value_share(&parts, &mut rng),
                Err(InternalError::OutOfRange(_))
            ));
            assert_eq!(phone.state(), SignerState::Aborted);
        }
        Ok(())
    }

    #[test]
    fn invalid_ephemeral_point_is_rejected() -> Result<()> {
        let mut rng = init_testing();
        let (mut desktop, mut phone) = signers(&mut rng)?;
        let parts = desktop.compute_signature_parts(&mut rng)?;
        let share = phone.generate_ephemeral_value_share(&parts, &mut rng)?;
        let mut public_value = desktop.compute_ephemeral_public_value(&share, &mut rng)?;

        let mut off_curve = vec![0u8; 33];
        off_curve[0] = 0x02;
        off_curve[32] = 0x05;
        public_value.ephemeral_point = EncodedPoint::from_bytes(off_curve);
        assert!(matches!(
            phone.compute_encrypted_signature(&public_value, &[0u8; 32], &mut rng),
            Err(InternalError::InvalidPoint(_))
        ));
        assert_eq!(phone.state(), SignerState::Aborted);
        Ok(())
    }

    #[test]
    fn substituted_ephemeral_point_fails_the_proof() -> Result<()> {
        let mut rng = init_testing();
        let (mut desktop, mut phone) = signers(&mut rng)?;
        let parts = desktop.compute_signature_parts(&mut rng)?;
        let share = phone.generate_ephemeral_value_share(&parts, &mut rng)?;
        let mut public_value = desktop.compute_ephemeral_public_value(&share, &mut rng)?;

        // A valid point that is not k·R'
        public_value.ephemeral_point = CurvePoint::GENERATOR.encode();
        let result = phone.compute_encrypted_signature(&public_value, &[0u8; 32], &mut rng);
        assert!(result.unwrap_err().is_proof_failure());
        assert_eq!(phone.state(), SignerState::Aborted);
        Ok(())
    }

    #[test]
    fn short_message_hash_is_rejected() -> Result<()> {
        let mut rng = init_testing();
        let (mut desktop, mut phone) = signers(&mut rng)?;
        let parts = desktop.compute_signature_parts(&mut rng)?;
        let share = phone.generate_ephemeral_value_share(&parts, &mut rng)?;
        let public_value = desktop.compute_ephemeral_public_value(&share, &mut rng)?;

        assert!(matches!(
            phone.compute_encrypted_signature(&public_value, b"not a digest", &mut rng),
            Err(InternalError::InvalidArgument(_))
        ));
        Ok(())
    }
}
