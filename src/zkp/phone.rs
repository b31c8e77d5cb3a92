// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Implements the phone's proof (`Π_B`) that the encrypted signature was
//! computed honestly.
//!
//! The phone returns
//! `sigma = alpha^(z'·h) · beta^(x2·r) · Enc_D(q·x3)` under the desktop's
//! Paillier key, where `z' = k'⁻¹`, `x2 = d'·z' mod q`, `h` is the message
//! hash, `r` the x-coordinate of `R`, and `x3` a randomizer below `q⁵` that
//! hides everything but `s mod q` from the desktop. It also returns
//! `alpha_phone = Enc_P(z')` under its own key. Writing `c1 = alpha^h` and
//! `c2 = beta^r`, the proof shows knowledge of `x1, x2, x3` such that
//! - `alpha_phone` encrypts `x1` with `x1·R' = G`,
//! - `sigma = c1^x1 · c2^x2 · Enc_D(q·x3)`,
//! - `x2·G = x1·Q'` for the phone's public key share `Q'`,
//!
//! with `x1, x2 < q³` and `x3 < q⁷`.
//!
//! This implementation uses a standard Fiat-Shamir transformation to make the
//! proof non-interactive.

use super::Proof;
use crate::{
    commitment::BcParameters,
    curve::{k256_order, CurvePoint, EncodedPoint},
    errors::{InternalError, Result},
    paillier::PaillierKeyPair,
    parallel::{domain_hash, HashInput, ModPowProduct, ParallelHelper, PointSum},
    parameters::{
        RANDOMIZER_RANGE_EXPONENT, RANDOMIZER_RESPONSE_RANGE_EXPONENT, RESPONSE_RANGE_EXPONENT,
    },
    utils::{
        bn_mod, is_unit, pow, random_bn_in_z_star, random_positive_bn, within_range,
    },
};
use libpaillier::unknown_order::BigNumber;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::error;
use zeroize::ZeroizeOnDrop;

const DOMAIN_LABEL: &str = "PiPrime";

/// Proof that the phone's encrypted signature is well formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZkProofPhone {
    /// Commitment to `z'` (`z1` in the paper).
    inverse_commitment: BigNumber,
    /// Commitment to `d'·z'` (`z2` in the paper).
    product_commitment: BigNumber,
    /// Commitment to the randomizer (`z3` in the paper).
    randomizer_commitment: BigNumber,
    /// Blinded image of the product, `(d'·z' + ρ3)·G` (`Y` in the paper).
    product_point: EncodedPoint,
    /// Fiat-Shamir challenge (`e` in the paper).
    challenge: BigNumber,
    /// `s1` in the paper.
    inverse_response: BigNumber,
    /// `s2` in the paper; lives modulo the phone's `N²`.
    inverse_nonce_response: BigNumber,
    /// `s3` in the paper.
    inverse_randomness_response: BigNumber,
    /// `t1` in the paper.
    product_response: BigNumber,
    /// `t2` in the paper.
    product_point_response: BigNumber,
    /// `t3` in the paper; lives modulo the desktop's `N²`.
    signature_nonce_response: BigNumber,
    /// `t4` in the paper.
    product_randomness_response: BigNumber,
    /// `t5` in the paper.
    randomizer_response: BigNumber,
    /// `t6` in the paper.
    randomizer_randomness_response: BigNumber,
}

/// Common input and setup parameters known to both the prover and verifier.
#[derive(Clone)]
pub struct ZkProofPhoneInput {
    /// `alpha^h` under the desktop's key (`c1` in the paper).
    scaled_alpha: BigNumber,
    /// `beta^r` under the desktop's key (`c2` in the paper).
    scaled_beta: BigNumber,
    /// The encrypted signature `sigma` (`c3` in the paper).
    encrypted_signature: BigNumber,
    /// `Enc_P(z')` (`c4` in the paper).
    alpha_phone: BigNumber,
    /// The phone's nonce point `R'`.
    phone_ephemeral_point: CurvePoint,
    /// The phone's public key share `Q' = d'·G`.
    public_key_share: CurvePoint,
    desktop_paillier: PaillierKeyPair,
    phone_paillier: PaillierKeyPair,
    /// The phone's commitment parameters (public part).
    commitment_parameters: BcParameters,
}

impl ZkProofPhoneInput {
    /// Collects the statement. Only the public parts of both Paillier keys and
    /// of the commitment parameters are kept.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        scaled_alpha: &BigNumber,
        scaled_beta: &BigNumber,
        encrypted_signature: &BigNumber,
        alpha_phone: &BigNumber,
        phone_ephemeral_point: &CurvePoint,
        public_key_share: &CurvePoint,
        desktop_paillier: &PaillierKeyPair,
        phone_paillier: &PaillierKeyPair,
        commitment_parameters: &BcParameters,
    ) -> Self {
        Self {
            scaled_alpha: scaled_alpha.clone(),
            scaled_beta: scaled_beta.clone(),
            encrypted_signature: encrypted_signature.clone(),
            alpha_phone: alpha_phone.clone(),
            phone_ephemeral_point: *phone_ephemeral_point,
            public_key_share: *public_key_share,
            desktop_paillier: desktop_paillier.public_only(),
            phone_paillier: phone_paillier.public_only(),
            commitment_parameters: commitment_parameters.clear_private(),
        }
    }
}

/// The prover's secret knowledge.
#[derive(ZeroizeOnDrop)]
pub struct ZkProofPhoneSecret {
    /// `z' = k'⁻¹ mod q` (`x1` in the paper).
    inverse: BigNumber,
    /// `d'·z' mod q` (`x2` in the paper).
    product: BigNumber,
    /// The randomizer blinding `sigma` (`x3` in the paper).
    randomizer: BigNumber,
    /// Encryption nonce of `sigma` (`r3` in the paper).
    signature_nonce: BigNumber,
    /// Encryption nonce of `alpha_phone` (`r4` in the paper).
    alpha_phone_nonce: BigNumber,
}

impl ZkProofPhoneSecret {
    #[allow(missing_docs)]
    pub fn new(
        inverse: &BigNumber,
        product: &BigNumber,
        randomizer: &BigNumber,
        signature_nonce: &BigNumber,
        alpha_phone_nonce: &BigNumber,
    ) -> Self {
        Self {
            inverse: inverse.clone(),
            product: product.clone(),
            randomizer: randomizer.clone(),
            signature_nonce: signature_nonce.clone(),
            alpha_phone_nonce: alpha_phone_nonce.clone(),
        }
    }
}

impl std::fmt::Debug for ZkProofPhoneSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZkProofPhoneSecret")
            .field("inverse", &"[redacted]")
            .field("product", &"[redacted]")
            .field("randomizer", &"[redacted]")
            .field("signature_nonce", &"[redacted]")
            .field("alpha_phone_nonce", &"[redacted]")
            .finish()
    }
}

struct Commitments {
    inverse_commitment: BigNumber,
    inverse_mask_point: CurvePoint,
    inverse_mask_ciphertext: BigNumber,
    inverse_mask_commitment: BigNumber,
    product_commitment: BigNumber,
    randomizer_commitment: BigNumber,
    product_point: CurvePoint,
    product_mask_point: CurvePoint,
    key_mask_point: CurvePoint,
    signature_mask_ciphertext: BigNumber,
    product_mask_commitment: BigNumber,
    randomizer_mask_commitment: BigNumber,
}

impl Commitments {
    fn challenge(&self, input: &ZkProofPhoneInput) -> BigNumber {
        let params = &input.commitment_parameters;
        domain_hash(
            DOMAIN_LABEL,
            &[
                HashInput::Integer(input.desktop_paillier.n()),
                HashInput::Integer(input.desktop_paillier.g()),
                HashInput::Integer(input.phone_paillier.n()),
                HashInput::Integer(input.phone_paillier.g()),
                HashInput::Integer(params.modulus()),
                HashInput::Integer(params.g()),
                HashInput::Integer(params.h()),
                HashInput::Point(&input.phone_ephemeral_point),
                HashInput::Point(&CurvePoint::GENERATOR),
                HashInput::Point(&input.public_key_share),
                HashInput::Integer(&input.scaled_alpha),
                HashInput::Integer(&input.scaled_beta),
                HashInput::Integer(&input.encrypted_signature),
                HashInput::Integer(&input.alpha_phone),
                HashInput::Integer(&self.inverse_commitment),
                HashInput::Point(&self.inverse_mask_point),
                HashInput::Integer(&self.inverse_mask_ciphertext),
                HashInput::Integer(&self.inverse_mask_commitment),
                HashInput::Integer(&self.product_commitment),
                HashInput::Integer(&self.randomizer_commitment),
                HashInput::Point(&self.product_point),
                HashInput::Point(&self.product_mask_point),
                HashInput::Point(&self.key_mask_point),
                HashInput::Integer(&self.signature_mask_ciphertext),
                HashInput::Integer(&self.product_mask_commitment),
                HashInput::Integer(&self.randomizer_mask_commitment),
            ],
        )
    }
}

impl Proof for ZkProofPhone {
    type CommonInput = ZkProofPhoneInput;
    type ProverSecret = ZkProofPhoneSecret;

    #[cfg_attr(feature = "flame_it", flame("ZkProofPhone"))]
    fn prove<R: RngCore + CryptoRng>(
        rng: &mut R,
        input: &Self::CommonInput,
        secret: &Self::ProverSecret,
        helper: &ParallelHelper,
    ) -> Result<Self> {
        let q = k256_order();
        let q_cubed = pow(&q, RESPONSE_RANGE_EXPONENT);
        let q_fifth = pow(&q, RANDOMIZER_RANGE_EXPONENT);
        let q_seventh = pow(&q, RANDOMIZER_RESPONSE_RANGE_EXPONENT);
        let params = &input.commitment_parameters;
        let n_tilde = params.modulus();
        let desktop_n = input.desktop_paillier.n();
        let desktop_nn = input.desktop_paillier.nn();
        let phone_nn = input.phone_paillier.nn();
        let generator = CurvePoint::GENERATOR;

        // Masks for the secrets (aka `alpha`, `delta`, `sigma`)
        let inverse_mask = random_positive_bn(rng, &q_cubed);
        let product_mask = random_positive_bn(rng, &q_cubed);
        let randomizer_mask = random_positive_bn(rng, &q_seventh);
        // Masks for the encryption nonces (aka `beta`, `mu`)
        let inverse_nonce_mask = random_bn_in_z_star(rng, input.phone_paillier.n())?;
        let signature_nonce_mask = random_bn_in_z_star(rng, desktop_n)?;

        // Commitment randomness (aka `rho1`, `gamma`, `rho2`, `nu`, `rho4`, `tau`)
        let inverse_randomness = random_positive_bn(rng, &(&q * n_tilde));
        let inverse_mask_randomness = random_positive_bn(rng, &(&q_cubed * n_tilde));
        let product_randomness = random_positive_bn(rng, &(&q * n_tilde));
        let product_mask_randomness = random_positive_bn(rng, &(&q_cubed * n_tilde));
        let randomizer_randomness = random_positive_bn(rng, &(&q_fifth * n_tilde));
        let randomizer_mask_randomness = random_positive_bn(rng, &(&q_seventh * n_tilde));

        // Blinder for `Y` and its mask (aka `rho3`, `epsilon`)
        let point_blinder = random_positive_bn(rng, &q);
        let point_blinder_mask = random_positive_bn(rng, &q);

        let [inverse_commitment, inverse_mask_ciphertext, inverse_mask_commitment, product_commitment, signature_mask_ciphertext, product_mask_commitment, randomizer_commitment, randomizer_mask_commitment]: [BigNumber; 8] =
            helper
                .mod_pow_products(&[
                    params.commitment(&secret.inverse, &inverse_randomness),
                    input
                        .phone_paillier
                        .encryption(&inverse_mask, &inverse_nonce_mask)?,
                    params.commitment(&inverse_mask, &inverse_mask_randomness),
                    params.commitment(&secret.product, &product_randomness),
                    ModPowProduct::new(&desktop_nn)
                        .term(&input.scaled_alpha, &inverse_mask)
                        .term(&input.scaled_beta, &product_mask)
                        .term(input.desktop_paillier.g(), &(&q * &randomizer_mask))
                        .term(&signature_nonce_mask, desktop_n),
                    params.commitment(&product_mask, &product_mask_randomness),
                    params.commitment(&secret.randomizer, &randomizer_randomness),
                    params.commitment(&randomizer_mask, &randomizer_mask_randomness),
                ])?
                .try_into()
                .map_err(|_| InternalError::InternalInvariantFailed)?;

        let [inverse_mask_point, product_point, product_mask_point, key_mask_point]: [CurvePoint;
            4] = helper
            .point_sums(&[
                PointSum::new().term(&inverse_mask, &input.phone_ephemeral_point),
                PointSum::new().term(&(&secret.product + &point_blinder), &generator),
                PointSum::new().term(&(&product_mask + &point_blinder_mask), &generator),
                PointSum::new()
                    .term(&inverse_mask, &input.public_key_share)
                    .term(&point_blinder_mask, &generator),
            ])?
            .try_into()
            .map_err(|_| InternalError::InternalInvariantFailed)?;

        let commitments = Commitments {
            inverse_commitment,
            inverse_mask_point,
            inverse_mask_ciphertext,
            inverse_mask_commitment,
            product_commitment,
            randomizer_commitment,
            product_point,
            product_mask_point,
            key_mask_point,
            signature_mask_ciphertext,
            product_mask_commitment,
            randomizer_mask_commitment,
        };
        let challenge = commitments.challenge(input);

        let [inverse_nonce_response, signature_nonce_response]: [BigNumber; 2] = helper
            .mod_pow_products(&[
                ModPowProduct::new(&phone_nn)
                    .term(&secret.alpha_phone_nonce, &challenge)
                    .term(&inverse_nonce_mask, &BigNumber::one()),
                ModPowProduct::new(&desktop_nn)
                    .term(&secret.signature_nonce, &challenge)
                    .term(&signature_nonce_mask, &BigNumber::one()),
            ])?
            .try_into()
            .map_err(|_| InternalError::InternalInvariantFailed)?;

        Ok(Self {
            inverse_commitment: commitments.inverse_commitment,
            product_commitment: commitments.product_commitment,
            randomizer_commitment: commitments.randomizer_commitment,
            product_point: commitments.product_point.encode(),
            inverse_response: &challenge * &secret.inverse + &inverse_mask,
            inverse_nonce_response,
            inverse_randomness_response: &challenge * &inverse_randomness
                + &inverse_mask_randomness,
            product_response: &challenge * &secret.product + &product_mask,
            product_point_response: bn_mod(
                &(&challenge * &point_blinder + &point_blinder_mask),
                &q,
            ),
            signature_nonce_response,
            product_randomness_response: &challenge * &product_randomness
                + &product_mask_randomness,
            randomizer_response: &challenge * &secret.randomizer + &randomizer_mask,
            randomizer_randomness_response: &challenge * &randomizer_randomness
                + &randomizer_mask_randomness,
            challenge,
        })
    }

    #[cfg_attr(feature = "flame_it", flame("ZkProofPhone"))]
    fn verify(&self, input: &Self::CommonInput, helper: &ParallelHelper) -> Result<()> {
        let q = k256_order();
        let q_cubed = pow(&q, RESPONSE_RANGE_EXPONENT);
        let q_seventh = pow(&q, RANDOMIZER_RESPONSE_RANGE_EXPONENT);
        let params = &input.commitment_parameters;
        let n_tilde = params.modulus();
        let desktop_nn = input.desktop_paillier.nn();
        let phone_nn = input.phone_paillier.nn();
        let generator = CurvePoint::GENERATOR;

        // Everything that can be checked cheaply is checked before any
        // exponentiation or hashing takes place.
        let product_point = self.product_point.decode().map_err(|_| {
            error!("Phone proof contains an invalid product point");
            InternalError::ProofFailed(String::from("product point is not a valid curve point"))
        })?;
        if !within_range(&self.inverse_response, &q_cubed) {
            error!("Phone proof failed the bounds check on s1");
            return verify_err!("bounds check on inverse response failed");
        }
        if !within_range(&self.product_response, &q_cubed) {
            error!("Phone proof failed the bounds check on t1");
            return verify_err!("bounds check on product response failed");
        }
        if !within_range(&self.randomizer_response, &q_seventh) {
            error!("Phone proof failed the bounds check on t5");
            return verify_err!("bounds check on randomizer response failed");
        }
        if !within_range(&self.challenge, &q) || !within_range(&self.product_point_response, &q)
        {
            return verify_err!("challenge or point response is not reduced mod q");
        }
        if !is_unit(&self.inverse_nonce_response, &phone_nn)
            || !is_unit(&input.alpha_phone, &phone_nn)
        {
            return verify_err!("value is not a unit mod N_phone^2");
        }
        for value in [
            &self.signature_nonce_response,
            &input.encrypted_signature,
            &input.scaled_alpha,
            &input.scaled_beta,
        ] {
            if !is_unit(value, &desktop_nn) {
                return verify_err!("value is not a unit mod N_desktop^2");
            }
        }
        for value in [
            &self.inverse_commitment,
            &self.product_commitment,
            &self.randomizer_commitment,
        ] {
            if !is_unit(value, n_tilde) {
                return verify_err!("commitment is not a unit mod N~");
            }
        }

        let challenge = &self.challenge;
        let minus_challenge = -challenge.clone();
        let products = [
            ModPowProduct::new(&phone_nn)
                .term(input.phone_paillier.g(), &self.inverse_response)
                .term(&self.inverse_nonce_response, input.phone_paillier.n())
                .term(&input.alpha_phone, &minus_challenge),
            params.reopen(
                &self.inverse_response,
                &self.inverse_randomness_response,
                &self.inverse_commitment,
                challenge,
            ),
            ModPowProduct::new(&desktop_nn)
                .term(&input.scaled_alpha, &self.inverse_response)
                .term(&input.scaled_beta, &self.product_response)
                .term(
                    input.desktop_paillier.g(),
                    &(&q * &self.randomizer_response),
                )
                .term(&self.signature_nonce_response, input.desktop_paillier.n())
                .term(&input.encrypted_signature, &minus_challenge),
            params.reopen(
                &self.product_response,
                &self.product_randomness_response,
                &self.product_commitment,
                challenge,
            ),
            params.reopen(
                &self.randomizer_response,
                &self.randomizer_randomness_response,
                &self.randomizer_commitment,
                challenge,
            ),
        ];
        let sums = [
            PointSum::new()
                .term(&self.inverse_response, &input.phone_ephemeral_point)
                .term(&minus_challenge, &generator),
            PointSum::new()
                .term(
                    &(&self.product_response + &self.product_point_response),
                    &generator,
                )
                .term(&minus_challenge, &product_point),
            PointSum::new()
                .term(&self.inverse_response, &input.public_key_share)
                .term(&self.product_point_response, &generator)
                .term(&minus_challenge, &product_point),
        ];

        let [inverse_mask_ciphertext, inverse_mask_commitment, signature_mask_ciphertext, product_mask_commitment, randomizer_mask_commitment]: [BigNumber; 5] =
            helper
                .mod_pow_products(&products)
                .map_err(|e| {
                    error!("Failed to recompute the phone proof commitments: {e}");
                    InternalError::ProofFailed(String::from("commitments could not be recomputed"))
                })?
                .try_into()
                .map_err(|_| InternalError::InternalInvariantFailed)?;
        let [inverse_mask_point, product_mask_point, key_mask_point]: [CurvePoint; 3] = helper
            .point_sums(&sums)?
            .try_into()
            .map_err(|_| InternalError::InternalInvariantFailed)?;

        let commitments = Commitments {
            inverse_commitment: self.inverse_commitment.clone(),
            inverse_mask_point,
            inverse_mask_ciphertext,
            inverse_mask_commitment,
            product_commitment: self.product_commitment.clone(),
            randomizer_commitment: self.randomizer_commitment.clone(),
            product_point,
            product_mask_point,
            key_mask_point,
            signature_mask_ciphertext,
            product_mask_commitment,
            randomizer_mask_commitment,
        };
        if &commitments.challenge(input) != challenge {
            error!("Phone proof failed the Fiat-Shamir check");
            return verify_err!("Fiat-Shamir didn't verify");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fixtures::{commitment_parameters, paillier_key, DESKTOP, PHONE},
        utils::testing::init_testing,
    };
    use rand::rngs::StdRng;

    fn honest_proof(
        rng: &mut StdRng,
        helper: &ParallelHelper,
    ) -> Result<(ZkProofPhone, ZkProofPhoneInput)> {
        let q = k256_order();
        let desktop_paillier = paillier_key(DESKTOP);
        let phone_paillier = paillier_key(PHONE);
        let params = commitment_parameters(PHONE);
        let desktop_nn = desktop_paillier.nn();

        // Desktop side of rounds one to three
        let desktop_nonce = random_positive_bn(rng, &q);
        let desktop_inverse = desktop_nonce
            .invert(&q)
            .ok_or(InternalError::CouldNotInvertBigNumber)?;
        let desktop_share = random_positive_bn(rng, &q);
        let (alpha, _) = desktop_paillier.encrypt_with_rng(rng, &desktop_inverse)?;
        let (beta, _) =
            desktop_paillier.encrypt_with_rng(rng, &desktop_share.modmul(&desktop_inverse, &q))?;

        // Phone side
        let phone_share = random_positive_bn(rng, &q);
        let phone_nonce = random_positive_bn(rng, &q);
        let phone_ephemeral_point = CurvePoint::scale_generator(&phone_nonce)?;
        let ephemeral_point = phone_ephemeral_point.multiply_by_bignum(&desktop_nonce)?;
        let inverse = phone_nonce
            .invert(&q)
            .ok_or(InternalError::CouldNotInvertBigNumber)?;
        let product = phone_share.modmul(&inverse, &q);
        let r = ephemeral_point.x_projection()?;
        let message_hash = random_positive_bn(rng, &q);
        let randomizer = random_positive_bn(rng, &pow(&q, RANDOMIZER_RANGE_EXPONENT));
        let signature_nonce = random_bn_in_z_star(rng, desktop_paillier.n())?;

        let scaled_alpha = alpha.modpow(&message_hash, &desktop_nn);
        let scaled_beta = beta.modpow(&r, &desktop_nn);
        let encrypted_signature = ModPowProduct::new(&desktop_nn)
            .term(&scaled_alpha, &inverse)
            .term(&scaled_beta, &product)
            .term(desktop_paillier.g(), &(&q * &randomizer))
            .term(&signature_nonce, desktop_paillier.n())
            .evaluate()?;
        let (alpha_phone, alpha_phone_nonce) = phone_paillier.encrypt_with_rng(rng, &inverse)?;

        let input = ZkProofPhoneInput::new(
            &scaled_alpha,
            &scaled_beta,
            &encrypted_signature,
            &alpha_phone,
            &phone_ephemeral_point,
            &CurvePoint::scale_generator(&phone_share)?,
            &desktop_paillier,
            &phone_paillier,
            &params,
        );
        let secret = ZkProofPhoneSecret::new(
            &inverse,
            &product,
            &randomizer,
            &signature_nonce,
            &alpha_phone_nonce,
        );
        let proof = ZkProofPhone::prove(rng, &input, &secret, helper)?;
        Ok((proof, input))
    }

    #[test]
    fn honest_proof_verifies_after_serialization() -> Result<()> {
        let mut rng = init_testing();
        let helper = ParallelHelper::with_threads(0)?;
        let (proof, input) = honest_proof(&mut rng, &helper)?;

        let bytes = bincode::serialize(&proof).unwrap();
        let roundtrip: ZkProofPhone = bincode::deserialize(&bytes).unwrap();
        assert_eq!(roundtrip, proof);

        roundtrip.verify(&input, &helper)
    }

    #[test]
    fn tampered_fields_are_rejected() -> Result<()> {
        let mut rng = init_testing();
        let helper = ParallelHelper::with_threads(0)?;
        let (proof, input) = honest_proof(&mut rng, &helper)?;

        let tamperings: [(&str, fn(&mut ZkProofPhone)); 14] = [
            ("z1", |p| p.inverse_commitment = &p.inverse_commitment + BigNumber::one()),
            ("z2", |p| p.product_commitment = &p.product_commitment + BigNumber::one()),
            ("z3", |p| {
                p.randomizer_commitment = &p.randomizer_commitment + BigNumber::one()
            }),
            ("Y", |p| p.product_point = CurvePoint::GENERATOR.encode()),
            ("e", |p| p.challenge = &p.challenge + BigNumber::one()),
            ("s1", |p| p.inverse_response = &p.inverse_response + BigNumber::one()),
            ("s2", |p| {
                p.inverse_nonce_response = &p.inverse_nonce_response + BigNumber::one()
            }),
            ("s3", |p| {
                p.inverse_randomness_response = &p.inverse_randomness_response + BigNumber::one()
            }),
            ("t1", |p| p.product_response = &p.product_response + BigNumber::one()),
            ("t2", |p| {
                p.product_point_response = &p.product_point_response + BigNumber::one()
            }),
            ("t3", |p| {
                p.signature_nonce_response = &p.signature_nonce_response + BigNumber::one()
            }),
            ("t4", |p| {
                p.product_randomness_response = &p.product_randomness_response + BigNumber::one()
            }),
            ("t5", |p| p.randomizer_response = &p.randomizer_response + BigNumber::one()),
            ("t6", |p| {
                p.randomizer_randomness_response =
                    &p.randomizer_randomness_response + BigNumber::one()
            }),
        ];

        for (field, tamper) in tamperings {
            let mut bad_proof = proof.clone();
            tamper(&mut bad_proof);
            let result = bad_proof.verify(&input, &helper);
            assert!(
                matches!(result, Err(InternalError::ProofFailed(_))),
                "tampering with {field} was not detected"
            );
        }
        Ok(())
    }

    #[test]
    fn substituted_statement_is_rejected() -> Result<()> {
        let mut rng = init_testing();
        let helper = ParallelHelper::with_threads(0)?;
        let (proof, input) = honest_proof(&mut rng, &helper)?;

        // A signature that is off by an encryption of one
        let shifted = input.desktop_paillier.add(
            &input.encrypted_signature,
            &input
                .desktop_paillier
                .encrypt_with_rng(&mut rng, &BigNumber::one())?
                .0,
        );
        let tampered_input = ZkProofPhoneInput {
            encrypted_signature: shifted,
            ..input.clone()
        };
        assert!(proof
            .verify(&tampered_input, &helper)
            .unwrap_err()
            .is_proof_failure());

        // alpha_phone encrypting some z'' != z'
        let other_inverse = random_positive_bn(&mut rng, &k256_order());
        let (other_alpha_phone, _) = input
            .phone_paillier
            .encrypt_with_rng(&mut rng, &other_inverse)?;
        let tampered_input = ZkProofPhoneInput {
            alpha_phone: other_alpha_phone,
            ..input
        };
        assert!(proof
            .verify(&tampered_input, &helper)
            .unwrap_err()
            .is_proof_failure());
        Ok(())
    }

    #[test]
    fn values_sharing_a_factor_with_the_modulus_are_rejected() -> Result<()> {
        let mut rng = init_testing();
        let helper = ParallelHelper::with_threads(0)?;
        let (proof, input) = honest_proof(&mut rng, &helper)?;

        // alpha_phone = N_phone lies in [1, N_phone^2) but has no inverse
        let tampered_input = ZkProofPhoneInput {
            alpha_phone: input.phone_paillier.n().clone(),
            ..input.clone()
        };
        assert_eq!(
            proof.verify(&tampered_input, &helper),
            Err(InternalError::ProofFailed(String::from(
                "value is not a unit mod N_phone^2"
            )))
        );

        // sigma sharing the factor N_desktop
        let tampered_input = ZkProofPhoneInput {
            encrypted_signature: input.desktop_paillier.n().clone(),
            ..input.clone()
        };
        assert_eq!(
            proof.verify(&tampered_input, &helper),
            Err(InternalError::ProofFailed(String::from(
                "value is not a unit mod N_desktop^2"
            )))
        );

        // Commitments equal to a prime factor of N~
        let params = commitment_parameters(PHONE);
        let (p, _) = params.factors()?;
        let tamperings: [fn(&mut ZkProofPhone, &BigNumber); 2] = [
            |proof, p| proof.inverse_commitment = p.clone(),
            |proof, p| proof.randomizer_commitment = p.clone(),
        ];
        for tamper in tamperings {
            let mut bad_proof = proof.clone();
            tamper(&mut bad_proof, p);
            assert_eq!(
                bad_proof.verify(&input, &helper),
                Err(InternalError::ProofFailed(String::from(
                    "commitment is not a unit mod N~"
                )))
            );
        }
        Ok(())
    }

    #[test]
    fn oversized_randomizer_response_fails_before_hashing() -> Result<()> {
        let mut rng = init_testing();
        let helper = ParallelHelper::with_threads(0)?;
        let (mut proof, input) = honest_proof(&mut rng, &helper)?;

        proof.randomizer_response =
            &proof.randomizer_response + pow(&k256_order(), RANDOMIZER_RESPONSE_RANGE_EXPONENT);
        assert_eq!(
            proof.verify(&input, &helper),
            Err(InternalError::ProofFailed(String::from(
                "bounds check on randomizer response failed"
            )))
        );
        Ok(())
    }
}
