// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Implements the desktop's proof (`Π_A`) that its round-one ciphertexts are
//! consistent with the combined nonce point.
//!
//! The desktop sends `alpha = Enc(z)` and `beta = Enc(d·z mod q)` under its
//! own Paillier key, where `z = k⁻¹` and `d` is its key share, together with
//! `R = k·R'`. The proof convinces the phone that
//! - `alpha` encrypts some `z < q³` with `z·R = R'`,
//! - `beta` encrypts some `x2 < q³`, and
//! - `x2·G = z·Q` for the desktop's public key share `Q`,
//!
//! without revealing `z` or `d`. Plaintexts are committed under the desktop's
//! [`BcParameters`] and the curve relations are proven Schnorr-style. The
//! point `Y = (x2 + ρ3)·G` is a blinded image of `x2` that lets both
//! relations share one challenge.
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
    parameters::RESPONSE_RANGE_EXPONENT,
    utils::{
        bn_mod, is_unit, pow, random_bn_in_z_star, random_positive_bn, within_range,
    },
};
use libpaillier::unknown_order::BigNumber;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::error;
use zeroize::ZeroizeOnDrop;

const DOMAIN_LABEL: &str = "Pi";

/// Proof that the desktop's round-one ciphertexts match its nonce and key
/// share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZkProofDesktop {
    /// Commitment to the inverse nonce `z` (`z1` in the paper).
    inverse_commitment: BigNumber,
    /// Commitment to the product `d·z` (`z2` in the paper).
    product_commitment: BigNumber,
    /// Blinded image of the product, `(d·z + ρ3)·G` (`Y` in the paper).
    product_point: EncodedPoint,
    /// Fiat-Shamir challenge (`e` in the paper).
    challenge: BigNumber,
    /// Response binding `z` and its mask (`s1` in the paper).
    inverse_response: BigNumber,
    /// Response binding the nonce of `alpha` and its mask (`s2` in the paper).
    inverse_nonce_response: BigNumber,
    /// Response binding the commitment randomness of `z` (`s3` in the paper).
    inverse_randomness_response: BigNumber,
    /// Response binding `d·z` and its mask (`t1` in the paper).
    product_response: BigNumber,
    /// Response binding the point blinder `ρ3` (`t2` in the paper).
    product_point_response: BigNumber,
    /// Response binding the nonce of `beta` and its mask (`t3` in the paper).
    product_nonce_response: BigNumber,
    /// Response binding the commitment randomness of `d·z` (`t4` in the paper).
    product_randomness_response: BigNumber,
}

/// Common input and setup parameters known to both the prover and verifier.
#[derive(Clone)]
pub struct ZkProofDesktopInput {
    /// `Enc(z)` (`c1` in the paper).
    alpha: BigNumber,
    /// `Enc(d·z mod q)` (`c2` in the paper).
    beta: BigNumber,
    /// The combined nonce point `R = k·R'`.
    ephemeral_point: CurvePoint,
    /// The phone's nonce point `R'`.
    phone_ephemeral_point: CurvePoint,
    /// The desktop's public key share `Q = d·G`.
    public_key_share: CurvePoint,
    /// The desktop's Paillier key (public part).
    paillier: PaillierKeyPair,
    /// The desktop's commitment parameters (public part).
    commitment_parameters: BcParameters,
}

impl ZkProofDesktopInput {
    /// Collects the statement. Only the public parts of the Paillier key and
    /// commitment parameters are kept.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        alpha: &BigNumber,
        beta: &BigNumber,
        ephemeral_point: &CurvePoint,
        phone_ephemeral_point: &CurvePoint,
        public_key_share: &CurvePoint,
        paillier: &PaillierKeyPair,
        commitment_parameters: &BcParameters,
    ) -> Self {
        Self {
            alpha: alpha.clone(),
            beta: beta.clone(),
            ephemeral_point: *ephemeral_point,
            phone_ephemeral_point: *phone_ephemeral_point,
            public_key_share: *public_key_share,
            paillier: paillier.public_only(),
            commitment_parameters: commitment_parameters.clear_private(),
        }
    }
}

/// The prover's secret knowledge: the two plaintexts and their encryption
/// nonces.
#[derive(ZeroizeOnDrop)]
pub struct ZkProofDesktopSecret {
    /// `z = k⁻¹ mod q` (`x1` in the paper).
    inverse: BigNumber,
    /// `d·z mod q` (`x2` in the paper).
    product: BigNumber,
    /// Encryption nonce of `alpha` (`r1` in the paper).
    inverse_nonce: BigNumber,
    /// Encryption nonce of `beta` (`r2` in the paper).
    product_nonce: BigNumber,
}

impl ZkProofDesktopSecret {
    /// Collects the witness.
    pub fn new(
        inverse: &BigNumber,
        product: &BigNumber,
        inverse_nonce: &BigNumber,
        product_nonce: &BigNumber,
    ) -> Self {
        Self {
            inverse: inverse.clone(),
            product: product.clone(),
            inverse_nonce: inverse_nonce.clone(),
            product_nonce: product_nonce.clone(),
        }
    }
}

impl std::fmt::Debug for ZkProofDesktopSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZkProofDesktopSecret")
            .field("inverse", &"[redacted]")
            .field("product", &"[redacted]")
            .field("inverse_nonce", &"[redacted]")
            .field("product_nonce", &"[redacted]")
            .finish()
    }
}

/// The prover's first message; recomputed by the verifier from the responses.
struct Commitments {
    inverse_commitment: BigNumber,
    inverse_mask_point: CurvePoint,
    inverse_mask_ciphertext: BigNumber,
    inverse_mask_commitment: BigNumber,
    product_commitment: BigNumber,
    product_point: CurvePoint,
    product_mask_point: CurvePoint,
    key_mask_point: CurvePoint,
    product_mask_ciphertext: BigNumber,
    product_mask_commitment: BigNumber,
}

impl Commitments {
    fn challenge(&self, input: &ZkProofDesktopInput) -> BigNumber {
        let params = &input.commitment_parameters;
        domain_hash(
            DOMAIN_LABEL,
            &[
                HashInput::Integer(input.paillier.n()),
                HashInput::Integer(input.paillier.g()),
                HashInput::Integer(params.modulus()),
                HashInput::Integer(params.g()),
                HashInput::Integer(params.h()),
                HashInput::Point(&input.ephemeral_point),
                HashInput::Point(&input.phone_ephemeral_point),
                HashInput::Point(&CurvePoint::GENERATOR),
                HashInput::Point(&input.public_key_share),
                HashInput::Integer(&input.alpha),
                HashInput::Integer(&input.beta),
                HashInput::Integer(&self.inverse_commitment),
                HashInput::Point(&self.inverse_mask_point),
                HashInput::Integer(&self.inverse_mask_ciphertext),
                HashInput::Integer(&self.inverse_mask_commitment),
                HashInput::Integer(&self.product_commitment),
                HashInput::Point(&self.product_point),
                HashInput::Point(&self.product_mask_point),
                HashInput::Point(&self.key_mask_point),
                HashInput::Integer(&self.product_mask_ciphertext),
                HashInput::Integer(&self.product_mask_commitment),
            ],
        )
    }
}

impl Proof for ZkProofDesktop {
    type CommonInput = ZkProofDesktopInput;
    type ProverSecret = ZkProofDesktopSecret;

    #[cfg_attr(feature = "flame_it", flame("ZkProofDesktop"))]
    fn prove<R: RngCore + CryptoRng>(
        rng: &mut R,
        input: &Self::CommonInput,
        secret: &Self::ProverSecret,
        helper: &ParallelHelper,
    ) -> Result<Self> {
        let q = k256_order();
        let q_cubed = pow(&q, RESPONSE_RANGE_EXPONENT);
        let params = &input.commitment_parameters;
        let n_tilde = params.modulus();
        let n = input.paillier.n();
        let nn = input.paillier.nn();
        let generator = CurvePoint::GENERATOR;

        // Masks for the plaintexts (aka `alpha`, `delta`) and their nonces (aka `beta`, `mu`)
        let inverse_mask = random_positive_bn(rng, &q_cubed);
        let inverse_nonce_mask = random_bn_in_z_star(rng, n)?;
        let product_mask = random_positive_bn(rng, &q_cubed);
        let product_nonce_mask = random_bn_in_z_star(rng, n)?;

        // Commitment randomness (aka `rho1`, `gamma`, `rho2`, `nu`)
        let inverse_randomness = random_positive_bn(rng, &(&q * n_tilde));
        let inverse_mask_randomness = random_positive_bn(rng, &(&q_cubed * n_tilde));
        let product_randomness = random_positive_bn(rng, &(&q * n_tilde));
        let product_mask_randomness = random_positive_bn(rng, &(&q_cubed * n_tilde));

        // Blinder for `Y` and its mask (aka `rho3`, `epsilon`)
        let point_blinder = random_positive_bn(rng, &q);
        let point_blinder_mask = random_positive_bn(rng, &q);

        let [inverse_commitment, inverse_mask_ciphertext, inverse_mask_commitment, product_commitment, product_mask_ciphertext, product_mask_commitment]: [BigNumber; 6] =
            helper
                .mod_pow_products(&[
                    params.commitment(&secret.inverse, &inverse_randomness),
                    input.paillier.encryption(&inverse_mask, &inverse_nonce_mask)?,
                    params.commitment(&inverse_mask, &inverse_mask_randomness),
                    params.commitment(&secret.product, &product_randomness),
                    input.paillier.encryption(&product_mask, &product_nonce_mask)?,
                    params.commitment(&product_mask, &product_mask_randomness),
                ])?
                .try_into()
                .map_err(|_| InternalError::InternalInvariantFailed)?;

        let [inverse_mask_point, product_point, product_mask_point, key_mask_point]: [CurvePoint;
            4] = helper
            .point_sums(&[
                PointSum::new().term(&inverse_mask, &input.ephemeral_point),
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
            product_point,
            product_mask_point,
            key_mask_point,
            product_mask_ciphertext,
            product_mask_commitment,
        };
        let challenge = commitments.challenge(input);

        let [inverse_nonce_response, product_nonce_response]: [BigNumber; 2] = helper
            .mod_pow_products(&[
                ModPowProduct::new(&nn)
                    .term(&secret.inverse_nonce, &challenge)
                    .term(&inverse_nonce_mask, &BigNumber::one()),
                ModPowProduct::new(&nn)
                    .term(&secret.product_nonce, &challenge)
                    .term(&product_nonce_mask, &BigNumber::one()),
            ])?
            .try_into()
            .map_err(|_| InternalError::InternalInvariantFailed)?;

        Ok(Self {
            inverse_commitment: commitments.inverse_commitment,
            product_commitment: commitments.product_commitment,
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
            product_nonce_response,
            product_randomness_response: &challenge * &product_randomness
                + &product_mask_randomness,
            challenge,
        })
    }

    #[cfg_attr(feature = "flame_it", flame("ZkProofDesktop"))]
    fn verify(&self, input: &Self::CommonInput, helper: &ParallelHelper) -> Result<()> {
        let q = k256_order();
        let q_cubed = pow(&q, RESPONSE_RANGE_EXPONENT);
        let params = &input.commitment_parameters;
        let n_tilde = params.modulus();
        let n = input.paillier.n();
        let nn = input.paillier.nn();
        let generator = CurvePoint::GENERATOR;

        // Everything that can be checked cheaply is checked before any
        // exponentiation or hashing takes place.
        let product_point = self.product_point.decode().map_err(|_| {
            error!("Desktop proof contains an invalid product point");
            InternalError::ProofFailed(String::from("product point is not a valid curve point"))
        })?;
        if !within_range(&self.inverse_response, &q_cubed) {
            error!("Desktop proof failed the bounds check on s1");
            return verify_err!("bounds check on inverse response failed");
        }
        if !within_range(&self.product_response, &q_cubed) {
            error!("Desktop proof failed the bounds check on t1");
            return verify_err!("bounds check on product response failed");
        }
        if !within_range(&self.challenge, &q) || !within_range(&self.product_point_response, &q)
        {
            return verify_err!("challenge or point response is not reduced mod q");
        }
        for value in [&self.inverse_nonce_response, &self.product_nonce_response] {
            if !is_unit(value, &nn) {
                return verify_err!("nonce response is not a unit mod N^2");
            }
        }
        for value in [&self.inverse_commitment, &self.product_commitment] {
            if !is_unit(value, n_tilde) {
                return verify_err!("commitment is not a unit mod N~");
            }
        }
        for value in [&input.alpha, &input.beta] {
            if !is_unit(value, &nn) {
                return verify_err!("ciphertext is not a unit mod N^2");
            }
        }

        let challenge = &self.challenge;
        let minus_challenge = -challenge.clone();
        let products = [
            ModPowProduct::new(&nn)
                .term(input.paillier.g(), &self.inverse_response)
                .term(&self.inverse_nonce_response, n)
                .term(&input.alpha, &minus_challenge),
            params.reopen(
                &self.inverse_response,
                &self.inverse_randomness_response,
                &self.inverse_commitment,
                challenge,
            ),
            ModPowProduct::new(&nn)
                .term(input.paillier.g(), &self.product_response)
                .term(&self.product_nonce_response, n)
                .term(&input.beta, &minus_challenge),
            params.reopen(
                &self.product_response,
                &self.product_randomness_response,
                &self.product_commitment,
                challenge,
            ),
        ];
        let sums = [
            PointSum::new()
                .term(&self.inverse_response, &input.ephemeral_point)
                .term(&minus_challenge, &input.phone_ephemeral_point),
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

        let [inverse_mask_ciphertext, inverse_mask_commitment, product_mask_ciphertext, product_mask_commitment]: [BigNumber; 4] =
            helper
                .mod_pow_products(&products)
                .map_err(|e| {
                    error!("Failed to recompute the desktop proof commitments: {e}");
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
            product_point,
            product_mask_point,
            key_mask_point,
            product_mask_ciphertext,
            product_mask_commitment,
        };
        if &commitments.challenge(input) != challenge {
            error!("Desktop proof failed the Fiat-Shamir check");
            return verify_err!("Fiat-Shamir didn't verify");
        }
        Ok(())
    }
}
