// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! End-to-end runs of the signing protocol.

use crate::{
    curve::k256_order,
    errors::{InternalError, Result},
    fixtures::{keyshares, paillier_key, DESKTOP},
    parallel::ParallelHelper,
    sign::{
        DesktopSigner, EncryptedSignatureWithProof, EphemeralPublicValueWithProof,
        EphemeralValueShare, PhoneSigner, SignatureParts, SignerState,
    },
    utils::{bit_length, random_nonzero_bn, testing::init_testing},
    zkp::{
        desktop::{ZkProofDesktop, ZkProofDesktopInput, ZkProofDesktopSecret},
        Proof,
    },
    CurvePoint,
};
use k256::ecdsa::{
    signature::{hazmat::PrehashVerifier, DigestVerifier},
    Signature, VerifyingKey,
};
use libpaillier::unknown_order::BigNumber;
use rand::rngs::StdRng;
use sha2::{Digest, Sha256};
use std::sync::Arc;

fn signers(
    desktop_share: &BigNumber,
    phone_share: &BigNumber,
) -> Result<(DesktopSigner, PhoneSigner, CurvePoint)> {
    let (desktop, phone) = keyshares(desktop_share, phone_share)?;
    let joint_public_key = desktop.joint_public_key()?;
    let helper = ParallelHelper::with_threads(0)?;
    Ok((
        DesktopSigner::new(Arc::new(desktop), helper.clone()),
        PhoneSigner::new(Arc::new(phone), helper),
        joint_public_key,
    ))
}

/// Runs all four rounds, passing every message through bincode.
fn run_protocol(
    rng: &mut StdRng,
    desktop: &mut DesktopSigner,
    phone: &mut PhoneSigner,
    message_hash: &[u8],
) -> Result<Signature> {
    fn wire<T: serde::Serialize + serde::de::DeserializeOwned>(message: &T) -> Result<T> {
        let bytes = serialize!(message)?;
        deserialize!(&bytes)
    }

    let parts: SignatureParts = wire(&desktop.compute_signature_parts(rng)?)?;
    let share: EphemeralValueShare = wire(&phone.generate_ephemeral_value_share(&parts, rng)?)?;
    let public_value: EphemeralPublicValueWithProof =
        wire(&desktop.compute_ephemeral_public_value(&share, rng)?)?;
    let encrypted: EncryptedSignatureWithProof =
        wire(&phone.compute_encrypted_signature(&public_value, message_hash, rng)?)?;
    desktop.decrypt_encrypted_signature(&encrypted, message_hash)
}

fn verifying_key(point: &CurvePoint) -> VerifyingKey {
    VerifyingKey::from_affine(point.to_affine()).unwrap()
}

#[test]
fn signature_verifies_under_the_joint_key() -> Result<()> {
    let mut rng = init_testing();
    let message = b"abcTESTMESSAGEdef";
    let hash = Sha256::digest(message);

    let (mut desktop, mut phone, joint_public_key) =
        signers(&BigNumber::one(), &BigNumber::from(2u64))?;
    assert_eq!(
        joint_public_key,
        CurvePoint::scale_generator(&BigNumber::from(2u64))?
    );

    let signature = run_protocol(&mut rng, &mut desktop, &mut phone, &hash)?;
    assert_eq!(desktop.state(), SignerState::Finished);
    assert_eq!(phone.state(), SignerState::Finished);

    let key = verifying_key(&joint_public_key);
    assert!(key
        .verify_digest(Sha256::new_with_prefix(message), &signature)
        .is_ok());
    assert!(signature.normalize_s().is_none(), "signature must be low-S");
    Ok(())
}

#[test]
fn shares_at_the_top_of_the_range_work() -> Result<()> {
    let mut rng = init_testing();
    let q = k256_order();
    let hash = Sha256::digest(b"abcTESTMESSAGEdef");

    let (mut desktop, mut phone, joint_public_key) = signers(
        &(&q - BigNumber::one()),
        &(&q - BigNumber::from(2u64)),
    )?;
    // (q-1)(q-2) = 2 mod q
    assert_eq!(
        joint_public_key,
        CurvePoint::scale_generator(&BigNumber::from(2u64))?
    );

    let signature = run_protocol(&mut rng, &mut desktop, &mut phone, &hash)?;
    assert!(verifying_key(&joint_public_key)
        .verify_prehash(&hash, &signature)
        .is_ok());
    Ok(())
}

#[test]
fn random_shares_sign_random_hashes() -> Result<()> {
    let mut rng = init_testing();
    let q = k256_order();
    for _ in 0..2 {
        let (mut desktop, mut phone, joint_public_key) = signers(
            &random_nonzero_bn(&mut rng, &q)?,
            &random_nonzero_bn(&mut rng, &q)?,
        )?;
        let hash: [u8; 32] = rand::Rng::gen(&mut rng);
        let signature = run_protocol(&mut rng, &mut desktop, &mut phone, &hash)?;
        assert!(verifying_key(&joint_public_key)
            .verify_prehash(&hash, &signature)
            .is_ok());
    }
    Ok(())
}

/// A desktop that encrypts `k⁻¹·h_benign⁻¹·h_malicious` in place of `k⁻¹`
/// would turn the phone's signature on the benign hash into one on the
/// malicious hash. The phone must refuse.
#[test]
fn phone_rejects_a_maliciously_constructed_alpha() -> Result<()> {
    let mut rng = init_testing();
    let q = k256_order();
    let benign_hash = Sha256::digest(b"---Benign Message---");
    let benign = BigNumber::from_slice(benign_hash);
    let malicious = BigNumber::from_slice(Sha256::digest(b"---Malicious Message---"));

    let (desktop_share, phone_share) = keyshares(
        &random_nonzero_bn(&mut rng, &q)?,
        &random_nonzero_bn(&mut rng, &q)?,
    )?;
    let helper = ParallelHelper::with_threads(0)?;
    let mut phone = PhoneSigner::new(Arc::new(phone_share), helper.clone());

    // The cheating desktop, step by step
    let paillier = desktop_share.own_paillier();
    let nonce = random_nonzero_bn(&mut rng, &q)?;
    let inverse = nonce
        .invert(&q)
        .ok_or(InternalError::CouldNotInvertBigNumber)?;
    let benign_inverse = benign
        .invert(&q)
        .ok_or(InternalError::CouldNotInvertBigNumber)?;
    let forged = inverse.modmul(&benign_inverse, &q).modmul(&malicious, &q);
    let product = desktop_share.private_key().modmul(&inverse, &q);
    let (alpha, inverse_nonce) = paillier.encrypt_with_rng(&mut rng, &forged)?;
    let (beta, product_nonce) = paillier.encrypt_with_rng(&mut rng, &product)?;

    let share = phone.generate_ephemeral_value_share(
        &SignatureParts {
            alpha: alpha.clone(),
            beta: beta.clone(),
        },
        &mut rng,
    )?;
    let phone_ephemeral_point = share.phone_ephemeral_point.decode()?;
    let ephemeral_point = phone_ephemeral_point.multiply_by_bignum(&nonce)?;

    // The best the desktop can do is prove with its honest witness
    let input = ZkProofDesktopInput::new(
        &alpha,
        &beta,
        &ephemeral_point,
        &phone_ephemeral_point,
        &desktop_share.public_key_share()?,
        paillier,
        desktop_share.own_commitment_parameters(),
    );
    let secret = ZkProofDesktopSecret::new(&inverse, &product, &inverse_nonce, &product_nonce);
    let proof = ZkProofDesktop::prove(&mut rng, &input, &secret, &helper)?;

    let result = phone.compute_encrypted_signature(
        &EphemeralPublicValueWithProof {
            ephemeral_point: ephemeral_point.encode(),
            proof,
        },
        &benign_hash,
        &mut rng,
    );
    assert!(result.unwrap_err().is_proof_failure());
    assert_eq!(phone.state(), SignerState::Aborted);
    Ok(())
}

/// The unblinded part of the plaintext of `sigma` is below `2q³`, which is
/// where the phone's share enters. The `q·rand` term must dwarf it whatever
/// the share.
#[test]
fn encrypted_signature_is_blinded_by_the_randomizer() -> Result<()> {
    const RUNS: usize = 3;
    let mut rng = init_testing();
    let q = k256_order();
    let q_cubed = &q * &q * &q;
    let hash = Sha256::digest(b"---Benign Message---");
    let desktop_share = random_nonzero_bn(&mut rng, &q)?;

    let unblinded_bound = &q_cubed + &q_cubed;
    let lower = &q_cubed * &q;
    let upper = &q_cubed * &q_cubed + &unblinded_bound;

    for phone_share in [BigNumber::one(), &q - BigNumber::one()] {
        for _ in 0..RUNS {
            let (mut desktop, mut phone, _) = signers(&desktop_share, &phone_share)?;
            let parts = desktop.compute_signature_parts(&mut rng)?;
            let share = phone.generate_ephemeral_value_share(&parts, &mut rng)?;
            let public_value = desktop.compute_ephemeral_public_value(&share, &mut rng)?;
            let encrypted = phone.compute_encrypted_signature(&public_value, &hash, &mut rng)?;

            let plaintext = paillier_key(DESKTOP).decrypt(&encrypted.encrypted_signature)?;
            assert!(
                plaintext > lower,
                "sigma has only {} bits",
                bit_length(&plaintext)
            );
            assert!(plaintext < upper);
        }
    }
    Ok(())
}

#[test]
fn signers_cannot_be_reused() -> Result<()> {
    let mut rng = init_testing();
    let hash = Sha256::digest(b"abcTESTMESSAGEdef");
    let (mut desktop, mut phone, _) = signers(&BigNumber::from(5u64), &BigNumber::from(6u64))?;
    let _ = run_protocol(&mut rng, &mut desktop, &mut phone, &hash)?;

    assert_eq!(
        desktop.compute_signature_parts(&mut rng).unwrap_err(),
        InternalError::WrongState(SignerState::Finished)
    );
    assert_eq!(desktop.state(), SignerState::Aborted);
    Ok(())
}
