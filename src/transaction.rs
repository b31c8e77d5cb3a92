// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Signing every eligible input of a transaction at once.
//!
//! Message batches are index-aligned with the transaction's inputs: slot `i`
//! carries the message for input `i`, or `None` if that input is not signed
//! jointly. An input is eligible when it still carries a placeholder
//! signature and the joint public key can spend it.

use crate::{
    curve::CurvePoint,
    errors::{InternalError, Result},
    keyshare::KeyShare,
    parallel::ParallelHelper,
    parameters::DIGEST_BYTES,
    sign::{
        DesktopSigner, EncryptedSignatureWithProof, EphemeralPublicValueWithProof,
        EphemeralValueShare, PhoneSigner, SignatureParts,
    },
};
use k256::ecdsa::Signature;
use rand::{CryptoRng, RngCore};
use std::{collections::BTreeMap, sync::Arc};
use tracing::{error, info, instrument};

/// A transaction whose inputs can be signed with the joint key.
///
/// Building, hashing and serializing transactions is left to the
/// application; this trait is all the signers need to know about them.
pub trait SignableTransaction {
    /// Number of inputs.
    fn input_count(&self) -> usize;

    /// Returns `true` if input `index` still carries a placeholder in place
    /// of its signature.
    fn has_placeholder_signature(&self, index: usize) -> Result<bool>;

    /// Returns `true` if the output spent by input `index` can be unlocked
    /// with a signature under `public_key`.
    fn is_spendable_by(&self, index: usize, public_key: &CurvePoint) -> Result<bool>;

    /// The digest to sign for input `index`.
    fn signature_hash(&self, index: usize) -> Result<[u8; DIGEST_BYTES]>;

    /// Replaces the placeholder of input `index` with `signature`.
    fn replace_placeholder_signature(&mut self, index: usize, signature: &Signature)
        -> Result<()>;
}

fn check_batch_length<T: SignableTransaction, M>(
    transaction: &T,
    batch: &[Option<M>],
) -> Result<()> {
    if batch.len() != transaction.input_count() {
        error!(
            "Received a batch of {} messages for a transaction with {} inputs",
            batch.len(),
            transaction.input_count()
        );
        return Err(InternalError::BatchLengthMismatch {
            expected: transaction.input_count(),
            actual: batch.len(),
        });
    }
    Ok(())
}

fn is_eligible<T: SignableTransaction>(
    transaction: &T,
    index: usize,
    joint_public_key: &CurvePoint,
) -> Result<bool> {
    Ok(transaction.has_placeholder_signature(index)?
        && transaction.is_spendable_by(index, joint_public_key)?)
}

/// Pairs each started signer with its slot in `batch`.
///
/// Fails if a started input has no message or a message arrives for an input
/// that was not started.
fn pair_with_signers<'a, S, M>(
    signers: &'a mut BTreeMap<usize, S>,
    batch: &'a [Option<M>],
) -> Result<Vec<(usize, &'a mut S, &'a M)>> {
    for (index, slot) in batch.iter().enumerate() {
        if slot.is_some() && !signers.contains_key(&index) {
            error!("Received a message for input {index}, which is not being signed");
            return Err(InternalError::UnexpectedSlot(index));
        }
    }
    signers
        .iter_mut()
        .map(|(&index, signer)| match batch.get(index) {
            Some(Some(message)) => Ok((index, signer, message)),
            _ => {
                error!("Missing message for input {index}");
                Err(InternalError::SignatureMissing(index))
            }
        })
        .collect()
}

/// Drives one [`DesktopSigner`] per eligible input of a transaction.
#[derive(Debug)]
pub struct DesktopTransactionSigner<T: SignableTransaction> {
    transaction: T,
    keyshare: Arc<KeyShare>,
    helper: ParallelHelper,
    joint_public_key: CurvePoint,
    signers: BTreeMap<usize, DesktopSigner>,
}

impl<T: SignableTransaction> DesktopTransactionSigner<T> {
    /// Prepares to sign `transaction` with `keyshare`.
    pub fn new(transaction: T, keyshare: Arc<KeyShare>, helper: ParallelHelper) -> Result<Self> {
        let joint_public_key = keyshare.joint_public_key()?;
        Ok(Self {
            transaction,
            keyshare,
            helper,
            joint_public_key,
            signers: BTreeMap::new(),
        })
    }

    /// Round one for every eligible input. Other slots are `None`.
    #[instrument(skip_all, err(Debug))]
    pub fn compute_signature_parts<R: RngCore + CryptoRng>(
        &mut self,
        rng: &mut R,
    ) -> Result<Vec<Option<SignatureParts>>> {
        info!("Starting signers for transaction inputs.");
        if let Some(signer) = self.signers.values().next() {
            error!("Signature parts were already computed for this transaction");
            return Err(InternalError::WrongState(signer.state()));
        }

        let mut batch = Vec::with_capacity(self.transaction.input_count());
        for index in 0..self.transaction.input_count() {
            if !is_eligible(&self.transaction, index, &self.joint_public_key)? {
                batch.push(None);
                continue;
            }
            let mut signer = DesktopSigner::new(self.keyshare.clone(), self.helper.clone());
            batch.push(Some(signer.compute_signature_parts(rng)?));
            let _ = self.signers.insert(index, signer);
        }
        info!("Started {} of {} inputs.", self.signers.len(), batch.len());
        Ok(batch)
    }

    /// Round three for every started input.
    #[instrument(skip_all, err(Debug))]
    pub fn compute_ephemeral_public_values<R: RngCore + CryptoRng>(
        &mut self,
        batch: &[Option<EphemeralValueShare>],
        rng: &mut R,
    ) -> Result<Vec<Option<EphemeralPublicValueWithProof>>> {
        check_batch_length(&self.transaction, batch)?;
        let mut output = vec![None; batch.len()];
        for (index, signer, share) in pair_with_signers(&mut self.signers, batch)? {
            output[index] = Some(signer.compute_ephemeral_public_value(share, rng)?);
        }
        Ok(output)
    }

    /// Decrypts every started input's signature and writes them into the
    /// transaction.
    ///
    /// All signatures are checked before the first placeholder is replaced,
    /// so on error the transaction is dropped unchanged.
    #[instrument(skip_all, err(Debug))]
    pub fn add_encrypted_signatures(
        mut self,
        batch: &[Option<EncryptedSignatureWithProof>],
    ) -> Result<T> {
        check_batch_length(&self.transaction, batch)?;
        let mut signatures = Vec::with_capacity(self.signers.len());
        for (index, signer, message) in pair_with_signers(&mut self.signers, batch)? {
            let hash = self.transaction.signature_hash(index)?;
            signatures.push((index, signer.decrypt_encrypted_signature(message, &hash)?));
        }
        for (index, signature) in signatures {
            self.transaction
                .replace_placeholder_signature(index, &signature)?;
        }
        Ok(self.transaction)
    }
}

/// Drives one [`PhoneSigner`] per input the desktop asked to sign.
#[derive(Debug)]
pub struct PhoneTransactionSigner<T: SignableTransaction> {
    transaction: T,
    keyshare: Arc<KeyShare>,
    helper: ParallelHelper,
    joint_public_key: CurvePoint,
    signers: BTreeMap<usize, PhoneSigner>,
}

impl<T: SignableTransaction> PhoneTransactionSigner<T> {
    /// Prepares to co-sign `transaction` with `keyshare`.
    pub fn new(transaction: T, keyshare: Arc<KeyShare>, helper: ParallelHelper) -> Result<Self> {
        let joint_public_key = keyshare.joint_public_key()?;
        Ok(Self {
            transaction,
            keyshare,
            helper,
            joint_public_key,
            signers: BTreeMap::new(),
        })
    }

    /// The transaction being signed.
    pub fn transaction(&self) -> &T {
        &self.transaction
    }

    /// Round two for every filled slot.
    ///
    /// Slots for inputs the joint key cannot spend, or that are already
    /// signed, are rejected with [`InternalError::UnexpectedSlot`].
    #[instrument(skip_all, err(Debug))]
    pub fn generate_ephemeral_value_shares<R: RngCore + CryptoRng>(
        &mut self,
        batch: &[Option<SignatureParts>],
        rng: &mut R,
    ) -> Result<Vec<Option<EphemeralValueShare>>> {
        info!("Starting signers for transaction inputs.");
        check_batch_length(&self.transaction, batch)?;
        if let Some(signer) = self.signers.values().next() {
            error!("Ephemeral value shares were already generated for this transaction");
            return Err(InternalError::WrongState(signer.state()));
        }

        let mut output = Vec::with_capacity(batch.len());
        for (index, slot) in batch.iter().enumerate() {
            let parts = match slot {
                Some(parts) => parts,
                None => {
                    output.push(None);
                    continue;
                }
            };
            if !is_eligible(&self.transaction, index, &self.joint_public_key)? {
                error!("Desktop asked to sign input {index}, which the joint key cannot sign");
                return Err(InternalError::UnexpectedSlot(index));
            }
            let mut signer = PhoneSigner::new(self.keyshare.clone(), self.helper.clone());
            output.push(Some(signer.generate_ephemeral_value_share(parts, rng)?));
            let _ = self.signers.insert(index, signer);
        }
        Ok(output)
    }

    /// Round four for every started input.
    #[instrument(skip_all, err(Debug))]
    pub fn compute_encrypted_signatures<R: RngCore + CryptoRng>(
        &mut self,
        batch: &[Option<EphemeralPublicValueWithProof>],
        rng: &mut R,
    ) -> Result<Vec<Option<EncryptedSignatureWithProof>>> {
        check_batch_length(&self.transaction, batch)?;
        let mut output = vec![None; batch.len()];
        for (index, signer, message) in pair_with_signers(&mut self.signers, batch)? {
            let hash = self.transaction.signature_hash(index)?;
            output[index] = Some(signer.compute_encrypted_signature(message, &hash, rng)?);
        }
        Ok(output)
    }
}
