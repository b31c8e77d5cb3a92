// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Signing a single message hash.
//!
//! A [`DesktopSigner`] and a [`PhoneSigner`] exchange four messages:
//!
//! | Round | Direction        | Message                              |
//! |-------|------------------|--------------------------------------|
//! | 1     | desktop → phone  | [`SignatureParts`]                   |
//! | 2     | phone → desktop  | [`EphemeralValueShare`]              |
//! | 3     | desktop → phone  | [`EphemeralPublicValueWithProof`]    |
//! | 4     | phone → desktop  | [`EncryptedSignatureWithProof`]      |
//!
//! after which the desktop holds an ordinary ECDSA signature under the joint
//! public key. Each signer is a state machine that is used for exactly one
//! signature. Any failure, including a call made out of order, aborts it for
//! good.

mod desktop;
mod messages;
mod phone;

pub use desktop::DesktopSigner;
pub use messages::{
    EncryptedSignatureWithProof, EphemeralPublicValueWithProof, EphemeralValueShare,
    SignatureParts,
};
pub use phone::PhoneSigner;

use crate::{
    curve::k256_order,
    errors::Result,
    parameters::DIGEST_BYTES,
    utils::bn_mod,
};
use libpaillier::unknown_order::BigNumber;
use tracing::error;

/// Where a signer is in the protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignerState {
    /// Waiting for round one. Desktop: nothing sent yet. Phone: waiting for
    /// [`SignatureParts`].
    AwaitSignatureParts,
    /// Desktop only: waiting for the phone's [`EphemeralValueShare`].
    AwaitEphemeralValue,
    /// Phone only: waiting for the desktop's
    /// [`EphemeralPublicValueWithProof`].
    AwaitEphemeralPublicValue,
    /// Desktop only: waiting for the phone's [`EncryptedSignatureWithProof`].
    AwaitDecryption,
    /// The signer produced its last output.
    Finished,
    /// The signer failed and cannot be used any more.
    Aborted,
}

/// Interprets a message digest as a big-endian integer modulo `q`.
fn message_hash_to_bn(message_hash: &[u8]) -> Result<BigNumber> {
    if message_hash.len() != DIGEST_BYTES {
        error!(
            "Message hash has {} bytes, expected {}",
            message_hash.len(),
            DIGEST_BYTES
        );
        return arg_err!("message hash must be a 32-byte digest");
    }
    Ok(bn_mod(&BigNumber::from_slice(message_hash), &k256_order()))
}
