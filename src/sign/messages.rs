// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! The four messages exchanged while signing one transaction input.
//!
//! All of them are untrusted input to the receiving device and are validated
//! before use.

use crate::{
    curve::EncodedPoint,
    zkp::{desktop::ZkProofDesktop, phone::ZkProofPhone},
};
use libpaillier::unknown_order::BigNumber;
use serde::{Deserialize, Serialize};

/// Round one, desktop to phone: encryptions of `k⁻¹` and `d·k⁻¹` under the
/// desktop's Paillier key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureParts {
    /// `Enc_D(k⁻¹)`.
    pub alpha: BigNumber,
    /// `Enc_D(d·k⁻¹ mod q)`.
    pub beta: BigNumber,
}

/// Round two, phone to desktop: the phone's nonce point `R' = k'·G`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EphemeralValueShare {
    /// `R'`.
    pub phone_ephemeral_point: EncodedPoint,
}

/// Round three, desktop to phone: the combined nonce point `R = k·R'` and the
/// desktop's proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EphemeralPublicValueWithProof {
    /// `R`.
    pub ephemeral_point: EncodedPoint,
    /// Proof that round one was computed from the nonce behind `R`.
    pub proof: ZkProofDesktop,
}

/// The phone's answer: the encrypted signature and its proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedSignatureWithProof {
    /// `sigma`, which decrypts to `s` plus a multiple of `q` under the
    /// desktop's key.
    pub encrypted_signature: BigNumber,
    /// `Enc_P(k'⁻¹)` under the phone's own key.
    pub alpha_phone: BigNumber,
    /// Proof that `sigma` was computed honestly.
    pub proof: ZkProofPhone,
}
