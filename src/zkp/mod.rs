// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2023 Bolt Labs, Inc.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Implements a trait for zero-knowledge proofs.
//!
//! In more detail, this module provides a trait [`Proof`] for constructing a
//! (non-interactive) zero knowledge proof. The trait provides two methods,
//! [`Proof::prove`] and [`Proof::verify`]. The former builds a proof and the
//! latter verifies the proof was constructed correctly.
//!
//! The two signing proofs ([`desktop::ZkProofDesktop`] and
//! [`phone::ZkProofPhone`]) implement the trait. The pairing-time proof
//! [`init::ZkProofInit`] needs neither randomness nor a worker pool and only
//! offers inherent methods.

pub mod desktop;
pub mod init;
pub mod phone;

use crate::{errors::Result, parallel::ParallelHelper};
use rand::{CryptoRng, RngCore};
use serde::{de::DeserializeOwned, Serialize};

/// A trait for constructing zero knowledge proofs.
///
/// The associated type [`Proof::CommonInput`] denotes the data known the both
/// the prover and verifier, and the associated type [`Proof::ProverSecret`]
/// denotes the data known only to the prover.
pub trait Proof: Sized + Serialize + DeserializeOwned {
    /// Statement known to both parties.
    type CommonInput;
    /// Witness known only to the prover.
    type ProverSecret;

    /// Constructs a zero knowledge proof over [`Proof::ProverSecret`] and
    /// [`Proof::CommonInput`], evaluating the expensive products on `helper`.
    fn prove<R: RngCore + CryptoRng>(
        rng: &mut R,
        input: &Self::CommonInput,
        secret: &Self::ProverSecret,
        helper: &ParallelHelper,
    ) -> Result<Self>;

    /// Verifies a zero knowledge proof using the provided
    /// [`Proof::CommonInput`].
    ///
    /// Returns [`InternalError::ProofFailed`](crate::errors::InternalError::ProofFailed)
    /// if the proof does not convince the verifier.
    fn verify(&self, input: &Self::CommonInput, helper: &ParallelHelper) -> Result<()>;
}
