// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! A list of error types which are produced during an execution of the protocol
use core::fmt::Debug;
use thiserror::Error;

use crate::sign::SignerState;

/// The default Result type used in this crate
pub type Result<T> = std::result::Result<T, InternalError>;

/// Represents an error in the manipulation of internal cryptographic data
#[derive(Clone, Eq, PartialEq, Error, Debug)]
#[allow(missing_docs)]
pub enum InternalError {
    #[error("Serialization Error")]
    Serialization,
    #[error("Received an invalid elliptic curve point: `{0}`")]
    InvalidPoint(String),
    #[error("Value outside of its permitted range: `{0}`")]
    OutOfRange(String),
    #[error("Failed to verify proof: `{0}`")]
    ProofFailed(String),
    #[error("Operation is not allowed while the signer is in state {0:?}")]
    WrongState(SignerState),
    #[error("Counterparty did not provide a message for input {0}")]
    SignatureMissing(usize),
    #[error("Counterparty sent a message for input {0}, which is not being signed")]
    UnexpectedSlot(usize),
    #[error("Message batch has {actual} slots, but the transaction has {expected} inputs")]
    BatchLengthMismatch { expected: usize, actual: usize },
    #[error("Key pair does not contain the private key required for this operation")]
    MissingPrivateKey,
    #[error("Could not find square roots modulo n")]
    NoSquareRoots,
    #[error("Elements are not coprime")]
    NotCoprime,
    #[error("Could not invert a BigNumber")]
    CouldNotInvertBigNumber,
    #[error("Failed to convert BigNumber to k256::Scalar, as BigNumber was not in [0,p)")]
    CouldNotConvertToScalar,
    #[error("Could not construct signature from provided scalars")]
    SignatureInstantiationError,
    #[error("Reached the maximum allowed number of retries")]
    RetryFailed,
    #[error("Worker pool could not be created: `{0}`")]
    WorkerPool(String),
    #[error("Transaction error: `{0}`")]
    Transaction(String),
    #[error("Function call contained invalid arguments: `{0}`")]
    InvalidArgument(String),
    #[error("Represents some code assumption that was checked at runtime but failed to be true")]
    InternalInvariantFailed,
}

impl InternalError {
    /// Returns `true` if the counterparty sent a proof that did not verify.
    ///
    /// Applications should surface these failures distinctly from ordinary
    /// errors, since they indicate a misbehaving (or compromised) device.
    pub fn is_proof_failure(&self) -> bool {
        matches!(self, InternalError::ProofFailed(_))
    }
}

macro_rules! serialize {
    ($x:expr) => {{
        bincode::serialize($x).or(Err(crate::errors::InternalError::Serialization))
    }};
}

macro_rules! deserialize {
    ($x:expr) => {{
        bincode::deserialize($x).or(Err(crate::errors::InternalError::Serialization))
    }};
}

macro_rules! verify_err {
    ($x:expr) => {{
        Err(crate::errors::InternalError::ProofFailed(String::from($x)))
    }};
}

macro_rules! arg_err {
    ($x:expr) => {{
        Err(crate::errors::InternalError::InvalidArgument(String::from(
            $x,
        )))
    }};
}

macro_rules! range_err {
    ($x:expr) => {{
        Err(crate::errors::InternalError::OutOfRange(String::from($x)))
    }};
}
