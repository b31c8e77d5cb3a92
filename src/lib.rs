// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Two-party ECDSA signing between a desktop and a phone.
//!
//! A wallet key `d = d_desktop · d_phone mod q` on
//! [secp256k1](https://en.bitcoin.it/wiki/Secp256k1) is split between two
//! devices. Neither device learns the other's share, and a signature is
//! only produced when both cooperate. The resulting signatures are ordinary
//! ECDSA signatures under the joint public key.
//!
//! The protocol follows the two-party scheme of
//! [MacKenzie and Reiter](https://doi.org/10.1007/s10207-004-0041-0): the
//! desktop sends Paillier encryptions of its nonce inverse, the phone
//! homomorphically evaluates the signature under the desktop's key, and each
//! side proves in zero knowledge that it followed the protocol.
//!
//! # Usage
//! 1. Pair the devices once with [`PairingSetup`]; each side keeps the
//!    resulting [`KeyShare`].
//! 2. For every message hash, create a [`DesktopSigner`] and a
//!    [`PhoneSigner`] and exchange the four round messages. For transactions
//!    with several inputs, [`DesktopTransactionSigner`] and
//!    [`PhoneTransactionSigner`] run one signer per eligible input.
//!
//! This library only provides the rounds of the protocol. Transporting
//! messages between the devices is up to the application; every message
//! implements `serde`'s traits.

#![warn(missing_docs)]
#![cfg_attr(feature = "flame_it", feature(proc_macro_hygiene))]
#[cfg(feature = "flame_it")]
extern crate flame;
#[cfg(feature = "flame_it")]
#[macro_use]
extern crate flamer;

#[macro_use]
pub mod errors;

mod commitment;
mod config;
mod curve;
mod keyshare;
mod paillier;
mod pairing;
mod parallel;
mod parameters;
mod sign;
mod transaction;
mod utils;
mod zkp;

pub use commitment::BcParameters;
pub use config::ProtocolConfig;
pub use curve::{CurvePoint, EncodedPoint};
pub use keyshare::KeyShare;
pub use paillier::PaillierKeyPair;
pub use pairing::{PairingMessage, PairingSetup};
pub use parallel::{domain_hash, HashInput, ModPowProduct, ParallelHelper, PointSum};
pub use sign::{
    DesktopSigner, EncryptedSignatureWithProof, EphemeralPublicValueWithProof,
    EphemeralValueShare, PhoneSigner, SignatureParts, SignerState,
};
pub use transaction::{DesktopTransactionSigner, PhoneTransactionSigner, SignableTransaction};
pub use zkp::{
    desktop::{ZkProofDesktop, ZkProofDesktopInput, ZkProofDesktopSecret},
    init::ZkProofInit,
    phone::{ZkProofPhone, ZkProofPhoneInput, ZkProofPhoneSecret},
    Proof,
};

#[cfg(test)]
mod fixtures;
#[cfg(test)]
mod tests;
