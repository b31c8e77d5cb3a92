// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! secp256k1 helpers: a point wrapper, the wire encoding of points, and
//! conversions between [`BigNumber`]s and curve scalars.

use crate::{
    errors::{InternalError, Result},
    utils::bn_mod,
};
use generic_array::GenericArray;
use k256::{
    elliptic_curve::{
        bigint::Encoding, group::GroupEncoding, point::AffineCoordinates, Curve, PrimeField,
    },
    AffinePoint, CompressedPoint, ProjectivePoint, Scalar,
};
use lazy_static::lazy_static;
use libpaillier::unknown_order::BigNumber;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::Debug;
use tracing::error;
use zeroize::Zeroizing;

/// Length of a compressed SEC1 point encoding.
pub(crate) const ENCODED_POINT_BYTES: usize = 33;

lazy_static! {
    static ref K256_ORDER: BigNumber = {
        let order_bytes: [u8; 32] = k256::Secp256k1::ORDER.to_be_bytes();
        BigNumber::from_slice(order_bytes)
    };
}

/// Returns the order `q` of the secp256k1 group.
pub(crate) fn k256_order() -> BigNumber {
    K256_ORDER.clone()
}

/// Converts `x` into a [`Scalar`], reducing it modulo the group order first.
/// Negative inputs are mapped to their additive inverse.
pub(crate) fn bn_to_scalar(x: &BigNumber) -> Result<Scalar> {
    let x_modded = Zeroizing::new(bn_mod(x, &K256_ORDER));
    let bytes = Zeroizing::new(x_modded.to_bytes());
    if bytes.len() > 32 {
        error!("Reduced BigNumber does not fit into 32 bytes");
        return Err(InternalError::InternalInvariantFailed);
    }
    let mut padded = Zeroizing::new(vec![0u8; 32 - bytes.len()]);
    padded.extend_from_slice(&bytes);

    Option::from(Scalar::from_repr(GenericArray::clone_from_slice(&padded))).ok_or_else(|| {
        error!("Failed to convert BigNumber into k256::Scalar");
        InternalError::CouldNotConvertToScalar
    })
}

/// A point on secp256k1.
#[derive(Eq, PartialEq, Clone, Copy)]
pub struct CurvePoint(pub(crate) ProjectivePoint);

impl CurvePoint {
    /// The standard generator `G`.
    pub const GENERATOR: Self = CurvePoint(ProjectivePoint::GENERATOR);
    /// The point at infinity.
    pub const IDENTITY: Self = CurvePoint(ProjectivePoint::IDENTITY);

    /// Computes `G · x`.
    pub(crate) fn scale_generator(x: &BigNumber) -> Result<Self> {
        Self::GENERATOR.multiply_by_bignum(x)
    }

    /// Computes `self · x`, where `x` is reduced modulo the group order.
    pub(crate) fn multiply_by_bignum(&self, x: &BigNumber) -> Result<Self> {
        let s = Zeroizing::new(bn_to_scalar(x)?);
        Ok(Self(self.0 * *s))
    }

    /// The compressed SEC1 encoding of this point.
    pub fn encode(&self) -> EncodedPoint {
        EncodedPoint(self.0.to_affine().to_bytes().to_vec())
    }

    /// The affine x-coordinate of the point, reduced modulo the group order.
    ///
    /// This is the `r` component of an ECDSA signature when applied to the
    /// nonce point.
    pub(crate) fn x_projection(&self) -> Result<BigNumber> {
        if self == &Self::IDENTITY {
            error!("Tried to take the x-projection of the identity");
            return Err(InternalError::InternalInvariantFailed);
        }
        let x = BigNumber::from_slice(self.0.to_affine().x());
        Ok(bn_mod(&x, &K256_ORDER))
    }

    /// The affine form of the point, for use with [`k256::ecdsa`] verifying
    /// keys.
    pub fn to_affine(self) -> AffinePoint {
        self.0.to_affine()
    }
}

impl Debug for CurvePoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CurvePoint").field(&self.encode()).finish()
    }
}

impl std::ops::Add for CurvePoint {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Serialize for CurvePoint {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.encode().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CurvePoint {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = EncodedPoint::deserialize(deserializer)?;
        encoded.decode().map_err(serde::de::Error::custom)
    }
}

/// A curve point as it travels between the devices: the 33-byte compressed
/// SEC1 encoding.
///
/// Received encodings are untrusted. [`EncodedPoint::decode`] is the only way
/// to turn one into a [`CurvePoint`], and it rejects anything that is not a
/// valid, non-identity point on secp256k1.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedPoint(Vec<u8>);

impl EncodedPoint {
    /// Wraps raw bytes received from the counterparty. No validation happens
    /// until [`EncodedPoint::decode`].
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// The raw encoding.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Decodes and validates the point.
    pub fn decode(&self) -> Result<CurvePoint> {
        if self.0.len() != ENCODED_POINT_BYTES {
            error!(
                "Encoded point has length {}, expected {}",
                self.0.len(),
                ENCODED_POINT_BYTES
            );
            return Err(InternalError::InvalidPoint(format!(
                "expected {} bytes, got {}",
                ENCODED_POINT_BYTES,
                self.0.len()
            )));
        }
        // Only the compressed tags; `from_bytes` would also take SEC1 compact form
        if self.0[0] != 0x02 && self.0[0] != 0x03 {
            error!("Encoded point has prefix {:#04x}", self.0[0]);
            return Err(InternalError::InvalidPoint(format!(
                "unexpected prefix byte {:#04x}",
                self.0[0]
            )));
        }
        let repr: CompressedPoint = GenericArray::clone_from_slice(&self.0);
        let point: Option<AffinePoint> = AffinePoint::from_bytes(&repr).into();
        let point = match point {
            Some(point) => CurvePoint(point.into()),
            None => {
                error!("Encoded point does not lie on secp256k1");
                return Err(InternalError::InvalidPoint(String::from(
                    "bytes do not encode a point on secp256k1",
                )));
            }
        };
        if point == CurvePoint::IDENTITY {
            error!("Encoded point is the identity");
            return Err(InternalError::InvalidPoint(String::from(
                "the identity is not a valid protocol value",
            )));
        }
        Ok(point)
    }
}

impl Debug for EncodedPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("EncodedPoint")
            .field(&hex::encode(&self.0))
            .finish()
    }
}
