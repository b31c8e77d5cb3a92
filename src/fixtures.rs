// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Pre-generated primes for tests.
//!
//! Generating protocol-size safe primes takes minutes, so the tests build
//! their Paillier keys and commitment parameters from these instead. Index 0
//! belongs to the desktop and index 1 to the phone.

use crate::{
    commitment::BcParameters,
    errors::Result,
    keyshare::KeyShare,
    paillier::PaillierKeyPair,
};
use lazy_static::lazy_static;
use libpaillier::unknown_order::BigNumber;
use rand::rngs::OsRng;

/// 1024-bit safe primes, each congruent to 3 mod 4.
const SAFE_PRIMES: [&str; 4] = [
    "\
        844767c92b767befb7fb0ea4c3364efb9bede0910e8701146adb831941662540\
        c02485855ee45e0881fb53a3d2f0c068d560dee3132959a84792fc80b053db98\
        655d702376fafaceb302ff626d7e6d49e88432f96e58de733f055505b2a210f0\
        0763c9fc1bbd1a6f82a0be7cb2c506021081c809625e79b81e5a7bdf5056e6ab\
    ",
    "\
        9f0fa6f01421347b5f069aa274a458caa26353f6bde556481458726cace03c6e\
        6b8916398ae82d22ba71c05a1424b293da3e99e30de7da8920f21b6549e19531\
        e3bf26d561a292632192835cb945eb170fe2ac5e5aa2e6726a44804708818760\
        6e0ec752d4fa3100d25b417624ffc3bbfc69f7c26927f1b6c1235b43cca34b6b\
    ",
    "\
        c73d347f1e0087da6f4d1ecf436f9bedcca596ed1d9656f6c35fa25a7b02aec6\
        cfaf957217413a286a83a4150fbd165b821065d0855aad5b18b2e88a91127b18\
        ab5184260edc71c3d2567f143bd8e389ad5573e2d534e721d73b0a41ee53be29\
        ba13751f535317a105b4a298b0b1de931713f55efe83e52c0913b75608f8245f\
    ",
    "\
        94ead1de884b2f4919ad14266957f29cc02ef21b0d08ab28810f21d4d89c1090\
        cb5d34ecfd4c93a247b274f5fc5392e48d856b20a787da16a23fece1eb28c06f\
        05787af0359f7a017a708272866d8dce27a0fbdefbaf4a344371725fa704715b\
        b4e3dc86adf66daa7fb8716d16260fa7fa711d99e2be4196a860a623718d6c8b\
    ",
];

/// 1281-bit primes; a product of two of them is a 2561 or 2562-bit Paillier
/// modulus.
const PAILLIER_PRIMES: [&str; 4] = [
    "\
        016935d1e193b3e06cd441c94816dcba6e2c888b7e04a702db46117f442aca13c\
        5c2d6499e7e6c327e452ac1353399f1977a9dceead60419c71132bda4cc59b01\
        f4bbba1ae3fed0430170c4f564005141cdb5e2f7e40fdc78df8111eb7cfe8b7d\
        05e577b57e367850a4154050187273fae14dc929c31f5719fa8734b34ecf60c3\
        d5c0ea2c76f2bcef78edafeec5bf2f90cad2bea775b853064dc5768ec2f1f24a\
        5\
    ",
    "\
        01ef89af59a32d49a4c5705db520e25d1bc6b9a107003fddab6d17866de77ee7e\
        b182ec562e0434916582260999518ff40fb5944d89098a796068b1595c4eacfd\
        c703284b4ab1eeeb59e9bdb0eb017edf6e095e2415d8b42f0b891fc5bbd0e4b2\
        8dc8e1ac7eb17dfaa409d3e30d8e5d98e315c96adf08275c2296847eff818ff5\
        d12d6eaf387de7486214480589e55c7f7e168add4c260f459f9335586b6786f8\
        b\
    ",
    "\
        012fb0051dfb5060d324ce0592fff65c00c2b3eb69126adb2b0a5e211eeb7b085\
        6c0d7c62541260eb717b77eaf1871f6fd0645f847b1f7dd96f4543d7cf526daa\
        ac035ab662aa9a10ca0c952807dfd2acb130f3b0bbd068023388dc9f132bce03\
        6de979692719b4c6ca50032f484cb2eeaee9ce59fd90311a3adf7f8262067d16\
        e8dbc43cfe89137b548b89d7f41b9c374ebed75707a9b964c6e15b7b901c7419\
        7\
    ",
    "\
        0100416d00b58aa5c9cb48069bea39e78cb043566fd9c37cfbcb1fc00c9317c6c\
        5ab77d5dd5afce964a6d6ce668d74af14ce13e5da46e52505976182b07000862\
        be16eeba02dca3b131d715b316406992cf6846bd0f23113a29501a9b0c9dbc14\
        b02649500df6bb442bd859ad0d6dc6e0ac0aa6783120c40ea639589032aad4d9\
        0c9210b5f5ddce0126b24c45729909cb031e3e9ca9e82f39c3d9b2d62478becf\
        9\
    ",
];

pub(crate) const DESKTOP: usize = 0;
pub(crate) const PHONE: usize = 1;

pub(crate) fn hex_bn(hex_str: &str) -> BigNumber {
    BigNumber::from_slice(hex::decode(hex_str).unwrap())
}

lazy_static! {
    static ref PAILLIER_KEYS: Vec<PaillierKeyPair> = PAILLIER_PRIMES
        .chunks(2)
        .map(|pair| {
            PaillierKeyPair::from_primes(&mut OsRng, &hex_bn(pair[0]), &hex_bn(pair[1])).unwrap()
        })
        .collect();
    static ref COMMITMENT_PARAMETERS: Vec<BcParameters> = SAFE_PRIMES
        .chunks(2)
        .map(|pair| {
            BcParameters::from_safe_primes(&mut OsRng, &hex_bn(pair[0]), &hex_bn(pair[1]))
                .unwrap()
        })
        .collect();
}

/// A Paillier key pair (with private key) for `DESKTOP` or `PHONE`.
pub(crate) fn paillier_key(index: usize) -> PaillierKeyPair {
    PAILLIER_KEYS[index].clone()
}

/// Commitment parameters (with factorization) for `DESKTOP` or `PHONE`.
pub(crate) fn commitment_parameters(index: usize) -> BcParameters {
    COMMITMENT_PARAMETERS[index].clone()
}

/// The safe primes behind `commitment_parameters(index)`.
pub(crate) fn safe_primes(index: usize) -> (BigNumber, BigNumber) {
    (
        hex_bn(SAFE_PRIMES[2 * index]),
        hex_bn(SAFE_PRIMES[2 * index + 1]),
    )
}

/// The primes behind `paillier_key(index)`.
pub(crate) fn paillier_primes(index: usize) -> (BigNumber, BigNumber) {
    (
        hex_bn(PAILLIER_PRIMES[2 * index]),
        hex_bn(PAILLIER_PRIMES[2 * index + 1]),
    )
}

/// Key shares for both devices, as they would hold them after pairing.
pub(crate) fn keyshares(
    desktop_share: &BigNumber,
    phone_share: &BigNumber,
) -> Result<(KeyShare, KeyShare)> {
    let desktop_paillier = paillier_key(DESKTOP);
    let phone_paillier = paillier_key(PHONE);
    let desktop_params = commitment_parameters(DESKTOP);
    let phone_params = commitment_parameters(PHONE);

    let desktop = KeyShare::new(
        desktop_share.clone(),
        crate::curve::CurvePoint::scale_generator(phone_share)?,
        desktop_paillier.clone(),
        phone_paillier.public_only(),
        desktop_params.clone(),
        phone_params.clear_private(),
    )?;
    let phone = KeyShare::new(
        phone_share.clone(),
        crate::curve::CurvePoint::scale_generator(desktop_share)?,
        phone_paillier,
        desktop_paillier.public_only(),
        phone_params,
        desktop_params.clear_private(),
    )?;
    Ok((desktop, phone))
}
