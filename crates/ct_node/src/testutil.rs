// Copyright (c) 2025 Cloudflare, Inc.
// Licensed under the BSD-3-Clause license found in the LICENSE file or at https://opensource.org/licenses/BSD-3-Clause

//! Programmatic certificate fixtures for the unit tests. Structurally
//! valid, unsigned; nothing under test verifies signatures.

use der::asn1::{BitString, Null, OctetString};
use der::oid::db::rfc5912::ECDSA_WITH_SHA_256;
use der::oid::db::rfc6962::{CT_PRECERT_POISON, CT_PRECERT_SCTS};
use der::{Decode, Encode};
use p256::pkcs8::EncodePublicKey;
use std::str::FromStr;
use std::time::Duration;
use x509_cert::certificate::{TbsCertificate, Version};
use x509_cert::ext::Extension;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::time::{Time, Validity};
use x509_cert::Certificate;

pub fn test_cert(subject: &str, issuer: &str) -> Certificate {
    build_cert(subject, issuer, None)
}

pub fn test_cert_with_extensions(
    subject: &str,
    issuer: &str,
    extensions: Vec<Extension>,
) -> Certificate {
    build_cert(subject, issuer, Some(extensions))
}

pub fn sct_list_extension() -> Extension {
    Extension {
        extn_id: CT_PRECERT_SCTS,
        critical: false,
        extn_value: OctetString::new(vec![0x04, 0x02, 0x00, 0x00]).unwrap(),
    }
}

pub fn poison_extension() -> Extension {
    Extension {
        extn_id: CT_PRECERT_POISON,
        critical: true,
        extn_value: OctetString::new(Null.to_der().unwrap()).unwrap(),
    }
}

fn build_cert(subject: &str, issuer: &str, extensions: Option<Vec<Extension>>) -> Certificate {
    // Fixed key so fixtures are deterministic across runs.
    let secret = p256::SecretKey::from_slice(&[42u8; 32]).unwrap();
    let spki_der = secret.public_key().to_public_key_der().unwrap();
    let spki = SubjectPublicKeyInfoOwned::from_der(spki_der.as_bytes()).unwrap();
    let algorithm = AlgorithmIdentifierOwned {
        oid: ECDSA_WITH_SHA_256,
        parameters: None,
    };
    let tbs = TbsCertificate {
        version: Version::V3,
        serial_number: SerialNumber::new(&[1]).unwrap(),
        signature: algorithm.clone(),
        issuer: Name::from_str(issuer).unwrap(),
        validity: Validity {
            not_before: Time::UtcTime(
                der::asn1::UtcTime::from_unix_duration(Duration::from_secs(1_500_000_000))
                    .unwrap(),
            ),
            not_after: Time::UtcTime(
                der::asn1::UtcTime::from_unix_duration(Duration::from_secs(1_900_000_000))
                    .unwrap(),
            ),
        },
        subject: Name::from_str(subject).unwrap(),
        subject_public_key_info: spki,
        issuer_unique_id: None,
        subject_unique_id: None,
        extensions,
    };
    Certificate {
        tbs_certificate: tbs,
        signature_algorithm: algorithm,
        signature: BitString::from_bytes(&[0u8; 64]).unwrap(),
    }
}
