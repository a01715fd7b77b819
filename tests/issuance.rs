//! End-entity issuance against a freshly provisioned chain.

use std::time::{SystemTime, UNIX_EPOCH};

use tempfile::TempDir;
use test_authority::{
    CaConfig, CertificateAuthorityService, CertificateRequestModel, SignerProvider,
};
use x509_parser::extensions::{GeneralName, ParsedExtension};
use x509_parser::prelude::*;

fn service_in(dir: &TempDir) -> CertificateAuthorityService {
    CertificateAuthorityService::new(CaConfig {
        data_dir: Some(dir.path().to_path_buf()),
        ..CaConfig::default()
    })
}

fn leaf_request() -> CertificateRequestModel {
    CertificateRequestModel {
        common_name: "test.local".to_string(),
        hostnames: vec!["Test.LOCAL".to_string()],
        ip_addresses: vec!["10.0.0.1".to_string()],
        validity_in_days: 30,
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn subject_key_identifier(cert: &X509Certificate<'_>) -> Vec<u8> {
    cert.extensions()
        .iter()
        .find_map(|ext| match ext.parsed_extension() {
            ParsedExtension::SubjectKeyIdentifier(ski) => Some(ski.0.to_vec()),
            _ => None,
        })
        .expect("subject key identifier missing")
}

fn authority_key_identifier(cert: &X509Certificate<'_>) -> Vec<u8> {
    cert.extensions()
        .iter()
        .find_map(|ext| match ext.parsed_extension() {
            ParsedExtension::AuthorityKeyIdentifier(aki) => {
                aki.key_identifier.as_ref().map(|id| id.0.to_vec())
            }
            _ => None,
        })
        .expect("authority key identifier missing")
}

#[test]
fn issued_leaf_is_signed_by_the_intermediate() {
    let dir = TempDir::new().expect("tempdir");
    let service = service_in(&dir);

    let issued = service.issue(&leaf_request()).expect("issuance failed");

    let config = CaConfig {
        data_dir: Some(dir.path().to_path_buf()),
        ..CaConfig::default()
    };
    let chain = SignerProvider::new(config).signer_chain().expect("chain");
    let intermediate = chain.signer();

    assert_eq!(
        issued.issuer().expect("issuer"),
        intermediate.subject().expect("subject")
    );

    let leaf_der = issued.certificate_der().to_vec();
    let (_, leaf) = X509Certificate::from_der(&leaf_der).expect("parse leaf");
    let intermediate_der = intermediate.certificate_der().to_vec();
    let (_, intermediate_cert) =
        X509Certificate::from_der(&intermediate_der).expect("parse intermediate");

    // The AKI of the leaf points at the SKI of its signer.
    assert_eq!(
        authority_key_identifier(&leaf),
        subject_key_identifier(&intermediate_cert)
    );

    // End-entity, not a CA.
    let bc = leaf.basic_constraints().expect("basic constraints");
    assert!(bc.map(|ext| !ext.value.ca).unwrap_or(true));
}

#[test]
fn validity_window_is_backdated_for_clock_skew() {
    let dir = TempDir::new().expect("tempdir");
    let service = service_in(&dir);
    let issued = service.issue(&leaf_request()).expect("issuance failed");

    let der = issued.certificate_der().to_vec();
    let (_, cert) = X509Certificate::from_der(&der).expect("parse");
    let now = unix_now();
    let not_before = cert.validity().not_before.timestamp();
    let not_after = cert.validity().not_after.timestamp();

    let five_hours = 5 * 3600;
    let slack = 600;
    assert!(not_before <= now - five_hours + slack);
    assert!(not_before >= now - five_hours - slack);

    let thirty_days = 30 * 24 * 3600;
    assert!(not_after >= now + thirty_days - slack);
    assert!(not_after <= now + thirty_days + slack);
}

#[test]
fn san_entries_are_lowercased_and_complete() {
    let dir = TempDir::new().expect("tempdir");
    let service = service_in(&dir);
    let issued = service.issue(&leaf_request()).expect("issuance failed");

    let der = issued.certificate_der().to_vec();
    let (_, cert) = X509Certificate::from_der(&der).expect("parse");
    let san = cert
        .subject_alternative_name()
        .expect("san lookup")
        .expect("san missing");

    let mut dns_names = Vec::new();
    let mut ip_count = 0;
    for name in &san.value.general_names {
        match name {
            GeneralName::DNSName(dns) => dns_names.push(dns.to_string()),
            GeneralName::IPAddress(ip) => {
                assert_eq!(*ip, &[10, 0, 0, 1][..]);
                ip_count += 1;
            }
            other => panic!("unexpected SAN entry: {other:?}"),
        }
    }
    assert_eq!(dns_names, vec!["test.local".to_string()]);
    assert_eq!(ip_count, 1);
}

#[test]
fn second_request_reuses_the_persisted_chain() {
    let dir = TempDir::new().expect("tempdir");
    let service = service_in(&dir);

    let first = service.issue(&leaf_request()).expect("first issuance");
    let second = service.issue(&leaf_request()).expect("second issuance");

    assert_eq!(first.issuer().expect("issuer"), second.issuer().expect("issuer"));
    // Fresh serial and key per request.
    assert_ne!(first.serial_hex().expect("serial"), second.serial_hex().expect("serial"));
    assert_ne!(first.certificate_der(), second.certificate_der());
}

#[test]
fn requests_without_san_entries_are_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let service = service_in(&dir);
    let request = CertificateRequestModel {
        hostnames: Vec::new(),
        ip_addresses: Vec::new(),
        ..leaf_request()
    };
    assert!(matches!(
        service.issue(&request),
        Err(test_authority::CaError::Validation(_))
    ));
}
