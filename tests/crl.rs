//! Revocation list generation.

use tempfile::TempDir;
use test_authority::{CaConfig, CaError, CertificateAuthorityService, SignerProvider};
use x509_parser::prelude::FromDer;
use x509_parser::revocation_list::CertificateRevocationList;

fn config_in(dir: &TempDir) -> CaConfig {
    CaConfig {
        data_dir: Some(dir.path().to_path_buf()),
        ..CaConfig::default()
    }
}

fn parse_crl(der: &[u8]) -> CertificateRevocationList<'_> {
    let (_, crl) = CertificateRevocationList::from_der(der).expect("CRL parse failed");
    crl
}

#[test]
fn default_crl_is_issued_by_the_root() {
    let dir = TempDir::new().expect("tempdir");
    let service = CertificateAuthorityService::new(config_in(&dir));

    let pem_bytes = service.default_crl_pem().expect("CRL generation failed");
    let block = ::pem::parse(&pem_bytes).expect("PEM parse failed");
    assert_eq!(block.tag(), "X509 CRL");

    let chain = SignerProvider::new(config_in(&dir))
        .signer_chain()
        .expect("chain");
    let der = block.into_contents();
    let crl = parse_crl(&der);
    assert_eq!(
        crl.issuer().to_string(),
        chain.root().subject().expect("root subject")
    );
}

#[test]
fn crl_carries_the_placeholder_revocation_entry() {
    let dir = TempDir::new().expect("tempdir");
    let service = CertificateAuthorityService::new(config_in(&dir));

    let chain = SignerProvider::new(config_in(&dir))
        .signer_chain()
        .expect("chain");
    let root_serial = chain.root().serial_hex().expect("serial");
    let crl_model = service.crl_by_serial(&root_serial).expect("CRL by serial");
    assert_eq!(crl_model.signer_serial_hex(), root_serial);

    let crl = parse_crl(crl_model.der());
    let revoked: Vec<_> = crl.iter_revoked_certificates().collect();
    assert_eq!(revoked.len(), 1);
    let serial: Vec<u8> = revoked[0]
        .raw_serial()
        .iter()
        .copied()
        .skip_while(|&b| b == 0)
        .collect();
    assert_eq!(serial, vec![1]);
    assert!(revoked[0].reason_code().is_some());
}

#[test]
fn crl_validity_window_spans_a_year() {
    let dir = TempDir::new().expect("tempdir");
    let service = CertificateAuthorityService::new(config_in(&dir));

    let pem_bytes = service.default_crl_pem().expect("CRL generation failed");
    let der = ::pem::parse(&pem_bytes).expect("PEM parse").into_contents();
    let crl = parse_crl(&der);

    let this_update = crl.last_update().timestamp();
    let next_update = crl.next_update().expect("nextUpdate missing").timestamp();

    // thisUpdate backdated five hours, nextUpdate a year out.
    let window = next_update - this_update;
    let expected = (365 * 24 + 5) * 3600;
    let slack = 600;
    assert!((window - expected).abs() < slack);
}

#[test]
fn crl_for_the_intermediate_is_signed_by_the_intermediate() {
    let dir = TempDir::new().expect("tempdir");
    let service = CertificateAuthorityService::new(config_in(&dir));

    let chain = SignerProvider::new(config_in(&dir))
        .signer_chain()
        .expect("chain");
    let intermediate = chain.signer();
    let serial = intermediate.serial_hex().expect("serial");

    let crl_model = service.crl_by_serial(&serial).expect("CRL by serial");
    let crl = parse_crl(crl_model.der());
    assert_eq!(
        crl.issuer().to_string(),
        intermediate.subject().expect("subject")
    );
}

#[test]
fn unknown_signer_serial_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let service = CertificateAuthorityService::new(config_in(&dir));

    let result = service.crl_by_serial("deadbeef");
    assert!(matches!(result, Err(CaError::UnknownSigner(_))));
}
