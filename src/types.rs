//! Domain models shared across the certificate authority core

use rustls_pki_types::CertificateDer;
use serde::{Deserialize, Serialize};
use x509_parser::prelude::*;
use zeroize::Zeroizing;

use crate::errors::{CaError, Result};

/// A parsed X.509 certificate together with its private key.
///
/// The certificate is held as DER, the key as PKCS#8 DER. Key material is
/// zeroized on drop and only reaches disk through the certificate store.
#[derive(Clone)]
pub struct CertificateWithKey {
    certificate: CertificateDer<'static>,
    private_key: Zeroizing<Vec<u8>>,
}

impl std::fmt::Debug for CertificateWithKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateWithKey")
            .field("certificate_len", &self.certificate.as_ref().len())
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl CertificateWithKey {
    pub fn new(certificate_der: Vec<u8>, private_key_pkcs8_der: Vec<u8>) -> Self {
        Self {
            certificate: CertificateDer::from(certificate_der),
            private_key: Zeroizing::new(private_key_pkcs8_der),
        }
    }

    /// Certificate as DER bytes.
    pub fn certificate_der(&self) -> &[u8] {
        self.certificate.as_ref()
    }

    pub(crate) fn certificate(&self) -> &CertificateDer<'static> {
        &self.certificate
    }

    /// Private key as PKCS#8 DER bytes.
    pub fn private_key_der(&self) -> &[u8] {
        &self.private_key
    }

    /// Parse the certificate for inspection.
    pub fn parse(&self) -> Result<X509Certificate<'_>> {
        let (_, cert) = X509Certificate::from_der(self.certificate.as_ref())
            .map_err(|e| CaError::CertificateParsing(e.to_string()))?;
        Ok(cert)
    }

    /// Subject distinguished name as a display string.
    pub fn subject(&self) -> Result<String> {
        Ok(self.parse()?.subject().to_string())
    }

    /// Issuer distinguished name as a display string.
    pub fn issuer(&self) -> Result<String> {
        Ok(self.parse()?.issuer().to_string())
    }

    /// Serial number in lowercase hex without leading zeros.
    pub fn serial_hex(&self) -> Result<String> {
        Ok(serial_to_hex(self.parse()?.raw_serial()))
    }
}

/// Serial bytes to the canonical lowercase hex form used in CRL URLs.
pub fn serial_to_hex(raw: &[u8]) -> String {
    let encoded = hex::encode(raw);
    let trimmed = encoded.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Ordered signer chain.
///
/// The first element signs certificates and CRLs, the last element is the
/// self-signed root. A single-element chain means the root signs end-entity
/// certificates directly.
#[derive(Debug, Clone)]
pub struct CertificateSignerInfo {
    chain: Vec<CertificateWithKey>,
}

impl CertificateSignerInfo {
    pub fn new(chain: Vec<CertificateWithKey>) -> Result<Self> {
        if chain.is_empty() {
            return Err(CaError::Validation(
                "signer chain must not be empty".to_string(),
            ));
        }
        Ok(Self { chain })
    }

    pub fn chain(&self) -> &[CertificateWithKey] {
        &self.chain
    }

    /// The active signer (head of the chain).
    pub fn signer(&self) -> &CertificateWithKey {
        &self.chain[0]
    }

    /// The self-signed root (tail of the chain).
    pub fn root(&self) -> &CertificateWithKey {
        &self.chain[self.chain.len() - 1]
    }

    /// All chain members except the root. Empty for a single-element chain.
    pub fn intermediates(&self) -> &[CertificateWithKey] {
        if self.chain.len() < 2 {
            return &[];
        }
        &self.chain[..self.chain.len() - 1]
    }

    /// Find the chain member whose serial matches the given hex form.
    pub fn find_by_serial_hex(&self, serial_hex: &str) -> Option<&CertificateWithKey> {
        let wanted = serial_hex.trim_start_matches('0').to_ascii_lowercase();
        self.chain
            .iter()
            .find(|member| member.serial_hex().map(|s| s == wanted).unwrap_or(false))
    }
}

/// Request for a new leaf certificate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateRequestModel {
    pub common_name: String,
    #[serde(default)]
    pub hostnames: Vec<String>,
    #[serde(default)]
    pub ip_addresses: Vec<String>,
    pub validity_in_days: u32,
}

/// One signed revocation list tied to one signer serial.
#[derive(Debug, Clone)]
pub struct CrlFileModel {
    der: Vec<u8>,
    signer_serial_hex: String,
}

impl CrlFileModel {
    pub fn new(der: Vec<u8>, signer_serial_hex: String) -> Self {
        Self {
            der,
            signer_serial_hex,
        }
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    pub fn signer_serial_hex(&self) -> &str {
        &self.signer_serial_hex
    }
}

/// Output format for issued certificates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Pfx,
    Pem,
}
