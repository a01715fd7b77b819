//! Signature algorithm selection and signing factories

use rcgen::{
    CertificateParams, CertificateRevocationList, CertificateRevocationListParams, Issuer, KeyPair,
};
use rustls_pki_types::PrivatePkcs8KeyDer;
use serde::{Deserialize, Serialize};

use crate::errors::{CaError, Result};
use crate::types::CertificateWithKey;

/// The closed set of signature algorithms this authority knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SigningAlgorithm {
    /// SHA256WithRSA.
    #[default]
    Rsa,
    /// GOST R 34.10-2012. No signing primitive is available in the current
    /// crypto stack; selecting it fails at factory construction.
    Gost,
}

/// Load a signing key for the chosen algorithm from PKCS#8 DER.
pub(crate) fn signing_key(algorithm: SigningAlgorithm, pkcs8_der: &[u8]) -> Result<KeyPair> {
    match algorithm {
        SigningAlgorithm::Rsa => KeyPair::from_pkcs8_der_and_sign_algo(
            &PrivatePkcs8KeyDer::from(pkcs8_der.to_vec()),
            &rcgen::PKCS_RSA_SHA256,
        )
        .map_err(|e| CaError::KeyGeneration(format!("failed to load RSA signing key: {e}"))),
        SigningAlgorithm::Gost => Err(CaError::UnsupportedAlgorithm("GOST R 34.10-2012")),
    }
}

/// Binds a signature algorithm to a signer's private key at construction.
///
/// One factory signs both certificates and CRLs for its signer.
pub struct SignatureFactory {
    issuer: Issuer<'static, KeyPair>,
}

impl SignatureFactory {
    /// Create a factory for the given signer certificate and key.
    pub fn for_signer(algorithm: SigningAlgorithm, signer: &CertificateWithKey) -> Result<Self> {
        let key = signing_key(algorithm, signer.private_key_der())?;
        let issuer = Issuer::from_ca_cert_der(signer.certificate(), key)
            .map_err(|e| CaError::Signing(format!("failed to build issuer from signer: {e}")))?;
        Ok(Self { issuer })
    }

    /// Sign a certificate for the given subject key.
    pub fn sign_certificate(
        &self,
        params: &CertificateParams,
        subject_key: &KeyPair,
    ) -> Result<rcgen::Certificate> {
        params
            .signed_by(subject_key, &self.issuer)
            .map_err(|e| CaError::Signing(format!("certificate signing failed: {e}")))
    }

    /// Sign a revocation list.
    pub fn sign_crl(
        &self,
        params: &CertificateRevocationListParams,
    ) -> Result<CertificateRevocationList> {
        params
            .signed_by(&self.issuer)
            .map_err(|e| CaError::Signing(format!("CRL signing failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gost_is_not_available() {
        let result = signing_key(SigningAlgorithm::Gost, &[]);
        assert!(matches!(result, Err(CaError::UnsupportedAlgorithm(_))));
    }
}
