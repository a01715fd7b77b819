//! PKCS#12 converter
//!
//! Bundles an issued certificate, its key and the full CA chain into one
//! password-protected container under a friendly name matching the subject.

use sha2::{Digest, Sha256};

use crate::errors::{CaError, Result};
use crate::types::{CertificateSignerInfo, CertificateWithKey};

/// Converts issued certificates into PKCS#12 containers.
#[derive(Debug, Clone, Copy, Default)]
pub struct PfxConverter;

impl PfxConverter {
    pub fn new() -> Self {
        Self
    }

    /// Serialize the certificate with its chain.
    ///
    /// The chain order is the issued certificate first, then intermediates,
    /// then the root. An empty password produces an unprotected container.
    pub fn convert(
        &self,
        certificate: &CertificateWithKey,
        signer_info: &CertificateSignerInfo,
        password: &str,
    ) -> Result<Vec<u8>> {
        let mut chain_ders = vec![certificate.certificate_der()];
        for intermediate in signer_info.intermediates() {
            chain_ders.push(intermediate.certificate_der());
        }
        chain_ders.push(signer_info.root().certificate_der());

        let certs = chain_ders
            .into_iter()
            .map(p12_keystore::Certificate::from_der)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| {
                CaError::ContainerIntegrity(format!("certificate rejected for container: {e}"))
            })?;

        let local_key_id = Sha256::digest(certificate.certificate_der()).to_vec();
        let chain = p12_keystore::PrivateKeyChain::new(
            certificate.private_key_der().to_vec(),
            &local_key_id,
            certs,
        );

        let friendly_name = certificate.subject()?;
        let mut keystore = p12_keystore::KeyStore::new();
        keystore.add_entry(
            &friendly_name,
            p12_keystore::KeyStoreEntry::PrivateKeyChain(chain),
        );
        keystore
            .writer(password)
            .write()
            .map_err(|e| CaError::ContainerIntegrity(format!("container serialization failed: {e}")))
    }
}
