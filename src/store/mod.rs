//! Persistent PKCS#12 certificate store
//!
//! Each named container is one password-protected PFX file on disk holding
//! a certificate and its private key. Writes are atomic so a crash never
//! leaves a half-written container behind.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::errors::{CaError, Result};
use crate::types::CertificateWithKey;

const PFX_EXTENSION: &str = "pfx";

/// Filesystem-backed store for CA certificate containers.
#[derive(Debug, Clone)]
pub struct PfxCertificateStore {
    directory: PathBuf,
}

impl PfxCertificateStore {
    pub fn new<P: Into<PathBuf>>(directory: P) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn container_path(&self, name: &str) -> PathBuf {
        self.directory.join(name).with_extension(PFX_EXTENSION)
    }

    /// Load a container by name.
    ///
    /// A missing file is `Ok(None)`; the caller decides whether to generate
    /// a fresh certificate. A file that exists but cannot be opened with the
    /// given password, or holds no key entry, is an integrity failure.
    pub fn try_get(&self, name: &str, password: &str) -> Result<Option<CertificateWithKey>> {
        let path = self.container_path(name);
        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let keystore = p12_keystore::KeyStore::from_pkcs12(&data, password).map_err(|e| {
            tracing::warn!("container {} exists but cannot be opened", path.display());
            CaError::ContainerIntegrity(format!(
                "failed to open container '{name}' at {}: {e}",
                path.display()
            ))
        })?;

        for (_alias, entry) in keystore.entries() {
            if let p12_keystore::KeyStoreEntry::PrivateKeyChain(chain) = entry {
                let certificate = chain.chain().first().ok_or_else(|| {
                    CaError::ContainerIntegrity(format!(
                        "container '{name}' holds a key without a certificate"
                    ))
                })?;
                return Ok(Some(CertificateWithKey::new(
                    certificate.as_der().to_vec(),
                    chain.key().to_vec(),
                )));
            }
        }
        Err(CaError::ContainerIntegrity(format!(
            "container '{name}' holds no private key entry"
        )))
    }

    /// Persist a certificate and key under the given container name.
    pub fn save(&self, name: &str, certificate: &CertificateWithKey, password: &str) -> Result<()> {
        std::fs::create_dir_all(&self.directory)?;

        let cert = p12_keystore::Certificate::from_der(certificate.certificate_der())
            .map_err(|e| CaError::ContainerIntegrity(format!("certificate rejected: {e}")))?;
        let local_key_id = Sha256::digest(certificate.certificate_der()).to_vec();
        let chain = p12_keystore::PrivateKeyChain::new(
            certificate.private_key_der().to_vec(),
            &local_key_id,
            vec![cert],
        );

        let alias = certificate.subject()?;
        let mut keystore = p12_keystore::KeyStore::new();
        keystore.add_entry(&alias, p12_keystore::KeyStoreEntry::PrivateKeyChain(chain));
        let data = keystore.writer(password).write().map_err(|e| {
            CaError::ContainerIntegrity(format!("failed to serialize container '{name}': {e}"))
        })?;

        let path = self.container_path(name);
        let tmp = path.with_extension("pfx.tmp");
        std::fs::write(&tmp, &data)?;
        std::fs::rename(&tmp, &path)?;
        tracing::info!("saved certificate container {}", path.display());
        Ok(())
    }
}
