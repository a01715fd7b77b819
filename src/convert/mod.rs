//! Output format converters
//!
//! Issued certificates leave the service either as a password-protected
//! PKCS#12 container or as a zip archive of PEM files.

pub mod pem;
pub mod pfx;

pub use pem::PemConverter;
pub use pfx::PfxConverter;

use crate::errors::Result;
use crate::signature::SigningAlgorithm;
use crate::types::{CertificateSignerInfo, CertificateWithKey, CrlFileModel, OutputFormat};

/// Dispatches an issued certificate to the converter for the requested
/// output format.
pub struct CertificateConverterService {
    pem: PemConverter,
    pfx: PfxConverter,
}

impl CertificateConverterService {
    pub fn new(algorithm: SigningAlgorithm) -> Self {
        Self {
            pem: PemConverter::new(algorithm),
            pfx: PfxConverter::new(),
        }
    }

    /// Serialize an issued certificate in the requested format.
    ///
    /// The password applies to PFX output only and may be empty.
    pub fn convert(
        &self,
        certificate: &CertificateWithKey,
        signer_info: &CertificateSignerInfo,
        format: OutputFormat,
        password: &str,
    ) -> Result<Vec<u8>> {
        match format {
            OutputFormat::Pfx => self.pfx.convert(certificate, signer_info, password),
            OutputFormat::Pem => self.pem.convert(certificate, signer_info),
        }
    }

    /// Render a revocation list as PEM text.
    pub fn crl_to_pem(&self, crl: &CrlFileModel) -> Result<Vec<u8>> {
        self.pem.crl_to_pem(crl)
    }
}
