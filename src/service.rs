//! Certificate authority facade
//!
//! One entry point owning the signer chain, builders and converters. All
//! issuance and CRL operations go through here.

use crate::builder::{CertificateBuilder, CertificateKind, CrlBuilder};
use crate::config::CaConfig;
use crate::convert::CertificateConverterService;
use crate::errors::{CaError, Result};
use crate::random::RandomService;
use crate::signer::SignerProvider;
use crate::types::{CertificateRequestModel, CertificateWithKey, CrlFileModel, OutputFormat};

/// The certificate authority service.
pub struct CertificateAuthorityService {
    config: CaConfig,
    random: RandomService,
    signer_provider: SignerProvider,
    converter: CertificateConverterService,
}

impl CertificateAuthorityService {
    pub fn new(config: CaConfig) -> Self {
        Self {
            random: RandomService::new(),
            signer_provider: SignerProvider::new(config.clone()),
            converter: CertificateConverterService::new(config.signing_algorithm),
            config,
        }
    }

    pub fn config(&self) -> &CaConfig {
        &self.config
    }

    /// Issue an end-entity certificate signed by the intermediate.
    ///
    /// The chain is resolved (and generated when absent) on first use.
    pub fn issue(&self, request: &CertificateRequestModel) -> Result<CertificateWithKey> {
        validate_request(request)?;
        let signer_info = self.signer_provider.signer_chain()?;
        let builder = CertificateBuilder::new(&self.random, &self.config);
        builder.build(request, Some(&signer_info), CertificateKind::EndEntity)
    }

    /// Issue a certificate and serialize it in the requested output format.
    ///
    /// `password` protects PFX output and is ignored for PEM archives.
    pub fn issue_certificate(
        &self,
        request: &CertificateRequestModel,
        format: OutputFormat,
        password: &str,
    ) -> Result<Vec<u8>> {
        let certificate = self.issue(request)?;
        let signer_info = self.signer_provider.signer_chain()?;
        self.converter
            .convert(&certificate, &signer_info, format, password)
    }

    /// The root CA certificate as DER, for download endpoints.
    pub fn root_certificate_der(&self) -> Result<Vec<u8>> {
        let signer_info = self.signer_provider.signer_chain()?;
        Ok(signer_info.root().certificate_der().to_vec())
    }

    /// The default revocation list (issued for the root) as PEM text.
    pub fn default_crl_pem(&self) -> Result<Vec<u8>> {
        let signer_info = self.signer_provider.signer_chain()?;
        let crl_builder = CrlBuilder::new(self.config.signing_algorithm);
        let crl = crl_builder.generate(&signer_info, None)?;
        self.converter.crl_to_pem(&crl)
    }

    /// The revocation list for the chain member with the given hex serial.
    pub fn crl_by_serial(&self, serial_hex: &str) -> Result<CrlFileModel> {
        let signer_info = self.signer_provider.signer_chain()?;
        let crl_builder = CrlBuilder::new(self.config.signing_algorithm);
        crl_builder.generate(&signer_info, Some(serial_hex))
    }
}

fn validate_request(request: &CertificateRequestModel) -> Result<()> {
    if request.common_name.trim().is_empty() {
        return Err(CaError::Validation("common name is empty".to_string()));
    }
    if request.validity_in_days == 0 {
        return Err(CaError::Validation(
            "validity must be at least one day".to_string(),
        ));
    }
    if request.hostnames.is_empty() && request.ip_addresses.is_empty() {
        return Err(CaError::Validation(
            "at least one hostname or IP address is required".to_string(),
        ));
    }
    Ok(())
}
