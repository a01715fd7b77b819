//! # Test Authority
//!
//! Self-hosted X.509 certificate authority for development and test
//! environments. Maintains a persistent root and intermediate chain in
//! password-protected PKCS#12 containers, issues end-entity certificates
//! with SAN entries, and produces revocation lists on demand.
//!
//! ## Features
//!
//! - **Persistent CA chain** generated on first use and reloaded afterwards
//! - **End-entity issuance** with DNS and IP subject alternative names
//! - **PFX and PEM output**, the latter as a zip archive with full chain
//! - **CRL generation** per chain member with distribution point URIs
//! - **Post-sign verification** of every issued certificate
//!
//! ## Usage
//!
//! ```no_run
//! use test_authority::{
//!     CaConfig, CertificateAuthorityService, CertificateRequestModel, OutputFormat,
//! };
//!
//! let service = CertificateAuthorityService::new(CaConfig::default());
//! let request = CertificateRequestModel {
//!     common_name: "test.local".to_string(),
//!     hostnames: vec!["test.local".to_string()],
//!     ip_addresses: vec![],
//!     validity_in_days: 30,
//! };
//! let pfx = service.issue_certificate(&request, OutputFormat::Pfx, "secret")?;
//! # Ok::<(), test_authority::CaError>(())
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod builder;
pub mod config;
pub mod convert;
pub mod errors;
pub mod random;
pub mod service;
pub mod signature;
pub mod signer;
pub mod store;
pub mod types;

pub use builder::{CertificateBuilder, CertificateKind, CrlBuilder};
pub use config::CaConfig;
pub use convert::{CertificateConverterService, PfxConverter};
pub use errors::{CaError, Result};
pub use random::RandomService;
pub use service::CertificateAuthorityService;
pub use signature::SigningAlgorithm;
pub use signer::{SignerProvider, INTERMEDIATE_CERTIFICATE_NAME, ROOT_CERTIFICATE_NAME};
pub use store::PfxCertificateStore;
pub use types::{
    CertificateRequestModel, CertificateSignerInfo, CertificateWithKey, CrlFileModel, OutputFormat,
};
