//! Certificate and CRL build pipelines

pub mod certificate;
pub mod crl;

pub use certificate::{CertificateBuilder, CertificateKind};
pub use crl::CrlBuilder;
