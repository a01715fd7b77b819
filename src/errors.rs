//! Error types for the certificate authority core

/// Errors produced by the certificate authority core.
///
/// Every pipeline step either fully succeeds or aborts the request with one
/// of these; partial certificates are never returned to a caller.
#[derive(Debug, thiserror::Error)]
pub enum CaError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("certificate container integrity failure: {0}")]
    ContainerIntegrity(String),
    #[error("certificate parsing failed: {0}")]
    CertificateParsing(String),
    #[error("key generation failed: {0}")]
    KeyGeneration(String),
    #[error("signing failed: {0}")]
    Signing(String),
    #[error("post-sign verification failed: {0}")]
    SignatureVerification(String),
    #[error("PEM encoding produced no output for {0}")]
    PemEncoding(String),
    #[error("no signer with serial {0} in the certificate chain")]
    UnknownSigner(String),
    #[error("signature algorithm not available: {0}")]
    UnsupportedAlgorithm(&'static str),
    #[error("archive assembly failed: {0}")]
    Archive(String),
}

pub type Result<T> = std::result::Result<T, CaError>;
