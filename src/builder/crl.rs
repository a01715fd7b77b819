//! CRL build pipeline

use std::time::{Duration, SystemTime};

use chrono::{Datelike, Timelike, Utc};
use rcgen::{
    CertificateRevocationListParams, KeyIdMethod, RevocationReason, RevokedCertParams, SerialNumber,
};

use crate::errors::{CaError, Result};
use crate::signature::{SignatureFactory, SigningAlgorithm};
use crate::types::{CertificateSignerInfo, CrlFileModel};

/// Backdate applied to thisUpdate for clock-skew tolerance.
const THIS_UPDATE_SKEW: Duration = Duration::from_secs(5 * 3600);
/// CRLs are reissued on demand; nextUpdate is set a year out.
const NEXT_UPDATE_WINDOW: Duration = Duration::from_secs(365 * 24 * 3600);

/// Builds and signs revocation lists for a chosen signer.
#[derive(Debug, Clone, Copy)]
pub struct CrlBuilder {
    algorithm: SigningAlgorithm,
}

impl CrlBuilder {
    pub fn new(algorithm: SigningAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Generate a signed CRL for the chain member with the given hex serial,
    /// or for the chain's last element (the root) when no serial is given.
    ///
    /// An unknown serial is an error; no CRL is fabricated for a signer
    /// outside the chain.
    pub fn generate(
        &self,
        signer_info: &CertificateSignerInfo,
        serial_hex: Option<&str>,
    ) -> Result<CrlFileModel> {
        let target = match serial_hex {
            None => signer_info.root(),
            Some(serial) => signer_info
                .find_by_serial_hex(serial)
                .ok_or_else(|| CaError::UnknownSigner(serial.to_string()))?,
        };
        let target_serial = target.serial_hex()?;

        let now = SystemTime::now();
        let params = CertificateRevocationListParams {
            this_update: (now - THIS_UPDATE_SKEW).into(),
            next_update: (now + NEXT_UPDATE_WINDOW).into(),
            crl_number: SerialNumber::from(timestamp_crl_number()),
            issuing_distribution_point: None,
            // Placeholder entry: no revocation record exists yet, so the
            // list is structurally correct but contentless.
            revoked_certs: vec![RevokedCertParams {
                serial_number: SerialNumber::from(vec![1u8]),
                revocation_time: now.into(),
                reason_code: Some(RevocationReason::PrivilegeWithdrawn),
                invalidity_date: None,
            }],
            key_identifier_method: KeyIdMethod::Sha256,
        };

        let factory = SignatureFactory::for_signer(self.algorithm, target)?;
        let crl = factory.sign_crl(&params)?;
        tracing::info!("generated CRL for signer serial {}", target_serial);
        Ok(CrlFileModel::new(crl.der().as_ref().to_vec(), target_serial))
    }
}

/// CRL number derived from the current timestamp (yyyyMMddHHmm), monotonic
/// for calls spaced a minute or more apart.
fn timestamp_crl_number() -> Vec<u8> {
    let now = Utc::now();
    let stamp: u64 = u64::from(now.year() as u32) * 100_000_000
        + u64::from(now.month()) * 1_000_000
        + u64::from(now.day()) * 10_000
        + u64::from(now.hour()) * 100
        + u64::from(now.minute());
    let bytes = stamp.to_be_bytes();
    let start = bytes
        .iter()
        .position(|&b| b != 0)
        .unwrap_or(bytes.len() - 1);
    bytes[start..].to_vec()
}
