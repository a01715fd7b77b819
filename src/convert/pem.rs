//! PEM archive converter
//!
//! Packs an issued certificate, its key, the CA chain and a fresh CRL per
//! chain member into a single zip archive of PEM files.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::builder::CrlBuilder;
use crate::errors::{CaError, Result};
use crate::signature::SigningAlgorithm;
use crate::types::{CertificateSignerInfo, CertificateWithKey, CrlFileModel};

pub(crate) const CERTIFICATE_TAG: &str = "CERTIFICATE";
pub(crate) const PRIVATE_KEY_TAG: &str = "PRIVATE KEY";
pub(crate) const CRL_TAG: &str = "X509 CRL";

/// Encode DER bytes as a single PEM block.
pub(crate) fn encode_pem(tag: &str, der: &[u8]) -> Result<String> {
    let block = ::pem::Pem::new(tag, der.to_vec());
    let encoded = ::pem::encode(&block);
    if encoded.trim().is_empty() {
        return Err(CaError::PemEncoding(tag.to_string()));
    }
    Ok(encoded)
}

/// Converts issued certificates into PEM zip archives.
pub struct PemConverter {
    crl_builder: CrlBuilder,
}

impl PemConverter {
    pub fn new(algorithm: SigningAlgorithm) -> Self {
        Self {
            crl_builder: CrlBuilder::new(algorithm),
        }
    }

    /// Build the archive for one issued certificate.
    ///
    /// Entries: `root.crt`, `private.key`, `certificate.crt`, one
    /// `crl_{index}.crl` per chain member, `intermediate_{index}.crt` per
    /// intermediate (1-based) and `fullchain.crt` holding the certificate
    /// followed by the intermediates.
    pub fn convert(
        &self,
        certificate: &CertificateWithKey,
        signer_info: &CertificateSignerInfo,
    ) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        write_entry(
            &mut writer,
            options,
            "root.crt",
            &encode_pem(CERTIFICATE_TAG, signer_info.root().certificate_der())?,
        )?;
        write_entry(
            &mut writer,
            options,
            "private.key",
            &encode_pem(PRIVATE_KEY_TAG, certificate.private_key_der())?,
        )?;
        write_entry(
            &mut writer,
            options,
            "certificate.crt",
            &encode_pem(CERTIFICATE_TAG, certificate.certificate_der())?,
        )?;

        for (index, member) in signer_info.chain().iter().enumerate() {
            let crl = self
                .crl_builder
                .generate(signer_info, Some(&member.serial_hex()?))?;
            write_entry(
                &mut writer,
                options,
                &format!("crl_{index}.crl"),
                &encode_pem(CRL_TAG, crl.der())?,
            )?;
        }

        for (index, intermediate) in signer_info.intermediates().iter().enumerate() {
            write_entry(
                &mut writer,
                options,
                &format!("intermediate_{}.crt", index + 1),
                &encode_pem(CERTIFICATE_TAG, intermediate.certificate_der())?,
            )?;
        }

        let mut fullchain = encode_pem(CERTIFICATE_TAG, certificate.certificate_der())?;
        for intermediate in signer_info.intermediates() {
            fullchain.push_str(&encode_pem(CERTIFICATE_TAG, intermediate.certificate_der())?);
        }
        write_entry(&mut writer, options, "fullchain.crt", &fullchain)?;

        let cursor = writer
            .finish()
            .map_err(|e| CaError::Archive(format!("failed to finish archive: {e}")))?;
        Ok(cursor.into_inner())
    }

    /// Render a revocation list as PEM text.
    pub fn crl_to_pem(&self, crl: &CrlFileModel) -> Result<Vec<u8>> {
        Ok(encode_pem(CRL_TAG, crl.der())?.into_bytes())
    }
}

fn write_entry(
    writer: &mut ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
    name: &str,
    content: &str,
) -> Result<()> {
    writer
        .start_file(name, options)
        .map_err(|e| CaError::Archive(format!("failed to start entry '{name}': {e}")))?;
    writer
        .write_all(content.as_bytes())
        .map_err(|e| CaError::Archive(format!("failed to write entry '{name}': {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pem_block_carries_tag() {
        let encoded = encode_pem(CERTIFICATE_TAG, &[0x30, 0x03, 0x02, 0x01, 0x01])
            .expect("encoding failed");
        assert!(encoded.starts_with("-----BEGIN CERTIFICATE-----"));
        assert!(encoded.trim_end().ends_with("-----END CERTIFICATE-----"));
    }
}
