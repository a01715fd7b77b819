//! Certificate build pipeline
//!
//! A strictly ordered sequence of steps folded over one mutable build
//! context. Order matters: later steps depend on state fixed by earlier
//! ones, and signing always runs last, after validation.

use std::net::IpAddr;
use std::time::{Duration, SystemTime};

use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose, IsCa,
    KeyPair, SanType, SerialNumber,
};
use rsa::pkcs8::EncodePrivateKey;
use rsa::RsaPrivateKey;
use x509_parser::prelude::*;
use zeroize::Zeroizing;

use crate::config::CaConfig;
use crate::errors::{CaError, Result};
use crate::random::RandomService;
use crate::signature::{signing_key, SignatureFactory, SigningAlgorithm};
use crate::types::{CertificateRequestModel, CertificateSignerInfo, CertificateWithKey};

const RSA_KEY_BITS: usize = 2048;

/// Clock-skew backdate for end-entity certificates.
const LEAF_SKEW: Duration = Duration::from_secs(5 * 3600);
/// Clock-skew backdate for CA certificates.
const CA_SKEW: Duration = Duration::from_secs(2 * 3600);

/// The kind of certificate being assembled; selects which extension steps
/// apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateKind {
    Root,
    Intermediate,
    EndEntity,
}

impl CertificateKind {
    fn is_ca(self) -> bool {
        matches!(self, Self::Root | Self::Intermediate)
    }
}

/// Mutable in-progress state shared by all pipeline steps.
struct BuildContext<'a> {
    request: &'a CertificateRequestModel,
    signer: Option<&'a CertificateSignerInfo>,
    kind: CertificateKind,
    algorithm: SigningAlgorithm,
    random: &'a RandomService,
    config: &'a CaConfig,
    params: CertificateParams,
    subject_key: Option<KeyPair>,
    subject_key_der: Option<Zeroizing<Vec<u8>>>,
    subject_set: bool,
    issuer_subject: Option<String>,
}

type BuildStep = fn(&mut BuildContext<'_>) -> Result<()>;

/// The fixed step order. Signing runs separately, after every step here
/// has succeeded.
const BUILD_STEPS: &[(&str, BuildStep)] = &[
    ("key_pair_generation", step_key_pair),
    ("subject", step_subject),
    ("issuer", step_issuer),
    ("serial_number", step_serial_number),
    ("validity", step_validity),
    ("subject_alternative_name", step_subject_alternative_name),
    ("basic_constraints", step_basic_constraints),
    ("extended_key_usage", step_extended_key_usage),
    ("authority_key_identifier", step_authority_key_identifier),
    ("crl_distribution_point", step_crl_distribution_point),
];

fn step_key_pair(ctx: &mut BuildContext<'_>) -> Result<()> {
    let private_key = RsaPrivateKey::new(&mut rand::rng(), RSA_KEY_BITS)
        .map_err(|e| CaError::KeyGeneration(format!("RSA key generation failed: {e}")))?;
    let pkcs8 = private_key
        .to_pkcs8_der()
        .map_err(|e| CaError::KeyGeneration(format!("private key encoding failed: {e}")))?;
    let pkcs8 = Zeroizing::new(pkcs8.as_bytes().to_vec());

    ctx.subject_key = Some(signing_key(ctx.algorithm, &pkcs8)?);
    ctx.subject_key_der = Some(pkcs8);
    Ok(())
}

fn step_subject(ctx: &mut BuildContext<'_>) -> Result<()> {
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, &ctx.request.common_name);
    ctx.params.distinguished_name = dn;
    ctx.subject_set = true;
    Ok(())
}

fn step_issuer(ctx: &mut BuildContext<'_>) -> Result<()> {
    // The issuer DN is taken from the signer certificate at signing time;
    // a self-signed certificate issues to its own subject.
    ctx.issuer_subject = Some(match ctx.signer {
        Some(info) => info.signer().subject()?,
        None => format!("CN={}", ctx.request.common_name),
    });
    Ok(())
}

fn step_serial_number(ctx: &mut BuildContext<'_>) -> Result<()> {
    ctx.params.serial_number = Some(SerialNumber::from(ctx.random.serial_number()));
    Ok(())
}

fn step_validity(ctx: &mut BuildContext<'_>) -> Result<()> {
    let skew = if ctx.kind.is_ca() { CA_SKEW } else { LEAF_SKEW };
    let now = SystemTime::now();
    ctx.params.not_before = (now - skew).into();
    ctx.params.not_after =
        (now + Duration::from_secs(u64::from(ctx.request.validity_in_days) * 24 * 3600)).into();
    Ok(())
}

fn step_subject_alternative_name(ctx: &mut BuildContext<'_>) -> Result<()> {
    if ctx.request.hostnames.is_empty() && ctx.request.ip_addresses.is_empty() {
        return Ok(());
    }

    let mut san_entries = Vec::new();
    for hostname in &ctx.request.hostnames {
        let ia5 = hostname
            .to_ascii_lowercase()
            .try_into()
            .map_err(|e| CaError::Validation(format!("invalid DNS name '{hostname}': {e}")))?;
        san_entries.push(SanType::DnsName(ia5));
    }
    for address in &ctx.request.ip_addresses {
        let ip: IpAddr = address
            .parse()
            .map_err(|e| CaError::Validation(format!("invalid IP address '{address}': {e}")))?;
        san_entries.push(SanType::IpAddress(ip));
    }
    ctx.params.subject_alt_names = san_entries;
    Ok(())
}

fn step_basic_constraints(ctx: &mut BuildContext<'_>) -> Result<()> {
    ctx.params.is_ca = if ctx.kind.is_ca() {
        IsCa::Ca(BasicConstraints::Unconstrained)
    } else {
        IsCa::ExplicitNoCa
    };
    Ok(())
}

fn step_extended_key_usage(ctx: &mut BuildContext<'_>) -> Result<()> {
    if ctx.kind == CertificateKind::EndEntity {
        ctx.params.extended_key_usages = vec![
            ExtendedKeyUsagePurpose::ServerAuth,
            ExtendedKeyUsagePurpose::ClientAuth,
        ];
    }
    Ok(())
}

fn step_authority_key_identifier(ctx: &mut BuildContext<'_>) -> Result<()> {
    // Derived from the signer's public key; a self-signed root keys the
    // extension with its own public key.
    ctx.params.use_authority_key_identifier_extension = true;
    Ok(())
}

fn step_crl_distribution_point(ctx: &mut BuildContext<'_>) -> Result<()> {
    if !ctx.kind.is_ca() {
        return Ok(());
    }
    let Some(info) = ctx.signer else {
        // Self-signed root carries no distribution point.
        return Ok(());
    };
    let uri = ctx.config.crl_distribution_url(&info.signer().serial_hex()?);
    ctx.params.crl_distribution_points = vec![rcgen::CrlDistributionPoint { uris: vec![uri] }];
    Ok(())
}

/// Build the to-be-signed structure, sign it and verify the signature
/// against the signer's public key before returning.
fn sign_and_verify(mut ctx: BuildContext<'_>) -> Result<CertificateWithKey> {
    if ctx.issuer_subject.is_none() {
        return Err(CaError::Validation("issuer is empty".to_string()));
    }
    if !ctx.subject_set {
        return Err(CaError::Validation("subject is empty".to_string()));
    }
    let subject_key = ctx
        .subject_key
        .take()
        .ok_or_else(|| CaError::Validation("public key is empty".to_string()))?;
    let subject_key_der = ctx
        .subject_key_der
        .take()
        .ok_or_else(|| CaError::Validation("key pair is empty".to_string()))?;

    let certificate = match ctx.signer {
        Some(info) => SignatureFactory::for_signer(ctx.algorithm, info.signer())?
            .sign_certificate(&ctx.params, &subject_key)?,
        None => ctx
            .params
            .self_signed(&subject_key)
            .map_err(|e| CaError::Signing(format!("self-signing failed: {e}")))?,
    };
    let certificate_der = certificate.der().as_ref().to_vec();

    // Verification failure here is an internal bug, never a normal outcome.
    let verifier_der = match ctx.signer {
        Some(info) => info.signer().certificate_der(),
        None => certificate_der.as_slice(),
    };
    let (_, issued) = X509Certificate::from_der(&certificate_der)
        .map_err(|e| CaError::CertificateParsing(e.to_string()))?;
    let (_, verifier) = X509Certificate::from_der(verifier_der)
        .map_err(|e| CaError::CertificateParsing(e.to_string()))?;
    issued
        .verify_signature(Some(verifier.public_key()))
        .map_err(|e| CaError::SignatureVerification(e.to_string()))?;

    Ok(CertificateWithKey::new(
        certificate_der,
        subject_key_der.to_vec(),
    ))
}

/// Runs the build pipeline for one certificate request.
pub struct CertificateBuilder<'a> {
    random: &'a RandomService,
    config: &'a CaConfig,
}

impl<'a> CertificateBuilder<'a> {
    pub fn new(random: &'a RandomService, config: &'a CaConfig) -> Self {
        Self { random, config }
    }

    /// Assemble and sign a certificate.
    ///
    /// `signer` is the resolved chain whose head signs the result; `None`
    /// produces a self-signed certificate. No persistence occurs here.
    pub fn build(
        &self,
        request: &CertificateRequestModel,
        signer: Option<&CertificateSignerInfo>,
        kind: CertificateKind,
    ) -> Result<CertificateWithKey> {
        let params = CertificateParams::new(Vec::<String>::new())
            .map_err(|e| CaError::Signing(format!("failed to create certificate parameters: {e}")))?;
        let mut ctx = BuildContext {
            request,
            signer,
            kind,
            algorithm: self.config.signing_algorithm,
            random: self.random,
            config: self.config,
            params,
            subject_key: None,
            subject_key_der: None,
            subject_set: false,
            issuer_subject: None,
        };

        for (name, step) in BUILD_STEPS {
            tracing::debug!("certificate build step: {}", name);
            step(&mut ctx)?;
        }
        let certificate = sign_and_verify(ctx)?;
        tracing::info!(
            "issued certificate CN={} ({:?})",
            request.common_name,
            kind
        );
        Ok(certificate)
    }
}
