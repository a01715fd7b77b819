//! Signer chain provisioning
//!
//! Resolves the issuing chain on first use: load the root and intermediate
//! containers from the store, generating and persisting whichever is absent,
//! then cache the assembled chain for the life of the process.

use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::builder::{CertificateBuilder, CertificateKind};
use crate::config::CaConfig;
use crate::errors::Result;
use crate::random::RandomService;
use crate::store::PfxCertificateStore;
use crate::types::{CertificateRequestModel, CertificateSignerInfo, CertificateWithKey};

pub const ROOT_CERTIFICATE_NAME: &str = "Root";
pub const INTERMEDIATE_CERTIFICATE_NAME: &str = "intermediate";

const ROOT_VALIDITY_DAYS: u32 = 15 * 365;
const INTERMEDIATE_VALIDITY_DAYS: u32 = 10 * 365;

/// Provides the issuing chain, generating it on first use.
pub struct SignerProvider {
    store: PfxCertificateStore,
    config: CaConfig,
    random: RandomService,
    cached: Mutex<Option<Arc<CertificateSignerInfo>>>,
}

impl SignerProvider {
    pub fn new(config: CaConfig) -> Self {
        Self {
            store: PfxCertificateStore::new(config.data_dir()),
            config,
            random: RandomService::new(),
            cached: Mutex::new(None),
        }
    }

    /// The ordered signer chain: intermediate first, root last.
    ///
    /// The first call resolves or generates both CA certificates under the
    /// lock, so concurrent callers never race to create duplicate roots.
    pub fn signer_chain(&self) -> Result<Arc<CertificateSignerInfo>> {
        let mut cached = match self.cached.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(chain) = cached.as_ref() {
            return Ok(Arc::clone(chain));
        }

        let root = self.resolve_root()?;
        let intermediate = self.resolve_intermediate(&root)?;
        let chain = Arc::new(CertificateSignerInfo::new(vec![intermediate, root])?);
        *cached = Some(Arc::clone(&chain));
        Ok(chain)
    }

    fn resolve_root(&self) -> Result<CertificateWithKey> {
        if let Some(root) = self
            .store
            .try_get(ROOT_CERTIFICATE_NAME, &self.config.store_password)?
        {
            tracing::info!("loaded root certificate from store");
            return Ok(root);
        }

        tracing::info!("no root certificate found, generating a new one");
        let request = ca_request(
            format!("Test Authority {}", Utc::now().format("%m/%Y")),
            ROOT_VALIDITY_DAYS,
        );
        let builder = CertificateBuilder::new(&self.random, &self.config);
        let root = builder.build(&request, None, CertificateKind::Root)?;
        self.store
            .save(ROOT_CERTIFICATE_NAME, &root, &self.config.store_password)?;
        Ok(root)
    }

    fn resolve_intermediate(&self, root: &CertificateWithKey) -> Result<CertificateWithKey> {
        if let Some(intermediate) = self
            .store
            .try_get(INTERMEDIATE_CERTIFICATE_NAME, &self.config.store_password)?
        {
            tracing::info!("loaded intermediate certificate from store");
            return Ok(intermediate);
        }

        tracing::info!("no intermediate certificate found, generating a new one");
        let request = ca_request(
            format!("Intermediate Test Authority {}", Utc::now().format("%m/%Y")),
            INTERMEDIATE_VALIDITY_DAYS,
        );
        let root_chain = CertificateSignerInfo::new(vec![root.clone()])?;
        let builder = CertificateBuilder::new(&self.random, &self.config);
        let intermediate = builder.build(
            &request,
            Some(&root_chain),
            CertificateKind::Intermediate,
        )?;
        self.store.save(
            INTERMEDIATE_CERTIFICATE_NAME,
            &intermediate,
            &self.config.store_password,
        )?;
        Ok(intermediate)
    }
}

fn ca_request(common_name: String, validity_in_days: u32) -> CertificateRequestModel {
    CertificateRequestModel {
        common_name,
        hostnames: Vec::new(),
        ip_addresses: Vec::new(),
        validity_in_days,
    }
}
