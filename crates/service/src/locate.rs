//! The file locator: resolve a content hash to a downloadable location.
//!
//! Consults the two-tier resolution cache, then the primary store, then
//! the optional fallback store. Negative results are never cached, so
//! every absence re-probes the stores.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use common::content::{resolution_cache_key, ContentLocator};
use common::records::{ResolutionRecord, StoreOrigin};
use object_store::{SignedUrlOperation, Storage, UrlSigner};

use crate::cache::ResolutionCache;

/// Outcome of a locate call.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found {
        record: ResolutionRecord,
        cache_hit: bool,
    },
    NotFound,
}

impl Resolution {
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found { .. })
    }
}

pub struct Locator {
    primary: Storage,
    fallback: Option<Storage>,
    signer: Arc<dyn UrlSigner>,
    cache: ResolutionCache,
    signed_url_expiry: Duration,
}

impl Locator {
    pub fn new(
        primary: Storage,
        fallback: Option<Storage>,
        signer: Arc<dyn UrlSigner>,
        cache: ResolutionCache,
        signed_url_expiry: Duration,
    ) -> Self {
        Self {
            primary,
            fallback,
            signer,
            cache,
            signed_url_expiry,
        }
    }

    /// Resolve `content` to a location.
    ///
    /// Upstream failures (store probe, URL signing) degrade to "absent at
    /// that tier" rather than failing the lookup.
    pub async fn locate(&self, content: &ContentLocator, allow_fallback: bool) -> Resolution {
        let object_key = content.object_key();
        let cache_key = resolution_cache_key(self.primary.uri(), &object_key);

        if let Some(record) = self.cache.get(&cache_key).await {
            // A fallback-origin hit must not satisfy a lookup that
            // disallows fallback; re-probe instead.
            if record.store_origin == StoreOrigin::Fallback && !allow_fallback {
                tracing::debug!(
                    key = %object_key,
                    "ignoring fallback-origin cache hit for fallback-disallowed lookup"
                );
            } else {
                return Resolution::Found {
                    record,
                    cache_hit: true,
                };
            }
        }

        if let Some(resolution) = self
            .probe(&self.primary, StoreOrigin::Primary, &object_key, &cache_key)
            .await
        {
            return resolution;
        }

        if allow_fallback {
            if let Some(fallback) = &self.fallback {
                if let Some(resolution) = self
                    .probe(fallback, StoreOrigin::Fallback, &object_key, &cache_key)
                    .await
                {
                    return resolution;
                }
            }
        }

        Resolution::NotFound
    }

    /// Probe one store tier. `None` means "absent at this tier" (whether
    /// truly absent, unreachable, or unsignable) and the caller moves on.
    async fn probe(
        &self,
        store: &Storage,
        origin: StoreOrigin,
        object_key: &str,
        cache_key: &str,
    ) -> Option<Resolution> {
        let head = match store.head(object_key).await {
            Ok(head) => head,
            Err(e) => {
                tracing::warn!(
                    key = %object_key,
                    origin = ?origin,
                    error = %e,
                    "store probe failed, treating as absent"
                );
                None
            }
        }?;

        let signed_url = match self
            .signer
            .sign(SignedUrlOperation::Get, object_key, self.signed_url_expiry)
            .await
        {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(
                    key = %object_key,
                    origin = ?origin,
                    error = %e,
                    "signed url issuance failed, treating tier as absent"
                );
                return None;
            }
        };

        let record = ResolutionRecord {
            object_key: object_key.to_string(),
            store_origin: origin,
            size: head.size,
            signed_url: signed_url.to_string(),
            created_at: Utc::now(),
        };
        self.cache.put(cache_key, &record).await;

        tracing::debug!(key = %object_key, origin = ?origin, size = head.size, "resolved content");
        Some(Resolution::Found {
            record,
            cache_hit: false,
        })
    }
}
