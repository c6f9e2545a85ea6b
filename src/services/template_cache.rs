//! Caller-owned cache of the resolved active period template.
//!
//! The cache is an explicit object handed to whoever needs grid geometry.
//! Entries expire on a TTL and can be dropped eagerly through
//! [`TemplateCache::invalidate`] after a template write; there is no global
//! state and no implicit refresh.

use log::debug;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::error::EngineResult;
use crate::api::TemplateId;
use crate::db::checksum::slots_checksum;
use crate::db::repository::TimetableRepository;
use crate::models::period::{resolve_template, PeriodSlot};

/// How long a fetched template is served without consulting the store.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// The active template, resolved into renderable grid rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTemplate {
    pub template_id: TemplateId,
    pub name: String,
    pub periods: Vec<PeriodSlot>,
}

#[derive(Debug, Clone)]
struct CachedTemplate {
    checksum: String,
    template: Arc<ResolvedTemplate>,
}

#[derive(Debug)]
struct CacheEntry {
    fetched_at: Instant,
    /// `None` records that no template was active at fetch time.
    resolved: Option<CachedTemplate>,
}

/// TTL cache around the template read path.
#[derive(Clone)]
pub struct TemplateCache {
    ttl: Duration,
    entry: Arc<RwLock<Option<CacheEntry>>>,
}

impl TemplateCache {
    pub fn new() -> TemplateCache {
        TemplateCache::with_ttl(DEFAULT_TTL)
    }

    /// A zero TTL consults the store on every call.
    pub fn with_ttl(ttl: Duration) -> TemplateCache {
        TemplateCache {
            ttl,
            entry: Arc::new(RwLock::new(None)),
        }
    }

    /// The cached template, fetching and resolving it when the entry is
    /// missing or older than the TTL. `None` means no active template.
    ///
    /// A refetch whose raw slots fingerprint-match the cached entry reuses
    /// the already resolved periods instead of resolving again.
    pub async fn get_or_fetch<R>(&self, repo: &R) -> EngineResult<Option<Arc<ResolvedTemplate>>>
    where
        R: TimetableRepository + ?Sized,
    {
        if let Some(entry) = self.entry.read().as_ref() {
            if entry.fetched_at.elapsed() < self.ttl {
                return Ok(entry.resolved.as_ref().map(|c| Arc::clone(&c.template)));
            }
        }

        let fetched = repo.active_template().await?;
        let resolved = fetched.map(|template| {
            let checksum = slots_checksum(&template.slots);
            let reusable = self.entry.read().as_ref().and_then(|entry| {
                entry.resolved.as_ref().and_then(|cached| {
                    (cached.checksum == checksum
                        && cached.template.template_id == template.id)
                        .then(|| cached.clone())
                })
            });
            match reusable {
                Some(cached) => {
                    debug!(
                        "Template cache: fingerprint unchanged for template {}, reusing",
                        template.id
                    );
                    cached
                }
                None => CachedTemplate {
                    checksum,
                    template: Arc::new(ResolvedTemplate {
                        template_id: template.id,
                        name: template.name,
                        periods: resolve_template(&template.slots),
                    }),
                },
            }
        });

        let out = resolved.as_ref().map(|c| Arc::clone(&c.template));
        *self.entry.write() = Some(CacheEntry {
            fetched_at: Instant::now(),
            resolved,
        });
        Ok(out)
    }

    /// Drop the cached entry; the next read consults the store.
    pub fn invalidate(&self) {
        *self.entry.write() = None;
    }

    /// Whether a live (non-expired) entry is present.
    pub fn is_fresh(&self) -> bool {
        self.entry
            .read()
            .as_ref()
            .is_some_and(|entry| entry.fetched_at.elapsed() < self.ttl)
    }
}

impl Default for TemplateCache {
    fn default() -> Self {
        TemplateCache::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::TemplateRepository;
    use crate::models::period::{NewPeriodTemplate, RawPeriodSlot};

    fn raw_slots(labels: &[&str]) -> Vec<RawPeriodSlot> {
        labels
            .iter()
            .map(|label| RawPeriodSlot {
                id: None,
                order_number: None,
                label: Some((*label).into()),
                start_time: Some("09:00".into()),
                end_time: Some("10:00".into()),
                is_break: None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_absent_template_is_none_not_error() {
        let repo = LocalRepository::new();
        let cache = TemplateCache::new();
        assert!(cache.get_or_fetch(&repo).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fetch_resolves_and_caches() {
        let repo = LocalRepository::new();
        repo.put_template(NewPeriodTemplate {
            name: "Default".into(),
            slots: raw_slots(&["First", "Second"]),
        })
        .await
        .unwrap();

        let cache = TemplateCache::new();
        let template = cache.get_or_fetch(&repo).await.unwrap().unwrap();
        assert_eq!(template.periods.len(), 2);
        assert_eq!(template.periods[0].label, "First");
        assert!(cache.is_fresh());
    }

    #[tokio::test]
    async fn test_serves_stale_until_invalidated() {
        let repo = LocalRepository::new();
        repo.put_template(NewPeriodTemplate {
            name: "Old".into(),
            slots: raw_slots(&["First"]),
        })
        .await
        .unwrap();

        let cache = TemplateCache::new();
        let before = cache.get_or_fetch(&repo).await.unwrap().unwrap();

        repo.put_template(NewPeriodTemplate {
            name: "New".into(),
            slots: raw_slots(&["First", "Second"]),
        })
        .await
        .unwrap();

        // TTL has not expired, so the old entry is still served.
        let stale = cache.get_or_fetch(&repo).await.unwrap().unwrap();
        assert_eq!(stale.template_id, before.template_id);
        assert_eq!(stale.periods.len(), 1);

        cache.invalidate();
        let fresh = cache.get_or_fetch(&repo).await.unwrap().unwrap();
        assert_eq!(fresh.name, "New");
        assert_eq!(fresh.periods.len(), 2);
    }

    #[tokio::test]
    async fn test_zero_ttl_always_refetches() {
        let repo = LocalRepository::new();
        repo.put_template(NewPeriodTemplate {
            name: "Old".into(),
            slots: raw_slots(&["First"]),
        })
        .await
        .unwrap();

        let cache = TemplateCache::with_ttl(Duration::ZERO);
        cache.get_or_fetch(&repo).await.unwrap().unwrap();

        repo.put_template(NewPeriodTemplate {
            name: "New".into(),
            slots: raw_slots(&["First", "Second"]),
        })
        .await
        .unwrap();

        let fresh = cache.get_or_fetch(&repo).await.unwrap().unwrap();
        assert_eq!(fresh.name, "New");
        assert!(!cache.is_fresh());
    }

    #[tokio::test]
    async fn test_refetch_reuses_resolution_when_unchanged() {
        let repo = LocalRepository::new();
        repo.put_template(NewPeriodTemplate {
            name: "Default".into(),
            slots: raw_slots(&["First"]),
        })
        .await
        .unwrap();

        let cache = TemplateCache::with_ttl(Duration::ZERO);
        let first = cache.get_or_fetch(&repo).await.unwrap().unwrap();
        let second = cache.get_or_fetch(&repo).await.unwrap().unwrap();
        // Same template, same fingerprint: the Arc is shared, not rebuilt.
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_caches_template_absence() {
        let repo = LocalRepository::new();
        let cache = TemplateCache::new();
        assert!(cache.get_or_fetch(&repo).await.unwrap().is_none());
        assert!(cache.is_fresh());

        repo.put_template(NewPeriodTemplate {
            name: "Late".into(),
            slots: raw_slots(&["First"]),
        })
        .await
        .unwrap();

        // Still within TTL, absence is served from cache.
        assert!(cache.get_or_fetch(&repo).await.unwrap().is_none());
        cache.invalidate();
        assert!(cache.get_or_fetch(&repo).await.unwrap().is_some());
    }
}
