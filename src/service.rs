//! Home feed pipeline
//!
//! query → validate → provider → reconcile → rank → schedule → assemble.
//! The whole pipeline runs under one deadline; dropping the future cancels
//! any in-flight fan-out work.

use crate::builder::{PlacesRecordBuilder, RecordBuilder};
use crate::clock::{Clock, SystemClock};
use crate::config::FeedConfig;
use crate::db::{SharedConnection, SqliteCatalogStore, SqliteFavoriteStore};
use crate::error::{FeedError, Result};
use crate::feed::{FeedAssembler, FeedQuery, FeedRequest};
use crate::models::{FeedResponse, SEARCH_RADIUS_METERS};
use crate::provider::{JsonVenueProvider, VenueProvider};
use crate::ranking::RankingEngine;
use crate::reconciliation::ReconciliationEngine;
use crate::schedule::ScheduleResolver;
use crate::store::{CatalogStore, FavoriteStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Collaborators the pipeline is wired with
pub struct FeedDependencies {
    pub provider: Arc<dyn VenueProvider>,
    pub catalog: Arc<dyn CatalogStore>,
    pub builder: Arc<dyn RecordBuilder>,
    pub favorites: Arc<dyn FavoriteStore>,
    pub clock: Arc<dyn Clock>,
}

#[derive(Debug, Clone, Copy)]
pub struct FeedSettings {
    pub schedule: ScheduleResolver,
    /// 0 = unbounded
    pub max_concurrency: usize,
    pub request_timeout: Duration,
}

impl Default for FeedSettings {
    fn default() -> Self {
        FeedSettings {
            schedule: ScheduleResolver::utc(),
            max_concurrency: 16,
            request_timeout: Duration::from_secs(10),
        }
    }
}

pub struct FeedService {
    provider: Arc<dyn VenueProvider>,
    clock: Arc<dyn Clock>,
    reconciler: ReconciliationEngine,
    ranking: RankingEngine,
    schedule: ScheduleResolver,
    assembler: FeedAssembler,
    request_timeout: Duration,
}

impl FeedService {
    pub fn new(deps: FeedDependencies, settings: FeedSettings) -> Self {
        FeedService {
            provider: deps.provider,
            clock: deps.clock,
            reconciler: ReconciliationEngine::new(deps.catalog, deps.builder)
                .with_max_concurrency(settings.max_concurrency),
            ranking: RankingEngine::new(),
            schedule: settings.schedule,
            assembler: FeedAssembler::new(deps.favorites).with_max_concurrency(settings.max_concurrency),
            request_timeout: settings.request_timeout,
        }
    }

    /// SQLite catalog and favorites, JSON venue file, wall clock
    pub fn from_config(config: &FeedConfig, conn: SharedConnection) -> Self {
        let deps = FeedDependencies {
            provider: Arc::new(JsonVenueProvider::new(config.venues_path.clone())),
            catalog: Arc::new(SqliteCatalogStore::new(Arc::clone(&conn))),
            builder: Arc::new(PlacesRecordBuilder::new()),
            favorites: Arc::new(SqliteFavoriteStore::new(conn)),
            clock: Arc::new(SystemClock),
        };
        FeedService::new(deps, config.feed_settings())
    }

    /// Build the home feed for `user_id`
    pub async fn home(&self, user_id: &str, query: &FeedQuery) -> Result<FeedResponse> {
        // Validation happens before any I/O
        let request = query.validate()?;

        tokio::time::timeout(self.request_timeout, self.run(user_id, request))
            .await
            .map_err(|_| FeedError::Timeout(self.request_timeout))?
    }

    #[instrument(skip(self), fields(provider = self.provider.provider_name()))]
    async fn run(&self, user_id: &str, request: FeedRequest) -> Result<FeedResponse> {
        let venues = self
            .provider
            .fetch_nearby(request.origin, SEARCH_RADIUS_METERS)
            .await
            .map_err(|e| FeedError::dependency("venue provider", e))?;
        debug!(venues = venues.len(), "provider returned venues");

        let records = self.reconciler.reconcile(&venues, request.origin).await?;
        let ranked = self.ranking.rank(records);

        let now = self.clock.now();
        let ranked = self.schedule.resolve(ranked, now);

        let page = self
            .assembler
            .assemble(ranked, user_id, request.page, request.limit)
            .await;

        info!(
            top = page.top.len(),
            bars = page.bars.len(),
            total = page.pagination.total,
            page = page.pagination.page,
            "home feed assembled"
        );

        Ok(FeedResponse::ok(page))
    }
}
