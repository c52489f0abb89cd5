//! Category crawl orchestration
//!
//! A `CrawlOrchestrator` drives one category session through its page loop:
//! - Fetch a search page (retrying transient failures)
//! - Drop records already seen this session
//! - Enrich the remaining records concurrently
//! - Append the page to the row store
//! - Render the page's section
//!
//! Only one page is in flight at a time. Every phase change goes through
//! `CrawlPhase::can_transition_to`.

use crate::config::{CategoryConfig, Config, CrawlConfig};
use crate::crawler::asset::AssetDownloader;
use crate::crawler::dedup::{Deduplicator, SeenIdSet};
use crate::crawler::detail::DetailEnricher;
use crate::crawler::fetcher::{build_http_client, PageFetcher, PageResult};
use crate::crawler::pool::EnrichmentPool;
use crate::crawler::retry::RetryPolicy;
use crate::output::{CrawlStatistics, Section, SectionRenderer, SessionOutcome};
use crate::record::PageBatch;
use crate::state::CrawlPhase;
use crate::storage::{CategoryLayout, CsvRowStore, RowStore};
use crate::FolioError;
use std::sync::Arc;

/// Network and rendering services shared by every category of a run
#[derive(Clone)]
pub struct CrawlServices {
    pub fetcher: Arc<PageFetcher>,
    pub enricher: Arc<DetailEnricher>,
    pub downloader: Arc<AssetDownloader>,
    pub renderer: Arc<dyn SectionRenderer>,
}

impl CrawlServices {
    /// Builds the HTTP client and fetchers described by `config`
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlServices)` - Services sharing one HTTP client
    /// * `Err(FolioError)` - The client could not be built or the search
    ///   endpoint is not a valid URL
    pub fn from_config(
        config: &Config,
        renderer: Arc<dyn SectionRenderer>,
    ) -> Result<Self, FolioError> {
        let retry = RetryPolicy::from_config(&config.retry);
        let client = build_http_client(&config.api, retry.timeout())?;

        let fetcher = PageFetcher::new(
            client.clone(),
            &config.api.base_url,
            &config.api.site_base_url,
            retry,
        )?;

        Ok(Self {
            fetcher: Arc::new(fetcher),
            enricher: Arc::new(DetailEnricher::new(client.clone(), retry)),
            downloader: Arc::new(AssetDownloader::new(client, retry)),
            renderer,
        })
    }
}

/// Everything a finished category session produced
pub struct CategoryRun {
    /// Rendered sections in page order
    pub sections: Vec<Section>,

    /// Records that made it into a page batch
    pub total_records: usize,

    pub stats: CrawlStatistics,

    /// Terminal phase: `EndOfCategory` or `Aborted`
    pub phase: CrawlPhase,
}

/// Runs the page loop of one category
pub struct CrawlOrchestrator {
    category: CategoryConfig,
    keyword: Option<String>,
    max_pages: u32,
    stop_on_repeated_page: bool,
    layout: CategoryLayout,
    services: CrawlServices,
    pool: EnrichmentPool,
    store: Option<Box<dyn RowStore + Send>>,
    seen: SeenIdSet,
    phase: CrawlPhase,
    sections: Vec<Section>,
    total_records: usize,
    stats: CrawlStatistics,
}

impl CrawlOrchestrator {
    /// Creates an orchestrator for one category
    ///
    /// # Arguments
    ///
    /// * `services` - Shared fetchers and renderer
    /// * `crawl` - Page loop settings (workers, keyword, limits)
    /// * `category` - Category name and filters
    /// * `layout` - Output directories of the category
    pub fn new(
        services: CrawlServices,
        crawl: &CrawlConfig,
        category: CategoryConfig,
        layout: CategoryLayout,
    ) -> Self {
        let pool = EnrichmentPool::new(
            Arc::clone(&services.enricher),
            Arc::clone(&services.downloader),
            layout.assets_dir.clone(),
            crawl.max_workers,
        );
        let stats = CrawlStatistics::new(category.name.clone());

        Self {
            keyword: crawl.keyword.clone(),
            max_pages: crawl.max_pages,
            stop_on_repeated_page: crawl.stop_on_repeated_page,
            category,
            layout,
            services,
            pool,
            store: None,
            seen: SeenIdSet::new(),
            phase: CrawlPhase::Idle,
            sections: Vec::new(),
            total_records: 0,
            stats,
        }
    }

    /// Uses `store` instead of the CSV store in the category directory
    pub fn with_row_store(mut self, store: Box<dyn RowStore + Send>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    /// Runs the session to a terminal phase
    ///
    /// Setup failures and page fetch failures end the session with a
    /// recorded outcome rather than an error.
    ///
    /// # Returns
    ///
    /// * `Ok(CategoryRun)` - The session reached `EndOfCategory` or `Aborted`
    /// * `Err(FolioError::InvalidTransition)` - The page loop attempted an
    ///   out-of-order phase change
    pub async fn run(mut self) -> Result<CategoryRun, FolioError> {
        tracing::info!(
            "Starting category '{}' ({} filters, {} workers)",
            self.category.name,
            self.category.filters.len(),
            self.pool.width()
        );

        if let Err(e) = self.prepare() {
            tracing::error!("Category '{}' aborted: {}", self.category.name, e);
            self.transition(CrawlPhase::Aborted)?;
            self.stats.outcome = SessionOutcome::Aborted(e.to_string());
            return Ok(self.finish());
        }

        let mut page = 1;
        self.transition(CrawlPhase::Fetching(page))?;

        while !self.phase.is_terminal() {
            match self.process_page(page).await? {
                Some(outcome) => {
                    self.stats.outcome = outcome;
                    self.transition(CrawlPhase::EndOfCategory)?;
                }
                None => {
                    page += 1;
                    self.transition(CrawlPhase::Fetching(page))?;
                }
            }
        }

        tracing::info!(
            "Category '{}' finished after {} pages: {}",
            self.category.name,
            self.stats.pages_fetched,
            self.stats.outcome
        );

        Ok(self.finish())
    }

    /// Moves to `next`, rejecting transitions the page loop does not allow
    fn transition(&mut self, next: CrawlPhase) -> Result<(), FolioError> {
        if !self.phase.can_transition_to(next) {
            return Err(FolioError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }

        tracing::trace!("{}: {} -> {}", self.category.name, self.phase, next);
        self.phase = next;
        Ok(())
    }

    fn prepare(&mut self) -> Result<(), FolioError> {
        self.layout.ensure_dirs()?;
        if self.store.is_none() {
            self.store = Some(Box::new(CsvRowStore::create(&self.layout.row_store)?));
        }
        Ok(())
    }

    /// Runs one page from `Fetching` through `Building`
    ///
    /// Returns the session outcome when this page ends the category.
    async fn process_page(&mut self, page: u32) -> Result<Option<SessionOutcome>, FolioError> {
        let records = match self
            .services
            .fetcher
            .fetch(page, &self.category.filters, self.keyword.as_deref())
            .await
        {
            PageResult::Records { records, raw_count } => {
                if records.is_empty() {
                    self.stats.pages_fetched += 1;
                    tracing::warn!(
                        "Page {} had {} entries and none passed validation; ending category",
                        page,
                        raw_count
                    );
                    return Ok(Some(SessionOutcome::NoValidRecords(page)));
                }
                records
            }
            PageResult::EndOfResults => {
                tracing::info!("Page {} has no results", page);
                return Ok(Some(SessionOutcome::EndOfResults));
            }
            PageResult::FatalError(message) => {
                tracing::error!("Category '{}' stopped: {}", self.category.name, message);
                return Ok(Some(SessionOutcome::FatalError(message)));
            }
        };

        self.stats.pages_fetched += 1;
        self.stats.records_received += records.len();

        self.transition(CrawlPhase::Deduping(page))?;
        let received = records.len();
        let dedup = Deduplicator::new(&mut self.seen).filter(records);
        self.stats.duplicates_skipped += dedup.duplicates;
        self.stats.unidentified_records += dedup.unidentified;

        if received > 0 && dedup.accepted.is_empty() && self.stop_on_repeated_page {
            tracing::warn!(
                "Page {} only repeated {} known records; ending category",
                page,
                received
            );
            return Ok(Some(SessionOutcome::RepeatedPage(page)));
        }

        self.transition(CrawlPhase::Enriching(page))?;
        let accepted = dedup.accepted.len();
        let report = self.pool.process(dedup.accepted).await;
        self.stats.records_enriched += report.records.len();
        self.stats.enrichment_failures += report.failed;
        self.stats.details_degraded += report.details_degraded;
        self.stats.images_missing += report.images_missing;

        let batch = PageBatch::new(page, report.records);
        self.total_records += batch.len();

        self.transition(CrawlPhase::Persisting(page))?;
        self.persist(&batch);

        self.transition(CrawlPhase::Building(page))?;
        self.build_section(&batch);

        tracing::info!(
            "Page {}: {} received, {} new, {} enriched (total {})",
            page,
            received,
            accepted,
            batch.len(),
            self.total_records
        );

        if accepted > 0 && batch.is_empty() {
            tracing::warn!(
                "All {} new records of page {} failed enrichment; ending category",
                accepted,
                page
            );
            return Ok(Some(SessionOutcome::EnrichmentFailed(page)));
        }

        if self.max_pages > 0 && page >= self.max_pages {
            tracing::info!("Reached page limit of {}", self.max_pages);
            return Ok(Some(SessionOutcome::PageLimit(self.max_pages)));
        }

        Ok(None)
    }

    /// Appends the batch to the row store; a failure disables the store for
    /// the rest of the session
    fn persist(&mut self, batch: &PageBatch) {
        let store = match self.store.as_mut() {
            Some(store) => store,
            None => return,
        };

        match store.append_page(&batch.records) {
            Ok(rows) => self.stats.rows_persisted += rows,
            Err(e) => {
                tracing::error!(
                    "Failed to persist page {} to {}; row store disabled: {}",
                    batch.page_index,
                    store.path().display(),
                    e
                );
                self.store = None;
            }
        }
    }

    fn build_section(&mut self, batch: &PageBatch) {
        match self
            .services
            .renderer
            .render_section(batch.page_index, &batch.records)
        {
            Ok(section) => {
                self.stats.sections_built += 1;
                self.sections.push(section);
            }
            Err(e) => {
                tracing::error!("Skipping section for page {}: {}", batch.page_index, e);
            }
        }
    }

    fn finish(self) -> CategoryRun {
        CategoryRun {
            sections: self.sections,
            total_records: self.total_records,
            stats: self.stats,
            phase: self.phase,
        }
    }
}
