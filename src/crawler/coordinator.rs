//! Crawler coordinator - runs every configured category
//!
//! This module sequences the category sessions of one run:
//! - Building the shared HTTP services once
//! - Running each category's page loop to completion before the next
//! - Merging each category's sections behind a cover page
//! - Writing the merged document into the category directory

use crate::config::{CategoryConfig, Config};
use crate::crawler::orchestrator::{CategoryRun, CrawlOrchestrator, CrawlServices};
use crate::output::{
    artifact_file_name, write_artifact, CoverDescriptor, CrawlStatistics, DocumentMerger,
    MarkdownRenderer, SectionRenderer,
};
use crate::state::CrawlPhase;
use crate::storage::CategoryLayout;
use crate::FolioError;
use std::path::PathBuf;
use std::sync::Arc;

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    services: CrawlServices,
    merger: DocumentMerger,
}

impl Coordinator {
    /// Creates a coordinator rendering with [`MarkdownRenderer`]
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(FolioError)` - The HTTP client or search URL could not be set up
    pub fn new(config: Config) -> Result<Self, FolioError> {
        Self::with_renderer(config, Arc::new(MarkdownRenderer::new()))
    }

    /// Creates a coordinator with a custom rendering collaborator
    pub fn with_renderer(
        config: Config,
        renderer: Arc<dyn SectionRenderer>,
    ) -> Result<Self, FolioError> {
        if config.categories.is_empty() {
            return Err(FolioError::Setup("no categories to crawl".to_string()));
        }

        let services = CrawlServices::from_config(&config, renderer)?;
        let merger = DocumentMerger::new(
            config.output.attribution.clone(),
            config.output.page_width,
        );

        Ok(Self {
            config,
            services,
            merger,
        })
    }

    /// Crawls every configured category in order
    ///
    /// A category that aborts or stops on a fetch failure does not prevent
    /// the following categories from running.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<CrawlStatistics>)` - One entry per category, in config order
    /// * `Err(FolioError)` - A page loop violated its phase ordering
    pub async fn run(&self) -> Result<Vec<CrawlStatistics>, FolioError> {
        let mut results = Vec::with_capacity(self.config.categories.len());

        for category in &self.config.categories {
            let stats = self.run_category(category).await?;
            results.push(stats);
        }

        Ok(results)
    }

    async fn run_category(&self, category: &CategoryConfig) -> Result<CrawlStatistics, FolioError> {
        let layout = CategoryLayout::new(&self.config.output.category_root(&category.name));

        let orchestrator = CrawlOrchestrator::new(
            self.services.clone(),
            &self.config.crawl,
            category.clone(),
            layout.clone(),
        );
        let run = orchestrator.run().await?;

        let mut stats = run.stats.clone();
        if run.phase == CrawlPhase::Aborted {
            return Ok(stats);
        }

        if run.total_records == 0 {
            tracing::info!(
                "No records collected for '{}'; no document written",
                category.name
            );
            return Ok(stats);
        }

        stats.artifact = self.package(category, &layout, run);
        Ok(stats)
    }

    /// Merges a finished session into the category's document
    ///
    /// Rendering and write failures are logged; the crawl results already
    /// persisted in the row store are unaffected.
    fn package(
        &self,
        category: &CategoryConfig,
        layout: &CategoryLayout,
        run: CategoryRun,
    ) -> Option<PathBuf> {
        let now = chrono::Local::now();
        let cover = CoverDescriptor {
            title: self.config.output.document_title.clone(),
            category: category.name.clone(),
            total_records: run.total_records,
            generated_at: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            attribution: self.config.output.attribution.clone(),
        };

        let cover_pages = match self.services.renderer.render_cover(&cover) {
            Ok(pages) => pages,
            Err(e) => {
                tracing::error!("Failed to render cover for '{}': {}", category.name, e);
                return None;
            }
        };

        let document = self.merger.merge(cover_pages, run.sections);
        let path = layout.root.join(artifact_file_name(
            &self.config.output.artifact_prefix,
            &category.name,
            &now,
        ));

        match write_artifact(&document, &path) {
            Ok(()) => Some(path),
            Err(e) => {
                tracing::error!("Failed to write {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Runs a complete crawl operation
///
/// # Example
///
/// ```no_run
/// use reddot_folio::config::load_config;
/// use reddot_folio::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("folio.toml"))?;
/// let stats = run_crawl(config).await?;
/// println!("{} categories crawled", stats.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config) -> Result<Vec<CrawlStatistics>, FolioError> {
    let coordinator = Coordinator::new(config)?;
    coordinator.run().await
}
