//! Scraping pipeline that fills `scraped_jobs` from external job boards.

use rand::Rng;
use scraper::{ElementRef, Selector};
use std::thread;
use std::time::Duration;
use thiserror::Error;

use crate::db::{Database, InsertOutcome};
use crate::models::NewScrapedJob;

mod fetch;
pub mod heuristics;
mod python_org;
mod simplify;

pub use fetch::{HttpFetcher, PageFetcher};
pub use python_org::PythonOrgSource;
pub use simplify::SimplifySource;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("invalid selector '{0}'")]
    Selector(&'static str),

    #[error("unknown source '{0}' (available: python.org, simplify)")]
    UnknownSource(String),
}

/// A job board that can be scraped into `NewScrapedJob`s.
pub trait JobSource {
    /// Value stored in `scraped_jobs.sourceSite`.
    fn name(&self) -> &'static str;

    fn scrape(
        &self,
        fetcher: &dyn PageFetcher,
        pacer: &Pacer,
        limit: usize,
    ) -> Result<Vec<NewScrapedJob>, ScrapeError>;
}

pub fn all_sources() -> Vec<Box<dyn JobSource>> {
    vec![
        Box::new(PythonOrgSource::default()),
        Box::new(SimplifySource::default()),
    ]
}

/// Resolves CLI source names; an empty list selects every source.
pub fn sources_by_name(names: &[String]) -> Result<Vec<Box<dyn JobSource>>, ScrapeError> {
    if names.is_empty() {
        return Ok(all_sources());
    }
    names
        .iter()
        .map(|name| -> Result<Box<dyn JobSource>, ScrapeError> {
            match name.to_lowercase().as_str() {
                "python.org" | "python" | "pythonorg" => Ok(Box::new(PythonOrgSource::default())),
                "simplify" | "simplifyjobs" | "simplify.jobs" => Ok(Box::new(SimplifySource::default())),
                _ => Err(ScrapeError::UnknownSource(name.clone())),
            }
        })
        .collect()
}

/// Sleeps a random, human-looking interval between requests.
#[derive(Debug, Clone)]
pub struct Pacer {
    min_ms: u64,
    max_ms: u64,
}

impl Pacer {
    pub fn new(min: Duration, max: Duration) -> Self {
        let min_ms = min.as_millis() as u64;
        let max_ms = (max.as_millis() as u64).max(min_ms);
        Self { min_ms, max_ms }
    }

    pub fn disabled() -> Self {
        Self { min_ms: 0, max_ms: 0 }
    }

    pub fn pause(&self) {
        if self.max_ms == 0 {
            return;
        }
        let ms = rand::thread_rng().gen_range(self.min_ms..=self.max_ms);
        thread::sleep(Duration::from_millis(ms));
    }
}

#[derive(Debug, Clone)]
pub struct ScrapeSettings {
    pub max_jobs_per_source: usize,
    /// Parse and report without writing to the database.
    pub dry_run: bool,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            max_jobs_per_source: 15,
            dry_run: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct SourceReport {
    pub source: &'static str,
    pub found: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub errors: usize,
    /// Set when the whole source failed before producing jobs.
    pub failure: Option<String>,
}

#[derive(Debug, Default)]
pub struct ScrapeReport {
    pub sources: Vec<SourceReport>,
}

impl ScrapeReport {
    pub fn total_inserted(&self) -> usize {
        self.sources.iter().map(|s| s.inserted).sum()
    }
}

/// Scrapes every source in turn and stores new jobs. A failing source is
/// logged and skipped; the remaining sources still run. A database error
/// other than a constraint violation ends the whole run.
pub fn run_scrape(
    db: &Database,
    sources: &[Box<dyn JobSource>],
    fetcher: &dyn PageFetcher,
    pacer: &Pacer,
    settings: &ScrapeSettings,
) -> ScrapeReport {
    let mut report = ScrapeReport::default();

    for (i, source) in sources.iter().enumerate() {
        if i > 0 {
            pacer.pause();
        }
        tracing::info!(source = source.name(), "scrape starting");

        let mut stats = SourceReport {
            source: source.name(),
            ..Default::default()
        };

        let jobs = match source.scrape(fetcher, pacer, settings.max_jobs_per_source) {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::error!(source = source.name(), error = %e, "scrape failed");
                stats.failure = Some(e.to_string());
                report.sources.push(stats);
                continue;
            }
        };
        stats.found = jobs.len();

        for job in jobs.iter().take(settings.max_jobs_per_source) {
            if settings.dry_run {
                tracing::info!(title = %job.title, company = %job.company_name, "[dry run] would insert");
                continue;
            }
            match db.insert_scraped_job(job) {
                Ok(InsertOutcome::Inserted(id)) => {
                    tracing::trace!(%id, url = %job.source_url, "stored");
                    stats.inserted += 1;
                }
                Ok(InsertOutcome::Duplicate) => stats.duplicates += 1,
                Err(e) if e.is_constraint_violation() => {
                    tracing::warn!(title = %job.title, error = %e, "insert rejected");
                    stats.errors += 1;
                }
                Err(e) => {
                    tracing::error!(source = source.name(), error = %e, "database failure, aborting scrape");
                    stats.failure = Some(e.to_string());
                    report.sources.push(stats);
                    return report;
                }
            }
        }

        tracing::info!(
            source = source.name(),
            inserted = stats.inserted,
            duplicates = stats.duplicates,
            "scrape done"
        );
        report.sources.push(stats);
    }

    report
}

pub(crate) fn selector(css: &'static str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|_| ScrapeError::Selector(css))
}

/// Text of an element with each text node trimmed and empty nodes dropped.
pub(crate) fn stripped_text(element: &ElementRef, separator: &str) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::{PageFetcher, ScrapeError};
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Serves canned pages; unknown URLs return 404.
    #[derive(Default)]
    pub struct StubFetcher {
        pages: HashMap<String, String>,
        pub requested: RefCell<Vec<String>>,
    }

    impl StubFetcher {
        pub fn with_page(mut self, url: &str, body: &str) -> Self {
            self.pages.insert(url.to_string(), body.to_string());
            self
        }
    }

    impl PageFetcher for StubFetcher {
        fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
            self.requested.borrow_mut().push(url.to_string());
            self.pages.get(url).cloned().ok_or_else(|| ScrapeError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }
}
