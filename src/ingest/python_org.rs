//! The python.org community job board. Server-rendered HTML, one listing
//! page plus one detail page per job.

use scraper::{ElementRef, Html};

use super::heuristics::{extract_salary, infer_experience_level, infer_location_requirement};
use super::{selector, stripped_text, JobSource, Pacer, PageFetcher, ScrapeError};
use crate::models::NewScrapedJob;

const SOURCE_SITE: &str = "Python.org";

pub struct PythonOrgSource {
    base_url: String,
    listing_url: String,
}

impl Default for PythonOrgSource {
    fn default() -> Self {
        Self::new("https://www.python.org")
    }
}

/// Fields available on the listing page before the detail page is read.
#[derive(Debug, Clone, PartialEq)]
struct ListingCard {
    title: String,
    company_name: String,
    location: String,
    source_url: String,
    posted_at: String,
}

impl PythonOrgSource {
    pub fn new(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            listing_url: format!("{}/jobs/", base_url),
            base_url,
        }
    }

    fn parse_listing(&self, html: &str) -> Result<Vec<ListingCard>, ScrapeError> {
        let document = Html::parse_document(html);
        let item_sel = selector("ol.list-recent-jobs > li")?;
        let title_sel = selector("h2.listing-company a")?;
        let company_sel = selector("span.listing-company-name")?;
        let location_sel = selector("span.listing-location a")?;
        let time_sel = selector("span.listing-posted time")?;

        let mut cards = Vec::new();
        for li in document.select(&item_sel) {
            let Some(link) = li.select(&title_sel).next() else {
                continue;
            };
            let title = stripped_text(&link, "");
            let href = link.value().attr("href").unwrap_or("");
            if title.is_empty() || href.is_empty() {
                tracing::debug!("skipping malformed listing item");
                continue;
            }
            let source_url = if href.starts_with("http") {
                href.to_string()
            } else {
                format!("{}{}", self.base_url, href)
            };

            let company_name = li
                .select(&company_sel)
                .next()
                .map(company_from_span)
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| "Unknown".to_string());

            let location = li
                .select(&location_sel)
                .next()
                .map(|a| stripped_text(&a, ""))
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| "Not specified".to_string());

            let posted_at = li
                .select(&time_sel)
                .next()
                .map(|t| {
                    t.value()
                        .attr("datetime")
                        .filter(|d| !d.is_empty())
                        .map(str::to_string)
                        .unwrap_or_else(|| stripped_text(&t, ""))
                })
                .unwrap_or_default();

            cards.push(ListingCard {
                title,
                company_name,
                location,
                source_url,
                posted_at,
            });
        }

        Ok(cards)
    }

    fn parse_description(html: &str) -> Result<String, ScrapeError> {
        let document = Html::parse_document(html);
        let desc_sel = selector("div.job-description")?;
        Ok(document
            .select(&desc_sel)
            .next()
            .map(|d| stripped_text(&d, "\n"))
            .unwrap_or_default())
    }

    fn build_job(card: ListingCard, description: &str) -> NewScrapedJob {
        let wage = if description.is_empty() {
            None
        } else {
            extract_salary(description)
        };
        NewScrapedJob {
            experience_level: infer_experience_level(&card.title, description),
            location_requirement: infer_location_requirement(&card.title, &card.location, description),
            description: if description.is_empty() {
                "No description available.".to_string()
            } else {
                description.to_string()
            },
            wage,
            title: card.title,
            company_name: card.company_name,
            location: card.location,
            source_url: card.source_url,
            source_site: SOURCE_SITE.to_string(),
            posted_at: Some(card.posted_at).filter(|p| !p.is_empty()),
        }
    }
}

// The company span also contains the title link and a <br>; what remains
// once child element text is removed is the company name.
fn company_from_span(span: ElementRef) -> String {
    let mut company = stripped_text(&span, " ");
    for child in span.children().filter_map(ElementRef::wrap) {
        let child_text = stripped_text(&child, "");
        if !child_text.is_empty() {
            company = company.replacen(&child_text, "", 1);
        }
    }
    company
        .trim()
        .trim_matches(|c| c == '—' || c == '–' || c == '-')
        .trim()
        .to_string()
}

impl JobSource for PythonOrgSource {
    fn name(&self) -> &'static str {
        SOURCE_SITE
    }

    fn scrape(
        &self,
        fetcher: &dyn PageFetcher,
        pacer: &Pacer,
        limit: usize,
    ) -> Result<Vec<NewScrapedJob>, ScrapeError> {
        let html = fetcher.fetch(&self.listing_url)?;
        pacer.pause();

        let cards = self.parse_listing(&html)?;
        tracing::info!(count = cards.len(), "found job cards on listing page");
        if cards.is_empty() {
            tracing::warn!(url = %self.listing_url, "no listings found; page layout may have changed");
        }

        let total = cards.len().min(limit);
        let mut jobs = Vec::with_capacity(total);
        for (idx, card) in cards.into_iter().take(limit).enumerate() {
            tracing::info!("  [{}/{}] {}", idx + 1, total, card.title);
            let description = match fetcher.fetch(&card.source_url) {
                Ok(detail) => Self::parse_description(&detail)?,
                Err(e) => {
                    tracing::warn!(url = %card.source_url, error = %e, "could not load detail page");
                    String::new()
                }
            };
            jobs.push(Self::build_job(card, &description));
            pacer.pause();
        }

        Ok(jobs)
    }
}
