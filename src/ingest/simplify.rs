//! Simplify.jobs search results. The page embeds its data as JSON for
//! client-side hydration; when that is missing the rendered cards are parsed.

use regex::Regex;
use scraper::Html;
use serde_json::{Map, Value};
use std::sync::LazyLock;

use super::heuristics::{extract_salary, infer_experience_level, infer_location_requirement};
use super::{selector, stripped_text, JobSource, Pacer, PageFetcher, ScrapeError};
use crate::models::NewScrapedJob;

const SOURCE_SITE: &str = "SimplifyJobs";

const LIST_KEYS: [&str; 6] = ["jobs", "results", "data", "items", "listings", "hits"];

const CARD_EXPERIENCE: [&str; 8] = [
    "intern", "junior", "mid", "senior", "lead", "entry", "expert", "staff",
];

static SLUG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

pub struct SimplifySource {
    search_url: String,
}

impl Default for SimplifySource {
    fn default() -> Self {
        Self {
            search_url: "https://simplify.jobs/jobs?query=software+engineer".to_string(),
        }
    }
}

impl SimplifySource {
    /// Job-shaped objects from every embedded JSON script, in document order.
    fn embedded_jobs(document: &Html) -> Result<Vec<Map<String, Value>>, ScrapeError> {
        let script_sel = selector("script#__NEXT_DATA__, script[type='application/json']")?;
        let mut jobs = Vec::new();
        for script in document.select(&script_sel) {
            let body: String = script.text().collect();
            match serde_json::from_str::<Value>(&body) {
                Ok(data) => collect_jobs(&data, &mut jobs),
                Err(e) => tracing::debug!(error = %e, "skipping unparseable JSON script"),
            }
        }
        Ok(jobs)
    }

    fn map_api_job(raw: &Map<String, Value>) -> NewScrapedJob {
        let title = text_field(raw, &["title", "name"]).unwrap_or_else(|| "Untitled".to_string());

        let company = text_field(raw, &["company_name", "companyName"])
            .or_else(|| {
                raw.get("company")
                    .and_then(Value::as_object)
                    .and_then(|c| text_field(c, &["name"]))
            })
            .unwrap_or_else(|| "Unknown".to_string());

        let description = text_field(raw, &["description", "body", "details"])
            .unwrap_or_else(|| "No description available.".to_string());

        let wage = match first_present(raw, &["salary", "wage", "compensation"]) {
            Some(Value::Object(range)) => {
                let lo = text_field(range, &["min", "low"]).unwrap_or_default();
                let hi = text_field(range, &["max", "high"]).unwrap_or_default();
                let currency = text_field(range, &["currency"]).unwrap_or_else(|| "USD".to_string());
                if lo.is_empty() && hi.is_empty() {
                    None
                } else {
                    Some(format!("{} {}–{}", currency, lo, hi))
                }
            }
            Some(Value::Number(n)) => n.as_f64().map(|v| format!("${}", thousands(v))),
            Some(Value::String(s)) => Some(s.clone()),
            _ => extract_salary(&description),
        };

        let location = first_present(raw, &["location", "city"])
            .or_else(|| {
                raw.get("locations")
                    .and_then(Value::as_array)
                    .and_then(|l| l.first())
            })
            .and_then(location_text)
            .unwrap_or_else(|| "Not specified".to_string());

        let location_requirement = text_field(raw, &["locationRequirement", "work_type"])
            .unwrap_or_else(|| infer_location_requirement(&title, &location, &description));

        let experience_level = text_field(raw, &["experienceLevel", "experience_level", "seniority"])
            .or_else(|| infer_experience_level(&title, &description));

        let source_url = text_field(raw, &["url", "apply_url", "sourceUrl"]).unwrap_or_else(|| {
            match text_field(raw, &["id", "_id", "slug"]) {
                Some(id) => {
                    let slug = text_field(raw, &["slug"]).unwrap_or_else(|| slugify(&title));
                    format!("https://simplify.jobs/p/{}/{}", id, slug)
                }
                None => format!("https://simplify.jobs/jobs?query={}", title.replace(' ', "+")),
            }
        });

        NewScrapedJob {
            posted_at: text_field(raw, &["postedAt", "posted_at", "created_at"]),
            title,
            company_name: company,
            description,
            wage,
            location_requirement,
            experience_level,
            location,
            source_url,
            source_site: SOURCE_SITE.to_string(),
        }
    }

    /// Parses the rendered job cards: buttons wrapping an `h3` title.
    fn parse_cards(&self, document: &Html, limit: usize) -> Result<Vec<NewScrapedJob>, ScrapeError> {
        let button_sel = selector("button")?;
        let h3_sel = selector("h3")?;
        let span_sel = selector("span")?;
        let p_sel = selector("p")?;

        let cards: Vec<_> = document
            .select(&button_sel)
            .filter(|b| b.select(&h3_sel).next().is_some())
            .collect();
        tracing::info!(count = cards.len(), "DOM fallback found potential job cards");

        let mut jobs = Vec::new();
        for (idx, card) in cards.into_iter().take(limit).enumerate() {
            let title = card
                .select(&h3_sel)
                .next()
                .map(|h| stripped_text(&h, ""))
                .unwrap_or_default();
            if title.is_empty() {
                continue;
            }

            let company = card
                .select(&span_sel)
                .map(|s| stripped_text(&s, ""))
                .find(|t| *t != title && t.chars().count() > 1 && !t.starts_with('$'))
                .unwrap_or_else(|| "Unknown".to_string());

            let paragraphs: Vec<String> = card.select(&p_sel).map(|p| stripped_text(&p, "")).collect();

            let wage = paragraphs
                .iter()
                .find(|t| t.contains("/yr") || t.contains("/hr") || t.contains('$'))
                .cloned();

            let mut location = "Not specified".to_string();
            let mut location_requirement = None;
            for text in &paragraphs {
                let lower = text.to_lowercase();
                if ["remote", "in person", "hybrid", "on-site"]
                    .iter()
                    .any(|kw| lower.contains(kw))
                {
                    location_requirement = Some(text.clone());
                } else if text.contains(',') && text.chars().count() < 80 && !text.contains('$') {
                    location = text.clone();
                }
            }
            let location_requirement =
                location_requirement.unwrap_or_else(|| infer_location_requirement(&title, &location, ""));

            let experience_level = paragraphs
                .iter()
                .find(|t| CARD_EXPERIENCE.contains(&t.to_lowercase().as_str()))
                .map(|t| capitalize(t));

            jobs.push(NewScrapedJob {
                description: format!("Job listing for {} at {}.", title, company),
                source_url: format!("{}#card-{}", self.search_url, idx),
                source_site: SOURCE_SITE.to_string(),
                posted_at: None,
                title,
                company_name: company,
                wage,
                location_requirement,
                experience_level,
                location,
            });
        }

        Ok(jobs)
    }
}

impl JobSource for SimplifySource {
    fn name(&self) -> &'static str {
        SOURCE_SITE
    }

    fn scrape(
        &self,
        fetcher: &dyn PageFetcher,
        pacer: &Pacer,
        limit: usize,
    ) -> Result<Vec<NewScrapedJob>, ScrapeError> {
        let html = fetcher.fetch(&self.search_url)?;
        pacer.pause();

        let document = Html::parse_document(&html);
        let raw_jobs = Self::embedded_jobs(&document)?;

        if raw_jobs.is_empty() {
            tracing::info!("no embedded job data, falling back to DOM parsing");
            return self.parse_cards(&document, limit);
        }

        tracing::info!(count = raw_jobs.len(), "found embedded job data");
        let total = raw_jobs.len().min(limit);
        Ok(raw_jobs
            .iter()
            .take(limit)
            .enumerate()
            .map(|(idx, raw)| {
                let job = Self::map_api_job(raw);
                tracing::info!("  [{}/{}] {}", idx + 1, total, job.title);
                job
            })
            .collect())
    }
}

fn collect_jobs(data: &Value, out: &mut Vec<Map<String, Value>>) {
    match data {
        Value::Object(map) => {
            let has_company = map.contains_key("company_name") || map.contains_key("companyName");
            let has_title = map.contains_key("title") || map.contains_key("name");
            if has_company && has_title {
                out.push(map.clone());
                return;
            }

            if let Some(items) = LIST_KEYS.iter().find_map(|k| map.get(*k).and_then(Value::as_array)) {
                for item in items {
                    collect_jobs(item, out);
                }
                return;
            }

            for value in map.values() {
                if value.is_object() || value.is_array() {
                    collect_jobs(value, out);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_jobs(item, out);
            }
        }
        _ => {}
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
    }
}

/// First non-blank value among `keys`.
fn first_present<'a>(raw: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|k| raw.get(*k)).find(|v| !is_blank(v))
}

/// First non-blank string or number among `keys`, as text.
fn text_field(raw: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| raw.get(*k))
        .find_map(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

fn location_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(o) => text_field(o, &["name", "city"]),
        Value::Array(items) => {
            let joined = items
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", ");
            Some(joined).filter(|j| !j.is_empty())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn thousands(value: f64) -> String {
    let rounded = value.round_ties_even() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if rounded < 0 {
        out.insert(0, '-');
    }
    out
}

fn slugify(title: &str) -> String {
    SLUG_RE
        .replace_all(&title.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

fn capitalize(text: &str) -> String {
    let lower = text.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
