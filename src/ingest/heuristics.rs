//! Text heuristics for fields job boards rarely publish in structured form.

use regex::Regex;
use std::sync::LazyLock;

static SALARY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\$[\d,]+(?:\s*[-–—to]+\s*\$?[\d,]+)?(?:\s*(?:per\s+)?(?:year|yr|annum|annually|hour|hr|month|mo))?",
        r"(?i)(?:USD|EUR|GBP)\s*[\d,]+(?:\s*[-–—to]+\s*[\d,]+)?",
        r"(?i)[\d,]+\s*(?:USD|EUR|GBP)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

// Checked in order; the first match wins.
static EXPERIENCE_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"\b(?:intern|internship)\b", "Intern"),
        (r"\bjunior\b|entry[\s-]?level", "Junior"),
        (r"\bmid[\s-]?level\b|\bintermediate\b", "Mid"),
        (r"\bsenior\b|\bsr\.?\b", "Senior"),
        (r"\b(?:lead|principal|staff)\b", "Lead"),
        (r"\b(?:director|head of|vp|vice president)\b", "Director"),
    ]
    .iter()
    .map(|(p, level)| (Regex::new(p).unwrap(), *level))
    .collect()
});

/// Pulls the first salary-looking fragment out of free text.
pub fn extract_salary(text: &str) -> Option<String> {
    SALARY_PATTERNS
        .iter()
        .find_map(|re| re.find(text))
        .map(|m| m.as_str().trim().to_string())
}

pub fn infer_experience_level(title: &str, description: &str) -> Option<String> {
    let combined = format!("{} {}", title, description).to_lowercase();
    EXPERIENCE_PATTERNS
        .iter()
        .find(|(re, _)| re.is_match(&combined))
        .map(|(_, level)| level.to_string())
}

/// Remote, Hybrid or On-site, defaulting to On-site.
pub fn infer_location_requirement(title: &str, location: &str, description: &str) -> String {
    let combined = format!("{} {} {}", title, location, description).to_lowercase();
    if combined.contains("remote") || combined.contains("telecommut") {
        "Remote".to_string()
    } else if combined.contains("hybrid") {
        "Hybrid".to_string()
    } else {
        "On-site".to_string()
    }
}
