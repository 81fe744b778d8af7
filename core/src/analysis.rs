//! Resume analysis: entity extraction plus keyword and suggestion summaries.

use crate::tokenizer::words;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityLabel {
    Email,
    Phone,
    Url,
    Date,
    Skill,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Entity {
    pub span: String,
    pub label: EntityLabel,
}

pub trait EntityExtractor: Send + Sync {
    fn extract_entities(&self, text: &str) -> BTreeSet<Entity>;
}

const SKILLS: &[&str] = &[
    "python", "rust", "java", "javascript", "typescript", "go", "c++", "c#", "sql", "react", "node.js",
    "django", "flask", "fastapi", "docker", "kubernetes", "aws", "gcp", "azure", "linux", "git",
    "postgresql", "mongodb", "redis", "tensorflow", "pytorch", "pandas", "spark", "machine learning",
];

lazy_static! {
    static ref EMAIL: Regex = Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("valid regex");
    static ref URL: Regex = Regex::new(r"https?://[^\s,;]+").expect("valid regex");
    static ref PHONE: Regex = Regex::new(r"\+?\d[\d\s().-]{7,}\d").expect("valid regex");
    static ref DATE: Regex = Regex::new(
        r"(?i)\b(?:(?:jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?\s+)?(?:19|20)\d{2}\b"
    ).expect("valid regex");
    static ref SKILL: Regex = {
        let alts: Vec<String> = SKILLS.iter().map(|s| regex::escape(s)).collect();
        // word-ish boundaries that tolerate trailing symbols like c++ and c#
        Regex::new(&format!(r"(?i)(?:^|[^\w.+#])({})(?:$|[^\w+#])", alts.join("|"))).expect("valid regex")
    };
}

/// Regex and gazetteer entity extractor.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternExtractor;

impl EntityExtractor for PatternExtractor {
    fn extract_entities(&self, text: &str) -> BTreeSet<Entity> {
        let mut out = BTreeSet::new();
        let mut push = |span: &str, label| { out.insert(Entity { span: span.trim().to_string(), label }); };

        for m in EMAIL.find_iter(text) { push(m.as_str(), EntityLabel::Email); }
        for m in URL.find_iter(text) { push(m.as_str(), EntityLabel::Url); }
        for m in PHONE.find_iter(text) {
            // bare year ranges like "2019 - 2023" are dates, not phones
            let digits = m.as_str().chars().filter(char::is_ascii_digit).count();
            if digits >= 10 { push(m.as_str(), EntityLabel::Phone); }
        }
        for m in DATE.find_iter(text) { push(m.as_str(), EntityLabel::Date); }
        for caps in SKILL.captures_iter(text) {
            if let Some(m) = caps.get(1) { push(&m.as_str().to_lowercase(), EntityLabel::Skill); }
        }
        out
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResumeAnalysis {
    pub entities: Vec<Entity>,
    pub keywords: Vec<String>,
    pub suggestions: Vec<String>,
}

pub const MAX_KEYWORDS: usize = 10;

pub struct ResumeAnalyzer<E = PatternExtractor> {
    extractor: E,
}

impl Default for ResumeAnalyzer {
    fn default() -> Self { Self { extractor: PatternExtractor } }
}

impl<E: EntityExtractor> ResumeAnalyzer<E> {
    pub fn new(extractor: E) -> Self { Self { extractor } }

    pub fn analyze(&self, text: &str) -> ResumeAnalysis {
        let entities = self.extractor.extract_entities(text);
        let keywords: Vec<String> = words(text)
            .into_iter()
            .filter(|w| w.chars().all(char::is_alphabetic))
            .take(MAX_KEYWORDS)
            .collect();
        let suggestions = suggest(&entities, text);
        tracing::debug!(entities = entities.len(), keywords = keywords.len(), "analyzed resume");
        ResumeAnalysis { entities: entities.into_iter().collect(), keywords, suggestions }
    }
}

fn suggest(entities: &BTreeSet<Entity>, text: &str) -> Vec<String> {
    let skills = entities.iter().filter(|e| e.label == EntityLabel::Skill).count();
    let mut out = Vec::new();
    if skills < 3 { out.push("Add more technical skills".to_string()); }
    if !text.to_lowercase().contains("project") { out.push("Include recent projects".to_string()); }
    if out.is_empty() { out.push("Resume looks well rounded".to_string()); }
    out
}
