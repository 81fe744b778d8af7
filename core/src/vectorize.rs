use crate::index::TermId;
use crate::tokenizer::terms;
use std::collections::HashMap;

/// Sparse vector as (term_id, weight) pairs sorted by term id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(TermId, f32)>,
}

impl SparseVector {
    pub fn from_map(map: HashMap<TermId, f32>) -> Self {
        let mut entries: Vec<(TermId, f32)> = map.into_iter().filter(|(_, w)| *w != 0.0).collect();
        entries.sort_by_key(|(t, _)| *t);
        Self { entries }
    }
    pub fn entries(&self) -> &[(TermId, f32)] { &self.entries }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
    pub fn norm(&self) -> f32 { self.entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt() }

    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j, mut acc) = (0, 0, 0.0f32);
        while i < self.entries.len() && j < other.entries.len() {
            let (ta, wa) = self.entries[i];
            let (tb, wb) = other.entries[j];
            if ta == tb {
                acc += wa * wb;
                i += 1;
                j += 1;
            } else if ta < tb {
                i += 1;
            } else {
                j += 1;
            }
        }
        acc
    }

    fn normalize(&mut self) {
        let n = self.norm();
        if n > 0.0 {
            for (_, w) in self.entries.iter_mut() { *w /= n; }
        }
    }
}

/// Builds a vector space over a set of texts.
pub trait Vectorizer: Send + Sync {
    type Model: Embedder;
    fn fit(&self, texts: &[&str]) -> Self::Model;
}

/// A fitted vector space.
pub trait Embedder {
    fn embed(&self, text: &str) -> SparseVector;
}

pub trait Similarity: Send + Sync {
    fn similarity(&self, a: &SparseVector, b: &SparseVector) -> f32;
}

#[derive(Debug, Clone, Copy)]
pub struct TfIdfConfig {
    /// Use 1 + ln(tf) instead of the raw count.
    pub sublinear_tf: bool,
    /// Use ln((1 + n) / (1 + df)) + 1 instead of ln(n / df) + 1.
    pub smooth_idf: bool,
}

impl Default for TfIdfConfig {
    fn default() -> Self { Self { sublinear_tf: false, smooth_idf: true } }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TfIdfVectorizer {
    pub config: TfIdfConfig,
}

impl TfIdfVectorizer {
    pub fn new(config: TfIdfConfig) -> Self { Self { config } }
}

pub struct TfIdfModel {
    dictionary: HashMap<String, TermId>,
    idf: Vec<f32>,
    sublinear_tf: bool,
}

impl Vectorizer for TfIdfVectorizer {
    type Model = TfIdfModel;

    fn fit(&self, texts: &[&str]) -> TfIdfModel {
        let mut dictionary: HashMap<String, TermId> = HashMap::new();
        let mut df: Vec<u32> = Vec::new();
        for text in texts {
            let mut seen: Vec<TermId> = Vec::new();
            for term in terms(text) {
                let next = dictionary.len() as TermId;
                let tid = *dictionary.entry(term).or_insert(next);
                if tid as usize == df.len() { df.push(0); }
                if !seen.contains(&tid) {
                    df[tid as usize] += 1;
                    seen.push(tid);
                }
            }
        }

        let n = texts.len() as f32;
        let idf = df
            .iter()
            .map(|&d| {
                let d = d as f32;
                if self.config.smooth_idf { ((1.0 + n) / (1.0 + d)).ln() + 1.0 } else { (n / d).ln() + 1.0 }
            })
            .collect();
        TfIdfModel { dictionary, idf, sublinear_tf: self.config.sublinear_tf }
    }
}

impl Embedder for TfIdfModel {
    fn embed(&self, text: &str) -> SparseVector {
        let mut tf_raw: HashMap<TermId, u32> = HashMap::new();
        for term in terms(text) {
            if let Some(&tid) = self.dictionary.get(&term) {
                *tf_raw.entry(tid).or_insert(0) += 1;
            }
        }
        let weights = tf_raw
            .into_iter()
            .map(|(tid, count)| {
                let tf = if self.sublinear_tf { 1.0 + (count as f32).ln() } else { count as f32 };
                (tid, tf * self.idf[tid as usize])
            })
            .collect();
        let mut v = SparseVector::from_map(weights);
        v.normalize();
        v
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Cosine;

impl Similarity for Cosine {
    fn similarity(&self, a: &SparseVector, b: &SparseVector) -> f32 {
        let denom = a.norm() * b.norm();
        if denom == 0.0 { return 0.0; }
        (a.dot(b) / denom).clamp(0.0, 1.0)
    }
}
