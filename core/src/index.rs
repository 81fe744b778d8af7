use serde::{Deserialize, Serialize};

pub type TermId = u32;
pub type JobId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: JobId,
    pub title: String,
    pub description: String,
}

impl JobPosting {
    pub fn new(id: JobId, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { id, title: title.into(), description: description.into() }
    }
}

/// In-memory postings in load order. Positions are stable for the life of the snapshot.
#[derive(Debug, Default, Clone)]
pub struct Corpus {
    postings: Vec<JobPosting>,
}

impl Corpus {
    pub fn new(postings: Vec<JobPosting>) -> Self { Self { postings } }
    pub fn len(&self) -> usize { self.postings.len() }
    pub fn is_empty(&self) -> bool { self.postings.is_empty() }
    pub fn postings(&self) -> &[JobPosting] { &self.postings }
    pub fn get(&self, id: JobId) -> Option<&JobPosting> { self.postings.iter().find(|p| p.id == id) }
    pub fn descriptions(&self) -> impl Iterator<Item = &str> { self.postings.iter().map(|p| p.description.as_str()) }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredPosting {
    #[serde(flatten)]
    pub posting: JobPosting,
    pub score: f32, // cosine similarity against the query
}
