use crate::error::{MatchError, Result};
use crate::index::{Corpus, JobPosting, ScoredPosting};
use crate::store::PostingStore;
use crate::vectorize::{Cosine, Embedder, Similarity, TfIdfVectorizer, Vectorizer};
use parking_lot::RwLock;
use std::sync::Arc;

pub const DEFAULT_TOP_N: usize = 5;

/// Ranks job postings against free-text queries.
///
/// The corpus is loaded once and served from an immutable snapshot. `refresh`
/// swaps in a new snapshot; queries already running keep the one they started with.
pub struct RecommendationIndex<V = TfIdfVectorizer, S = Cosine> {
    corpus: RwLock<Arc<Corpus>>,
    vectorizer: V,
    similarity: S,
}

impl RecommendationIndex {
    /// Seed the store if it is empty, then load every posting.
    pub fn load(store: &dyn PostingStore, seed: &[JobPosting]) -> Result<Self> {
        let postings = load_seeded(store, seed)?;
        tracing::info!(num_postings = postings.len(), "recommendation index loaded");
        Ok(Self::from_postings(postings))
    }

    pub fn from_postings(postings: Vec<JobPosting>) -> Self {
        Self {
            corpus: RwLock::new(Arc::new(Corpus::new(postings))),
            vectorizer: TfIdfVectorizer::default(),
            similarity: Cosine,
        }
    }
}

impl<V: Vectorizer, S: Similarity> RecommendationIndex<V, S> {
    pub fn with_vectorizer<V2: Vectorizer>(self, vectorizer: V2) -> RecommendationIndex<V2, S> {
        RecommendationIndex { corpus: self.corpus, vectorizer, similarity: self.similarity }
    }

    pub fn with_similarity<S2: Similarity>(self, similarity: S2) -> RecommendationIndex<V, S2> {
        RecommendationIndex { corpus: self.corpus, vectorizer: self.vectorizer, similarity }
    }

    pub fn snapshot(&self) -> Arc<Corpus> { self.corpus.read().clone() }
    pub fn len(&self) -> usize { self.corpus.read().len() }
    pub fn is_empty(&self) -> bool { self.corpus.read().is_empty() }

    /// Reload every posting from the store. The old snapshot survives a failed reload.
    pub fn refresh(&self, store: &dyn PostingStore) -> Result<usize> {
        let corpus = Arc::new(Corpus::new(store.fetch_all()?));
        let n = corpus.len();
        *self.corpus.write() = corpus;
        tracing::info!(num_postings = n, "recommendation index refreshed");
        Ok(n)
    }

    /// Top `top_n` postings by similarity to `query`, best first.
    ///
    /// The vocabulary is fitted over every description plus the query on each
    /// call. Equal scores keep corpus order, so a query sharing no terms with any
    /// posting returns the first `top_n` postings as loaded.
    pub fn recommend(&self, query: &str, top_n: usize) -> Result<Vec<ScoredPosting>> {
        if top_n == 0 {
            return Err(MatchError::InvalidArgument("top_n must be a positive integer".into()));
        }
        let corpus = self.snapshot();
        if corpus.is_empty() {
            return Err(MatchError::EmptyCorpus);
        }

        let mut texts: Vec<&str> = corpus.descriptions().collect();
        texts.push(query);
        let model = self.vectorizer.fit(&texts);
        let q = model.embed(query);

        let mut scored: Vec<(usize, f32)> = corpus
            .descriptions()
            .enumerate()
            .map(|(i, d)| (i, self.similarity.similarity(&q, &model.embed(d))))
            .collect();
        // stable: ties stay in corpus order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        tracing::debug!(query, top_n, candidates = scored.len(), "ranked postings");

        Ok(scored
            .into_iter()
            .take(top_n)
            .map(|(i, score)| ScoredPosting { posting: corpus.postings()[i].clone(), score })
            .collect())
    }
}

fn load_seeded(store: &dyn PostingStore, seed: &[JobPosting]) -> Result<Vec<JobPosting>> {
    if store.count()? == 0 {
        tracing::info!(num_seed = seed.len(), "posting store empty, inserting seed postings");
        store.insert_many(seed)?;
    }
    store.fetch_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{default_seed, MemoryStore};

    fn two_jobs() -> RecommendationIndex { RecommendationIndex::from_postings(default_seed()) }

    fn ids(results: &[ScoredPosting]) -> Vec<i64> { results.iter().map(|r| r.posting.id).collect() }

    #[test]
    fn python_web_query_prefers_engineer() {
        let results = two_jobs().recommend("Python web development", 5).unwrap();
        assert_eq!(ids(&results), vec![1, 2]);
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn empty_query_clamps_to_corpus_size() {
        let results = two_jobs().recommend("", 3).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.score == 0.0));
    }

    #[test]
    fn no_overlap_keeps_corpus_order() {
        let results = two_jobs().recommend("kubernetes", 1).unwrap();
        assert_eq!(ids(&results), vec![1]);
    }

    #[test]
    fn zero_top_n_is_invalid() {
        let err = two_jobs().recommend("python", 0).unwrap_err();
        assert!(matches!(err, MatchError::InvalidArgument(_)));
    }

    #[test]
    fn empty_corpus_is_an_error() {
        let index = RecommendationIndex::from_postings(Vec::new());
        assert!(matches!(index.recommend("python", 1), Err(MatchError::EmptyCorpus)));
    }

    #[test]
    fn load_seeds_only_empty_store() {
        let store = MemoryStore::default();
        let index = RecommendationIndex::load(&store, &default_seed()).unwrap();
        assert_eq!(index.len(), 2);

        let again = RecommendationIndex::load(&store, &default_seed()).unwrap();
        assert_eq!(again.len(), 2);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn refresh_swaps_snapshot() {
        let store = MemoryStore::default();
        let index = RecommendationIndex::load(&store, &default_seed()).unwrap();
        let before = index.snapshot();

        store.insert_many(&[JobPosting::new(3, "Rust Engineer", "Build rust services")]).unwrap();
        assert_eq!(index.refresh(&store).unwrap(), 3);
        assert_eq!(before.len(), 2);
        assert_eq!(index.recommend("rust services", 1).unwrap()[0].posting.id, 3);
    }
}
