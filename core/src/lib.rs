pub mod analysis;
pub mod error;
pub mod index;
pub mod recommend;
pub mod store;
pub mod tokenizer;
pub mod vectorize;

pub use error::{MatchError, Result};
pub use index::{Corpus, JobPosting, ScoredPosting};
pub use recommend::{RecommendationIndex, DEFAULT_TOP_N};
pub use store::{default_seed, open_store, PostingStore};
