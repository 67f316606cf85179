pub mod cache;
pub mod entry;
pub mod review;
pub mod stats;
pub mod translation;

pub use cache::{CacheEntry, CacheKey};
pub use entry::{
    EntryFingerprint, EntryId, EntryState, NewEntry, Provenance, ReviewOutcome, ReviewState,
    ReviewUpdate, VocabularyEntry,
};
pub use review::{
    BatchReviewSummary, Difficulty, ReviewStatistics, ReviewSubmission, UrgencyBuckets,
    UrgencyLevel,
};
pub use stats::{DailyStat, StatDelta};
pub use translation::{
    BackendKind, EntryType, TranslationContext, TranslationResult, TranslatorType,
};
