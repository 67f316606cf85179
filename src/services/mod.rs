pub mod language_detector;
pub mod router;
pub mod translation_cache;

pub use language_detector::LanguageDetector;
pub use router::{BackendRegistry, RouteOutcome, TranslatorRouter};
pub use translation_cache::TranslationCache;
