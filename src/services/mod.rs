pub mod lookup;
pub mod preferences;
pub mod providers;
pub mod recommendations;
pub mod title_search;

pub use lookup::ReferenceLookup;
pub use preferences::{parse_service_ids, PreferenceStore};
pub use recommendations::{RecommendationRequest, Recommender};
pub use title_search::search_titles;
