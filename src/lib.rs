pub mod config;
pub mod network;
pub mod search;
pub mod util;
pub mod zoo;

pub use config::LayoutConfig;
pub use network::{NetworkLink, NetworkNode, NetworkProcessor, TrimmedNetwork};
pub use search::{DEFAULT_SEARCH_LIMIT, SearchHit};
pub use zoo::{ClassRegistry, LoadError, Relation, Theorem, load_network};
