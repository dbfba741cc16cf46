mod collect;
mod parse;
mod query;
mod registry;
mod theorem;

pub use collect::{LoadReport, build_registry, load_classes, load_network, load_theorems};
pub use query::Relation;
pub use registry::{ClassMetadata, ClassRegistry, ComplexityClass, Reference, SelectionObserver};
pub use theorem::{LoadError, Theorem};
