mod edit;
mod equality;
mod layout;
mod levels;
mod trim;

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

pub use equality::{EqualityGroup, choose_main_class, equality_groups};
pub use layout::{Position, layered_layout};
pub use levels::{LevelAssignment, assign_levels};
pub use trim::{TrimGraph, TrimOutcome, trim_network};

use crate::config::LayoutConfig;
use crate::search::SearchHit;
use crate::util::normalize_id;
use crate::zoo::{ClassRegistry, ComplexityClass, Relation};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NetworkNode {
    pub id: String,
    pub name: String,
    pub latex_name: String,
    pub level: usize,
    pub x: f64,
    pub y: f64,
    /// Selected classes merged into this one.
    pub equal_classes: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NetworkLink {
    /// The smaller class.
    pub source: String,
    pub target: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TrimmedNetwork {
    pub nodes: Vec<NetworkNode>,
    pub links: Vec<NetworkLink>,
    #[serde(rename = "maxLevel")]
    pub max_level: usize,
    pub root_nodes: Vec<String>,
    pub top_nodes: Vec<String>,
}

impl TrimmedNetwork {
    pub fn node(&self, id: &str) -> Option<&NetworkNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn has_link(&self, source: &str, target: &str) -> bool {
        self.links
            .iter()
            .any(|link| link.source == source && link.target == target)
    }
}

/// State left behind by the last trim pass.
#[derive(Clone, Debug, Default)]
pub struct NetworkView {
    pub trim: TrimOutcome,
    pub levels: LevelAssignment,
    pub positions: HashMap<String, Position>,
}

impl NetworkView {
    fn build(registry: &ClassRegistry, config: &LayoutConfig) -> Self {
        let trim = trim_network(registry, registry.selected_classes());
        let levels = assign_levels(&trim.graph, &trim.classes);
        let positions = layered_layout(&trim.graph, &levels, &trim.classes, config);
        Self {
            trim,
            levels,
            positions,
        }
    }

    /// Renders the view into the serialisable output model.
    pub fn to_network(&self, registry: &ClassRegistry, config: &LayoutConfig) -> TrimmedNetwork {
        let max_level = self
            .trim
            .classes
            .iter()
            .filter_map(|id| self.levels.level(id))
            .max()
            .unwrap_or(0);

        let nodes = self
            .trim
            .classes
            .iter()
            .filter_map(|id| {
                let class = registry.class(id)?;
                let position = self.positions.get(id).copied().unwrap_or_default();
                let (x, y) = config.normalize(position.x, position.y, max_level);
                Some(NetworkNode {
                    id: id.clone(),
                    name: class.name.clone(),
                    latex_name: class.latex_name.clone(),
                    level: self.levels.level(id).unwrap_or(0),
                    x,
                    y,
                    equal_classes: self.trim.equal_classes(id),
                })
            })
            .collect();

        let links = self
            .trim
            .classes
            .iter()
            .flat_map(|source| {
                self.trim
                    .graph
                    .trim_within(source)
                    .iter()
                    .filter(|target| self.trim.is_shown(target))
                    .map(move |target| NetworkLink {
                        source: source.clone(),
                        target: target.clone(),
                    })
            })
            .collect();

        TrimmedNetwork {
            nodes,
            links,
            max_level,
            root_nodes: self.trim.root_nodes.clone(),
            top_nodes: self.trim.top_nodes.clone(),
        }
    }
}

/// Owns the registry and turns its selection into a laid-out network.
#[derive(Debug)]
pub struct NetworkProcessor {
    registry: ClassRegistry,
    config: LayoutConfig,
    view: Option<NetworkView>,
}

impl NetworkProcessor {
    pub fn new(registry: ClassRegistry) -> Self {
        Self::with_config(registry, LayoutConfig::default())
    }

    pub fn with_config(registry: ClassRegistry, config: LayoutConfig) -> Self {
        Self {
            registry,
            config,
            view: None,
        }
    }

    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ClassRegistry {
        &mut self.registry
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn get_class(&self, id: &str) -> Option<&ComplexityClass> {
        self.registry.get_class(id)
    }

    pub fn select_class(&mut self, id: &str) -> bool {
        self.registry.select_class(id)
    }

    pub fn deselect_class(&mut self, id: &str) -> bool {
        self.registry.deselect_class(id)
    }

    pub fn is_class_selected(&self, id: &str) -> bool {
        self.registry.is_class_selected(id)
    }

    pub fn selected_classes(&self) -> &[String] {
        self.registry.selected_classes()
    }

    /// View computed by the last [`NetworkProcessor::trimmed_network`] call.
    pub fn view(&self) -> Option<&NetworkView> {
        self.view.as_ref()
    }

    /// Trims, levels and lays out the current selection from scratch.
    pub fn trimmed_network(&mut self) -> TrimmedNetwork {
        let view = NetworkView::build(&self.registry, &self.config);
        let network = view.to_network(&self.registry, &self.config);
        debug!(
            nodes = network.nodes.len(),
            links = network.links.len(),
            max_level = network.max_level,
            "built trimmed network"
        );
        self.view = Some(view);
        network
    }

    /// Re-renders the stored view without recomputing it.
    pub fn current_network(&self) -> TrimmedNetwork {
        self.view
            .as_ref()
            .map(|view| view.to_network(&self.registry, &self.config))
            .unwrap_or_default()
    }

    /// Indirect-path query against the last trimmed graph. False before any trim pass.
    pub fn has_indirect_path(&self, source: &str, target: &str, avoid: Option<&str>) -> bool {
        let Some(view) = &self.view else {
            return false;
        };
        let avoid = avoid.map(normalize_id);
        view.trim.graph.has_indirect_path(
            &normalize_id(source),
            &normalize_id(target),
            avoid.as_deref(),
        )
    }

    pub fn trim_main_class(&self, id: &str) -> Option<&str> {
        self.view.as_ref()?.trim.trim_main_class(&normalize_id(id))
    }

    pub fn classes_between(&self, source: &str, target: &str) -> Vec<String> {
        self.registry.classes_between(source, target)
    }

    pub fn connected_classes(&self, id: &str, include_co_class: bool) -> Vec<String> {
        self.registry.connected_classes(id, include_co_class)
    }

    pub fn relationship(&self, a: &str, b: &str) -> Relation {
        self.registry.relationship(a, b)
    }

    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        self.registry.search(query, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zoo::{ClassMetadata, Theorem};

    fn processor() -> NetworkProcessor {
        let mut registry = ClassRegistry::new();
        for id in ["P", "NP", "PSPACE"] {
            registry
                .add_class(id, ClassMetadata::default())
                .expect("valid id");
        }
        for theorem in [
            Theorem::containment("P", "NP"),
            Theorem::containment("NP", "PSPACE"),
            Theorem::containment("P", "PSPACE"),
        ] {
            registry.add_theorem(theorem).expect("consistent theorem");
        }
        NetworkProcessor::new(registry)
    }

    #[test]
    fn nothing_selected_gives_empty_network() {
        let mut processor = processor();
        assert_eq!(processor.trimmed_network(), TrimmedNetwork::default());
        assert!(!processor.has_indirect_path("P", "PSPACE", None));
    }

    #[test]
    fn chain_network_is_normalised() {
        let mut processor = processor();
        for id in ["p", "np", "pspace"] {
            assert!(processor.select_class(id));
        }

        let network = processor.trimmed_network();
        assert_eq!(network.max_level, 2);
        assert_eq!(network.links.len(), 2);
        assert!(network.has_link("P", "NP"));
        assert!(network.has_link("NP", "PSPACE"));
        assert!(!network.has_link("P", "PSPACE"));

        let p = network.node("P").expect("P is shown");
        assert_eq!(p.level, 0);
        assert!((p.x - 2250.0 * 1.12 / 3000.0).abs() < 1e-9);
        assert!((p.y - 1.25).abs() < 1e-9);

        assert!(processor.has_indirect_path("p", "pspace", None));
        assert!(!processor.has_indirect_path("P", "PSPACE", Some("NP")));
        assert_eq!(processor.current_network(), network);
    }

    #[test]
    fn output_uses_renderer_field_names() {
        let mut processor = processor();
        processor.select_class("P");
        let json = serde_json::to_value(processor.trimmed_network()).expect("serialisable");
        assert_eq!(json["maxLevel"], 0);
        assert_eq!(json["root_nodes"][0], "P");
        assert_eq!(json["nodes"][0]["equal_classes"].as_array().map(Vec::len), Some(0));
    }
}
