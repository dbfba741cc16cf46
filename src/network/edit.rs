use tracing::debug;

use super::{NetworkLink, NetworkProcessor};
use crate::util::normalize_id;

impl NetworkProcessor {
    /// Selects every class strictly between `source` and `target`. Returns the newly selected ids.
    pub fn expand_edge(&mut self, source: &str, target: &str) -> Vec<String> {
        let between = self.registry.classes_between(source, target);
        let added = between
            .into_iter()
            .filter(|id| self.registry.select_class(id))
            .collect::<Vec<_>>();
        debug!(source, target, added = added.len(), "expanded edge");
        added
    }

    /// Selects the direct neighbours of `id`, and its complement class when asked.
    pub fn expand_node(&mut self, id: &str, include_co_class: bool) -> Vec<String> {
        let connected = self.registry.connected_classes(id, include_co_class);
        let added = connected
            .into_iter()
            .filter(|other| self.registry.select_class(other))
            .collect::<Vec<_>>();
        debug!(id, added = added.len(), "expanded node");
        added
    }

    /// Drops a shown class from the current view without a full recompute.
    ///
    /// Every below/above pair that loses its only connection gets a direct link, and those links
    /// are returned. The class and the selected classes merged into it are deselected.
    pub fn remove_from_view(&mut self, id: &str) -> Vec<NetworkLink> {
        let id = normalize_id(id);
        let mut synthesized = Vec::new();
        let mut released = vec![id.clone()];

        if let Some(view) = self.view.as_mut()
            && view.trim.is_shown(&id)
        {
            let graph = &mut view.trim.graph;
            let below = graph.trim_contains(&id).clone();
            let above = graph.trim_within(&id).clone();

            for smaller in &below {
                for larger in &above {
                    if smaller != larger && !graph.has_indirect_path(smaller, larger, Some(id.as_str())) {
                        synthesized.push(NetworkLink {
                            source: smaller.clone(),
                            target: larger.clone(),
                        });
                    }
                }
            }

            graph.detach(&id);
            for link in &synthesized {
                graph.link(&link.source, &link.target);
            }

            released.extend(view.trim.equal_classes(&id));
            view.trim.classes.retain(|class| class != &id);
            view.trim.groups.retain(|group| group.main != id);
            view.trim.main_class.retain(|_, main| main != &id);
            view.trim.refresh_extremes();
            view.positions.remove(&id);
        }

        for class in &released {
            self.registry.deselect_class(class);
        }
        debug!(id = %id, synthesized = synthesized.len(), "removed class from view");
        synthesized
    }
}
