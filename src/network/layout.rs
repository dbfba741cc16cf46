use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use super::levels::LevelAssignment;
use super::trim::TrimGraph;
use crate::config::LayoutConfig;
use crate::util::mean;

/// Canvas coordinates, before normalisation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Layered layout: rows by level, barycenter ordering upwards then one smoothing pass downwards.
pub fn layered_layout(
    graph: &TrimGraph,
    levels: &LevelAssignment,
    nodes: &[String],
    config: &LayoutConfig,
) -> HashMap<String, Position> {
    if nodes.is_empty() {
        return HashMap::new();
    }

    let mut tiers: BTreeMap<usize, Vec<String>> = BTreeMap::new();
    for id in nodes {
        let level = levels.level(id).unwrap_or(0);
        tiers.entry(level).or_default().push(id.clone());
    }
    for ids in tiers.values_mut() {
        ids.sort();
    }

    let shown = nodes.iter().map(String::as_str).collect::<HashSet<_>>();
    let mut xs: HashMap<String, f64> = HashMap::with_capacity(nodes.len());

    for (index, ids) in tiers.values().enumerate() {
        let slot = config.width / (ids.len() as f64 + 1.0);

        if index == 0 {
            for (i, id) in ids.iter().enumerate() {
                xs.insert(id.clone(), slot * (i as f64 + 1.0));
            }
            continue;
        }

        let mut ranked = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let below = graph
                    .trim_contains(id)
                    .iter()
                    .filter(|other| shown.contains(other.as_str()))
                    .filter_map(|other| xs.get(other).copied())
                    .collect::<Vec<_>>();
                let barycenter = mean(&below).unwrap_or(slot * (i as f64 + 1.0));
                (id, barycenter)
            })
            .collect::<Vec<_>>();

        // stable: equal barycenters keep id order
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

        for (rank, (id, _)) in ranked.into_iter().enumerate() {
            xs.insert(id.clone(), slot * (rank as f64 + 1.0));
        }
    }

    let rows = tiers.values().collect::<Vec<_>>();
    for index in (0..rows.len().saturating_sub(1)).rev() {
        let upper = rows[index + 1];
        for id in rows[index] {
            let neighbors = upper
                .iter()
                .filter(|other| {
                    graph.trim_contains(id).contains(*other) || graph.trim_within(id).contains(*other)
                })
                .filter_map(|other| xs.get(other).copied())
                .collect::<Vec<_>>();

            if let Some(barycenter) = mean(&neighbors)
                && let Some(x) = xs.get_mut(id)
            {
                *x = (*x + barycenter) / 2.0;
            }
        }
    }

    let top_level = tiers.keys().next_back().copied().unwrap_or(0);
    let spacing = config.level_spacing();

    tiers
        .iter()
        .flat_map(|(level, ids)| {
            let y = (top_level - level) as f64 * spacing + spacing / 2.0;
            ids.iter().map(move |id| (id, y))
        })
        .map(|(id, y)| {
            let x = xs.get(id).copied().unwrap_or(0.0) * config.x_stretch;
            (id.clone(), Position { x, y })
        })
        .collect()
}
