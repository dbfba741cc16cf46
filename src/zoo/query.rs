use std::collections::{BTreeSet, HashSet, VecDeque};

use serde::Serialize;

use super::registry::{ClassRegistry, ComplexityClass};
use crate::util::normalize_id;

/// How two classes relate according to the loaded theorems.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Equal,
    Subset,
    Superset,
    Unknown,
}

impl ClassRegistry {
    /// Unselected classes lying on some containment chain from `source` up to `target`.
    pub fn classes_between(&self, source: &str, target: &str) -> Vec<String> {
        let source = normalize_id(source);
        let target = normalize_id(target);
        if self.class(&source).is_none() || self.class(&target).is_none() {
            return Vec::new();
        }

        let above_source = self.closure(&source, |class| class.within());
        let below_target = self.closure(&target, |class| class.contains());

        above_source
            .intersection(&below_target)
            .filter(|id| **id != source && **id != target)
            .filter(|id| !self.selected_classes().contains(*id))
            .cloned()
            .collect()
    }

    /// Unselected classes directly related to `id`: containing, contained, equal and optionally its co-class.
    pub fn connected_classes(&self, id: &str, include_co_class: bool) -> Vec<String> {
        let id = normalize_id(id);
        let Some(class) = self.class(&id) else {
            return Vec::new();
        };

        let mut connected = BTreeSet::new();
        connected.extend(class.within().iter().cloned());
        connected.extend(class.contains().iter().cloned());
        connected.extend(class.equals().iter().cloned());
        if include_co_class
            && let Some(co_class) = &class.co_class
            && self.class(co_class).is_some()
        {
            connected.insert(co_class.clone());
        }

        connected
            .into_iter()
            .filter(|other| other != &id && !self.selected_classes().contains(other))
            .collect()
    }

    /// Classifies `a` against `b`, treating equal classes as interchangeable along chains.
    pub fn relationship(&self, a: &str, b: &str) -> Relation {
        let a = normalize_id(a);
        let b = normalize_id(b);
        if self.class(&a).is_none() || self.class(&b).is_none() {
            return Relation::Unknown;
        }
        if a == b || self.closure(&a, |class| class.equals()).contains(&b) {
            return Relation::Equal;
        }

        let upward = |class: &ComplexityClass| class.within().union(class.equals()).cloned().collect::<BTreeSet<_>>();
        if self.closure_owned(&a, upward).contains(&b) {
            return Relation::Subset;
        }
        if self.closure_owned(&b, upward).contains(&a) {
            return Relation::Superset;
        }
        Relation::Unknown
    }

    /// Every id reachable from `start` (inclusive) through `step`.
    pub(crate) fn closure<'a>(
        &'a self,
        start: &str,
        step: impl Fn(&'a ComplexityClass) -> &'a BTreeSet<String>,
    ) -> BTreeSet<String> {
        let mut reached = BTreeSet::from([start.to_string()]);
        let mut queue = VecDeque::from([start.to_string()]);

        while let Some(current) = queue.pop_front() {
            let Some(class) = self.class(&current) else {
                continue;
            };
            for next in step(class) {
                if reached.insert(next.clone()) {
                    queue.push_back(next.clone());
                }
            }
        }

        reached
    }

    fn closure_owned(
        &self,
        start: &str,
        step: impl Fn(&ComplexityClass) -> BTreeSet<String>,
    ) -> HashSet<String> {
        let mut reached = HashSet::from([start.to_string()]);
        let mut queue = VecDeque::from([start.to_string()]);

        while let Some(current) = queue.pop_front() {
            let Some(class) = self.class(&current) else {
                continue;
            };
            for next in step(class) {
                if reached.insert(next.clone()) {
                    queue.push_back(next);
                }
            }
        }

        reached
    }
}
