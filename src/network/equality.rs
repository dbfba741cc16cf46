use std::collections::{BTreeSet, HashSet};

use crate::zoo::ClassRegistry;

/// Mutually equal classes around at least one selected class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EqualityGroup {
    /// The selected member that stands in for the whole group.
    pub main: String,
    /// Full `equals` closure, selected or not.
    pub members: BTreeSet<String>,
    /// Selected members in selection order.
    pub selected: Vec<String>,
}

/// Partitions the selection into equality groups, in first-seen selection order.
///
/// A group spans the whole `equals` closure, so two selected classes end up together even when
/// the class linking them is not selected. Only selected members compete for the main class.
pub fn equality_groups(registry: &ClassRegistry, selection: &[String]) -> Vec<EqualityGroup> {
    let mut assigned = HashSet::new();
    let mut groups = Vec::new();

    for id in selection {
        if assigned.contains(id.as_str()) || registry.class(id).is_none() {
            continue;
        }

        let members = registry.closure(id, |class| class.equals());
        let in_group = selection
            .iter()
            .filter(|candidate| members.contains(*candidate))
            .collect::<Vec<_>>();
        let selected_members = in_group.iter().map(|id| (*id).clone()).collect::<Vec<_>>();

        let Some(main) = choose_main_class(registry, &selected_members) else {
            continue;
        };

        assigned.extend(in_group.into_iter().map(String::as_str));
        groups.push(EqualityGroup {
            main,
            members,
            selected: selected_members,
        });
    }

    groups
}

/// Highest base degree wins, ties go to the smallest id.
pub fn choose_main_class(registry: &ClassRegistry, candidates: &[String]) -> Option<String> {
    candidates
        .iter()
        .filter_map(|id| registry.class(id).map(|class| (class.degree(), id)))
        .min_by(|(a_degree, a_id), (b_degree, b_id)| b_degree.cmp(a_degree).then_with(|| a_id.cmp(b_id)))
        .map(|(_, id)| id.clone())
}
