use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use serde::Serialize;

use crate::zoo::ClassRegistry;

pub const DEFAULT_SEARCH_LIMIT: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub name: String,
    pub selected: bool,
    pub score: i64,
}

impl ClassRegistry {
    /// Fuzzy lookup over ids and display names. An empty query lists classes in load order.
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        let query = query.trim();
        if query.is_empty() {
            return self
                .all_classes()
                .take(limit)
                .map(|class| SearchHit {
                    id: class.id.clone(),
                    name: class.name.clone(),
                    selected: self.selected_classes().contains(&class.id),
                    score: 0,
                })
                .collect();
        }

        let matcher = SkimMatcherV2::default();
        let mut hits = self
            .all_classes()
            .filter_map(|class| {
                let score = [
                    fuzzy_match_score(&matcher, &class.id, query),
                    fuzzy_match_score(&matcher, &class.name, query),
                ]
                .into_iter()
                .flatten()
                .max()?;

                Some(SearchHit {
                    id: class.id.clone(),
                    name: class.name.clone(),
                    selected: self.selected_classes().contains(&class.id),
                    score,
                })
            })
            .collect::<Vec<_>>();

        hits.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        hits.truncate(limit);
        hits
    }
}

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}
