use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::theorem::{LoadError, Theorem};
use crate::util::normalize_id;

/// Called with the full selection whenever its membership changes.
pub type SelectionObserver = Box<dyn FnMut(&[String])>;

/// Bibliography entry attached to a class, stored as a `(key, title)` pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct Reference {
    pub key: String,
    pub title: String,
}

impl From<(String, String)> for Reference {
    fn from((key, title): (String, String)) -> Self {
        Self { key, title }
    }
}

impl From<Reference> for (String, String) {
    fn from(reference: Reference) -> Self {
        (reference.key, reference.title)
    }
}

/// Descriptive fields of a class as they appear in the class list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClassMetadata {
    pub name: Option<String>,
    pub latex_name: Option<String>,
    pub description: Option<String>,
    pub information: Option<String>,
    pub definition: Option<String>,
    pub see_also: Vec<String>,
    pub references: Vec<Reference>,
    pub top: bool,
    pub bottom: bool,
    #[serde(alias = "coClass")]
    pub co_class: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComplexityClass {
    pub id: String,
    pub name: String,
    pub latex_name: String,
    pub description: String,
    pub definition: String,
    pub information: String,
    pub references: Vec<Reference>,
    pub see_also: Vec<String>,
    pub top: bool,
    pub bottom: bool,
    pub co_class: Option<String>,
    contains: BTreeSet<String>,
    within: BTreeSet<String>,
    equals: BTreeSet<String>,
    relationships: BTreeSet<String>,
}

impl ComplexityClass {
    fn new(id: String, metadata: ClassMetadata) -> Self {
        let mut class = Self {
            id,
            name: String::new(),
            latex_name: String::new(),
            description: String::new(),
            definition: String::new(),
            information: String::new(),
            references: Vec::new(),
            see_also: Vec::new(),
            top: false,
            bottom: false,
            co_class: None,
            contains: BTreeSet::new(),
            within: BTreeSet::new(),
            equals: BTreeSet::new(),
            relationships: BTreeSet::new(),
        };
        class.apply_metadata(metadata);
        class
    }

    fn apply_metadata(&mut self, metadata: ClassMetadata) {
        let name = metadata.name.unwrap_or_else(|| self.id.clone());
        self.latex_name = metadata.latex_name.unwrap_or_else(|| name.clone());
        self.name = name;
        self.description = metadata.description.unwrap_or_default();
        self.definition = metadata.definition.unwrap_or_default();
        self.information = metadata.information.unwrap_or_default();
        self.references = metadata.references;
        self.see_also = metadata
            .see_also
            .iter()
            .map(|id| normalize_id(id))
            .filter(|id| !id.is_empty())
            .collect();
        self.top = metadata.top;
        self.bottom = metadata.bottom;
        self.co_class = metadata
            .co_class
            .map(|id| normalize_id(&id))
            .filter(|id| !id.is_empty());
    }

    /// Classes this class contains.
    pub fn contains(&self) -> &BTreeSet<String> {
        &self.contains
    }

    /// Classes that contain this class.
    pub fn within(&self) -> &BTreeSet<String> {
        &self.within
    }

    pub fn equals(&self) -> &BTreeSet<String> {
        &self.equals
    }

    /// Undirected containment neighbourhood.
    pub fn relationships(&self) -> &BTreeSet<String> {
        &self.relationships
    }

    pub fn degree(&self) -> usize {
        self.contains.len() + self.within.len()
    }

    /// Citation markers of the form `[KEY]` in the information text, in order of appearance.
    pub fn citation_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        let mut rest = self.information.as_str();
        while let Some(open) = rest.find('[') {
            let after = &rest[open + 1..];
            let Some(close) = after.find(']') else {
                break;
            };
            let key = &after[..close];
            if !key.is_empty()
                && key.chars().all(|c| c.is_ascii_alphanumeric())
                && !keys.iter().any(|known| known == key)
            {
                keys.push(key.to_string());
            }
            rest = &after[close + 1..];
        }
        keys
    }
}

/// All known classes, their base relationships and the current selection.
#[derive(Default)]
pub struct ClassRegistry {
    classes: HashMap<String, ComplexityClass>,
    order: Vec<String>,
    theorems: Vec<Theorem>,
    selected: Vec<String>,
    observer: Option<SelectionObserver>,
}

impl fmt::Debug for ClassRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassRegistry")
            .field("classes", &self.order.len())
            .field("theorems", &self.theorems.len())
            .field("selected", &self.selected)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Registers a class. Re-adding an id replaces its metadata and keeps its relationships.
    pub fn add_class(&mut self, id: &str, metadata: ClassMetadata) -> Result<(), LoadError> {
        let id = normalize_id(id);
        if id.is_empty() {
            return Err(LoadError::EmptyId);
        }

        if let Some(existing) = self.classes.get_mut(&id) {
            debug!(class = %id, "overwriting class metadata");
            existing.apply_metadata(metadata);
            return Ok(());
        }

        self.order.push(id.clone());
        self.classes
            .insert(id.clone(), ComplexityClass::new(id, metadata));
        Ok(())
    }

    pub fn get_class(&self, id: &str) -> Option<&ComplexityClass> {
        self.classes.get(&normalize_id(id))
    }

    pub(crate) fn class(&self, id: &str) -> Option<&ComplexityClass> {
        self.classes.get(id)
    }

    pub fn contains_class(&self, id: &str) -> bool {
        self.classes.contains_key(&normalize_id(id))
    }

    /// Classes in registration order.
    pub fn all_classes(&self) -> impl Iterator<Item = &ComplexityClass> {
        self.order.iter().filter_map(|id| self.classes.get(id))
    }

    pub fn class_ids(&self) -> &[String] {
        &self.order
    }

    pub fn theorems(&self) -> &[Theorem] {
        &self.theorems
    }

    pub fn add_theorem(&mut self, theorem: Theorem) -> Result<(), LoadError> {
        let theorem = theorem.normalized();
        match &theorem {
            Theorem::Containment { small, large } => {
                self.expect_class(small)?;
                self.expect_class(large)?;
                if small == large {
                    return Err(LoadError::SelfRelation { id: small.clone() });
                }
                if self.reaches_upward(large, small) {
                    return Err(LoadError::ContainmentCycle {
                        small: small.clone(),
                        large: large.clone(),
                    });
                }

                if let Some(class) = self.classes.get_mut(small) {
                    class.within.insert(large.clone());
                    class.relationships.insert(large.clone());
                }
                if let Some(class) = self.classes.get_mut(large) {
                    class.contains.insert(small.clone());
                    class.relationships.insert(small.clone());
                }
            }
            Theorem::Equality { a, b } => {
                self.expect_class(a)?;
                self.expect_class(b)?;
                if a == b {
                    return Err(LoadError::SelfRelation { id: a.clone() });
                }

                if let Some(class) = self.classes.get_mut(a) {
                    class.equals.insert(b.clone());
                }
                if let Some(class) = self.classes.get_mut(b) {
                    class.equals.insert(a.clone());
                }
            }
        }

        if !self.theorems.contains(&theorem) {
            self.theorems.push(theorem);
        }
        Ok(())
    }

    fn expect_class(&self, id: &str) -> Result<(), LoadError> {
        if self.classes.contains_key(id) {
            Ok(())
        } else {
            Err(LoadError::UnknownClass { id: id.to_string() })
        }
    }

    /// Whether `target` is reachable from `source` by following `within` edges.
    pub(crate) fn reaches_upward(&self, source: &str, target: &str) -> bool {
        let mut queue = VecDeque::from([source]);
        let mut visited = HashSet::from([source]);

        while let Some(current) = queue.pop_front() {
            if current == target {
                return true;
            }
            let Some(class) = self.classes.get(current) else {
                continue;
            };
            for next in &class.within {
                if visited.insert(next.as_str()) {
                    queue.push_back(next.as_str());
                }
            }
        }

        false
    }

    pub fn set_selection_observer(&mut self, observer: SelectionObserver) {
        self.observer = Some(observer);
    }

    pub fn clear_selection_observer(&mut self) {
        self.observer = None;
    }

    pub fn is_class_selected(&self, id: &str) -> bool {
        let id = normalize_id(id);
        self.selected.contains(&id)
    }

    /// Selected ids in first-selected order.
    pub fn selected_classes(&self) -> &[String] {
        &self.selected
    }

    /// Adds a known class to the selection. Returns whether the selection changed.
    pub fn select_class(&mut self, id: &str) -> bool {
        let id = normalize_id(id);
        if !self.classes.contains_key(&id) {
            debug!(class = %id, "ignoring selection of unknown class");
            return false;
        }
        if self.selected.contains(&id) {
            return false;
        }

        self.selected.push(id);
        self.notify_selection();
        true
    }

    /// Removes a class from the selection. Returns whether the selection changed.
    pub fn deselect_class(&mut self, id: &str) -> bool {
        let id = normalize_id(id);
        let Some(position) = self.selected.iter().position(|selected| selected == &id) else {
            return false;
        };

        self.selected.remove(position);
        self.notify_selection();
        true
    }

    pub fn select_all(&mut self) {
        if self.selected.len() == self.order.len() {
            return;
        }
        for id in &self.order {
            if !self.selected.contains(id) {
                self.selected.push(id.clone());
            }
        }
        self.notify_selection();
    }

    pub fn clear_selection(&mut self) {
        if self.selected.is_empty() {
            return;
        }
        self.selected.clear();
        self.notify_selection();
    }

    fn notify_selection(&mut self) {
        if let Some(observer) = self.observer.as_mut() {
            observer(&self.selected);
        }
    }
}
