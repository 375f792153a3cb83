use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::models::Ingredient;

static NEW_ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^Add "(.+)" as an ingredient$"#).expect("new entry pattern is valid")
});

/// An item offered in the ingredient dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Candidate {
    /// An ingredient the API already has.
    Existing { id: i64, name: String },
    /// Treat the typed text as a brand-new ingredient.
    NewEntry { name: String },
}

impl Candidate {
    /// Ingredients without an id come back as new entries.
    #[must_use]
    pub fn from_ingredient(ingredient: Ingredient) -> Self {
        match ingredient.id {
            Some(id) => Self::Existing {
                id,
                name: ingredient.name,
            },
            None => Self::NewEntry {
                name: ingredient.name,
            },
        }
    }

    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Existing { name, .. } => name.clone(),
            Self::NewEntry { name } => new_entry_label(name),
        }
    }

    /// Dropdown value: the id when there is one, the label otherwise.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Existing { id, .. } => id.to_string(),
            Self::NewEntry { .. } => self.label(),
        }
    }

    #[must_use]
    pub fn is_new_entry(&self) -> bool {
        matches!(self, Self::NewEntry { .. })
    }

    #[must_use]
    pub fn into_ingredient(self) -> Ingredient {
        match self {
            Self::Existing { id, name } => Ingredient::existing(id, name),
            Self::NewEntry { name } => Ingredient::new_entry(name),
        }
    }
}

#[must_use]
pub fn new_entry_label(name: &str) -> String {
    format!("Add \"{name}\" as an ingredient")
}

/// Extract `X` from `Add "X" as an ingredient`.
#[must_use]
pub fn parse_new_entry_label(text: &str) -> Option<String> {
    NEW_ENTRY_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Turn an ingredient whose name is a new-entry label back into a bare,
/// unpersisted ingredient. Anything else passes through untouched.
#[must_use]
pub fn parse_ingredient(ingredient: Ingredient) -> Ingredient {
    match parse_new_entry_label(&ingredient.name) {
        Some(name) => Ingredient::new_entry(name),
        None => ingredient,
    }
}

/// Search results followed by the "add as new" entry for `query`.
#[must_use]
pub fn candidates_for(query: &str, found: Vec<Ingredient>) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = found
        .into_iter()
        .map(parse_ingredient)
        .filter(|i| i.id.is_some())
        .map(Candidate::from_ingredient)
        .collect();
    candidates.push(Candidate::NewEntry {
        name: query.to_string(),
    });
    candidates
}

#[must_use]
pub fn find_by_key<'a>(candidates: &'a [Candidate], key: &str) -> Option<&'a Candidate> {
    candidates.iter().find(|c| c.key() == key)
}
