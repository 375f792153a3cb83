//! Multi-row ingredient picker.
//!
//! Each row pairs a free-text input with the candidates found for it. Rows
//! are addressed by a [`RowId`] that never changes while the row lives,
//! whatever ingredient the row currently holds. Every row owns its own
//! search session, so candidates typed for one row are never offered to
//! another.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

use crate::api::PantryApi;
use crate::candidate::{Candidate, find_by_key, parse_new_entry_label};
use crate::models::{Ingredient, IngredientsPayload};
use crate::payload::build_payload;
use crate::search::{DEBOUNCE_DELAY, DebouncedSearch, IngredientLookup, SearchState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RowId(u64);

impl RowId {
    #[cfg(test)]
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickerRow {
    pub id: RowId,
    pub selected: Option<Ingredient>,
}

type Session<A> = DebouncedSearch<IngredientLookup<A>>;

pub struct IngredientPicker<A: PantryApi> {
    api: Arc<A>,
    allow_multiple: bool,
    delay: Duration,
    rows: Vec<PickerRow>,
    inputs: HashMap<RowId, String>,
    sessions: HashMap<RowId, Session<A>>,
    next_id: u64,
}

impl<A: PantryApi> IngredientPicker<A> {
    /// A picker holding one empty row.
    pub fn new(api: Arc<A>, allow_multiple: bool) -> Self {
        let mut picker = Self {
            api,
            allow_multiple,
            delay: DEBOUNCE_DELAY,
            rows: Vec::new(),
            inputs: HashMap::new(),
            sessions: HashMap::new(),
            next_id: 1,
        };
        picker.push_row(None);
        picker
    }

    /// A single-row picker already bound to `ingredient`, for editing.
    pub fn with_selection(api: Arc<A>, ingredient: Ingredient) -> Self {
        let mut picker = Self::new(api, false);
        let row = picker.rows[0].id;
        picker.inputs.insert(row, ingredient.name.clone());
        picker.rows[0].selected = Some(ingredient);
        picker
    }

    #[must_use]
    pub fn with_debounce(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn allows_multiple(&self) -> bool {
        self.allow_multiple
    }

    #[must_use]
    pub fn rows(&self) -> &[PickerRow] {
        &self.rows
    }

    #[must_use]
    pub fn row(&self, id: RowId) -> Option<&PickerRow> {
        self.rows.iter().find(|r| r.id == id)
    }

    #[must_use]
    pub fn first_row(&self) -> Option<RowId> {
        self.rows.first().map(|r| r.id)
    }

    #[must_use]
    pub fn last_row(&self) -> Option<RowId> {
        self.rows.last().map(|r| r.id)
    }

    /// The text shown in a row's input: what the user typed, or the name of
    /// the selected ingredient when nothing has been typed.
    #[must_use]
    pub fn input_text(&self, id: RowId) -> Option<&str> {
        if let Some(text) = self.inputs.get(&id) {
            return Some(text.as_str());
        }
        self.row(id)
            .map(|r| r.selected.as_ref().map_or("", |i| i.name.as_str()))
    }

    #[must_use]
    pub fn candidates(&self, id: RowId) -> Vec<Candidate> {
        self.sessions
            .get(&id)
            .map(DebouncedSearch::items)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn search_state(&self, id: RowId) -> SearchState<Candidate> {
        self.sessions
            .get(&id)
            .map(DebouncedSearch::snapshot)
            .unwrap_or_default()
    }

    /// Watch a row's search results. `None` for unknown rows.
    pub fn subscribe(&mut self, id: RowId) -> Option<watch::Receiver<SearchState<Candidate>>> {
        self.row(id)?;
        Some(self.session(id).subscribe())
    }

    /// Wait until the row's search has nothing scheduled or in flight.
    pub async fn settled(&self, id: RowId) -> SearchState<Candidate> {
        match self.sessions.get(&id) {
            Some(session) => session.settled().await,
            None => SearchState::default(),
        }
    }

    /// The user typed into a row.
    ///
    /// Text in the "add as new" form is reduced to the bare name. Blank text
    /// drops the row's selection and clears its candidates; anything else
    /// starts a fresh search. A non-blank edit keeps the current selection
    /// until a new candidate is picked.
    pub fn on_input_change(&mut self, id: RowId, text: &str) {
        if self.row(id).is_none() {
            return;
        }
        let text = parse_new_entry_label(text.trim()).unwrap_or_else(|| text.to_string());
        let query = text.trim().to_string();
        self.inputs.insert(id, text);

        let session = self.session(id);
        session.reset();
        if query.is_empty() {
            if let Some(row) = self.rows.iter_mut().find(|r| r.id == id) {
                row.selected = None;
            }
            return;
        }
        session.search(&query);
    }

    /// The user picked a candidate for a row. `None` (a stray clear event) is
    /// ignored. Returns whether a row was updated.
    pub fn on_ingredient_select(&mut self, id: RowId, candidate: Option<Candidate>) -> bool {
        let Some(candidate) = candidate else {
            return false;
        };
        let Some(row) = self.rows.iter_mut().find(|r| r.id == id) else {
            return false;
        };
        let ingredient = candidate.into_ingredient();
        debug!(row = %id, ingredient = %ingredient.name, new = ingredient.id.is_none(), "ingredient selected");
        self.inputs.insert(id, ingredient.name.clone());
        row.selected = Some(ingredient);
        if let Some(session) = self.sessions.get_mut(&id) {
            session.reset();
        }
        true
    }

    /// Select the candidate whose dropdown key is `key`.
    pub fn select_by_key(&mut self, id: RowId, key: &str) -> bool {
        let candidate = find_by_key(&self.candidates(id), key).cloned();
        self.on_ingredient_select(id, candidate)
    }

    #[must_use]
    pub fn can_add_rows(&self) -> bool {
        self.allow_multiple
    }

    /// Append an empty row. `None` when the picker holds a single row only.
    pub fn add_row(&mut self) -> Option<RowId> {
        if !self.allow_multiple {
            return None;
        }
        Some(self.push_row(None))
    }

    /// Remove a row with its text and search session; remaining rows keep
    /// their order.
    pub fn remove_row(&mut self, id: RowId) -> bool {
        if !self.allow_multiple {
            return false;
        }
        let before = self.rows.len();
        self.rows.retain(|r| r.id != id);
        self.inputs.remove(&id);
        self.sessions.remove(&id);
        self.rows.len() != before
    }

    #[must_use]
    pub fn payload(&self) -> IngredientsPayload {
        build_payload(&self.rows)
    }

    /// The single selection, for single-row pickers.
    #[must_use]
    pub fn selected(&self) -> Option<&Ingredient> {
        self.rows.first().and_then(|r| r.selected.as_ref())
    }

    fn push_row(&mut self, selected: Option<Ingredient>) -> RowId {
        let id = RowId(self.next_id);
        self.next_id += 1;
        self.rows.push(PickerRow { id, selected });
        self.inputs.insert(id, String::new());
        id
    }

    fn session(&mut self, id: RowId) -> &mut Session<A> {
        let api = &self.api;
        let delay = self.delay;
        self.sessions
            .entry(id)
            .or_insert_with(|| DebouncedSearch::with_delay(IngredientLookup::new(Arc::clone(api)), delay))
    }
}
