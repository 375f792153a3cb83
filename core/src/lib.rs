//! Client-side logic of the pantry recipe recommender: the ingredient picker,
//! debounced search, payload building and the page flows, all behind the
//! [`api::PantryApi`] seam.

pub mod api;
pub mod candidate;
pub mod error;
pub mod flows;
pub mod models;
pub mod payload;
pub mod picker;
pub mod routes;
pub mod search;
pub mod session;
