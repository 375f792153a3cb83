mod account;
mod helpers;
mod pantry;
mod recipes;

use anyhow::{Result, bail};
use tracing::debug;

use pantry_core::api::PantryApi;
use pantry_core::candidate::Candidate;
use pantry_core::flows::{UserLookup, lookup_user};
use pantry_core::models::User;
use pantry_core::picker::{IngredientPicker, RowId};
use pantry_core::session::SessionStore;

use helpers::{print_candidate_table, prompt_choice};

pub(crate) use account::{cmd_logout, cmd_register, cmd_whoami};
pub(crate) use pantry::{cmd_pantry_add, cmd_pantry_delete, cmd_pantry_edit, cmd_pantry_list};
pub(crate) use recipes::{cmd_categories, cmd_cuisines, cmd_recipe, cmd_recipes};

/// The registered user, looked up by the email remembered in the session.
pub(super) async fn current_user<A: PantryApi>(api: &A, session: &SessionStore) -> Result<User> {
    let Some(email) = session.get_email()? else {
        bail!("Not registered yet. Run 'pantry register <email> <ingredient>...' first");
    };
    match lookup_user(api, &email).await? {
        UserLookup::Found(user) => Ok(user),
        UserLookup::NotFound => {
            bail!("No account found for {email}. Run 'pantry logout' and register again")
        }
    }
}

/// Type `text` into a picker row and settle on one candidate.
///
/// With `new` the text is taken as a new ingredient without searching. A
/// single existing candidate whose name matches exactly, or a result list
/// holding only the "add as new" entry, is chosen without asking.
pub(super) async fn resolve_ingredient<A: PantryApi>(
    picker: &mut IngredientPicker<A>,
    row: RowId,
    text: &str,
    new: bool,
) -> Result<Candidate> {
    if text.trim().is_empty() {
        bail!("Ingredient name cannot be empty");
    }
    picker.on_input_change(row, text);

    let candidate = if new {
        let name = picker.input_text(row).unwrap_or(text).trim().to_string();
        Candidate::NewEntry { name }
    } else {
        let state = picker.settled(row).await;
        if let Some(error) = state.error {
            bail!(error);
        }
        pick_candidate(state.items, text)?
    };

    debug!(row = %row, candidate = %candidate.label(), "ingredient resolved");
    picker.on_ingredient_select(row, Some(candidate.clone()));
    Ok(candidate)
}

fn pick_candidate(candidates: Vec<Candidate>, text: &str) -> Result<Candidate> {
    if candidates.is_empty() {
        bail!("No ingredients found for '{text}'");
    }
    let wanted = text.trim().to_lowercase();
    let mut exact = candidates.iter().filter(|c| match c {
        Candidate::Existing { name, .. } => name.to_lowercase() == wanted,
        Candidate::NewEntry { .. } => false,
    });
    if let (Some(only), None) = (exact.next(), exact.next()) {
        return Ok(only.clone());
    }
    if let [only] = candidates.as_slice() {
        return Ok(only.clone());
    }

    eprintln!("Ingredients matching '{text}':");
    print_candidate_table(&candidates);
    let idx = prompt_choice("an ingredient", candidates.len())?;
    candidates
        .into_iter()
        .nth(idx)
        .ok_or_else(|| anyhow::anyhow!("Selection out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn existing(id: i64, name: &str) -> Candidate {
        Candidate::Existing {
            id,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_pick_only_new_entry() {
        let picked = pick_candidate(
            vec![Candidate::NewEntry {
                name: "ogbono".to_string(),
            }],
            "ogbono",
        )
        .unwrap();
        assert!(picked.is_new_entry());
    }

    #[test]
    fn test_pick_exact_match_ignores_case() {
        let candidates = vec![
            existing(1, "Tomato"),
            existing(3, "Tomato paste"),
            Candidate::NewEntry {
                name: "tomato".to_string(),
            },
        ];
        assert_eq!(pick_candidate(candidates, " tomato ").unwrap(), existing(1, "Tomato"));
    }

    #[test]
    fn test_pick_nothing() {
        assert!(pick_candidate(Vec::new(), "x").is_err());
    }
}
