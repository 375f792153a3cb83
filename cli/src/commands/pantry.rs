use anyhow::{Result, bail};
use serde_json::json;
use std::process;
use std::sync::Arc;

use pantry_core::api::PantryApi;
use pantry_core::error::FlowError;
use pantry_core::flows::{PANTRY_PAGE_SIZE, PantryPage};
use pantry_core::models::UserIngredient;
use pantry_core::session::SessionStore;

use super::helpers::{json_error, print_json, print_pantry_table};
use super::{current_user, resolve_ingredient};

async fn open_pantry<A: PantryApi>(api: Arc<A>, session: &SessionStore) -> Result<PantryPage<A>> {
    let user = current_user(api.as_ref(), session).await?;
    Ok(PantryPage::new(api, user.id))
}

/// Prefer the message the flow recorded for the user over the raw error.
fn flow_failure<A: PantryApi>(page: &PantryPage<A>, err: FlowError, json: bool) -> Result<()> {
    let Some(message) = page.action_error() else {
        return Err(err.into());
    };
    if json {
        println!("{}", json_error(message));
        process::exit(1);
    }
    bail!("{message}")
}

pub(crate) async fn cmd_pantry_list<A: PantryApi>(
    api: Arc<A>,
    session: &SessionStore,
    page_number: u32,
    json: bool,
) -> Result<()> {
    let mut page = open_pantry(api, session).await?;
    let offset = page_number.saturating_sub(1) * PANTRY_PAGE_SIZE;
    if let Err(e) = page.load_page(offset).await {
        bail!("{}: {e}", page.list_error().unwrap_or("Failed to load ingredients"));
    }

    if page.ingredients().is_empty() {
        if json {
            println!("[]");
        } else if offset > 0 {
            eprintln!("No ingredients on page {page_number}");
        } else {
            eprintln!("No ingredients yet. Add some with 'pantry pantry add <ingredient>...'");
        }
        process::exit(2);
    }

    if json {
        print_json(&json!({
            "page": page.page_number(),
            "total": page.total(),
            "has_previous": page.can_previous(),
            "has_more": page.can_next(),
            "ingredients": page.ingredients(),
        }))?;
    } else {
        println!("Ingredients you have:");
        print_pantry_table(page.ingredients());
        let mut nav = Vec::new();
        if page.can_previous() {
            nav.push(format!("--page {}", page.page_number() - 1));
        }
        if page.can_next() {
            nav.push(format!("--page {}", page.page_number() + 1));
        }
        if nav.is_empty() {
            println!("Page {}", page.page_number());
        } else {
            println!("Page {} (more: {})", page.page_number(), nav.join(", "));
        }
    }
    Ok(())
}

pub(crate) async fn cmd_pantry_add<A: PantryApi>(
    api: Arc<A>,
    session: &SessionStore,
    ingredients: &[String],
    new: bool,
    json: bool,
) -> Result<()> {
    let mut page = open_pantry(api, session).await?;
    page.start_adding();

    let mut chosen = Vec::new();
    for (i, text) in ingredients.iter().enumerate() {
        let Some(picker) = page.picker_mut() else {
            bail!("The add form is not open");
        };
        let row = if i == 0 {
            picker.first_row()
        } else {
            picker.add_row()
        };
        let Some(row) = row else {
            bail!("Could not add another ingredient row");
        };
        chosen.push(resolve_ingredient(picker, row, text, new).await?);
    }

    if let Err(e) = page.save_add().await {
        return flow_failure(&page, e, json);
    }

    if json {
        print_json(&json!({ "added": chosen, "total": page.total() }))?;
    } else {
        let labels: Vec<String> = chosen
            .into_iter()
            .map(|c| c.into_ingredient().name)
            .collect();
        println!("Added {} to your pantry", labels.join(", "));
    }
    Ok(())
}

pub(crate) async fn cmd_pantry_edit<A: PantryApi>(
    api: Arc<A>,
    session: &SessionStore,
    user_ingredient_id: i64,
    ingredient: &str,
    new: bool,
    json: bool,
) -> Result<()> {
    let mut page = open_pantry(api, session).await?;
    let Some(entry) = find_entry(&mut page, user_ingredient_id).await? else {
        if json {
            println!("{}", json_error(&format!("No pantry entry with id {user_ingredient_id}")));
        } else {
            eprintln!("No pantry entry with id {user_ingredient_id}");
        }
        process::exit(2);
    };

    page.start_editing(&entry);
    let Some(picker) = page.picker_mut() else {
        bail!("The edit form is not open");
    };
    let Some(row) = picker.first_row() else {
        bail!("The edit form has no ingredient row");
    };
    let chosen = resolve_ingredient(picker, row, ingredient, new).await?;

    if let Err(e) = page.save_edit().await {
        return flow_failure(&page, e, json);
    }

    if json {
        print_json(&json!({ "id": user_ingredient_id, "ingredient": chosen.into_ingredient() }))?;
    } else {
        println!(
            "Replaced {} with {}",
            entry.display_name(),
            chosen.into_ingredient().name
        );
    }
    Ok(())
}

pub(crate) async fn cmd_pantry_delete<A: PantryApi>(
    api: Arc<A>,
    session: &SessionStore,
    user_ingredient_id: i64,
    json: bool,
) -> Result<()> {
    let mut page = open_pantry(api, session).await?;
    if let Err(e) = page.delete(user_ingredient_id).await {
        return flow_failure(&page, e, json);
    }

    if json {
        print_json(&json!({ "deleted": user_ingredient_id, "total": page.total() }))?;
    } else {
        println!("Removed pantry entry {user_ingredient_id}");
    }
    Ok(())
}

/// Walk the pantry pages until the entry turns up.
async fn find_entry<A: PantryApi>(
    page: &mut PantryPage<A>,
    user_ingredient_id: i64,
) -> Result<Option<UserIngredient>> {
    page.load_page(0).await?;
    loop {
        if let Some(entry) = page
            .ingredients()
            .iter()
            .find(|e| e.id == user_ingredient_id)
        {
            return Ok(Some(entry.clone()));
        }
        if !page.next_page().await? {
            return Ok(None);
        }
    }
}
