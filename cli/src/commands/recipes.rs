use anyhow::{Result, bail};
use serde_json::json;
use std::process;
use std::sync::Arc;

use pantry_core::api::PantryApi;
use pantry_core::flows::{RecipeView, Recommendations, load_recipe_details};
use pantry_core::models::{Category, Cuisine};
use pantry_core::search::{CATEGORY_SEARCH_PAGE_SIZE, CategoryLookup, DebouncedSearch};
use pantry_core::session::SessionStore;

use super::current_user;
use super::helpers::{json_error, print_json, print_named_table, print_recipe_table, prompt_choice};

pub(crate) async fn cmd_recipes<A: PantryApi>(
    api: Arc<A>,
    session: &SessionStore,
    category: Option<&str>,
    cuisine: Option<&str>,
    page: usize,
    json: bool,
) -> Result<()> {
    let user = current_user(api.as_ref(), session).await?;
    let mut recs = Recommendations::new(Arc::clone(&api), user);

    if let Some(query) = category {
        recs.search_categories(query);
        let state = recs.categories_settled().await;
        if let Some(error) = state.error {
            bail!(error);
        }
        let chosen = choose_category(&state.items, query)?;
        recs.set_category(Some(chosen.id)).await?;
    }
    if let Some(query) = cuisine {
        let cuisines = recs.load_cuisines().await?.to_vec();
        let chosen = find_cuisine(&cuisines, query)?;
        recs.set_cuisine(Some(chosen.id)).await?;
    }
    if category.is_none() && cuisine.is_none() {
        recs.load().await?;
    }

    if recs.recipes().is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("No recipes found. Add more ingredients with 'pantry pantry add'.");
        }
        process::exit(2);
    }

    recs.go_to_page(page);
    let current = recs.current_page();
    if json {
        print_json(&json!({
            "page": recs.page(),
            "total_pages": current.total_pages,
            "filters": recs.filters(),
            "recipes": current.items,
        }))?;
    } else {
        println!(
            "Here's what you can cook now, and the ones you're just a few ingredients away from."
        );
        print_recipe_table(&current.items);
        if current.total_pages > 1 {
            println!("Page {} of {}", recs.page(), current.total_pages);
        }
    }
    Ok(())
}

pub(crate) async fn cmd_recipe<A: PantryApi>(
    api: &A,
    session: &SessionStore,
    recipe_id: i64,
    json: bool,
) -> Result<()> {
    let user = current_user(api, session).await?;
    let view = load_recipe_details(api, user.id, recipe_id).await;

    let RecipeView::Loaded { details, .. } = &view else {
        let message = match &view {
            RecipeView::Failed { message } => message.clone(),
            _ => view.headline().to_string(),
        };
        if json {
            println!("{}", json_error(&message));
        } else {
            eprintln!("{message}");
        }
        process::exit(if view == RecipeView::NotFound { 2 } else { 1 });
    };

    if json {
        return print_json(&view);
    }

    let recipe = &details.recipe;
    println!("{}", recipe.name);
    for label in [
        recipe.cook_time_label(),
        recipe.prep_time_label(),
        recipe.rating_label(),
    ]
    .into_iter()
    .flatten()
    {
        println!("  {label}");
    }
    println!("\nIngredients:");
    for ingredient in &details.ingredients {
        println!("  - {ingredient}");
    }
    println!("\n{}", view.headline());
    for missing in &details.missing_ingredients {
        println!("  - {missing}");
    }
    Ok(())
}

pub(crate) async fn cmd_categories<A: PantryApi>(api: Arc<A>, query: &str, json: bool) -> Result<()> {
    let mut search = DebouncedSearch::new(CategoryLookup::new(api));
    search.search(query);
    let state = search.settled().await;
    if let Some(error) = state.error {
        bail!(error);
    }

    if state.items.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("No categories found for '{query}'");
        }
        process::exit(2);
    }

    if json {
        print_json(&state.items)?;
    } else {
        print_named_table(state.items.iter().map(|c| (c.id, c.name.as_str())));
        if state.items.len() as u32 >= CATEGORY_SEARCH_PAGE_SIZE {
            eprintln!("Showing the first {CATEGORY_SEARCH_PAGE_SIZE}; narrow the search for more.");
        }
    }
    Ok(())
}

pub(crate) async fn cmd_cuisines<A: PantryApi>(api: &A, json: bool) -> Result<()> {
    let cuisines = api.get_cuisines().await?;
    if json {
        print_json(&cuisines)?;
    } else if cuisines.is_empty() {
        eprintln!("No cuisines available");
    } else {
        print_named_table(cuisines.iter().map(|c| (c.id, c.name.as_str())));
    }
    Ok(())
}

/// An id, or a name that matches one category exactly; otherwise ask.
fn choose_category<'a>(categories: &'a [Category], query: &str) -> Result<&'a Category> {
    if let Some(found) = by_id_or_name(categories, query, |c| (c.id, &c.name)) {
        return Ok(found);
    }
    match categories {
        [] => bail!("No category matches '{query}'"),
        [only] => Ok(only),
        _ => {
            eprintln!("Categories matching '{query}':");
            print_named_table(categories.iter().map(|c| (c.id, c.name.as_str())));
            let idx = prompt_choice("a category", categories.len())?;
            Ok(&categories[idx])
        }
    }
}

fn find_cuisine<'a>(cuisines: &'a [Cuisine], query: &str) -> Result<&'a Cuisine> {
    match by_id_or_name(cuisines, query, |c| (c.id, &c.name)) {
        Some(found) => Ok(found),
        None => bail!("Unknown cuisine '{query}'. Run 'pantry cuisines' to list them"),
    }
}

fn by_id_or_name<'a, T>(
    items: &'a [T],
    query: &str,
    key: impl Fn(&T) -> (i64, &String),
) -> Option<&'a T> {
    let query = query.trim();
    if let Ok(id) = query.parse::<i64>() {
        return items.iter().find(|item| key(item).0 == id);
    }
    items
        .iter()
        .find(|item| key(item).1.eq_ignore_ascii_case(query))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories() -> Vec<Category> {
        vec![
            Category {
                id: 1,
                name: "Soups".to_string(),
            },
            Category {
                id: 2,
                name: "Soups and Stews".to_string(),
            },
        ]
    }

    #[test]
    fn test_choose_category_by_name_or_id() {
        let categories = categories();
        assert_eq!(choose_category(&categories, "soups").unwrap().id, 1);
        assert_eq!(choose_category(&categories, "2").unwrap().id, 2);
    }

    #[test]
    fn test_choose_category_none() {
        assert!(choose_category(&[], "soups").is_err());
    }

    #[test]
    fn test_find_cuisine() {
        let cuisines = vec![Cuisine {
            id: 9,
            name: "Nigerian".to_string(),
        }];
        assert_eq!(find_cuisine(&cuisines, "NIGERIAN").unwrap().id, 9);
        assert_eq!(find_cuisine(&cuisines, "9").unwrap().id, 9);
        assert!(find_cuisine(&cuisines, "Thai").is_err());
    }
}
