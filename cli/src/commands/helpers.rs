use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use pantry_core::candidate::Candidate;
use pantry_core::models::{Recipe, UserIngredient};

pub(crate) fn prompt_choice(what: &str, count: usize) -> Result<usize> {
    eprint!("\nSelect {what} (1-{count}): ");
    io::stderr().flush()?;
    let stdin = io::stdin();
    let line = stdin.lock().lines().next().context("No input")??;
    parse_choice(&line, count)
}

fn parse_choice(line: &str, count: usize) -> Result<usize> {
    let n: usize = line.trim().parse().context("Invalid number")?;
    if n < 1 || n > count {
        bail!("Selection out of range");
    }
    Ok(n - 1)
}

pub(crate) fn print_candidate_table(candidates: &[Candidate]) {
    #[derive(Tabled)]
    struct CandidateRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Ingredient")]
        label: String,
    }

    let rows: Vec<CandidateRow> = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| CandidateRow {
            idx: i + 1,
            id: match c {
                Candidate::Existing { id, .. } => id.to_string(),
                Candidate::NewEntry { .. } => "new".to_string(),
            },
            label: truncate(&c.label(), 50),
        })
        .collect();

    let table = Table::new(&rows).with(Style::rounded()).to_string();
    eprintln!("{table}");
}

pub(crate) fn print_recipe_table(recipes: &[Recipe]) {
    #[derive(Tabled)]
    struct RecipeRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Recipe")]
        name: String,
        #[tabled(rename = "Cook")]
        cook: String,
        #[tabled(rename = "Prep")]
        prep: String,
        #[tabled(rename = "Rating")]
        rating: String,
        #[tabled(rename = "Missing")]
        missing: i64,
        #[tabled(rename = "")]
        badge: String,
    }

    let rows: Vec<RecipeRow> = recipes
        .iter()
        .map(|r| RecipeRow {
            id: r.id,
            name: truncate(&r.name, 35),
            cook: match r.cook_time {
                Some(0) => "none".to_string(),
                Some(m) => format!("{m} min"),
                None => "-".to_string(),
            },
            prep: r
                .prep_time
                .filter(|m| *m != 0)
                .map_or("-".into(), |m| format!("{m} min")),
            rating: r.ratings.clone().unwrap_or_else(|| "-".into()),
            missing: r.total_ingredients_missing_for_recipe,
            badge: truncate(&r.badge().message(), 45),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..6)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn print_pantry_table(entries: &[UserIngredient]) {
    #[derive(Tabled)]
    struct PantryRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Ingredient")]
        name: String,
        #[tabled(rename = "Ingredient ID")]
        ingredient_id: i64,
    }

    let rows: Vec<PantryRow> = entries
        .iter()
        .map(|e| PantryRow {
            id: e.id,
            name: truncate(e.display_name(), 40),
            ingredient_id: e.ingredient_id,
        })
        .collect();

    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
}

/// Two-column id/name table for categories and cuisines.
pub(crate) fn print_named_table<'a>(items: impl IntoIterator<Item = (i64, &'a str)>) {
    #[derive(Tabled)]
    struct NamedRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Name")]
        name: String,
    }

    let rows: Vec<NamedRow> = items
        .into_iter()
        .map(|(id, name)| NamedRow {
            id,
            name: truncate(name, 40),
        })
        .collect();

    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
