use anyhow::{Result, bail};
use serde_json::json;
use std::sync::Arc;

use pantry_core::api::PantryApi;
use pantry_core::error::FlowError;
use pantry_core::flows::{Registration, UserLookup, lookup_user};
use pantry_core::session::SessionStore;

use super::helpers::{json_error, print_json};
use super::resolve_ingredient;

pub(crate) async fn cmd_register<A: PantryApi>(
    api: Arc<A>,
    session: &SessionStore,
    email: &str,
    ingredients: &[String],
    new: bool,
    json: bool,
) -> Result<()> {
    let mut flow = Registration::new(api);
    flow.submit_email(email)?;

    for (i, text) in ingredients.iter().enumerate() {
        let picker = flow.picker_mut();
        let row = if i == 0 {
            picker.first_row()
        } else {
            picker.add_row()
        };
        let Some(row) = row else {
            bail!("Could not add another ingredient row");
        };
        resolve_ingredient(picker, row, text, new).await?;
    }

    match flow.submit(session).await {
        Ok(route) => {
            let payload = flow.picker().payload();
            if let Some(reason) = flow.session_warning() {
                eprintln!(
                    "Warning: your account was created but could not be remembered here ({reason})"
                );
            }
            if json {
                print_json(&json!({
                    "email": flow.email(),
                    "route": route,
                    "ingredients": payload,
                }))?;
            } else {
                let count = payload.len();
                println!(
                    "Registered {} with {count} ingredient(s). Run 'pantry recipes' to see what you can cook.",
                    flow.email().unwrap_or(email)
                );
            }
            Ok(())
        }
        Err(FlowError::Api(_) | FlowError::Validation(_)) if flow.error().is_some() => {
            let message = flow.error().unwrap_or_default().to_string();
            if json {
                println!("{}", json_error(&message));
                std::process::exit(1);
            }
            bail!(message)
        }
        Err(e) => Err(e.into()),
    }
}

pub(crate) async fn cmd_whoami<A: PantryApi>(api: &A, session: &SessionStore, json: bool) -> Result<()> {
    let Some(email) = session.get_email()? else {
        if json {
            println!("null");
        } else {
            eprintln!("Not registered");
        }
        std::process::exit(2);
    };

    match lookup_user(api, &email).await? {
        UserLookup::Found(user) => {
            if json {
                print_json(&user)?;
            } else {
                println!("{} (user id: {})", user.email, user.id);
            }
        }
        UserLookup::NotFound => {
            if json {
                println!("{}", json_error(&format!("No account found for {email}")));
            } else {
                eprintln!("{email} is remembered here but has no account on the server");
            }
            std::process::exit(2);
        }
    }
    Ok(())
}

pub(crate) fn cmd_logout(session: &SessionStore, json: bool) -> Result<()> {
    let email = session.get_email()?;
    session.clear()?;
    if json {
        print_json(&json!({ "logged_out": email }))?;
    } else if let Some(email) = email {
        println!("Forgot {email}");
    } else {
        println!("Nothing to forget");
    }
    Ok(())
}
