use anyhow::{Context, Result};
use evently_core::identity::{IdentityProvider, ProviderProfile};
use evently_core::users::{ProfileUpdate, UserProfile};
use owo_colors::OwoColorize;

use crate::app::App;

fn prompt_password(label: &str) -> Result<String> {
    let prompt = format!("{}: ", label);
    rpassword::prompt_password(&prompt).context("Failed to read password")
}

pub async fn signup(app: &App, email: &str, username: &str) -> Result<()> {
    let password = prompt_password("Password")?;
    let confirm = prompt_password("Confirm password")?;

    let profile = app.users.register(email, &password, &confirm, username).await?;
    println!("{} Signed up as {}", "✓".green(), profile.username.bold());
    Ok(())
}

pub async fn signin(
    app: &App,
    email: String,
    provider: Option<String>,
    name: Option<String>,
) -> Result<()> {
    let shown = match provider {
        Some(provider) => {
            let profile = ProviderProfile {
                provider,
                email,
                display_name: name,
            };
            app.users.sign_in_with_provider(profile).await?.username
        }
        None => {
            let password = prompt_password("Password")?;
            app.identity.sign_in(&email, &password).await?.email
        }
    };

    println!("{} Signed in as {}", "✓".green(), shown.bold());
    Ok(())
}

pub async fn signout(app: &App) -> Result<()> {
    app.identity.sign_out().await?;
    println!("Signed out");
    Ok(())
}

pub fn whoami(app: &App) -> Result<()> {
    match app.identity.current_user() {
        Some(user) => {
            let name = user.display_name.as_deref().unwrap_or(&user.email);
            println!("{} {}", name.bold(), user.uid.dimmed());
        }
        None => println!("{}", "Not signed in".dimmed()),
    }
    Ok(())
}

pub async fn profile(app: &App, username: Option<String>, dob: Option<String>) -> Result<()> {
    let user = app.user()?;

    let profile = if username.is_none() && dob.is_none() {
        app.users.profile(&user.uid).await?
    } else {
        app.users
            .update_profile(&user.uid, ProfileUpdate { username, dob })
            .await?
    };

    print_profile(&profile);
    Ok(())
}

fn print_profile(profile: &UserProfile) {
    println!("{}", profile.username.bold());
    println!("  email:   {}", profile.email);
    println!("  dob:     {}", profile.dob.as_deref().unwrap_or("-"));
    println!("  joined:  {}", profile.created_at.dimmed());
    println!("  id:      {}", profile.id.dimmed());
}
