//! Auth command handlers.

use std::io::{self, BufRead, Write};

use anyhow::{Result, bail};
use campus_core::login::{LoginOutcome, OAUTH_FAILED_MESSAGE};
use campus_core::redirect::RedirectOutcome;
use campus_core::session::{SessionRecord, mask_token};

use crate::console::Console;

fn prompt(label: &str) -> Result<String> {
    print!("{label}");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn print_logged_in(record: &SessionRecord, console: &Console) {
    println!(
        "✓ Logged in as {} ({})",
        record.display_name(),
        record.role
    );
    println!("  Session saved to: {}", console.store_path().display());
}

pub async fn login(
    console: &mut Console,
    username: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let username = match username {
        Some(username) => username,
        None => prompt("Username: ")?,
    };
    let password = match password {
        Some(password) => password,
        None => prompt("Password: ")?,
    };
    if username.is_empty() || password.is_empty() {
        bail!("Username and password are required");
    }

    match console.submit_login(&username, &password).await {
        LoginOutcome::Redirected(_) => {
            if let Some(record) = console.session().session() {
                print_logged_in(&record, console);
            }
            Ok(())
        }
        LoginOutcome::Rejected(message) => bail!("{message}"),
    }
}

pub async fn login_oauth(console: &mut Console) -> Result<()> {
    let authorize_url = console.config().oauth_authorize_url.clone();

    println!("To sign in with the identity provider:");
    println!();
    println!("  1. A browser window will open (or visit the URL below)");
    println!("  2. Sign in and approve access");
    println!("  3. Paste the URL you were redirected to");
    println!();
    println!("Authorization URL:");
    println!("  {authorize_url}");
    println!();

    // Try to open browser (best effort, skip in tests)
    if std::env::var("CAMPUS_NO_BROWSER").is_err() {
        let _ = open::that(&authorize_url);
    }

    let input = prompt("Paste redirect URL: ")?;
    if input.is_empty() {
        bail!("Redirect URL cannot be empty");
    }

    match console.complete_redirect(&input).await {
        RedirectOutcome::Completed { record, .. } => {
            println!();
            print_logged_in(&record, console);
            Ok(())
        }
        RedirectOutcome::Failed { reason, .. } => {
            bail!("{OAUTH_FAILED_MESSAGE} ({reason})")
        }
    }
}

pub fn logout(console: &mut Console) -> Result<()> {
    let had_session = console.logout()?;

    if had_session {
        println!("✓ Logged out");
        println!("  Session removed from: {}", console.store_path().display());
    } else {
        println!("Not logged in (no session found).");
    }

    Ok(())
}

pub fn whoami(console: &Console) -> Result<()> {
    let Some(record) = console.session().session() else {
        bail!("Not logged in. Run `campus login` first.");
    };

    println!("{}", record.display_name());
    println!("  username: {}", record.username);
    println!("  role:     {}", record.role);
    if let Some(email) = &record.email {
        println!("  email:    {email}");
    }
    println!("  token:    {}", mask_token(&record.token));
    Ok(())
}
