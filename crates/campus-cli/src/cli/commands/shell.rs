//! Interactive console: one long-lived page with navigation history.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use campus_core::login::LoginOutcome;
use tracing::debug;

use crate::console::Console;

const HELP: &str = "\
Commands:
  open <path>                 navigate (e.g. /resources, /dashboard)
  login <username> <password> submit the login form
  oauth <redirect-url>        complete an identity-provider sign-in
  logout                      sign out
  whoami                      show the signed-in user
  back                        go back one entry
  where                       show the current location
  help                        show this help
  quit                        leave the shell";

pub async fn run(console: &mut Console) -> Result<()> {
    println!("{}", console.render().await?);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{}> ", console.current());
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line?;
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };
        let args: Vec<&str> = words.collect();
        debug!(command, "shell command");

        match (command, args.as_slice()) {
            ("quit" | "exit", _) => break,
            ("help", _) => println!("{HELP}"),
            ("where", _) => println!("{}", console.current()),
            ("open", [path]) => println!("{}", console.open(path).await?),
            ("back", _) => match console.back().await? {
                Some(page) => println!("{page}"),
                None => println!("Nothing to go back to."),
            },
            ("login", [username, password]) => {
                if let LoginOutcome::Rejected(message) =
                    console.submit_login(username, password).await
                {
                    println!("! {message}");
                }
                println!("{}", console.render().await?);
            }
            ("oauth", [url]) => {
                // The outcome is reflected in where the navigator lands.
                console.complete_redirect(url).await;
                println!("{}", console.render().await?);
            }
            ("logout", _) => {
                console.logout()?;
                println!("{}", console.render().await?);
            }
            ("whoami", _) => match console.session().session() {
                Some(record) => println!("{} ({})", record.display_name(), record.role),
                None => println!("Not logged in."),
            },
            _ => println!("Unknown command. Type `help` for a list."),
        }
    }

    Ok(())
}
