#![cfg(feature = "cli")]

use std::process::ExitCode;

use clap::{Arg, Command};
use dialoguer::{Confirm, Password};
use quizdom_account_portal::account::NOT_AVAILABLE;
use quizdom_account_portal::config::PortalConfig;
use quizdom_account_portal::Portal;
use tracing_subscriber::EnvFilter;

const CONFIRMATIONS: [&str; 3] = [
    "I understand this deletion is permanent and irreversible",
    "I understand all my game data, statistics, and progress will be lost",
    "I understand my account cannot be recovered after deletion",
];

fn confirmed() -> dialoguer::Result<bool> {
    for statement in CONFIRMATIONS {
        let accepted = Confirm::new()
            .with_prompt(statement)
            .default(false)
            .interact()?;
        if !accepted {
            return Ok(false);
        }
    }
    Ok(true)
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("quizdom_account_portal=info".parse().unwrap()),
        )
        .init();

    let matches = Command::new("quizdom-delete-account")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Permanently delete a Quizdom account and its data")
        .arg(
            Arg::new("email")
                .short('e')
                .long("email")
                .value_name("EMAIL")
                .help("Account email address")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::new("password")
                .short('p')
                .long("password")
                .value_name("PASSWORD")
                .help("Account password (defaults to $QUIZDOM_PASSWORD, then a prompt)")
                .takes_value(true),
        )
        .arg(
            Arg::new("yes")
                .short('y')
                .long("yes")
                .help("Skip the confirmation questions"),
        )
        .get_matches();

    let email = matches.value_of("email").unwrap_or_default().to_string();
    let password = match matches
        .value_of("password")
        .map(str::to_string)
        .or_else(|| std::env::var("QUIZDOM_PASSWORD").ok())
    {
        Some(password) => password,
        None => match Password::new().with_prompt("Password").interact() {
            Ok(password) => password,
            Err(e) => {
                eprintln!("Cannot read password: {}", e);
                return ExitCode::FAILURE;
            }
        },
    };

    let portal = match PortalConfig::from_env().and_then(Portal::new) {
        Ok(portal) => portal,
        Err(e) => {
            eprintln!("Failed to initialize Firebase: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let user = match portal.sign_in(&email, &password).await {
        Ok(user) => user,
        Err(e) => {
            eprintln!("Login failed: {}", e.message());
            return ExitCode::FAILURE;
        }
    };
    println!("Logged in as: {}", user.email);

    match portal.account_details(&user).await {
        Ok(Some(details)) => {
            println!("Name: {}", details.name);
            if let Some(created_at) = &details.created_at {
                println!("Account Created: {}", created_at);
            }
            if let Some(last_login) = &details.last_login {
                println!("Last Login: {}", last_login);
            }
            for warning in &details.warnings {
                println!("Warning: {}", warning);
            }
        }
        Ok(None) => println!("Name: {}", NOT_AVAILABLE),
        Err(e) => eprintln!("Error getting user info: {}", e),
    }

    println!("This action cannot be undone. Your account and all associated data will be permanently deleted.");
    if !matches.is_present("yes") {
        match confirmed() {
            Ok(true) => {}
            Ok(false) => {
                println!("Deletion cancelled.");
                return ExitCode::SUCCESS;
            }
            Err(e) => {
                eprintln!("Cannot read confirmation: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    let result = portal.delete_account(user).await;
    println!("{}", result.summary());

    if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
