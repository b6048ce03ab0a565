//! Authentication for the CarParter backend
//!
//! The backend issues a JWT on login through the web front end. The CLI
//! stores that bearer token and attaches it to every API request.

pub mod tokens;

use anyhow::{bail, Result};

use crate::config::Config;
pub use tokens::{StoredToken, TokenClaims, TokenStore};

/// Store a bearer token for subsequent requests.
pub async fn login(token: &str) -> Result<()> {
    let token = token.trim().trim_start_matches("Bearer ").trim();
    if token.is_empty() {
        bail!("Token is empty.");
    }

    let mut config = Config::load()?;
    config.set_auth_token(token.to_string());

    let stored = config.get_auth_token();
    if stored.as_ref().is_some_and(|t| t.is_expired()) {
        tracing::warn!("Stored token is already expired");
    }
    config.save()?;

    match stored.and_then(|t| t.claims()) {
        Some(claims) => println!(
            "Logged in as {} ({}).",
            claims.username.as_deref().unwrap_or("?"),
            claims.user_id.as_deref().unwrap_or("?")
        ),
        None => println!("Token stored."),
    }
    Ok(())
}

/// Clear stored credentials
pub async fn logout() -> Result<()> {
    let mut config = Config::load()?;
    config.clear_tokens();
    config.save()?;
    println!("Logged out.");
    Ok(())
}

/// Display current auth status
pub async fn status() -> Result<()> {
    let config = Config::load()?;

    println!("API:         {}", config.api_base_url());
    println!("Chatbot:     {}", config.chatbot_url());

    match config.get_auth_token() {
        Some(token) if !token.is_expired() => {
            println!("Token:       valid");
            if let Some(exp) = token.expires_at {
                println!("  expires_at: {}", exp);
            }
            if let Some(claims) = token.claims() {
                println!(
                    "  user:       {} ({})",
                    claims.username.as_deref().unwrap_or("?"),
                    claims.user_id.as_deref().unwrap_or("?")
                );
                if let Some(ref role) = claims.role {
                    println!("  role:       {}", role);
                }
            }
        }
        Some(_) => {
            println!("Token:       expired");
        }
        None => {
            println!("Token:       none");
        }
    }

    Ok(())
}
