//! `tollgate`: operator tooling for the auth core.
//!
//! Reads the same `TOLLGATE_*` configuration as the services, so hashes and
//! tokens produced here are accepted by them.

use std::io::BufRead;

use anyhow::{Context, bail};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};

use tollgate_auth::config::MAX_TOKEN_TTL_SECS;
use tollgate_auth::{
    AuthConfig, CredentialStore, Role, RoleHierarchy, SubscriptionTier, TokenService,
};
use tollgate_core::AccountId;

#[derive(Debug, Parser)]
#[command(name = "tollgate", about = "Credential and token tooling")]
struct Cli {
    /// Human-readable logs instead of JSON.
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Hash a password read from stdin (for seeding accounts).
    HashPassword,
    /// Mint a session token for an account.
    IssueToken {
        #[arg(long)]
        account_id: AccountId,
        #[arg(long)]
        role: Role,
        /// Overrides the configured token TTL.
        #[arg(long)]
        ttl_secs: Option<i64>,
    },
    /// Verify a token and print its claims.
    VerifyToken { token: String },
    /// Print each role's grant set.
    Roles,
    /// Print each subscription tier's features.
    Tiers,
    /// Validate configuration from the environment.
    CheckConfig,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let format = if cli.pretty {
        tollgate_observability::LogFormat::Pretty
    } else {
        tollgate_observability::LogFormat::Json
    };
    tollgate_observability::tracing::init(format);

    match cli.command {
        Command::HashPassword => hash_password(),
        Command::IssueToken {
            account_id,
            role,
            ttl_secs,
        } => issue_token(account_id, role, ttl_secs),
        Command::VerifyToken { token } => verify_token(&token),
        Command::Roles => {
            print_roles();
            Ok(())
        }
        Command::Tiers => {
            print_tiers();
            Ok(())
        }
        Command::CheckConfig => {
            let config = load_config()?;
            println!("{config:#?}");
            Ok(())
        }
    }
}

fn load_config() -> anyhow::Result<AuthConfig> {
    AuthConfig::from_env().context("loading TOLLGATE_* configuration")
}

fn hash_password() -> anyhow::Result<()> {
    let config = load_config()?;
    let credentials =
        CredentialStore::new(config.password_work_factor, config.password_memory_kib)?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']);
    tollgate_auth::validate_password(password, config.min_password_length)?;

    let hash = credentials.hash(password)?;
    println!("{}", hash.as_phc());
    Ok(())
}

fn issue_token(account_id: AccountId, role: Role, ttl_secs: Option<i64>) -> anyhow::Result<()> {
    let config = load_config()?;
    if RoleHierarchy::standard().is_root(role) {
        tracing::warn!(%account_id, "minting a root-role token");
    }

    let ttl = match ttl_secs {
        Some(secs) => ttl_from_secs(secs)?,
        None => config.token_ttl(),
    };

    let tokens = TokenService::new(config.signing_secret.as_bytes());
    let issued = tokens.issue(account_id, role, ttl, Utc::now())?;
    println!("{}", serde_json::to_string_pretty(&issued)?);
    Ok(())
}

fn ttl_from_secs(secs: i64) -> anyhow::Result<Duration> {
    if secs <= 0 || secs > MAX_TOKEN_TTL_SECS {
        bail!("--ttl-secs must be between 1 and {MAX_TOKEN_TTL_SECS}");
    }
    Ok(Duration::seconds(secs))
}

fn verify_token(token: &str) -> anyhow::Result<()> {
    let config = load_config()?;
    let tokens = TokenService::new(config.signing_secret.as_bytes());
    let claims = tokens.verify(token, Utc::now())?;
    println!("{}", serde_json::to_string_pretty(&claims)?);
    Ok(())
}

fn print_roles() {
    let hierarchy = RoleHierarchy::standard();
    for role in Role::ALL {
        let grants: Vec<&str> = hierarchy.grant_set(role).iter().map(|r| r.as_str()).collect();
        let marker = if hierarchy.is_root(role) { " (root)" } else { "" };
        println!("{role}{marker}: {}", grants.join(", "));
    }
}

fn print_tiers() {
    for tier in SubscriptionTier::ALL {
        let features: Vec<&str> = tier.features().iter().map(|f| f.as_str()).collect();
        println!("{tier}: {}", features.join(", "));
    }
}
