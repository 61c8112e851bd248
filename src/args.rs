use clap::{Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(version, about = "ACME dns-01 TXT record hook for FreeDNS (freedns.afraid.org)", long_about = None)]
pub struct Args {
    /// Credentials file (dns_freedns_username / dns_freedns_password)
    #[arg(long, global = true)]
    pub credentials: Option<String>,

    /// FreeDNS username
    #[arg(long, global = true, env = "FREEDNS_USERNAME")]
    pub username: Option<String>,

    /// FreeDNS password
    #[arg(long, global = true, env = "FREEDNS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// FreeDNS base URL
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Test mode - log in and look records up, but change nothing
    #[arg(long, global = true, default_value = "false")]
    pub test: bool,

    /// Verbose output
    #[arg(long, global = true, default_value = "false")]
    pub verbose: bool,

    /// Debug output
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    /// Quiet mode - suppress all output except errors
    #[arg(long, global = true, default_value = "false")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the validation TXT record (certbot --manual-auth-hook)
    Present {
        #[command(flatten)]
        challenge: Challenge,

        /// Time to wait for DNS propagation after the record is written (e.g. 30s, 2m)
        #[arg(long, default_value = "120s")]
        propagation: String,
    },
    /// Remove the validation TXT record (certbot --manual-cleanup-hook)
    Cleanup {
        #[command(flatten)]
        challenge: Challenge,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct Challenge {
    /// Domain being validated
    #[arg(long, env = "CERTBOT_DOMAIN")]
    pub domain: String,

    /// Validation content (the TXT value)
    #[arg(long, env = "CERTBOT_VALIDATION", hide_env_values = true)]
    pub content: String,

    /// Validation record name [default: _acme-challenge.<domain>]
    #[arg(long)]
    pub name: Option<String>,
}

impl Challenge {
    pub fn validation_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("_acme-challenge.{}", self.domain.trim_end_matches('.')))
    }
}

impl Args {
    pub fn new() -> Self {
        Self::parse()
    }
}
