use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "bazaar")]
#[command(about = "Bazaar marketplace client")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the client config TOML
    #[arg(short, long, global = true, env = "BAZAAR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Route the session starts on; used to decide whether an expired
    /// session redirects
    #[arg(long, global = true, default_value = "/")]
    pub route: String,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sign in and store the session
    Login(LoginArgs),
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List products
    Products(ListArgs),
    /// Show one product
    Product(ProductArgs),
}

#[derive(Debug, clap::Args)]
pub struct LoginArgs {
    #[arg(short, long)]
    pub email: String,
    /// Password (prefer the environment variable over the flag)
    #[arg(long, env = "BAZAAR_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Debug, clap::Args)]
pub struct ListArgs {
    /// Skip the cache and fetch from the server
    #[arg(long)]
    pub refresh: bool,
}

#[derive(Debug, clap::Args)]
pub struct ProductArgs {
    pub id: String,
    /// Skip the cache and fetch from the server
    #[arg(long)]
    pub refresh: bool,
}
