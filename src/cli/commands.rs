use clap::{Parser, Subcommand};

/// `Covenant` - agreement management with e-signature and AI review.
#[derive(Parser, Debug)]
#[command(name = "covenant")]
#[command(version)]
#[command(about = "Agreement management service: e-signatures, analysis, and insights.", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port to listen on (use 0 for random available port; default from config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (default from config)
        #[arg(long)]
        host: Option<String>,
    },

    /// Create a user account from the command line
    Register {
        /// Display name
        #[arg(long)]
        name: String,

        /// Login email
        #[arg(long)]
        email: String,

        /// Password
        #[arg(long)]
        password: String,

        /// Create and join a new organization with this name
        #[arg(long)]
        organization: Option<String>,
    },

    /// Check database connectivity and integration readiness
    Doctor,
}
