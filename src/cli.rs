use crate::environment::DEFAULT_ENVIRONMENT;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "apiprobe",
    version,
    about = "Interactive runner for declarative HTTP request definitions"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run requests in interactive mode
    #[command(visible_aliases = ["int", "i"])]
    Interactive {
        /// Environment that will be used
        #[arg(short, long, default_value = DEFAULT_ENVIRONMENT)]
        env: String,
        /// Use default values when possible
        #[arg(short = 'd', long)]
        use_defaults: bool,
    },

    /// Execute one request and exit
    #[command(visible_aliases = ["req", "r"])]
    Request {
        /// Name of the request to execute, optionally `module:name`
        request: String,
        /// Environment that will be used
        #[arg(short, long, default_value = DEFAULT_ENVIRONMENT)]
        env: String,
        /// Use default values when possible
        #[arg(short = 'd', long)]
        use_defaults: bool,
        /// Arguments for the request, `key=value` or bare `flag`
        #[arg(short = 'a', long = "arg")]
        arguments: Vec<String>,
        /// Skip the cache for this invocation
        #[arg(long)]
        no_cache: bool,
    },

    /// List all available requests and their arguments
    #[command(name = "list-requests", visible_aliases = ["list", "l"])]
    ListRequests {
        /// Module name, `module:request`, or `:request`
        module: Option<String>,
    },

    /// List all available environments
    #[command(name = "list-environments", visible_aliases = ["envs", "e"])]
    ListEnvironments,
}
