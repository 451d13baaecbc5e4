//! Command-line definitions.

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "newsfeed", version, about = "Follow your news subscriptions from the terminal")]
pub struct Cli {
    /// Server base URL, e.g. http://localhost:3000
    #[arg(long, global = true, value_name = "URL")]
    pub server: Option<String>,

    /// Push endpoint, defaults to the server URL with a ws:// scheme and /ws path
    #[arg(long, global = true, value_name = "URL")]
    pub live_url: Option<String>,

    /// Print raw JSON instead of formatted lines
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and remember the session token
    Login {
        /// Account name, defaults to the last one used
        #[arg(long)]
        name: Option<String>,

        #[arg(long, env = "NEWSFEED_PASSWORD", hide = true, hide_env_values = true)]
        password: Option<String>,
    },
    /// End the session on the server and forget the token
    Logout,
    /// Show the logged-in user
    Me,
    /// Show session state and endpoints
    Status,
    /// List all feeds, marking the ones you subscribe to
    Feeds,
    /// List news from your subscriptions
    News,
    /// List your subscriptions
    Subscriptions,
    /// Subscribe to a feed
    Subscribe {
        feed_id: String,
    },
    /// Unsubscribe from a feed
    Unsubscribe {
        feed_id: String,
    },
    /// Print news as it is pushed, until Ctrl-C
    Watch,
}
