//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "ahavault", version, about = "AhaVault file-sharing client")]
pub struct Cli {
    /// API base URL (overrides the config file and AHAVAULT_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an account and log in
    Register {
        email: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
        /// Invite code, if the server requires one
        #[arg(long)]
        invite: Option<String>,
    },
    /// Log in and remember the session
    Login {
        email: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// End the session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Files in your cabinet
    Files {
        #[command(subcommand)]
        sub: FilesCommand,
    },
    /// Upload a file, resuming an interrupted upload of the same file
    Upload {
        file: PathBuf,
    },
    /// Share files and print the pickup code
    Share {
        /// File ids to include
        #[arg(required = true)]
        file_ids: Vec<String>,
        /// Expiry: 1h, 24h, 7d, or seconds
        #[arg(long, default_value = "24h", value_parser = parse_expiry)]
        expires: i64,
        /// Download limit, 0 for unlimited
        #[arg(long, default_value_t = 10)]
        max_downloads: i32,
        #[arg(long)]
        password: Option<String>,
    },
    /// Shares you created
    Shares {
        #[command(subcommand)]
        sub: SharesCommand,
    },
    /// Look up a pickup code and optionally download its files
    Pickup {
        code: String,
        /// Sent when the share turns out to be protected; prompted for otherwise
        #[arg(long)]
        password: Option<String>,
        /// Download every file into this directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Copy files of a received share into your cabinet
    Save {
        code: String,
        #[arg(required = true)]
        file_ids: Vec<String>,
        #[arg(long)]
        password: Option<String>,
    },
    /// Check that the server is up
    Health,
}

#[derive(Debug, Subcommand)]
pub enum FilesCommand {
    /// List files (first 100)
    List {
        /// Filter by filename
        #[arg(long)]
        search: Option<String>,
    },
    /// Delete a file
    Delete { id: String },
    /// Download one of your files
    Download {
        id: String,
        /// Destination directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
pub enum SharesCommand {
    /// List shares page by page
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        page_size: u32,
    },
    /// Stop a share so its pickup code stops working
    Stop { id: String },
}

/// Parses `1h`, `24h`, `7d`, `30m` or plain seconds.
pub fn parse_expiry(s: &str) -> Result<i64, String> {
    let s = s.trim();
    let (digits, unit) = match s.char_indices().last() {
        Some((i, c)) if c.is_ascii_alphabetic() => (&s[..i], c.to_ascii_lowercase()),
        _ => (s, 's'),
    };
    let n: i64 = digits
        .parse()
        .map_err(|_| format!("invalid expiry `{s}`"))?;
    let secs = match unit {
        's' => n,
        'm' => n * 60,
        'h' => n * 3600,
        'd' => n * 86_400,
        _ => return Err(format!("unknown expiry unit `{unit}`")),
    };
    if secs <= 0 {
        return Err("expiry must be positive".into());
    }
    Ok(secs)
}
