use std::path::PathBuf;

use anyhow::Context as _;

use ahavault_api_client::Client;
use ahavault_session::SessionStore;

use crate::config::CliConfig;

/// Everything a command needs: configuration, the stored session and the
/// directory both live in.
pub struct Context {
    pub config: CliConfig,
    pub session: SessionStore,
    pub config_dir: PathBuf,
    pub json: bool,
}

impl Context {
    pub fn open(config: CliConfig, json: bool) -> anyhow::Result<Self> {
        let config_dir =
            ahavault_session::config_dir().context("cannot determine the config directory")?;
        let session_path = ahavault_session::default_session_path()
            .context("cannot determine the session file path")?;
        Ok(Self {
            config,
            session: SessionStore::open_file(session_path),
            config_dir,
            json,
        })
    }

    /// API client carrying the stored token, if any.
    pub fn client(&self) -> anyhow::Result<Client> {
        let mut client = Client::new(&self.config.api_url)
            .with_context(|| format!("invalid API URL {}", self.config.api_url))?
            .with_timeout(self.config.request_timeout());
        client.set_token(self.session.token().map(str::to_string));
        Ok(client)
    }

    pub fn require_login(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.session.is_authenticated(),
            "not logged in, run `ahavault login <email>` first"
        );
        Ok(())
    }
}
