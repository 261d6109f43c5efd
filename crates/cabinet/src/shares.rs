//! "My shares": paginated listing, stopping a share, and copying a
//! received share into one's own vault.

use tracing::{info, warn};

use ahavault_protocol::{SaveToVaultRequest, ShareSummary};

use crate::api::VaultApi;
use crate::error::CabinetError;

const DEFAULT_PAGE_SIZE: u32 = 20;

/// Pages through the shares the user created.
pub struct SharesBrowser<'a> {
    api: &'a dyn VaultApi,
    page: u32,
    page_size: u32,
    total: u64,
    shares: Vec<ShareSummary>,
}

impl<'a> SharesBrowser<'a> {
    pub fn new(api: &'a dyn VaultApi) -> Self {
        Self::with_page_size(api, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(api: &'a dyn VaultApi, page_size: u32) -> Self {
        Self {
            api,
            page: 1,
            page_size: page_size.max(1),
            total: 0,
            shares: Vec::new(),
        }
    }

    pub fn shares(&self) -> &[ShareSummary] {
        &self.shares
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of pages, at least 1.
    pub fn page_count(&self) -> u32 {
        let pages = self.total.div_ceil(u64::from(self.page_size));
        u32::try_from(pages).unwrap_or(u32::MAX).max(1)
    }

    /// Loads page `page` (1-based; 0 is treated as 1).
    pub async fn load(&mut self, page: u32) -> Result<(), CabinetError> {
        let page = page.max(1);
        let result = self
            .api
            .list_shares(page, self.page_size)
            .await
            .map_err(|e| CabinetError::api(e, "Failed to load shares"))?;
        self.page = page;
        self.total = result.total;
        self.shares = result.shares;
        Ok(())
    }

    pub async fn refresh(&mut self) -> Result<(), CabinetError> {
        self.load(self.page).await
    }

    /// Loads the next page; returns `false` when already on the last one.
    pub async fn next_page(&mut self) -> Result<bool, CabinetError> {
        if self.page >= self.page_count() {
            return Ok(false);
        }
        self.load(self.page + 1).await?;
        Ok(true)
    }

    /// Stops a share so its code no longer works, then reloads the page.
    pub async fn stop(&mut self, share_id: &str) -> Result<(), CabinetError> {
        if let Err(e) = self.api.stop_share(share_id).await {
            warn!(share_id, "failed to stop share: {e}");
            return Err(CabinetError::api(e, "Failed to stop share"));
        }
        info!(share_id, "share stopped");
        self.refresh().await
    }
}

/// Copies files of the share behind `code` into the caller's vault.
///
/// Returns the ids of the new cabinet entries.
pub async fn save_shared_files(
    api: &dyn VaultApi,
    code: &str,
    file_ids: Vec<String>,
    password: Option<String>,
) -> Result<Vec<String>, CabinetError> {
    if file_ids.is_empty() {
        return Err(CabinetError::Validation("Select at least one file to save"));
    }
    let req = SaveToVaultRequest {
        file_ids,
        password: password.filter(|p| !p.is_empty()),
    };
    let saved = api
        .save_to_vault(code, req)
        .await
        .map_err(|e| CabinetError::api(e, "Failed to save files"))?;
    info!(code, saved = saved.saved_ids.len(), "saved shared files to vault");
    Ok(saved.saved_ids)
}
