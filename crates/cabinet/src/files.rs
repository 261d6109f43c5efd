//! The cabinet's file list.

use tracing::{debug, warn};

use ahavault_protocol::FileItem;
use ahavault_protocol::constants::CABINET_PAGE_SIZE;

use crate::api::VaultApi;
use crate::error::CabinetError;

/// What the file list shows.
#[derive(Debug, Clone, PartialEq)]
pub enum FilesView {
    Loading,
    Empty,
    Items(Vec<FileItem>),
}

/// Lists, searches and deletes the user's files.
///
/// Always shows the first page of [`CABINET_PAGE_SIZE`] items. A failed
/// refresh is logged and keeps whatever was shown before.
pub struct FileBrowser<'a> {
    api: &'a dyn VaultApi,
    search: String,
    files: Vec<FileItem>,
    total: u64,
    loading: bool,
}

impl<'a> FileBrowser<'a> {
    pub fn new(api: &'a dyn VaultApi) -> Self {
        Self {
            api,
            search: String::new(),
            files: Vec::new(),
            total: 0,
            loading: true,
        }
    }

    pub fn view(&self) -> FilesView {
        if self.loading {
            FilesView::Loading
        } else if self.files.is_empty() {
            FilesView::Empty
        } else {
            FilesView::Items(self.files.clone())
        }
    }

    pub fn files(&self) -> &[FileItem] {
        &self.files
    }

    /// Total matching files on the server.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Changes the search term and reloads.
    pub async fn set_search(&mut self, term: &str) {
        self.search = term.to_string();
        self.refresh().await;
    }

    /// Reloads the list.
    pub async fn refresh(&mut self) {
        self.loading = true;
        let search = Some(self.search.as_str()).filter(|s| !s.trim().is_empty());
        match self.api.list_files(1, CABINET_PAGE_SIZE, search).await {
            Ok(page) => {
                debug!(items = page.items.len(), total = page.total, "file list refreshed");
                self.total = page.total;
                self.files = page.items;
            }
            Err(e) => warn!("Failed to fetch files: {e}"),
        }
        self.loading = false;
    }

    /// Deletes a file, then reloads. On failure the list is left as is.
    pub async fn delete(&mut self, file_id: &str) -> Result<(), CabinetError> {
        if let Err(e) = self.api.delete_file(file_id).await {
            warn!(file_id, "Delete failed: {e}");
            return Err(CabinetError::api(e, "Delete failed"));
        }
        self.refresh().await;
        Ok(())
    }

    pub fn find(&self, file_id: &str) -> Option<&FileItem> {
        self.files.iter().find(|f| f.id == file_id)
    }
}
