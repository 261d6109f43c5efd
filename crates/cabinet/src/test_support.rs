//! In-memory [`VaultApi`] for flow tests.

use std::sync::Mutex;

use ahavault_api_client::ApiError;
use ahavault_protocol::{
    CreateShareRequest, CreatedShare, FileItem, FileListPage, SaveToVaultRequest, SavedToVault,
    ShareSummary, SharesPage,
};

use crate::api::{VaultApi, VaultFuture};

#[derive(Default)]
struct State {
    files: Vec<FileItem>,
    shares: Vec<ShareSummary>,
    list_calls: Vec<(u32, u32, Option<String>)>,
    share_list_calls: Vec<(u32, u32)>,
    deleted: Vec<String>,
    stopped: Vec<String>,
    created: Vec<CreateShareRequest>,
    saved: Vec<(String, SaveToVaultRequest)>,
    list_error: Option<ApiError>,
    delete_error: Option<ApiError>,
    create_error: Option<ApiError>,
    stop_error: Option<ApiError>,
    save_error: Option<ApiError>,
}

#[derive(Default)]
pub(crate) struct MockVault {
    state: Mutex<State>,
}

impl MockVault {
    pub fn set_files(&self, files: Vec<FileItem>) {
        self.state.lock().unwrap().files = files;
    }

    pub fn set_shares(&self, shares: Vec<ShareSummary>) {
        self.state.lock().unwrap().shares = shares;
    }

    pub fn fail_next_list(&self, err: ApiError) {
        self.state.lock().unwrap().list_error = Some(err);
    }

    pub fn fail_next_delete(&self, err: ApiError) {
        self.state.lock().unwrap().delete_error = Some(err);
    }

    pub fn fail_next_create(&self, err: ApiError) {
        self.state.lock().unwrap().create_error = Some(err);
    }

    pub fn fail_next_stop(&self, err: ApiError) {
        self.state.lock().unwrap().stop_error = Some(err);
    }

    pub fn fail_next_save(&self, err: ApiError) {
        self.state.lock().unwrap().save_error = Some(err);
    }

    pub fn list_calls(&self) -> Vec<(u32, u32, Option<String>)> {
        self.state.lock().unwrap().list_calls.clone()
    }

    pub fn share_list_calls(&self) -> Vec<(u32, u32)> {
        self.state.lock().unwrap().share_list_calls.clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted.clone()
    }

    pub fn stopped(&self) -> Vec<String> {
        self.state.lock().unwrap().stopped.clone()
    }

    pub fn created(&self) -> Vec<CreateShareRequest> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn saved(&self) -> Vec<(String, SaveToVaultRequest)> {
        self.state.lock().unwrap().saved.clone()
    }
}

pub(crate) fn server_error(status: u16, message: &str) -> ApiError {
    ApiError::Server {
        status,
        code: i32::from(status),
        message: message.to_string(),
        data: None,
    }
}

pub(crate) fn file_item(id: &str, filename: &str) -> FileItem {
    FileItem {
        id: id.to_string(),
        filename: filename.to_string(),
        size: 1024,
        mime_type: "text/plain".into(),
        hash: String::new(),
        created_at: "2026-02-05T10:00:00Z".parse().unwrap(),
        is_shared: false,
        share_count: 0,
    }
}

pub(crate) fn share_summary(id: &str, code: &str) -> ShareSummary {
    ShareSummary {
        id: id.to_string(),
        pickup_code: code.to_string(),
        max_downloads: 10,
        current_downloads: 0,
        created_at: "2026-02-05T10:00:00Z".parse().unwrap(),
        expires_at: "2026-02-06T10:00:00Z".parse().unwrap(),
        stopped_at: None,
    }
}

impl VaultApi for MockVault {
    fn list_files<'a>(
        &'a self,
        page: u32,
        page_size: u32,
        search: Option<&'a str>,
    ) -> VaultFuture<'a, FileListPage> {
        let mut s = self.state.lock().unwrap();
        s.list_calls.push((page, page_size, search.map(str::to_string)));
        let result = match s.list_error.take() {
            Some(err) => Err(err),
            None => Ok(FileListPage {
                total: s.files.len() as u64,
                items: s.files.clone(),
                page,
                page_size,
            }),
        };
        Box::pin(async move { result })
    }

    fn delete_file<'a>(&'a self, file_id: &'a str) -> VaultFuture<'a, ()> {
        let mut s = self.state.lock().unwrap();
        let result = match s.delete_error.take() {
            Some(err) => Err(err),
            None => {
                s.deleted.push(file_id.to_string());
                s.files.retain(|f| f.id != file_id);
                Ok(())
            }
        };
        Box::pin(async move { result })
    }

    fn create_share(&self, req: CreateShareRequest) -> VaultFuture<'_, CreatedShare> {
        let mut s = self.state.lock().unwrap();
        s.created.push(req);
        let result = match s.create_error.take() {
            Some(err) => Err(err),
            None => Ok(CreatedShare {
                share_id: "share-1".into(),
                pickup_code: "ABCD2345".into(),
                expires_at: "2026-02-06T10:00:00Z".parse().unwrap(),
            }),
        };
        Box::pin(async move { result })
    }

    fn list_shares(&self, page: u32, page_size: u32) -> VaultFuture<'_, SharesPage> {
        let mut s = self.state.lock().unwrap();
        s.share_list_calls.push((page, page_size));
        let result = Ok(SharesPage {
            total: s.shares.len() as u64,
            shares: s.shares.clone(),
            page,
            page_size,
        });
        Box::pin(async move { result })
    }

    fn stop_share<'a>(&'a self, share_id: &'a str) -> VaultFuture<'a, ()> {
        let mut s = self.state.lock().unwrap();
        let result = match s.stop_error.take() {
            Some(err) => Err(err),
            None => {
                s.stopped.push(share_id.to_string());
                if let Some(share) = s.shares.iter_mut().find(|sh| sh.id == share_id) {
                    share.stopped_at = Some("2026-02-05T12:00:00Z".parse().unwrap());
                }
                Ok(())
            }
        };
        Box::pin(async move { result })
    }

    fn save_to_vault<'a>(
        &'a self,
        code: &'a str,
        req: SaveToVaultRequest,
    ) -> VaultFuture<'a, SavedToVault> {
        let mut s = self.state.lock().unwrap();
        let saved_ids = req.file_ids.iter().map(|id| format!("copy-{id}")).collect();
        s.saved.push((code.to_string(), req));
        let result = match s.save_error.take() {
            Some(err) => Err(err),
            None => Ok(SavedToVault { saved_ids }),
        };
        Box::pin(async move { result })
    }
}
