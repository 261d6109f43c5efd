use std::future::Future;
use std::pin::Pin;

use ahavault_api_client::{ApiError, Client};
use ahavault_protocol::{
    CreateShareRequest, CreatedShare, FileListPage, SaveToVaultRequest, SavedToVault, SharesPage,
};

/// Boxed future returned by [`VaultApi`].
pub type VaultFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send + 'a>>;

/// Authenticated backend operations behind the cabinet flows.
///
/// Implemented for [`Client`]; tests substitute a mock.
pub trait VaultApi: Send + Sync {
    fn list_files<'a>(
        &'a self,
        page: u32,
        page_size: u32,
        search: Option<&'a str>,
    ) -> VaultFuture<'a, FileListPage>;

    fn delete_file<'a>(&'a self, file_id: &'a str) -> VaultFuture<'a, ()>;

    fn create_share(&self, req: CreateShareRequest) -> VaultFuture<'_, CreatedShare>;

    fn list_shares(&self, page: u32, page_size: u32) -> VaultFuture<'_, SharesPage>;

    fn stop_share<'a>(&'a self, share_id: &'a str) -> VaultFuture<'a, ()>;

    fn save_to_vault<'a>(
        &'a self,
        code: &'a str,
        req: SaveToVaultRequest,
    ) -> VaultFuture<'a, SavedToVault>;
}

impl VaultApi for Client {
    fn list_files<'a>(
        &'a self,
        page: u32,
        page_size: u32,
        search: Option<&'a str>,
    ) -> VaultFuture<'a, FileListPage> {
        Box::pin(Client::list_files(self, page, page_size, search))
    }

    fn delete_file<'a>(&'a self, file_id: &'a str) -> VaultFuture<'a, ()> {
        Box::pin(Client::delete_file(self, file_id))
    }

    fn create_share(&self, req: CreateShareRequest) -> VaultFuture<'_, CreatedShare> {
        Box::pin(async move { Client::create_share(self, &req).await })
    }

    fn list_shares(&self, page: u32, page_size: u32) -> VaultFuture<'_, SharesPage> {
        Box::pin(Client::list_shares(self, page, page_size))
    }

    fn stop_share<'a>(&'a self, share_id: &'a str) -> VaultFuture<'a, ()> {
        Box::pin(Client::stop_share(self, share_id))
    }

    fn save_to_vault<'a>(
        &'a self,
        code: &'a str,
        req: SaveToVaultRequest,
    ) -> VaultFuture<'a, SavedToVault> {
        Box::pin(async move { Client::save_to_vault(self, code, &req).await })
    }
}
