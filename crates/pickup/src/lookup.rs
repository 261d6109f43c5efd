use std::future::Future;
use std::pin::Pin;

use ahavault_api_client::{ApiError, Client};
use ahavault_protocol::{LookupRequest, ShareInfo};

use crate::code::PickupCode;

/// Boxed future returned by [`ShareLookup`].
pub type LookupFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send + 'a>>;

/// Backend access needed by the pickup flow.
pub trait ShareLookup: Send + Sync {
    /// `POST /public/shares/:code`.
    fn lookup<'a>(&'a self, code: &'a PickupCode, req: LookupRequest) -> LookupFuture<'a, ShareInfo>;

    /// Public download URL of one file in the share.
    fn download_url(&self, code: &PickupCode, file_id: &str) -> String;
}

impl ShareLookup for Client {
    fn lookup<'a>(&'a self, code: &'a PickupCode, req: LookupRequest) -> LookupFuture<'a, ShareInfo> {
        Box::pin(async move { self.lookup_share(code.as_str(), &req).await })
    }

    fn download_url(&self, code: &PickupCode, file_id: &str) -> String {
        self.pickup_download_url(code.as_str(), file_id)
    }
}
