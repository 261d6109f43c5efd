//! Public pickup flow: validate a pickup code, look the share up and list
//! its files with download links.

pub mod code;
pub mod flow;
pub mod lookup;

pub use code::{CodeError, PickupCode};
pub use flow::{FileRow, PickupError, PickupFlow, PickupView};
pub use lookup::{LookupFuture, ShareLookup};
