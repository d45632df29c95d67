//! Outbound dispatch of listing records.
//!
//! A [`Dispatcher`] formats a record into an [`OutboundPayload`] and posts it
//! through an injected [`HttpTransport`], retrying under a [`RetryPolicy`].

mod dispatcher;
mod payload;
mod policy;
mod transport;

pub use dispatcher::{parse_body, DispatchReceipt, Dispatcher};
pub use payload::{OutboundPayload, SellerInfo};
pub use policy::{RetryDecision, RetryPolicy};
#[cfg(feature = "http")]
pub use transport::ReqwestTransport;
pub use transport::{HttpResponse, HttpTransport};
