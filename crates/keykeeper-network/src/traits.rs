//! Notification boundary.

#![allow(async_fn_in_trait)]

use crate::error::NotifyError;
use keykeeper_core::UnlockRequest;

/// Something that opens the door.
///
/// Called once per authentication. Implementations report failure rather
/// than retry; the caller decides what a failed unlock means.
///
/// Like the console traits this uses native `async fn` and is not
/// object-safe; use generics or [`AnyNotifier`](crate::AnyNotifier).
pub trait Notifier {
    /// Deliver one unlock.
    async fn notify(&mut self, request: &UnlockRequest) -> Result<(), NotifyError>;
}
