//! Entry point of watch notifications: normalizes each payload and fans the
//! resulting record out to every configured sink.

mod event_router;

pub use event_router::*;

#[cfg(test)]
mod event_router_test;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::WatchPayload;

/// Callbacks the watch layer drives, one notification at a time
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    async fn on_add(
        &self,
        payload: &WatchPayload,
    );

    async fn on_update(
        &self,
        old: &WatchPayload,
        new: &WatchPayload,
    );

    async fn on_delete(
        &self,
        payload: &WatchPayload,
    );
}
