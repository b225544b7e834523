//! Periodic sweep that force-closes idle in-progress rooms.
//!
//! A room with no write activity for the configured idle window can never
//! reach completion on its own; the sweep flips it to CLOSED so matchmaking
//! and badge history stay clean. CLOSED is terminal.

use std::time::SystemTime;

use tokio::sync::watch;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::state::SharedState;

/// Run the idle-room sweep on the configured interval, forever.
pub async fn run(state: SharedState) {
    let degraded = state.degraded_watcher();
    let mut ticker = interval(state.config().sweep_interval());
    // The first tick fires immediately; skip it so startup stays quiet.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        sweep_once(&state, &degraded).await;
    }
}

async fn sweep_once(state: &SharedState, degraded: &watch::Receiver<bool>) {
    // The flag also covers the window where a store is installed but the
    // supervisor is failing health checks against it.
    if *degraded.borrow() {
        debug!("skipping idle-room sweep while degraded");
        return;
    }
    let Some(store) = state.room_store().await else {
        debug!("skipping idle-room sweep without a store");
        return;
    };

    let cutoff = SystemTime::now() - state.config().room_idle_timeout();
    match store.close_idle_rooms(cutoff).await {
        Ok(closed) if closed.is_empty() => debug!("idle-room sweep found nothing to close"),
        Ok(closed) => info!(count = closed.len(), rooms = ?closed, "closed idle rooms"),
        Err(err) => warn!(error = %err, "idle-room sweep failed"),
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::RoomStatus,
            room_store::{RoomStore, memory::MemoryRoomStore},
        },
        state::AppState,
    };

    #[tokio::test]
    async fn sweep_closes_rooms_idle_past_the_cutoff() {
        let store = MemoryRoomStore::new();
        let room_id = store
            .join_or_create("stranded-expedition".into(), Uuid::new_v4(), None, 1)
            .await
            .expect("join")
            .room_id();
        store
            .backdate_room(room_id, Duration::from_secs(8 * 24 * 60 * 60))
            .await;

        let state = AppState::new(AppConfig::default());
        state.install_room_store(Arc::new(store.clone())).await;

        sweep_once(&state, &state.degraded_watcher()).await;

        let room = store.find_room(room_id).await.expect("find").expect("room");
        assert_eq!(room.status, RoomStatus::Closed);
    }

    #[tokio::test]
    async fn sweep_is_a_noop_while_degraded() {
        let state = AppState::new(AppConfig::default());
        // No store installed; must not panic.
        sweep_once(&state, &state.degraded_watcher()).await;
    }

    #[tokio::test]
    async fn sweep_waits_out_an_unhealthy_store() {
        let store = MemoryRoomStore::new();
        let room_id = store
            .join_or_create("stranded-expedition".into(), Uuid::new_v4(), None, 1)
            .await
            .expect("join")
            .room_id();
        store
            .backdate_room(room_id, Duration::from_secs(8 * 24 * 60 * 60))
            .await;

        let state = AppState::new(AppConfig::default());
        state.install_room_store(Arc::new(store.clone())).await;
        // Store installed but failing health checks: the supervisor raised
        // the degraded flag without clearing the store.
        state.update_degraded(true).await;

        sweep_once(&state, &state.degraded_watcher()).await;

        let room = store.find_room(room_id).await.expect("find").expect("room");
        assert_eq!(room.status, RoomStatus::InProgress);
    }
}
