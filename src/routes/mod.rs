use axum::Router;

use crate::state::SharedState;

pub mod badges;
pub mod docs;
pub mod health;
pub mod quests;
pub mod rooms;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(quests::router())
        .merge(rooms::router())
        .merge(badges::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
