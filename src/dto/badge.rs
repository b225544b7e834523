use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::{BadgeAwardEntity, BadgeKind},
    dto::format_system_time,
    services::badge_service::BadgeMetadata,
};

/// Response payload listing every badge a participant has earned.
#[derive(Debug, Serialize, ToSchema)]
pub struct BadgesResponse {
    pub participant_id: Uuid,
    pub badges: Vec<BadgeSummary>,
}

/// A single earned badge with its display metadata.
#[derive(Debug, Serialize, ToSchema)]
pub struct BadgeSummary {
    pub kind: BadgeKind,
    pub name: &'static str,
    pub description: &'static str,
    pub rarity: &'static str,
    /// Room the badge was earned in, absent for career-wide badges.
    pub room_id: Option<Uuid>,
    pub awarded_at: String,
}

impl From<BadgeAwardEntity> for BadgeSummary {
    fn from(award: BadgeAwardEntity) -> Self {
        let BadgeMetadata {
            name,
            description,
            rarity,
        } = award.kind.metadata();
        Self {
            kind: award.kind,
            name,
            description,
            rarity,
            room_id: award.room_id,
            awarded_at: format_system_time(award.awarded_at),
        }
    }
}
