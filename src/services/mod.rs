/// Artifact assembly and rendering for completed rooms.
pub mod artifact_service;
/// Achievement predicate evaluation and idempotent awarding.
pub mod badge_service;
/// Completion acknowledgement barrier and artifact trigger.
pub mod completion_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Matchmaking participants into decision rooms.
pub mod matchmaking_service;
/// Background sweep closing idle rooms.
pub mod room_sweeper;
/// Vote and commit workflow for active sessions.
pub mod session_service;
/// Storage persistence coordinator with reconnection.
pub mod storage_supervisor;

#[cfg(test)]
mod test_support;
