use thiserror::Error;

/// Number of decision rounds every quest runs through.
pub const ROUND_COUNT: u8 = 3;

/// High-level phases a decision room moves through.
///
/// A room only ever moves forward: gathering members, then voting round by
/// round, then completed — or closed by the inactivity sweep while voting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Members are still joining; `full` mirrors the OPEN/FULL split.
    Gathering {
        /// Whether the room has reached its capacity.
        full: bool,
    },
    /// The session is live and collecting votes for `round` (1-based).
    Voting {
        /// Round currently open for votes and a commit.
        round: u8,
    },
    /// The final round was committed; waiting on member acknowledgements.
    Completed,
    /// Force-closed after prolonged inactivity; terminal.
    Closed,
}

/// Advisory sub-state of the current round, derived for clients.
///
/// Never enforced server-side: a commit with partial votes is legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// Some members have not voted yet.
    Voting,
    /// Every member has a vote on record for the round.
    AllVoted,
    /// The round has its binding commit.
    Committed,
}

/// Events that can be applied to a room session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The room filled up; voting for round 1 opens.
    Start,
    /// The binding choice for `round` was written.
    CommitRound {
        /// Round being committed; must match the open round.
        round: u8,
    },
    /// The inactivity sweep force-closes the room.
    Close,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the session was in when the invalid event was received.
    pub from: SessionPhase,
    /// The event that cannot be applied from this phase.
    pub event: SessionEvent,
}

/// Compute the next phase for an event, or reject the transition.
///
/// Pure function; storage backends call it inside their conditional writes so
/// the legality check and the write happen under the same guard.
pub fn advance(from: SessionPhase, event: SessionEvent) -> Result<SessionPhase, InvalidTransition> {
    let next = match (from, event) {
        (SessionPhase::Gathering { .. }, SessionEvent::Start) => SessionPhase::Voting { round: 1 },
        (SessionPhase::Voting { round }, SessionEvent::CommitRound { round: committed })
            if round == committed =>
        {
            if round < ROUND_COUNT {
                SessionPhase::Voting { round: round + 1 }
            } else {
                SessionPhase::Completed
            }
        }
        (SessionPhase::Voting { .. }, SessionEvent::Close) => SessionPhase::Closed,
        (from, event) => return Err(InvalidTransition { from, event }),
    };

    Ok(next)
}

/// Derive the advisory sub-state of the open round.
pub fn round_phase(votes_in_round: usize, member_count: usize, committed: bool) -> RoundPhase {
    if committed {
        RoundPhase::Committed
    } else if member_count > 0 && votes_in_round >= member_count {
        RoundPhase::AllVoted
    } else {
        RoundPhase::Voting
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gathering_starts_at_round_one() {
        assert_eq!(
            advance(SessionPhase::Gathering { full: true }, SessionEvent::Start),
            Ok(SessionPhase::Voting { round: 1 })
        );
    }

    #[test]
    fn commits_walk_through_all_rounds() {
        let mut phase = SessionPhase::Voting { round: 1 };
        phase = advance(phase, SessionEvent::CommitRound { round: 1 }).unwrap();
        assert_eq!(phase, SessionPhase::Voting { round: 2 });
        phase = advance(phase, SessionEvent::CommitRound { round: 2 }).unwrap();
        assert_eq!(phase, SessionPhase::Voting { round: 3 });
        phase = advance(phase, SessionEvent::CommitRound { round: 3 }).unwrap();
        assert_eq!(phase, SessionPhase::Completed);
    }

    #[test]
    fn committing_the_wrong_round_is_rejected() {
        let err = advance(
            SessionPhase::Voting { round: 2 },
            SessionEvent::CommitRound { round: 1 },
        )
        .unwrap_err();
        assert_eq!(err.from, SessionPhase::Voting { round: 2 });
        assert_eq!(err.event, SessionEvent::CommitRound { round: 1 });
    }

    #[test]
    fn completed_is_terminal_for_commits() {
        assert!(advance(SessionPhase::Completed, SessionEvent::CommitRound { round: 3 }).is_err());
        assert!(advance(SessionPhase::Completed, SessionEvent::Close).is_err());
    }

    #[test]
    fn close_only_applies_while_voting() {
        assert_eq!(
            advance(SessionPhase::Voting { round: 2 }, SessionEvent::Close),
            Ok(SessionPhase::Closed)
        );
        assert!(advance(SessionPhase::Gathering { full: false }, SessionEvent::Close).is_err());
        assert!(advance(SessionPhase::Closed, SessionEvent::Close).is_err());
    }

    #[test]
    fn round_phase_reflects_votes_and_commit() {
        assert_eq!(round_phase(1, 3, false), RoundPhase::Voting);
        assert_eq!(round_phase(3, 3, false), RoundPhase::AllVoted);
        assert_eq!(round_phase(0, 3, true), RoundPhase::Committed);
        assert_eq!(round_phase(0, 0, false), RoundPhase::Voting);
    }
}
