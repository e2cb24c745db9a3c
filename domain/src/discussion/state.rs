//! Discussion state: rounds, transcript and termination.

use serde::{Deserialize, Serialize};

use super::similarity::jaccard_similarity;
use crate::core::error::DomainError;
use crate::role::entities::RoleId;

/// Why a discussion stopped. Exactly one is recorded per discussion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    MaxRounds,
    Consensus,
    Stalled,
}

impl TerminationReason {
    pub fn as_str(&self) -> &str {
        match self {
            TerminationReason::MaxRounds => "max_rounds",
            TerminationReason::Consensus => "consensus",
            TerminationReason::Stalled => "stalled",
        }
    }
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One role's contribution to a round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub role: RoleId,
    pub name: String,
    pub round: u32,
    pub content: String,
}

/// Live state of one discussion.
///
/// Rounds are numbered from 1. [`begin_round`](Self::begin_round) refuses
/// to go past `max_rounds` or to continue after termination, so the
/// counter can never exceed the configured maximum.
#[derive(Debug, Clone)]
pub struct DiscussionState {
    participants: Vec<RoleId>,
    max_rounds: u32,
    round: u32,
    rounds: Vec<Vec<Statement>>,
    termination: Option<TerminationReason>,
}

impl DiscussionState {
    pub fn new(participants: Vec<RoleId>, max_rounds: u32) -> Self {
        Self {
            participants,
            max_rounds: max_rounds.max(1),
            round: 0,
            rounds: Vec::new(),
            termination: None,
        }
    }

    pub fn participants(&self) -> &[RoleId] {
        &self.participants
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    pub fn termination(&self) -> Option<TerminationReason> {
        self.termination
    }

    pub fn is_terminated(&self) -> bool {
        self.termination.is_some()
    }

    /// Start the next round and return its number.
    pub fn begin_round(&mut self) -> Result<u32, DomainError> {
        if self.is_terminated() || self.round >= self.max_rounds {
            return Err(DomainError::DiscussionTerminated);
        }
        self.round += 1;
        self.rounds.push(Vec::new());
        Ok(self.round)
    }

    /// Record a statement for the current round.
    pub fn record(&mut self, role: RoleId, name: impl Into<String>, content: impl Into<String>) {
        let round = self.round;
        if let Some(current) = self.rounds.last_mut() {
            current.push(Statement {
                role,
                name: name.into(),
                round,
                content: content.into(),
            });
        }
    }

    pub fn at_max_rounds(&self) -> bool {
        self.round >= self.max_rounds
    }

    /// Record the termination reason. Only the first call has an effect.
    pub fn terminate(&mut self, reason: TerminationReason) -> TerminationReason {
        *self.termination.get_or_insert(reason)
    }

    /// All statements of all rounds, in order.
    pub fn transcript(&self) -> impl Iterator<Item = &Statement> {
        self.rounds.iter().flatten()
    }

    pub fn rounds(&self) -> &[Vec<Statement>] {
        &self.rounds
    }

    /// True when the last two rounds only repeated themselves.
    ///
    /// Every participant's statement in the latest round must have a word
    /// overlap of at least `threshold` with its statement from the round
    /// before. An empty statement counts as a repeat.
    pub fn is_stalled(&self, threshold: f64) -> bool {
        let [.., previous, current] = self.rounds.as_slice() else {
            return false;
        };
        if current.is_empty() {
            return false;
        }
        current.iter().all(|now| {
            if now.content.trim().is_empty() {
                return true;
            }
            previous
                .iter()
                .find(|before| before.role == now.role)
                .is_some_and(|before| jaccard_similarity(&before.content, &now.content) >= threshold)
        })
    }

    /// Plain-text transcript for prompts.
    pub fn render_transcript(&self) -> String {
        let mut out = String::new();
        for (i, round) in self.rounds.iter().enumerate() {
            out.push_str(&format!("## Round {}\n", i + 1));
            for statement in round {
                out.push_str(&format!("[{}] {}\n", statement.name, statement.content.trim()));
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(max: u32) -> DiscussionState {
        DiscussionState::new(vec!["a".into(), "b".into()], max)
    }

    #[test]
    fn test_round_counter_never_exceeds_max() {
        let mut s = state(3);
        for expected in 1..=3 {
            assert_eq!(s.begin_round().unwrap(), expected);
        }
        assert!(s.at_max_rounds());
        assert!(matches!(s.begin_round(), Err(DomainError::DiscussionTerminated)));
        assert_eq!(s.round(), 3);
    }

    #[test]
    fn test_only_first_termination_reason_sticks() {
        let mut s = state(5);
        s.begin_round().unwrap();
        assert_eq!(s.terminate(TerminationReason::Consensus), TerminationReason::Consensus);
        assert_eq!(s.terminate(TerminationReason::Stalled), TerminationReason::Consensus);
        assert_eq!(s.termination(), Some(TerminationReason::Consensus));
        assert!(s.begin_round().is_err());
    }

    #[test]
    fn test_stalled_detection() {
        let mut s = state(5);
        s.begin_round().unwrap();
        s.record("a".into(), "A", "Prices in Qingxiu district are stable this quarter");
        s.record("b".into(), "B", "Your loan payment stays under thirty percent of income");
        assert!(!s.is_stalled(0.85));

        s.begin_round().unwrap();
        s.record("a".into(), "A", "Prices in Qingxiu district are stable this quarter.");
        s.record("b".into(), "B", "");
        assert!(s.is_stalled(0.85));

        s.begin_round().unwrap();
        s.record("a".into(), "A", "Prices in Qingxiu district are stable this quarter");
        s.record("b".into(), "B", "Actually a shorter term would cut total interest a lot");
        assert!(!s.is_stalled(0.85));
    }

    #[test]
    fn test_transcript_rendering_covers_all_rounds() {
        let mut s = state(5);
        s.begin_round().unwrap();
        s.record("a".into(), "Analyst", "first");
        s.begin_round().unwrap();
        s.record("a".into(), "Analyst", "second");
        let text = s.render_transcript();
        assert!(text.contains("## Round 1\n[Analyst] first"));
        assert!(text.contains("## Round 2\n[Analyst] second"));
        assert_eq!(s.transcript().count(), 2);
        assert_eq!(s.rounds()[1][0].round, 2);
    }
}
