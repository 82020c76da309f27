//! Routing: the deterministic rule table and the optional majority vote.
//!
//! The rule table is the default and the fallback: zero added latency,
//! zero added risk. Majority-vote mode fans the routing question out to
//! independent voter agents under a shared deadline and degrades
//! gracefully: a tie, too few responders, or an illegal winning answer
//! all fall back to the table, and a slow voter can never block past the
//! deadline.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::debug;

use crate::traits::{RouteQuestion, RouteVoter};
use crate::types::task::UcState;

/// The event produced by executing a working state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteEvent {
    /// The quality gate cleared its threshold
    GatePassed,

    /// The gate failed and a stored recipe exists
    GateFailedWithRecipe,

    /// The gate failed and no stored recipe exists
    GateFailedNoRecipe,

    /// A repair/discovery session accepted a candidate
    SessionAccepted,

    /// A repair/discovery session exhausted its retries
    SessionEscalated,
}

/// The deterministic rule table.
pub fn rule_table(event: RouteEvent) -> UcState {
    match event {
        RouteEvent::GatePassed => UcState::DoneOk,
        RouteEvent::GateFailedWithRecipe => UcState::Repair,
        RouteEvent::GateFailedNoRecipe => UcState::Discover,
        RouteEvent::SessionAccepted => UcState::Gate,
        RouteEvent::SessionEscalated => UcState::Escalate,
    }
}

/// States a vote may legally pick for an event.
///
/// Only the failing-gate-with-recipe case is genuinely ambiguous (repair
/// the recipe, or rediscover from scratch); every other event has a single
/// successor and is never put to a vote. Escalation is deliberately not a
/// votable answer; it is reached only through session exhaustion or the
/// loop guard, so its records always carry an accurate kind.
pub fn legal_successors(event: RouteEvent) -> &'static [UcState] {
    match event {
        RouteEvent::GatePassed => &[UcState::DoneOk],
        RouteEvent::GateFailedWithRecipe => &[UcState::Repair, UcState::Discover],
        RouteEvent::GateFailedNoRecipe => &[UcState::Discover],
        RouteEvent::SessionAccepted => &[UcState::Gate],
        RouteEvent::SessionEscalated => &[UcState::Escalate],
    }
}

/// Fan the routing question out and take the modal answer.
///
/// Every voter gets the same shared deadline; whoever has not answered by
/// then simply is not counted. Returns `None`, meaning "fall back to the
/// rule table", when fewer than `min_responders` answered, when the
/// leading answers tie, or when the winner is not a legal successor.
pub async fn majority_vote(
    voters: &[Arc<dyn RouteVoter>],
    question: &RouteQuestion,
    deadline: Duration,
    min_responders: usize,
) -> Option<UcState> {
    if voters.len() < min_responders {
        return None;
    }

    let ballots = join_all(voters.iter().map(|voter| {
        let voter = Arc::clone(voter);
        async move {
            let name = voter.provider_name().to_string();
            match tokio::time::timeout(deadline, voter.vote(question)).await {
                Ok(Ok(answer)) => Some((name, answer)),
                Ok(Err(err)) => {
                    debug!(voter = %name, error = %err, "voter failed");
                    None
                }
                Err(_) => {
                    debug!(voter = %name, "voter missed the deadline");
                    None
                }
            }
        }
    }))
    .await;

    let mut counts: HashMap<UcState, usize> = HashMap::new();
    let mut responders = 0usize;
    for (name, answer) in ballots.into_iter().flatten() {
        responders += 1;
        if question.options.contains(&answer) {
            *counts.entry(answer).or_insert(0) += 1;
        } else {
            debug!(voter = %name, answer = %answer, "discarding illegal vote");
        }
    }

    if responders < min_responders {
        debug!(responders, min_responders, "too few responders for a vote");
        return None;
    }

    let (&winner, &top) = counts.iter().max_by_key(|(_, count)| **count)?;
    let tied = counts.values().filter(|&&count| count == top).count() > 1;
    if tied {
        debug!("vote tied, falling back to rule table");
        return None;
    }

    Some(winner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProviderError, ProviderResult};
    use crate::traits::ProviderIdentity;
    use async_trait::async_trait;

    struct FixedVoter {
        name: String,
        answer: UcState,
        delay: Duration,
    }

    impl FixedVoter {
        fn new(name: &str, answer: UcState) -> Arc<dyn RouteVoter> {
            Arc::new(Self {
                name: name.to_string(),
                answer,
                delay: Duration::ZERO,
            })
        }

        fn slow(name: &str, answer: UcState, delay: Duration) -> Arc<dyn RouteVoter> {
            Arc::new(Self {
                name: name.to_string(),
                answer,
                delay,
            })
        }
    }

    impl ProviderIdentity for FixedVoter {
        fn provider_name(&self) -> &str {
            &self.name
        }
    }

    #[async_trait]
    impl RouteVoter for FixedVoter {
        async fn vote(&self, _question: &RouteQuestion) -> ProviderResult<UcState> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(self.answer)
        }
    }

    struct FailingVoter;

    impl ProviderIdentity for FailingVoter {
        fn provider_name(&self) -> &str {
            "failing"
        }
    }

    #[async_trait]
    impl RouteVoter for FailingVoter {
        async fn vote(&self, _question: &RouteQuestion) -> ProviderResult<UcState> {
            Err(ProviderError::Unavailable {
                provider: "failing".to_string(),
                source: "scripted".into(),
            })
        }
    }

    fn question() -> RouteQuestion {
        RouteQuestion {
            current: UcState::Gate,
            site_id: "example.com".to_string(),
            has_recipe: true,
            last_quality: Some(40),
            options: vec![UcState::Repair, UcState::Discover],
        }
    }

    #[test]
    fn test_rule_table_is_total() {
        assert_eq!(rule_table(RouteEvent::GatePassed), UcState::DoneOk);
        assert_eq!(rule_table(RouteEvent::GateFailedWithRecipe), UcState::Repair);
        assert_eq!(rule_table(RouteEvent::GateFailedNoRecipe), UcState::Discover);
        assert_eq!(rule_table(RouteEvent::SessionAccepted), UcState::Gate);
        assert_eq!(rule_table(RouteEvent::SessionEscalated), UcState::Escalate);
    }

    #[tokio::test]
    async fn test_majority_wins() {
        let voters = vec![
            FixedVoter::new("a", UcState::Repair),
            FixedVoter::new("b", UcState::Repair),
            FixedVoter::new("c", UcState::Discover),
        ];
        let winner =
            majority_vote(&voters, &question(), Duration::from_millis(100), 2).await;
        assert_eq!(winner, Some(UcState::Repair));
    }

    #[tokio::test]
    async fn test_tie_falls_back() {
        let voters = vec![
            FixedVoter::new("a", UcState::Repair),
            FixedVoter::new("b", UcState::Discover),
        ];
        let winner =
            majority_vote(&voters, &question(), Duration::from_millis(100), 2).await;
        assert_eq!(winner, None);
    }

    #[tokio::test]
    async fn test_slow_voter_is_not_counted_and_does_not_block() {
        let voters = vec![
            FixedVoter::new("a", UcState::Repair),
            FixedVoter::new("b", UcState::Repair),
            FixedVoter::slow("lagging", UcState::Discover, Duration::from_secs(3600)),
        ];
        let started = std::time::Instant::now();
        let winner = majority_vote(&voters, &question(), Duration::from_millis(50), 2).await;
        assert_eq!(winner, Some(UcState::Repair));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_too_few_responders_falls_back() {
        let voters: Vec<Arc<dyn RouteVoter>> =
            vec![FixedVoter::new("a", UcState::Repair), Arc::new(FailingVoter)];
        let winner =
            majority_vote(&voters, &question(), Duration::from_millis(100), 2).await;
        assert_eq!(winner, None);
    }

    #[tokio::test]
    async fn test_illegal_votes_are_discarded() {
        let voters = vec![
            FixedVoter::new("a", UcState::DoneOk),
            FixedVoter::new("b", UcState::DoneOk),
            FixedVoter::new("c", UcState::Repair),
        ];
        let winner =
            majority_vote(&voters, &question(), Duration::from_millis(100), 2).await;
        // The two DoneOk ballots are illegal for this event; the single
        // legal ballot wins.
        assert_eq!(winner, Some(UcState::Repair));
    }
}
