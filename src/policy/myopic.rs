// src/policy/myopic.rs
//
// Minimal-horizon greedy: takes the best immediate reward with no
// regard for future arrivals. The one-step LP collapses to an argmax
// over resources with capacity left.

use crate::process::MatchingState;
use crate::types::StepReward;

use super::Policy;

#[derive(Debug, Clone)]
pub struct MyopicPolicy {
    state: MatchingState,
}

impl MyopicPolicy {
    pub fn new(state: MatchingState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &MatchingState {
        &self.state
    }
}

impl Policy for MyopicPolicy {
    fn remaining_epochs(&self) -> usize {
        self.state.horizon_len()
    }

    fn decide_step(&mut self) -> StepReward {
        let Some(request) = self.state.pending() else {
            return StepReward::plain(0.0);
        };

        let spec = self.state.spec();
        let mut best: Option<(usize, f64)> = None;
        for j in 0..spec.n_resources() {
            if self.state.capacity(j) == 0 {
                continue;
            }
            let r = spec.reward[request][j];
            if best.map_or(true, |(_, br)| r > br) {
                best = Some((j, r));
            }
        }

        let reward = best
            .and_then(|(j, _)| self.state.commit_match(j))
            .unwrap_or(0.0);
        StepReward::plain(reward)
    }

    fn advance(&mut self) {
        self.state.advance();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::InstanceSpec;

    #[test]
    fn myopic_takes_highest_immediate_reward() {
        let spec = InstanceSpec {
            reward: vec![vec![2.0, 8.0, 5.0]],
            capacity: vec![1, 1, 1],
            arrival_rates: vec![1.0],
            departure_rate: 0.0,
            horizon_len: 3,
        };
        let mut p = MyopicPolicy::new(MatchingState::new(spec, 0));
        assert_eq!(p.decide_step().reward, 8.0);
        // Best resource gone: falls back to the next reward.
        p.advance();
        assert_eq!(p.decide_step().reward, 5.0);
    }

    #[test]
    fn myopic_skips_when_everything_exhausted() {
        let spec = InstanceSpec {
            reward: vec![vec![2.0]],
            capacity: vec![1],
            arrival_rates: vec![1.0],
            departure_rate: 0.0,
            horizon_len: 3,
        };
        let mut p = MyopicPolicy::new(MatchingState::new(spec, 0));
        assert_eq!(p.decide_step().reward, 2.0);
        p.advance();
        assert_eq!(p.decide_step().reward, 0.0);
    }
}
