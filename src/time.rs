use crate::board::Move;
use std::time::Instant;

/// How a `go` command bounds the search. `limited_by_self` means the engine
/// owns its clock and budgets time itself; the other flags are hard caps.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub limited_by_self: bool,
    pub limited_by_time: bool,
    pub limited_by_depth: bool,
    pub limited_by_nodes: bool,
    pub time_limit: u64,
    pub depth_limit: i32,
    pub node_limit: u64,
    pub time: u64,
    pub inc: u64,
    pub mtg: Option<u64>,
    pub move_overhead: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            limited_by_self: false,
            limited_by_time: false,
            limited_by_depth: false,
            limited_by_nodes: false,
            time_limit: 0,
            depth_limit: 0,
            node_limit: 0,
            time: 0,
            inc: 0,
            mtg: None,
            move_overhead: 10,
        }
    }
}

impl Limits {
    pub fn infinite() -> Self {
        Limits::default()
    }

    pub fn fixed_depth(depth: i32) -> Self {
        Limits {
            limited_by_depth: true,
            depth_limit: depth,
            ..Limits::default()
        }
    }

    pub fn fixed_nodes(nodes: u64) -> Self {
        Limits {
            limited_by_nodes: true,
            node_limit: nodes,
            ..Limits::default()
        }
    }

    pub fn move_time(ms: u64) -> Self {
        Limits {
            limited_by_time: true,
            time_limit: ms,
            ..Limits::default()
        }
    }

    pub fn tournament(time: u64, inc: u64, mtg: Option<u64>) -> Self {
        Limits {
            limited_by_self: true,
            time,
            inc,
            mtg,
            ..Limits::default()
        }
    }
}

/// Clock bookkeeping for one search. `ideal_usage` is the soft target the
/// main worker compares against between iterations; `max_usage` is the hard
/// cap polled inside the tree.
pub struct TimeManager {
    pub start_time: Instant,
    pub ideal_usage: u64,
    pub max_usage: u64,
    base_usage: u64,
    last_best_move: Move,
    last_value: i32,
    stability: u32,
}

impl TimeManager {
    pub fn new(limits: &Limits) -> Self {
        let (ideal, max) = if limits.limited_by_self {
            let time = limits.time.saturating_sub(limits.move_overhead).max(10);
            let mtg = limits.mtg.unwrap_or(30).clamp(2, 50);
            let base = time / mtg + limits.inc * 3 / 4;
            let max = (base * 5).min(time * 4 / 5).max(10);
            (base.min(max), max)
        } else if limits.limited_by_time {
            let budget = limits.time_limit.saturating_sub(limits.move_overhead).max(1);
            (budget, budget)
        } else {
            (u64::MAX, u64::MAX)
        };

        TimeManager {
            start_time: Instant::now(),
            ideal_usage: ideal,
            max_usage: max,
            base_usage: ideal,
            last_best_move: Move::NONE,
            last_value: 0,
            stability: 0,
        }
    }

    #[inline(always)]
    pub fn elapsed(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    /// Rescales the soft budget after an iteration: an unstable best move or
    /// a dropping score buys more time, a stable one gives some back.
    pub fn update(&mut self, depth: i32, value: i32, best_move: Move) {
        if depth >= 4 && self.max_usage != u64::MAX {
            if best_move == self.last_best_move {
                self.stability += 1;
            } else {
                self.stability = 0;
            }

            let stability_factor = match self.stability {
                0 => 2.0,
                1 => 1.25,
                2 => 0.95,
                3 => 0.85,
                _ => 0.75,
            };
            let score_factor = if value + 10 < self.last_value { 1.25 } else { 1.0 };

            let scaled = (self.base_usage as f64 * stability_factor * score_factor) as u64;
            self.ideal_usage = scaled.min(self.max_usage);
        }

        self.last_best_move = best_move;
        self.last_value = value;
    }

    /// Soft check between iterations.
    pub fn should_finish(&self) -> bool {
        self.max_usage != u64::MAX && self.elapsed() >= self.ideal_usage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infinite_limits_never_finish() {
        let tm = TimeManager::new(&Limits::infinite());
        assert_eq!(tm.max_usage, u64::MAX);
        assert!(!tm.should_finish());
    }

    #[test]
    fn tournament_budget_is_bounded() {
        let tm = TimeManager::new(&Limits::tournament(60_000, 600, None));
        assert!(tm.ideal_usage > 0);
        assert!(tm.max_usage <= 60_000 * 4 / 5);
        assert!(tm.ideal_usage <= tm.max_usage);
    }

    #[test]
    fn instability_extends_the_budget() {
        let mut tm = TimeManager::new(&Limits::tournament(60_000, 0, Some(30)));
        let base = tm.ideal_usage;
        tm.update(5, 20, Move::new(12, 28));
        assert!(tm.ideal_usage >= base); // first move is "new"
        let grown = tm.ideal_usage;
        tm.update(6, 20, Move::new(12, 28));
        tm.update(7, 20, Move::new(12, 28));
        tm.update(8, 20, Move::new(12, 28));
        assert!(tm.ideal_usage < grown);
    }
}
