use crate::board::{type_of, Board, Move};
use crate::history::HistoryTables;
use crate::movegen::{self, MoveList, MAX_MOVES};
use crate::search::{static_exchange_evaluation, tactical_move_value};
use crate::thread::Thread;

// Stage order is part of the picker's contract: SEE pruning in the search
// relies on everything after STAGE_GOOD_NOISY having a non-positive
// exchange estimate.
pub const STAGE_TABLE: u8 = 0;
pub const STAGE_GENERATE_NOISY: u8 = 1;
pub const STAGE_GOOD_NOISY: u8 = 2;
pub const STAGE_KILLER_1: u8 = 3;
pub const STAGE_KILLER_2: u8 = 4;
pub const STAGE_COUNTER_MOVE: u8 = 5;
pub const STAGE_GENERATE_QUIET: u8 = 6;
pub const STAGE_QUIET: u8 = 7;
pub const STAGE_BAD_NOISY: u8 = 8;
pub const STAGE_DONE: u8 = 9;

pub struct MovePicker {
    pub stage: u8,
    pub killer1: Move,
    pub killer2: Move,
    pub counter: Move,
    tt_move: Move,
    see_threshold: i32,
    noisy_only: bool,
    prev: Option<(usize, u8)>,
    prev2: Option<(usize, u8)>,
    noisy: MoveList,
    noisy_scores: [i32; MAX_MOVES],
    noisy_idx: usize,
    bad_noisy: MoveList,
    bad_idx: usize,
    quiets: MoveList,
    quiet_scores: [i32; MAX_MOVES],
    quiet_idx: usize,
}

impl MovePicker {
    /// Full picker for the main search: TT move first, then noisy moves
    /// passing SEE, killers, the counter move, history-ordered quiets, and
    /// finally the losing captures.
    pub fn new(thread: &Thread, tt_move: Move, height: usize) -> MovePicker {
        let prev = thread.move_context(height, 1);
        MovePicker {
            stage: STAGE_TABLE,
            killer1: thread.killers[height][0],
            killer2: thread.killers[height][1],
            counter: thread.history.counter_move(thread.board.turn, prev),
            tt_move,
            see_threshold: 0,
            noisy_only: false,
            prev,
            prev2: thread.move_context(height, 2),
            noisy: MoveList::new(),
            noisy_scores: [0; MAX_MOVES],
            noisy_idx: 0,
            bad_noisy: MoveList::new(),
            bad_idx: 0,
            quiets: MoveList::new(),
            quiet_scores: [0; MAX_MOVES],
            quiet_idx: 0,
        }
    }

    /// Noisy-only picker for quiescence and probcut: yields tactical moves
    /// whose SEE meets `see_threshold`, discarding the rest.
    pub fn new_noisy(see_threshold: i32) -> MovePicker {
        MovePicker {
            stage: STAGE_GENERATE_NOISY,
            killer1: Move::NONE,
            killer2: Move::NONE,
            counter: Move::NONE,
            tt_move: Move::NONE,
            see_threshold,
            noisy_only: true,
            prev: None,
            prev2: None,
            noisy: MoveList::new(),
            noisy_scores: [0; MAX_MOVES],
            noisy_idx: 0,
            bad_noisy: MoveList::new(),
            bad_idx: 0,
            quiets: MoveList::new(),
            quiet_scores: [0; MAX_MOVES],
            quiet_idx: 0,
        }
    }

    // Selection-scan for the best remaining entry of (list, scores).
    fn pick_best(list: &mut MoveList, scores: &mut [i32; MAX_MOVES], start: usize) -> Move {
        if start >= list.count {
            return Move::NONE;
        }
        let mut best = start;
        for i in start + 1..list.count {
            if scores[i] > scores[best] {
                best = i;
            }
        }
        list.moves.swap(start, best);
        scores.swap(start, best);
        list.moves[start]
    }

    pub fn select_next(
        &mut self,
        board: &Board,
        history: &HistoryTables,
        skip_quiets: bool,
    ) -> Move {
        loop {
            match self.stage {
                STAGE_TABLE => {
                    self.stage = STAGE_GENERATE_NOISY;
                    if movegen::is_pseudo_legal(board, self.tt_move) {
                        return self.tt_move;
                    }
                }

                STAGE_GENERATE_NOISY => {
                    movegen::generate_noisy(board, &mut self.noisy);
                    for i in 0..self.noisy.count {
                        let mv = self.noisy.moves[i];
                        let attacker = type_of(board.squares[mv.from() as usize]);
                        self.noisy_scores[i] =
                            32 * tactical_move_value(board, mv) - attacker as i32;
                    }
                    self.stage = STAGE_GOOD_NOISY;
                }

                STAGE_GOOD_NOISY => {
                    let mv = Self::pick_best(&mut self.noisy, &mut self.noisy_scores, self.noisy_idx);
                    if mv.is_none() {
                        self.stage = if self.noisy_only {
                            STAGE_DONE
                        } else {
                            STAGE_KILLER_1
                        };
                        continue;
                    }
                    self.noisy_idx += 1;
                    if mv == self.tt_move {
                        continue;
                    }
                    if !static_exchange_evaluation(board, mv, self.see_threshold) {
                        if !self.noisy_only {
                            self.bad_noisy.push(mv);
                        }
                        continue;
                    }
                    return mv;
                }

                STAGE_KILLER_1 => {
                    self.stage = STAGE_KILLER_2;
                    if skip_quiets {
                        self.stage = STAGE_BAD_NOISY;
                        continue;
                    }
                    if self.killer1 != self.tt_move
                        && movegen::is_pseudo_legal(board, self.killer1)
                    {
                        return self.killer1;
                    }
                }

                STAGE_KILLER_2 => {
                    self.stage = STAGE_COUNTER_MOVE;
                    if self.killer2 != self.tt_move
                        && self.killer2 != self.killer1
                        && movegen::is_pseudo_legal(board, self.killer2)
                    {
                        return self.killer2;
                    }
                }

                STAGE_COUNTER_MOVE => {
                    self.stage = STAGE_GENERATE_QUIET;
                    if self.counter != self.tt_move
                        && self.counter != self.killer1
                        && self.counter != self.killer2
                        && movegen::is_pseudo_legal(board, self.counter)
                    {
                        return self.counter;
                    }
                }

                STAGE_GENERATE_QUIET => {
                    if skip_quiets {
                        self.stage = STAGE_BAD_NOISY;
                        continue;
                    }
                    movegen::generate_quiet(board, &mut self.quiets);
                    let colour = board.turn;
                    for i in 0..self.quiets.count {
                        let mv = self.quiets.moves[i];
                        let ptype = type_of(board.squares[mv.from() as usize]);
                        self.quiet_scores[i] = history.butterfly(colour, mv)
                            + history.counter_hist(self.prev, ptype, mv.to())
                            + history.followup_hist(self.prev2, ptype, mv.to());
                    }
                    self.stage = STAGE_QUIET;
                }

                STAGE_QUIET => {
                    if skip_quiets {
                        self.stage = STAGE_BAD_NOISY;
                        continue;
                    }
                    let mv =
                        Self::pick_best(&mut self.quiets, &mut self.quiet_scores, self.quiet_idx);
                    if mv.is_none() {
                        self.stage = STAGE_BAD_NOISY;
                        continue;
                    }
                    self.quiet_idx += 1;
                    if mv == self.tt_move
                        || mv == self.killer1
                        || mv == self.killer2
                        || mv == self.counter
                    {
                        continue;
                    }
                    return mv;
                }

                STAGE_BAD_NOISY => {
                    if self.noisy_only {
                        self.stage = STAGE_DONE;
                        continue;
                    }
                    if self.bad_idx >= self.bad_noisy.count {
                        self.stage = STAGE_DONE;
                        continue;
                    }
                    let mv = self.bad_noisy.moves[self.bad_idx];
                    self.bad_idx += 1;
                    return mv;
                }

                _ => return Move::NONE,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::SearchParameters;
    use crate::thread::SearchShared;
    use crate::time::Limits;
    use crate::tt::TranspositionTable;
    use std::sync::Arc;
    use std::time::Instant;

    fn thread_for(fen: &str) -> Thread {
        Thread::new(
            0,
            1,
            Board::parse_fen(fen),
            Limits::infinite(),
            Arc::new(TranspositionTable::new(1)),
            Arc::new(SearchShared::new()),
            SearchParameters::default(),
            Instant::now(),
            u64::MAX,
        )
    }

    fn drain(thread: &Thread, picker: &mut MovePicker, skip_quiets: bool) -> Vec<Move> {
        let mut out = Vec::new();
        loop {
            let mv = picker.select_next(&thread.board, &thread.history, skip_quiets);
            if mv.is_none() {
                break;
            }
            out.push(mv);
        }
        out
    }

    #[test]
    fn yields_every_move_exactly_once() {
        let thread = thread_for("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
        let mut picker = MovePicker::new(&thread, Move::NONE, 0);
        let picked = drain(&thread, &mut picker, false);

        let mut list = MoveList::new();
        movegen::generate_all(&thread.board, &mut list);
        assert_eq!(picked.len(), list.count);

        let mut sorted: Vec<u16> = picked.iter().map(|m| m.0).collect();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), list.count);
    }

    #[test]
    fn tt_move_comes_first_and_is_not_repeated() {
        let thread = thread_for(crate::board::START_FEN);
        let tt_move = Move::new(12, 28); // e2e4
        let mut picker = MovePicker::new(&thread, tt_move, 0);
        let picked = drain(&thread, &mut picker, false);
        assert_eq!(picked[0], tt_move);
        assert_eq!(picked.iter().filter(|&&m| m == tt_move).count(), 1);
    }

    #[test]
    fn skip_quiets_yields_only_tactical_moves() {
        let thread = thread_for("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
        let mut picker = MovePicker::new(&thread, Move::NONE, 0);
        let picked = drain(&thread, &mut picker, true);

        let mut noisy = MoveList::new();
        movegen::generate_noisy(&thread.board, &mut noisy);
        assert_eq!(picked.len(), noisy.count);
    }

    #[test]
    fn noisy_picker_respects_see_threshold() {
        // Pawn can capture a defended pawn: fails a queen-sized threshold.
        let thread = thread_for("4k3/8/2p5/3p4/4P3/8/8/4K3 w - - 0 1");
        let mut strict = MovePicker::new_noisy(900);
        assert!(strict
            .select_next(&thread.board, &thread.history, true)
            .is_none());

        let mut lenient = MovePicker::new_noisy(0);
        let mv = lenient.select_next(&thread.board, &thread.history, true);
        assert!(!mv.is_none());
    }
}
