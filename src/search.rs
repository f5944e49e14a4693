use crate::bitboard::{Bitboard, RANK_2, RANK_7};
use crate::board::{
    type_of, Board, Move, BISHOP, EMPTY, KIND_ENPASS, KIND_PROMO, KING, KNIGHT, PAWN, QUEEN, ROOK,
    WHITE,
};
use crate::eval::evaluate;
use crate::movegen::MAX_MOVES;
use crate::movepicker::{MovePicker, STAGE_GOOD_NOISY};
use crate::parameters::SearchParameters;
use crate::syzygy::{self, TbResult};
use crate::thread::{bind_this_thread, SearchShared, Thread};
use crate::time::{Limits, TimeManager};
use crate::tt::{TranspositionTable, BOUND_EXACT, BOUND_LOWER, BOUND_NONE, BOUND_UPPER, VALUE_NONE};
use crate::uci;
use std::sync::atomic::Ordering;
use std::sync::Arc;

pub const MAX_PLY: usize = 128;
pub const MATE: i32 = 32000;
pub const MATE_IN_MAX: i32 = MATE - MAX_PLY as i32;
pub const MATED_IN_MAX: i32 = -MATE + MAX_PLY as i32;

pub const SEE_PIECE_VALUES: [i32; 6] = [100, 450, 450, 675, 1300, 0];

// Helper-thread depth diversification, indexed by worker % SMP_CYCLES.
const SMP_CYCLES: usize = 16;
const SKIP_SIZE: [i32; SMP_CYCLES] = [1, 1, 1, 2, 2, 2, 1, 3, 2, 2, 1, 3, 3, 2, 2, 1];
const SKIP_DEPTHS: [i32; SMP_CYCLES] = [1, 2, 2, 4, 4, 3, 2, 5, 4, 3, 2, 6, 5, 4, 3, 2];

#[derive(Clone, Copy)]
pub struct PVariation {
    pub length: usize,
    pub line: [Move; MAX_PLY],
}

impl PVariation {
    pub fn new() -> Self {
        PVariation {
            length: 0,
            line: [Move::NONE; MAX_PLY],
        }
    }

    /// Prepends `mv` to the child variation.
    fn load(&mut self, mv: Move, child: &PVariation) {
        self.line[0] = mv;
        self.line[1..=child.length].copy_from_slice(&child.line[..child.length]);
        self.length = child.length + 1;
    }
}

impl Default for PVariation {
    fn default() -> Self {
        PVariation::new()
    }
}

/// Per-search bookkeeping owned by the caller and written only by the main
/// worker: completed depth, per-depth results, and the clock.
pub struct SearchInfo {
    pub depth: i32,
    pub values: [i32; MAX_PLY],
    pub best_moves: [Move; MAX_PLY],
    pub ponder_moves: [Move; MAX_PLY],
    pub time_manager: TimeManager,
}

/// Top-level entry: probes the DTZ tables, then runs one main worker inline
/// plus `nthreads - 1` helpers over the shared transposition table, and
/// returns the best and ponder moves of the deepest completed iteration.
pub fn get_best_move(
    board: &Board,
    limits: &Limits,
    tt: &Arc<TranspositionTable>,
    shared: &Arc<SearchShared>,
    params: &SearchParameters,
    nthreads: usize,
) -> (Move, Move) {
    shared.new_search();
    tt.update();

    if let Some(mv) = syzygy::probe_dtz_root(board) {
        return (mv, Move::NONE);
    }

    let mut info = SearchInfo {
        depth: 0,
        values: [0; MAX_PLY],
        best_moves: [Move::NONE; MAX_PLY],
        ponder_moves: [Move::NONE; MAX_PLY],
        time_manager: TimeManager::new(limits),
    };
    let start_time = info.time_manager.start_time;
    let max_usage = info.time_manager.max_usage;
    let nthreads = nthreads.max(1);

    std::thread::scope(|scope| {
        for index in 1..nthreads {
            let mut helper = Thread::new(
                index,
                nthreads,
                board.clone(),
                *limits,
                Arc::clone(tt),
                Arc::clone(shared),
                params.clone(),
                start_time,
                max_usage,
            );
            std::thread::Builder::new()
                .name(format!("ember-worker-{}", index))
                .stack_size(16 * 1024 * 1024)
                .spawn_scoped(scope, move || {
                    iterative_deepening(&mut helper, None);
                })
                .expect("failed to spawn search worker");
        }

        let mut main = Thread::new(
            0,
            nthreads,
            board.clone(),
            *limits,
            Arc::clone(tt),
            Arc::clone(shared),
            params.clone(),
            start_time,
            max_usage,
        );
        iterative_deepening(&mut main, Some(&mut info));

        // Main worker is done deciding; helpers unwind at their next check.
        shared.abort.store(true, Ordering::Release);
    });

    let depth = info.depth as usize;
    (info.best_moves[depth], info.ponder_moves[depth])
}

pub fn iterative_deepening(thread: &mut Thread, mut info: Option<&mut SearchInfo>) {
    let main_thread = thread.index == 0;
    let cycle = thread.index % SMP_CYCLES;

    if thread.nthreads > 8 {
        bind_this_thread(thread.index);
    }

    let mut depth = 1;
    while depth < MAX_PLY as i32 {
        thread.depth = depth;
        thread.seldepth = 0;

        let value = aspiration_window(thread, depth, thread.value);

        // An aborted iteration is discarded wholesale; the board is already
        // back at the root because every frame reverts on the way out.
        if thread.stopped {
            break;
        }
        thread.value = value;

        if !main_thread {
            if (depth + cycle as i32) % SKIP_DEPTHS[cycle] == 0 {
                depth += SKIP_SIZE[cycle];
            }
            depth += 1;
            continue;
        }

        let info = info.as_deref_mut().expect("main worker owns the SearchInfo");
        info.depth = depth;
        info.values[depth as usize] = value;
        info.best_moves[depth as usize] = thread.pv.line[0];
        info.ponder_moves[depth as usize] = if thread.pv.length >= 2 {
            thread.pv.line[1]
        } else {
            Move::NONE
        };

        uci::report(thread, -MATE, MATE, value);
        info.time_manager.update(depth, value, thread.pv.line[0]);

        if !thread.shared.pondering.load(Ordering::Acquire) {
            let elapsed = info.time_manager.elapsed();
            if (thread.limits.limited_by_self && info.time_manager.should_finish())
                || (thread.limits.limited_by_self && elapsed > info.time_manager.max_usage)
                || (thread.limits.limited_by_time && elapsed > thread.limits.time_limit)
                || (thread.limits.limited_by_depth && depth >= thread.limits.depth_limit)
            {
                break;
            }
        }
        depth += 1;
    }

    thread.global_nodes();
}

fn aspiration_window(thread: &mut Thread, depth: i32, last_value: i32) -> i32 {
    let main_thread = thread.index == 0;
    let mut delta = thread.params.window_size;

    let (mut alpha, mut beta) = if depth >= thread.params.window_depth {
        (
            (last_value - delta).max(-MATE),
            (last_value + delta).min(MATE),
        )
    } else {
        (-MATE, MATE)
    };

    loop {
        let mut pv = PVariation::new();
        let value = search(thread, &mut pv, alpha, beta, depth, 0);
        if thread.stopped {
            return 0;
        }
        thread.pv = pv;

        if value > alpha && value < beta {
            return value;
        }

        // The window cannot widen past the mate bounds; at full width the
        // result is final even when it sits on a bound (mated root).
        if alpha == -MATE && beta == MATE {
            return value;
        }

        // Long re-search: let the interface know which bound failed.
        if main_thread
            && thread.start_time.elapsed().as_millis() as u64 >= thread.params.window_timer_ms
        {
            uci::report(thread, alpha, beta, value);
        }

        if value <= alpha {
            beta = (alpha + beta) / 2;
            alpha = (alpha - delta).max(-MATE);
        }
        if value >= beta {
            beta = (beta + delta).min(MATE);
        }

        delta += delta / 2;
    }
}

pub fn search(
    thread: &mut Thread,
    pv: &mut PVariation,
    mut alpha: i32,
    beta: i32,
    mut depth: i32,
    height: usize,
) -> i32 {
    let pv_node = alpha != beta - 1;
    let root_node = height == 0;

    let mut lpv = PVariation::new();
    pv.length = 0;

    // Step 1. Drop into quiescence at the horizon, unless in check.
    if depth <= 0 && !thread.board.in_check() {
        return qsearch(thread, pv, alpha, beta, height);
    }
    depth = depth.max(0);

    thread.seldepth = if root_node {
        0
    } else {
        thread.seldepth.max(height)
    };
    thread.nodes += 1;

    // Step 2. Cooperative abort: unwind to iterative deepening.
    if thread.should_stop() {
        return 0;
    }

    // Step 3. Early exits, never taken at the root so a best move survives.
    if !root_node {
        if thread.board.is_drawn(height) {
            return 0;
        }
        if height >= MAX_PLY {
            return evaluate(&thread.board, &mut thread.pktable);
        }

        // Mate distance pruning.
        let r_alpha = alpha.max(-MATE + height as i32);
        let r_beta = beta.min(MATE - height as i32 - 1);
        if r_alpha >= r_beta {
            return r_alpha;
        }
    }

    // Step 4. Transposition table probe.
    let mut tt_move = Move::NONE;
    let mut tt_value = 0;
    let mut tt_eval = VALUE_NONE;
    let mut tt_depth = 0;
    let mut tt_bound = BOUND_NONE;
    let mut tt_hit = false;

    if let Some(entry) = thread.tt.probe(thread.board.hash) {
        tt_hit = true;
        tt_move = entry.mv;
        tt_eval = entry.eval;
        tt_depth = entry.depth;
        tt_bound = entry.bound;
        tt_value = value_from_tt(entry.value, height);

        // Cut only from a deeper search, and never inside a PV node unless
        // the alternative is dropping to quiescence.
        if tt_depth >= depth && (depth == 0 || !pv_node) {
            if tt_bound == BOUND_EXACT
                || (tt_bound & BOUND_LOWER != 0 && tt_value >= beta)
                || (tt_bound & BOUND_UPPER != 0 && tt_value <= alpha)
            {
                return tt_value;
            }
        }
    }

    // Step 5. Syzygy WDL probe.
    if !root_node {
        let tb = syzygy::probe_wdl(&thread.board, depth, height);
        if tb != TbResult::Failed {
            thread.tbhits += 1;

            let (value, bound) = match tb {
                TbResult::Loss => (-MATE + MAX_PLY as i32 + height as i32 + 1, BOUND_UPPER),
                TbResult::Win => (MATE - MAX_PLY as i32 - height as i32 - 1, BOUND_LOWER),
                _ => (0, BOUND_EXACT),
            };

            if bound == BOUND_EXACT
                || (bound == BOUND_LOWER && value >= beta)
                || (bound == BOUND_UPPER && value <= alpha)
            {
                thread.tt.store(
                    thread.board.hash,
                    Move::NONE,
                    value,
                    VALUE_NONE,
                    MAX_PLY as i32 - 1,
                    bound,
                );
                return value;
            }
        }
    }

    // Step 6. Static eval and the margins derived from it. The TT eval is
    // reused when present.
    let in_check = thread.board.in_check();
    let eval = if tt_hit && tt_eval != VALUE_NONE {
        tt_eval
    } else {
        evaluate(&thread.board, &mut thread.pktable)
    };
    thread.eval_stack[height] = eval;

    let futility_margin = eval + thread.params.futility_margin * depth;
    let see_margin = [
        thread.params.see_noisy_margin * depth * depth,
        thread.params.see_quiet_margin * depth,
    ];
    let improving = height >= 2 && eval > thread.eval_stack[height - 2];

    thread.killers[height + 1] = [Move::NONE; 2];

    // Step 7. Razoring: a stand-pat far below alpha settles for quiescence.
    if !pv_node
        && !in_check
        && depth <= thread.params.razor_depth
        && eval + thread.params.razor_margin < alpha
    {
        return qsearch(thread, pv, alpha, beta, height);
    }

    // Step 8. Reverse futility: eval comfortably above beta fails high.
    if !pv_node
        && !in_check
        && depth <= thread.params.beta_pruning_depth
        && eval - thread.params.beta_margin * depth > beta
    {
        return eval;
    }

    // Step 9. Null move pruning. Skipped when the last two plies were null,
    // without non-pawn material, or when the table already contradicts it.
    if !pv_node
        && !in_check
        && depth >= thread.params.null_move_pruning_depth
        && eval >= beta
        && thread.board.has_non_pawn_material(thread.board.turn)
        && thread.stack_move(height, 1) != Move::NULL
        && thread.stack_move(height, 2) != Move::NULL
        && (!tt_hit || (tt_bound & BOUND_UPPER) == 0 || tt_value >= beta)
    {
        let r = 4 + depth / 6 + ((eval - beta) / 200).min(3);

        thread.apply(Move::NULL, height);
        let value = -search(thread, &mut lpv, -beta, -beta + 1, depth - r, height + 1);
        thread.revert(Move::NULL);
        if thread.stopped {
            return 0;
        }

        if value >= beta {
            return beta;
        }
    }

    // Step 10. Probcut: a tactical refutation against a raised beta at
    // reduced depth is trusted to hold at this one.
    if !pv_node
        && depth >= thread.params.probcut_depth
        && beta.abs() < MATE_IN_MAX
        && eval + best_tactical_move_value(&thread.board) >= beta + thread.params.probcut_margin
    {
        let r_beta = (beta + thread.params.probcut_margin).min(MATE - MAX_PLY as i32 - 1);

        let mut picker = MovePicker::new_noisy(r_beta - eval);
        loop {
            let mv = picker.select_next(&thread.board, &thread.history, true);
            if mv.is_none() {
                break;
            }
            if !thread.apply(mv, height) {
                continue;
            }

            let value = -search(thread, &mut lpv, -r_beta, -r_beta + 1, depth - 4, height + 1);
            thread.revert(mv);
            if thread.stopped {
                return 0;
            }

            if value >= r_beta {
                return value;
            }
        }
    }

    // Step 11. The move loop.
    let old_alpha = alpha;
    let mut best = -MATE;
    let mut best_move = Move::NONE;
    let mut played: i32 = 0;
    let mut skip_quiets = false;
    let mut quiets_tried = [Move::NONE; MAX_MOVES];
    let mut quiets = 0usize;
    let (mut hist, mut cmhist, mut fmhist) = (0, 0, 0);

    let mut picker = MovePicker::new(&*thread, tt_move, height);
    loop {
        let mv = picker.select_next(&thread.board, &thread.history, skip_quiets);
        if mv.is_none() {
            break;
        }

        let is_quiet = !move_is_tactical(&thread.board, mv);
        if is_quiet {
            quiets_tried[quiets] = mv;
            quiets += 1;
            let looked_up = thread.get_history(mv, height);
            hist = looked_up.0;
            cmhist = looked_up.1;
            fmhist = looked_up.2;
        }

        // Step 12. Quiet-move pruning, only once a non-mated line exists.
        if is_quiet && best > MATED_IN_MAX {
            let imp = improving as usize;

            // 12A. Futility: hopeless eval plus a cold history turns off
            // the remaining quiets.
            if futility_margin <= alpha
                && depth <= thread.params.futility_pruning_depth
                && hist + cmhist + fmhist < thread.params.futility_pruning_history_limit[imp]
            {
                skip_quiets = true;
            }

            // 12B. Late move pruning by tried-quiet count.
            if depth <= thread.params.late_move_pruning_depth
                && quiets as i32 >= thread.params.late_move_pruning_counts[imp][depth as usize]
            {
                skip_quiets = true;
            }

            // 12C. Counter-move history pruning near the leaves.
            if depth <= thread.params.counter_move_pruning_depth[imp]
                && cmhist < thread.params.counter_move_history_limit[imp]
            {
                continue;
            }

            // 12D. Follow-up history pruning near the leaves.
            if depth <= thread.params.follow_up_move_pruning_depth[imp]
                && fmhist < thread.params.follow_up_move_history_limit[imp]
            {
                continue;
            }
        }

        // Step 13. SEE pruning. Past STAGE_GOOD_NOISY every noisy move has
        // already failed a non-negative exchange, so only the margin test
        // remains.
        if best > MATED_IN_MAX
            && depth <= thread.params.see_pruning_depth
            && picker.stage > STAGE_GOOD_NOISY
            && !static_exchange_evaluation(&thread.board, mv, see_margin[is_quiet as usize])
        {
            continue;
        }

        if !thread.apply(mv, height) {
            continue;
        }
        played += 1;

        // Step 14. Late move reductions for quiets picked late.
        let r = if is_quiet && depth > 2 && played > 1 {
            let mut r =
                thread.params.lmr_table[depth.min(63) as usize][played.min(63) as usize];
            r += !pv_node as i32;
            r += !improving as i32;
            r -= (mv == picker.killer1 || mv == picker.killer2 || mv == picker.counter) as i32;
            r -= ((hist + cmhist + fmhist) / 5000).clamp(-2, 2);
            r.clamp(1, depth - 1)
        } else {
            1
        };

        // Step 15. Singular candidate: the table move, stored deep enough
        // with a lower bound, probed for uniqueness below.
        let singular = !root_node
            && depth >= 8
            && mv == tt_move
            && tt_depth >= depth - 2
            && (tt_bound & BOUND_LOWER) != 0;

        // Step 16. Extensions: checks, an early quiet with excellent
        // continuation history, or a verified singular table move.
        let extension = in_check
            || (is_quiet && quiets <= 4 && cmhist >= 10000 && fmhist >= 10000)
            || (singular && move_is_singular(thread, tt_move, tt_value, depth, height));
        let new_depth = depth + (extension && !root_node) as i32;

        // Step 17. Principal variation search.
        let mut value = -MATE;

        // 17A. Reduced null-window search when LMR triggered.
        if r != 1 {
            value = -search(thread, &mut lpv, -alpha - 1, -alpha, new_depth - r, height + 1);
        }

        // 17B. Full-depth null window: after a reduced fail-high, or for
        // every non-first move of a PV node and all moves of a non-PV one.
        if (r != 1 && value > alpha) || (r == 1 && !(pv_node && played == 1)) {
            value = -search(thread, &mut lpv, -alpha - 1, -alpha, new_depth - 1, height + 1);
        }

        // 17C. Full window for the first move of a PV node and for any move
        // beating alpha on the null window.
        if pv_node && (played == 1 || value > alpha) {
            value = -search(thread, &mut lpv, -beta, -alpha, new_depth - 1, height + 1);
        }

        thread.revert(mv);
        if thread.stopped {
            return 0;
        }

        // Step 18. Track the best line; fail-hard cutoff on alpha >= beta.
        if value > best {
            best = value;
            best_move = mv;

            if value > alpha {
                alpha = value;
                pv.load(mv, &lpv);

                if alpha >= beta {
                    break;
                }
            }
        }
    }

    // Step 19. No legal move: mate or stalemate, graded by distance.
    if played == 0 {
        return if in_check { -MATE + height as i32 } else { 0 };
    }

    // Step 20. Reward the quiet cutoff move, punish the quiets before it.
    if best >= beta && !move_is_tactical(&thread.board, best_move) {
        thread.update_history_heuristics(&quiets_tried[..quiets], height, depth * depth);
    }

    // Step 21. Store the result.
    let bound = if best >= beta {
        BOUND_LOWER
    } else if best > old_alpha {
        BOUND_EXACT
    } else {
        BOUND_UPPER
    };
    thread.tt.store(
        thread.board.hash,
        best_move,
        value_to_tt(best, height),
        eval,
        depth,
        bound,
    );

    best
}

/// Reduced-depth probe run with `tt_move` already applied on the board: it
/// is taken back, the siblings are searched against a lowered bound, and the
/// move is reapplied before returning. True when nothing else came close.
fn move_is_singular(
    thread: &mut Thread,
    tt_move: Move,
    tt_value: i32,
    depth: i32,
    height: usize,
) -> bool {
    thread.revert(tt_move);

    let mut value = -MATE;
    let r_beta = (tt_value - depth).max(-MATE);
    let mut lpv = PVariation::new();

    let mut picker = MovePicker::new(&*thread, Move::NONE, height);
    loop {
        let mv = picker.select_next(&thread.board, &thread.history, false);
        if mv.is_none() {
            break;
        }
        if mv == tt_move {
            continue;
        }
        if !thread.apply(mv, height) {
            continue;
        }

        value = -search(thread, &mut lpv, -r_beta - 1, -r_beta, depth / 2 - 1, height + 1);
        thread.revert(mv);

        if thread.stopped || value > r_beta {
            break;
        }
    }

    thread.apply(tt_move, height);
    value <= r_beta
}

pub fn qsearch(
    thread: &mut Thread,
    pv: &mut PVariation,
    mut alpha: i32,
    beta: i32,
    height: usize,
) -> i32 {
    let mut lpv = PVariation::new();
    pv.length = 0;

    thread.seldepth = thread.seldepth.max(height);
    thread.nodes += 1;

    if thread.should_stop() {
        return 0;
    }

    if thread.board.is_drawn(height) {
        return 0;
    }
    if height >= MAX_PLY {
        return evaluate(&thread.board, &mut thread.pktable);
    }

    // Table cutoffs apply at any depth here.
    let mut tt_eval = VALUE_NONE;
    if let Some(entry) = thread.tt.probe(thread.board.hash) {
        let tt_value = value_from_tt(entry.value, height);
        if entry.bound == BOUND_EXACT
            || (entry.bound & BOUND_LOWER != 0 && tt_value >= beta)
            || (entry.bound & BOUND_UPPER != 0 && tt_value <= alpha)
        {
            return tt_value;
        }
        tt_eval = entry.eval;
    }

    // Stand pat.
    let eval = if tt_eval != VALUE_NONE {
        tt_eval
    } else {
        evaluate(&thread.board, &mut thread.pktable)
    };
    let mut best = eval;
    alpha = alpha.max(eval);
    if alpha >= beta {
        return eval;
    }

    // Delta pruning: even the best conceivable capture cannot reach alpha.
    let margin = alpha - eval - thread.params.qfutility_margin;
    if best_tactical_move_value(&thread.board) < margin {
        return eval;
    }

    let mut picker = MovePicker::new_noisy(thread.params.qsee_margin.max(margin));
    loop {
        let mv = picker.select_next(&thread.board, &thread.history, true);
        if mv.is_none() {
            break;
        }
        if !thread.apply(mv, height) {
            continue;
        }

        let value = -qsearch(thread, &mut lpv, -beta, -alpha, height + 1);
        thread.revert(mv);
        if thread.stopped {
            return 0;
        }

        if value > best {
            best = value;
            if value > alpha {
                alpha = value;
                pv.load(mv, &lpv);
            }
        }

        if alpha >= beta {
            return best;
        }
    }

    best
}

/// Swap-off evaluation: does this move win at least `threshold` material
/// once every profitable recapture has been exchanged?
pub fn static_exchange_evaluation(board: &Board, mv: Move, threshold: i32) -> bool {
    let from = mv.from();
    let to = mv.to();
    let kind = mv.kind();

    let mut next_victim = if kind == KIND_PROMO {
        mv.promo_piece()
    } else {
        type_of(board.squares[from as usize])
    };

    // Best case: the full move value comes in. Castling passes through here
    // with a zero king value, landing in one of the two early outs.
    let mut balance = tactical_move_value(board, mv) - threshold;
    if balance < 0 {
        return false;
    }

    // Worst case: the moved piece is lost for nothing.
    balance -= SEE_PIECE_VALUES[next_victim];
    if balance >= 0 {
        return true;
    }

    let bishops = board.pieces[BISHOP] | board.pieces[QUEEN];
    let rooks = board.pieces[ROOK] | board.pieces[QUEEN];

    let mut occupied = (board.occupied() ^ Bitboard(1u64 << from)) | Bitboard(1u64 << to);
    if kind == KIND_ENPASS {
        occupied ^= Bitboard(1u64 << board.ep_square);
    }

    let mut attackers = board.attackers_to(to, occupied) & occupied;
    let mut colour = board.turn ^ 1;

    loop {
        let my_attackers = attackers & board.colours[colour];
        if my_attackers.is_empty() {
            break;
        }

        // Recapture with the weakest piece; only the king remains otherwise.
        next_victim = KING;
        for ptype in [PAWN, KNIGHT, BISHOP, ROOK, QUEEN] {
            if !(my_attackers & board.pieces[ptype]).is_empty() {
                next_victim = ptype;
                break;
            }
        }

        occupied ^= Bitboard(1u64 << (my_attackers & board.pieces[next_victim]).lsb());

        // Diagonal recaptures may reveal new diagonal attackers, orthogonal
        // ones new rooks or queens.
        if next_victim == PAWN || next_victim == BISHOP || next_victim == QUEEN {
            attackers |= crate::bitboard::bishop_attacks(to, occupied) & bishops;
        }
        if next_victim == ROOK || next_victim == QUEEN {
            attackers |= crate::bitboard::rook_attacks(to, occupied) & rooks;
        }
        attackers &= occupied;

        colour ^= 1;
        balance = -balance - 1 - SEE_PIECE_VALUES[next_victim];

        if balance >= 0 {
            // A king "recapture" into remaining attackers would be illegal,
            // so the side that tried it is the loser.
            if next_victim == KING && !(attackers & board.colours[colour]).is_empty() {
                colour ^= 1;
            }
            break;
        }
    }

    board.turn != colour
}

pub fn move_is_tactical(board: &Board, mv: Move) -> bool {
    board.squares[mv.to() as usize] != EMPTY
        || mv.kind() == KIND_PROMO
        || mv.kind() == KIND_ENPASS
}

/// Material swing of one tactical move: victim, plus promotion gain, plus
/// the en-passant pawn.
pub fn tactical_move_value(board: &Board, mv: Move) -> i32 {
    let target = board.squares[mv.to() as usize];
    let mut value = if target == EMPTY {
        0
    } else {
        SEE_PIECE_VALUES[type_of(target)]
    };
    if mv.kind() == KIND_PROMO {
        value += SEE_PIECE_VALUES[mv.promo_piece()] - SEE_PIECE_VALUES[PAWN];
    }
    if mv.kind() == KIND_ENPASS {
        value += SEE_PIECE_VALUES[PAWN];
    }
    value
}

/// Upper bound on what any single tactical move could gain here: the best
/// enemy piece on the board, plus a promotion if a pawn stands ready.
pub fn best_tactical_move_value(board: &Board) -> i32 {
    let mut value = SEE_PIECE_VALUES[PAWN];

    let targets = board.colours[board.turn ^ 1];
    for ptype in [QUEEN, ROOK, BISHOP, KNIGHT] {
        if !(targets & board.pieces[ptype]).is_empty() {
            value = SEE_PIECE_VALUES[ptype];
            break;
        }
    }

    let seventh = if board.turn == WHITE { RANK_7 } else { RANK_2 };
    if !(board.pieces[PAWN] & board.colours[board.turn] & Bitboard(seventh)).is_empty() {
        value += SEE_PIECE_VALUES[QUEEN] - SEE_PIECE_VALUES[PAWN];
    }

    value
}

/// Mate scores enter the table height-independent: a mate-in-n from this
/// node stores the same value no matter where the node sits in the tree.
pub fn value_to_tt(value: i32, height: usize) -> i32 {
    if value >= MATE_IN_MAX {
        value + height as i32
    } else if value <= MATED_IN_MAX {
        value - height as i32
    } else {
        value
    }
}

pub fn value_from_tt(value: i32, height: usize) -> i32 {
    if value >= MATE_IN_MAX {
        value - height as i32
    } else if value <= MATED_IN_MAX {
        value + height as i32
    } else {
        value
    }
}
