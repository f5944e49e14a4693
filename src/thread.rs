use crate::board::{type_of, Board, Move, EMPTY};
use crate::eval::PawnKingTable;
use crate::history::HistoryTables;
use crate::parameters::SearchParameters;
use crate::search::{PVariation, MAX_PLY};
use crate::time::Limits;
use crate::tt::TranspositionTable;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

pub const STACK_SIZE: usize = MAX_PLY + 4;

/// The only state the workers share besides the transposition table: the
/// abort and ponder flags, and aggregate counters for reporting.
pub struct SearchShared {
    pub abort: AtomicBool,
    pub pondering: AtomicBool,
    pub nodes: AtomicU64,
    pub tbhits: AtomicU64,
}

impl SearchShared {
    pub fn new() -> Self {
        SearchShared {
            abort: AtomicBool::new(false),
            pondering: AtomicBool::new(false),
            nodes: AtomicU64::new(0),
            tbhits: AtomicU64::new(0),
        }
    }

    /// Fresh counters and a cleared abort flag for a new search. The ponder
    /// flag is owned by the UCI loop and left alone.
    pub fn new_search(&self) {
        self.abort.store(false, Ordering::Release);
        self.nodes.store(0, Ordering::Relaxed);
        self.tbhits.store(0, Ordering::Relaxed);
    }
}

impl Default for SearchShared {
    fn default() -> Self {
        SearchShared::new()
    }
}

pub struct Thread {
    pub index: usize,
    pub nthreads: usize,
    pub depth: i32,
    pub seldepth: usize,
    pub value: i32,
    pub nodes: u64,
    pub tbhits: u64,
    flushed_nodes: u64,
    flushed_tbhits: u64,
    pub board: Board,
    pub pv: PVariation,
    pub eval_stack: [i32; STACK_SIZE],
    pub move_stack: [Move; STACK_SIZE],
    pub piece_stack: [u8; STACK_SIZE],
    pub killers: [[Move; 2]; STACK_SIZE],
    pub history: HistoryTables,
    pub pktable: PawnKingTable,
    pub params: SearchParameters,
    pub limits: Limits,
    pub tt: Arc<TranspositionTable>,
    pub shared: Arc<SearchShared>,
    pub start_time: Instant,
    /// Hard elapsed-time cap for self-managed searches, fixed at launch.
    pub max_usage: u64,
    pub stopped: bool,
}

impl Thread {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        index: usize,
        nthreads: usize,
        board: Board,
        limits: Limits,
        tt: Arc<TranspositionTable>,
        shared: Arc<SearchShared>,
        params: SearchParameters,
        start_time: Instant,
        max_usage: u64,
    ) -> Self {
        Thread {
            index,
            nthreads,
            depth: 0,
            seldepth: 0,
            value: 0,
            nodes: 0,
            tbhits: 0,
            flushed_nodes: 0,
            flushed_tbhits: 0,
            board,
            pv: PVariation::new(),
            eval_stack: [0; STACK_SIZE],
            move_stack: [Move::NONE; STACK_SIZE],
            piece_stack: [EMPTY; STACK_SIZE],
            killers: [[Move::NONE; 2]; STACK_SIZE],
            history: HistoryTables::new(),
            pktable: PawnKingTable::new(),
            params,
            limits,
            tt,
            shared,
            start_time,
            max_usage,
            stopped: false,
        }
    }

    /// Applies a move (or NULL_MOVE) on the thread's board, recording it on
    /// the per-ply stacks. Returns false when illegal; the board is already
    /// unwound in that case.
    pub fn apply(&mut self, mv: Move, height: usize) -> bool {
        if mv == Move::NULL {
            self.board.make_null();
            self.move_stack[height] = Move::NULL;
            self.piece_stack[height] = EMPTY;
            return true;
        }
        if !self.board.make_move(mv) {
            return false;
        }
        self.move_stack[height] = mv;
        self.piece_stack[height] = self.board.squares[mv.to() as usize];
        true
    }

    pub fn revert(&mut self, mv: Move) {
        if mv == Move::NULL {
            self.board.undo_null();
        } else {
            self.board.undo_move(mv);
        }
    }

    /// (piece type, destination) of the move played `plies_back` plies above
    /// this node, when it was a real move.
    pub fn move_context(&self, height: usize, plies_back: usize) -> Option<(usize, u8)> {
        if height < plies_back {
            return None;
        }
        let mv = self.move_stack[height - plies_back];
        let piece = self.piece_stack[height - plies_back];
        if mv == Move::NONE || mv == Move::NULL || piece == EMPTY {
            return None;
        }
        Some((type_of(piece), mv.to()))
    }

    pub fn stack_move(&self, height: usize, plies_back: usize) -> Move {
        if height < plies_back {
            Move::NONE
        } else {
            self.move_stack[height - plies_back]
        }
    }

    /// Butterfly, counter-move and follow-up history for a quiet move about
    /// to be searched at `height`.
    pub fn get_history(&self, mv: Move, height: usize) -> (i32, i32, i32) {
        let ptype = type_of(self.board.squares[mv.from() as usize]);
        let hist = self.history.butterfly(self.board.turn, mv);
        let cmhist = self
            .history
            .counter_hist(self.move_context(height, 1), ptype, mv.to());
        let fmhist = self
            .history
            .followup_hist(self.move_context(height, 2), ptype, mv.to());
        (hist, cmhist, fmhist)
    }

    /// Fail-high bookkeeping: the last entry of `quiets` is the cutoff move.
    /// It gets the bonus, the earlier tries are punished, and the killer and
    /// counter-move tables are refreshed.
    pub fn update_history_heuristics(&mut self, quiets: &[Move], height: usize, bonus: i32) {
        let best = *quiets.last().unwrap();
        let colour = self.board.turn;

        if self.killers[height][0] != best {
            self.killers[height][1] = self.killers[height][0];
            self.killers[height][0] = best;
        }

        let prev = self.move_context(height, 1);
        let prev2 = self.move_context(height, 2);
        self.history.set_counter_move(colour, prev, best);

        for &mv in quiets {
            let ptype = type_of(self.board.squares[mv.from() as usize]);
            let delta = if mv == best { bonus } else { -bonus };
            self.history.update_quiet(colour, mv, ptype, prev, prev2, delta);
        }
    }

    fn flush_counters(&mut self) {
        let nodes = self.nodes - self.flushed_nodes;
        if nodes > 0 {
            self.shared.nodes.fetch_add(nodes, Ordering::Relaxed);
            self.flushed_nodes = self.nodes;
        }
        let tbhits = self.tbhits - self.flushed_tbhits;
        if tbhits > 0 {
            self.shared.tbhits.fetch_add(tbhits, Ordering::Relaxed);
            self.flushed_tbhits = self.tbhits;
        }
    }

    /// Publishes outstanding counters and returns the global node count.
    pub fn global_nodes(&mut self) -> u64 {
        self.flush_counters();
        self.shared.nodes.load(Ordering::Relaxed)
    }

    pub fn global_tbhits(&mut self) -> u64 {
        self.flush_counters();
        self.shared.tbhits.load(Ordering::Relaxed)
    }

    fn terminate_search_early(&mut self) -> bool {
        if self.limits.limited_by_nodes {
            self.flush_counters();
            if self.shared.nodes.load(Ordering::Relaxed) >= self.limits.node_limit {
                return true;
            }
        }
        let elapsed = self.start_time.elapsed().as_millis() as u64;
        (self.limits.limited_by_time && elapsed > self.limits.time_limit)
            || (self.limits.limited_by_self && elapsed > self.max_usage)
    }

    /// Cooperative abort check, run at every search and qsearch entry. Once
    /// it fires the thread unwinds to its iterative-deepening loop, undoing
    /// applied moves on the way out.
    pub fn should_stop(&mut self) -> bool {
        if self.stopped {
            return true;
        }

        if self.shared.abort.load(Ordering::Acquire) {
            self.stopped = true;
            return true;
        }

        if self.nodes & 1023 == 0 {
            self.flush_counters();
            if self.terminate_search_early() && !self.shared.pondering.load(Ordering::Acquire) {
                self.stopped = true;
                return true;
            }
        }

        false
    }
}

/// Best-effort CPU pinning, used only with large worker counts.
#[allow(unused_variables)]
pub fn bind_this_thread(index: usize) {
    #[cfg(target_os = "linux")]
    unsafe {
        let cpus = libc::sysconf(libc::_SC_NPROCESSORS_ONLN);
        if cpus > 0 {
            let mut set: libc::cpu_set_t = std::mem::zeroed();
            libc::CPU_ZERO(&mut set);
            libc::CPU_SET(index % cpus as usize, &mut set);
            libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set);
        }
    }

    #[cfg(target_os = "windows")]
    unsafe {
        use windows_sys::Win32::System::Threading::{GetCurrentThread, SetThreadAffinityMask};
        let bits = usize::BITS as usize;
        SetThreadAffinityMask(GetCurrentThread(), 1usize << (index % bits));
    }
}
