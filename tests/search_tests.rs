use ember::bitboard;
use ember::board::{Board, Move};
use ember::movegen::{self, MoveList};
use ember::parameters::SearchParameters;
use ember::search::{self, PVariation, SearchInfo, MATE, MATE_IN_MAX};
use ember::thread::{SearchShared, Thread};
use ember::time::{Limits, TimeManager};
use ember::tt::{TranspositionTable, BOUND_EXACT};
use std::sync::Once;
use std::sync::Arc;
use std::time::Instant;

static INIT: Once = Once::new();

fn init() {
    INIT.call_once(bitboard::init_tables);
}

fn new_thread(fen: &str, limits: Limits) -> Thread {
    Thread::new(
        0,
        1,
        Board::parse_fen(fen),
        limits,
        Arc::new(TranspositionTable::new(2)),
        Arc::new(SearchShared::new()),
        SearchParameters::default(),
        Instant::now(),
        u64::MAX,
    )
}

fn search_position(fen: &str, depth: i32) -> (i32, PVariation, Thread) {
    init();
    let mut thread = new_thread(fen, Limits::infinite());
    let mut pv = PVariation::new();
    let value = search::search(&mut thread, &mut pv, -MATE, MATE, depth, 0);
    (value, pv, thread)
}

fn is_legal(board: &mut Board, mv: Move) -> bool {
    let mut list = MoveList::new();
    movegen::generate_all(board, &mut list);
    if !list.moves[..list.count].contains(&mv) {
        return false;
    }
    if board.make_move(mv) {
        board.undo_move(mv);
        return true;
    }
    false
}

#[test]
fn finds_mate_in_one() {
    let (value, pv, mut thread) = search_position("6k1/5ppp/8/8/8/8/8/4R2K w - - 0 1", 3);
    assert_eq!(value, MATE - 1);
    assert!(pv.length >= 1);

    // Any mating queen move is acceptable; verify it actually mates.
    let mv = pv.line[0];
    assert!(thread.board.make_move(mv));
    assert!(thread.board.in_check());
    let mut list = MoveList::new();
    movegen::generate_all(&thread.board, &mut list);
    let mut replies = 0;
    for i in 0..list.count {
        if thread.board.make_move(list.moves[i]) {
            thread.board.undo_move(list.moves[i]);
            replies += 1;
        }
    }
    assert_eq!(replies, 0);
}

#[test]
fn stalemate_scores_zero_with_no_best_move() {
    let (value, pv, _) = search_position("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", 5);
    assert_eq!(value, 0);
    assert_eq!(pv.length, 0);
    assert_eq!(pv.line[0], Move::NONE);
}

#[test]
fn insufficient_material_is_a_draw() {
    let (value, _, _) = search_position("8/8/4k3/8/8/4K3/8/8 w - - 0 1", 6);
    assert_eq!(value, 0);
}

#[test]
fn mate_score_beats_material_grab() {
    // Re8 mates even with the enemy rook hanging on b2.
    let (value, pv, mut thread) =
        search_position("6k1/5ppp/8/8/8/8/1r6/4R2K w - - 0 1", 5);
    assert!(value >= MATE_IN_MAX, "expected mate score, got {}", value);
    assert_eq!(pv.line[0], Move::new(4, 60)); // e1e8
    assert!(is_legal(&mut thread.board, pv.line[0]));
}

#[test]
fn root_tt_entry_reproduces_the_search_value() {
    init();
    let mut thread = new_thread(
        "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
        Limits::infinite(),
    );
    let mut pv = PVariation::new();
    let depth = 4;
    let value = search::search(&mut thread, &mut pv, -MATE, MATE, depth, 0);

    let entry = thread.tt.probe(thread.board.hash).expect("root stored");
    assert_eq!(entry.bound, BOUND_EXACT);
    assert_eq!(entry.depth, depth);
    assert_eq!(entry.value, value); // non-mate value, envelope is identity
    assert_eq!(entry.mv, pv.line[0]);
}

#[test]
fn node_limit_abort_restores_the_root_board() {
    init();
    let mut thread = new_thread(
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        Limits::fixed_nodes(3000),
    );
    let root_hash = thread.board.hash;
    let root_squares = thread.board.squares;

    let mut info = SearchInfo {
        depth: 0,
        values: [0; search::MAX_PLY],
        best_moves: [Move::NONE; search::MAX_PLY],
        ponder_moves: [Move::NONE; search::MAX_PLY],
        time_manager: TimeManager::new(&Limits::fixed_nodes(3000)),
    };
    search::iterative_deepening(&mut thread, Some(&mut info));

    assert!(thread.stopped);
    assert_eq!(thread.board.hash, root_hash);
    assert_eq!(thread.board.squares, root_squares);
}

#[test]
fn get_best_move_returns_a_legal_move() {
    init();
    let board = Board::parse_fen(
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    );
    let tt = Arc::new(TranspositionTable::new(4));
    let shared = Arc::new(SearchShared::new());
    let params = SearchParameters::default();

    let (best, _) = search::get_best_move(
        &board,
        &Limits::fixed_depth(5),
        &tt,
        &shared,
        &params,
        1,
    );
    let mut check = board.clone();
    assert!(is_legal(&mut check, best));
}

#[test]
fn lazy_smp_workers_agree_on_legality() {
    init();
    let board = Board::start_position();
    let tt = Arc::new(TranspositionTable::new(8));
    let shared = Arc::new(SearchShared::new());
    let params = SearchParameters::default();

    let (best, ponder) = search::get_best_move(
        &board,
        &Limits::fixed_depth(6),
        &tt,
        &shared,
        &params,
        3,
    );
    let mut check = board.clone();
    assert!(is_legal(&mut check, best));

    if !ponder.is_none() {
        assert!(check.make_move(best));
        assert!(is_legal(&mut check, ponder));
    }
}

#[test]
fn deeper_search_still_sees_the_mate() {
    // Mate score from the table must re-adjust by height on later probes.
    let (value_d3, _, _) = search_position("6k1/5ppp/8/8/8/8/8/4R2K w - - 0 1", 3);
    let (value_d6, _, _) = search_position("6k1/5ppp/8/8/8/8/8/4R2K w - - 0 1", 6);
    assert_eq!(value_d3, value_d6);
}
