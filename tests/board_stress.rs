use ember::bitboard;
use ember::board::{Board, START_FEN};
use ember::movegen::{self, MoveList};
use rand::Rng;
use std::sync::Once;

static INIT: Once = Once::new();

fn init() {
    INIT.call_once(bitboard::init_tables);
}

fn assert_same_position(a: &Board, b: &Board, context: &str) {
    assert_eq!(a.hash, b.hash, "hash mismatch {}", context);
    assert_eq!(a.squares, b.squares, "mailbox mismatch {}", context);
    assert_eq!(a.pieces, b.pieces, "piece boards mismatch {}", context);
    assert_eq!(a.colours, b.colours, "colour boards mismatch {}", context);
    assert_eq!(a.turn, b.turn, "side mismatch {}", context);
    assert_eq!(a.castle_rights, b.castle_rights, "castling mismatch {}", context);
    assert_eq!(a.ep_square, b.ep_square, "ep mismatch {}", context);
    assert_eq!(a.halfmove, b.halfmove, "halfmove mismatch {}", context);
    assert_eq!(
        a.king_attackers, b.king_attackers,
        "checkers mismatch {}",
        context
    );
}

/// Random walk asserting that make/undo is an exact inverse, including for
/// the moves rejected as illegal.
#[test]
fn make_undo_random_walk() {
    init();
    let mut rng = rand::rng();
    let mut board = Board::parse_fen(START_FEN);

    for step in 0..4000 {
        let mut list = MoveList::new();
        movegen::generate_all(&board, &mut list);

        let mut any_legal = false;
        for i in 0..list.count {
            if board.make_move(list.moves[i]) {
                board.undo_move(list.moves[i]);
                any_legal = true;
                break;
            }
        }
        if !any_legal || board.halfmove >= 100 {
            board = Board::parse_fen(START_FEN);
            continue;
        }

        let mv = list.moves[rng.random_range(0..list.count)];
        let before = board.clone();
        let context = format!("at step {} after {}", step, mv.uci());

        if board.make_move(mv) {
            board.undo_move(mv);
            assert_same_position(&board, &before, &context);
            // Walk on with the same move.
            assert!(board.make_move(mv));
        } else {
            // Rejected moves must leave no trace either.
            assert_same_position(&board, &before, &context);
        }
    }
}
