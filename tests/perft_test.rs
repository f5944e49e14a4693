use ember::bitboard;
use ember::board::Board;
use ember::perft::{perft, PERFT_SUITE};
use std::sync::Once;

static INIT: Once = Once::new();

fn init() {
    INIT.call_once(bitboard::init_tables);
}

#[test]
fn perft_suite_depth_three() {
    init();
    for (name, fen, expected) in PERFT_SUITE.iter() {
        let mut board = Board::parse_fen(fen);
        let nodes = perft(&mut board, 3);
        assert_eq!(nodes, expected[2], "depth 3 mismatch for {}", name);
    }
}

#[test]
fn perft_startpos_depth_four() {
    init();
    let mut board = Board::start_position();
    assert_eq!(perft(&mut board, 4), 197281);
}

#[test]
fn perft_rook_endgame_depth_five() {
    // Heavy on en passant, promotions and pins.
    init();
    let mut board = Board::parse_fen("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1");
    assert_eq!(perft(&mut board, 5), 674624);
}

#[test]
fn perft_leaves_board_untouched() {
    init();
    let mut board = Board::parse_fen(
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    );
    let hash = board.hash;
    let squares = board.squares;
    perft(&mut board, 3);
    assert_eq!(board.hash, hash);
    assert_eq!(board.squares, squares);
}
