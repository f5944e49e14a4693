use crate::board::Board;
use crate::movegen::{self, MoveList};
use std::time::Instant;

pub fn perft(board: &mut Board, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut list = MoveList::new();
    movegen::generate_all(board, &mut list);

    let mut nodes = 0;
    for i in 0..list.count {
        let mv = list.moves[i];
        if board.make_move(mv) {
            nodes += if depth == 1 {
                1
            } else {
                perft(board, depth - 1)
            };
            board.undo_move(mv);
        }
    }
    nodes
}

pub const PERFT_SUITE: [(&str, &str, [u64; 5]); 5] = [
    (
        "Start Position",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        [20, 400, 8902, 197281, 4865609],
    ),
    (
        "Kiwipete",
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        [48, 2039, 97862, 4085603, 193690690],
    ),
    (
        "Rook Endgame",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        [14, 191, 2812, 43238, 674624],
    ),
    (
        "Promotion Tangle",
        "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
        [6, 264, 9467, 422333, 15833292],
    ),
    (
        "Mirrored Mate Net",
        "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
        [44, 1486, 62379, 2103487, 89941194],
    ),
];

pub fn run_perft_suite() {
    println!("--- Ember Perft Suite ---");

    let mut total_nodes = 0u64;
    let start = Instant::now();

    for (name, fen, expected) in PERFT_SUITE.iter() {
        let mut board = Board::parse_fen(fen);
        let depth = 4;
        let nodes = perft(&mut board, depth);
        total_nodes += nodes;

        let want = expected[depth as usize - 1];
        let verdict = if nodes == want { "ok" } else { "FAIL" };
        println!(
            "{:18} depth {}  nodes {:>10}  expected {:>10}  [{}]",
            name, depth, nodes, want, verdict
        );
    }

    let elapsed = start.elapsed().as_millis().max(1) as u64;
    println!(
        "total {} nodes in {} ms ({} knps)",
        total_nodes,
        elapsed,
        total_nodes / elapsed
    );
}
