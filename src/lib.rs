pub mod bitboard;
pub mod board;
pub mod eval;
pub mod history;
pub mod logging;
pub mod movegen;
pub mod movepicker;
pub mod parameters;
pub mod perft;
pub mod search;
pub mod syzygy;
pub mod thread;
pub mod time;
pub mod tt;
pub mod uci;
pub mod zobrist;

use crate::board::Board;
use crate::parameters::SearchParameters;
use crate::thread::SearchShared;
use crate::time::Limits;
use crate::tt::TranspositionTable;
use std::env;
use std::sync::Arc;
use std::thread as os_thread;
use std::time::Instant;

pub fn run_cli() {
    logging::init_logging();
    bitboard::init_tables();

    let args: Vec<String> = env::args().collect();
    if args.len() > 1 {
        match args[1].as_str() {
            "perft" => {
                perft::run_perft_suite();
                return;
            }
            "bench" => {
                let depth = args
                    .get(2)
                    .and_then(|d| d.parse().ok())
                    .unwrap_or(10);
                run_bench(depth);
                return;
            }
            _ => {}
        }
    }

    let builder = os_thread::Builder::new()
        .name("uci_thread".into())
        .stack_size(32 * 1024 * 1024);
    let handle = builder.spawn(uci::uci_loop).unwrap();
    handle.join().unwrap();
}

const BENCH_POSITIONS: [&str; 4] = [
    board::START_FEN,
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
];

fn run_bench(depth: i32) {
    let tt = Arc::new(TranspositionTable::new(16));
    let shared = Arc::new(SearchShared::new());
    let params = SearchParameters::default();
    let limits = Limits::fixed_depth(depth);

    let mut total_nodes = 0u64;
    let start = Instant::now();

    for fen in BENCH_POSITIONS {
        let board = Board::parse_fen(fen);
        let (best, _) = search::get_best_move(&board, &limits, &tt, &shared, &params, 1);
        let nodes = shared.nodes.load(std::sync::atomic::Ordering::Relaxed);
        total_nodes += nodes;
        println!("bench: {} -> {} ({} nodes)", fen, best.uci(), nodes);
    }

    let elapsed = start.elapsed().as_millis().max(1) as u64;
    println!(
        "bench depth {}: {} nodes {} nps",
        depth,
        total_nodes,
        total_nodes * 1000 / elapsed
    );
}
