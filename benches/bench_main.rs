use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ember::board::{Board, Move};
use ember::eval::{evaluate, PawnKingTable};
use ember::movegen::{self, MoveList};
use ember::perft::perft;
use ember::search::static_exchange_evaluation;
use ember::{bitboard, zobrist};

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

fn init_globals() {
    bitboard::init_tables();
    zobrist::keys();
}

fn bench_make_move(c: &mut Criterion) {
    init_globals();
    let mut group = c.benchmark_group("board");
    let mut board = Board::start_position();
    let mv = Move::new(12, 28); // e2e4

    group.bench_function("make_unmake_startpos", |b| {
        b.iter(|| {
            board.make_move(black_box(mv));
            board.undo_move(black_box(mv));
        })
    });
    group.finish();
}

fn bench_movegen(c: &mut Criterion) {
    init_globals();
    let mut group = c.benchmark_group("movegen");
    let board = Board::parse_fen(KIWIPETE);

    group.bench_function("generate_all_kiwipete", |b| {
        b.iter(|| {
            let mut list = MoveList::new();
            movegen::generate_all(black_box(&board), &mut list);
            black_box(list.count)
        })
    });

    group.bench_function("perft2_kiwipete", |b| {
        let mut board = Board::parse_fen(KIWIPETE);
        b.iter(|| black_box(perft(&mut board, 2)))
    });
    group.finish();
}

fn bench_see(c: &mut Criterion) {
    init_globals();
    let mut group = c.benchmark_group("see");
    let board = Board::parse_fen(KIWIPETE);
    let mut list = MoveList::new();
    movegen::generate_noisy(&board, &mut list);

    group.bench_function("see_all_noisy_kiwipete", |b| {
        b.iter(|| {
            let mut wins = 0;
            for i in 0..list.count {
                if static_exchange_evaluation(black_box(&board), list.moves[i], 0) {
                    wins += 1;
                }
            }
            black_box(wins)
        })
    });
    group.finish();
}

fn bench_eval(c: &mut Criterion) {
    init_globals();
    let mut group = c.benchmark_group("eval");
    let board = Board::parse_fen(KIWIPETE);
    let mut pktable = PawnKingTable::new();

    group.bench_function("evaluate_kiwipete", |b| {
        b.iter(|| black_box(evaluate(black_box(&board), &mut pktable)))
    });
    group.finish();
}

criterion_group!(benches, bench_make_move, bench_movegen, bench_see, bench_eval);
criterion_main!(benches);
