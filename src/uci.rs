use crate::board::{Board, Move, BLACK, WHITE};
use crate::movegen::{self, MoveList};
use crate::parameters::SearchParameters;
use crate::search::{self, MATE, MATE_IN_MAX};
use crate::syzygy;
use crate::thread::{SearchShared, Thread};
use crate::time::Limits;
use crate::tt::TranspositionTable;
use std::io::{self, BufRead};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread as os_thread;

pub const NAME: &str = "Ember";
pub const VERSION: &str = "0.9";

pub fn uci_loop() {
    let stdin = io::stdin();
    let mut buffer = String::new();

    let mut tt = Arc::new(TranspositionTable::new(64));
    let shared = Arc::new(SearchShared::new());
    let mut params = SearchParameters::default();
    let mut board = Board::start_position();
    let mut nthreads: usize = 1;
    let mut move_overhead: u64 = 10;
    let mut search_thread: Option<os_thread::JoinHandle<()>> = None;

    loop {
        buffer.clear();
        match stdin.lock().read_line(&mut buffer) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        let parts: Vec<&str> = buffer.split_whitespace().collect();
        let Some(&command) = parts.first() else {
            continue;
        };

        match command {
            "uci" => {
                println!("id name {} {}", NAME, VERSION);
                println!("id author the Ember authors");
                println!("option name Hash type spin default 64 min 1 max 65536");
                println!("option name Threads type spin default 1 min 1 max 256");
                println!("option name MoveOverhead type spin default 10 min 0 max 10000");
                println!("option name Ponder type check default false");
                println!("option name SyzygyPath type string default <empty>");
                println!("option name SyzygyProbeDepth type spin default 1 min 0 max 127");
                println!("option name ParamsFile type string default <empty>");
                println!("uciok");
            }
            "isready" => println!("readyok"),
            "ucinewgame" => {
                stop_search(&shared, &mut search_thread);
                board = Board::start_position();
                tt.clear();
            }
            "setoption" => {
                stop_search(&shared, &mut search_thread);
                handle_setoption(
                    &parts,
                    &mut tt,
                    &mut params,
                    &mut nthreads,
                    &mut move_overhead,
                );
            }
            "position" => {
                stop_search(&shared, &mut search_thread);
                handle_position(&mut board, &parts);
            }
            "go" => {
                stop_search(&shared, &mut search_thread);
                shared
                    .pondering
                    .store(parts.contains(&"ponder"), Ordering::Release);

                let limits = parse_go(&parts, board.turn, move_overhead);
                log::info!("go: {:?}", limits);

                let board = board.clone();
                let tt = Arc::clone(&tt);
                let shared = Arc::clone(&shared);
                let params = params.clone();
                let builder = os_thread::Builder::new()
                    .name("ember-search".into())
                    .stack_size(32 * 1024 * 1024);
                search_thread = Some(
                    builder
                        .spawn(move || {
                            run_search(&board, &limits, &tt, &shared, &params, nthreads);
                        })
                        .expect("failed to spawn search thread"),
                );
            }
            "ponderhit" => shared.pondering.store(false, Ordering::Release),
            "stop" => stop_search(&shared, &mut search_thread),
            "quit" => {
                stop_search(&shared, &mut search_thread);
                break;
            }
            _ => {}
        }
    }
}

fn stop_search(shared: &Arc<SearchShared>, handle: &mut Option<os_thread::JoinHandle<()>>) {
    if let Some(handle) = handle.take() {
        shared.abort.store(true, Ordering::Release);
        shared.pondering.store(false, Ordering::Release);
        let _ = handle.join();
    }
}

fn run_search(
    board: &Board,
    limits: &Limits,
    tt: &Arc<TranspositionTable>,
    shared: &Arc<SearchShared>,
    params: &SearchParameters,
    nthreads: usize,
) {
    let (best, ponder) = search::get_best_move(board, limits, tt, shared, params, nthreads);
    log::info!(
        "search finished: best {} nodes {}",
        best.uci(),
        shared.nodes.load(Ordering::Relaxed)
    );
    if best.is_none() {
        println!("bestmove (none)");
    } else if ponder.is_none() {
        println!("bestmove {}", best.uci());
    } else {
        println!("bestmove {} ponder {}", best.uci(), ponder.uci());
    }
}

fn handle_setoption(
    parts: &[&str],
    tt: &mut Arc<TranspositionTable>,
    params: &mut SearchParameters,
    nthreads: &mut usize,
    move_overhead: &mut u64,
) {
    // setoption name <id> value <x>
    if parts.len() < 5 || parts[1] != "name" || parts[3] != "value" {
        return;
    }
    let value = parts[4..].join(" ");

    match parts[2] {
        "Hash" => {
            if let Ok(mb) = value.parse::<usize>() {
                *tt = Arc::new(TranspositionTable::new(mb.clamp(1, 65536)));
            }
        }
        "Threads" => {
            if let Ok(n) = value.parse::<usize>() {
                *nthreads = n.clamp(1, 256);
            }
        }
        "MoveOverhead" => {
            if let Ok(ms) = value.parse::<u64>() {
                *move_overhead = ms.min(10_000);
            }
        }
        "SyzygyPath" => syzygy::init(&value),
        "SyzygyProbeDepth" => {
            if let Ok(depth) = value.parse::<i32>() {
                syzygy::TB_PROBE_DEPTH.store(depth.clamp(0, 127), Ordering::Relaxed);
            }
        }
        "ParamsFile" => match SearchParameters::load_from_json(&value) {
            Ok(loaded) => {
                *params = loaded;
                println!("info string loaded search parameters from {}", value);
            }
            Err(e) => println!("info string failed to load {}: {}", value, e),
        },
        "Ponder" => {}
        _ => {}
    }
}

fn handle_position(board: &mut Board, parts: &[&str]) {
    if parts.len() < 2 {
        return;
    }

    let mut index = 2;
    if parts[1] == "startpos" {
        *board = Board::start_position();
    } else if parts[1] == "fen" {
        let mut fen = String::new();
        while index < parts.len() && parts[index] != "moves" {
            fen.push_str(parts[index]);
            fen.push(' ');
            index += 1;
        }
        *board = Board::parse_fen(&fen);
    } else {
        return;
    }

    if index < parts.len() && parts[index] == "moves" {
        for token in &parts[index + 1..] {
            let Some(mv) = parse_move(board, token) else {
                break;
            };
            if !board.make_move(mv) {
                break;
            }
        }
    }
}

/// Resolves a coordinate string against the legal move list, so castling
/// and promotions pick up the right internal encoding.
pub fn parse_move(board: &Board, token: &str) -> Option<Move> {
    let mut list = MoveList::new();
    movegen::generate_all(board, &mut list);
    list.moves[..list.count]
        .iter()
        .copied()
        .find(|mv| mv.uci() == token)
}

fn parse_go(parts: &[&str], turn: usize, move_overhead: u64) -> Limits {
    let mut limits = Limits::infinite();
    limits.move_overhead = move_overhead;

    let mut wtime = None;
    let mut btime = None;
    let mut winc = 0u64;
    let mut binc = 0u64;
    let mut mtg = None;

    let mut i = 1;
    while i < parts.len() {
        let arg = |i: usize| parts.get(i + 1).and_then(|s| s.parse::<u64>().ok());
        match parts[i] {
            "depth" => {
                if let Some(d) = arg(i) {
                    limits.limited_by_depth = true;
                    limits.depth_limit = d as i32;
                }
                i += 1;
            }
            "nodes" => {
                if let Some(n) = arg(i) {
                    limits.limited_by_nodes = true;
                    limits.node_limit = n;
                }
                i += 1;
            }
            "movetime" => {
                if let Some(ms) = arg(i) {
                    limits.limited_by_time = true;
                    limits.time_limit = ms;
                }
                i += 1;
            }
            "wtime" => {
                wtime = arg(i);
                i += 1;
            }
            "btime" => {
                btime = arg(i);
                i += 1;
            }
            "winc" => {
                winc = arg(i).unwrap_or(0);
                i += 1;
            }
            "binc" => {
                binc = arg(i).unwrap_or(0);
                i += 1;
            }
            "movestogo" => {
                mtg = arg(i);
                i += 1;
            }
            _ => {} // infinite, ponder, searchmoves unsupported tail
        }
        i += 1;
    }

    if wtime.is_some() || btime.is_some() {
        limits.limited_by_self = true;
        limits.time = if turn == WHITE {
            wtime.unwrap_or(0)
        } else {
            btime.unwrap_or(0)
        };
        limits.inc = if turn == BLACK { binc } else { winc };
        limits.mtg = mtg;
    }

    limits
}

/// One `info` line for the interface; bound markers appear when the value
/// sits outside the aspiration window.
pub fn report(thread: &mut Thread, alpha: i32, beta: i32, value: i32) {
    if thread.index != 0 {
        return;
    }

    let nodes = thread.global_nodes();
    let tbhits = thread.global_tbhits();
    let elapsed = thread.start_time.elapsed().as_millis() as u64;
    let nps = nodes * 1000 / elapsed.max(1);

    let bound = if value >= beta {
        " lowerbound"
    } else if value <= alpha {
        " upperbound"
    } else {
        ""
    };

    let score = if value >= MATE_IN_MAX {
        format!("mate {}", (MATE - value + 1) / 2)
    } else if value <= -MATE_IN_MAX {
        format!("mate -{}", (MATE + value + 1) / 2)
    } else {
        format!("cp {}", value)
    };

    let mut pv = String::new();
    for i in 0..thread.pv.length {
        if i > 0 {
            pv.push(' ');
        }
        pv.push_str(&thread.pv.line[i].uci());
    }

    println!(
        "info depth {} seldepth {} score {}{} nodes {} nps {} hashfull {} tbhits {} time {} pv {}",
        thread.depth,
        thread.seldepth,
        score,
        bound,
        nodes,
        nps,
        thread.tt.hashfull(),
        tbhits,
        elapsed,
        pv
    );
}
