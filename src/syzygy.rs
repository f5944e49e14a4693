use crate::bitboard::{self, Bitboard};
use crate::board::{Board, Move, BISHOP, KING, KNIGHT, PAWN, QUEEN, ROOK, SQUARE_NONE, WHITE};
use pyrrhic_rs::{DtzProbeValue, EngineAdapter, Piece, TableBases, WdlProbeResult};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};
use std::sync::Mutex;

#[derive(Clone)]
pub struct EmberAdapter;

impl EngineAdapter for EmberAdapter {
    fn pawn_attacks(side: pyrrhic_rs::Color, pawns: u64) -> u64 {
        let colour = match side {
            pyrrhic_rs::Color::White => 0,
            pyrrhic_rs::Color::Black => 1,
        };
        bitboard::pawn_attacks_bb(Bitboard(pawns), colour).0
    }

    fn knight_attacks(squares: u64) -> u64 {
        let mut attacks = 0;
        let mut bb = Bitboard(squares);
        while !bb.is_empty() {
            attacks |= bitboard::knight_attacks(bb.pop_lsb()).0;
        }
        attacks
    }

    fn bishop_attacks(squares: u64, occ: u64) -> u64 {
        let mut attacks = 0;
        let mut bb = Bitboard(squares);
        while !bb.is_empty() {
            attacks |= bitboard::bishop_attacks(bb.pop_lsb(), Bitboard(occ)).0;
        }
        attacks
    }

    fn rook_attacks(squares: u64, occ: u64) -> u64 {
        let mut attacks = 0;
        let mut bb = Bitboard(squares);
        while !bb.is_empty() {
            attacks |= bitboard::rook_attacks(bb.pop_lsb(), Bitboard(occ)).0;
        }
        attacks
    }

    fn queen_attacks(squares: u64, occ: u64) -> u64 {
        let mut attacks = 0;
        let mut bb = Bitboard(squares);
        while !bb.is_empty() {
            attacks |= bitboard::queen_attacks(bb.pop_lsb(), Bitboard(occ)).0;
        }
        attacks
    }

    fn king_attacks(squares: u64) -> u64 {
        let mut attacks = 0;
        let mut bb = Bitboard(squares);
        while !bb.is_empty() {
            attacks |= bitboard::king_attacks(bb.pop_lsb()).0;
        }
        attacks
    }
}

static TABLEBASE: Mutex<Option<TableBases<EmberAdapter>>> = Mutex::new(None);
static TB_ENABLED: AtomicBool = AtomicBool::new(false);
static TB_LARGEST: AtomicU32 = AtomicU32::new(6);
pub static TB_PROBE_DEPTH: AtomicI32 = AtomicI32::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TbResult {
    Failed,
    Loss,
    Draw,
    Win,
}

pub fn init(path: &str) {
    if path.is_empty() || path == "<empty>" {
        return;
    }
    match TableBases::<EmberAdapter>::new(path) {
        Ok(tb) => {
            *TABLEBASE.lock().unwrap() = Some(tb);
            TB_ENABLED.store(true, Ordering::SeqCst);
            log::info!("syzygy tablebases loaded from {}", path);
            println!("info string Syzygy tablebases found");
        }
        Err(e) => {
            log::info!("syzygy init failed: {:?}", e);
            println!("info string Syzygy init error: {:?}", e);
        }
    }
}

fn piece_sets(board: &Board) -> (u64, u64, u64, u64, u64, u64, u64, u64) {
    (
        board.colours[WHITE].0,
        board.colours[1].0,
        board.pieces[KING].0,
        board.pieces[QUEEN].0,
        board.pieces[ROOK].0,
        board.pieces[BISHOP].0,
        board.pieces[KNIGHT].0,
        board.pieces[PAWN].0,
    )
}

/// In-search WDL probe. Never called at the root; the guards keep probes
/// away from positions the tables cannot answer (castling rights, fifty
/// counter running, too many pieces) and ration disk access by depth.
pub fn probe_wdl(board: &Board, depth: i32, _height: usize) -> TbResult {
    if !TB_ENABLED.load(Ordering::Relaxed) {
        return TbResult::Failed;
    }
    if board.castle_rights != 0 || board.halfmove != 0 {
        return TbResult::Failed;
    }

    let largest = TB_LARGEST.load(Ordering::Relaxed);
    let count = board.occupied().count();
    if count > largest || (count == largest && depth < TB_PROBE_DEPTH.load(Ordering::Relaxed)) {
        return TbResult::Failed;
    }

    let (white, black, kings, queens, rooks, bishops, knights, pawns) = piece_sets(board);
    let guard = TABLEBASE.lock().unwrap();
    let Some(tb) = guard.as_ref() else {
        return TbResult::Failed;
    };

    match tb.probe_wdl(
        white,
        black,
        kings,
        queens,
        rooks,
        bishops,
        knights,
        pawns,
        0,
        board.turn == WHITE,
    ) {
        Ok(WdlProbeResult::Win) => TbResult::Win,
        Ok(WdlProbeResult::Loss) => TbResult::Loss,
        Ok(_) => TbResult::Draw,
        Err(_) => TbResult::Failed,
    }
}

/// Root DTZ probe: when it answers, the returned move preserves the
/// tablebase result and the search is skipped entirely.
pub fn probe_dtz_root(board: &Board) -> Option<Move> {
    if !TB_ENABLED.load(Ordering::Relaxed) {
        return None;
    }
    if board.castle_rights != 0 || board.occupied().count() > TB_LARGEST.load(Ordering::Relaxed) {
        return None;
    }

    let (white, black, kings, queens, rooks, bishops, knights, pawns) = piece_sets(board);
    let ep = if board.ep_square != SQUARE_NONE {
        board.ep_square as u32
    } else {
        0
    };

    let guard = TABLEBASE.lock().unwrap();
    let tb = guard.as_ref()?;
    let result = tb
        .probe_root(
            white,
            black,
            kings,
            queens,
            rooks,
            bishops,
            knights,
            pawns,
            board.halfmove as u32,
            ep,
            board.turn == WHITE,
        )
        .ok()?;

    match result.root {
        DtzProbeValue::DtzResult(dtz) => {
            let from = dtz.from_square;
            let to = dtz.to_square;
            let mv = if dtz.ep {
                Move::enpass(from, to)
            } else {
                match dtz.promotion {
                    Piece::Queen => Move::promo(from, to, QUEEN),
                    Piece::Rook => Move::promo(from, to, ROOK),
                    Piece::Bishop => Move::promo(from, to, BISHOP),
                    Piece::Knight => Move::promo(from, to, KNIGHT),
                    _ => Move::new(from, to),
                }
            };
            log::info!("syzygy root move {}", mv.uci());
            Some(mv)
        }
        _ => None,
    }
}
