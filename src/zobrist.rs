use std::sync::OnceLock;

pub struct ZobristKeys {
    pub pieces: [[u64; 64]; 12],
    pub castling: [u64; 16],
    pub en_passant: [u64; 8],
    pub side: u64,
}

static KEYS: OnceLock<ZobristKeys> = OnceLock::new();

// Fixed-seed xorshift so every process hashes identically.
struct Prng {
    state: u64,
}

impl Prng {
    fn new(seed: u64) -> Self {
        Prng { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

pub fn keys() -> &'static ZobristKeys {
    KEYS.get_or_init(|| {
        let mut rng = Prng::new(0x9E37_79B9_7F4A_7C15);

        let mut pieces = [[0u64; 64]; 12];
        for piece in pieces.iter_mut() {
            for square in piece.iter_mut() {
                *square = rng.next_u64();
            }
        }

        let mut castling = [0u64; 16];
        for key in castling.iter_mut() {
            *key = rng.next_u64();
        }

        let mut en_passant = [0u64; 8];
        for key in en_passant.iter_mut() {
            *key = rng.next_u64();
        }

        ZobristKeys {
            pieces,
            castling,
            en_passant,
            side: rng.next_u64(),
        }
    })
}
