use serde::{Deserialize, Serialize};
use std::io::Write;

fn default_lmr_table() -> [[i32; 64]; 64] {
    [[0; 64]; 64]
}

/// Every tunable search constant, frozen per release via `Default` and
/// overridable from a JSON file for testing. Arrays indexed by `improving`
/// hold the non-improving value first.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchParameters {
    // Aspiration windows
    pub window_depth: i32,
    pub window_size: i32,
    pub window_timer_ms: u64,

    // Razoring
    pub razor_depth: i32,
    pub razor_margin: i32,

    // Reverse futility (beta) pruning
    pub beta_pruning_depth: i32,
    pub beta_margin: i32,

    // Null move pruning
    pub null_move_pruning_depth: i32,

    // Probcut
    pub probcut_depth: i32,
    pub probcut_margin: i32,

    // Futility pruning
    pub futility_margin: i32,
    pub futility_pruning_depth: i32,
    pub futility_pruning_history_limit: [i32; 2],

    // Late move (move count) pruning
    pub late_move_pruning_depth: i32,
    pub late_move_pruning_counts: [[i32; 9]; 2],

    // Counter-move and follow-up-move pruning
    pub counter_move_pruning_depth: [i32; 2],
    pub counter_move_history_limit: [i32; 2],
    pub follow_up_move_pruning_depth: [i32; 2],
    pub follow_up_move_history_limit: [i32; 2],

    // SEE pruning
    pub see_pruning_depth: i32,
    pub see_noisy_margin: i32,
    pub see_quiet_margin: i32,

    // Quiescence margins
    pub qsee_margin: i32,
    pub qfutility_margin: i32,

    // Late move reductions
    pub lmr_base: f64,
    pub lmr_divisor: f64,

    #[serde(skip, default = "default_lmr_table")]
    pub lmr_table: [[i32; 64]; 64],
}

impl Default for SearchParameters {
    fn default() -> Self {
        let mut params = Self {
            window_depth: 5,
            window_size: 10,
            window_timer_ms: 2500,

            razor_depth: 4,
            razor_margin: 600,

            beta_pruning_depth: 8,
            beta_margin: 85,

            null_move_pruning_depth: 2,

            probcut_depth: 5,
            probcut_margin: 100,

            futility_margin: 65,
            futility_pruning_depth: 8,
            futility_pruning_history_limit: [12000, 6000],

            late_move_pruning_depth: 8,
            late_move_pruning_counts: [
                [0, 5, 8, 12, 17, 23, 30, 38, 47],
                [0, 8, 12, 18, 25, 34, 44, 55, 67],
            ],

            counter_move_pruning_depth: [3, 2],
            counter_move_history_limit: [0, -1000],
            follow_up_move_pruning_depth: [3, 2],
            follow_up_move_history_limit: [-1000, -2000],

            see_pruning_depth: 8,
            see_noisy_margin: -25,
            see_quiet_margin: -64,

            qsee_margin: 1,
            qfutility_margin: 100,

            lmr_base: 0.75,
            lmr_divisor: 2.25,

            lmr_table: default_lmr_table(),
        };
        params.recalculate_tables();
        params
    }
}

impl SearchParameters {
    pub fn recalculate_tables(&mut self) {
        for depth in 1..64 {
            for played in 1..64 {
                let reduction = self.lmr_base
                    + (depth as f64).ln() * (played as f64).ln() / self.lmr_divisor;
                self.lmr_table[depth][played] = reduction as i32;
            }
        }
    }

    pub fn save_to_json(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = std::fs::File::create(path)?;
        file.write_all(json.as_bytes())
    }

    pub fn load_from_json(path: &str) -> std::io::Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let mut params: SearchParameters = serde_json::from_reader(reader)?;
        params.recalculate_tables();
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lmr_table_matches_formula() {
        let params = SearchParameters::default();
        assert_eq!(params.lmr_table[1][1], 0); // 0.75 floors to 0
        for (depth, played, expected) in [(2, 2, 0), (10, 10, 3), (63, 63, 8)] {
            let formula =
                (0.75 + (depth as f64).ln() * (played as f64).ln() / 2.25).floor() as i32;
            assert_eq!(params.lmr_table[depth][played], expected);
            assert_eq!(params.lmr_table[depth][played], formula);
        }
    }

    #[test]
    fn json_round_trip_preserves_margins() {
        let params = SearchParameters::default();
        let path = std::env::temp_dir().join("ember_params_test.json");
        let path = path.to_str().unwrap();
        params.save_to_json(path).unwrap();
        let loaded = SearchParameters::load_from_json(path).unwrap();
        assert_eq!(loaded.razor_margin, params.razor_margin);
        assert_eq!(loaded.late_move_pruning_counts, params.late_move_pruning_counts);
        assert_eq!(loaded.lmr_table, params.lmr_table);
        let _ = std::fs::remove_file(path);
    }
}
