use std::collections::HashMap;

use super::TRAY_SIZE;
use crate::config::PostageConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostageEstimate {
    pub five_digit: usize,
    pub three_digit: usize,
    pub aadc: usize,
    pub cost_5: f64,
    pub cost_3: f64,
    pub cost_a: f64,
    pub total_cost: f64,
    pub avg_per_piece: f64,
}

/// Price a selection using the same tier split the bin planner produces:
/// full 150-piece ZIP5 trays first, leftovers pooled by ZIP3 into 150-piece
/// trays, final remainder at the AADC rate. Keeping this math identical to
/// the planner is what stops the estimate disagreeing with the physical
/// tray plan.
pub fn estimate_postage(zips: &[String], rates: &PostageConfig) -> PostageEstimate {
    let mut by_zip5: HashMap<&str, usize> = HashMap::new();
    for zip in zips {
        *by_zip5.entry(zip.as_str()).or_insert(0) += 1;
    }

    let mut five_digit = 0usize;
    let mut leftovers_by_zip3: HashMap<String, usize> = HashMap::new();
    for (zip, count) in &by_zip5 {
        let tray_pieces = (count / TRAY_SIZE) * TRAY_SIZE;
        five_digit += tray_pieces;
        let z3: String = zip.chars().take(3).collect();
        *leftovers_by_zip3.entry(z3).or_insert(0) += count - tray_pieces;
    }

    let mut three_digit = 0usize;
    let mut aadc = 0usize;
    for total in leftovers_by_zip3.values() {
        let tray_pieces = (total / TRAY_SIZE) * TRAY_SIZE;
        three_digit += tray_pieces;
        aadc += total - tray_pieces;
    }

    let cost_5 = five_digit as f64 * rates.rate_5digit;
    let cost_3 = three_digit as f64 * rates.rate_3digit;
    let cost_a = aadc as f64 * rates.rate_aadc;
    let total_cost = cost_5 + cost_3 + cost_a;
    let avg_per_piece = if zips.is_empty() {
        0.0
    } else {
        total_cost / zips.len() as f64
    };

    PostageEstimate {
        five_digit,
        three_digit,
        aadc,
        cost_5,
        cost_3,
        cost_a,
        total_cost,
        avg_per_piece,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::{plan_bins, BinKind};

    fn rates() -> PostageConfig {
        PostageConfig {
            rate_5digit: 0.244,
            rate_3digit: 0.275,
            rate_aadc: 0.330,
        }
    }

    fn zips(spec: &[(&str, usize)]) -> Vec<String> {
        spec.iter()
            .flat_map(|(z, n)| std::iter::repeat(z.to_string()).take(*n))
            .collect()
    }

    #[test]
    fn empty_selection_costs_nothing() {
        let est = estimate_postage(&[], &rates());
        assert_eq!(est.five_digit + est.three_digit + est.aadc, 0);
        assert_eq!(est.total_cost, 0.0);
        assert_eq!(est.avg_per_piece, 0.0);
    }

    #[test]
    fn tier_split_matches_expected_tray_math() {
        let input = zips(&[("95835", 320), ("95833", 145)]);
        let est = estimate_postage(&input, &rates());
        // 320 -> two full trays (300), leftover 20; 145 all leftover.
        // Leftovers 165 share ZIP3 958 -> one 3-digit tray + 15 AADC.
        assert_eq!(est.five_digit, 300);
        assert_eq!(est.three_digit, 150);
        assert_eq!(est.aadc, 15);
        assert!((est.cost_5 - 300.0 * 0.244).abs() < 1e-9);
        assert!((est.total_cost - (est.cost_5 + est.cost_3 + est.cost_a)).abs() < 1e-9);
        assert!((est.avg_per_piece - est.total_cost / 465.0).abs() < 1e-9);
    }

    #[test]
    fn tier_counts_agree_with_the_bin_planner() {
        let input = zips(&[("95835", 160), ("95833", 145), ("96001", 40), ("", 12)]);
        let est = estimate_postage(&input, &rates());

        let bins = plan_bins(&input);
        let sum = |kind: BinKind| -> usize {
            bins.iter().filter(|b| b.kind == kind).map(|b| b.count).sum()
        };
        assert_eq!(est.five_digit, sum(BinKind::FiveDigit));
        assert_eq!(est.three_digit, sum(BinKind::ThreeDigit));
        assert_eq!(est.aadc, sum(BinKind::Aadc));
    }
}
