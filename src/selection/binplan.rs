use std::collections::HashMap;

use super::TRAY_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinKind {
    FiveDigit,
    ThreeDigit,
    Aadc,
}

impl BinKind {
    pub fn label(&self) -> &'static str {
        match self {
            BinKind::FiveDigit => "5digit",
            BinKind::ThreeDigit => "3digit",
            BinKind::Aadc => "aadc",
        }
    }
}

/// A contiguous span of the final selection destined for one physical tray.
/// `start`/`end` are 1-based inclusive indices into the selection order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bin {
    pub id: usize,
    pub kind: BinKind,
    pub group: String,
    pub start: usize,
    pub end: usize,
    pub count: usize,
}

/// Partition an ordered ZIP5 list into tray bins without reordering it.
/// Each ZIP5 is entitled to `floor(count/150)` full 5-digit trays; pieces
/// beyond that entitlement accumulate into ZIP3 runs, which close as 3-digit
/// trays at 150 or as AADC bins when the ZIP3 prefix changes or input ends.
/// The caller is expected to pass a roughly ZIP5-sorted order so ZIP3 runs
/// stay contiguous.
pub fn plan_bins(zips: &[String]) -> Vec<Bin> {
    let n = zips.len();
    let mut counts_z5: HashMap<&str, usize> = HashMap::new();
    for zip in zips {
        *counts_z5.entry(zip.as_str()).or_insert(0) += 1;
    }
    let trays_total: HashMap<&str, usize> = counts_z5
        .iter()
        .map(|(z, c)| (*z, c / TRAY_SIZE))
        .collect();
    let mut trays_assigned: HashMap<&str, usize> = HashMap::new();

    let mut bins: Vec<Bin> = Vec::new();

    let mut open_z3_start = 0usize;
    let mut open_z3_count = 0usize;
    let mut open_z3_group = String::new();

    let mut current_5_start = 0usize;
    let mut current_5_zip = "";
    let mut pieces_in_tray = 0usize;

    for (i, zip) in zips.iter().enumerate() {
        let pos = i + 1;
        let z3: String = zip.chars().take(3).collect();

        // A ZIP3 change strands any open leftover run short of 150.
        if open_z3_count > 0 && z3 != open_z3_group {
            bins.push(Bin {
                id: 0,
                kind: BinKind::Aadc,
                group: std::mem::take(&mut open_z3_group),
                start: open_z3_start,
                end: pos - 1,
                count: open_z3_count,
            });
            open_z3_count = 0;
        }

        let assigned = trays_assigned.get(zip.as_str()).copied().unwrap_or(0);
        if assigned < trays_total[zip.as_str()] {
            if pieces_in_tray == 0 || current_5_zip != zip.as_str() {
                current_5_start = pos;
                current_5_zip = zip;
                pieces_in_tray = 0;
            }
            pieces_in_tray += 1;
            if pieces_in_tray == TRAY_SIZE {
                bins.push(Bin {
                    id: 0,
                    kind: BinKind::FiveDigit,
                    group: zip.clone(),
                    start: current_5_start,
                    end: pos,
                    count: TRAY_SIZE,
                });
                *trays_assigned.entry(zip.as_str()).or_insert(0) += 1;
                pieces_in_tray = 0;
                current_5_zip = "";
            }
        } else {
            if open_z3_count == 0 {
                open_z3_start = pos;
                open_z3_group = z3;
            }
            open_z3_count += 1;
            if open_z3_count == TRAY_SIZE {
                bins.push(Bin {
                    id: 0,
                    kind: BinKind::ThreeDigit,
                    group: std::mem::take(&mut open_z3_group),
                    start: open_z3_start,
                    end: pos,
                    count: TRAY_SIZE,
                });
                open_z3_count = 0;
            }
        }
    }

    if open_z3_count > 0 {
        bins.push(Bin {
            id: 0,
            kind: BinKind::Aadc,
            group: open_z3_group,
            start: open_z3_start,
            end: n,
            count: open_z3_count,
        });
    }

    for (idx, bin) in bins.iter_mut().enumerate() {
        bin.id = idx + 1;
    }

    debug_assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), n);
    bins
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zips(spec: &[(&str, usize)]) -> Vec<String> {
        spec.iter()
            .flat_map(|(z, n)| std::iter::repeat(z.to_string()).take(*n))
            .collect()
    }

    fn total(bins: &[Bin]) -> usize {
        bins.iter().map(|b| b.count).sum()
    }

    #[test]
    fn empty_input_yields_no_bins() {
        assert!(plan_bins(&[]).is_empty());
    }

    #[test]
    fn counts_always_sum_to_input_length() {
        let input = zips(&[("95835", 160), ("95833", 145), ("96001", 10), ("", 3)]);
        let bins = plan_bins(&input);
        assert_eq!(total(&bins), input.len());
        // ids follow close order
        for (i, bin) in bins.iter().enumerate() {
            assert_eq!(bin.id, i + 1);
        }
    }

    #[test]
    fn full_trays_then_zip3_then_trailing_aadc() {
        // 160 in 95835: one full 5-digit tray, 10 leftover.
        // 145 in 95833: no tray entitlement, all leftover.
        // Leftovers share ZIP3 "958": 155 -> one 3-digit tray + 5 AADC.
        let input = zips(&[("95835", 160), ("95833", 145)]);
        let bins = plan_bins(&input);

        assert_eq!(bins.len(), 3);
        assert_eq!(bins[0].kind, BinKind::FiveDigit);
        assert_eq!(bins[0].group, "95835");
        assert_eq!((bins[0].start, bins[0].end, bins[0].count), (1, 150, 150));

        assert_eq!(bins[1].kind, BinKind::ThreeDigit);
        assert_eq!(bins[1].group, "958");
        assert_eq!(bins[1].count, 150);

        assert_eq!(bins[2].kind, BinKind::Aadc);
        assert_eq!(bins[2].count, 5);
        assert_eq!(bins[2].end, input.len());
        assert_eq!(total(&bins), input.len());
    }

    #[test]
    fn zip3_change_closes_open_run_as_aadc() {
        let input = zips(&[("95835", 20), ("96001", 30)]);
        let bins = plan_bins(&input);
        assert_eq!(bins.len(), 2);
        assert_eq!(bins[0].kind, BinKind::Aadc);
        assert_eq!(bins[0].group, "958");
        assert_eq!(bins[0].count, 20);
        assert_eq!(bins[1].kind, BinKind::Aadc);
        assert_eq!(bins[1].group, "960");
        assert_eq!(bins[1].count, 30);
    }

    #[test]
    fn multiple_trays_for_one_zip() {
        let input = zips(&[("95835", 300)]);
        let bins = plan_bins(&input);
        assert_eq!(bins.len(), 2);
        assert!(bins.iter().all(|b| b.kind == BinKind::FiveDigit));
        assert_eq!((bins[0].start, bins[0].end), (1, 150));
        assert_eq!((bins[1].start, bins[1].end), (151, 300));
        assert_eq!(bins[0].id, 1);
        assert_eq!(bins[1].id, 2);
    }

    #[test]
    fn empty_zip_pieces_fall_into_their_own_aadc_bucket() {
        let input = zips(&[("", 7)]);
        let bins = plan_bins(&input);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].kind, BinKind::Aadc);
        assert_eq!(bins[0].group, "");
        assert_eq!(bins[0].count, 7);
    }
}
