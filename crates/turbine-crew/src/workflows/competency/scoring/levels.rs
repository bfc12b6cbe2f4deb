use super::super::rules::LevelBand;

/// Level reached by a total plus the threshold of the next band, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelDerivation {
    pub level: u8,
    pub label: String,
    pub next_level_at: Option<i32>,
}

/// Walk the bands from the highest threshold down and take the first one reached.
///
/// Totals below every threshold (only possible with negative subjective input) land in the
/// lowest band. An empty band list yields level 1.
pub fn derive_level(total_points: i32, bands: &[LevelBand]) -> LevelDerivation {
    let mut ordered: Vec<&LevelBand> = bands.iter().collect();
    ordered.sort_by(|left, right| right.min_points.cmp(&left.min_points));

    let position = ordered
        .iter()
        .position(|band| band.min_points <= total_points)
        .or_else(|| ordered.len().checked_sub(1));

    match position {
        Some(index) => {
            let band = ordered[index];
            let next_level_at = index
                .checked_sub(1)
                .and_then(|above| ordered.get(above))
                .map(|next| next.min_points);
            LevelDerivation {
                level: band.level,
                label: band.label.clone(),
                next_level_at,
            }
        }
        None => LevelDerivation {
            level: 1,
            label: String::new(),
            next_level_at: None,
        },
    }
}
