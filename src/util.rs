use crate::scorer::ScoreResult;

pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

pub fn std_dev(data: &[f64]) -> Option<f64> {
    match (mean(data), data.len()) {
        (Some(data_mean), count) if count > 0 => {
            let variance = data
                .iter()
                .map(|value| {
                    let diff = data_mean - *value;

                    diff * diff
                })
                .sum::<f64>()
                / count as f64;

            Some(variance.sqrt())
        }
        _ => None,
    }
}

/// Aggregate of the scored trials in one block
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSummary {
    pub trials: usize,
    pub mean_speed: Option<f64>,
    pub speed_sd: Option<f64>,
    pub total_errors: u32,
    /// Mean over trials with a defined accuracy
    pub mean_accuracy: Option<f64>,
    /// Trials whose stream never contained the target
    pub zero_speed_trials: usize,
}

impl BlockSummary {
    pub fn from_scores(scores: &[ScoreResult]) -> Self {
        let speeds: Vec<f64> = scores.iter().map(|s| s.speed).collect();
        let accuracies: Vec<f64> = scores
            .iter()
            .map(|s| s.accuracy)
            .filter(|a| !a.is_nan())
            .collect();

        Self {
            trials: scores.len(),
            mean_speed: mean(&speeds),
            speed_sd: std_dev(&speeds),
            total_errors: scores.iter().map(|s| s.errors).sum(),
            mean_accuracy: mean(&accuracies),
            zero_speed_trials: scores.iter().filter(|s| s.never_matched()).count(),
        }
    }
}
