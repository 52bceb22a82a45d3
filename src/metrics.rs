//! Downstream evaluation metrics; none of these feed back into training.

/// Denominator guard so empty selections and zero-relevance rows divide
/// cleanly instead of producing NaN.
const DENOMINATOR_EPSILON: f64 = 1.0e-8;

/// Per-example true-positive and false-discovery rates, in percent,
/// aggregated over a selection matrix against ground-truth relevance.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionPerformance {
    pub tpr_mean: f32,
    pub tpr_std: f32,
    pub fdr_mean: f32,
    pub fdr_std: f32,
}

pub fn selection_performance(
    selected: &[f32],
    relevance: &[f32],
    dimension: usize,
) -> SelectionPerformance {
    assert!(dimension > 0, "feature dimension must be positive");
    assert_eq!(
        selected.len(),
        relevance.len(),
        "selection and relevance matrices must match"
    );
    assert_eq!(selected.len() % dimension, 0, "ragged selection matrix");

    let mut tpr = Vec::with_capacity(selected.len() / dimension);
    let mut fdr = Vec::with_capacity(selected.len() / dimension);
    for (sel_row, truth_row) in selected.chunks(dimension).zip(relevance.chunks(dimension)) {
        let mut true_positive = 0.0f64;
        let mut false_discovery = 0.0f64;
        let mut relevant = 0.0f64;
        let mut chosen = 0.0f64;
        for (&s, &g) in sel_row.iter().zip(truth_row.iter()) {
            true_positive += (s * g) as f64;
            false_discovery += (s * (1.0 - g)) as f64;
            relevant += g as f64;
            chosen += s as f64;
        }
        tpr.push(100.0 * true_positive / (relevant + DENOMINATOR_EPSILON));
        fdr.push(100.0 * false_discovery / (chosen + DENOMINATOR_EPSILON));
    }

    let (tpr_mean, tpr_std) = mean_std(&tpr);
    let (fdr_mean, fdr_std) = mean_std(&fdr);
    SelectionPerformance {
        tpr_mean: tpr_mean as f32,
        tpr_std: tpr_std as f32,
        fdr_mean: fdr_mean as f32,
        fdr_std: fdr_std as f32,
    }
}

/// Area under the ROC curve via the Mann-Whitney rank statistic, with
/// midranks for tied scores. Degenerate single-class inputs score 0.5.
pub fn roc_auc_score(truth: &[f32], scores: &[f32]) -> f32 {
    assert_eq!(truth.len(), scores.len(), "truth and scores must match");
    let positives = truth.iter().filter(|&&t| t > 0.5).count();
    let negatives = truth.len() - positives;
    if positives == 0 || negatives == 0 {
        return 0.5;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut positive_rank_sum = 0.0f64;
    let mut index = 0;
    while index < order.len() {
        let mut end = index + 1;
        while end < order.len() && scores[order[end]] == scores[order[index]] {
            end += 1;
        }
        // Average rank across the tie group, 1-based.
        let midrank = (index + 1 + end) as f64 / 2.0;
        for &example in &order[index..end] {
            if truth[example] > 0.5 {
                positive_rank_sum += midrank;
            }
        }
        index = end;
    }

    let positives = positives as f64;
    let negatives = negatives as f64;
    let auc = (positive_rank_sum - positives * (positives + 1.0) / 2.0) / (positives * negatives);
    auc as f32
}

/// Average precision: precision accumulated at each positive in
/// score-descending order, averaged over the positives.
pub fn average_precision_score(truth: &[f32], scores: &[f32]) -> f32 {
    assert_eq!(truth.len(), scores.len(), "truth and scores must match");
    let positives = truth.iter().filter(|&&t| t > 0.5).count();
    if positives == 0 {
        return 0.0;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut hits = 0.0f64;
    let mut precision_sum = 0.0f64;
    for (rank, &example) in order.iter().enumerate() {
        if truth[example] > 0.5 {
            hits += 1.0;
            precision_sum += hits / (rank + 1) as f64;
        }
    }
    (precision_sum / positives as f64) as f32
}

/// Fraction of examples whose thresholded score matches the truth.
pub fn accuracy_score(truth: &[f32], scores: &[f32]) -> f32 {
    assert_eq!(truth.len(), scores.len(), "truth and scores must match");
    if truth.is_empty() {
        return 0.0;
    }
    let correct = truth
        .iter()
        .zip(scores.iter())
        .filter(|&(&t, &s)| (s > 0.5) == (t > 0.5))
        .count();
    correct as f32 / truth.len() as f32
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    (mean, variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_selection_scores_full_tpr_and_zero_fdr() {
        let truth = vec![1.0, 0.0, 1.0, 0.0, 0.0, 1.0];
        let performance = selection_performance(&truth.clone(), &truth, 3);
        assert!((performance.tpr_mean - 100.0).abs() < 1.0e-2);
        assert!(performance.fdr_mean.abs() < 1.0e-2);
    }

    #[test]
    fn empty_selection_on_zero_relevance_stays_finite() {
        let selected = vec![0.0; 12];
        let relevance = vec![0.0; 12];
        let performance = selection_performance(&selected, &relevance, 4);
        assert!(performance.tpr_mean.is_finite());
        assert!(performance.fdr_mean.is_finite());
        assert_eq!(performance.fdr_mean, 0.0);
    }

    #[test]
    fn selecting_everything_on_zero_relevance_is_pure_false_discovery() {
        let selected = vec![1.0; 8];
        let relevance = vec![0.0; 8];
        let performance = selection_performance(&selected, &relevance, 4);
        assert!(performance.fdr_mean > 99.9);
        assert!(performance.fdr_mean.is_finite());
    }

    #[test]
    fn auc_is_one_for_perfect_ranking_and_zero_for_inverted() {
        let truth = vec![0.0, 0.0, 1.0, 1.0];
        assert!((roc_auc_score(&truth, &[0.1, 0.2, 0.8, 0.9]) - 1.0).abs() < 1.0e-6);
        assert!(roc_auc_score(&truth, &[0.9, 0.8, 0.2, 0.1]).abs() < 1.0e-6);
    }

    #[test]
    fn auc_handles_ties_with_midranks() {
        let truth = vec![0.0, 1.0, 0.0, 1.0];
        let auc = roc_auc_score(&truth, &[0.5, 0.5, 0.5, 0.5]);
        assert!((auc - 0.5).abs() < 1.0e-6);
    }

    #[test]
    fn auc_degenerates_to_half_without_both_classes() {
        assert_eq!(roc_auc_score(&[1.0, 1.0], &[0.3, 0.9]), 0.5);
    }

    #[test]
    fn average_precision_is_one_when_positives_rank_first() {
        let truth = vec![1.0, 1.0, 0.0, 0.0];
        let ap = average_precision_score(&truth, &[0.9, 0.8, 0.2, 0.1]);
        assert!((ap - 1.0).abs() < 1.0e-6);
    }

    #[test]
    fn accuracy_counts_threshold_agreement() {
        let truth = vec![1.0, 0.0, 1.0, 0.0];
        let accuracy = accuracy_score(&truth, &[0.9, 0.4, 0.2, 0.6]);
        assert!((accuracy - 0.5).abs() < 1.0e-6);
    }
}
