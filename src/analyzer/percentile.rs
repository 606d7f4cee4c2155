/// Nearest-rank percentile of already sorted data.
pub fn percentile(data_sorted: &[f64], percent: f64) -> Option<f64> {
    if data_sorted.is_empty() {
        return None;
    }

    let rank = (data_sorted.len() as f64 * percent).ceil() as usize;
    let index = rank.max(1) - 1;

    data_sorted.get(index.min(data_sorted.len() - 1)).cloned()
}
