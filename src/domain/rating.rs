/// Mean of the given review scores, or `None` when there are none.
///
/// The value is not rounded; display precision belongs to the client.
#[must_use]
pub fn recompute_rating(scores: &[i32]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }

    let sum: i64 = scores.iter().map(|&s| i64::from(s)).sum();
    #[allow(clippy::cast_precision_loss)]
    let mean = sum as f64 / scores.len() as f64;
    Some(mean)
}
