use crate::progress::ProgressSink;

/// Difference between the server's completion count and the running estimate.
pub fn correction_delta(authoritative: u32, estimate: u32) -> i64 {
    i64::from(authoritative) - i64::from(estimate)
}

/// Brings a live progress display in line with the authoritative count.
///
/// Returns the applied delta; nothing is sent when it is zero.
pub fn reconcile(authoritative: u32, estimate: u32, progress: &dyn ProgressSink) -> i64 {
    let delta = correction_delta(authoritative, estimate);
    if delta != 0 {
        tracing::debug!(authoritative, estimate, delta, "Correcting token estimate");
        progress.add(delta);
    }
    delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Recorder;

    #[test]
    fn test_delta_is_exact() {
        assert_eq!(correction_delta(10, 4), 6);
        assert_eq!(correction_delta(3, 7), -4);
        assert_eq!(correction_delta(5, 5), 0);
    }

    #[test]
    fn test_reconcile_applies_once() {
        let recorder = Recorder::default();
        assert_eq!(reconcile(3, 2, &recorder), 1);
        assert_eq!(recorder.calls(), vec![1]);
    }

    #[test]
    fn test_reconcile_skips_zero_delta() {
        let recorder = Recorder::default();
        assert_eq!(reconcile(4, 4, &recorder), 0);
        assert!(recorder.calls().is_empty());
    }
}
