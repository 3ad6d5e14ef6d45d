use std::collections::HashMap;

/// Watch duration carried by a watch-time telemetry request.
///
/// `st` and `et` hold comma-separated start/end timestamps, one pair per
/// played interval (seeks produce several). Absent or inconsistent telemetry
/// is normal and yields 0.
pub fn duration_from_parts(params: &HashMap<String, String>) -> i64 {
    let (Some(st), Some(et)) = (params.get("st"), params.get("et")) else { return 0 };
    if st.is_empty() || et.is_empty() { return 0; }

    let starts: Vec<&str> = st.split(',').collect();
    let ends: Vec<&str> = et.split(',').collect();
    sum_intervals(&starts, &ends)
}

/// Sum of `round(et[i] - st[i])` over paired timestamp lists.
///
/// Negative intervals are summed as-is. A timestamp that is not a finite number,
/// or a sum that leaves the `i64` range, makes the whole sample unusable.
pub fn sum_intervals(starts: &[&str], ends: &[&str]) -> i64 {
    if starts.is_empty() || ends.is_empty() || starts.len() != ends.len() { return 0; }

    let mut duration = 0i64;
    for (st, et) in starts.iter().zip(ends) {
        let (Some(st), Some(et)) = (timestamp(st), timestamp(et)) else { return 0 };
        let Some(interval) = round_half_up(et - st) else { return 0 };
        let Some(sum) = duration.checked_add(interval) else { return 0 };
        duration = sum;
    }
    duration
}

fn timestamp(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

// Halves round toward positive infinity (2.5 -> 3, -0.5 -> 0).
// None when the result does not fit an i64.
fn round_half_up(v: f64) -> Option<i64> {
    let r = (v + 0.5).floor();
    (r.is_finite() && r >= i64::MIN as f64 && r < i64::MAX as f64).then_some(r as i64)
}
