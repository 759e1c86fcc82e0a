
//! Step-response metric derivation.
//!
//! All metrics come from one pass over the validated series plus the
//! analysis constants. Degenerate series (zero final setpoint, response
//! that never settles) yield `None` for the affected metric — analysis is
//! best-effort and never aborts the run over an undefined number.
//!
//! Time axis: `time[i] = step[i] * sample_period`. The period is supplied
//! configuration, not inferred from the log; drift between it and the
//! firmware's real loop rate is undetectable here.

use statrs::statistics::Statistics;

use crate::config::AnalysisConfig;
use crate::loader::LogSeries;

/// Read-only snapshot of one analysis run. Undefined metrics are `None`
/// and are reported as such, never as a fabricated number.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceMetrics {
    /// Last measured value of the series.
    pub final_value: f64,
    /// Final setpoint minus final value.
    pub steady_state_error: f64,
    /// Peak excursion beyond the final setpoint, % of that setpoint.
    /// `None` when the final setpoint is 0 (division undefined).
    pub overshoot_pct: Option<f64>,
    /// Time to first reach `rise_fraction` of the final value. `None` when
    /// the final value is 0.
    pub rise_time_s: Option<f64>,
    /// Time after which the response stays inside the settling band around
    /// the final setpoint. `None` for a zero setpoint or a response still
    /// outside the band at the end of the series.
    pub settling_time_s: Option<f64>,
    /// Arithmetic mean of the control output column.
    pub control_mean: f64,
    /// Population standard deviation of the control output column.
    pub control_std: f64,
    /// Total time the control output sat at/near its actuation limit.
    pub saturation_time_s: f64,
}

/// Derives all metrics from `series`. Infallible: degenerate inputs
/// produce `None` fields, not errors.
pub fn compute_metrics(series: &LogSeries, cfg: &AnalysisConfig) -> PerformanceMetrics {
    let records = series.records();
    let last = records[records.len() - 1];
    let period = cfg.sample_period_s;

    let final_value = last.measurement;
    let final_setpoint = last.setpoint;
    let steady_state_error = final_setpoint - final_value;

    let overshoot_pct = if final_setpoint == 0.0 {
        None
    } else {
        let peak = records
            .iter()
            .map(|r| r.measurement)
            .fold(f64::NEG_INFINITY, f64::max);
        Some(((peak - final_setpoint) / final_setpoint * 100.0).max(0.0))
    };

    let rise_time_s = if final_value == 0.0 {
        None
    } else {
        let target = cfg.rise_fraction * final_value;
        records
            .iter()
            .find(|r| {
                if final_value > 0.0 {
                    r.measurement >= target
                } else {
                    r.measurement <= target
                }
            })
            .map(|r| r.step as f64 * period)
    };

    let settling_time_s = if final_setpoint == 0.0 {
        None
    } else {
        let band = cfg.settling_band_fraction * final_setpoint.abs();
        let last_outside = records
            .iter()
            .rposition(|r| (r.measurement - final_setpoint).abs() > band);
        match last_outside {
            // Inside the band for the whole series.
            None => Some(records[0].step as f64 * period),
            Some(i) if i + 1 < records.len() => Some(records[i + 1].step as f64 * period),
            // Still outside the band at the final sample.
            Some(_) => None,
        }
    };

    let control = series.output();
    let control_mean = control.iter().mean();
    let control_std = control.iter().population_std_dev();

    let saturated = control
        .iter()
        .filter(|c| c.abs() >= cfg.saturation_threshold)
        .count();
    let saturation_time_s = saturated as f64 * period;

    PerformanceMetrics {
        final_value,
        steady_state_error,
        overshoot_pct,
        rise_time_s,
        settling_time_s,
        control_mean,
        control_std,
        saturation_time_s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::LogRecord;

    fn series(rows: &[(u64, f64, f64, f64)]) -> LogSeries {
        LogSeries::new(
            rows.iter()
                .map(|&(step, setpoint, measurement, output)| LogRecord {
                    step,
                    setpoint,
                    measurement,
                    output,
                })
                .collect(),
        )
        .unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn reference_step_response() {
        let s = series(&[
            (0, 3.0, 0.0, 1.0),
            (1, 3.0, 1.5, 0.6),
            (2, 3.0, 2.7, 0.2),
            (3, 3.0, 3.0, 0.0),
        ]);
        let m = compute_metrics(&s, &AnalysisConfig::default());

        assert_eq!(m.final_value, 3.0);
        assert_eq!(m.steady_state_error, 0.0);
        // Peak 3.0 never exceeds the setpoint.
        assert!(close(m.overshoot_pct.unwrap(), 0.0));
        assert!(close(m.control_mean, 0.45));
        assert!(close(m.control_std, 0.1475f64.sqrt()));
        // One sample at |output| >= 0.99.
        assert!(close(m.saturation_time_s, 0.01));
        // 90 % of 3.0 is 2.7, first reached at step 2.
        assert!(close(m.rise_time_s.unwrap(), 0.02));
        // Last sample outside the ±5 % band is step 2, so settled at step 3.
        assert!(close(m.settling_time_s.unwrap(), 0.03));
    }

    #[test]
    fn overshoot_beyond_setpoint() {
        let s = series(&[
            (0, 3.0, 0.0, 1.0),
            (1, 3.0, 3.3, 0.4),
            (2, 3.0, 3.0, 0.1),
        ]);
        let m = compute_metrics(&s, &AnalysisConfig::default());
        assert!(close(m.overshoot_pct.unwrap(), 10.0));
    }

    #[test]
    fn zero_setpoint_leaves_metrics_undefined_without_panicking() {
        let s = series(&[(0, 0.0, 0.5, 0.3), (1, 0.0, 0.1, 0.1), (2, 0.0, 0.0, 0.0)]);
        let m = compute_metrics(&s, &AnalysisConfig::default());
        assert_eq!(m.overshoot_pct, None);
        assert_eq!(m.settling_time_s, None);
        // Final value is 0 here too, so rise time is undefined as well.
        assert_eq!(m.rise_time_s, None);
        // The defined metrics are still produced.
        assert_eq!(m.final_value, 0.0);
        assert_eq!(m.steady_state_error, 0.0);
    }

    #[test]
    fn never_settling_response_is_undefined() {
        let s = series(&[
            (0, 1.0, 0.0, 1.0),
            (1, 1.0, 1.8, -1.0),
            (2, 1.0, 0.2, 1.0),
        ]);
        let m = compute_metrics(&s, &AnalysisConfig::default());
        assert_eq!(m.settling_time_s, None);
        // All three samples saturated.
        assert!(close(m.saturation_time_s, 0.03));
    }

    #[test]
    fn time_axis_uses_step_index_not_row_position() {
        // Steps 0,2,4: rise target reached at step index 4 -> 0.04 s.
        let s = series(&[(0, 2.0, 0.0, 0.5), (2, 2.0, 1.0, 0.4), (4, 2.0, 2.0, 0.0)]);
        let m = compute_metrics(&s, &AnalysisConfig::default());
        assert!(close(m.rise_time_s.unwrap(), 0.04));
    }

    #[test]
    fn settled_from_start_settles_at_first_sample() {
        let s = series(&[(0, 1.0, 1.0, 0.0), (1, 1.0, 1.01, 0.0)]);
        let m = compute_metrics(&s, &AnalysisConfig::default());
        assert!(close(m.settling_time_s.unwrap(), 0.0));
    }
}
