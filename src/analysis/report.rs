
//! Report rendering: stdout summary, CSV export, and the SVG figure.
//!
//! Every surface reads the same `PerformanceMetrics` value — nothing is
//! recomputed here. Rendering failures are report-stage errors raised only
//! after the numbers have already been printed, so they never invalidate
//! the analysis.

use std::fs;
use std::path::Path;

use log::info;
use plotters::prelude::*;

use crate::analysis::metrics::PerformanceMetrics;
use crate::config::AnalysisConfig;
use crate::error::PipelineError;
use crate::loader::LogSeries;

const PLOT_SIZE: (u32, u32) = (1000, 800);

/// `undefined` for metrics the series could not support.
fn fmt_opt(value: Option<f64>, precision: usize, unit: &str) -> String {
    match value {
        Some(v) => format!("{:.*}{}", precision, v, unit),
        None => "undefined".to_string(),
    }
}

/// Prints the human-readable metric summary to stdout.
pub fn print_summary(metrics: &PerformanceMetrics, series: &LogSeries, cfg: &AnalysisConfig) {
    let span_s = series.records()[series.len() - 1].step as f64 * cfg.sample_period_s;

    println!("{}", "=".repeat(60));
    println!(" STEP RESPONSE METRICS");
    println!("{}", "=".repeat(60));
    println!("  Samples:             {} ({:.2} s span)", series.len(), span_s);
    println!("  Final value:         {:.3}", metrics.final_value);
    println!("  Steady-state error:  {:.3}", metrics.steady_state_error);
    println!("  Overshoot:           {}", fmt_opt(metrics.overshoot_pct, 1, " %"));
    println!("  Rise time:           {}", fmt_opt(metrics.rise_time_s, 3, " s"));
    println!("  Settling time:       {}", fmt_opt(metrics.settling_time_s, 3, " s"));
    println!("  Control mean:        {:.3}", metrics.control_mean);
    println!("  Control std dev:     {:.3}", metrics.control_std);
    println!(
        "  Saturation time:     {:.3} s (|output| >= {:.2})",
        metrics.saturation_time_s, cfg.saturation_threshold
    );
    println!();
}

/// Writes the machine-readable `metric,value,description` summary.
pub fn write_summary_csv(
    path: &Path,
    metrics: &PerformanceMetrics,
    cfg: &AnalysisConfig,
) -> Result<(), PipelineError> {
    let mut csv_content = String::from("metric,value,description\n");

    csv_content.push_str(&format!(
        "final_value,{:.6},Last measured speed\n",
        metrics.final_value
    ));
    csv_content.push_str(&format!(
        "steady_state_error,{:.6},Final setpoint minus final value\n",
        metrics.steady_state_error
    ));
    csv_content.push_str(&format!(
        "overshoot_pct,{},Peak excursion beyond final setpoint (%)\n",
        fmt_opt(metrics.overshoot_pct, 6, "")
    ));
    csv_content.push_str(&format!(
        "rise_time_s,{},Time to reach {:.0}% of final value\n",
        fmt_opt(metrics.rise_time_s, 6, ""),
        cfg.rise_fraction * 100.0
    ));
    csv_content.push_str(&format!(
        "settling_time_s,{},Time to stay within {:.0}% of final setpoint\n",
        fmt_opt(metrics.settling_time_s, 6, ""),
        cfg.settling_band_fraction * 100.0
    ));
    csv_content.push_str(&format!(
        "control_mean,{:.6},Mean control output\n",
        metrics.control_mean
    ));
    csv_content.push_str(&format!(
        "control_std,{:.6},Population std dev of control output\n",
        metrics.control_std
    ));
    csv_content.push_str(&format!(
        "saturation_time_s,{:.6},Time at |output| >= {:.2}\n",
        metrics.saturation_time_s, cfg.saturation_threshold
    ));

    fs::write(path, csv_content)
        .map_err(|e| PipelineError::ReportFailed(format!("cannot write {}: {}", path.display(), e)))?;
    info!("metrics summary exported to: {}", path.display());
    Ok(())
}

/// Renders the two-panel step-response figure (tracking + control effort).
pub fn render_step_response(
    path: &Path,
    series: &LogSeries,
    metrics: &PerformanceMetrics,
    cfg: &AnalysisConfig,
) -> Result<(), PipelineError> {
    draw_figure(path, series, metrics, cfg)
        .map_err(|e| PipelineError::ReportFailed(format!("cannot render {}: {}", path.display(), e)))?;
    info!("plot saved: {}", path.display());
    Ok(())
}

fn draw_figure(
    path: &Path,
    series: &LogSeries,
    metrics: &PerformanceMetrics,
    cfg: &AnalysisConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let records = series.records();
    let period = cfg.sample_period_s;
    let t_max = (records[records.len() - 1].step as f64 * period).max(period);

    let root = SVGBackend::new(path, PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let (tracking_area, effort_area) = root.split_vertically((PLOT_SIZE.1 / 2) as i32);

    // ------------------------------------------------------------------
    // Panel 1: tracking (setpoint vs measured speed)
    // ------------------------------------------------------------------
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for r in records {
        y_min = y_min.min(r.setpoint).min(r.measurement);
        y_max = y_max.max(r.setpoint).max(r.measurement);
    }
    let pad = (0.05 * (y_max - y_min)).max(1e-6);

    let mut tracking = ChartBuilder::on(&tracking_area)
        .caption("PID Controller Step Response", ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(45)
        .build_cartesian_2d(0.0..t_max, (y_min - pad)..(y_max + pad))?;
    tracking
        .configure_mesh()
        .x_desc("Time (s)")
        .y_desc("Speed")
        .draw()?;

    tracking
        .draw_series(LineSeries::new(
            records.iter().map(|r| (r.step as f64 * period, r.setpoint)),
            RED.stroke_width(2),
        ))?
        .label("Setpoint")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(2)));
    tracking
        .draw_series(LineSeries::new(
            records.iter().map(|r| (r.step as f64 * period, r.measurement)),
            &BLUE,
        ))?
        .label("Measured speed")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));
    tracking
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    let font = ("sans-serif", 15).into_font().color(&BLACK);
    let tracking_text = [
        format!("Final value: {:.3}", metrics.final_value),
        format!("Steady-state error: {:.3}", metrics.steady_state_error),
        format!("Overshoot: {}", fmt_opt(metrics.overshoot_pct, 1, " %")),
        format!("Rise time: {}", fmt_opt(metrics.rise_time_s, 3, " s")),
        format!("Settling time: {}", fmt_opt(metrics.settling_time_s, 3, " s")),
    ];
    for (i, line) in tracking_text.iter().enumerate() {
        tracking_area.draw(&Text::new(
            line.as_str(),
            (700, 320 + 18 * i as i32),
            font.clone(),
        ))?;
    }

    // ------------------------------------------------------------------
    // Panel 2: control effort with actuation limit reference lines
    // ------------------------------------------------------------------
    let limit = cfg.actuation_limit;
    let mut effort = ChartBuilder::on(&effort_area)
        .caption("PID Control Effort", ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(45)
        .build_cartesian_2d(0.0..t_max, (-1.2 * limit)..(1.2 * limit))?;
    effort
        .configure_mesh()
        .x_desc("Time (s)")
        .y_desc("Control output")
        .draw()?;

    effort
        .draw_series(LineSeries::new(
            records.iter().map(|r| (r.step as f64 * period, r.output)),
            &GREEN,
        ))?
        .label("Control output")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], GREEN));
    effort
        .draw_series(LineSeries::new(
            vec![(0.0, limit), (t_max, limit)],
            RED.mix(0.5),
        ))?
        .label("Actuation limit")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.mix(0.5)));
    effort.draw_series(LineSeries::new(
        vec![(0.0, -limit), (t_max, -limit)],
        RED.mix(0.5),
    ))?;
    effort
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    let effort_text = [
        format!("Mean output: {:.3}", metrics.control_mean),
        format!("Std dev: {:.3}", metrics.control_std),
        format!("Saturation time: {:.3} s", metrics.saturation_time_s),
    ];
    for (i, line) in effort_text.iter().enumerate() {
        effort_area.draw(&Text::new(
            line.as_str(),
            (700, 40 + 18 * i as i32),
            font.clone(),
        ))?;
    }

    root.present()?;
    Ok(())
}
