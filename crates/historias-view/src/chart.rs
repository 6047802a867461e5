//! Line-chart geometry for the metrics panel, rendered as inline SVG.

use serde::Serialize;

use crate::metrics::SeriesPoint;

/// Metrics that get a chart, in panel order.
pub const CHART_METRICS: [&str; 4] = ["tiempo", "accuracy", "recall", "f1"];

const PAD_LEFT: f64 = 44.0;
const PAD_RIGHT: f64 = 16.0;
const PAD_TOP: f64 = 16.0;
const PAD_BOTTOM: f64 = 36.0;
const MAX_X_LABELS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartSize {
    Panel,
    Zoom,
}

impl ChartSize {
    fn dimensions(self) -> (f64, f64) {
        match self {
            ChartSize::Panel => (480.0, 220.0),
            ChartSize::Zoom => (960.0, 440.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub x: f64,
    pub y: f64,
    pub label: String,
    pub value: f64,
    pub show_label: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tick {
    pub y: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineChart {
    pub key: &'static str,
    pub title: &'static str,
    pub width: f64,
    pub height: f64,
    pub plot_left: f64,
    pub plot_right: f64,
    pub plot_bottom: f64,
    pub y_max: f64,
    /// SVG `points` attribute of the polyline.
    pub points: String,
    pub markers: Vec<Marker>,
    pub ticks: Vec<Tick>,
}

pub fn chart_title(key: &str) -> Option<(&'static str, &'static str)> {
    let found = match key {
        "tiempo" => ("tiempo", "Tiempo de procesamiento (s)"),
        "accuracy" => ("accuracy", "Exactitud"),
        "recall" => ("recall", "Exhaustividad"),
        "f1" => ("f1", "Puntaje F1"),
        _ => return None,
    };
    Some(found)
}

fn metric_value(point: &SeriesPoint, key: &str) -> f64 {
    match key {
        "tiempo" => point.tiempo,
        "accuracy" => point.accuracy,
        "recall" => point.recall,
        _ => point.f1,
    }
}

/// Chart for one metric, or `None` when `key` is not a charted metric.
///
/// Ratio metrics use a y range of at least `[0, 1]`; `tiempo` scales to its
/// largest value. Values are clamped into the plotted range.
pub fn line_chart(key: &str, series: &[SeriesPoint], size: ChartSize) -> Option<LineChart> {
    let (key, title) = chart_title(key)?;
    let (width, height) = size.dimensions();
    let plot_w = width - PAD_LEFT - PAD_RIGHT;
    let plot_h = height - PAD_TOP - PAD_BOTTOM;

    let values: Vec<f64> = series.iter().map(|p| metric_value(p, key)).collect();
    let observed_max = values.iter().copied().fold(0.0_f64, f64::max);
    let y_max = if key == "tiempo" {
        if observed_max > 0.0 { observed_max } else { 1.0 }
    } else {
        observed_max.max(1.0)
    };

    let n = values.len();
    let label_every = n.div_ceil(MAX_X_LABELS).max(1);
    let x_at = |i: usize| -> f64 {
        if n <= 1 {
            PAD_LEFT + plot_w / 2.0
        } else {
            PAD_LEFT + plot_w * i as f64 / (n - 1) as f64
        }
    };
    let y_at = |v: f64| -> f64 { PAD_TOP + plot_h * (1.0 - v.clamp(0.0, y_max) / y_max) };

    let markers: Vec<Marker> = series
        .iter()
        .zip(&values)
        .enumerate()
        .map(|(i, (point, &value))| Marker {
            x: x_at(i),
            y: y_at(value),
            label: point.name.clone(),
            value,
            show_label: i % label_every == 0 || i + 1 == n,
        })
        .collect();

    let points = markers
        .iter()
        .map(|m| format!("{:.1},{:.1}", m.x, m.y))
        .collect::<Vec<_>>()
        .join(" ");

    let ticks = (0..=4)
        .map(|step| {
            let value = y_max * step as f64 / 4.0;
            Tick { y: y_at(value), label: format!("{:.2}", value) }
        })
        .collect();

    Some(LineChart {
        key,
        title,
        width,
        height,
        plot_left: PAD_LEFT,
        plot_right: width - PAD_RIGHT,
        plot_bottom: PAD_TOP + plot_h,
        y_max,
        points,
        markers,
        ticks,
    })
}

/// One chart per metric in [`CHART_METRICS`].
pub fn panel(series: &[SeriesPoint]) -> Vec<LineChart> {
    CHART_METRICS
        .iter()
        .filter_map(|key| line_chart(key, series, ChartSize::Panel))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::to_series;
    use historias_test_utils::sample;
    use serde_json::json;

    fn series(values: &[(f64, f64)]) -> Vec<SeriesPoint> {
        let samples: Vec<_> = values
            .iter()
            .map(|(t, a)| sample(json!({"tiempo": t, "accuracy": a})))
            .collect();
        to_series(&samples)
    }

    #[test]
    fn test_ratio_chart_spans_unit_range() {
        let chart = line_chart("accuracy", &series(&[(1.0, 0.0), (2.0, 1.0)]), ChartSize::Panel).unwrap();
        assert_eq!(chart.y_max, 1.0);
        assert_eq!(chart.markers[0].x, chart.plot_left);
        assert_eq!(chart.markers[1].x, chart.plot_right);
        assert_eq!(chart.markers[0].y, chart.plot_bottom);
        assert_eq!(chart.markers[1].y, PAD_TOP);
        assert_eq!(chart.points.split(' ').count(), 2);
    }

    #[test]
    fn test_tiempo_scales_to_max() {
        let chart = line_chart("tiempo", &series(&[(2.0, 0.5), (8.0, 0.5)]), ChartSize::Zoom).unwrap();
        assert_eq!(chart.y_max, 8.0);
        assert_eq!(chart.width, 960.0);
        assert_eq!(chart.ticks.last().map(|t| t.label.as_str()), Some("8.00"));
    }

    #[test]
    fn test_all_zero_tiempo_does_not_divide_by_zero() {
        let chart = line_chart("tiempo", &series(&[(0.0, 0.0)]), ChartSize::Panel).unwrap();
        assert_eq!(chart.y_max, 1.0);
        assert!(chart.markers[0].y.is_finite());
    }

    #[test]
    fn test_empty_series_has_no_points() {
        let chart = line_chart("f1", &[], ChartSize::Panel).unwrap();
        assert!(chart.markers.is_empty());
        assert!(chart.points.is_empty());
        assert_eq!(chart.ticks.len(), 5);
    }

    #[test]
    fn test_unknown_metric() {
        assert!(line_chart("longitud_texto", &[], ChartSize::Panel).is_none());
        assert_eq!(panel(&[]).len(), 4);
    }

    #[test]
    fn test_x_labels_are_thinned() {
        let many: Vec<(f64, f64)> = (0..30).map(|i| (i as f64, 0.5)).collect();
        let chart = line_chart("recall", &series(&many), ChartSize::Panel).unwrap();
        let shown = chart.markers.iter().filter(|m| m.show_label).count();
        assert!(shown <= MAX_X_LABELS + 1);
        assert!(chart.markers.last().unwrap().show_label);
    }
}
