// ============================================================
// Layer 6 — Terminal Line Charts
// ============================================================
// Per-epoch curves drawn with trueno-viz: each chart is a
// `LossCurve` with one `MetricSeries` per line, rasterised to
// a framebuffer and encoded as terminal text.
//
//   Loss (lower is better)          Test metrics (higher is better)
//   <trueno-viz plot>               <trueno-viz plot>
//   epoch 1 .. 10                   epoch 1 .. 10
//   train  best 0.2311 @ 9          accuracy  best 0.6000 @ 10
//   val    best 0.3020 @ 8          ...
//
// Non-finite values (NaN loss on an empty split) are not pushed.

use anyhow::{anyhow, Result};
use trueno_viz::output::{TerminalEncoder, TerminalMode};
use trueno_viz::plots::{LossCurve, MetricSeries};
use trueno_viz::prelude::{Rgba, WithDimensions};

/// One named line on a chart.
#[derive(Debug, Clone)]
pub struct Series<'a> {
    pub label:  &'a str,
    pub color:  Rgba,
    pub values: Vec<f64>,
}

impl<'a> Series<'a> {
    pub fn new(label: &'a str, color: Rgba, values: Vec<f64>) -> Self {
        Self { label, color, values }
    }

    /// (epoch, value) of the best finite point, epochs counted from 1.
    fn best(&self, lower_is_better: bool) -> Option<(usize, f64)> {
        self.values
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .reduce(|best, cur| {
                let better = if lower_is_better { cur.1 < best.1 } else { cur.1 > best.1 };
                if better { cur } else { best }
            })
            .map(|(i, v)| (i + 1, v))
    }
}

/// A titled trueno-viz curve over epochs.
pub struct LineChart<'a> {
    title:           &'a str,
    series:          Vec<Series<'a>>,
    width:           u32,
    height:          u32,
    lower_is_better: bool,
}

impl<'a> LineChart<'a> {
    pub fn new(title: &'a str, width: u32, height: u32) -> Self {
        Self {
            title,
            series: Vec::new(),
            width,
            height,
            lower_is_better: true,
        }
    }

    pub fn with_series(mut self, series: Series<'a>) -> Self {
        self.series.push(series);
        self
    }

    /// Metric curves (accuracy, F1) peak instead of bottoming out.
    pub fn higher_is_better(mut self) -> Self {
        self.lower_is_better = false;
        self
    }

    fn epochs(&self) -> usize {
        self.series.iter().map(|s| s.values.len()).max().unwrap_or(0)
    }

    fn build_curve(&self) -> Result<LossCurve> {
        let mut builder = LossCurve::new();
        for s in &self.series {
            builder = builder.add_series(MetricSeries::new(s.label, s.color));
        }
        let mut curve = builder
            .dimensions(self.width, self.height)
            .margin(2)
            .best_markers(true)
            .lower_is_better(self.lower_is_better)
            .build()
            .map_err(|e| anyhow!("Cannot build chart '{}': {e:?}", self.title))?;

        for (idx, s) in self.series.iter().enumerate() {
            for &v in s.values.iter().filter(|v| v.is_finite()) {
                curve.push(idx, v as f32);
            }
        }
        Ok(curve)
    }

    /// Render to lines of text (title, plot, epoch range, legend).
    pub fn render(&self) -> Result<Vec<String>> {
        let mut lines = vec![self.title.to_string()];
        let epochs    = self.epochs();

        let curve = self.build_curve()?;
        if curve.max_epochs() < 2 {
            lines.push("(need at least two epochs to plot)".to_string());
        } else {
            let fb = curve
                .to_framebuffer()
                .map_err(|e| anyhow!("Cannot render chart '{}': {e:?}", self.title))?;
            let encoder = TerminalEncoder::new()
                .mode(TerminalMode::Ascii)
                .width(self.width)
                .height(self.height / 2); // terminal cells are ~2:1
            lines.extend(encoder.render(&fb).lines().map(str::to_string));
        }

        lines.push(format!("epoch 1 .. {}", epochs.max(1)));

        let label_width = self.series.iter().map(|s| s.label.len()).max().unwrap_or(0);
        for s in &self.series {
            let legend = match s.best(self.lower_is_better) {
                Some((epoch, v)) => format!("{:<label_width$}  best {v:.4} @ {epoch}", s.label),
                None             => format!("{:<label_width$}  (no data)", s.label),
            };
            lines.push(legend);
        }
        Ok(lines)
    }
}

/// Place two rendered charts next to each other.
pub fn side_by_side(left: &[String], right: &[String], gap: usize) -> String {
    let left_width = left.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let rows       = left.len().max(right.len());

    (0..rows)
        .map(|i| {
            let l = left.get(i).map(String::as_str).unwrap_or("");
            let r = right.get(i).map(String::as_str).unwrap_or("");
            let pad = left_width - l.chars().count() + gap;
            format!("{l}{}{r}", " ".repeat(pad)).trim_end().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn blue() -> Rgba { Rgba::rgb(66, 133, 244) }
    fn orange() -> Rgba { Rgba::rgb(255, 128, 0) }

    #[test]
    fn test_render_starts_with_title_and_ends_with_legend() {
        let chart = LineChart::new("Loss", 40, 12)
            .with_series(Series::new("train", blue(), vec![0.9, 0.7, 0.5, 0.4]))
            .with_series(Series::new("val", orange(), vec![1.0, 0.8, 0.7, 0.75]));
        let lines = chart.render().unwrap();

        assert_eq!(lines[0], "Loss");
        assert!(lines.iter().any(|l| l == "epoch 1 .. 4"));
        assert!(lines[lines.len() - 2].starts_with("train"));
        assert!(lines[lines.len() - 2].contains("best 0.4000 @ 4"));
        assert!(lines[lines.len() - 1].contains("best 0.7000 @ 3"));
    }

    #[test]
    fn test_higher_is_better_picks_peak() {
        let chart = LineChart::new("Metrics", 40, 12)
            .higher_is_better()
            .with_series(Series::new("f1", blue(), vec![0.2, 0.6, 0.5]));
        let lines = chart.render().unwrap();
        assert!(lines.last().unwrap().contains("best 0.6000 @ 2"));
    }

    #[test]
    fn test_single_epoch_and_nan_do_not_panic() {
        let chart = LineChart::new("Loss", 40, 12)
            .with_series(Series::new("val", orange(), vec![f64::NAN]))
            .with_series(Series::new("train", blue(), vec![0.3]));
        let lines = chart.render().unwrap();

        assert!(lines[1].contains("at least two epochs"));
        assert!(lines.iter().any(|l| l.starts_with("val") && l.contains("(no data)")));
        assert!(lines.iter().any(|l| l.contains("best 0.3000 @ 1")));
    }

    #[test]
    fn test_side_by_side_aligns_right_chart() {
        let left  = vec!["ab".to_string(), "abcd".to_string()];
        let right = vec!["X".to_string(), "Y".to_string(), "Z".to_string()];
        let joined = side_by_side(&left, &right, 2);
        let rows: Vec<&str> = joined.lines().collect();

        assert_eq!(rows, vec!["ab    X", "abcd  Y", "      Z"]);
    }
}
