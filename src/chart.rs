use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Color, Style},
    symbols::Marker,
    text::Span,
    widgets::{Axis, Block, Chart, Dataset, GraphType, Paragraph, Wrap},
};
use tracing::{debug, error};

use crate::{data::ForestCover, error::LookupError};

pub const SERIES_LABEL: &str = "Forest Cover";
pub const SERIES_COLOR: Color = Color::Rgb(53, 162, 235);
pub const X_TITLE: &str = "Year";
pub const Y_TITLE: &str = "Sq. Kms.";

/// Axis labels are evenly spread by ratatui, so beyond this many years only
/// the first and last label are shown to stay aligned with their points.
const MAX_X_LABELS: usize = 6;

#[derive(Clone, Debug, PartialEq)]
pub struct ChartOptions {
    /// The chart takes the whole area it is drawn in.
    pub responsive: bool,
    pub show_legend: bool,
    pub title: String,
    pub x_title: &'static str,
    pub y_title: &'static str,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    pub label: &'static str,
    pub values: Vec<f64>,
    pub color: Color,
}

/// Everything the chart widget needs for one render.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartDefinition {
    pub location: String,
    pub labels: Vec<String>,
    pub series: Series,
    pub options: ChartOptions,
}

impl ChartDefinition {
    /// Builds the definition from scratch; nothing from an earlier one survives.
    pub fn derive(location: &str, dataset: &ForestCover) -> Result<Self, LookupError> {
        let record = dataset.lookup(location)?;
        let labels: Vec<String> = record.data.years().map(str::to_string).collect();
        let values: Vec<f64> = record.data.values().collect();

        Ok(Self {
            location: location.to_string(),
            labels,
            series: Series { label: SERIES_LABEL, values, color: SERIES_COLOR },
            options: ChartOptions {
                responsive: true,
                show_legend: false,
                title: format!("{location} Forest Cover"),
                x_title: X_TITLE,
                y_title: Y_TITLE,
            },
        })
    }

    fn points(&self) -> Vec<(f64, f64)> {
        self.series.values.iter().enumerate().map(|(i, v)| (i as f64, *v)).collect()
    }

    fn x_bounds(&self) -> [f64; 2] {
        match self.labels.len() {
            0 | 1 => [-0.5, 0.5],
            n => [0.0, (n - 1) as f64],
        }
    }

    fn y_bounds(&self) -> [f64; 2] {
        let (min, max) = self
            .series
            .values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
        if !min.is_finite() || !max.is_finite() {
            return [0.0, 1.0];
        }
        if min == max {
            return [min - 1.0, max + 1.0];
        }
        let pad = (max - min) * 0.05;
        [min - pad, max + pad]
    }

    fn x_labels(&self) -> Vec<Span<'static>> {
        if self.labels.len() <= MAX_X_LABELS {
            return self.labels.iter().cloned().map(Span::raw).collect();
        }
        let first = self.labels.first().cloned().unwrap_or_default();
        let last = self.labels.last().cloned().unwrap_or_default();
        vec![Span::raw(first), Span::raw(last)]
    }
}

/// What the panel currently shows.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum PanelState {
    #[default]
    Empty,
    Rendered(ChartDefinition),
    Failed(LookupError),
}

/// Line chart of one region's forest cover.
#[derive(Debug, Default)]
pub struct VisualizationPanel {
    state: PanelState,
}

impl VisualizationPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PanelState {
        &self.state
    }

    pub fn definition(&self) -> Option<&ChartDefinition> {
        match &self.state {
            PanelState::Rendered(def) => Some(def),
            _ => None,
        }
    }

    /// Re-derives the chart for `location`, replacing whatever was shown.
    ///
    /// `None` empties the panel. A failed lookup also drops the old chart and
    /// is returned to the caller as well as kept for display.
    pub fn update(&mut self, location: Option<&str>, dataset: &ForestCover) -> Result<(), LookupError> {
        let Some(location) = location else {
            self.state = PanelState::Empty;
            return Ok(());
        };

        match ChartDefinition::derive(location, dataset) {
            Ok(def) => {
                debug!(%location, points = def.series.values.len(), "chart derived");
                self.state = PanelState::Rendered(def);
                Ok(())
            }
            Err(err) => {
                error!(%location, "{err}");
                self.state = PanelState::Failed(err.clone());
                Err(err)
            }
        }
    }

    pub fn draw(&self, f: &mut Frame, area: Rect) {
        match &self.state {
            PanelState::Empty => {}
            PanelState::Failed(err) => {
                let msg = Paragraph::new(err.to_string())
                    .style(Style::default().fg(Color::Red))
                    .wrap(Wrap { trim: true });
                f.render_widget(msg, area);
            }
            PanelState::Rendered(def) => draw_chart(f, area, def),
        }
    }
}

fn draw_chart(f: &mut Frame, area: Rect, def: &ChartDefinition) {
    let points = def.points();
    let mut dataset = Dataset::default()
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(def.series.color))
        .data(&points);
    if def.options.show_legend {
        dataset = dataset.name(def.series.label);
    }

    let [y_lo, y_hi] = def.y_bounds();
    let y_labels = vec![
        Span::raw(format!("{y_lo:.0}")),
        Span::raw(format!("{:.0}", (y_lo + y_hi) / 2.0)),
        Span::raw(format!("{y_hi:.0}")),
    ];

    let chart = Chart::new(vec![dataset])
        .block(Block::default().title(def.options.title.as_str()).title_alignment(Alignment::Center))
        .x_axis(
            Axis::default()
                .title(def.options.x_title)
                .style(Style::default().fg(Color::Gray))
                .bounds(def.x_bounds())
                .labels(def.x_labels()),
        )
        .y_axis(
            Axis::default()
                .title(def.options.y_title)
                .style(Style::default().fg(Color::Gray))
                .bounds([y_lo, y_hi])
                .labels(y_labels),
        )
        .legend_position(None);
    f.render_widget(chart, area);
}
