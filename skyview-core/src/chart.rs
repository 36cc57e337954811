//! Hourly temperature chart: configuration and handle lifecycle.

use std::{
    fmt::Debug,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use serde::Serialize;

use crate::{error::RenderError, page::Element};

/// `data-*` key the inline backend stores the configuration under.
pub const CHART_DATA_KEY: &str = "chart";

/// Line chart configuration in Chart.js layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: ChartData,
    pub options: ChartOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
    pub tension: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartOptions {
    pub responsive: bool,
    pub plugins: Plugins,
    pub scales: Scales,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plugins {
    pub legend: Legend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub display: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scales {
    pub y: Axis,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub ticks: Ticks,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ticks {
    /// Appended to every tick value.
    pub suffix: String,
}

impl ChartConfig {
    /// Single-series temperature line, legend hidden, degree-suffixed y ticks.
    pub fn temperature_line(labels: Vec<String>, temps: Vec<f64>) -> Self {
        Self {
            kind: "line".to_string(),
            data: ChartData {
                labels,
                datasets: vec![Dataset {
                    label: "Temp (°F)".to_string(),
                    data: temps,
                    tension: 0.3,
                }],
            },
            options: ChartOptions {
                responsive: true,
                plugins: Plugins { legend: Legend { display: false } },
                scales: Scales { y: Axis { ticks: Ticks { suffix: "°".to_string() } } },
            },
        }
    }
}

/// A live chart bound to a canvas.
pub trait ChartHandle: Send + Debug {
    fn destroy(&mut self);
}

pub trait ChartBackend: Send + Sync + Debug {
    fn create(
        &self,
        canvas: &Arc<dyn Element>,
        config: &ChartConfig,
    ) -> Result<Box<dyn ChartHandle>, RenderError>;
}

/// Holds at most one live chart; replacing destroys the previous one first.
#[derive(Debug, Default)]
pub struct ChartSlot {
    handle: Option<Box<dyn ChartHandle>>,
}

impl ChartSlot {
    pub fn replace(
        &mut self,
        backend: &dyn ChartBackend,
        canvas: &Arc<dyn Element>,
        config: &ChartConfig,
    ) -> Result<(), RenderError> {
        self.clear();
        self.handle = Some(backend.create(canvas, config)?);
        Ok(())
    }

    pub fn clear(&mut self) {
        if let Some(mut old) = self.handle.take() {
            old.destroy();
        }
    }

    pub fn is_live(&self) -> bool {
        self.handle.is_some()
    }
}

/// Writes the configuration onto the canvas as JSON, for a page-side chart
/// script to pick up.
#[derive(Debug, Clone, Default)]
pub struct InlineChartBackend {
    live: Arc<AtomicUsize>,
}

impl InlineChartBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of created handles not yet destroyed.
    pub fn live_handles(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

impl ChartBackend for InlineChartBackend {
    fn create(
        &self,
        canvas: &Arc<dyn Element>,
        config: &ChartConfig,
    ) -> Result<Box<dyn ChartHandle>, RenderError> {
        let json = serde_json::to_string(config).map_err(|e| RenderError::Chart(e.to_string()))?;
        canvas.set_data(CHART_DATA_KEY, Some(&json));
        self.live.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(InlineChart {
            canvas: Arc::clone(canvas),
            live: Arc::clone(&self.live),
            destroyed: false,
        }))
    }
}

#[derive(Debug)]
struct InlineChart {
    canvas: Arc<dyn Element>,
    live: Arc<AtomicUsize>,
    destroyed: bool,
}

impl ChartHandle for InlineChart {
    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.canvas.set_data(CHART_DATA_KEY, None);
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}
