//! Core library for the `skyview` weather client.
//!
//! This crate defines:
//! - Configuration handling
//! - The HTTP client for the weather backend
//! - Response models and panel rendering
//! - The page, chart and geolocation seams the view controller drives
//!
//! It is used by `skyview-cli`, but the controller can be bound to any
//! [`page::Document`] implementation.

pub mod api;
pub mod chart;
pub mod config;
pub mod controller;
pub mod error;
pub mod geo;
pub mod model;
pub mod page;
pub mod render;

pub use api::{HttpWeatherApi, WeatherApi};
pub use chart::{ChartBackend, ChartConfig, ChartHandle, InlineChartBackend};
pub use config::Config;
pub use controller::{AlertsView, LoadReport, ViewController, ViewSettings};
pub use error::{AlertsError, FetchError, GeoError, LocateError, RenderError};
pub use geo::{FixedGeolocation, Geolocation, PermissionState, Position, PositionOptions};
pub use model::{Coordinates, WeatherResponse};
pub use page::{Document, Element, ElementId, HtmlDocument};
pub use render::Renderer;
