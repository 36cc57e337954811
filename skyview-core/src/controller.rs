//! The view controller: one load cycle fills the now, outfit, chart and
//! alerts panels from the weather backend.
//!
//! Requests are not cancelled. When loads overlap, whichever response
//! resolves last writes the panels.

use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::{
    Config,
    api::WeatherApi,
    chart::{ChartBackend, ChartSlot},
    error::{AlertsError, FetchError, GeoError, LocateError, RenderError},
    geo::{Geolocation, PermissionState, Position, PositionOptions},
    model::{Coordinates, CurrentConditions, HourlyPoint, OutfitSuggestion, WeatherResponse},
    page::{Document, Element, Elements, HIDDEN_CLASS},
    render::{self, Renderer},
};

pub const FETCH_ERROR_MESSAGE: &str = "Could not fetch weather. Check coordinates and try again.";
pub const GEO_UNSUPPORTED_MESSAGE: &str = "Geolocation not supported.";
pub const GEO_BLOCKED_MESSAGE: &str =
    "Location permission is blocked. Enable it in your settings and try again.";
pub const GEO_MANUAL_MESSAGE: &str =
    "Unable to get location. Enter coordinates manually or check Location Services.";

#[derive(Debug, Clone)]
pub struct ViewSettings {
    pub default_coords: Coordinates,
    pub position_options: PositionOptions,
    pub retry_delay: Duration,
    pub alerts_limit: usize,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl ViewSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            default_coords: config.default_location.coordinates(),
            position_options: config.geolocation.position_options(),
            retry_delay: config.geolocation.retry_delay(),
            alerts_limit: config.alerts_limit,
        }
    }
}

/// What the alerts panel ended up showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertsView {
    Hidden,
    Shown(usize),
    /// No alerts element on the page.
    Unbound,
}

pub type AlertsTask = JoinHandle<Result<AlertsView, AlertsError>>;

/// Outcome of a successful fetch: per-panel results plus the pending alerts task.
#[derive(Debug)]
pub struct LoadReport {
    pub location: String,
    pub now: Result<(), RenderError>,
    pub outfit: Result<(), RenderError>,
    pub chart: Result<(), RenderError>,
    pub alerts: Option<AlertsTask>,
}

impl LoadReport {
    pub fn all_rendered(&self) -> bool {
        self.now.is_ok() && self.outfit.is_ok() && self.chart.is_ok()
    }

    /// Wait for the alerts sub-flow, if one was started.
    pub async fn alerts_settled(self) -> Option<Result<AlertsView, AlertsError>> {
        let task = self.alerts?;
        match task.await {
            Ok(res) => Some(res),
            Err(e) => {
                error!(error = %e, "alerts task did not complete");
                None
            }
        }
    }
}

#[derive(Debug)]
struct Inner {
    elements: Elements,
    api: Arc<dyn WeatherApi>,
    geolocation: Arc<dyn Geolocation>,
    charts: Arc<dyn ChartBackend>,
    chart: Mutex<ChartSlot>,
    renderer: Renderer,
    settings: ViewSettings,
}

/// Owns the bound page elements and the live chart. Cheap to clone; clones
/// share state.
#[derive(Debug, Clone)]
pub struct ViewController {
    inner: Arc<Inner>,
}

impl ViewController {
    pub fn new(
        document: &dyn Document,
        api: Arc<dyn WeatherApi>,
        geolocation: Arc<dyn Geolocation>,
        charts: Arc<dyn ChartBackend>,
        settings: ViewSettings,
    ) -> Result<Self, RenderError> {
        let elements = Elements::bind(document);
        Ok(Self {
            inner: Arc::new(Inner {
                elements,
                api,
                geolocation,
                charts,
                chart: Mutex::new(ChartSlot::default()),
                renderer: Renderer::new()?,
                settings,
            }),
        })
    }

    /// Initial load with the default coordinates.
    pub async fn start(&self) -> Result<LoadReport, FetchError> {
        let coords = self.inner.settings.default_coords.clone();
        self.load(&coords).await
    }

    /// Fetch weather for `coords` and render every panel.
    ///
    /// A fetch or parse failure shows the error banner and leaves the panels
    /// untouched. Panel failures are isolated from each other.
    pub async fn load(&self, coords: &Coordinates) -> Result<LoadReport, FetchError> {
        self.hide_error();
        info!(%coords, "loading weather");

        let data = match self.inner.api.weather(coords).await {
            Ok(data) => data,
            Err(e) => {
                error!(kind = e.kind(), error = %e, "weather load failed");
                self.show_error(FETCH_ERROR_MESSAGE);
                return Err(e);
            }
        };

        let now =
            render_section("current", data.current(), |c| self.render_now(&c, &data.location));
        let outfit = render_section("outfit", data.outfit(), |o| self.render_outfit(&o));
        let chart = render_section("hourly", data.hourly(), |h| self.render_chart(&h));

        let alerts = self.alerts_for(&data);

        Ok(LoadReport { location: data.location, now, outfit, chart, alerts })
    }

    fn alerts_for(&self, data: &WeatherResponse) -> Option<AlertsTask> {
        let Some(state) = data.state_code() else {
            debug!(location = %data.location, "no two-letter state code; skipping alerts");
            return None;
        };

        let this = self.clone();
        let state = state.to_string();
        Some(tokio::spawn(async move { this.render_alerts(&state).await }))
    }

    pub fn render_now(
        &self,
        current: &CurrentConditions,
        location: &str,
    ) -> Result<(), RenderError> {
        if let Some(el) = &self.inner.elements.now_card {
            el.set_inner_html(&self.inner.renderer.now_html(current, location)?);
        }
        Ok(())
    }

    pub fn render_outfit(&self, outfit: &OutfitSuggestion) -> Result<(), RenderError> {
        if let Some(el) = &self.inner.elements.outfit_card {
            el.set_inner_html(&self.inner.renderer.outfit_html(outfit)?);
        }
        Ok(())
    }

    /// Replace the chart; the previous chart is destroyed first.
    pub fn render_chart(&self, hourly: &[HourlyPoint]) -> Result<(), RenderError> {
        let Some(canvas) = &self.inner.elements.temp_chart else {
            return Ok(());
        };
        let config = render::chart_config(hourly);
        self.inner.chart.lock().replace(self.inner.charts.as_ref(), canvas, &config)
    }

    /// Fetch alerts for a two-letter state and fill the alerts panel. An
    /// empty or `null` list hides and clears the panel.
    ///
    /// Failures are logged and returned; the panel keeps its current content.
    pub async fn render_alerts(&self, state: &str) -> Result<AlertsView, AlertsError> {
        let resp = self.inner.api.alerts(state).await.inspect_err(|e| {
            warn!(state, kind = e.kind(), error = %e, "alerts fetch failed");
        })?;

        let Some(el) = &self.inner.elements.alerts else {
            return Ok(AlertsView::Unbound);
        };

        if resp.alerts.is_empty() {
            el.add_class(HIDDEN_CLASS);
            el.set_inner_html("");
            return Ok(AlertsView::Hidden);
        }

        let limit = self.inner.settings.alerts_limit;
        let html = self.inner.renderer.alerts_html(state, &resp.alerts, limit).inspect_err(|e| {
            warn!(state, error = %e, "alerts render failed");
        })?;
        el.remove_class(HIDDEN_CLASS);
        el.set_inner_html(&html);
        Ok(AlertsView::Shown(resp.alerts.len().min(limit)))
    }

    /// Coordinates the search form would submit, defaults filled in.
    pub fn form_coordinates(&self) -> Coordinates {
        let defaults = &self.inner.settings.default_coords;
        let read = |input: &Option<Arc<dyn Element>>, fallback: &str| {
            let value = input.as_ref().map(|el| el.value()).unwrap_or_default();
            let value = value.trim();
            if value.is_empty() { fallback.to_string() } else { value.to_string() }
        };

        Coordinates::new(
            read(&self.inner.elements.lat, &defaults.lat),
            read(&self.inner.elements.lon, &defaults.lon),
        )
    }

    /// Form-submit trigger. `None` when the page has no search form.
    pub async fn submit(&self) -> Option<Result<LoadReport, FetchError>> {
        if self.inner.elements.search_form.is_none() {
            debug!("no search form bound; submit ignored");
            return None;
        }
        let coords = self.form_coordinates();
        info!(%coords, "search submitted");
        Some(self.load(&coords).await)
    }

    /// Geolocation trigger. `None` when the page has no location button.
    pub async fn locate(&self) -> Option<Result<LoadReport, LocateError>> {
        if self.inner.elements.geo_button.is_none() {
            debug!("no location button bound; locate ignored");
            return None;
        }
        Some(self.locate_and_load().await)
    }

    async fn locate_and_load(&self) -> Result<LoadReport, LocateError> {
        let position = self.request_position().await?;
        info!(latitude = position.latitude, longitude = position.longitude, "position acquired");

        if let Some(el) = &self.inner.elements.lat {
            el.set_value(&format!("{:.4}", position.latitude));
        }
        if let Some(el) = &self.inner.elements.lon {
            el.set_value(&format!("{:.4}", position.longitude));
        }

        let coords = Coordinates::from_degrees(position.latitude, position.longitude);
        Ok(self.load(&coords).await?)
    }

    /// Ask for the current position, retrying once when it is transiently
    /// unavailable. Every failure is reported on the error banner.
    pub async fn request_position(&self) -> Result<Position, GeoError> {
        let geo = &self.inner.geolocation;

        if !geo.is_supported() {
            self.show_error(GEO_UNSUPPORTED_MESSAGE);
            return Err(GeoError::Unsupported);
        }

        let permission = geo.permission_state().await;
        debug!(?permission, "geolocation permission");
        if permission == Some(PermissionState::Denied) {
            self.show_error(GEO_BLOCKED_MESSAGE);
            return Err(GeoError::PermissionDenied);
        }

        let mut retried = false;
        loop {
            match self.position_once().await {
                Ok(position) => return Ok(position),
                Err(GeoError::PositionUnavailable) if !retried => {
                    let delay = self.inner.settings.retry_delay;
                    warn!(?delay, "position unavailable; retrying once");
                    retried = true;
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    warn!(error = %e, "geolocation failed");
                    self.show_error(GEO_MANUAL_MESSAGE);
                    return Err(e);
                }
            }
        }
    }

    async fn position_once(&self) -> Result<Position, GeoError> {
        let options = &self.inner.settings.position_options;
        tokio::time::timeout(options.timeout, self.inner.geolocation.current_position(options))
            .await
            .unwrap_or(Err(GeoError::Timeout))
    }

    pub fn show_error(&self, message: &str) {
        if let Some(el) = &self.inner.elements.error {
            el.set_text(message);
            el.remove_class(HIDDEN_CLASS);
        }
    }

    pub fn hide_error(&self) {
        if let Some(el) = &self.inner.elements.error {
            el.add_class(HIDDEN_CLASS);
        }
    }
}

fn render_section<T>(
    panel: &'static str,
    decoded: Result<T, serde_json::Error>,
    render: impl FnOnce(T) -> Result<(), RenderError>,
) -> Result<(), RenderError> {
    let res = decoded.map_err(|source| RenderError::Malformed { panel, source }).and_then(render);
    if let Err(e) = &res {
        error!(panel, error = %e, "panel render failed");
    }
    res
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;
    use serde_json::{Value, json};

    use super::*;
    use crate::{
        chart::{CHART_DATA_KEY, InlineChartBackend},
        model::AlertsResponse,
        page::{ElementId, HtmlDocument},
    };

    #[derive(Debug, Default)]
    struct FakeApi {
        weather: Mutex<Option<Value>>,
        alerts: Mutex<Option<Value>>,
        weather_calls: Mutex<Vec<Coordinates>>,
        alert_calls: Mutex<Vec<String>>,
    }

    impl FakeApi {
        fn with_weather(body: Value) -> Self {
            let api = Self::default();
            *api.weather.lock() = Some(body);
            api
        }

        fn set_alerts(&self, body: Value) {
            *self.alerts.lock() = Some(body);
        }
    }

    fn unavailable(endpoint: &'static str) -> FetchError {
        FetchError::BadStatus { endpoint, status: 503, body: String::new() }
    }

    #[async_trait]
    impl WeatherApi for FakeApi {
        async fn weather(&self, coords: &Coordinates) -> Result<WeatherResponse, FetchError> {
            let endpoint = "/api/weather";
            self.weather_calls.lock().push(coords.clone());
            let body = self.weather.lock().clone().ok_or_else(|| unavailable(endpoint))?;
            serde_json::from_value(body).map_err(|source| FetchError::Parse { endpoint, source })
        }

        async fn alerts(&self, state: &str) -> Result<AlertsResponse, FetchError> {
            let endpoint = "/api/alerts";
            self.alert_calls.lock().push(state.to_string());
            let body = self.alerts.lock().clone().ok_or_else(|| unavailable(endpoint))?;
            serde_json::from_value(body).map_err(|source| FetchError::Parse { endpoint, source })
        }
    }

    #[derive(Debug, Default)]
    struct FakeGeo {
        unsupported: bool,
        /// Never answer a position request.
        hang: bool,
        permission: Option<PermissionState>,
        script: Mutex<VecDeque<Result<Position, GeoError>>>,
        calls: Mutex<usize>,
    }

    impl FakeGeo {
        fn scripted(results: Vec<Result<Position, GeoError>>) -> Self {
            Self { script: Mutex::new(results.into()), ..Default::default() }
        }

        fn calls(&self) -> usize {
            *self.calls.lock()
        }
    }

    #[async_trait]
    impl Geolocation for FakeGeo {
        fn is_supported(&self) -> bool {
            !self.unsupported
        }

        async fn permission_state(&self) -> Option<PermissionState> {
            self.permission
        }

        async fn current_position(&self, _options: &PositionOptions) -> Result<Position, GeoError> {
            *self.calls.lock() += 1;
            if self.hang {
                return std::future::pending().await;
            }
            self.script.lock().pop_front().unwrap_or(Err(GeoError::PositionUnavailable))
        }
    }

    struct Harness {
        doc: HtmlDocument,
        api: Arc<FakeApi>,
        geo: Arc<FakeGeo>,
        charts: Arc<InlineChartBackend>,
        controller: ViewController,
    }

    impl Harness {
        fn new(doc: HtmlDocument, api: FakeApi, geo: FakeGeo) -> Self {
            let settings = ViewSettings { retry_delay: Duration::ZERO, ..Default::default() };
            Self::with_settings(doc, api, geo, settings)
        }

        fn with_settings(
            doc: HtmlDocument,
            api: FakeApi,
            geo: FakeGeo,
            settings: ViewSettings,
        ) -> Self {
            let api = Arc::new(api);
            let geo = Arc::new(geo);
            let charts = Arc::new(InlineChartBackend::new());
            let controller =
                ViewController::new(&doc, api.clone(), geo.clone(), charts.clone(), settings)
                    .expect("controller");
            Self { doc, api, geo, charts, controller }
        }

        /// Full page, weather answering for `location`, no geolocation.
        fn loaded(location: &str) -> Self {
            Self::new(
                HtmlDocument::new(),
                FakeApi::with_weather(weather_body(location)),
                FakeGeo::default(),
            )
        }

        fn html(&self, id: ElementId) -> String {
            self.doc.get(id).expect("element").inner_html()
        }

        fn hidden(&self, id: ElementId) -> bool {
            self.doc.get(id).expect("element").is_hidden()
        }
    }

    fn weather_body(location: &str) -> Value {
        json!({
            "location": location,
            "current": {
                "shortForecast": "Partly Cloudy",
                "temperature": 68,
                "windSpeed": "5 to 10 mph",
                "windDirection": "W",
                "name": "Today"
            },
            "outfit": {
                "headline": "Partly Cloudy -- around 68F",
                "items": ["hoodie", "light jacket"],
                "tips": []
            },
            "hourly": [
                { "startTime": "2024-06-01T13:00:00-07:00", "temperature": 68 },
                { "startTime": "2024-06-01T14:00:00-07:00", "temperature": 70 }
            ]
        })
    }

    fn alerts_body(n: usize) -> Value {
        let alerts: Vec<Value> = (1..=n)
            .map(|i| json!({ "event": format!("Event {i}"), "severity": "Minor" }))
            .collect();
        json!({ "alerts": alerts })
    }

    fn position(latitude: f64, longitude: f64) -> Position {
        Position { latitude, longitude }
    }

    #[tokio::test]
    async fn load_renders_all_panels() {
        let h = Harness::loaded("Irvine, CA");
        h.api.set_alerts(alerts_body(1));

        let coords = Coordinates::new("33.6846", "-117.8265");
        let report = h.controller.load(&coords).await.expect("load");
        assert!(report.all_rendered());
        let alerts = report.alerts_settled().await.expect("alerts ran").expect("alerts ok");
        assert_eq!(alerts, AlertsView::Shown(1));

        assert!(h.html(ElementId::NowCard).contains("Irvine, CA"));
        assert!(h.html(ElementId::NowCard).contains("68°F"));
        assert!(h.html(ElementId::OutfitCard).contains("<li>hoodie</li>"));
        let canvas = h.doc.get(ElementId::TempChart).expect("canvas");
        assert!(canvas.data(CHART_DATA_KEY).is_some());
        assert!(!h.hidden(ElementId::Alerts));
        assert!(h.hidden(ElementId::Error));
    }

    #[tokio::test]
    async fn repeated_loads_keep_one_live_chart() {
        let h = Harness::loaded("Irvine");

        h.controller.start().await.expect("first load");
        h.controller.start().await.expect("second load");

        assert_eq!(h.charts.live_handles(), 1);
    }

    #[tokio::test]
    async fn alerts_skipped_without_two_letter_state() {
        let h = Harness::loaded("Costa Mesa, C");

        let report = h.controller.start().await.expect("load");
        assert!(report.alerts.is_none());
        assert!(h.api.alert_calls.lock().is_empty());
    }

    #[tokio::test]
    async fn alerts_requested_for_two_letter_state() {
        let h = Harness::loaded("Costa Mesa, CA");
        h.api.set_alerts(alerts_body(0));

        let report = h.controller.start().await.expect("load");
        report.alerts_settled().await.expect("alerts ran").expect("alerts ok");
        assert_eq!(*h.api.alert_calls.lock(), vec!["CA".to_string()]);
    }

    #[tokio::test]
    async fn alerts_capped_at_limit() {
        let h = Harness::loaded("Irvine, CA");
        h.api.set_alerts(alerts_body(9));

        let view = h.controller.render_alerts("CA").await.expect("alerts ok");
        assert_eq!(view, AlertsView::Shown(5));
        assert_eq!(h.html(ElementId::Alerts).matches("<li>").count(), 5);
        assert!(h.html(ElementId::Alerts).contains("Event 5"));
        assert!(!h.html(ElementId::Alerts).contains("Event 6"));
    }

    #[tokio::test]
    async fn empty_alerts_hide_previously_visible_panel() {
        let h = Harness::new(HtmlDocument::new(), FakeApi::default(), FakeGeo::default());

        h.api.set_alerts(alerts_body(2));
        h.controller.render_alerts("TX").await.expect("alerts ok");
        assert!(!h.hidden(ElementId::Alerts));

        h.api.set_alerts(alerts_body(0));
        let view = h.controller.render_alerts("TX").await.expect("alerts ok");
        assert_eq!(view, AlertsView::Hidden);
        assert!(h.hidden(ElementId::Alerts));
        assert_eq!(h.html(ElementId::Alerts), "");
    }

    #[tokio::test]
    async fn null_alerts_hide_previously_visible_panel() {
        let h = Harness::new(HtmlDocument::new(), FakeApi::default(), FakeGeo::default());

        h.api.set_alerts(alerts_body(3));
        h.controller.render_alerts("FL").await.expect("alerts ok");
        assert!(!h.hidden(ElementId::Alerts));

        h.api.set_alerts(json!({ "alerts": null }));
        let view = h.controller.render_alerts("FL").await.expect("null alerts are empty");
        assert_eq!(view, AlertsView::Hidden);
        assert!(h.hidden(ElementId::Alerts));
        assert_eq!(h.html(ElementId::Alerts), "");
    }

    #[tokio::test]
    async fn alerts_failure_leaves_panel_and_banner_alone() {
        let h = Harness::new(HtmlDocument::new(), FakeApi::default(), FakeGeo::default());
        h.api.set_alerts(alerts_body(1));
        h.controller.render_alerts("OR").await.expect("alerts ok");
        let before = h.html(ElementId::Alerts);

        *h.api.alerts.lock() = None;
        let err = h.controller.render_alerts("OR").await.unwrap_err();
        assert!(matches!(err, AlertsError::Fetch(FetchError::BadStatus { status: 503, .. })));
        assert_eq!(h.html(ElementId::Alerts), before);
        assert!(h.hidden(ElementId::Error));
    }

    #[tokio::test]
    async fn failed_fetch_shows_banner_and_keeps_panels() {
        let h = Harness::new(HtmlDocument::new(), FakeApi::default(), FakeGeo::default());
        let now = h.doc.get(ElementId::NowCard).expect("now");
        now.set_inner_html("<h2>Previous</h2>");

        let err = h.controller.start().await.unwrap_err();
        assert_eq!(err.kind(), "status");
        assert_eq!(h.html(ElementId::Error), FETCH_ERROR_MESSAGE);
        assert!(!h.hidden(ElementId::Error));
        assert_eq!(h.html(ElementId::NowCard), "<h2>Previous</h2>");
        assert_eq!(h.html(ElementId::OutfitCard), "");
        assert_eq!(h.charts.live_handles(), 0);
    }

    #[tokio::test]
    async fn parse_failure_shows_same_banner() {
        let api = FakeApi::with_weather(json!({ "current": {} }));
        let h = Harness::new(HtmlDocument::new(), api, FakeGeo::default());

        let err = h.controller.start().await.unwrap_err();
        assert_eq!(err.kind(), "parse");
        assert_eq!(h.html(ElementId::Error), FETCH_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn successful_load_clears_banner() {
        let h = Harness::loaded("Irvine");
        h.controller.show_error("stale");
        assert!(!h.hidden(ElementId::Error));

        h.controller.start().await.expect("load");
        assert!(h.hidden(ElementId::Error));
    }

    #[tokio::test]
    async fn malformed_outfit_does_not_block_other_panels() {
        let mut body = weather_body("Irvine");
        body["outfit"] = json!({ "headline": "no items here" });
        let h = Harness::new(HtmlDocument::new(), FakeApi::with_weather(body), FakeGeo::default());

        let report = h.controller.start().await.expect("load");
        assert!(matches!(report.outfit, Err(RenderError::Malformed { panel: "outfit", .. })));
        assert!(report.now.is_ok());
        assert!(report.chart.is_ok());
        assert!(h.html(ElementId::NowCard).contains("Irvine"));
        assert_eq!(h.charts.live_handles(), 1);
        assert!(h.hidden(ElementId::Error));
    }

    #[tokio::test]
    async fn missing_elements_are_no_ops() {
        let doc = HtmlDocument::without(&[
            ElementId::NowCard,
            ElementId::TempChart,
            ElementId::Alerts,
            ElementId::Error,
        ]);
        let api = FakeApi::with_weather(weather_body("Irvine, CA"));
        let h = Harness::new(doc, api, FakeGeo::default());
        h.api.set_alerts(alerts_body(3));

        let report = h.controller.start().await.expect("load");
        assert!(report.all_rendered());
        assert_eq!(report.alerts_settled().await.expect("ran").expect("ok"), AlertsView::Unbound);
        assert_eq!(h.charts.live_handles(), 0);
        assert!(h.html(ElementId::OutfitCard).contains("hoodie"));
    }

    #[tokio::test]
    async fn blank_form_submits_default_coordinates() {
        let h = Harness::loaded("Irvine, CA");
        h.doc.get(ElementId::Lat).expect("lat").set_value("");
        h.doc.get(ElementId::Lon).expect("lon").set_value("  ");

        h.controller.submit().await.expect("form bound").expect("load");
        let calls = h.api.weather_calls.lock().clone();
        assert_eq!(calls, vec![Coordinates::new("33.6846", "-117.8265")]);
    }

    #[test]
    fn form_values_are_trimmed() {
        let h = Harness::loaded("Boston, MA");
        h.doc.get(ElementId::Lat).expect("lat").set_value(" 42.3601 ");
        h.doc.get(ElementId::Lon).expect("lon").set_value("-71.0589");

        assert_eq!(h.controller.form_coordinates(), Coordinates::new("42.3601", "-71.0589"));
    }

    #[tokio::test]
    async fn submit_without_form_is_ignored() {
        let h = Harness::new(
            HtmlDocument::without(&[ElementId::SearchForm]),
            FakeApi::with_weather(weather_body("Irvine")),
            FakeGeo::default(),
        );
        assert!(h.controller.submit().await.is_none());
        assert!(h.api.weather_calls.lock().is_empty());
    }

    #[tokio::test]
    async fn locate_fills_inputs_and_loads() {
        let geo = FakeGeo::scripted(vec![Ok(position(40.712_776, -74.005_974))]);
        let api = FakeApi::with_weather(weather_body("New York, NY"));
        let h = Harness::new(HtmlDocument::new(), api, geo);
        h.api.set_alerts(alerts_body(0));

        let report = h.controller.locate().await.expect("button bound").expect("located");
        report.alerts_settled().await;

        assert_eq!(h.doc.get(ElementId::Lat).expect("lat").value(), "40.7128");
        assert_eq!(h.doc.get(ElementId::Lon).expect("lon").value(), "-74.0060");
        let calls = h.api.weather_calls.lock().clone();
        assert_eq!(calls, vec![Coordinates::new("40.712776", "-74.005974")]);
    }

    #[tokio::test]
    async fn unavailable_position_is_retried_once() {
        let geo = FakeGeo::scripted(vec![
            Err(GeoError::PositionUnavailable),
            Ok(position(34.05, -118.25)),
        ]);
        let api = FakeApi::with_weather(weather_body("Los Angeles, CA"));
        let h = Harness::new(HtmlDocument::new(), api, geo);
        h.api.set_alerts(alerts_body(0));

        let report = h.controller.locate().await.expect("button bound").expect("located");
        report.alerts_settled().await;

        assert_eq!(h.geo.calls(), 2);
        assert!(h.hidden(ElementId::Error));
    }

    #[tokio::test]
    async fn second_unavailable_shows_manual_entry_message() {
        let geo = FakeGeo::scripted(vec![
            Err(GeoError::PositionUnavailable),
            Err(GeoError::PositionUnavailable),
        ]);
        let api = FakeApi::with_weather(weather_body("Irvine"));
        let h = Harness::new(HtmlDocument::new(), api, geo);

        let err = h.controller.locate().await.expect("button bound").unwrap_err();
        assert!(matches!(err, LocateError::Geo(GeoError::PositionUnavailable)));
        assert_eq!(h.geo.calls(), 2);
        assert_eq!(h.html(ElementId::Error), GEO_MANUAL_MESSAGE);
        assert!(h.api.weather_calls.lock().is_empty());
    }

    #[tokio::test]
    async fn other_position_errors_are_not_retried() {
        let geo = FakeGeo::scripted(vec![Err(GeoError::PermissionDenied), Ok(position(0.0, 0.0))]);
        let h = Harness::new(HtmlDocument::new(), FakeApi::default(), geo);

        h.controller.locate().await.expect("button bound").unwrap_err();
        assert_eq!(h.geo.calls(), 1);
        assert_eq!(h.html(ElementId::Error), GEO_MANUAL_MESSAGE);
    }

    #[tokio::test]
    async fn position_request_times_out_without_retry() {
        let geo = FakeGeo { hang: true, ..Default::default() };
        let mut settings = ViewSettings { retry_delay: Duration::ZERO, ..Default::default() };
        settings.position_options.timeout = Duration::from_millis(50);
        let h = Harness::with_settings(HtmlDocument::new(), FakeApi::default(), geo, settings);

        let err = h.controller.request_position().await.unwrap_err();
        assert_eq!(err, GeoError::Timeout);
        assert_eq!(h.geo.calls(), 1);
        assert_eq!(h.html(ElementId::Error), GEO_MANUAL_MESSAGE);
        assert!(!h.hidden(ElementId::Error));
    }

    #[tokio::test]
    async fn denied_permission_short_circuits() {
        let geo = FakeGeo { permission: Some(PermissionState::Denied), ..Default::default() };
        let h = Harness::new(HtmlDocument::new(), FakeApi::default(), geo);

        let err = h.controller.request_position().await.unwrap_err();
        assert_eq!(err, GeoError::PermissionDenied);
        assert_eq!(h.geo.calls(), 0);
        assert_eq!(h.html(ElementId::Error), GEO_BLOCKED_MESSAGE);
    }

    #[tokio::test]
    async fn unsupported_geolocation_reports_message() {
        let geo = FakeGeo { unsupported: true, ..Default::default() };
        let h = Harness::new(HtmlDocument::new(), FakeApi::default(), geo);

        let err = h.controller.request_position().await.unwrap_err();
        assert_eq!(err, GeoError::Unsupported);
        assert_eq!(h.html(ElementId::Error), GEO_UNSUPPORTED_MESSAGE);
        assert_eq!(h.geo.calls(), 0);
    }

    #[tokio::test]
    async fn locate_without_button_is_ignored() {
        let h = Harness::new(
            HtmlDocument::without(&[ElementId::GeoButton]),
            FakeApi::default(),
            FakeGeo::scripted(vec![Ok(position(1.0, 2.0))]),
        );
        assert!(h.controller.locate().await.is_none());
        assert_eq!(h.geo.calls(), 0);
    }

    #[test]
    fn settings_follow_config() {
        let mut cfg = Config::default();
        cfg.alerts_limit = 2;
        cfg.geolocation.retry_delay_ms = 250;
        let settings = ViewSettings::from_config(&cfg);
        assert_eq!(settings.alerts_limit, 2);
        assert_eq!(settings.retry_delay, Duration::from_millis(250));
        assert_eq!(settings.default_coords, Coordinates::new("33.6846", "-117.8265"));
    }
}
