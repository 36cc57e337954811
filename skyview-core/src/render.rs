//! HTML for each panel and for the whole page.
//!
//! Markup lives in embedded Tera templates with autoescaping on, so every
//! string handed to a template from the backend is escaped. Pre-rendered
//! markup (panel contents, attribute lists) is passed through `safe`.

use std::sync::Arc;

use chrono::DateTime;
use serde::Serialize;
use tera::{Context, Tera};

use crate::{
    chart::ChartConfig,
    error::RenderError,
    model::{Alert, CurrentConditions, HourlyPoint, OutfitSuggestion},
};

const PLACEHOLDER: &str = "—";
const FALLBACK_EVENT: &str = "Alert";

pub(crate) const PAGE_TEMPLATE: &str = "page.html";
const NOW_TEMPLATE: &str = "now.html";
const OUTFIT_TEMPLATE: &str = "outfit.html";
const ALERTS_TEMPLATE: &str = "alerts.html";

mod embedded {
    pub const PAGE: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{{ title }}</title>
</head>
<body>
  <h1>{{ title }}</h1>
{%- if form %}
  <form{{ form.attrs | safe }}>
{%- for input in inputs %}
    <input{{ input.attrs | safe }} name="{{ input.name }}" value="{{ input.value }}">
{%- endfor %}
    <button type="submit">Get weather</button>
{%- if geo_button %}
    <button type="button"{{ geo_button.attrs | safe }}>Use my location</button>
{%- endif %}
  </form>
{%- endif %}
{%- for section in sections %}
  <section{{ section.attrs | safe }}>{{ section.html | safe }}</section>
{%- endfor %}
{%- if chart %}
  <canvas{{ chart.attrs | safe }}></canvas>
{%- endif %}
{%- if alerts %}
  <section{{ alerts.attrs | safe }}>{{ alerts.html | safe }}</section>
{%- endif %}
</body>
</html>
"#;

    pub const NOW: &str = r#"<h2>{{ location }}</h2>
<div class="grid">
  <div><span class="label">Conditions</span><div>{{ conditions }}</div></div>
  <div><span class="label">Temperature</span><div>{{ temperature }}°F</div></div>
  <div><span class="label">Wind</span><div>{{ wind }}</div></div>
  <div><span class="label">Period</span><div>{{ period }}</div></div>
</div>"#;

    pub const OUTFIT: &str = r#"<h3>{{ headline }}</h3>
<div class="split">
  <div>
    <h4>Suggested items</h4>
    <ul class="list">{% for item in items %}<li>{{ item }}</li>{% endfor %}</ul>
  </div>
{%- if tips %}
  <div><h4>Tips</h4><ul class="list tips">
    {%- for tip in tips %}<li>{{ tip }}</li>{% endfor -%}
  </ul></div>
{%- endif %}
</div>"#;

    pub const ALERTS: &str = r#"<h3>Active Alerts ({{ state }})</h3>
<ul class="alerts">
{%- for alert in alerts %}
  <li><strong>{{ alert.event }}</strong>
    {%- if alert.severity %} — <em>{{ alert.severity }}</em>{% endif -%}
    {%- if alert.headline %}<div class="muted">{{ alert.headline }}</div>{% endif -%}
  </li>
{%- endfor %}
</ul>"#;
}

#[derive(Serialize)]
struct NowView<'a> {
    location: &'a str,
    conditions: &'a str,
    temperature: String,
    wind: String,
    period: &'a str,
}

#[derive(Serialize)]
struct AlertView<'a> {
    event: &'a str,
    severity: Option<&'a str>,
    headline: Option<&'a str>,
}

impl<'a> From<&'a Alert> for AlertView<'a> {
    fn from(alert: &'a Alert) -> Self {
        Self {
            event: non_empty(&alert.event).unwrap_or(FALLBACK_EVENT),
            severity: non_empty(&alert.severity),
            headline: non_empty(&alert.headline),
        }
    }
}

#[derive(Serialize)]
struct AlertList<'a> {
    state: &'a str,
    alerts: Vec<AlertView<'a>>,
}

/// Compiled panel and page templates.
#[derive(Clone)]
pub struct Renderer {
    tera: Arc<Tera>,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer").finish_non_exhaustive()
    }
}

impl Renderer {
    pub fn new() -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![".html"]);
        tera.add_raw_templates(vec![
            (PAGE_TEMPLATE, embedded::PAGE),
            (NOW_TEMPLATE, embedded::NOW),
            (OUTFIT_TEMPLATE, embedded::OUTFIT),
            (ALERTS_TEMPLATE, embedded::ALERTS),
        ])?;
        Ok(Self { tera: Arc::new(tera) })
    }

    pub(crate) fn render(
        &self,
        name: &str,
        view: &impl Serialize,
    ) -> Result<String, RenderError> {
        let ctx = Context::from_serialize(view)?;
        Ok(self.tera.render(name, &ctx)?)
    }

    pub fn now_html(
        &self,
        current: &CurrentConditions,
        location: &str,
    ) -> Result<String, RenderError> {
        let wind_speed = non_empty(&current.wind_speed).unwrap_or(PLACEHOLDER);
        let wind_direction = current.wind_direction.as_deref().unwrap_or("");

        self.render(
            NOW_TEMPLATE,
            &NowView {
                location,
                conditions: &current.short_forecast,
                temperature: current.temperature.to_string(),
                wind: format!("{wind_speed} {wind_direction}").trim_end().to_string(),
                period: &current.name,
            },
        )
    }

    pub fn outfit_html(&self, outfit: &OutfitSuggestion) -> Result<String, RenderError> {
        self.render(OUTFIT_TEMPLATE, outfit)
    }

    /// Heading plus at most `limit` alerts, in the order given.
    pub fn alerts_html(
        &self,
        state: &str,
        alerts: &[Alert],
        limit: usize,
    ) -> Result<String, RenderError> {
        let alerts = alerts.iter().take(limit).map(AlertView::from).collect();
        self.render(ALERTS_TEMPLATE, &AlertList { state, alerts })
    }
}

pub fn chart_config(hourly: &[HourlyPoint]) -> ChartConfig {
    let labels = hourly.iter().map(|h| hour_label(&h.start_time)).collect();
    let temps = hourly.iter().map(|h| h.temperature).collect();
    ChartConfig::temperature_line(labels, temps)
}

/// Hour-only label ("3 PM") in the timestamp's own offset. Unparseable
/// timestamps are returned as-is.
pub fn hour_label(start_time: &str) -> String {
    match DateTime::parse_from_rfc3339(start_time) {
        Ok(dt) => dt.format("%-I %p").to_string(),
        Err(_) => start_time.to_string(),
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}
