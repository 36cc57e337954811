//! Page surface the controller writes into.
//!
//! A [`Document`] hands out [`Element`] handles by id. [`Elements::bind`]
//! resolves every id once; a missing element turns the operations that
//! target it into no-ops.

use std::{fmt::Debug, sync::Arc};

use tracing::debug;

pub mod html;

pub use html::{HtmlDocument, HtmlElement};

/// Class toggled to show/hide the error banner and the alerts panel.
pub const HIDDEN_CLASS: &str = "hidden";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementId {
    SearchForm,
    GeoButton,
    Lat,
    Lon,
    NowCard,
    OutfitCard,
    TempChart,
    Alerts,
    Error,
}

impl ElementId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementId::SearchForm => "searchForm",
            ElementId::GeoButton => "geoBtn",
            ElementId::Lat => "lat",
            ElementId::Lon => "lon",
            ElementId::NowCard => "nowCard",
            ElementId::OutfitCard => "outfitCard",
            ElementId::TempChart => "tempChart",
            ElementId::Alerts => "alerts",
            ElementId::Error => "error",
        }
    }

    pub const fn all() -> &'static [ElementId] {
        &[
            ElementId::SearchForm,
            ElementId::GeoButton,
            ElementId::Lat,
            ElementId::Lon,
            ElementId::NowCard,
            ElementId::OutfitCard,
            ElementId::TempChart,
            ElementId::Alerts,
            ElementId::Error,
        ]
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One node of the page.
pub trait Element: Send + Sync + Debug {
    fn set_inner_html(&self, html: &str);

    /// Replace the content with escaped text.
    fn set_text(&self, text: &str);

    fn add_class(&self, class: &str);

    fn remove_class(&self, class: &str);

    /// Current value of an input; empty for other elements.
    fn value(&self) -> String;

    fn set_value(&self, value: &str);

    /// Set or remove a `data-*` attribute.
    fn set_data(&self, key: &str, value: Option<&str>);
}

pub trait Document: Send + Sync + Debug {
    fn element(&self, id: ElementId) -> Option<Arc<dyn Element>>;
}

/// Handles for every element the controller touches, resolved once.
#[derive(Debug, Clone, Default)]
pub struct Elements {
    pub search_form: Option<Arc<dyn Element>>,
    pub geo_button: Option<Arc<dyn Element>>,
    pub lat: Option<Arc<dyn Element>>,
    pub lon: Option<Arc<dyn Element>>,
    pub now_card: Option<Arc<dyn Element>>,
    pub outfit_card: Option<Arc<dyn Element>>,
    pub temp_chart: Option<Arc<dyn Element>>,
    pub alerts: Option<Arc<dyn Element>>,
    pub error: Option<Arc<dyn Element>>,
}

impl Elements {
    pub fn bind(document: &dyn Document) -> Self {
        let lookup = |id: ElementId| {
            let el = document.element(id);
            if el.is_none() {
                debug!(element = %id, "element not found; dependent operations are disabled");
            }
            el
        };

        Self {
            search_form: lookup(ElementId::SearchForm),
            geo_button: lookup(ElementId::GeoButton),
            lat: lookup(ElementId::Lat),
            lon: lookup(ElementId::Lon),
            now_card: lookup(ElementId::NowCard),
            outfit_card: lookup(ElementId::OutfitCard),
            temp_chart: lookup(ElementId::TempChart),
            alerts: lookup(ElementId::Alerts),
            error: lookup(ElementId::Error),
        }
    }

    pub fn get(&self, id: ElementId) -> Option<&Arc<dyn Element>> {
        match id {
            ElementId::SearchForm => self.search_form.as_ref(),
            ElementId::GeoButton => self.geo_button.as_ref(),
            ElementId::Lat => self.lat.as_ref(),
            ElementId::Lon => self.lon.as_ref(),
            ElementId::NowCard => self.now_card.as_ref(),
            ElementId::OutfitCard => self.outfit_card.as_ref(),
            ElementId::TempChart => self.temp_chart.as_ref(),
            ElementId::Alerts => self.alerts.as_ref(),
            ElementId::Error => self.error.as_ref(),
        }
    }

    pub fn missing(&self) -> Vec<ElementId> {
        ElementId::all().iter().copied().filter(|id| self.get(*id).is_none()).collect()
    }
}
