use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use html_escape::{encode_double_quoted_attribute, encode_text};
use parking_lot::Mutex;
use serde::Serialize;

use super::{Document, Element, ElementId, HIDDEN_CLASS};
use crate::{
    error::RenderError,
    render::{PAGE_TEMPLATE, Renderer},
};

#[derive(Debug, Default, Clone)]
struct ElementState {
    inner_html: String,
    classes: BTreeSet<String>,
    value: String,
    data: BTreeMap<String, String>,
}

/// In-memory element backing [`HtmlDocument`].
#[derive(Debug)]
pub struct HtmlElement {
    id: ElementId,
    state: Mutex<ElementState>,
}

impl HtmlElement {
    fn new(id: ElementId) -> Self {
        let mut state = ElementState::default();
        if matches!(id, ElementId::Alerts | ElementId::Error) {
            state.classes.insert(HIDDEN_CLASS.to_string());
        }
        Self { id, state: Mutex::new(state) }
    }

    pub fn inner_html(&self) -> String {
        self.state.lock().inner_html.clone()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.state.lock().classes.contains(class)
    }

    pub fn is_hidden(&self) -> bool {
        self.has_class(HIDDEN_CLASS)
    }

    pub fn data(&self, key: &str) -> Option<String> {
        self.state.lock().data.get(key).cloned()
    }

    /// Escaped ` id=".." class=".." data-*=".."` list.
    fn attributes(state: &ElementState, id: ElementId) -> String {
        let class = (!state.classes.is_empty()).then(|| {
            let classes: Vec<&str> = state.classes.iter().map(String::as_str).collect();
            format!(" class=\"{}\"", encode_double_quoted_attribute(&classes.join(" ")))
        });
        let data = state.data.iter().map(|(key, value)| {
            format!(" data-{key}=\"{}\"", encode_double_quoted_attribute(value))
        });

        std::iter::once(format!(" id=\"{}\"", id.as_str())).chain(class).chain(data).collect()
    }

    fn view(&self) -> ElementView {
        let state = self.state.lock();
        ElementView {
            attrs: Self::attributes(&state, self.id),
            name: self.id.as_str(),
            value: state.value.clone(),
            html: state.inner_html.clone(),
        }
    }
}

impl Element for HtmlElement {
    fn set_inner_html(&self, html: &str) {
        self.state.lock().inner_html = html.to_string();
    }

    fn set_text(&self, text: &str) {
        self.state.lock().inner_html = encode_text(text).into_owned();
    }

    fn add_class(&self, class: &str) {
        self.state.lock().classes.insert(class.to_string());
    }

    fn remove_class(&self, class: &str) {
        self.state.lock().classes.remove(class);
    }

    fn value(&self) -> String {
        self.state.lock().value.clone()
    }

    fn set_value(&self, value: &str) {
        self.state.lock().value = value.to_string();
    }

    fn set_data(&self, key: &str, value: Option<&str>) {
        let mut state = self.state.lock();
        match value {
            Some(v) => {
                state.data.insert(key.to_string(), v.to_string());
            }
            None => {
                state.data.remove(key);
            }
        }
    }
}

#[derive(Serialize)]
struct ElementView {
    attrs: String,
    name: &'static str,
    value: String,
    html: String,
}

#[derive(Serialize)]
struct PageView<'a> {
    title: &'a str,
    form: Option<ElementView>,
    inputs: Vec<ElementView>,
    geo_button: Option<ElementView>,
    sections: Vec<ElementView>,
    chart: Option<ElementView>,
    alerts: Option<ElementView>,
}

/// In-memory page holding one element per [`ElementId`].
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    title: String,
    elements: BTreeMap<ElementId, Arc<HtmlElement>>,
}

impl Default for HtmlDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlDocument {
    pub fn new() -> Self {
        Self::without(&[])
    }

    /// Page lacking the given elements.
    pub fn without(missing: &[ElementId]) -> Self {
        let elements = ElementId::all()
            .iter()
            .filter(|id| !missing.contains(id))
            .map(|id| (*id, Arc::new(HtmlElement::new(*id))))
            .collect();

        Self { title: "Weather & Outfit".to_string(), elements }
    }

    /// Page heading and `<title>`.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn get(&self, id: ElementId) -> Option<Arc<HtmlElement>> {
        self.elements.get(&id).cloned()
    }

    fn view(&self, id: ElementId) -> Option<ElementView> {
        self.elements.get(&id).map(|el| el.view())
    }

    fn views(&self, ids: &[ElementId]) -> Vec<ElementView> {
        ids.iter().filter_map(|id| self.view(*id)).collect()
    }

    /// Serialize the whole page. The inputs, location button and form
    /// contents only appear when the search form exists.
    pub fn to_html(&self) -> Result<String, RenderError> {
        let view = PageView {
            title: &self.title,
            form: self.view(ElementId::SearchForm),
            inputs: self.views(&[ElementId::Lat, ElementId::Lon]),
            geo_button: self.view(ElementId::GeoButton),
            sections: self.views(&[ElementId::Error, ElementId::NowCard, ElementId::OutfitCard]),
            chart: self.view(ElementId::TempChart),
            alerts: self.view(ElementId::Alerts),
        };
        Renderer::new()?.render(PAGE_TEMPLATE, &view)
    }
}

impl Document for HtmlDocument {
    fn element(&self, id: ElementId) -> Option<Arc<dyn Element>> {
        self.get(id).map(|el| el as Arc<dyn Element>)
    }
}
