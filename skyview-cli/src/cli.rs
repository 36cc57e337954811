use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use inquire::{Confirm, CustomType, Text};
use skyview_core::{
    Config, ElementId, FixedGeolocation, HtmlDocument, InlineChartBackend, LoadReport,
    ViewController, ViewSettings, api::api_from_config, page::Element,
};
use tracing::{debug, warn};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skyview", version, about = "Weather and outfit suggestions")]
pub struct Cli {
    /// Override the backend base URL from the config file.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the backend URL, default location and fixed position.
    Configure,

    /// Show weather for coordinates; blank values fall back to the default location.
    Show {
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<String>,

        #[arg(long, allow_hyphen_values = true)]
        lon: Option<String>,

        /// Write the rendered page here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Show weather for the configured position.
    Locate {
        /// Write the rendered page here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load()?;
        if let Some(url) = self.api_url {
            config.api_base_url = url;
        }

        match self.command {
            Command::Configure => configure(config),
            Command::Show { lat, lon, out } => {
                let page = Page::new(&config)?;
                page.input(ElementId::Lat, lat.as_deref());
                page.input(ElementId::Lon, lon.as_deref());

                let res = page
                    .controller
                    .submit()
                    .await
                    .ok_or_else(|| anyhow!("page has no search form"))?;
                let outcome = page.settle(res.map_err(anyhow::Error::from)).await;
                page.write(out.as_ref())?;
                outcome
            }
            Command::Locate { out } => {
                let page = Page::new(&config)?;

                let res = page
                    .controller
                    .locate()
                    .await
                    .ok_or_else(|| anyhow!("page has no location button"))?;
                let outcome = page.settle(res.map_err(anyhow::Error::from)).await;
                page.write(out.as_ref())?;
                outcome
            }
        }
    }
}

/// A fresh in-memory page with a controller bound to it.
struct Page {
    doc: HtmlDocument,
    controller: ViewController,
}

impl Page {
    fn new(config: &Config) -> anyhow::Result<Self> {
        let doc = HtmlDocument::new().with_title(&config.default_location.label);
        let api = api_from_config(config).context("Failed to build HTTP client")?;
        let controller = ViewController::new(
            &doc,
            Arc::new(api),
            Arc::new(FixedGeolocation::from_config(&config.geolocation)),
            Arc::new(InlineChartBackend::new()),
            ViewSettings::from_config(config),
        )
        .context("Failed to prepare page templates")?;
        Ok(Self { doc, controller })
    }

    fn input(&self, id: ElementId, value: Option<&str>) {
        if let (Some(el), Some(value)) = (self.doc.get(id), value) {
            el.set_value(value);
        }
    }

    /// Wait for the alerts sub-flow so the page is complete before writing.
    async fn settle(&self, res: anyhow::Result<LoadReport>) -> anyhow::Result<()> {
        let report = res.context("Weather could not be loaded")?;
        let panels = [("now", &report.now), ("outfit", &report.outfit), ("chart", &report.chart)];
        for (panel, outcome) in panels {
            if let Err(e) = outcome {
                warn!(panel, error = %e, "panel not rendered");
            }
        }
        // Alerts failures are already logged and never fail the command.
        if let Some(Err(e)) = report.alerts_settled().await {
            debug!(error = %e, "alerts panel left unchanged");
        }
        Ok(())
    }

    fn write(&self, out: Option<&PathBuf>) -> anyhow::Result<()> {
        let html = self.doc.to_html().context("Failed to render page")?;
        match out {
            Some(path) => {
                std::fs::write(path, html)
                    .with_context(|| format!("Failed to write page: {}", path.display()))?;
                println!("Page written to {}", path.display());
            }
            None => print!("{html}"),
        }
        Ok(())
    }
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    config.api_base_url = Text::new("Backend base URL:")
        .with_default(&config.api_base_url)
        .prompt()
        .context("Prompt cancelled")?;

    let location = &mut config.default_location;
    location.lat = Text::new("Default latitude:").with_default(&location.lat).prompt()?;
    location.lon = Text::new("Default longitude:").with_default(&location.lon).prompt()?;
    location.label = Text::new("Default location label:").with_default(&location.label).prompt()?;

    let use_fixed = Confirm::new("Configure a fixed position for `skyview locate`?")
        .with_default(config.geolocation.fixed_position().is_some())
        .prompt()?;

    if use_fixed {
        let lat = CustomType::<f64>::new("Latitude:").prompt()?;
        let lon = CustomType::<f64>::new("Longitude:").prompt()?;
        config.set_fixed_position(Some((lat, lon)));
    } else {
        config.set_fixed_position(None);
    }

    config.save()?;
    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}
