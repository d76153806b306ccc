//! First-launch defaults.

use crate::key_value_store::KeyValueStoreExt;
use crate::{KeyValueStore, ScraperTarget, StoreResult, keys};

use std::path::Path;

use tracing::info;

pub const DEFAULT_PREDEFINED_COMMENTS: [&str; 6] = [
    "Excellent",
    "Good",
    "Average",
    "Poor",
    "Needs Improvement",
    "Outstanding",
];

const LIVESTREAM_URL: &str = "https://metar-taf.com/livestream/KBOS";
const FLIGHT_STATUS_URL: &str = "https://www.massport.com/logan-airport/flights/flight-status";
const DESKTOP_WINDOW: &str = "1920x1080";
const CARD_WINDOW: &str = "800x800";
const CARD_SELECTOR: &str = "div.tomorrow";
const TABLE_SELECTOR: &str = "table.search-table";
const TABLE_ROWS: u32 = 3;

/// Write the default comments and scraper targets unless the store was
/// already initialised. Returns `true` when defaults were written.
///
/// `appInstalled` is written last so an interrupted seed is retried on the
/// next launch.
pub fn seed_first_launch(store: &dyn KeyValueStore, resources_dir: &Path) -> StoreResult<bool> {
    if store.get_as::<bool>(keys::APP_INSTALLED)?.unwrap_or(false) {
        return Ok(false);
    }

    store.set_as(keys::PREDEFINED_COMMENTS, &DEFAULT_PREDEFINED_COMMENTS)?;
    store.set_as(keys::SCRAPER, &default_scraper_targets(resources_dir))?;
    store.set_as(keys::APP_INSTALLED, &true)?;

    info!(
        "Seeded first-launch defaults (resources: {})",
        resources_dir.display()
    );

    Ok(true)
}

/// Scraper targets shipped with the application.
///
/// Local summary pages and all output images live under `resources_dir`.
pub fn default_scraper_targets(resources_dir: &Path) -> Vec<ScraperTarget> {
    let images = resources_dir.join("images");
    let template = resources_dir.join("template");
    let html = resources_dir.join("html");

    let card = |page: &str| ScraperTarget::CroppedRegion {
        url: html.join(format!("{page}.html")).to_string_lossy().into_owned(),
        div_selector: CARD_SELECTOR.into(),
        full_screenshot_file: images.join(format!("{page}_full_screenshot.png")),
        window_size: CARD_WINDOW.into(),
        crop_percentages: vec![[0.0, 0.0, 1.0, 1.0]],
        output_files: vec![template.join(format!("{page}-cropped.png"))],
    };

    vec![
        ScraperTarget::CroppedRegion {
            url: LIVESTREAM_URL.into(),
            div_selector: "div#canvas.bg-primary.text-white.flex-shrink-0".into(),
            full_screenshot_file: images.join("site1_full_screenshot.png"),
            window_size: DESKTOP_WINDOW.into(),
            crop_percentages: vec![
                [0.0, 0.0, 0.75, 0.80],
                [0.0, 0.78, 0.38, 1.0],
                [0.40, 0.78, 0.75, 1.0],
            ],
            output_files: vec![
                template.join("site1_screenshot_area1.png"),
                template.join("site1_screenshot_area2.png"),
                template.join("site1_screenshot_area3.png"),
            ],
        },
        card("summary"),
        card("multi-location"),
        card("upcoming-days"),
        ScraperTarget::Table {
            url: FLIGHT_STATUS_URL.into(),
            table_selector: TABLE_SELECTOR.into(),
            table_screenshot_file: "flight_status_table.png".into(),
            rows_to_capture: TABLE_ROWS,
            window_size: DESKTOP_WINDOW.into(),
        },
        ScraperTarget::Table {
            url: format!("{FLIGHT_STATUS_URL}#departure"),
            table_selector: TABLE_SELECTOR.into(),
            table_screenshot_file: "flight_departure_table.png".into(),
            rows_to_capture: TABLE_ROWS,
            window_size: DESKTOP_WINDOW.into(),
        },
        ScraperTarget::FullPage {
            url: template
                .join("generated_template.html")
                .to_string_lossy()
                .into_owned(),
            full_page: true,
            full_screenshot_file: images.join("full_page_screenshot.png"),
            window_size: DESKTOP_WINDOW.into(),
        },
    ]
}
