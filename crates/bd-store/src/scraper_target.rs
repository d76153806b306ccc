use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One page the backend visits and captures.
///
/// Stored untagged: the backend tells the shapes apart by which selector
/// field is present, so the JSON must stay free of a discriminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScraperTarget {
    /// Screenshot a single element, then crop it into several images.
    CroppedRegion {
        url: String,
        div_selector: String,
        full_screenshot_file: PathBuf,
        window_size: String,
        /// `[left, top, right, bottom]` as fractions of the element.
        crop_percentages: Vec<[f64; 4]>,
        output_files: Vec<PathBuf>,
    },
    /// Screenshot the first rows of a table.
    Table {
        url: String,
        table_selector: String,
        table_screenshot_file: PathBuf,
        rows_to_capture: u32,
        window_size: String,
    },
    /// Screenshot the entire rendered page.
    FullPage {
        url: String,
        full_page: bool,
        full_screenshot_file: PathBuf,
        window_size: String,
    },
}

impl ScraperTarget {
    pub fn url(&self) -> &str {
        match self {
            Self::CroppedRegion { url, .. } | Self::Table { url, .. } | Self::FullPage { url, .. } => {
                url
            }
        }
    }
}
