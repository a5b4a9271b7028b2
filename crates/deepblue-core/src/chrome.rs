//! Chrome suppression - hide credit badges and the search box
//!
//! The page around the canvas may carry attribution and search fragments in
//! several shapes depending on how it was built. Every candidate location is
//! probed in priority order and every node found is hidden, not just the
//! first. Nodes that are already hidden are left alone, so running the
//! suppressor every frame never toggles anything.

/// Where a chrome fragment may live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromeLocation {
    /// A container element addressed by id
    ElementId(&'static str),
    /// Any element carrying a class, scoped to the viewer container
    ClassSelector(&'static str),
}

impl ChromeLocation {
    /// CSS selector for this location
    pub fn selector(&self) -> String {
        match self {
            ChromeLocation::ElementId(id) => format!("#{id}"),
            ChromeLocation::ClassSelector(class) => format!(".{class}"),
        }
    }
}

/// Candidate locations, highest priority first
pub const CHROME_CANDIDATES: &[ChromeLocation] = &[
    ChromeLocation::ElementId("credit-container"),
    ChromeLocation::ElementId("credit-container-element"),
    ChromeLocation::ElementId("credits-container"),
    ChromeLocation::ElementId("geocoder-container"),
    ChromeLocation::ClassSelector("globe-credit"),
    ChromeLocation::ClassSelector("globe-credit-container"),
    ChromeLocation::ClassSelector("globe-creditContainer"),
    ChromeLocation::ClassSelector("globe-credit-logo"),
    ChromeLocation::ClassSelector("globe-credit-image"),
    ChromeLocation::ClassSelector("globe-credit-text"),
    ChromeLocation::ClassSelector("globe-credits"),
    ChromeLocation::ClassSelector("globe-geocoder"),
    ChromeLocation::ClassSelector("globe-geocoder-container"),
    ChromeLocation::ClassSelector("globe-search"),
    ChromeLocation::ClassSelector("globe-search-container"),
];

/// Inline style properties applied to a hidden node
pub const HIDDEN_STYLE: [(&str, &str); 3] = [
    ("display", "none"),
    ("visibility", "hidden"),
    ("pointer-events", "none"),
];

/// The rendered page, as seen by the suppressor
pub trait ChromeHost {
    type Node;

    /// All nodes at `location`; empty when the page has no such fragment
    fn probe(&self, location: &ChromeLocation) -> Vec<Self::Node>;

    fn is_hidden(&self, node: &Self::Node) -> bool;

    fn hide(&mut self, node: &Self::Node) -> Result<(), String>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuppressionReport {
    pub found: usize,
    pub hidden: usize,
    pub already_hidden: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct ChromeSuppressor {
    candidates: &'static [ChromeLocation],
    active: bool,
}

impl Default for ChromeSuppressor {
    fn default() -> Self {
        Self::new(CHROME_CANDIDATES)
    }
}

impl ChromeSuppressor {
    pub fn new(candidates: &'static [ChromeLocation]) -> Self {
        Self {
            candidates,
            active: true,
        }
    }

    /// Hide every chrome node currently present
    pub fn run<H: ChromeHost>(&self, host: &mut H) -> SuppressionReport {
        let mut report = SuppressionReport::default();
        if !self.active {
            return report;
        }

        for location in self.candidates {
            for node in host.probe(location) {
                report.found += 1;
                if host.is_hidden(&node) {
                    report.already_hidden += 1;
                    continue;
                }
                match host.hide(&node) {
                    Ok(()) => report.hidden += 1,
                    Err(e) => {
                        tracing::debug!(location = %location.selector(), error = %e, "Could not hide chrome node");
                        report.failed += 1;
                    }
                }
            }
        }

        if report.hidden > 0 {
            tracing::debug!(hidden = report.hidden, "Chrome suppressed");
        }
        report
    }

    /// Stop suppressing; used when the viewer is torn down
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}
