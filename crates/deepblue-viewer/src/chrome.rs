//! Hides credit and search fragments around the canvas
//!
//! The suppressor runs once right after the globe is mounted and again
//! every frame, so fragments injected late by the page are caught too.
//!
//! The viewer itself renders no credit or search box; the bundled
//! `index.html` has none either, so there the suppressor finds nothing.
//! It guards host pages that embed the canvas next to such fragments.

use bevy::prelude::*;

use deepblue_core::ChromeSuppressor;

use crate::globe_host::mount_globe;

pub struct ChromePlugin;

impl Plugin for ChromePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ChromeState>()
            .add_systems(PostStartup, suppress_chrome.after(mount_globe))
            .add_systems(Last, (deactivate_on_exit, suppress_chrome).chain());
    }
}

#[derive(Resource, Debug, Default)]
pub struct ChromeState {
    pub suppressor: ChromeSuppressor,
    /// Nodes hidden over the whole session
    pub hidden_total: usize,
}

fn suppress_chrome(mut state: ResMut<ChromeState>) {
    if !state.suppressor.is_active() {
        return;
    }
    let Some(mut host) = dom::PageChrome::current() else {
        return;
    };
    let report = state.suppressor.run(&mut host);
    if report.hidden > 0 {
        state.hidden_total += report.hidden;
        tracing::info!(
            hidden = report.hidden,
            total = state.hidden_total,
            "Hid page chrome"
        );
    }
}

fn deactivate_on_exit(mut exits: MessageReader<AppExit>, mut state: ResMut<ChromeState>) {
    if exits.read().next().is_some() && state.suppressor.is_active() {
        state.suppressor.deactivate();
        tracing::debug!("Chrome suppression stopped");
    }
}

#[cfg(target_arch = "wasm32")]
mod dom {
    use wasm_bindgen::JsCast;
    use web_sys::{Document, Element, HtmlElement};

    use deepblue_core::chrome::HIDDEN_STYLE;
    use deepblue_core::{ChromeHost, ChromeLocation};

    use crate::app::CANVAS_SELECTOR;

    /// Page DOM, with class lookups scoped to the canvas container
    pub struct PageChrome {
        document: Document,
        container: Element,
    }

    impl PageChrome {
        /// DOM handles are not `Send`, so they are looked up on every run
        pub fn current() -> Option<Self> {
            let document = web_sys::window()?.document()?;
            let container = document
                .query_selector(CANVAS_SELECTOR)
                .ok()
                .flatten()
                .and_then(|canvas| canvas.parent_element())
                .or_else(|| document.body().map(Element::from))?;
            Some(Self {
                document,
                container,
            })
        }
    }

    impl ChromeHost for PageChrome {
        type Node = HtmlElement;

        fn probe(&self, location: &ChromeLocation) -> Vec<HtmlElement> {
            match location {
                ChromeLocation::ElementId(id) => self
                    .document
                    .get_element_by_id(id)
                    .and_then(|el| el.dyn_into::<HtmlElement>().ok())
                    .into_iter()
                    .collect(),
                ChromeLocation::ClassSelector(_) => {
                    let Ok(nodes) = self.container.query_selector_all(&location.selector())
                    else {
                        return Vec::new();
                    };
                    (0..nodes.length())
                        .filter_map(|i| nodes.item(i))
                        .filter_map(|node| node.dyn_into::<HtmlElement>().ok())
                        .collect()
                }
            }
        }

        fn is_hidden(&self, node: &HtmlElement) -> bool {
            node.style()
                .get_property_value("display")
                .is_ok_and(|display| display == "none")
        }

        fn hide(&mut self, node: &HtmlElement) -> Result<(), String> {
            let style = node.style();
            for (property, value) in HIDDEN_STYLE {
                style
                    .set_property(property, value)
                    .map_err(|e| format!("failed to set {property}: {:?}", e))?;
            }
            Ok(())
        }
    }
}

// Non-WASM stub: an empty page
#[cfg(not(target_arch = "wasm32"))]
mod dom {
    use deepblue_core::{ChromeHost, ChromeLocation};

    pub struct PageChrome;

    impl PageChrome {
        pub fn current() -> Option<Self> {
            Some(Self)
        }
    }

    impl ChromeHost for PageChrome {
        type Node = ();

        fn probe(&self, _location: &ChromeLocation) -> Vec<()> {
            Vec::new()
        }

        fn is_hidden(&self, _node: &()) -> bool {
            true
        }

        fn hide(&mut self, _node: &()) -> Result<(), String> {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_stops_suppression() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .add_message::<AppExit>()
            .init_resource::<ChromeState>()
            .add_systems(Last, (deactivate_on_exit, suppress_chrome).chain());

        app.update();
        assert!(app.world().resource::<ChromeState>().suppressor.is_active());

        app.world_mut().write_message(AppExit::Success);
        app.update();
        assert!(!app.world().resource::<ChromeState>().suppressor.is_active());
    }
}
