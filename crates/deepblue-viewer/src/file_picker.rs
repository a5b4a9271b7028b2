//! Browser file picker for model files
//!
//! One hidden `<input type="file">` lives for the whole viewer session. It
//! is mounted at startup and the loader host registers [`open`] as the
//! dialog hook. Selected files are read into memory and handed to the viewer
//! services. The input is reset after every load attempt, and after any
//! failed read, so picking the same file twice still fires a change event.

use bevy::prelude::*;

use deepblue_core::{FileFilter, FileInput};

use crate::app::SharedServices;

pub struct FilePickerPlugin;

impl Plugin for FilePickerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, mount_picker)
            .add_systems(Last, unmount_on_exit);
    }
}

fn mount_picker(services: Res<SharedServices>) {
    let accept = FileFilter::gltf_models().to_accept_string();
    if let Err(e) = mount_input(&accept, services.0.clone()) {
        tracing::warn!(error = %e, "File input not mounted");
    }
}

fn unmount_on_exit(mut exits: MessageReader<AppExit>) {
    if exits.read().next().is_some() {
        unmount_input();
    }
}

/// The mounted file input, as seen by the asset loader
pub struct PickerInput;

impl FileInput for PickerInput {
    fn reset(&mut self) {
        reset_input();
    }
}

// ============================================================================
// JavaScript Interop (WASM only)
// ============================================================================

#[cfg(target_arch = "wasm32")]
mod js_interop {
    use std::cell::RefCell;

    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;
    use web_sys::HtmlInputElement;

    use deepblue_core::{ModelSource, ViewerServices};

    struct MountedInput {
        input: HtmlInputElement,
        _on_change: Closure<dyn FnMut(web_sys::Event)>,
        /// Read of the latest selection; replaced by the next one
        pending: Option<PendingRead>,
    }

    struct PendingRead {
        reader: web_sys::FileReader,
        _on_load: Closure<dyn FnMut(web_sys::Event)>,
        _on_error: Closure<dyn FnMut(web_sys::Event)>,
    }

    impl PendingRead {
        /// Detach the callbacks so they never fire after being dropped
        fn cancel(&self) {
            self.reader.set_onload(None);
            self.reader.set_onerror(None);
            self.reader.abort();
        }
    }

    thread_local! {
        static MOUNTED: RefCell<Option<MountedInput>> = const { RefCell::new(None) };
    }

    pub fn mount_input(accept: &str, services: ViewerServices) -> Result<(), String> {
        if MOUNTED.with(|m| m.borrow().is_some()) {
            return Ok(());
        }

        let window = web_sys::window().ok_or("no window object")?;
        let document = window.document().ok_or("no document object")?;
        let body = document.body().ok_or("no document body")?;

        let input: HtmlInputElement = document
            .create_element("input")
            .map_err(|e| format!("failed to create input element: {:?}", e))?
            .dyn_into::<HtmlInputElement>()
            .map_err(|_| "failed to cast to HtmlInputElement".to_string())?;

        input.set_type("file");
        input.set_accept(accept);
        input.set_multiple(false);
        input.style().set_property("display", "none").ok();

        body.append_child(&input)
            .map_err(|e| format!("failed to append input to body: {:?}", e))?;

        let input_clone = input.clone();
        let on_change = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            let Some(file) = input_clone.files().and_then(|files| files.get(0)) else {
                tracing::debug!("File dialog closed without a selection");
                return;
            };
            match start_read(file, services.clone()) {
                Ok(read) => store_pending(read),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read selected file");
                    reset_input();
                }
            }
        }) as Box<dyn FnMut(_)>);

        input.set_onchange(Some(on_change.as_ref().unchecked_ref()));

        MOUNTED.with(|m| {
            *m.borrow_mut() = Some(MountedInput {
                input,
                _on_change: on_change,
                pending: None,
            });
        });
        tracing::debug!("File input mounted");
        Ok(())
    }

    fn store_pending(read: PendingRead) {
        MOUNTED.with(|m| {
            if let Some(mounted) = m.borrow_mut().as_mut() {
                if let Some(previous) = mounted.pending.replace(read) {
                    previous.cancel();
                }
            }
        });
    }

    /// Read the file into memory and submit it; every failure resets the input
    fn start_read(file: web_sys::File, services: ViewerServices) -> Result<PendingRead, String> {
        let name = file.name();
        let mime = Some(file.type_()).filter(|t| !t.is_empty());

        let reader = web_sys::FileReader::new()
            .map_err(|e| format!("failed to create FileReader: {:?}", e))?;
        let reader_clone = reader.clone();

        let load_name = name.clone();
        let on_load = Closure::wrap(Box::new(move |_: web_sys::Event| {
            let Some(buffer) = reader_clone
                .result()
                .ok()
                .and_then(|result| result.dyn_into::<js_sys::ArrayBuffer>().ok())
            else {
                tracing::error!(name = %load_name, "File read produced no data");
                reset_input();
                return;
            };
            let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
            tracing::info!(name = %load_name, size = bytes.len(), "Model file selected");
            services.submit(ModelSource::File {
                name: load_name.clone(),
                mime: mime.clone(),
                bytes,
            });
        }) as Box<dyn FnMut(_)>);

        let error_name = name.clone();
        let on_error = Closure::wrap(Box::new(move |_: web_sys::Event| {
            tracing::error!(name = %error_name, "Browser failed to read the selected file");
            reset_input();
        }) as Box<dyn FnMut(_)>);

        reader.set_onload(Some(on_load.as_ref().unchecked_ref()));
        reader.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        let read = PendingRead {
            reader,
            _on_load: on_load,
            _on_error: on_error,
        };
        if let Err(e) = read.reader.read_as_array_buffer(&file) {
            read.cancel();
            return Err(format!("read of {name} did not start: {:?}", e));
        }
        Ok(read)
    }

    pub fn open() -> Result<(), String> {
        MOUNTED.with(|m| match m.borrow().as_ref() {
            Some(mounted) => {
                mounted.input.click();
                Ok(())
            }
            None => Err("file input is not mounted".to_string()),
        })
    }

    pub fn reset_input() {
        MOUNTED.with(|m| {
            if let Some(mounted) = m.borrow().as_ref() {
                mounted.input.set_value("");
            }
        });
    }

    pub fn unmount_input() {
        if let Some(mounted) = MOUNTED.with(|m| m.borrow_mut().take()) {
            if let Some(read) = &mounted.pending {
                read.cancel();
            }
            mounted.input.set_onchange(None);
            mounted.input.remove();
            tracing::debug!("File input unmounted");
        }
    }
}

// Non-WASM stubs
#[cfg(not(target_arch = "wasm32"))]
mod js_interop {
    use deepblue_core::ViewerServices;

    pub fn mount_input(_accept: &str, _services: ViewerServices) -> Result<(), String> {
        Err("File picker not supported on this platform".to_string())
    }

    pub fn open() -> Result<(), String> {
        Err("File picker not supported on this platform".to_string())
    }

    pub fn reset_input() {}

    pub fn unmount_input() {}
}

pub use js_interop::{mount_input, open, reset_input, unmount_input};

/// Dialog hook handed to the viewer services
pub fn dialog_hook() -> deepblue_core::DialogHook {
    Box::new(open)
}
