#[cfg(any(target_arch = "wasm32", test))]
mod log_buffer;
#[cfg(target_arch = "wasm32")]
mod wasm_constants;

#[cfg(target_arch = "wasm32")]
mod wasm {
    use std::cell::RefCell;
    use std::rc::Rc;

    use push_client_core::{
        ControllerSnapshot, LoggingTokenSink, PushCollaborators, PushController, PushDemoConfig,
        RenderError, TokenSink,
    };
    use serde::Serialize;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::spawn_local;
    use web_sys::HtmlElement;

    use crate::wasm_constants::*;

    mod bindings;
    mod dom;
    mod lifecycle;
    mod network;
    mod storage;

    use bindings::{BrowserPermissionHost, FirebaseMessaging};
    use dom::{DomRenderer, ensure_demo_dom, install_button_handlers};
    use lifecycle::*;
    use network::{GlooSleeper, HttpTokenSink};
    use storage::LocalStorageStore;

    thread_local! {
        static CONTROLLER: RefCell<Option<Rc<PushController>>> = const { RefCell::new(None) };
        static DIAGNOSTICS: RefCell<BootDiagnostics> = RefCell::new(BootDiagnostics::default());
        static REQUEST_PERMISSION_CLICK_HANDLER: RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(None) };
        static DELETE_TOKEN_CLICK_HANDLER: RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(None) };
    }

    #[derive(Debug, Clone, Serialize)]
    struct BootDiagnostics {
        phase: String,
        detail: String,
        last_error: Option<String>,
    }

    impl Default for BootDiagnostics {
        fn default() -> Self {
            Self {
                phase: "idle".to_string(),
                detail: "push demo not started".to_string(),
                last_error: None,
            }
        }
    }

    #[derive(Debug, Serialize)]
    struct PushStateView {
        boot: BootDiagnostics,
        controller: Option<ControllerSnapshot>,
    }

    #[wasm_bindgen(start)]
    pub fn start() {
        console_error_panic_hook::set_once();
        set_boot_phase("booting", "initializing push demo");
        spawn_local(async {
            if let Err(error) = boot().await {
                set_boot_error(&error);
            }
        });
    }

    #[wasm_bindgen]
    pub fn request_permission() {
        let Some(controller) = current_controller() else {
            tracing::warn!("request_permission called before boot finished");
            return;
        };
        spawn_local(async move {
            match controller.request_permission().await {
                Ok(outcome) => tracing::debug!(?outcome, "permission flow finished"),
                Err(error) => report_render_failure("permission flow", &error),
            }
        });
    }

    #[wasm_bindgen]
    pub fn delete_token() {
        let Some(controller) = current_controller() else {
            tracing::warn!("delete_token called before boot finished");
            return;
        };
        spawn_local(async move {
            match controller.delete_current_token().await {
                Ok(outcome) => tracing::debug!(?outcome, "delete flow finished"),
                Err(error) => report_render_failure("delete flow", &error),
            }
        });
    }

    #[wasm_bindgen]
    pub fn cancel_pending() -> u32 {
        current_controller()
            .map(|controller| u32::try_from(controller.cancel_pending()).unwrap_or(u32::MAX))
            .unwrap_or(0)
    }

    #[wasm_bindgen]
    pub fn push_state_json() -> String {
        let view = PushStateView {
            boot: DIAGNOSTICS.with(|state| state.borrow().clone()),
            controller: current_controller().map(|controller| controller.snapshot()),
        };
        serde_json::to_string(&view).unwrap_or_else(|_| {
            "{\"boot\":{\"phase\":\"error\",\"detail\":\"state serialization failed\"}}"
                .to_string()
        })
    }

    async fn boot() -> Result<(), String> {
        ensure_demo_dom()?;
        let config = read_window_config()?;
        install_console_logging(&config.log_filter);
        tracing::debug!(?config, "push demo config resolved");

        let renderer = DomRenderer::from_window()?;
        let store = LocalStorageStore::from_window().map_err(|error| error.to_string())?;
        let messaging = FirebaseMessaging::from_global().map_err(|error| error.to_string())?;
        let sink: Rc<dyn TokenSink> = match config.token_upload_url.clone() {
            Some(url) => Rc::new(HttpTokenSink::new(url)),
            None => Rc::new(LoggingTokenSink),
        };

        let controller = Rc::new(PushController::new(
            config,
            PushCollaborators {
                messaging: Rc::new(messaging),
                permissions: Rc::new(BrowserPermissionHost),
                store: Rc::new(store),
                sink,
                renderer: Rc::new(renderer),
                sleeper: Rc::new(GlooSleeper),
            },
        ));
        CONTROLLER.with(|slot| {
            *slot.borrow_mut() = Some(controller.clone());
        });
        install_button_handlers();

        set_boot_phase("ready", "fetching registration token");
        let outcome = controller
            .start()
            .await
            .map_err(|error| format!("initial render failed: {error}"))?;
        tracing::debug!(?outcome, "initial reset finished");
        Ok(())
    }

    fn current_controller() -> Option<Rc<PushController>> {
        CONTROLLER.with(|slot| slot.borrow().clone())
    }

    fn report_render_failure(flow: &str, error: &RenderError) {
        tracing::error!(flow, %error, "page render failed");
        DIAGNOSTICS.with(|state| {
            state.borrow_mut().last_error = Some(format!("{flow}: {error}"));
        });
    }
}
