use super::*;

use std::io;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

use crate::log_buffer::{ConsoleLevel, LineBuffer, console_level};

pub(super) fn set_boot_phase(phase: &str, detail: &str) {
    DIAGNOSTICS.with(|state| {
        let mut state = state.borrow_mut();
        state.phase = phase.to_string();
        state.detail = detail.to_string();
        if phase != "error" {
            state.last_error = None;
        }
    });
    update_status_dom(phase, detail, false);
}

pub(super) fn set_boot_error(message: &str) {
    tracing::error!(message, "push demo boot failed");
    DIAGNOSTICS.with(|state| {
        let mut state = state.borrow_mut();
        state.phase = "error".to_string();
        state.detail = "startup failed".to_string();
        state.last_error = Some(message.to_string());
    });
    update_status_dom("error", message, true);
}

pub(super) fn update_status_dom(phase: &str, detail: &str, is_error: bool) {
    let Some(document) = web_sys::window().and_then(|window| window.document()) else {
        return;
    };
    let Some(status) = document.get_element_by_id(STATUS_ID) else {
        return;
    };
    if let Ok(status) = status.dyn_into::<HtmlElement>() {
        let label = if is_error { "Boot error" } else { "Boot" };
        status.set_inner_text(&format!("{label}: {phase} ({detail})"));
        let color = if is_error { "#f87171" } else { "#64748b" };
        let _ = status.style().set_property("color", color);
    }
}

/// Reads `window.__PUSH_DEMO_CONFIG__`, keyed like the process environment
/// (`PUSH_DEMO_VAPID_KEY`, ...). A missing object means all defaults.
pub(super) fn read_window_config() -> Result<PushDemoConfig, String> {
    let global = web_sys::window()
        .and_then(|window| {
            js_sys::Reflect::get(&window, &JsValue::from_str(WINDOW_CONFIG_GLOBAL)).ok()
        })
        .filter(|value| value.is_object());

    PushDemoConfig::from_lookup(|key| {
        let global = global.as_ref()?;
        let value = js_sys::Reflect::get(global, &JsValue::from_str(key)).ok()?;
        if let Some(text) = value.as_string() {
            return Some(text);
        }
        if let Some(number) = value.as_f64() {
            return Some(format!("{number}"));
        }
        value.as_bool().map(|flag| flag.to_string())
    })
    .map_err(|error| format!("invalid {WINDOW_CONFIG_GLOBAL}: {error}"))
}

pub(super) fn install_console_logging(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .with_writer(ConsoleMakeWriter)
        .try_init();
    if installed.is_err() {
        web_sys::console::warn_1(&JsValue::from_str("tracing subscriber already installed"));
    }
}

struct ConsoleMakeWriter;

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter::default()
    }
}

#[derive(Default)]
struct ConsoleWriter {
    buffer: LineBuffer,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        for line in self.buffer.push(bytes) {
            emit_console_line(&line);
        }
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(line) = self.buffer.take_remainder() {
            emit_console_line(&line);
        }
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let _ = io::Write::flush(self);
    }
}

fn emit_console_line(line: &str) {
    let value = JsValue::from_str(line);
    match console_level(line) {
        ConsoleLevel::Error => web_sys::console::error_1(&value),
        ConsoleLevel::Warn => web_sys::console::warn_1(&value),
        ConsoleLevel::Debug => web_sys::console::debug_1(&value),
        ConsoleLevel::Log => web_sys::console::log_1(&value),
    }
}
