use super::*;

use push_client_core::Region;
use push_client_core::Renderer;
use push_client_core::ui::{MESSAGES_ID, PERMISSION_REGION_ID, TOKEN_REGION_ID, TOKEN_TEXT_ID};
use web_sys::{Document, Element};

/// Renders straight into the page markup by element id.
pub(super) struct DomRenderer {
    document: Document,
}

impl DomRenderer {
    pub(super) fn from_window() -> Result<Self, String> {
        let document = web_sys::window()
            .ok_or_else(|| "window is unavailable".to_string())?
            .document()
            .ok_or_else(|| "document is unavailable".to_string())?;
        Ok(Self { document })
    }

    fn element(&self, id: &str) -> Result<Element, RenderError> {
        self.document
            .get_element_by_id(id)
            .ok_or_else(|| RenderError::MissingElement(id.to_string()))
    }

    fn create(&self, tag: &str) -> Result<Element, RenderError> {
        self.document
            .create_element(tag)
            .map_err(|_| RenderError::Dom(format!("failed to create <{tag}>")))
    }
}

impl Renderer for DomRenderer {
    fn show_token(&self, text: &str) -> Result<(), RenderError> {
        self.element(TOKEN_TEXT_ID)?.set_text_content(Some(text));
        Ok(())
    }

    fn show_region(&self, region: Region, visible: bool) -> Result<(), RenderError> {
        self.element(region.element_id())?
            .set_attribute("style", Region::display_style(visible))
            .map_err(|_| RenderError::Dom(format!("failed to style #{}", region.element_id())))
    }

    fn append_message_text(&self, header: &str, body_text: &str) -> Result<(), RenderError> {
        let messages = self.element(MESSAGES_ID)?;
        let header_element = self.create("h5")?;
        header_element.set_text_content(Some(header));
        let body_element = self.create("pre")?;
        body_element
            .set_attribute("style", MESSAGE_BODY_STYLE)
            .map_err(|_| RenderError::Dom("failed to style message body".to_string()))?;
        body_element.set_text_content(Some(body_text));

        messages
            .append_child(&header_element)
            .map_err(|_| RenderError::Dom("failed to append message header".to_string()))?;
        messages
            .append_child(&body_element)
            .map_err(|_| RenderError::Dom("failed to append message body".to_string()))?;
        Ok(())
    }

    fn clear_messages(&self) -> Result<(), RenderError> {
        let messages = self.element(MESSAGES_ID)?;
        while let Some(last) = messages.last_child() {
            messages
                .remove_child(&last)
                .map_err(|_| RenderError::Dom("failed to remove message node".to_string()))?;
        }
        Ok(())
    }
}

/// Creates whichever demo elements the host page does not already provide.
pub(super) fn ensure_demo_dom() -> Result<(), String> {
    let window = web_sys::window().ok_or_else(|| "window is unavailable".to_string())?;
    let document = window
        .document()
        .ok_or_else(|| "document is unavailable".to_string())?;
    let body = document
        .body()
        .ok_or_else(|| "document body is unavailable".to_string())?;

    if document.get_element_by_id(STATUS_ID).is_none() {
        let status = create_html_element(&document, "div", STATUS_ID)?;
        status
            .style()
            .set_property("font-family", "monospace")
            .map_err(|_| "failed to style status element".to_string())?;
        status
            .style()
            .set_property("font-size", "12px")
            .map_err(|_| "failed to style status element".to_string())?;
        body.append_child(&status)
            .map_err(|_| "failed to append status element".to_string())?;
    }

    if document.get_element_by_id(TOKEN_REGION_ID).is_none() {
        let region = create_html_element(&document, "div", TOKEN_REGION_ID)?;
        let _ = region.set_attribute("style", "display: none");
        let hint = create_html_element(&document, "h4", "")?;
        hint.set_inner_text(TOKEN_REGION_HINT);
        region
            .append_child(&hint)
            .map_err(|_| "failed to append token hint".to_string())?;
        body.append_child(&region)
            .map_err(|_| "failed to append token region".to_string())?;
    }
    let token_region = document
        .get_element_by_id(TOKEN_REGION_ID)
        .ok_or_else(|| "token region is missing".to_string())?;

    if document.get_element_by_id(TOKEN_TEXT_ID).is_none() {
        let token = create_html_element(&document, "p", TOKEN_TEXT_ID)?;
        token
            .style()
            .set_property("word-break", "break-all")
            .map_err(|_| "failed to style token element".to_string())?;
        token_region
            .append_child(&token)
            .map_err(|_| "failed to append token element".to_string())?;
    }

    if document.get_element_by_id(DELETE_TOKEN_BUTTON_ID).is_none() {
        let button = create_button(&document, DELETE_TOKEN_BUTTON_ID, DELETE_TOKEN_LABEL)?;
        token_region
            .append_child(&button)
            .map_err(|_| "failed to append delete button".to_string())?;
    }

    if document.get_element_by_id(PERMISSION_REGION_ID).is_none() {
        let region = create_html_element(&document, "div", PERMISSION_REGION_ID)?;
        let _ = region.set_attribute("style", "display: none");
        let hint = create_html_element(&document, "h4", "")?;
        hint.set_inner_text(PERMISSION_REGION_HINT);
        region
            .append_child(&hint)
            .map_err(|_| "failed to append permission hint".to_string())?;
        body.append_child(&region)
            .map_err(|_| "failed to append permission region".to_string())?;
    }

    if document.get_element_by_id(REQUEST_PERMISSION_BUTTON_ID).is_none() {
        let region = document
            .get_element_by_id(PERMISSION_REGION_ID)
            .ok_or_else(|| "permission region is missing".to_string())?;
        let button = create_button(
            &document,
            REQUEST_PERMISSION_BUTTON_ID,
            REQUEST_PERMISSION_LABEL,
        )?;
        region
            .append_child(&button)
            .map_err(|_| "failed to append permission button".to_string())?;
    }

    if document.get_element_by_id(MESSAGES_ID).is_none() {
        let messages = create_html_element(&document, "div", MESSAGES_ID)?;
        body.append_child(&messages)
            .map_err(|_| "failed to append messages element".to_string())?;
    }

    Ok(())
}

fn create_html_element(document: &Document, tag: &str, id: &str) -> Result<HtmlElement, String> {
    let element = document
        .create_element(tag)
        .map_err(|_| format!("failed to create <{tag}>"))?
        .dyn_into::<HtmlElement>()
        .map_err(|_| format!("<{tag}> is not HtmlElement"))?;
    if !id.is_empty() {
        element.set_id(id);
    }
    Ok(element)
}

fn create_button(document: &Document, id: &str, label: &str) -> Result<HtmlElement, String> {
    let button = create_html_element(document, "button", id)?;
    let _ = button.set_attribute("type", "button");
    button.set_inner_text(label);
    let _ = button.style().set_property("cursor", "pointer");
    Ok(button)
}

pub(super) fn install_button_handlers() {
    let Some(document) = web_sys::window().and_then(|window| window.document()) else {
        return;
    };

    REQUEST_PERMISSION_CLICK_HANDLER.with(|slot| {
        if slot.borrow().is_some() {
            return;
        }
        let Some(button) = document.get_element_by_id(REQUEST_PERMISSION_BUTTON_ID) else {
            return;
        };
        let callback = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |_event| {
            request_permission();
        }));
        match button.add_event_listener_with_callback("click", callback.as_ref().unchecked_ref())
        {
            Ok(()) => *slot.borrow_mut() = Some(callback),
            Err(error) => tracing::warn!(
                button = REQUEST_PERMISSION_BUTTON_ID,
                error = %bindings::js_error_text(&error),
                "click handler not attached"
            ),
        }
    });

    DELETE_TOKEN_CLICK_HANDLER.with(|slot| {
        if slot.borrow().is_some() {
            return;
        }
        let Some(button) = document.get_element_by_id(DELETE_TOKEN_BUTTON_ID) else {
            return;
        };
        let callback = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |_event| {
            delete_token();
        }));
        match button.add_event_listener_with_callback("click", callback.as_ref().unchecked_ref())
        {
            Ok(()) => *slot.borrow_mut() = Some(callback),
            Err(error) => tracing::warn!(
                button = DELETE_TOKEN_BUTTON_ID,
                error = %bindings::js_error_text(&error),
                "click handler not attached"
            ),
        }
    });
}
