pub(crate) const WINDOW_CONFIG_GLOBAL: &str = "__PUSH_DEMO_CONFIG__";
pub(crate) const STATUS_ID: &str = "push-demo-status";
pub(crate) const REQUEST_PERMISSION_BUTTON_ID: &str = "request_permission_button";
pub(crate) const DELETE_TOKEN_BUTTON_ID: &str = "delete_token_button";
pub(crate) const REQUEST_PERMISSION_LABEL: &str = "Request Permission";
pub(crate) const DELETE_TOKEN_LABEL: &str = "Delete Token";
pub(crate) const TOKEN_REGION_HINT: &str = "Instance ID Token";
pub(crate) const PERMISSION_REGION_HINT: &str =
    "Needs Permission: request permission to receive notifications.";
pub(crate) const MESSAGE_BODY_STYLE: &str = "overflow-x:hidden;";
