//! HTML pages. The landing page is static; the QR page is rendered per
//! request from the current connection state.

use axum::response::Html;

use wagate_lifecycle::ConnectionState;

pub fn landing() -> Html<&'static str> {
    Html(include_str!("assets/index.html"))
}

/// QR/pairing page for the current state. Non-terminal waiting pages refresh
/// themselves so the browser picks up the QR once it is issued.
pub fn qr_page(state: &ConnectionState) -> Html<String> {
    let body = match state {
        ConnectionState::AwaitingScan { qr } => format!(
            "<h2>Scan this QR code with WhatsApp</h2>\
             <img src=\"{qr}\" alt=\"WhatsApp pairing QR code\" width=\"320\" height=\"320\" />\
             <p>Open WhatsApp &gt; Linked devices &gt; Link a device.</p>"
        ),
        ConnectionState::Connected => {
            "<h2>No QR code right now. Already connected.</h2>".to_string()
        },
        ConnectionState::Disconnected => {
            "<h2>Waiting for a QR code...</h2><p>This page refreshes automatically.</p>"
                .to_string()
        },
        ConnectionState::LoggedOut => "<h2>Session logged out.</h2>\
             <p>Clear the session directory and restart the gateway to pair again.</p>"
            .to_string(),
    };

    // LoggedOut is terminal, so refreshing would never show anything new.
    let refresh = match state {
        ConnectionState::LoggedOut => "",
        _ => "<meta http-equiv=\"refresh\" content=\"5\" />",
    };

    Html(format!(
        "<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\" />{refresh}\
         <title>wagate pairing</title></head>\
         <body style=\"font-family: system-ui, sans-serif; text-align: center; margin-top: 3rem;\">\
         {body}</body></html>"
    ))
}
