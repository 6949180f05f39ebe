//! Phone-number and JID formatting rules.
//!
//! WhatsApp addresses every chat by JID: `<user>@s.whatsapp.net` for personal
//! chats, `<id>@g.us` for groups. The gateway accepts bare phone numbers and
//! group ids and qualifies them here.

/// Server suffix for personal chats.
pub const PERSONAL_SERVER: &str = "s.whatsapp.net";

/// Server suffix for group chats.
pub const GROUP_SERVER: &str = "g.us";

/// Replace a leading `0` with the configured country code.
///
/// Any other format passes through unchanged — numbers already carrying a
/// country code are not touched.
pub fn normalize_phone(phone: &str, country_code: &str) -> String {
    match phone.strip_prefix('0') {
        Some(rest) => format!("{country_code}{rest}"),
        None => phone.to_string(),
    }
}

/// Personal JID for an already-normalized phone number.
pub fn personal_jid(phone: &str) -> String {
    format!("{phone}@{PERSONAL_SERVER}")
}

/// Group JID: append `@g.us` unless the id already carries it.
pub fn group_jid(group_id: &str) -> String {
    if group_id.ends_with("@g.us") {
        group_id.to_string()
    } else {
        format!("{group_id}@{GROUP_SERVER}")
    }
}
