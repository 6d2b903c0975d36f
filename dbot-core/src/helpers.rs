//! Deep-link helpers (`https://t.me/<bot>?start=<payload>`).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::HandlerError;

/// Longest payload Telegram accepts for `start` / `startgroup`.
pub const MAX_DEEP_LINK_PAYLOAD: usize = 64;

static PAYLOAD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("Failed to compile payload regex"));

/// Builds a deep link to the bot. With `group` the link opens the "add to group" flow.
pub fn create_deep_linked_url(
    bot_username: &str,
    payload: Option<&str>,
    group: bool,
) -> Result<String, HandlerError> {
    if bot_username.chars().count() <= 3 {
        return Err(HandlerError::InvalidDeepLink(
            "You must provide a valid bot_username.".to_string(),
        ));
    }

    let base_url = format!("https://t.me/{}", bot_username);
    let payload = match payload {
        Some(p) if !p.is_empty() => p,
        _ => return Ok(base_url),
    };

    if payload.chars().count() > MAX_DEEP_LINK_PAYLOAD {
        return Err(HandlerError::InvalidDeepLink(format!(
            "The deep-linking payload must not exceed {} characters.",
            MAX_DEEP_LINK_PAYLOAD
        )));
    }
    if !PAYLOAD_RE.is_match(payload) {
        return Err(HandlerError::InvalidDeepLink(
            "Only A-Z, a-z, 0-9, _ and - are allowed for deep-linking payloads.".to_string(),
        ));
    }

    let key = if group { "startgroup" } else { "start" };
    Ok(format!("{}?{}={}", base_url, key, payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deep_link_without_payload() {
        assert_eq!(
            create_deep_linked_url("mybot", None, false).unwrap(),
            "https://t.me/mybot"
        );
        assert_eq!(
            create_deep_linked_url("mybot", Some(""), true).unwrap(),
            "https://t.me/mybot"
        );
    }

    #[test]
    fn test_deep_link_with_payload() {
        assert_eq!(
            create_deep_linked_url("mybot", Some("check-this-out"), false).unwrap(),
            "https://t.me/mybot?start=check-this-out"
        );
        assert_eq!(
            create_deep_linked_url("mybot", Some("so_cool"), true).unwrap(),
            "https://t.me/mybot?startgroup=so_cool"
        );
    }

    #[test]
    fn test_deep_link_rejects_bad_input() {
        assert!(create_deep_linked_url("bot", Some("x"), false).is_err());
        assert!(create_deep_linked_url("mybot", Some("has space"), false).is_err());
        let long = "a".repeat(65);
        assert!(create_deep_linked_url("mybot", Some(&long), false).is_err());
        let max = "a".repeat(64);
        assert!(create_deep_linked_url("mybot", Some(&max), false).is_ok());
    }
}
