use regex::Regex;
use std::sync::LazyLock;

static CONNECTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bconnected\s+to\b").expect("valid connected regex"));

static REJECTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(busy|failed|failure|no route|not heard|timeout|timed out|disconnected|sorry)\b")
        .expect("valid rejection regex")
});

static LOGIN_REJECTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(invalid|incorrect|sorry)\b").expect("valid login rejection regex")
});

static USER_PROMPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(user(name)?|callsign|login)\s*:\s*$").expect("valid user prompt regex")
});

static PASSWORD_PROMPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)password\s*:\s*$").expect("valid password prompt regex"));

/// How a connect attempt ended, as judged from the console text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    Connected,
    Rejected(String),
}

/// Classifies the text received after a connect command
///
/// Whichever keyword comes first decides. Text after a confirmation is the
/// remote node's welcome banner and may mention "timeout" or "sorry" freely.
pub fn classify_connect(text: &str) -> Option<ConnectOutcome> {
    let connected = CONNECTED.find(text).map(|m| m.start());
    match REJECTED.find(text) {
        Some(m) if connected.map_or(true, |at| m.start() < at) => {
            Some(ConnectOutcome::Rejected(m.as_str().to_lowercase()))
        }
        _ => connected.map(|_| ConnectOutcome::Connected),
    }
}

/// Returns the login rejection keyword, if any
pub fn login_rejection(text: &str) -> Option<String> {
    LOGIN_REJECTED
        .find(text)
        .map(|m| m.as_str().to_lowercase())
}

pub fn is_user_prompt(text: &str) -> bool {
    USER_PROMPT.is_match(text.trim_end())
}

pub fn is_password_prompt(text: &str) -> bool {
    PASSWORD_PROMPT.is_match(text.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connected() {
        assert_eq!(
            classify_connect("BURG:KC1JMH-15} Connected to SHOP:KS1R-15\n"),
            Some(ConnectOutcome::Connected)
        );
        assert_eq!(classify_connect("Trying KS1R-15\n"), None);
    }

    #[test]
    fn test_rejections() {
        for text in [
            "KS1R-15 Busy",
            "Failure with KS1R-15",
            "Sorry, no route to KS1R-15",
            "Link to KS1R-15 timed out",
            "*** Disconnected",
        ] {
            assert!(
                matches!(classify_connect(text), Some(ConnectOutcome::Rejected(_))),
                "{text}"
            );
        }
    }

    #[test]
    fn test_rejection_before_confirmation_wins() {
        assert_eq!(
            classify_connect("KS1R-15 busy, try later\nConnected to SHOP:KS1R-15\n"),
            Some(ConnectOutcome::Rejected("busy".to_string()))
        );
    }

    #[test]
    fn test_welcome_banner_after_confirmation() {
        assert_eq!(
            classify_connect(
                "BURG:KC1JMH-15} Connected to SHOP:KS1R-15\nWelcome to SHOP. Idle timeout is 15 minutes\n"
            ),
            Some(ConnectOutcome::Connected)
        );
        assert_eq!(
            classify_connect("Connected to SHOP\nSorry, the BBS is down today\n"),
            Some(ConnectOutcome::Connected)
        );
    }

    #[test]
    fn test_disconnected_is_not_connected() {
        assert!(!CONNECTED.is_match("disconnected to"));
    }

    #[test]
    fn test_prompts() {
        assert!(is_user_prompt("Welcome\nuser: "));
        assert!(is_user_prompt("Callsign :"));
        assert!(is_password_prompt("password:"));
        assert!(!is_password_prompt("password accepted"));
        assert_eq!(login_rejection("Invalid password"), Some("invalid".to_string()));
    }
}
