//! Session capabilities that make the automated browser look like an
//! ordinary desktop visitor. Chosen once per session.

use rand::seq::IndexedRandom;
use rand::Rng;
use serde_json::{json, Value};

/// Desktop Chrome user agents rotated between sessions.
pub(crate) const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
];

/// Common desktop resolutions; a few pixels of noise are added on top.
const VIEWPORTS: &[(u32, u32)] = &[(1920, 1080), (1680, 1050), (1536, 864), (1440, 900), (1366, 768)];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Fingerprint {
    pub user_agent: String,
    pub width: u32,
    pub height: u32,
}

impl Fingerprint {
    pub(crate) fn random() -> Self {
        let mut rng = rand::rng();
        let user_agent = USER_AGENTS
            .choose(&mut rng)
            .copied()
            .unwrap_or(USER_AGENTS[0])
            .to_owned();
        let (w, h) = VIEWPORTS.choose(&mut rng).copied().unwrap_or((1920, 1080));
        Self {
            user_agent,
            width: w - rng.random_range(0..=40),
            height: h - rng.random_range(0..=60),
        }
    }
}

/// W3C `POST /session` body for Chrome with automation markers disabled.
pub(crate) fn stealth_capabilities(headless: bool, fingerprint: &Fingerprint) -> Value {
    let mut args = vec![
        format!("--user-agent={}", fingerprint.user_agent),
        format!("--window-size={},{}", fingerprint.width, fingerprint.height),
        "--disable-blink-features=AutomationControlled".to_owned(),
        "--lang=en-US".to_owned(),
        "--disable-dev-shm-usage".to_owned(),
    ];
    if headless {
        args.push("--headless=new".to_owned());
    }

    json!({
        "capabilities": {
            "alwaysMatch": {
                "browserName": "chrome",
                "acceptInsecureCerts": true,
                "pageLoadStrategy": "normal",
                "goog:chromeOptions": {
                    "args": args,
                    "excludeSwitches": ["enable-automation"],
                    "useAutomationExtension": false
                }
            }
        }
    })
}
