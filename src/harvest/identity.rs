//! Outbound request identity and pacing.
//!
//! The listing host expects the Referer and a referer-derived cookie to follow
//! the browsing path. Instead of mutating shared headers, each fetch receives
//! the current [`OutboundIdentity`] and the paginator swaps in a rotated one
//! between months.

use crate::config::ScraperConfig;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundIdentity {
    pub referer: String,
    pub cookie: String,
    pub accept: String,
    pub accept_language: String,
    cookie_template: String,
}

impl OutboundIdentity {
    /// Identity for the first request of a run: empty referer.
    pub fn initial(config: &ScraperConfig) -> Self {
        Self {
            referer: String::new(),
            cookie: render_cookie(&config.cookie_template, ""),
            accept: config.accept.clone(),
            accept_language: config.accept_language.clone(),
            cookie_template: config.cookie_template.clone(),
        }
    }

    /// Identity for the next request, presenting `referer` as the page we came from.
    pub fn rotated(&self, referer: &str) -> Self {
        Self {
            referer: referer.to_string(),
            cookie: render_cookie(&self.cookie_template, referer),
            ..self.clone()
        }
    }

    /// Header pairs to attach to a request. Empty values are omitted.
    pub fn headers(&self) -> Vec<(&'static str, &str)> {
        [
            ("Referer", self.referer.as_str()),
            ("Cookie", self.cookie.as_str()),
            ("Accept", self.accept.as_str()),
            ("Accept-Language", self.accept_language.as_str()),
        ]
        .into_iter()
        .filter(|(_, v)| !v.is_empty())
        .collect()
    }
}

fn render_cookie(template: &str, referer: &str) -> String {
    template.replace("{referer}", referer)
}

/// Sleep for `delay_ms` plus up to `jitter_ms` of random jitter.
pub async fn polite_pause(delay_ms: u64, jitter_ms: u64) {
    if delay_ms == 0 && jitter_ms == 0 {
        return;
    }
    let jitter = if jitter_ms > 0 {
        rand::random::<u64>() % (jitter_ms + 1)
    } else {
        0
    };
    let total = Duration::from_millis(delay_ms + jitter);
    debug!("Pausing {:?}", total);
    sleep(total).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_moves_referer_into_cookie() {
        let cfg = ScraperConfig {
            cookie_template: "pref=1; ref={referer}".into(),
            ..ScraperConfig::default()
        };
        let first = OutboundIdentity::initial(&cfg);
        assert_eq!(first.referer, "");
        assert_eq!(first.cookie, "pref=1; ref=");

        let next = first.rotated("http://example.com/list?month=2017-07");
        assert_eq!(next.referer, "http://example.com/list?month=2017-07");
        assert_eq!(next.cookie, "pref=1; ref=http://example.com/list?month=2017-07");
        assert_eq!(next.accept, first.accept);
    }

    #[test]
    fn empty_referer_header_is_not_sent() {
        let identity = OutboundIdentity::initial(&ScraperConfig::default());
        let names: Vec<_> = identity.headers().into_iter().map(|(k, _)| k).collect();
        assert!(!names.contains(&"Referer"));
        assert!(names.contains(&"Cookie"));
    }

    #[tokio::test]
    async fn zero_pause_returns_immediately() {
        let start = std::time::Instant::now();
        polite_pause(0, 0).await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
