//! Hyperlink extraction and reachability checks.

use crate::rag::types::Hyperlink;
use docchat_core::{AppError, AppResult};
use futures::stream::{FuturesUnordered, StreamExt};
use regex::{Captures, Regex};
use std::collections::BTreeSet;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

/// Markdown links first, so a URL inside `[text](url)` is not matched twice.
static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]]+)\]\(([^)]+)\)|(https?://[^\s]+)").expect("link pattern is valid")
});

/// Every link in `text`, in order of appearance.
pub fn extract_links(text: &str) -> Vec<Hyperlink> {
    LINK_PATTERN
        .captures_iter(text)
        .filter_map(|caps| match (caps.get(1), caps.get(2), caps.get(3)) {
            (Some(label), Some(url), _) => Some(Hyperlink {
                text: label.as_str().to_string(),
                url: url.as_str().to_string(),
            }),
            (_, _, Some(url)) => Some(Hyperlink {
                text: url.as_str().to_string(),
                url: url.as_str().to_string(),
            }),
            _ => None,
        })
        .collect()
}

/// Remove links whose URL is not in `valid`.
///
/// `[text](url)` becomes `text` and a bare URL is dropped. Returns the
/// rewritten text and the removed URLs.
pub fn strip_unvalidated(text: &str, valid: &BTreeSet<String>) -> (String, Vec<String>) {
    let mut removed = Vec::new();

    let rewritten = LINK_PATTERN.replace_all(text, |caps: &Captures| {
        match (caps.get(1), caps.get(2), caps.get(3)) {
            (Some(label), Some(url), _) => {
                if valid.contains(url.as_str()) {
                    caps[0].to_string()
                } else {
                    removed.push(url.as_str().to_string());
                    label.as_str().to_string()
                }
            }
            (_, _, Some(url)) => {
                if valid.contains(url.as_str()) {
                    caps[0].to_string()
                } else {
                    removed.push(url.as_str().to_string());
                    String::new()
                }
            }
            _ => caps[0].to_string(),
        }
    });

    (rewritten.into_owned(), removed)
}

/// Reachability check for a single URL.
#[async_trait::async_trait]
pub trait LinkProbe: Send + Sync {
    async fn is_reachable(&self, url: &str) -> bool;
}

/// GET probe; any 2xx status counts as reachable.
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Other(format!("Failed to create HTTP client for link probes: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl LinkProbe for HttpProbe {
    async fn is_reachable(&self, url: &str) -> bool {
        match self.client.get(url).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::debug!(url, status = %response.status(), "Link probe failed");
                false
            }
            Err(e) => {
                tracing::debug!(url, error = %e, "Link probe failed");
                false
            }
        }
    }
}

/// Probes every distinct link concurrently under a per-probe timeout and
/// an overall deadline.
pub struct LinkValidator {
    probe: Arc<dyn LinkProbe>,
    probe_timeout: Duration,
    deadline: Duration,
}

impl LinkValidator {
    pub fn new(probe: Arc<dyn LinkProbe>, probe_timeout: Duration, deadline: Duration) -> Self {
        Self {
            probe,
            probe_timeout,
            deadline,
        }
    }

    /// URLs in `text` that were confirmed reachable.
    pub async fn validate(&self, text: &str) -> BTreeSet<String> {
        self.validate_urls(extract_links(text).into_iter().map(|link| link.url))
            .await
    }

    /// Probes still running at the deadline count as unreachable.
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn validate_urls(&self, urls: impl IntoIterator<Item = String>) -> BTreeSet<String> {
        let distinct: BTreeSet<String> = urls.into_iter().collect();
        let mut valid = BTreeSet::new();
        if distinct.is_empty() {
            return valid;
        }

        let total = distinct.len();
        let mut probes: FuturesUnordered<_> = distinct
            .into_iter()
            .map(|url| {
                let probe = Arc::clone(&self.probe);
                let probe_timeout = self.probe_timeout;
                async move {
                    let reachable =
                        match tokio::time::timeout(probe_timeout, probe.is_reachable(&url)).await {
                            Ok(reachable) => reachable,
                            Err(_) => {
                                tracing::debug!(url = %url, "Link probe timed out");
                                false
                            }
                        };
                    (url, reachable)
                }
            })
            .collect();

        let deadline = tokio::time::sleep(self.deadline);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                next = probes.next() => match next {
                    Some((url, true)) => {
                        valid.insert(url);
                    }
                    Some((url, false)) => {
                        tracing::debug!(url = %url, "Link is not reachable");
                    }
                    None => break,
                },
                _ = &mut deadline => {
                    tracing::warn!(
                        "Link validation deadline reached with {} of {} probes unfinished",
                        probes.len(),
                        total
                    );
                    break;
                }
            }
        }

        tracing::debug!("{} of {} links are reachable", valid.len(), total);
        valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reachable for listed URLs, immediately.
    struct ListProbe(Vec<&'static str>);

    #[async_trait::async_trait]
    impl LinkProbe for ListProbe {
        async fn is_reachable(&self, url: &str) -> bool {
            self.0.contains(&url)
        }
    }

    /// Reachable for `fast`, never answers for anything else.
    struct SlowProbe {
        fast: &'static str,
    }

    #[async_trait::async_trait]
    impl LinkProbe for SlowProbe {
        async fn is_reachable(&self, url: &str) -> bool {
            if url == self.fast {
                return true;
            }
            std::future::pending::<()>().await;
            true
        }
    }

    #[test]
    fn test_extract_markdown_and_bare() {
        let links = extract_links("See [docs](https://x.com/a) and https://x.com/b");
        assert_eq!(
            links,
            vec![
                Hyperlink {
                    text: "docs".to_string(),
                    url: "https://x.com/a".to_string()
                },
                Hyperlink {
                    text: "https://x.com/b".to_string(),
                    url: "https://x.com/b".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_extract_none() {
        assert!(extract_links("No links in this answer.").is_empty());
    }

    #[test]
    fn test_markdown_wins_overlap() {
        let links = extract_links("[guide](https://x.com/guide)");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].text, "guide");
    }

    #[test]
    fn test_strip_unvalidated() {
        let valid: BTreeSet<String> = ["https://x.com/a".to_string()].into();
        let (text, removed) = strip_unvalidated(
            "See [docs](https://x.com/a), [old](https://x.com/old) and https://x.com/b",
            &valid,
        );

        assert_eq!(text, "See [docs](https://x.com/a), old and ");
        assert_eq!(removed, vec!["https://x.com/old", "https://x.com/b"]);
    }

    #[tokio::test]
    async fn test_validate_dedups_and_filters() {
        let validator = LinkValidator::new(
            Arc::new(ListProbe(vec!["https://x.com/a"])),
            Duration::from_secs(1),
            Duration::from_secs(5),
        );

        let valid = validator
            .validate("[a](https://x.com/a) https://x.com/a [b](https://x.com/b)")
            .await;
        assert_eq!(valid, BTreeSet::from(["https://x.com/a".to_string()]));
    }

    #[tokio::test]
    async fn test_hanging_probe_times_out() {
        let validator = LinkValidator::new(
            Arc::new(SlowProbe { fast: "https://x.com/a" }),
            Duration::from_millis(50),
            Duration::from_secs(5),
        );

        let valid = validator.validate("https://x.com/a https://x.com/b").await;
        assert_eq!(valid, BTreeSet::from(["https://x.com/a".to_string()]));
    }

    #[tokio::test]
    async fn test_deadline_keeps_partial_results() {
        let validator = LinkValidator::new(
            Arc::new(SlowProbe { fast: "https://x.com/a" }),
            Duration::from_secs(30),
            Duration::from_millis(50),
        );

        let valid = validator.validate("https://x.com/a https://x.com/b").await;
        assert_eq!(valid, BTreeSet::from(["https://x.com/a".to_string()]));
    }

    #[tokio::test]
    async fn test_no_links_skips_probing() {
        let validator = LinkValidator::new(
            Arc::new(SlowProbe { fast: "" }),
            Duration::from_secs(30),
            Duration::from_secs(30),
        );
        assert!(validator.validate("plain text").await.is_empty());
    }
}
