//! One-time loading of the browser-side LaTeX element.
//!
//! The `<latex-js>` element variant needs its module and the KaTeX
//! stylesheet from a CDN. Loading happens at most once per
//! [`AssetRegistry`]: concurrent callers share one in-flight fetch, a
//! successful load is memoized, and a failed one is logged and tried again
//! on the next call. Nothing on the render path waits for it; only
//! [`Omniview::to_document_with_assets`] does, and it falls back to a CDN
//! import when loading failed.
//!
//! [`Omniview::to_document_with_assets`]: crate::Omniview::to_document_with_assets

use crate::config::AssetConfig;
use crate::error::AssetError;
use crate::render::escape_attr;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{error, info};

/// Fetches the text of a remote resource.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, AssetError>;
}

/// Fetches over HTTP with `reqwest`.
#[cfg(feature = "remote-assets")]
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    http: reqwest::Client,
}

#[cfg(feature = "remote-assets")]
impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(feature = "remote-assets")]
#[async_trait]
impl AssetFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AssetError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AssetError::Http(e.to_string()))?;

        let status = response.status().as_u16();
        if status >= 400 {
            return Err(AssetError::Status {
                url: url.to_string(),
                status,
            });
        }

        response
            .text()
            .await
            .map_err(|e| AssetError::Http(e.to_string()))
    }
}

const DEFINE_ELEMENT: &str = "if (!customElements.get(\"latex-js\")) customElements.define(\"latex-js\", LaTeXJSComponent);";

/// `<link>` tag for a stylesheet.
pub fn stylesheet_link(url: &str) -> String {
    format!(
        "<link rel=\"stylesheet\" href=\"{}\" crossorigin=\"anonymous\">",
        escape_attr(url)
    )
}

/// Module script defining `<latex-js>` from the element module at `url`.
pub fn element_import_script(url: &str) -> String {
    format!(
        "<script type=\"module\">import {{ LaTeXJSComponent }} from \"{}\"; {}</script>",
        escape_attr(url),
        DEFINE_ELEMENT
    )
}

/// Module script defining `<latex-js>` from already fetched module source.
///
/// The source is imported from a blob URL so its exports stay reachable.
pub fn element_inline_script(source: &str) -> String {
    let literal = serde_json::to_string(source)
        .unwrap_or_default()
        .replace("</", "<\\/");
    format!(
        "<script type=\"module\">const url = URL.createObjectURL(new Blob([{}], {{ type: \"text/javascript\" }})); \
         const {{ LaTeXJSComponent }} = await import(url); {}</script>",
        literal, DEFINE_ELEMENT
    )
}

/// Resources the element needs once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedAssets {
    /// Source of the element's JavaScript module.
    pub element_module: String,
    pub stylesheet_url: String,
}

impl LoadedAssets {
    /// Stylesheet link and inlined element definition for a page head.
    pub fn head_content(&self) -> String {
        format!(
            "{}\n{}",
            stylesheet_link(&self.stylesheet_url),
            element_inline_script(&self.element_module)
        )
    }
}

/// Memoized, single-flight loader for the element assets.
pub struct AssetRegistry {
    config: AssetConfig,
    fetcher: Arc<dyn AssetFetcher>,
    loaded: OnceCell<LoadedAssets>,
}

impl AssetRegistry {
    pub fn new(config: AssetConfig, fetcher: Arc<dyn AssetFetcher>) -> Self {
        Self {
            config,
            fetcher,
            loaded: OnceCell::new(),
        }
    }

    /// Registry fetching over HTTP.
    #[cfg(feature = "remote-assets")]
    pub fn http(config: AssetConfig) -> Self {
        Self::new(config, Arc::new(HttpFetcher::new()))
    }

    /// Load the assets unless already loaded.
    ///
    /// Returns `None` when loading fails; the failure is logged and the next
    /// call tries again.
    pub async fn ensure_registered(&self) -> Option<&LoadedAssets> {
        match self.loaded.get_or_try_init(|| self.load()).await {
            Ok(assets) => Some(assets),
            Err(e) => {
                error!(error = %e, "failed to load latex-js element");
                None
            }
        }
    }

    pub fn is_registered(&self) -> bool {
        self.loaded.initialized()
    }

    /// `<link>` tag for the element stylesheet.
    pub fn stylesheet_link(&self) -> String {
        stylesheet_link(&self.config.stylesheet_url)
    }

    async fn load(&self) -> Result<LoadedAssets, AssetError> {
        let element_module = self.fetcher.fetch(&self.config.element_module_url).await?;
        info!(url = %self.config.element_module_url, "latex-js element registered");
        Ok(LoadedAssets {
            element_module,
            stylesheet_url: self.config.stylesheet_url.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingFetcher {
        calls: AtomicUsize,
        fail_first: bool,
    }

    #[async_trait]
    impl AssetFetcher for CountingFetcher {
        async fn fetch(&self, url: &str) -> Result<String, AssetError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            if self.fail_first && call == 0 {
                return Err(AssetError::Status {
                    url: url.to_string(),
                    status: 503,
                });
            }
            Ok(format!("export class LaTeXJSComponent {{}} // {}", url))
        }
    }

    fn registry(fail_first: bool) -> (Arc<CountingFetcher>, Arc<AssetRegistry>) {
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
            fail_first,
        });
        let registry = AssetRegistry::new(AssetConfig::default(), fetcher.clone());
        (fetcher, Arc::new(registry))
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_fetch() {
        let (fetcher, registry) = registry(false);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.ensure_registered().await.is_some() })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap());
        }
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert!(registry.is_registered());

        registry.ensure_registered().await.unwrap();
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_is_retried() {
        let (fetcher, registry) = registry(true);
        assert!(registry.ensure_registered().await.is_none());
        assert!(!registry.is_registered());

        let assets = registry.ensure_registered().await.unwrap();
        assert!(assets.element_module.contains("LaTeXJSComponent"));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_inline_script_escapes_closing_tags() {
        let script = element_inline_script("export class LaTeXJSComponent {} // </script>\n");
        assert!(script.starts_with("<script type=\"module\">"));
        assert!(script.contains(r#"new Blob(["export class LaTeXJSComponent {} // <\/script>\n"]"#));
        assert_eq!(script.matches("</script>").count(), 1);
        assert!(script.ends_with("customElements.define(\"latex-js\", LaTeXJSComponent);</script>"));
    }

    #[test]
    fn test_loaded_head_content() {
        let loaded = LoadedAssets {
            element_module: "m".into(),
            stylesheet_url: "https://example.com/a.css".into(),
        };
        let head = loaded.head_content();
        assert!(head.starts_with(r#"<link rel="stylesheet" href="https://example.com/a.css""#));
        assert!(head.contains(r#"new Blob(["m"]"#));
    }

    #[test]
    fn test_stylesheet_link() {
        let (_, registry) = registry(false);
        assert_eq!(
            registry.stylesheet_link(),
            "<link rel=\"stylesheet\" href=\"https://cdn.jsdelivr.net/npm/katex@0.16.8/dist/katex.min.css\" crossorigin=\"anonymous\">"
        );
    }
}
