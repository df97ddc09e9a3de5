use anyhow::Context;
use url::Url;

/// Resolves image result filenames against the asset server.
#[derive(Debug, Clone)]
pub struct AssetBase {
    base: Url,
}

impl AssetBase {
    pub fn new(remote_addr: &str, asset_base: &str) -> anyhow::Result<Self> {
        let mut base = Url::parse(remote_addr)
            .with_context(|| format!("invalid remote address {remote_addr:?}"))?;

        let mut path = asset_base.to_string();
        if !path.ends_with('/') {
            path.push('/');
        }
        base.set_path(&path);

        Ok(Self { base })
    }

    pub fn resolve(&self, filename: &str) -> String {
        match self.base.join(filename.trim_start_matches('/')) {
            Ok(url) => url.to_string(),
            Err(err) => {
                tracing::warn!("cannot resolve asset {filename:?}: {err}");
                format!("{}{filename}", self.base)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve() {
        let assets = AssetBase::new("http://127.0.0.1:8000", "/wikipedia_scrape/images").unwrap();
        assert_eq!(
            assets.resolve("cat.jpg"),
            "http://127.0.0.1:8000/wikipedia_scrape/images/cat.jpg"
        );
        assert_eq!(
            assets.resolve("black cat.jpg"),
            "http://127.0.0.1:8000/wikipedia_scrape/images/black%20cat.jpg"
        );
    }

    #[test]
    fn test_remote_path_is_replaced() {
        let assets = AssetBase::new("http://search.local/api/", "/img/").unwrap();
        assert_eq!(assets.resolve("/a.png"), "http://search.local/img/a.png");
    }
}
