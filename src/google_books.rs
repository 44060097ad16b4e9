use std::time::Duration;

use anyhow::Context as _;
use serde::Deserialize;
use url::Url;

use crate::covers::CoverSource;
use crate::http::{self, FetchError};

/// Volumes search client for the Google Books API.
pub struct GoogleBooks {
    client: reqwest::blocking::Client,
    endpoint: String,
}

#[derive(Debug, Default, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Default, Deserialize)]
struct Volume {
    #[serde(rename = "volumeInfo", default)]
    volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
struct VolumeInfo {
    #[serde(rename = "imageLinks")]
    image_links: Option<ImageLinks>,
}

/// Cover variants keyed the way the API names them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLinks {
    pub extra_large: Option<String>,
    pub large: Option<String>,
    pub medium: Option<String>,
    pub thumbnail: Option<String>,
    pub small_thumbnail: Option<String>,
}

impl ImageLinks {
    /// Largest non-empty variant.
    pub fn best(&self) -> Option<&str> {
        [
            &self.extra_large,
            &self.large,
            &self.medium,
            &self.thumbnail,
            &self.small_thumbnail,
        ]
        .into_iter()
        .filter_map(|link| link.as_deref())
        .find(|link| !link.is_empty())
    }
}

impl GoogleBooks {
    pub fn new(endpoint: &str, timeout: Duration) -> anyhow::Result<Self> {
        Url::parse(endpoint).with_context(|| format!("parse books api url: {endpoint}"))?;
        Ok(Self {
            client: http::build_client(timeout)?,
            endpoint: endpoint.to_owned(),
        })
    }

    pub fn search_url(&self, title: &str, author: &str) -> Result<Url, FetchError> {
        let query = format!("intitle:{title}+inauthor:{author}");
        Url::parse_with_params(&self.endpoint, [("q", query.as_str())])
            .map_err(|err| FetchError::body(&self.endpoint, err))
    }
}

impl CoverSource for GoogleBooks {
    fn find_cover(&self, title: &str, author: &str) -> Result<Option<String>, FetchError> {
        let url = self.search_url(title, author)?;
        let value = http::send_json(self.client.get(url.as_str()), url.as_str())?;
        let response: VolumesResponse =
            serde_json::from_value(value).map_err(|err| FetchError::body(url.as_str(), err))?;
        Ok(best_cover(&response))
    }
}

fn best_cover(response: &VolumesResponse) -> Option<String> {
    let links = response.items.first()?.volume_info.image_links.as_ref()?;
    links.best().map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_prefers_larger_variants() {
        let links = ImageLinks {
            medium: Some("m".to_owned()),
            thumbnail: Some("t".to_owned()),
            small_thumbnail: Some("s".to_owned()),
            ..ImageLinks::default()
        };
        assert_eq!(links.best(), Some("m"));

        let links = ImageLinks {
            small_thumbnail: Some("s".to_owned()),
            ..ImageLinks::default()
        };
        assert_eq!(links.best(), Some("s"));
        assert_eq!(ImageLinks::default().best(), None);
    }

    #[test]
    fn best_cover_uses_first_item_only() -> anyhow::Result<()> {
        let response: VolumesResponse = serde_json::from_str(
            r#"{"items":[
                {"volumeInfo":{"title":"no cover"}},
                {"volumeInfo":{"imageLinks":{"thumbnail":"http://b/t"}}}
            ]}"#,
        )?;
        assert_eq!(best_cover(&response), None);

        let response: VolumesResponse = serde_json::from_str(
            r#"{"items":[{"volumeInfo":{"imageLinks":{"large":"http://b/l","thumbnail":"http://b/t"}}}]}"#,
        )?;
        assert_eq!(best_cover(&response).as_deref(), Some("http://b/l"));

        let response: VolumesResponse = serde_json::from_str(r#"{"totalItems":0}"#)?;
        assert_eq!(best_cover(&response), None);
        Ok(())
    }

    #[test]
    fn search_url_encodes_title_and_author() -> anyhow::Result<()> {
        let client = GoogleBooks::new(
            "https://www.googleapis.com/books/v1/volumes",
            Duration::from_secs(1),
        )?;
        let url = client.search_url("Clean Code", "Robert C. Martin")?;
        let q = url
            .query_pairs()
            .find(|(key, _)| key == "q")
            .map(|(_, value)| value.into_owned());
        assert_eq!(
            q.as_deref(),
            Some("intitle:Clean Code+inauthor:Robert C. Martin")
        );
        Ok(())
    }
}
