//! Wire and display types shared by the session store and the search backends.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Separator used when chaining a refinement onto a previous query label.
pub const LABEL_SEPARATOR: &str = " → ";

/// Opaque vector returned by the service after every search. It anchors the
/// next refinement to the semantic position of the current result set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TextResult {
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub score: Option<f32>,

    /// Set while a refinement is about to replace this entry.
    #[serde(skip)]
    pub fading: bool,
}

impl TextResult {
    /// Body text cut to `max_chars` characters, with an ellipsis when cut.
    pub fn preview(&self, max_chars: usize) -> String {
        let mut chars = self.text.char_indices();
        match chars.nth(max_chars) {
            Some((idx, _)) => format!("{}…", self.text[..idx].trim_end()),
            None => self.text.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageResult {
    pub filename: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub score: Option<f32>,

    #[serde(skip)]
    pub fading: bool,
}

impl ImageResult {
    pub fn display_name(&self) -> &str {
        [self.caption.as_deref(), self.title.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
            .unwrap_or(&self.filename)
    }
}

/// Text and image hits of one response. Always replaced as a whole.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Results {
    #[serde(default)]
    pub text_results: Vec<TextResult>,
    #[serde(default)]
    pub image_results: Vec<ImageResult>,
}

impl Results {
    pub fn is_empty(&self) -> bool {
        self.text_results.is_empty() && self.image_results.is_empty()
    }
}

/// Body of every successful search, refine and image search response.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(flatten)]
    pub results: Results,
    #[serde(default)]
    pub embedding: Embedding,
}

/// Raw image file picked by the user.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        Ok(Self { file_name, bytes })
    }

    /// MIME type sniffed from the payload, falling back to octet-stream.
    pub fn mime_type(&self) -> &'static str {
        infer::get(&self.bytes)
            .map(|kind| kind.mime_type())
            .unwrap_or("application/octet-stream")
    }

    pub fn is_image(&self) -> bool {
        infer::is_image(&self.bytes)
    }

    /// Placeholder query label shown while and after searching by this image.
    pub fn label(&self) -> String {
        format!("Image: {}", self.file_name)
    }
}
