//! Plain-text and JSON views of a session.

use std::fmt::Write as _;

use serde_json::json;

use crate::{
    app::assets::AssetBase,
    session::{History, Phase, Session},
};

pub struct Renderer {
    assets: AssetBase,
    preview_chars: usize,
}

impl Renderer {
    pub fn new(assets: AssetBase, preview_chars: usize) -> Self {
        Self {
            assets,
            preview_chars,
        }
    }

    pub fn session(&self, session: &Session) -> String {
        let mut out = String::new();

        if session.phase() == Phase::Idle {
            out.push_str("Nothing searched yet.\n");
            return out;
        }

        let _ = writeln!(out, "── {} ──", session.query_label());
        let results = session.results();
        if results.is_empty() {
            out.push_str("No results.\n");
            return out;
        }

        if !results.text_results.is_empty() {
            out.push_str("\nText\n");
        }
        for (idx, item) in results.text_results.iter().enumerate() {
            let marker = if item.fading { "~" } else { " " };
            let _ = writeln!(out, "{marker}{:>2}. {}", idx + 1, item.title);
            if let Some(url) = &item.url {
                let _ = writeln!(out, "     {url}");
            }
            let preview = item.preview(self.preview_chars);
            if !preview.is_empty() {
                let _ = writeln!(out, "     {}", preview.replace('\n', " "));
            }
        }

        if !results.image_results.is_empty() {
            out.push_str("\nImages\n");
        }
        for (idx, image) in results.image_results.iter().enumerate() {
            let marker = if image.fading { "~" } else { " " };
            let _ = writeln!(out, "{marker}{:>2}. {}", idx + 1, image.display_name());
            let _ = writeln!(out, "     {}", self.assets.resolve(&image.filename));
        }

        out
    }

    /// Detail view of the selected image, if any.
    pub fn selection(&self, session: &Session) -> Option<String> {
        let image = session.selected_result()?;
        let mut out = String::new();

        let _ = writeln!(out, "{}", image.title.as_deref().unwrap_or(&image.filename));
        if let Some(caption) = image.caption.as_deref().filter(|c| !c.is_empty()) {
            let _ = writeln!(out, "  {caption}");
        }
        let _ = writeln!(out, "  image:  {}", self.assets.resolve(&image.filename));
        if let Some(url) = &image.url {
            let _ = writeln!(out, "  source: {url}");
        }

        Some(out)
    }

    pub fn history(&self, history: &History) -> String {
        if history.is_empty() {
            return "No history.\n".to_string();
        }

        let mut out = String::new();
        for (idx, entry) in history.entries().enumerate() {
            let _ = writeln!(out, "{:>2}. {entry}", idx + 1);
        }
        out
    }

    /// Session as JSON, with image filenames resolved to full urls.
    pub fn session_json(&self, session: &Session, history: &History) -> serde_json::Value {
        let results = session.results();
        json!({
            "phase": session.phase(),
            "query": session.query_label(),
            "embedding": session.continuity_embedding(),
            "text_results": results.text_results.iter().map(|item| json!({
                "title": item.title,
                "url": item.url,
                "text": item.preview(self.preview_chars),
                "score": item.score,
            })).collect::<Vec<_>>(),
            "image_results": results.image_results.iter().map(|image| json!({
                "title": image.title,
                "caption": image.caption,
                "filename": image.filename,
                "image_url": self.assets.resolve(&image.filename),
                "url": image.url,
                "score": image.score,
            })).collect::<Vec<_>>(),
            "history": history.entries().collect::<Vec<_>>(),
        })
    }
}
