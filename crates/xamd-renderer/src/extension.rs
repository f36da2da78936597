//! Extension registry for code-block, multimedia and emoji handling.
//!
//! Handlers are looked up by key when the renderer meets the matching node.
//! A handler that is missing, declines with [`HandlerOutcome::Declined`] or
//! fails falls back to the built-in rendering of that node.
//!
//! # Example
//!
//! ```
//! use xamd_model::CodeBlock;
//! use xamd_renderer::{
//!     CodeBlockHandler, Extensions, HandlerContext, HandlerError, HandlerOutcome, MarkupWriter,
//! };
//!
//! struct Banner;
//!
//! impl CodeBlockHandler for Banner {
//!     fn render(
//!         &self,
//!         block: &CodeBlock,
//!         ctx: &mut HandlerContext<'_>,
//!     ) -> Result<HandlerOutcome, HandlerError> {
//!         if block.rows.is_empty() {
//!             return Ok(HandlerOutcome::Declined);
//!         }
//!         ctx.out.open_element("Label")?;
//!         ctx.out.attribute("Text", &block.rows.join(" "))?;
//!         ctx.out.close_element()?;
//!         Ok(HandlerOutcome::Rendered)
//!     }
//! }
//!
//! let extensions = Extensions::with_defaults().with_code_handler("banner", Banner);
//! assert!(extensions.code_handler("BANNER").is_some());
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use xamd_model::{Alignment, CodeBlock, Emoji, MultimediaItem};

use crate::dialect::DialectKind;
use crate::error::{HandlerError, WriteError};
use crate::profile::Profile;
use crate::script::ScriptEvaluator;
use crate::writer::MarkupWriter;

/// Result of offering a node to a handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// The handler wrote the node.
    Rendered,
    /// The handler wrote nothing; built-in rendering applies.
    Declined,
}

/// What a handler may use while rendering.
pub struct HandlerContext<'a> {
    pub out: &'a mut dyn MarkupWriter,
    /// Text alignment in effect.
    pub alignment: Alignment,
    pub dialect: DialectKind,
    pub profile: &'a Profile,
}

/// Renders fenced code blocks of one language.
pub trait CodeBlockHandler {
    fn render(
        &self,
        block: &CodeBlock,
        ctx: &mut HandlerContext<'_>,
    ) -> Result<HandlerOutcome, HandlerError>;
}

/// Renders multimedia items of one content type.
pub trait MultimediaHandler {
    fn render(
        &self,
        item: &MultimediaItem,
        ctx: &mut HandlerContext<'_>,
    ) -> Result<HandlerOutcome, HandlerError>;
}

/// Resolves emoji to images.
pub trait EmojiSource {
    fn supports(&self, emoji: &Emoji) -> bool;

    /// Image for `emoji` at its size level.
    fn image_source(&self, emoji: &Emoji) -> Result<ImageSource, HandlerError>;
}

/// Image reference with optional pixel size.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImageSource {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Write an `Image` element for `source`.
pub fn write_image(out: &mut dyn MarkupWriter, source: &ImageSource) -> Result<(), WriteError> {
    out.open_element("Image")?;
    out.attribute("Source", &source.url)?;
    if let Some(width) = source.width {
        out.attribute("WidthRequest", &width.to_string())?;
    }
    if let Some(height) = source.height {
        out.attribute("HeightRequest", &height.to_string())?;
    }
    out.close_element()
}

/// Built-in handler rendering any image item as an `Image` element.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageContent;

impl MultimediaHandler for ImageContent {
    fn render(
        &self,
        item: &MultimediaItem,
        ctx: &mut HandlerContext<'_>,
    ) -> Result<HandlerOutcome, HandlerError> {
        if item.url.is_empty() {
            return Ok(HandlerOutcome::Declined);
        }
        let source = ImageSource {
            url: item.url.clone(),
            width: item.width,
            height: item.height,
        };
        write_image(ctx.out, &source)?;
        Ok(HandlerOutcome::Rendered)
    }
}

/// Content type of `item`: the declared one, else guessed from the URL's
/// file extension.
pub fn content_type(item: &MultimediaItem) -> Option<String> {
    if let Some(declared) = &item.content_type {
        return Some(declared.to_ascii_lowercase());
    }
    if item.url.starts_with("data:") {
        let header = item.url.trim_start_matches("data:");
        let end = header.find([';', ','])?;
        return Some(header[..end].to_ascii_lowercase());
    }
    let path = item.url.split(['?', '#']).next().unwrap_or_default();
    let (_, extension) = path.rsplit_once('.')?;
    let guessed = match extension.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        _ => return None,
    };
    Some(guessed.to_owned())
}

/// Registered handlers and external services.
#[derive(Clone, Default)]
pub struct Extensions {
    code: BTreeMap<String, Arc<dyn CodeBlockHandler>>,
    multimedia: BTreeMap<String, Arc<dyn MultimediaHandler>>,
    emoji: Option<Arc<dyn EmojiSource>>,
    evaluator: Option<Arc<dyn ScriptEvaluator>>,
}

impl Extensions {
    /// Registry without any handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in [`ImageContent`] handler for `image/*`.
    pub fn with_defaults() -> Self {
        Self::new().with_multimedia_handler("image", ImageContent)
    }

    /// Register a handler for code blocks declaring `language` (case-insensitive).
    #[must_use]
    pub fn with_code_handler(
        mut self,
        language: &str,
        handler: impl CodeBlockHandler + 'static,
    ) -> Self {
        self.code
            .insert(language.to_ascii_lowercase(), Arc::new(handler));
        self
    }

    /// Register a handler for a full content type (`image/png`) or a major
    /// type (`image`).
    #[must_use]
    pub fn with_multimedia_handler(
        mut self,
        content_type: &str,
        handler: impl MultimediaHandler + 'static,
    ) -> Self {
        self.multimedia
            .insert(content_type.to_ascii_lowercase(), Arc::new(handler));
        self
    }

    #[must_use]
    pub fn with_emoji_source(mut self, source: impl EmojiSource + 'static) -> Self {
        self.emoji = Some(Arc::new(source));
        self
    }

    #[must_use]
    pub fn with_evaluator(mut self, evaluator: impl ScriptEvaluator + 'static) -> Self {
        self.evaluator = Some(Arc::new(evaluator));
        self
    }

    pub fn code_handler(&self, language: &str) -> Option<&dyn CodeBlockHandler> {
        self.code
            .get(&language.to_ascii_lowercase())
            .map(|handler| &**handler)
    }

    /// Handler for `content_type`, falling back to its major type.
    pub fn multimedia_handler(&self, content_type: &str) -> Option<&dyn MultimediaHandler> {
        let content_type = content_type.to_ascii_lowercase();
        self.multimedia
            .get(&content_type)
            .or_else(|| {
                let (major, _) = content_type.split_once('/')?;
                self.multimedia.get(major)
            })
            .map(|handler| &**handler)
    }

    pub fn emoji_source(&self) -> Option<&dyn EmojiSource> {
        self.emoji.as_deref()
    }

    pub fn evaluator(&self) -> Option<&dyn ScriptEvaluator> {
        self.evaluator.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::TreeWriter;
    use pretty_assertions::assert_eq;

    struct Decline;

    impl MultimediaHandler for Decline {
        fn render(
            &self,
            _item: &MultimediaItem,
            _ctx: &mut HandlerContext<'_>,
        ) -> Result<HandlerOutcome, HandlerError> {
            Ok(HandlerOutcome::Declined)
        }
    }

    #[test]
    fn test_content_type_guessing() {
        assert_eq!(
            content_type(&MultimediaItem::new("a/b.PNG?x=1")).as_deref(),
            Some("image/png")
        );
        assert_eq!(
            content_type(&MultimediaItem::new("data:image/gif;base64,AAAA")).as_deref(),
            Some("image/gif")
        );
        assert_eq!(
            content_type(&MultimediaItem::new("x").with_content_type("Video/MP4")).as_deref(),
            Some("video/mp4")
        );
        assert_eq!(content_type(&MultimediaItem::new("page.html")), None);
    }

    #[test]
    fn test_multimedia_lookup_prefers_exact_type() {
        let extensions = Extensions::with_defaults().with_multimedia_handler("image/svg+xml", Decline);
        let profile = Profile::maui();
        let mut out = TreeWriter::new();
        let mut ctx = HandlerContext {
            out: &mut out,
            alignment: Alignment::Left,
            dialect: DialectKind::Maui,
            profile: &profile,
        };
        let item = MultimediaItem::new("a.svg");

        let svg = extensions.multimedia_handler("image/svg+xml").unwrap();
        assert_eq!(svg.render(&item, &mut ctx).unwrap(), HandlerOutcome::Declined);

        let png = extensions.multimedia_handler("image/png").unwrap();
        assert_eq!(png.render(&item, &mut ctx).unwrap(), HandlerOutcome::Rendered);

        assert!(extensions.multimedia_handler("video/mp4").is_none());
    }

    #[test]
    fn test_image_content_writes_size() {
        let profile = Profile::maui();
        let mut out = TreeWriter::new();
        let mut ctx = HandlerContext {
            out: &mut out,
            alignment: Alignment::Left,
            dialect: DialectKind::Maui,
            profile: &profile,
        };
        let item = MultimediaItem::new("cat.png").with_size(64, 32);
        ImageContent.render(&item, &mut ctx).unwrap();

        let image = out.into_elements().remove(0);
        assert_eq!(image.name, "Image");
        assert_eq!(image.attr("Source"), Some("cat.png"));
        assert_eq!(image.attr("WidthRequest"), Some("64"));
        assert_eq!(image.attr("HeightRequest"), Some("32"));
    }
}
