use super::geometry::Size;
use crate::config::TextMetrics;
use crate::model::NodeType;

/// Pixel dimensions of a key image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageDimensions {
    pub width: f64,
    pub height: f64,
}

impl TextMetrics {
    /// Horizontal or vertical space taken by padding and border on both sides
    pub fn chrome(&self) -> f64 {
        2.0 * (self.padding + self.border)
    }

    fn text_width(&self, text: &str, font_size: f64) -> f64 {
        text.chars().count() as f64 * self.average_char_width * font_size
    }

    /// Size of a text-only node card: a wrapped title over a one-line subtitle.
    pub fn measure(&self, title: &str, subtitle: &str) -> Size {
        let title = if title.is_empty() { "..." } else { title };
        let title_width = self.text_width(title, self.title_font_size);
        let subtitle_width = self.text_width(subtitle, self.subtitle_font_size);

        let content = (title_width + 2.0 * self.title_margin).max(subtitle_width);
        let w = (content + self.chrome()).clamp(self.min_width, self.max_width);

        let line_room = (w - self.chrome() - 2.0 * self.title_margin).max(1.0);
        let title_lines = (title_width / line_room).ceil().max(1.0);

        let mut h = self.chrome()
            + 2.0 * self.title_margin
            + title_lines * self.title_font_size * self.title_line_height;
        if !subtitle.is_empty() {
            h += self.subtitle_font_size * self.subtitle_line_height;
        }
        Size::new(w, h)
    }
}

/// Size a node shape for `title`.
///
/// A key image is laid out above the text when the node type enables key
/// images. It is scaled to the text width, capped at `max_image_height`,
/// and may widen the card when the cap is reached.
pub fn node_size(
    metrics: &TextMetrics,
    title: &str,
    node_type: Option<&NodeType>,
    image: Option<ImageDimensions>,
) -> Size {
    let subtitle = node_type.map(|nt| nt.label.as_str()).unwrap_or_default();
    let text = metrics.measure(title, subtitle);

    let (Some(image), Some(true)) = (image, node_type.map(|nt| nt.key_image)) else {
        return text;
    };
    if image.width <= 0.0 || image.height <= 0.0 {
        log::warn!("Ignoring key image with dimensions {:?}", image);
        return text;
    }

    let aspect_ratio = image.width / image.height;
    let base_padding = metrics.chrome();
    let image_height = ((text.w + base_padding) / aspect_ratio).min(metrics.max_image_height);

    let mut w = text.w;
    if image_height >= metrics.max_image_height {
        let min_width_for_image = metrics.max_image_height * aspect_ratio + base_padding;
        if min_width_for_image > w {
            w = min_width_for_image;
        }
    }

    Size::new(w, base_padding + image_height + metrics.image_gap + text.h)
}
