use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use resvg::{tiny_skia, usvg};
use tracing::info;

use crate::pricing::{Niche, Quote, RightsTier, format_inr};

const WIDTH: u32 = 640;
const HEIGHT: u32 = 420;

/// What goes on the downloadable quote card
pub struct QuotePanel<'a> {
    pub quote: &'a Quote,
    pub niche: &'a str,
    pub rights: &'a str,
    pub handle: &'a str,
}

const SANS: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");
const SANS_BOLD: &[u8] = include_bytes!("../assets/fonts/DejaVuSans-Bold.ttf");
const SANS_FAMILY: &str = "DejaVu Sans";

/// Rasterises quote cards to PNG with the bundled fonts
pub struct QuoteRenderer {
    fonts: Arc<usvg::fontdb::Database>,
}

impl QuoteRenderer {
    pub fn new() -> Self {
        let mut fonts = usvg::fontdb::Database::new();
        fonts.load_font_data(SANS.to_vec());
        fonts.load_font_data(SANS_BOLD.to_vec());
        fonts.set_sans_serif_family(SANS_FAMILY);

        Self {
            fonts: Arc::new(fonts),
        }
    }

    /// File name offered to the browser and used on disk
    pub fn file_name(handle: &str) -> String {
        let safe: String = handle
            .trim_start_matches('@')
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
            .collect();
        format!("CreatorCalc_Quote_{safe}.png")
    }

    pub fn render_png(&self, panel: &QuotePanel) -> Result<Vec<u8>> {
        let svg = generate_svg(panel);

        let options = usvg::Options {
            fontdb: self.fonts.clone(),
            ..usvg::Options::default()
        };
        let tree = usvg::Tree::from_str(&svg, &options)?;

        let size = tree.size().to_int_size();
        let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())
            .ok_or_else(|| anyhow!("quote card has an empty canvas"))?;
        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        Ok(pixmap.encode_png()?)
    }
}

impl Default for QuoteRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes rendered quote cards into an export directory
pub struct QuoteExporter {
    output_dir: PathBuf,
    renderer: QuoteRenderer,
}

impl QuoteExporter {
    pub fn new(output_dir: &str) -> Result<Self> {
        let path = Path::new(output_dir);
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        Ok(Self {
            output_dir: path.to_path_buf(),
            renderer: QuoteRenderer::new(),
        })
    }

    /// Render the card and write it into the export directory
    pub fn export(&self, panel: &QuotePanel) -> Result<PathBuf> {
        let png = self.renderer.render_png(panel)?;
        let path = self
            .output_dir
            .join(QuoteRenderer::file_name(panel.handle));

        fs::write(&path, png).with_context(|| format!("writing {}", path.display()))?;
        info!("Wrote quote card to {}", path.display());

        Ok(path)
    }
}

fn escape_xml(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// SVG source of the quote card
pub fn generate_svg(panel: &QuotePanel) -> String {
    let quote = panel.quote;
    let niche = panel
        .niche
        .parse::<Niche>()
        .map(Niche::label)
        .unwrap_or(panel.niche);
    let rights = panel
        .rights
        .parse::<RightsTier>()
        .map(RightsTier::label)
        .unwrap_or(panel.rights);

    let mut content = String::new();

    content.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}">"#
    ));
    content.push_str(&format!(
        r##"<rect width="{WIDTH}" height="{HEIGHT}" rx="24" fill="#050505"/>"##
    ));
    content.push_str(&format!(
        r##"<rect x="0" y="0" width="{WIDTH}" height="6" fill="#8406f9"/>"##
    ));

    // Header
    content.push_str(r##"<g font-family="sans-serif" fill="#ffffff">"##);
    content.push_str(
        r##"<text x="40" y="60" font-size="22" font-weight="bold">CreatorCalc Quote</text>"##,
    );
    content.push_str(&format!(
        r##"<text x="{}" y="60" font-size="16" fill="#a1a1aa" text-anchor="end">@{}</text>"##,
        WIDTH - 40,
        escape_xml(panel.handle.trim_start_matches('@'))
    ));

    // Headline figure and band
    content.push_str(
        r##"<text x="40" y="110" font-size="14" fill="#a1a1aa">ESTIMATED RATE</text>"##,
    );
    content.push_str(&format!(
        r##"<text x="40" y="165" font-size="52" font-weight="bold">{}</text>"##,
        escape_xml(&format_inr(quote.average))
    ));
    content.push_str(&format!(
        r##"<text x="40" y="200" font-size="16" fill="#c4b5fd">Range {} – {}</text>"##,
        escape_xml(&format_inr(quote.minimum)),
        escape_xml(&format_inr(quote.maximum))
    ));

    // Breakdown
    let rows = [
        ("Niche", escape_xml(niche)),
        ("Usage rights", escape_xml(rights)),
        ("Base rate", escape_xml(&format_inr(quote.base_rate))),
        ("Production fee", escape_xml(&format_inr(quote.production_fee))),
        ("Rights multiplier", format!("×{}", quote.multiplier)),
    ];
    for (i, (label, value)) in rows.iter().enumerate() {
        let y = 250 + i as u32 * 30;
        content.push_str(&format!(
            r##"<text x="40" y="{y}" font-size="15" fill="#a1a1aa">{label}</text>"##
        ));
        content.push_str(&format!(
            r##"<text x="{}" y="{y}" font-size="15" text-anchor="end">{value}</text>"##,
            WIDTH - 40
        ));
    }
    content.push_str("</g></svg>");

    content
}
