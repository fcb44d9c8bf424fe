use std::path::Path;
use std::sync::Arc;

use image::RgbaImage;
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{self, fontdb};

use crate::config::{LayoutConfig, TextConfig};
use crate::utils::error::{AppError, Result};
use crate::utils::image_ops::{text_baseline, Layer};

/// Render teks nama ke layer transparan seukuran background.
///
/// Database font dimuat sekali lalu dibagi ke semua request (read-only).
#[derive(Clone)]
pub struct TextRenderer {
    fontdb: Arc<fontdb::Database>,
    font_family: String,
    font_size: u32,
    top_percent: u32,
}

/// Escape karakter yang punya arti di markup XML. Karakter kontrol yang
/// tidak valid di XML 1.0 dibuang.
pub fn escape_markup(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .fold(String::with_capacity(text.len()), |mut out, c| {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                '\'' => out.push_str("&apos;"),
                _ => out.push(c),
            }
            out
        })
}

/// Dokumen SVG untuk layer teks: tengah horizontal, bold, putih.
pub fn text_markup(text: &str, width: u32, height: u32, y: u32, font_family: &str, font_size: u32) -> String {
    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            r#"<text x="{x}" y="{y}" font-family="{family}" font-size="{size}" "#,
            r#"font-weight="bold" fill="white" text-anchor="middle">{text}</text>"#,
            "</svg>"
        ),
        w = width,
        h = height,
        x = f64::from(width) / 2.0,
        y = y,
        family = escape_markup(font_family),
        size = font_size,
        text = escape_markup(text),
    )
}

fn has_family(db: &fontdb::Database, name: &str) -> bool {
    db.faces()
        .any(|face| face.families.iter().any(|(family, _)| family == name))
}

fn first_family(db: &fontdb::Database, ids: &[fontdb::ID]) -> Option<String> {
    ids.iter()
        .filter_map(|id| db.face(*id))
        .find_map(|face| face.families.first().map(|(family, _)| family.clone()))
}

/// Family cadangan bila `sans-serif`/`serif` tidak cocok dengan font mana pun:
/// utamakan family "Sans" non-mono, lalu face pertama.
fn fallback_family(db: &fontdb::Database) -> Option<String> {
    let families = || db.faces().filter_map(|face| face.families.first().map(|(f, _)| f));

    families()
        .find(|f| f.contains("Sans") && !f.contains("Mono"))
        .or_else(|| families().next())
        .cloned()
}

fn load_font_file(db: &mut fontdb::Database, path: &Path) -> Result<Option<String>> {
    let data = std::fs::read(path)
        .map_err(|e| AppError::Config(format!("cannot load font {}: {e}", path.display())))?;
    let ids = db.load_font_source(fontdb::Source::Binary(Arc::new(data)));

    if ids.is_empty() {
        return Err(AppError::Config(format!("no font faces in {}", path.display())));
    }
    Ok(first_family(db, &ids))
}

/// Muat font lalu arahkan family generik ke font yang benar-benar ada.
/// Default fontdb untuk `sans-serif` adalah "Arial", yang sering tidak terpasang.
fn load_fonts(config: &TextConfig) -> Result<fontdb::Database> {
    let mut db = fontdb::Database::new();

    if config.system_fonts {
        db.load_system_fonts();
    }
    let file_family = match &config.font_file {
        Some(path) => load_font_file(&mut db, path)?,
        None => None,
    };

    if db.is_empty() {
        tracing::warn!("no fonts available, card text will not be visible");
        return Ok(db);
    }

    let generic = [fontdb::Family::SansSerif, fontdb::Family::Serif];
    for family in generic {
        let current = db.family_name(&family).to_string();
        let target = match &file_family {
            Some(name) => Some(name.clone()),
            None if has_family(&db, &current) => None,
            None => fallback_family(&db),
        };

        if let Some(name) = target {
            tracing::debug!(generic = ?family, from = %current, to = %name, "remapped generic font family");
            match family {
                fontdb::Family::Serif => db.set_serif_family(name),
                _ => db.set_sans_serif_family(name),
            }
        }
    }

    let configured = fontdb::Family::Name(&config.font_family);
    let resolved = match config.font_family.as_str() {
        "sans-serif" => db.family_name(&fontdb::Family::SansSerif).to_string(),
        "serif" => db.family_name(&fontdb::Family::Serif).to_string(),
        _ => db.family_name(&configured).to_string(),
    };
    if has_family(&db, &resolved) {
        tracing::info!(faces = db.len(), family = %resolved, "loaded font database");
    } else {
        tracing::warn!(
            family = %config.font_family,
            "font family not found in loaded fonts, card text will not be visible"
        );
    }

    Ok(db)
}

// Premultiplied (tiny-skia) → straight alpha (image).
fn pixmap_to_rgba(pixmap: &Pixmap) -> Result<RgbaImage> {
    let raw: Vec<u8> = pixmap
        .pixels()
        .iter()
        .flat_map(|px| {
            let c = px.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();

    RgbaImage::from_raw(pixmap.width(), pixmap.height(), raw)
        .ok_or_else(|| AppError::CompositionFailure("text layer buffer has unexpected size".into()))
}

impl TextRenderer {
    pub fn new(text: &TextConfig, layout: &LayoutConfig) -> Result<Self> {
        Ok(Self {
            fontdb: Arc::new(load_fonts(text)?),
            font_family: text.font_family.clone(),
            font_size: layout.font_size,
            top_percent: layout.text_top_percent,
        })
    }

    pub fn baseline(&self, height: u32) -> u32 {
        text_baseline(height, self.top_percent)
    }

    pub fn markup(&self, text: &str, width: u32, height: u32) -> String {
        text_markup(text, width, height, self.baseline(height), &self.font_family, self.font_size)
    }

    pub fn render(&self, text: &str, width: u32, height: u32) -> Result<Layer> {
        let svg = self.markup(text, width, height);

        let mut options = usvg::Options::default();
        options.fontdb = Arc::clone(&self.fontdb);
        options.font_family = self.font_family.clone();

        let tree = usvg::Tree::from_str(&svg, &options)
            .map_err(|e| AppError::CompositionFailure(format!("failed to parse text layer: {e}")))?;

        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
            AppError::CompositionFailure(format!("cannot allocate {width}x{height} text layer"))
        })?;
        resvg::render(&tree, Transform::identity(), &mut pixmap.as_mut());

        Ok(Layer::new(pixmap_to_rgba(&pixmap)?, 0, 0))
    }
}
