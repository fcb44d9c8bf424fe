use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, ImageReader, RgbaImage};

use crate::config::{AppConfig, LayoutConfig};
use crate::services::assets::{AssetLibrary, Picker, ThreadRngPicker};
use crate::services::text_layer::TextRenderer;
use crate::utils::error::{AppError, Result};
use crate::utils::image_ops::{centered_left, encode_png, flatten, resize_to_width, Layer};

/// Input satu request kartu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRequest {
    pub display_name: String,
    pub is_member: bool,
}

/// Urutan layer di atas background: teks selalu ada, logo opsional (paling atas).
#[derive(Debug, Clone)]
pub struct CompositionPlan {
    pub text: Layer,
    pub logo: Option<Layer>,
}

impl CompositionPlan {
    pub fn layers(&self) -> Vec<Layer> {
        std::iter::once(self.text.clone())
            .chain(self.logo.clone())
            .collect()
    }
}

pub struct CardComposer {
    assets: AssetLibrary,
    text: TextRenderer,
    layout: LayoutConfig,
    picker: Arc<dyn Picker>,
}

/* =========================================================
   SINGLE-PURPOSE HELPERS (fungsi tunggal)
   ========================================================= */

/// Baca header saja untuk mendapatkan ukuran gambar.
fn read_dimensions(path: &Path) -> Result<(u32, u32)> {
    let (width, height) = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| AppError::InvalidImage(format!("cannot open background: {e}")))?
        .into_dimensions()
        .map_err(|e| AppError::InvalidImage(format!("Invalid image metadata: {e}")))?;

    if width == 0 || height == 0 {
        return Err(AppError::InvalidImage(
            "Invalid image metadata: missing width or height".to_string(),
        ));
    }

    Ok((width, height))
}

fn decode_background(path: &Path) -> Result<RgbaImage> {
    ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| AppError::InvalidImage(format!("cannot open background: {e}")))?
        .decode()
        .map(|img| img.to_rgba8())
        .map_err(|e| AppError::InvalidImage(format!("cannot decode background: {e}")))
}

fn load_logo(path: &Path) -> Result<DynamicImage> {
    ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| AppError::LogoUnavailable(format!("{}: {e}", path.display())))?
        .decode()
        .map_err(|e| AppError::LogoUnavailable(format!("{}: {e}", path.display())))
}

/* =========================================================
   ORCHESTRATOR
   ========================================================= */

impl CardComposer {
    pub fn new(config: &AppConfig) -> Result<Self> {
        Self::with_picker(config, Arc::new(ThreadRngPicker))
    }

    pub fn with_picker(config: &AppConfig, picker: Arc<dyn Picker>) -> Result<Self> {
        Ok(Self {
            assets: AssetLibrary::new(&config.assets),
            text: TextRenderer::new(&config.text, &config.layout)?,
            layout: config.layout.clone(),
            picker,
        })
    }

    pub fn assets(&self) -> &AssetLibrary {
        &self.assets
    }

    /// Logo member: lebar tetap, tengah horizontal, offset atas tetap.
    pub fn logo_layer(&self, background_width: u32) -> Result<Layer> {
        let logo = load_logo(&self.assets.logo_path())?;
        let resized = resize_to_width(&logo, self.layout.logo_width);
        let left = centered_left(background_width, resized.width());

        Ok(Layer::new(resized, left, i64::from(self.layout.logo_top)))
    }

    /// Susun layer untuk background berukuran `width x height`.
    /// Kegagalan logo hanya di-log; kartu tetap dibuat tanpa logo.
    pub fn plan(&self, request: &CardRequest, width: u32, height: u32) -> Result<CompositionPlan> {
        let text = self.text.render(&request.display_name, width, height)?;

        let logo = if request.is_member {
            match self.logo_layer(width) {
                Ok(layer) => {
                    tracing::debug!(left = layer.left, top = layer.top, "logo added to composite layers");
                    Some(layer)
                }
                Err(e) => {
                    tracing::warn!(error = %e, details = ?e.details(), "continuing without logo overlay");
                    None
                }
            }
        } else {
            None
        };

        Ok(CompositionPlan { text, logo })
    }

    /// Membuat kartu PNG untuk satu request.
    ///
    /// Memanggil:
    /// 1) `AssetLibrary::pick_background(...)` → pilih & cek file background
    /// 2) `read_dimensions(...)` → ukuran dari header, gagal sebelum compositing
    /// 3) `plan(...)` → layer teks + logo (opsional)
    /// 4) `flatten(...)` + `encode_png(...)` → raster akhir dalam bytes PNG
    pub fn compose(&self, request: &CardRequest) -> Result<Vec<u8>> {
        tracing::info!(user = %request.display_name, member = request.is_member, "starting card generation");

        let selected = self.assets.pick_background(request.is_member, self.picker.as_ref())?;

        let (width, height) = read_dimensions(&selected.path)?;
        tracing::debug!(width, height, file = %selected.file_name, "background metadata");

        let background = decode_background(&selected.path)?;
        let plan = self.plan(request, width, height)?;

        let card = flatten(background, &plan.layers());
        let png = encode_png(&card).map_err(|e| AppError::CompositionFailure(e.to_string()))?;

        tracing::info!(bytes = png.len(), "card composition completed");
        Ok(png)
    }
}
