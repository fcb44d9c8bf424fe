use std::fs;
use std::path::{Path, PathBuf};

use rand::Rng;

use crate::config::AssetConfig;
use crate::utils::error::{AppError, Result};

const IMAGE_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];

/// Sumber indeks acak; diinjeksi agar pemilihan background bisa diuji.
pub trait Picker: Send + Sync {
    /// Kembalikan indeks dalam `0..len`. `len` selalu > 0.
    fn pick(&self, len: usize) -> usize;
}

/// Pemilihan seragam memakai RNG thread-local.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngPicker;

impl Picker for ThreadRngPicker {
    fn pick(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Background yang terpilih untuk satu request.
#[derive(Debug, Clone)]
pub struct SelectedAsset {
    pub dir_label: String,
    pub file_name: String,
    pub path: PathBuf,
}

/// Akses read-only ke direktori aset (background & logo).
#[derive(Debug, Clone)]
pub struct AssetLibrary {
    root: PathBuf,
    member_dir: String,
    other_dir: String,
    logo: PathBuf,
}

/* =========================================================
   SINGLE-PURPOSE HELPERS (fungsi tunggal)
   ========================================================= */

/// Cocokkan ekstensi gambar tanpa peduli huruf besar/kecil.
pub fn is_image_file(name: &str) -> bool {
    let lower = name.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Daftar nama file gambar di `dir`, terurut.
fn list_candidates(dir: &Path, label: &str) -> Result<Vec<String>> {
    let entries = fs::read_dir(dir).map_err(|source| AppError::DirectoryNotFound {
        dir: label.to_string(),
        source,
    })?;

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| !t.is_dir()).unwrap_or(false))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| is_image_file(name))
        .collect();

    names.sort();
    Ok(names)
}

/// Pastikan file masih bisa dibuka (bisa hilang setelah listing).
fn ensure_readable(path: &Path, file_name: &str) -> Result<()> {
    fs::File::open(path)
        .map(|_| ())
        .map_err(|_| AppError::AssetMissing {
            file: file_name.to_string(),
        })
}

/* =========================================================
   ORCHESTRATOR
   ========================================================= */

impl AssetLibrary {
    pub fn new(config: &AssetConfig) -> Self {
        Self {
            root: config.root.clone(),
            member_dir: config.member_dir.clone(),
            other_dir: config.other_dir.clone(),
            logo: config.logo.clone(),
        }
    }

    /// Nama direktori background untuk flag keanggotaan.
    pub fn dir_label(&self, is_member: bool) -> &str {
        if is_member {
            &self.member_dir
        } else {
            &self.other_dir
        }
    }

    pub fn dir_path(&self, is_member: bool) -> PathBuf {
        self.root.join(self.dir_label(is_member))
    }

    pub fn logo_path(&self) -> PathBuf {
        self.root.join(&self.logo)
    }

    pub fn candidates(&self, is_member: bool) -> Result<Vec<String>> {
        list_candidates(&self.dir_path(is_member), self.dir_label(is_member))
    }

    /// Pilih satu background secara acak.
    ///
    /// Alur:
    /// 1) `candidates(...)` → list & filter direktori
    /// 2) `picker.pick(...)` → pilih satu nama file
    /// 3) `ensure_readable(...)` → cek ulang file sebelum di-decode
    pub fn pick_background(&self, is_member: bool, picker: &dyn Picker) -> Result<SelectedAsset> {
        let label = self.dir_label(is_member).to_string();
        let names = self.candidates(is_member)?;
        tracing::debug!(dir = %label, files = ?names, "listed background candidates");

        if names.is_empty() {
            return Err(AppError::NoAssetsFound { dir: label });
        }

        let index = picker.pick(names.len());
        debug_assert!(index < names.len(), "picker returned {index} for {} candidates", names.len());
        let file_name = names.get(index).cloned().ok_or_else(|| {
            AppError::CompositionFailure(format!("picker returned {index} for {} candidates", names.len()))
        })?;
        let path = self.dir_path(is_member).join(&file_name);

        ensure_readable(&path, &file_name)?;
        tracing::info!(dir = %label, file = %file_name, "selected background");

        Ok(SelectedAsset {
            dir_label: label,
            file_name,
            path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct FixedPicker(usize);

    impl Picker for FixedPicker {
        fn pick(&self, _len: usize) -> usize {
            self.0
        }
    }

    fn library(root: &Path) -> AssetLibrary {
        AssetLibrary::new(&AssetConfig {
            root: root.to_path_buf(),
            ..AssetConfig::default()
        })
    }

    fn touch(dir: &Path, name: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(name), b"x").unwrap();
    }

    #[test]
    fn is_image_file_ignores_case() {
        assert!(is_image_file("bg.PNG"));
        assert!(is_image_file("photo.Jpeg"));
        assert!(is_image_file("a.jpg"));
        assert!(!is_image_file("notes.txt"));
        assert!(!is_image_file("png"));
        assert!(!is_image_file("image.gif"));
    }

    #[test]
    fn membership_selects_directory() {
        let lib = library(Path::new("/assets"));
        assert_eq!(lib.dir_label(true), "ai");
        assert_eq!(lib.dir_label(false), "others");
        assert_eq!(lib.dir_path(true), PathBuf::from("/assets/ai"));
        assert_eq!(lib.logo_path(), PathBuf::from("/assets/bg/logo.png"));
    }

    #[test]
    fn candidates_are_filtered_and_sorted() {
        let tmp = TempDir::new().unwrap();
        let ai = tmp.path().join("ai");
        for name in ["b.png", "a.JPG", "readme.md", "c.jpeg"] {
            touch(&ai, name);
        }
        fs::create_dir_all(ai.join("nested.png")).unwrap();

        let names = library(tmp.path()).candidates(true).unwrap();

        assert_eq!(names, vec!["a.JPG", "b.png", "c.jpeg"]);
    }

    #[test]
    fn missing_directory_is_reported_by_label() {
        let tmp = TempDir::new().unwrap();
        let err = library(tmp.path()).candidates(false).unwrap_err();
        assert!(matches!(err, AppError::DirectoryNotFound { ref dir, .. } if dir == "others"));
    }

    #[test]
    fn empty_directory_has_no_assets() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("others"), "notes.txt");

        let err = library(tmp.path())
            .pick_background(false, &FixedPicker(0))
            .unwrap_err();

        assert!(matches!(err, AppError::NoAssetsFound { ref dir } if dir == "others"));
    }

    #[test]
    fn picker_decides_which_file_is_used() {
        let tmp = TempDir::new().unwrap();
        let ai = tmp.path().join("ai");
        for name in ["one.png", "two.png", "three.png"] {
            touch(&ai, name);
        }
        let lib = library(tmp.path());

        let first = lib.pick_background(true, &FixedPicker(0)).unwrap();
        let last = lib.pick_background(true, &FixedPicker(2)).unwrap();

        assert_eq!(first.file_name, "one.png");
        assert_eq!(last.file_name, "two.png");
        assert_eq!(last.path, ai.join("two.png"));
        assert_eq!(last.dir_label, "ai");
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "picker returned 42 for 1 candidates")]
    fn out_of_range_pick_is_rejected() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("ai"), "only.png");

        let _ = library(tmp.path()).pick_background(true, &FixedPicker(42));
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn out_of_range_pick_is_rejected() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("ai"), "only.png");

        let err = library(tmp.path())
            .pick_background(true, &FixedPicker(42))
            .unwrap_err();

        assert!(matches!(err, AppError::CompositionFailure(_)));
    }

    #[test]
    fn thread_rng_picker_stays_in_range() {
        let picker = ThreadRngPicker;
        assert!((0..100).all(|_| picker.pick(3) < 3));
        assert_eq!(picker.pick(1), 0);
    }

    #[test]
    fn unreadable_selection_is_asset_missing() {
        let tmp = TempDir::new().unwrap();
        let err = ensure_readable(&tmp.path().join("gone.png"), "gone.png").unwrap_err();
        assert!(matches!(err, AppError::AssetMissing { ref file } if file == "gone.png"));
    }
}
