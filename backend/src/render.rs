use std::{env, path::Path, path::PathBuf};

use card_backend::utils::error::AppError;
use card_backend::utils::logger;
use card_backend::{AppConfig, CardComposer, CardRequest};

const USAGE: &str = "Usage: render_card <asset_root> <user_name> <member|other> <output_path>";

/* =========================================================
   SINGLE-PURPOSE HELPERS (fungsi tunggal)
   ========================================================= */

#[derive(Debug, PartialEq, Eq)]
struct RenderArgs {
    asset_root: PathBuf,
    request: CardRequest,
    output: PathBuf,
}

fn parse_membership(flag: &str) -> Result<bool, AppError> {
    match flag {
        "member" => Ok(true),
        "other" => Ok(false),
        _ => Err(AppError::BadRequest {
            message: format!("Unknown membership '{flag}'"),
            details: Some(USAGE.to_string()),
        }),
    }
}

/// Parse argumen CLI:
/// render_card <asset_root> <user_name> <member|other> <output_path>
fn parse_args(args: Vec<String>) -> Result<RenderArgs, AppError> {
    match args.as_slice() {
        [_bin, root, name, membership, output] if !name.is_empty() => Ok(RenderArgs {
            asset_root: PathBuf::from(root),
            request: CardRequest {
                display_name: name.clone(),
                is_member: parse_membership(membership)?,
            },
            output: PathBuf::from(output),
        }),
        _ => Err(AppError::BadRequest {
            message: USAGE.to_string(),
            details: None,
        }),
    }
}

/// Pastikan folder output tersedia sebelum menyimpan file
fn ensure_parent_dir(path: &Path) -> Result<(), AppError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)
            .map_err(|e| AppError::CompositionFailure(format!("cannot create {}: {e}", parent.display()))),
        _ => Ok(()),
    }
}

/* =========================================================
   ORCHESTRATOR
   ========================================================= */

/// Render satu kartu ke file.
///
/// Memanggil:
/// 1) `parse_args(...)` → validasi argumen
/// 2) `CardComposer::compose(...)` → kartu PNG (bytes)
/// 3) `ensure_parent_dir(...)` → buat folder output jika belum ada
fn run() -> Result<PathBuf, AppError> {
    let args = parse_args(env::args().collect())?;

    let mut config = AppConfig::default();
    config.assets.root = args.asset_root;
    config.validate()?;

    let png = CardComposer::new(&config)?.compose(&args.request)?;

    ensure_parent_dir(&args.output)?;
    std::fs::write(&args.output, png).map_err(|e| {
        AppError::CompositionFailure(format!("cannot write {}: {e}", args.output.display()))
    })?;

    Ok(args.output)
}

/* =========================================================
   ENTRYPOINT
   ========================================================= */

fn main() {
    logger::init_logger(false);

    match run() {
        Ok(path) => println!("{}", path.display()),
        Err(e) => {
            match e.details() {
                Some(details) => eprintln!("{e}: {details}"),
                None => eprintln!("{e}"),
            }
            std::process::exit(1);
        }
    }
}
