//! # Rename Normalizer
//!
//! Optional phase (`--rename-seo`) that gives every image a web-safe name.
//!
//! ## Normalizzazione:
//! 1. NFKD + rimozione dei segni diacritici (`ñ` → `n`)
//! 2. Solo `[0-9A-Za-z]`, spazi, `-` e `_` sopravvivono
//! 3. Spazi/underscore → `-`, minuscolo, `-` ripetuti collassati e rimossi ai bordi
//! 4. Nome vuoto → `image-<unix millis>`
//! 5. Estensione in minuscolo
//!
//! ## Collisioni:
//! Se la destinazione esiste ed è un file diverso si prova `<base>-1<ext>`,
//! `<base>-2<ext>`, ... fino a 1000 tentativi. Lo spostamento non sovrascrive
//! mai. Il twin `<stem>.webp` segue il file rinominato; un errore sul twin
//! viene solo loggato.

use crate::error::OptimizeError;
use crate::file_manager::{display_name, AssetPath};
use crate::optimizer::path_resolver::{PathResolver, ALTERNATE_EXTENSION};
use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

const MAX_COLLISION_ATTEMPTS: u32 = 1000;

/// Web-safe version of a file name, extension lower-cased
pub fn normalize_name(file_name: &str) -> String {
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default();

    format!("{}{}", slugify(&stem), ext)
}

fn slugify(stem: &str) -> String {
    let kept: String = stem
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || *c == '-' || *c == '_')
        .collect();

    let mut slug = String::with_capacity(kept.len());
    let mut prev_dash = false;
    for c in kept.trim().chars() {
        if c.is_whitespace() || c == '_' || c == '-' {
            if !prev_dash {
                slug.push('-');
            }
            prev_dash = true;
        } else {
            slug.push(c.to_ascii_lowercase());
            prev_dash = false;
        }
    }

    let trimmed = slug.trim_matches('-');
    if trimmed.is_empty() {
        format!("image-{}", Utc::now().timestamp_millis())
    } else {
        trimmed.to_string()
    }
}

/// A planned move
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenamePlan {
    pub from: PathBuf,
    pub to: PathBuf,
}

fn same_path_ignoring_case(a: &Path, b: &Path) -> bool {
    a.to_string_lossy().to_lowercase() == b.to_string_lossy().to_lowercase()
}

/// Pick a free destination for `normalized` in `dir`, appending `-1`, `-2`, ...
pub fn resolve_destination(
    dir: &Path,
    normalized: &str,
    source: &Path,
) -> Result<PathBuf, OptimizeError> {
    let first = dir.join(normalized);
    if !first.exists() || same_path_ignoring_case(&first, source) {
        return Ok(first);
    }

    let as_path = Path::new(normalized);
    let base = as_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = as_path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    for i in 1..=MAX_COLLISION_ATTEMPTS {
        let candidate = dir.join(format!("{base}-{i}{ext}"));
        if !candidate.exists() {
            return Ok(candidate);
        }
    }

    Err(OptimizeError::CollisionLimit(normalized.to_string()))
}

/// Compute the move for one file, `None` when its name is already normalized
pub fn plan_rename(path: &Path) -> Result<Option<RenamePlan>, OptimizeError> {
    let name = display_name(path);
    let normalized = normalize_name(&name);
    if normalized.eq_ignore_ascii_case(&name) {
        return Ok(None);
    }

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let to = resolve_destination(dir, &normalized, path)?;
    if same_path_ignoring_case(&to, path) {
        return Ok(None);
    }

    Ok(Some(RenamePlan {
        from: path.to_path_buf(),
        to,
    }))
}

/// Move without overwriting an existing file
async fn move_no_overwrite(from: &Path, to: &Path) -> std::io::Result<()> {
    if tokio::fs::try_exists(to).await? {
        return Err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("destination exists: {}", to.display()),
        ));
    }
    tokio::fs::rename(from, to).await
}

/// Outcome of the rename phase
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenameReport {
    pub renamed: Vec<RenamePlan>,
    pub missing: usize,
    pub errors: Vec<(PathBuf, String)>,
}

pub struct RenameNormalizer;

impl RenameNormalizer {
    /// Rename every file in order. Errors are recorded per file; nothing is rolled back.
    pub async fn rename_all(files: &[AssetPath]) -> RenameReport {
        let mut report = RenameReport::default();
        info!("Normalizing names of {} files", files.len());

        for file in files {
            if !tokio::fs::try_exists(&file.path).await.unwrap_or(false) {
                warn!("File no longer exists, skipping: {}", file.path.display());
                report.missing += 1;
                continue;
            }

            match Self::rename_one(&file.path).await {
                Ok(Some(plan)) => {
                    info!(
                        "  {} -> {}",
                        display_name(&plan.from),
                        display_name(&plan.to)
                    );
                    report.renamed.push(plan);
                }
                Ok(None) => {}
                Err(e) => {
                    error!("Rename failed for {}: {}", display_name(&file.path), e);
                    report.errors.push((file.path.clone(), e.to_string()));
                }
            }
        }

        if report.errors.is_empty() {
            info!("Rename complete: {} files", report.renamed.len());
        } else {
            warn!(
                "Rename complete with errors: {} ok, {} failed",
                report.renamed.len(),
                report.errors.len()
            );
        }
        report
    }

    async fn rename_one(path: &Path) -> Result<Option<RenamePlan>, OptimizeError> {
        let Some(plan) = plan_rename(path)? else {
            return Ok(None);
        };
        move_no_overwrite(&plan.from, &plan.to).await?;

        if let Some(old_twin) = PathResolver::alternate_path(&plan.from) {
            if tokio::fs::try_exists(&old_twin).await.unwrap_or(false) {
                let new_twin = plan.to.with_extension(ALTERNATE_EXTENSION);
                if let Err(e) = move_no_overwrite(&old_twin, &new_twin).await {
                    warn!("Could not move WebP twin {}: {}", old_twin.display(), e);
                }
            }
        }

        Ok(Some(plan))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn is_slug_shaped(name: &str) -> bool {
        let Some((base, ext)) = name.rsplit_once('.') else {
            return false;
        };
        let base_ok = !base.is_empty()
            && !base.starts_with('-')
            && !base.ends_with('-')
            && !base.contains("--")
            && base
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        let ext_ok = !ext.is_empty()
            && ext
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
        base_ok && ext_ok
    }

    #[test]
    fn test_normalize_examples() {
        assert_eq!(normalize_name("Mi Foto (2023).JPG"), "mi-foto-2023.jpg");
        assert_eq!(normalize_name("Diseño_web__final.png"), "diseno-web-final.png");
        assert_eq!(normalize_name("  --Hello   World--.WebP"), "hello-world.webp");
        assert_eq!(normalize_name("café crème.jpeg"), "cafe-creme.jpeg");
    }

    #[test]
    fn test_normalize_empty_falls_back_to_timestamp() {
        let name = normalize_name("(((日本))).png");
        assert!(name.starts_with("image-"));
        assert!(name.ends_with(".png"));
        assert!(is_slug_shaped(&name));
    }

    #[test]
    fn test_normalize_idempotent_and_shaped() {
        let inputs = [
            "Mi Foto (2023).JPG",
            "Diseño_web__final.png",
            "ÁÉÍÓÚ ñ ü.tif",
            "a.b.c.jpg",
            "hero_banner-- v2 .PNG",
            "über-straße.jpeg",
            "already-fine.webp",
        ];
        for input in inputs {
            let once = normalize_name(input);
            assert_eq!(normalize_name(&once), once, "not idempotent for {input}");
            assert!(is_slug_shaped(&once), "bad shape {once} for {input}");
        }
    }

    #[test]
    fn test_plan_skips_normalized_names() {
        assert_eq!(plan_rename(Path::new("/nope/hero.jpg")).unwrap(), None);
        assert_eq!(plan_rename(Path::new("/nope/hero.JPG")).unwrap(), None);
    }

    #[tokio::test]
    async fn test_rename_with_collision_and_twin() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("Mi Foto (2023).JPG"), b"photo").unwrap();
        fs::write(dir.join("Mi Foto (2023).webp"), b"twin").unwrap();
        fs::write(dir.join("mi-foto-2023.jpg"), b"taken").unwrap();

        let files = vec![AssetPath::new(dir.join("Mi Foto (2023).JPG"))];
        let report = RenameNormalizer::rename_all(&files).await;

        assert!(report.errors.is_empty());
        assert_eq!(report.renamed.len(), 1);
        assert_eq!(report.renamed[0].to, dir.join("mi-foto-2023-1.jpg"));
        assert_eq!(fs::read(dir.join("mi-foto-2023-1.jpg")).unwrap(), b"photo");
        assert_eq!(fs::read(dir.join("mi-foto-2023-1.webp")).unwrap(), b"twin");
        assert_eq!(fs::read(dir.join("mi-foto-2023.jpg")).unwrap(), b"taken");
        assert!(!dir.join("Mi Foto (2023).JPG").exists());
    }

    #[tokio::test]
    async fn test_rename_without_collision() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("Mi Foto (2023).JPG"), b"photo").unwrap();

        let files = vec![AssetPath::new(dir.join("Mi Foto (2023).JPG"))];
        let report = RenameNormalizer::rename_all(&files).await;

        assert_eq!(report.renamed[0].to, dir.join("mi-foto-2023.jpg"));
        assert!(dir.join("mi-foto-2023.jpg").exists());
    }

    #[tokio::test]
    async fn test_rename_skips_missing_files() {
        let temp_dir = TempDir::new().unwrap();
        let files = vec![AssetPath::new(temp_dir.path().join("Gone File.png"))];
        let report = RenameNormalizer::rename_all(&files).await;
        assert_eq!(report.missing, 1);
        assert!(report.renamed.is_empty());
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_collision_limit() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("a.png"), b"").unwrap();
        for i in 1..=MAX_COLLISION_ATTEMPTS {
            fs::write(dir.join(format!("a-{i}.png")), b"").unwrap();
        }
        let err = resolve_destination(dir, "a.png", &dir.join("A B.png")).unwrap_err();
        assert!(matches!(err, OptimizeError::CollisionLimit(_)));
    }
}
