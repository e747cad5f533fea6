use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("server returned {status} for {url}")]
    HttpStatus { url: String, status: u16 },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Resolve a model file by name, checking local locations before downloading.
///
/// Resolution order:
/// 1. Explicit models directory (e.g. from a CLI flag)
/// 2. User cache directory (platform-specific)
/// 3. Download from URL to cache
pub fn resolve(
    name: &str,
    url: &str,
    models_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    if let Some(dir) = models_dir {
        let local_path = dir.join(name);
        if local_path.exists() {
            return Ok(local_path);
        }
    }

    let cache_dir = model_cache_dir()?;
    let cached_path = cache_dir.join(name);
    if cached_path.exists() {
        return Ok(cached_path);
    }

    fs::create_dir_all(&cache_dir).map_err(ModelResolveError::CacheDir)?;
    download(url, &cached_path, progress)?;
    Ok(cached_path)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/ProctorLens/models/`
/// - Linux: `$XDG_CACHE_HOME/ProctorLens/models/` or `~/.cache/ProctorLens/models/`
/// - Windows: `%LOCALAPPDATA%/ProctorLens/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join("ProctorLens").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join("ProctorLens").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}

fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let mut response = reqwest::blocking::get(url).map_err(|e| ModelResolveError::Download {
        url: url.to_string(),
        source: e,
    })?;
    if !response.status().is_success() {
        return Err(ModelResolveError::HttpStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    let total = response.content_length().unwrap_or(0);
    let mut downloaded: u64 = 0;

    // Write to a temp file first, then rename for atomicity
    let temp_path = dest.with_extension("part");
    let mut file = fs::File::create(&temp_path).map_err(|e| ModelResolveError::Write {
        path: temp_path.clone(),
        source: e,
    })?;

    // Stream in 1MB chunks; models are large enough that buffering the
    // whole body in memory is wasteful.
    let mut buf = vec![0u8; 1024 * 1024];
    loop {
        let read = response
            .read(&mut buf)
            .map_err(|e| ModelResolveError::Write {
                path: temp_path.clone(),
                source: e,
            })?;
        if read == 0 {
            break;
        }
        file.write_all(&buf[..read])
            .map_err(|e| ModelResolveError::Write {
                path: temp_path.clone(),
                source: e,
            })?;
        downloaded += read as u64;
        if let Some(ref cb) = progress {
            cb(downloaded, total);
        }
    }

    file.flush().map_err(|e| ModelResolveError::Write {
        path: temp_path.clone(),
        source: e,
    })?;
    drop(file);

    fs::rename(&temp_path, dest).map_err(|e| ModelResolveError::Write {
        path: dest.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_prefers_explicit_models_dir() {
        let tmp = TempDir::new().unwrap();
        let models_dir = tmp.path().join("models");
        fs::create_dir_all(&models_dir).unwrap();
        let local_path = models_dir.join("test_model.onnx");
        fs::write(&local_path, b"local model").unwrap();

        let result = resolve(
            "test_model.onnx",
            "http://invalid.nonexistent.example.com/model.onnx",
            Some(&models_dir),
            None,
        );
        assert_eq!(result.unwrap(), local_path);
    }

    #[test]
    fn test_resolve_missing_local_falls_through() {
        let tmp = TempDir::new().unwrap();
        let models_dir = tmp.path().join("models");
        fs::create_dir_all(&models_dir).unwrap();

        // The model is absent from the explicit dir, so resolution moves on
        // to the cache and then the download. The name is unique to this
        // test, so the cache misses and the unreachable URL fails the
        // download; either way the explicit dir must not be the answer.
        let result = resolve(
            "resolver_fallthrough_never_cached.onnx",
            "http://invalid.nonexistent.example.com/model.onnx",
            Some(&models_dir),
            None,
        );
        match result {
            Ok(path) => assert!(!path.starts_with(&models_dir)),
            Err(e) => assert!(matches!(
                e,
                ModelResolveError::Download { .. } | ModelResolveError::NoCacheDir
            )),
        }
    }

    #[test]
    fn test_model_cache_dir_returns_path() {
        let dir = model_cache_dir();
        assert!(dir.is_ok());
        let path = dir.unwrap();
        assert!(path.to_string_lossy().contains("ProctorLens"));
        assert!(path.to_string_lossy().contains("models"));
    }

    #[test]
    fn test_download_to_file() {
        // Skip in CI — requires network access
        if std::env::var("CI").is_ok() {
            return;
        }
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("robots.txt");

        let progress_called = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = progress_called.clone();

        let result = download(
            "https://www.google.com/robots.txt",
            &dest,
            Some(Box::new(move |_downloaded, _total| {
                flag.store(true, std::sync::atomic::Ordering::Relaxed);
            })),
        );
        assert!(result.is_ok(), "download failed: {:?}", result.err());
        assert!(dest.exists());
        assert!(!fs::read(&dest).unwrap().is_empty());
        assert!(progress_called.load(std::sync::atomic::Ordering::Relaxed));
    }

    #[test]
    fn test_download_invalid_url_returns_error() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("model.onnx");
        let result = download("http://invalid.nonexistent.example.com/model", &dest, None);
        assert!(result.is_err());
    }

    #[test]
    fn test_download_atomic_no_partial_on_failure() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("model.onnx");
        let _ = download("http://invalid.nonexistent.example.com/model", &dest, None);
        // Neither the dest nor the .part file should exist after failure
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }
}
