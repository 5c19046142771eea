//! Dataset download and archive extraction.
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use futures::{Stream, StreamExt};
use log::{debug, info, warn};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status} for {url}")]
    Status { url: String, status: StatusCode },

    #[error("Cannot derive a file name from '{0}'")]
    InvalidUrl(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> DownloadError + '_ {
    move |source| DownloadError::Io { path: path.to_path_buf(), source }
}

/// Last non-empty path segment of `url`, without query or fragment.
fn file_name_from_url(url: &str) -> Result<String, DownloadError> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let path = path.split_once("://").map(|(_, rest)| rest).unwrap_or(path);

    match path.split_once('/') {
        Some((_, resource)) => resource
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .map(str::to_string)
            .ok_or_else(|| DownloadError::InvalidUrl(url.to_string())),
        None => Err(DownloadError::InvalidUrl(url.to_string())),
    }
}

/// Stream `url` into `dest_dir/<file name>`, returning the written path.
pub async fn download_file(client: &Client, url: &str, dest_dir: &Path) -> Result<PathBuf, DownloadError> {
    let dest = dest_dir.join(file_name_from_url(url)?);
    fs::create_dir_all(dest_dir).map_err(io_error(dest_dir))?;

    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(DownloadError::Status { url: url.to_string(), status: response.status() });
    }

    let stream = response.bytes_stream().map(|chunk| chunk.map_err(DownloadError::from));
    let written = write_stream(stream, &dest).await?;

    info!("Downloaded {} ({} bytes)", dest.display(), written);
    Ok(dest)
}

/// Write every chunk of `stream` to `dest`. On failure the partial file is removed.
async fn write_stream<S, B>(stream: S, dest: &Path) -> Result<usize, DownloadError>
where
    S: Stream<Item = Result<B, DownloadError>>,
    B: AsRef<[u8]>,
{
    futures::pin_mut!(stream);
    let result = async {
        let mut file = tokio::fs::File::create(dest).await.map_err(io_error(dest))?;
        let mut written = 0usize;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(chunk.as_ref()).await.map_err(io_error(dest))?;
            written += chunk.as_ref().len();
        }
        file.flush().await.map_err(io_error(dest))?;
        Ok::<_, DownloadError>(written)
    }
    .await;

    if result.is_err() {
        if let Err(e) = tokio::fs::remove_file(dest).await {
            warn!("Failed to remove partial download {}: {}", dest.display(), e);
        }
    }
    result
}

/// Extract every entry of `archive` under `dest`. Entries with paths that
/// would land outside `dest` are skipped.
pub fn unzip_archive(archive: &Path, dest: &Path) -> Result<Vec<PathBuf>, DownloadError> {
    let file = File::open(archive).map_err(io_error(archive))?;
    let mut zip = zip::ZipArchive::new(BufReader::new(file))?;
    let mut extracted = Vec::new();

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let Some(relative) = entry.enclosed_name() else {
            warn!("Skipping zip entry with unsafe path: {}", entry.name());
            continue;
        };
        let out_path = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(io_error(&out_path))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }
        let mut out = File::create(&out_path).map_err(io_error(&out_path))?;
        io::copy(&mut entry, &mut out).map_err(io_error(&out_path))?;
        extracted.push(out_path);
    }

    debug!("Extracted {} file(s) from {}", extracted.len(), archive.display());
    Ok(extracted)
}

/// Download `url` into `dest` and unpack it when it is a zip archive.
pub fn download_and_extract(url: &str, dest: &Path) -> Result<PathBuf, DownloadError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(io_error(dest))?;

    let client = Client::new();
    let archive = runtime.block_on(download_file(&client, url, dest))?;

    let is_zip = archive
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
    if is_zip {
        let files = unzip_archive(&archive, dest)?;
        info!("Extracted {} file(s) into {}", files.len(), dest.display());
    }

    Ok(archive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(future)
    }

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, data) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_file_name_from_url() {
        assert_eq!(
            file_name_from_url("https://example.com/datasets/SynthDet.zip?token=abc").unwrap(),
            "SynthDet.zip"
        );
        assert_eq!(file_name_from_url("http://host/a/b/").unwrap(), "b");
        assert!(file_name_from_url("https://example.com").is_err());
        assert!(file_name_from_url("https://example.com/").is_err());
    }

    #[test]
    fn test_unzip_archive() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("dataset.zip");
        write_zip(&archive, &[("Dataset/captures_000.json", b"{}"), ("README.txt", b"hello")]);

        let dest = dir.path().join("out");
        let files = unzip_archive(&archive, &dest).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(fs::read_to_string(dest.join("README.txt")).unwrap(), "hello");
        assert!(dest.join("Dataset").join("captures_000.json").is_file());
    }

    #[test]
    fn test_unzip_skips_escaping_entries() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("evil.zip");
        write_zip(&archive, &[("../escape.txt", b"nope"), ("ok.txt", b"fine")]);

        let dest = dir.path().join("out");
        let files = unzip_archive(&archive, &dest).unwrap();
        assert_eq!(files, vec![dest.join("ok.txt")]);
        assert!(!dir.path().join("escape.txt").exists());
    }

    #[test]
    fn test_unzip_rejects_non_archive() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("bogus.zip");
        fs::write(&bogus, b"not a zip").unwrap();
        assert!(matches!(unzip_archive(&bogus, dir.path()), Err(DownloadError::Zip(_))));
    }

    #[test]
    fn test_write_stream_writes_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("dataset.zip");
        let chunks: Vec<Result<Vec<u8>, DownloadError>> = vec![Ok(b"abc".to_vec()), Ok(b"de".to_vec())];

        let written = block_on(write_stream(futures::stream::iter(chunks), &dest)).unwrap();
        assert_eq!(written, 5);
        assert_eq!(fs::read(&dest).unwrap(), b"abcde");
    }

    #[test]
    fn test_failed_stream_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("dataset.zip");
        let chunks: Vec<Result<Vec<u8>, DownloadError>> = vec![
            Ok(b"partial".to_vec()),
            Err(DownloadError::Io {
                path: dest.clone(),
                source: io::Error::new(io::ErrorKind::ConnectionReset, "connection reset"),
            }),
        ];

        let err = block_on(write_stream(futures::stream::iter(chunks), &dest)).unwrap_err();
        assert!(matches!(err, DownloadError::Io { .. }));
        assert!(!dest.exists());
    }
}
