//! Filesystem storage for images attached to posts.
//!
//! The content store only keeps the relative reference (`posts/<name>`);
//! the bytes live under `<root>/posts/`.

use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use mime_guess::mime;
use sha2::{Digest, Sha256};
use slug::slugify;
use thiserror::Error;
use tokio::{
    fs,
    io::{AsyncWrite, AsyncWriteExt},
};
use tracing::{info, warn};
use uuid::Uuid;

const POSTS_DIRECTORY: &str = "posts";
const SUFFIX_LEN: usize = 7;
const MAX_NAME_ATTEMPTS: usize = 8;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("invalid stored path")]
    InvalidPath,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("uploaded file is empty")]
    EmptyPayload,
    #[error("`{name}` does not have an image file extension")]
    UnsupportedType { name: String },
    #[error("`{name}` is not a readable image")]
    NotAnImage { name: String },
    #[error("could not find a free file name for `{name}`")]
    NameExhausted { name: String },
}

/// Result of storing an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMedia {
    /// Value to keep in `PostRecord::image`.
    pub reference: String,
    pub checksum: String,
    pub size_bytes: u64,
    pub width: usize,
    pub height: usize,
}

#[derive(Debug)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    /// Initialise storage rooted at the provided directory, creating it if necessary.
    pub fn new(root: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(root.join(POSTS_DIRECTORY))?;
        Ok(Self { root })
    }

    /// Validate and store an image, returning its reference and checksum.
    ///
    /// An existing file with the same name is never overwritten; the new file
    /// gets a short random suffix instead.
    pub async fn store(&self, original_name: &str, data: Bytes) -> Result<StoredMedia, MediaError> {
        if data.is_empty() {
            return Err(MediaError::EmptyPayload);
        }

        let is_image = mime_guess::from_path(original_name)
            .iter()
            .any(|guess| guess.type_() == mime::IMAGE);
        if !is_image {
            return Err(MediaError::UnsupportedType {
                name: original_name.to_string(),
            });
        }

        let dimensions = imagesize::blob_size(&data).map_err(|_| MediaError::NotAnImage {
            name: original_name.to_string(),
        })?;

        let (stem, extension) = sanitize_filename(original_name);
        let (reference, absolute, file) = self.create_unique(&stem, &extension).await?;
        write_or_discard(file, &data, &absolute).await?;

        let checksum = hex::encode(Sha256::digest(&data));
        info!(
            target = "infra::media::store",
            reference = %reference,
            size_bytes = data.len(),
            "image stored"
        );

        Ok(StoredMedia {
            reference,
            checksum,
            size_bytes: data.len() as u64,
            width: dimensions.width,
            height: dimensions.height,
        })
    }

    pub async fn read(&self, reference: &str) -> Result<Bytes, MediaError> {
        let absolute = self.resolve(reference)?;
        let data = fs::read(absolute).await?;
        Ok(Bytes::from(data))
    }

    /// Remove the stored image. Missing files are treated as success.
    pub async fn delete(&self, reference: &str) -> Result<(), MediaError> {
        let absolute = self.resolve(reference)?;
        match fs::remove_file(&absolute).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(MediaError::Io(err)),
        }
    }

    fn resolve(&self, reference: &str) -> Result<PathBuf, MediaError> {
        let relative = Path::new(reference);
        if relative.is_absolute()
            || relative
                .components()
                .any(|component| matches!(component, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(MediaError::InvalidPath);
        }

        Ok(self.root.join(relative))
    }

    async fn create_unique(
        &self,
        stem: &str,
        extension: &str,
    ) -> Result<(String, PathBuf, fs::File), MediaError> {
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = if attempt == 0 {
                format!("{stem}.{extension}")
            } else {
                let suffix = Uuid::new_v4().simple().to_string();
                format!("{stem}_{}.{extension}", &suffix[..SUFFIX_LEN])
            };
            let reference = format!("{POSTS_DIRECTORY}/{name}");
            let absolute = self.resolve(&reference)?;

            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&absolute)
                .await
            {
                Ok(file) => return Ok((reference, absolute, file)),
                Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(err) => return Err(MediaError::Io(err)),
            }
        }

        Err(MediaError::NameExhausted {
            name: format!("{stem}.{extension}"),
        })
    }
}

/// Write the whole payload, removing the partially written file on failure.
async fn write_or_discard<W>(mut file: W, data: &[u8], absolute: &Path) -> Result<(), MediaError>
where
    W: AsyncWrite + Unpin,
{
    let written = match file.write_all(data).await {
        Ok(()) => file.flush().await,
        Err(err) => Err(err),
    };
    if let Err(err) = written {
        drop(file);
        if let Err(cleanup) = fs::remove_file(absolute).await {
            warn!(
                target = "infra::media::store",
                path = %absolute.display(),
                error = %cleanup,
                "failed to remove partial image"
            );
        }
        return Err(MediaError::Io(err));
    }
    Ok(())
}

/// Split an uploaded name into a slugified stem and a lowercase extension.
fn sanitize_filename(original: &str) -> (String, String) {
    let path = Path::new(original);
    let stem = path
        .file_stem()
        .and_then(|value| value.to_str())
        .map(slugify)
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "image".to_string());

    let extension = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.trim_matches('.').to_ascii_lowercase())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "bin".to_string());

    (stem, extension)
}

#[cfg(test)]
mod tests {
    use std::{
        io,
        pin::Pin,
        task::{Context, Poll},
    };

    use super::*;

    struct BrokenDisk;

    impl AsyncWrite for BrokenDisk {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::Error::other("disk full")))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn failed_write_removes_partial_file() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let absolute = dir.path().join("small.gif");
        std::fs::write(&absolute, b"GIF").expect("reserve name");

        let err = write_or_discard(BrokenDisk, b"GIF89a", &absolute)
            .await
            .expect_err("write fails");
        assert!(matches!(err, MediaError::Io(_)));
        assert!(!absolute.exists());
    }

    #[tokio::test]
    async fn successful_write_keeps_file() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let absolute = dir.path().join("small.gif");
        let file = fs::File::create(&absolute).await.expect("create");

        write_or_discard(file, b"GIF89a", &absolute)
            .await
            .expect("write");
        assert_eq!(std::fs::read(&absolute).expect("read"), b"GIF89a");
    }

    #[test]
    fn sanitize_keeps_extension_and_slugifies_stem() {
        assert_eq!(
            sanitize_filename("My Picture.GIF"),
            ("my-picture".to_string(), "gif".to_string())
        );
        assert_eq!(
            sanitize_filename("../../etc/passwd.png"),
            ("passwd".to_string(), "png".to_string())
        );
    }

    #[test]
    fn resolve_rejects_escaping_paths() {
        let storage = MediaStorage {
            root: PathBuf::from("/srv/media"),
        };
        assert!(matches!(
            storage.resolve("../secret"),
            Err(MediaError::InvalidPath)
        ));
        assert!(matches!(
            storage.resolve("/etc/passwd"),
            Err(MediaError::InvalidPath)
        ));
        assert_eq!(
            storage.resolve("posts/small.gif").expect("relative"),
            PathBuf::from("/srv/media/posts/small.gif")
        );
    }
}
