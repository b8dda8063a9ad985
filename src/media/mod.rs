pub mod texture_store;
pub mod video;

pub use texture_store::{TextureData, TextureId, TextureStore};
pub use video::VideoStream;

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};

/// Longest edge of a decoded image texture.
pub const MAX_IMAGE_SIDE: u32 = 1024;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to start video decoder for {path}: {source}")]
    SpawnDecoder {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("video decoder produced no frames for {path}")]
    NoFrames { path: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Only `image/*` and `video/*` are accepted.
    pub fn classify(mime: &str) -> Option<Self> {
        if mime.starts_with("image/") {
            Some(Self::Image)
        } else if mime.starts_with("video/") {
            Some(Self::Video)
        } else {
            None
        }
    }
}

/// Best-effort MIME type from a file extension.
pub fn mime_for_path(path: &Path) -> String {
    if let Ok(format) = image::ImageFormat::from_path(path) {
        return format.to_mime_type().to_string();
    }
    let extension = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())
        .unwrap_or_default();
    let mime = match extension.as_str() {
        "mp4" => "video/mp4",
        "m4v" => "video/x-m4v",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "ogv" => "video/ogg",
        "mpeg" | "mpg" => "video/mpeg",
        "pdf" => "application/pdf",
        "json" => "application/json",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    };
    mime.to_string()
}

/// A dropped file waiting to become a texture.
#[derive(Debug, Clone, PartialEq)]
pub struct RetextureRequest {
    pub path: PathBuf,
    pub mime: String,
}

impl RetextureRequest {
    pub fn from_path(path: PathBuf) -> Self {
        let mime = mime_for_path(&path);
        Self { path, mime }
    }

    pub fn kind(&self) -> Option<MediaKind> {
        MediaKind::classify(&self.mime)
    }

    pub fn label(&self) -> String {
        self.path
            .file_name()
            .and_then(|value| value.to_str())
            .unwrap_or("media")
            .to_string()
    }
}

#[derive(Debug)]
pub struct DecodedImage {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
    pub hash: [u8; 32],
}

#[derive(Debug)]
pub enum DecodedMedia {
    Image(DecodedImage),
    Video {
        stream: VideoStream,
        first_frame: Vec<u8>,
    },
}

#[derive(Debug)]
pub struct MediaCompletion {
    pub request_id: u64,
    pub request: RetextureRequest,
    pub result: Result<DecodedMedia, MediaError>,
}

/// Decodes retexture requests on worker threads.
///
/// Requests are never cancelled or queued behind each other: every accepted
/// request gets its own worker and reports back through a channel that the
/// frame driver drains with [`MediaLoader::poll`].
pub struct MediaLoader {
    sender: Sender<MediaCompletion>,
    receiver: Receiver<MediaCompletion>,
    ffmpeg: PathBuf,
    next_request: u64,
    in_flight: usize,
}

impl MediaLoader {
    pub fn new(ffmpeg: PathBuf) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            ffmpeg,
            next_request: 0,
            in_flight: 0,
        }
    }

    /// Start decoding. Returns `None` when the request's MIME type is not
    /// an image or video, or the worker could not be started.
    pub fn submit(&mut self, request: RetextureRequest) -> Option<u64> {
        let kind = request.kind()?;
        let request_id = self.next_request;
        self.next_request += 1;

        let sender = self.sender.clone();
        let ffmpeg = self.ffmpeg.clone();
        let job = request.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("media-decode-{request_id}"))
            .spawn(move || {
                let result = match kind {
                    MediaKind::Image => decode_image_file(&job.path).map(DecodedMedia::Image),
                    MediaKind::Video => open_video(&job.path, &ffmpeg),
                };
                // The receiver is gone only when the viewer is shutting down.
                let _ = sender.send(MediaCompletion {
                    request_id,
                    request: job,
                    result,
                });
            });
        match spawned {
            Ok(_) => {
                self.in_flight += 1;
                log::info!(
                    "Decoding {} ({}) as request {}",
                    request.path.display(),
                    request.mime,
                    request_id
                );
                Some(request_id)
            }
            Err(err) => {
                log::warn!("Failed to start decode worker: {}", err);
                None
            }
        }
    }

    /// Completions that arrived since the last poll, in arrival order.
    pub fn poll(&mut self) -> Vec<MediaCompletion> {
        let completions: Vec<MediaCompletion> = self.receiver.try_iter().collect();
        self.in_flight = self.in_flight.saturating_sub(completions.len());
        completions
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    #[cfg(test)]
    pub fn wait(&mut self, timeout: std::time::Duration) -> Option<MediaCompletion> {
        let completion = self.receiver.recv_timeout(timeout).ok()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(completion)
    }
}

pub fn decode_image_file(path: &Path) -> Result<DecodedImage, MediaError> {
    let bytes = std::fs::read(path).map_err(|source| MediaError::Read {
        path: path.display().to_string(),
        source,
    })?;
    decode_image_bytes(&bytes).map_err(|source| MediaError::Decode {
        path: path.display().to_string(),
        source,
    })
}

pub fn decode_image_bytes(bytes: &[u8]) -> Result<DecodedImage, image::ImageError> {
    let hash: [u8; 32] = Sha256::digest(bytes).into();
    let mut decoded = image::load_from_memory(bytes)?;
    if decoded.width() > MAX_IMAGE_SIDE || decoded.height() > MAX_IMAGE_SIDE {
        decoded = decoded.resize(
            MAX_IMAGE_SIDE,
            MAX_IMAGE_SIDE,
            image::imageops::FilterType::Triangle,
        );
    }
    let rgba = decoded.to_rgba8();
    Ok(DecodedImage {
        width: rgba.width() as usize,
        height: rgba.height() as usize,
        pixels: rgba.into_raw(),
        hash,
    })
}

fn open_video(path: &Path, ffmpeg: &Path) -> Result<DecodedMedia, MediaError> {
    let mut stream = VideoStream::spawn(path, ffmpeg)?;
    let first_frame = stream.first_frame(path)?;
    Ok(DecodedMedia::Video {
        stream,
        first_frame,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::time::Duration;

    pub(crate) fn write_test_png(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("holoscene_{}_{}.png", name, std::process::id()));
        let image = image::RgbaImage::from_fn(4, 2, |x, y| {
            image::Rgba([(x * 60) as u8, (y * 120) as u8, 200, 255])
        });
        image.save(&path).unwrap();
        path
    }

    #[test]
    fn classify_by_prefix() {
        assert_eq!(MediaKind::classify("image/png"), Some(MediaKind::Image));
        assert_eq!(MediaKind::classify("video/webm"), Some(MediaKind::Video));
        assert_eq!(MediaKind::classify("application/pdf"), None);
        assert_eq!(MediaKind::classify("imagery/fake"), None);
    }

    #[test]
    fn mime_from_extension() {
        assert_eq!(mime_for_path(Path::new("photo.PNG")), "image/png");
        assert_eq!(mime_for_path(Path::new("photo.jpg")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("clip.MP4")), "video/mp4");
        assert_eq!(mime_for_path(Path::new("paper.pdf")), "application/pdf");
        assert_eq!(
            mime_for_path(Path::new("no_extension")),
            "application/octet-stream"
        );
    }

    #[test]
    fn unsupported_requests_are_not_submitted() {
        let mut loader = MediaLoader::new(PathBuf::from("ffmpeg"));
        let request = RetextureRequest::from_path(PathBuf::from("paper.pdf"));
        assert!(loader.submit(request).is_none());
        assert_eq!(loader.in_flight(), 0);
    }

    #[test]
    fn image_decodes_on_worker() {
        let path = write_test_png("decode");
        let mut loader = MediaLoader::new(PathBuf::from("ffmpeg"));
        let id = loader
            .submit(RetextureRequest::from_path(path.clone()))
            .unwrap();
        let completion = loader.wait(Duration::from_secs(10)).unwrap();
        assert_eq!(completion.request_id, id);
        match completion.result.unwrap() {
            DecodedMedia::Image(image) => {
                assert_eq!((image.width, image.height), (4, 2));
                assert_eq!(image.pixels.len(), 4 * 2 * 4);
            }
            DecodedMedia::Video { .. } => panic!("Expected image"),
        }
        assert_eq!(loader.in_flight(), 0);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn corrupt_image_reports_decode_error() {
        let mut path = std::env::temp_dir();
        path.push(format!("holoscene_corrupt_{}.png", std::process::id()));
        std::fs::write(&path, b"definitely not a png").unwrap();
        let result = decode_image_file(&path);
        assert!(matches!(result, Err(MediaError::Decode { .. })));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn large_images_are_capped() {
        let image = image::RgbaImage::new(2048, 512);
        let mut bytes = Vec::new();
        image
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageFormat::Png,
            )
            .unwrap();
        let decoded = decode_image_bytes(&bytes).unwrap();
        assert_eq!(decoded.width, MAX_IMAGE_SIDE as usize);
        assert_eq!(decoded.height, 256);
    }
}
