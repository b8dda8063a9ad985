use super::MediaError;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::time::Duration;

/// Video frames are scaled to a fixed square before they reach the texture.
pub const VIDEO_FRAME_SIZE: usize = 256;

const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(10);

/// A playing video: an `ffmpeg` child process decoding to raw RGBA at the
/// source frame rate, read by a background thread.
///
/// Playback starts as soon as the stream is spawned and stops at the end of
/// the file. Dropping the stream kills the process.
pub struct VideoStream {
    child: Child,
    frames: Receiver<Vec<u8>>,
    ended: bool,
}

impl VideoStream {
    pub fn spawn(path: &Path, ffmpeg: &Path) -> Result<Self, MediaError> {
        let scale = format!("scale={0}:{0}", VIDEO_FRAME_SIZE);
        let mut child = Command::new(ffmpeg)
            .args(["-loglevel", "error", "-nostdin", "-re", "-i"])
            .arg(path)
            .args([
                "-an",
                "-vf",
                scale.as_str(),
                "-pix_fmt",
                "rgba",
                "-f",
                "rawvideo",
                "pipe:1",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| MediaError::SpawnDecoder {
                path: path.display().to_string(),
                source,
            })?;

        let stdout = child.stdout.take();
        let (sender, frames) = mpsc::sync_channel(4);
        // Constructed before the reader starts so an early return still kills the child.
        let stream = Self {
            child,
            frames,
            ended: false,
        };
        let Some(stdout) = stdout else {
            return Err(MediaError::NoFrames {
                path: path.display().to_string(),
            });
        };
        std::thread::Builder::new()
            .name("video-frames".to_string())
            .spawn(move || read_frames(stdout, sender))
            .map_err(|source| MediaError::SpawnDecoder {
                path: path.display().to_string(),
                source,
            })?;
        Ok(stream)
    }

    /// Block until the first frame arrives. Used by the decode worker so a
    /// file ffmpeg cannot read never reaches the scene.
    pub fn first_frame(&mut self, path: &Path) -> Result<Vec<u8>, MediaError> {
        match self.frames.recv_timeout(FIRST_FRAME_TIMEOUT) {
            Ok(frame) => Ok(frame),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {
                self.ended = true;
                Err(MediaError::NoFrames {
                    path: path.display().to_string(),
                })
            }
        }
    }

    /// Most recent decoded frame since the last call, skipping stale ones.
    pub fn latest_frame(&mut self) -> Option<Vec<u8>> {
        let mut latest = None;
        loop {
            match self.frames.try_recv() {
                Ok(frame) => latest = Some(frame),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    if !self.ended {
                        log::debug!("Video stream finished");
                    }
                    self.ended = true;
                    break;
                }
            }
        }
        latest
    }

    pub fn has_ended(&self) -> bool {
        self.ended
    }

    pub fn size(&self) -> [usize; 2] {
        [VIDEO_FRAME_SIZE, VIDEO_FRAME_SIZE]
    }
}

impl Drop for VideoStream {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl std::fmt::Debug for VideoStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoStream")
            .field("pid", &self.child.id())
            .field("ended", &self.ended)
            .finish()
    }
}

fn read_frames(mut reader: impl Read, sender: SyncSender<Vec<u8>>) {
    let frame_len = VIDEO_FRAME_SIZE * VIDEO_FRAME_SIZE * 4;
    loop {
        let mut frame = vec![0u8; frame_len];
        if reader.read_exact(&mut frame).is_err() {
            break;
        }
        if sender.send(frame).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{read_frames, VideoStream, VIDEO_FRAME_SIZE};
    use crate::media::MediaError;
    use std::path::Path;
    use std::sync::mpsc;

    #[test]
    fn missing_decoder_is_an_error() {
        let result = VideoStream::spawn(
            Path::new("clip.mp4"),
            Path::new("/nonexistent/holoscene-ffmpeg"),
        );
        assert!(matches!(result, Err(MediaError::SpawnDecoder { .. })));
    }

    #[test]
    fn reader_splits_whole_frames_and_drops_tail() {
        let frame_len = VIDEO_FRAME_SIZE * VIDEO_FRAME_SIZE * 4;
        let mut bytes = vec![1u8; frame_len];
        bytes.extend(vec![2u8; frame_len]);
        bytes.extend(vec![3u8; 10]);
        let (sender, receiver) = mpsc::sync_channel(4);
        read_frames(bytes.as_slice(), sender);
        let frames: Vec<Vec<u8>> = receiver.try_iter().collect();
        assert_eq!(frames.len(), 2);
        assert!(frames[0].iter().all(|&b| b == 1));
        assert!(frames[1].iter().all(|&b| b == 2));
    }
}
