//! Logfile tailer.
//!
//! Follows the gateway logfile tail -f style: start at the current end of
//! file and poll for appended lines. Only complete (newline-terminated)
//! lines are yielded — a partially written line stays buffered until the
//! rest arrives. A file that shrinks underneath us resets the read position
//! to the new end; rotation handling lives outside this module.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Duration;

use futures::stream::{self, Stream};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::SourceError;

/// How often the tailer re-checks a quiet file.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Stream of complete log lines, trailing newlines stripped.
pub type LineStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Poll until the given path exists.
pub async fn wait_for_file(path: impl AsRef<Path>, poll: Duration) {
    let path = path.as_ref();
    loop {
        match tokio::fs::try_exists(path).await {
            Ok(true) => return,
            Ok(false) => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Existence check failed"),
        }
        sleep(poll).await;
    }
}

struct TailState {
    reader: BufReader<File>,
    path: PathBuf,
    pos: u64,
    pending: String,
    poll: Duration,
}

/// Follow `path` from its current end, yielding appended lines.
pub async fn tail_lines(path: impl AsRef<Path>) -> Result<LineStream, SourceError> {
    tail_lines_with_poll(path, POLL_INTERVAL).await
}

/// Like [`tail_lines`] with an explicit poll interval (tests).
pub async fn tail_lines_with_poll(
    path: impl AsRef<Path>,
    poll: Duration,
) -> Result<LineStream, SourceError> {
    let path = path.as_ref().to_path_buf();
    let mut file = File::open(&path).await?;
    let pos = file.seek(SeekFrom::End(0)).await?;
    debug!(path = %path.display(), offset = pos, "Tailing from end of file");

    let state = TailState {
        reader: BufReader::new(file),
        path,
        pos,
        pending: String::new(),
        poll,
    };

    Ok(Box::pin(stream::unfold(state, |mut st| async move {
        loop {
            let mut chunk = String::new();
            match st.reader.read_line(&mut chunk).await {
                Ok(0) => {
                    // Nothing new. If the file shrank, resume from its new
                    // end instead of replaying old content.
                    if let Ok(meta) = tokio::fs::metadata(&st.path).await
                        && meta.len() < st.pos
                    {
                        debug!(path = %st.path.display(), "File shrank, seeking to new end");
                        // Seek through the BufReader so its buffer is dropped
                        match st.reader.seek(SeekFrom::End(0)).await {
                            Ok(pos) => {
                                st.pos = pos;
                                st.pending.clear();
                            }
                            Err(e) => {
                                warn!(error = %e, "Re-seek after truncation failed");
                                return None;
                            }
                        }
                    }
                    sleep(st.poll).await;
                }
                Ok(n) => {
                    st.pos += n as u64;
                    st.pending.push_str(&chunk);
                    if st.pending.ends_with('\n') {
                        let line = st.pending.trim_end_matches(['\r', '\n']).to_string();
                        st.pending.clear();
                        return Some((line, st));
                    }
                    // Partial line at EOF; wait for the writer to finish it.
                }
                Err(e) => {
                    warn!(path = %st.path.display(), error = %e, "Tail read failed");
                    return None;
                }
            }
        }
    })))
}
