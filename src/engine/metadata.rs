use crate::engine::{error::EngineError, LOG_TARGET};
use std::path::Path;
use std::time::Duration;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource as SymphoniaSource, MediaSourceStream};
use symphonia::core::meta::{MetadataOptions, StandardTagKey, Tag};
use symphonia::core::probe::Hint;
use tracing::{debug, trace};
use url::Url;

/// Tags and length of a loaded list item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration: Option<Duration>,
}

impl TrackMetadata {
    fn apply_tags(&mut self, tags: &[Tag]) {
        for tag in tags {
            let slot = match tag.std_key {
                Some(StandardTagKey::TrackTitle) => &mut self.title,
                Some(StandardTagKey::Artist) => &mut self.artist,
                Some(StandardTagKey::Album) => &mut self.album,
                _ => continue,
            };
            if slot.is_none() {
                let value = tag.value.to_string();
                if !value.trim().is_empty() {
                    *slot = Some(value);
                }
            }
        }
    }

    /// Fills a missing title from the item's URI, like most players show the file name.
    pub fn with_fallback_title(mut self, uri: &str) -> Self {
        if self.title.is_none() {
            self.title = fallback_title(uri);
        }
        self
    }
}

/// Reads container tags and the default track's length with symphonia's probe.
///
/// Only the container header is parsed; no packets are decoded.
pub fn probe_metadata(
    source: Box<dyn SymphoniaSource>,
    extension: Option<&str>,
) -> Result<TrackMetadata, EngineError> {
    let mss = MediaSourceStream::new(source, Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let mut probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;

    let mut metadata = TrackMetadata::default();
    if let Some(probe_meta) = probed.metadata.get() {
        if let Some(revision) = probe_meta.current() {
            metadata.apply_tags(revision.tags());
        }
    }
    let format_meta = probed.format.metadata();
    if let Some(revision) = format_meta.current() {
        metadata.apply_tags(revision.tags());
    }

    if let Some(track) = probed.format.default_track() {
        let params = &track.codec_params;
        if let (Some(time_base), Some(n_frames)) = (params.time_base, params.n_frames) {
            let time = time_base.calc_time(n_frames);
            metadata.duration = Some(Duration::from_secs(time.seconds) + Duration::from_secs_f64(time.frac));
        }
    }

    debug!(target: LOG_TARGET, "Probed metadata: {:?}", metadata);
    Ok(metadata)
}

/// Last path segment of a URI or file path, percent-decoding handled by `url`.
pub(crate) fn fallback_title(uri: &str) -> Option<String> {
    let from_url = Url::parse(uri).ok().and_then(|parsed| {
        if parsed.scheme() == "file" {
            parsed
                .to_file_path()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        } else {
            parsed
                .path_segments()
                .and_then(|segments| segments.filter(|s| !s.is_empty()).last().map(str::to_string))
        }
    });
    let title = from_url.or_else(|| {
        Path::new(uri)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
    });
    trace!(target: LOG_TARGET, "Fallback title for {}: {:?}", uri, title);
    title
}
