//! Auxiliary media (illustrative images) for the focused record.
//!
//! Lookups run off the interaction path on a worker thread. Each request is
//! stamped with a generation; a result arriving for an older generation is
//! dropped, so a slow lookup can never overwrite the image of a newer focus.
//! A lookup that outlives its timeout resolves to the placeholder.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use crate::error::MediaError;

/// Names whose punctuation carries meaning and would collide once stripped.
const KEY_EXCEPTIONS: &[(&str, &str)] = &[
    ("nidoran♀", "nidoran-f"),
    ("nidoran♂", "nidoran-m"),
    ("flabébé", "flabebe"),
    ("type: null", "type-null"),
];

/// Lookup key for an identity: lower-case, whitespace runs become one
/// hyphen, other punctuation is dropped. Pure.
pub fn sanitize_key(identity: &str) -> String {
    let lower = identity.trim().to_lowercase();
    if let Some((_, key)) = KEY_EXCEPTIONS.iter().find(|(name, _)| *name == lower) {
        return key.to_string();
    }

    let mut key = String::with_capacity(lower.len());
    for c in lower.chars() {
        if c.is_alphanumeric() {
            key.push(c);
        } else if (c.is_whitespace() || c == '-') && !key.is_empty() && !key.ends_with('-') {
            key.push('-');
        }
    }
    while key.ends_with('-') {
        key.pop();
    }
    key
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaRef {
    /// URI the rendering layer can load (`file://...`).
    Image(String),
    Placeholder,
}

/// External collaborator resolving a key to an image.
pub trait MediaSource: Send + Sync {
    fn fetch(&self, key: &str) -> Result<MediaRef, MediaError>;
}

/// Looks for `<root>/<key>.png`.
#[derive(Debug, Clone)]
pub struct DirectoryMediaSource {
    root: PathBuf,
}

impl DirectoryMediaSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectoryMediaSource { root: root.into() }
    }
}

impl MediaSource for DirectoryMediaSource {
    fn fetch(&self, key: &str) -> Result<MediaRef, MediaError> {
        let path = self.root.join(format!("{key}.png"));
        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => Ok(MediaRef::Image(format!("file://{}", path.display()))),
            Ok(_) => Err(MediaError::NotFound(key.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(MediaError::NotFound(key.to_string()))
            }
            Err(e) => Err(MediaError::Io(e.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaState {
    Idle,
    Pending { identity: String },
    Ready { identity: String, media: MediaRef },
}

type LookupResult = (u64, Result<MediaRef, MediaError>);

/// The one display slot for the focused record's image.
pub struct MediaSlot {
    source: Option<Arc<dyn MediaSource>>,
    timeout: Duration,
    generation: u64,
    state: MediaState,
    /// When the pending lookup gives up.
    deadline: Option<Instant>,
    tx: Sender<LookupResult>,
    rx: Receiver<LookupResult>,
}

impl MediaSlot {
    pub fn new(source: Option<Arc<dyn MediaSource>>, timeout: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        MediaSlot {
            source,
            timeout,
            generation: 0,
            state: MediaState::Idle,
            deadline: None,
            tx,
            rx,
        }
    }

    pub fn state(&self) -> &MediaState {
        &self.state
    }

    /// Point the slot at a new identity (or none). Any lookup still in
    /// flight for the previous identity is ignored when it lands.
    pub fn retarget(&mut self, identity: Option<&str>, now: Instant) {
        self.generation += 1;
        self.deadline = None;
        let Some(identity) = identity else {
            self.state = MediaState::Idle;
            return;
        };
        let Some(source) = self.source.clone() else {
            self.state = MediaState::Ready {
                identity: identity.to_string(),
                media: MediaRef::Placeholder,
            };
            return;
        };

        self.state = MediaState::Pending {
            identity: identity.to_string(),
        };
        self.deadline = Some(now + self.timeout);
        let key = sanitize_key(identity);
        let generation = self.generation;
        let tx = self.tx.clone();
        let spawned = std::thread::Builder::new()
            .name("media-lookup".into())
            .spawn(move || {
                // The slot may be gone by now; nothing to do then.
                let _ = tx.send((generation, source.fetch(&key)));
            });
        if let Err(e) = spawned {
            log::warn!("Could not start media lookup: {e}");
            self.resolve(generation, Err(MediaError::Worker));
        }
    }

    /// Apply every finished lookup, then give up on the pending one if its
    /// deadline has passed. Returns `true` if the slot changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        let mut changed = false;
        while let Ok((generation, result)) = self.rx.try_recv() {
            changed |= self.resolve(generation, result);
        }
        if self.deadline.is_some_and(|deadline| now >= deadline) {
            changed |= self.resolve(self.generation, Err(MediaError::Timeout));
        }
        changed
    }

    /// When the pending lookup times out, if one is pending.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Apply one lookup result if it belongs to the current request.
    /// Failures resolve to the placeholder.
    pub fn resolve(&mut self, generation: u64, result: Result<MediaRef, MediaError>) -> bool {
        if generation != self.generation {
            log::debug!("Discarding stale media result (generation {generation})");
            return false;
        }
        let MediaState::Pending { identity } = &self.state else {
            return false;
        };
        self.deadline = None;
        let media = match result {
            Ok(media) => media,
            Err(e) => {
                log::debug!("Media lookup for '{identity}' failed: {e}");
                MediaRef::Placeholder
            }
        };
        self.state = MediaState::Ready {
            identity: identity.clone(),
            media,
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    struct Fixed(Result<MediaRef, MediaError>);

    impl MediaSource for Fixed {
        fn fetch(&self, _key: &str) -> Result<MediaRef, MediaError> {
            self.0.clone()
        }
    }

    /// Sleeps far past any test's timeout before answering.
    struct Hang;

    impl MediaSource for Hang {
        fn fetch(&self, _key: &str) -> Result<MediaRef, MediaError> {
            std::thread::sleep(Duration::from_secs(2));
            Ok(MediaRef::Image("file:///late.png".into()))
        }
    }

    const TIMEOUT: Duration = Duration::from_secs(30);

    fn wait_ready(slot: &mut MediaSlot) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while matches!(slot.state(), MediaState::Pending { .. }) && Instant::now() < deadline {
            slot.poll(Instant::now());
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn sanitizer_rules() {
        assert_eq!(sanitize_key("Mr. Mime"), "mr-mime");
        assert_eq!(sanitize_key("Farfetch'd"), "farfetchd");
        assert_eq!(sanitize_key("  Tapu   Koko "), "tapu-koko");
        assert_eq!(sanitize_key("Ho-Oh"), "ho-oh");
        assert_eq!(sanitize_key("Nidoran♀"), "nidoran-f");
        assert_eq!(sanitize_key("Nidoran♂"), "nidoran-m");
        assert_eq!(sanitize_key("Type: Null"), "type-null");
        assert_eq!(sanitize_key("Mime Jr."), "mime-jr");
    }

    #[test]
    fn stale_result_is_discarded() {
        let mut slot = MediaSlot::new(None, TIMEOUT);
        // Simulate two requests without letting the worker results in.
        slot.generation = 1;
        slot.state = MediaState::Pending { identity: "A".into() };
        slot.generation = 2;
        slot.state = MediaState::Pending { identity: "B".into() };

        assert!(!slot.resolve(1, Ok(MediaRef::Image("file:///a.png".into()))));
        assert_eq!(slot.state(), &MediaState::Pending { identity: "B".into() });

        assert!(slot.resolve(2, Ok(MediaRef::Image("file:///b.png".into()))));
        assert_eq!(
            slot.state(),
            &MediaState::Ready {
                identity: "B".into(),
                media: MediaRef::Image("file:///b.png".into())
            }
        );
    }

    #[test]
    fn failure_falls_back_to_placeholder() {
        let source: Arc<dyn MediaSource> = Arc::new(Fixed(Err(MediaError::NotFound("x".into()))));
        let mut slot = MediaSlot::new(Some(source), TIMEOUT);
        slot.retarget(Some("Pikachu"), Instant::now());
        wait_ready(&mut slot);
        assert_eq!(
            slot.state(),
            &MediaState::Ready {
                identity: "Pikachu".into(),
                media: MediaRef::Placeholder
            }
        );
    }

    #[test]
    fn clearing_focus_ignores_pending_lookup() {
        let source: Arc<dyn MediaSource> = Arc::new(Fixed(Ok(MediaRef::Image("file:///p.png".into()))));
        let mut slot = MediaSlot::new(Some(source), TIMEOUT);
        slot.retarget(Some("Pikachu"), Instant::now());
        slot.retarget(None, Instant::now());
        std::thread::sleep(Duration::from_millis(50));
        slot.poll(Instant::now());
        assert_eq!(slot.state(), &MediaState::Idle);
        assert_eq!(slot.deadline(), None);
    }

    #[test]
    fn hanging_lookup_times_out_to_placeholder() {
        let timeout = Duration::from_millis(200);
        let source: Arc<dyn MediaSource> = Arc::new(Hang);
        let mut slot = MediaSlot::new(Some(source), timeout);
        let t0 = Instant::now();
        slot.retarget(Some("Pikachu"), t0);
        assert_eq!(slot.deadline(), Some(t0 + timeout));

        assert!(!slot.poll(t0 + timeout / 2));
        assert_eq!(slot.state(), &MediaState::Pending { identity: "Pikachu".into() });

        assert!(slot.poll(t0 + timeout));
        assert_eq!(
            slot.state(),
            &MediaState::Ready {
                identity: "Pikachu".into(),
                media: MediaRef::Placeholder
            }
        );
        assert_eq!(slot.deadline(), None);
        // Nothing left to do once resolved.
        assert!(!slot.poll(t0 + timeout * 2));
    }

    #[test]
    fn directory_source_finds_sanitized_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("mr-mime.png"), b"png").unwrap();
        let source = DirectoryMediaSource::new(dir.path());

        assert!(matches!(source.fetch("mr-mime"), Ok(MediaRef::Image(uri)) if uri.ends_with("mr-mime.png")));
        assert_eq!(source.fetch("pikachu"), Err(MediaError::NotFound("pikachu".into())));
    }
}
