use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::animation::{AnimationController, AnimationFrame, TickOutcome};
use crate::config::ViewerConfig;
use crate::data::model::Dataset;
use crate::error::AnimationError;
use crate::media::{DirectoryMediaSource, MediaSlot, MediaSource, MediaState};
use crate::navigation::{NavigationLevel, NavigationMachine, NavigationView, Transition};
use crate::selection::{SelectionCoordinator, SelectionView};

// ---------------------------------------------------------------------------
// Interaction messages
// ---------------------------------------------------------------------------

/// Everything the rendering layer can ask of the core.
#[derive(Debug, Clone, PartialEq)]
pub enum Interaction {
    SegmentSelected {
        primary: String,
        secondary: Option<String>,
    },
    Back,
    Reset,
    CategoryToggled {
        key: String,
        active: bool,
    },
    ActiveCategoriesReplaced(BTreeSet<String>),
    RecordFocused(String),
    FocusCleared,
    Play,
    Pause,
    ScrubTo(isize),
    DimensionChanged(String),
}

// ---------------------------------------------------------------------------
// View snapshot
// ---------------------------------------------------------------------------

/// A complete, owned picture of every view, taken after an interaction has
/// been fully applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot {
    pub record_count: usize,
    pub dimensions: Vec<String>,
    pub density_dimension: String,
    pub navigation: NavigationView,
    pub animation: Result<AnimationFrame, AnimationError>,
    /// Ordinal label of every animation step.
    pub ordinals: Vec<i64>,
    pub selection: SelectionView,
    pub media: MediaState,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// State holders bound to one loaded dataset.
struct Session {
    dataset: Arc<Dataset>,
    navigation: NavigationMachine,
    animation: AnimationController,
    selection: SelectionCoordinator,
}

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: ViewerConfig,

    session: Option<Session>,

    /// Image slot for the focused record.
    media: MediaSlot,

    /// Status / warning message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}

impl AppState {
    pub fn new(config: ViewerConfig) -> Self {
        let source = config
            .media_dir
            .as_ref()
            .map(|dir| Arc::new(DirectoryMediaSource::new(dir)) as Arc<dyn MediaSource>);
        Self::with_media_source(config, source)
    }

    pub fn with_media_source(config: ViewerConfig, source: Option<Arc<dyn MediaSource>>) -> Self {
        let media_timeout = Duration::from_millis(config.media_timeout_ms);
        Self {
            config,
            session: None,
            media: MediaSlot::new(source, media_timeout),
            status_message: None,
        }
    }

    pub fn has_dataset(&self) -> bool {
        self.session.is_some()
    }

    /// Ingest a newly loaded dataset. Existing selectors are revalidated
    /// against it; the animation restarts from its first step.
    pub fn set_dataset(&mut self, dataset: Dataset, now: Instant) {
        let dataset = Arc::new(dataset);
        let dimension = self.pick_dimension(&dataset, None);
        let animation = self.build_animation(&dataset, &dimension);
        let focus_before = self.focus();
        self.status_message = None;

        match self.session.take() {
            Some(mut session) => {
                if session.navigation.set_dataset(Arc::clone(&dataset)) == Transition::Redirected {
                    let notice = redirect_notice(session.navigation.level(), None);
                    log::warn!("{notice}");
                    self.status_message = Some(notice);
                }
                session.selection.set_dataset(Arc::clone(&dataset));
                session.animation = animation;
                session.dataset = dataset;
                self.session = Some(session);
            }
            None => {
                self.session = Some(Session {
                    navigation: NavigationMachine::new(Arc::clone(&dataset)),
                    selection: SelectionCoordinator::new(Arc::clone(&dataset)),
                    animation,
                    dataset,
                });
            }
        }

        self.sync_media(focus_before, now);
    }

    /// Apply one interaction completely.
    pub fn dispatch(&mut self, interaction: Interaction, now: Instant) {
        let focus_before = self.focus();
        let Some(session) = self.session.as_mut() else {
            log::debug!("Ignoring {interaction:?}: no dataset loaded");
            return;
        };
        self.status_message = None;

        let outcome: Result<(), String> = match interaction {
            Interaction::SegmentSelected { primary, secondary } => {
                match session.navigation.select_segment(&primary, secondary.as_deref()) {
                    Ok(Transition::Redirected) => {
                        Err(redirect_notice(session.navigation.level(), Some(&primary)))
                    }
                    Ok(_) => Ok(()),
                    Err(e) => Err(e.to_string()),
                }
            }
            Interaction::Back => {
                session.navigation.back();
                Ok(())
            }
            Interaction::Reset => {
                session.navigation.reset();
                Ok(())
            }
            Interaction::CategoryToggled { key, active } => {
                session.selection.toggle_category(&key, active);
                Ok(())
            }
            Interaction::ActiveCategoriesReplaced(keys) => {
                session.selection.set_active_categories(keys);
                Ok(())
            }
            Interaction::RecordFocused(identity) => {
                session.selection.focus_record(&identity).map_err(|e| e.to_string())
            }
            Interaction::FocusCleared => {
                session.selection.clear_focus();
                Ok(())
            }
            Interaction::Play => session.animation.play(now).map_err(|e| e.to_string()),
            Interaction::Pause => session.animation.pause().map_err(|e| e.to_string()),
            Interaction::ScrubTo(index) => session
                .animation
                .scrub_to(index)
                .map(|_| ())
                .map_err(|e| e.to_string()),
            Interaction::DimensionChanged(dimension) => {
                let dataset = Arc::clone(&session.dataset);
                let dimension = self.pick_dimension(&dataset, Some(&dimension));
                let animation = self.build_animation(&dataset, &dimension);
                if let Some(session) = self.session.as_mut() {
                    session.animation = animation;
                }
                Ok(())
            }
        };

        if let Err(msg) = outcome {
            log::warn!("{msg}");
            self.status_message = Some(msg);
        }
        self.sync_media(focus_before, now);
    }

    /// Drive time-based work: animation ticks and finished media lookups.
    /// Returns `true` if anything visible changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        let ticked = self
            .session
            .as_mut()
            .map(|s| s.animation.advance(now))
            .is_some_and(|outcome| outcome != TickOutcome::Idle);
        let media = self.media.poll(now);
        ticked || media
    }

    /// How long the caller may sleep before `poll` has work again.
    pub fn next_wakeup(&self, now: Instant) -> Option<Duration> {
        let mut wake = self
            .session
            .as_ref()
            .and_then(|s| s.animation.next_due())
            .map(|due| due.saturating_duration_since(now));
        if let Some(deadline) = self.media.deadline() {
            let media_wake = deadline
                .saturating_duration_since(now)
                .min(Duration::from_millis(50));
            wake = Some(wake.map_or(media_wake, |w| w.min(media_wake)));
        }
        wake
    }

    pub fn snapshot(&self) -> Option<ViewSnapshot> {
        let session = self.session.as_ref()?;
        Some(ViewSnapshot {
            record_count: session.dataset.len(),
            dimensions: session.dataset.dimensions.clone(),
            density_dimension: session.animation.dimension().to_string(),
            navigation: session.navigation.view().clone(),
            animation: session.animation.frame().cloned(),
            ordinals: session.animation.ordinals(),
            selection: session.selection.view().clone(),
            media: self.media.state().clone(),
        })
    }

    fn focus(&self) -> Option<String> {
        self.session
            .as_ref()
            .and_then(|s| s.selection.focus().map(str::to_string))
    }

    /// Point the media slot at the current focus when it changed.
    fn sync_media(&mut self, focus_before: Option<String>, now: Instant) {
        let focus_now = self.focus();
        if focus_now != focus_before {
            self.media.retarget(focus_now.as_deref(), now);
        }
    }

    /// Requested dimension if the dataset has it, else the configured one,
    /// else the first dimension.
    fn pick_dimension(&self, dataset: &Dataset, requested: Option<&str>) -> String {
        let has = |d: &str| dataset.dimensions.iter().any(|x| x == d);
        requested
            .filter(|d| has(d))
            .or(self.config.density_dimension.as_deref().filter(|d| has(d)))
            .or(dataset.dimensions.first().map(String::as_str))
            .unwrap_or_default()
            .to_string()
    }

    fn build_animation(&self, dataset: &Dataset, dimension: &str) -> AnimationController {
        AnimationController::new(
            dataset,
            dimension,
            self.config.bandwidth,
            self.config.grid_steps,
            Duration::from_millis(self.config.tick_interval_ms),
        )
    }
}

/// Status text for a navigation request that landed somewhere safer than
/// asked. `requested` is the primary key of the request, when there was one.
fn redirect_notice(level: &NavigationLevel, requested: Option<&str>) -> String {
    match (level, requested) {
        (NavigationLevel::PrimaryFiltered { primary }, _) => {
            format!("No records left to list in '{primary}'; showing its breakdown")
        }
        (_, Some(primary)) => format!("'{primary}' is no longer in the data; showing all"),
        (_, None) => "Selection no longer in the data; showing all".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::Playback;
    use crate::data::model::Record;
    use crate::navigation::NavigationLevel;

    fn dataset() -> Dataset {
        let mut records = Vec::new();
        for i in 0..6 {
            let primary = if i < 4 { "Water" } else { "Fire" };
            records.push(
                Record::new(&format!("r{i}"), primary, if i % 2 == 0 { "None" } else { "Ice" })
                    .with_ordinal(1 + i as i64 % 2)
                    .with_value("hp", 10.0 * i as f64)
                    .with_value("speed", 5.0 + i as f64),
            );
        }
        Dataset::from_records(records, vec!["hp".into(), "speed".into()], "None").unwrap()
    }

    fn state() -> AppState {
        let mut state = AppState::with_media_source(ViewerConfig::default(), None);
        state.set_dataset(dataset(), Instant::now());
        state
    }

    #[test]
    fn interactions_update_snapshot() {
        let mut state = state();
        let now = Instant::now();

        state.dispatch(
            Interaction::SegmentSelected {
                primary: "Water".into(),
                secondary: None,
            },
            now,
        );
        let snap = state.snapshot().unwrap();
        assert_eq!(
            snap.navigation.level,
            NavigationLevel::PrimaryFiltered { primary: "Water".into() }
        );

        state.dispatch(Interaction::RecordFocused("r4".into()), now);
        assert_eq!(state.snapshot().unwrap().selection.focus.as_deref(), Some("r4"));
        assert_eq!(
            state.snapshot().unwrap().media,
            MediaState::Ready {
                identity: "r4".into(),
                media: crate::media::MediaRef::Placeholder
            }
        );

        state.dispatch(
            Interaction::CategoryToggled {
                key: "Fire".into(),
                active: false,
            },
            now,
        );
        let snap = state.snapshot().unwrap();
        assert_eq!(snap.selection.focus, None);
        assert_eq!(snap.media, MediaState::Idle);
    }

    #[test]
    fn recoverable_errors_become_status_messages() {
        let mut state = state();
        let now = Instant::now();
        state.dispatch(Interaction::RecordFocused("nobody".into()), now);
        assert!(state.status_message.as_deref().unwrap().contains("nobody"));

        state.dispatch(Interaction::FocusCleared, now);
        assert_eq!(state.status_message, None);
    }

    #[test]
    fn polling_drives_the_animation() {
        let mut state = state();
        let t0 = Instant::now();
        state.dispatch(Interaction::Play, t0);
        assert!(state.next_wakeup(t0).is_some());

        let later = t0 + Duration::from_millis(state.config.tick_interval_ms);
        assert!(state.poll(later));
        let frame = state.snapshot().unwrap().animation.unwrap();
        assert_eq!(frame.index, 1);
        assert_eq!(frame.playback, Playback::Finished);
        assert!(!state.poll(later + Duration::from_secs(10)));
    }

    #[test]
    fn dimension_change_rebuilds_animation() {
        let mut state = state();
        let now = Instant::now();
        state.dispatch(Interaction::ScrubTo(1), now);
        state.dispatch(Interaction::DimensionChanged("speed".into()), now);
        let snap = state.snapshot().unwrap();
        assert_eq!(snap.density_dimension, "speed");
        assert_eq!(snap.animation.unwrap().index, 0);

        state.dispatch(Interaction::DimensionChanged("weight".into()), now);
        assert_eq!(state.snapshot().unwrap().density_dimension, "hp");
    }

    #[test]
    fn no_dataset_means_no_snapshot() {
        let mut state = AppState::with_media_source(ViewerConfig::default(), None);
        state.dispatch(Interaction::Play, Instant::now());
        assert!(state.snapshot().is_none());
    }

    #[test]
    fn empty_secondary_redirect_names_the_kept_primary() {
        let mut state = state();
        let now = Instant::now();
        state.dispatch(
            Interaction::SegmentSelected {
                primary: "Water".into(),
                secondary: None,
            },
            now,
        );
        state.dispatch(
            Interaction::SegmentSelected {
                primary: "Water".into(),
                secondary: Some("Steel".into()),
            },
            now,
        );
        let snap = state.snapshot().unwrap();
        assert_eq!(
            snap.navigation.level,
            NavigationLevel::PrimaryFiltered { primary: "Water".into() }
        );
        let msg = state.status_message.as_deref().unwrap();
        assert!(msg.contains("Water"));
        assert!(!msg.contains("no longer in the data"));
    }

    #[test]
    fn unknown_primary_redirect_says_it_is_gone() {
        let mut state = state();
        state.dispatch(
            Interaction::SegmentSelected {
                primary: "Grass".into(),
                secondary: None,
            },
            Instant::now(),
        );
        assert_eq!(state.snapshot().unwrap().navigation.level, NavigationLevel::Overview);
        assert!(state
            .status_message
            .as_deref()
            .unwrap()
            .contains("'Grass' is no longer in the data"));
    }

    #[test]
    fn reload_clears_stale_status() {
        let mut state = state();
        let now = Instant::now();
        state.dispatch(Interaction::RecordFocused("nobody".into()), now);
        assert!(state.status_message.is_some());

        state.set_dataset(dataset(), now);
        assert_eq!(state.status_message, None);
    }

    #[test]
    fn reload_with_new_categories_activates_them() {
        let mut state = state();
        let now = Instant::now();
        let records = vec![
            Record::new("g1", "Grass", "None").with_ordinal(1).with_value("hp", 1.0).with_value("speed", 2.0),
            Record::new("r1", "Rock", "None").with_ordinal(1).with_value("hp", 3.0).with_value("speed", 4.0),
        ];
        let next = Dataset::from_records(records, vec!["hp".into(), "speed".into()], "None").unwrap();
        state.set_dataset(next, now);

        let snap = state.snapshot().unwrap();
        assert_eq!(
            snap.selection.categories,
            vec![("Grass".to_string(), true), ("Rock".to_string(), true)]
        );
        assert_eq!(snap.selection.records.len(), 2);
    }

    struct Hang;

    impl MediaSource for Hang {
        fn fetch(&self, _key: &str) -> Result<crate::media::MediaRef, crate::error::MediaError> {
            std::thread::sleep(Duration::from_secs(2));
            Ok(crate::media::MediaRef::Placeholder)
        }
    }

    #[test]
    fn hanging_media_lookup_resolves_after_timeout() {
        let config = ViewerConfig {
            media_timeout_ms: 300,
            ..ViewerConfig::default()
        };
        let source: Arc<dyn MediaSource> = Arc::new(Hang);
        let mut state = AppState::with_media_source(config, Some(source));
        let t0 = Instant::now();
        state.set_dataset(dataset(), t0);

        state.dispatch(Interaction::RecordFocused("r1".into()), t0);
        assert_eq!(
            state.snapshot().unwrap().media,
            MediaState::Pending { identity: "r1".into() }
        );
        assert_eq!(state.next_wakeup(t0), Some(Duration::from_millis(50)));
        assert_eq!(
            state.next_wakeup(t0 + Duration::from_millis(280)),
            Some(Duration::from_millis(20))
        );

        let expired = t0 + Duration::from_millis(300);
        assert!(state.poll(expired));
        assert_eq!(
            state.snapshot().unwrap().media,
            MediaState::Ready {
                identity: "r1".into(),
                media: crate::media::MediaRef::Placeholder
            }
        );
        assert_eq!(state.next_wakeup(expired), None);
    }
}
