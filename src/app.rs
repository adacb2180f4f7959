use std::time::Instant;

use eframe::egui;
use rusty_strata::config::ViewerConfig;
use rusty_strata::state::{AppState, Interaction};

use crate::color::ColorMap;
use crate::ui::{panels, plot};

/// Which chart fills the central panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartTab {
    Stacked,
    Density,
    Parallel,
}

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct RustyStrataApp {
    pub state: AppState,
    pub tab: ChartTab,
    /// Colours over the full secondary / primary domains, rebuilt on load.
    pub secondary_colors: Option<ColorMap>,
    pub primary_colors: Option<ColorMap>,
    /// Interactions collected while drawing, applied after the frame's UI.
    pub pending: Vec<Interaction>,
}

impl RustyStrataApp {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            state: AppState::new(config),
            tab: ChartTab::Stacked,
            secondary_colors: None,
            primary_colors: None,
            pending: Vec::new(),
        }
    }

    /// Rebuild the colour maps from the current snapshot's domains.
    pub fn rebuild_colors(&mut self) {
        let Some(snap) = self.state.snapshot() else {
            return;
        };
        let sentinel = self.state.config.schema.none_sentinel.clone();
        self.secondary_colors = Some(ColorMap::new(
            &snap.navigation.secondary_domain,
            Some(&sentinel),
        ));
        let primaries: Vec<String> = snap
            .selection
            .categories
            .iter()
            .map(|(c, _)| c.clone())
            .collect();
        self.primary_colors = Some(ColorMap::new(&primaries, None));
    }
}

impl eframe::App for RustyStrataApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.state.poll(now);

        // Every widget below reads the same snapshot.
        let snapshot = self.state.snapshot();

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, self, snapshot.as_ref());
        });

        // ---- Left side panel: filters, navigation, animation, focus ----
        egui::SidePanel::left("control_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, self, snapshot.as_ref());
            });

        // ---- Central panel: charts ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::central(ui, self, snapshot.as_ref());
        });

        for interaction in std::mem::take(&mut self.pending) {
            self.state.dispatch(interaction, now);
        }

        if let Some(wait) = self.state.next_wakeup(Instant::now()) {
            ctx.request_repaint_after(wait);
        }
    }
}
