#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ViewState {
    #[default]
    Settings,
    Countdown,
    Alarming,
}

impl ViewState {
    pub fn title(&self) -> &'static str {
        match self {
            ViewState::Settings => "SET ALARM",
            ViewState::Countdown => "COUNTDOWN",
            ViewState::Alarming => "WAKE UP!",
        }
    }
}

/// Owns which of the three screens is up. Nothing else decides visibility.
#[derive(Debug, Default)]
pub struct ScreenController {
    view: ViewState,
}

impl ScreenController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn is_visible(&self, view: ViewState) -> bool {
        self.view == view
    }

    /// Red background treatment, on for exactly as long as the alarm rings.
    pub fn alarm_background(&self) -> bool {
        self.view == ViewState::Alarming
    }

    /// Returns the view that was replaced.
    pub fn show(&mut self, view: ViewState) -> ViewState {
        std::mem::replace(&mut self.view, view)
    }
}
