use macroquad::prelude::*;

use crate::alarm::AlarmConfig;

const MAX_FIELD_DIGITS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Hours,
    Minutes,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::Hours => "HOURS",
            Field::Minutes => "MINUTES",
        }
    }

    fn other(self) -> Self {
        match self {
            Field::Hours => Field::Minutes,
            Field::Minutes => Field::Hours,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormInput {
    Char(char),
    Backspace,
    NextField,
    Submit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormAction {
    None,
    Edited,
    Submit,
}

/// The two numeric fields of the settings screen.
pub struct SettingsForm {
    hours: String,
    minutes: String,
    focus: Field,
}

impl SettingsForm {
    pub fn new(preset: AlarmConfig) -> Self {
        Self {
            hours: preset.hours.to_string(),
            minutes: preset.minutes.to_string(),
            focus: Field::Minutes,
        }
    }

    pub fn focus(&self) -> Field {
        self.focus
    }

    pub fn set_focus(&mut self, field: Field) {
        self.focus = field;
    }

    pub fn text(&self, field: Field) -> &str {
        match field {
            Field::Hours => &self.hours,
            Field::Minutes => &self.minutes,
        }
    }

    pub fn config(&self) -> AlarmConfig {
        AlarmConfig::from_fields(&self.hours, &self.minutes)
    }

    /// Reads this frame's keyboard input.
    pub fn poll(&mut self) -> FormAction {
        let mut action = FormAction::None;
        while let Some(ch) = get_char_pressed() {
            action = merge(action, self.apply(FormInput::Char(ch)));
        }
        if is_key_pressed(KeyCode::Backspace) {
            action = merge(action, self.apply(FormInput::Backspace));
        }
        if is_key_pressed(KeyCode::Tab) {
            action = merge(action, self.apply(FormInput::NextField));
        }
        if is_key_pressed(KeyCode::Enter) || is_key_pressed(KeyCode::KpEnter) {
            action = merge(action, self.apply(FormInput::Submit));
        }
        action
    }

    pub fn apply(&mut self, input: FormInput) -> FormAction {
        match input {
            FormInput::Char(ch) if ch.is_ascii_digit() => {
                let field = self.field_mut();
                if field.len() >= MAX_FIELD_DIGITS {
                    return FormAction::None;
                }
                if field.as_str() == "0" {
                    field.clear();
                }
                field.push(ch);
                FormAction::Edited
            }
            FormInput::Char(_) => FormAction::None,
            FormInput::Backspace => {
                if self.field_mut().pop().is_some() {
                    FormAction::Edited
                } else {
                    FormAction::None
                }
            }
            FormInput::NextField => {
                self.focus = self.focus.other();
                FormAction::None
            }
            FormInput::Submit => FormAction::Submit,
        }
    }

    fn field_mut(&mut self) -> &mut String {
        match self.focus {
            Field::Hours => &mut self.hours,
            Field::Minutes => &mut self.minutes,
        }
    }
}

fn merge(current: FormAction, next: FormAction) -> FormAction {
    match (current, next) {
        (FormAction::Submit, _) | (_, FormAction::Submit) => FormAction::Submit,
        (FormAction::Edited, _) | (_, FormAction::Edited) => FormAction::Edited,
        _ => FormAction::None,
    }
}

/// Left mouse presses on the dismiss button.
pub fn button_pressed(position: Vec2, size: f32, mouse: Vec2, mouse_pressed: bool) -> bool {
    mouse_pressed && Rect::new(position.x, position.y, size, size).contains(mouse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_replace_a_lone_zero() {
        let mut form = SettingsForm::new(AlarmConfig::new(0, 0));
        form.set_focus(Field::Hours);
        assert_eq!(form.apply(FormInput::Char('2')), FormAction::Edited);
        assert_eq!(form.text(Field::Hours), "2");
        assert_eq!(form.config(), AlarmConfig::new(2, 0));
    }

    #[test]
    fn non_digits_are_ignored() {
        let mut form = SettingsForm::new(AlarmConfig::new(0, 5));
        assert_eq!(form.apply(FormInput::Char('x')), FormAction::None);
        assert_eq!(form.text(Field::Minutes), "5");
    }

    #[test]
    fn fields_are_length_limited() {
        let mut form = SettingsForm::new(AlarmConfig::new(0, 0));
        for ch in "123456".chars() {
            form.apply(FormInput::Char(ch));
        }
        assert_eq!(form.text(Field::Minutes), "1234");
    }

    #[test]
    fn emptied_field_counts_as_zero() {
        let mut form = SettingsForm::new(AlarmConfig::new(1, 7));
        assert_eq!(form.apply(FormInput::Backspace), FormAction::Edited);
        assert_eq!(form.apply(FormInput::Backspace), FormAction::None);
        assert_eq!(form.config(), AlarmConfig::new(1, 0));
    }

    #[test]
    fn tab_switches_focus_and_enter_submits() {
        let mut form = SettingsForm::new(AlarmConfig::default());
        assert_eq!(form.focus(), Field::Minutes);
        form.apply(FormInput::NextField);
        assert_eq!(form.focus(), Field::Hours);
        assert_eq!(form.apply(FormInput::Submit), FormAction::Submit);
    }

    #[test]
    fn button_hit_requires_press_inside() {
        let position = vec2(100.0, 100.0);
        assert!(button_pressed(position, 50.0, vec2(120.0, 140.0), true));
        assert!(!button_pressed(position, 50.0, vec2(120.0, 140.0), false));
        assert!(!button_pressed(position, 50.0, vec2(90.0, 140.0), true));
    }
}
