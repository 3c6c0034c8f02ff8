use serde::{Deserialize, Serialize};

use crate::model::mode::GameMode;

/// Every sentence the shell narrates, so a deployment can swap the language.
///
/// Defaults are Hebrew, matching the default `he-IL` voice target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Phrasebook {
    pub praise: String,
    pub try_again: String,
    pub perfect: String,
    pub who_doesnt_belong: String,
    pub quiz_done: String,
    pub sound_quiz_done: String,
    pub parts_quiz_done: String,
    pub odd_done: String,
    pub matching_done: String,
    pub puzzle_intro: String,
    pub puzzle_done: String,
    pub out_of: String,
    pub odd_because: String,
    pub they_are: String,
    pub hint_three_are: String,
    pub progress_reset: String,
}

impl Default for Phrasebook {
    fn default() -> Self {
        Self {
            praise: "כל הכבוד!".into(),
            try_again: "נסה שוב".into(),
            perfect: "מושלם!".into(),
            who_doesnt_belong: "מי לא שייך?".into(),
            quiz_done: "סיימת את החידון!".into(),
            sound_quiz_done: "סיימת את חידון השמע!".into(),
            parts_quiz_done: "סיימת את חידון החלקים!".into(),
            odd_done: "סיימת!".into(),
            matching_done: "כל הכבוד! מצאת את כל הזוגות!".into(),
            puzzle_intro: "הרכב את הפאזל של".into(),
            puzzle_done: "כל הכבוד! הרכבת את הפאזל!".into(),
            out_of: "מתוך".into(),
            odd_because: "לא שייך כי הוא".into(),
            they_are: "הם".into(),
            hint_three_are: "רמז: שלושה מהם".into(),
            progress_reset: "כל ההתקדמות אופסה".into(),
        }
    }
}

impl Phrasebook {
    /// "Well done! <name>"
    #[must_use]
    pub fn praise_item(&self, name: &str) -> String {
        format!("{} {name}", self.praise)
    }

    /// Spoken once a scored run ends.
    #[must_use]
    pub fn finish_line(&self, mode: GameMode, perfect: bool) -> String {
        let lead = match mode {
            GameMode::SoundQuiz => &self.sound_quiz_done,
            GameMode::PartsQuiz => &self.parts_quiz_done,
            GameMode::OddOneOut => &self.odd_done,
            _ => &self.quiz_done,
        };
        let tail = if perfect { &self.perfect } else { &self.praise };
        format!("{lead} {tail}")
    }

    /// "<placed> out of <total>"
    #[must_use]
    pub fn progress(&self, placed: usize, total: usize) -> String {
        format!("{placed} {} {total}", self.out_of)
    }

    #[must_use]
    pub fn puzzle_intro(&self, name: &str) -> String {
        format!("{} {name}", self.puzzle_intro)
    }

    /// "<odd> doesn't belong because it is <category>"
    #[must_use]
    pub fn odd_explanation(&self, odd_name: &str, odd_category: &str) -> String {
        format!("{odd_name} {} {odd_category}", self.odd_because)
    }

    /// "<a, b, c> are <category>"
    #[must_use]
    pub fn group_explanation(&self, names: &str, category: &str) -> String {
        format!("{names} {} {category}", self.they_are)
    }

    #[must_use]
    pub fn odd_hint(&self, emoji: &str, category: &str) -> String {
        if emoji.is_empty() {
            format!("{} {category}", self.hint_three_are)
        } else {
            format!("{} {emoji} {category}", self.hint_three_are)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_line_depends_on_mode_and_perfection() {
        let p = Phrasebook::default();
        assert_eq!(p.finish_line(GameMode::Quiz, true), "סיימת את החידון! מושלם!");
        assert_eq!(p.finish_line(GameMode::OddOneOut, false), "סיימת! כל הכבוד!");
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let p: Phrasebook = serde_json::from_str(r#"{"praise":"Well done!"}"#).unwrap();
        assert_eq!(p.praise_item("Bus"), "Well done! Bus");
        assert_eq!(p.try_again, Phrasebook::default().try_again);
    }
}
