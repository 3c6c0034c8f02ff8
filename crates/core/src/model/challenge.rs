use crate::model::content::{Catalog, ContentItem};
use crate::model::ids::{CategoryId, ItemId};
use crate::model::phrases::Phrasebook;

/// One question or round: the item to find plus what gets narrated around it.
///
/// `options` is `None` when the session draws distractors itself; modes with a
/// fixed line-up (odd-one-out) carry all their options, answer included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    answer: ContentItem,
    options: Option<Vec<ContentItem>>,
    prompt: Option<String>,
    hint: Option<String>,
    praise: Vec<String>,
    reveal: Vec<String>,
}

impl Challenge {
    /// Show the picture, pick its name.
    #[must_use]
    pub fn identify(item: ContentItem, phrases: &Phrasebook) -> Self {
        Self {
            praise: vec![phrases.praise_item(item.display_name())],
            reveal: vec![item.display_name().to_owned()],
            options: None,
            prompt: None,
            hint: None,
            answer: item,
        }
    }

    /// Hear the name, tap the picture.
    #[must_use]
    pub fn listen(item: ContentItem, phrases: &Phrasebook) -> Self {
        Self {
            praise: vec![phrases.praise.clone()],
            reveal: vec![item.display_name().to_owned()],
            prompt: Some(item.audio_prompt().to_owned()),
            options: None,
            hint: None,
            answer: item,
        }
    }

    /// Find the item that belongs to a different category than the other three.
    #[must_use]
    pub fn odd_one_out(round: OddRound, catalog: &Catalog, phrases: &Phrasebook) -> Self {
        let category_name = |id: &CategoryId| {
            catalog
                .category(id)
                .map_or_else(|| id.to_string(), |c| c.display_name.clone())
        };
        let main_name = category_name(&round.main_category);
        let odd_name = category_name(&round.odd_category);
        let main_emoji = catalog
            .category(&round.main_category)
            .map(|c| c.emoji.clone())
            .unwrap_or_default();

        let same_names = round
            .same
            .iter()
            .map(ContentItem::display_name)
            .collect::<Vec<_>>()
            .join(", ");
        let why_odd = phrases.odd_explanation(round.odd.display_name(), &odd_name);
        let why_same = phrases.group_explanation(&same_names, &main_name);

        let mut options = round.same;
        options.push(round.odd.clone());

        Self {
            answer: round.odd,
            options: Some(options),
            prompt: Some(phrases.who_doesnt_belong.clone()),
            hint: Some(phrases.odd_hint(&main_emoji, &main_name)),
            praise: vec![phrases.praise.clone(), why_odd.clone(), why_same.clone()],
            reveal: vec![why_odd, why_same],
        }
    }

    #[must_use]
    pub fn answer(&self) -> &ContentItem {
        &self.answer
    }

    #[must_use]
    pub fn answer_id(&self) -> &ItemId {
        self.answer.id()
    }

    #[must_use]
    pub fn fixed_options(&self) -> Option<&[ContentItem]> {
        self.options.as_deref()
    }

    #[must_use]
    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref()
    }

    #[must_use]
    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    #[must_use]
    pub fn praise(&self) -> &[String] {
        &self.praise
    }

    #[must_use]
    pub fn reveal(&self) -> &[String] {
        &self.reveal
    }
}

/// Three items sharing a category and one that does not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OddRound {
    pub main_category: CategoryId,
    pub odd_category: CategoryId,
    pub same: Vec<ContentItem>,
    pub odd: ContentItem,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::content::Category;

    fn item(id: &str, name: &str, cat: &str) -> ContentItem {
        ContentItem::new(id, name).unwrap().with_category(cat)
    }

    #[test]
    fn identify_praises_with_name() {
        let phrases = Phrasebook::default();
        let ch = Challenge::identify(item("bus", "Bus", "public"), &phrases);
        assert_eq!(ch.praise(), [format!("{} Bus", phrases.praise)]);
        assert_eq!(ch.reveal(), ["Bus".to_owned()]);
        assert!(ch.fixed_options().is_none());
        assert!(ch.prompt().is_none());
    }

    #[test]
    fn odd_one_out_carries_all_four_options() {
        let catalog = Catalog::new(
            vec![
                item("bus", "Bus", "public"),
                item("taxi", "Taxi", "public"),
                item("tram", "Tram", "public"),
                item("truck", "Truck", "commercial"),
            ],
            vec![
                Category::new("public", "public transport").with_emoji("P"),
                Category::new("commercial", "work vehicle"),
            ],
        )
        .unwrap();
        let round = OddRound {
            main_category: "public".into(),
            odd_category: "commercial".into(),
            same: catalog.items()[..3].to_vec(),
            odd: catalog.items()[3].clone(),
        };
        let phrases = Phrasebook::default();
        let ch = Challenge::odd_one_out(round, &catalog, &phrases);

        assert_eq!(ch.answer_id().as_str(), "truck");
        assert_eq!(ch.fixed_options().unwrap().len(), 4);
        assert_eq!(ch.praise().len(), 3);
        assert_eq!(ch.reveal().len(), 2);
        assert!(ch.reveal()[1].starts_with("Bus, Taxi, Tram"));
        assert!(ch.hint().unwrap().contains("P public transport"));
    }
}
