use gefen_core::model::{Catalog, Category, ContentError, ContentItem};

fn item(
    id: &str,
    name: &str,
    category: &str,
    fact: &str,
) -> Result<ContentItem, ContentError> {
    Ok(ContentItem::new(id, name)?
        .with_category(category)
        .with_fun_fact(fact))
}

/// Built-in vehicles, Hebrew names.
pub fn vehicles() -> Result<Catalog, ContentError> {
    let items = vec![
        item("bus", "אוטובוס", "public", "אוטובוס יכול להסיע חמישים אנשים בבת אחת"),
        item("train", "רכבת", "public", "רכבת נוסעת על מסילה"),
        item("light_rail", "רכבת קלה", "public", "הרכבת הקלה נוסעת בתוך העיר"),
        item("taxi", "מונית", "public", "למונית יש שלט צהוב על הגג"),
        item("ambulance", "אמבולנס", "emergency", "אמבולנס מביא חולים לבית החולים"),
        item("fire_truck", "כבאית", "emergency", "לכבאית יש סולם ארוך מאוד"),
        item("police_car", "ניידת משטרה", "emergency", "לניידת יש סירנה ואורות כחולים"),
        item("truck", "משאית", "work", "משאית מובילה סחורה מעיר לעיר"),
        item("tractor", "טרקטור", "work", "טרקטור עובד בשדה"),
        item("crane", "מנוף", "work", "מנוף מרים דברים כבדים מאוד"),
        item("garbage_truck", "משאית זבל", "work", "משאית הזבל עוברת ברחוב בבוקר"),
        item("car", "מכונית", "private", "לרוב המכוניות יש ארבעה גלגלים"),
        item("motorcycle", "אופנוע", "private", "לאופנוע יש שני גלגלים"),
        item("bicycle", "אופניים", "private", "אופניים לא צריכים דלק"),
        item("scooter", "קורקינט", "private", "דוחפים את הקורקינט ברגל"),
        item("airplane", "מטוס", "sky", "מטוס טס מעל העננים"),
        item("helicopter", "מסוק", "sky", "מסוק יכול לעמוד באוויר במקום"),
        item("hot_air_balloon", "כדור פורח", "sky", "כדור פורח עף בעזרת אוויר חם"),
        item("ship", "אונייה", "sea", "אונייה גדולה שטה בים"),
        item("sailboat", "מפרשית", "sea", "מפרשית שטה בעזרת הרוח"),
        item("submarine", "צוללת", "sea", "צוללת שטה מתחת למים"),
    ]
    .into_iter()
    .collect::<Result<Vec<_>, _>>()?;

    let categories = vec![
        Category::new("public", "תחבורה ציבורית").with_emoji("🚌"),
        Category::new("emergency", "רכבי חירום").with_emoji("🚨"),
        Category::new("work", "רכבי עבודה").with_emoji("🚜"),
        Category::new("private", "רכב פרטי").with_emoji("🚗"),
        Category::new("sky", "כלי טיס").with_emoji("✈️"),
        Category::new("sea", "כלי שיט").with_emoji("🚢"),
    ];
    Catalog::new(items, categories)
}

/// Car makers for the brands tour and quiz.
pub fn brands() -> Result<Catalog, ContentError> {
    let items = [
        ("toyota", "טויוטה", "טויוטה היא חברה מיפן"),
        ("mazda", "מאזדה", "גם מאזדה מגיעה מיפן"),
        ("hyundai", "יונדאי", "יונדאי מגיעה מקוריאה"),
        ("kia", "קיה", "קיה היא חברה קוריאנית"),
        ("skoda", "סקודה", "סקודה מגיעה מצ'כיה"),
        ("volkswagen", "פולקסווגן", "פולקסווגן פירושו מכונית העם"),
        ("ford", "פורד", "פורד מגיעה מאמריקה"),
        ("tesla", "טסלה", "טסלה נוסעת על חשמל"),
        ("volvo", "וולוו", "וולוו מגיעה משוודיה"),
        ("fiat", "פיאט", "פיאט מגיעה מאיטליה"),
    ]
    .into_iter()
    .map(|(id, name, fact)| ContentItem::new(id, name).map(|i| i.with_fun_fact(fact)))
    .collect::<Result<Vec<_>, _>>()?;
    Catalog::new(items, Vec::new())
}

/// Car parts for the parts tour, quiz and matching board.
pub fn parts() -> Result<Catalog, ContentError> {
    let items = [
        ("steering_wheel", "הגה", "בעזרת ההגה הנהג מחליט לאן לפנות"),
        ("wheel", "גלגל", "לרוב המכוניות יש ארבעה גלגלים"),
        ("engine", "מנוע", "המנוע נותן למכונית את הכוח לנסוע"),
        ("headlights", "פנסים", "הפנסים מאירים את הכביש בלילה"),
        ("brakes", "בלמים", "הבלמים עוצרים את המכונית"),
        ("seatbelt", "חגורת בטיחות", "חוגרים חגורת בטיחות לפני כל נסיעה"),
        ("mirror", "מראה", "במראה הנהג רואה מה קורה מאחור"),
        ("horn", "צופר", "הצופר עושה ביפ ביפ"),
        ("wipers", "מגבים", "המגבים מנקים את החלון כשיורד גשם"),
        ("gear_stick", "ידית הילוכים", "בעזרת ידית ההילוכים נוסעים קדימה ואחורה"),
    ]
    .into_iter()
    .map(|(id, name, fact)| ContentItem::new(id, name).map(|i| i.with_fun_fact(fact)))
    .collect::<Result<Vec<_>, _>>()?;
    Catalog::new(items, Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_catalogs_are_consistent() {
        let vehicles = vehicles().unwrap();
        assert!(vehicles.len() >= 12);
        assert!(vehicles.items().iter().all(|i| i.fun_fact().is_some()));
        assert!(
            vehicles
                .categories()
                .iter()
                .all(|c| vehicles.items_in(&c.id).count() >= 3)
        );
        assert_eq!(brands().unwrap().len(), 10);

        let parts = parts().unwrap();
        assert_eq!(parts.len(), 10);
        assert!(parts.categories().is_empty());
        assert!(parts.items().iter().all(|i| i.fun_fact().is_some()));
    }
}
