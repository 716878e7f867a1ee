use super::{icon_type::IconType, identifiable::Identifiable};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Favicon {
    id: Option<i64>,
    url: String,
    date: DateTime<Utc>,
    width: Option<u32>,
    height: Option<u32>,
    icon_type: Option<IconType>,
}

impl Favicon {
    pub fn new(url: impl Into<String>, icon_type: Option<IconType>) -> Self {
        Self::with_date(url, Utc::now(), icon_type)
    }

    pub fn with_date(
        url: impl Into<String>,
        date: DateTime<Utc>,
        icon_type: Option<IconType>,
    ) -> Self {
        Self {
            id: None,
            url: url.into(),
            date,
            width: None,
            height: None,
            icon_type,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn width(&self) -> Option<u32> {
        self.width
    }

    pub fn height(&self) -> Option<u32> {
        self.height
    }

    pub fn icon_type(&self) -> Option<IconType> {
        self.icon_type
    }

    /// Records image dimensions once they are known.
    pub fn set_dimensions(&mut self, width: Option<u32>, height: Option<u32>) {
        self.width = width;
        self.height = height;
    }

    /// Called by the persistence layer once the row exists.
    pub fn assign_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    pub fn area(&self) -> Option<u64> {
        match (self.width, self.height) {
            (Some(width), Some(height)) => Some(u64::from(width) * u64::from(height)),
            _ => None,
        }
    }

    /// Compares discovery methods only. An untyped favicon loses to any typed one.
    pub fn is_preferred_to(&self, other: &Favicon) -> bool {
        match (self.icon_type, other.icon_type) {
            (Some(ours), Some(theirs)) => ours.is_preferred_to(theirs),
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    fn selection_order(&self, other: &Favicon) -> Ordering {
        let type_order = match (self.icon_type, other.icon_type) {
            (Some(ours), Some(theirs)) => ours.cmp_rank(theirs),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };
        type_order
            .then_with(|| self.area().cmp(&other.area()))
            .then_with(|| self.date.cmp(&other.date))
    }
}

impl Identifiable for Favicon {
    fn id(&self) -> Option<i64> {
        self.id
    }
}

/// Picks the best icon among candidates: highest `IconType` rank, then the largest, then the newest.
pub fn select_best<'a, I>(candidates: I) -> Option<&'a Favicon>
where
    I: IntoIterator<Item = &'a Favicon>,
{
    candidates
        .into_iter()
        .max_by(|a, b| a.selection_order(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::identifiable::identity_eq;
    use chrono::TimeZone;

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(seconds, 0).single().unwrap()
    }

    #[test]
    fn new_favicon_has_no_id_or_dimensions() {
        let favicon = Favicon::new("https://example.com/favicon.ico", Some(IconType::Icon));
        assert_eq!(favicon.id(), None);
        assert_eq!(favicon.url(), "https://example.com/favicon.ico");
        assert_eq!(favicon.width(), None);
        assert_eq!(favicon.area(), None);
        assert!(favicon.date() <= Utc::now());
    }

    #[test]
    fn dimensions_can_be_filled_in_later() {
        let mut favicon = Favicon::with_date("https://a.test/i.png", at(10), None);
        favicon.set_dimensions(Some(32), Some(16));
        assert_eq!(favicon.width(), Some(32));
        assert_eq!(favicon.height(), Some(16));
        assert_eq!(favicon.area(), Some(512));
        assert_eq!(favicon.date(), at(10));
    }

    #[test]
    fn preference_uses_icon_type() {
        let precomposed = Favicon::new("a", Some(IconType::AppleIconPrecomposed));
        let guess = Favicon::new("b", Some(IconType::Guess));
        let untyped = Favicon::new("c", None);
        assert!(precomposed.is_preferred_to(&guess));
        assert!(!guess.is_preferred_to(&precomposed));
        assert!(guess.is_preferred_to(&untyped));
        assert!(!untyped.is_preferred_to(&guess));
        assert!(!untyped.is_preferred_to(&untyped));
    }

    #[test]
    fn identity_ignores_other_fields() {
        let mut a = Favicon::new("https://one.test/a.ico", Some(IconType::Icon));
        let mut b = Favicon::new("https://two.test/b.ico", Some(IconType::Guess));
        a.assign_id(3);
        b.assign_id(3);
        assert!(identity_eq(&a, &b));
        b.assign_id(4);
        assert!(!identity_eq(&a, &b));
    }

    #[test]
    fn select_best_prefers_rank_then_size_then_recency() {
        let mut small_apple = Favicon::with_date("apple-small", at(1), Some(IconType::AppleIcon));
        small_apple.set_dimensions(Some(57), Some(57));
        let mut large_apple = Favicon::with_date("apple-large", at(1), Some(IconType::AppleIcon));
        large_apple.set_dimensions(Some(180), Some(180));
        let mut huge_guess = Favicon::with_date("guess", at(5), Some(IconType::Guess));
        huge_guess.set_dimensions(Some(512), Some(512));
        let untyped = Favicon::with_date("untyped", at(9), None);

        let candidates = vec![
            huge_guess.clone(),
            small_apple.clone(),
            untyped.clone(),
            large_apple.clone(),
        ];
        assert_eq!(select_best(&candidates).map(Favicon::url), Some("apple-large"));

        let older = Favicon::with_date("older", at(1), Some(IconType::Icon));
        let newer = Favicon::with_date("newer", at(2), Some(IconType::Icon));
        assert_eq!(select_best([&older, &newer]).map(Favicon::url), Some("newer"));

        assert_eq!(select_best(&[untyped, huge_guess]).map(Favicon::url), Some("guess"));
        assert!(select_best(&Vec::<Favicon>::new()).is_none());
    }
}
