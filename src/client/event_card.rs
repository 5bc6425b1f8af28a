use crate::models::{Event, Interest};

/// Identifier of skeleton cards shown before the feed loads.
pub const PLACEHOLDER_EVENT_ID: &str = "dummy";

pub const PLACEHOLDER_COVER: &str = "/event-placeholder.jpg";

pub const COVER_HEIGHT: u32 = 140;

/// Descriptions of this many characters or more are cut.
pub const DESCRIPTION_LIMIT: usize = 120;

const ELLIPSIS: &str = "...";

/// Requested avatar slots. The group never shows fewer than two.
pub const INTEREST_AVATAR_MAX: usize = 1;

/// Shortens `description` to its first `DESCRIPTION_LIMIT - 1` characters
/// followed by `...` once it reaches `DESCRIPTION_LIMIT` characters.
pub fn truncate_description(description: &str) -> String {
    if description.chars().count() < DESCRIPTION_LIMIT {
        return description.to_string();
    }
    let mut truncated: String = description.chars().take(DESCRIPTION_LIMIT - 1).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

/// Navigation target of the card; `None` for placeholder cards.
pub fn event_route(event: &Event) -> Option<String> {
    (event.id != PLACEHOLDER_EVENT_ID).then(|| format!("/events/{}", event.id))
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoverImage {
    pub src: String,
    pub alt: String,
    pub title: String,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterestAvatar {
    pub key: String,
    pub src: Option<String>,
    pub alt: String,
}

/// Avatars that fit plus the `+N` overflow slot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AvatarGroupView {
    pub avatars: Vec<InterestAvatar>,
    /// Number shown in the overflow slot; 0 hides it.
    pub surplus: usize,
}

/// Lays out an avatar group. `max` below 2 is treated as 2, and when the
/// interests overflow the last slot becomes the `+N` counter.
pub fn avatar_group(interests: &[Interest], max: usize) -> AvatarGroupView {
    let max = max.max(2);
    let surplus = if interests.len() > max {
        interests.len() - max + 1
    } else {
        0
    };

    let avatars = interests[..interests.len() - surplus]
        .iter()
        .map(|interest| InterestAvatar {
            key: interest.id.clone(),
            src: interest.avatar.clone(),
            alt: interest.name.clone(),
        })
        .collect();

    AvatarGroupView { avatars, surplus }
}

/// EventCardView
///
/// What the event card renders for one event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventCardView {
    /// `None` disables the action area.
    pub link: Option<String>,
    pub cover: CoverImage,
    pub title: String,
    pub interests: AvatarGroupView,
    pub description: String,
}

impl EventCardView {
    pub fn render(event: &Event) -> Self {
        Self {
            link: event_route(event),
            cover: CoverImage {
                src: event
                    .cover_photo
                    .clone()
                    .unwrap_or_else(|| PLACEHOLDER_COVER.to_string()),
                alt: event.name.clone(),
                title: event.name.clone(),
                height: COVER_HEIGHT,
            },
            title: event.name.clone(),
            interests: avatar_group(&event.related_interests, INTEREST_AVATAR_MAX),
            description: truncate_description(&event.description),
        }
    }

    pub fn is_clickable(&self) -> bool {
        self.link.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interest(n: usize) -> Interest {
        Interest {
            id: format!("interest-{n}"),
            name: format!("Interest {n}"),
            avatar: None,
        }
    }

    fn event(id: &str, description: &str) -> Event {
        Event {
            id: id.to_string(),
            name: "Board games night".to_string(),
            description: description.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn short_descriptions_are_kept_whole() {
        let text = "a".repeat(DESCRIPTION_LIMIT - 1);
        assert_eq!(truncate_description(&text), text);
        assert_eq!(truncate_description(""), "");
    }

    #[test]
    fn descriptions_at_the_limit_are_cut_to_119_characters() {
        let text = "b".repeat(DESCRIPTION_LIMIT);
        let truncated = truncate_description(&text);
        assert_eq!(truncated, format!("{}...", "b".repeat(119)));

        let long = "c".repeat(500);
        assert_eq!(truncate_description(&long).chars().count(), 119 + 3);
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let text = "é".repeat(DESCRIPTION_LIMIT + 5);
        let truncated = truncate_description(&text);
        assert!(truncated.starts_with(&"é".repeat(119)));
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn placeholder_cards_are_not_clickable() {
        let card = EventCardView::render(&event(PLACEHOLDER_EVENT_ID, "Loading"));
        assert!(!card.is_clickable());
        assert_eq!(card.cover.src, PLACEHOLDER_COVER);
    }

    #[test]
    fn real_cards_link_to_the_event() {
        let mut real = event("65f1c2", "Bring snacks");
        real.cover_photo = Some("https://cdn.example.com/cover.jpg".to_string());

        let card = EventCardView::render(&real);
        assert_eq!(card.link.as_deref(), Some("/events/65f1c2"));
        assert_eq!(card.cover.src, "https://cdn.example.com/cover.jpg");
        assert_eq!(card.cover.height, COVER_HEIGHT);
    }

    #[test]
    fn avatar_group_clamps_to_two_slots() {
        let two: Vec<_> = (0..2).map(interest).collect();
        let group = avatar_group(&two, INTEREST_AVATAR_MAX);
        assert_eq!(group.avatars.len(), 2);
        assert_eq!(group.surplus, 0);

        let five: Vec<_> = (0..5).map(interest).collect();
        let group = avatar_group(&five, INTEREST_AVATAR_MAX);
        assert_eq!(group.avatars.len(), 1);
        assert_eq!(group.avatars[0].key, "interest-0");
        assert_eq!(group.surplus, 4);

        assert_eq!(avatar_group(&[], INTEREST_AVATAR_MAX), AvatarGroupView::default());
    }
}
