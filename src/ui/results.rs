//! Result grid: draws [`ResultLayout`]s as cards.

use std::collections::HashMap;

use iced::alignment::{Horizontal, Vertical};
use iced::widget::{button, column, container, image, row, stack, text, Column, Space};
use iced::{Background, Color, ContentFit, Element, Length, Padding};

use super::theme::{self, DarkTheme};
use crate::backend::types::{SearchResult, SearchSource};
use crate::render::{self, ResultLayout, Variant};

/// Decoded media keyed by [`SearchResult::display_key`].
pub type Thumbnails = HashMap<String, image::Handle>;

/// What a card can do with its link.
pub struct Actions<F, G> {
    pub open: F,
    pub copy: G,
}

/// Cards for `results` laid out in the grid for `source`. A card shows its
/// image once it is in `thumbnails` and the image URL until then.
pub fn view<'a, Message, F, G>(
    results: &[SearchResult],
    source: SearchSource,
    thumbnails: Option<&Thumbnails>,
    actions: Actions<F, G>,
) -> Element<'a, Message>
where
    Message: Clone + 'a,
    F: Fn(String) -> Message,
    G: Fn(String) -> Message,
{
    let columns = render::grid_columns(source);
    let mut cards = results
        .iter()
        .enumerate()
        .map(|(index, result)| {
            let thumbnail = thumbnails
                .and_then(|thumbnails| thumbnails.get(&result.display_key(index)))
                .cloned();
            card(render::layout(result, source), thumbnail, &actions)
        })
        .peekable();

    let mut grid = Column::new().spacing(12);
    while cards.peek().is_some() {
        let mut line = iced::widget::Row::new().spacing(12);
        let mut filled = 0;
        for card in cards.by_ref().take(columns) {
            line = line.push(card);
            filled += 1;
        }
        for _ in filled..columns {
            line = line.push(Space::with_width(Length::Fill));
        }
        grid = grid.push(line);
    }

    grid.into()
}

fn label(variant: Variant) -> &'static str {
    match variant {
        Variant::Web => "WEB",
        Variant::ImageTile => "IMAGE",
        Variant::VideoCard => "VIDEO",
        Variant::PlaceCard => "PLACE",
        Variant::NewsItem => "NEWS",
        Variant::ShoppingCard => "SHOP",
        Variant::ScholarItem => "PAPER",
    }
}

/// Height of the media area; video thumbnails keep roughly 16:9 in a
/// three-column grid, image tiles stay near square in four columns.
fn media_height(variant: Variant) -> f32 {
    match variant {
        Variant::ImageTile => 200.0,
        Variant::VideoCard => 170.0,
        _ => 140.0,
    }
}

fn media<'a, Message: 'a>(
    variant: Variant,
    handle: image::Handle,
    badge: Option<&str>,
) -> Element<'a, Message> {
    let picture = image(handle)
        .width(Length::Fill)
        .height(Length::Fixed(media_height(variant)))
        .content_fit(ContentFit::Cover);

    // Video duration sits on the thumbnail.
    match badge.filter(|_| variant == Variant::VideoCard) {
        Some(duration) => stack![
            picture,
            container(
                container(text(duration.to_string()).size(12).color(DarkTheme::TEXT))
                    .padding(Padding::from([2.0, 6.0]))
                    .style(|_theme| container::Style {
                        background: Some(Background::Color(Color::from_rgba(0.0, 0.0, 0.0, 0.75))),
                        border: iced::Border {
                            radius: 4.0.into(),
                            ..Default::default()
                        },
                        ..Default::default()
                    }),
            )
            .padding(6)
            .width(Length::Fill)
            .height(Length::Fill)
            .align_x(Horizontal::Right)
            .align_y(Vertical::Bottom),
        ]
        .into(),
        None => picture.into(),
    }
}

fn card<'a, Message, F, G>(
    layout: ResultLayout,
    thumbnail: Option<image::Handle>,
    actions: &Actions<F, G>,
) -> Element<'a, Message>
where
    Message: Clone + 'a,
    F: Fn(String) -> Message,
    G: Fn(String) -> Message,
{
    let compact = layout.variant == Variant::ImageTile;
    let badge_on_media = thumbnail.is_some() && layout.variant == Variant::VideoCard;

    let mut header = row![
        text(label(layout.variant)).size(11).color(DarkTheme::PRIMARY),
        text(layout.title.clone()).size(15).color(DarkTheme::TEXT),
    ]
    .spacing(8)
    .align_y(iced::Alignment::Center);
    if let Some(badge) = layout.badge.as_ref().filter(|_| !badge_on_media) {
        header = header
            .push(Space::with_width(Length::Fill))
            .push(text(badge.clone()).size(12).color(DarkTheme::PRIMARY));
    }

    let mut body = column![].spacing(4);
    match thumbnail {
        Some(handle) => body = body.push(media(layout.variant, handle, layout.badge.as_deref())),
        None => {
            if let Some(url) = &layout.media {
                body = body.push(
                    text(format!("image: {url}"))
                        .size(11)
                        .color(DarkTheme::TEXT_PLACEHOLDER),
                );
            }
        }
    }
    body = body.push(header);

    if !compact {
        body = body.push(text(layout.host.clone()).size(12).color(DarkTheme::TEXT_MUTED));
    }
    if !layout.meta.is_empty() {
        body = body.push(
            text(layout.meta.join(" · "))
                .size(12)
                .color(DarkTheme::TEXT_MUTED),
        );
    }
    if let Some(snippet) = layout.body.as_ref().filter(|_| !compact) {
        body = body.push(text(snippet.clone()).size(13).color(DarkTheme::TEXT));
    }

    let open = button(body)
        .padding(0)
        .width(Length::Fill)
        .on_press((actions.open)(layout.link.clone()))
        .style(button::text);
    let copy = button(text("Copy link").size(11))
        .padding(Padding::from([2.0, 6.0]))
        .on_press((actions.copy)(layout.link))
        .style(button::text);

    container(column![open, row![Space::with_width(Length::Fill), copy]].spacing(4))
        .padding(Padding::new(12.0))
        .width(Length::Fill)
        .style(theme::panel)
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_plain_ascii() {
        for variant in [
            Variant::Web,
            Variant::ImageTile,
            Variant::VideoCard,
            Variant::PlaceCard,
            Variant::NewsItem,
            Variant::ShoppingCard,
            Variant::ScholarItem,
        ] {
            assert!(label(variant).is_ascii());
        }
    }

    #[test]
    fn image_tiles_are_taller_than_other_media() {
        assert!(media_height(Variant::ImageTile) > media_height(Variant::VideoCard));
        assert!(media_height(Variant::VideoCard) > media_height(Variant::ShoppingCard));
    }
}
