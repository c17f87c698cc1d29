//! Search bar widget

use iced::widget::{button, container, row, text, text_input};
use iced::{Background, Border, Color, Element, Length, Padding};

use super::theme::DarkTheme;

/// Query input plus submit button. Submitting while a run is in flight
/// starts a new run that supersedes it.
pub fn view<'a, Message: Clone + 'a>(
    value: &str,
    on_input: impl Fn(String) -> Message + 'a,
    on_submit: Message,
) -> Element<'a, Message> {
    let input = text_input("Ask anything...", value)
        .on_input(on_input)
        .on_submit(on_submit.clone())
        .padding(Padding::new(14.0))
        .size(18)
        .style(|_theme, _status| text_input::Style {
            background: Background::Color(Color::TRANSPARENT),
            border: Border::default(),
            icon: DarkTheme::TEXT_MUTED,
            placeholder: DarkTheme::TEXT_PLACEHOLDER,
            value: DarkTheme::TEXT,
            selection: DarkTheme::PRIMARY,
        });

    let submit = button(text("Search").size(15))
        .padding(Padding::from([10.0, 18.0]))
        .on_press(on_submit)
        .style(button::primary);

    container(row![input, submit].spacing(8).align_y(iced::Alignment::Center))
        .padding(Padding::from([6.0, 10.0]))
        .width(Length::Fill)
        .style(|_theme| container::Style {
            background: Some(Background::Color(DarkTheme::SURFACE)),
            border: Border {
                color: DarkTheme::BORDER,
                width: 1.0,
                radius: 12.0.into(),
            },
            ..Default::default()
        })
        .into()
}
