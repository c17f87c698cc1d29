//! Core application state and Iced Application implementation
//!
//! The window is a thin shell over [`Orchestrator`]: user input becomes
//! orchestrator calls, network steps run as [`Task`]s, and their outcomes come
//! back as messages tagged with the run they belong to.

use iced::keyboard::{self, Key};
use iced::widget::{button, column, container, image, row, scrollable, text, Space};
use iced::{Element, Event, Length, Padding, Subscription, Task, Theme};

use crate::backend::media::MediaClient;
use crate::backend::search::SerperClient;
use crate::backend::synthesis::OpenAiClient;
use crate::backend::types::{SearchResult, SearchSource};
use crate::backend::{SearchProvider, SynthesisProvider};
use crate::credentials::CredentialStore;
use crate::error::ClientError;
use crate::native::links;
use crate::orchestrator::{MediaTicket, Orchestrator, Phase, RunId, SearchTicket, SynthesisTicket};
use crate::ui::results::Thumbnails;
use crate::ui::settings::{SettingsForm, SettingsMessage};
use crate::ui::theme::{self, DarkTheme};
use crate::ui::{results, search_bar};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UIMode {
    #[default]
    Search,
    Settings,
}

pub struct OpenResearch {
    query: String,
    mode: UIMode,
    orchestrator: Orchestrator,
    search: SerperClient,
    synthesis: OpenAiClient,
    media: MediaClient,
    /// Decoded images for the results of `thumbnails_run`.
    thumbnails: Thumbnails,
    thumbnails_run: Option<RunId>,
    settings: SettingsForm,
}

#[derive(Debug, Clone)]
pub enum Message {
    QueryChanged(String),
    Submit,
    SourceSelected(SearchSource),
    SearchFinished(RunId, Result<Vec<SearchResult>, ClientError>),
    SynthesisFinished(RunId, Result<String, ClientError>),
    MediaFetched(RunId, String, Result<Vec<u8>, ClientError>),
    OpenLink(String),
    CopyLink(String),
    OpenSettings,
    Settings(SettingsMessage),
    IcedEvent(Event),
}

impl OpenResearch {
    pub fn new(
        store: CredentialStore,
        search: SerperClient,
        synthesis: OpenAiClient,
        media: MediaClient,
    ) -> Self {
        Self {
            query: String::new(),
            mode: UIMode::Search,
            orchestrator: Orchestrator::new(store),
            search,
            synthesis,
            media,
            thumbnails: Thumbnails::new(),
            thumbnails_run: None,
            settings: SettingsForm::default(),
        }
    }

    pub fn title(&self) -> String {
        match self.orchestrator.query() {
            "" => String::from("OpenResearch"),
            query => format!("{query} - OpenResearch"),
        }
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::QueryChanged(query) => {
                self.query = query;
                Task::none()
            }

            Message::Submit => match self.orchestrator.submit(&self.query) {
                Some(ticket) => self.run_search(ticket),
                None => Task::none(),
            },

            Message::SourceSelected(source) => {
                self.orchestrator.change_source(source);
                Task::none()
            }

            Message::SearchFinished(run_id, outcome) => {
                match self.orchestrator.search_finished(run_id, outcome) {
                    Some(ticket) => {
                        let media: Vec<Task<Message>> = self
                            .orchestrator
                            .media_tickets()
                            .into_iter()
                            .map(|ticket| self.fetch_media(ticket))
                            .collect();
                        Task::batch(std::iter::once(self.run_synthesis(ticket)).chain(media))
                    }
                    None => Task::none(),
                }
            }

            Message::SynthesisFinished(run_id, outcome) => {
                self.orchestrator.synthesis_finished(run_id, outcome);
                Task::none()
            }

            Message::MediaFetched(run_id, key, outcome) => {
                if let Some(bytes) = self.orchestrator.media_finished(run_id, &key, outcome) {
                    if self.thumbnails_run != Some(run_id) {
                        self.thumbnails.clear();
                        self.thumbnails_run = Some(run_id);
                    }
                    self.thumbnails.insert(key, image::Handle::from_bytes(bytes));
                }
                Task::none()
            }

            Message::OpenLink(link) => {
                if let Err(e) = links::open_link(&link) {
                    tracing::warn!("{}", e);
                }
                Task::none()
            }

            Message::CopyLink(link) => iced::clipboard::write(link),

            Message::OpenSettings => {
                self.settings = SettingsForm::from_credentials(&self.orchestrator.store().load_saved());
                self.mode = UIMode::Settings;
                Task::none()
            }

            Message::Settings(message) => {
                self.update_settings(message);
                Task::none()
            }

            Message::IcedEvent(event) => {
                if let Event::Keyboard(keyboard::Event::KeyPressed {
                    key: Key::Named(keyboard::key::Named::Escape),
                    ..
                }) = event
                {
                    self.escape();
                }
                Task::none()
            }
        }
    }

    fn run_search(&self, ticket: SearchTicket) -> Task<Message> {
        let client = self.search.clone();
        let run_id = ticket.run_id;
        Task::perform(
            async move { client.search(&ticket.request, &ticket.cancel).await },
            move |outcome| Message::SearchFinished(run_id, outcome),
        )
    }

    fn run_synthesis(&self, ticket: SynthesisTicket) -> Task<Message> {
        let client = self.synthesis.clone();
        let run_id = ticket.run_id;
        Task::perform(
            async move { client.synthesize(&ticket.request, &ticket.cancel).await },
            move |outcome| Message::SynthesisFinished(run_id, outcome),
        )
    }

    fn fetch_media(&self, ticket: MediaTicket) -> Task<Message> {
        let client = self.media.clone();
        let MediaTicket {
            run_id,
            key,
            url,
            cancel,
        } = ticket;
        Task::perform(
            async move { client.fetch(&url, &cancel).await },
            move |outcome| Message::MediaFetched(run_id, key.clone(), outcome),
        )
    }

    /// Thumbnails are only shown next to the results they were fetched for.
    fn visible_thumbnails(&self) -> Option<&Thumbnails> {
        match self.orchestrator.shown_run() {
            Some(run) if self.thumbnails_run == Some(run) => Some(&self.thumbnails),
            _ => None,
        }
    }

    fn update_settings(&mut self, message: SettingsMessage) {
        match message {
            SettingsMessage::FieldChanged(key, value) => self.settings.set(key, value),
            SettingsMessage::Save => {
                match self.orchestrator.store().save(&self.settings.to_partial()) {
                    Ok(_) => self.mode = UIMode::Search,
                    Err(e) => {
                        tracing::error!("Failed to save credentials: {}", e);
                        self.settings.status = Some(format!("Could not save: {e}"));
                    }
                }
            }
            SettingsMessage::Clear => match self.orchestrator.store().clear() {
                Ok(()) => self.settings = SettingsForm::default(),
                Err(e) => {
                    tracing::error!("Failed to clear credentials: {}", e);
                    self.settings.status = Some(format!("Could not clear: {e}"));
                }
            },
            SettingsMessage::Close => self.mode = UIMode::Search,
        }
    }

    /// Escape closes settings, then abandons a live run, then clears the query.
    fn escape(&mut self) {
        if self.mode == UIMode::Settings {
            self.mode = UIMode::Search;
        } else if self.orchestrator.is_loading() {
            self.orchestrator.cancel();
        } else {
            self.query.clear();
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let header = row![
            text("OpenResearch").size(26).color(DarkTheme::PRIMARY),
            Space::with_width(Length::Fill),
            button(text("Settings"))
                .on_press(Message::OpenSettings)
                .style(button::secondary),
        ]
        .align_y(iced::Alignment::Center);

        let body: Element<'_, Message> = match self.mode {
            UIMode::Settings => self.settings.view().map(Message::Settings),
            UIMode::Search => column![
                search_bar::view(&self.query, Message::QueryChanged, Message::Submit),
                self.view_sources(),
                self.view_outcome(),
            ]
            .spacing(16)
            .into(),
        };

        container(
            column![header, body]
                .spacing(16)
                .padding(Padding::new(20.0))
                .max_width(1100.0),
        )
        .center_x(Length::Fill)
        .width(Length::Fill)
        .height(Length::Fill)
        .style(theme::window)
        .into()
    }

    fn view_sources(&self) -> Element<'_, Message> {
        let selected = self.orchestrator.source();
        let tabs: Vec<Element<'_, Message>> = SearchSource::ALL
            .into_iter()
            .map(|source| {
                let style: fn(&Theme, button::Status) -> button::Style = if source == selected {
                    button::primary
                } else {
                    button::secondary
                };
                button(text(source.label()).size(13))
                    .on_press(Message::SourceSelected(source))
                    .style(style)
                    .into()
            })
            .collect();
        iced::widget::Row::with_children(tabs).spacing(6).into()
    }

    fn view_outcome(&self) -> Element<'_, Message> {
        let orchestrator = &self.orchestrator;
        let mut content = column![].spacing(16);

        if let Some(error) = orchestrator.error() {
            content = content.push(
                container(text(error.to_string()).color(DarkTheme::ERROR))
                    .padding(Padding::from([10.0, 14.0]))
                    .width(Length::Fill)
                    .style(theme::error_banner),
            );
        }

        if orchestrator.is_loading() {
            let label = match orchestrator.phase() {
                Phase::Synthesizing => "Writing answer…",
                _ => "Searching…",
            };
            content = content.push(
                container(text(label).color(DarkTheme::TEXT_MUTED))
                    .padding(24)
                    .center_x(Length::Fill),
            );
            return content.into();
        }

        if let Some(answer) = orchestrator.answer() {
            content = content.push(
                container(column![
                    text("Answer").size(16).color(DarkTheme::PRIMARY),
                    text(answer).size(15).color(DarkTheme::TEXT),
                ]
                .spacing(8))
                .padding(Padding::new(16.0))
                .width(Length::Fill)
                .style(theme::panel),
            );
        }

        if !orchestrator.results().is_empty() {
            content = content
                .push(text("Search Results").size(18).color(DarkTheme::TEXT))
                .push(results::view(
                    orchestrator.results(),
                    orchestrator.source(),
                    self.visible_thumbnails(),
                    results::Actions {
                        open: Message::OpenLink,
                        copy: Message::CopyLink,
                    },
                ))
                .push(
                    text("Click a result to open it in your browser.")
                        .size(11)
                        .color(DarkTheme::TEXT_PLACEHOLDER),
                );
        } else if orchestrator.error().is_none() {
            content = content.push(
                container(
                    text("Enter your search query to discover knowledge across the internet")
                        .color(DarkTheme::TEXT_MUTED),
                )
                .padding(48)
                .center_x(Length::Fill),
            );
        }

        scrollable(content).height(Length::Fill).into()
    }

    pub fn subscription(&self) -> Subscription<Message> {
        iced::event::listen().map(Message::IcedEvent)
    }

    pub fn theme(&self) -> Theme {
        Theme::Dark
    }
}
