//! Settings form for the four credential fields.
//!
//! Keys are kept only on this machine, in the credential store.

use iced::widget::{button, column, container, row, text, text_input, Space};
use iced::{Element, Length, Padding};

use super::theme::{self, DarkTheme};
use crate::credentials::{CredentialKey, Credentials, DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL};

#[derive(Debug, Clone)]
pub enum SettingsMessage {
    FieldChanged(CredentialKey, String),
    Save,
    Clear,
    Close,
}

/// Editable copy of the stored record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsForm {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub serper_api_key: String,
    /// Feedback line under the form (save errors).
    pub status: Option<String>,
}

impl SettingsForm {
    pub fn from_credentials(credentials: &Credentials) -> Self {
        let field = |key| credentials.get(key).unwrap_or_default().to_string();
        Self {
            openai_api_key: field(CredentialKey::OpenAiApiKey),
            openai_base_url: field(CredentialKey::OpenAiBaseUrl),
            openai_model: field(CredentialKey::OpenAiModel),
            serper_api_key: field(CredentialKey::SerperApiKey),
            status: None,
        }
    }

    pub fn value(&self, key: CredentialKey) -> &str {
        match key {
            CredentialKey::OpenAiApiKey => &self.openai_api_key,
            CredentialKey::OpenAiBaseUrl => &self.openai_base_url,
            CredentialKey::OpenAiModel => &self.openai_model,
            CredentialKey::SerperApiKey => &self.serper_api_key,
        }
    }

    pub fn set(&mut self, key: CredentialKey, value: String) {
        let slot = match key {
            CredentialKey::OpenAiApiKey => &mut self.openai_api_key,
            CredentialKey::OpenAiBaseUrl => &mut self.openai_base_url,
            CredentialKey::OpenAiModel => &mut self.openai_model,
            CredentialKey::SerperApiKey => &mut self.serper_api_key,
        };
        *slot = value;
    }

    /// Every field is submitted, so a field emptied in the form clears the
    /// stored value on save.
    pub fn to_partial(&self) -> Credentials {
        CredentialKey::ALL
            .into_iter()
            .fold(Credentials::default(), |acc, key| acc.with(key, self.value(key)))
    }

    pub fn view(&self) -> Element<'_, SettingsMessage> {
        let fields = CredentialKey::ALL.into_iter().map(|key| self.field(key));

        let mut form = column![
            text("API keys").size(20).color(DarkTheme::TEXT),
            text("Keys are stored only on this computer and sent only to their provider.")
                .size(12)
                .color(DarkTheme::TEXT_MUTED),
            Space::with_height(8),
        ]
        .spacing(6);
        for field in fields {
            form = form.push(field);
        }
        if let Some(status) = &self.status {
            form = form.push(text(status.as_str()).size(12).color(DarkTheme::ERROR));
        }
        form = form.push(
            row![
                button(text("Clear all"))
                    .on_press(SettingsMessage::Clear)
                    .style(button::danger),
                Space::with_width(Length::Fill),
                button(text("Cancel"))
                    .on_press(SettingsMessage::Close)
                    .style(button::secondary),
                button(text("Save"))
                    .on_press(SettingsMessage::Save)
                    .style(button::primary),
            ]
            .spacing(8),
        );

        container(form.spacing(10))
            .padding(Padding::new(20.0))
            .width(Length::Fill)
            .style(theme::panel)
            .into()
    }

    fn field(&self, key: CredentialKey) -> Element<'_, SettingsMessage> {
        let placeholder = match key {
            CredentialKey::OpenAiApiKey => "sk-...".to_string(),
            CredentialKey::OpenAiBaseUrl => format!("Default: {DEFAULT_OPENAI_BASE_URL}"),
            CredentialKey::OpenAiModel => format!("Default: {DEFAULT_OPENAI_MODEL}"),
            CredentialKey::SerperApiKey => "serper_api_key".to_string(),
        };
        let label = match key {
            CredentialKey::OpenAiBaseUrl | CredentialKey::OpenAiModel => format!("{key} (optional)"),
            CredentialKey::OpenAiApiKey | CredentialKey::SerperApiKey => key.to_string(),
        };

        column![
            text(label).size(13).color(DarkTheme::TEXT_MUTED),
            text_input(&placeholder, self.value(key))
                .on_input(move |value| SettingsMessage::FieldChanged(key, value))
                .secure(key.is_secret())
                .padding(8),
        ]
        .spacing(4)
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::CredentialStore;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    #[test]
    fn form_reflects_stored_credentials() {
        let credentials = Credentials::default()
            .with(CredentialKey::OpenAiApiKey, "sk-1")
            .with(CredentialKey::OpenAiModel, "gpt-x");
        let form = SettingsForm::from_credentials(&credentials);
        assert_eq!(form.openai_api_key, "sk-1");
        assert_eq!(form.openai_model, "gpt-x");
        assert_eq!(form.openai_base_url, "");
    }

    #[test]
    fn set_updates_the_matching_field() {
        let mut form = SettingsForm::default();
        form.set(CredentialKey::SerperApiKey, "s".into());
        assert_eq!(form.value(CredentialKey::SerperApiKey), "s");
        assert_eq!(form.value(CredentialKey::OpenAiApiKey), "");
    }

    #[test]
    fn saving_form_clears_emptied_fields() {
        let store = CredentialStore::new(Arc::new(MemoryStorage::new()));
        store
            .save(
                &Credentials::default()
                    .with(CredentialKey::OpenAiApiKey, "old")
                    .with(CredentialKey::SerperApiKey, "keep"),
            )
            .expect("save");

        let mut form = SettingsForm::from_credentials(&store.load());
        form.set(CredentialKey::OpenAiApiKey, String::new());
        form.set(CredentialKey::OpenAiModel, "gpt-4o".into());
        store.save(&form.to_partial()).expect("save");

        let loaded = store.load();
        assert_eq!(loaded.openai_api_key, None);
        assert_eq!(loaded.openai_model.as_deref(), Some("gpt-4o"));
        assert_eq!(loaded.serper_api_key.as_deref(), Some("keep"));
    }
}
