//! Telegram adapter: outbound `Transport` plus the inbound update dispatcher.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, InputFile, KeyboardButton, KeyboardMarkup,
    ParseMode, ReplyMarkup,
};
use teloxide::{ApiError, RequestError};
use tracing::{debug, info};

use super::{DeliveryError, Keyboard, Transport};
use crate::core_state::CoreState;
use crate::dialog::{self, Inbound, Input};
use crate::models::UserId;

pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_message(
        &self,
        user_id: UserId,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), DeliveryError> {
        let mut request = self
            .bot
            .send_message(ChatId(user_id), text)
            .parse_mode(ParseMode::Html);
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(reply_markup(keyboard));
        }
        request.await.map_err(|e| delivery_error(user_id, e))?;
        Ok(())
    }

    async fn send_document(
        &self,
        user_id: UserId,
        path: &Path,
        caption: Option<&str>,
    ) -> Result<(), DeliveryError> {
        let doc = InputFile::file(path.to_path_buf());
        let mut request = self.bot.send_document(ChatId(user_id), doc);
        if let Some(caption) = caption {
            request = request.caption(caption);
        }
        request.await.map_err(|e| delivery_error(user_id, e))?;
        Ok(())
    }
}

fn reply_markup(keyboard: Keyboard) -> ReplyMarkup {
    match keyboard {
        Keyboard::Reply(rows) => {
            let rows = rows
                .into_iter()
                .map(|row| row.into_iter().map(KeyboardButton::new).collect::<Vec<_>>());
            ReplyMarkup::Keyboard(KeyboardMarkup::new(rows).resize_keyboard())
        }
        Keyboard::Inline(rows) => {
            let rows = rows.into_iter().map(|row| {
                row.into_iter()
                    .map(|b| InlineKeyboardButton::callback(b.text, b.callback_data))
                    .collect::<Vec<_>>()
            });
            ReplyMarkup::InlineKeyboard(InlineKeyboardMarkup::new(rows))
        }
    }
}

/// Blocked bots and vanished chats are not worth retrying.
fn delivery_error(user_id: UserId, err: RequestError) -> DeliveryError {
    match err {
        RequestError::Api(
            ApiError::BotBlocked
            | ApiError::BotKicked
            | ApiError::ChatNotFound
            | ApiError::UserDeactivated,
        ) => DeliveryError::Unreachable(user_id),
        other => DeliveryError::Request(other.to_string()),
    }
}

// ═══════════════════════════════════════════════════════════
// Inbound updates
// ═══════════════════════════════════════════════════════════

/// Runs the long-polling dispatcher until Ctrl-C.
pub async fn run_dispatcher(core: Arc<CoreState>, bot: Bot) {
    info!("Starting Telegram dispatcher");

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint({
            let core = Arc::clone(&core);
            move |msg: Message| {
                let core = Arc::clone(&core);
                async move {
                    on_message(&core, msg).await;
                    respond(())
                }
            }
        }))
        .branch(Update::filter_callback_query().endpoint({
            let core = Arc::clone(&core);
            move |q: CallbackQuery, bot: Bot| {
                let core = Arc::clone(&core);
                async move {
                    on_callback(&core, q, bot).await;
                    respond(())
                }
            }
        }));

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn on_message(core: &CoreState, msg: Message) {
    let Some(user) = msg.from.as_ref() else {
        return;
    };
    if !msg.chat.is_private() {
        debug!(chat_id = msg.chat.id.0, "Ignoring message outside a private chat");
        return;
    }
    let Some(text) = msg.text() else {
        debug!(user_id = user.id.0, "Ignoring non-text message");
        return;
    };

    let inbound = Inbound::new(user.id.0 as UserId, user.first_name.clone(), Input::from_text(text));
    dialog::handle(core, inbound).await;
}

async fn on_callback(core: &CoreState, q: CallbackQuery, bot: Bot) {
    let user_id = q.from.id.0 as UserId;
    let input = q.data.as_deref().and_then(Input::from_callback);
    let first_name = q.from.first_name.clone();

    // Stops the button spinner; failure here is cosmetic.
    if let Err(e) = bot.answer_callback_query(q.id).await {
        debug!(user_id, error = %e, "Callback acknowledgement failed");
    }

    match input {
        Some(input) => dialog::handle(core, Inbound::new(user_id, first_name, input)).await,
        None => debug!(user_id, data = ?q.data, "Unknown callback data"),
    }
}

#[cfg(test)]
mod tests {
    use teloxide::types::InlineKeyboardButtonKind;

    use super::*;
    use crate::transport::InlineButton;

    #[test]
    fn reply_keyboard_keeps_rows() {
        let markup = reply_markup(Keyboard::Reply(vec![vec!["A".into(), "B".into()]]));
        let ReplyMarkup::Keyboard(k) = markup else { panic!("expected reply keyboard") };
        assert_eq!(k.keyboard[0].len(), 2);
        assert_eq!(k.keyboard[0][1].text, "B");
    }

    #[test]
    fn inline_buttons_carry_callback_data() {
        let markup = reply_markup(Keyboard::Inline(vec![vec![InlineButton::new("Так", "add_med")]]));
        let ReplyMarkup::InlineKeyboard(k) = markup else { panic!("expected inline keyboard") };
        let button = &k.inline_keyboard[0][0];
        assert_eq!(button.text, "Так");
        assert!(matches!(&button.kind, InlineKeyboardButtonKind::CallbackData(d) if d == "add_med"));
    }

    #[test]
    fn blocked_bot_is_unreachable() {
        let err = delivery_error(9, RequestError::Api(ApiError::BotBlocked));
        assert!(matches!(err, DeliveryError::Unreachable(9)));

        let err = delivery_error(9, RequestError::Api(ApiError::MessageTextIsEmpty));
        assert!(matches!(err, DeliveryError::Request(_)));
    }
}
