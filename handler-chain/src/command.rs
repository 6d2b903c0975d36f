//! `/command@botname arg1 arg2` matching.
//!
//! A [`CommandHandler`] fires when the first entity of a message is a bot command at offset 0,
//! the command (lowercased) is one of its commands and the `@botname` suffix, if any, names the
//! bot that received the message. Arguments are the whitespace-separated words after the command.

use std::sync::Arc;

use async_trait::async_trait;
use dbot_core::{
    Callback, CallbackContext, CheckResult, EntityKind, Handler, HandlerError, HandlerResponse,
    Result, Update,
};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument};

use crate::filters::{BoxedFilter, Filter, FilterExt, FilterResult, UpdateFilter};

static COMMAND_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-z_]{1,32}$").expect("Failed to compile command regex"));

/// Lowercases every token and checks it against `^[a-z0-9_]{1,32}$`.
pub fn normalize_commands<I, S>(commands: I) -> std::result::Result<Vec<String>, HandlerError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    commands
        .into_iter()
        .map(|command| {
            let command = command.as_ref().to_lowercase();
            if COMMAND_RE.is_match(&command) {
                Ok(command)
            } else {
                Err(HandlerError::InvalidCommand(command))
            }
        })
        .collect()
}

/// Turns a filter verdict into the handler's check result.
pub(crate) fn verdict(args: Vec<String>, result: FilterResult) -> CheckResult {
    match result {
        FilterResult::Reject => CheckResult::Filtered,
        FilterResult::Accept => CheckResult::Matched { args, data: None },
        FilterResult::Data(data) => CheckResult::Matched {
            args,
            data: Some(data),
        },
    }
}

/// Baseline filter, optionally ANDed with the user's filter.
pub(crate) fn compose_filter(filter: Option<BoxedFilter>) -> BoxedFilter {
    match filter {
        Some(filter) => UpdateFilter::Messages.and(filter).boxed(),
        None => UpdateFilter::Messages.boxed(),
    }
}

/// Handler for `/command` messages. Does not handle channel posts.
pub struct CommandHandler {
    commands: Vec<String>,
    filter: BoxedFilter,
    callback: Arc<dyn Callback>,
}

impl CommandHandler {
    /// Fails with [`HandlerError::InvalidCommand`] on the first token that is not a valid bot command.
    pub fn new<I, S>(commands: I, callback: Arc<dyn Callback>) -> std::result::Result<Self, HandlerError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            commands: normalize_commands(commands)?,
            filter: compose_filter(None),
            callback,
        })
    }

    /// Only let updates through that also pass `filter`.
    pub fn with_filter<F: Filter + 'static>(mut self, filter: F) -> Self {
        self.filter = compose_filter(Some(filter.boxed()));
        self
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }
}

#[async_trait]
impl Handler for CommandHandler {
    fn check_update(&self, update: &Update) -> CheckResult {
        let Some(message) = update.effective_message() else {
            return CheckResult::NoMatch;
        };
        let (Some(text), Some(entity), Some(bot)) =
            (message.text(), message.entities.first(), message.bot.as_ref())
        else {
            return CheckResult::NoMatch;
        };
        if entity.kind != EntityKind::BotCommand || entity.offset != 0 {
            return CheckResult::NoMatch;
        }

        let command: String = text
            .chars()
            .skip(1)
            .take(entity.length.saturating_sub(1))
            .collect();
        let args: Vec<String> = text.split_whitespace().skip(1).map(String::from).collect();

        let mut parts = command.split('@');
        let name = parts.next().unwrap_or_default().to_lowercase();
        let target = parts.next().unwrap_or(bot.username.as_str());

        if !self.commands.contains(&name) || !target.eq_ignore_ascii_case(&bot.username) {
            return CheckResult::NoMatch;
        }

        let result = self.filter.check(update);
        debug!(
            command = %name,
            filter = %self.filter.name(),
            accepted = result.is_accepted(),
            "step: command matched, filter evaluated"
        );
        verdict(args, result)
    }

    fn collect_additional_context(
        &self,
        context: &mut CallbackContext,
        _update: &Update,
        check: &CheckResult,
    ) {
        context.apply_match(check);
    }

    #[instrument(skip(self, update, context))]
    async fn handle(
        &self,
        update: &Update,
        context: &mut CallbackContext,
    ) -> Result<HandlerResponse> {
        self.callback.call(update, context).await
    }
}
