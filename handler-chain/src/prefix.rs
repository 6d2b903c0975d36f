//! `!command arg1 arg2` matching with configurable prefixes.
//!
//! Custom prefixes carry no entity annotation from the server, so matching is plain tokenization:
//! the first whitespace-delimited word must equal some `prefix + command`. Commands keep the bot
//! command charset rule; prefixes are taken as-is and there is no `@botname` disambiguation.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use dbot_core::{
    Callback, CallbackContext, CheckResult, Handler, HandlerError, HandlerResponse, Result, Update,
};
use tracing::{debug, instrument};

use crate::command::{compose_filter, normalize_commands, verdict};
use crate::filters::{BoxedFilter, Filter, FilterExt};

/// Handler responding to every combination of its prefixes and commands.
pub struct PrefixHandler {
    prefixes: Vec<String>,
    commands: Vec<String>,
    triggers: BTreeSet<String>,
    filter: BoxedFilter,
    callback: Arc<dyn Callback>,
}

impl PrefixHandler {
    /// `PrefixHandler::new(["!", "#"], ["test", "help"], cb)` responds to `!test`, `#test`, `!help` and `#help`.
    pub fn new<P, C, S, T>(
        prefixes: P,
        commands: C,
        callback: Arc<dyn Callback>,
    ) -> std::result::Result<Self, HandlerError>
    where
        P: IntoIterator<Item = S>,
        S: AsRef<str>,
        C: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut handler = Self {
            prefixes: lowercase_all(prefixes),
            commands: normalize_commands(commands)?,
            triggers: BTreeSet::new(),
            filter: compose_filter(None),
            callback,
        };
        handler.rebuild_triggers();
        Ok(handler)
    }

    pub fn with_filter<F: Filter + 'static>(mut self, filter: F) -> Self {
        self.filter = compose_filter(Some(filter.boxed()));
        self
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Current `prefix + command` set.
    pub fn triggers(&self) -> &BTreeSet<String> {
        &self.triggers
    }

    /// Replaces the prefixes and rebuilds the triggers.
    pub fn set_prefix<P, S>(&mut self, prefixes: P)
    where
        P: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.prefixes = lowercase_all(prefixes);
        self.rebuild_triggers();
    }

    /// Replaces the commands and rebuilds the triggers. On an invalid command nothing changes.
    pub fn set_command<C, T>(&mut self, commands: C) -> std::result::Result<(), HandlerError>
    where
        C: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.commands = normalize_commands(commands)?;
        self.rebuild_triggers();
        Ok(())
    }

    fn rebuild_triggers(&mut self) {
        self.triggers = self
            .prefixes
            .iter()
            .flat_map(|prefix| {
                self.commands
                    .iter()
                    .map(move |command| format!("{}{}", prefix, command))
            })
            .collect();
    }
}

fn lowercase_all<P, S>(items: P) -> Vec<String>
where
    P: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| item.as_ref().to_lowercase())
        .collect()
}

#[async_trait]
impl Handler for PrefixHandler {
    fn check_update(&self, update: &Update) -> CheckResult {
        let Some(text) = update.effective_message().and_then(|m| m.text()) else {
            return CheckResult::NoMatch;
        };
        let mut words = text.split_whitespace();
        let Some(first) = words.next() else {
            return CheckResult::NoMatch;
        };
        let trigger = first.to_lowercase();
        if !self.triggers.contains(&trigger) {
            return CheckResult::NoMatch;
        }

        let args: Vec<String> = words.map(String::from).collect();
        let result = self.filter.check(update);
        debug!(
            trigger = %trigger,
            accepted = result.is_accepted(),
            "step: prefix command matched, filter evaluated"
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
