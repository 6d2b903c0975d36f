use std::collections::BTreeMap;
use std::sync::Arc;

use dbot_core::{
    Bot, CallbackContext, CheckResult, Handler, HandlerResponse, Middleware, Result, Update,
};
use tracing::{debug, info, instrument};

/// Group handlers go to when no group is given.
pub const DEFAULT_GROUP: i32 = 0;

/// Dispatcher: middleware around grouped handlers.
///
/// Groups run in ascending order. Inside a group the first handler whose check matches handles
/// the update; its response decides what happens next (see [`HandlerResponse`]).
#[derive(Clone, Default)]
pub struct HandlerChain {
    middleware: Vec<Arc<dyn Middleware>>,
    groups: BTreeMap<i32, Vec<Arc<dyn Handler>>>,
    bot: Option<Arc<dyn Bot>>,
}

impl HandlerChain {
    /// Creates an empty chain (no middleware, no handlers).
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware (before runs in order, after in reverse).
    pub fn add_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Appends a handler to [`DEFAULT_GROUP`].
    pub fn add_handler(self, handler: Arc<dyn Handler>) -> Self {
        self.add_handler_to_group(handler, DEFAULT_GROUP)
    }

    pub fn add_handler_to_group(mut self, handler: Arc<dyn Handler>, group: i32) -> Self {
        self.groups.entry(group).or_default().push(handler);
        self
    }

    /// Bot made available to callbacks through `context.bot`.
    pub fn with_bot(mut self, bot: Arc<dyn Bot>) -> Self {
        self.bot = Some(bot);
        self
    }

    pub fn handler_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    fn new_context(&self) -> CallbackContext {
        match &self.bot {
            Some(bot) => CallbackContext::new().with_bot(bot.clone()),
            None => CallbackContext::new(),
        }
    }

    /// Dispatches one update and returns the final response.
    #[instrument(skip(self, update), fields(update_id = update.id))]
    pub async fn handle(&self, update: &Update) -> Result<HandlerResponse> {
        let user_id = update.effective_user().map(|u| u.id);
        let chat_id = update.effective_chat().map(|c| c.id);
        info!(?user_id, ?chat_id, "step: handler_chain started");

        let mut context = self.new_context();

        for mw in &self.middleware {
            let mw_name = std::any::type_name_of_val(mw.as_ref());
            if !mw.before(update, &mut context).await? {
                info!(middleware = %mw_name, "step: middleware before returned false, chain stopped");
                return Ok(HandlerResponse::Stop);
            }
            debug!(middleware = %mw_name, "step: middleware before done");
        }

        let final_response = self.dispatch(update, &mut context).await?;

        for mw in self.middleware.iter().rev() {
            let mw_name = std::any::type_name_of_val(mw.as_ref());
            mw.after(update, &context, &final_response).await?;
            debug!(middleware = %mw_name, "step: middleware after done");
        }

        info!(
            ?user_id,
            ?chat_id,
            response = ?final_response,
            "step: handler_chain finished"
        );
        Ok(final_response)
    }

    async fn dispatch(
        &self,
        update: &Update,
        context: &mut CallbackContext,
    ) -> Result<HandlerResponse> {
        let mut final_response = HandlerResponse::Continue;

        'groups: for (group, handlers) in &self.groups {
            for handler in handlers {
                let handler_name = std::any::type_name_of_val(handler.as_ref());
                let check = handler.check_update(update);
                match check {
                    CheckResult::NoMatch => continue,
                    CheckResult::Filtered => {
                        debug!(group, handler = %handler_name, "step: handler filtered out update");
                        continue;
                    }
                    CheckResult::Matched { .. } => {}
                }

                handler.collect_additional_context(context, update, &check);
                info!(group, handler = %handler_name, "step: handler processing");
                let response = handler.handle(update, context).await?;
                debug!(group, handler = %handler_name, response = ?response, "step: handler done");

                match response {
                    HandlerResponse::Ignore => continue,
                    HandlerResponse::Continue => continue 'groups,
                    HandlerResponse::Stop | HandlerResponse::Reply(_) => {
                        info!(group, handler = %handler_name, "step: handler chain stopped by handler");
                        final_response = response;
                        break 'groups;
                    }
                }
            }
        }

        Ok(final_response)
    }
}
