//! Integration tests for [`handler_chain::HandlerChain`].
//!
//! Covers: middleware before/after order, middleware before stopping the chain, group ordering,
//! and how each [`HandlerResponse`] moves dispatch along (Ignore, Continue, Stop, Reply).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dbot_core::{
    BotIdentity, Callback, CallbackContext, Chat, CheckResult, Handler, HandlerResponse, Message,
    MessageEntity, Middleware, Update, User,
};
use handler_chain::{CommandHandler, HandlerChain, RegexFilter};

fn create_test_update(text: &str) -> Update {
    let message = Message::new(1, Chat::private(456), text)
        .with_from(User::new(123, "Test"))
        .with_bot(BotIdentity::new(99, "mybot"));
    Update::message(7, message)
}

fn command_update(text: &str) -> Update {
    let len = text.split_whitespace().next().map_or(0, |w| w.chars().count());
    let message = Message::new(1, Chat::private(456), text)
        .with_from(User::new(123, "Test"))
        .with_entities(vec![MessageEntity::bot_command(0, len)])
        .with_bot(BotIdentity::new(99, "mybot"));
    Update::message(8, message)
}

/// Handler that matches everything, records its label and returns a fixed response.
struct RecordingHandler {
    label: &'static str,
    response: HandlerResponse,
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl RecordingHandler {
    fn new(
        label: &'static str,
        response: HandlerResponse,
        log: Arc<Mutex<Vec<&'static str>>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            label,
            response,
            log,
        })
    }
}

#[async_trait]
impl Handler for RecordingHandler {
    fn check_update(&self, _update: &Update) -> CheckResult {
        CheckResult::Matched {
            args: Vec::new(),
            data: None,
        }
    }

    async fn handle(
        &self,
        _update: &Update,
        _context: &mut CallbackContext,
    ) -> dbot_core::Result<HandlerResponse> {
        self.log.lock().unwrap().push(self.label);
        Ok(self.response.clone())
    }
}

/// Handler whose check never matches; must never be handled.
struct NeverHandler {
    handle_count: Arc<AtomicUsize>,
    filtered: bool,
}

#[async_trait]
impl Handler for NeverHandler {
    fn check_update(&self, _update: &Update) -> CheckResult {
        if self.filtered {
            CheckResult::Filtered
        } else {
            CheckResult::NoMatch
        }
    }

    async fn handle(
        &self,
        _update: &Update,
        _context: &mut CallbackContext,
    ) -> dbot_core::Result<HandlerResponse> {
        self.handle_count.fetch_add(1, Ordering::SeqCst);
        Ok(HandlerResponse::Stop)
    }
}

/// Middleware that records before/after with its label.
struct TestMiddleware {
    label: &'static str,
    allow: bool,
    log: Arc<Mutex<Vec<String>>>,
    seen_response: Arc<Mutex<Option<HandlerResponse>>>,
}

impl TestMiddleware {
    fn new(label: &'static str, allow: bool, log: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            label,
            allow,
            log,
            seen_response: Arc::new(Mutex::new(None)),
        }
    }
}

#[async_trait]
impl Middleware for TestMiddleware {
    async fn before(
        &self,
        _update: &Update,
        _context: &mut CallbackContext,
    ) -> dbot_core::Result<bool> {
        self.log.lock().unwrap().push(format!("{}:before", self.label));
        Ok(self.allow)
    }

    async fn after(
        &self,
        _update: &Update,
        _context: &CallbackContext,
        response: &HandlerResponse,
    ) -> dbot_core::Result<()> {
        self.log.lock().unwrap().push(format!("{}:after", self.label));
        *self.seen_response.lock().unwrap() = Some(response.clone());
        Ok(())
    }
}

/// **Test: Ignore falls through to the next handler in the same group.**
///
/// **Setup:** group 0 = [a (Ignore), b (Stop)].
/// **Expected:** both run in order; result is Stop.
#[tokio::test]
async fn test_ignore_tries_next_handler_in_group() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let chain = HandlerChain::new()
        .add_handler(RecordingHandler::new("a", HandlerResponse::Ignore, log.clone()))
        .add_handler(RecordingHandler::new("b", HandlerResponse::Stop, log.clone()));

    let response = chain.handle(&create_test_update("hi")).await.unwrap();

    assert_eq!(response, HandlerResponse::Stop);
    assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);
}

/// **Test: Continue ends the group; the next group still runs.**
///
/// **Setup:** group 0 = [a (Continue), b], group 1 = [c (Continue)].
/// **Expected:** a and c run, b does not; result is Continue.
#[tokio::test]
async fn test_continue_moves_to_next_group() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let chain = HandlerChain::new()
        .add_handler_to_group(RecordingHandler::new("c", HandlerResponse::Continue, log.clone()), 1)
        .add_handler(RecordingHandler::new("a", HandlerResponse::Continue, log.clone()))
        .add_handler(RecordingHandler::new("b", HandlerResponse::Stop, log.clone()));

    let response = chain.handle(&create_test_update("hi")).await.unwrap();

    assert_eq!(response, HandlerResponse::Continue);
    assert_eq!(*log.lock().unwrap(), vec!["a", "c"]);
}

/// **Test: groups run in ascending order regardless of registration order.**
#[tokio::test]
async fn test_groups_run_in_ascending_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let chain = HandlerChain::new()
        .add_handler_to_group(RecordingHandler::new("ten", HandlerResponse::Continue, log.clone()), 10)
        .add_handler_to_group(RecordingHandler::new("minus", HandlerResponse::Continue, log.clone()), -1)
        .add_handler(RecordingHandler::new("zero", HandlerResponse::Continue, log.clone()));

    chain.handle(&create_test_update("hi")).await.unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["minus", "zero", "ten"]);
    assert_eq!(chain.handler_count(), 3);
}

/// **Test: Stop and Reply end dispatch across all groups.**
#[tokio::test]
async fn test_stop_and_reply_end_dispatch() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let chain = HandlerChain::new()
        .add_handler(RecordingHandler::new("a", HandlerResponse::Reply("hello".into()), log.clone()))
        .add_handler_to_group(RecordingHandler::new("b", HandlerResponse::Continue, log.clone()), 1);

    let response = chain.handle(&create_test_update("hi")).await.unwrap();

    assert_eq!(response, HandlerResponse::Reply("hello".into()));
    assert_eq!(*log.lock().unwrap(), vec!["a"]);
}

/// **Test: NoMatch and Filtered handlers are skipped without running handle.**
#[tokio::test]
async fn test_non_matching_handlers_are_skipped() {
    let handle_count = Arc::new(AtomicUsize::new(0));
    let log = Arc::new(Mutex::new(Vec::new()));
    let chain = HandlerChain::new()
        .add_handler(Arc::new(NeverHandler {
            handle_count: handle_count.clone(),
            filtered: false,
        }))
        .add_handler(Arc::new(NeverHandler {
            handle_count: handle_count.clone(),
            filtered: true,
        }))
        .add_handler(RecordingHandler::new("last", HandlerResponse::Stop, log.clone()));

    let response = chain.handle(&create_test_update("hi")).await.unwrap();

    assert_eq!(response, HandlerResponse::Stop);
    assert_eq!(handle_count.load(Ordering::SeqCst), 0);
    assert_eq!(*log.lock().unwrap(), vec!["last"]);
}

/// **Test: middleware before runs first→last, after runs last→first and sees the final response.**
#[tokio::test]
async fn test_middleware_order_and_response() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let handled = Arc::new(Mutex::new(Vec::new()));
    let first = Arc::new(TestMiddleware::new("m1", true, log.clone()));
    let second = TestMiddleware::new("m2", true, log.clone());
    let seen = second.seen_response.clone();

    let chain = HandlerChain::new()
        .add_middleware(first)
        .add_middleware(Arc::new(second))
        .add_handler(RecordingHandler::new("h", HandlerResponse::Reply("ok".into()), handled.clone()));

    chain.handle(&create_test_update("hi")).await.unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec!["m1:before", "m2:before", "m2:after", "m1:after"]
    );
    assert_eq!(*seen.lock().unwrap(), Some(HandlerResponse::Reply("ok".into())));
}

/// **Test: middleware before returning false stops the chain; no handler and no after runs.**
#[tokio::test]
async fn test_middleware_before_stops_chain() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let handled = Arc::new(Mutex::new(Vec::new()));
    let chain = HandlerChain::new()
        .add_middleware(Arc::new(TestMiddleware::new("gate", false, log.clone())))
        .add_handler(RecordingHandler::new("h", HandlerResponse::Stop, handled.clone()));

    let response = chain.handle(&create_test_update("hi")).await.unwrap();

    assert_eq!(response, HandlerResponse::Stop);
    assert!(handled.lock().unwrap().is_empty());
    assert_eq!(*log.lock().unwrap(), vec!["gate:before"]);
}

/// Callback that copies what it sees in the context out for assertions.
struct CapturingCallback {
    args: Arc<Mutex<Option<Vec<String>>>>,
    matches: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Callback for CapturingCallback {
    async fn call(
        &self,
        _update: &Update,
        context: &mut CallbackContext,
    ) -> dbot_core::Result<HandlerResponse> {
        *self.args.lock().unwrap() = context.args.clone();
        *self.matches.lock().unwrap() = context.matches().iter().map(|s| s.to_string()).collect();
        Ok(HandlerResponse::Stop)
    }
}

/// **Test: a filtered deep-link handler falls through to the plain handler in the same group.**
///
/// **Setup:** group 0 = [/start + RegexFilter("so-cool"), /start].
/// **Expected:** `/start so-cool` reaches the first with matches; `/start` reaches the second.
#[tokio::test]
async fn test_command_handlers_receive_args_and_matches() {
    let deep_args = Arc::new(Mutex::new(None));
    let deep_matches = Arc::new(Mutex::new(Vec::new()));
    let plain_args = Arc::new(Mutex::new(None));

    let deep = CommandHandler::new(
        ["start"],
        Arc::new(CapturingCallback {
            args: deep_args.clone(),
            matches: deep_matches.clone(),
        }),
    )
    .unwrap()
    .with_filter(RegexFilter::new("so-cool").unwrap());
    let plain = CommandHandler::new(
        ["start"],
        Arc::new(CapturingCallback {
            args: plain_args.clone(),
            matches: Arc::new(Mutex::new(Vec::new())),
        }),
    )
    .unwrap();

    let chain = HandlerChain::new()
        .add_handler(Arc::new(deep))
        .add_handler(Arc::new(plain));

    chain.handle(&command_update("/start so-cool")).await.unwrap();
    assert_eq!(*deep_args.lock().unwrap(), Some(vec!["so-cool".to_string()]));
    assert_eq!(*deep_matches.lock().unwrap(), vec!["so-cool".to_string()]);
    assert!(plain_args.lock().unwrap().is_none());

    chain.handle(&command_update("/start")).await.unwrap();
    assert_eq!(*plain_args.lock().unwrap(), Some(Vec::new()));
}
