mod common;

use common::{card_moved_payload, head, post_json, spawn, BOARD_ID};
use serde_json::json;
use trellogram::store::BindingStore;
use trellogram::types::ChatId;

#[tokio::test]
async fn card_moved_event_is_relayed_to_the_bound_chat() {
    let mut app = spawn().await;
    app.store.bind_chat(ChatId::Group(-555), BOARD_ID).await.unwrap();

    let notice = app.expect_send(-555, " Ship it moved to Done ").await;

    let response = post_json(&app.app, "/webhook/trello", &card_moved_payload("Ship it", "Done")).await;
    common::assert_ok(&response);

    notice.assert_async().await;
}

#[tokio::test]
async fn only_the_first_bound_chat_receives_the_notice() {
    let mut app = spawn().await;
    app.store.bind_chat(ChatId::Group(-555), BOARD_ID).await.unwrap();
    app.store.bind_chat(ChatId::Group(-666), BOARD_ID).await.unwrap();

    let first = app.expect_send(-555, " Ship it moved to Done ").await;

    post_json(&app.app, "/webhook/trello", &card_moved_payload("Ship it", "Done")).await;

    first.assert_async().await;
}

#[tokio::test]
async fn other_event_types_produce_zero_sends() {
    let mut app = spawn().await;
    app.store.bind_chat(ChatId::Group(-555), BOARD_ID).await.unwrap();
    let no_sends = app.expect_no_sends().await;

    let payload = json!({
        "action": {
            "type": "createCard",
            "data": { "card": { "name": "New" }, "list": { "name": "To do" } }
        }
    });
    let response = post_json(&app.app, "/webhook/trello", &payload).await;
    common::assert_ok(&response);

    no_sends.assert_async().await;
}

#[tokio::test]
async fn event_with_empty_names_produces_zero_sends() {
    let mut app = spawn().await;
    app.store.bind_chat(ChatId::Group(-555), BOARD_ID).await.unwrap();
    let no_sends = app.expect_no_sends().await;

    post_json(&app.app, "/webhook/trello", &card_moved_payload("", "Done")).await;
    post_json(&app.app, "/webhook/trello", &card_moved_payload("Ship it", "")).await;

    no_sends.assert_async().await;
}

#[tokio::test]
async fn event_with_no_bound_chat_produces_zero_sends() {
    let mut app = spawn().await;
    let no_sends = app.expect_no_sends().await;

    let response = post_json(&app.app, "/webhook/trello", &card_moved_payload("Ship it", "Done")).await;
    common::assert_ok(&response);

    no_sends.assert_async().await;
}

#[tokio::test]
async fn malformed_payload_is_a_silent_no_op() {
    let mut app = spawn().await;
    let no_sends = app.expect_no_sends().await;

    let response = post_json(&app.app, "/webhook/trello", &json!({ "model": {} })).await;
    common::assert_ok(&response);

    no_sends.assert_async().await;
}

#[tokio::test]
async fn webhook_callback_answers_head_probes() {
    let app = spawn().await;
    let response = head(&app.app, "/webhook/trello").await;
    common::assert_ok(&response);
}
