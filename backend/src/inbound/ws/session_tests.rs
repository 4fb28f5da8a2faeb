//! WebSocket session handler tests.

use super::*;
use crate::domain::ports::{BroadcastRideEvents, FixtureTokenVerifier, RideEvents};
use crate::domain::{Actor, RideEvent, RideEventKind, RideStatus, Role};
use crate::inbound::ws;
use crate::inbound::ws::state::WsState;
use actix_web::{dev::Server, dev::ServerHandle, http::header, App, HttpServer};
use awc::{ws::Codec, ws::Frame, ws::Message, BoxedSocket};
use futures_util::{SinkExt, StreamExt};
use rstest::{fixture, rstest};
use serde_json::{json, Value};
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

type Socket = actix_codec::Framed<BoxedSocket, Codec>;

fn event_for(passenger_id: Uuid, kind: RideEventKind, status: RideStatus) -> RideEvent {
    RideEvent {
        kind,
        ride_id: Uuid::new_v4(),
        passenger_id,
        driver_id: None,
        status,
    }
}

#[fixture]
async fn start_ws_server() -> (String, Server, Arc<BroadcastRideEvents>) {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    let events = Arc::new(BroadcastRideEvents::new());
    let ws_state = WsState::new(
        events.clone(),
        Arc::new(FixtureTokenVerifier::new()),
        vec![Url::parse("http://localhost:3000").expect("valid url")],
    );
    let server = HttpServer::new(move || {
        App::new()
            .app_data(actix_web::web::Data::new(ws_state.clone()))
            .service(ws::ws_entry)
    })
    .listen(listener)
    .expect("bind test server")
    .disable_signals()
    .run();
    let url = format!("http://{addr}");
    (url, server, events)
}

#[fixture]
async fn ws_client(
    #[future] start_ws_server: (String, Server, Arc<BroadcastRideEvents>),
) -> (Socket, ServerHandle, Arc<BroadcastRideEvents>) {
    let (url, server, events) = start_ws_server.await;
    let handle = server.handle();
    actix_web::rt::spawn(server);

    let (_resp, socket) = awc::Client::default()
        .ws(format!("{url}/ws"))
        .set_header(header::ORIGIN, "http://localhost:3000")
        .connect()
        .await
        .expect("websocket connect");

    (socket, handle, events)
}

async fn send_json(socket: &mut Socket, payload: Value) {
    socket
        .send(Message::Text(payload.to_string().into()))
        .await
        .expect("send text");
}

async fn next_text_frame(socket: &mut Socket) -> Value {
    loop {
        let frame = socket.next().await.expect("response frame").expect("frame");
        match frame {
            Frame::Text(bytes) => return serde_json::from_slice(&bytes).expect("json"),
            Frame::Ping(_) | Frame::Pong(_) => continue,
            other => panic!("expected text frame, got {other:?}"),
        }
    }
}

async fn authenticate(socket: &mut Socket, actor: &Actor) -> Value {
    send_json(
        socket,
        json!({ "type": "authenticate", "token": FixtureTokenVerifier::token_for(actor) }),
    )
    .await;
    next_text_frame(socket).await
}

#[rstest]
#[actix_rt::test]
async fn authentication_echoes_the_subject(
    #[future] ws_client: (Socket, ServerHandle, Arc<BroadcastRideEvents>),
) {
    let (mut socket, _server, _events) = ws_client.await;
    let actor = Actor {
        id: Uuid::new_v4(),
        role: Role::Passenger,
    };

    let value = authenticate(&mut socket, &actor).await;
    assert_eq!(
        value.get("type").and_then(Value::as_str),
        Some("authenticated")
    );
    assert_eq!(
        value.get("userId").and_then(Value::as_str),
        Some(actor.id.to_string().as_str())
    );
}

#[rstest]
#[actix_rt::test]
async fn subscribing_before_authentication_is_rejected(
    #[future] ws_client: (Socket, ServerHandle, Arc<BroadcastRideEvents>),
) {
    let (mut socket, _server, _events) = ws_client.await;
    send_json(
        &mut socket,
        json!({ "type": "subscribe", "topics": ["rides:pending"] }),
    )
    .await;

    let value = next_text_frame(&mut socket).await;
    assert_eq!(value.get("type").and_then(Value::as_str), Some("error"));
    assert_eq!(
        value.get("code").and_then(Value::as_str),
        Some("unauthenticated")
    );
}

#[rstest]
#[actix_rt::test]
async fn subscribed_topics_receive_matching_events(
    #[future] ws_client: (Socket, ServerHandle, Arc<BroadcastRideEvents>),
) {
    let (mut socket, _server, events) = ws_client.await;
    let actor = Actor {
        id: Uuid::new_v4(),
        role: Role::Passenger,
    };
    authenticate(&mut socket, &actor).await;

    send_json(
        &mut socket,
        json!({ "type": "subscribe", "topics": ["rides:pending"] }),
    )
    .await;
    let subscribed = next_text_frame(&mut socket).await;
    assert_eq!(
        subscribed.get("topics"),
        Some(&json!(["rides:pending"])),
        "subscription acknowledged"
    );

    // Off-topic first: completion never reaches the pending topic.
    events.publish(event_for(
        Uuid::new_v4(),
        RideEventKind::Completed,
        RideStatus::Completed,
    ));
    let expected = event_for(Uuid::new_v4(), RideEventKind::Requested, RideStatus::Pending);
    events.publish(expected);

    let value = next_text_frame(&mut socket).await;
    assert_eq!(value.get("type").and_then(Value::as_str), Some("event"));
    assert_eq!(
        value.get("topic").and_then(Value::as_str),
        Some("rides:pending")
    );
    assert_eq!(
        value
            .get("event")
            .and_then(|e| e.get("rideId"))
            .and_then(Value::as_str),
        Some(expected.ride_id.to_string().as_str())
    );
}

#[rstest]
#[actix_rt::test]
async fn unsubscribe_empties_the_topic_set(
    #[future] ws_client: (Socket, ServerHandle, Arc<BroadcastRideEvents>),
) {
    let (mut socket, _server, _events) = ws_client.await;
    let actor = Actor {
        id: Uuid::new_v4(),
        role: Role::Passenger,
    };
    authenticate(&mut socket, &actor).await;

    send_json(
        &mut socket,
        json!({ "type": "subscribe", "topics": ["rides:pending", format!("rides:passenger:{}", actor.id)] }),
    )
    .await;
    let subscribed = next_text_frame(&mut socket).await;
    assert_eq!(
        subscribed
            .get("topics")
            .and_then(Value::as_array)
            .map(Vec::len),
        Some(2)
    );

    send_json(
        &mut socket,
        json!({ "type": "unsubscribe", "topics": ["rides:pending", format!("rides:passenger:{}", actor.id)] }),
    )
    .await;
    let after = next_text_frame(&mut socket).await;
    assert_eq!(after.get("topics"), Some(&json!([])));
}

#[rstest]
#[actix_rt::test]
async fn watching_another_users_topic_is_forbidden(
    #[future] ws_client: (Socket, ServerHandle, Arc<BroadcastRideEvents>),
) {
    let (mut socket, _server, _events) = ws_client.await;
    let actor = Actor {
        id: Uuid::new_v4(),
        role: Role::Passenger,
    };
    authenticate(&mut socket, &actor).await;

    send_json(
        &mut socket,
        json!({ "type": "subscribe", "topics": [format!("rides:driver:{}", Uuid::new_v4())] }),
    )
    .await;

    let value = next_text_frame(&mut socket).await;
    assert_eq!(value.get("type").and_then(Value::as_str), Some("error"));
    assert_eq!(value.get("code").and_then(Value::as_str), Some("forbidden"));
}

#[rstest]
#[actix_rt::test]
async fn admins_may_watch_any_user_topic(
    #[future] ws_client: (Socket, ServerHandle, Arc<BroadcastRideEvents>),
) {
    let (mut socket, _server, _events) = ws_client.await;
    let admin = Actor {
        id: Uuid::new_v4(),
        role: Role::Admin,
    };
    authenticate(&mut socket, &admin).await;

    send_json(
        &mut socket,
        json!({ "type": "subscribe", "topics": [format!("rides:driver:{}", Uuid::new_v4())] }),
    )
    .await;

    let value = next_text_frame(&mut socket).await;
    assert_eq!(
        value.get("type").and_then(Value::as_str),
        Some("subscribed")
    );
}

#[rstest]
#[actix_rt::test]
async fn invalid_tokens_close_the_session(
    #[future] ws_client: (Socket, ServerHandle, Arc<BroadcastRideEvents>),
) {
    let (mut socket, _server, _events) = ws_client.await;
    send_json(
        &mut socket,
        json!({ "type": "authenticate", "token": "not-a-uuid" }),
    )
    .await;

    loop {
        let frame = socket.next().await.expect("response frame").expect("frame");
        match frame {
            Frame::Ping(_) | Frame::Pong(_) => continue,
            Frame::Close(reason) => {
                assert_eq!(reason.expect("reason").code, CloseCode::Policy);
                return;
            }
            other => panic!("expected close frame, got {other:?}"),
        }
    }
}

#[rstest]
#[actix_rt::test]
async fn closes_on_malformed_json(
    #[future] ws_client: (Socket, ServerHandle, Arc<BroadcastRideEvents>),
) {
    let (mut socket, _server, _events) = ws_client.await;
    socket
        .send(Message::Text("not-json".into()))
        .await
        .expect("send text");

    loop {
        let frame = socket.next().await.expect("response frame").expect("frame");
        match frame {
            Frame::Ping(_) | Frame::Pong(_) => continue,
            Frame::Close(reason) => {
                assert_eq!(reason.expect("reason").code, CloseCode::Policy);
                return;
            }
            other => panic!("expected close frame, got {other:?}"),
        }
    }
}

#[rstest]
#[actix_rt::test]
async fn closes_after_timeout_without_client_messages(
    #[future] ws_client: (Socket, ServerHandle, Arc<BroadcastRideEvents>),
) {
    let (mut socket, _server, _events) = ws_client.await;
    tokio::time::sleep(CLIENT_TIMEOUT + HEARTBEAT_INTERVAL * 3).await;

    let observed_close = tokio::time::timeout(Duration::from_secs(2), async {
        let mut observed = None;
        while let Some(frame) = socket.next().await {
            let frame = frame.expect("frame");
            match frame {
                Frame::Ping(_) | Frame::Pong(_) => continue,
                Frame::Close(reason) => {
                    observed = reason;
                    break;
                }
                other => panic!("unexpected frame before close: {other:?}"),
            }
        }
        observed
    })
    .await
    .expect("close frame missing within timeout")
    .expect("close frame missing after timeout");

    assert_eq!(observed_close.code, CloseCode::Normal);
    assert_eq!(
        observed_close.description.as_deref(),
        Some("heartbeat timeout")
    );
}
