// SPDX-License-Identifier: Apache-2.0
//! End-to-end tests: a real listener, a real client, the full
//! build-and-query flow over TCP.
#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::net::SocketAddr;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};

use reticle_client::{Client, ClientError};
use reticle_core::geom::Trans;
use reticle_core::walk::{DownMode, Unit};
use reticle_core::ShapeKind;
use reticle_proto::methods::{
    Coords, InstanceCreateParams, LayerNewParams, LayoutNewParams, QueryDownParams,
    ShapeCreateParams, ShapesRecParams, UpPathsParams,
};
use reticle_server::{Server, ServerConfig};

const TICK: Duration = Duration::from_millis(20);

async fn start_server() -> SocketAddr {
    let server = Server::bind(&ServerConfig {
        listen: "127.0.0.1:0".parse().expect("loopback addr"),
        max_line_bytes: 1024 * 1024,
    })
    .await
    .expect("bind");
    let addr = server.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    addr
}

/// Connects and pings until the session gate is free.
async fn connect_when_free(addr: SocketAddr) -> Client {
    for _ in 0..100 {
        if let Ok(mut client) = Client::connect(addr).await {
            if client.ping().await.is_ok() {
                return client;
            }
        }
        sleep(TICK).await;
    }
    panic!("server never freed the session");
}

// ==== build and query over the wire ====================================

#[tokio::test]
async fn builds_and_queries_a_layout_over_tcp() {
    timeout(Duration::from_secs(10), async {
        let addr = start_server().await;
        let mut client = connect_when_free(addr).await;

        let layout = client
            .layout_new(&LayoutNewParams {
                name: "demo".to_owned(),
                top_cell: "TOP".to_owned(),
                dbu: 0.001,
                clear_previous: true,
            })
            .await
            .expect("layout.new");
        assert_eq!(layout.top_cell, "TOP");

        let layer = client
            .layer_new(&LayerNewParams {
                layer: 1,
                datatype: 0,
                as_current: true,
            })
            .await
            .expect("layer.new");
        client.cell_create("CHILD").await.expect("cell.create");
        client
            .shape_create(&ShapeCreateParams {
                cell: "CHILD".to_owned(),
                shape_type: ShapeKind::Box,
                coords: Coords::Flat(vec![0.0, 0.0, 500.0, 500.0]),
                width: None,
                units: Unit::Dbu,
                layer_index: Some(layer.layer_index),
            })
            .await
            .expect("shape.create");
        client
            .instance_create(&InstanceCreateParams {
                cell: "TOP".to_owned(),
                child_cell: "CHILD".to_owned(),
                trans: Trans::translate(1000, 2000),
            })
            .await
            .expect("instance.create");

        let down = client
            .query_down(&QueryDownParams {
                cell: "TOP".to_owned(),
                depth: 1,
                mode: DownMode::Structural,
                include_bbox: true,
                max_results: 100,
            })
            .await
            .expect("query_down");
        assert_eq!(down.instances.len(), 1);
        assert_eq!(down.instances[0].child, "CHILD");
        assert_eq!(down.instances[0].trans, Trans::translate(1000, 2000));

        let up = client
            .query_up_paths(&UpPathsParams {
                cell: "CHILD".to_owned(),
                max_paths: 10,
            })
            .await
            .expect("up_paths");
        assert_eq!(
            serde_json::to_value(&up.paths).expect("paths"),
            json!([["demo", "TOP", "CHILD"]])
        );

        let shapes = client
            .shapes_rec(&ShapesRecParams {
                start_cell: "TOP".to_owned(),
                layers: None,
                unit: Unit::Micron,
                include_transform: false,
                max_results: 100,
            })
            .await
            .expect("shapes_rec");
        assert_eq!(shapes.shapes.len(), 1);
        assert_eq!(shapes.shapes[0].bbox, [1.0, 2.0, 1.5, 2.5]);
        assert!(!shapes.truncated);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn server_errors_carry_the_wire_code() {
    timeout(Duration::from_secs(10), async {
        let addr = start_server().await;
        let mut client = connect_when_free(addr).await;
        let err = client.get_dbu().await.expect_err("no layout yet");
        match err {
            ClientError::Rpc { code, kind, .. } => {
                assert_eq!(code, -32001);
                assert_eq!(kind.as_deref(), Some("NoActiveLayout"));
            }
            other => panic!("expected Rpc error, got {other:?}"),
        }
    })
    .await
    .expect("test timed out");
}

// ==== session lifetime and arbitration =================================

#[tokio::test]
async fn session_state_survives_reconnect() {
    timeout(Duration::from_secs(10), async {
        let addr = start_server().await;

        let mut first = connect_when_free(addr).await;
        first
            .layout_new(&LayoutNewParams {
                name: "persist".to_owned(),
                top_cell: "TOP".to_owned(),
                dbu: 0.001,
                clear_previous: true,
            })
            .await
            .expect("layout.new");
        drop(first);

        let mut second = connect_when_free(addr).await;
        let cells = second.get_cells().await.expect("get_cells");
        assert_eq!(cells.cells, vec!["TOP".to_owned()]);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn second_client_is_rejected_while_the_first_holds_the_session() {
    timeout(Duration::from_secs(10), async {
        let addr = start_server().await;

        let mut holder = connect_when_free(addr).await;
        holder.ping().await.expect("holder ping");

        let mut intruder = Client::connect(addr).await.expect("tcp connect");
        let err = intruder.ping().await.expect_err("must be rejected");
        assert!(matches!(err, ClientError::Closed | ClientError::Io(_)));

        // Releasing the first client frees the gate for the next one.
        drop(holder);
        let mut next = connect_when_free(addr).await;
        next.ping().await.expect("ping after release");
    })
    .await
    .expect("test timed out");
}

// ==== wire-level behavior ==============================================

#[tokio::test]
async fn malformed_lines_get_a_null_id_parse_error() {
    timeout(Duration::from_secs(10), async {
        let addr = start_server().await;
        let stream = TcpStream::connect(addr).await.expect("connect");
        let (reader, mut writer) = stream.into_split();
        writer.write_all(b"{broken\n").await.expect("write");

        let mut lines = BufReader::new(reader).lines();
        let line = lines
            .next_line()
            .await
            .expect("read")
            .expect("one response line");
        let v: Value = serde_json::from_str(&line).expect("valid JSON");
        assert_eq!(v["id"], Value::Null);
        assert_eq!(v["error"]["code"], -32700);
        assert_eq!(v["error"]["data"]["type"], "ParseError");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn notifications_execute_without_a_response() {
    timeout(Duration::from_secs(10), async {
        let addr = start_server().await;
        let mut client = connect_when_free(addr).await;

        client
            .notify("layout.new", Some(json!({"name": "quiet"})))
            .await
            .expect("notify");
        // The next call's answer must be for the call, not the notification.
        let cells = client.get_cells().await.expect("get_cells");
        assert_eq!(cells.cells, vec!["TOP".to_owned()]);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn oversized_lines_close_the_connection() {
    timeout(Duration::from_secs(10), async {
        let server = Server::bind(&ServerConfig {
            listen: "127.0.0.1:0".parse().expect("loopback addr"),
            max_line_bytes: 256,
        })
        .await
        .expect("bind");
        let addr = server.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = server.run().await;
        });

        let mut client = connect_when_free(addr).await;
        let huge = "x".repeat(1024);
        let err = client
            .call("ping", Some(json!({"pad": huge})))
            .await
            .expect_err("oversized line must close the connection");
        assert!(matches!(err, ClientError::Closed | ClientError::Io(_)));
    })
    .await
    .expect("test timed out");
}
