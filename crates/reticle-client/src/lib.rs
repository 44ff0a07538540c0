// SPDX-License-Identifier: Apache-2.0
//! Async client for the Reticle layout query service.
//!
//! One TCP connection speaking newline-delimited JSON-RPC. [`Client::call`]
//! is the raw entry point; a typed wrapper exists for every service method,
//! built from the `reticle-proto` parameter and result types, so callers
//! never hand-assemble protocol JSON. Requests carry auto-assigned integer
//! ids and responses are matched back by id.

use std::io;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};

use reticle_core::walk::DownStats;
use reticle_proto::methods::{
    CellCreateParams, CellsResult, CreatedResult, DbuResult, HierarchyDepthResult,
    InsertedResult, InstanceArrayCreateParams, InstanceCreateParams, LayerNewParams,
    LayerNewResult, LayersResult, LayoutNewParams, LayoutNewResult, PingResult, QueryDownParams,
    QueryDownResult, QueryDownStatsParams, ShapeCreateParams, ShapesRecParams, ShapesRecResult,
    TopCellResult, UpPathsParams, UpPathsResult,
};
use reticle_proto::{method, Request, RequestId, Response};

/// Failure of a client call.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Socket-level failure.
    #[error("transport error: {0}")]
    Io(#[from] io::Error),

    /// The server closed the connection before answering.
    #[error("connection closed before a response arrived")]
    Closed,

    /// A line arrived that is not a valid response envelope, or a result
    /// payload did not match the expected shape.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The server answered with an error object.
    #[error("server error {code}: {message}")]
    Rpc {
        /// Numeric code from the wire table.
        code: i32,
        /// Server-provided message.
        message: String,
        /// `data.type` discriminator when the server sent one.
        kind: Option<String>,
    },
}

fn to_params<P: Serialize>(params: &P) -> Result<Value, ClientError> {
    serde_json::to_value(params).map_err(|e| ClientError::Protocol(e.to_string()))
}

fn parse<R: DeserializeOwned>(value: Value) -> Result<R, ClientError> {
    serde_json::from_value(value).map_err(|e| ClientError::Protocol(e.to_string()))
}

/// Connected client. Not safe for concurrent calls; issue one at a time.
#[derive(Debug)]
pub struct Client {
    stream: TcpStream,
    acc: Vec<u8>,
    next_id: i64,
}

impl Client {
    /// Connects to a running service.
    ///
    /// # Errors
    /// Propagates the connect failure.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self {
            stream,
            acc: Vec::new(),
            next_id: 0,
        })
    }

    /// Sends one call and waits for its response.
    ///
    /// # Errors
    /// [`ClientError::Rpc`] when the server answers with an error object;
    /// [`ClientError::Closed`] when the connection ends first.
    pub async fn call(&mut self, name: &str, params: Option<Value>) -> Result<Value, ClientError> {
        self.next_id += 1;
        let id = self.next_id;
        self.send(&Request::call(id, name, params)).await?;

        loop {
            let Some(text) = self.next_line().await? else {
                return Err(ClientError::Closed);
            };
            let resp: Response =
                serde_json::from_str(&text).map_err(|e| ClientError::Protocol(e.to_string()))?;
            if resp.id != RequestId::Num(id) {
                // Not ours (e.g. an error answer to an earlier notification
                // with a null id); keep waiting for the matching id.
                continue;
            }
            if let Some(err) = resp.error {
                let kind = err.kind().map(str::to_owned);
                return Err(ClientError::Rpc {
                    code: err.code,
                    message: err.message,
                    kind,
                });
            }
            return resp.result.ok_or_else(|| {
                ClientError::Protocol("response carries neither result nor error".to_owned())
            });
        }
    }

    /// Sends a notification: executed server-side, never answered.
    ///
    /// # Errors
    /// Propagates the socket write failure.
    pub async fn notify(&mut self, name: &str, params: Option<Value>) -> Result<(), ClientError> {
        self.send(&Request::notification(name, params)).await
    }

    async fn send(&mut self, req: &Request) -> Result<(), ClientError> {
        let mut line =
            serde_json::to_string(req).map_err(|e| ClientError::Protocol(e.to_string()))?;
        line.push('\n');
        self.stream.write_all(line.as_bytes()).await?;
        Ok(())
    }

    /// Next full line from the socket; `Ok(None)` on clean EOF between
    /// lines. EOF inside a partial line is an error.
    async fn next_line(&mut self) -> Result<Option<String>, ClientError> {
        let mut buf = [0_u8; 4096];
        loop {
            if let Some(pos) = self.acc.iter().position(|&b| b == b'\n') {
                let raw: Vec<u8> = self.acc.drain(..=pos).collect();
                let text = String::from_utf8_lossy(&raw).trim().to_owned();
                if text.is_empty() {
                    continue;
                }
                return Ok(Some(text));
            }
            let n = self.stream.read(&mut buf).await?;
            if n == 0 {
                if self.acc.is_empty() {
                    return Ok(None);
                }
                return Err(ClientError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed inside a partial line",
                )));
            }
            self.acc.extend_from_slice(&buf[..n]);
        }
    }

    /// Liveness probe.
    ///
    /// # Errors
    /// See [`Client::call`]; likewise for every wrapper below.
    pub async fn ping(&mut self) -> Result<PingResult, ClientError> {
        parse(self.call(method::PING, None).await?)
    }

    /// Creates or replaces the active layout.
    pub async fn layout_new(
        &mut self,
        params: &LayoutNewParams,
    ) -> Result<LayoutNewResult, ClientError> {
        parse(self.call(method::LAYOUT_NEW, Some(to_params(params)?)).await?)
    }

    /// Registers a `(layer, datatype)` pair.
    pub async fn layer_new(
        &mut self,
        params: &LayerNewParams,
    ) -> Result<LayerNewResult, ClientError> {
        parse(self.call(method::LAYER_NEW, Some(to_params(params)?)).await?)
    }

    /// Creates an empty cell.
    pub async fn cell_create(&mut self, cell_name: &str) -> Result<CreatedResult, ClientError> {
        let params = CellCreateParams {
            name: cell_name.to_owned(),
        };
        parse(self.call(method::CELL_CREATE, Some(to_params(&params)?)).await?)
    }

    /// Appends a shape to a cell.
    pub async fn shape_create(
        &mut self,
        params: &ShapeCreateParams,
    ) -> Result<CreatedResult, ClientError> {
        parse(self.call(method::SHAPE_CREATE, Some(to_params(params)?)).await?)
    }

    /// Places a child cell once.
    pub async fn instance_create(
        &mut self,
        params: &InstanceCreateParams,
    ) -> Result<InsertedResult, ClientError> {
        parse(
            self.call(method::INSTANCE_CREATE, Some(to_params(params)?))
                .await?,
        )
    }

    /// Places a child cell as a regular grid.
    pub async fn instance_array_create(
        &mut self,
        params: &InstanceArrayCreateParams,
    ) -> Result<InsertedResult, ClientError> {
        parse(
            self.call(method::INSTANCE_ARRAY_CREATE, Some(to_params(params)?))
                .await?,
        )
    }

    /// Resolves the single root cell.
    pub async fn get_topcell(&mut self) -> Result<TopCellResult, ClientError> {
        parse(self.call(method::LAYOUT_GET_TOPCELL, None).await?)
    }

    /// Lists the layer table.
    pub async fn get_layers(&mut self) -> Result<LayersResult, ClientError> {
        parse(self.call(method::LAYOUT_GET_LAYERS, None).await?)
    }

    /// Reports the dbu scale factor.
    pub async fn get_dbu(&mut self) -> Result<DbuResult, ClientError> {
        parse(self.call(method::LAYOUT_GET_DBU, None).await?)
    }

    /// Lists cells in creation order.
    pub async fn get_cells(&mut self) -> Result<CellsResult, ClientError> {
        parse(self.call(method::LAYOUT_GET_CELLS, None).await?)
    }

    /// Longest root-to-leaf instantiation chain.
    pub async fn get_hierarchy_depth(&mut self) -> Result<HierarchyDepthResult, ClientError> {
        parse(self.call(method::LAYOUT_GET_HIERARCHY_DEPTH, None).await?)
    }

    /// Enumerates instances below a cell.
    pub async fn query_down(
        &mut self,
        params: &QueryDownParams,
    ) -> Result<QueryDownResult, ClientError> {
        parse(self.call(method::HIER_QUERY_DOWN, Some(to_params(params)?)).await?)
    }

    /// Counts placements below a cell per child name.
    pub async fn query_down_stats(
        &mut self,
        params: &QueryDownStatsParams,
    ) -> Result<DownStats, ClientError> {
        parse(
            self.call(method::HIER_QUERY_DOWN_STATS, Some(to_params(params)?))
                .await?,
        )
    }

    /// Enumerates root-to-target containment paths.
    pub async fn query_up_paths(
        &mut self,
        params: &UpPathsParams,
    ) -> Result<UpPathsResult, ClientError> {
        parse(
            self.call(method::HIER_QUERY_UP_PATHS, Some(to_params(params)?))
                .await?,
        )
    }

    /// Sweeps shapes in a subtree with accumulated transforms.
    pub async fn shapes_rec(
        &mut self,
        params: &ShapesRecParams,
    ) -> Result<ShapesRecResult, ClientError> {
        parse(self.call(method::HIER_SHAPES_REC, Some(to_params(params)?)).await?)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncBufReadExt, BufReader};
    use tokio::net::TcpListener;

    /// One-shot fake server: accepts a connection, reads `n` lines, answers
    /// each with the prepared reply.
    async fn fake_server(replies: Vec<String>) -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (reader, mut writer) = stream.into_split();
            let mut lines = BufReader::new(reader).lines();
            for reply in replies {
                let _ = lines.next_line().await.unwrap();
                writer.write_all(reply.as_bytes()).await.unwrap();
                writer.write_all(b"\n").await.unwrap();
            }
        });
        addr
    }

    #[tokio::test]
    async fn call_matches_the_response_by_id() {
        let addr = fake_server(vec![
            r#"{"jsonrpc":"2.0","id":1,"result":{"pong":true}}"#.to_owned(),
        ])
        .await;
        let mut client = Client::connect(addr).await.unwrap();
        let pong = client.ping().await.unwrap();
        assert!(pong.pong);
    }

    #[tokio::test]
    async fn server_errors_surface_with_code_and_kind() {
        let addr = fake_server(vec![
            concat!(
                r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32002,"#,
                r#""message":"Cell not found: 'X'","data":{"type":"CellNotFound"}}}"#
            )
            .to_owned(),
        ])
        .await;
        let mut client = Client::connect(addr).await.unwrap();
        let err = client.get_topcell().await.unwrap_err();
        match err {
            ClientError::Rpc { code, kind, .. } => {
                assert_eq!(code, -32002);
                assert_eq!(kind.as_deref(), Some("CellNotFound"));
            }
            other => panic!("expected Rpc error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn foreign_ids_are_skipped_until_ours_arrives() {
        let addr = fake_server(vec![[
            r#"{"jsonrpc":"2.0","id":999,"result":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":1,"result":{"dbu":0.001}}"#,
        ]
        .concat()])
        .await;
        let mut client = Client::connect(addr).await.unwrap();
        let dbu = client.get_dbu().await.unwrap();
        assert!((dbu.dbu - 0.001).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn early_close_reports_closed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            drop(stream);
        });
        let mut client = Client::connect(addr).await.unwrap();
        let err = client.call(method::PING, None).await.unwrap_err();
        assert!(matches!(err, ClientError::Closed | ClientError::Io(_)));
    }

    #[tokio::test]
    async fn typed_wrappers_serialize_the_documented_params() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (reader, mut writer) = stream.into_split();
            let mut lines = BufReader::new(reader).lines();
            let line = lines.next_line().await.unwrap().unwrap();
            writer
                .write_all(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{\"created\":true}}\n")
                .await
                .unwrap();
            line
        });

        let mut client = Client::connect(addr).await.unwrap();
        client.cell_create("NAND2").await.unwrap();

        let sent: Value = serde_json::from_str(&seen.await.unwrap()).unwrap();
        assert_eq!(sent["method"], "cell.create");
        assert_eq!(sent["params"], json!({"name": "NAND2"}));
        assert_eq!(sent["id"], 1);
    }
}
