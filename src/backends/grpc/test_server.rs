//! In-process `clamav.ClamAVScanner` service for driving [`GrpcClient`]
//! over a real HTTP/2 connection.
//!
//! Files containing the EICAR signature are reported as `FOUND`, anything
//! else as `OK`. A streamed file named [`REJECTED`] is refused with
//! `InvalidArgument` after its first chunk.
//!
//! [`GrpcClient`]: super::GrpcClient

use super::proto::{
    HealthCheckRequest, HealthCheckResponse, ScanFileRequest, ScanResponse, ScanStreamRequest,
};

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_stream::wrappers::{ReceiverStream, TcpListenerStream};
use tonic::body::BoxBody;
use tonic::codec::{ProstCodec, Streaming};
use tonic::codegen::{empty_body, http, Body, BoxFuture, Service, StdError};
use tonic::server::{ClientStreamingService, Grpc, NamedService, StreamingService, UnaryService};
use tonic::{Request, Response, Status};

pub(crate) const EICAR: &[u8] =
    br"X5O!P%@AP[4\PZX54(P^)7CC)7}$EICAR-STANDARD-ANTIVIRUS-TEST-FILE!$H+H*";

/// Streamed files with this name are refused mid-stream.
pub(crate) const REJECTED: &str = "rejected.bin";

#[derive(Debug, Clone)]
pub(crate) struct FakeClamAv {
    health: &'static str,
    streamed: Arc<Mutex<Vec<ScanStreamRequest>>>,
}

impl FakeClamAv {
    /// A service that reports `health` from its health check.
    pub(crate) fn new(health: &'static str) -> Self {
        Self {
            health,
            streamed: Arc::default(),
        }
    }

    /// Binds an ephemeral local port and serves until the runtime shuts down.
    pub(crate) async fn serve(&self) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(
            tonic::transport::Server::builder()
                .add_service(self.clone())
                .serve_with_incoming(TcpListenerStream::new(listener)),
        );
        addr
    }

    /// Every message received so far on `ScanStream` calls.
    pub(crate) fn streamed(&self) -> Vec<ScanStreamRequest> {
        self.streamed.lock().unwrap().clone()
    }
}

fn verdict(data: &[u8], filename: String) -> ScanResponse {
    let infected = data.windows(EICAR.len()).any(|w| w == EICAR);
    ScanResponse {
        status: if infected { "FOUND" } else { "OK" }.to_string(),
        message: if infected {
            "Eicar-Test-Signature".to_string()
        } else {
            String::new()
        },
        scan_time: 0.002,
        filename,
    }
}

struct HealthCheck(&'static str);

impl UnaryService<HealthCheckRequest> for HealthCheck {
    type Response = HealthCheckResponse;
    type Future = BoxFuture<Response<HealthCheckResponse>, Status>;

    fn call(&mut self, _request: Request<HealthCheckRequest>) -> Self::Future {
        let status = self.0.to_string();
        Box::pin(async move {
            Ok(Response::new(HealthCheckResponse {
                status,
                message: "ready".to_string(),
            }))
        })
    }
}

struct ScanFile;

impl UnaryService<ScanFileRequest> for ScanFile {
    type Response = ScanResponse;
    type Future = BoxFuture<Response<ScanResponse>, Status>;

    fn call(&mut self, request: Request<ScanFileRequest>) -> Self::Future {
        let request = request.into_inner();
        Box::pin(async move { Ok(Response::new(verdict(&request.data, request.filename))) })
    }
}

struct ScanStream(Arc<Mutex<Vec<ScanStreamRequest>>>);

impl ClientStreamingService<ScanStreamRequest> for ScanStream {
    type Response = ScanResponse;
    type Future = BoxFuture<Response<ScanResponse>, Status>;

    fn call(&mut self, request: Request<Streaming<ScanStreamRequest>>) -> Self::Future {
        let streamed = Arc::clone(&self.0);
        Box::pin(async move {
            let mut messages = request.into_inner();
            let mut filename = String::new();
            let mut data = Vec::new();

            while let Some(message) = messages.message().await? {
                if message.filename == REJECTED {
                    return Err(Status::invalid_argument("file type not allowed"));
                }
                if filename.is_empty() {
                    filename = message.filename.clone();
                }
                data.extend_from_slice(&message.chunk);
                let is_last = message.is_last;
                streamed.lock().unwrap().push(message);
                if is_last {
                    break;
                }
            }

            Ok(Response::new(verdict(&data, filename)))
        })
    }
}

struct ScanMultiple;

impl StreamingService<ScanStreamRequest> for ScanMultiple {
    type Response = ScanResponse;
    type ResponseStream = ReceiverStream<Result<ScanResponse, Status>>;
    type Future = BoxFuture<Response<Self::ResponseStream>, Status>;

    fn call(&mut self, request: Request<Streaming<ScanStreamRequest>>) -> Self::Future {
        let mut messages = request.into_inner();
        let (tx, rx) = mpsc::channel(16);

        tokio::spawn(async move {
            let mut current: Option<(String, Vec<u8>)> = None;
            while let Ok(Some(message)) = messages.message().await {
                let (_, data) =
                    current.get_or_insert_with(|| (message.filename.clone(), Vec::new()));
                data.extend_from_slice(&message.chunk);
                if !message.is_last {
                    continue;
                }
                if let Some((filename, data)) = current.take() {
                    if tx.send(Ok(verdict(&data, filename))).await.is_err() {
                        return;
                    }
                }
            }
        });

        Box::pin(async move { Ok(Response::new(ReceiverStream::new(rx))) })
    }
}

impl<B> Service<http::Request<B>> for FakeClamAv
where
    B: Body + Send + 'static,
    B::Error: Into<StdError> + Send + 'static,
{
    type Response = http::Response<BoxBody>;
    type Error = Infallible;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<B>) -> Self::Future {
        let health = self.health;
        let streamed = Arc::clone(&self.streamed);
        let path = req.uri().path().to_string();

        Box::pin(async move {
            let response = match path.as_str() {
                "/clamav.ClamAVScanner/HealthCheck" => {
                    let mut grpc = Grpc::new(ProstCodec::default());
                    grpc.unary(HealthCheck(health), req).await
                }
                "/clamav.ClamAVScanner/ScanFile" => {
                    let mut grpc = Grpc::new(ProstCodec::default());
                    grpc.unary(ScanFile, req).await
                }
                "/clamav.ClamAVScanner/ScanStream" => {
                    let mut grpc = Grpc::new(ProstCodec::default());
                    grpc.client_streaming(ScanStream(streamed), req).await
                }
                "/clamav.ClamAVScanner/ScanMultiple" => {
                    let mut grpc = Grpc::new(ProstCodec::default());
                    grpc.streaming(ScanMultiple, req).await
                }
                _ => http::Response::builder()
                    .status(200)
                    .header("grpc-status", "12")
                    .header("content-type", "application/grpc")
                    .body(empty_body())
                    .unwrap(),
            };
            Ok(response)
        })
    }
}

impl NamedService for FakeClamAv {
    const NAME: &'static str = "clamav.ClamAVScanner";
}
