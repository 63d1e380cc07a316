//! Bidirectional rewrite RPC peer
//!
//! Both ends run the same [`RewriteRpc`]: each can ask the other to visit,
//! print or generate trees, and each serves `GetObject` for the trees it
//! holds. A tree crosses the connection only as a diff against the state
//! the other side is known to hold, so a visit that changes one node sends
//! that node and the path to it, nothing else.
//!
//! Requests are served on their own tasks. Handlers call back into the
//! requester (a `Visit` fetches its tree with `GetObject`), which only works
//! because the read loop keeps reading while they wait.
//!
//! A transfer that fails or is dropped before `END_OF_OBJECT` leaves the two
//! sides disagreeing about which refs were delivered. The receiver remembers
//! it, and its next `GetObject` names the abandoned objects so both sides
//! restart the ref session and resend those objects in full.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncRead, AsyncWrite, BufReader};
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tracing::Instrument;

use rewrite_core::{
    Cursor, ExecutionContext, Recipe, RecipeRegistry, RpcConfig, SourceFile, Tree,
};

use crate::data::RpcObjectData;
use crate::error::{Result, RpcError};
use crate::jsonrpc::{self, Message, Request, Response, error_codes};
use crate::messages::{
    Generate, GenerateResponse, GetObject, PrepareRecipe, PrepareRecipeResponse, Print, Visit,
    VisitResponse, methods,
};
use crate::receive::{BatchSource, ReceiveQueue};
use crate::refs::{ReceivedRefs, RefTable};
use crate::send::SendQueue;

type Writer = Box<dyn AsyncWrite + Send + Unpin>;

/// Batches of an object transfer that has started but not finished
struct Outgoing {
    id: String,
    batches: VecDeque<Vec<RpcObjectData>>,
    after: SourceFile,
}

/// Sending half of the ref session
///
/// The peer receives one object at a time, so at most one transfer is open.
struct Sending {
    refs: RefTable,
    /// Highest transfer number the peer has started
    transfer: u64,
    current: Option<Outgoing>,
}

/// Receiving half of the ref session
struct Incoming {
    refs: ReceivedRefs,
    next_transfer: u64,
    /// Objects whose transfers never reached `END_OF_OBJECT` since the
    /// last transfer that did
    abandoned: Vec<String>,
}

struct Inner {
    writer: Mutex<Writer>,
    pending: DashMap<u64, oneshot::Sender<Response>>,
    next_id: AtomicU64,
    closed: AtomicBool,
    registry: RecipeRegistry,
    config: RpcConfig,
    /// Current state of every tree this side holds
    local_objects: DashMap<String, SourceFile>,
    /// State of each tree as the peer last saw it
    remote_objects: DashMap<String, SourceFile>,
    prepared: DashMap<String, Arc<dyn Recipe>>,
    next_recipe: AtomicU64,
    contexts: DashMap<String, ExecutionContext>,
    sent: Mutex<Sending>,
    received: Mutex<Incoming>,
}

/// One end of a rewrite RPC connection
///
/// Dropping it stops the read loop; the session's ref tables go with it.
pub struct RewriteRpc {
    inner: Arc<Inner>,
    reader: JoinHandle<()>,
}

impl RewriteRpc {
    /// Serve and issue requests over a single duplex stream
    pub fn start<S>(stream: S, registry: RecipeRegistry, config: RpcConfig) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read, write) = tokio::io::split(stream);
        Self::from_halves(read, write, registry, config)
    }

    /// Serve and issue requests over separate read and write streams, such
    /// as a child process's stdout and stdin
    pub fn from_halves<R, W>(reader: R, writer: W, registry: RecipeRegistry, config: RpcConfig) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let inner = Arc::new(Inner {
            writer: Mutex::new(Box::new(writer)),
            pending: DashMap::new(),
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
            registry,
            config,
            local_objects: DashMap::new(),
            remote_objects: DashMap::new(),
            prepared: DashMap::new(),
            next_recipe: AtomicU64::new(1),
            contexts: DashMap::new(),
            sent: Mutex::new(Sending {
                refs: RefTable::new(),
                transfer: 0,
                current: None,
            }),
            received: Mutex::new(Incoming {
                refs: ReceivedRefs::new(),
                next_transfer: 1,
                abandoned: Vec::new(),
            }),
        });
        let reader = tokio::spawn(read_loop(Arc::clone(&inner), BufReader::new(reader)));
        Self { inner, reader }
    }

    /// Instantiate a recipe on the peer; the returned id names it in
    /// [`RewriteRpc::visit`] and [`RewriteRpc::generate`]
    pub async fn prepare_recipe(&self, name: &str, options: Value) -> Result<PrepareRecipeResponse> {
        self.inner
            .request(
                methods::PREPARE_RECIPE,
                PrepareRecipe {
                    id: name.to_string(),
                    options,
                },
            )
            .await
    }

    /// Run a prepared recipe over `source` on the peer
    ///
    /// Returns the visited tree, `source` itself when the recipe made no
    /// change, or `None` when it deleted the file.
    pub async fn visit(
        &self,
        source: &SourceFile,
        recipe_id: &str,
        p: Option<&str>,
    ) -> Result<Option<SourceFile>> {
        let id = self.inner.hold(source);
        let response: VisitResponse = self
            .inner
            .request(
                methods::VISIT,
                Visit {
                    visitor: recipe_id.to_string(),
                    tree_id: id.clone(),
                    source_file_type: source.source_file_type().to_string(),
                    p: p.map(str::to_string),
                },
            )
            .await?;

        if response.deleted {
            self.inner.local_objects.remove(&id);
            return Ok(None);
        }
        if !response.modified {
            return Ok(Some(source.clone()));
        }
        self.inner
            .get_object(&id, source.source_file_type())
            .await
            .map(Some)
    }

    /// Files a prepared recipe generates on the peer
    pub async fn generate(&self, recipe_id: &str, p: Option<&str>) -> Result<Vec<SourceFile>> {
        let response: GenerateResponse = self
            .inner
            .request(
                methods::GENERATE,
                Generate {
                    id: recipe_id.to_string(),
                    p: p.map(str::to_string),
                },
            )
            .await?;

        let mut generated = Vec::with_capacity(response.ids.len());
        for (id, source_file_type) in response.ids.iter().zip(&response.source_file_types) {
            generated.push(self.inner.get_object(id, source_file_type).await?);
        }
        Ok(generated)
    }

    /// Have the peer print `source`
    pub async fn print(&self, source: &SourceFile) -> Result<String> {
        let id = self.inner.hold(source);
        self.inner
            .request(
                methods::PRINT,
                Print {
                    tree_id: id,
                    source_file_type: source.source_file_type().to_string(),
                },
            )
            .await
    }

    /// Fetch a tree the peer holds
    pub async fn get_object(&self, id: &str, source_file_type: &str) -> Result<SourceFile> {
        self.inner.get_object(id, source_file_type).await
    }

    /// Current local state of a tree, if this side holds it
    pub fn local_object(&self, id: &str) -> Option<SourceFile> {
        self.inner.local_objects.get(id).map(|entry| entry.clone())
    }

    /// Messages and data-table rows gathered by the peer's visits under `p`
    pub fn execution_context(&self, p: &str) -> Option<ExecutionContext> {
        self.inner.contexts.get(p).map(|entry| entry.clone())
    }

    /// Stop the read loop; outstanding requests fail with a transport error
    pub fn shutdown(&self) {
        self.reader.abort();
        self.inner.close();
    }
}

impl Drop for RewriteRpc {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn read_loop<R>(inner: Arc<Inner>, mut reader: R)
where
    R: AsyncBufRead + Send + Unpin,
{
    loop {
        match jsonrpc::read_message(&mut reader).await {
            Ok(Some(Message::Request(request))) => {
                let inner = Arc::clone(&inner);
                tokio::spawn(async move { inner.serve(request).await });
            }
            Ok(Some(Message::Response(response))) => match inner.pending.remove(&response.id) {
                Some((_, waiting)) => {
                    let _ = waiting.send(response);
                }
                None => tracing::warn!(id = response.id, "response to unknown request"),
            },
            Ok(None) => {
                tracing::debug!("peer closed the connection");
                break;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to read from peer");
                break;
            }
        }
    }
    inner.close();
}

/// Pulls each batch of an object with a `GetObject` request
struct RemoteBatches<'a> {
    inner: &'a Inner,
    request: GetObject,
}

#[async_trait]
impl BatchSource for RemoteBatches<'_> {
    async fn next_batch(&mut self) -> Result<Vec<RpcObjectData>> {
        let batch = self
            .inner
            .request(methods::GET_OBJECT, &self.request)
            .await;
        // Only the first request of a transfer restarts the session
        self.request.abandoned.clear();
        batch
    }
}

fn params<T: DeserializeOwned>(request: &Request) -> Result<T> {
    serde_json::from_value(request.params.clone()).map_err(|e| RpcError::InvalidParams {
        method: request.method.clone(),
        message: e.to_string(),
    })
}

fn error_code(err: &RpcError) -> i64 {
    match err {
        RpcError::ObjectNotFound { .. } => error_codes::OBJECT_NOT_FOUND,
        RpcError::MethodNotFound { .. } => error_codes::METHOD_NOT_FOUND,
        RpcError::InvalidParams { .. } => error_codes::INVALID_PARAMS,
        err if err.is_fatal() => error_codes::PROTOCOL_DESYNC,
        _ => error_codes::INTERNAL_ERROR,
    }
}

impl Inner {
    /// Fail every outstanding and future request
    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.pending.clear();
    }

    async fn write(&self, message: &Message) -> Result<()> {
        let mut writer = self.writer.lock().await;
        jsonrpc::write_message(&mut *writer, message).await
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: impl Serialize) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = Message::Request(Request::new(id, method, serde_json::to_value(params)?));

        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);
        if self.closed.load(Ordering::SeqCst) {
            self.pending.remove(&id);
            return Err(RpcError::transport("connection closed"));
        }
        if let Err(err) = self.write(&request).await {
            self.pending.remove(&id);
            return Err(err);
        }

        let response = rx
            .await
            .map_err(|_| RpcError::transport(format!("connection closed awaiting '{method}'")))?;
        Ok(serde_json::from_value(response.into_result()?)?)
    }

    /// Make `source` fetchable by the peer under its tree id
    fn hold(&self, source: &SourceFile) -> String {
        let id = source.id().to_string();
        self.local_objects.insert(id.clone(), source.clone());
        id
    }

    async fn get_object(&self, id: &str, source_file_type: &str) -> Result<SourceFile> {
        let received = {
            let mut incoming = self.received.lock().await;
            let abandoned = incoming.abandoned.clone();
            if !abandoned.is_empty() {
                tracing::warn!(
                    ?abandoned,
                    "earlier transfers were abandoned, restarting the ref session"
                );
                incoming.refs.clear();
                for abandoned in &abandoned {
                    self.remote_objects.remove(abandoned);
                }
            }
            // Cleared once END_OF_OBJECT is read; stays listed if this future is dropped
            if !incoming.abandoned.iter().any(|abandoned| abandoned == id) {
                incoming.abandoned.push(id.to_string());
            }
            let transfer = incoming.next_transfer;
            incoming.next_transfer += 1;

            let before = self.remote_objects.get(id).map(|entry| entry.clone());
            let mut source = RemoteBatches {
                inner: self,
                request: GetObject {
                    id: id.to_string(),
                    source_file_type: source_file_type.to_string(),
                    transfer,
                    abandoned,
                },
            };
            let received = {
                let mut q = ReceiveQueue::new(&mut source, &mut incoming.refs)
                    .with_trace(self.config.trace_messages);
                q.receive_object::<SourceFile>(before.as_ref()).await
            };
            if received.is_ok() {
                incoming.abandoned.clear();
            }
            received
        };
        let after = match received {
            Ok(Some(after)) => after,
            Ok(None) => return Err(RpcError::ObjectNotFound { id: id.to_string() }),
            Err(err) => {
                if err.is_fatal() {
                    tracing::error!(id, error = %err, "object transfer failed");
                }
                return Err(err);
            }
        };

        if after.source_file_type() != source_file_type {
            tracing::warn!(
                id,
                expected = source_file_type,
                found = after.source_file_type(),
                "peer sent a different source file type"
            );
        }
        self.remote_objects.insert(id.to_string(), after.clone());
        self.local_objects.insert(id.to_string(), after.clone());
        Ok(after)
    }

    async fn serve(&self, request: Request) {
        let span = tracing::debug_span!("rpc", method = %request.method, id = request.id);
        let response = match self.handle(&request).instrument(span).await {
            Ok(result) => Response::success(request.id, result),
            Err(err) => {
                tracing::warn!(error = %err, "request failed");
                Response::error(request.id, error_code(&err), err.to_string())
            }
        };
        if let Err(err) = self.write(&Message::Response(response)).await {
            tracing::error!(error = %err, "failed to write response");
        }
    }

    async fn handle(&self, request: &Request) -> Result<Value> {
        match request.method.as_str() {
            methods::GET_OBJECT => {
                let batch = self.next_batch(&params(request)?).await?;
                Ok(serde_json::to_value(batch)?)
            }
            methods::VISIT => Ok(serde_json::to_value(self.handle_visit(params(request)?).await?)?),
            methods::GENERATE => {
                let generate: Generate = params(request)?;
                Ok(serde_json::to_value(self.handle_generate(generate)?)?)
            }
            methods::PREPARE_RECIPE => {
                let prepare: PrepareRecipe = params(request)?;
                Ok(serde_json::to_value(self.handle_prepare(prepare)?)?)
            }
            methods::PRINT => {
                let print: Print = params(request)?;
                let source = self.get_object(&print.tree_id, &print.source_file_type).await?;
                Ok(Value::String(source.print()))
            }
            other => Err(RpcError::MethodNotFound {
                method: other.to_string(),
            }),
        }
    }

    /// Next batch of a transfer, diffing against what the peer holds on the first call
    async fn next_batch(&self, request: &GetObject) -> Result<Vec<RpcObjectData>> {
        let mut sending = self.sent.lock().await;
        if request.transfer < sending.transfer {
            return Err(RpcError::desync(
                format!("transfer {}", sending.transfer),
                format!("stale transfer {}", request.transfer),
            ));
        }

        if !request.abandoned.is_empty() {
            tracing::warn!(
                abandoned = ?request.abandoned,
                refs = sending.refs.len(),
                "peer abandoned transfers, restarting the ref session"
            );
            sending.refs.clear();
            sending.current = None;
            for abandoned in &request.abandoned {
                self.remote_objects.remove(abandoned);
            }
        }

        if request.transfer > sending.transfer {
            sending.transfer = request.transfer;
            sending.current = None;

            let after = self
                .local_objects
                .get(&request.id)
                .map(|entry| entry.clone())
                .ok_or_else(|| RpcError::ObjectNotFound {
                    id: request.id.clone(),
                })?;
            let before = self.remote_objects.get(&request.id).map(|entry| entry.clone());

            let batches = {
                let mut q = SendQueue::new(self.config.batch_size, &mut sending.refs)
                    .with_trace(self.config.trace_messages);
                q.send_object(Some(&after), before.as_ref())?;
                q.finish()
            };

            tracing::debug!(
                id = %request.id,
                transfer = request.transfer,
                batches = batches.len(),
                diff = before.is_some(),
                "sending object"
            );
            sending.current = Some(Outgoing {
                id: request.id.clone(),
                batches: batches.into(),
                after,
            });
        }

        let outgoing = sending
            .current
            .as_mut()
            .filter(|outgoing| outgoing.id == request.id)
            .ok_or_else(|| {
                RpcError::desync(
                    format!("a transfer of '{}'", request.id),
                    format!("no open transfer {}", request.transfer),
                )
            })?;
        let batch = outgoing.batches.pop_front().unwrap_or_default();
        if outgoing.batches.is_empty() {
            if let Some(outgoing) = sending.current.take() {
                self.remote_objects.insert(outgoing.id, outgoing.after);
            }
        }
        Ok(batch)
    }

    fn recipe(&self, id: &str) -> Result<Arc<dyn Recipe>> {
        self.prepared
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| RpcError::ObjectNotFound { id: id.to_string() })
    }

    /// Context for one visit: a fork of the shared context named `p`
    fn fork_context(&self, p: Option<&str>) -> ExecutionContext {
        p.and_then(|p| self.contexts.get(p).map(|ctx| ctx.fork()))
            .unwrap_or_default()
    }

    fn merge_context(&self, p: Option<String>, child: ExecutionContext) {
        if let Some(p) = p {
            self.contexts.entry(p).or_default().merge(child);
        }
    }

    async fn handle_visit(&self, visit: Visit) -> Result<VisitResponse> {
        let recipe = self.recipe(&visit.visitor)?;
        let source = self
            .get_object(&visit.tree_id, &visit.source_file_type)
            .await?;

        let mut ctx = self.fork_context(visit.p.as_deref());
        let mut editor = recipe.editor();
        let visited = if editor.is_acceptable(&source) {
            editor.visit_source(&source, &mut ctx, &Cursor::root()).await
        } else {
            Ok(Some(source.clone()))
        };
        self.merge_context(visit.p, ctx);

        let response = match visited? {
            Some(after) => {
                let modified = !after.is_same(&source);
                self.local_objects.insert(visit.tree_id.clone(), after);
                VisitResponse {
                    modified,
                    deleted: false,
                }
            }
            None => {
                self.local_objects.remove(&visit.tree_id);
                VisitResponse {
                    modified: true,
                    deleted: true,
                }
            }
        };
        tracing::debug!(
            recipe = recipe.name(),
            tree = %visit.tree_id,
            modified = response.modified,
            "visited"
        );
        Ok(response)
    }

    fn handle_generate(&self, generate: Generate) -> Result<GenerateResponse> {
        let recipe = self.recipe(&generate.id)?;
        let mut ctx = self.fork_context(generate.p.as_deref());
        let generated = recipe.generate(&mut ctx);
        self.merge_context(generate.p, ctx);

        let mut response = GenerateResponse {
            ids: Vec::new(),
            source_file_types: Vec::new(),
        };
        for source in generated? {
            response
                .source_file_types
                .push(source.source_file_type().to_string());
            response.ids.push(self.hold(&source));
        }
        Ok(response)
    }

    fn handle_prepare(
        &self,
        prepare: PrepareRecipe,
    ) -> Result<PrepareRecipeResponse> {
        let recipe = self.registry.prepare(&prepare.id, &prepare.options)?;
        let id = format!(
            "{}-{}",
            recipe.name(),
            self.next_recipe.fetch_add(1, Ordering::Relaxed)
        );
        let response = PrepareRecipeResponse {
            id: id.clone(),
            display_name: recipe.display_name().to_string(),
            description: recipe.description().to_string(),
        };
        self.prepared.insert(id, recipe);
        Ok(response)
    }
}
