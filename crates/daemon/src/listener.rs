// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Accept loop and tool dispatch: one task per connection, one request per
//! connection, mirroring the teacher's listener shape but dispatching into
//! the five tools of spec.md §6 instead of the job/worker/cron surface.
//!
//! Generic over the same `D, N, C` triple as [`dbgx_engine::SessionManager`]
//! so tests can drive the whole dispatch path against the driver/notify/clock
//! fakes instead of a real `cdb` process; `dbgx-daemon`'s binary entry point
//! is the only place that pins these to the production types.

use crate::protocol::{self, Progress, Request, Response};
use dbgx_core::execution_class::timeout_for;
use dbgx_core::{Clock, CommandId, CommandState, ErrorKind, ExtensionJobId, SessionId};
use dbgx_driver::{DebuggerAdapter, NotifyAdapter};
use dbgx_engine::SessionManager;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::{UnixListener, UnixStream};

/// Shared state handed to every accepted connection.
pub struct ListenCtx<D, N, C> {
    pub sessions: Arc<SessionManager<D, N, C>>,
    /// Mirrors `Config::extensions_enabled`; checked by `enqueue-extension`
    /// before any session/extension lookup.
    pub extensions_enabled: bool,
}

pub struct Listener<D, N, C> {
    listener: UnixListener,
    ctx: Arc<ListenCtx<D, N, C>>,
}

impl<D, N, C> Listener<D, N, C>
where
    D: DebuggerAdapter + 'static,
    N: NotifyAdapter + 'static,
    C: Clock,
{
    pub fn new(listener: UnixListener, ctx: Arc<ListenCtx<D, N, C>>) -> Self {
        Self { listener, ctx }
    }

    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, _addr)) => {
                    let ctx = self.ctx.clone();
                    tokio::spawn(async move {
                        if let Err(err) = handle_connection(stream, ctx).await {
                            tracing::warn!(error = %err, "connection handling failed");
                        }
                    });
                }
                Err(err) => {
                    tracing::warn!(error = %err, "accept failed");
                }
            }
        }
    }
}

async fn handle_connection<D, N, C>(
    mut stream: UnixStream,
    ctx: Arc<ListenCtx<D, N, C>>,
) -> Result<(), protocol::ProtocolError>
where
    D: DebuggerAdapter,
    N: NotifyAdapter,
    C: Clock,
{
    let request: Request = protocol::read_message(&mut stream).await?;
    let response = dispatch(&ctx, request).await;
    protocol::write_message(&mut stream, &response).await
}

pub async fn dispatch<D, N, C>(ctx: &ListenCtx<D, N, C>, request: Request) -> Response
where
    D: DebuggerAdapter,
    N: NotifyAdapter,
    C: Clock,
{
    match request {
        Request::OpenSession {
            dump_path,
            symbols_path,
        } => open_session(ctx, dump_path, symbols_path).await,
        Request::CloseSession { session_id } => close_session(ctx, session_id).await,
        Request::EnqueueCommand {
            session_id,
            command,
        } => enqueue_command(ctx, session_id, command).await,
        Request::ReadCommandResult {
            session_id,
            command_id,
        } => read_command_result(ctx, session_id, command_id).await,
        Request::EnqueueExtension {
            session_id,
            extension_name,
            parameters,
        } => enqueue_extension(ctx, session_id, extension_name, parameters).await,
    }
}

fn error_response(kind: ErrorKind) -> Response {
    Response::Error {
        kind: kind.tag().to_string(),
        message: kind.to_string(),
    }
}

/// Invalid shape is folded into `SessionNotFound` for tools whose contract
/// (spec.md §6) doesn't list `InvalidInput` as a possible error kind.
fn parse_known_session_id(session_id: &str) -> Result<SessionId, ErrorKind> {
    SessionId::parse(session_id).ok_or_else(|| ErrorKind::SessionNotFound(session_id.to_string()))
}

/// Rejects empty/whitespace text and the NUL/newline bytes that would
/// desynchronize the driver's sentinel framing (SPEC_FULL.md §4).
fn validate_command_text(text: &str) -> Result<(), ErrorKind> {
    if text.trim().is_empty() {
        return Err(ErrorKind::InvalidInput(
            "command must not be empty".to_string(),
        ));
    }
    if text.contains('\0') || text.contains('\n') || text.contains('\r') {
        return Err(ErrorKind::InvalidInput(
            "command must not contain NUL or newline characters".to_string(),
        ));
    }
    Ok(())
}

fn external_command_status(state: CommandState) -> &'static str {
    match state {
        CommandState::Queued => "Queued",
        CommandState::Executing => "Executing",
        CommandState::Completed => "Success",
        CommandState::Failed => "Failed",
        CommandState::Cancelled => "Cancelled",
    }
}

fn status_explanation(state: CommandState) -> String {
    match state {
        CommandState::Queued => "command is queued and will execute in FIFO order".to_string(),
        CommandState::Executing => "command is executing against the debugger".to_string(),
        CommandState::Completed => "command completed successfully".to_string(),
        CommandState::Failed => "command failed".to_string(),
        CommandState::Cancelled => "command was cancelled".to_string(),
    }
}

fn epoch_ms_at<C: Clock>(clock: &C, now: Instant, at: Instant) -> u64 {
    let delta_ms = now.saturating_duration_since(at).as_millis() as u64;
    clock.epoch_ms().saturating_sub(delta_ms)
}

async fn open_session<D, N, C>(
    ctx: &ListenCtx<D, N, C>,
    dump_path: PathBuf,
    symbols_path: Option<PathBuf>,
) -> Response
where
    D: DebuggerAdapter,
    N: NotifyAdapter,
    C: Clock,
{
    let dump_display = dump_path.display().to_string();
    match ctx.sessions.create(dump_path, symbols_path).await {
        Ok(id) => Response::OpenSession {
            session_id: id.to_string(),
            dump_file: dump_display,
            status: "Success".to_string(),
            message: format!("session {id} opened"),
        },
        Err(kind) => Response::OpenSession {
            session_id: String::new(),
            dump_file: dump_display,
            status: "Failed".to_string(),
            message: kind.to_string(),
        },
    }
}

async fn close_session<D, N, C>(ctx: &ListenCtx<D, N, C>, session_id: String) -> Response
where
    D: DebuggerAdapter,
    N: NotifyAdapter,
    C: Clock,
{
    let Some(sid) = SessionId::parse(&session_id) else {
        return Response::CloseSession {
            session_id,
            status: "Failed".to_string(),
            message: ErrorKind::SessionNotFound("malformed session id".to_string()).to_string(),
        };
    };
    if ctx.sessions.close(&sid).await {
        Response::CloseSession {
            session_id: sid.to_string(),
            status: "Success".to_string(),
            message: format!("session {sid} closed"),
        }
    } else {
        Response::CloseSession {
            session_id: sid.to_string(),
            status: "Failed".to_string(),
            message: ErrorKind::SessionNotFound(sid.to_string()).to_string(),
        }
    }
}

async fn enqueue_command<D, N, C>(
    ctx: &ListenCtx<D, N, C>,
    session_id: String,
    command: String,
) -> Response
where
    D: DebuggerAdapter,
    N: NotifyAdapter,
    C: Clock,
{
    let sid = match parse_known_session_id(&session_id) {
        Ok(id) => id,
        Err(kind) => return error_response(kind),
    };
    if let Err(kind) = validate_command_text(&command) {
        return error_response(kind);
    }
    let queue = match ctx.sessions.try_get_queue(&sid) {
        Ok(queue) => queue,
        Err(kind) => return error_response(kind),
    };
    let Some(session) = ctx.sessions.get(&sid) else {
        return error_response(ErrorKind::SessionNotFound(session_id));
    };
    session.touch(session.clock().now());

    let class_timeout = timeout_for(&command);
    let command_id = queue.enqueue(command);
    let now = session.clock().now();
    let queue_position = session
        .tracker()
        .get(&command_id, now)
        .map(|info| info.queue_position)
        .unwrap_or(0);
    let total_in_queue = session
        .tracker()
        .list()
        .into_iter()
        .filter(|info| info.state == CommandState::Queued)
        .count();

    Response::EnqueueCommand {
        session_id: sid.to_string(),
        command_id: command_id.to_string(),
        status: "Queued".to_string(),
        queue_position,
        total_in_queue,
        timeout_minutes: class_timeout.as_secs() / 60,
    }
}

async fn read_command_result<D, N, C>(
    ctx: &ListenCtx<D, N, C>,
    session_id: String,
    command_id: String,
) -> Response
where
    D: DebuggerAdapter,
    N: NotifyAdapter,
    C: Clock,
{
    let Some(sid) = SessionId::parse(&session_id) else {
        return error_response(ErrorKind::InvalidInput(format!(
            "invalid session id: {session_id}"
        )));
    };
    let Some(session) = ctx.sessions.get(&sid) else {
        return error_response(ErrorKind::SessionNotFound(session_id));
    };
    let now = session.clock().now();
    session.touch(now);

    if let Some((parsed, _)) = CommandId::parse(&command_id) {
        let Some(info) = session.tracker().get(&parsed, now) else {
            return error_response(ErrorKind::CommandNotFound(command_id));
        };
        let elapsed = info.elapsed(now);
        let class_timeout = timeout_for(&info.text);
        let ahead = session
            .tracker()
            .list()
            .into_iter()
            .filter(|other| {
                other.state == CommandState::Queued && other.queue_position < info.queue_position
            })
            .map(|other| timeout_for(&other.text));
        let eta = dbgx_engine::progress::compute_eta(class_timeout, elapsed, ahead);
        let progress_pct = dbgx_engine::progress::compute_progress(info.queue_position, elapsed);
        let check_again = dbgx_engine::progress::polling_hint(info.state, info.queue_position);

        let (result, error) = match info.state {
            CommandState::Completed => {
                let cached = session.cache().get(&parsed, now);
                (cached.map(|r| r.output), None)
            }
            CommandState::Failed | CommandState::Cancelled => {
                let cached = session.cache().get(&parsed, now);
                (None, cached.and_then(|r| r.error))
            }
            _ => (None, None),
        };
        let completed_at = info
            .completed_at
            .map(|at| epoch_ms_at(session.clock(), now, at));

        return Response::ReadCommandResult {
            session_id: sid.to_string(),
            command_id: parsed.to_string(),
            status: external_command_status(info.state).to_string(),
            result,
            error,
            completed_at,
            progress: Progress {
                queue_position: info.queue_position,
                progress_percentage: progress_pct,
                elapsed: dbgx_core::format_elapsed(elapsed.as_secs()),
                eta: dbgx_core::format_elapsed(eta.as_secs()),
                execution_time: dbgx_core::format_execution_time(elapsed),
                check_again,
            },
            status_explanation: status_explanation(info.state),
        };
    }

    if let Some(job_id) = ExtensionJobId::parse(&command_id) {
        let Some(job) = session.extensions().get(&job_id) else {
            return error_response(ErrorKind::ExtensionNotFound(command_id));
        };
        let progress_pct = match job.state {
            CommandState::Completed | CommandState::Failed | CommandState::Cancelled => 100,
            CommandState::Executing => 50,
            CommandState::Queued => 0,
        };
        let check_again = dbgx_engine::progress::polling_hint(job.state, 0);
        let eta = dbgx_core::EXTENSION_TIMEOUT.saturating_sub(job.elapsed);

        return Response::ReadCommandResult {
            session_id: sid.to_string(),
            command_id: job_id.to_string(),
            status: external_command_status(job.state).to_string(),
            result: job.result.as_ref().map(serde_json::Value::to_string),
            error: job.error.clone(),
            completed_at: None,
            progress: Progress {
                queue_position: 0,
                progress_percentage: progress_pct,
                elapsed: dbgx_core::format_elapsed(job.elapsed.as_secs()),
                eta: dbgx_core::format_elapsed(eta.as_secs()),
                execution_time: dbgx_core::format_execution_time(job.elapsed),
                check_again,
            },
            status_explanation: status_explanation(job.state),
        };
    }

    error_response(ErrorKind::InvalidInput(format!(
        "malformed command id: {command_id}"
    )))
}

async fn enqueue_extension<D, N, C>(
    ctx: &ListenCtx<D, N, C>,
    session_id: String,
    extension_name: String,
    parameters: Option<serde_json::Value>,
) -> Response
where
    D: DebuggerAdapter,
    N: NotifyAdapter,
    C: Clock,
{
    if !ctx.extensions_enabled {
        return error_response(ErrorKind::ExtensionSubsystemDisabled);
    }
    let sid = match parse_known_session_id(&session_id) {
        Ok(id) => id,
        Err(kind) => return error_response(kind),
    };
    let Some(session) = ctx.sessions.get(&sid) else {
        return error_response(ErrorKind::SessionNotFound(session_id));
    };
    if extension_name.trim().is_empty() {
        return error_response(ErrorKind::InvalidInput(
            "extension name must not be empty".to_string(),
        ));
    }
    session.touch(session.clock().now());
    let job_id = session.extensions().register(extension_name.clone(), parameters);

    Response::EnqueueExtension {
        session_id: sid.to_string(),
        command_id: job_id.to_string(),
        extension_name,
        status: "Queued".to_string(),
        timeout_minutes: dbgx_core::EXTENSION_TIMEOUT.as_secs() / 60,
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
