use super::http_server::AppState;
use crate::execution::{
    BatchEnvelope, EnvelopeError, ExecutionContext, ExecutionEngine, ExecutionResult, Payload,
    RequestEnvelope, RequestSnapshot, ResponseHandle, StructuredError,
};
use crate::{log_http_debug, log_http_info};
use actix_web::web::{self, Bytes};
use actix_web::{HttpRequest, HttpResponse};
use futures::stream::{self, Stream};
use std::collections::HashMap;
use std::convert::Infallible;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Execute a single query or a batch posted as JSON.
pub async fn execute_post(
    request: HttpRequest,
    body: Bytes,
    state: web::Data<AppState>,
) -> HttpResponse {
    match Payload::parse(&body) {
        Ok(Payload::Single(envelope)) => execute_single(&request, &state, envelope).await,
        Ok(Payload::Batch(batch)) => execute_batch(&request, &state, batch),
        Err(error) => {
            if let EnvelopeError::Malformed(reason) = &error {
                log_http_debug!("Rejecting unparsable request body: {}", reason);
            }
            bad_request(&request, &state, &error.to_string())
        }
    }
}

/// Execute a query passed as URL parameters.
pub async fn execute_get(request: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let params = match web::Query::<HashMap<String, String>>::from_query(request.query_string()) {
        Ok(params) => params.into_inner(),
        Err(e) => {
            log_http_debug!("Rejecting malformed query string: {}", e);
            return bad_request(&request, &state, "Bad GET request");
        }
    };

    match RequestEnvelope::from_query_params(&params) {
        Ok(envelope) => execute_single(&request, &state, envelope).await,
        Err(EnvelopeError::MissingQuery) => bad_request(&request, &state, "Bad GET request"),
        Err(error) => bad_request(&request, &state, &error.to_string()),
    }
}

/// Execute one request and write its result, together with any headers and
/// cookies its resolvers asked for.
pub(crate) async fn execute_single(
    request: &HttpRequest,
    state: &web::Data<AppState>,
    envelope: RequestEnvelope,
) -> HttpResponse {
    let handle = ResponseHandle::new();
    let context = ExecutionContext::bind(request, handle.clone());
    let result = state.engine.execute(envelope, context).await;
    let pending = handle.commit();

    let mut response = HttpResponse::Ok();
    response.content_type(JSON_CONTENT_TYPE);
    state.cors.apply(request, &mut response);
    for header in pending.headers {
        response.append_header(header);
    }
    for cookie in pending.cookies {
        response.cookie(cookie);
    }
    response.body(result.to_json_bytes())
}

fn execute_batch(
    request: &HttpRequest,
    state: &web::Data<AppState>,
    batch: BatchEnvelope,
) -> HttpResponse {
    log_http_info!("Executing batch of {} queries", batch.len());

    let mut response = HttpResponse::Ok();
    response.content_type(JSON_CONTENT_TYPE);
    state.cors.apply(request, &mut response);
    response.streaming(batch_stream(
        state.engine.clone(),
        RequestSnapshot::from_request(request),
        batch,
    ))
}

struct BatchCursor {
    engine: ExecutionEngine,
    snapshot: RequestSnapshot,
    items: std::vec::IntoIter<Result<RequestEnvelope, EnvelopeError>>,
    written: usize,
}

/// Results of a batch as a JSON array, one chunk per item.
///
/// Items run one after another. The response head is sent before the first
/// item runs, so resolvers get a detached response handle.
pub fn batch_stream(
    engine: ExecutionEngine,
    snapshot: RequestSnapshot,
    batch: BatchEnvelope,
) -> impl Stream<Item = Result<Bytes, Infallible>> {
    let cursor = BatchCursor {
        engine,
        snapshot,
        items: batch.items.into_iter(),
        written: 0,
    };

    stream::unfold(Some(cursor), |cursor| async move {
        let mut cursor = cursor?;
        let Some(item) = cursor.items.next() else {
            let closing: &'static [u8] = if cursor.written == 0 { b"[\n\n]" } else { b"\n]" };
            return Some((Ok(Bytes::from_static(closing)), None));
        };

        let result = match item {
            Ok(envelope) => {
                let context =
                    ExecutionContext::new(cursor.snapshot.clone(), ResponseHandle::detached());
                cursor.engine.execute(envelope, context).await
            }
            Err(error) => {
                log_http_debug!("Batch item {} is not a valid request: {}", cursor.written, error);
                ExecutionResult::from_errors(vec![StructuredError::bad_request(error.to_string())])
            }
        };

        let mut chunk = if cursor.written == 0 {
            b"[\n".to_vec()
        } else {
            b",\n".to_vec()
        };
        chunk.extend(result.to_json_bytes());
        cursor.written += 1;
        Some((Ok(Bytes::from(chunk)), Some(cursor)))
    })
}

/// Plain-text 400 response.
pub(crate) fn bad_request(
    request: &HttpRequest,
    state: &web::Data<AppState>,
    message: &str,
) -> HttpResponse {
    let mut response = HttpResponse::BadRequest();
    response.content_type(TEXT_CONTENT_TYPE);
    state.cors.apply(request, &mut response);
    response.body(message.to_string())
}
