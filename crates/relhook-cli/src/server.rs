use crate::config::ServeSettings;
use anyhow::{anyhow, Result};
use relhook_core::{HookResponse, WebhookHandler};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use tokio::runtime::Runtime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Hook,
    MethodNotAllowed,
    NotFound,
}

/// Match a request against the hook path, ignoring any query string
pub fn route(method: &Method, url: &str, hook_path: &str) -> Route {
    let path = url.split('?').next().unwrap_or(url);

    if path != hook_path {
        return Route::NotFound;
    }

    match method {
        Method::Get => Route::Hook,
        _ => Route::MethodNotAllowed,
    }
}

/// Serve the hook until the listener shuts down.
///
/// Requests are handled one at a time; a second trigger waits for the
/// running pipeline to finish.
pub fn serve(runtime: &Runtime, handler: &WebhookHandler, settings: &ServeSettings) -> Result<i32> {
    let addr = format!("{}:{}", settings.host, settings.port);
    let server = Server::http(&addr).map_err(|e| anyhow!("Failed to start server on {}: {}", addr, e))?;

    log::info!(
        "Mirroring {} on http://{}{}",
        handler.config().repository,
        addr,
        settings.path
    );

    for request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();

        let (status, payload) = match route(&method, &url, &settings.path) {
            Route::Hook => {
                let response = runtime.block_on(handler.handle());
                (response.http_status(settings.always_ok_status), response)
            }
            Route::MethodNotAllowed => (
                405,
                HookResponse {
                    code: 405,
                    msg: "Method Not Allowed".to_string(),
                },
            ),
            Route::NotFound => (
                404,
                HookResponse {
                    code: 404,
                    msg: "Not Found".to_string(),
                },
            ),
        };

        if payload.is_ok() {
            log::info!("{} {} {} ({})", method, url, status, payload.msg);
        } else {
            log::warn!("{} {} {} ({})", method, url, status, payload.msg);
        }

        match payload.to_json() {
            Ok(body) => respond_json(request, status, &body),
            Err(e) => {
                log::error!("Failed to encode response: {}", e);
                respond_json(request, 500, r#"{"code":500,"msg":"Internal Server Error"}"#);
            }
        }
    }

    Ok(0)
}

fn respond_json(request: Request, status: u16, body: &str) {
    let mut response = Response::from_string(body).with_status_code(StatusCode(status));

    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        response = response.with_header(header);
    }

    if let Err(e) = request.respond(response) {
        log::warn!("Failed to send response: {}", e);
    }
}
