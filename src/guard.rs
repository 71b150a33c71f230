use axum::{
    extract::{Request, State},
    http::{StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    AppState, auth,
    matcher::{ActivationPattern, normalize_path},
    models::{Decision, DecisionPreview, Role, RouteClass, SessionLookup},
    route_table::{LOGIN_PATH, RouteTable, dashboard_for, is_root_path},
};

/// Sends the caller to the first dashboard in `allowed` that matches their role, or
/// to login when none does.
fn redirect_elsewhere(role: Option<Role>, allowed: [Role; 2]) -> Decision {
    match allowed.into_iter().find(|candidate| role == Some(*candidate)) {
        Some(found) => Decision::redirect(dashboard_for(found)),
        None => Decision::redirect(LOGIN_PATH),
    }
}

/// decide
///
/// The access rule table. Pure: the same path and session always produce the same
/// decision.
///
/// Anonymous callers may only reach public prefixes. Authenticated callers are bounced
/// off role tables that are not theirs, pass through common routes, and are sent to
/// their dashboard from `/`, `/home` and any path no table claims. A role string that
/// is not one of the known constants never earns a dashboard; it ends at login
/// wherever a role is required and passes through otherwise.
pub fn decide(table: &RouteTable, pathname: &str, lookup: &SessionLookup) -> Decision {
    let Some(user) = lookup.user() else {
        return if table.is_public(pathname) {
            Decision::Forward
        } else {
            Decision::redirect(LOGIN_PATH)
        };
    };

    let role = user.role();
    let is_admin = role == Some(Role::Admin);
    let is_tutor = role == Some(Role::Tutor);
    let is_student = role == Some(Role::Student);

    let class = table.classify(pathname);

    match class {
        RouteClass::Admin if !is_admin => return redirect_elsewhere(role, [Role::Tutor, Role::Student]),
        RouteClass::Tutor if !is_tutor => return redirect_elsewhere(role, [Role::Admin, Role::Student]),
        RouteClass::Student if !is_student => return redirect_elsewhere(role, [Role::Admin, Role::Tutor]),
        RouteClass::Common => return Decision::Forward,
        _ => {}
    }

    if is_root_path(pathname) {
        if let Some(role) = role {
            return Decision::redirect(dashboard_for(role));
        }
    }

    if class == RouteClass::Unmatched {
        if let Some(role) = role {
            return Decision::redirect(dashboard_for(role));
        }
    }

    Decision::Forward
}

/// preview
///
/// Everything the guard would conclude about `path` for this session, including
/// whether the activation pattern lets it run at all. `path` is reported normalized.
pub fn preview(
    table: &RouteTable,
    activation: &ActivationPattern,
    path: &str,
    lookup: &SessionLookup,
) -> DecisionPreview {
    let path = normalize_path(path);
    let activated = activation.matches(&path);
    let user = lookup.user();

    DecisionPreview {
        class: table.classify(&path),
        authenticated: user.is_some(),
        role: user.map(|u| u.role.clone()),
        decision: if activated {
            decide(table, &path, lookup)
        } else {
            Decision::Forward
        },
        activated,
        path,
    }
}

/// route_guard
///
/// Middleware wrapping the forwarding fallback. The path is normalized first and the
/// request continues with the normalized path, so the guard and the upstream always
/// see the same route. Paths outside the activation pattern go straight through
/// without a session lookup; the rest are decided by `decide` and either continue to
/// the upstream or get a `307` redirect.
pub async fn route_guard(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let path = normalize_path(request.uri().path());

    if path != request.uri().path() {
        let rewritten = match request.uri().query() {
            Some(query) => format!("{path}?{query}"),
            None => path.clone(),
        };
        match rewritten.parse::<Uri>() {
            Ok(uri) => {
                tracing::debug!(from = %request.uri(), to = %uri, "Normalized request path");
                *request.uri_mut() = uri;
            }
            Err(e) => {
                tracing::warn!("Rejecting unparseable normalized path {}: {}", rewritten, e);
                return StatusCode::BAD_REQUEST.into_response();
            }
        }
    }

    if !state.activation.matches(&path) {
        return next.run(request).await;
    }

    let lookup = auth::resolve_session(request.headers(), &state.config, &state.sessions).await;

    match decide(&state.routes, &path, &lookup) {
        Decision::Forward => {
            tracing::debug!(path = %path, "Guard forwarding request");
            next.run(request).await
        }
        Decision::Redirect { location } => {
            tracing::info!(
                path = %path,
                location = %location,
                role = ?lookup.user().map(|u| u.role.as_str()),
                "Guard redirecting request"
            );
            Redirect::temporary(&location).into_response()
        }
    }
}
